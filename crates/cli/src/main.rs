use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portflow_api::{Credentials, PortClient};
use portflow_engine::{PortResourceApi, build_plan, list_workflows, load_document, run_workflow};
use serde_json::{Map, Value, json};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod server;

use config::PortflowConfig;

#[derive(Debug, Parser)]
#[command(name = "portflow", version, about = "Run Port onboarding workflows")]
struct Cli {
    /// Directory holding workflow YAML files.
    #[arg(long, global = true, value_name = "DIR")]
    workflows_dir: Option<PathBuf>,

    /// Port API base URL.
    #[arg(long, global = true, value_name = "URL")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List workflows with their declared inputs.
    List,
    /// Print the execution plan of a workflow without running it.
    Preview { filename: String },
    /// Execute a workflow and print the step outcomes.
    Run {
        filename: String,
        /// Workflow input as `key=value`; repeatable. Keys may contain spaces.
        #[arg(short, long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
        inputs: Vec<(String, String)>,
        /// Print only step number, name, action and status.
        #[arg(long)]
        summary: bool,
    },
    /// Serve the HTTP front end.
    Serve {
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(error) = dotenv
        && !error.not_found()
    {
        warn!(error = %error, "ignoring unreadable .env file");
    }

    let cli = Cli::parse();
    let config = PortflowConfig::load()?;
    let workflows_dir = cli.workflows_dir.clone().unwrap_or_else(|| config.workflows_dir());
    let api_base = cli.api_base.clone().unwrap_or_else(|| config.api_base_url().to_string());

    match cli.command {
        Command::List => {
            let summaries = list_workflows(&workflows_dir)?;
            print_json(&json!({"workflows": summaries}))
        }
        Command::Preview { filename } => {
            let document = load_document(&workflows_dir, &filename)?;
            print_json(&build_plan(&document))
        }
        Command::Run { filename, inputs, summary } => {
            let api = resource_api(&api_base)?;
            let inputs: Map<String, Value> = inputs.into_iter().map(|(key, value)| (key, Value::String(value))).collect();
            let report = tokio::task::spawn_blocking(move || run_workflow(&workflows_dir, &filename, &inputs, &api))
                .await
                .context("workflow task panicked")??;
            if summary {
                print_json(&json!({"execution_results": report.summaries()}))
            } else {
                print_json(&report)
            }
        }
        Command::Serve { bind } => {
            let bind_address = match bind {
                Some(address) => address,
                None => config.bind_address()?,
            };
            info!(workflows_dir = %workflows_dir.display(), api_base = %api_base, "starting server");
            let state = server::AppState::new(workflows_dir, Arc::new(resource_api(&api_base)?));
            server::serve(bind_address, state).await
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .try_init();
}

fn resource_api(api_base: &str) -> Result<PortResourceApi> {
    let credentials = Credentials::from_env();
    if credentials.is_none() {
        warn!("PORT_CLIENT_ID / PORT_CLIENT_SECRET not set; remote steps will fail");
    }
    let client = PortClient::new(api_base, credentials).with_context(|| format!("invalid Port API base '{api_base}'"))?;
    Ok(PortResourceApi::new(client))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("input key is empty in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
