//! Port API client utilities.
//!
//! This crate provides a lightweight client for the Port REST API
//! (`https://api.getport.io/v1`). It focuses on:
//!
//! - Exchanging client credentials for a bearer token and refreshing it when
//!   the API rejects a stale one
//! - Validating `PORT_API_BASE` for safety
//! - Fetching blueprints and integrations, and patching blueprints
//!
//! The primary entry point is [`PortClient`]. Create an instance via
//! [`PortClient::new_from_env`] or [`PortClient::new`], then call the
//! resource methods.
//!
//! # Example
//!
//! ```ignore
//! use portflow_api::PortClient;
//!
//! async fn show() -> Result<(), portflow_api::ApiError> {
//!     let client = PortClient::new_from_env()?;
//!     let blueprint = client.get_blueprint("service").await?;
//!     println!("{blueprint}");
//!     Ok(())
//! }
//! ```

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode, header};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

mod blocking;
mod error;

pub use blocking::block_on;
pub use error::ApiError;

/// Public Port API base used when `PORT_API_BASE` is unset.
pub const DEFAULT_API_BASE: &str = "https://api.getport.io/v1";
/// Environment variable overriding the API base URL.
pub const API_BASE_ENV_VAR: &str = "PORT_API_BASE";
/// Environment variable holding the client id.
pub const CLIENT_ID_ENV_VAR: &str = "PORT_CLIENT_ID";
/// Environment variable holding the client secret.
pub const CLIENT_SECRET_ENV_VAR: &str = "PORT_CLIENT_SECRET";

/// Allowed base domains for non-local configurations of `PORT_API_BASE`.
/// Subdomains of these domains are also allowed.
const ALLOWED_PORT_DOMAINS: &[&str] = &["getport.io"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Client credentials exchanged for an access token.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read credentials from `PORT_CLIENT_ID` / `PORT_CLIENT_SECRET`.
    ///
    /// Returns `None` unless both are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let client_id = env::var(CLIENT_ID_ENV_VAR).ok().filter(|value| !value.trim().is_empty())?;
        let client_secret = env::var(CLIENT_SECRET_ENV_VAR).ok().filter(|value| !value.trim().is_empty())?;
        Some(Self::new(client_id, client_secret))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Thin wrapper around a configured `reqwest::Client` for Port API access.
///
/// Cloning is cheap and clones share the cached access token.
#[derive(Debug, Clone)]
pub struct PortClient {
    pub base_url: String,
    http: Client,
    credentials: Option<Credentials>,
    token: Arc<RwLock<Option<String>>>,
}

impl PortClient {
    /// Construct a [`PortClient`] for `base_url`.
    ///
    /// Non-localhost hosts must use HTTPS and be within an allowed Port domain.
    pub fn new(base_url: impl Into<String>, credentials: Option<Credentials>) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .user_agent(format!("portflow/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            http,
            credentials,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Construct a [`PortClient`] from `PORT_API_BASE`, `PORT_CLIENT_ID` and
    /// `PORT_CLIENT_SECRET`.
    ///
    /// Missing credentials are not an error here; the first call that needs a
    /// token reports [`ApiError::MissingCredentials`].
    pub fn new_from_env() -> Result<Self, ApiError> {
        let base_url = env::var(API_BASE_ENV_VAR).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::new(base_url, Credentials::from_env())
    }

    /// Exchange the client credentials for a fresh access token and cache it.
    pub async fn authenticate(&self) -> Result<String, ApiError> {
        let credentials = self.credentials.as_ref().ok_or(ApiError::MissingCredentials)?;
        let url = self.endpoint(&["auth", "access_token"])?;
        debug!(%url, client_id = %credentials.client_id, "requesting access token");

        let response = self
            .http
            .post(url)
            .json(&json!({
                "clientId": credentials.client_id,
                "clientSecret": credentials.client_secret,
            }))
            .send()
            .await?;
        let body = read_json(response).await?;
        let access_token = body
            .get("accessToken")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingAccessToken)?
            .to_string();

        *self.token.write().await = Some(access_token.clone());
        Ok(access_token)
    }

    /// Fetch a blueprint definition by identifier.
    pub async fn get_blueprint(&self, blueprint_id: &str) -> Result<Value, ApiError> {
        self.send_json(Method::GET, &["blueprints", blueprint_id], None).await
    }

    /// Fetch an integration by identifier.
    pub async fn get_integration(&self, integration_id: &str) -> Result<Value, ApiError> {
        self.send_json(Method::GET, &["integration", integration_id], None).await
    }

    /// Apply a partial update to a blueprint.
    pub async fn patch_blueprint(&self, blueprint_id: &str, payload: &Value) -> Result<Value, ApiError> {
        self.send_json(Method::PATCH, &["blueprints", blueprint_id], Some(payload)).await
    }

    /// Send an authenticated request; a 401 triggers one token refresh and retry.
    async fn send_json(&self, method: Method, segments: &[&str], body: Option<&Value>) -> Result<Value, ApiError> {
        let url = self.endpoint(segments)?;
        let token = self.bearer_token().await?;
        debug!(%method, %url, "sending Port request");

        let response = self.authorized(method.clone(), url.clone(), &token, body).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_json(response).await;
        }

        warn!(%url, "access token rejected; re-authenticating");
        let refreshed = self.authenticate().await?;
        let retried = self.authorized(method, url, &refreshed, body).send().await?;
        read_json(retried).await
    }

    fn authorized(&self, method: Method, url: Url, token: &str, body: Option<&Value>) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url).bearer_auth(token);
        match body {
            Some(payload) => builder.json(payload),
            None => builder,
        }
    }

    async fn bearer_token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.authenticate().await
    }

    /// Resolve API-relative path segments against the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url).map_err(|error| ApiError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: error.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "URL cannot be a base".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            body: text,
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and host must be `getport.io` or a
///   subdomain of it
pub fn validate_base_url(base: &str) -> Result<(), ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let parsed_base_url = Url::parse(base).map_err(|error| invalid(error.to_string()))?;
    let host_name = parsed_base_url.host_str().ok_or_else(|| invalid("URL must include a host".into()))?;

    if LOCALHOST_DOMAINS.iter().any(|&allowed| host_name.eq_ignore_ascii_case(allowed)) {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(invalid(format!(
            "https is required for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        )));
    }

    let is_allowed_domain = ALLOWED_PORT_DOMAINS.iter().any(|&allowed_domain| {
        host_name.eq_ignore_ascii_case(allowed_domain) || host_name.to_ascii_lowercase().ends_with(&format!(".{allowed_domain}"))
    });
    if !is_allowed_domain {
        return Err(invalid(format!(
            "host '{host_name}' is not allowed; must be one of {ALLOWED_PORT_DOMAINS:?} or a subdomain, or localhost"
        )));
    }

    Ok(())
}
