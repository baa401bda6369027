//! Resource API capability used by step handlers.
//!
//! The engine is synchronous and talks to the remote system through
//! [`ResourceApi`]. [`PortResourceApi`] implements it on top of the async
//! [`PortClient`], bridging each call with [`portflow_api::block_on`].

use portflow_api::{ApiError, PortClient, block_on};
use serde_json::Value;
use tracing::warn;

/// Remote operations the handlers rely on.
pub trait ResourceApi {
    /// Fetch a blueprint by identifier.
    fn fetch_blueprint(&self, blueprint_id: &str) -> Result<Value, ApiError>;

    /// Fetch an integration by identifier.
    fn fetch_integration(&self, integration_id: &str) -> Result<Value, ApiError>;

    /// Apply a partial update to a blueprint.
    ///
    /// Never fails: transport and HTTP problems are reported as [`BlueprintUpdate::Error`].
    fn update_blueprint(&self, blueprint_id: &str, payload: &Value) -> BlueprintUpdate;
}

/// Result of [`ResourceApi::update_blueprint`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlueprintUpdate {
    Success { data: Value },
    Error { error: String, details: Value },
}

impl BlueprintUpdate {
    /// Builds the error variant from an API error, keeping Port's raw error body as details.
    pub fn from_api_error(error: &ApiError) -> Self {
        Self::Error {
            error: error.to_string(),
            details: error.details(),
        }
    }
}

/// [`ResourceApi`] backed by the Port REST API.
#[derive(Debug, Clone)]
pub struct PortResourceApi {
    client: PortClient,
}

impl PortResourceApi {
    pub fn new(client: PortClient) -> Self {
        Self { client }
    }
}

impl ResourceApi for PortResourceApi {
    fn fetch_blueprint(&self, blueprint_id: &str) -> Result<Value, ApiError> {
        let client = self.client.clone();
        let blueprint_id = blueprint_id.to_string();
        block_on(async move { client.get_blueprint(&blueprint_id).await })
    }

    fn fetch_integration(&self, integration_id: &str) -> Result<Value, ApiError> {
        let client = self.client.clone();
        let integration_id = integration_id.to_string();
        block_on(async move { client.get_integration(&integration_id).await })
    }

    fn update_blueprint(&self, blueprint_id: &str, payload: &Value) -> BlueprintUpdate {
        let client = self.client.clone();
        let target = blueprint_id.to_string();
        let payload = payload.clone();
        match block_on(async move { client.patch_blueprint(&target, &payload).await }) {
            Ok(data) => BlueprintUpdate::Success { data },
            Err(error) => {
                warn!(blueprint = %blueprint_id, status = ?error.status_code(), error = %error, "blueprint update failed");
                BlueprintUpdate::from_api_error(&error)
            }
        }
    }
}
