//! Resource client abstraction over the Container Apps control plane.

use super::types::{ComponentPayload, Resource, ServicePayload};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failures
    #[error("network request failed: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Authentication/Authorization failures
    #[error("access denied: {0}")]
    Unauthorized(String),

    #[error("rate limited")]
    RateLimit,

    /// Non-success response from the control plane
    #[error("request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Outcome of a lookup by name.
///
/// Only an authoritative "does not exist" answer maps to `NotFound`; every
/// other failure is returned as a `ClientError`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

/// Create/show access to managed services and Dapr components.
///
/// Create calls return `Ok(None)` when the control plane accepted the request
/// but returned no resource body.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fully qualified id of a managed environment, used to place new services.
    fn environment_id(&self, resource_group: &str, environment: &str) -> String;

    async fn show_service(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Lookup<Resource>, ClientError>;

    async fn create_service(
        &self,
        resource_group: &str,
        environment: &str,
        name: &str,
        payload: &ServicePayload,
    ) -> Result<Option<Resource>, ClientError>;

    async fn show_component(
        &self,
        resource_group: &str,
        environment: &str,
        name: &str,
    ) -> Result<Lookup<Resource>, ClientError>;

    async fn create_or_update_component(
        &self,
        resource_group: &str,
        environment: &str,
        name: &str,
        payload: &ComponentPayload,
    ) -> Result<Option<Resource>, ClientError>;
}
