//! The native command gateway boundary.
//!
//! All real work — config file mutation, process control, environment
//! detection — happens on the other side of this trait. The store only ever
//! reaches it through async calls that may fail; nothing here blocks.
//!
//! [`StdioGateway`] is the production implementation (JSON-RPC 2.0 over a
//! helper subprocess's stdio). Tests substitute their own mocks.

mod stdio;

pub use stdio::StdioGateway;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::clients::ClientType;
use crate::registry::AppDescriptor;
use crate::status::AppStatuses;

/// Shared handle to the gateway, injected into every component that needs it.
pub type SharedGateway = Arc<dyn Gateway>;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway process is gone or was never reachable.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    /// The call reached the gateway and the gateway reported failure.
    #[error("{method} failed: {message}")]
    Call { method: String, message: String },
    /// The gateway answered with something we could not decode.
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("gateway io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Shorthand for a [`GatewayError::Call`] with an owned method name.
    pub fn call(method: &str, message: impl Into<String>) -> Self {
        Self::Call {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

// ─── Gateway trait ────────────────────────────────────────────────────────────

/// Async interface to the native command layer.
///
/// One method per remote operation; every call is a suspension point and
/// every call may fail. Callers are responsible for catching errors at the
/// call site — nothing in the store propagates a gateway failure upwards.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Ensure prerequisite tooling (uv, node, ...) is present.
    /// Returns a human-readable status string.
    async fn ensure_environment(&self) -> Result<String, GatewayError>;

    /// Fetch the catalog of installable apps.
    async fn get_app_registry(&self) -> Result<Vec<AppDescriptor>, GatewayError>;

    /// Force-refresh the catalog from its remote source.
    async fn refresh_app_registry(&self) -> Result<Vec<AppDescriptor>, GatewayError>;

    /// Installed/configured maps for one host client.
    async fn get_app_statuses(&self, client: ClientType) -> Result<AppStatuses, GatewayError>;

    async fn is_app_installed(
        &self,
        app_name: &str,
        client: ClientType,
    ) -> Result<bool, GatewayError>;

    async fn is_app_configured(&self, app_name: &str) -> Result<bool, GatewayError>;

    /// Install an app into the client's config, with any collected env vars.
    async fn install(
        &self,
        app_name: &str,
        env_vars: Option<&HashMap<String, String>>,
        client: ClientType,
    ) -> Result<String, GatewayError>;

    async fn uninstall(&self, app_name: &str, client: ClientType) -> Result<String, GatewayError>;

    /// Read the persisted setup values for an app. The gateway's copy is the
    /// source of truth; the store never caches these.
    async fn get_app_env(&self, app_name: &str) -> Result<HashMap<String, String>, GatewayError>;

    async fn save_app_env(
        &self,
        app_name: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), GatewayError>;

    /// Restart the host client app so it picks up config changes.
    async fn restart_client_app(&self, client: ClientType) -> Result<String, GatewayError>;

    async fn check_client_installed(&self, client: ClientType) -> Result<bool, GatewayError>;

    async fn check_uv_version(&self) -> Result<String, GatewayError>;

    async fn check_bun_version(&self) -> Result<String, GatewayError>;
}
