// SPDX-License-Identifier: MIT
//! Shared test fixtures: a scriptable in-memory gateway.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mcpstore::clients::ClientType;
use mcpstore::gateway::{Gateway, GatewayError, SharedGateway};
use mcpstore::registry::AppDescriptor;
use mcpstore::status::AppStatuses;

/// One recorded `install` call.
#[derive(Debug, Clone)]
pub struct InstallCall {
    pub app_name: String,
    pub env_vars: Option<HashMap<String, String>>,
    pub client: ClientType,
}

/// Scriptable gateway double. Every knob defaults to "succeed with empty
/// data"; tests flip only what they need.
#[derive(Default)]
pub struct MockGateway {
    pub registry: Mutex<Vec<AppDescriptor>>,
    /// Payload served by `refresh_app_registry`; falls back to `registry`.
    pub refreshed_registry: Mutex<Option<Vec<AppDescriptor>>>,
    pub registry_fail: AtomicBool,

    pub statuses: Mutex<HashMap<ClientType, AppStatuses>>,
    pub statuses_fail: AtomicBool,
    /// Artificial latency per client for `get_app_statuses`, to script
    /// delayed-resolve interleavings under a paused clock.
    pub status_delays: Mutex<HashMap<ClientType, Duration>>,

    /// Scripted `ensure_environment` responses, consumed front to back;
    /// when empty the call answers "Environment is ready".
    pub env_script: Mutex<VecDeque<String>>,
    pub env_calls: AtomicU32,

    pub install_fail: AtomicBool,
    pub install_calls: Mutex<Vec<InstallCall>>,
    pub uninstall_fail: AtomicBool,
    pub uninstall_calls: Mutex<Vec<String>>,

    pub saved_env: Mutex<HashMap<String, HashMap<String, String>>>,
    pub save_env_fail: AtomicBool,

    /// Clients `check_client_installed` reports as absent.
    pub absent_clients: Mutex<Vec<ClientType>>,
    pub bun_missing: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn shared(self: &Arc<Self>) -> SharedGateway {
        self.clone()
    }

    pub async fn set_registry(&self, apps: Vec<AppDescriptor>) {
        *self.registry.lock().await = apps;
    }

    pub async fn set_statuses(&self, client: ClientType, statuses: AppStatuses) {
        self.statuses.lock().await.insert(client, statuses);
    }

    pub async fn set_status_delay(&self, client: ClientType, delay: Duration) {
        self.status_delays.lock().await.insert(client, delay);
    }

    pub async fn script_env(&self, responses: &[&str]) {
        let mut script = self.env_script.lock().await;
        script.clear();
        script.extend(responses.iter().map(|s| s.to_string()));
    }
}

/// Build statuses from `(name, installed, configured)` triples.
pub fn statuses(entries: &[(&str, bool, bool)]) -> AppStatuses {
    let mut result = AppStatuses::default();
    for (name, installed, configured) in entries {
        result.installed.insert(name.to_string(), *installed);
        result.configured.insert(name.to_string(), *configured);
    }
    result
}

#[async_trait]
impl Gateway for MockGateway {
    async fn ensure_environment(&self) -> Result<String, GatewayError> {
        self.env_calls.fetch_add(1, Ordering::Relaxed);
        let next = self.env_script.lock().await.pop_front();
        Ok(next.unwrap_or_else(|| "Environment is ready".to_string()))
    }

    async fn get_app_registry(&self) -> Result<Vec<AppDescriptor>, GatewayError> {
        if self.registry_fail.load(Ordering::Relaxed) {
            return Err(GatewayError::Unavailable("registry offline".into()));
        }
        Ok(self.registry.lock().await.clone())
    }

    async fn refresh_app_registry(&self) -> Result<Vec<AppDescriptor>, GatewayError> {
        if self.registry_fail.load(Ordering::Relaxed) {
            return Err(GatewayError::Unavailable("registry offline".into()));
        }
        if let Some(apps) = self.refreshed_registry.lock().await.clone() {
            return Ok(apps);
        }
        Ok(self.registry.lock().await.clone())
    }

    async fn get_app_statuses(&self, client: ClientType) -> Result<AppStatuses, GatewayError> {
        let delay = self.status_delays.lock().await.get(&client).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.statuses_fail.load(Ordering::Relaxed) {
            return Err(GatewayError::call("get_app_statuses", "config unreadable"));
        }
        Ok(self
            .statuses
            .lock()
            .await
            .get(&client)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_app_installed(
        &self,
        app_name: &str,
        client: ClientType,
    ) -> Result<bool, GatewayError> {
        Ok(self
            .statuses
            .lock()
            .await
            .get(&client)
            .map(|s| s.is_installed(app_name))
            .unwrap_or(false))
    }

    async fn is_app_configured(&self, app_name: &str) -> Result<bool, GatewayError> {
        Ok(self
            .statuses
            .lock()
            .await
            .values()
            .any(|s| s.is_configured(app_name)))
    }

    async fn install(
        &self,
        app_name: &str,
        env_vars: Option<&HashMap<String, String>>,
        client: ClientType,
    ) -> Result<String, GatewayError> {
        self.install_calls.lock().await.push(InstallCall {
            app_name: app_name.to_string(),
            env_vars: env_vars.cloned(),
            client,
        });
        if self.install_fail.load(Ordering::Relaxed) {
            return Err(GatewayError::call("install", "install script failed"));
        }
        Ok(format!("{app_name} installed"))
    }

    async fn uninstall(&self, app_name: &str, _client: ClientType) -> Result<String, GatewayError> {
        self.uninstall_calls.lock().await.push(app_name.to_string());
        if self.uninstall_fail.load(Ordering::Relaxed) {
            return Err(GatewayError::call("uninstall", "uninstall failed"));
        }
        Ok(format!("{app_name} uninstalled"))
    }

    async fn get_app_env(&self, app_name: &str) -> Result<HashMap<String, String>, GatewayError> {
        Ok(self
            .saved_env
            .lock()
            .await
            .get(app_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_app_env(
        &self,
        app_name: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), GatewayError> {
        if self.save_env_fail.load(Ordering::Relaxed) {
            return Err(GatewayError::call("save_app_env", "write failed"));
        }
        self.saved_env
            .lock()
            .await
            .insert(app_name.to_string(), values.clone());
        Ok(())
    }

    async fn restart_client_app(&self, client: ClientType) -> Result<String, GatewayError> {
        Ok(format!("{client} restarted"))
    }

    async fn check_client_installed(&self, client: ClientType) -> Result<bool, GatewayError> {
        Ok(!self.absent_clients.lock().await.contains(&client))
    }

    async fn check_uv_version(&self) -> Result<String, GatewayError> {
        Ok("uv 0.6.0".to_string())
    }

    async fn check_bun_version(&self) -> Result<String, GatewayError> {
        if self.bun_missing.load(Ordering::Relaxed) {
            return Err(GatewayError::call("check_bun_version", "bun not found"));
        }
        Ok("bun 1.2.0".to_string())
    }
}
