//! Per-client installation status cache.
//!
//! Two parallel maps, app name → bool, refreshed wholesale from the gateway
//! and patched one key at a time after a confirmed install or uninstall.
//! Both maps always refer to the store's current client; a reload that
//! settles after the client changed is discarded rather than committed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clients::ClientType;
use crate::gateway::SharedGateway;
use crate::registry;
use crate::store::{AppState, ScopeToken, Store};

// ─── AppStatuses ──────────────────────────────────────────────────────────────

/// Installed/configured maps for one host client.
///
/// Missing keys read as `false` — absence never means "unknown, go fetch".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppStatuses {
    #[serde(default)]
    pub installed: HashMap<String, bool>,
    #[serde(default)]
    pub configured: HashMap<String, bool>,
}

impl AppStatuses {
    pub fn is_installed(&self, app_name: &str) -> bool {
        self.installed.get(app_name).copied().unwrap_or(false)
    }

    pub fn is_configured(&self, app_name: &str) -> bool {
        self.configured.get(app_name).copied().unwrap_or(false)
    }
}

// ─── Status loading ───────────────────────────────────────────────────────────

/// Fetch both maps for `client` and replace the cache atomically.
///
/// On failure both maps reset to empty and the loading flag clears — the
/// cache never mixes stale data with a failure state.
pub async fn load_app_statuses(store: &Store, gateway: &SharedGateway, client: ClientType) {
    load_app_statuses_scoped(store, gateway, client, &ScopeToken::new()).await;
}

/// [`load_app_statuses`] with a cancellation scope.
pub async fn load_app_statuses_scoped(
    store: &Store,
    gateway: &SharedGateway,
    client: ClientType,
    scope: &ScopeToken,
) {
    store.set_state(|s| AppState {
        is_loading_statuses: true,
        ..s.clone()
    });

    let result = gateway.get_app_statuses(client).await;

    // A result for a client that is no longer current would overwrite the
    // cache with data for the wrong config file. Discard the payload, but
    // still clear the loading flag so the UI does not spin forever.
    if scope.is_cancelled() || store.snapshot().current_client != client {
        debug!(client = %client, "discarding stale status load");
        store.set_state(|s| AppState {
            is_loading_statuses: false,
            ..s.clone()
        });
        return;
    }

    match result {
        Ok(statuses) => {
            debug!(
                client = %client,
                installed = statuses.installed.len(),
                configured = statuses.configured.len(),
                "app statuses loaded"
            );
            store.set_state(move |s| AppState {
                app_statuses: statuses,
                is_loading_statuses: false,
                ..s.clone()
            });
        }
        Err(e) => {
            warn!(client = %client, error = %e, "failed to load app statuses");
            store.set_state(|s| AppState {
                app_statuses: AppStatuses::default(),
                is_loading_statuses: false,
                ..s.clone()
            });
        }
    }
}

/// Synchronous, local-only patch of one `installed` key.
///
/// Applied after the gateway has confirmed an install or uninstall, so the
/// UI flips immediately without waiting for a full reload. `configured` is
/// untouched.
pub fn update_app_installation(store: &Store, app_name: &str, is_installed: bool) {
    let app_name = app_name.to_string();
    store.set_state(move |s| {
        let mut next = s.clone();
        next.app_statuses.installed.insert(app_name, is_installed);
        next
    });
}

/// Switch the active host client.
///
/// Status is reloaded strictly before the registry: the registry refresh
/// path triggers its own status reload, so this ordering converges to
/// statuses for the new client plus an up-to-date catalog.
pub async fn update_current_client(store: &Store, gateway: &SharedGateway, client: ClientType) {
    store.set_state(|s| AppState {
        current_client: client,
        ..s.clone()
    });

    load_app_statuses(store, gateway, client).await;
    registry::load_apps(store, gateway).await;
}

/// Which host clients are actually present on this machine.
///
/// Used by the client selector to grey out absent clients. A probe failure
/// counts as "not installed" — the selector degrades, it does not error.
pub async fn available_clients(gateway: &SharedGateway) -> Vec<ClientType> {
    let mut available = Vec::new();
    for client in ClientType::all() {
        match gateway.check_client_installed(client).await {
            Ok(true) => available.push(client),
            Ok(false) => {}
            Err(e) => {
                debug!(client = %client, error = %e, "client probe failed");
            }
        }
    }
    available
}
