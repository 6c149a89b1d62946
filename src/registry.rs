//! App registry — descriptors for installable integrations and the loader
//! that keeps the store's catalog in sync with the gateway.
//!
//! Descriptors are immutable once loaded; the whole set is replaced on load
//! or refresh, never edited in place.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::gateway::SharedGateway;
use crate::status;
use crate::store::{AppState, ScopeToken, Store};

// ─── Descriptor types ─────────────────────────────────────────────────────────

/// One installable integration as served by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDescriptor {
    /// Unique identifier — the stable key across registry and status maps.
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub price: String,
    pub icon: Icon,
    /// Ordered setup steps shown before install. When present, its `input`
    /// items define the required values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<Vec<SetupItem>>,
    /// Required secrets collected before install when `setup` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<EnvVarSpec>>,
}

impl AppDescriptor {
    /// Keys the user must fill in before this app can be installed.
    ///
    /// `setup` takes precedence over `env_vars` when both are present.
    pub fn required_keys(&self) -> Vec<&str> {
        if let Some(setup) = &self.setup {
            setup
                .iter()
                .filter_map(|item| match item {
                    SetupItem::Input { key, .. } => Some(key.as_str()),
                    SetupItem::Text { .. } => None,
                })
                .collect()
        } else if let Some(vars) = &self.env_vars {
            vars.iter().map(|v| v.name.as_str()).collect()
        } else {
            Vec::new()
        }
    }

    /// Whether installing this app requires collecting values first.
    pub fn requires_setup(&self) -> bool {
        !self.required_keys().is_empty()
    }
}

/// App icon — either an image pair or a symbolic icon name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Icon {
    Url { url: IconUrl },
    Lucide { icon: String },
}

/// Light/dark image references for [`Icon::Url`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconUrl {
    pub light: String,
    pub dark: String,
}

/// One step of an app's setup sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SetupItem {
    /// Informational step with static content.
    Text { label: String, value: String },
    /// Editable value, persisted under `key` via the gateway.
    Input {
        key: String,
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
}

/// A required secret for apps without a full setup sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVarSpec {
    pub name: String,
    pub label: String,
    pub description: String,
}

// ─── Static fallback catalog ──────────────────────────────────────────────────

fn url_icon(light: &str, dark: &str) -> Icon {
    Icon::Url {
        url: IconUrl {
            light: light.to_string(),
            dark: dark.to_string(),
        },
    }
}

fn lucide_icon(name: &str) -> Icon {
    Icon::Lucide {
        icon: name.to_string(),
    }
}

fn plain_app(
    name: &str,
    description: &str,
    icon: Icon,
    category: &str,
    price: &str,
    developer: &str,
) -> AppDescriptor {
    AppDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        developer: developer.to_string(),
        price: price.to_string(),
        icon,
        setup: None,
        env_vars: None,
    }
}

/// The built-in catalog used when the registry has never loaded.
pub fn default_apps() -> Vec<AppDescriptor> {
    vec![
        plain_app(
            "Browser",
            "Web browser",
            url_icon("/servers/browser.svg", "/servers/browser.svg"),
            "Utilities",
            "Get",
            "Google LLC",
        ),
        plain_app(
            "Time",
            "Time",
            lucide_icon("clock"),
            "Utilities",
            "Get",
            "Model Context Protocol",
        ),
        plain_app(
            "Hacker News",
            "Hacker News",
            url_icon("/servers/yc.svg", "/servers/yc.svg"),
            "Social",
            "Get",
            "Y Combinator",
        ),
        AppDescriptor {
            env_vars: Some(vec![EnvVarSpec {
                name: "LINEAR_API_KEY".to_string(),
                label: "Linear API Key".to_string(),
                description: "Your Linear API key for authentication".to_string(),
            }]),
            ..plain_app(
                "Linear",
                "Linear",
                url_icon("/servers/linear-dark.svg", "/servers/linear-light.svg"),
                "Productivity",
                "Get",
                "Linear",
            )
        },
        plain_app(
            "Gmail",
            "Email and messaging platform",
            url_icon("/servers/gmail.svg", "/servers/gmail.svg"),
            "Productivity",
            "Free",
            "Google LLC",
        ),
        plain_app(
            "Google Calendar",
            "Schedule and organize events",
            url_icon("/servers/gcal.svg", "/servers/gcal.svg"),
            "Productivity",
            "Free",
            "Google LLC",
        ),
        plain_app(
            "Google Drive",
            "Cloud storage and file sharing",
            lucide_icon("hard-drive"),
            "Productivity",
            "Free",
            "Google LLC",
        ),
    ]
}

/// The loaded registry, or the static catalog when nothing has loaded yet.
pub fn apps_or_default(store: &Store) -> Vec<AppDescriptor> {
    let apps = store.snapshot().apps;
    if apps.is_empty() {
        default_apps()
    } else {
        apps
    }
}

/// Look up one descriptor by name in the effective catalog.
pub fn find_app(store: &Store, name: &str) -> Option<AppDescriptor> {
    apps_or_default(store).into_iter().find(|a| a.name == name)
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Load the registry from the gateway and replace the store's catalog.
///
/// On failure the catalog is set to empty (fails open — the UI shows no
/// apps rather than stale or partial data) and the failure is logged only;
/// background load errors are not surfaced to the user.
pub async fn load_apps(store: &Store, gateway: &SharedGateway) -> Vec<AppDescriptor> {
    load_apps_scoped(store, gateway, &ScopeToken::new()).await
}

/// [`load_apps`] with a cancellation scope. A result that arrives after the
/// scope was cancelled is returned to the caller but not committed.
pub async fn load_apps_scoped(
    store: &Store,
    gateway: &SharedGateway,
    scope: &ScopeToken,
) -> Vec<AppDescriptor> {
    store.set_state(|s| AppState {
        is_loading_apps: true,
        ..s.clone()
    });

    let result = gateway.get_app_registry().await;

    // A cancelled scope discards the payload but must still clear the
    // loading flag, or the UI shows a placeholder forever.
    if scope.is_cancelled() {
        debug!("discarding cancelled registry load");
        store.set_state(|s| AppState {
            is_loading_apps: false,
            ..s.clone()
        });
        return result.unwrap_or_default();
    }

    match result {
        Ok(apps) => {
            debug!(count = apps.len(), "app registry loaded");
            let committed = apps.clone();
            store.set_state(move |s| AppState {
                apps: committed,
                is_loading_apps: false,
                ..s.clone()
            });
            apps
        }
        Err(e) => {
            warn!(error = %e, "failed to load app registry");
            store.set_state(|s| AppState {
                apps: Vec::new(),
                is_loading_apps: false,
                ..s.clone()
            });
            Vec::new()
        }
    }
}

/// Force-refresh the registry from its remote source, then reload statuses
/// for the current client. Registry and status must not diverge: new apps
/// may have appeared, so a catalog refresh always invalidates the cache.
pub async fn refresh_apps(store: &Store, gateway: &SharedGateway) -> Vec<AppDescriptor> {
    store.set_state(|s| AppState {
        is_loading_apps: true,
        ..s.clone()
    });

    let apps = match gateway.refresh_app_registry().await {
        Ok(apps) => {
            debug!(count = apps.len(), "app registry refreshed");
            let committed = apps.clone();
            store.set_state(move |s| AppState {
                apps: committed,
                is_loading_apps: false,
                ..s.clone()
            });
            apps
        }
        Err(e) => {
            warn!(error = %e, "failed to refresh app registry");
            store.set_state(|s| AppState {
                apps: Vec::new(),
                is_loading_apps: false,
                ..s.clone()
            });
            Vec::new()
        }
    };

    let client = store.snapshot().current_client;
    status::load_app_statuses(store, gateway, client).await;

    apps
}

/// Parse a registry payload. Used by gateway implementations and tests.
pub fn parse_registry(raw: &str) -> Result<Vec<AppDescriptor>, serde_json::Error> {
    serde_json::from_str(raw)
}
