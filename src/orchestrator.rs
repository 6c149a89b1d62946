// SPDX-License-Identifier: MIT
//! Install/uninstall orchestration.
//!
//! Ties a user action to the gateway call, required setup-value collection,
//! the optimistic status patch, and the outcome notification. Status is
//! only ever patched after the gateway confirms success — the cache holds
//! confirmed-or-unknown state, never speculation.

use std::collections::HashMap;

use anyhow::{bail, Result};
use tracing::{error, info};

use crate::events::EventBroadcaster;
use crate::gateway::{GatewayError, SharedGateway};
use crate::registry::AppDescriptor;
use crate::status;
use crate::store::Store;

// ─── Phases ───────────────────────────────────────────────────────────────────

/// Where one app currently sits in the install lifecycle, derived from its
/// descriptor and the status cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    /// Environment/prerequisites do not allow install actions on this app.
    /// All affordances are disabled.
    NotConfigured,
    ConfiguredNotInstalled,
    AwaitingSetupInput,
    Installing,
    Installed,
    Uninstalling,
}

/// How an orchestrated action resolved. Gateway failures are reported here
/// (after notifying), not propagated as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Installed,
    Uninstalled,
    /// The app needs setup values before install can proceed.
    AwaitingSetupInput,
    /// The action is not allowed in the app's current phase.
    Blocked,
    /// The gateway call failed; state is unchanged, the error was notified.
    Failed,
}

// ─── Orchestrator ─────────────────────────────────────────────────────────────

/// Drives install/uninstall/configure actions for the attached store.
#[derive(Clone)]
pub struct Orchestrator {
    store: Store,
    gateway: SharedGateway,
    broadcaster: EventBroadcaster,
}

impl Orchestrator {
    pub fn new(store: Store, gateway: SharedGateway, broadcaster: EventBroadcaster) -> Self {
        Self {
            store,
            gateway,
            broadcaster,
        }
    }

    /// The resting phase for an app (never `Installing`/`Uninstalling` —
    /// those only exist while a call is in flight).
    pub fn phase_for(&self, app: &AppDescriptor) -> InstallPhase {
        let statuses = self.store.snapshot().app_statuses;
        if !statuses.is_configured(&app.name) {
            InstallPhase::NotConfigured
        } else if statuses.is_installed(&app.name) {
            InstallPhase::Installed
        } else {
            InstallPhase::ConfiguredNotInstalled
        }
    }

    /// Handle the "get" action for an app.
    ///
    /// Apps with required setup/env entries move to
    /// [`ActionOutcome::AwaitingSetupInput`] so the shell can collect
    /// values; everything else installs directly.
    pub async fn request_install(&self, app: &AppDescriptor) -> ActionOutcome {
        match self.phase_for(app) {
            InstallPhase::NotConfigured | InstallPhase::Installed => ActionOutcome::Blocked,
            _ if app.requires_setup() => ActionOutcome::AwaitingSetupInput,
            _ => self.perform_install(app, None).await,
        }
    }

    /// Submit collected setup values and install.
    ///
    /// Blocked locally — no gateway call, no notification — while any
    /// required field is empty.
    pub async fn submit_setup(
        &self,
        app: &AppDescriptor,
        values: &HashMap<String, String>,
    ) -> ActionOutcome {
        if self.phase_for(app) == InstallPhase::NotConfigured {
            return ActionOutcome::Blocked;
        }

        let missing: Vec<&str> = app
            .required_keys()
            .into_iter()
            .filter(|key| values.get(*key).map(|v| v.trim().is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return ActionOutcome::AwaitingSetupInput;
        }

        let outcome = self.perform_install(app, Some(values)).await;
        if outcome == ActionOutcome::Installed {
            // Setup-gated apps land on their configuration view after install.
            self.broadcaster.navigate_to_app(&app.name);
        }
        outcome
    }

    async fn perform_install(
        &self,
        app: &AppDescriptor,
        env_vars: Option<&HashMap<String, String>>,
    ) -> ActionOutcome {
        let client = self.store.snapshot().current_client;
        match self.gateway.install(&app.name, env_vars, client).await {
            Ok(result) => {
                info!(app = %app.name, client = %client, result = %result, "app installed");
                status::update_app_installation(&self.store, &app.name, true);
                self.broadcaster
                    .notify_success(&format!("{} installed", app.name), Some(client));
                ActionOutcome::Installed
            }
            Err(e) => {
                error!(app = %app.name, client = %client, error = %e, "install failed");
                self.broadcaster
                    .notify_error(&format!("Failed to install {}", app.name));
                ActionOutcome::Failed
            }
        }
    }

    /// Handle the "uninstall" action. No automatic retry on failure.
    pub async fn request_uninstall(&self, app: &AppDescriptor) -> ActionOutcome {
        if self.phase_for(app) != InstallPhase::Installed {
            return ActionOutcome::Blocked;
        }

        let client = self.store.snapshot().current_client;
        match self.gateway.uninstall(&app.name, client).await {
            Ok(result) => {
                info!(app = %app.name, client = %client, result = %result, "app uninstalled");
                status::update_app_installation(&self.store, &app.name, false);
                self.broadcaster
                    .notify_success(&format!("{} uninstalled", app.name), None);
                ActionOutcome::Uninstalled
            }
            Err(e) => {
                error!(app = %app.name, client = %client, error = %e, "uninstall failed");
                self.broadcaster
                    .notify_error(&format!("Failed to uninstall {}", app.name));
                ActionOutcome::Failed
            }
        }
    }

    /// Persist edited setup values for an installed app.
    ///
    /// Independent of install state transitions, but only allowed while the
    /// app is installed; configuring a not-yet-installed app goes through
    /// [`Self::submit_setup`] instead.
    pub async fn save_setup_values(
        &self,
        app: &AppDescriptor,
        values: &HashMap<String, String>,
    ) -> Result<()> {
        if self.phase_for(app) != InstallPhase::Installed {
            bail!("{} is not installed", app.name);
        }

        match self.gateway.save_app_env(&app.name, values).await {
            Ok(()) => {
                info!(app = %app.name, "setup values saved");
                self.broadcaster
                    .notify_success(&format!("{} configuration saved", app.name), None);
                Ok(())
            }
            Err(e) => {
                error!(app = %app.name, error = %e, "failed to save setup values");
                self.broadcaster
                    .notify_error(&format!("Failed to save {} configuration", app.name));
                Err(e.into())
            }
        }
    }

    /// Fetch the persisted setup values for an app — the gateway's copy is
    /// authoritative, so this is a passthrough.
    pub async fn load_setup_values(
        &self,
        app: &AppDescriptor,
    ) -> Result<HashMap<String, String>, GatewayError> {
        self.gateway.get_app_env(&app.name).await
    }

    /// Re-check one app's install state against the gateway and patch the
    /// cache with the confirmed value.
    ///
    /// Returns `None` when the probe fails; the cache is left untouched.
    pub async fn verify_installation(&self, app: &AppDescriptor) -> Option<bool> {
        let client = self.store.snapshot().current_client;
        match self.gateway.is_app_installed(&app.name, client).await {
            Ok(installed) => {
                status::update_app_installation(&self.store, &app.name, installed);
                Some(installed)
            }
            Err(e) => {
                error!(app = %app.name, error = %e, "installation probe failed");
                None
            }
        }
    }

    /// Relaunch the host client so it picks up config changes. Offered as
    /// the follow-up action on install success notifications.
    pub async fn relaunch_client(&self) {
        let client = self.store.snapshot().current_client;
        match self.gateway.restart_client_app(client).await {
            Ok(_) => {
                info!(client = %client, "host client relaunched");
            }
            Err(e) => {
                error!(client = %client, error = %e, "failed to relaunch host client");
                self.broadcaster
                    .notify_error(&format!("Failed to relaunch {client}"));
            }
        }
    }
}
