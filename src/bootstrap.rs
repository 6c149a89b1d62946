// SPDX-License-Identifier: MIT
//! One-time environment bootstrap.
//!
//! Before the first status/registry load the gateway must get a chance to
//! prepare prerequisite tooling. The ensure call is retried a bounded
//! number of times with a fixed delay; after exhaustion the store proceeds
//! in degraded mode rather than blocking the UI (the list may then reflect
//! an unprepared environment — acceptable, not fatal).

use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use crate::gateway::SharedGateway;
use crate::registry;
use crate::status;
use crate::store::{AppState, Store};

/// Attempts for the environment-ensure call, including the first try.
pub const ENV_MAX_ATTEMPTS: u32 = 3;
/// Fixed delay between environment-ensure attempts.
pub const ENV_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Substrings in an `ensure_environment` response that mark the attempt as
/// a retryable failure even though the call itself succeeded.
const FAILURE_MARKERS: &[&str] = &["error", "not found", "failed"];

fn looks_like_failure(status: &str) -> bool {
    let lower = status.to_lowercase();
    FAILURE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Call `ensure_environment` up to `max_attempts` times with a fixed
/// `delay` between attempts.
///
/// A transport error or a failure-indicating response string both count as
/// retryable. Returns the first healthy status string, or the last error
/// after exhaustion. A `max_attempts` of zero reads as one — the call is
/// always made at least once. Pure with respect to store state —
/// independently testable.
pub async fn ensure_environment_with_retry(
    gateway: &SharedGateway,
    max_attempts: u32,
    delay: Duration,
) -> Result<String> {
    let max_attempts = max_attempts.max(1);

    let mut last_err = None;

    for attempt in 1..=max_attempts {
        match gateway.ensure_environment().await {
            Ok(env_status) if !looks_like_failure(&env_status) => {
                if attempt > 1 {
                    debug!(attempt, "environment ready after retry");
                }
                return Ok(env_status);
            }
            Ok(env_status) => {
                warn!(
                    attempt,
                    max = max_attempts,
                    status = %env_status,
                    "environment not ready"
                );
                last_err = Some(anyhow!("environment not ready: {env_status}"));
            }
            Err(e) => {
                warn!(attempt, max = max_attempts, error = %e, "environment check failed");
                last_err = Some(e.into());
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(delay).await;
        }
    }

    // The loop runs at least once, so last_err is always set here.
    Err(last_err.unwrap_or_else(|| anyhow!("environment not ready")))
}

/// Run the startup sequence exactly once per process lifetime.
///
/// Sequencing: environment-ensure strictly before the first status load,
/// status strictly before the registry. The guard flag is claimed up front
/// inside the state swap, so concurrent callers (component remounts) see
/// it and return without a second run.
pub async fn initialize(store: &Store, gateway: &SharedGateway) {
    initialize_with_retry(store, gateway, ENV_MAX_ATTEMPTS, ENV_RETRY_DELAY).await;
}

/// [`initialize`] with explicit retry knobs.
pub async fn initialize_with_retry(
    store: &Store,
    gateway: &SharedGateway,
    max_attempts: u32,
    delay: Duration,
) {
    let mut claimed = false;
    store.set_state(|s| {
        if s.has_initialized_installed_apps {
            s.clone()
        } else {
            claimed = true;
            AppState {
                has_initialized_installed_apps: true,
                ..s.clone()
            }
        }
    });
    if !claimed {
        return;
    }

    match ensure_environment_with_retry(gateway, max_attempts, delay).await {
        Ok(env_status) => info!(status = %env_status, "environment ready"),
        Err(e) => {
            // Degraded mode: the environment never came up, but the UI must
            // not block on it.
            warn!(error = %e, "proceeding without a prepared environment");
        }
    }

    let client = store.snapshot().current_client;
    status::load_app_statuses(store, gateway, client).await;
    registry::load_apps(store, gateway).await;
}

/// Detected versions of the prerequisite tools, for diagnostics surfaces.
/// `None` means the tool is missing or not on the path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolVersions {
    pub uv: Option<String>,
    pub bun: Option<String>,
}

/// Probe the environment tooling versions. Probe failures read as absent
/// tools, never as errors.
pub async fn tool_versions(gateway: &SharedGateway) -> ToolVersions {
    ToolVersions {
        uv: gateway.check_uv_version().await.ok(),
        bun: gateway.check_bun_version().await.ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_markers_are_case_insensitive() {
        assert!(looks_like_failure("Error: uv not found"));
        assert!(looks_like_failure("install FAILED"));
        assert!(!looks_like_failure("Environment is ready"));
    }
}
