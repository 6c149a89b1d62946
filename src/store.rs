//! Observable application state container.
//!
//! The store holds one [`AppState`] snapshot behind a `tokio::sync::watch`
//! channel. Every mutation replaces the whole snapshot (copy-on-write) —
//! interleaved async updates never see a half-edited state, and readers get
//! subscribe-and-select semantics without locks of their own.
//!
//! Stores are plain values, not process globals: tests instantiate isolated
//! instances and the binary wires exactly one into its [`crate::AppContext`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::clients::ClientType;
use crate::registry::AppDescriptor;
use crate::status::AppStatuses;

// ─── AppState ─────────────────────────────────────────────────────────────────

/// One immutable snapshot of everything the UI reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// The loaded registry of installable apps. Empty until the first
    /// successful load (readers fall back to the static catalog).
    pub apps: Vec<AppDescriptor>,
    /// True while a registry load is in flight — lets the UI show a
    /// placeholder instead of an empty list.
    pub is_loading_apps: bool,
    /// Installed/configured maps for the current client. Missing keys read
    /// as `false`, never as "unknown".
    pub app_statuses: AppStatuses,
    /// True until the first status load for the current client settles.
    pub is_loading_statuses: bool,
    /// The host client whose config file statuses refer to.
    pub current_client: ClientType,
    /// Set once the bootstrap sequence has been claimed for this process.
    pub has_initialized_installed_apps: bool,
}

impl AppState {
    fn initial() -> Self {
        Self {
            is_loading_statuses: true,
            ..Self::default()
        }
    }
}

// ─── Store ────────────────────────────────────────────────────────────────────

/// Shared handle to the observable state. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    tx: Arc<watch::Sender<AppState>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AppState::initial());
        Self { tx: Arc::new(tx) }
    }

    /// Current state snapshot (cloned out of the channel).
    pub fn snapshot(&self) -> AppState {
        self.tx.borrow().clone()
    }

    /// Replace the state with `f(current)`. The closure runs with exclusive
    /// access to the channel slot, so read-modify-write is atomic with
    /// respect to other `set_state` callers.
    pub fn set_state<F>(&self, f: F)
    where
        F: FnOnce(&AppState) -> AppState,
    {
        self.tx.send_modify(|state| {
            *state = f(state);
        });
    }

    /// Subscribe to state changes. The receiver observes whole snapshots;
    /// callers select the slice they care about.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }
}

// ─── ScopeToken ───────────────────────────────────────────────────────────────

/// Cancellation guard for async loads started by a UI scope.
///
/// When the initiating scope goes away (navigation, unmount) it cancels the
/// token; a load that resolves afterwards must not commit its result to the
/// store.
#[derive(Clone, Debug, Default)]
pub struct ScopeToken {
    cancelled: Arc<AtomicBool>,
}

impl ScopeToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_state_replaces_whole_snapshot() {
        let store = Store::new();
        store.set_state(|s| AppState {
            is_loading_apps: true,
            ..s.clone()
        });
        assert!(store.snapshot().is_loading_apps);
        assert!(store.snapshot().is_loading_statuses, "unrelated field kept");
    }

    #[test]
    fn initial_state_is_loading_statuses() {
        let store = Store::new();
        let state = store.snapshot();
        assert!(state.is_loading_statuses);
        assert!(!state.is_loading_apps);
        assert!(state.apps.is_empty());
        assert!(!state.has_initialized_installed_apps);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let store = Store::new();
        let mut rx = store.subscribe();
        store.set_state(|s| AppState {
            current_client: ClientType::Cursor,
            ..s.clone()
        });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().current_client, ClientType::Cursor);
    }

    #[test]
    fn scope_token_cancels_once_for_all_clones() {
        let token = ScopeToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
