//! User-facing notification fan-out.
//!
//! The store core does not render toasts or navigate; it publishes JSON
//! notifications on a broadcast channel and whatever UI shell is attached
//! subscribes. No subscribers is not an error.

use serde_json::{json, Value};

use tokio::sync::broadcast;

use crate::clients::ClientType;

/// Broadcasts JSON notification strings to all attached UI shells.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<String>,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Send a notification to all subscribers.
    pub fn broadcast(&self, method: &str, params: Value) {
        let notification = json!({
            "method": method,
            "params": params
        });
        // Ignore errors — no subscribers is fine
        let _ = self
            .tx
            .send(serde_json::to_string(&notification).unwrap_or_default());
    }

    /// Toast-style success notification, optionally offering a "relaunch
    /// the host client" follow-up action.
    pub fn notify_success(&self, message: &str, relaunch: Option<ClientType>) {
        let params = match relaunch {
            Some(client) => json!({
                "message": message,
                "action": {
                    "label": format!("Relaunch {client}"),
                    "command": "restart_client_app",
                    "client": client.as_str()
                }
            }),
            None => json!({ "message": message }),
        };
        self.broadcast("notify.success", params);
    }

    /// Toast-style error notification.
    pub fn notify_error(&self, message: &str) {
        self.broadcast("notify.error", json!({ "message": message }));
    }

    /// Ask the shell to navigate to an app's detail/configuration view.
    pub fn navigate_to_app(&self, app_name: &str) {
        self.broadcast("navigate.app", json!({ "name": app_name }));
    }

    /// Subscribe to all notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}
