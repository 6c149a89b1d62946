//! Host client selection.
//!
//! An app's installed/configured status is only meaningful relative to one
//! host client's configuration file, so the active client is part of the
//! store state and switching it invalidates the status cache.

use serde::{Deserialize, Serialize};

/// The closed set of supported host clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientType {
    #[default]
    Claude,
    Cursor,
    Windsurf,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Claude => "Claude",
            ClientType::Cursor => "Cursor",
            ClientType::Windsurf => "Windsurf",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Claude" => Some(ClientType::Claude),
            "Cursor" => Some(ClientType::Cursor),
            "Windsurf" => Some(ClientType::Windsurf),
            _ => None,
        }
    }

    pub fn all() -> Vec<ClientType> {
        vec![ClientType::Claude, ClientType::Cursor, ClientType::Windsurf]
    }
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for client in ClientType::all() {
            assert_eq!(ClientType::from_str(client.as_str()), Some(client));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(ClientType::from_str("Zed"), None);
    }

    #[test]
    fn default_is_claude() {
        assert_eq!(ClientType::default(), ClientType::Claude);
    }
}
