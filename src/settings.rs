// SPDX-License-Identifier: MIT
//! Persisted key-value settings.
//!
//! Two flags live outside the in-memory store so they survive process
//! restarts: onboarding completion and the telemetry opt-out. They are
//! stored as string entries in `{data_dir}/settings.json` under fixed key
//! names. A missing or corrupt file reads as defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

const ONBOARDING_COMPLETED_KEY: &str = "onboarding-completed";
const TELEMETRY_DISABLED_KEY: &str = "telemetry-disabled";

/// Handle to the settings file.
#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
}

impl Settings {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("settings.json"),
        }
    }

    fn read(&self) -> HashMap<String, String> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "settings file unreadable — using defaults");
                HashMap::new()
            }
        }
    }

    fn write(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings dir {}", parent.display()))?;
        }
        let output = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, output)
            .with_context(|| format!("write settings file {}", self.path.display()))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.read();
        entries.insert(key.to_string(), value);
        self.write(&entries)
    }

    /// Whether the onboarding flow has been completed on this machine.
    pub fn onboarding_completed(&self) -> bool {
        self.read().get(ONBOARDING_COMPLETED_KEY).map(String::as_str) == Some("true")
    }

    pub fn set_onboarding_completed(&self, completed: bool) -> Result<()> {
        self.set(ONBOARDING_COMPLETED_KEY, completed.to_string())
    }

    /// Whether the user opted out of anonymous telemetry.
    pub fn telemetry_disabled(&self) -> bool {
        self.read().get(TELEMETRY_DISABLED_KEY).map(String::as_str) == Some("true")
    }

    pub fn set_telemetry_disabled(&self, disabled: bool) -> Result<()> {
        self.set(TELEMETRY_DISABLED_KEY, disabled.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_is_missing() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::new(tmp.path());
        assert!(!settings.onboarding_completed());
        assert!(!settings.telemetry_disabled());
    }

    #[test]
    fn flags_survive_a_new_handle() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::new(tmp.path());
        settings.set_onboarding_completed(true).unwrap();
        settings.set_telemetry_disabled(true).unwrap();

        // Fresh handle, same directory — models a process restart.
        let reopened = Settings::new(tmp.path());
        assert!(reopened.onboarding_completed());
        assert!(reopened.telemetry_disabled());
    }

    #[test]
    fn corrupt_file_reads_as_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("settings.json"), "{not json").unwrap();
        let settings = Settings::new(tmp.path());
        assert!(!settings.onboarding_completed());
        // And writing afterwards repairs the file.
        settings.set_onboarding_completed(true).unwrap();
        assert!(settings.onboarding_completed());
    }

    #[test]
    fn writes_keep_other_keys() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::new(tmp.path());
        settings.set_onboarding_completed(true).unwrap();
        settings.set_telemetry_disabled(true).unwrap();
        settings.set_telemetry_disabled(false).unwrap();
        assert!(settings.onboarding_completed());
        assert!(!settings.telemetry_disabled());
    }
}
