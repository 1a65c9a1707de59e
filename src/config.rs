use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::overlay::Anchor;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const DEBUG_ENV: &str = "LABEL_BRIDGE_DEBUG";
pub const SESSION_TIMEOUT_ENV: &str = "LABEL_BRIDGE_SESSION_TIMEOUT_MS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// How long a session update waits for `finishDidUpdateSessionCallback`.
    pub session_callback_timeout_ms: u64,
    pub ui_thread_name: String,
    pub debug: bool,
    /// Anchor for views attached without one.
    pub default_anchor: Anchor,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            session_callback_timeout_ms: 2_000,
            ui_thread_name: "label-bridge-ui".into(),
            debug: false,
            default_anchor: Anchor::Center,
        }
    }
}

impl BridgeConfig {
    /// Read from a JSON file. A missing file gives the defaults; so does a file that
    /// does not parse, with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read bridge config from {}", path.display()))?;

        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            log_warn!("Ignoring malformed bridge config {}: {err}", path.display());
            Self::default()
        }))
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; unparsable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(DEBUG_ENV) {
            self.debug = value == "1" || value.eq_ignore_ascii_case("true");
        }

        if let Some(value) = lookup(SESSION_TIMEOUT_ENV) {
            match value.trim().parse() {
                Ok(timeout_ms) => self.session_callback_timeout_ms = timeout_ms,
                Err(_) => log_warn!("Ignoring {SESSION_TIMEOUT_ENV}={value}: not a number"),
            }
        }

        self
    }

    pub fn session_callback_timeout(&self) -> Duration {
        Duration::from_millis(self.session_callback_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        fs::write(
            &path,
            r#"{"sessionCallbackTimeoutMs": 150, "defaultAnchor": "topLeft"}"#,
        )
        .unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.session_callback_timeout(), Duration::from_millis(150));
        assert_eq!(config.default_anchor, Anchor::TopLeft);
        assert_eq!(config.ui_thread_name, "label-bridge-ui");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(BridgeConfig::load(&path).unwrap(), BridgeConfig::default());
    }

    #[test]
    fn overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> =
            [(DEBUG_ENV, "TRUE"), (SESSION_TIMEOUT_ENV, "soon")].into_iter().collect();
        let config =
            BridgeConfig::default().with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert!(config.debug);
        assert_eq!(config.session_callback_timeout_ms, 2_000);

        let config = BridgeConfig::default()
            .with_overrides(|key| (key == SESSION_TIMEOUT_ENV).then(|| "250".to_string()));
        assert_eq!(config.session_callback_timeout_ms, 250);
        assert!(!config.debug);
    }
}
