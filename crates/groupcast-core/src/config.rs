//! groupcast configuration system.
//!
//! Values come from three layers, later layers winning: built-in defaults,
//! the TOML config file, and `GROUPCAST_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GroupcastError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GroupcastConfig {
    /// Bot API token. Usually supplied via `GROUPCAST_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: String,
    /// The fixed promotional text sent to every eligible group.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl GroupcastConfig {
    /// Load config from the default path (~/.groupcast/config.toml).
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::default_path())
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GroupcastError::Config(format!("failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| GroupcastError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::state_dir().join("config.toml")
    }

    /// Get the groupcast state directory (~/.groupcast).
    pub fn state_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".groupcast")
    }

    /// Apply `GROUPCAST_*` environment variables over the loaded values.
    pub fn overlay_env(&mut self) {
        self.overlay_from(|key| std::env::var(key).ok());
    }

    /// Overlay from an arbitrary key→value source (env in production,
    /// a map in tests).
    pub fn overlay_from<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = get("GROUPCAST_BOT_TOKEN") {
            self.bot_token = token;
        }
        if let Some(message) = get("GROUPCAST_MESSAGE") {
            self.message = message;
        }
        if let Some(raw) = get("GROUPCAST_COOLDOWN_SECS") {
            match raw.parse() {
                Ok(secs) => self.timing.cooldown_secs = secs,
                Err(_) => tracing::warn!("ignoring invalid GROUPCAST_COOLDOWN_SECS: {raw}"),
            }
        }
        if let Some(raw) = get("GROUPCAST_CHECK_INTERVAL_SECS") {
            match raw.parse() {
                Ok(secs) => self.timing.check_interval_secs = secs,
                Err(_) => tracing::warn!("ignoring invalid GROUPCAST_CHECK_INTERVAL_SECS: {raw}"),
            }
        }
    }

    /// Reject configurations the program cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(GroupcastError::Config(
                "bot_token is not set. Put it in config.toml or export GROUPCAST_BOT_TOKEN.".into(),
            ));
        }
        if self.message.trim().is_empty() {
            return Err(GroupcastError::Config(
                "message is not set. Put it in config.toml or export GROUPCAST_MESSAGE.".into(),
            ));
        }
        Ok(())
    }
}

/// Loop timing. Defaults match the behavior this tool always had:
/// a two-hour per-group cooldown, ten seconds between sends, a new
/// cycle every minute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_inter_send_delay_secs")]
    pub inter_send_delay_secs: u64,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_cooldown_secs() -> u64 {
    7200
}
fn default_inter_send_delay_secs() -> u64 {
    10
}
fn default_check_interval_secs() -> u64 {
    60
}
fn default_error_backoff_secs() -> u64 {
    60
}
fn default_poll_timeout_secs() -> u64 {
    30
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            inter_send_delay_secs: default_inter_send_delay_secs(),
            check_interval_secs: default_check_interval_secs(),
            error_backoff_secs: default_error_backoff_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

/// Which groups are broadcast to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Chat ids seeded into the roster at startup, before any update
    /// has been observed.
    #[serde(default)]
    pub include: Vec<i64>,
    /// Chat ids never sent to, even while the account belongs to them.
    #[serde(default)]
    pub exclude: Vec<i64>,
    /// Upper bound on groups touched per cycle, oldest membership first.
    #[serde(default = "default_max_groups")]
    pub max_groups: usize,
}

fn default_max_groups() -> usize {
    200
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            max_groups: default_max_groups(),
        }
    }
}

/// Platform API endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Override for self-hosted Bot API servers.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Client identity sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://api.telegram.org".into()
}
fn default_user_agent() -> String {
    concat!("groupcast/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = GroupcastConfig::default();
        assert_eq!(config.timing.cooldown_secs, 7200);
        assert_eq!(config.timing.inter_send_delay_secs, 10);
        assert_eq!(config.timing.check_interval_secs, 60);
        assert_eq!(config.roster.max_groups, 200);
        assert_eq!(config.api.base_url, "https://api.telegram.org");
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            bot_token = "123:abc"
            message = "Visit our channel!"

            [timing]
            cooldown_secs = 3600
            inter_send_delay_secs = 5

            [roster]
            include = [-1001, -1002]
            exclude = [-1003]
        "#;

        let config: GroupcastConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.timing.cooldown_secs, 3600);
        assert_eq!(config.timing.inter_send_delay_secs, 5);
        // untouched sections keep their defaults
        assert_eq!(config.timing.check_interval_secs, 60);
        assert_eq!(config.roster.include, vec![-1001, -1002]);
        assert_eq!(config.roster.exclude, vec![-1003]);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: GroupcastConfig = toml::from_str("").unwrap();
        assert_eq!(config.timing.cooldown_secs, 7200);
        assert_eq!(config.roster.max_groups, 200);
        assert!(config.bot_token.is_empty());
    }

    #[test]
    fn test_env_overlay() {
        let mut env = HashMap::new();
        env.insert("GROUPCAST_BOT_TOKEN".to_string(), "999:xyz".to_string());
        env.insert("GROUPCAST_MESSAGE".to_string(), "hello".to_string());
        env.insert("GROUPCAST_COOLDOWN_SECS".to_string(), "1800".to_string());

        let mut config = GroupcastConfig::default();
        config.overlay_from(|key| env.get(key).cloned());

        assert_eq!(config.bot_token, "999:xyz");
        assert_eq!(config.message, "hello");
        assert_eq!(config.timing.cooldown_secs, 1800);
        // untouched key keeps its default
        assert_eq!(config.timing.check_interval_secs, 60);
    }

    #[test]
    fn test_env_overlay_rejects_garbage_numbers() {
        let mut config = GroupcastConfig::default();
        config.overlay_from(|key| {
            (key == "GROUPCAST_COOLDOWN_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config.timing.cooldown_secs, 7200);
    }

    #[test]
    fn test_validate_requires_token_and_message() {
        let mut config = GroupcastConfig::default();
        assert!(config.validate().is_err());

        config.bot_token = "123:abc".into();
        assert!(config.validate().is_err());

        config.message = "promo".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_state_dir() {
        let dir = GroupcastConfig::state_dir();
        assert!(dir.to_string_lossy().contains("groupcast"));
    }
}
