//! Chat client configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/parley/chat.toml`
//! - Windows: `%APPDATA%/parley/chat.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use parley_connection::{Backoff, ConnectionConfig, RetryPolicy};
use parley_protocol::constants::{RECONNECT_DELAY, WS_PING_PERIOD, WS_PONG_WAIT};
use serde::{Deserialize, Serialize};

/// Chat client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Server `host[:port]`.
    #[serde(default = "default_host")]
    pub host: String,

    /// Name to try first. Empty means prompt.
    #[serde(default)]
    pub username: String,

    #[serde(default = "default_ping_period")]
    pub ping_period_secs: u64,

    #[serde(default = "default_pong_wait")]
    pub pong_wait_secs: u64,

    /// Reconnection settings.
    #[serde(default)]
    pub retry: RetrySettings,
}

/// `[retry]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Give up after this many consecutive failures. Absent retries forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Growth factor between retries. Absent keeps the delay fixed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_factor: Option<f64>,

    /// Upper bound for the grown delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_host() -> String {
    "localhost:8000".into()
}

fn default_ping_period() -> u64 {
    WS_PING_PERIOD.as_secs()
}

fn default_pong_wait() -> u64 {
    WS_PONG_WAIT.as_secs()
}

fn default_delay_ms() -> u64 {
    RECONNECT_DELAY.as_millis() as u64
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_retries: None,
            backoff_factor: None,
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            username: String::new(),
            ping_period_secs: default_ping_period(),
            pong_wait_secs: default_pong_wait(),
            retry: RetrySettings::default(),
        }
    }
}

impl RetrySettings {
    /// Builds the manager's retry policy. A factor of 1 or less keeps the
    /// delay fixed.
    pub fn policy(&self) -> RetryPolicy {
        let initial = Duration::from_millis(self.delay_ms);
        let backoff = match self.backoff_factor {
            Some(factor) if factor > 1.0 => Backoff::Exponential {
                initial,
                factor,
                max: Duration::from_millis(self.max_delay_ms.max(self.delay_ms)),
            },
            _ => Backoff::Fixed(initial),
        };
        RetryPolicy {
            backoff,
            max_retries: self.max_retries,
        }
    }
}

impl ChatConfig {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: ChatConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = ChatConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Settings for the connection manager.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            retry: self.retry.policy(),
            ping_period: Duration::from_secs(self.ping_period_secs.max(1)),
            pong_wait: Duration::from_secs(self.pong_wait_secs.max(1)),
            ..ConnectionConfig::default()
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("parley")
            .join("chat.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("parley").join("chat.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/parley/chat.toml"))
    }
}
