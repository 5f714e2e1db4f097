//! Client configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use xtuis_limit::LimiterSet;
use xtuis_limit::MAX_TIMES_PER_DAY;
use xtuis_limit::MAX_TIMES_PER_MINUTE;
use xtuis_limit::WindowSpec;

use crate::error::Error;
use crate::error::Result;

/// Default push server.
pub const DEFAULT_SERVER_URL: &str = "https://wx.xtuis.cn";

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Push server base URL
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Quota windows, checked in order before every send
    #[serde(default = "default_limits")]
    pub limits: Vec<LimitConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            timeout_secs: default_timeout_secs(),
            limits: default_limits(),
        }
    }
}

/// One named quota window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConfig {
    pub name: String,

    /// Messages permitted per window
    pub capacity: usize,

    /// Window length in seconds
    pub window_secs: u64,
}

impl From<&LimitConfig> for WindowSpec {
    fn from(config: &LimitConfig) -> Self {
        WindowSpec::new(
            config.name.clone(),
            config.capacity,
            Duration::from_secs(config.window_secs),
        )
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_limits() -> Vec<LimitConfig> {
    vec![
        LimitConfig {
            name: "day".to_string(),
            capacity: MAX_TIMES_PER_DAY,
            window_secs: 24 * 60 * 60,
        },
        LimitConfig {
            name: "minute".to_string(),
            capacity: MAX_TIMES_PER_MINUTE,
            window_secs: 60,
        },
    ]
}

impl ClientConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: ClientConfig =
            serde_yaml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "server_url must be an http(s) URL, got {:?}",
                self.server_url
            )));
        }
        if let Some(dup) = self
            .limits
            .iter()
            .enumerate()
            .find(|(i, l)| self.limits[..*i].iter().any(|p| p.name == l.name))
        {
            return Err(Error::Config(format!("duplicate limit {:?}", dup.1.name)));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds fresh limiters for the configured windows.
    pub fn limiter_set(&self) -> LimiterSet {
        let specs: Vec<WindowSpec> = self.limits.iter().map(WindowSpec::from).collect();
        LimiterSet::from_windows(&specs)
    }
}
