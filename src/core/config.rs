//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::core::models::ClientMode;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Per-request timeout for strict clients
pub const STRICT_TIMEOUT_MS: u64 = 30_000;

/// Per-request timeout for best-effort clients
pub const BEST_EFFORT_TIMEOUT_MS: u64 = 10_000;

/// App name tag used by best-effort clients when none is given
pub const DEFAULT_APP_NAME: &str = "Rust App";

/// Configuration for a translation client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, without a trailing slash
    pub base_url: String,
    /// Per-request timeout; `None` uses the mode's default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Propagate typed errors instead of falling back to the input
    pub strict: bool,
    /// Attribution tag sent by best-effort clients
    pub app_name: String,
    /// Overrides the mode's default `User-Agent`
    pub user_agent: Option<String>,
    /// Include the source language in cache keys
    pub source_aware_cache: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl ClientConfig {
    /// Configuration of an error-propagating client
    pub fn strict() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: None,
            strict: true,
            app_name: DEFAULT_APP_NAME.to_string(),
            user_agent: None,
            source_aware_cache: false,
        }
    }

    /// Configuration of a caching, fallback-on-failure client
    pub fn best_effort(app_name: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: None,
            strict: false,
            app_name: app_name.into(),
            user_agent: None,
            source_aware_cache: false,
        }
    }

    /// Replace the base URL, stripping trailing slashes
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }

    /// Set an explicit per-request timeout.
    ///
    /// Durations beyond `u64::MAX` milliseconds saturate; a zero duration is
    /// kept so that `validate` can reject it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(duration_millis(timeout));
        self
    }

    /// Key the best-effort cache on the source language as well
    pub fn with_source_aware_cache(mut self, enabled: bool) -> Self {
        self.source_aware_cache = enabled;
        self
    }

    /// Error policy selected by `strict`
    pub fn mode(&self) -> ClientMode {
        if self.strict {
            ClientMode::Strict
        } else {
            ClientMode::BestEffort
        }
    }

    /// Effective per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or_else(|| default_timeout_ms(self.mode())))
    }

    /// `User-Agent` sent with every request
    pub fn user_agent(&self) -> String {
        if let Some(agent) = &self.user_agent {
            return agent.clone();
        }
        match self.mode() {
            ClientMode::Strict => format!("CAI-Translation-Rust/{}", crate::VERSION),
            ClientMode::BestEffort => format!("CAI-Translation-{}/1.0", self.app_name),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `CAI_STRICT`, `CAI_API_URL`, `CAI_TIMEOUT_SECS` and
    /// `CAI_APP_NAME`; anything unset keeps the mode's default.
    pub fn from_env() -> anyhow::Result<Self> {
        let strict = match std::env::var("CAI_STRICT") {
            Ok(value) => parse_flag(&value)?,
            Err(_) => true,
        };

        let app_name = std::env::var("CAI_APP_NAME").unwrap_or_else(|_| DEFAULT_APP_NAME.to_string());
        let mut config = if strict {
            Self {
                app_name,
                ..Self::strict()
            }
        } else {
            Self::best_effort(app_name)
        };

        if let Ok(url) = std::env::var("CAI_API_URL") {
            config.base_url = normalize_base_url(&url);
        }

        if let Ok(secs) = std::env::var("CAI_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("CAI_TIMEOUT_SECS must be a whole number of seconds: {}", e))?;
            config.timeout_ms = Some(timeout_ms_from_secs(secs)?);
        }

        Ok(config)
    }

    /// Load from a JSON or YAML file, chosen by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.base_url = normalize_base_url(&config.base_url);
        info!("Loaded {} client configuration from {}", config.mode(), path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            return Err(anyhow::anyhow!("base_url is required"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!("base_url must start with http:// or https://"));
        }

        if self.timeout_ms == Some(0) {
            return Err(anyhow::anyhow!("timeout must be greater than 0"));
        }

        Ok(())
    }
}

/// Strip trailing slashes so paths can be appended with `format!`
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Default per-request timeout of a mode, in milliseconds
pub fn default_timeout_ms(mode: ClientMode) -> u64 {
    match mode {
        ClientMode::Strict => STRICT_TIMEOUT_MS,
        ClientMode::BestEffort => BEST_EFFORT_TIMEOUT_MS,
    }
}

/// Convert a timeout in whole seconds to milliseconds, rejecting overflow
pub fn timeout_ms_from_secs(secs: u64) -> anyhow::Result<u64> {
    secs.checked_mul(1000)
        .ok_or_else(|| anyhow::anyhow!("timeout of {} seconds is too large", secs))
}

pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("invalid boolean value: {}", other)),
    }
}
