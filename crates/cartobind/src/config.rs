//! Application configuration.
//!
//! [`AppConfig`] is read from TOML. Every section and key is optional; the
//! defaults reproduce the stock application:
//!
//! ```toml
//! [portal]
//! url = "https://www.arcgis.com"
//! login_required = true
//!
//! [credentials]
//! identifier = "cartobind"
//!
//! [bindings]
//! throttle_window_ms = 10
//! rotate_window_ms = 100
//! identify_window_ms = 1000
//!
//! [logging]
//! filter = "info"
//!
//! [runtime]
//! worker_threads = 2
//! thread_name = "cartobind-async"
//! ```

use std::path::Path;
use std::time::Duration;

use cartobind_core::AsyncRuntimeConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

const DEFAULT_PORTAL_URL: &str = "https://www.arcgis.com";

/// Portal connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortalConfig {
    /// Portal root URL.
    pub url: String,
    /// Whether loading the portal must yield a signed-in user.
    pub login_required: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PORTAL_URL.to_string(),
            login_required: true,
        }
    }
}

/// Credential persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialConfig {
    /// Keychain identifier credentials are persisted under.
    pub identifier: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            identifier: "cartobind".to_string(),
        }
    }
}

/// Coalescing windows, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingConfig {
    /// Window for property-change refreshes.
    pub throttle_window_ms: u64,
    /// Window for rotate-to-north requests.
    pub rotate_window_ms: u64,
    /// Window for identify-at-point requests.
    pub identify_window_ms: u64,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            throttle_window_ms: 10,
            rotate_window_ms: 100,
            identify_window_ms: 1000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing-subscriber` `EnvFilter` directive string.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Async runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Worker thread count; `None` uses one per core.
    pub worker_threads: Option<usize>,
    /// Thread name prefix.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "cartobind-async".to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub portal: PortalConfig,
    pub credentials: CredentialConfig,
    pub bindings: BindingConfig,
    pub logging: LoggingConfig,
    pub runtime: RuntimeConfig,
}

impl AppConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: "cartobind::config", path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|e| ConfigError::io(path, e))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.portal_url()?;
        if self.bindings.throttle_window_ms == 0 {
            return Err(ConfigError::invalid_value(
                "bindings.throttle_window_ms",
                "must be greater than zero",
            ));
        }
        if self.runtime.worker_threads == Some(0) {
            return Err(ConfigError::invalid_value(
                "runtime.worker_threads",
                "must be greater than zero",
            ));
        }
        if self.credentials.identifier.is_empty() {
            return Err(ConfigError::invalid_value("credentials.identifier", "must not be empty"));
        }
        Ok(())
    }

    /// The parsed portal URL; only `http` and `https` URLs with a host are accepted.
    pub fn portal_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.portal.url).map_err(|e| ConfigError::invalid_value("portal.url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid_value(
                "portal.url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::invalid_value("portal.url", "missing host"));
        }
        Ok(url)
    }

    /// Set the portal URL.
    pub fn with_portal_url(mut self, url: &Url) -> Self {
        self.portal.url = url.to_string();
        self
    }

    /// Set the property-change coalescing window.
    pub fn with_throttle_window(mut self, window: Duration) -> Self {
        self.bindings.throttle_window_ms = window.as_millis() as u64;
        self
    }

    /// Set the runtime worker thread count.
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.runtime.worker_threads = Some(count);
        self
    }

    /// Window for property-change refreshes.
    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.bindings.throttle_window_ms)
    }

    /// Window for rotate-to-north requests.
    pub fn rotate_window(&self) -> Duration {
        Duration::from_millis(self.bindings.rotate_window_ms)
    }

    /// Window for identify-at-point requests.
    pub fn identify_window(&self) -> Duration {
        Duration::from_millis(self.bindings.identify_window_ms)
    }

    /// The async runtime configuration derived from `[runtime]`.
    pub fn async_runtime(&self) -> AsyncRuntimeConfig {
        let config = AsyncRuntimeConfig::default().with_thread_name(self.runtime.thread_name.clone());
        match self.runtime.worker_threads {
            Some(count) => config.with_worker_threads(count),
            None => config,
        }
    }
}
