//! Configuration for Verity.
//!
//! Read from `$VERITY_CONFIG`, or `~/.verity/config.toml` when unset. Every
//! section and key is optional; missing values fall back to the built-in
//! defaults.
//!
//! ```toml
//! [client]
//! endpoint = "https://validation.example.com/rpc"
//! api_key = "${VALIDATION_KEY}"
//! language = "en"
//! timeout_ms = 4000
//!
//! [coordinator]
//! debounce_ms = 250
//! max_checks_per_signature = 2
//!
//! [messages.address]
//! address_not_found = "We could not find this address."
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;
use verity_client::ClientSettings;
use verity_core::{MessageCatalog, message_key};
use verity_engine::CoordinatorSettings;

pub const CONFIG_ENV: &str = "VERITY_CONFIG";
pub const API_KEY_ENV: &str = "VERITY_API_KEY";

const fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct VerityConfig {
    pub client: Option<ClientConfig>,
    pub coordinator: Option<CoordinatorConfig>,
    /// Message overrides, by namespace then status code.
    #[serde(default)]
    pub messages: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Default, Deserialize)]
pub struct ClientConfig {
    pub endpoint: Option<String>,
    pub remote_api_url: Option<String>,
    pub agent: Option<String>,
    pub api_key: Option<String>,
    pub language: Option<String>,
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_true")]
    pub https_only: bool,
}

// Manual Debug impl to keep the API key out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("remote_api_url", &self.remote_api_url)
            .field("agent", &self.agent)
            .field(
                "api_key",
                &if self.api_key.is_some() { "[REDACTED]" } else { "None" },
            )
            .field("language", &self.language)
            .field("timeout_ms", &self.timeout_ms)
            .field("https_only", &self.https_only)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CoordinatorConfig {
    pub debounce_ms: Option<u64>,
    pub max_checks_per_signature: Option<u32>,
}

/// Replace `${VAR}` with the variable's value. Unset variables become empty;
/// an unclosed `${` is kept as is.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

impl VerityConfig {
    /// Load the config file. `Ok(None)` when there is none.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "failed to read config");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        toml::from_str(&content).map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "failed to parse config");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Client settings, with `VERITY_API_KEY` taking precedence over the
    /// configured key.
    #[must_use]
    pub fn client_settings(&self) -> ClientSettings {
        self.client_settings_with_key(env::var(API_KEY_ENV).ok())
    }

    fn client_settings_with_key(&self, env_key: Option<String>) -> ClientSettings {
        let mut settings = ClientSettings::default();
        if let Some(client) = &self.client {
            if let Some(endpoint) = &client.endpoint {
                settings.endpoint = expand_env_vars(endpoint);
            }
            settings.remote_api_url = client.remote_api_url.as_deref().map(expand_env_vars);
            if let Some(agent) = &client.agent {
                settings.agent = agent.clone();
            }
            settings.api_key = client
                .api_key
                .as_deref()
                .map(expand_env_vars)
                .filter(|key| !key.is_empty());
            if let Some(language) = &client.language {
                settings.language = language.clone();
            }
            if let Some(ms) = client.timeout_ms {
                settings.timeout = Duration::from_millis(ms);
            }
            settings.https_only = client.https_only;
        }
        if let Some(key) = env_key.filter(|key| !key.trim().is_empty()) {
            settings.api_key = Some(key);
        }
        settings
    }

    #[must_use]
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        let mut settings = CoordinatorSettings::default();
        if let Some(coordinator) = &self.coordinator {
            if let Some(ms) = coordinator.debounce_ms {
                settings.debounce = Duration::from_millis(ms);
            }
            if let Some(max) = coordinator.max_checks_per_signature {
                settings.max_checks_per_signature = max;
            }
        }
        settings
    }

    /// Default messages with the configured overrides applied.
    #[must_use]
    pub fn message_catalog(&self) -> MessageCatalog {
        let mut catalog = MessageCatalog::defaults();
        for (namespace, codes) in &self.messages {
            catalog.extend(
                codes
                    .iter()
                    .map(|(code, text)| (message_key(namespace, code), text.clone())),
            );
        }
        catalog
    }
}

/// `$VERITY_CONFIG`, or `~/.verity/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".verity").join("config.toml"))
}
