use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::error::{NutriError, Result};

/// Top-level configuration for the NutriBot client.
///
/// Loaded from `~/.nutribot/config.toml` by default. The service base URL has
/// no default: it must come from the file, the environment or the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutriConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl NutriConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: NutriConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults only
    /// when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is reported as is.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(NutriError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Replace the configured base URL when an override is present.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.service.base_url = Some(url);
        }
        self
    }

    /// Validate and return the service base URL.
    ///
    /// A missing, blank, relative or non-http(s) URL is a fatal configuration
    /// error: nothing can be analysed without it.
    pub fn resolve_base_url(&self) -> Result<Url> {
        let raw = self
            .service
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| NutriError::Config("service base URL is not set".to_string()))?;

        let url = Url::parse(raw)
            .map_err(|e| NutriError::Config(format!("invalid service base URL '{}': {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(NutriError::Config(format!(
                "unsupported scheme '{}' in service base URL",
                other
            ))),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Remote analysis / nutrition service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL both endpoints hang off, e.g. `https://api.example.com`.
    pub base_url: Option<String>,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 8,
        }
    }
}

/// Voice capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Recognition language tag.
    pub language: String,
    /// Delay between a final transcript and its automatic submission.
    pub submit_delay_ms: u64,
    /// Refuse to start capture outside a secure context.
    pub secure_context_required: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "es-ES".to_string(),
            submit_delay_ms: 500,
            secure_context_required: true,
        }
    }
}
