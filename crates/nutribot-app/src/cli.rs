//! CLI argument definitions for the NutriBot terminal client.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// NutriBot: tell it what you ate, confirm the estimate, get the macros.
#[derive(Parser, Debug)]
#[command(name = "nutribot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the analysis and nutrition services.
    #[arg(short = 'u', long = "api-url")]
    pub api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > NUTRIBOT_CONFIG env var > ~/.nutribot/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.config_path_or(std::env::var("NUTRIBOT_CONFIG").ok())
    }

    fn config_path_or(&self, env: Option<String>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the service base URL override.
    ///
    /// Priority: --api-url flag > NUTRIBOT_API_URL env var.
    /// Returns `None` if neither is set (use the config file value).
    pub fn resolve_api_url(&self) -> Option<String> {
        self.api_url_or(std::env::var("NUTRIBOT_API_URL").ok())
    }

    fn api_url_or(&self, env: Option<String>) -> Option<String> {
        self.api_url
            .clone()
            .or_else(|| env.filter(|v| !v.trim().is_empty()))
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".nutribot").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".nutribot").join("config.toml");
    }
    PathBuf::from("config.toml")
}
