//! CLI argument definitions for the Scandesk console.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Scandesk: scan request ids and apply workflow actions to them.
#[derive(Parser, Debug)]
#[command(name = "scandesk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the request service.
    #[arg(short = 'u', long = "base-url")]
    pub base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Action applied to scans until changed with `:action`.
    #[arg(short = 'a', long = "action")]
    pub action: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SCANDESK_CONFIG env var > ~/.scandesk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SCANDESK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the service base URL.
    ///
    /// Priority: --base-url flag > SCANDESK_BASE_URL env var > config file value.
    pub fn resolve_base_url(&self, configured: &str) -> String {
        if let Some(ref url) = self.base_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("SCANDESK_BASE_URL") {
            if !url.trim().is_empty() {
                return url;
            }
        }
        configured.to_string()
    }

    /// Resolve the log level. Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, configured: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| configured.to_string())
    }

    /// Resolve the starting action. Priority: --action flag > config file value.
    ///
    /// Returns `None` when neither names one; the caller then falls back to
    /// the first catalog entry.
    pub fn resolve_action(&self, configured: Option<&str>) -> Option<String> {
        self.action
            .clone()
            .or_else(|| configured.map(str::to_string))
            .filter(|a| !a.trim().is_empty())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".scandesk").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".scandesk").join("config.toml");
    }
    PathBuf::from("config.toml")
}
