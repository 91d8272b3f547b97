use crate::error::{FrankError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_TRANSLATE_HOST: &str = "translate.googleapis.com";
pub const DEFAULT_DRIVE_DOWNLOAD_URL: &str = "https://docs.google.com/uc?export=download";
pub const DEFAULT_TRANSLATE_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host serving the `translate_a/single` endpoint.
    pub translate_host: String,
    pub translate_https: bool,
    pub translate_timeout_secs: u64,
    /// Drive download endpoint, queried with `id` and optionally `confirm`.
    pub drive_download_url: String,
    pub ffmpeg_path: String,
    /// Bind address for `frank-tools serve`.
    pub server_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translate_host: DEFAULT_TRANSLATE_HOST.to_string(),
            translate_https: true,
            translate_timeout_secs: DEFAULT_TRANSLATE_TIMEOUT_SECS,
            drive_download_url: DEFAULT_DRIVE_DOWNLOAD_URL.to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            server_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                match toml::from_str::<Config>(&contents) {
                    Ok(file_config) => config = file_config,
                    Err(e) => warn!(
                        "Ignoring unreadable config file {}: {}",
                        config_path.display(),
                        e
                    ),
                }
            }
        }

        // Override with environment variables
        if let Ok(host) = std::env::var("FRANK_TOOLS_TRANSLATE_HOST") {
            config.translate_host = host;
        }
        if let Ok(https) = std::env::var("FRANK_TOOLS_TRANSLATE_HTTPS") {
            if let Some(flag) = parse_flag(&https) {
                config.translate_https = flag;
            }
        }
        if let Ok(timeout) = std::env::var("FRANK_TOOLS_TRANSLATE_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                config.translate_timeout_secs = t;
            }
        }
        if let Ok(url) = std::env::var("FRANK_TOOLS_DRIVE_URL") {
            config.drive_download_url = url;
        }
        if let Ok(path) = std::env::var("FRANK_TOOLS_FFMPEG") {
            config.ffmpeg_path = path;
        }
        if let Ok(addr) = std::env::var("FRANK_TOOLS_SERVER_ADDR") {
            config.server_addr = addr;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.translate_host.trim().is_empty() {
            return Err(FrankError::Config(
                "translate_host must not be empty".to_string(),
            ));
        }

        if self.translate_timeout_secs == 0 {
            return Err(FrankError::Config(
                "translate_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.drive_download_url.trim().is_empty() {
            return Err(FrankError::Config(
                "drive_download_url must not be empty".to_string(),
            ));
        }

        if self.ffmpeg_path.trim().is_empty() {
            return Err(FrankError::Config("ffmpeg_path must not be empty".to_string()));
        }

        self.socket_addr()?;

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.server_addr.parse().map_err(|e| {
            FrankError::Config(format!("Invalid server_addr '{}': {e}", self.server_addr))
        })
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("frank-tools").join("config.toml"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
