//! Server configuration at ~/.config/famcal/config.toml
//!
//! Any value can be overridden from the environment, e.g.
//! `FAMCAL_BACKEND__URL` or `FAMCAL_SYNC__EXTERNAL_TTL_SECS`.
//! `FAMCAL_CONFIG` points at a different file.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use famcal_core::{FamcalError, FamcalResult, SyncSettings};
use famcal_provider_google::app_config::Credentials;
use serde::{Deserialize, Serialize};

static DEFAULT_BIND: &str = "127.0.0.1:4096";
static DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:54321";

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub backend: BackendConfig,

    /// Google OAuth client. Falls back to the provider's own app_config.toml.
    #[serde(default)]
    pub google: Option<Credentials>,

    #[serde(default)]
    pub sync: SyncSettings,
}

/// The hosted backend holding events and linked calendars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            url: default_backend_url(),
            api_key: String::new(),
        }
    }
}

impl ServerConfig {
    pub fn config_path() -> FamcalResult<PathBuf> {
        if let Ok(path) = std::env::var("FAMCAL_CONFIG") {
            return Ok(PathBuf::from(shellexpand::tilde(&path).into_owned()));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| FamcalError::Config("Could not determine config directory".into()))?
            .join("famcal");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> FamcalResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load `path`, writing a commented default first if it does not exist.
    pub fn load_from(path: &Path) -> FamcalResult<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("FAMCAL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| FamcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FamcalError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> FamcalResult<()> {
        let contents = format!(
            "\
# famcal-server configuration

# Address the HTTP server listens on:
# bind = \"{}\"

[backend]
# url = \"{}\"
# api_key = \"your-anon-key\"

# [google]
# client_id = \"your-client-id.apps.googleusercontent.com\"
# client_secret = \"your-client-secret\"
# redirect_uri = \"http://localhost:3000/oauth/callback\"

[sync]
# external_ttl_secs = 300
# view_ttl_secs = 300
# probe_hours = 24
# fetch_retries = 1
",
            DEFAULT_BIND, DEFAULT_BACKEND_URL
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FamcalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| FamcalError::Config(format!("Could not write config file: {e}")))?;

        tracing::info!("Wrote default config to {}", path.display());
        Ok(())
    }
}
