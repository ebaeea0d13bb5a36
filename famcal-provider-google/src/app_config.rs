//! App-level configuration for the Google provider.
//!
//! User-provided OAuth credentials may be stored at:
//!   ~/.config/famcal/providers/google/app_config.toml

use famcal_core::{FamcalError, FamcalResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Google OAuth client credentials (user-provided).
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Must match the redirect URI used by the consent screen.
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

/// Where the adapter sends its requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleEndpoints {
    pub token_url: String,
    /// Calendar API v3 root, without trailing slash.
    pub api_base: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        GoogleEndpoints {
            token_url: TOKEN_URL.to_string(),
            api_base: API_BASE.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Every endpoint under one root, laid out like Google's paths.
    pub fn rooted_at(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        GoogleEndpoints {
            token_url: format!("{}/token", root),
            api_base: format!("{}/calendar/v3", root),
            userinfo_url: format!("{}/oauth2/v2/userinfo", root),
        }
    }
}

pub fn base_dir() -> FamcalResult<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| FamcalError::Config("Could not determine config directory".into()))?
        .join("famcal")
        .join("providers")
        .join("google"))
}

pub fn load() -> FamcalResult<Credentials> {
    let path = base_dir()?.join("app_config.toml");

    if !path.exists() {
        return Err(FamcalError::Config(format!(
            "Google credentials not found.\n\n\
            Create {} with:\n\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"\n\n\
            See https://console.cloud.google.com/apis/credentials for setup.",
            path.display()
        )));
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        FamcalError::Config(format!("Failed to read credentials from {}: {}", path.display(), e))
    })?;

    parse(&contents).map_err(|e| match e {
        FamcalError::Config(message) => {
            FamcalError::Config(format!("{} ({})", message, path.display()))
        }
        other => other,
    })
}

pub fn parse(contents: &str) -> FamcalResult<Credentials> {
    toml::from_str(contents)
        .map_err(|e| FamcalError::Config(format!("Failed to parse Google credentials: {}", e)))
}
