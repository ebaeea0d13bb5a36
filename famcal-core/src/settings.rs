//! Tunables for fetching, caching and probing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::event::DEFAULT_COLOR;
use crate::time::MAX_WINDOW_HOURS;

/// Longest TTL handed to the caches.
pub const MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

fn default_external_ttl_secs() -> u64 {
    300
}

fn default_view_ttl_secs() -> u64 {
    300
}

fn default_probe_hours() -> i64 {
    24
}

fn default_fetch_retries() -> u32 {
    1
}

fn default_cache_capacity() -> u64 {
    1_000
}

fn default_family_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// The `[sync]` section of the server config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// How long a successful external fetch is reused.
    #[serde(default = "default_external_ttl_secs")]
    pub external_ttl_secs: u64,

    #[serde(default = "default_view_ttl_secs")]
    pub view_ttl_secs: u64,

    /// Width of the window used by sync status probes.
    #[serde(default = "default_probe_hours")]
    pub probe_hours: i64,

    /// Automatic retries after a failed external fetch.
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    #[serde(default = "default_family_color")]
    pub family_color: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            external_ttl_secs: default_external_ttl_secs(),
            view_ttl_secs: default_view_ttl_secs(),
            probe_hours: default_probe_hours(),
            fetch_retries: default_fetch_retries(),
            cache_capacity: default_cache_capacity(),
            family_color: default_family_color(),
        }
    }
}

// Raw fields come straight from config; read them through these accessors.
impl SyncSettings {
    pub fn external_ttl(&self) -> Duration {
        Duration::from_secs(self.external_ttl_secs.min(MAX_TTL_SECS))
    }

    pub fn view_ttl(&self) -> Duration {
        Duration::from_secs(self.view_ttl_secs.min(MAX_TTL_SECS))
    }

    pub fn probe_hours(&self) -> i64 {
        self.probe_hours.clamp(1, MAX_WINDOW_HOURS)
    }
}
