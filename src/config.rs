//! Reader configuration.
//!
//! Settings come from an optional YAML file; every field has a default so an
//! empty (or absent) file yields a working configuration. Command-line flags
//! override individual values after loading.
//!
//! ```yaml
//! api_base: https://api.nytimes.com
//! page_size: 20
//! request_delay_ms: 1000
//! refresh_cooldown_secs: 30
//! refresh_interval_secs: 300
//! sections: [home, world, us]
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

/// Top stories sections paginated through, in order. The first entry is the
/// one refreshed periodically.
pub const DEFAULT_SECTIONS: [&str; 14] = [
    "home",
    "world",
    "us",
    "politics",
    "business",
    "technology",
    "science",
    "health",
    "sports",
    "arts",
    "fashion",
    "travel",
    "magazine",
    "realestate",
];

/// Section fetched by a refresh.
pub const REFRESH_SECTION: &str = "home";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Base URL of the API, optionally with a proxy path prefix.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Maximum number of articles kept from a search or refresh.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Courtesy pause before each section and refresh request.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Minimum time between successful fetches for a refresh to go out.
    #[serde(default = "default_refresh_cooldown_secs")]
    pub refresh_cooldown_secs: u64,

    /// How often watch mode refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
}

fn default_api_base() -> String {
    "https://api.nytimes.com".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_refresh_cooldown_secs() -> u64 {
    30
}

fn default_refresh_interval_secs() -> u64 {
    5 * 60
}

fn default_sections() -> Vec<String> {
    DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            page_size: default_page_size(),
            request_delay_ms: default_request_delay_ms(),
            refresh_cooldown_secs: default_refresh_cooldown_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            sections: default_sections(),
        }
    }
}

impl FeedConfig {
    /// Load the configuration from `path`, or the defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails [`FeedConfig::validate`].
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let config = Self::from_yaml(&raw)?;
                info!(path, sections = config.sections.len(), "Loaded configuration");
                config
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.sections.is_empty() {
            return Err("configuration must list at least one section".into());
        }
        if self.page_size == 0 {
            return Err("page_size must be greater than zero".into());
        }
        if self.refresh_interval_secs == 0 {
            return Err("refresh_interval_secs must be greater than zero".into());
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_secs(self.refresh_cooldown_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
