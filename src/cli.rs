//! Command-line interface definitions for the feed reader.
//!
//! All arguments can be provided via command-line flags; the API key and base
//! URL can also come from the environment.

use crate::config::FeedConfig;
use clap::Parser;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Newest articles plus three more sections
/// nyt_feed --nyt-api-key YOUR_KEY -p 3
///
/// # Keep refreshing, writing snapshots as we go
/// NYT_API_KEY=YOUR_KEY nyt_feed --watch -j ./json -m ./markdown
///
/// # Through a local reverse proxy
/// nyt_feed --api-base http://localhost:5173/api/nyt
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// New York Times API key
    #[arg(long, env = "NYT_API_KEY", hide_env_values = true)]
    pub nyt_api_key: Option<String>,

    /// Base URL of the API (may include a proxy path prefix)
    #[arg(long, env = "NYT_API_BASE")]
    pub api_base: Option<String>,

    /// Number of additional sections to load after the initial fetch
    #[arg(short, long, default_value_t = 0)]
    pub pages: usize,

    /// How many times to retry a failed initial fetch (none unless asked)
    #[arg(long, default_value_t = 0)]
    pub retries: usize,

    /// Keep running and refresh the feed periodically until interrupted
    #[arg(short, long)]
    pub watch: bool,

    /// Output directory for JSON snapshots
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for Markdown renderings
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,
}

impl Cli {
    /// Apply flag overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut FeedConfig) {
        if let Some(base) = &self.api_base {
            config.api_base = base.clone();
        }
    }
}
