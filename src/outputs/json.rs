//! JSON snapshots of the feed.
//!
//! A snapshot is a write-only export of the grouped feed at one point in
//! time. Files are organized by date with edition names:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── morning.json
//!     ├── afternoon.json
//!     └── evening.json
//! ```
//! A later snapshot in the same edition overwrites the earlier one.

use crate::grouping::DateGroup;
use crate::store::FeedState;
use crate::utils::time_of_day;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Grouped feed plus the pagination state it was taken in.
#[derive(Debug, Serialize)]
pub struct FeedSnapshot<'a> {
    pub generated_at: DateTime<Local>,
    pub section_index: usize,
    pub has_more_sections: bool,
    pub article_count: usize,
    pub groups: &'a [DateGroup],
}

impl<'a> FeedSnapshot<'a> {
    pub fn new(state: &FeedState, groups: &'a [DateGroup]) -> Self {
        Self {
            generated_at: Local::now(),
            section_index: state.section_index,
            has_more_sections: state.has_more_sections,
            article_count: state.articles.len(),
            groups,
        }
    }
}

/// Write a [`FeedSnapshot`] to `{json_output_dir}/{date}/{time_of_day}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_snapshot(
    snapshot: &FeedSnapshot<'_>,
    json_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;

    let full_json_dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        snapshot.generated_at.date_naive()
    );
    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = format!("{}/{}.json", full_json_dir, time_of_day());
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, groups = snapshot.groups.len(), "Wrote feed snapshot");

    Ok(output_json_filename)
}
