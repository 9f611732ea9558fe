//! Markdown rendering of the feed.
//!
//! The same text is printed to the terminal and, optionally, written to the
//! Markdown output directory as `{date}_{time_of_day}.md`.

use crate::grouping::{DateGroup, format_time};
use crate::models::Article;
use crate::store::FeedState;
use crate::utils::time_of_day;
use chrono::Local;
use std::error::Error;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

/// Render the feed state and its date groups as Markdown.
pub fn feed_to_markdown(state: &FeedState, groups: &[DateGroup]) -> String {
    render(state, groups, format_time)
}

fn render(state: &FeedState, groups: &[DateGroup], time: impl Fn(&Article) -> String) -> String {
    let mut md = String::from("# Latest News\n\n");

    if let Some(error) = &state.error {
        let _ = writeln!(md, "> **Error:** {error}  \n> Run again or use `--retries` to retry.\n");
    }

    if state.loading && state.articles.is_empty() {
        md.push_str("_Loading news..._\n\n");
    }

    for group in groups {
        let count = group.articles.len();
        let noun = if count == 1 { "article" } else { "articles" };
        let _ = writeln!(md, "## {}\n\n_{count} {noun}_\n", group.display_date);

        for article in &group.articles {
            let section = if article.section.is_empty() {
                "NEWS".to_string()
            } else {
                article.section.to_uppercase()
            };
            let _ = writeln!(md, "### {}\n", article.title);
            if let Some(thumbnail) = article.thumbnail() {
                let _ = writeln!(md, "![{}]({thumbnail})\n", article.title);
            }
            let _ = writeln!(md, "**{section}** · {}\n", time(article));
            if !article.abstract_text.is_empty() {
                let _ = writeln!(md, "{}\n", article.abstract_text);
            }
            if !article.url.is_empty() {
                let _ = writeln!(md, "[Read more →]({})\n", article.url);
            }
        }
    }

    if state.loading_more {
        md.push_str("_Loading more news..._\n\n");
    }

    if !state.has_more_sections && !state.articles.is_empty() {
        md.push_str("---\n\n**You've reached the end!**  \nNo more articles to load.\n");
    }

    md
}

/// Write rendered Markdown to `{dir}/{date}_{time_of_day}.md`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(markdown_output_dir = %markdown_output_dir))]
pub async fn write_markdown(md: &str, markdown_output_dir: &str) -> Result<String, Box<dyn Error>> {
    let path = format!(
        "{}/{}_{}.md",
        markdown_output_dir.trim_end_matches('/'),
        Local::now().date_naive(),
        time_of_day()
    );
    fs::write(&path, md).await?;
    info!(%path, bytes = md.len(), "Wrote feed Markdown");
    Ok(path)
}
