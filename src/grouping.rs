//! Date grouping of the article list.
//!
//! Turns the flat article list into calendar-day buckets for display. This is
//! a pure function of the articles and the current time; it is recomputed on
//! every render and never cached.

use crate::models::Article;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use itertools::Itertools;
use serde::Serialize;

/// Articles published on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup {
    /// Local calendar date, `None` for articles without a usable timestamp.
    pub date: Option<NaiveDate>,
    /// `Today`, `Yesterday` or e.g. `Monday, October 19, 2026`.
    pub display_date: String,
    pub articles: Vec<Article>,
}

/// Group `articles` by local publication date, relative to the current time.
pub fn group_by_date(articles: &[Article]) -> Vec<DateGroup> {
    group_by_date_at(articles, &Local::now())
}

/// Group `articles` by publication date in `now`'s time zone.
///
/// Articles are sorted newest first, bucketed by calendar date, and buckets
/// come out newest date first. Undated articles trail in a final bucket.
pub fn group_by_date_at<Tz: TimeZone>(articles: &[Article], now: &DateTime<Tz>) -> Vec<DateGroup> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut sorted: Vec<&Article> = articles.iter().collect();
    sorted.sort_by(|a, b| b.published_at().cmp(&a.published_at()));

    // Sorted by instant, so equal local dates are contiguous.
    sorted
        .into_iter()
        .chunk_by(|a| a.published_at().map(|at| at.with_timezone(&tz).date_naive()))
        .into_iter()
        .map(|(date, group)| DateGroup {
            date,
            display_date: date.map_or_else(|| "Undated".to_string(), |d| date_header(d, today)),
            articles: group.cloned().collect(),
        })
        .collect()
}

/// Header label for `date` as seen on `today`.
pub fn date_header(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_string()
    } else {
        date.format("%A, %B %-d, %Y").to_string()
    }
}

/// Local `hh:mm AM/PM` publication time, empty when the timestamp is unusable.
pub fn format_time(article: &Article) -> String {
    format_time_in(article, &Local)
}

pub fn format_time_in<Tz: TimeZone>(article: &Article, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    article
        .published_at()
        .map(|at| at.with_timezone(tz).format("%I:%M %p").to_string())
        .unwrap_or_default()
}
