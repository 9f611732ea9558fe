//! Feed state and its transitions.
//!
//! [`FeedState`] is the single mutable structure of a reading session. It is
//! only ever changed through [`FeedState::apply`], one [`FeedEvent`] per
//! pending/fulfilled/rejected outcome of the three fetch operations.
//!
//! # Invariants
//!
//! - No two articles in `articles` share a non-empty URL; the first
//!   occurrence wins. Articles without a URL are never collapsed.
//! - Between initial fetches the section cursor only moves forward, and once
//!   it reaches the last section `has_more_sections` stays false.

use crate::models::Article;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Result of fetching the next section of top stories.
#[derive(Debug, Clone)]
pub struct MorePage {
    /// Raw results of the section, not yet deduplicated.
    pub articles: Vec<Article>,
    /// The cursor value the page was fetched for.
    pub section_index: usize,
}

/// Outcomes that drive the feed state.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    InitialPending,
    InitialFulfilled {
        articles: Vec<Article>,
        at: DateTime<Utc>,
    },
    InitialRejected(String),
    MorePending,
    MoreFulfilled(MorePage),
    MoreRejected(String),
    RefreshFulfilled {
        articles: Vec<Article>,
        at: DateTime<Utc>,
    },
    RefreshRejected(String),
    ClearError,
}

/// In-memory state of one reading session.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub articles: Vec<Article>,
    /// Blocking load in progress (initial fetch).
    pub loading: bool,
    /// Non-blocking load in progress (next section).
    pub loading_more: bool,
    pub error: Option<String>,
    /// Index of the last section fetched.
    pub section_index: usize,
    pub has_more_sections: bool,
    /// Time of the last successful initial fetch or refresh.
    pub last_fetch: Option<DateTime<Utc>>,
    section_count: usize,
}

impl FeedState {
    /// Create an empty session paginating over `section_count` sections.
    pub fn new(section_count: usize) -> Self {
        Self {
            articles: Vec::new(),
            loading: false,
            loading_more: false,
            error: None,
            section_index: 0,
            has_more_sections: true,
            last_fetch: None,
            section_count,
        }
    }

    /// Whether a refresh is allowed at `now` given the cool-down window.
    pub fn refresh_due(&self, now: DateTime<Utc>, cooldown: chrono::Duration) -> bool {
        match self.last_fetch {
            Some(last) => now - last >= cooldown,
            None => true,
        }
    }

    /// Apply one event.
    pub fn apply(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::InitialPending => {
                self.loading = true;
                self.error = None;
            }
            FeedEvent::InitialFulfilled { articles, at } => {
                self.loading = false;
                self.articles = dedup_by_url(articles);
                self.section_index = 0;
                self.has_more_sections = true;
                self.last_fetch = Some(at);
            }
            FeedEvent::InitialRejected(message) => {
                self.loading = false;
                self.error = Some(message);
            }
            FeedEvent::MorePending => {
                self.loading_more = true;
                self.error = None;
            }
            FeedEvent::MoreFulfilled(page) => {
                self.loading_more = false;
                let before = self.articles.len();
                let merged = std::mem::take(&mut self.articles)
                    .into_iter()
                    .chain(page.articles);
                self.articles = dedup_by_url(merged);
                self.section_index = page.section_index;
                self.has_more_sections = page.section_index + 1 < self.section_count;
                debug!(
                    added = self.articles.len().saturating_sub(before),
                    section_index = self.section_index,
                    has_more_sections = self.has_more_sections,
                    "Merged section page"
                );
            }
            FeedEvent::MoreRejected(message) => {
                self.loading_more = false;
                self.error = Some(message);
            }
            FeedEvent::RefreshFulfilled { articles, at } => {
                self.articles = dedup_by_url(articles);
                self.last_fetch = Some(at);
            }
            FeedEvent::RefreshRejected(message) => {
                warn!(error = %message, "Failed to refresh");
            }
            FeedEvent::ClearError => {
                self.error = None;
            }
        }
    }
}

/// Drop repeated URLs, keeping the first occurrence. Articles without a URL
/// have no identity and are all kept.
fn dedup_by_url(articles: impl IntoIterator<Item = Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| a.url.is_empty() || seen.insert(a.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn article(url: &str) -> Article {
        Article {
            title: format!("Title for {url}"),
            abstract_text: String::new(),
            url: url.to_string(),
            published_date: "2025-05-06T10:00:00-04:00".to_string(),
            updated_date: None,
            created_date: None,
            multimedia: vec![],
            section: "us".to_string(),
        }
    }

    fn urls(state: &FeedState) -> Vec<&str> {
        state.articles.iter().map(|a| a.url.as_str()).collect()
    }

    #[test]
    fn test_initial_lifecycle() {
        let mut state = FeedState::new(14);
        state.error = Some("stale".to_string());

        state.apply(FeedEvent::InitialPending);
        assert!(state.loading);
        assert_eq!(state.error, None);

        let at = Utc::now();
        state.apply(FeedEvent::InitialFulfilled {
            articles: vec![article("a"), article("b")],
            at,
        });
        assert!(!state.loading);
        assert_eq!(urls(&state), ["a", "b"]);
        assert_eq!(state.section_index, 0);
        assert!(state.has_more_sections);
        assert_eq!(state.last_fetch, Some(at));
    }

    #[test]
    fn test_initial_rejection_keeps_articles() {
        let mut state = FeedState::new(14);
        state.articles = vec![article("a")];
        state.apply(FeedEvent::InitialPending);
        state.apply(FeedEvent::InitialRejected("Invalid API key".to_string()));
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Invalid API key"));
        assert_eq!(urls(&state), ["a"]);
    }

    #[test]
    fn test_more_merge_skips_known_urls() {
        let mut state = FeedState::new(14);
        state.articles = vec![article("a"), article("b")];

        state.apply(FeedEvent::MorePending);
        assert!(state.loading_more);
        state.apply(FeedEvent::MoreFulfilled(MorePage {
            articles: vec![article("b"), article("c"), article("c"), article("d")],
            section_index: 1,
        }));

        assert!(!state.loading_more);
        assert_eq!(urls(&state), ["a", "b", "c", "d"]);
        assert_eq!(state.section_index, 1);
        assert!(state.has_more_sections);
    }

    #[test]
    fn test_merge_never_duplicates_urls() {
        let pools: [&[&str]; 4] = [&[], &["a"], &["a", "b", "a"], &["b", "c", "b"]];
        for existing in pools {
            for incoming in pools {
                let mut state = FeedState::new(14);
                state.articles = existing.iter().map(|u| article(u)).collect();
                state.apply(FeedEvent::MoreFulfilled(MorePage {
                    articles: incoming.iter().map(|u| article(u)).collect(),
                    section_index: 1,
                }));
                let seen = urls(&state);
                let unique: Vec<_> = seen.iter().unique().collect();
                assert_eq!(seen.len(), unique.len(), "{existing:?} + {incoming:?}");
            }
        }
    }

    #[test]
    fn test_last_section_exhausts() {
        let mut state = FeedState::new(3);
        state.apply(FeedEvent::MoreFulfilled(MorePage {
            articles: vec![],
            section_index: 1,
        }));
        assert!(state.has_more_sections);
        state.apply(FeedEvent::MoreFulfilled(MorePage {
            articles: vec![],
            section_index: 2,
        }));
        assert!(!state.has_more_sections);
    }

    #[test]
    fn test_more_rejection_keeps_has_more() {
        let mut state = FeedState::new(14);
        state.apply(FeedEvent::MorePending);
        state.apply(FeedEvent::MoreRejected("HTTP error! status: 500".to_string()));
        assert!(!state.loading_more);
        assert!(state.has_more_sections);
        assert_eq!(state.error.as_deref(), Some("HTTP error! status: 500"));
    }

    #[test]
    fn test_refresh_replaces_and_rejection_is_silent() {
        let mut state = FeedState::new(14);
        state.articles = vec![article("a"), article("b")];

        let before = state.clone();
        state.apply(FeedEvent::RefreshRejected("HTTP error! status: 500".to_string()));
        assert_eq!(state, before);

        let at = Utc::now();
        state.apply(FeedEvent::RefreshFulfilled {
            articles: vec![article("z")],
            at,
        });
        assert_eq!(urls(&state), ["z"]);
        assert_eq!(state.last_fetch, Some(at));
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_refresh_due() {
        let mut state = FeedState::new(14);
        let now = Utc::now();
        let cooldown = chrono::Duration::seconds(30);
        assert!(state.refresh_due(now, cooldown));

        state.last_fetch = Some(now - chrono::Duration::seconds(10));
        assert!(!state.refresh_due(now, cooldown));

        state.last_fetch = Some(now - chrono::Duration::seconds(30));
        assert!(state.refresh_due(now, cooldown));
    }

    #[test]
    fn test_articles_without_url_are_not_collapsed() {
        let mut state = FeedState::new(14);
        state.apply(FeedEvent::InitialFulfilled {
            articles: vec![article(""), article("a"), article(""), article("a")],
            at: Utc::now(),
        });
        assert_eq!(urls(&state), ["", "a", ""]);

        state.apply(FeedEvent::MoreFulfilled(MorePage {
            articles: vec![article(""), article("a"), article("b")],
            section_index: 1,
        }));
        assert_eq!(urls(&state), ["", "a", "", "", "b"]);
    }

    #[test]
    fn test_clear_error() {
        let mut state = FeedState::new(14);
        state.error = Some("boom".to_string());
        state.apply(FeedEvent::ClearError);
        assert_eq!(state.error, None);
    }
}
