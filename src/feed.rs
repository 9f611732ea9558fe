//! Fetch orchestration for a reading session.
//!
//! [`FeedReader`] runs the three fetch operations against a [`NewsApi`] and
//! records their pending/fulfilled/rejected outcomes in its [`FeedState`]:
//!
//! 1. **Initial fetch**: newest search results, resets pagination
//! 2. **Load more**: the next section's top stories, merged without duplicates
//! 3. **Refresh**: the home section, replacing the list once the cool-down has
//!    passed
//!
//! Each operation runs its steps strictly in sequence (cursor check, courtesy
//! delay, request, parse). Operations take `&mut self`, so one reader never
//! has two fetches in flight.

use crate::api::NewsApi;
use crate::config::{FeedConfig, REFRESH_SECTION};
use crate::error::FeedError;
use crate::models::Article;
use crate::store::{FeedEvent, FeedState, MorePage};
use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Tunables of the fetch operations.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub sections: Vec<String>,
    pub page_size: usize,
    pub request_delay: Duration,
    pub refresh_cooldown: Duration,
}

impl From<&FeedConfig> for FeedSettings {
    fn from(config: &FeedConfig) -> Self {
        Self {
            sections: config.sections.clone(),
            page_size: config.page_size,
            request_delay: config.request_delay(),
            refresh_cooldown: config.refresh_cooldown(),
        }
    }
}

/// What a call to [`FeedReader::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Inside the cool-down window; nothing was requested or changed.
    Skipped,
    /// The API answered 429; the existing list was kept.
    RateLimited,
    /// The list was replaced with this many articles.
    Replaced(usize),
}

/// Drives a [`FeedState`] through the fetch operations of one session.
#[derive(Debug)]
pub struct FeedReader<A> {
    api: A,
    settings: FeedSettings,
    state: FeedState,
}

impl<A: NewsApi> FeedReader<A> {
    pub fn new(api: A, settings: FeedSettings) -> Self {
        let state = FeedState::new(settings.sections.len());
        Self { api, settings, state }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Load the newest search results, replacing the list and resetting the
    /// section cursor.
    ///
    /// On failure the error message is recorded in the state and the error is
    /// returned; nothing is retried.
    #[instrument(level = "info", skip_all)]
    pub async fn fetch_initial(&mut self) -> Result<usize, FeedError> {
        let t0 = Instant::now();
        self.state.apply(FeedEvent::InitialPending);

        match self.api.search_articles(0).await {
            Ok(mut articles) => {
                articles.truncate(self.settings.page_size);
                let count = articles.len();
                self.state.apply(FeedEvent::InitialFulfilled {
                    articles,
                    at: Utc::now(),
                });
                info!(
                    count,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Loaded initial articles"
                );
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, "Initial fetch failed");
                self.state.apply(FeedEvent::InitialRejected(e.to_string()));
                Err(e)
            }
        }
    }

    /// Fetch the next section's top stories and merge them into the list.
    ///
    /// Fails with [`FeedError::NoMoreSections`], without any request, when
    /// the cursor is already at the last section. Returns the number of
    /// articles actually added.
    #[instrument(level = "info", skip_all, fields(section_index = self.state.section_index))]
    pub async fn fetch_more(&mut self) -> Result<usize, FeedError> {
        self.state.apply(FeedEvent::MorePending);

        match self.next_page().await {
            Ok(page) => {
                let before = self.state.articles.len();
                let section_index = page.section_index;
                self.state.apply(FeedEvent::MoreFulfilled(page));
                let added = self.state.articles.len().saturating_sub(before);
                info!(
                    section = %self.settings.sections[section_index],
                    added,
                    total = self.state.articles.len(),
                    has_more_sections = self.state.has_more_sections,
                    "Loaded more articles"
                );
                Ok(added)
            }
            Err(e) => {
                error!(error = %e, "Fetch more failed");
                self.state.apply(FeedEvent::MoreRejected(e.to_string()));
                Err(e)
            }
        }
    }

    async fn next_page(&self) -> Result<MorePage, FeedError> {
        let next = self.state.section_index + 1;
        let Some(section) = self.settings.sections.get(next) else {
            return Err(FeedError::NoMoreSections);
        };

        sleep(self.settings.request_delay).await;

        let articles = self.api.top_stories(section).await?;
        Ok(MorePage {
            articles,
            section_index: next,
        })
    }

    /// Load the next section only if nothing is loading and sections remain.
    ///
    /// Returns `Ok(None)` when the load was not dispatched.
    pub async fn load_more_if_idle(&mut self) -> Result<Option<usize>, FeedError> {
        if self.state.loading || self.state.loading_more || !self.state.has_more_sections {
            return Ok(None);
        }
        self.fetch_more().await.map(Some)
    }

    /// Replace the list with the current home-section stories.
    ///
    /// Inside the cool-down window this is a no-op. A rate-limited response
    /// keeps the existing list. Other failures are logged and returned but
    /// never reach the state's error field.
    #[instrument(level = "info", skip_all)]
    pub async fn refresh(&mut self) -> Result<RefreshOutcome, FeedError> {
        let cooldown = chrono::Duration::from_std(self.settings.refresh_cooldown)
            .unwrap_or(chrono::Duration::MAX);
        if !self.state.refresh_due(Utc::now(), cooldown) {
            info!("Refresh skipped; last fetch is too recent");
            return Ok(RefreshOutcome::Skipped);
        }

        sleep(self.settings.request_delay).await;

        match self.api.top_stories(REFRESH_SECTION).await {
            Ok(articles) => {
                let articles = newest_first(articles, self.settings.page_size);
                let count = articles.len();
                self.state.apply(FeedEvent::RefreshFulfilled {
                    articles,
                    at: Utc::now(),
                });
                info!(count, "Refreshed articles");
                Ok(RefreshOutcome::Replaced(count))
            }
            Err(e) if e.is_rate_limited() => {
                warn!("Rate limit hit during refresh; keeping current articles");
                let articles = self.state.articles.clone();
                self.state.apply(FeedEvent::RefreshFulfilled {
                    articles,
                    at: Utc::now(),
                });
                Ok(RefreshOutcome::RateLimited)
            }
            Err(e) => {
                self.state.apply(FeedEvent::RefreshRejected(e.to_string()));
                Err(e)
            }
        }
    }

    /// The retry action: clear the error and run the initial fetch again.
    pub async fn retry(&mut self) -> Result<usize, FeedError> {
        self.state.apply(FeedEvent::ClearError);
        self.fetch_initial().await
    }
}

/// Keep the first `limit` articles, newest first (undated last).
fn newest_first(mut articles: Vec<Article>, limit: usize) -> Vec<Article> {
    articles.truncate(limit);
    articles.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Reply = Result<Vec<Article>, FeedError>;

    /// Scripted stand-in for the NYT API that records every request.
    #[derive(Debug, Default)]
    struct FakeApi {
        search_replies: Mutex<VecDeque<Reply>>,
        section_replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn with_search(self, reply: Reply) -> Self {
            self.search_replies.lock().unwrap().push_back(reply);
            self
        }

        fn with_section(self, reply: Reply) -> Self {
            self.section_replies.lock().unwrap().push_back(reply);
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl NewsApi for FakeApi {
        async fn search_articles(&self, page: u32) -> Result<Vec<Article>, FeedError> {
            self.requests.lock().unwrap().push(format!("search:{page}"));
            self.search_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn top_stories(&self, section: &str) -> Result<Vec<Article>, FeedError> {
            self.requests.lock().unwrap().push(format!("section:{section}"));
            self.section_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn article(url: &str, published: &str) -> Article {
        Article {
            title: format!("Story {url}"),
            abstract_text: String::new(),
            url: url.to_string(),
            published_date: published.to_string(),
            updated_date: None,
            created_date: None,
            multimedia: vec![],
            section: "world".to_string(),
        }
    }

    fn batch(prefix: &str, n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| article(&format!("{prefix}-{i}"), "2025-05-06T10:00:00-04:00"))
            .collect()
    }

    fn settings(sections: &[&str]) -> FeedSettings {
        FeedSettings {
            sections: sections.iter().map(|s| s.to_string()).collect(),
            page_size: 20,
            request_delay: Duration::ZERO,
            refresh_cooldown: Duration::from_secs(30),
        }
    }

    fn all_sections() -> FeedSettings {
        FeedSettings::from(&FeedConfig {
            request_delay_ms: 0,
            ..FeedConfig::default()
        })
    }

    #[tokio::test]
    async fn test_initial_fetch_keeps_first_twenty() {
        let api = FakeApi::default().with_search(Ok(batch("s", 25)));
        let mut reader = FeedReader::new(api, all_sections());

        assert_eq!(reader.fetch_initial().await.unwrap(), 20);
        let state = reader.state();
        assert_eq!(state.articles.len(), 20);
        assert_eq!(state.articles[0].url, "s-0");
        assert_eq!(state.section_index, 0);
        assert!(state.has_more_sections);
        assert!(state.last_fetch.is_some());
        assert!(!state.loading);
        assert_eq!(reader.api().requests(), ["search:0"]);
    }

    #[tokio::test]
    async fn test_initial_forbidden_surfaces_banner() {
        let api = FakeApi::default().with_search(Err(FeedError::Forbidden));
        let mut reader = FeedReader::new(api, all_sections());

        assert!(matches!(reader.fetch_initial().await, Err(FeedError::Forbidden)));
        let state = reader.state();
        assert_eq!(
            state.error.as_deref(),
            Some("Access forbidden - API key may not have access to this endpoint")
        );
        assert!(state.articles.is_empty());
        assert!(!state.loading);
        assert!(state.last_fetch.is_none());
    }

    #[tokio::test]
    async fn test_retry_clears_error_and_refetches() {
        let api = FakeApi::default()
            .with_search(Err(FeedError::Unauthorized))
            .with_search(Ok(batch("s", 3)));
        let mut reader = FeedReader::new(api, all_sections());

        assert!(reader.fetch_initial().await.is_err());
        assert_eq!(reader.state().error.as_deref(), Some("Invalid API key"));

        assert_eq!(reader.retry().await.unwrap(), 3);
        assert_eq!(reader.state().error, None);
        assert_eq!(reader.api().requests(), ["search:0", "search:0"]);
    }

    #[tokio::test]
    async fn test_fetch_more_walks_sections_in_order() {
        let mut api = FakeApi::default().with_search(Ok(batch("s", 2)));
        for i in 0..13 {
            api = api.with_section(Ok(batch(&format!("sec{i}"), 2)));
        }
        let mut reader = FeedReader::new(api, all_sections());
        reader.fetch_initial().await.unwrap();

        for n in 1..13 {
            assert_eq!(reader.fetch_more().await.unwrap(), 2);
            assert_eq!(reader.state().section_index, n);
            assert!(reader.state().has_more_sections);
        }

        reader.fetch_more().await.unwrap();
        assert_eq!(reader.state().section_index, 13);
        assert!(!reader.state().has_more_sections);
        assert_eq!(reader.state().articles.len(), 2 + 13 * 2);

        let requests = reader.api().requests();
        assert_eq!(requests[1], "section:world");
        assert_eq!(requests[13], "section:realestate");
    }

    #[tokio::test]
    async fn test_fetch_more_at_last_section_makes_no_request() {
        let api = FakeApi::default().with_section(Ok(batch("a", 1)));
        let mut reader = FeedReader::new(api, settings(&["home", "arts"]));

        reader.fetch_more().await.unwrap();
        assert!(!reader.state().has_more_sections);

        let err = reader.fetch_more().await.unwrap_err();
        assert!(matches!(err, FeedError::NoMoreSections));
        assert_eq!(
            reader.state().error.as_deref(),
            Some("No more sections available")
        );
        assert!(!reader.state().loading_more);
        assert_eq!(reader.api().requests(), ["section:arts"]);
    }

    #[tokio::test]
    async fn test_fetch_more_dedups_against_existing() {
        let api = FakeApi::default()
            .with_search(Ok(vec![
                article("a", "2025-05-06T10:00:00-04:00"),
                article("b", "2025-05-06T09:00:00-04:00"),
            ]))
            .with_section(Ok(vec![
                article("b", "2025-05-06T09:00:00-04:00"),
                article("c", "2025-05-06T08:00:00-04:00"),
            ]));
        let mut reader = FeedReader::new(api, all_sections());
        reader.fetch_initial().await.unwrap();

        assert_eq!(reader.fetch_more().await.unwrap(), 1);
        let urls: Vec<_> = reader.state().articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fetch_more_failure_halts_pagination() {
        let api = FakeApi::default().with_section(Err(FeedError::RateLimited));
        let mut reader = FeedReader::new(api, all_sections());

        assert!(reader.fetch_more().await.is_err());
        let state = reader.state();
        assert!(!state.loading_more);
        assert!(state.has_more_sections);
        assert_eq!(state.section_index, 0);
        assert_eq!(
            state.error.as_deref(),
            Some("Rate limit exceeded. Please wait before making another request.")
        );
    }

    #[tokio::test]
    async fn test_load_more_if_idle_respects_exhaustion() {
        let api = FakeApi::default().with_section(Ok(batch("a", 1)));
        let mut reader = FeedReader::new(api, settings(&["home", "arts"]));

        assert_eq!(reader.load_more_if_idle().await.unwrap(), Some(1));
        assert_eq!(reader.load_more_if_idle().await.unwrap(), None);
        assert_eq!(reader.state().error, None);
        assert_eq!(reader.api().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_within_cooldown_is_noop() {
        let api = FakeApi::default()
            .with_search(Ok(batch("s", 5)))
            .with_section(Ok(batch("fresh", 5)));
        let mut reader = FeedReader::new(api, all_sections());
        reader.fetch_initial().await.unwrap();

        let before = reader.state().clone();
        assert_eq!(reader.refresh().await.unwrap(), RefreshOutcome::Skipped);
        assert_eq!(reader.refresh().await.unwrap(), RefreshOutcome::Skipped);
        assert_eq!(reader.state(), &before);
        assert_eq!(reader.api().requests(), ["search:0"]);
    }

    #[tokio::test]
    async fn test_refresh_replaces_list_newest_first() {
        let api = FakeApi::default()
            .with_section(Ok(batch("more", 3)))
            .with_section(Ok(vec![
                article("old", "2025-05-04T10:00:00-04:00"),
                article("new", "2025-05-06T10:00:00-04:00"),
                article("mid", "2025-05-05T10:00:00-04:00"),
            ]));
        let mut reader = FeedReader::new(api, all_sections());
        reader.fetch_more().await.unwrap();

        assert_eq!(reader.refresh().await.unwrap(), RefreshOutcome::Replaced(3));
        let urls: Vec<_> = reader.state().articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, ["new", "mid", "old"]);
        assert!(reader.state().last_fetch.is_some());
        assert_eq!(reader.api().requests(), ["section:world", "section:home"]);
    }

    #[tokio::test]
    async fn test_refresh_twice_skips_second_request() {
        let api = FakeApi::default()
            .with_section(Ok(batch("fresh", 4)))
            .with_section(Ok(batch("later", 2)));
        let mut reader = FeedReader::new(api, all_sections());

        assert_eq!(reader.refresh().await.unwrap(), RefreshOutcome::Replaced(4));
        let after_first = reader.state().clone();

        assert_eq!(reader.refresh().await.unwrap(), RefreshOutcome::Skipped);
        assert_eq!(reader.state(), &after_first);
        assert_eq!(reader.api().requests(), ["section:home"]);
    }

    #[tokio::test]
    async fn test_refresh_rate_limited_keeps_list() {
        let api = FakeApi::default()
            .with_section(Ok(batch("more", 3)))
            .with_section(Err(FeedError::RateLimited));
        let mut reader = FeedReader::new(api, all_sections());
        reader.fetch_more().await.unwrap();
        let before = reader.state().articles.clone();

        assert_eq!(reader.refresh().await.unwrap(), RefreshOutcome::RateLimited);
        assert_eq!(reader.state().articles, before);
        assert_eq!(reader.state().error, None);
    }

    #[tokio::test]
    async fn test_refresh_failure_never_sets_error() {
        let api = FakeApi::default().with_section(Err(FeedError::Status(500)));
        let mut reader = FeedReader::new(api, all_sections());

        assert!(matches!(reader.refresh().await, Err(FeedError::Status(500))));
        assert_eq!(reader.state().error, None);
        assert!(reader.state().last_fetch.is_none());
    }

    #[test]
    fn test_newest_first_truncates_before_sorting() {
        let articles = vec![
            article("a", "2025-05-04T10:00:00-04:00"),
            article("b", "2025-05-06T10:00:00-04:00"),
            article("c", "2025-05-07T10:00:00-04:00"),
        ];
        let kept: Vec<_> = newest_first(articles, 2).into_iter().map(|a| a.url).collect();
        assert_eq!(kept, ["b", "a"]);
    }
}
