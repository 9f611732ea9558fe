//! NYT API access.
//!
//! This module provides the transport the feed reader pulls articles through.
//!
//! # Architecture
//!
//! - [`NewsApi`]: trait describing the two endpoints the feed needs
//! - [`NytClient`]: `reqwest`-backed implementation talking to the real API
//!   (or to a local reverse proxy that forwards to it)
//!
//! # Endpoints
//!
//! | Call | Path |
//! |------|------|
//! | [`NewsApi::search_articles`] | `/svc/search/v2/articlesearch.json?sort=newest&page=N` |
//! | [`NewsApi::top_stories`] | `/svc/topstories/v2/{section}.json` |
//!
//! Every request carries the API key as the `api-key` query parameter. There
//! are no timeouts and no retries here; non-2xx responses are classified into
//! [`FeedError`] and returned to the caller.

use crate::error::FeedError;
use crate::models::{Article, SearchResponse, TopStoriesResponse};
use crate::utils::truncate_for_log;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// Trait for the news endpoints the feed reader depends on.
///
/// Implementors return articles already mapped into the feed's [`Article`]
/// shape, in the order the upstream delivered them.
pub trait NewsApi {
    /// Fetch one page of the newest search results.
    async fn search_articles(&self, page: u32) -> Result<Vec<Article>, FeedError>;

    /// Fetch the current top stories of one section.
    async fn top_stories(&self, section: &str) -> Result<Vec<Article>, FeedError>;
}

/// HTTP client for the New York Times APIs.
///
/// `base` may include a path prefix, in which case endpoint paths are appended
/// after it. This is how the reader is pointed at a reverse proxy such as
/// `http://localhost:5173/api/nyt` instead of the upstream host.
pub struct NytClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl fmt::Debug for NytClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NytClient")
            .field("base", &self.base.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl NytClient {
    /// Create a client for `base` authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidUrl`] when `base` is not an absolute URL.
    pub fn new(base: &str, api_key: impl Into<String>) -> Result<Self, FeedError> {
        let mut base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(FeedError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        // Normalise so endpoint segments always land after the prefix.
        if let Ok(mut segments) = base.path_segments_mut() {
            segments.pop_if_empty();
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            api_key: api_key.into(),
        })
    }

    /// Build an endpoint URL below the base, with the API key attached.
    fn endpoint(&self, path: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(path);
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-key", &self.api_key);
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// GET `url` and decode its JSON body, classifying non-2xx statuses.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FeedError> {
        let t0 = Instant::now();
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "NYT API returned an error status"
            );
            return Err(FeedError::from_status(status));
        }

        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "NYT API response received"
        );

        serde_json::from_str::<T>(&body).map_err(|e| {
            error!(
                error = %e,
                body_preview = %truncate_for_log(&body, 300),
                "NYT API returned a body we could not decode"
            );
            FeedError::Decode(e)
        })
    }
}

impl NewsApi for NytClient {
    #[instrument(level = "info", skip(self))]
    async fn search_articles(&self, page: u32) -> Result<Vec<Article>, FeedError> {
        let page = page.to_string();
        let url = self.endpoint(
            &["svc", "search", "v2", "articlesearch.json"],
            &[("sort", "newest"), ("page", &page)],
        );
        let response: SearchResponse = self.get_json(url).await?;
        let articles: Vec<Article> = response.into_docs().into_iter().map(Article::from).collect();
        debug!(count = articles.len(), "Decoded search results");
        Ok(articles)
    }

    #[instrument(level = "info", skip(self))]
    async fn top_stories(&self, section: &str) -> Result<Vec<Article>, FeedError> {
        let file = format!("{section}.json");
        let url = self.endpoint(&["svc", "topstories", "v2", &file], &[]);
        let response: TopStoriesResponse = self.get_json(url).await?;
        debug!(
            count = response.results.len(),
            num_results = response.num_results,
            section = %response.section,
            status = %response.status,
            last_updated = %response.last_updated,
            copyright = %response.copyright,
            "Decoded top stories"
        );
        Ok(response.results.into_iter().map(Article::from).collect())
    }
}
