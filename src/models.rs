//! Data models for feed articles and the NYT wire formats they come from.
//!
//! This module defines:
//! - [`Article`]: the immutable, normalized article held by the feed state
//! - [`Multimedia`]: image metadata attached to an article
//! - [`SearchResponse`] / [`SearchDoc`]: the Article Search API body
//! - [`TopStoriesResponse`] / [`TopStory`]: the Top Stories API body
//!
//! Both wire formats are mapped into [`Article`] so the rest of the crate never
//! sees the difference between a search hit and a section story.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Host prefixed to relative multimedia paths returned by the search API.
pub const STATIC_MEDIA_BASE: &str = "https://static01.nyt.com/";

/// A single news article as held by the feed.
///
/// The `url` is the article's identity: two articles with the same URL are the
/// same article, whichever endpoint delivered them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: String,
    /// Publication timestamp exactly as delivered by the API.
    pub published_date: String,
    #[serde(default)]
    pub updated_date: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub multimedia: Vec<Multimedia>,
    #[serde(default)]
    pub section: String,
}

impl Article {
    /// Parse the publication timestamp.
    ///
    /// Top stories use RFC 3339 (`2025-05-06T10:02:43-04:00`) while the search
    /// API omits the colon in the offset (`2025-05-06T14:30:00+0000`). Both are
    /// accepted; anything else yields `None`.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.published_date)
    }

    /// The first image URL, if the article carries any multimedia.
    pub fn thumbnail(&self) -> Option<&str> {
        self.multimedia.first().map(|m| m.url.as_str())
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Image metadata attached to an article.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Multimedia {
    pub url: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub copyright: String,
}

/// Body of `GET /svc/search/v2/articlesearch.json`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub response: Option<SearchBody>,
}

impl SearchResponse {
    /// Consume the response, yielding its documents (empty when absent).
    pub fn into_docs(self) -> Vec<SearchDoc> {
        self.response.map(|r| r.docs).unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchDoc {
    #[serde(default)]
    pub headline: Option<Headline>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub lead_paragraph: Option<String>,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub pub_date: String,
    #[serde(default)]
    pub section_name: Option<String>,
    /// Kept loose: older responses carry an array, newer ones an object.
    #[serde(default)]
    pub multimedia: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct Headline {
    #[serde(default)]
    pub main: Option<String>,
}

/// One entry of a search document's multimedia array.
#[derive(Debug, Default, Deserialize)]
struct SearchMedia {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(rename = "type", default)]
    media_type: Option<String>,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    copyright: Option<String>,
}

impl SearchMedia {
    fn into_multimedia(self) -> Option<Multimedia> {
        let url = self.url.filter(|u| !u.is_empty())?;
        let url = if url.starts_with("http") {
            url
        } else {
            format!("{STATIC_MEDIA_BASE}{url}")
        };
        Some(Multimedia {
            url,
            format: self.format.unwrap_or_else(|| "Large".to_string()),
            height: self.height.unwrap_or(0),
            width: self.width.unwrap_or(0),
            media_type: self.media_type.unwrap_or_else(|| "image".to_string()),
            subtype: self.subtype.unwrap_or_default(),
            caption: self.caption.unwrap_or_default(),
            copyright: self.copyright.unwrap_or_default(),
        })
    }
}

impl From<SearchDoc> for Article {
    fn from(doc: SearchDoc) -> Self {
        // Only the first media item is kept.
        let multimedia = doc
            .multimedia
            .as_array()
            .and_then(|items| items.first())
            .and_then(|first| serde_json::from_value::<SearchMedia>(first.clone()).ok())
            .and_then(SearchMedia::into_multimedia)
            .into_iter()
            .collect();

        let abstract_text = doc
            .abstract_text
            .filter(|a| !a.is_empty())
            .or(doc.lead_paragraph)
            .unwrap_or_default();

        Article {
            title: doc
                .headline
                .and_then(|h| h.main)
                .unwrap_or_else(|| "No title".to_string()),
            abstract_text,
            url: doc.web_url,
            published_date: doc.pub_date,
            updated_date: None,
            created_date: None,
            multimedia,
            section: doc.section_name.unwrap_or_default(),
        }
    }
}

/// Body of `GET /svc/topstories/v2/{section}.json`.
#[derive(Debug, Default, Deserialize)]
pub struct TopStoriesResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub copyright: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub num_results: usize,
    #[serde(default)]
    pub results: Vec<TopStory>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopStory {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub updated_date: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub multimedia: Option<Vec<Multimedia>>,
    #[serde(default)]
    pub section: String,
}

impl From<TopStory> for Article {
    fn from(story: TopStory) -> Self {
        Article {
            title: story.title,
            abstract_text: story.abstract_text,
            url: story.url,
            published_date: story.published_date,
            updated_date: story.updated_date,
            created_date: story.created_date,
            multimedia: story.multimedia.unwrap_or_default(),
            section: story.section,
        }
    }
}
