//! Domain DTOs for the news API.
//!
//! # Design
//! `Article` is a pass-through record: the recognized fields are typed and
//! optional, anything else the upstream sends is kept in `extra` so a caller
//! sees the record exactly as it arrived. Filters are what a view hands to
//! the client; they are normalized later, in `query`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Mode;

/// Publisher of an article.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A single article as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ArticleSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_to_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Recognized fields that must hold a string (or null) to be typed.
const STRING_FIELDS: &[&str] = &[
    "author",
    "title",
    "description",
    "url",
    "urlToImage",
    "publishedAt",
    "content",
];

impl Article {
    /// Build an article from any JSON object. A recognized field whose value
    /// has an unexpected type is kept untyped in `extra` rather than failing
    /// the whole record. Returns `None` only for non-objects.
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };

        let mut odd = Map::new();
        for &field in STRING_FIELDS {
            if map.get(field).is_some_and(|v| !(v.is_string() || v.is_null())) {
                if let Some(v) = map.remove(field) {
                    odd.insert(field.to_string(), v);
                }
            }
        }
        if map.get("source").is_some_and(|v| !is_source_shaped(v)) {
            if let Some(v) = map.remove("source") {
                odd.insert("source".to_string(), v);
            }
        }

        let mut article: Article = serde_json::from_value(Value::Object(map)).unwrap_or_default();
        article.extra.extend(odd);
        Some(article)
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }
}

fn is_source_shaped(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(source) => ["id", "name"].iter().all(|k| {
            source
                .get(*k)
                .map_or(true, |v| v.is_string() || v.is_null())
        }),
        _ => false,
    }
}

/// Normalized result of a successful fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub total_results: u64,
    pub articles: Vec<Article>,
}

/// Abstract operation name, mapped to a concrete path per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalEndpoint {
    TopHeadlines,
    Search,
}

impl LogicalEndpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalEndpoint::TopHeadlines => "top-headlines",
            LogicalEndpoint::Search => "search",
        }
    }

    /// Concrete path segment under the configured base URL.
    pub fn path(self, mode: Mode) -> &'static str {
        match (self, mode) {
            (LogicalEndpoint::TopHeadlines, _) => "top-headlines",
            (LogicalEndpoint::Search, Mode::Proxy) => "search",
            (LogicalEndpoint::Search, Mode::Direct) => "everything",
        }
    }
}

/// Sort order accepted by the search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevancy,
    Popularity,
    #[default]
    PublishedAt,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Relevancy => "relevancy",
            SortBy::Popularity => "popularity",
            SortBy::PublishedAt => "publishedAt",
        }
    }

    /// Allow-list match; anything else becomes `PublishedAt`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim() {
            "relevancy" => SortBy::Relevancy,
            "popularity" => SortBy::Popularity,
            _ => SortBy::PublishedAt,
        }
    }
}

/// Filters for the top-headlines listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TopHeadlinesFilters {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

/// Filters for a full-text search. `q` is required and must not be blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub q: String,
    /// Free-form; unknown values fall back to `publishedAt`.
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

impl SearchFilters {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }
}
