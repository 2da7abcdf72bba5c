//! Parameter normalization and URL construction.
//!
//! A `QueryRequest` is the immutable, already-normalized form of a fetch:
//! a logical endpoint plus an ordered list of key/value pairs. Empty or
//! absent values never make it into the list, so they are never serialized.

use url::Url;

use crate::config::Mode;
use crate::error::ClientError;
use crate::types::{LogicalEndpoint, SearchFilters, SortBy, TopHeadlinesFilters};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub endpoint: LogicalEndpoint,
    pub params: Vec<(&'static str, String)>,
}

impl QueryRequest {
    pub fn top_headlines(filters: &TopHeadlinesFilters) -> Self {
        let mut params = Vec::new();
        push_opt(&mut params, "country", filters.country.as_deref());
        push_opt(&mut params, "category", filters.category.as_deref());
        push_paging(&mut params, filters.page, filters.page_size);
        Self {
            endpoint: LogicalEndpoint::TopHeadlines,
            params,
        }
    }

    /// Fails with a validation error when the query text is blank.
    pub fn search(filters: &SearchFilters) -> Result<Self, ClientError> {
        let q = filters.q.trim();
        if q.is_empty() {
            return Err(ClientError::validation("Please enter a search term."));
        }

        let sort_by = filters
            .sort_by
            .as_deref()
            .map(SortBy::parse_lenient)
            .unwrap_or_default();

        let mut params = vec![("q", q.to_string()), ("sortBy", sort_by.as_str().to_string())];
        push_opt(&mut params, "language", filters.language.as_deref());
        push_paging(&mut params, filters.page, filters.page_size);
        Ok(Self {
            endpoint: LogicalEndpoint::Search,
            params,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `{base}/{path}?{query}`. The base must carry an explicit http(s) scheme.
    pub fn to_url(&self, base_url: &str, mode: Mode) -> Result<Url, ClientError> {
        if !has_http_scheme(base_url) {
            return Err(ClientError::config(
                "The news API base URL must start with http:// or https://.",
            ));
        }

        let raw = format!("{}/{}", base_url.trim_end_matches('/'), self.endpoint.path(mode));
        let mut url = Url::parse(&raw)
            .map_err(|e| ClientError::config(format!("The news API base URL is invalid: {e}.")))?;
        if !self.params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

pub fn has_http_scheme(base_url: &str) -> bool {
    let lower = base_url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(DEFAULT_PAGE).max(1)
}

pub fn clamp_page_size(page_size: Option<i64>) -> i64 {
    page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

fn push_opt(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        params.push((key, v.to_string()));
    }
}

fn push_paging(params: &mut Vec<(&'static str, String)>, page: Option<i64>, page_size: Option<i64>) {
    params.push(("pageSize", clamp_page_size(page_size).to_string()));
    params.push(("page", clamp_page(page).to_string()));
}
