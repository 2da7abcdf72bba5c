//! HTTP request/response types for the host-does-IO split.
//!
//! # Design
//! The client builds `HttpRequest` values and parses `HttpResponse` values
//! as plain data. Executing the round-trip is the job of a `Transport`, so
//! request building and response classification stay deterministic and can
//! be tested without a network.

/// Header carrying the API key in direct mode.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// HTTP method for a request. The news API is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

/// An HTTP request described as plain data.
///
/// `Debug` masks the API key header so requests can be logged.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case(API_KEY_HEADER) {
                    (k.as_str(), "[REDACTED]")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .finish()
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_masks_api_key() {
        let mut req = HttpRequest::get("https://newsapi.org/v2/top-headlines");
        req.headers.push((API_KEY_HEADER.to_string(), "abc123".to_string()));
        let printed = format!("{req:?}");
        assert!(!printed.contains("abc123"));
        assert!(printed.contains("[REDACTED]"));
        assert_eq!(req.header("x-api-key"), Some("abc123"));
    }

    #[test]
    fn success_range() {
        let ok = HttpResponse { status: 204, headers: Vec::new(), body: String::new() };
        let bad = HttpResponse { status: 304, ..ok.clone() };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
