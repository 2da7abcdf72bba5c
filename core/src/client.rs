//! Request client for the news API.
//!
//! # Design
//! `NewsClient` owns an immutable `Configuration`, a `Transport` and a
//! deadline, and carries no mutable state between calls. Each operation is
//! split the same way as the rest of the crate: `build_*` produces an
//! `HttpRequest` (validation, config checks, normalization, URL, credential
//! header), `parse_response` turns an `HttpResponse` into a `QueryResult` or
//! a `ClientError`. `fetch_*` glue the two halves around one transport call
//! raced against the deadline and the caller's cancellation token.
//!
//! Every call is a single attempt. Nothing is retried or cached.

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::{resolve_config, Configuration, Mode};
use crate::error::{CancelReason, ClientError};
use crate::http::{HttpRequest, HttpResponse, API_KEY_HEADER};
use crate::query::QueryRequest;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Article, LogicalEndpoint, QueryResult, SearchFilters, TopHeadlinesFilters};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Lifecycle of a single call. `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    ConfigChecked,
    Requesting,
    Success,
    Failed,
}

#[derive(Debug, Clone)]
pub struct NewsClient<T = ReqwestTransport> {
    config: Configuration,
    transport: T,
    timeout: Duration,
}

impl NewsClient<ReqwestTransport> {
    pub fn new(config: Configuration) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new().map_err(|e| {
            warn!(error = %e, "failed to initialise HTTP transport");
            ClientError::config("The HTTP client could not be initialised.")
        })?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> NewsClient<T> {
    pub fn with_transport(config: Configuration, transport: T) -> Self {
        Self {
            config,
            transport,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn build_top_headlines(&self, filters: &TopHeadlinesFilters) -> Result<HttpRequest, ClientError> {
        self.build(&QueryRequest::top_headlines(filters))
    }

    pub fn build_search(&self, filters: &SearchFilters) -> Result<HttpRequest, ClientError> {
        self.build(&QueryRequest::search(filters)?)
    }

    fn build(&self, query: &QueryRequest) -> Result<HttpRequest, ClientError> {
        let mode = self.config.mode();
        let api_key = match mode {
            Mode::Direct => Some(self.config.api_key().ok_or_else(|| {
                ClientError::config(
                    "No API key configured. Set NEWS_API_KEY, or point NEWS_API_BASE_URL at a proxy.",
                )
            })?),
            Mode::Proxy => None,
        };
        trace!(phase = ?Phase::ConfigChecked, mode = mode.as_str());

        let url = query.to_url(self.config.base_url(), mode)?;
        let mut request = HttpRequest::get(url);
        if let Some(key) = api_key {
            request
                .headers
                .push((API_KEY_HEADER.to_string(), key.expose().to_string()));
        }
        Ok(request)
    }

    /// Classify a response. A body that is not JSON is treated as absent.
    pub fn parse_response(&self, response: HttpResponse) -> Result<QueryResult, ClientError> {
        let payload: Option<Value> = serde_json::from_str(&response.body).ok();
        let reports_error = payload
            .as_ref()
            .and_then(|p| p.get("status"))
            .and_then(Value::as_str)
            == Some("error");

        if !response.is_success() || reports_error {
            let key = self.config.api_key().map(|k| k.expose());
            return Err(ClientError::upstream(response.status, payload, key));
        }
        Ok(normalize(payload))
    }

    pub async fn fetch_top_headlines(
        &self,
        filters: &TopHeadlinesFilters,
        cancel: Option<&CancellationToken>,
    ) -> Result<QueryResult, ClientError> {
        trace!(phase = ?Phase::Idle, endpoint = "top-headlines");
        trace!(phase = ?Phase::Validating, endpoint = "top-headlines");
        let request = self.build_top_headlines(filters);
        self.perform(LogicalEndpoint::TopHeadlines, request, cancel).await
    }

    pub async fn fetch_search(
        &self,
        filters: &SearchFilters,
        cancel: Option<&CancellationToken>,
    ) -> Result<QueryResult, ClientError> {
        trace!(phase = ?Phase::Idle, endpoint = "search");
        trace!(phase = ?Phase::Validating, endpoint = "search");
        let request = self.build_search(filters);
        self.perform(LogicalEndpoint::Search, request, cancel).await
    }

    async fn perform(
        &self,
        endpoint: LogicalEndpoint,
        request: Result<HttpRequest, ClientError>,
        cancel: Option<&CancellationToken>,
    ) -> Result<QueryResult, ClientError> {
        let result = match request {
            Ok(request) => self.dispatch(endpoint, request, cancel).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(r) => trace!(phase = ?Phase::Success, articles = r.articles.len()),
            Err(e) => warn!(
                phase = ?Phase::Failed,
                endpoint = endpoint.as_str(),
                mode = self.config.mode().as_str(),
                code = ?e.code,
                status = ?e.status,
                "{}",
                e.message
            ),
        }
        result
    }

    async fn dispatch(
        &self,
        endpoint: LogicalEndpoint,
        request: HttpRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<QueryResult, ClientError> {
        let mode = self.config.mode();

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(ClientError::cancelled(CancelReason::Caller, self.timeout));
        }

        debug!(
            phase = ?Phase::Requesting,
            mode = mode.as_str(),
            endpoint = endpoint.as_str(),
            path = endpoint.path(mode),
            "dispatching news request"
        );

        // Dropping the transport future aborts the underlying request.
        let outcome = tokio::select! {
            biased;
            _ = caller_cancelled(cancel) => Err(CancelReason::Caller),
            _ = tokio::time::sleep(self.timeout) => Err(CancelReason::Timeout),
            sent = self.transport.get(&request) => Ok(sent),
        };

        let response = match outcome {
            Err(reason) => return Err(ClientError::cancelled(reason, self.timeout)),
            Ok(Err(e)) if e.is_network_failure() => {
                debug!(error = %e, "transport reported a network failure");
                return Err(ClientError::network(mode, endpoint));
            }
            Ok(Err(e)) => {
                debug!(error = %e, "transport failed");
                return Err(ClientError::transport(mode, endpoint));
            }
            Ok(Ok(response)) => response,
        };

        debug!(status = response.status, "news response received");
        self.parse_response(response)
    }
}

async fn caller_cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// `totalResults` defaults to 0, `articles` to empty. Every object entry is
/// kept; entries that are not objects are dropped.
fn normalize(payload: Option<Value>) -> QueryResult {
    let Some(Value::Object(mut map)) = payload else {
        return QueryResult::default();
    };
    let total_results = map.get("totalResults").and_then(Value::as_u64).unwrap_or(0);
    let articles = match map.remove("articles") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(Article::from_json)
            .collect(),
        _ => Vec::new(),
    };
    QueryResult {
        total_results,
        articles,
    }
}

/// Fetch top headlines using configuration resolved from the environment now.
pub async fn fetch_top_headlines(
    filters: &TopHeadlinesFilters,
    cancel: Option<&CancellationToken>,
) -> Result<QueryResult, ClientError> {
    NewsClient::new(resolve_config())?
        .fetch_top_headlines(filters, cancel)
        .await
}

/// Search articles using configuration resolved from the environment now.
pub async fn fetch_search(
    filters: &SearchFilters,
    cancel: Option<&CancellationToken>,
) -> Result<QueryResult, ClientError> {
    NewsClient::new(resolve_config())?
        .fetch_search(filters, cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use crate::error::ErrorCode;
    use crate::transport::{TransportError, TransportErrorKind};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const KEY: &str = "k-9f8e7d";

    /// Scripted transport that records every request it receives.
    #[derive(Clone)]
    struct Scripted {
        reply: Result<HttpResponse, TransportError>,
        hang: bool,
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl Scripted {
        fn ok(status: u16, body: serde_json::Value) -> Self {
            Self::reply(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }))
        }

        fn raw(status: u16, body: &str) -> Self {
            Self::reply(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }))
        }

        fn fail(kind: TransportErrorKind, message: &str) -> Self {
            Self::reply(Err(TransportError::new(kind, message)))
        }

        fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::raw(200, "{}")
            }
        }

        fn reply(reply: Result<HttpResponse, TransportError>) -> Self {
            Self {
                reply,
                hang: false,
                calls: Arc::new(AtomicUsize::new(0)),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for Scripted {
        async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.reply.clone()
        }
    }

    fn direct(transport: Scripted) -> NewsClient<Scripted> {
        let config = Configuration::new("https://newsapi.org/v2", Some(ApiKey::new(KEY)), Mode::Direct);
        NewsClient::with_transport(config, transport)
    }

    fn proxy(transport: Scripted) -> NewsClient<Scripted> {
        NewsClient::with_transport(Configuration::infer("http://localhost:8787/api", None), transport)
    }

    fn ok_payload() -> serde_json::Value {
        json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {"title": "One", "source": {"name": "A"}},
                {"title": "Two", "url": "https://b.example/2"}
            ]
        })
    }

    #[tokio::test]
    async fn direct_top_headlines_sends_key_header() {
        let transport = Scripted::ok(200, ok_payload());
        let client = direct(transport.clone());
        let filters = TopHeadlinesFilters {
            country: Some("us".into()),
            category: Some("science".into()),
            ..Default::default()
        };

        let result = client.fetch_top_headlines(&filters, None).await.unwrap();
        assert_eq!(result.total_results, 2);
        assert_eq!(result.articles[0].title.as_deref(), Some("One"));

        let sent = transport.last();
        assert_eq!(sent.header(API_KEY_HEADER), Some(KEY));
        assert_eq!(
            sent.url,
            "https://newsapi.org/v2/top-headlines?country=us&category=science&pageSize=20&page=1"
        );
    }

    #[tokio::test]
    async fn proxy_search_uses_search_path_without_key() {
        let transport = Scripted::ok(200, ok_payload());
        let client = proxy(transport.clone());

        client.fetch_search(&SearchFilters::new("rust"), None).await.unwrap();

        let sent = transport.last();
        assert!(sent.url.starts_with("http://localhost:8787/api/search?q=rust"));
        assert!(sent.headers.is_empty());
    }

    #[tokio::test]
    async fn missing_articles_become_empty() {
        let client = direct(Scripted::ok(200, json!({"status": "ok", "articles": null})));
        let result = client
            .fetch_top_headlines(&TopHeadlinesFilters::default(), None)
            .await
            .unwrap();
        assert_eq!(result, QueryResult::default());
    }

    #[tokio::test]
    async fn non_json_success_body_is_empty_result() {
        let client = direct(Scripted::raw(200, "<html>oops</html>"));
        let result = client
            .fetch_top_headlines(&TopHeadlinesFilters::default(), None)
            .await
            .unwrap();
        assert_eq!(result.total_results, 0);
        assert!(result.articles.is_empty());
    }

    #[tokio::test]
    async fn blank_search_never_hits_network() {
        let transport = Scripted::ok(200, ok_payload());
        let err = direct(transport.clone())
            .fetch_search(&SearchFilters::new(""), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::Validation));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn direct_mode_without_key_is_config_error() {
        let transport = Scripted::ok(200, ok_payload());
        let client = NewsClient::with_transport(Configuration::infer("https://newsapi.org/v2", None), transport.clone());

        let err = client
            .fetch_top_headlines(&TopHeadlinesFilters::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::Config));

        let err = client.fetch_search(&SearchFilters::new("x"), None).await.unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::Config));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn base_without_scheme_is_config_error() {
        let transport = Scripted::ok(200, ok_payload());
        let client = NewsClient::with_transport(
            Configuration::new("localhost:8787", None, Mode::Proxy),
            transport.clone(),
        );
        let err = client
            .fetch_top_headlines(&TopHeadlinesFilters::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::Config));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn failed_to_fetch_is_network_error_without_key() {
        let client = direct(Scripted::fail(TransportErrorKind::Other, "TypeError: Failed to fetch"));
        let err = client
            .fetch_top_headlines(&TopHeadlinesFilters::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::Network));
        assert!(err.message.contains("direct mode"));
        assert!(!err.message.contains(KEY));
        assert!(!err.message.contains("newsapi.org"));
    }

    #[tokio::test]
    async fn other_transport_failures_are_generic() {
        let client = proxy(Scripted::fail(TransportErrorKind::Body, "unexpected eof"));
        let err = client
            .fetch_search(&SearchFilters::new("x"), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::Network));
        assert!(err.message.contains("could not be completed"));
    }

    #[tokio::test]
    async fn status_codes_map_to_messages() {
        for (status, needle) in [(429, "wait"), (401, "Unauthorized"), (503, "unavailable")] {
            let client = direct(Scripted::ok(status, json!({"status": "error", "message": "x"})));
            let err = client
                .fetch_top_headlines(&TopHeadlinesFilters::default(), None)
                .await
                .unwrap_err();
            assert!(err.message.contains(needle), "{status}: {}", err.message);
            assert_eq!(err.status, Some(status));
            assert!(err.details.is_some());
        }
    }

    #[tokio::test]
    async fn error_payload_with_ok_status_fails() {
        let payload = json!({"status": "error", "code": "parametersMissing", "message": "Required parameters are missing."});
        let err = direct(Scripted::ok(200, payload))
            .fetch_top_headlines(&TopHeadlinesFilters::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Required parameters are missing.");
        assert_eq!(err.status, Some(200));
        assert!(err.code.is_none());
    }

    #[tokio::test]
    async fn already_cancelled_token_sends_nothing() {
        let transport = Scripted::ok(200, ok_payload());
        let token = CancellationToken::new();
        token.cancel();

        let err = direct(transport.clone())
            .fetch_top_headlines(&TopHeadlinesFilters::default(), Some(&token))
            .await
            .unwrap_err();
        assert!(err.is_caller_cancelled());
        assert_eq!(err.code, Some(ErrorCode::Network));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_in_flight_request_rejects() {
        let transport = Scripted::hanging();
        let client = direct(transport.clone());
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = client
            .fetch_top_headlines(&TopHeadlinesFilters::default(), Some(&token))
            .await
            .unwrap_err();
        assert!(err.is_caller_cancelled());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_request_times_out() {
        let client = proxy(Scripted::hanging()).with_timeout(Duration::from_secs(15));
        let token = CancellationToken::new();

        let err = client
            .fetch_search(&SearchFilters::new("slow"), Some(&token))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.message.contains("15 seconds"));
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn identical_calls_give_identical_results() {
        let client = direct(Scripted::ok(200, ok_payload()));
        let filters = TopHeadlinesFilters {
            country: Some("gb".into()),
            ..Default::default()
        };
        let first = client.fetch_top_headlines(&filters, None).await.unwrap();
        let second = client.fetch_top_headlines(&filters, None).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn odd_typed_articles_are_kept() {
        let result = normalize(Some(json!({
            "totalResults": 3,
            "articles": [
                {"title": "kept"},
                {"title": "string source", "source": "Reuters"},
                {"title": "numeric date", "publishedAt": 1697500000}
            ]
        })));
        assert_eq!(result.articles.len(), 3);
        assert_eq!(result.articles[1].title.as_deref(), Some("string source"));
        assert_eq!(result.articles[1].extra["source"], "Reuters");
        assert_eq!(result.articles[2].title.as_deref(), Some("numeric date"));
        assert_eq!(result.articles[2].extra["publishedAt"], 1697500000);
    }

    #[test]
    fn non_object_entries_are_dropped() {
        let result = normalize(Some(json!({"articles": [{"title": "a"}, 7, "b"]})));
        assert_eq!(result.articles.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_timeout_is_reported_in_millis() {
        let client = proxy(Scripted::hanging()).with_timeout(Duration::from_millis(200));
        let err = client
            .fetch_top_headlines(&TopHeadlinesFilters::default(), None)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.message.contains("200 ms"), "{}", err.message);
    }

    /// In-memory sink for formatted trace lines.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn phases(&self) -> Vec<String> {
            let text = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            text.split_whitespace()
                .filter_map(|word| word.strip_prefix("phase="))
                .map(str::to_string)
                .collect()
        }
    }

    async fn traced_phases<F: std::future::Future>(fetch: F) -> Vec<String> {
        let sink = Captured::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        let _ = fetch.await;
        sink.phases()
    }

    #[tokio::test]
    async fn both_fetches_trace_every_phase_in_order() {
        let expected = ["Idle", "Validating", "ConfigChecked", "Requesting", "Success"];

        let client = proxy(Scripted::ok(200, ok_payload()));
        let phases = traced_phases(client.fetch_top_headlines(&TopHeadlinesFilters::default(), None)).await;
        assert_eq!(phases, expected);

        let client = proxy(Scripted::ok(200, ok_payload()));
        let phases = traced_phases(client.fetch_search(&SearchFilters::new("rust"), None)).await;
        assert_eq!(phases, expected);
    }

    #[tokio::test]
    async fn rejected_search_ends_in_failed_phase() {
        let client = proxy(Scripted::ok(200, ok_payload()));
        let phases = traced_phases(client.fetch_search(&SearchFilters::new("  "), None)).await;
        assert_eq!(phases.first().map(String::as_str), Some("Idle"));
        assert_eq!(phases.last().map(String::as_str), Some("Failed"));
        assert!(!phases.iter().any(|p| p == "Requesting"));
    }

    #[test]
    fn negative_total_defaults_to_zero() {
        let result = normalize(Some(json!({"totalResults": -1, "articles": "nope"})));
        assert_eq!(result, QueryResult::default());
    }
}
