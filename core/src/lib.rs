//! API client core for a news reader.
//!
//! # Overview
//! Fetches top headlines and article searches from a NewsAPI-style service,
//! either directly (API key sent from this process) or through a proxy that
//! holds the key server-side. Results are normalized into `QueryResult`;
//! every failure becomes a single user-safe `ClientError`.
//!
//! # Design
//! - `Configuration` is resolved once and owned by `NewsClient`; the free
//!   `fetch_*` functions re-resolve it from the environment on every call.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_response` (consumes an `HttpResponse`), so request shaping and
//!   error mapping are testable without I/O.
//! - The round-trip goes through the `Transport` trait, raced against a
//!   15 second deadline and an optional caller `CancellationToken`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod transport;
pub mod types;

pub use client::{fetch_search, fetch_top_headlines, NewsClient, Phase, DEFAULT_TIMEOUT};
pub use config::{resolve_config, ApiKey, Configuration, Mode};
pub use error::{CancelReason, ClientError, ErrorCode};
pub use http::{HttpMethod, HttpRequest, HttpResponse, API_KEY_HEADER};
pub use query::QueryRequest;
pub use transport::{ReqwestTransport, Transport, TransportError, TransportErrorKind};
pub use types::{
    Article, ArticleSource, LogicalEndpoint, QueryResult, SearchFilters, SortBy, TopHeadlinesFilters,
};

pub use tokio_util::sync::CancellationToken;
