//! Stub of a NewsAPI-style service, and of a proxy in front of one.
//!
//! Serves canned articles on `/top-headlines`, `/everything` (upstream
//! paths) and `/search` (proxy path). A `Scenario` scripts how the server
//! misbehaves so clients can be exercised against real HTTP. Every response
//! echoes the raw query string in `x-echo-query`.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Query, RawQuery, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::debug;

pub const ECHO_QUERY_HEADER: &str = "x-echo-query";
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Source,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: String,
    pub category: String,
}

/// How the server answers.
#[derive(Clone, Debug, Default)]
pub enum Scenario {
    /// Serve fixtures, no key checks.
    #[default]
    Ok,
    /// Upstream paths demand this `X-Api-Key`; `/search` does not.
    RequireKey(String),
    /// Every route answers with this status and raw body.
    Status(u16, String),
    /// `{"status":"ok"}` with no `articles` or `totalResults`.
    MissingArticles,
    /// 200 with a body that is not JSON.
    Malformed,
    /// Serve fixtures after sleeping.
    Delay(Duration),
}

#[derive(Debug)]
struct MockState {
    scenario: Scenario,
    articles: Vec<Article>,
}

type Shared = Arc<MockState>;

pub fn app() -> Router {
    app_with(Scenario::Ok)
}

pub fn app_with(scenario: Scenario) -> Router {
    let state = Arc::new(MockState {
        scenario,
        articles: fixtures(),
    });
    Router::new()
        .route("/top-headlines", get(top_headlines))
        .route("/everything", get(everything))
        .route("/search", get(search))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Scenario::Ok).await
}

pub async fn run_with(listener: TcpListener, scenario: Scenario) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(scenario)).await
}

pub fn fixtures() -> Vec<Article> {
    let article = |n: u32, category: &str, title: &str, source: &str| Article {
        source: Source {
            id: None,
            name: source.to_string(),
        },
        author: Some(format!("Reporter {n}")),
        title: title.to_string(),
        description: Some(format!("Summary of {title}")),
        url: format!("https://news.example/{n}"),
        url_to_image: None,
        published_at: format!("2026-10-{:02}T08:00:00Z", n),
        category: category.to_string(),
    };
    vec![
        article(1, "technology", "Rust compiler release speeds up builds", "Tech Daily"),
        article(2, "science", "Lander reaches outer planet", "Space Wire"),
        article(3, "business", "Markets steady ahead of rate decision", "Finance Post"),
        article(4, "technology", "New memory-safe kernel drivers land", "Tech Daily"),
        article(5, "health", "Study links sleep and memory", "Health Now"),
    ]
}

async fn top_headlines(
    State(state): State<Shared>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = check_key(&state, &headers) {
        return echo(rejection, raw);
    }
    let response = respond(&state, &params, |a| {
        params
            .get("category")
            .map_or(true, |c| a.category.eq_ignore_ascii_case(c))
    })
    .await;
    echo(response, raw)
}

async fn everything(
    State(state): State<Shared>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = check_key(&state, &headers) {
        return echo(rejection, raw);
    }
    let response = respond(&state, &params, |a| matches_query(a, &params)).await;
    echo(response, raw)
}

async fn search(
    State(state): State<Shared>,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let response = respond(&state, &params, |a| matches_query(a, &params)).await;
    echo(response, raw)
}

fn matches_query(article: &Article, params: &HashMap<String, String>) -> bool {
    match params.get("q") {
        Some(q) => article.title.to_lowercase().contains(&q.to_lowercase()),
        None => false,
    }
}

fn check_key(state: &MockState, headers: &HeaderMap) -> Option<Response> {
    let Scenario::RequireKey(expected) = &state.scenario else {
        return None;
    };
    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    let (code, message) = match provided {
        None => (
            "apiKeyMissing",
            "Your API key is missing. Append this to the URL with the apiKey param, or use the x-api-key HTTP header.",
        ),
        Some(key) if key == expected => return None,
        Some(_) => ("apiKeyInvalid", "Your API key is invalid or incorrect."),
    };
    debug!(code, "rejecting request");
    Some(
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": "error", "code": code, "message": message})),
        )
            .into_response(),
    )
}

async fn respond<F>(state: &MockState, params: &HashMap<String, String>, keep: F) -> Response
where
    F: Fn(&Article) -> bool,
{
    match &state.scenario {
        Scenario::Status(status, body) => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, body.clone()).into_response();
        }
        Scenario::MissingArticles => return Json(json!({"status": "ok"})).into_response(),
        Scenario::Malformed => return (StatusCode::OK, "<html>upstream exploded</html>").into_response(),
        Scenario::Delay(delay) => tokio::time::sleep(*delay).await,
        Scenario::Ok | Scenario::RequireKey(_) => {}
    }

    let matching: Vec<&Article> = state.articles.iter().filter(|&a| keep(a)).collect();
    let page_size = number(params, "pageSize").unwrap_or(20).max(1);
    let page = number(params, "page").unwrap_or(1).max(1);
    let articles: Vec<&Article> = matching
        .iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .copied()
        .collect();

    let body: Value = json!({
        "status": "ok",
        "totalResults": matching.len(),
        "articles": articles,
    });
    Json(body).into_response()
}

fn number(params: &HashMap<String, String>, key: &str) -> Option<usize> {
    params.get(key).and_then(|v| v.parse().ok())
}

fn echo(mut response: Response, raw: Option<String>) -> Response {
    if let Ok(value) = HeaderValue::from_str(raw.as_deref().unwrap_or("")) {
        response.headers_mut().insert(ECHO_QUERY_HEADER, value);
    }
    response
}
