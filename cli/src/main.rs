//! # News Reader
//!
//! Terminal front end for `news-core`: lists top headlines or searches
//! articles, either straight from the news API or through a proxy.
//!
//! ```sh
//! NEWS_API_KEY=... news-reader headlines --country us --category technology
//! news-reader --base-url http://localhost:8787 search "rust" --sort-by relevancy
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use news_core::{CancellationToken, NewsClient};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod render;

use cli::{Cli, Request};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to parse .env"),
    }

    let args = Cli::parse();
    let config = args.connection.resolve(|name| std::env::var(name).ok());
    info!(mode = config.mode().as_str(), base_url = config.base_url(), "resolved configuration");

    let client = NewsClient::new(config)?
        .with_timeout(Duration::from_secs(args.connection.timeout_secs));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let outcome = match args.command.request() {
        Request::TopHeadlines(filters) => client.fetch_top_headlines(&filters, Some(&cancel)).await,
        Request::Search(filters) => client.fetch_search(&filters, Some(&cancel)).await,
    };

    match outcome {
        Ok(result) if args.json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(result) => {
            print!("{}", render::articles(&result));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if args.json => {
            eprintln!("{}", serde_json::to_string_pretty(&e)?);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            eprintln!("{}", render::error(&e));
            Ok(ExitCode::FAILURE)
        }
    }
}
