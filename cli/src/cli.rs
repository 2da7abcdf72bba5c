//! Command-line interface definitions for the news reader.
//!
//! Connection settings default to the `NEWS_API_*` environment variables
//! (and a `.env` file); flags given here take precedence.

use clap::{Args, Parser, Subcommand};
use news_core::config::{API_KEY_VAR, BASE_URL_VAR, MODE_VAR};
use news_core::{Configuration, Mode, SearchFilters, TopHeadlinesFilters};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse top headlines and search news articles")]
pub struct Cli {
    #[command(flatten)]
    pub connection: Connection,

    /// Print the raw result as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct Connection {
    /// Base URL of the news API or of your proxy
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API key (direct mode only)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Force `direct` or `proxy` instead of inferring it from the base URL
    #[arg(long, global = true)]
    pub mode: Option<Mode>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 15)]
    pub timeout_secs: u64,
}

impl Connection {
    /// Flags first, then the environment.
    pub fn resolve<F>(&self, env: F) -> Configuration
    where
        F: Fn(&str) -> Option<String>,
    {
        Configuration::from_lookup(|name| {
            let flag = match name {
                BASE_URL_VAR => self.base_url.clone(),
                API_KEY_VAR => self.api_key.clone(),
                MODE_VAR => self.mode.map(|m| m.as_str().to_string()),
                _ => None,
            };
            flag.or_else(|| env(name))
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Top headlines, optionally by country and category
    Headlines {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        page: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
    },
    /// Search all articles
    Search {
        /// Search terms
        query: String,
        /// relevancy, popularity or publishedAt
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        page: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
    },
}

/// The operation a subcommand asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    TopHeadlines(TopHeadlinesFilters),
    Search(SearchFilters),
}

impl Command {
    pub fn request(&self) -> Request {
        match self {
            Command::Headlines {
                country,
                category,
                page,
                page_size,
            } => Request::TopHeadlines(TopHeadlinesFilters {
                country: country.clone(),
                category: category.clone(),
                page: *page,
                page_size: *page_size,
            }),
            Command::Search {
                query,
                sort_by,
                language,
                page,
                page_size,
            } => Request::Search(SearchFilters {
                q: query.clone(),
                sort_by: sort_by.clone(),
                language: language.clone(),
                page: *page,
                page_size: *page_size,
            }),
        }
    }
}
