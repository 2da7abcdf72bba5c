//! Terminal rendering of fetch results.

use std::fmt::Write;

use news_core::{ClientError, QueryResult};

/// Numbered list: title, then source and date, then the link.
pub fn articles(result: &QueryResult) -> String {
    let mut out = String::new();
    if result.articles.is_empty() {
        out.push_str("No articles found.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "Showing {} of {} articles\n",
        result.articles.len(),
        result.total_results
    );
    for (i, article) in result.articles.iter().enumerate() {
        let title = article.title.as_deref().unwrap_or("(untitled)");
        let _ = writeln!(out, "{:>3}. {title}", i + 1);

        let meta: Vec<&str> = [article.source_name(), article.published_at.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !meta.is_empty() {
            let _ = writeln!(out, "     {}", meta.join(" | "));
        }
        if let Some(url) = &article.url {
            let _ = writeln!(out, "     {url}");
        }
    }
    out
}

pub fn error(err: &ClientError) -> String {
    match err.code {
        Some(code) => format!("error [{code:?}]: {}", err.message),
        None => match err.status {
            Some(status) => format!("error [HTTP {status}]: {}", err.message),
            None => format!("error: {}", err.message),
        },
    }
}
