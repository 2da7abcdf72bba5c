//! Configuration resolution: base URL, API key and operating mode.
//!
//! # Design
//! `Configuration` is a plain immutable value. It can be built explicitly
//! (`new`, `infer`) or resolved from environment-style variables
//! (`from_lookup`, `resolve_config`). Resolution is a pure function of the
//! variables it reads and is never cached, so each call reflects the current
//! environment.
//!
//! Mode is chosen by `NEWS_API_MODE` when present, otherwise by whether the
//! base URL mentions the upstream host.

use std::fmt;
use std::str::FromStr;

use tracing::warn;
use zeroize::Zeroize;

pub const BASE_URL_VAR: &str = "NEWS_API_BASE_URL";
pub const LEGACY_BASE_URL_VAR: &str = "NEWSAPI_BASE_URL";
pub const API_KEY_VAR: &str = "NEWS_API_KEY";
pub const MODE_VAR: &str = "NEWS_API_MODE";

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
pub const UPSTREAM_HOST: &str = "newsapi.org";

/// How requests reach the news API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Straight to the upstream API, authenticated with a local key.
    Direct,
    /// Through a backend that holds the key server-side.
    Proxy,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Direct => "direct",
            Mode::Proxy => "proxy",
        }
    }

    /// Host heuristic: direct iff the base URL references the upstream host.
    pub fn infer(base_url: &str) -> Self {
        if base_url.to_ascii_lowercase().contains(UPSTREAM_HOST) {
            Mode::Direct
        } else {
            Mode::Proxy
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Mode::Direct),
            "proxy" => Ok(Mode::Proxy),
            other => Err(format!("unknown mode '{other}', expected 'direct' or 'proxy'")),
        }
    }
}

/// An API key that never exposes its value through `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    inner: String,
}

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { inner: key.into() }
    }

    /// The raw key. Only the transport should need this.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.inner
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED API KEY]")
    }
}

impl Drop for ApiKey {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    base_url: String,
    api_key: Option<ApiKey>,
    mode: Mode,
}

impl Configuration {
    /// Explicit configuration. The key is dropped in proxy mode.
    pub fn new(base_url: &str, api_key: Option<ApiKey>, mode: Mode) -> Self {
        let api_key = match mode {
            Mode::Direct => api_key.filter(|k| !k.expose().trim().is_empty()),
            Mode::Proxy => None,
        };
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key,
            mode,
        }
    }

    /// Explicit base URL and key, mode chosen by the host heuristic.
    pub fn infer(base_url: &str, api_key: Option<ApiKey>) -> Self {
        Self::new(base_url, api_key, Mode::infer(base_url))
    }

    /// Resolve from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = match (var(BASE_URL_VAR), var(LEGACY_BASE_URL_VAR)) {
            (Some(url), _) => url,
            (None, Some(url)) => {
                warn!("{LEGACY_BASE_URL_VAR} is deprecated, use {BASE_URL_VAR}");
                url
            }
            (None, None) => DEFAULT_BASE_URL.to_string(),
        };

        let mode = match var(MODE_VAR).map(|m| m.parse::<Mode>()) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                warn!("ignoring {MODE_VAR}: {e}");
                Mode::infer(&base_url)
            }
            None => Mode::infer(&base_url),
        };

        // The key is only looked at when it can be used.
        let api_key = match mode {
            Mode::Direct => var(API_KEY_VAR).map(ApiKey::new),
            Mode::Proxy => None,
        };

        Self::new(&base_url, api_key, mode)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::infer(DEFAULT_BASE_URL, None)
    }
}

/// Resolve configuration from the process environment as it is right now.
pub fn resolve_config() -> Configuration {
    Configuration::from_lookup(|name| std::env::var(name).ok())
}
