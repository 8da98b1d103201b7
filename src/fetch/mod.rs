//! Fetcher collaborator: supplies page content for a URL.

#[cfg(feature = "browser")]
mod browser;
mod http;
#[cfg(test)]
pub mod scripted;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    config::FetchConfig,
    domain::FetchResult,
    platforms::{FetchMode, Platform},
};

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported URL: {0}")]
    InvalidUrl(String),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("browser session error: {0}")]
    Browser(String),
}

/// One navigable session. Reused across records and driven by exactly one
/// caller at a time.
#[async_trait]
pub trait Fetcher: Send {
    async fn fetch(&mut self, url: &str) -> Result<FetchResult, FetchError>;

    /// URL of the page most recently loaded, after redirects.
    fn current_url(&self) -> Option<&str>;
}

/// Opens the session a platform asks for, applying its session policy.
pub async fn open_session(
    platform: &Platform,
    config: &FetchConfig,
) -> Result<Box<dyn Fetcher>, FetchError> {
    match platform.fetch_mode {
        FetchMode::Plain => Ok(Box::new(HttpFetcher::new(config, &platform.session)?)),
        FetchMode::Rendered => open_rendered(platform, config).await,
    }
}

#[cfg(feature = "browser")]
async fn open_rendered(
    platform: &Platform,
    config: &FetchConfig,
) -> Result<Box<dyn Fetcher>, FetchError> {
    Ok(Box::new(
        BrowserFetcher::launch(config, &platform.session).await?,
    ))
}

#[cfg(not(feature = "browser"))]
async fn open_rendered(
    platform: &Platform,
    config: &FetchConfig,
) -> Result<Box<dyn Fetcher>, FetchError> {
    tracing::warn!(
        target: "fetch",
        platform = platform.code,
        "rendered session requested but the browser feature is disabled; using plain HTTP"
    );
    Ok(Box::new(HttpFetcher::new(config, &platform.session)?))
}
