use async_trait::async_trait;
use reqwest::{redirect, Client};
use tracing::debug;
use url::Url;

use crate::{config::FetchConfig, domain::FetchResult, platforms::SessionPolicy};

use super::{FetchError, Fetcher};

/// Plain HTTP GET session. Scripts and stylesheets are never executed or
/// loaded here, so only the user agent and certificate policy apply.
pub struct HttpFetcher {
    client: Client,
    current: Option<String>,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig, policy: &SessionPolicy) -> Result<Self, FetchError> {
        let user_agent = policy.user_agent.unwrap_or(config.user_agent.as_str());
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(config.timeout)
            .redirect(redirect::Policy::limited(10))
            .cookie_store(true)
            .danger_accept_invalid_certs(policy.accept_invalid_certs)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            current: None,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&mut self, raw_url: &str) -> Result<FetchResult, FetchError> {
        let url = match Url::parse(raw_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => return Err(FetchError::InvalidUrl(raw_url.to_string())),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        // Error pages still carry the signatures the rules look for.
        let status = response.status();
        let effective_url = response.url().to_string();
        let content = response
            .text()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        debug!(
            target: "fetch",
            url = %url,
            effective = %effective_url,
            status = status.as_u16(),
            bytes = content.len(),
            "page fetched"
        );

        self.current = Some(effective_url.clone());
        Ok(FetchResult {
            effective_url,
            status: Some(status.as_u16()),
            content,
        })
    }

    fn current_url(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn fetcher() -> HttpFetcher {
        let config = FetchConfig {
            timeout: Duration::from_secs(1),
            user_agent: "access-checker/test".to_string(),
        };
        let policy = SessionPolicy {
            javascript: true,
            stylesheets: true,
            accept_invalid_certs: false,
            user_agent: None,
        };
        HttpFetcher::new(&config, &policy).unwrap()
    }

    #[tokio::test]
    async fn rejects_non_http_urls_without_fetching() {
        let mut fetcher = fetcher();
        let err = fetcher.fetch("ftp://example.org/file").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert!(fetcher.current_url().is_none());
    }
}
