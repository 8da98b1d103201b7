//! Rendered session backed by headless Chromium.

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    cdp::browser_protocol::{
        emulation::{SetScriptExecutionDisabledParams, SetUserAgentOverrideParams},
        network::SetBlockedUrLsParams,
    },
    page::Page,
};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::{config::FetchConfig, domain::FetchResult, platforms::SessionPolicy};

use super::{FetchError, Fetcher};

const STYLESHEET_PATTERNS: &[&str] = &["*.css", "*.css?*"];

fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }
    ["google-chrome", "chromium", "chromium-browser"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}

pub struct BrowserFetcher {
    _browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    timeout: Duration,
    current: Option<String>,
}

impl BrowserFetcher {
    pub async fn launch(config: &FetchConfig, policy: &SessionPolicy) -> Result<Self, FetchError> {
        let chrome = find_chromium()
            .ok_or_else(|| FetchError::Browser("Chromium not found; set CHROMIUM_PATH".into()))?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage");
        if policy.accept_invalid_certs {
            builder = builder.arg("--ignore-certificate-errors");
        }
        let browser_config = builder
            .build()
            .map_err(|e| FetchError::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::Browser(format!("failed to launch Chromium: {e}")))?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(format!("failed to open page: {e}")))?;

        let user_agent = policy.user_agent.unwrap_or(config.user_agent.as_str());
        page.execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(|e| FetchError::Browser(format!("failed to set user agent: {e}")))?;
        if !policy.javascript {
            page.execute(SetScriptExecutionDisabledParams::new(true))
                .await
                .map_err(|e| FetchError::Browser(format!("failed to disable scripts: {e}")))?;
        }
        if !policy.stylesheets {
            let patterns = STYLESHEET_PATTERNS.iter().map(|p| p.to_string()).collect();
            page.execute(SetBlockedUrLsParams::new(patterns))
                .await
                .map_err(|e| FetchError::Browser(format!("failed to block stylesheets: {e}")))?;
        }

        tracing::info!(
            target: "fetch",
            javascript = policy.javascript,
            stylesheets = policy.stylesheets,
            "browser session ready"
        );

        Ok(Self {
            _browser: browser,
            page,
            handler,
            timeout: config.timeout,
            current: None,
        })
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&mut self, url: &str) -> Result<FetchResult, FetchError> {
        match tokio::time::timeout(self.timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(FetchError::Browser(format!("navigation failed: {e}"))),
            Err(_) => {
                return Err(FetchError::Browser(format!(
                    "navigation timed out after {:?}",
                    self.timeout
                )))
            }
        }
        // Pages that never fire a second load event still have usable content.
        if let Err(e) = self.page.wait_for_navigation().await {
            tracing::debug!(target: "fetch", url = %url, error = %e, "wait for navigation failed");
        }

        let effective_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .map(|u| u.to_string())
            .unwrap_or_else(|| url.to_string());
        let content: String = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .map_err(|e| FetchError::Browser(format!("failed to read page: {e}")))?
            .into_value()
            .map_err(|e| FetchError::Browser(format!("failed to read page: {e:?}")))?;

        self.current = Some(effective_url.clone());
        Ok(FetchResult {
            effective_url,
            status: None,
            content,
        })
    }

    fn current_url(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
