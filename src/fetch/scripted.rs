//! In-memory session that replays canned pages per URL.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;

use crate::domain::FetchResult;

use super::{FetchError, Fetcher};

/// Each URL serves its queued pages in order and keeps repeating the last
/// one. A `None` entry is a transport failure.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, VecDeque<Option<String>>>,
    pub calls: Vec<String>,
    current: Option<String>,
}

impl ScriptedFetcher {
    pub fn page(mut self, url: &str, content: &str) -> Self {
        self.pages
            .entry(url.to_string())
            .or_default()
            .push_back(Some(content.to_string()));
        self
    }

    pub fn failure(mut self, url: &str) -> Self {
        self.pages.entry(url.to_string()).or_default().push_back(None);
        self
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&mut self, url: &str) -> Result<FetchResult, FetchError> {
        self.calls.push(url.to_string());
        let queue = self
            .pages
            .get_mut(url)
            .ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;
        let next = if queue.len() > 1 {
            queue.pop_front().flatten()
        } else {
            queue.front().cloned().flatten()
        };
        let content = next.ok_or_else(|| FetchError::Browser("scripted failure".into()))?;
        self.current = Some(url.to_string());
        Ok(FetchResult {
            effective_url: url.to_string(),
            status: Some(200),
            content,
        })
    }

    fn current_url(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
