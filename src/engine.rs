//! Per-record pipeline: rewrite, fetch, retry while rate-limited, follow,
//! evaluate rules, extract the secondary field.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    domain::{FetchResult, SecondaryValue, Verdict},
    fetch::Fetcher,
    infrastructure::pause::Pause,
    navigation::{FollowMode, RewriteOutcome},
    platforms::Platform,
};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_attempts: u32,
    pub cooldown_override: Option<Duration>,
    pub courtesy_delay: Duration,
    pub ebook_package: bool,
}

impl EngineSettings {
    pub fn for_platform(platform: &Platform, config: &AppConfig) -> Self {
        Self {
            max_attempts: config.retry.max_attempts,
            cooldown_override: config.retry.cooldown_override,
            courtesy_delay: config
                .courtesy
                .overrides
                .get(platform.code)
                .copied()
                .unwrap_or(platform.courtesy_delay),
            ebook_package: config.output.ebook_package,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub secondary: Option<SecondaryValue>,
    /// Number of page requests made for this record, retries included.
    pub fetches: u32,
}

pub struct ClassificationEngine<'a> {
    platform: &'a Platform,
    settings: EngineSettings,
    pause: &'a dyn Pause,
}

impl<'a> ClassificationEngine<'a> {
    pub fn new(platform: &'a Platform, settings: EngineSettings, pause: &'a dyn Pause) -> Self {
        Self {
            platform,
            settings,
            pause,
        }
    }

    pub async fn classify(&self, fetcher: &mut dyn Fetcher, url: &str) -> Classification {
        let mut fetches = 0;
        let navigation = &self.platform.navigation;

        let target = match &navigation.rewrite {
            None => url.trim().to_string(),
            Some(rewrite) => match rewrite.apply(url.trim()) {
                RewriteOutcome::Rewritten(target) => {
                    debug!(target: "engine", from = %url, to = %target, "url rewritten");
                    target
                }
                RewriteOutcome::Unsupported => {
                    info!(target: "engine", url = %url, platform = self.platform.code, "unsupported url structure");
                    return self.finish(Verdict::unsupported_url(), None, fetches);
                }
            },
        };

        let mut page = match self.fetch_page(fetcher, &target, &mut fetches).await {
            Ok(page) => page,
            Err(verdict) => return self.finish(verdict, None, fetches),
        };

        for trigger in &navigation.follow {
            if !matches!(trigger.mode, FollowMode::Replace) {
                continue;
            }
            let Some(next) = trigger.locate(&page.content, &page.effective_url) else {
                continue;
            };
            debug!(target: "engine", trigger = trigger.name, next = %next, "following");
            page = match self.fetch_page(fetcher, &next, &mut fetches).await {
                Ok(page) => page,
                Err(verdict) => return self.finish(verdict, None, fetches),
            };
            break;
        }

        let mut verdict = self.platform.rules.evaluate(&page.content);

        if !verdict.no_content {
            for trigger in &navigation.follow {
                let FollowMode::Supplement(rules) = &trigger.mode else {
                    continue;
                };
                let Some(next) = trigger.locate(&page.content, &page.effective_url) else {
                    continue;
                };
                debug!(target: "engine", trigger = trigger.name, next = %next, "supplementary fetch");
                let sub = match self.fetch_page(fetcher, &next, &mut fetches).await {
                    Ok(sub_page) => rules.evaluate(&sub_page.content),
                    Err(failure) => failure,
                };
                verdict = verdict.with_qualifier(format!("{}: {}", trigger.name, sub));
            }
        }

        self.finish(verdict, Some(&page), fetches)
    }

    fn finish(&self, verdict: Verdict, page: Option<&FetchResult>, fetches: u32) -> Classification {
        let secondary = self
            .settings
            .ebook_package
            .then(|| self.secondary_value(&verdict, page));
        Classification {
            verdict,
            secondary,
            fetches,
        }
    }

    fn secondary_value(&self, verdict: &Verdict, page: Option<&FetchResult>) -> SecondaryValue {
        match (&self.platform.secondary, page) {
            (Some(field), Some(page)) if !verdict.no_content => field
                .pattern
                .extract(&page.content)
                .map(SecondaryValue::Extracted)
                .unwrap_or(SecondaryValue::NotFound),
            _ => SecondaryValue::NotApplicable,
        }
    }

    /// Fetches `url`, re-fetching after a cool-down while the platform's
    /// rate-limit signature is present, up to `max_attempts` retries.
    async fn fetch_page(
        &self,
        fetcher: &mut dyn Fetcher,
        url: &str,
        fetches: &mut u32,
    ) -> Result<FetchResult, Verdict> {
        let mut page = self.fetch_once(fetcher, url, fetches).await?;
        let Some(policy) = &self.platform.navigation.retry else {
            return Ok(page);
        };
        let cooldown = self.settings.cooldown_override.unwrap_or(policy.cooldown);

        let mut retries = 0;
        while policy.should_retry(&page.content) {
            if retries >= self.settings.max_attempts {
                warn!(target: "engine", url = %url, retries, "still rate-limited; skipping record");
                return Err(Verdict::still_rate_limited(retries));
            }
            retries += 1;
            info!(
                target: "engine",
                url = %url,
                attempt = retries,
                cooldown_ms = cooldown.as_millis() as u64,
                "rate limited; waiting before retry"
            );
            self.pause.pause(cooldown).await;
            page = self.fetch_once(fetcher, url, fetches).await?;
        }
        Ok(page)
    }

    async fn fetch_once(
        &self,
        fetcher: &mut dyn Fetcher,
        url: &str,
        fetches: &mut u32,
    ) -> Result<FetchResult, Verdict> {
        *fetches += 1;
        match fetcher.fetch(url).await {
            Ok(page) => {
                debug!(target: "engine", url = %url, status = ?page.status, "page received");
                Ok(page)
            }
            Err(err) => {
                warn!(target: "engine", url = %url, error = %err, "fetch failed");
                Err(Verdict::fetch_failed())
            }
        }
    }
}
