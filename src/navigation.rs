//! Per-platform navigation: URL rewriting before the first fetch, follow-up
//! fetches triggered by the first page, and retry on rate limiting.

use std::time::Duration;

use regex::Regex;
use url::Url;

use crate::{matcher::Pattern, rules::RuleSet};

#[derive(Debug, Clone, Default)]
pub struct Navigation {
    pub rewrite: Option<UrlRewrite>,
    pub follow: Vec<FollowTrigger>,
    pub retry: Option<RetryPolicy>,
}

impl Navigation {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn rewrite(mut self, rewrite: UrlRewrite) -> Self {
        self.rewrite = Some(rewrite);
        self
    }

    pub fn follow(mut self, trigger: FollowTrigger) -> Self {
        self.follow.push(trigger);
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn capabilities(&self) -> Vec<&'static str> {
        let mut caps = Vec::new();
        if self.rewrite.is_some() {
            caps.push("rewrite");
        }
        if !self.follow.is_empty() {
            caps.push("follow");
        }
        if self.retry.is_some() {
            caps.push("retry");
        }
        caps
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten(String),
    Unsupported,
}

/// Rebuilds a URL from tokens captured out of the original.
///
/// `template` placeholders are written `{name}`; every token must be found
/// and `shape` must match or the URL is unsupported.
#[derive(Debug, Clone)]
pub struct UrlRewrite {
    shape: Regex,
    tokens: Vec<(&'static str, Regex)>,
    template: &'static str,
}

impl UrlRewrite {
    pub fn new(shape: &str, template: &'static str) -> Self {
        Self {
            shape: Regex::new(shape).expect("valid rewrite shape"),
            tokens: Vec::new(),
            template,
        }
    }

    pub fn token(mut self, name: &'static str, pattern: &str) -> Self {
        self.tokens
            .push((name, Regex::new(pattern).expect("valid rewrite token")));
        self
    }

    pub fn apply(&self, url: &str) -> RewriteOutcome {
        if !self.shape.is_match(url) {
            return RewriteOutcome::Unsupported;
        }
        let mut rewritten = self.template.to_string();
        for (name, pattern) in &self.tokens {
            let Some(value) = pattern
                .captures(url)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
            else {
                return RewriteOutcome::Unsupported;
            };
            rewritten = rewritten.replace(&format!("{{{name}}}"), value);
        }
        RewriteOutcome::Rewritten(rewritten)
    }
}

#[derive(Debug, Clone)]
pub enum FollowMode {
    /// The followed page replaces the first page for rule evaluation.
    Replace,
    /// The followed page gets its own sub-verdict, appended as a qualifier.
    Supplement(RuleSet),
}

#[derive(Debug, Clone)]
pub struct FollowTrigger {
    pub name: &'static str,
    pub target: Pattern,
    pub mode: FollowMode,
}

impl FollowTrigger {
    pub fn replace(name: &'static str, target: &str) -> Self {
        Self {
            name,
            target: Pattern::regex(target),
            mode: FollowMode::Replace,
        }
    }

    pub fn supplement(name: &'static str, target: &str, rules: RuleSet) -> Self {
        Self {
            name,
            target: Pattern::regex(target),
            mode: FollowMode::Supplement(rules),
        }
    }

    /// Extracts the follow-up target and resolves it against `base`.
    pub fn locate(&self, content: &str, base: &str) -> Option<String> {
        let raw = self.target.extract(content)?;
        resolve(base, &raw.replace("&amp;", "&"))
    }
}

fn resolve(base: &str, target: &str) -> Option<String> {
    match Url::parse(target) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)
            .and_then(|base| base.join(target))
            .map(|url| url.to_string())
            .ok(),
        Err(_) => None,
    }
}

/// Retry-on-rate-limit: while `signature` is present, wait `cooldown` and re-fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub signature: Pattern,
    pub cooldown: Duration,
}

impl RetryPolicy {
    pub fn new(signature: Pattern, cooldown: Duration) -> Self {
        Self {
            signature,
            cooldown,
        }
    }

    pub fn should_retry(&self, content: &str) -> bool {
        self.signature.matches(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ss_like() -> UrlRewrite {
        UrlRewrite::new(
            r"^https?://[A-Za-z0-9]+\.search\.serialssolutions\.com/",
            "http://{lib}.search.serialssolutions.com/?L={lib}&C={criteria}",
        )
        .token("lib", r"[?&]L=([A-Z0-9]+)")
        .token("criteria", r"[?&]C=([^&#]+)")
    }

    #[test]
    fn rewrite_substitutes_tokens() {
        let outcome = ss_like().apply("http://xy4.search.serialssolutions.com/?V=1.0&L=XY4&S=JCs&C=TC0000123&T=marc");
        assert_eq!(
            outcome,
            RewriteOutcome::Rewritten(
                "http://XY4.search.serialssolutions.com/?L=XY4&C=TC0000123".to_string()
            )
        );
    }

    #[test]
    fn rewrite_rejects_missing_token() {
        let outcome = ss_like().apply("http://xy4.search.serialssolutions.com/?V=1.0&L=XY4");
        assert_eq!(outcome, RewriteOutcome::Unsupported);
    }

    #[test]
    fn rewrite_rejects_foreign_host() {
        let outcome = ss_like().apply("http://example.org/?L=XY4&C=TC1");
        assert_eq!(outcome, RewriteOutcome::Unsupported);
    }

    #[test]
    fn follow_target_resolves_relative_links() {
        let trigger = FollowTrigger::replace("redirect", r#"window\.location\.replace\(['"]([^'"]+)['"]\)"#);
        let page = r#"<script>window.location.replace('/lib/detail.action?docID=42&amp;x=1')</script>"#;
        assert_eq!(
            trigger.locate(page, "https://site.example.com/lib/Doc?id=42").as_deref(),
            Some("https://site.example.com/lib/detail.action?docID=42&x=1")
        );
    }

    #[test]
    fn capabilities_reflect_configured_hooks() {
        let nav = Navigation::identity()
            .rewrite(ss_like())
            .retry(RetryPolicy::new(Pattern::literal("slow down"), Duration::from_secs(1)));
        assert_eq!(nav.capabilities(), vec!["rewrite", "retry"]);
        assert!(Navigation::identity().capabilities().is_empty());
    }
}
