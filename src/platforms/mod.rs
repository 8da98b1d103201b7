//! Platform registry. Each platform is an immutable bundle of an ordered rule
//! table, a navigation strategy, a fetch mode and session policy, and a
//! courtesy delay. Everything is built once on first access.

mod books;
mod journals;
mod media;

use std::time::Duration;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::{matcher::Pattern, navigation::Navigation, rules::RuleSet};

pub const DEFAULT_COURTESY_DELAY: Duration = Duration::from_secs(1);

/// Platforms whose sessions run with scripts and stylesheets disabled.
pub const SCRIPTLESS_PLATFORMS: &[&str] = &["spr", "ebr", "kan", "lion"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    Rendered,
    Plain,
}

/// Session-wide fetcher settings, applied once when the session is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionPolicy {
    pub javascript: bool,
    pub stylesheets: bool,
    pub accept_invalid_certs: bool,
    pub user_agent: Option<&'static str>,
}

impl SessionPolicy {
    fn for_code(code: &str) -> Self {
        let scriptless = SCRIPTLESS_PLATFORMS.iter().any(|listed| *listed == code);
        Self {
            javascript: !scriptless,
            stylesheets: !scriptless,
            accept_invalid_certs: false,
            user_agent: None,
        }
    }
}

/// Extracts a secondary column from the page used for the primary verdict.
#[derive(Debug, Clone)]
pub struct SecondaryField {
    pub column: &'static str,
    pub pattern: Pattern,
}

#[derive(Debug, Clone)]
pub struct Platform {
    pub code: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub rules: RuleSet,
    pub navigation: Navigation,
    pub fetch_mode: FetchMode,
    pub session: SessionPolicy,
    pub courtesy_delay: Duration,
    pub secondary: Option<SecondaryField>,
}

impl Platform {
    pub fn new(code: &'static str, name: &'static str, rules: RuleSet) -> Self {
        Self {
            code,
            name,
            aliases: &[],
            rules,
            navigation: Navigation::identity(),
            fetch_mode: FetchMode::Rendered,
            session: SessionPolicy::for_code(code),
            courtesy_delay: DEFAULT_COURTESY_DELAY,
            secondary: None,
        }
    }

    pub fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn navigation(mut self, navigation: Navigation) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn plain(mut self) -> Self {
        self.fetch_mode = FetchMode::Plain;
        self
    }

    pub fn delay(mut self, millis: u64) -> Self {
        self.courtesy_delay = Duration::from_millis(millis);
        self
    }

    pub fn user_agent(mut self, user_agent: &'static str) -> Self {
        self.session.user_agent = Some(user_agent);
        self
    }

    pub fn accept_invalid_certs(mut self) -> Self {
        self.session.accept_invalid_certs = true;
        self
    }

    pub fn secondary(mut self, column: &'static str, pattern: Pattern) -> Self {
        self.secondary = Some(SecondaryField { column, pattern });
        self
    }

    pub fn summary(&self) -> PlatformSummary {
        PlatformSummary {
            code: self.code,
            name: self.name,
            aliases: self.aliases,
            fetch_mode: self.fetch_mode,
            navigation: self.navigation.capabilities(),
            courtesy_delay_ms: self.courtesy_delay.as_millis() as u64,
            rules: self.rules.rules().len(),
            secondary: self.secondary.as_ref().map(|s| s.column),
            session: self.session.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlatformSummary {
    pub code: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub fetch_mode: FetchMode,
    pub navigation: Vec<&'static str>,
    pub courtesy_delay_ms: u64,
    pub rules: usize,
    pub secondary: Option<&'static str>,
    pub session: SessionPolicy,
}

pub struct Registry {
    platforms: Vec<Platform>,
}

impl Registry {
    fn build() -> Self {
        let mut platforms = Vec::new();
        platforms.extend(media::platforms());
        platforms.extend(books::platforms());
        platforms.extend(journals::platforms());
        platforms.sort_by_key(|p| p.code);
        Self { platforms }
    }

    /// Looks up a platform by code or legacy alias, ignoring case.
    pub fn resolve(&self, code: &str) -> Option<&Platform> {
        let code = code.trim().to_ascii_lowercase();
        self.platforms
            .iter()
            .find(|p| p.code == code || p.aliases.iter().any(|alias| *alias == code))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.iter()
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::build);

pub fn registry() -> &'static Registry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_platform_ends_in_a_catch_all() {
        for platform in registry().iter() {
            assert!(
                platform.rules.ends_in_catch_all(),
                "{} lacks a catch-all rule",
                platform.code
            );
            for trigger in &platform.navigation.follow {
                if let crate::navigation::FollowMode::Supplement(rules) = &trigger.mode {
                    assert!(rules.ends_in_catch_all(), "{}/{}", platform.code, trigger.name);
                }
            }
        }
    }

    #[test]
    fn every_platform_returns_its_default_for_unrecognised_pages() {
        for platform in registry().iter() {
            let verdict = platform.rules.evaluate("<html><body>nothing to see</body></html>");
            assert_eq!(verdict.label, "Check access manually", "{}", platform.code);
        }
    }

    #[test]
    fn codes_and_aliases_are_unique() {
        let mut seen = HashSet::new();
        for platform in registry().iter() {
            assert!(seen.insert(platform.code), "duplicate {}", platform.code);
            for alias in platform.aliases {
                assert!(seen.insert(alias), "duplicate alias {alias}");
            }
        }
        assert!(seen.len() > 30);
    }

    #[test]
    fn legacy_aliases_share_one_rule_set() {
        let upso = registry().resolve("upso").unwrap();
        assert_eq!(registry().resolve("oso").unwrap().code, upso.code);
        assert_eq!(registry().resolve("UPO").unwrap().code, upso.code);
        assert!(registry().resolve("nope").is_none());
    }

    // Behavior change: the disabled-scripts session policy used to apply to
    // every platform because of an always-true condition. It now applies only
    // to the listed platforms.
    #[test]
    fn scriptless_session_applies_only_to_listed_platforms() {
        for platform in registry().iter() {
            let listed = SCRIPTLESS_PLATFORMS.contains(&platform.code);
            assert_eq!(!platform.session.javascript, listed, "{}", platform.code);
            assert_eq!(!platform.session.stylesheets, listed, "{}", platform.code);
        }
        assert!(registry().resolve("asp").unwrap().session.javascript);
        assert!(!registry().resolve("spr").unwrap().session.javascript);
    }

    #[test]
    fn only_springer_extracts_an_ebook_package() {
        let with_secondary: Vec<_> = registry()
            .iter()
            .filter(|p| p.secondary.is_some())
            .map(|p| p.code)
            .collect();
        assert_eq!(with_secondary, vec!["spr"]);
    }
}
