//! Ordered (predicate, verdict) tables. The first matching rule wins.

use crate::{domain::Verdict, matcher::Pattern};

#[derive(Debug, Clone)]
pub enum Predicate {
    Always,
    Has(Pattern),
    Lacks(Pattern),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn eval(&self, content: &str) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Has(pattern) => pattern.matches(content),
            Predicate::Lacks(pattern) => !pattern.matches(content),
            Predicate::All(parts) => parts.iter().all(|p| p.eval(content)),
            Predicate::Any(parts) => parts.iter().any(|p| p.eval(content)),
        }
    }

    fn capture(&self, content: &str) -> Option<String> {
        match self {
            Predicate::Has(pattern) => pattern.extract(content),
            Predicate::All(parts) | Predicate::Any(parts) => {
                parts.iter().find_map(|p| p.capture(content))
            }
            Predicate::Always | Predicate::Lacks(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum VerdictSpec {
    Fixed(&'static str),
    /// Appends `qualifier` when `marker` also appears in the same page.
    Qualified {
        label: &'static str,
        marker: Pattern,
        qualifier: &'static str,
    },
    /// `prefix` followed by the predicate's captured text.
    Captured { prefix: &'static str },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub when: Predicate,
    pub verdict: VerdictSpec,
    pub no_content: bool,
}

impl Rule {
    pub fn produce(&self, content: &str) -> Verdict {
        let mut verdict = match &self.verdict {
            VerdictSpec::Fixed(label) => Verdict::new(*label),
            VerdictSpec::Qualified {
                label,
                marker,
                qualifier,
            } => {
                let verdict = Verdict::new(*label);
                if marker.matches(content) {
                    verdict.with_qualifier(*qualifier)
                } else {
                    verdict
                }
            }
            VerdictSpec::Captured { prefix } => match self.when.capture(content) {
                Some(captured) => Verdict::new(format!("{prefix}{}", captured.trim())),
                None => Verdict::new(prefix.trim_end_matches([' ', ':', '-']).to_string()),
            },
        };
        verdict.no_content = self.no_content;
        verdict
    }
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluates rules in declaration order. Never returns without a verdict
    /// because every table ends in a catch-all.
    pub fn evaluate(&self, content: &str) -> Verdict {
        self.rules
            .iter()
            .find(|rule| rule.when.eval(content))
            .map(|rule| rule.produce(content))
            .unwrap_or_else(|| Verdict::new(crate::domain::verdict::CHECK_MANUALLY))
    }

    pub fn ends_in_catch_all(&self) -> bool {
        matches!(
            self.rules.last(),
            Some(Rule {
                when: Predicate::Always,
                ..
            })
        )
    }
}

pub struct RuleSetBuilder {
    rules: Vec<Rule>,
}

impl RuleSetBuilder {
    pub fn rule(mut self, when: Predicate, verdict: VerdictSpec) -> Self {
        self.rules.push(Rule {
            when,
            verdict,
            no_content: false,
        });
        self
    }

    pub fn contains(self, text: &'static str, label: &'static str) -> Self {
        self.rule(Predicate::Has(Pattern::literal(text)), VerdictSpec::Fixed(label))
    }

    pub fn matches(self, regex: &str, label: &'static str) -> Self {
        self.rule(Predicate::Has(Pattern::regex(regex)), VerdictSpec::Fixed(label))
    }

    /// Like `contains`, but flags the page as carrying no content.
    pub fn missing(mut self, text: &'static str, label: &'static str) -> Self {
        self.rules.push(Rule {
            when: Predicate::Has(Pattern::literal(text)),
            verdict: VerdictSpec::Fixed(label),
            no_content: true,
        });
        self
    }

    pub fn otherwise(self, label: &'static str) -> RuleSet {
        let mut rules = self.rules;
        rules.push(Rule {
            when: Predicate::Always,
            verdict: VerdictSpec::Fixed(label),
            no_content: false,
        });
        RuleSet { rules }
    }

    pub fn check_manually(self) -> RuleSet {
        self.otherwise(crate::domain::verdict::CHECK_MANUALLY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuleSet {
        RuleSet::builder()
            .missing("Page Not Found", "Page not found")
            .contains("error", "Error")
            .contains("Browse", "Full access")
            .check_manually()
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = sample();
        let verdict = rules.evaluate("Page Not Found ... Browse");
        assert_eq!(verdict.label, "Page not found");
        assert!(verdict.no_content);
    }

    #[test]
    fn catch_all_is_reached_when_nothing_matches() {
        let rules = sample();
        assert!(rules.ends_in_catch_all());
        assert_eq!(rules.evaluate("").label, "Check access manually");
    }

    #[test]
    fn qualified_verdict_appends_only_when_marker_present() {
        let rules = RuleSet::builder()
            .rule(
                Predicate::Has(Pattern::literal("full text access")),
                VerdictSpec::Qualified {
                    label: "Full access",
                    marker: Pattern::literal("agupubs"),
                    qualifier: "AGU",
                },
            )
            .check_manually();
        assert_eq!(
            rules.evaluate("full text access agupubs").to_string(),
            "Full access - AGU"
        );
        assert_eq!(rules.evaluate("full text access").to_string(), "Full access");
    }

    #[test]
    fn captured_verdict_uses_group_text() {
        let rules = RuleSet::builder()
            .rule(
                Predicate::Has(Pattern::regex(r"User Limit:\s*([^<]+)<")),
                VerdictSpec::Captured {
                    prefix: "Full access - user limit: ",
                },
            )
            .check_manually();
        assert_eq!(
            rules.evaluate("User Limit: 3 users<").label,
            "Full access - user limit: 3 users"
        );
    }

    #[test]
    fn composite_predicates() {
        let page = "Browse and more";
        assert!(Predicate::All(vec![
            Predicate::Has(Pattern::literal("Browse")),
            Predicate::Lacks(Pattern::literal("error")),
        ])
        .eval(page));
        assert!(!Predicate::Any(vec![
            Predicate::Has(Pattern::literal("x-none")),
            Predicate::Lacks(Pattern::literal("Browse")),
        ])
        .eval(page));
    }
}
