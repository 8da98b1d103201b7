use crate::{
    matcher::Pattern,
    rules::{Predicate, RuleSet, VerdictSpec},
};

use super::Platform;

pub(super) fn platforms() -> Vec<Platform> {
    vec![asp(), fmg(), kan(), lion()]
}

fn asp() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page Not Found", "Page not found")
        .contains("error", "Error")
        .contains("Browse", "Full access")
        .check_manually();
    Platform::new("asp", "Alexander Street Press", rules)
}

fn fmg() -> Platform {
    let rules = RuleSet::builder()
        .missing("The title you requested could not be found", "Page not found")
        .contains("This title is not in your subscription", "No access")
        // Preview pages embed the same player.
        .rule(
            Predicate::All(vec![
                Predicate::Has(Pattern::literal("id=\"videoPlayer\"")),
                Predicate::Lacks(Pattern::literal("Preview Clip")),
            ]),
            VerdictSpec::Fixed("Full access"),
        )
        .contains("Preview Clip", "Preview only")
        .check_manually();
    Platform::new("fmg", "Films on Demand", rules)
}

fn kan() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page not found", "Page not found")
        .contains("This video is not available", "No access")
        .contains("Request this video", "No access - request available")
        .contains("\"playable\":true", "Full access")
        .check_manually();
    Platform::new("kan", "Kanopy", rules).delay(2_000)
}

fn lion() -> Platform {
    let rules = RuleSet::builder()
        .missing("No document found", "Page not found")
        .contains("You are not authorised to view this document", "No access")
        .contains("Full Text", "Full access")
        .check_manually();
    Platform::new("lion", "Literature Online", rules)
}
