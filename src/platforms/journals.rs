use std::time::Duration;

use crate::{
    matcher::Pattern,
    navigation::{FollowTrigger, Navigation, RetryPolicy, UrlRewrite},
    rules::{Predicate, RuleSet, VerdictSpec},
};

use super::Platform;

const BROWSER_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

pub(super) fn platforms() -> Vec<Platform> {
    vec![
        ciao(),
        ieee(),
        jstor(),
        ovid(),
        pq(),
        scid(),
        ss(),
        tandf(),
        wol(),
    ]
}

fn ciao() -> Platform {
    let rules = RuleSet::builder()
        .missing("the page you requested could not be found", "Page not found")
        .contains("Please log in", "No access")
        .contains("class=\"pdf-download\"", "Full access")
        .check_manually();
    Platform::new("ciao", "Columbia International Affairs Online", rules)
        .plain()
        .accept_invalid_certs()
}

fn ieee() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page Not Found", "Page not found")
        .contains("\"isOpenAccess\":true", "Open access")
        .contains("\"isFreeDocument\":true", "Free access")
        .matches(r#""subscribedContent":\s*true"#, "Full access")
        .matches(r#""subscribedContent":\s*false"#, "No access")
        .check_manually();
    Platform::new("ieee", "IEEE Xplore", rules).plain().delay(2_000)
}

fn jstor() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page Not Found", "Page not found")
        .contains("data-qa=\"download-pdf\"", "Full access")
        .contains("Buy this book", "No access")
        .contains("Log in through your library", "No access")
        .check_manually();
    Platform::new("jstor", "JSTOR", rules).delay(2_000)
}

fn ovid() -> Platform {
    let rules = RuleSet::builder()
        .missing("Article not found", "Page not found")
        .contains("Ovid Full Text", "Full access")
        .contains("Abstract Reference", "Abstract only")
        .check_manually();
    Platform::new("ovid", "Ovid", rules)
}

fn pq() -> Platform {
    let rules = RuleSet::builder()
        .missing("Document not found", "Page not found")
        .rule(
            Predicate::Any(vec![
                Predicate::Has(Pattern::literal("Full text - PDF")),
                Predicate::Has(Pattern::literal("Full Text")),
            ]),
            VerdictSpec::Fixed("Full access"),
        )
        .contains("Abstract/Details", "Abstract only")
        .check_manually();
    Platform::new("pq", "ProQuest", rules)
}

fn scid() -> Platform {
    let rules = RuleSet::builder()
        .missing("The page you requested was not found", "Page not found")
        .contains("\"openAccess\":true", "Open access")
        .contains("\"isEntitled\":true", "Full access")
        .contains("\"isEntitled\":false", "No access")
        .check_manually();
    let chapter = RuleSet::builder()
        .contains("Get Access", "no access")
        .contains("Download PDF", "full text")
        .check_manually();
    let reference = RuleSet::builder()
        .contains("Purchase this book", "no access")
        .contains("Browse this book by table of contents", "entitled")
        .check_manually();
    let navigation = Navigation::identity()
        .follow(FollowTrigger::supplement(
            "chapter",
            r#"<a class="anchor chapter-link[^"]*" href="(/science/article/pii/[A-Z0-9]+)""#,
            chapter,
        ))
        .follow(FollowTrigger::supplement(
            "reference work",
            r#"<a class="anchor reference-work-link[^"]*" href="(/referencework/[^"]+)""#,
            reference,
        ));
    Platform::new("scid", "ScienceDirect", rules)
        .navigation(navigation)
        .plain()
        .user_agent(BROWSER_UA)
        .delay(3_000)
}

fn ss() -> Platform {
    let rules = RuleSet::builder()
        .contains("SS_NoJournalFoundMsg", "No access")
        .contains("SS_Holding", "Full access")
        .check_manually();
    let rewrite = UrlRewrite::new(
        r"^https?://[A-Za-z0-9]+\.search\.serialssolutions\.com/",
        "http://{lib}.search.serialssolutions.com/?V=1.0&L={lib}&S=JCs&C={criteria}&T=marc&tab=ALL",
    )
    .token("lib", r"[?&]L=([A-Z0-9]+)")
    .token("criteria", r"[?&]C=([^&#]+)");
    Platform::new("ss", "SerialsSolutions", rules)
        .navigation(Navigation::identity().rewrite(rewrite))
        .plain()
}

fn tandf() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page Not Found", "Page not found")
        .contains("You have access", "Full access")
        .contains("Free access", "Free access")
        .contains("Access options", "No access")
        .check_manually();
    let retry = RetryPolicy::new(
        Pattern::literal("You have been rate limited"),
        Duration::from_secs(30),
    );
    Platform::new("tandf", "Taylor & Francis Online", rules)
        .navigation(Navigation::identity().retry(retry))
        .delay(5_000)
}

/// Free-access markers count only when they sit on a content DOI. The
/// lookahead inspects the last dotted segment of the DOI, so front matter,
/// appendices and indexes are excluded however many dots precede them.
fn wol() -> Platform {
    let rules = RuleSet::builder()
        .missing(
            "The resource you are looking for might have been removed",
            "Page not found",
        )
        .rule(
            Predicate::Has(Pattern::literal("You have full text access to this content")),
            VerdictSpec::Qualified {
                label: "Full access",
                marker: Pattern::regex(r#"href="/doi/10\.1029/"#),
                qualifier: "AGU",
            },
        )
        .rule(
            Predicate::Has(Pattern::lookaround(
                r#"<li class="free-access"[^>]*>\s*<a href="/doi/10\.\d+/[^"]*\.(?!(?:fmatter|app|index)[^".]*")[^".]+""#,
            )),
            VerdictSpec::Fixed("Free access to some content"),
        )
        .contains("<li class=\"free-access\"", "Free access to front/backmatter only")
        .matches(r#"class="[^"]*no-access"#, "No access")
        .check_manually();
    Platform::new("wol", "Wiley Online Library", rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_item(doi: &str) -> String {
        format!(r#"<ul><li class="free-access"><a href="/doi/{doi}">Item</a></li></ul>"#)
    }

    #[test]
    fn wiley_front_matter_is_not_free_content() {
        let verdict = wol().rules.evaluate(&free_item("10.1002/9781118269565.fmatter"));
        assert_eq!(verdict.label, "Free access to front/backmatter only");
    }

    #[test]
    fn wiley_index_and_appendix_are_excluded() {
        let rules = wol().rules;
        assert_eq!(
            rules.evaluate(&free_item("10.1002/9781118269565.index")).label,
            "Free access to front/backmatter only"
        );
        assert_eq!(
            rules.evaluate(&free_item("10.1002/9781118269565.app1")).label,
            "Free access to front/backmatter only"
        );
    }

    #[test]
    fn wiley_content_chapter_is_free_content() {
        let verdict = wol().rules.evaluate(&free_item("10.1002/9781118269565.ch3"));
        assert_eq!(verdict.label, "Free access to some content");
    }

    #[test]
    fn wiley_multi_dot_journal_doi_is_free_content() {
        let rules = wol().rules;
        assert_eq!(
            rules.evaluate(&free_item("10.1111/j.1467-9523.2011.00123.x")).label,
            "Free access to some content"
        );
        assert_eq!(
            rules.evaluate(&free_item("10.1111/j.1467-9523.2011.fmatter")).label,
            "Free access to front/backmatter only"
        );
        assert_eq!(
            rules.evaluate(&free_item("10.1002/9781118269565.app1")).label,
            "Free access to front/backmatter only"
        );
    }

    #[test]
    fn wiley_front_matter_and_chapter_together_is_free_content() {
        let page = format!(
            "{}{}",
            free_item("10.1002/9781118269565.fmatter"),
            free_item("10.1002/9781118269565.ch1")
        );
        assert_eq!(wol().rules.evaluate(&page).label, "Free access to some content");
    }

    #[test]
    fn wiley_agu_content_gets_qualifier() {
        let page = r#"You have full text access to this content <a href="/doi/10.1029/2011GL047222">"#;
        assert_eq!(wol().rules.evaluate(page).to_string(), "Full access - AGU");
        assert_eq!(
            wol()
                .rules
                .evaluate("You have full text access to this content")
                .to_string(),
            "Full access"
        );
    }

    #[test]
    fn serials_solutions_rewrite_builds_holdings_url() {
        let rewrite = ss().navigation.rewrite.unwrap();
        let outcome = rewrite.apply(
            "http://ab1cd2ef3g.search.serialssolutions.com/?V=1.0&L=AB1CD2EF3G&S=JCs&C=TC0000012345&T=marc",
        );
        assert_eq!(
            outcome,
            crate::navigation::RewriteOutcome::Rewritten(
                "http://AB1CD2EF3G.search.serialssolutions.com/?V=1.0&L=AB1CD2EF3G&S=JCs&C=TC0000012345&T=marc&tab=ALL"
                    .to_string()
            )
        );
    }

    #[test]
    fn ieee_open_access_precedes_subscription_flag() {
        let page = r#"{"isOpenAccess":true,"subscribedContent": false}"#;
        assert_eq!(ieee().rules.evaluate(page).label, "Open access");
    }

    #[test]
    fn proquest_accepts_either_full_text_marker() {
        let rules = pq().rules;
        assert_eq!(rules.evaluate("<a>Full text - PDF</a>").label, "Full access");
        assert_eq!(rules.evaluate("<a>Full Text</a>").label, "Full access");
        assert_eq!(rules.evaluate("<a>Abstract/Details</a>").label, "Abstract only");
    }
}
