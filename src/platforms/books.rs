use crate::{
    matcher::Pattern,
    navigation::{FollowTrigger, Navigation},
    rules::{Predicate, RuleSet, VerdictSpec},
};

use super::Platform;

const JS_REDIRECT: &str = r#"window\.location\.(?:replace\(|href\s*=\s*)['"]([^'"]+)['"]"#;
const META_REFRESH: &str = r#"<meta http-equiv="refresh" content="\d+;\s*url=([^"]+)""#;

pub(super) fn platforms() -> Vec<Platform> {
    vec![
        apb(),
        brill(),
        cqp(),
        cup(),
        dgr(),
        dup(),
        ebc(),
        ebr(),
        ebs(),
        emr(),
        gvrl(),
        muse(),
        obo(),
        rsc(),
        skno(),
        spr(),
        srmo(),
        upso(),
    ]
}

fn apb() -> Platform {
    let rules = RuleSet::builder()
        .missing("ResourceNotFound", "Page not found")
        .contains("<title>Error</title>", "Error")
        .contains("在线阅读", "Full access")
        .check_manually();
    Platform::new("apb", "Apabi", rules).delay(2_000)
}

fn brill() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page not found", "Page not found")
        .contains("You have access to this content", "Full access")
        .contains("Free Access", "Free access")
        .contains("Get Access", "No access")
        .check_manually();
    Platform::new("brill", "Brill", rules)
}

fn cqp() -> Platform {
    let rules = RuleSet::builder()
        .missing("Document Not Found", "Page not found")
        .contains("You do not have access to this document", "No access")
        .contains("class=\"docContent\"", "Full access")
        .check_manually();
    Platform::new("cqp", "CQ Press Library", rules).plain()
}

fn cup() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page not found", "Page not found")
        .contains("data-test-id=\"access-full\"", "Full access")
        .contains("You have access to", "Full access")
        .matches(r#"class="access-icon[^"]*free""#, "Free access")
        .contains("Get access", "No access")
        .check_manually();
    Platform::new("cup", "Cambridge Core", rules)
}

fn dgr() -> Platform {
    let rules = RuleSet::builder()
        .missing("The requested page could not be found", "Page not found")
        .contains("Requires Authentication", "No access")
        .contains("Unlicensed", "No access")
        .contains("class=\"accessFree\"", "Free access")
        .contains("Licensed", "Full access")
        .check_manually();
    Platform::new("dgr", "De Gruyter", rules)
}

fn dup() -> Platform {
    let rules = RuleSet::builder()
        .contains("Access Denied", "No access")
        .matches(r#"class="[^"]*icon-availability_open"#, "Free access")
        .matches(r#"class="[^"]*icon-availability_unlocked"#, "Full access")
        .check_manually();
    Platform::new("dup", "Duke University Press", rules)
}

fn ebc() -> Platform {
    let rules = RuleSet::builder()
        .missing("The page you requested could not be found", "Page not found")
        .contains("This book is not available", "No access")
        .rule(
            Predicate::Has(Pattern::regex(
                r"User Limit:\s*</dt>\s*<dd[^>]*>\s*([^<]+?)\s*</dd>",
            )),
            VerdictSpec::Captured {
                prefix: "Full access - user limit: ",
            },
        )
        .contains("Read Online", "Full access")
        .contains("Request to purchase", "No access - purchase request available")
        .check_manually();
    Platform::new("ebc", "ProQuest Ebook Central", rules)
}

fn ebr() -> Platform {
    let rules = RuleSet::builder()
        .contains("Document Unavailable.", "No access")
        .contains("Date Published", "Full access")
        .check_manually();
    let navigation = Navigation::identity()
        .follow(FollowTrigger::replace("redirect", JS_REDIRECT))
        .follow(FollowTrigger::replace("refresh", META_REFRESH));
    Platform::new("ebr", "Ebrary", rules).navigation(navigation)
}

fn ebs() -> Platform {
    let rules = RuleSet::builder()
        .matches(r#"class="std-warning-text">No results"#, "No access")
        .contains("eBook Full Text", "Full access")
        .contains("PDF Full Text", "Full access")
        .check_manually();
    Platform::new("ebs", "EBSCOhost eBook Collection", rules)
}

fn emr() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page Not Found", "Page not found")
        .contains("You do not currently have access to this", "No access")
        .rule(
            Predicate::Has(Pattern::literal("class=\"intent_pdf_link\"")),
            VerdictSpec::Qualified {
                label: "Full access",
                marker: Pattern::literal("Open Access"),
                qualifier: "open access",
            },
        )
        .check_manually();
    Platform::new("emr", "Emerald Insight", rules)
}

fn gvrl() -> Platform {
    let rules = RuleSet::builder()
        .missing("Document not found", "Page not found")
        .contains("You do not have access", "No access")
        .contains("class=\"documentContent\"", "Full access")
        .contains("Download PDF", "Full access")
        .check_manually();
    let navigation = Navigation::identity()
        .follow(FollowTrigger::replace("refresh", META_REFRESH))
        .follow(FollowTrigger::replace("redirect", JS_REDIRECT));
    Platform::new("gvrl", "Gale eBooks", rules).navigation(navigation)
}

fn muse() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page Not Found", "Page not found")
        .rule(
            Predicate::All(vec![
                Predicate::Has(Pattern::literal("title=\"Open Access\"")),
                Predicate::Has(Pattern::literal("title=\"Restricted Access\"")),
            ]),
            VerdictSpec::Fixed("Partial access - check chapters"),
        )
        .contains("title=\"Restricted Access\"", "No access")
        .contains("title=\"Open Access\"", "Free access")
        .contains("Download PDF", "Full access")
        .check_manually();
    Platform::new("muse", "Project MUSE", rules)
}

fn obo() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page not found", "Page not found")
        .contains("is available by subscription", "No access")
        .contains("class=\"article-body\"", "Full access")
        .check_manually();
    Platform::new("obo", "Oxford Bibliographies", rules)
}

fn rsc() -> Platform {
    let rules = RuleSet::builder()
        .missing("The requested page could not be found", "Page not found")
        .contains("Access to this book is restricted", "No access")
        .contains("Download Chapter", "Full access")
        .check_manually();
    Platform::new("rsc", "Royal Society of Chemistry Books", rules)
}

fn skno() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page Not Found", "Page not found")
        .contains("You do not have access to this content", "No access")
        .contains("Download PDF", "Full access")
        .contains("Table of Contents", "Probable access - check chapters")
        .check_manually();
    Platform::new("skno", "SAGE Knowledge", rules)
}

fn spr() -> Platform {
    let rules = RuleSet::builder()
        .matches(r#"viewType="Denial""#, "Restricted")
        .matches(r#"viewType="Full text download""#, "Full access")
        .missing("DOI Not Found", "DOI error")
        .contains("Bookshop, Wageningen", "wageningenacademic.com")
        .contains("Log in to check access", "Restricted")
        .check_manually();
    Platform::new("spr", "SpringerLink", rules).secondary(
        "ebook package",
        Pattern::regex(r#"class="ebook-package"[^>]*>\s*([^<]+?)\s*<"#),
    )
}

fn srmo() -> Platform {
    let rules = RuleSet::builder()
        .missing("Page Not Found", "Page not found")
        .contains("Add to Methods List", "Full access")
        .check_manually();
    Platform::new("srmo", "Sage Research Methods Online", rules)
}

fn upso() -> Platform {
    let rules = RuleSet::builder()
        .contains("<div class=\"contentItem\">", "Full access")
        .check_manually();
    Platform::new("upso", "University Press Scholarship Online", rules).aliases(&["oso", "upo"])
}
