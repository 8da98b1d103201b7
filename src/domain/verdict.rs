use std::fmt;

pub const CHECK_MANUALLY: &str = "Check access manually";
pub const UNSUPPORTED_URL: &str = "This script is not configured to accept this URL structure.";
pub const STILL_RATE_LIMITED: &str = "Still rate-limited, skipped";
pub const FETCH_FAILED: &str = "Fetch failed";

/// Access classification for one record: a primary label plus ordered qualifiers.
///
/// Labels are opaque. Some of them mean "uncertain" and are passed through
/// verbatim for human triage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub label: String,
    pub qualifiers: Vec<String>,
    /// Set when the page is known to carry no content (404, DOI not found).
    pub no_content: bool,
}

impl Verdict {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            qualifiers: Vec::new(),
            no_content: false,
        }
    }

    pub fn no_content(label: impl Into<String>) -> Self {
        Self {
            no_content: true,
            ..Self::new(label)
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifiers.push(qualifier.into());
        self
    }

    pub fn unsupported_url() -> Self {
        Self::no_content(UNSUPPORTED_URL)
    }

    pub fn still_rate_limited(attempts: u32) -> Self {
        Self::no_content(STILL_RATE_LIMITED).with_qualifier(format!("{attempts} attempts"))
    }

    pub fn fetch_failed() -> Self {
        Self::no_content(FETCH_FAILED)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)?;
        for qualifier in &self.qualifiers {
            write!(f, " - {qualifier}")?;
        }
        Ok(())
    }
}

/// Value of the optional secondary column (the ebook package name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondaryValue {
    Extracted(String),
    NotFound,
    NotApplicable,
}

impl fmt::Display for SecondaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecondaryValue::Extracted(value) => f.write_str(value),
            SecondaryValue::NotFound => f.write_str("not found"),
            SecondaryValue::NotApplicable => f.write_str("N/A"),
        }
    }
}
