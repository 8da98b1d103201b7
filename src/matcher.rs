use std::fmt;

use tracing::warn;

/// A case-sensitive content signature.
///
/// Plain regexes go through `regex`; patterns that need lookaround (such as
/// excluding DOI suffixes) go through `fancy_regex`, which backtracks.
#[derive(Clone)]
pub enum Pattern {
    Literal(&'static str),
    Regex(regex::Regex),
    Lookaround(fancy_regex::Regex),
}

impl Pattern {
    pub fn literal(text: &'static str) -> Self {
        Pattern::Literal(text)
    }

    pub fn regex(source: &str) -> Self {
        Pattern::Regex(regex::Regex::new(source).expect("valid platform regex"))
    }

    pub fn lookaround(source: &str) -> Self {
        Pattern::Lookaround(fancy_regex::Regex::new(source).expect("valid platform regex"))
    }

    pub fn matches(&self, content: &str) -> bool {
        match self {
            Pattern::Literal(text) => content.contains(text),
            Pattern::Regex(re) => re.is_match(content),
            Pattern::Lookaround(re) => re.is_match(content).unwrap_or_else(|err| {
                warn!(target: "engine", error = %err, pattern = re.as_str(), "lookaround match aborted");
                false
            }),
        }
    }

    /// Returns the first capture group, or the whole match when the pattern has no groups.
    pub fn extract(&self, content: &str) -> Option<String> {
        match self {
            Pattern::Literal(text) => content.contains(text).then(|| text.to_string()),
            Pattern::Regex(re) => {
                let caps = re.captures(content)?;
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str().to_string())
            }
            Pattern::Lookaround(re) => {
                let caps = match re.captures(content) {
                    Ok(caps) => caps?,
                    Err(err) => {
                        warn!(target: "engine", error = %err, pattern = re.as_str(), "lookaround capture aborted");
                        return None;
                    }
                };
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str().to_string())
            }
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(text) => write!(f, "Literal({text:?})"),
            Pattern::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
            Pattern::Lookaround(re) => write!(f, "Lookaround({:?})", re.as_str()),
        }
    }
}
