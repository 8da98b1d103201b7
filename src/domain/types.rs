use super::verdict::{SecondaryValue, Verdict};

/// Content of a single page fetch together with the URL that was actually loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub effective_url: String,
    pub status: Option<u16>,
    pub content: String,
}

/// One input row split into its pass-through leading fields and the trailing URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub leading: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ClassificationRecord {
    pub input: InputRecord,
    pub verdict: Verdict,
    pub secondary: Option<SecondaryValue>,
}

impl ClassificationRecord {
    /// Output columns: leading fields, URL, verdict, and the secondary field when enabled.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(self.input.leading.len() + 3);
        row.extend(self.input.leading.iter().cloned());
        row.push(self.input.url.clone());
        row.push(self.verdict.to_string());
        if let Some(secondary) = &self.secondary {
            row.push(secondary.to_string());
        }
        row
    }
}
