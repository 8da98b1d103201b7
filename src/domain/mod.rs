pub mod types;
pub mod verdict;

pub use types::{ClassificationRecord, FetchResult, InputRecord};
pub use verdict::{SecondaryValue, Verdict};
