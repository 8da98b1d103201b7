//! Delimited input/output. The last input column is the URL; everything
//! before it passes through to the output untouched.

mod reader;
mod writer;

use std::path::Path;

pub use reader::{read_input, InputError, InputTable};
pub use writer::{OutputError, OutputWriter};

pub const ACCESS_COLUMN: &str = "access";

/// Tab for `.tsv`/`.txt`, comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    }
}
