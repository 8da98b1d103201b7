use std::{
    fs,
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, UTF_16LE, UTF_8, WINDOWS_1252};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::InputRecord;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("input file {} has no header row", .0.display())]
    Empty(PathBuf),
    #[error("could not parse {} after {} attempts: {}", .path.display(), .attempts.len(), .attempts.join("; "))]
    Unparseable { path: PathBuf, attempts: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub records: Vec<InputRecord>,
    pub delimiter: u8,
}

#[derive(Debug, Clone, Copy)]
struct Attempt {
    encoding: &'static Encoding,
    quoting: bool,
}

const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Parses the input with progressively more permissive settings: strict
/// quoting, then no quote handling, then alternate encodings.
pub fn read_input(path: &Path) -> Result<InputTable, InputError> {
    let bytes = fs::read(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut failures = Vec::new();
    for attempt in attempts_for(&bytes) {
        let label = format!(
            "{} {}",
            attempt.encoding.name(),
            if attempt.quoting { "quoted" } else { "unquoted" }
        );
        let Some(text) = decode(&bytes, attempt.encoding) else {
            debug!(target: "input", attempt = %label, "decode failed");
            failures.push(format!("{label}: invalid {}", attempt.encoding.name()));
            continue;
        };
        match parse(&text, attempt.quoting) {
            Ok(Some(table)) => {
                info!(
                    target: "input",
                    attempt = %label,
                    records = table.records.len(),
                    delimiter = %(table.delimiter as char).escape_default(),
                    "input parsed"
                );
                return Ok(table);
            }
            Ok(None) => return Err(InputError::Empty(path.to_path_buf())),
            Err(err) => {
                debug!(target: "input", attempt = %label, error = %err, "parse failed");
                failures.push(format!("{label}: {err}"));
            }
        }
    }
    Err(InputError::Unparseable {
        path: path.to_path_buf(),
        attempts: failures,
    })
}

fn attempts_for(bytes: &[u8]) -> Vec<Attempt> {
    let encodings = if bytes.starts_with(UTF16LE_BOM) {
        vec![UTF_16LE]
    } else {
        vec![UTF_8, WINDOWS_1252]
    };
    encodings
        .into_iter()
        .flat_map(|encoding| [true, false].map(|quoting| Attempt { encoding, quoting }))
        .collect()
}

fn decode(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let body = if encoding == UTF_16LE {
        bytes.strip_prefix(UTF16LE_BOM).unwrap_or(bytes)
    } else if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };
    if encoding == UTF_16LE && body.len() % 2 != 0 {
        return None;
    }
    let text = encoding.decode_without_bom_handling_and_without_replacement(body)?;
    if text.contains('\0') {
        return None;
    }
    Some(text.into_owned())
}

fn parse(text: &str, quoting: bool) -> Result<Option<InputTable>, csv::Error> {
    let Some(first_line) = text.lines().find(|line| !line.trim().is_empty()) else {
        return Ok(None);
    };
    let delimiter = if first_line.contains('\t') { b'\t' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quoting(quoting)
        .flexible(!quoting)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Ok(None);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
        let url = fields.pop().unwrap_or_default();
        records.push(InputRecord {
            leading: fields,
            url,
        });
    }

    Ok(Some(InputTable {
        headers,
        records,
        delimiter,
    }))
}
