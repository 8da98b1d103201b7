use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

use crate::domain::ClassificationRecord;

use super::delimiter_for;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to open output file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write output file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Append-only, flushed per record so an interrupted run leaves a valid file.
pub struct OutputWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl OutputWriter {
    /// The header row (and optional BOM) is written only when the file is new or empty.
    pub fn open(
        path: &Path,
        headers: &[String],
        extra_columns: &[&str],
        write_bom: bool,
    ) -> Result<Self, OutputError> {
        let open_err = |source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        };
        let fresh = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;
        if fresh && write_bom {
            file.write_all(UTF8_BOM).map_err(open_err)?;
        }

        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter_for(path))
            .terminator(csv::Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(file);
        let mut output = Self {
            path: path.to_path_buf(),
            writer,
        };

        if fresh {
            let header: Vec<&str> = headers
                .iter()
                .map(String::as_str)
                .chain(extra_columns.iter().copied())
                .collect();
            output.write_row(&header)?;
            info!(target: "output", path = %path.display(), columns = header.len(), "output created");
        } else {
            info!(target: "output", path = %path.display(), "appending to existing output");
        }
        Ok(output)
    }

    pub fn append(&mut self, record: &ClassificationRecord) -> Result<(), OutputError> {
        self.write_row(&record.to_row())
    }

    fn write_row<S: AsRef<[u8]>>(&mut self, row: &[S]) -> Result<(), OutputError> {
        let write_err = |source| OutputError::Write {
            path: self.path.clone(),
            source,
        };
        self.writer.write_record(row).map_err(write_err)?;
        self.writer
            .flush()
            .map_err(|e| OutputError::Write {
                path: self.path.clone(),
                source: e.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{InputRecord, SecondaryValue, Verdict},
        tabular::{read_input, ACCESS_COLUMN},
    };

    fn record(leading: &[&str], url: &str, verdict: &str) -> ClassificationRecord {
        ClassificationRecord {
            input: InputRecord {
                leading: leading.iter().map(|s| s.to_string()).collect(),
                url: url.to_string(),
            },
            verdict: Verdict::new(verdict),
            secondary: None,
        }
    }

    #[test]
    fn leading_columns_round_trip_with_one_appended_column() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.csv");
        fs::write(
            &input_path,
            "title,isbn,url\n\"Title, \"\"A\"\"\",978-0,http://example.org/asp/123\n",
        )
        .unwrap();
        let input = read_input(&input_path).unwrap();

        let output_path = dir.path().join("out.csv");
        let mut writer =
            OutputWriter::open(&output_path, &input.headers, &[ACCESS_COLUMN], false).unwrap();
        for row in &input.records {
            let classified = ClassificationRecord {
                input: row.clone(),
                verdict: Verdict::new("Full access"),
                secondary: None,
            };
            writer.append(&classified).unwrap();
        }
        drop(writer);

        let output = read_input(&output_path).unwrap();
        assert_eq!(output.headers, vec!["title", "isbn", "url", "access"]);
        let out = &output.records[0];
        assert_eq!(out.leading[..2], input.records[0].leading[..]);
        assert_eq!(out.leading[2], input.records[0].url);
        assert_eq!(out.url, "Full access");
    }

    #[test]
    fn header_and_bom_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let headers = vec!["title".to_string(), "url".to_string()];

        let mut first = OutputWriter::open(&path, &headers, &[ACCESS_COLUMN], true).unwrap();
        first.append(&record(&["A"], "http://a", "Full access")).unwrap();
        drop(first);
        let mut second = OutputWriter::open(&path, &headers, &[ACCESS_COLUMN], true).unwrap();
        second.append(&record(&["B"], "http://b", "No access")).unwrap();
        drop(second);

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(
            text,
            "title,url,access\nA,http://a,Full access\nB,http://b,No access\n"
        );
    }

    #[test]
    fn secondary_column_is_appended_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let headers = vec!["title".to_string(), "url".to_string()];
        let mut writer =
            OutputWriter::open(&path, &headers, &[ACCESS_COLUMN, "ebook package"], false).unwrap();
        let mut row = record(&["A"], "http://a", "DOI error");
        row.secondary = Some(SecondaryValue::NotApplicable);
        writer.append(&row).unwrap();
        drop(writer);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "title\turl\taccess\tebook package\nA\thttp://a\tDOI error\tN/A\n"
        );
    }
}
