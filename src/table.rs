//! CSV tables with detected character encoding.
//!
//! The encoding of a file is detected once, from its bytes: a byte-order mark
//! wins, then UTF-8 if the bytes are valid UTF-8, otherwise Windows-1252
//! (what spreadsheet exports of the NOC files usually are).

use crate::record::Record;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Rows of one CSV file plus the encoding they were decoded from.
#[derive(Debug, Clone)]
pub struct Table {
    pub records: Vec<Record>,
    pub encoding: &'static Encoding,
}

pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

/// Read a whole file as text in its detected encoding.
pub fn read_text(path: &Path) -> Result<(String, &'static Encoding), TableError> {
    let bytes = std::fs::read(path).map_err(|source| TableError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let encoding = detect_encoding(&bytes);
    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            "{}: some bytes are not valid {}, replaced",
            path.display(),
            encoding.name()
        );
    }
    debug!("{}: detected encoding {}", path.display(), encoding.name());
    Ok((text.into_owned(), encoding))
}

/// Read a CSV file with a header row into records.
///
/// Every cell becomes a present string (possibly empty); cells missing from
/// short rows are null.
pub fn read_table(path: &Path) -> Result<Table, TableError> {
    let (text, encoding) = read_text(path)?;
    let records = parse_records(&text).map_err(|source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("{}: read {} rows", path.display(), records.len());
    Ok(Table { records, encoding })
}

fn parse_records(text: &str) -> Result<Vec<Record>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (index, header) in headers.iter().enumerate() {
            record.set(header, row.get(index).map(str::to_string));
        }
        records.push(record);
    }
    Ok(records)
}

/// Column order for writing: keys in order of first appearance.
pub fn columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

/// Write records as CSV in `encoding`.
///
/// Null and missing cells are written empty. Text that `encoding` cannot
/// represent makes the whole file fall back to UTF-8. No records, empty file.
pub fn write_table(
    records: &[Record],
    path: &Path,
    encoding: &'static Encoding,
) -> Result<(), TableError> {
    let write_error = |source: std::io::Error| TableError::Write {
        path: path.to_path_buf(),
        source,
    };

    let text = render_csv(records).map_err(|source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let bytes = if encoding == UTF_8 {
        text.into_bytes()
    } else {
        let (encoded, used, had_errors) = encoding.encode(&text);
        if had_errors {
            warn!(
                "{}: text cannot be represented in {}, writing UTF-8 instead",
                path.display(),
                encoding.name()
            );
            text.into_bytes()
        } else {
            if used != encoding {
                debug!("{}: writing {} as {}", path.display(), encoding.name(), used.name());
            }
            encoded.into_owned()
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, bytes).map_err(write_error)?;
    debug!("{}: wrote {} rows", path.display(), records.len());
    Ok(())
}

fn render_csv(records: &[Record]) -> Result<String, csv::Error> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let columns = columns(records);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    // Built from &str cells only
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
