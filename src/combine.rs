//! Merging several CSV tables into one.

use crate::record::Record;
use crate::table::{read_table, Table, TableError};
use encoding_rs::UTF_8;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Merge row `i` of every source into row `i` of the result.
///
/// Later sources overwrite earlier ones field by field; rows past the end of
/// the result so far are appended.
pub fn line_for_line(sources: Vec<Vec<Record>>) -> Vec<Record> {
    let mut combined: Vec<Record> = Vec::new();
    for records in sources {
        for (index, record) in records.into_iter().enumerate() {
            match combined.get_mut(index) {
                Some(existing) => existing.merge(&record),
                None => combined.push(record),
            }
        }
    }
    combined
}

/// Merge rows sharing the same `id` value, in first-seen order.
///
/// Rows without the identifier (absent or null) are skipped.
pub fn by_id(sources: Vec<Vec<Record>>, id: &str) -> Vec<Record> {
    let mut combined: Vec<Record> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for records in sources {
        for record in records {
            let Some(key) = record.get(id).map(str::to_string) else {
                warn!("Skipping row without {}: {:?}", id, record);
                continue;
            };
            match positions.get(&key) {
                Some(&position) => combined[position].merge(&record),
                None => {
                    positions.insert(key, combined.len());
                    combined.push(record);
                }
            }
        }
    }
    combined
}

/// Read and combine CSV files, keyed by `id` when given, else line for line.
///
/// The result carries the encoding of the last file read.
pub fn combine_files(paths: &[PathBuf], id: Option<&str>) -> Result<Table, TableError> {
    let mut encoding = UTF_8;
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let table = read_table(path)?;
        info!("Read {} rows from {}", table.records.len(), path.display());
        encoding = table.encoding;
        sources.push(table.records);
    }

    let records = match id {
        Some(id) => by_id(sources, id),
        None => line_for_line(sources),
    };
    Ok(Table { records, encoding })
}
