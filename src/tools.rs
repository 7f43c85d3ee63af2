//! Column translation, transcoding and inspection of CSV files.

use crate::i18n::Language;
use crate::record::Record;
use crate::table::{read_table, read_text, write_table, TableError};
use crate::translation::{Backend, TranslateError, TranslationGateway};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Pair up source and target column names.
pub fn column_pairs(from: &[String], to: &[String]) -> Result<Vec<(String, String)>> {
    if from.is_empty() {
        bail!("No columns to translate");
    }
    if from.len() != to.len() {
        bail!(
            "Got {} source columns but {} target columns",
            from.len(),
            to.len()
        );
    }
    Ok(from.iter().cloned().zip(to.iter().cloned()).collect())
}

/// Translate `source -> target` columns of every record in place.
///
/// Records without a source column are left alone; a null source value makes
/// the target null. Returns the number of values translated.
pub async fn translate_columns<G: TranslationGateway>(
    gateway: &G,
    records: &mut [Record],
    from: Language,
    to: Language,
    pairs: &[(String, String)],
    backend: Backend,
) -> Result<usize, TranslateError> {
    let mut translated = 0;
    for record in records.iter_mut() {
        for (source, target) in pairs {
            let value = match record.entry(source) {
                None => continue,
                Some(None) => None,
                Some(Some(text)) => {
                    let text = text.to_string();
                    translated += 1;
                    Some(gateway.translate(&text, from, to, backend).await?)
                }
            };
            record.set(target, value);
        }
    }
    Ok(translated)
}

/// Translate columns of a CSV file, writing to `destination` (default: in place).
pub async fn translate_file<G: TranslationGateway>(
    gateway: &G,
    source: &Path,
    destination: Option<&Path>,
    from: Language,
    to: Language,
    pairs: &[(String, String)],
    backend: Backend,
) -> Result<()> {
    let mut table = read_table(source)?;
    info!(
        "Translating {} rows of {} from {} to {} with {}",
        table.records.len(),
        source.display(),
        from.name(),
        to.name(),
        backend
    );

    let count = translate_columns(gateway, &mut table.records, from, to, pairs, backend)
        .await
        .with_context(|| format!("Failed to translate {}", source.display()))?;

    let destination = destination.unwrap_or(source);
    write_table(&table.records, destination, table.encoding)?;
    info!("✓ Translated {} values into {}", count, destination.display());
    Ok(())
}

/// Every `.csv` file under `dir`, sorted by path.
pub fn csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_csv(p))
        .collect();
    files.sort();
    files
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}

/// Re-encode CSV files as UTF-8, replacing no-break spaces with plain spaces.
///
/// A directory source is walked; each file is rewritten in place or, with a
/// destination, at the same relative path under it. Returns the number of
/// files written.
pub fn transcode(source: &Path, destination: Option<&Path>) -> Result<usize, TableError> {
    if !source.is_dir() {
        transcode_file(source, destination.unwrap_or(source))?;
        return Ok(1);
    }

    let files = csv_files(source);
    for file in &files {
        let target = match (destination, file.strip_prefix(source)) {
            (Some(dir), Ok(relative)) => dir.join(relative),
            _ => file.clone(),
        };
        transcode_file(file, &target)?;
    }
    Ok(files.len())
}

fn transcode_file(source: &Path, destination: &Path) -> Result<(), TableError> {
    let (text, encoding) = read_text(source)?;
    info!(
        "Transcoding {} from {} to UTF-8",
        source.display(),
        encoding.name()
    );
    let text = text.replace('\u{a0}', " ");

    let write_error = |source: std::io::Error| TableError::Write {
        path: destination.to_path_buf(),
        source,
    };
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(destination, text).map_err(write_error)
}

/// One JSON object per record, one per line.
pub fn render_rows(records: &[Record]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Longest value per column, in characters, in column order.
pub fn longest_values(records: &[Record]) -> Vec<(String, usize)> {
    let mut longest: Vec<(String, usize)> = Vec::new();
    for record in records {
        for (key, value) in record.iter() {
            let length = value.map_or(0, |v| v.chars().count());
            match longest.iter_mut().find(|(k, _)| k == key) {
                Some((_, max)) => *max = (*max).max(length),
                None => longest.push((key.to_string(), length)),
            }
        }
    }
    longest
}

/// Aligned `Column | Length` report for one file.
pub fn render_longest(path: &Path, longest: &[(String, usize)]) -> String {
    let width = longest
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0)
        + 5;

    let mut out = format!("Longest values in {}:\n", path.display());
    out.push_str(&format!("{:width$} | {}\n", "Column", "Length", width = width));
    for (key, length) in longest {
        out.push_str(&format!("{:width$} | {}\n", key, length, width = width));
    }
    out
}
