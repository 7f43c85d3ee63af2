//! Export of the official NOC 2021 V1.0 files into bilingual tables.
//!
//! Reads the English and French element and classification files from a
//! source directory and writes, under the destination:
//!
//! - `elements/<slug>_<lang>.csv`: one file per element category
//! - `elements_<lang>.csv` and `classes_<lang>.csv`: one file per language
//! - `classes.csv`: both class files combined by NOC code
//! - `elements.csv`: both element files reconciled and back-filled

use crate::combine::combine_files;
use crate::i18n::{Category, Language};
use crate::reconcile::{reconcile, BilingualLayout};
use crate::record::Record;
use crate::table::{read_table, write_table};
use crate::translation::TranslationGateway;
use anyhow::{bail, Context, Result};
use encoding_rs::Encoding;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub const NOC_ELEMENTS: &str = "noc_2021_version_1.0_-_elements.csv";
pub const CNP_ELEMENTS: &str = "cnp_2021_version_1.0_-_elements.csv";
pub const NOC_CLASSES: &str = "noc_2021_version_1.0_-_classification_structure.csv";
pub const CNP_CLASSES: &str = "cnp_2021_version_1.0_-_structure_de_la_classification.csv";

const ID: &str = "noc_code";

/// Source column names of an elements file.
struct ElementColumns {
    code: &'static str,
    kind: &'static str,
    description: &'static str,
}

/// Source column names of a classification structure file.
struct ClassColumns {
    code: &'static str,
    title: &'static str,
    definition: &'static str,
}

fn element_columns(language: Language) -> ElementColumns {
    if language == Language::FRENCH {
        ElementColumns {
            code: "Code de la CNP v1.0",
            kind: "Nom du type d’élément Français",
            description: "Description d’élément Français",
        }
    } else {
        ElementColumns {
            code: "Code - NOC 2021 V1.0",
            kind: "Element Type Label English",
            description: "Element Description English",
        }
    }
}

fn class_columns(language: Language) -> ClassColumns {
    if language == Language::FRENCH {
        ClassColumns {
            code: "Code dela CNP 2021 v1.0",
            title: "Titres de classes",
            definition: "Définitions de la classe",
        }
    } else {
        ClassColumns {
            code: "Code - NOC 2021 V1.0",
            title: "Class title",
            definition: "Class definition",
        }
    }
}

/// Files written by one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
}

/// Run the whole export from `source` into `destination`.
pub async fn export<G: TranslationGateway>(
    gateway: &G,
    source: &Path,
    destination: &Path,
) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();

    for (file, language) in [(NOC_ELEMENTS, Language::ENGLISH), (CNP_ELEMENTS, Language::FRENCH)] {
        let written = export_elements(&source.join(file), language, destination)?;
        summary.written.extend(written);
    }
    for (file, language) in [(NOC_CLASSES, Language::ENGLISH), (CNP_CLASSES, Language::FRENCH)] {
        let written = export_classes(&source.join(file), language, destination)?;
        summary.written.push(written);
    }

    let classes = combine_files(
        &[
            destination.join(per_language("classes", Language::ENGLISH)),
            destination.join(per_language("classes", Language::FRENCH)),
        ],
        Some(ID),
    )?;
    let classes_path = destination.join("classes.csv");
    write_table(&classes.records, &classes_path, classes.encoding)?;
    info!("✓ Wrote {} classes to {}", classes.records.len(), classes_path.display());
    summary.written.push(classes_path);

    let english = read_table(&destination.join(per_language("elements", Language::ENGLISH)))?;
    let french = read_table(&destination.join(per_language("elements", Language::FRENCH)))?;
    let merged = reconcile(gateway, BilingualLayout::noc(), english.records, &french.records)
        .await
        .context("Failed to reconcile English and French elements")?;

    let elements_path = destination.join("elements.csv");
    write_table(merged.records(), &elements_path, french.encoding)?;
    info!("✓ Wrote {} elements to {}", merged.len(), elements_path.display());
    summary.written.push(elements_path);

    Ok(summary)
}

fn per_language(stem: &str, language: Language) -> String {
    format!("{}_{}.csv", stem, language.code())
}

/// Split one elements file into per-category files and a per-language file.
fn export_elements(path: &Path, language: Language, destination: &Path) -> Result<Vec<PathBuf>> {
    let columns = element_columns(language);
    let table = read_table(path)?;
    require_columns(path, &table.records, &[columns.code, columns.kind, columns.description])?;

    let name_key = format!("name_{}", language.column_suffix());
    let type_key = format!("type_{}", language.column_suffix());

    let mut by_category: HashMap<Category, Vec<Record>> = HashMap::new();
    let mut all = Vec::with_capacity(table.records.len());

    for row in &table.records {
        let kind = cell(row, columns.kind);
        let item = Record::new()
            .with(ID, cell(row, columns.code))
            .with(&name_key, cell(row, columns.description));

        if let Some(category) = Category::from_label(kind, language) {
            by_category.entry(category).or_default().push(item.clone());
        }
        all.push(item.with(&type_key, kind));
    }

    let mut written = Vec::new();
    for category in Category::ALL {
        let records = by_category.remove(&category).unwrap_or_default();
        let target = destination
            .join("elements")
            .join(per_language(category.slug(), language));
        write_output(&records, &target, table.encoding)?;
        written.push(target);
    }

    let target = destination.join(per_language("elements", language));
    write_output(&all, &target, table.encoding)?;
    written.push(target);
    Ok(written)
}

/// Rename and trim the columns of one classification structure file.
fn export_classes(path: &Path, language: Language, destination: &Path) -> Result<PathBuf> {
    let columns = class_columns(language);
    let table = read_table(path)?;
    require_columns(path, &table.records, &[columns.code, columns.title, columns.definition])?;

    let classes: Vec<Record> = table
        .records
        .iter()
        .map(|row| {
            Record::new()
                .with(ID, cell(row, columns.code))
                .with(&format!("name_{}", language.column_suffix()), cell(row, columns.title))
                .with(
                    &format!("description_{}", language.column_suffix()),
                    cell(row, columns.definition),
                )
        })
        .collect();

    let target = destination.join(per_language("classes", language));
    write_output(&classes, &target, table.encoding)?;
    Ok(target)
}

fn cell<'r>(row: &'r Record, column: &str) -> &'r str {
    row.get(column).unwrap_or("").trim()
}

fn require_columns(path: &Path, records: &[Record], columns: &[&str]) -> Result<()> {
    if let Some(first) = records.first() {
        for column in columns {
            if !first.contains_key(column) {
                bail!("{} has no column '{}'", path.display(), column);
            }
        }
    }
    Ok(())
}

fn write_output(records: &[Record], path: &Path, encoding: &'static Encoding) -> Result<()> {
    write_table(records, path, encoding)?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_elements_splits_by_category() {
        let source = TempDir::new().expect("temp dir");
        let destination = TempDir::new().expect("temp dir");
        let path = source.path().join(NOC_ELEMENTS);
        std::fs::write(
            &path,
            "Level,Code - NOC 2021 V1.0,Element Type Label English,Element Description English\n\
             5,00010, Main duties ,  Establish objectives \n\
             5,00010,Illustrative example(s),Legislators\n\
             5,00011,Something new,Unclassified\n",
        )
        .expect("write");

        let written = export_elements(&path, Language::ENGLISH, destination.path()).expect("export");

        assert_eq!(written.len(), 8);
        let duties = read_table(&destination.path().join("elements").join("duties_en.csv"))
            .expect("duties");
        assert_eq!(
            duties.records,
            vec![Record::new()
                .with("noc_code", "00010")
                .with("name_english", "Establish objectives")]
        );

        let all = read_table(&destination.path().join("elements_en.csv")).expect("all");
        assert_eq!(all.records.len(), 3);
        assert_eq!(all.records[0].get("type_english"), Some("Main duties"));
        assert_eq!(all.records[2].get("type_english"), Some("Something new"));

        // Categories without rows still get an (empty) file
        let other = destination.path().join("elements").join("other_en.csv");
        assert_eq!(std::fs::read(other).expect("other").len(), 0);
    }

    #[test]
    fn test_export_classes_renames_columns() {
        let source = TempDir::new().expect("temp dir");
        let destination = TempDir::new().expect("temp dir");
        let path = source.path().join(CNP_CLASSES);
        std::fs::write(
            &path,
            "Niveau,Code dela CNP 2021 v1.0,Titres de classes,Définitions de la classe\n\
             5,00010,Membres des corps législatifs ,Les membres des corps législatifs...\n",
        )
        .expect("write");

        let target = export_classes(&path, Language::FRENCH, destination.path()).expect("export");

        assert_eq!(target, destination.path().join("classes_fr.csv"));
        let classes = read_table(&target).expect("classes");
        assert_eq!(
            classes.records,
            vec![Record::new()
                .with("noc_code", "00010")
                .with("name_french", "Membres des corps législatifs")
                .with("description_french", "Les membres des corps législatifs...")]
        );
    }

    #[test]
    fn test_missing_source_column_is_an_error() {
        let source = TempDir::new().expect("temp dir");
        let destination = TempDir::new().expect("temp dir");
        let path = source.path().join(NOC_CLASSES);
        std::fs::write(&path, "Code,Title\n00010,Legislators\n").expect("write");

        let err = export_classes(&path, Language::ENGLISH, destination.path()).unwrap_err();
        assert!(err.to_string().contains("Code - NOC 2021 V1.0"));
    }
}
