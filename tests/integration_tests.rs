//! Integration tests for the NOC reconciliation tool
//!
//! These tests drive the library the way the binary does: CSV files on disk,
//! the reconciliation engine, and the real gateway against a mocked cloud
//! translator and scripted local model.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use noc_reconcile::combine::combine_files;
use noc_reconcile::exit_codes;
use noc_reconcile::export::{export, CNP_CLASSES, CNP_ELEMENTS, NOC_CLASSES, NOC_ELEMENTS};
use noc_reconcile::i18n::Language;
use noc_reconcile::reconcile::{reconcile, BilingualLayout};
use noc_reconcile::record::Record;
use noc_reconcile::table::{read_table, write_table};
use noc_reconcile::translation::{Backend, TranslateError, TranslationGateway};

// ==================== Test Helpers ====================

/// Gateway translating from a fixed dictionary, whatever the backend.
#[derive(Default)]
struct DictionaryGateway {
    entries: HashMap<String, String>,
    calls: Mutex<Vec<Backend>>,
}

impl DictionaryGateway {
    fn with(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl TranslationGateway for DictionaryGateway {
    async fn translate(
        &self,
        text: &str,
        _from: Language,
        _to: Language,
        backend: Backend,
    ) -> Result<String, TranslateError> {
        self.calls.lock().unwrap().push(backend);
        self.entries
            .get(text)
            .cloned()
            .ok_or_else(|| TranslateError::LocalModel(format!("no entry for {:?}", text)))
    }
}

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write test file");
    path
}

// ==================== Reconciliation Tests ====================

#[tokio::test]
async fn test_reconcile_files_end_to_end() {
    let dir = TempDir::new().unwrap();
    let english = write_file(
        dir.path(),
        "elements_en.csv",
        "noc_code,name_english,type_english\n\
         00010,Establish objectives,Main duties\n\
         00010,Legislators,Illustrative example(s)\n"
            .as_bytes(),
    );
    // French export in Windows-1252
    let french = write_file(
        dir.path(),
        "elements_fr.csv",
        b"noc_code,name_french,type_french\n00010,\xC9tablir des objectifs,Fonctions principales\n",
    );

    let gateway = DictionaryGateway::with(&[
        ("Établir des objectifs", "Establish objectives"),
        ("Legislators", "Législateurs"),
    ]);

    let primary = read_table(&english).unwrap();
    let secondary = read_table(&french).unwrap();
    let merged = reconcile(&gateway, BilingualLayout::noc(), primary.records, &secondary.records)
        .await
        .expect("reconcile");

    let output = dir.path().join("elements.csv");
    write_table(merged.records(), &output, secondary.encoding).unwrap();

    let result = read_table(&output).unwrap();
    assert_eq!(result.encoding, encoding_rs::WINDOWS_1252);
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.records[0].get("name_french"), Some("Établir des objectifs"));
    assert_eq!(result.records[0].get("type_french"), Some("Fonctions principales"));
    assert_eq!(result.records[1].get("name_french"), Some("Législateurs"));
    assert_eq!(result.records[1].get("type_french"), Some("Exemple(s) illustratif(s)"));

    // One local translation (exact), one cloud translation (back-fill)
    assert_eq!(
        *gateway.calls.lock().unwrap(),
        vec![Backend::LocalModel, Backend::CloudApi]
    );
}

#[tokio::test]
async fn test_reconcile_without_primary_rows_synthesizes_everything() {
    let gateway = DictionaryGateway::with(&[
        ("Fonctions principales", "Main duties"),
        ("Gérer le budget", "Manage the budget"),
    ]);
    let secondary = vec![Record::new()
        .with("noc_code", "00012")
        .with("type_french", "Fonctions principales")
        .with("name_french", "Gérer le budget")];

    let merged = reconcile(&gateway, BilingualLayout::noc(), Vec::new(), &secondary)
        .await
        .expect("reconcile");

    assert_eq!(merged.len(), 1);
    let record = merged.get(0).unwrap();
    assert_eq!(record.get("noc_code"), Some("00012"));
    assert_eq!(record.get("type_english"), Some("Main duties"));
    assert_eq!(record.get("name_english"), Some("Manage the budget"));
}

// ==================== Combine Tests ====================

#[test]
fn test_combine_by_id_roundtrip_through_files() {
    let dir = TempDir::new().unwrap();
    let english = write_file(
        dir.path(),
        "classes_en.csv",
        b"noc_code,name_english\n00010,Legislators\n00011,Senior government managers\n",
    );
    let french = write_file(
        dir.path(),
        "classes_fr.csv",
        "noc_code,name_french\n00011,Cadres supérieurs\n,sans code\n00010,Membres des corps législatifs\n"
            .as_bytes(),
    );

    let table = combine_files(&[english, french], Some("noc_code")).unwrap();
    let output = dir.path().join("classes.csv");
    write_table(&table.records, &output, table.encoding).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        text,
        "noc_code,name_english,name_french\n\
         00010,Legislators,Membres des corps législatifs\n\
         00011,Senior government managers,Cadres supérieurs\n\
         ,,sans code\n"
    );
}

// ==================== Export Tests ====================

#[tokio::test]
async fn test_export_writes_every_table() {
    let source = TempDir::new().unwrap();
    let destination = TempDir::new().unwrap();

    write_file(
        source.path(),
        NOC_ELEMENTS,
        "Code - NOC 2021 V1.0,Element Type Label English,Element Description English\n\
         00010,Main duties,Establish objectives\n"
            .as_bytes(),
    );
    write_file(
        source.path(),
        CNP_ELEMENTS,
        "Code de la CNP v1.0,Nom du type d’élément Français,Description d’élément Français\n\
         00010,Fonctions principales,Établir des objectifs \n"
            .as_bytes(),
    );
    write_file(
        source.path(),
        NOC_CLASSES,
        b"Code - NOC 2021 V1.0,Class title,Class definition\n00010,Legislators,Legislators participate.\n",
    );
    write_file(
        source.path(),
        CNP_CLASSES,
        "Code dela CNP 2021 v1.0,Titres de classes,Définitions de la classe\n\
         00010,Membres des corps législatifs,Les membres participent.\n"
            .as_bytes(),
    );

    let gateway = DictionaryGateway::with(&[("Établir des objectifs", "Establish objectives")]);
    let summary = export(&gateway, source.path(), destination.path())
        .await
        .expect("export");

    // 7 categories + 1 per-language file, twice; 2 class files; classes.csv; elements.csv
    assert_eq!(summary.written.len(), 20);

    let classes = read_table(&destination.path().join("classes.csv")).unwrap();
    assert_eq!(
        classes.records,
        vec![Record::new()
            .with("noc_code", "00010")
            .with("name_english", "Legislators")
            .with("description_english", "Legislators participate.")
            .with("name_french", "Membres des corps législatifs")
            .with("description_french", "Les membres participent.")]
    );

    let elements = read_table(&destination.path().join("elements.csv")).unwrap();
    assert_eq!(
        elements.records,
        vec![Record::new()
            .with("noc_code", "00010")
            .with("type_english", "Main duties")
            .with("name_english", "Establish objectives")
            .with("type_french", "Fonctions principales")
            .with("name_french", "Établir des objectifs")]
    );

    let duties = read_table(&destination.path().join("elements").join("duties_fr.csv")).unwrap();
    assert_eq!(duties.records.len(), 1);
}

#[tokio::test]
async fn test_export_missing_source_is_table_error() {
    let source = TempDir::new().unwrap();
    let destination = TempDir::new().unwrap();

    let err = export(&DictionaryGateway::default(), source.path(), destination.path())
        .await
        .unwrap_err();

    assert_eq!(exit_codes::for_error(&err), exit_codes::EXIT_TABLE_IO);
}

// ==================== Real Gateway Tests ====================

#[cfg(unix)]
mod real_gateway {
    use super::*;
    use noc_reconcile::config::{CloudConfig, Config, LocalModelConfig};
    use noc_reconcile::retry::RetryConfig;
    use noc_reconcile::translation::Gateway;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_json, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    /// Local model that echoes its input back untranslated.
    fn config(dir: &Path, endpoint: &str) -> Config {
        Config {
            cloud: Some(CloudConfig {
                endpoint: endpoint.to_string(),
                subscription_key: "test-key".to_string(),
                region: "canadacentral".to_string(),
            }),
            local: LocalModelConfig {
                translate_bin: script(dir, "argos-translate", "printf '%s\\n' \"$6\""),
                package_manager_bin: script(dir, "argospm", "exit 0"),
            },
            cloud_retry: RetryConfig::fixed_unbounded(Duration::from_millis(10))
                .with_max_attempts(Some(2)),
        }
    }

    fn azure(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!([{ "translations": [{ "text": text }] }]))
    }

    #[tokio::test]
    async fn test_cloud_translation_settles_local_miss() {
        let dir = TempDir::new().unwrap();
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(query_param("to", "en"))
            .and(body_json(serde_json::json!([{ "text": "Superviser le personnel de bureau" }])))
            .respond_with(azure("Supervise office staff"))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(query_param("to", "fr"))
            .and(body_json(serde_json::json!([{ "text": "Plan budgets" }])))
            .respond_with(azure("Planifier les budgets"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let gateway = Gateway::new(&config(dir.path(), &mock_server.uri()));
        let primary = vec![
            Record::new()
                .with("noc_code", "00010")
                .with("type_english", "Main duties")
                .with("name_english", "Supervise office staff"),
            Record::new()
                .with("noc_code", "00010")
                .with("type_english", "Main duties")
                .with("name_english", "Plan budgets"),
        ];
        let secondary = vec![Record::new()
            .with("noc_code", "00010")
            .with("type_french", "Fonctions principales")
            .with("name_french", "Superviser le personnel de bureau")];

        let merged = reconcile(&gateway, BilingualLayout::noc(), primary, &secondary)
            .await
            .expect("reconcile");

        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.get(0).and_then(|r| r.get("name_french")),
            Some("Superviser le personnel de bureau")
        );
        assert_eq!(
            merged.get(1).and_then(|r| r.get("name_french")),
            Some("Planifier les budgets")
        );
        assert_eq!(
            merged.get(1).and_then(|r| r.get("type_french")),
            Some("Fonctions principales")
        );
    }

    #[tokio::test]
    async fn test_cloud_api_error_stops_the_run() {
        let dir = TempDir::new().unwrap();
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "code": 401000, "message": "Access denied due to invalid subscription key" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let gateway = Gateway::new(&config(dir.path(), &mock_server.uri()));
        let primary = vec![Record::new()
            .with("noc_code", "00010")
            .with("type_english", "Main duties")
            .with("name_english", "Plan budgets")];

        let err = reconcile(&gateway, BilingualLayout::noc(), primary, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, TranslateError::Api { code: 401000, .. }));
        assert_eq!(
            exit_codes::for_error(&anyhow::Error::new(err)),
            exit_codes::EXIT_CLOUD_API
        );
    }
}
