// ==========================================
// 文件导入 集成测试
// ==========================================
// 测试目标: CSV 文件 → ConfigManager 配置 → BeneficiaryImporter → SQLite
// ==========================================


use bursary_import::config::{config_keys, ConfigManager, ImportConfigReader};
use bursary_import::domain::{DecisionState, FailureCategory, ImportSummary};
use bursary_import::importer::{BeneficiaryImporter, ImportError};
use bursary_import::logging;
use bursary_import::repository::SqliteImportStore;
use std::io::Write;
use tempfile::Builder;
use test_helpers::create_test_db;

fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_import_csv_with_aliased_headers() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();

    let manager = ConfigManager::new(&db_path).unwrap();
    let config = manager.load_import_config().unwrap();
    let importer = BeneficiaryImporter::new(manager.connection(), config);

    let csv = write_csv(&[
        "Location,Ward,School,Category,Type,Student Name,Adm No,Status,Phone,ID Number,Bursary Amount",
        "Mbitini,Katwala,Mbitini Secondary,County,Day,Mwende Mutua,S123,Both,0712345678,12345678,\"5,000\"",
        ",,,,,,,,,,",
        "Mbitini,Katwala,Mbitini Secondary,,boarding,,S124,single,0722000000,23456789,",
        "Mbitini,Katwala,Kyome Primary,,weekly,,P1,both,0733000000,34567890,100",
    ]);

    let summary = importer.import_file(csv.path()).unwrap();

    assert_eq!(summary.total_rows, 4);
    assert_eq!(summary.imported_count, 2);
    assert_eq!(summary.skipped_count, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].row_number, 5);
    assert_eq!(summary.failures[0].category, FailureCategory::Validation);
    assert_eq!(summary.created_institutions.len(), 1);
    assert_eq!(summary.created_institutions[0].category, "county");

    let conn = importer.connection();
    let conn = conn.lock().unwrap();
    let store = SqliteImportStore::new(&conn);

    let records = store.list_beneficiaries().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].person_name.as_deref(), Some("Mwende Mutua"));
    assert_eq!(records[0].record_type, "day");
    assert_eq!(records[0].guardian_status, "both");
    assert_eq!(records[0].amount, Some(5000.0));
    assert_eq!(records[1].amount, None);
    assert!(records.iter().all(|r| r.decision == DecisionState::Pending));

    // 批次审计记录源文件名与完整摘要
    let json = store.find_batch_summary_json(&summary.batch_id).unwrap().unwrap();
    let stored: ImportSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(stored.imported_count, 2);
}

#[test]
fn test_configured_enumerations_are_used() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();

    let manager = ConfigManager::new(&db_path).unwrap();
    manager
        .set_global_list(config_keys::VALID_RECORD_TYPES, &["day", "boarding", "weekly"])
        .unwrap();
    let importer = BeneficiaryImporter::new(manager.connection(), manager.load_import_config().unwrap());

    let csv = write_csv(&[
        "region,sub_region,institution,type,admission_number,guardian_status,guardian_phone,guardian_id",
        "Mbitini,Katwala,Kyome Primary,weekly,P1,both,0733000000,34567890",
    ]);

    let summary = importer.import_file(csv.path()).unwrap();
    assert_eq!(summary.imported_count, 1);
    assert!(summary.failures.is_empty());
}

#[test]
fn test_missing_file_is_error_not_summary() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let importer = BeneficiaryImporter::open(&db_path, Default::default()).unwrap();

    let result = importer.import_file("does_not_exist.csv");
    assert!(matches!(result, Err(ImportError::FileNotFound(_))));
}

#[test]
fn test_unsupported_file_type() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let importer = BeneficiaryImporter::open(&db_path, Default::default()).unwrap();

    let file = Builder::new().suffix(".json").tempfile().unwrap();
    let result = importer.import_file(file.path());
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
}
