// ==========================================
// 助学金受益人记录 - 批次协调器
// ==========================================
// 职责: 驱动单个批次的逐行处理，汇总 ImportSummary
// 行状态机: 空白 → Skipped；校验/映射失败 → Failed(validation)；
//           解析/落库异常 → Failed(exception)；否则 Imported
// 红线: 行级失败只记录不抛出；仅 Systemic 错误逃出 run()，由调用方回滚事务
// ==========================================
// 事务: 本类型不开启事务，调用方（BeneficiaryImporter）在事务内构造 store
// 缓存: 协调器按批次创建，run() 消耗自身，缓存随之销毁
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{
    BeneficiaryFields, BeneficiaryRow, DecisionState, FailureCategory, ImportBatch,
    ImportSummary, RawRow, RowFailure, HEADER_ROW_OFFSET,
};
use crate::importer::code_generator::InstitutionCodeGenerator;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::derivation::DerivationService;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::importer_trait::{DataCleaner as _, FieldMapper as _};
use crate::importer::reference_resolver::ReferenceResolver;
use crate::importer::row_validator::{RowValidation, RowValidator};
use crate::repository::{ImportStore, RepositoryError, RepositoryResult};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RowOutcome - 单行处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Imported,
    Skipped,
    Failed(RowFailure),
}

// ==========================================
// BatchCoordinator
// ==========================================
pub struct BatchCoordinator<'s, S: ImportStore + ?Sized> {
    store: &'s S,
    validator: RowValidator,
    field_mapper: FieldMapper,
    cleaner: DataCleaner,
    resolver: ReferenceResolver<'s, S>,
}

impl<'s, S: ImportStore + ?Sized> BatchCoordinator<'s, S> {
    /// 创建批次协调器
    ///
    /// # 参数
    /// - store: 事务内的存储（借用）
    /// - config: 导入配置快照（枚举集合在此一次性构建）
    pub fn new(store: &'s S, config: &ImportConfig) -> Self {
        Self::with_code_generator(store, config, InstitutionCodeGenerator::default())
    }

    pub fn with_code_generator(
        store: &'s S,
        config: &ImportConfig,
        code_generator: InstitutionCodeGenerator,
    ) -> Self {
        Self {
            store,
            validator: RowValidator::from_config(config),
            field_mapper: FieldMapper::new(),
            cleaner: DataCleaner,
            resolver: ReferenceResolver::new(
                store,
                config.area_name_matching,
                code_generator,
                DerivationService::new(config.default_institution_type.clone()),
            ),
        }
    }

    /// 执行批次
    ///
    /// # 参数
    /// - rows: 原始行（按文件顺序）
    /// - source_name: 来源名称（写入批次审计）
    ///
    /// # 返回
    /// - Ok(ImportSummary): 批次完成（可含行级失败）
    /// - Err(ImportError::Systemic): 系统错误，调用方必须回滚
    #[instrument(skip(self, rows), fields(batch_id, total_rows = rows.len()))]
    pub fn run(mut self, rows: &[RawRow], source_name: Option<&str>) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, total_rows = rows.len(), "开始处理导入批次");

        let mut imported_count = 0;
        let mut skipped_count = 0;
        let mut failures = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + HEADER_ROW_OFFSET;

            match self.process_row(row, row_number) {
                Ok(RowOutcome::Imported) => imported_count += 1,
                Ok(RowOutcome::Skipped) => skipped_count += 1,
                Ok(RowOutcome::Failed(failure)) => failures.push(failure),
                Err(e) => {
                    error!(
                        batch_id = %batch_id,
                        row_number,
                        error = %e,
                        processed = idx,
                        "系统错误，批次中止"
                    );
                    return Err(ImportError::Systemic(e));
                }
            }
        }

        let resolver_stats = self.resolver.stats();
        let summary = ImportSummary {
            batch_id: batch_id.clone(),
            total_rows: rows.len(),
            imported_count,
            skipped_count,
            failures,
            created_institutions: self.resolver.into_created_institutions(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };

        // 批次审计与导入数据同一事务
        let batch = ImportBatch::from_summary(&summary, source_name.map(str::to_string))
            .map_err(|e| ImportError::InternalError(format!("批次摘要序列化失败: {}", e)))?;
        self.store.insert_batch(&batch)?;

        info!(
            batch_id = %batch_id,
            total = summary.total_rows,
            imported = summary.imported_count,
            skipped = summary.skipped_count,
            failed = summary.failed_count(),
            created_institutions = summary.created_institutions.len(),
            cache_hits = resolver_stats.cache_hits,
            elapsed_ms = summary.elapsed_ms,
            "导入批次完成"
        );

        Ok(summary)
    }

    /// 处理单行
    ///
    /// # 返回
    /// - Ok(RowOutcome): 行级结果（含行级失败）
    /// - Err(RepositoryError): 仅系统错误
    pub fn process_row(&mut self, row: &RawRow, row_number: usize) -> Result<RowOutcome, RepositoryError> {
        // 1. 空白行
        if self.cleaner.is_blank_row(row) {
            debug!(row_number, "空白行，跳过");
            return Ok(RowOutcome::Skipped);
        }

        // 2. 行校验
        if let RowValidation::Invalid(messages) = self.validator.validate(row, row_number) {
            warn!(row_number, errors = ?messages, "行校验失败");
            return Ok(failed(row, row_number, FailureCategory::Validation, messages));
        }

        // 3. 字段映射（类型转换失败同属 validation）
        let mapped = match self.field_mapper.map_row(row, row_number, self.validator.rules()) {
            Ok(mapped) => mapped,
            Err(messages) => {
                warn!(row_number, errors = ?messages, "字段映射失败");
                return Ok(failed(row, row_number, FailureCategory::Validation, messages));
            }
        };

        // 4. 解析参照 + upsert
        match self.persist_row(&mapped) {
            Ok(()) => Ok(RowOutcome::Imported),
            Err(e) if e.is_systemic() => Err(e),
            Err(e) => {
                error!(
                    row_number,
                    admission_number = %mapped.admission_number,
                    institution = %mapped.institution,
                    error = ?e,
                    "行处理异常"
                );
                Ok(failed(row, row_number, FailureCategory::Exception, vec![e.to_string()]))
            }
        }
    }

    fn persist_row(&mut self, row: &BeneficiaryRow) -> RepositoryResult<()> {
        let region_id = self.resolver.resolve_region(&row.region)?;
        let sub_region_id = self.resolver.resolve_sub_region(&row.sub_region, region_id)?;
        let institution_id = self
            .resolver
            .resolve_institution(&row.institution, row.institution_category.as_deref())?;

        let fields = BeneficiaryFields {
            region_id,
            sub_region_id,
            institution_id,
            record_type: row.record_type.clone(),
            person_name: row.person_name.clone(),
            admission_number: row.admission_number.clone(),
            guardian_status: row.guardian_status.clone(),
            guardian_phone: row.guardian_phone.clone(),
            guardian_id: row.guardian_id.clone(),
            amount: row.amount,
        };

        // 自然键 (admission_number, institution_id)：存在则原地更新，decision 不变
        match self
            .store
            .find_beneficiary_by_key(&row.admission_number, institution_id)?
        {
            Some(existing) => {
                self.store.update_beneficiary(existing.id, &fields)?;
                debug!(
                    row_number = row.row_number,
                    beneficiary_id = existing.id,
                    decision = %existing.decision,
                    "受益人记录已更新"
                );
            }
            None => {
                let id = self.store.insert_beneficiary(&fields, DecisionState::Pending)?;
                debug!(row_number = row.row_number, beneficiary_id = id, "受益人记录已新建");
            }
        }

        Ok(())
    }
}

fn failed(
    row: &RawRow,
    row_number: usize,
    category: FailureCategory,
    messages: Vec<String>,
) -> RowOutcome {
    RowOutcome::Failed(RowFailure {
        row_number,
        category,
        messages,
        raw_row: row.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};
    use crate::repository::SqliteImportStore;
    use rusqlite::Connection;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn raw(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn scenario_a_row() -> RawRow {
        raw(&[
            ("region", "Mbitini"),
            ("sub_region", "Katwala"),
            ("institution", "Mbitini Secondary"),
            ("type", "day"),
            ("admission_number", "S123"),
            ("guardian_status", "both"),
            ("guardian_phone", "0712345678"),
            ("guardian_id", "12345678"),
            ("amount", "5000"),
        ])
    }

    #[test]
    fn test_scenario_a_creates_everything_once() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);

        let summary = BatchCoordinator::new(&store, &ImportConfig::default())
            .run(&[scenario_a_row()], None)
            .unwrap();

        assert_eq!(summary.imported_count, 1);
        assert_eq!(summary.skipped_count, 0);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.created_institutions.len(), 1);
        assert_eq!(summary.created_institutions[0].category, "unspecified");

        assert_eq!(store.count_regions().unwrap(), 1);
        assert_eq!(store.count_sub_regions().unwrap(), 1);
        assert_eq!(store.count_institutions().unwrap(), 1);

        let records = store.list_beneficiaries().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].decision, DecisionState::Pending);
        assert_eq!(records[0].amount, Some(5000.0));
    }

    #[test]
    fn test_invalid_type_is_validation_failure_with_offset_row_number() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);

        let mut bad = scenario_a_row();
        bad.insert("type".to_string(), "invalid-type".to_string());

        let summary = BatchCoordinator::new(&store, &ImportConfig::default())
            .run(&[scenario_a_row(), bad.clone()], None)
            .unwrap();

        assert_eq!(summary.imported_count, 1);
        assert_eq!(summary.failures.len(), 1);

        let failure = &summary.failures[0];
        assert_eq!(failure.row_number, 3);
        assert_eq!(failure.category, FailureCategory::Validation);
        assert!(failure.messages[0].contains("invalid-type"));
        assert_eq!(failure.raw_row, bad);
    }

    #[test]
    fn test_blank_row_is_skipped_not_failed() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);

        let blank = raw(&[("region", ""), ("sub_region", "  "), ("institution", "")]);
        let summary = BatchCoordinator::new(&store, &ImportConfig::default())
            .run(&[blank], None)
            .unwrap();

        assert_eq!(summary.skipped_count, 1);
        assert_eq!(summary.imported_count, 0);
        assert!(summary.failures.is_empty());
        assert_eq!(store.count_regions().unwrap(), 0);
    }

    #[test]
    fn test_bad_amount_is_validation_failure() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);

        let mut row = scenario_a_row();
        row.insert("amount".to_string(), "five thousand".to_string());

        let summary = BatchCoordinator::new(&store, &ImportConfig::default())
            .run(&[row], None)
            .unwrap();

        assert_eq!(summary.imported_count, 0);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].category, FailureCategory::Validation);
        assert_eq!(store.count_beneficiaries().unwrap(), 0);
    }

    #[test]
    fn test_code_exhaustion_is_exception_failure_and_batch_continues() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);
        store
            .insert_institution(&crate::domain::NewInstitution {
                name: "Existing".to_string(),
                code: "MBISEC".to_string(),
                category: None,
                institution_type: "other".to_string(),
                active: true,
            })
            .unwrap();

        let mut other = scenario_a_row();
        other.insert("institution".to_string(), "Kyome Primary".to_string());
        other.insert("admission_number".to_string(), "P9".to_string());

        // 重试上限为 0：一旦冲突即失败
        let summary = BatchCoordinator::with_code_generator(
            &store,
            &ImportConfig::default(),
            InstitutionCodeGenerator::new(0),
        )
        .run(&[scenario_a_row(), other], None)
        .unwrap();

        assert_eq!(summary.imported_count, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].row_number, 2);
        assert_eq!(summary.failures[0].category, FailureCategory::Exception);
        assert_eq!(summary.created_institutions.len(), 1);
        assert_eq!(summary.created_institutions[0].name, "Kyome Primary");
    }

    #[test]
    fn test_batch_audit_written() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);

        let summary = BatchCoordinator::new(&store, &ImportConfig::default())
            .run(&[scenario_a_row()], Some("bursaries.csv"))
            .unwrap();

        assert_eq!(store.count_batches().unwrap(), 1);
        let json = store.find_batch_summary_json(&summary.batch_id).unwrap().unwrap();
        let stored: ImportSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(stored, summary);
    }
}
