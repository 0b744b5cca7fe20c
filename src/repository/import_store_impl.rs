// ==========================================
// 助学金受益人记录 - 导入存储 SQLite 实现
// ==========================================
// 职责: ImportStore 的 rusqlite 实现
// 约束: 所有查询使用参数化,防止 SQL 注入
// 说明: 借用 &Connection，事务（Transaction 解引用为 Connection）同样适用
// ==========================================

use crate::domain::{
    BeneficiaryFields, BeneficiaryRecord, DecisionState, ImportBatch, Institution, NewInstitution,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_store::ImportStore;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

const BENEFICIARY_COLUMNS: &str = r#"
    id, region_id, sub_region_id, institution_id, record_type, person_name,
    admission_number, guardian_status, guardian_phone, guardian_id, amount,
    decision, created_at, updated_at
"#;

// ==========================================
// SqliteImportStore
// ==========================================
pub struct SqliteImportStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteImportStore<'c> {
    /// 基于已有连接（或事务）创建存储
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn map_beneficiary(row: &Row<'_>) -> rusqlite::Result<BeneficiaryRecord> {
        let decision_raw: String = row.get(11)?;
        let decision = decision_raw
            .parse::<DecisionState>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, e.into()))?;

        Ok(BeneficiaryRecord {
            id: row.get(0)?,
            region_id: row.get(1)?,
            sub_region_id: row.get(2)?,
            institution_id: row.get(3)?,
            record_type: row.get(4)?,
            person_name: row.get(5)?,
            admission_number: row.get(6)?,
            guardian_status: row.get(7)?,
            guardian_phone: row.get(8)?,
            guardian_id: row.get(9)?,
            amount: row.get(10)?,
            decision,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    fn query_id<P: rusqlite::Params>(&self, sql: &str, params: P) -> RepositoryResult<Option<i64>> {
        let id = self
            .conn
            .query_row(sql, params, |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(id)
    }

    fn count(&self, sql: &str) -> RepositoryResult<usize> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    // ===== 只读查询（报表/测试用）=====

    /// 按 id 读取机构
    pub fn find_institution(&self, id: i64) -> RepositoryResult<Option<Institution>> {
        let result = self
            .conn
            .query_row(
                r#"
                SELECT id, name, code, category, institution_type, active, created_at
                FROM institution
                WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok(Institution {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        code: row.get(2)?,
                        category: row.get(3)?,
                        institution_type: row.get(4)?,
                        active: row.get::<_, i64>(5)? != 0,
                        created_at: row.get::<_, DateTime<Utc>>(6)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    /// 按 id 读取受益人记录
    pub fn find_beneficiary(&self, id: i64) -> RepositoryResult<Option<BeneficiaryRecord>> {
        let sql = format!("SELECT {} FROM beneficiary_record WHERE id = ?1", BENEFICIARY_COLUMNS);
        let result = self
            .conn
            .query_row(&sql, params![id], Self::map_beneficiary)
            .optional()?;
        Ok(result)
    }

    /// 列出全部受益人记录（按 id 升序）
    pub fn list_beneficiaries(&self) -> RepositoryResult<Vec<BeneficiaryRecord>> {
        let sql = format!("SELECT {} FROM beneficiary_record ORDER BY id", BENEFICIARY_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_beneficiary)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// 人工修改审批状态（审批流程入口，导入路径不调用）
    pub fn set_decision(&self, id: i64, decision: DecisionState) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            "UPDATE beneficiary_record SET decision = ?1, updated_at = ?2 WHERE id = ?3",
            params![decision.as_str(), Utc::now(), id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "BeneficiaryRecord".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 读取批次审计（返回 summary_json）
    pub fn find_batch_summary_json(&self, batch_id: &str) -> RepositoryResult<Option<String>> {
        let json = self
            .conn
            .query_row(
                "SELECT summary_json FROM import_batch WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(json)
    }

    pub fn count_regions(&self) -> RepositoryResult<usize> {
        self.count("SELECT COUNT(*) FROM region")
    }

    pub fn count_sub_regions(&self) -> RepositoryResult<usize> {
        self.count("SELECT COUNT(*) FROM sub_region")
    }

    pub fn count_institutions(&self) -> RepositoryResult<usize> {
        self.count("SELECT COUNT(*) FROM institution")
    }

    pub fn count_beneficiaries(&self) -> RepositoryResult<usize> {
        self.count("SELECT COUNT(*) FROM beneficiary_record")
    }

    pub fn count_batches(&self) -> RepositoryResult<usize> {
        self.count("SELECT COUNT(*) FROM import_batch")
    }
}

impl ImportStore for SqliteImportStore<'_> {
    // ===== 区域 =====

    fn find_region_by_name(&self, name: &str) -> RepositoryResult<Option<i64>> {
        self.query_id("SELECT id FROM region WHERE name = ?1", params![name])
    }

    fn find_region_by_name_ci(&self, name: &str) -> RepositoryResult<Option<i64>> {
        self.query_id(
            "SELECT id FROM region WHERE fold_name(name) = fold_name(?1) ORDER BY id LIMIT 1",
            params![name],
        )
    }

    fn insert_region(&self, name: &str) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT INTO region (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ===== 子区域 =====

    fn find_sub_region_by_name(&self, name: &str, region_id: i64) -> RepositoryResult<Option<i64>> {
        self.query_id(
            "SELECT id FROM sub_region WHERE name = ?1 AND region_id = ?2",
            params![name, region_id],
        )
    }

    fn find_sub_region_by_name_ci(
        &self,
        name: &str,
        region_id: i64,
    ) -> RepositoryResult<Option<i64>> {
        self.query_id(
            r#"
            SELECT id FROM sub_region
            WHERE fold_name(name) = fold_name(?1) AND region_id = ?2
            ORDER BY id LIMIT 1
            "#,
            params![name, region_id],
        )
    }

    fn insert_sub_region(&self, name: &str, region_id: i64) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT INTO sub_region (name, region_id, created_at) VALUES (?1, ?2, ?3)",
            params![name, region_id, Utc::now()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ===== 机构 =====

    fn find_institution_by_name(&self, name: &str) -> RepositoryResult<Option<i64>> {
        self.query_id(
            "SELECT id FROM institution WHERE name = ?1 ORDER BY id LIMIT 1",
            params![name],
        )
    }

    fn find_institution_by_name_ci(&self, name: &str) -> RepositoryResult<Option<i64>> {
        self.query_id(
            "SELECT id FROM institution WHERE fold_name(name) = fold_name(?1) ORDER BY id LIMIT 1",
            params![name],
        )
    }

    fn institution_code_exists(&self, code: &str) -> RepositoryResult<bool> {
        Ok(self
            .query_id("SELECT 1 FROM institution WHERE code = ?1 LIMIT 1", params![code])?
            .is_some())
    }

    fn insert_institution(&self, institution: &NewInstitution) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO institution (name, code, category, institution_type, active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                institution.name,
                institution.code,
                institution.category,
                institution.institution_type,
                institution.active as i32,
                Utc::now(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ===== 受益人记录 =====

    fn find_beneficiary_by_key(
        &self,
        admission_number: &str,
        institution_id: i64,
    ) -> RepositoryResult<Option<BeneficiaryRecord>> {
        let sql = format!(
            r#"
            SELECT {} FROM beneficiary_record
            WHERE admission_number = ?1 AND institution_id = ?2
            ORDER BY id LIMIT 1
            "#,
            BENEFICIARY_COLUMNS
        );
        let result = self
            .conn
            .query_row(&sql, params![admission_number, institution_id], Self::map_beneficiary)
            .optional()?;
        Ok(result)
    }

    fn insert_beneficiary(
        &self,
        fields: &BeneficiaryFields,
        decision: DecisionState,
    ) -> RepositoryResult<i64> {
        let now = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO beneficiary_record (
                region_id, sub_region_id, institution_id, record_type, person_name,
                admission_number, guardian_status, guardian_phone, guardian_id, amount,
                decision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                fields.region_id,
                fields.sub_region_id,
                fields.institution_id,
                fields.record_type,
                fields.person_name,
                fields.admission_number,
                fields.guardian_status,
                fields.guardian_phone,
                fields.guardian_id,
                fields.amount,
                decision.as_str(),
                now,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_beneficiary(&self, id: i64, fields: &BeneficiaryFields) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            r#"
            UPDATE beneficiary_record SET
                region_id = ?1,
                sub_region_id = ?2,
                institution_id = ?3,
                record_type = ?4,
                person_name = ?5,
                admission_number = ?6,
                guardian_status = ?7,
                guardian_phone = ?8,
                guardian_id = ?9,
                amount = ?10,
                updated_at = ?11
            WHERE id = ?12
            "#,
            params![
                fields.region_id,
                fields.sub_region_id,
                fields.institution_id,
                fields.record_type,
                fields.person_name,
                fields.admission_number,
                fields.guardian_status,
                fields.guardian_phone,
                fields.guardian_id,
                fields.amount,
                Utc::now(),
                id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "BeneficiaryRecord".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    // ===== 批次审计 =====

    fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, source_name, total_rows, imported_rows, skipped_rows,
                failed_rows, created_institutions, imported_at, elapsed_ms, summary_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                batch.source_name,
                batch.total_rows,
                batch.imported_rows,
                batch.skipped_rows,
                batch.failed_rows,
                batch.created_institutions,
                batch.imported_at,
                batch.elapsed_ms,
                batch.summary_json,
            ],
        )?;
        Ok(())
    }
}
