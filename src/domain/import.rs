// ==========================================
// 助学金受益人记录 - 导入相关结构体
// ==========================================
// 导入管道: RawRow → (校验) → BeneficiaryRow → (解析参照) → BeneficiaryFields → 落库
// 输出: ImportSummary（计数 + 失败明细 + 新建机构审计）
// ==========================================

use crate::domain::types::FailureCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 原始行：列名（小写下划线）→ 原始字符串
///
/// 使用有序映射，保证失败明细中 raw_row 的序列化顺序稳定
pub type RawRow = BTreeMap<String, String>;

// ==========================================
// 标准列名
// ==========================================
pub mod columns {
    pub const REGION: &str = "region";
    pub const SUB_REGION: &str = "sub_region";
    pub const INSTITUTION: &str = "institution";
    pub const CATEGORY: &str = "category";
    pub const TYPE: &str = "type";
    pub const PERSON_NAME: &str = "person_name";
    pub const ADMISSION_NUMBER: &str = "admission_number";
    pub const GUARDIAN_STATUS: &str = "guardian_status";
    pub const GUARDIAN_PHONE: &str = "guardian_phone";
    pub const GUARDIAN_ID: &str = "guardian_id";
    pub const AMOUNT: &str = "amount";

    /// 必填列（TRIM 后不可为空），顺序即错误消息顺序
    pub const REQUIRED: [&str; 8] = [
        REGION,
        SUB_REGION,
        INSTITUTION,
        TYPE,
        ADMISSION_NUMBER,
        GUARDIAN_STATUS,
        GUARDIAN_PHONE,
        GUARDIAN_ID,
    ];
}

/// 首行为表头，数据行号 = 下标 + 2
pub const HEADER_ROW_OFFSET: usize = 2;

// ==========================================
// BeneficiaryRow - 导入中间结构体
// ==========================================
// 用途: 已通过校验、已清洗的行（字符串均已 TRIM）
// 生命周期: 仅在单行处理流程内
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryRow {
    pub region: String,
    pub sub_region: String,
    pub institution: String,
    pub institution_category: Option<String>,
    pub record_type: String,
    pub person_name: Option<String>,
    pub admission_number: String,
    pub guardian_status: String,
    pub guardian_phone: String,
    pub guardian_id: String,
    pub amount: Option<f64>,

    // 元信息
    pub row_number: usize,
}

// ==========================================
// RowFailure - 行级失败记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row_number: usize,          // 原始文件行号（含表头偏移）
    pub category: FailureCategory,  // validation / exception
    pub messages: Vec<String>,      // 面向用户的错误消息
    pub raw_row: RawRow,            // 原始行数据
}

// ==========================================
// CreatedInstitution - 批次内新建机构审计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedInstitution {
    pub name: String,
    pub id: i64,
    pub category: String, // 未提供类别时为 "unspecified"
}

impl CreatedInstitution {
    pub const UNSPECIFIED_CATEGORY: &'static str = "unspecified";

    pub fn new(name: String, id: i64, category: Option<String>) -> Self {
        Self {
            name,
            id,
            category: category.unwrap_or_else(|| Self::UNSPECIFIED_CATEGORY.to_string()),
        }
    }
}

// ==========================================
// ImportSummary - 导入结果（不可变）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: String,
    pub total_rows: usize,
    pub imported_count: usize,  // 新增与更新不区分
    pub skipped_count: usize,   // 整行空白
    pub failures: Vec<RowFailure>,
    pub created_institutions: Vec<CreatedInstitution>,
    pub elapsed_ms: u64,
}

impl ImportSummary {
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// 指定类别的失败明细
    pub fn failures_of(&self, category: FailureCategory) -> impl Iterator<Item = &RowFailure> {
        self.failures.iter().filter(move |f| f.category == category)
    }
}

// ==========================================
// ImportBatch - 导入批次审计
// ==========================================
// 对齐: import_batch 表；与导入数据同一事务写入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub source_name: Option<String>,    // 源文件名（直接传行时为 None）
    pub total_rows: i64,
    pub imported_rows: i64,
    pub skipped_rows: i64,
    pub failed_rows: i64,
    pub created_institutions: i64,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub summary_json: String,
}

impl ImportBatch {
    pub fn from_summary(
        summary: &ImportSummary,
        source_name: Option<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            batch_id: summary.batch_id.clone(),
            source_name,
            total_rows: summary.total_rows as i64,
            imported_rows: summary.imported_count as i64,
            skipped_rows: summary.skipped_count as i64,
            failed_rows: summary.failed_count() as i64,
            created_institutions: summary.created_institutions.len() as i64,
            imported_at: Utc::now(),
            elapsed_ms: summary.elapsed_ms as i64,
            summary_json: serde_json::to_string(summary)?,
        })
    }
}
