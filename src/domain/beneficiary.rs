// ==========================================
// 助学金受益人记录 - 受益人实体
// ==========================================
// 自然键: (admission_number, institution_id)
// 说明: 同一学号可在不同机构重复出现，因此不能用学号单独做键
// ==========================================

use crate::domain::types::DecisionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// BeneficiaryRecord - 受益人记录（导入目标）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryRecord {
    pub id: i64,

    // ===== 外键 =====
    pub region_id: i64,
    pub sub_region_id: i64,
    pub institution_id: i64,

    // ===== 业务字段 =====
    pub record_type: String,           // 记录类型（如 day / boarding）
    pub person_name: Option<String>,
    pub admission_number: String,
    pub guardian_status: String,
    pub guardian_phone: String,
    pub guardian_id: String,
    pub amount: Option<f64>,

    // ===== 审批 =====
    pub decision: DecisionState,

    // ===== 审计 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// BeneficiaryFields - 导入可写字段
// ==========================================
// 用途: upsert 时覆盖的字段集合（不含 decision）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryFields {
    pub region_id: i64,
    pub sub_region_id: i64,
    pub institution_id: i64,
    pub record_type: String,
    pub person_name: Option<String>,
    pub admission_number: String,
    pub guardian_status: String,
    pub guardian_phone: String,
    pub guardian_id: String,
    pub amount: Option<f64>,
}
