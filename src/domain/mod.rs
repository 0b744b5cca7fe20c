// ==========================================
// 助学金受益人记录 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、导入结果结构
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod beneficiary;
pub mod import;
pub mod reference;
pub mod types;

// 重导出核心类型
pub use beneficiary::{BeneficiaryFields, BeneficiaryRecord};
pub use import::{
    columns, BeneficiaryRow, CreatedInstitution, ImportBatch, ImportSummary, RawRow, RowFailure,
    HEADER_ROW_OFFSET,
};
pub use reference::{fold_name, Institution, NewInstitution, Region, SubRegion};
pub use types::{AreaNameMatching, DecisionState, FailureCategory};
