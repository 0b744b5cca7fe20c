// ==========================================
// 助学金受益人记录 - 批量导入引擎
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 将表格行对账导入为受益人记录（区域/子区域/机构按需创建）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 校验、参照解析、批次协调
pub mod importer;

// 配置层 - 导入枚举配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AreaNameMatching, DecisionState, FailureCategory};

// 领域实体
pub use domain::{
    BeneficiaryRecord, CreatedInstitution, ImportSummary, Institution, RawRow, Region,
    RowFailure, SubRegion,
};

// 导入
pub use importer::{BatchCoordinator, BeneficiaryImporter, ImportError, ImportResult};

// 配置
pub use config::{ConfigManager, ImportConfig, ImportConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "bursary-import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
