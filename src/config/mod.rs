// ==========================================
// 助学金受益人记录 - 配置层
// ==========================================
// 职责: 导入配置（命名枚举）的加载与快照
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config;
pub mod import_config_trait;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use import_config::ImportConfig;
pub use import_config_trait::ImportConfigReader;
