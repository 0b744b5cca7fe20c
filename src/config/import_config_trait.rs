// ==========================================
// 助学金受益人记录 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_config::ImportConfig;
use crate::domain::AreaNameMatching;
use crate::importer::error::ImportResult;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）、ImportConfig（内存快照）
pub trait ImportConfigReader {
    /// 获取合法记录类型列表
    ///
    /// # 默认值
    /// - ["day", "boarding"]
    fn get_valid_record_types(&self) -> ImportResult<Vec<String>>;

    /// 获取合法监护状态列表
    ///
    /// # 默认值
    /// - ["both", "single", "orphan", "none"]
    fn get_valid_guardian_statuses(&self) -> ImportResult<Vec<String>>;

    /// 获取合法机构类别列表
    ///
    /// # 默认值
    /// - ["national", "extra-county", "county", "sub-county", "private"]
    fn get_valid_institution_categories(&self) -> ImportResult<Vec<String>>;

    /// 获取默认机构类型（名称中无关键字时使用）
    ///
    /// # 默认值
    /// - "other"
    fn get_default_institution_type(&self) -> ImportResult<String>;

    /// 获取区域名称匹配模式
    ///
    /// # 默认值
    /// - CASE_INSENSITIVE
    fn get_area_name_matching(&self) -> ImportResult<AreaNameMatching>;

    /// 组装完整配置快照（每个批次读取一次）
    fn load_import_config(&self) -> ImportResult<ImportConfig> {
        Ok(ImportConfig {
            valid_record_types: self.get_valid_record_types()?,
            valid_guardian_statuses: self.get_valid_guardian_statuses()?,
            valid_institution_categories: self.get_valid_institution_categories()?,
            default_institution_type: self.get_default_institution_type()?,
            area_name_matching: self.get_area_name_matching()?,
        })
    }
}

impl ImportConfigReader for ImportConfig {
    fn get_valid_record_types(&self) -> ImportResult<Vec<String>> {
        Ok(self.valid_record_types.clone())
    }

    fn get_valid_guardian_statuses(&self) -> ImportResult<Vec<String>> {
        Ok(self.valid_guardian_statuses.clone())
    }

    fn get_valid_institution_categories(&self) -> ImportResult<Vec<String>> {
        Ok(self.valid_institution_categories.clone())
    }

    fn get_default_institution_type(&self) -> ImportResult<String> {
        Ok(self.default_institution_type.clone())
    }

    fn get_area_name_matching(&self) -> ImportResult<AreaNameMatching> {
        Ok(self.area_name_matching)
    }
}
