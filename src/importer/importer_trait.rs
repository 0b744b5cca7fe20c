// ==========================================
// 助学金受益人记录 - 导入组件 Trait
// ==========================================
// 职责: 定义导入管道各组件接口（不包含实现）
// 实现者: file_parser / data_cleaner / field_mapper / derivation
// ==========================================

use crate::domain::{BeneficiaryRow, RawRow};
use crate::importer::error::ImportResult;
use crate::importer::row_validator::ValidationRules;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 表格文件 → 有序原始行
pub trait FileParser {
    /// 解析文件为原始行列表
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 按文件顺序的行（键已规范化为小写下划线，空白行保留）
    /// - Err: 文件不存在 / 格式不支持 / 解析失败
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格级清洗
pub trait DataCleaner {
    /// TRIM
    fn clean_text(&self, value: &str) -> String;

    /// 空白 → None，其余 TRIM
    fn normalize_null(&self, value: Option<&str>) -> Option<String>;

    /// 解析金额（允许千分位），空白 → None
    ///
    /// # 返回
    /// - Err(String): 面向用户的错误消息
    fn parse_amount(&self, value: Option<&str>) -> Result<Option<f64>, String>;

    /// 整行所有单元格均为空白
    fn is_blank_row(&self, row: &RawRow) -> bool;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 已通过校验的原始行 → BeneficiaryRow
pub trait FieldMapper {
    /// 映射并做类型转换
    ///
    /// # 参数
    /// - row: 原始行（已通过 RowValidator）
    /// - row_number: 行号（含表头偏移）
    /// - rules: 本批次的枚举规则（用于规范化拼写）
    ///
    /// # 返回
    /// - Err(Vec<String>): 类型转换失败消息（按 validation 记录）
    fn map_row(
        &self,
        row: &RawRow,
        row_number: usize,
        rules: &ValidationRules,
    ) -> Result<BeneficiaryRow, Vec<String>>;
}

// ==========================================
// DerivationService Trait
// ==========================================
// 用途: 字段派生（新建机构类型推断）
pub trait DerivationService {
    /// 由机构名称中的关键字推断机构类型
    fn infer_institution_type(&self, institution_name: &str) -> String;
}
