// ==========================================
// 助学金受益人记录 - 行校验器
// ==========================================
// 职责: 必填列校验 + 枚举列成员校验（大小写不敏感）
// 红线: 纯函数，无副作用；必填缺失时立即返回，不做枚举校验
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{columns, RawRow};
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// AllowedValues - 大小写不敏感的枚举集合
// ==========================================
// 每批次构建一次：小写键 → 配置中的原始拼写
#[derive(Debug, Clone)]
pub struct AllowedValues {
    canonical_by_key: HashMap<String, String>,
    configured: Vec<String>,
}

impl AllowedValues {
    pub fn new(values: &[String]) -> Self {
        let mut canonical_by_key = HashMap::with_capacity(values.len());
        let mut configured = Vec::with_capacity(values.len());

        for value in values {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            // 配置内大小写重复时保留第一次出现的拼写
            if !canonical_by_key.contains_key(&trimmed.to_lowercase()) {
                canonical_by_key.insert(trimmed.to_lowercase(), trimmed.to_string());
                configured.push(trimmed.to_string());
            }
        }

        Self {
            canonical_by_key,
            configured,
        }
    }

    /// 返回配置中的规范拼写
    pub fn canonical(&self, value: &str) -> Option<&str> {
        self.canonical_by_key
            .get(&value.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.canonical(value).is_some()
    }

    /// 用于错误消息的可读列表
    pub fn describe(&self) -> String {
        self.configured.join(", ")
    }
}

// ==========================================
// ValidationRules - 批次级校验规则
// ==========================================
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub record_types: AllowedValues,
    pub guardian_statuses: AllowedValues,
    pub institution_categories: AllowedValues,
}

impl ValidationRules {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            record_types: AllowedValues::new(&config.valid_record_types),
            guardian_statuses: AllowedValues::new(&config.valid_guardian_statuses),
            institution_categories: AllowedValues::new(&config.valid_institution_categories),
        }
    }
}

// ==========================================
// RowValidation - 校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValidation {
    Valid,
    Invalid(Vec<String>), // 非空、有序
}

impl RowValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, RowValidation::Valid)
    }
}

// ==========================================
// RowValidator
// ==========================================
pub struct RowValidator {
    rules: ValidationRules,
}

impl RowValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(ValidationRules::from_config(config))
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// 校验单行
    ///
    /// # 参数
    /// - row: 原始行
    /// - row_number: 行号（仅用于日志）
    pub fn validate(&self, row: &RawRow, row_number: usize) -> RowValidation {
        // 1. 必填列
        let missing: Vec<String> = columns::REQUIRED
            .iter()
            .filter(|column| value_of(row, column).is_none())
            .map(|column| format!("Missing required field: {}", column))
            .collect();

        if !missing.is_empty() {
            debug!(row_number, missing = missing.len(), "必填列缺失");
            return RowValidation::Invalid(missing);
        }

        // 2. 枚举列
        let mut errors = Vec::new();

        if let Some(record_type) = value_of(row, columns::TYPE) {
            if !self.rules.record_types.contains(record_type) {
                errors.push(format!(
                    "Invalid type '{}'. Allowed values: {}",
                    record_type,
                    self.rules.record_types.describe()
                ));
            }
        }

        if let Some(status) = value_of(row, columns::GUARDIAN_STATUS) {
            if !self.rules.guardian_statuses.contains(status) {
                errors.push(format!(
                    "Invalid guardian_status '{}'. Allowed values: {}",
                    status,
                    self.rules.guardian_statuses.describe()
                ));
            }
        }

        if errors.is_empty() {
            RowValidation::Valid
        } else {
            debug!(row_number, errors = errors.len(), "枚举列校验失败");
            RowValidation::Invalid(errors)
        }
    }
}

/// 取 TRIM 后的非空值
fn value_of<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    row.get(column)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_row() -> RawRow {
        [
            ("region", "Mbitini"),
            ("sub_region", "Katwala"),
            ("institution", "Mbitini Secondary"),
            ("type", "day"),
            ("admission_number", "S123"),
            ("guardian_status", "both"),
            ("guardian_phone", "0712345678"),
            ("guardian_id", "12345678"),
            ("amount", "5000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn validator() -> RowValidator {
        RowValidator::from_config(&ImportConfig::default())
    }

    #[test]
    fn test_valid_row() {
        assert_eq!(validator().validate(&valid_row(), 2), RowValidation::Valid);
    }

    #[test]
    fn test_enum_values_match_in_any_case() {
        let validator = validator();
        for (record_type, status) in [("DAY", "BOTH"), ("Boarding", "Single"), (" day ", "orphan")] {
            let mut row = valid_row();
            row.insert("type".to_string(), record_type.to_string());
            row.insert("guardian_status".to_string(), status.to_string());
            assert!(validator.validate(&row, 2).is_valid(), "{} / {}", record_type, status);
        }
    }

    #[test]
    fn test_missing_fields_one_message_each_and_no_enum_checks() {
        let mut row = valid_row();
        row.remove("region");
        row.insert("guardian_phone".to_string(), "   ".to_string());
        row.insert("type".to_string(), "invalid-type".to_string());

        match validator().validate(&row, 5) {
            RowValidation::Invalid(errors) => {
                assert_eq!(
                    errors,
                    vec![
                        "Missing required field: region".to_string(),
                        "Missing required field: guardian_phone".to_string(),
                    ]
                );
                assert!(errors.iter().all(|e| !e.contains("Invalid type")));
            }
            RowValidation::Valid => panic!("expected invalid row"),
        }
    }

    #[test]
    fn test_optional_columns_not_required() {
        let mut row = valid_row();
        row.remove("amount");
        row.insert("person_name".to_string(), "".to_string());
        row.insert("category".to_string(), "".to_string());
        assert!(validator().validate(&row, 2).is_valid());
    }

    #[test]
    fn test_invalid_type_names_allowed_values() {
        let mut row = valid_row();
        row.insert("type".to_string(), "invalid-type".to_string());

        match validator().validate(&row, 2) {
            RowValidation::Invalid(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("invalid-type"));
                assert!(errors[0].contains("day, boarding"));
            }
            RowValidation::Valid => panic!("expected invalid row"),
        }
    }

    #[test]
    fn test_both_enum_violations_reported_in_order() {
        let mut row = valid_row();
        row.insert("type".to_string(), "weekly".to_string());
        row.insert("guardian_status".to_string(), "unknown".to_string());

        match validator().validate(&row, 2) {
            RowValidation::Invalid(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].starts_with("Invalid type"));
                assert!(errors[1].starts_with("Invalid guardian_status"));
            }
            RowValidation::Valid => panic!("expected invalid row"),
        }
    }

    #[test]
    fn test_allowed_values_canonical_spelling() {
        let values = AllowedValues::new(&[
            "Day".to_string(),
            "DAY".to_string(),
            "boarding".to_string(),
            " ".to_string(),
        ]);

        assert_eq!(values.canonical("day"), Some("Day"));
        assert_eq!(values.canonical("BOARDING"), Some("boarding"));
        assert_eq!(values.canonical("weekly"), None);
        assert_eq!(values.describe(), "Day, boarding");
    }
}
