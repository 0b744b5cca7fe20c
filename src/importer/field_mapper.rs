// ==========================================
// 助学金受益人记录 - 字段映射器实现
// ==========================================
// 职责: 原始行 → BeneficiaryRow（TRIM + 枚举规范拼写 + 金额解析）
// 前置: 行已通过 RowValidator（必填列非空、枚举合法）
// ==========================================

use crate::domain::{columns, BeneficiaryRow, RawRow};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::importer_trait::{DataCleaner as _, FieldMapper as FieldMapperTrait};
use crate::importer::row_validator::{AllowedValues, ValidationRules};
use tracing::warn;

pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    fn get_string(&self, row: &RawRow, key: &str) -> Option<String> {
        self.cleaner.normalize_null(row.get(key).map(String::as_str))
    }

    /// 必填列（已校验）；缺失时返回空串，由后续落库约束兜底
    fn get_required(&self, row: &RawRow, key: &str) -> String {
        row.get(key)
            .map(|v| self.cleaner.clean_text(v))
            .unwrap_or_default()
    }

    /// 枚举列取配置中的规范拼写
    fn get_enum(&self, row: &RawRow, key: &str, allowed: &AllowedValues) -> String {
        let value = self.get_required(row, key);
        allowed
            .canonical(&value)
            .map(str::to_string)
            .unwrap_or(value)
    }
}

impl FieldMapperTrait for FieldMapper {
    fn map_row(
        &self,
        row: &RawRow,
        row_number: usize,
        rules: &ValidationRules,
    ) -> Result<BeneficiaryRow, Vec<String>> {
        let amount = self
            .cleaner
            .parse_amount(row.get(columns::AMOUNT).map(String::as_str))
            .map_err(|message| vec![message])?;

        // 机构类别可空；无法识别时视为未指定
        let institution_category = match self.get_string(row, columns::CATEGORY) {
            None => None,
            Some(raw) => match rules.institution_categories.canonical(&raw) {
                Some(canonical) => Some(canonical.to_string()),
                None => {
                    warn!(
                        row_number,
                        category = %raw,
                        allowed = %rules.institution_categories.describe(),
                        "机构类别无法识别，按未指定处理"
                    );
                    None
                }
            },
        };

        Ok(BeneficiaryRow {
            region: self.get_required(row, columns::REGION),
            sub_region: self.get_required(row, columns::SUB_REGION),
            institution: self.get_required(row, columns::INSTITUTION),
            institution_category,
            record_type: self.get_enum(row, columns::TYPE, &rules.record_types),
            person_name: self.get_string(row, columns::PERSON_NAME),
            admission_number: self.get_required(row, columns::ADMISSION_NUMBER),
            guardian_status: self.get_enum(row, columns::GUARDIAN_STATUS, &rules.guardian_statuses),
            guardian_phone: self.get_required(row, columns::GUARDIAN_PHONE),
            guardian_id: self.get_required(row, columns::GUARDIAN_ID),
            amount,
            row_number,
        })
    }
}
