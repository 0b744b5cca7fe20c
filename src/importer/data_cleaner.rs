// ==========================================
// 助学金受益人记录 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 金额解析 / 整行空白判定
// ==========================================

use crate::domain::RawRow;
use crate::importer::importer_trait::DataCleaner as DataCleanerTrait;

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn parse_amount(&self, value: Option<&str>) -> Result<Option<f64>, String> {
        let raw = match self.normalize_null(value) {
            Some(v) => v,
            None => return Ok(None),
        };

        // 千分位与内部空白（"5,000" / "5 000"）
        let compact: String = raw
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();

        let amount = compact
            .parse::<f64>()
            .map_err(|_| format!("Invalid amount '{}': expected a number", raw))?;

        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("Invalid amount '{}': must be zero or positive", raw));
        }

        Ok(Some(amount))
    }

    fn is_blank_row(&self, row: &RawRow) -> bool {
        row.values().all(|v| v.trim().is_empty())
    }
}
