// ==========================================
// 助学金受益人记录 - 导入配置
// ==========================================
// 职责: 导入引擎消费的命名枚举（只读快照）
// 红线: 引擎只读，不修改配置
// ==========================================

use crate::domain::AreaNameMatching;
use serde::{Deserialize, Serialize};

// ==========================================
// 默认值
// ==========================================
pub const DEFAULT_RECORD_TYPES: [&str; 2] = ["day", "boarding"];
pub const DEFAULT_GUARDIAN_STATUSES: [&str; 4] = ["both", "single", "orphan", "none"];
pub const DEFAULT_INSTITUTION_CATEGORIES: [&str; 5] =
    ["national", "extra-county", "county", "sub-county", "private"];
pub const DEFAULT_INSTITUTION_TYPE: &str = "other";

// ==========================================
// ImportConfig - 导入配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// 合法记录类型（type 列）
    pub valid_record_types: Vec<String>,

    /// 合法监护状态（guardian_status 列）
    pub valid_guardian_statuses: Vec<String>,

    /// 合法机构类别（category 列，可空）
    pub valid_institution_categories: Vec<String>,

    /// 名称无法推断类型时的默认机构类型
    pub default_institution_type: String,

    /// 区域/子区域名称匹配模式
    pub area_name_matching: AreaNameMatching,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            valid_record_types: to_owned_list(&DEFAULT_RECORD_TYPES),
            valid_guardian_statuses: to_owned_list(&DEFAULT_GUARDIAN_STATUSES),
            valid_institution_categories: to_owned_list(&DEFAULT_INSTITUTION_CATEGORIES),
            default_institution_type: DEFAULT_INSTITUTION_TYPE.to_string(),
            area_name_matching: AreaNameMatching::default(),
        }
    }
}

impl ImportConfig {
    pub fn with_record_types<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_record_types = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_guardian_statuses<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_guardian_statuses = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_area_name_matching(mut self, matching: AreaNameMatching) -> Self {
        self.area_name_matching = matching;
        self
    }
}

pub(crate) fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
