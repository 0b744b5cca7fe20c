// ==========================================
// 助学金受益人记录 - 字段派生服务
// ==========================================
// 职责: 新建机构时由名称关键字推断机构类型
// 规则: 按关键字顺序首个命中即返回（大小写不敏感子串匹配），否则取配置默认值
// ==========================================

use crate::importer::importer_trait::DerivationService as DerivationServiceTrait;

/// 机构类型关键字（顺序即优先级）
pub const INSTITUTION_TYPE_KEYWORDS: [&str; 6] = [
    "university",
    "college",
    "secondary",
    "primary",
    "vocational",
    "polytechnic",
];

pub struct DerivationService {
    default_institution_type: String,
}

impl DerivationService {
    pub fn new(default_institution_type: impl Into<String>) -> Self {
        Self {
            default_institution_type: default_institution_type.into(),
        }
    }
}

impl DerivationServiceTrait for DerivationService {
    fn infer_institution_type(&self, institution_name: &str) -> String {
        let lowered = institution_name.to_lowercase();

        INSTITUTION_TYPE_KEYWORDS
            .iter()
            .find(|keyword| lowered.contains(*keyword))
            .map(|keyword| keyword.to_string())
            .unwrap_or_else(|| self.default_institution_type.clone())
    }
}
