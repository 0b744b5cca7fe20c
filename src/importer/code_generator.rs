// ==========================================
// 助学金受益人记录 - 机构编码生成器
// ==========================================
// 规则:
// 1. 去除非字母数字字符，按空白分词
// 2. 每个词取前 3 个字母（大写，数字不计入）拼接，达到 10 位即停止，截断到 10 位
// 3. 不足 3 位时回退为 INST + 3 位随机数
// 4. 与已有编码冲突时追加递增数字后缀（截短基础编码腾出位置）后重试
// ==========================================
// 并发: 先查后写，仅在单写者（批次串行执行）前提下唯一；
//       并发批次需依赖 institution.code 唯一约束 + 冲突重试
// ==========================================

use crate::repository::{ImportStore, RepositoryError, RepositoryResult};
use rand::Rng;
use tracing::debug;

/// 编码最大长度
pub const MAX_CODE_LEN: usize = 10;

/// 基础编码最小长度（不足时回退）
pub const MIN_CODE_LEN: usize = 3;

/// 回退编码前缀
pub const FALLBACK_PREFIX: &str = "INST";

/// 唯一性重试上限
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1_000;

pub struct InstitutionCodeGenerator {
    max_attempts: u32,
}

impl Default for InstitutionCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl InstitutionCodeGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// 由名称派生基础编码（不检查唯一性）
    ///
    /// # 返回
    /// - None: 有效字母不足 3 位（空名称 / 纯数字名称）
    pub fn base_code(name: &str) -> Option<String> {
        let cleaned: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
            .collect();

        let mut code = String::with_capacity(MAX_CODE_LEN + 2);
        for word in cleaned.split_whitespace() {
            code.extend(
                word.chars()
                    .filter(char::is_ascii_alphabetic)
                    .take(3)
                    .map(|c| c.to_ascii_uppercase()),
            );
            if code.len() >= MAX_CODE_LEN {
                break;
            }
        }
        code.truncate(MAX_CODE_LEN);

        if code.len() < MIN_CODE_LEN {
            None
        } else {
            Some(code)
        }
    }

    fn fallback_code() -> String {
        let suffix: u32 = rand::thread_rng().gen_range(100..1000);
        format!("{}{}", FALLBACK_PREFIX, suffix)
    }

    /// 生成在当前存储中唯一的编码
    ///
    /// # 返回
    /// - Ok(String): 长度 ≤ 10 且未被占用
    /// - Err: 存储错误，或超过重试上限（BusinessRuleViolation，行级）
    pub fn generate<S>(&self, store: &S, institution_name: &str) -> RepositoryResult<String>
    where
        S: ImportStore + ?Sized,
    {
        let base = Self::base_code(institution_name).unwrap_or_else(Self::fallback_code);

        let mut candidate = base.clone();
        let mut suffix: u32 = 0;

        while store.institution_code_exists(&candidate)? {
            suffix += 1;
            if suffix > self.max_attempts {
                return Err(RepositoryError::BusinessRuleViolation(format!(
                    "无法为机构 '{}' 生成唯一编码（已尝试 {} 次）",
                    institution_name, self.max_attempts
                )));
            }

            let suffix_text = suffix.to_string();
            let keep = MAX_CODE_LEN
                .saturating_sub(suffix_text.len())
                .min(base.len());
            candidate = format!("{}{}", &base[..keep], suffix_text);
        }

        debug!(institution = institution_name, code = %candidate, attempts = suffix, "机构编码已生成");
        Ok(candidate)
    }
}
