// ==========================================
// 助学金受益人记录 - 领域类型定义
// ==========================================
// 职责: 审批状态 / 失败类别 / 区域名匹配模式
// 序列化格式: snake_case (与数据库、导入报告一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 审批状态 (Decision State)
// ==========================================
// 红线: 新建记录一律为 Pending；更新记录不回写 Pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionState {
    #[default]
    Pending,  // 待审批
    Approved, // 已批准
    Rejected, // 已驳回
    Awarded,  // 已发放
}

impl DecisionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionState::Pending => "pending",
            DecisionState::Approved => "approved",
            DecisionState::Rejected => "rejected",
            DecisionState::Awarded => "awarded",
        }
    }
}

impl fmt::Display for DecisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DecisionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(DecisionState::Pending),
            "approved" => Ok(DecisionState::Approved),
            "rejected" => Ok(DecisionState::Rejected),
            "awarded" => Ok(DecisionState::Awarded),
            other => Err(format!("未知审批状态: {}", other)),
        }
    }
}

// ==========================================
// 行失败类别 (Failure Category)
// ==========================================
// Validation: 业务规则不满足（可预期）
// Exception:  解析/落库时的意外错误（需运维关注）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Validation,
    Exception,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCategory::Validation => write!(f, "validation"),
            FailureCategory::Exception => write!(f, "exception"),
        }
    }
}

// ==========================================
// 区域名匹配模式 (Area Name Matching)
// ==========================================
// Exact:           仅精确匹配（大小写敏感，历史行为）
// CaseInsensitive: 精确匹配失败后按小写比较（与机构名一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaNameMatching {
    Exact,
    #[default]
    CaseInsensitive,
}

impl fmt::Display for AreaNameMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaNameMatching::Exact => write!(f, "EXACT"),
            AreaNameMatching::CaseInsensitive => write!(f, "CASE_INSENSITIVE"),
        }
    }
}

impl FromStr for AreaNameMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EXACT" => Ok(AreaNameMatching::Exact),
            "CASE_INSENSITIVE" => Ok(AreaNameMatching::CaseInsensitive),
            other => Err(format!("未知区域名匹配模式: {}", other)),
        }
    }
}
