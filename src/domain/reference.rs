// ==========================================
// 助学金受益人记录 - 参照实体
// ==========================================
// 实体: Region(区域) / SubRegion(子区域) / Institution(机构)
// 生命周期: 可由导入引擎隐式创建，之后被批次外的记录复用
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 名称大小写折叠（Unicode 小写）
///
/// 批次缓存键与 SQLite 中的 fold_name() 标量函数共用此实现，
/// 保证缓存与存储对「同名」的判定一致。
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

// ==========================================
// Region - 区域（一级行政区）
// ==========================================
// 唯一性: name（原样存储，不做大小写规范化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// SubRegion - 子区域（二级行政区）
// ==========================================
// 唯一性: (name, region_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRegion {
    pub id: i64,
    pub name: String,
    pub region_id: i64,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// Institution - 机构（学校/学院）
// ==========================================
// 唯一性: code（跨所有机构，包括批次前已存在的）
// 名称查找大小写不敏感，但按输入（TRIM 后）存储
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub category: Option<String>,    // 机构类别（配置枚举之一，可空）
    pub institution_type: String,    // 由名称关键字推断的类型
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// 待创建的机构（id 由存储分配）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInstitution {
    pub name: String,
    pub code: String,
    pub category: Option<String>,
    pub institution_type: String,
    pub active: bool,
}
