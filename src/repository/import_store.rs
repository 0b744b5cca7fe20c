// ==========================================
// 助学金受益人记录 - 导入存储 Trait
// ==========================================
// 职责: 定义导入引擎所需的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做按键查询与写入
// 说明: 全部为同步调用；事务边界由调用方（BeneficiaryImporter）掌握
// ==========================================

use crate::domain::{BeneficiaryFields, BeneficiaryRecord, DecisionState, ImportBatch, NewInstitution};
use crate::repository::error::RepositoryResult;

// ==========================================
// ImportStore Trait
// ==========================================
// 用途: 参照实体查找/创建 + 受益人记录 upsert + 批次审计
// 实现者: SqliteImportStore（rusqlite，借用连接或事务）
pub trait ImportStore {
    // ===== 区域 =====

    /// 按名称精确查找区域
    fn find_region_by_name(&self, name: &str) -> RepositoryResult<Option<i64>>;

    /// 按名称大小写不敏感查找区域（多条命中时取最早创建）
    fn find_region_by_name_ci(&self, name: &str) -> RepositoryResult<Option<i64>>;

    /// 创建区域，返回新 id
    fn insert_region(&self, name: &str) -> RepositoryResult<i64>;

    // ===== 子区域 =====

    /// 在指定区域内按名称精确查找子区域
    fn find_sub_region_by_name(&self, name: &str, region_id: i64) -> RepositoryResult<Option<i64>>;

    /// 在指定区域内按名称大小写不敏感查找子区域
    fn find_sub_region_by_name_ci(
        &self,
        name: &str,
        region_id: i64,
    ) -> RepositoryResult<Option<i64>>;

    /// 创建子区域，返回新 id
    fn insert_sub_region(&self, name: &str, region_id: i64) -> RepositoryResult<i64>;

    // ===== 机构 =====

    /// 按名称精确查找机构
    fn find_institution_by_name(&self, name: &str) -> RepositoryResult<Option<i64>>;

    /// 按名称大小写不敏感查找机构
    fn find_institution_by_name_ci(&self, name: &str) -> RepositoryResult<Option<i64>>;

    /// 机构编码是否已被占用
    fn institution_code_exists(&self, code: &str) -> RepositoryResult<bool>;

    /// 创建机构，返回新 id
    fn insert_institution(&self, institution: &NewInstitution) -> RepositoryResult<i64>;

    // ===== 受益人记录 =====

    /// 按自然键 (admission_number, institution_id) 查找
    fn find_beneficiary_by_key(
        &self,
        admission_number: &str,
        institution_id: i64,
    ) -> RepositoryResult<Option<BeneficiaryRecord>>;

    /// 新建受益人记录
    ///
    /// # 参数
    /// - fields: 导入可写字段
    /// - decision: 初始审批状态（导入路径恒为 Pending）
    fn insert_beneficiary(
        &self,
        fields: &BeneficiaryFields,
        decision: DecisionState,
    ) -> RepositoryResult<i64>;

    /// 原地更新受益人记录（不触碰 decision）
    fn update_beneficiary(&self, id: i64, fields: &BeneficiaryFields) -> RepositoryResult<()>;

    // ===== 批次审计 =====

    /// 写入批次审计记录
    fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;
}
