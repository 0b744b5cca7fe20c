// ==========================================
// 助学金受益人记录 - 参照实体解析器
// ==========================================
// 职责: 自由文本 → 区域 / 子区域 / 机构 id（不存在则创建）
// 缓存: 批次级（随解析器实例创建与销毁），同键重复解析不再访问存储
// 红线: 已存在的机构不被修改（类别不回填）
// ==========================================

use crate::domain::{fold_name, AreaNameMatching, CreatedInstitution, NewInstitution};
use crate::importer::code_generator::InstitutionCodeGenerator;
use crate::importer::derivation::DerivationService;
use crate::importer::importer_trait::DerivationService as _;
use crate::repository::{ImportStore, RepositoryError, RepositoryResult};
use std::collections::HashMap;
use tracing::{debug, info};

/// 批次内解析统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub cache_hits: usize,
    pub regions_created: usize,
    pub sub_regions_created: usize,
    pub institutions_created: usize,
}

pub struct ReferenceResolver<'s, S: ImportStore + ?Sized> {
    store: &'s S,
    area_matching: AreaNameMatching,
    code_generator: InstitutionCodeGenerator,
    derivation: DerivationService,

    // 批次级缓存
    region_cache: HashMap<String, i64>,
    sub_region_cache: HashMap<(String, i64), i64>,
    institution_cache: HashMap<String, i64>,

    created_institutions: Vec<CreatedInstitution>,
    stats: ResolverStats,
}

impl<'s, S: ImportStore + ?Sized> ReferenceResolver<'s, S> {
    pub fn new(
        store: &'s S,
        area_matching: AreaNameMatching,
        code_generator: InstitutionCodeGenerator,
        derivation: DerivationService,
    ) -> Self {
        Self {
            store,
            area_matching,
            code_generator,
            derivation,
            region_cache: HashMap::new(),
            sub_region_cache: HashMap::new(),
            institution_cache: HashMap::new(),
            created_institutions: Vec::new(),
            stats: ResolverStats::default(),
        }
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// 本批次新建的机构（按创建顺序）
    pub fn created_institutions(&self) -> &[CreatedInstitution] {
        &self.created_institutions
    }

    pub fn into_created_institutions(self) -> Vec<CreatedInstitution> {
        self.created_institutions
    }

    fn area_key(&self, name: &str) -> String {
        match self.area_matching {
            AreaNameMatching::Exact => name.to_string(),
            AreaNameMatching::CaseInsensitive => fold_name(name),
        }
    }

    /// 解析区域
    pub fn resolve_region(&mut self, name: &str) -> RepositoryResult<i64> {
        let name = non_empty(name, "region")?;
        let key = self.area_key(name);

        if let Some(&id) = self.region_cache.get(&key) {
            self.stats.cache_hits += 1;
            debug!(region = name, region_id = id, "区域缓存命中");
            return Ok(id);
        }

        let existing = match self.store.find_region_by_name(name)? {
            Some(id) => Some(id),
            None if self.area_matching == AreaNameMatching::CaseInsensitive => {
                self.store.find_region_by_name_ci(name)?
            }
            None => None,
        };

        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.store.insert_region(name)?;
                self.stats.regions_created += 1;
                info!(region = name, region_id = id, "新建区域");
                id
            }
        };

        self.region_cache.insert(key, id);
        Ok(id)
    }

    /// 解析子区域（按所属区域限定）
    pub fn resolve_sub_region(&mut self, name: &str, region_id: i64) -> RepositoryResult<i64> {
        let name = non_empty(name, "sub_region")?;
        let key = (self.area_key(name), region_id);

        if let Some(&id) = self.sub_region_cache.get(&key) {
            self.stats.cache_hits += 1;
            debug!(sub_region = name, region_id, sub_region_id = id, "子区域缓存命中");
            return Ok(id);
        }

        let existing = match self.store.find_sub_region_by_name(name, region_id)? {
            Some(id) => Some(id),
            None if self.area_matching == AreaNameMatching::CaseInsensitive => {
                self.store.find_sub_region_by_name_ci(name, region_id)?
            }
            None => None,
        };

        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.store.insert_sub_region(name, region_id)?;
                self.stats.sub_regions_created += 1;
                info!(sub_region = name, region_id, sub_region_id = id, "新建子区域");
                id
            }
        };

        self.sub_region_cache.insert(key, id);
        Ok(id)
    }

    /// 解析机构
    ///
    /// # 流程
    /// 1. 精确名称匹配
    /// 2. 大小写不敏感匹配
    /// 3. 新建（生成编码 + 推断类型 + active=true + 提供的类别）
    pub fn resolve_institution(
        &mut self,
        name: &str,
        category: Option<&str>,
    ) -> RepositoryResult<i64> {
        let name = non_empty(name, "institution")?;
        let key = fold_name(name);

        if let Some(&id) = self.institution_cache.get(&key) {
            self.stats.cache_hits += 1;
            debug!(institution = name, institution_id = id, "机构缓存命中");
            return Ok(id);
        }

        let existing = match self.store.find_institution_by_name(name)? {
            Some(id) => Some(id),
            None => self.store.find_institution_by_name_ci(name)?,
        };

        let id = match existing {
            Some(id) => id,
            None => self.create_institution(name, category)?,
        };

        self.institution_cache.insert(key, id);
        Ok(id)
    }

    fn create_institution(&mut self, name: &str, category: Option<&str>) -> RepositoryResult<i64> {
        let code = self.code_generator.generate(self.store, name)?;
        let institution_type = self.derivation.infer_institution_type(name);
        let category = category.map(str::to_string);

        let id = self.store.insert_institution(&NewInstitution {
            name: name.to_string(),
            code: code.clone(),
            category: category.clone(),
            institution_type: institution_type.clone(),
            active: true,
        })?;

        self.stats.institutions_created += 1;
        info!(
            institution = name,
            institution_id = id,
            code = %code,
            institution_type = %institution_type,
            category = category.as_deref().unwrap_or(CreatedInstitution::UNSPECIFIED_CATEGORY),
            "新建机构"
        );

        self.created_institutions
            .push(CreatedInstitution::new(name.to_string(), id, category));
        Ok(id)
    }
}

fn non_empty<'a>(value: &'a str, field: &str) -> RepositoryResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::ValidationError(format!("{} 名称为空", field)));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};
    use crate::repository::SqliteImportStore;
    use rusqlite::Connection;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn resolver<'s>(
        store: &'s SqliteImportStore<'s>,
        matching: AreaNameMatching,
    ) -> ReferenceResolver<'s, SqliteImportStore<'s>> {
        ReferenceResolver::new(
            store,
            matching,
            InstitutionCodeGenerator::default(),
            DerivationService::new("other"),
        )
    }

    #[test]
    fn test_region_resolved_once_then_cached() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);
        let mut resolver = resolver(&store, AreaNameMatching::CaseInsensitive);

        let first = resolver.resolve_region("Mbitini").unwrap();
        let second = resolver.resolve_region("  Mbitini ").unwrap();

        assert_eq!(first, second);
        assert_eq!(resolver.stats().regions_created, 1);
        assert_eq!(resolver.stats().cache_hits, 1);
        assert_eq!(store.count_regions().unwrap(), 1);
    }

    #[test]
    fn test_region_case_handling_per_mode() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);

        let mut ci = resolver(&store, AreaNameMatching::CaseInsensitive);
        let a = ci.resolve_region("Mbitini").unwrap();
        let b = ci.resolve_region("MBITINI").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.count_regions().unwrap(), 1);

        // 历史行为：大小写不同视为不同区域
        let mut exact = resolver(&store, AreaNameMatching::Exact);
        let c = exact.resolve_region("mbitini").unwrap();
        assert_ne!(a, c);
        assert_eq!(store.count_regions().unwrap(), 2);
    }

    #[test]
    fn test_sub_region_scoped_by_region_id() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);
        let mut resolver = resolver(&store, AreaNameMatching::CaseInsensitive);

        let r1 = resolver.resolve_region("Mbitini").unwrap();
        let r2 = resolver.resolve_region("Kwa Vonza").unwrap();

        let s1 = resolver.resolve_sub_region("Katwala", r1).unwrap();
        let s2 = resolver.resolve_sub_region("Katwala", r2).unwrap();
        let s1_again = resolver.resolve_sub_region("Katwala", r1).unwrap();

        assert_ne!(s1, s2);
        assert_eq!(s1, s1_again);
        assert_eq!(store.count_sub_regions().unwrap(), 2);
    }

    #[test]
    fn test_institution_case_insensitive_match_does_not_duplicate() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);
        let existing = store
            .insert_institution(&NewInstitution {
                name: "Mbitini Secondary".to_string(),
                code: "MBISEC".to_string(),
                category: None,
                institution_type: "secondary".to_string(),
                active: true,
            })
            .unwrap();

        let mut resolver = resolver(&store, AreaNameMatching::CaseInsensitive);
        let id = resolver
            .resolve_institution("MBITINI secondary", Some("county"))
            .unwrap();

        assert_eq!(id, existing);
        assert!(resolver.created_institutions().is_empty());
        assert_eq!(store.count_institutions().unwrap(), 1);

        // 已存在机构不回填类别
        let institution = store.find_institution(existing).unwrap().unwrap();
        assert_eq!(institution.category, None);
    }

    #[test]
    fn test_new_institution_fields_and_audit() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);
        let mut resolver = resolver(&store, AreaNameMatching::CaseInsensitive);

        let id = resolver
            .resolve_institution(" Mbitini Secondary ", Some("county"))
            .unwrap();
        let again = resolver.resolve_institution("mbitini secondary", None).unwrap();
        assert_eq!(id, again);

        let institution = store.find_institution(id).unwrap().unwrap();
        assert_eq!(institution.name, "Mbitini Secondary");
        assert_eq!(institution.code, "MBISEC");
        assert_eq!(institution.institution_type, "secondary");
        assert_eq!(institution.category.as_deref(), Some("county"));
        assert!(institution.active);

        let created = resolver.into_created_institutions();
        assert_eq!(created, vec![CreatedInstitution::new("Mbitini Secondary".to_string(), id, Some("county".to_string()))]);
    }

    #[test]
    fn test_new_institution_code_avoids_existing_codes() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);
        store
            .insert_institution(&NewInstitution {
                name: "Mbiti Secular Academy".to_string(),
                code: "MBISEC".to_string(),
                category: None,
                institution_type: "other".to_string(),
                active: true,
            })
            .unwrap();

        let mut resolver = resolver(&store, AreaNameMatching::CaseInsensitive);
        let id = resolver.resolve_institution("Mbitini Secondary", None).unwrap();

        let institution = store.find_institution(id).unwrap().unwrap();
        assert_eq!(institution.code, "MBISEC1");
    }

    #[test]
    fn test_blank_name_is_row_level_error() {
        let conn = setup_conn();
        let store = SqliteImportStore::new(&conn);
        let mut resolver = resolver(&store, AreaNameMatching::CaseInsensitive);

        let err = resolver.resolve_region("   ").unwrap_err();
        assert!(!err.is_systemic());
    }
}
