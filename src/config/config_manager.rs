// ==========================================
// 助学金受益人记录 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (scope_id='global')；列表类配置以 JSON 数组存储
// ==========================================

use crate::config::import_config::{
    to_owned_list, DEFAULT_GUARDIAN_STATUSES, DEFAULT_INSTITUTION_CATEGORIES,
    DEFAULT_INSTITUTION_TYPE, DEFAULT_RECORD_TYPES,
};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::AreaNameMatching;
use crate::importer::error::{ImportError, ImportResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const VALID_RECORD_TYPES: &str = "import/valid_record_types";
    pub const VALID_GUARDIAN_STATUSES: &str = "import/valid_guardian_statuses";
    pub const VALID_INSTITUTION_CATEGORIES: &str = "import/valid_institution_categories";
    pub const DEFAULT_INSTITUTION_TYPE: &str = "import/default_institution_type";
    pub const AREA_NAME_MATCHING: &str = "import/area_name_matching";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| read_error("<open>", e))?;
        ensure_schema(&conn).map_err(|e| read_error("<schema>", e))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = lock(&conn)?;
            configure_sqlite_connection(&guard).map_err(|e| read_error("<pragma>", e))?;
            ensure_schema(&guard).map_err(|e| read_error("<schema>", e))?;
        }

        Ok(Self { conn })
    }

    /// 共享底层连接（导入器与配置读取共用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = lock(&self.conn)?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| read_error(key, e))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = lock(&self.conn)?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )
        .map_err(|e| read_error(key, e))?;

        debug!(key = key, "配置已写入");
        Ok(())
    }

    /// 写入列表类配置（序列化为 JSON 数组）
    pub fn set_global_list(&self, key: &str, values: &[&str]) -> ImportResult<()> {
        let json = serde_json::to_string(values).map_err(|e| ImportError::ConfigValueError {
            key: key.to_string(),
            value: format!("{:?}", values),
            message: e.to_string(),
        })?;
        self.set_global_config_value(key, &json)
    }

    /// 读取列表类配置，缺省时返回默认值
    fn get_list_or_default(&self, key: &str, default: &[&str]) -> ImportResult<Vec<String>> {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(to_owned_list(default)),
        };

        let values: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| ImportError::ConfigValueError {
                key: key.to_string(),
                value: raw.clone(),
                message: e.to_string(),
            })?;

        let values: Vec<String> = values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        if values.is_empty() {
            return Err(ImportError::ConfigValueError {
                key: key.to_string(),
                value: raw,
                message: "枚举列表不能为空".to_string(),
            });
        }

        Ok(values)
    }
}

impl ImportConfigReader for ConfigManager {
    fn get_valid_record_types(&self) -> ImportResult<Vec<String>> {
        self.get_list_or_default(config_keys::VALID_RECORD_TYPES, &DEFAULT_RECORD_TYPES)
    }

    fn get_valid_guardian_statuses(&self) -> ImportResult<Vec<String>> {
        self.get_list_or_default(
            config_keys::VALID_GUARDIAN_STATUSES,
            &DEFAULT_GUARDIAN_STATUSES,
        )
    }

    fn get_valid_institution_categories(&self) -> ImportResult<Vec<String>> {
        self.get_list_or_default(
            config_keys::VALID_INSTITUTION_CATEGORIES,
            &DEFAULT_INSTITUTION_CATEGORIES,
        )
    }

    fn get_default_institution_type(&self) -> ImportResult<String> {
        Ok(self
            .get_global_config_value(config_keys::DEFAULT_INSTITUTION_TYPE)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_INSTITUTION_TYPE.to_string()))
    }

    fn get_area_name_matching(&self) -> ImportResult<AreaNameMatching> {
        match self.get_global_config_value(config_keys::AREA_NAME_MATCHING)? {
            None => Ok(AreaNameMatching::default()),
            Some(raw) => raw
                .parse::<AreaNameMatching>()
                .map_err(|message| ImportError::ConfigValueError {
                    key: config_keys::AREA_NAME_MATCHING.to_string(),
                    value: raw,
                    message,
                }),
        }
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> ImportResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| ImportError::ConfigReadError {
        key: "<lock>".to_string(),
        message: format!("锁获取失败: {}", e),
    })
}

fn read_error(key: &str, err: rusqlite::Error) -> ImportError {
    ImportError::ConfigReadError {
        key: key.to_string(),
        message: err.to_string(),
    }
}
