// ==========================================
// 助学金受益人记录 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建表入口 ensure_schema（幂等）
// ==========================================

use crate::domain::fold_name;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 名称折叠标量函数名（大小写不敏感查找使用）
pub const FOLD_NAME_FN: &str = "fold_name";

/// 配置 SQLite 连接的统一 PRAGMA 与自定义函数
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
/// - fold_name() 需要“每个连接”单独注册（SQLite 内置 lower() 只折叠 ASCII）
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    conn.create_scalar_function(
        FOLD_NAME_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let name: String = ctx.get(0)?;
            Ok(fold_name(&name))
        },
    )?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 说明：
/// - (admission_number, institution_id) 只建普通索引，唯一性由导入引擎「先查后写」保证
/// - institution.code 为唯一约束，作为编码生成器的最后防线
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
          version INTEGER PRIMARY KEY,
          applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
          scope_id TEXT NOT NULL,
          key TEXT NOT NULL,
          value TEXT NOT NULL,
          updated_at TEXT NOT NULL DEFAULT (datetime('now')),
          PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS region (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL UNIQUE,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sub_region (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          region_id INTEGER NOT NULL REFERENCES region(id),
          created_at TEXT NOT NULL,
          UNIQUE(name, region_id)
        );

        CREATE TABLE IF NOT EXISTS institution (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          code TEXT NOT NULL UNIQUE,
          category TEXT,
          institution_type TEXT NOT NULL,
          active INTEGER NOT NULL DEFAULT 1,
          created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_institution_name
          ON institution(name);

        CREATE TABLE IF NOT EXISTS beneficiary_record (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          region_id INTEGER NOT NULL REFERENCES region(id),
          sub_region_id INTEGER NOT NULL REFERENCES sub_region(id),
          institution_id INTEGER NOT NULL REFERENCES institution(id),
          record_type TEXT NOT NULL,
          person_name TEXT,
          admission_number TEXT NOT NULL,
          guardian_status TEXT NOT NULL,
          guardian_phone TEXT NOT NULL,
          guardian_id TEXT NOT NULL,
          amount REAL,
          decision TEXT NOT NULL DEFAULT 'pending'
            CHECK (decision IN ('pending', 'approved', 'rejected', 'awarded')),
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_beneficiary_natural_key
          ON beneficiary_record(admission_number, institution_id);

        CREATE TABLE IF NOT EXISTS import_batch (
          batch_id TEXT PRIMARY KEY,
          source_name TEXT,
          total_rows INTEGER NOT NULL,
          imported_rows INTEGER NOT NULL,
          skipped_rows INTEGER NOT NULL,
          failed_rows INTEGER NOT NULL,
          created_institutions INTEGER NOT NULL,
          imported_at TEXT NOT NULL,
          elapsed_ms INTEGER NOT NULL,
          summary_json TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "BURSARY_IMPORT_DB_PATH";

/// 默认数据库文件名
pub const DEFAULT_DB_FILE: &str = "bursary_import.db";

/// 默认数据库路径
///
/// 优先级: BURSARY_IMPORT_DB_PATH > 用户数据目录 > 当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(DEFAULT_DB_FILE);
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("bursary-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DEFAULT_DB_FILE);
        }
    }

    path.to_string_lossy().to_string()
}
