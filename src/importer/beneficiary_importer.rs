// ==========================================
// 助学金受益人记录 - 导入器门面
// ==========================================
// 职责: 持有共享连接与配置快照，为每个批次开启一个事务
// 流程: 解析文件 → 开启事务 → BatchCoordinator.run → 提交 / 回滚
// 红线: 一个批次一个事务；Systemic 错误整批回滚（含批次审计记录）
// ==========================================

use crate::config::ImportConfig;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::{ImportSummary, RawRow};
use crate::importer::batch_coordinator::BatchCoordinator;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::FileParser;
use crate::repository::{RepositoryError, SqliteImportStore};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, instrument, warn};

pub struct BeneficiaryImporter {
    conn: Arc<Mutex<Connection>>,
    config: ImportConfig,
}

impl BeneficiaryImporter {
    /// 从已有连接创建导入器
    ///
    /// # 参数
    /// - conn: 共享连接（调用方负责已执行 ensure_schema）
    /// - config: 导入配置快照（引擎只读）
    pub fn new(conn: Arc<Mutex<Connection>>, config: ImportConfig) -> Self {
        Self { conn, config }
    }

    /// 打开数据库文件并创建导入器
    pub fn open(db_path: &str, config: ImportConfig) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(RepositoryError::from)?;
        ensure_schema(&conn).map_err(RepositoryError::from)?;
        Ok(Self::new(Arc::new(Mutex::new(conn)), config))
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在单个事务内执行批次
    ///
    /// # 返回
    /// - Ok(T): 已提交
    /// - Err: 已回滚
    pub fn run_in_transaction<T, F>(&self, f: F) -> ImportResult<T>
    where
        F: FnOnce(&SqliteImportStore<'_>) -> ImportResult<T>,
    {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let store = SqliteImportStore::new(&tx);
        match f(&store) {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(error = %rollback_err, "事务回滚失败");
                }
                warn!(error = %e, "批次已回滚");
                Err(e)
            }
        }
    }

    /// 导入已解析的行
    ///
    /// # 参数
    /// - rows: 原始行（首个数据行对应文件第 2 行）
    /// - source_name: 来源名称（写入批次审计，可空）
    #[instrument(skip(self, rows), fields(total_rows = rows.len()))]
    pub fn import_rows(&self, rows: &[RawRow], source_name: Option<&str>) -> ImportResult<ImportSummary> {
        self.run_in_transaction(|store| BatchCoordinator::new(store, &self.config).run(rows, source_name))
    }

    /// 从文件导入（.csv / .xlsx / .xls）
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        let path = file_path.as_ref();

        let rows = UniversalFileParser.parse_to_raw_rows(path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;

        let source_name = path.file_name().and_then(|n| n.to_str());
        let summary = self.import_rows(&rows, source_name)?;

        info!(
            batch_id = %summary.batch_id,
            imported = summary.imported_count,
            skipped = summary.skipped_count,
            failed = summary.failed_count(),
            "文件导入完成"
        );
        Ok(summary)
    }
}
