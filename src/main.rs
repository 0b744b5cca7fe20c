// ==========================================
// 助学金受益人记录 - 命令行入口
// ==========================================
// 用法: bursary-import <file> [db_path]
// 输出: stdout 打印 JSON 格式的 ImportSummary；日志写 stderr
// 退出码: 0 = 批次完成（可含行级失败）；1 = 文件/配置/系统错误（已回滚）
// ==========================================

use anyhow::{bail, Context, Result};
use bursary_import::config::{ConfigManager, ImportConfigReader};
use bursary_import::db::default_db_path;
use bursary_import::importer::BeneficiaryImporter;
use bursary_import::logging;
use std::path::PathBuf;

fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let file_path = match args.next() {
        Some(path) => PathBuf::from(path),
        None => bail!("用法: {} <file> [db_path]", bursary_import::APP_NAME),
    };
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default_db_path);

    tracing::info!(
        version = bursary_import::VERSION,
        db_path = %db_path,
        file = %file_path.display(),
        "启动导入"
    );

    // 配置与导入共用同一连接
    let config_manager = ConfigManager::new(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    let config = config_manager
        .load_import_config()
        .context("加载导入配置失败")?;

    let importer = BeneficiaryImporter::new(config_manager.connection(), config);
    let summary = importer
        .import_file(&file_path)
        .with_context(|| format!("导入失败: {}", file_path.display()))?;

    let json = serde_json::to_string_pretty(&summary).context("摘要序列化失败")?;
    println!("{}", json);

    if summary.has_failures() {
        tracing::warn!(failed = summary.failed_count(), "存在行级失败，请查看 failures");
    }
    Ok(())
}
