// ==========================================
// 助学金受益人记录 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls，首个工作表) / CSV (.csv)
// 表头: 规范化为小写下划线键，再经别名表映射到标准列名
// 红线: 空白行保留（由协调器计为 skipped，保证行号与文件对齐）
// ==========================================

use crate::domain::{columns, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// 表头别名 → 标准列名
const HEADER_ALIASES: [(&str, &str); 12] = [
    ("admission_no", columns::ADMISSION_NUMBER),
    ("adm_no", columns::ADMISSION_NUMBER),
    ("school", columns::INSTITUTION),
    ("institution_name", columns::INSTITUTION),
    ("ward", columns::SUB_REGION),
    ("location", columns::REGION),
    ("name", columns::PERSON_NAME),
    ("student_name", columns::PERSON_NAME),
    ("status", columns::GUARDIAN_STATUS),
    ("phone", columns::GUARDIAN_PHONE),
    ("id_number", columns::GUARDIAN_ID),
    ("bursary_amount", columns::AMOUNT),
];

/// 规范化表头单元格
///
/// "Sub Region" → "sub_region"；"Admission No." → "admission_number"
pub fn normalize_header(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    HEADER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(key)
}

/// 按表头组装原始行；缺失单元格补空串，空表头列丢弃
fn build_row<I>(headers: &[String], cells: I) -> RawRow
where
    I: IntoIterator<Item = String>,
{
    let mut row: RawRow = headers
        .iter()
        .filter(|h| !h.is_empty())
        .map(|h| (h.clone(), String::new()))
        .collect();

    for (header, value) in headers.iter().zip(cells) {
        if header.is_empty() {
            continue;
        }
        row.insert(header.clone(), value);
    }
    row
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
        debug!(headers = ?headers, "CSV 表头已规范化");

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(build_row(&headers, record.iter().map(str::to_string)));
        }

        info!(file = %file_path.display(), rows = rows.len(), "CSV 解析完成");
        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut sheet_rows = range.rows();
        let header_row = sheet_rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| normalize_header(&cell.to_string()))
            .collect();
        debug!(sheet = %sheet_name, headers = ?headers, "Excel 表头已规范化");

        let rows: Vec<RawRow> = sheet_rows
            .map(|cells| build_row(&headers, cells.iter().map(|cell| cell.to_string())))
            .collect();

        info!(file = %file_path.display(), sheet = %sheet_name, rows = rows.len(), "Excel 解析完成");
        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse_to_raw_rows(file_path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_rows(file_path),
            other => {
                ensure_exists(file_path)?;
                Err(ImportError::UnsupportedFormat(other.to_string()))
            }
        }
    }
}
