// ==========================================
// 到岸成本定标系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: 有序原始表（保留表头顺序，供增强表回写）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

// ==========================================
// RawTable - 有序原始表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// 表名（文件名，用于错误信息）
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// 按列名查找列号（精确匹配，忽略首尾空白）
    pub fn column_index(&self, column: &str) -> Option<usize> {
        let column = column.trim();
        self.headers.iter().position(|h| h.trim() == column)
    }

    /// 必需列
    pub fn require_column(&self, column: &str) -> ImportResult<usize> {
        self.column_index(column)
            .ok_or_else(|| ImportError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// 取单元格（越界视为空串）
    pub fn cell<'a>(&self, row: &'a [String], index: usize) -> &'a str {
        row.get(index).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn table_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// 单元格解码: UTF-8 优先，失败时按 ISO-8859-1 逐字节解码
fn decode_cell(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim().to_string(),
        Err(_) => bytes
            .iter()
            .map(|&b| b as char)
            .collect::<String>()
            .trim()
            .to_string(),
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_table(&self, file_path: &Path, skip_rows: usize) -> ImportResult<RawTable> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        // 打开 CSV 文件（表头自行处理，便于跳过前置行）
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut records = reader.byte_records().skip(skip_rows);

        // 读取表头
        let header_record = match records.next() {
            Some(result) => result?,
            None => return Err(ImportError::EmptyTable(table_name(path))),
        };
        let headers: Vec<String> = header_record
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = decode_cell(h);
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h
                }
            })
            .collect();

        // 读取所有行
        let mut rows = Vec::new();
        for result in records {
            let record = result?;
            let row: Vec<String> = record.iter().map(decode_cell).collect();

            // 跳过完全空白的行
            if row.iter().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(row);
        }

        debug!(file = %path.display(), rows = rows.len(), "CSV 解析完成");
        Ok(RawTable::new(table_name(path), headers, rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_table(&self, file_path: &Path, skip_rows: usize) -> ImportResult<RawTable> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // 打开 Excel 文件
        let mut workbook = open_workbook_auto(path)?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（跳过前置行）
        let mut sheet_rows = range.rows().skip(skip_rows);
        let header_row = sheet_rows
            .next()
            .ok_or_else(|| ImportError::EmptyTable(table_name(path)))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        // 读取数据行
        let mut rows = Vec::new();
        for data_row in sheet_rows {
            let row: Vec<String> = data_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();

            // 跳过完全空白的行
            if row.iter().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(row);
        }

        debug!(file = %path.display(), sheet = %sheet_name, rows = rows.len(), "Excel 解析完成");
        Ok(RawTable::new(table_name(path), headers, rows))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P, skip_rows: usize) -> ImportResult<RawTable> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_table(path, skip_rows),
            "xlsx" | "xls" => ExcelParser.parse_table(path, skip_rows),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
