// ==========================================
// 到岸成本定标系统 - 导入 Trait
// ==========================================
// 职责: 定义文件解析/数据清洗接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::file_parser::RawTable;
use rust_decimal::Decimal;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为有序原始表
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - skip_rows: 表头之前需要跳过的行数
    ///
    /// # 返回
    /// - Ok(RawTable): 表头（输入顺序） + 数据行（已跳过全空行）
    /// - Err: 文件不存在 / 格式不支持 / 解析失败
    fn parse_table(&self, file_path: &Path, skip_rows: usize) -> ImportResult<RawTable>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗接口
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// 清洗文本（TRIM，可选 UPPER）
    fn clean_text(&self, value: &str, uppercase: bool) -> String;

    /// NULL 标准化（空白 / "-" / "nan" → None）
    fn normalize_null(&self, value: Option<&str>) -> Option<String>;

    /// 数值解析（非数值 → None，不报错）
    fn parse_decimal(&self, value: Option<&str>) -> Option<Decimal>;
}
