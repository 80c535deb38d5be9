// ==========================================
// 到岸成本定标系统 - 导入层
// ==========================================
// 职责: 外部表格导入，生成内部数据（BidSheet / ReferenceData）
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod bid_sheet_importer;
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod importer_trait;
pub mod reference_importer;

// 重导出核心类型
pub use bid_sheet_importer::{parse_supplier_column, supplier_column, BidSheetImporter};
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, RawTable, UniversalFileParser};
pub use reference_importer::ReferenceImporter;

// 重导出 Trait 接口
pub use importer_trait::{DataCleaner, FileParser};
