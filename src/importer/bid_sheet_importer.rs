// ==========================================
// 到岸成本定标系统 - 汇总报价表导入器
// ==========================================
// 输入: 一行一个零件的宽表，每个供应商两列（R1/R2）FOB 报价
// 输出: BidSheet（map[RowId][SupplierId] → BidRecord）
// 红线: 供应商身份来自列名一次性解析，之后不再按列名匹配
// ==========================================

use crate::domain::part::{BidRecord, BidSheet, Part};
use crate::domain::reference::PartOverrides;
use crate::domain::types::{Round, SupplierId};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{RawTable, UniversalFileParser};
use crate::importer::importer_trait::DataCleaner as _;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 列名常量
// ==========================================
pub mod columns {
    pub const ROW_ID: &str = "ROW ID #";
    pub const PART_NUMBER: &str = "Part #";
    pub const DIVISION: &str = "Division";
    pub const METAL_TYPE: &str = "type";
    pub const DESCRIPTION: &str = "Item Description";
    pub const PRODUCT_GROUP: &str = "Product Group";
    pub const PART_FAMILY: &str = "Part Family";
    pub const ANNUAL_VOLUME: &str = "Annual Volume (per UOM)";
    pub const AVERAGE_ORDER_QUANTITY: &str = "Average Order Quantity (per UOM)";
    pub const VALID_SUPPLIER: &str = "Valid Supplier";

    /// 供应商报价列后缀
    pub const FOB_SUFFIX: &str = " - Total Cost Per UOM FOB Port of Origin/Departure (USD)";
}

/// 解析供应商报价列名 "{supplier} - R{1|2} - Total Cost Per UOM FOB ..."
pub fn parse_supplier_column(header: &str) -> Option<(SupplierId, Round)> {
    let head = header.trim().strip_suffix(columns::FOB_SUFFIX)?;
    let (supplier, round) = head.rsplit_once(" - ")?;
    let round = match round.trim() {
        "R1" => Round::R1,
        "R2" => Round::R2,
        _ => return None,
    };
    let supplier = supplier.trim();
    if supplier.is_empty() {
        return None;
    }
    Some((SupplierId::new(supplier), round))
}

/// 供应商报价列名（输出用）
pub fn supplier_column(supplier: &SupplierId, round: Round) -> String {
    format!("{} - {}{}", supplier, round, columns::FOB_SUFFIX)
}

// ==========================================
// BidSheetImporter
// ==========================================
pub struct BidSheetImporter {
    cleaner: DataCleaner,
}

impl Default for BidSheetImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl BidSheetImporter {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 从文件导入
    #[instrument(skip(self, path), fields(file = %path.as_ref().display()))]
    pub fn import<P: AsRef<Path>>(&self, path: P) -> ImportResult<BidSheet> {
        let table = UniversalFileParser.parse(path.as_ref(), 0)?;
        self.from_table(table)
    }

    /// 从原始表构建 BidSheet
    pub fn from_table(&self, table: RawTable) -> ImportResult<BidSheet> {
        let row_id_idx = table.require_column(columns::ROW_ID)?;
        let part_idx = table.require_column(columns::PART_NUMBER)?;
        let division_idx = table.require_column(columns::DIVISION)?;
        let metal_idx = table.column_index(columns::METAL_TYPE);
        let description_idx = table.column_index(columns::DESCRIPTION);
        let group_idx = table.column_index(columns::PRODUCT_GROUP);
        let family_idx = table.column_index(columns::PART_FAMILY);
        let volume_idx = table.column_index(columns::ANNUAL_VOLUME);
        let aoq_idx = table.column_index(columns::AVERAGE_ORDER_QUANTITY);
        let valid_idx = table.column_index(columns::VALID_SUPPLIER);

        // 供应商列（表头顺序）
        let mut suppliers: Vec<SupplierId> = Vec::new();
        let mut bid_columns: Vec<(usize, SupplierId, Round)> = Vec::new();
        for (idx, header) in table.headers.iter().enumerate() {
            if let Some((supplier, round)) = parse_supplier_column(header) {
                if !suppliers.contains(&supplier) {
                    suppliers.push(supplier.clone());
                }
                bid_columns.push((idx, supplier, round));
            }
        }
        info!(
            suppliers = suppliers.len(),
            bid_columns = bid_columns.len(),
            "识别供应商报价列"
        );

        let text = |row: &[String], idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| self.cleaner.normalize_null(row.get(i).map(|s| s.as_str())))
        };

        let mut sheet = BidSheet::new(table.headers.clone(), suppliers);
        let mut seen: HashSet<String> = HashSet::new();
        let mut skipped = 0usize;

        for (line, row) in table.rows.iter().enumerate() {
            let row_id = self.cleaner.clean_text(table.cell(row, row_id_idx), false);
            if row_id.is_empty() {
                warn!(line = line + 2, "零件行缺少 ROW ID，跳过");
                skipped += 1;
                continue;
            }
            if !seen.insert(row_id.clone()) {
                warn!(row_id = %row_id, "ROW ID 重复，保留首行");
                skipped += 1;
                continue;
            }

            let part = Part {
                row_id: row_id.clone(),
                part_number: self.cleaner.clean_text(table.cell(row, part_idx), false),
                division: self.cleaner.clean_text(table.cell(row, division_idx), false),
                metal_type: text(row, metal_idx),
                description: text(row, description_idx),
                product_group: text(row, group_idx),
                part_family: text(row, family_idx),
                annual_volume: volume_idx
                    .and_then(|i| self.cleaner.parse_decimal(row.get(i).map(|s| s.as_str()))),
                average_order_quantity: aoq_idx
                    .and_then(|i| self.cleaner.parse_decimal(row.get(i).map(|s| s.as_str()))),
                valid_supplier_count: valid_idx
                    .and_then(|i| self.cleaner.parse_count(row.get(i).map(|s| s.as_str()))),
                raw: row.clone(),
            };

            let mut bids: HashMap<SupplierId, BidRecord> = HashMap::new();
            for (idx, supplier, round) in &bid_columns {
                let value = self.cleaner.parse_decimal(row.get(*idx).map(|s| s.as_str()));
                let record = bids.entry(supplier.clone()).or_default();
                match round {
                    Round::R1 => record.r1 = value,
                    Round::R2 => record.r2 = value,
                }
            }
            bids.retain(|_, b| b.r1.is_some() || b.r2.is_some());

            sheet.push_part(part, bids);
        }

        info!(
            parts = sheet.parts.len(),
            skipped = skipped,
            "汇总报价表导入完成"
        );
        Ok(sheet)
    }

    /// 应用零件号/材质覆写（在任何查表之前）
    pub fn apply_overrides(&self, sheet: &mut BidSheet, overrides: &PartOverrides) {
        let part_col = sheet
            .headers
            .iter()
            .position(|h| h.trim() == columns::PART_NUMBER);
        let metal_col = sheet
            .headers
            .iter()
            .position(|h| h.trim() == columns::METAL_TYPE);

        let mut applied = 0usize;
        for part in sheet.parts.iter_mut() {
            if let Some(number) = overrides.part_numbers.get(&part.row_id) {
                part.part_number = number.clone();
                if let Some(cell) = part_col.and_then(|i| part.raw.get_mut(i)) {
                    *cell = number.clone();
                }
                applied += 1;
            }
            if let Some(material) = overrides.materials.get(&part.row_id) {
                part.metal_type = Some(material.clone());
                if let Some(cell) = metal_col.and_then(|i| part.raw.get_mut(i)) {
                    *cell = material.clone();
                }
                applied += 1;
            }
        }
        debug!(applied = applied, "零件覆写已应用");
    }
}
