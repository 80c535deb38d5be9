// ==========================================
// 到岸成本定标系统 - 增强汇总表导出
// ==========================================
// 输入列保持原顺序；计算列插在语义锚点列之后（锚点缺失时追加到末尾）
// 每个供应商的 R2 FOB 列后紧跟到岸成本 + 四个节约列；R1 FOB 列不输出
// ==========================================

use crate::domain::cost_sheet::{ConsolidatedSheet, PartCostSheet, RankedBid};
use crate::domain::types::{fmt_opt, Round, SupplierId, UNAVAILABLE};
use crate::export::error::ExportResult;
use crate::importer::bid_sheet_importer::columns;
use crate::importer::parse_supplier_column;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

// ==========================================
// 零件级计算列
// ==========================================
struct PartColumn {
    header: &'static str,
    anchor: &'static str,
    value: fn(&PartCostSheet) -> String,
}

fn supplier_of(bid: &Option<RankedBid>) -> String {
    bid.as_ref()
        .map(|b| b.supplier.to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

fn value_of(bid: &Option<RankedBid>) -> String {
    fmt_opt(bid.as_ref().map(|b| b.value))
}

const PART_COLUMNS: &[PartColumn] = &[
    // 基准价（年用量之后）
    PartColumn { header: "Volume Band", anchor: columns::ANNUAL_VOLUME, value: |c| c.volume_band.map_or(UNAVAILABLE.to_string(), |b| b.label().to_string()) },
    PartColumn { header: "WAPP", anchor: columns::ANNUAL_VOLUME, value: |c| fmt_opt(c.benchmark) },
    PartColumn { header: "Most Common Supplier", anchor: columns::ANNUAL_VOLUME, value: |c| c.most_common_supplier.clone().unwrap_or_else(|| UNAVAILABLE.to_string()) },
    PartColumn { header: "Incumbent", anchor: columns::ANNUAL_VOLUME, value: |c| c.incumbent.as_ref().map_or(UNAVAILABLE.to_string(), |s| s.to_string()) },
    PartColumn { header: "Extended Cost", anchor: columns::ANNUAL_VOLUME, value: |c| fmt_opt(c.extended_cost) },
    PartColumn { header: "WAPP Landed Cost", anchor: columns::ANNUAL_VOLUME, value: |c| fmt_opt(c.benchmark_landed) },
    PartColumn { header: "Landed Extended Cost", anchor: columns::ANNUAL_VOLUME, value: |c| fmt_opt(c.landed_extended_cost) },
    // 最低价与节约（有效供应商之后）
    PartColumn { header: "Valid Supplier Count", anchor: columns::VALID_SUPPLIER, value: |c| c.valid_supplier_count.to_string() },
    PartColumn { header: "As-Is R1 Savings %", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.as_is.r1_pct) },
    PartColumn { header: "As-Is R1 Savings $", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.as_is.r1_usd) },
    PartColumn { header: "As-Is Final Savings %", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.as_is.final_pct) },
    PartColumn { header: "As-Is Final Savings $", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.as_is.final_usd) },
    PartColumn { header: "As-Is Final Landed Savings %", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.as_is.final_landed_pct) },
    PartColumn { header: "As-Is Final Landed Savings $", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.as_is.final_landed_usd) },
    PartColumn { header: "R1 Minimum Bid", anchor: columns::VALID_SUPPLIER, value: |c| value_of(&c.r1_min) },
    PartColumn { header: "R1 Minimum Bid Supplier", anchor: columns::VALID_SUPPLIER, value: |c| supplier_of(&c.r1_min) },
    PartColumn { header: "Final Minimum Bid", anchor: columns::VALID_SUPPLIER, value: |c| value_of(&c.fob.min) },
    PartColumn { header: "Final Minimum Bid Supplier", anchor: columns::VALID_SUPPLIER, value: |c| supplier_of(&c.fob.min) },
    PartColumn { header: "Second Lowest Bid", anchor: columns::VALID_SUPPLIER, value: |c| value_of(&c.fob.second) },
    PartColumn { header: "Second Lowest Bid Supplier", anchor: columns::VALID_SUPPLIER, value: |c| supplier_of(&c.fob.second) },
    PartColumn { header: "Cherry Pick Savings %", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.fob.savings_pct) },
    PartColumn { header: "Cherry Pick Savings $", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.fob.savings_usd) },
    PartColumn { header: "Awardable", anchor: columns::VALID_SUPPLIER, value: |c| c.fob.awardable().to_string() },
    PartColumn { header: "R2 Improved", anchor: columns::VALID_SUPPLIER, value: |c| c.r2_improved.to_string() },
    PartColumn { header: "Final Minimum Bid Landed", anchor: columns::VALID_SUPPLIER, value: |c| value_of(&c.landed.min) },
    PartColumn { header: "Final Minimum Bid Landed Supplier", anchor: columns::VALID_SUPPLIER, value: |c| supplier_of(&c.landed.min) },
    PartColumn { header: "Second Lowest Bid Landed", anchor: columns::VALID_SUPPLIER, value: |c| value_of(&c.landed.second) },
    PartColumn { header: "Second Lowest Bid Landed Supplier", anchor: columns::VALID_SUPPLIER, value: |c| supplier_of(&c.landed.second) },
    PartColumn { header: "Cherry Pick Landed Savings %", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.landed.savings_pct) },
    PartColumn { header: "Cherry Pick Landed Savings $", anchor: columns::VALID_SUPPLIER, value: |c| fmt_opt(c.landed.savings_usd) },
    PartColumn { header: "Awardable Landed", anchor: columns::VALID_SUPPLIER, value: |c| c.landed.awardable().to_string() },
];

/// 供应商派生列后缀（顺序固定）
const SUPPLIER_SUFFIXES: [&str; 5] = [
    "Landed Cost",
    "FOB Savings %",
    "FOB Savings $",
    "Landed Savings %",
    "Landed Savings $",
];

/// 输出列的来源
#[derive(Debug, Clone)]
enum OutputColumn {
    Input(usize),
    Part(usize),
    Supplier(SupplierId, usize),
}

// ==========================================
// ConsolidatedWriter
// ==========================================
pub struct ConsolidatedWriter;

impl Default for ConsolidatedWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolidatedWriter {
    pub fn new() -> Self {
        Self
    }

    /// 输出列布局
    fn layout(&self, headers: &[String]) -> Vec<(String, OutputColumn)> {
        let r2_suppliers: HashSet<SupplierId> = headers
            .iter()
            .filter_map(|h| parse_supplier_column(h))
            .filter(|(_, round)| *round == Round::R2)
            .map(|(s, _)| s)
            .collect();
        let anchors: HashSet<&str> = headers.iter().map(|h| h.trim()).collect();

        let mut layout = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            match parse_supplier_column(header) {
                // 只有 R1 列的供应商: 派生列放在原 R1 位置
                Some((supplier, Round::R1)) => {
                    if !r2_suppliers.contains(&supplier) {
                        self.push_supplier_columns(&mut layout, &supplier);
                    }
                }
                Some((supplier, Round::R2)) => {
                    layout.push((header.clone(), OutputColumn::Input(i)));
                    self.push_supplier_columns(&mut layout, &supplier);
                }
                None => {
                    layout.push((header.clone(), OutputColumn::Input(i)));
                    for (j, col) in PART_COLUMNS.iter().enumerate() {
                        if col.anchor == header.trim() {
                            layout.push((col.header.to_string(), OutputColumn::Part(j)));
                        }
                    }
                }
            }
        }

        // 锚点缺失的计算列追加到末尾
        for (j, col) in PART_COLUMNS.iter().enumerate() {
            if !anchors.contains(col.anchor) {
                layout.push((col.header.to_string(), OutputColumn::Part(j)));
            }
        }
        layout
    }

    fn push_supplier_columns(&self, layout: &mut Vec<(String, OutputColumn)>, supplier: &SupplierId) {
        for (k, suffix) in SUPPLIER_SUFFIXES.iter().enumerate() {
            layout.push((
                format!("{} - {}", supplier, suffix),
                OutputColumn::Supplier(supplier.clone(), k),
            ));
        }
    }

    fn supplier_cell(&self, cost: &PartCostSheet, supplier: &SupplierId, k: usize) -> String {
        let quote = match cost.quote(supplier) {
            Some(q) => q,
            None => return UNAVAILABLE.to_string(),
        };
        match k {
            0 => fmt_opt(quote.landed),
            1 => fmt_opt(quote.fob_savings_pct),
            2 => fmt_opt(quote.fob_savings_usd),
            3 => fmt_opt(quote.landed_savings_pct),
            _ => fmt_opt(quote.landed_savings_usd),
        }
    }

    /// 写出到任意 Writer
    pub fn write<W: Write>(&self, sheet: &ConsolidatedSheet, writer: W) -> ExportResult<usize> {
        let layout = self.layout(&sheet.bid_sheet.headers);
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(layout.iter().map(|(h, _)| h.as_str()))?;

        for (part, cost) in sheet.iter() {
            let record: Vec<String> = layout
                .iter()
                .map(|(_, column)| match column {
                    OutputColumn::Input(i) => part.raw.get(*i).cloned().unwrap_or_default(),
                    OutputColumn::Part(j) => (PART_COLUMNS[*j].value)(cost),
                    OutputColumn::Supplier(s, k) => self.supplier_cell(cost, s, *k),
                })
                .collect();
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(sheet.len())
    }

    #[instrument(skip(self, sheet), fields(parts = sheet.len()))]
    pub fn write_to_path(&self, sheet: &ConsolidatedSheet, path: &Path) -> ExportResult<usize> {
        let file = std::fs::File::create(path)?;
        let rows = self.write(sheet, file)?;
        info!(path = %path.display(), rows = rows, "增强汇总表已导出");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        vec![
            columns::ROW_ID.to_string(),
            columns::ANNUAL_VOLUME.to_string(),
            "Coda - R1 - Total Cost Per UOM FOB Port of Origin/Departure (USD)".to_string(),
            "Coda - R2 - Total Cost Per UOM FOB Port of Origin/Departure (USD)".to_string(),
            "Mayank - R1 - Total Cost Per UOM FOB Port of Origin/Departure (USD)".to_string(),
        ]
    }

    #[test]
    fn test_layout_inserts_after_anchors_and_drops_r1() {
        let layout = ConsolidatedWriter::new().layout(&headers());
        let names: Vec<&str> = layout.iter().map(|(h, _)| h.as_str()).collect();

        assert_eq!(names[0], columns::ROW_ID);
        assert_eq!(names[1], columns::ANNUAL_VOLUME);
        assert_eq!(names[2], "Volume Band");
        assert!(!names.iter().any(|h| h.starts_with("Coda - R1")));

        let r2 = names.iter().position(|h| h.starts_with("Coda - R2")).unwrap();
        assert_eq!(names[r2 + 1], "Coda - Landed Cost");
        assert_eq!(names[r2 + 5], "Coda - Landed Savings $");

        // 仅 R1 的供应商仍输出派生列
        assert!(names.contains(&"Mayank - Landed Cost"));

        // "Valid Supplier" 缺失 → 追加到末尾
        assert_eq!(*names.last().unwrap(), "Awardable Landed");
    }
}
