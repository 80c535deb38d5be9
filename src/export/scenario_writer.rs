// ==========================================
// 到岸成本定标系统 - 定标方案导出
// ==========================================
// 方案表: 汇总指标块 → 空行 → 决策表（一行一个零件，授标顺序）
// 汇总表: 供应商 / 原产国 / 金属类型
// ==========================================

use crate::domain::cost_sheet::ConsolidatedSheet;
use crate::domain::decision::{AwardDecision, DecisionTable};
use crate::domain::reference::SupplierDirectory;
use crate::domain::types::{fmt_opt, UNAVAILABLE};
use crate::engine::aggregation::{GroupRollup, ScenarioAggregates, ScenarioSummary};
use crate::export::error::ExportResult;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

const DECISION_HEADERS: [&str; 21] = [
    "ROW ID #",
    "Division",
    "Part #",
    "Item Description",
    "Product Group",
    "Part Family",
    "Incumbent Supplier",
    "Selected Supplier",
    "Annual Volume (per UOM)",
    "Final FOB Quote",
    "FOB Savings %",
    "FOB Savings $",
    "Landed Savings %",
    "Landed Savings $",
    "Reason",
    "Landed Extended Cost",
    "Is Totally New Supplier",
    "Part Switched",
    "Redundant Suppliers (Product Group)",
    "Selected Supplier Country",
    "Award Bucket",
];

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

fn text(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(UNAVAILABLE)
        .to_string()
}

/// 汇总指标块（指标名, 值）
pub fn summary_rows(summary: &ScenarioSummary) -> Vec<(&'static str, String)> {
    vec![
        ("Total Landed Savings ($)", summary.total_landed_savings_usd.to_string()),
        ("Total FOB Savings ($)", summary.total_fob_savings_usd.to_string()),
        ("Landed Cost - Incumbent Retained", summary.incumbent_retained_landed_cost.to_string()),
        ("Landed Cost - Existing Suppliers", summary.existing_supplier_landed_cost.to_string()),
        ("Landed Cost - Totally New Suppliers", summary.net_new_supplier_landed_cost.to_string()),
        ("Parts - Incumbent Retained", summary.incumbent_retained_parts.to_string()),
        ("Parts - New Supplier", summary.new_supplier_parts.to_string()),
        ("Parts - Net New Supplier", summary.net_new_supplier_parts.to_string()),
        ("Parts - Not Awarded", summary.not_awarded_parts.to_string()),
        ("Totally New Suppliers", summary.totally_new_suppliers.to_string()),
        ("Unique Suppliers", summary.unique_suppliers.to_string()),
        ("Total Landed Cost Evaluated", summary.total_landed_cost_evaluated.to_string()),
        ("Total Cost Not Awarded", summary.total_cost_not_awarded.to_string()),
    ]
}

// ==========================================
// ScenarioWriter
// ==========================================
pub struct ScenarioWriter<'a> {
    sheet: &'a ConsolidatedSheet,
    aggregates: &'a ScenarioAggregates,
    directory: &'a SupplierDirectory,
}

impl<'a> ScenarioWriter<'a> {
    pub fn new(
        sheet: &'a ConsolidatedSheet,
        aggregates: &'a ScenarioAggregates,
        directory: &'a SupplierDirectory,
    ) -> Self {
        Self {
            sheet,
            aggregates,
            directory,
        }
    }

    fn decision_record(&self, decision: &AwardDecision) -> Vec<String> {
        let part = self.sheet.part(&decision.row_id);
        let a = &decision.assignment;
        let selected = a
            .selected
            .as_ref()
            .map_or(UNAVAILABLE.to_string(), |s| s.to_string());

        let mut record = vec![
            decision.row_id.clone(),
            text(part.map(|p| p.division.as_str())),
            text(part.map(|p| p.part_number.as_str())),
            text(part.and_then(|p| p.description.as_deref())),
            text(part.and_then(|p| p.product_group.as_deref())),
            text(part.and_then(|p| p.part_family.as_deref())),
            decision
                .incumbent
                .as_ref()
                .map_or(UNAVAILABLE.to_string(), |s| s.to_string()),
            selected,
            fmt_opt(part.and_then(|p| p.annual_volume)),
            fmt_opt(a.fob_quote),
            fmt_opt(a.fob_savings_pct),
            fmt_opt(a.fob_savings_usd),
            fmt_opt(a.landed_savings_pct),
            fmt_opt(a.landed_savings_usd),
            a.reason.clone(),
            fmt_opt(a.landed_extended_cost),
            yes_no(a.selected.is_some() && a.is_totally_new),
            yes_no(a.selected.is_some() && a.part_switched),
            self.aggregates
                .redundant_for(part.and_then(|p| p.product_group.as_deref()))
                .to_string(),
            self.aggregates.country_of(&decision.row_id).to_string(),
            a.bucket.to_string(),
        ];

        // 选定供应商的元数据
        for column in &self.directory.columns {
            record.push(match &a.selected {
                Some(s) => self.directory.value(s, column),
                None => UNAVAILABLE.to_string(),
            });
        }
        record
    }

    /// 写出到任意 Writer
    pub fn write<W: Write>(&self, table: &DecisionTable, writer: W) -> ExportResult<usize> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);

        // 1. 汇总块
        wtr.write_record(["Metric", "Value"])?;
        for (metric, value) in summary_rows(&self.aggregates.summary) {
            wtr.write_record([metric, value.as_str()])?;
        }
        wtr.write_record([""])?;

        // 2. 决策表
        let mut headers: Vec<&str> = DECISION_HEADERS.to_vec();
        headers.extend(self.directory.columns.iter().map(String::as_str));
        wtr.write_record(&headers)?;

        let decisions = table.iter_in_sequence();
        for decision in &decisions {
            wtr.write_record(self.decision_record(decision))?;
        }
        wtr.flush()?;
        Ok(decisions.len())
    }

    #[instrument(skip(self, table), fields(decisions = table.len()))]
    pub fn write_to_path(&self, table: &DecisionTable, path: &Path) -> ExportResult<usize> {
        let file = std::fs::File::create(path)?;
        let rows = self.write(table, file)?;
        info!(path = %path.display(), rows = rows, "定标方案已导出");
        Ok(rows)
    }
}

// ==========================================
// 汇总表
// ==========================================
pub struct RollupWriter;

impl Default for RollupWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RollupWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_suppliers<W: Write>(&self, aggregates: &ScenarioAggregates, writer: W) -> ExportResult<usize> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "Supplier",
            "Parts",
            "Annual Volume",
            "Landed Extended Cost",
            "FOB Savings $",
            "Landed Savings $",
            "Totally New Supplier",
        ])?;
        for row in &aggregates.suppliers {
            wtr.write_record([
                row.supplier.to_string(),
                row.parts.to_string(),
                row.annual_volume.to_string(),
                row.landed_extended_cost.to_string(),
                row.fob_savings_usd.to_string(),
                row.landed_savings_usd.to_string(),
                yes_no(row.totally_new),
            ])?;
        }
        wtr.flush()?;
        Ok(aggregates.suppliers.len())
    }

    pub fn write_groups<W: Write>(&self, key_header: &str, rows: &[GroupRollup], writer: W) -> ExportResult<usize> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            key_header,
            "Parts",
            "Suppliers",
            "Annual Volume",
            "Landed Extended Cost",
            "Landed Savings $",
        ])?;
        for row in rows {
            wtr.write_record([
                row.key.clone(),
                row.parts.to_string(),
                row.suppliers.to_string(),
                row.annual_volume.to_string(),
                row.landed_extended_cost.to_string(),
                row.landed_savings_usd.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(rows.len())
    }

    pub fn write_all(
        &self,
        aggregates: &ScenarioAggregates,
        suppliers: &Path,
        countries: &Path,
        metals: &Path,
    ) -> ExportResult<()> {
        self.write_suppliers(aggregates, std::fs::File::create(suppliers)?)?;
        self.write_groups("Country", &aggregates.countries, std::fs::File::create(countries)?)?;
        self.write_groups("Metal Type", &aggregates.metals, std::fs::File::create(metals)?)?;
        info!(
            suppliers = aggregates.suppliers.len(),
            countries = aggregates.countries.len(),
            metals = aggregates.metals.len(),
            "汇总表已导出"
        );
        Ok(())
    }
}
