// ==========================================
// 到岸成本定标系统 - 基准价解析引擎
// ==========================================
// 职责: 零件 → 量价区间 → 基准价 (WAPP) + 最常用供应商 → 现供应商
// 红线: 无价格行或无平均订单量 → 基准不可用，不填 0
// ==========================================

use crate::config::BenchmarkConfig;
use crate::domain::part::{BidSheet, Part};
use crate::domain::reference::{BenchmarkPriceTable, BenchmarkRow, SupplierNameMap};
use crate::domain::types::{round4, SupplierId, VolumeBand};
use crate::importer::DataCleanerImpl;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// 单零件基准解析结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkResolution {
    pub volume_band: Option<VolumeBand>,
    pub price: Option<Decimal>,
    pub most_common_supplier: Option<String>,
    pub incumbent: Option<SupplierId>,
}

// ==========================================
// BenchmarkEngine
// ==========================================
pub struct BenchmarkEngine<'a> {
    prices: &'a BenchmarkPriceTable,
    names: &'a SupplierNameMap,
    date_mangled: HashSet<String>,
    excluded_incumbents: Vec<String>,
    cleaner: DataCleanerImpl,
}

impl<'a> BenchmarkEngine<'a> {
    pub fn new(
        prices: &'a BenchmarkPriceTable,
        names: &'a SupplierNameMap,
        config: &BenchmarkConfig,
    ) -> Self {
        Self {
            prices,
            names,
            date_mangled: config
                .date_mangled_part_ids
                .iter()
                .map(|id| id.trim().to_uppercase())
                .collect(),
            excluded_incumbents: config.excluded_incumbents.clone(),
            cleaner: DataCleanerImpl,
        }
    }

    /// 查价格行；被误转为日期的零件号先按 Excel 序列号查
    fn lookup_row(&self, part: &Part) -> Option<&'a BenchmarkRow> {
        let part_id = part.normalized_part_id();
        if self.date_mangled.contains(&part_id) {
            let serial_hit = self
                .cleaner
                .excel_serial(&part.part_number)
                .and_then(|serial| self.prices.get(&serial.to_string()));
            if serial_hit.is_some() {
                return serial_hit;
            }
        }
        self.prices.get(&part_id)
    }

    /// 解析单零件
    pub fn resolve(&self, part: &Part) -> BenchmarkResolution {
        let (row, quantity) = match (self.lookup_row(part), part.average_order_quantity) {
            (Some(row), Some(q)) => (row, q),
            _ => {
                debug!(row_id = %part.row_id, part = %part.part_number, "无基准价行或无平均订单量");
                return BenchmarkResolution::default();
            }
        };

        // 区间缺失或区间价缺失 → Raw WAPP
        let volume_band = VolumeBand::for_quantity(quantity);
        let price = volume_band
            .and_then(|band| row.bands.get(&band).copied())
            .or(row.raw)
            .map(round4);

        let most_common_supplier = row.most_common_supplier.clone();
        let incumbent = most_common_supplier
            .as_deref()
            .and_then(|name| self.names.normalize(name))
            .cloned();

        BenchmarkResolution {
            volume_band,
            price,
            most_common_supplier,
            incumbent,
        }
    }

    pub fn is_excluded_incumbent(&self, incumbent: Option<&SupplierId>) -> bool {
        incumbent.map_or(false, |inc| {
            self.excluded_incumbents
                .iter()
                .any(|e| e.trim() == inc.as_str())
        })
    }

    /// 剔除现供应商在排除名单中的零件，返回剔除数
    #[instrument(skip(self, sheet), fields(parts = sheet.parts.len()))]
    pub fn drop_excluded_incumbents(&self, sheet: &mut BidSheet) -> usize {
        let before = sheet.parts.len();
        sheet.retain_parts(|part| {
            let resolution = self.resolve(part);
            let excluded = self.is_excluded_incumbent(resolution.incumbent.as_ref());
            if excluded {
                debug!(row_id = %part.row_id, "现供应商在排除名单中，零件剔除");
            }
            !excluded
        });
        let dropped = before - sheet.parts.len();
        info!(dropped = dropped, "排除名单零件已剔除");
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn part(number: &str, aoq: Option<Decimal>) -> Part {
        Part {
            row_id: "1".to_string(),
            part_number: number.to_string(),
            division: "Midland".to_string(),
            metal_type: Some("Brass".to_string()),
            description: None,
            product_group: None,
            part_family: None,
            annual_volume: Some(dec!(1000)),
            average_order_quantity: aoq,
            valid_supplier_count: None,
            raw: vec![],
        }
    }

    fn prices() -> BenchmarkPriceTable {
        let mut table = BenchmarkPriceTable::new();
        let mut bands = HashMap::new();
        bands.insert(VolumeBand::B1To50, dec!(10.123456));
        table.insert(
            "P-1",
            BenchmarkRow {
                bands,
                raw: Some(dec!(9)),
                most_common_supplier: Some("CODA INC".to_string()),
            },
        );
        table.insert(
            "1862834",
            BenchmarkRow {
                bands: HashMap::new(),
                raw: Some(dec!(4)),
                most_common_supplier: Some("BUGATTI".to_string()),
            },
        );
        table
    }

    fn names() -> SupplierNameMap {
        let mut names = SupplierNameMap::new();
        names.insert("coda inc", "Coda");
        names.insert("bugatti", "Bugatti Group");
        names
    }

    #[test]
    fn test_band_price_and_incumbent() {
        let prices = prices();
        let names = names();
        let engine = BenchmarkEngine::new(&prices, &names, &BenchmarkConfig::default());

        let r = engine.resolve(&part(" p-1 ", Some(dec!(20))));
        assert_eq!(r.volume_band, Some(VolumeBand::B1To50));
        assert_eq!(r.price, Some(dec!(10.1235)));
        assert_eq!(r.incumbent, Some(SupplierId::from("Coda")));
    }

    #[test]
    fn test_missing_band_value_falls_back_to_raw() {
        let prices = prices();
        let names = names();
        let engine = BenchmarkEngine::new(&prices, &names, &BenchmarkConfig::default());

        let r = engine.resolve(&part("P-1", Some(dec!(300))));
        assert_eq!(r.price, Some(dec!(9)));
    }

    #[test]
    fn test_no_quantity_or_row_is_unavailable() {
        let prices = prices();
        let names = names();
        let engine = BenchmarkEngine::new(&prices, &names, &BenchmarkConfig::default());

        assert_eq!(engine.resolve(&part("P-1", None)), BenchmarkResolution::default());
        assert_eq!(engine.resolve(&part("P-404", Some(dec!(5)))).price, None);
    }

    #[test]
    fn test_date_mangled_part_uses_excel_serial() {
        let prices = prices();
        let names = names();
        let config = BenchmarkConfig {
            excluded_incumbents: vec!["Bugatti Group".to_string()],
            date_mangled_part_ids: vec!["7000-04-06".to_string()],
        };
        let engine = BenchmarkEngine::new(&prices, &names, &config);

        let r = engine.resolve(&part("7000-04-06", Some(dec!(10))));
        assert_eq!(r.price, Some(dec!(4)));
        assert!(engine.is_excluded_incumbent(r.incumbent.as_ref()));
    }
}
