// ==========================================
// 到岸成本定标系统 - 成本汇总引擎
// ==========================================
// 职责: 阶段 1（逐零件/逐供应商成本）+ 阶段 2（最低价/次低价）
// 输入: BidSheet + ReferenceData
// 输出: ConsolidatedSheet
// 红线: 单行失败只影响该行，批次不中断
// ==========================================

use crate::config::{BenchmarkConfig, ResolverConfig};
use crate::domain::cost_sheet::{AsIsSavings, ConsolidatedSheet, PartCostSheet, SupplierQuote};
use crate::domain::part::{BidSheet, Part};
use crate::domain::reference::ReferenceData;
use crate::domain::types::{Awardable, Round, SupplierId};
use crate::engine::benchmark::BenchmarkEngine;
use crate::engine::landed_cost::LandedCostCalculator;
use crate::engine::resolver::{ReferenceResolver, TariffPolicy};
use crate::engine::savings::SavingsCalculator;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

/// 汇总统计（日志用）
#[derive(Debug, Clone, Copy, Default)]
struct ConsolidationStats {
    quotes: usize,
    unavailable: usize,
    tariff_defaulted: usize,
    no_benchmark: usize,
}

// ==========================================
// Consolidator
// ==========================================
pub struct Consolidator<'a> {
    resolver: ReferenceResolver<'a>,
    benchmark: BenchmarkEngine<'a>,
    landed: LandedCostCalculator,
    savings: SavingsCalculator,
}

impl<'a> Consolidator<'a> {
    pub fn new(
        data: &'a ReferenceData,
        resolver_config: &'a ResolverConfig,
        benchmark_config: &BenchmarkConfig,
    ) -> Self {
        Self {
            resolver: ReferenceResolver::new(data, resolver_config),
            benchmark: BenchmarkEngine::new(
                &data.benchmark_prices,
                &data.supplier_names,
                benchmark_config,
            ),
            landed: LandedCostCalculator::new(),
            savings: SavingsCalculator::new(),
        }
    }

    pub fn benchmark_engine(&self) -> &BenchmarkEngine<'a> {
        &self.benchmark
    }

    /// 汇总整张报价表
    #[instrument(skip(self, sheet), fields(parts = sheet.parts.len(), suppliers = sheet.suppliers.len()))]
    pub fn consolidate(&self, sheet: BidSheet) -> ConsolidatedSheet {
        let mut stats = ConsolidationStats::default();
        let rows: Vec<PartCostSheet> = sheet
            .parts
            .iter()
            .map(|part| self.consolidate_part(&sheet, part, &mut stats))
            .collect();

        info!(
            parts = rows.len(),
            quotes = stats.quotes,
            unavailable = stats.unavailable,
            no_benchmark = stats.no_benchmark,
            "成本汇总完成"
        );
        if stats.tariff_defaulted > 0 {
            warn!(count = stats.tariff_defaulted, "关税缺失按 0 处理，需人工复核");
        }
        ConsolidatedSheet::new(sheet, rows)
    }

    fn consolidate_part(
        &self,
        sheet: &BidSheet,
        part: &Part,
        stats: &mut ConsolidationStats,
    ) -> PartCostSheet {
        let bench = self.benchmark.resolve(part);
        if bench.price.is_none() {
            stats.no_benchmark += 1;
        }

        let valid_supplier_count = part
            .valid_supplier_count
            .unwrap_or_else(|| sheet.bidding_supplier_count(&part.row_id));

        let extended_cost = self.landed.extended(part.annual_volume, bench.price);

        // 基准到岸: 基准价走现供应商自身的运费/关税画像
        let benchmark_landed = bench.incumbent.as_ref().and_then(|inc| {
            match self.resolver.resolve_benchmark(part, inc, TariffPolicy::DefaultToZero) {
                Ok(resolution) => self.landed.landed_cost(bench.price, &resolution),
                Err(e) => {
                    debug!(row_id = %part.row_id, incumbent = %inc, error = %e, "基准到岸成本不可用");
                    None
                }
            }
        });
        let landed_extended_cost = self.landed.extended(part.annual_volume, benchmark_landed);

        let has_baseline =
            bench.price.map_or(false, |b| b > Decimal::ZERO) && valid_supplier_count > 0;

        // 阶段 1: 逐供应商
        let mut quotes = Vec::new();
        for (supplier, bid) in sheet.bids_for(&part.row_id) {
            let (round, fob) = match bid.effective() {
                Some(e) => e,
                None => continue,
            };
            stats.quotes += 1;

            let resolution = self
                .resolver
                .resolve(part, supplier, TariffPolicy::DefaultToZero);
            let (port, country, landed, tariff_defaulted) = match &resolution {
                Ok(r) => (
                    Some(r.port.clone()),
                    Some(r.country.clone()),
                    self.landed.landed_cost(Some(fob), r),
                    r.tariff_defaulted,
                ),
                Err(e) => {
                    stats.unavailable += 1;
                    debug!(row_id = %part.row_id, supplier = %supplier, error = %e, "到岸成本不可用");
                    (
                        self.resolver
                            .port_of(&part.row_id, supplier)
                            .map(str::to_string),
                        self.resolver
                            .country_of(&part.row_id, supplier)
                            .map(str::to_string),
                        None,
                        false,
                    )
                }
            };
            if tariff_defaulted {
                stats.tariff_defaulted += 1;
                debug!(row_id = %part.row_id, supplier = %supplier, "关税缺失按 0 处理");
            }

            let r1_r2_delta_pct = self.savings.pct(bid.round(Round::R1), bid.round(Round::R2));
            let r1_r2_delta_usd = self.savings.usd(r1_r2_delta_pct, extended_cost);
            let (fob_savings_pct, fob_savings_usd) =
                self.savings
                    .savings(has_baseline, bench.price, Some(fob), extended_cost);
            let (landed_savings_pct, landed_savings_usd) = self.savings.savings(
                has_baseline,
                benchmark_landed,
                landed,
                landed_extended_cost,
            );

            quotes.push(SupplierQuote {
                supplier: supplier.clone(),
                round,
                fob,
                r1: bid.round(Round::R1),
                port,
                country,
                landed,
                tariff_defaulted,
                r1_r2_delta_pct,
                r1_r2_delta_usd,
                fob_savings_pct,
                fob_savings_usd,
                landed_savings_pct,
                landed_savings_usd,
            });
        }

        // 阶段 2: 最低价/次低价
        let r1_ranked = self.savings.rank_bids(
            quotes
                .iter()
                .filter_map(|q| q.r1.map(|v| (q.supplier.clone(), v))),
        );
        let fob_ranked = self
            .savings
            .rank_bids(quotes.iter().map(|q| (q.supplier.clone(), q.fob)));
        let landed_ranked = self.savings.rank_bids(
            quotes
                .iter()
                .filter_map(|q| q.landed.map(|v| (q.supplier.clone(), v))),
        );

        let fob = self
            .savings
            .cherry_pick(&fob_ranked, has_baseline, bench.price, extended_cost);
        let landed = self.savings.cherry_pick(
            &landed_ranked,
            has_baseline,
            benchmark_landed,
            landed_extended_cost,
        );
        let r1_min = r1_ranked.into_iter().next();

        let r2_improved = match (&fob.min, &r1_min) {
            (Some(final_min), Some(r1)) if has_baseline => {
                if final_min.value < r1.value {
                    Awardable::Yes
                } else {
                    Awardable::No
                }
            }
            _ => Awardable::NoBaseline,
        };

        let as_is = self.as_is(
            sheet,
            part,
            bench.incumbent.as_ref(),
            &quotes,
            has_baseline,
            bench.price,
            extended_cost,
            benchmark_landed,
            landed_extended_cost,
        );

        PartCostSheet {
            row_id: part.row_id.clone(),
            division: part.division.clone(),
            metal_type: part.metal_type.clone(),
            annual_volume: part.annual_volume,
            volume_band: bench.volume_band,
            benchmark: bench.price,
            most_common_supplier: bench.most_common_supplier,
            incumbent: bench.incumbent,
            benchmark_landed,
            extended_cost,
            landed_extended_cost,
            valid_supplier_count,
            as_is,
            r1_min,
            fob,
            r2_improved,
            landed,
            quotes,
        }
    }

    /// 现供应商"维持现状"节约
    #[allow(clippy::too_many_arguments)]
    fn as_is(
        &self,
        sheet: &BidSheet,
        part: &Part,
        incumbent: Option<&SupplierId>,
        quotes: &[SupplierQuote],
        has_baseline: bool,
        benchmark: Option<Decimal>,
        extended_cost: Option<Decimal>,
        benchmark_landed: Option<Decimal>,
        landed_extended_cost: Option<Decimal>,
    ) -> AsIsSavings {
        let inc = match incumbent {
            Some(inc) if has_baseline => inc,
            _ => return AsIsSavings::default(),
        };
        let r1 = sheet
            .bid(&part.row_id, inc)
            .and_then(|b| b.round(Round::R1));
        let quote = quotes.iter().find(|q| &q.supplier == inc);

        let (r1_pct, r1_usd) = self.savings.savings(true, benchmark, r1, extended_cost);
        let (final_pct, final_usd) =
            self.savings
                .savings(true, benchmark, quote.map(|q| q.fob), extended_cost);
        let (final_landed_pct, final_landed_usd) = self.savings.savings(
            true,
            benchmark_landed,
            quote.and_then(|q| q.landed),
            landed_extended_cost,
        );

        AsIsSavings {
            r1_pct,
            r1_usd,
            final_pct,
            final_usd,
            final_landed_pct,
            final_landed_usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::part::BidRecord;
    use crate::domain::reference::{BenchmarkRow, PortCountryMap, TariffEntry};
    use crate::domain::types::VolumeBand;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn part(row_id: &str, number: &str, division: &str) -> Part {
        Part {
            row_id: row_id.to_string(),
            part_number: number.to_string(),
            division: division.to_string(),
            metal_type: Some("Brass".to_string()),
            description: None,
            product_group: None,
            part_family: None,
            annual_volume: Some(dec!(100)),
            average_order_quantity: Some(dec!(10)),
            valid_supplier_count: None,
            raw: vec![],
        }
    }

    fn reference() -> ReferenceData {
        let mut data = ReferenceData::default();
        for row in ["1", "2"] {
            data.supplier_ports.insert(row, SupplierId::from("Coda"), "NINGBO");
            data.supplier_ports.insert(row, SupplierId::from("Mayank"), "MUMBAI");
        }
        data.port_countries = PortCountryMap::from_pairs([("NINGBO", "China"), ("MUMBAI", "India")]);
        data.freight.insert("NINGBO", "Midland", dec!(0.05));
        data.freight.insert("MUMBAI", "Midland", dec!(0.10));
        data.tariffs.insert_part(
            "1",
            "China",
            "Brass",
            TariffEntry {
                tariff_rate: dec!(0.10),
                metal_tariff: Decimal::ZERO,
            },
        );
        data.tariffs.insert_part(
            "1",
            "India",
            "Brass",
            TariffEntry {
                tariff_rate: dec!(0.02),
                metal_tariff: Decimal::ZERO,
            },
        );
        let mut bands = HashMap::new();
        bands.insert(VolumeBand::B1To50, dec!(10));
        data.benchmark_prices.insert(
            "P-1",
            BenchmarkRow {
                bands,
                raw: None,
                most_common_supplier: Some("CODA INC".to_string()),
            },
        );
        data.supplier_names.insert("coda inc", "Coda");
        data
    }

    fn sheet() -> BidSheet {
        let mut sheet = BidSheet::new(
            vec![],
            vec![SupplierId::from("Coda"), SupplierId::from("Mayank")],
        );
        let mut bids = HashMap::new();
        bids.insert(SupplierId::from("Coda"), BidRecord::new(Some(dec!(10)), Some(dec!(9))));
        bids.insert(SupplierId::from("Mayank"), BidRecord::new(Some(dec!(8)), None));
        sheet.push_part(part("1", "P-1", "Midland"), bids);

        let mut bids = HashMap::new();
        bids.insert(SupplierId::from("Coda"), BidRecord::new(Some(dec!(5)), None));
        sheet.push_part(part("2", "P-404", "Midland"), bids);
        sheet
    }

    #[test]
    fn test_consolidate_costs_and_min_bids() {
        let data = reference();
        let resolver = ResolverConfig::default();
        let consolidated = Consolidator::new(&data, &resolver, &BenchmarkConfig::default())
            .consolidate(sheet());
        let row = consolidated.get("1").unwrap();

        // 基准到岸 = 10 × (0.05 + 0.10 + 0.03)
        assert_eq!(row.benchmark, Some(dec!(10)));
        assert_eq!(row.benchmark_landed, Some(dec!(1.8)));
        assert_eq!(row.extended_cost, Some(dec!(1000)));
        assert_eq!(row.valid_supplier_count, 2);

        let coda = row.quote(&SupplierId::from("Coda")).unwrap();
        assert_eq!(coda.round, Round::R2);
        assert_eq!(coda.landed, Some(dec!(1.62)));
        assert_eq!(coda.r1_r2_delta_pct, Some(dec!(0.1)));
        assert_eq!(coda.fob_savings_pct, Some(dec!(0.1)));
        assert_eq!(coda.fob_savings_usd, Some(dec!(100)));

        // Mayank: 8 × (0.10 + 0.02 + 0.03) = 1.2
        let mayank = row.quote(&SupplierId::from("Mayank")).unwrap();
        assert_eq!(mayank.landed, Some(dec!(1.2)));

        assert_eq!(row.fob.min.as_ref().unwrap().supplier.as_str(), "Mayank");
        assert_eq!(row.landed.min.as_ref().unwrap().supplier.as_str(), "Mayank");
        assert_eq!(row.landed.second.as_ref().unwrap().supplier.as_str(), "Coda");
        assert_eq!(row.landed.awardable(), Awardable::Yes);
        assert_eq!(row.r2_improved, Awardable::No);

        assert_eq!(row.as_is.r1_pct, Some(Decimal::ZERO));
        assert_eq!(row.as_is.final_landed_pct, Some(dec!(0.1)));
    }

    #[test]
    fn test_missing_benchmark_leaves_every_savings_unavailable() {
        let data = reference();
        let resolver = ResolverConfig::default();
        let consolidated = Consolidator::new(&data, &resolver, &BenchmarkConfig::default())
            .consolidate(sheet());
        let row = consolidated.get("2").unwrap();

        assert!(!row.has_baseline());
        assert_eq!(row.fob.awardable(), Awardable::NoBaseline);
        assert_eq!(row.landed.awardable(), Awardable::NoBaseline);
        assert!(row.as_is.final_pct.is_none());
        for q in &row.quotes {
            assert!(q.fob_savings_pct.is_none());
            assert!(q.landed_savings_usd.is_none());
        }
        // 无关税条目时按 0 兜底: 5 × (0.05 + 0.03)
        assert!(row.quotes[0].tariff_defaulted);
        assert_eq!(row.quotes[0].landed, Some(dec!(0.4)));
    }
}
