// ==========================================
// 到岸成本定标系统 - 方案汇总引擎
// ==========================================
// 职责: 决策表 → 汇总指标 + 供应商/国家/金属类型汇总 + 产品组冗余供应商数
// 输入: ConsolidatedSheet + DecisionTable
// 输出: ScenarioAggregates
// ==========================================

use crate::domain::cost_sheet::ConsolidatedSheet;
use crate::domain::decision::{AwardDecision, DecisionTable};
use crate::domain::types::{round4, RowId, SupplierId, UNAVAILABLE};
use crate::engine::resolver::ReferenceResolver;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, instrument};

/// 无产品组时的占位
pub const NO_GROUP: &str = "No group available";

// ==========================================
// ScenarioSummary - 汇总指标块
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub total_landed_savings_usd: Decimal,
    pub total_fob_savings_usd: Decimal,
    /// 保留现供应商的到岸扩展成本
    pub incumbent_retained_landed_cost: Decimal,
    /// 改派给其他零件现供应商的到岸扩展成本
    pub existing_supplier_landed_cost: Decimal,
    /// 改派给全新供应商的到岸扩展成本
    pub net_new_supplier_landed_cost: Decimal,
    pub incumbent_retained_parts: usize,
    pub new_supplier_parts: usize,
    pub net_new_supplier_parts: usize,
    pub not_awarded_parts: usize,
    pub totally_new_suppliers: usize,
    pub unique_suppliers: usize,
    pub total_landed_cost_evaluated: Decimal,
    pub total_cost_not_awarded: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupplierRollup {
    pub supplier: SupplierId,
    pub parts: usize,
    pub annual_volume: Decimal,
    pub landed_extended_cost: Decimal,
    pub fob_savings_usd: Decimal,
    pub landed_savings_usd: Decimal,
    pub totally_new: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupRollup {
    pub key: String,
    pub parts: usize,
    pub suppliers: usize,
    pub annual_volume: Decimal,
    pub landed_extended_cost: Decimal,
    pub landed_savings_usd: Decimal,
}

/// 汇总结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioAggregates {
    pub summary: ScenarioSummary,
    pub suppliers: Vec<SupplierRollup>,
    pub countries: Vec<GroupRollup>,
    pub metals: Vec<GroupRollup>,
    /// 产品组 → 选定供应商去重数
    pub redundant_suppliers: BTreeMap<String, usize>,
    /// 零件 → 选定供应商原产国（未授标或无港口为 "-"）
    #[serde(skip)]
    pub selected_countries: HashMap<RowId, String>,
}

impl ScenarioAggregates {
    pub fn redundant_for(&self, product_group: Option<&str>) -> usize {
        let key = group_key(product_group);
        self.redundant_suppliers.get(&key).copied().unwrap_or(1)
    }

    pub fn country_of(&self, row_id: &str) -> &str {
        self.selected_countries
            .get(row_id)
            .map(String::as_str)
            .unwrap_or(UNAVAILABLE)
    }
}

fn group_key(product_group: Option<&str>) -> String {
    match product_group.map(str::trim) {
        Some(g) if !g.is_empty() => g.to_string(),
        _ => NO_GROUP.to_string(),
    }
}

fn zero_or(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}

/// 分组累加器
#[derive(Default)]
struct GroupAcc {
    parts: usize,
    suppliers: BTreeSet<SupplierId>,
    volume: Decimal,
    landed: Decimal,
    savings: Decimal,
}

impl GroupAcc {
    fn add(&mut self, supplier: &SupplierId, volume: Decimal, decision: &AwardDecision) {
        self.parts += 1;
        self.suppliers.insert(supplier.clone());
        self.volume += volume;
        self.landed += zero_or(decision.assignment.landed_extended_cost);
        self.savings += zero_or(decision.assignment.landed_savings_usd);
    }

    fn finish(self, key: String) -> GroupRollup {
        GroupRollup {
            key,
            parts: self.parts,
            suppliers: self.suppliers.len(),
            annual_volume: self.volume,
            landed_extended_cost: round4(self.landed),
            landed_savings_usd: round4(self.savings),
        }
    }
}

// ==========================================
// ScenarioAggregator
// ==========================================
// 红线: 无状态引擎，只读决策表
pub struct ScenarioAggregator<'a> {
    sheet: &'a ConsolidatedSheet,
    resolver: &'a ReferenceResolver<'a>,
}

impl<'a> ScenarioAggregator<'a> {
    pub fn new(sheet: &'a ConsolidatedSheet, resolver: &'a ReferenceResolver<'a>) -> Self {
        Self { sheet, resolver }
    }

    #[instrument(skip(self, table), fields(decisions = table.len()))]
    pub fn aggregate(&self, table: &DecisionTable) -> ScenarioAggregates {
        let incumbents = self.sheet.incumbent_set();
        let mut summary = ScenarioSummary::default();
        let mut unique: BTreeSet<SupplierId> = BTreeSet::new();
        let mut net_new: BTreeSet<SupplierId> = BTreeSet::new();
        let mut suppliers: BTreeMap<SupplierId, SupplierRollup> = BTreeMap::new();
        let mut countries: BTreeMap<String, GroupAcc> = BTreeMap::new();
        let mut metals: BTreeMap<String, GroupAcc> = BTreeMap::new();
        let mut groups: BTreeMap<String, BTreeSet<SupplierId>> = BTreeMap::new();
        let mut selected_countries = HashMap::new();

        for decision in table.iter() {
            let part = self.sheet.part(&decision.row_id);
            let cost = self.sheet.get(&decision.row_id);
            let a = &decision.assignment;

            // 1. 未授标
            let supplier = match decision.selected() {
                Some(s) => s,
                None => {
                    summary.not_awarded_parts += 1;
                    summary.total_cost_not_awarded +=
                        zero_or(cost.and_then(|c| c.landed_extended_cost));
                    continue;
                }
            };

            let landed = zero_or(a.landed_extended_cost);
            let volume = part.map_or(Decimal::ZERO, |p| p.volume_or_zero());
            summary.total_landed_savings_usd += zero_or(a.landed_savings_usd);
            summary.total_fob_savings_usd += zero_or(a.fob_savings_usd);
            summary.total_landed_cost_evaluated += landed;
            unique.insert(supplier.clone());

            // 2. 保留 / 现有供应商 / 全新供应商
            if decision.is_incumbent_retained() {
                summary.incumbent_retained_parts += 1;
                summary.incumbent_retained_landed_cost += landed;
            } else if incumbents.contains(supplier) {
                summary.new_supplier_parts += 1;
                summary.existing_supplier_landed_cost += landed;
            } else {
                summary.net_new_supplier_parts += 1;
                summary.net_new_supplier_landed_cost += landed;
                net_new.insert(supplier.clone());
            }

            // 3. 供应商汇总
            let rollup = suppliers
                .entry(supplier.clone())
                .or_insert_with(|| SupplierRollup {
                    supplier: supplier.clone(),
                    totally_new: !incumbents.contains(supplier),
                    ..Default::default()
                });
            rollup.parts += 1;
            rollup.annual_volume += volume;
            rollup.landed_extended_cost += landed;
            rollup.fob_savings_usd += zero_or(a.fob_savings_usd);
            rollup.landed_savings_usd += zero_or(a.landed_savings_usd);

            // 4. 国家 / 金属类型 / 产品组
            let country = self
                .resolver
                .country_of(&decision.row_id, supplier)
                .unwrap_or(UNAVAILABLE)
                .to_string();
            countries
                .entry(country.clone())
                .or_default()
                .add(supplier, volume, decision);
            selected_countries.insert(decision.row_id.clone(), country);

            let metal = part
                .and_then(|p| p.metal_type.clone())
                .unwrap_or_else(|| UNAVAILABLE.to_string());
            metals.entry(metal).or_default().add(supplier, volume, decision);

            let group = group_key(part.and_then(|p| p.product_group.as_deref()));
            groups.entry(group).or_default().insert(supplier.clone());
        }

        summary.unique_suppliers = unique.len();
        summary.totally_new_suppliers = net_new.len();
        summary.total_landed_savings_usd = round4(summary.total_landed_savings_usd);
        summary.total_fob_savings_usd = round4(summary.total_fob_savings_usd);
        summary.total_cost_not_awarded = round4(summary.total_cost_not_awarded);

        let redundant_suppliers: BTreeMap<String, usize> = groups
            .into_iter()
            .map(|(group, set)| {
                let count = if group == NO_GROUP { 1 } else { set.len() };
                (group, count)
            })
            .collect();

        info!(
            retained = summary.incumbent_retained_parts,
            new_supplier = summary.new_supplier_parts,
            net_new = summary.net_new_supplier_parts,
            not_awarded = summary.not_awarded_parts,
            landed_savings = %summary.total_landed_savings_usd,
            "方案汇总完成"
        );

        let mut supplier_rows: Vec<SupplierRollup> = suppliers.into_values().collect();
        for row in &mut supplier_rows {
            row.landed_extended_cost = round4(row.landed_extended_cost);
            row.fob_savings_usd = round4(row.fob_savings_usd);
            row.landed_savings_usd = round4(row.landed_savings_usd);
        }
        // 到岸扩展成本降序，同额按名称
        supplier_rows.sort_by(|a, b| b.landed_extended_cost.cmp(&a.landed_extended_cost));

        ScenarioAggregates {
            summary,
            suppliers: supplier_rows,
            countries: countries.into_iter().map(|(k, acc)| acc.finish(k)).collect(),
            metals: metals.into_iter().map(|(k, acc)| acc.finish(k)).collect(),
            redundant_suppliers,
            selected_countries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BenchmarkConfig, ResolverConfig};
    use crate::domain::decision::Assignment;
    use crate::domain::part::{BidSheet, Part};
    use crate::domain::reference::{BenchmarkRow, PortCountryMap, ReferenceData};
    use crate::domain::types::{AwardBucket, VolumeBand};
    use crate::engine::consolidator::Consolidator;
    use rust_decimal_macros::dec;

    fn part(row_id: &str, metal: Option<&str>, group: Option<&str>) -> Part {
        Part {
            row_id: row_id.to_string(),
            part_number: format!("P-{}", row_id),
            division: "Midland".to_string(),
            metal_type: metal.map(str::to_string),
            description: None,
            product_group: group.map(str::to_string),
            part_family: None,
            annual_volume: Some(dec!(100)),
            average_order_quantity: Some(dec!(10)),
            valid_supplier_count: None,
            raw: vec![],
        }
    }

    fn reference() -> ReferenceData {
        let mut data = ReferenceData::default();
        for row in ["1", "2", "3", "4", "5"] {
            data.supplier_ports.insert(row, SupplierId::from("Coda"), "NINGBO");
            data.supplier_ports.insert(row, SupplierId::from("Mayank"), "MUMBAI");
            let incumbent = if row == "3" { "ZED LTD" } else { "CODA INC" };
            let mut bands = HashMap::new();
            bands.insert(VolumeBand::B1To50, dec!(10));
            data.benchmark_prices.insert(
                &format!("P-{}", row),
                BenchmarkRow {
                    bands,
                    raw: None,
                    most_common_supplier: Some(incumbent.to_string()),
                },
            );
        }
        data.port_countries = PortCountryMap::from_pairs([("NINGBO", "China"), ("MUMBAI", "India")]);
        data.freight.insert("NINGBO", "Midland", dec!(0.05));
        data.freight.insert("MUMBAI", "Midland", dec!(0.10));
        data.supplier_names.insert("coda inc", "Coda");
        data.supplier_names.insert("zed ltd", "Zed");
        data
    }

    fn sheet() -> BidSheet {
        let mut sheet = BidSheet::new(
            vec![],
            vec![SupplierId::from("Coda"), SupplierId::from("Mayank")],
        );
        sheet.push_part(part("1", Some("Brass"), Some("Valves")), HashMap::new());
        sheet.push_part(part("2", Some("Brass"), Some("Valves")), HashMap::new());
        sheet.push_part(part("3", None, None), HashMap::new());
        sheet.push_part(part("4", Some("Brass"), Some("Valves")), HashMap::new());
        sheet.push_part(part("5", Some("Brass"), Some("  ")), HashMap::new());
        sheet
    }

    fn award(supplier: &str, bucket: AwardBucket, landed: Decimal, savings: Decimal) -> Assignment {
        Assignment {
            selected: Some(SupplierId::from(supplier)),
            bucket,
            landed_extended_cost: Some(landed),
            landed_savings_usd: Some(savings),
            fob_savings_usd: Some(savings / dec!(2)),
            ..Assignment::unassigned("")
        }
    }

    fn decisions() -> DecisionTable {
        let coda = Some(SupplierId::from("Coda"));
        let mut table = DecisionTable::new();
        table.insert(
            "1".to_string(),
            coda.clone(),
            award("Coda", AwardBucket::IncumbentRetained, dec!(1000), dec!(0)),
        );
        table.insert(
            "2".to_string(),
            coda.clone(),
            award("Mayank", AwardBucket::CandidateForReassignment, dec!(500), dec!(300)),
        );
        table.insert(
            "3".to_string(),
            Some(SupplierId::from("Zed")),
            award("Coda", AwardBucket::CandidateForReassignment, dec!(200), dec!(40)),
        );
        table.insert("4".to_string(), coda.clone(), Assignment::unassigned("No bids"));
        table.insert(
            "5".to_string(),
            coda,
            award("Mayank", AwardBucket::CandidateForReassignment, dec!(100), dec!(20)),
        );
        table
    }

    fn aggregate() -> ScenarioAggregates {
        let data = reference();
        let config = ResolverConfig::default();
        let consolidated =
            Consolidator::new(&data, &config, &BenchmarkConfig::default()).consolidate(sheet());
        let resolver = ReferenceResolver::new(&data, &config);
        ScenarioAggregator::new(&consolidated, &resolver).aggregate(&decisions())
    }

    #[test]
    fn test_summary_splits_retained_existing_and_net_new() {
        let s = aggregate().summary;
        assert_eq!(s.incumbent_retained_parts, 1);
        assert_eq!(s.incumbent_retained_landed_cost, dec!(1000));
        // Coda 是其他零件的现供应商
        assert_eq!(s.new_supplier_parts, 1);
        assert_eq!(s.existing_supplier_landed_cost, dec!(200));
        assert_eq!(s.net_new_supplier_parts, 2);
        assert_eq!(s.net_new_supplier_landed_cost, dec!(600));
        assert_eq!(s.totally_new_suppliers, 1);
        assert_eq!(s.unique_suppliers, 2);
        assert_eq!(s.not_awarded_parts, 1);
        // 行 4 基准到岸: 10 × (0.05 + 0.03) × 100
        assert_eq!(s.total_cost_not_awarded, dec!(80));
        assert_eq!(s.total_landed_savings_usd, dec!(360));
        assert_eq!(s.total_fob_savings_usd, dec!(180));
        assert_eq!(s.total_landed_cost_evaluated, dec!(1800));
    }

    #[test]
    fn test_supplier_rollup_sorted_by_landed_cost() {
        let suppliers = aggregate().suppliers;
        assert_eq!(suppliers.len(), 2);

        let coda = &suppliers[0];
        assert_eq!(coda.supplier, SupplierId::from("Coda"));
        assert_eq!(coda.parts, 2);
        assert_eq!(coda.annual_volume, dec!(200));
        assert_eq!(coda.landed_extended_cost, dec!(1200));
        assert!(!coda.totally_new);

        let mayank = &suppliers[1];
        assert_eq!(mayank.supplier, SupplierId::from("Mayank"));
        assert_eq!(mayank.landed_savings_usd, dec!(320));
        assert!(mayank.totally_new);
    }

    #[test]
    fn test_country_and_metal_rollups() {
        let aggregates = aggregate();

        let countries: Vec<(&str, usize, Decimal)> = aggregates
            .countries
            .iter()
            .map(|c| (c.key.as_str(), c.parts, c.landed_extended_cost))
            .collect();
        assert_eq!(countries, vec![("China", 2, dec!(1200)), ("India", 2, dec!(600))]);
        assert_eq!(aggregates.country_of("2"), "India");
        assert_eq!(aggregates.country_of("4"), UNAVAILABLE);

        let metals: Vec<(&str, usize, usize)> = aggregates
            .metals
            .iter()
            .map(|m| (m.key.as_str(), m.parts, m.suppliers))
            .collect();
        assert_eq!(metals, vec![("-", 1, 1), ("Brass", 3, 2)]);
    }

    #[test]
    fn test_redundant_suppliers_per_product_group() {
        let aggregates = aggregate();
        assert_eq!(aggregates.redundant_for(Some("Valves")), 2);
        // 无产品组的零件不计冗余，即便选了两家
        assert_eq!(aggregates.redundant_for(None), 1);
        assert_eq!(aggregates.redundant_for(Some(" ")), 1);
        assert_eq!(aggregates.redundant_suppliers.get(NO_GROUP), Some(&1));
        assert_eq!(aggregates.redundant_for(Some("Fittings")), 1);
    }
}
