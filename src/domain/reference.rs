// ==========================================
// 到岸成本定标系统 - 参考数据表
// ==========================================
// 职责: 每次运行加载一次的只读参考表
// 供应商→港口 / 港口→国家 / 运费系数 / 关税 / 基准价 / 供应商名归一 / 供应商档案
// ==========================================

use crate::domain::types::{RowId, SupplierId, VolumeBand};
use rust_decimal::Decimal;
use std::collections::HashMap;

// ==========================================
// 供应商→港口（按零件行）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SupplierPortTable {
    ports: HashMap<RowId, HashMap<SupplierId, String>>,
    divisions: HashMap<RowId, String>,
}

impl SupplierPortTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, row_id: &str, supplier: SupplierId, port: &str) {
        let port = port.trim().to_uppercase();
        if port.is_empty() {
            return;
        }
        self.ports
            .entry(row_id.to_string())
            .or_default()
            .insert(supplier, port);
    }

    pub fn set_division(&mut self, row_id: &str, division: &str) {
        self.divisions
            .insert(row_id.to_string(), division.trim().to_string());
    }

    pub fn port(&self, row_id: &str, supplier: &SupplierId) -> Option<&str> {
        self.ports
            .get(row_id)
            .and_then(|m| m.get(supplier))
            .map(|s| s.as_str())
    }

    pub fn division(&self, row_id: &str) -> Option<&str> {
        self.divisions.get(row_id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

// ==========================================
// 港口→国家
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PortCountryMap {
    countries: HashMap<String, String>,
}

impl PortCountryMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let countries = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_uppercase(), v.as_ref().trim().to_string()))
            .collect();
        Self { countries }
    }

    pub fn country(&self, port: &str) -> Option<&str> {
        self.countries
            .get(&port.trim().to_uppercase())
            .map(|s| s.as_str())
    }
}

// ==========================================
// 运费系数 (港口, 事业部) → 系数
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct FreightTable {
    multipliers: HashMap<(String, String), Decimal>,
}

impl FreightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, port: &str, division: &str, multiplier: Decimal) {
        self.multipliers.insert(
            (port.trim().to_uppercase(), division.trim().to_string()),
            multiplier,
        );
    }

    pub fn multiplier(&self, port: &str, division: &str) -> Option<Decimal> {
        self.multipliers
            .get(&(port.trim().to_uppercase(), division.trim().to_string()))
            .copied()
    }
}

// ==========================================
// 关税表
// ==========================================
/// 零件级关税条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TariffEntry {
    pub tariff_rate: Decimal,
    pub metal_tariff: Decimal,
}

/// 关税表
///
/// 两级键:
/// - 零件级 (row_id, country, metal_type) → 从价税率 + 金属附加税
/// - 事业部级 (division, country, metal_type) → 从价税率（金属附加税视为 0）
///
/// 查询先零件级后事业部级；金属类型按原文精确匹配（仅去首尾空白）
#[derive(Debug, Clone, Default)]
pub struct TariffTable {
    part_level: HashMap<(RowId, String, String), TariffEntry>,
    division_level: HashMap<(String, String, String), Decimal>,
}

impl TariffTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_part(&mut self, row_id: &str, country: &str, metal: &str, entry: TariffEntry) {
        self.part_level.insert(
            (
                row_id.trim().to_string(),
                country.trim().to_string(),
                metal.trim().to_string(),
            ),
            entry,
        );
    }

    pub fn insert_division(&mut self, division: &str, country: &str, metal: &str, rate: Decimal) {
        self.division_level.insert(
            (
                division.trim().to_string(),
                country.trim().to_string(),
                metal.trim().to_string(),
            ),
            rate,
        );
    }

    pub fn lookup(
        &self,
        row_id: &str,
        division: &str,
        country: &str,
        metal: &str,
    ) -> Option<TariffEntry> {
        let metal = metal.trim().to_string();
        let country = country.trim().to_string();
        if let Some(entry) = self
            .part_level
            .get(&(row_id.trim().to_string(), country.clone(), metal.clone()))
        {
            return Some(*entry);
        }
        self.division_level
            .get(&(division.trim().to_string(), country, metal))
            .map(|rate| TariffEntry {
                tariff_rate: *rate,
                metal_tariff: Decimal::ZERO,
            })
    }

    pub fn len(&self) -> usize {
        self.part_level.len() + self.division_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// 量价分档基准价表 (WAPP)
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BenchmarkRow {
    pub bands: HashMap<VolumeBand, Decimal>,
    pub raw: Option<Decimal>,
    pub most_common_supplier: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkPriceTable {
    rows: HashMap<String, BenchmarkRow>,
}

impl BenchmarkPriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同一归一化零件号重复出现时保留第一行
    pub fn insert(&mut self, norm_item_id: &str, row: BenchmarkRow) {
        self.rows
            .entry(norm_item_id.trim().to_uppercase())
            .or_insert(row);
    }

    pub fn get(&self, norm_item_id: &str) -> Option<&BenchmarkRow> {
        self.rows.get(&norm_item_id.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// 供应商名归一（ERP 名称 → 报价表供应商名）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SupplierNameMap {
    names: HashMap<String, SupplierId>,
}

impl SupplierNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, erp_name: &str, normalized: &str) {
        let normalized = normalized.trim();
        if normalized.is_empty() {
            return;
        }
        self.names
            .insert(erp_name.trim().to_lowercase(), SupplierId::new(normalized));
    }

    pub fn normalize(&self, erp_name: &str) -> Option<&SupplierId> {
        self.names.get(&erp_name.trim().to_lowercase())
    }
}

// ==========================================
// 供应商档案（输出参考表）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SupplierDirectory {
    /// 元数据列名（保持输入顺序）
    pub columns: Vec<String>,
    entries: HashMap<SupplierId, HashMap<String, String>>,
}

impl SupplierDirectory {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, supplier: SupplierId, values: HashMap<String, String>) {
        self.entries.entry(supplier).or_insert(values);
    }

    /// 取元数据，缺失时为 "-"
    pub fn value(&self, supplier: &SupplierId, column: &str) -> String {
        self.entries
            .get(supplier)
            .and_then(|m| m.get(column))
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| crate::domain::types::UNAVAILABLE.to_string())
    }
}

// ==========================================
// 零件覆写（零件号 / 材质）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PartOverrides {
    pub part_numbers: HashMap<RowId, String>,
    pub materials: HashMap<RowId, String>,
}

// ==========================================
// ReferenceData - 参考数据聚合
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub supplier_ports: SupplierPortTable,
    pub port_countries: PortCountryMap,
    pub freight: FreightTable,
    pub tariffs: TariffTable,
    pub benchmark_prices: BenchmarkPriceTable,
    pub supplier_names: SupplierNameMap,
    pub supplier_directory: SupplierDirectory,
    pub overrides: PartOverrides,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tariff_part_level_wins_over_division() {
        let mut t = TariffTable::new();
        t.insert_division("Midland", "China", "Brass", dec!(0.25));
        t.insert_part(
            "7",
            "China",
            "Brass",
            TariffEntry {
                tariff_rate: dec!(0.10),
                metal_tariff: dec!(0.02),
            },
        );

        let hit = t.lookup("7", "Midland", "China", "Brass").unwrap();
        assert_eq!(hit.tariff_rate, dec!(0.10));
        assert_eq!(hit.metal_tariff, dec!(0.02));

        let fallback = t.lookup("8", "Midland", "China", "Brass").unwrap();
        assert_eq!(fallback.tariff_rate, dec!(0.25));
        assert_eq!(fallback.metal_tariff, Decimal::ZERO);

        assert!(t.lookup("8", "Midland", "China", "brass").is_none());
    }

    #[test]
    fn test_port_lookup_is_case_insensitive() {
        let mut ports = SupplierPortTable::new();
        ports.insert("1", SupplierId::from("Coda"), " ningbo ");
        assert_eq!(ports.port("1", &SupplierId::from("Coda")), Some("NINGBO"));

        let countries = PortCountryMap::from_pairs([("Ningbo", "China")]);
        assert_eq!(countries.country("NINGBO"), Some("China"));
    }

    #[test]
    fn test_supplier_name_map_lowercases() {
        let mut names = SupplierNameMap::new();
        names.insert("CODA INC ", "Coda");
        assert_eq!(names.normalize("coda inc"), Some(&SupplierId::from("Coda")));
        assert!(names.normalize("unknown").is_none());
    }
}
