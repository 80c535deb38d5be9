// ==========================================
// 到岸成本定标系统 - 参考表导入器
// ==========================================
// 职责: 供应商→港口 / 运费系数 / 关税 / 基准价 / 供应商名归一 / 供应商档案 / 零件覆写
// 红线: 参考表每次运行只加载一次，之后只读
// ==========================================

use crate::config::{InputPaths, ResolverConfig};
use crate::domain::reference::{
    BenchmarkPriceTable, BenchmarkRow, FreightTable, PartOverrides, PortCountryMap,
    ReferenceData, SupplierDirectory, SupplierNameMap, SupplierPortTable, TariffEntry,
    TariffTable,
};
use crate::domain::types::{SupplierId, VolumeBand};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{RawTable, UniversalFileParser};
use crate::importer::importer_trait::DataCleaner as _;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 列名常量
// ==========================================
pub mod columns {
    pub const ROW_ID: &str = "ROW ID #";
    pub const DIVISION: &str = "Division";
    pub const PART_NUMBER: &str = "Part #";
    pub const REFERENCE: &str = "Reference";
    pub const COUNTRY: &str = "Country";
    pub const METAL_TYPE: &str = "Metal Type";
    pub const TARIFF_VALUE: &str = "tariff_value";
    pub const METAL_TARIFF: &str = "Metal Tariff";
    pub const TARIFF_MULTIPLIER: &str = "Tariff Multiplier";
    pub const NORM_ITEM_ID: &str = "Norm Item ID";
    pub const RAW_WAPP: &str = "Raw WAPP";
    pub const MOST_COMMON_SUPPLIER: &str = "Most Common Supplier";
    pub const ERP_SUPPLIER: &str = "P21 supplier";
    pub const NORMALIZED_SUPPLIER: &str = "Normalized to match bid supplier";
    pub const MATERIAL: &str = "Material";
}

// ==========================================
// ReferenceImporter
// ==========================================
pub struct ReferenceImporter {
    parser: UniversalFileParser,
    cleaner: DataCleaner,
}

impl Default for ReferenceImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceImporter {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
            cleaner: DataCleaner,
        }
    }

    fn decimal(&self, value: &str) -> Option<Decimal> {
        self.cleaner.parse_decimal(Some(value))
    }

    /// 加载全部参考表
    #[instrument(skip(self, inputs, resolver))]
    pub fn import_all(
        &self,
        inputs: &InputPaths,
        resolver: &ResolverConfig,
    ) -> ImportResult<ReferenceData> {
        let supplier_ports = self.import_supplier_ports(&inputs.supplier_ports)?;
        let freight = self.import_freight(&inputs.freight)?;

        let mut tariffs = self.import_part_tariffs(&inputs.part_tariffs)?;
        for t in &resolver.division_tariffs {
            tariffs.insert_division(&t.division, &t.country, &t.metal_type, t.rate);
        }
        if let Some(path) = &inputs.division_tariffs {
            self.import_division_tariffs(path, &mut tariffs)?;
        }

        let benchmark_prices =
            self.import_benchmark_prices(&inputs.benchmark_prices, inputs.benchmark_skip_rows)?;
        let supplier_names =
            self.import_supplier_names(&inputs.supplier_names, inputs.supplier_names_skip_rows)?;

        let supplier_directory = match &inputs.output_reference {
            Some(path) => self.import_output_reference(path)?,
            None => SupplierDirectory::default(),
        };

        let overrides = self.import_part_overrides(
            inputs.part_number_overrides.as_deref(),
            inputs.material_overrides.as_deref(),
        )?;

        let data = ReferenceData {
            supplier_ports,
            port_countries: PortCountryMap::from_pairs(resolver.port_countries.iter()),
            freight,
            tariffs,
            benchmark_prices,
            supplier_names,
            supplier_directory,
            overrides,
        };
        info!(
            port_rows = data.supplier_ports.len(),
            tariff_keys = data.tariffs.len(),
            benchmark_rows = data.benchmark_prices.len(),
            "参考表加载完成"
        );
        Ok(data)
    }

    // ==========================================
    // 供应商→港口（宽表: ROW ID # / Division / Part # / 每供应商一列）
    // ==========================================
    pub fn import_supplier_ports<P: AsRef<Path>>(&self, path: P) -> ImportResult<SupplierPortTable> {
        let table = self.parser.parse(path, 0)?;
        self.supplier_ports_from_table(&table)
    }

    pub fn supplier_ports_from_table(&self, table: &RawTable) -> ImportResult<SupplierPortTable> {
        let row_idx = table.require_column(columns::ROW_ID)?;
        let division_idx = table.column_index(columns::DIVISION);
        let id_columns = [columns::ROW_ID, columns::DIVISION, columns::PART_NUMBER];

        let supplier_columns: Vec<(usize, SupplierId)> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !id_columns.contains(&h.trim()) && !h.trim().is_empty())
            .map(|(i, h)| (i, SupplierId::new(h.as_str())))
            .collect();

        let mut ports = SupplierPortTable::new();
        for row in &table.rows {
            let row_id = table.cell(row, row_idx).trim();
            if row_id.is_empty() {
                continue;
            }
            if let Some(idx) = division_idx {
                ports.set_division(row_id, table.cell(row, idx));
            }
            for (idx, supplier) in &supplier_columns {
                if let Some(port) = self.cleaner.normalize_null(Some(table.cell(row, *idx))) {
                    ports.insert(row_id, supplier.clone(), &port);
                }
            }
        }
        debug!(rows = ports.len(), suppliers = supplier_columns.len(), "供应商港口表已加载");
        Ok(ports)
    }

    // ==========================================
    // 运费系数（宽表: Reference + 每事业部一列）
    // ==========================================
    pub fn import_freight<P: AsRef<Path>>(&self, path: P) -> ImportResult<FreightTable> {
        let table = self.parser.parse(path, 0)?;
        self.freight_from_table(&table)
    }

    pub fn freight_from_table(&self, table: &RawTable) -> ImportResult<FreightTable> {
        let ref_idx = table.require_column(columns::REFERENCE)?;
        let mut freight = FreightTable::new();
        for row in &table.rows {
            let port = table.cell(row, ref_idx);
            if port.trim().is_empty() {
                continue;
            }
            for (idx, division) in table.headers.iter().enumerate() {
                if idx == ref_idx || division.trim().is_empty() {
                    continue;
                }
                if let Some(multiplier) = self.decimal(table.cell(row, idx)) {
                    freight.insert(port, division, multiplier);
                }
            }
        }
        Ok(freight)
    }

    // ==========================================
    // 关税
    // ==========================================
    /// 零件级关税（ROW ID # / Country / Metal Type / tariff_value / Metal Tariff）
    pub fn import_part_tariffs<P: AsRef<Path>>(&self, path: P) -> ImportResult<TariffTable> {
        let table = self.parser.parse(path, 0)?;
        let mut tariffs = TariffTable::new();
        self.part_tariffs_into(&table, &mut tariffs)?;
        Ok(tariffs)
    }

    pub fn part_tariffs_into(&self, table: &RawTable, tariffs: &mut TariffTable) -> ImportResult<()> {
        let row_idx = table.require_column(columns::ROW_ID)?;
        let country_idx = table.require_column(columns::COUNTRY)?;
        let metal_idx = table.require_column(columns::METAL_TYPE)?;
        let tariff_idx = table.require_column(columns::TARIFF_VALUE)?;
        let metal_tariff_idx = table.column_index(columns::METAL_TARIFF);

        for row in &table.rows {
            let row_id = table.cell(row, row_idx);
            if row_id.trim().is_empty() {
                continue;
            }
            // 行存在但分项缺失时按 0 计
            let entry = TariffEntry {
                tariff_rate: self
                    .decimal(table.cell(row, tariff_idx))
                    .unwrap_or(Decimal::ZERO),
                metal_tariff: metal_tariff_idx
                    .and_then(|i| self.decimal(table.cell(row, i)))
                    .unwrap_or(Decimal::ZERO),
            };
            tariffs.insert_part(
                row_id,
                table.cell(row, country_idx),
                table.cell(row, metal_idx),
                entry,
            );
        }
        Ok(())
    }

    /// 事业部级关税（Division / Country / Metal Type / Tariff Multiplier）
    pub fn import_division_tariffs<P: AsRef<Path>>(
        &self,
        path: P,
        tariffs: &mut TariffTable,
    ) -> ImportResult<()> {
        let table = self.parser.parse(path, 0)?;
        let division_idx = table.require_column(columns::DIVISION)?;
        let country_idx = table.require_column(columns::COUNTRY)?;
        let metal_idx = table.require_column(columns::METAL_TYPE)?;
        let rate_idx = table.require_column(columns::TARIFF_MULTIPLIER)?;

        for row in &table.rows {
            match self.decimal(table.cell(row, rate_idx)) {
                Some(rate) => tariffs.insert_division(
                    table.cell(row, division_idx),
                    table.cell(row, country_idx),
                    table.cell(row, metal_idx),
                    rate,
                ),
                None => warn!(
                    division = table.cell(row, division_idx),
                    country = table.cell(row, country_idx),
                    "事业部关税缺失税率，跳过"
                ),
            }
        }
        Ok(())
    }

    // ==========================================
    // 基准价（Norm Item ID / 11 档 / Raw WAPP / Most Common Supplier）
    // ==========================================
    pub fn import_benchmark_prices<P: AsRef<Path>>(
        &self,
        path: P,
        skip_rows: usize,
    ) -> ImportResult<BenchmarkPriceTable> {
        let table = self.parser.parse(path, skip_rows)?;
        self.benchmark_prices_from_table(&table)
    }

    pub fn benchmark_prices_from_table(&self, table: &RawTable) -> ImportResult<BenchmarkPriceTable> {
        let id_idx = table.require_column(columns::NORM_ITEM_ID)?;
        let raw_idx = table.column_index(columns::RAW_WAPP);
        // 最常用供应商列名大小写不一
        let mcs_idx = table.headers.iter().position(|h| {
            h.trim()
                .eq_ignore_ascii_case(columns::MOST_COMMON_SUPPLIER)
        });
        let band_columns: Vec<(VolumeBand, usize)> = VolumeBand::ALL
            .iter()
            .filter_map(|band| table.column_index(band.label()).map(|i| (*band, i)))
            .collect();
        if band_columns.len() < VolumeBand::ALL.len() {
            warn!(
                found = band_columns.len(),
                "基准价表量价区间列不完整，缺失区间回退 Raw WAPP"
            );
        }

        let mut prices = BenchmarkPriceTable::new();
        for row in &table.rows {
            let id = self.cleaner.clean_text(table.cell(row, id_idx), true);
            if id.is_empty() {
                continue;
            }
            let bands: HashMap<VolumeBand, Decimal> = band_columns
                .iter()
                .filter_map(|(band, i)| self.decimal(table.cell(row, *i)).map(|v| (*band, v)))
                .collect();
            prices.insert(
                &id,
                BenchmarkRow {
                    bands,
                    raw: raw_idx.and_then(|i| self.decimal(table.cell(row, i))),
                    most_common_supplier: mcs_idx
                        .and_then(|i| self.cleaner.normalize_null(Some(table.cell(row, i)))),
                },
            );
        }
        Ok(prices)
    }

    // ==========================================
    // 供应商名归一（P21 supplier → Normalized to match bid supplier）
    // ==========================================
    pub fn import_supplier_names<P: AsRef<Path>>(
        &self,
        path: P,
        skip_rows: usize,
    ) -> ImportResult<SupplierNameMap> {
        let table = self.parser.parse(path, skip_rows)?;
        self.supplier_names_from_table(&table)
    }

    pub fn supplier_names_from_table(&self, table: &RawTable) -> ImportResult<SupplierNameMap> {
        let erp_idx = table.require_column(columns::ERP_SUPPLIER)?;
        let norm_idx = table.require_column(columns::NORMALIZED_SUPPLIER)?;
        let mut names = SupplierNameMap::new();
        for row in &table.rows {
            names.insert(table.cell(row, erp_idx), table.cell(row, norm_idx));
        }
        Ok(names)
    }

    // ==========================================
    // 供应商档案（Reference + 元数据列）
    // ==========================================
    pub fn import_output_reference<P: AsRef<Path>>(&self, path: P) -> ImportResult<SupplierDirectory> {
        let table = self.parser.parse(path, 0)?;
        let ref_idx = table.require_column(columns::REFERENCE)?;
        let meta_columns: Vec<(usize, String)> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != ref_idx && !h.trim().is_empty())
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        let mut directory =
            SupplierDirectory::new(meta_columns.iter().map(|(_, h)| h.clone()).collect());
        for row in &table.rows {
            let supplier = table.cell(row, ref_idx);
            if supplier.trim().is_empty() {
                continue;
            }
            let values = meta_columns
                .iter()
                .map(|(i, h)| (h.clone(), table.cell(row, *i).to_string()))
                .collect();
            directory.insert(SupplierId::new(supplier), values);
        }
        Ok(directory)
    }

    // ==========================================
    // 零件覆写（ROW ID # → Part # / Material）
    // ==========================================
    pub fn import_part_overrides(
        &self,
        part_numbers: Option<&Path>,
        materials: Option<&Path>,
    ) -> ImportResult<PartOverrides> {
        let mut overrides = PartOverrides::default();
        if let Some(path) = part_numbers {
            overrides.part_numbers = self.row_map(path, columns::PART_NUMBER)?;
        }
        if let Some(path) = materials {
            overrides.materials = self.row_map(path, columns::MATERIAL)?;
        }
        Ok(overrides)
    }

    fn row_map(&self, path: &Path, value_column: &str) -> ImportResult<HashMap<String, String>> {
        let table = self.parser.parse(path, 0)?;
        let row_idx = table.require_column(columns::ROW_ID)?;
        let value_idx = table.require_column(value_column)?;
        Ok(table
            .rows
            .iter()
            .filter_map(|row| {
                let row_id = table.cell(row, row_idx).trim();
                let value = self.cleaner.normalize_null(Some(table.cell(row, value_idx)))?;
                if row_id.is_empty() {
                    None
                } else {
                    Some((row_id.to_string(), value))
                }
            })
            .collect())
    }
}
