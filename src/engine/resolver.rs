// ==========================================
// 到岸成本定标系统 - 参考数据解析器
// ==========================================
// 职责: (零件, 供应商) → 港口 / 国家 / 运费系数 / 关税 / 关税附加
// 红线: 查表失败只影响该供应商在该零件上的可比性，不中断批次
// ==========================================

use crate::config::ResolverConfig;
use crate::domain::part::Part;
use crate::domain::reference::{ReferenceData, TariffEntry};
use crate::domain::types::SupplierId;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

// ==========================================
// 解析错误（逐行收敛为"不可用"）
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("零件 {row_id} 缺少供应商 {supplier} 的发货港口")]
    MissingPort { row_id: String, supplier: String },

    #[error("港口 {port} 无国家映射")]
    MissingCountry { port: String },

    #[error("运费系数缺失: 港口={port}, 事业部={division}")]
    MissingFreight { port: String, division: String },

    #[error("关税缺失: 零件={row_id}, 国家={country}, 金属={metal}")]
    MissingTariff {
        row_id: String,
        country: String,
        metal: String,
    },
}

/// 关税缺失的处理口径
///
/// 两种口径来自不同的业务环节，保持并存:
/// - DefaultToZero: 成本汇总阶段，缺失按 0 计并打标记待人工复核
/// - Require: 定标阶段计算现供应商基准到岸成本，缺失即不可用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TariffPolicy {
    DefaultToZero,
    Require,
}

// ==========================================
// PortResolution - 单 (零件, 供应商) 解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortResolution {
    pub port: String,
    pub country: String,
    pub freight_multiplier: Decimal,
    pub tariff_rate: Decimal,
    pub metal_tariff: Decimal,
    pub duty_multiplier: Decimal,
    /// 免关税事业部（到岸 = 单价 × 运费系数）
    pub exempt_division: bool,
    /// 关税按 0 兜底
    pub tariff_defaulted: bool,
}

impl PortResolution {
    /// 去掉关税附加（现供应商未报价时的比较口径）
    pub fn without_duty(mut self) -> Self {
        self.duty_multiplier = Decimal::ZERO;
        self
    }

    /// 实际生效的合计系数
    pub fn total_multiplier(&self) -> Decimal {
        if self.exempt_division {
            self.freight_multiplier
        } else {
            self.freight_multiplier + self.tariff_rate + self.metal_tariff + self.duty_multiplier
        }
    }
}

// ==========================================
// ReferenceResolver
// ==========================================
pub struct ReferenceResolver<'a> {
    data: &'a ReferenceData,
    config: &'a ResolverConfig,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(data: &'a ReferenceData, config: &'a ResolverConfig) -> Self {
        Self { data, config }
    }

    pub fn is_exempt_division(&self, division: &str) -> bool {
        let division = division.trim();
        self.config
            .exempt_divisions
            .iter()
            .any(|d| d.trim().eq_ignore_ascii_case(division))
    }

    /// 关税附加
    ///
    /// 免关税事业部或免关税供应商 → 0；否则按金属类型查表（去空白、忽略大小写），未列出 → 0
    pub fn duty_multiplier(&self, supplier: &SupplierId, metal_type: Option<&str>, division: &str) -> Decimal {
        if self.is_exempt_division(division) {
            return Decimal::ZERO;
        }
        let exempt_supplier = self
            .config
            .duty_exempt_suppliers
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(supplier.as_str()));
        if exempt_supplier {
            return Decimal::ZERO;
        }
        self.metal_duty(metal_type, division)
    }

    /// 按金属类型的关税附加（不看供应商豁免）
    pub fn metal_duty(&self, metal_type: Option<&str>, division: &str) -> Decimal {
        if self.is_exempt_division(division) {
            return Decimal::ZERO;
        }
        let metal = match metal_type {
            Some(m) => m.trim(),
            None => return Decimal::ZERO,
        };
        self.config
            .duty_rates
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(metal))
            .map(|(_, rate)| *rate)
            .unwrap_or(Decimal::ZERO)
    }

    /// 解析 (零件, 供应商)
    pub fn resolve(
        &self,
        part: &Part,
        supplier: &SupplierId,
        policy: TariffPolicy,
    ) -> Result<PortResolution, ResolveError> {
        let port = self
            .data
            .supplier_ports
            .port(&part.row_id, supplier)
            .ok_or_else(|| ResolveError::MissingPort {
                row_id: part.row_id.clone(),
                supplier: supplier.to_string(),
            })?;

        let country = self
            .data
            .port_countries
            .country(port)
            .ok_or_else(|| ResolveError::MissingCountry {
                port: port.to_string(),
            })?;

        let freight_multiplier = self
            .data
            .freight
            .multiplier(port, &part.division)
            .ok_or_else(|| ResolveError::MissingFreight {
                port: port.to_string(),
                division: part.division.clone(),
            })?;

        let exempt_division = self.is_exempt_division(&part.division);
        let metal = part.metal_type.as_deref().unwrap_or("");

        // 免关税事业部不需要关税
        let (tariff, tariff_defaulted) = if exempt_division {
            (TariffEntry::default(), false)
        } else {
            match self
                .data
                .tariffs
                .lookup(&part.row_id, &part.division, country, metal)
            {
                Some(entry) => (entry, false),
                None => match policy {
                    TariffPolicy::DefaultToZero => (TariffEntry::default(), true),
                    TariffPolicy::Require => {
                        return Err(ResolveError::MissingTariff {
                            row_id: part.row_id.clone(),
                            country: country.to_string(),
                            metal: metal.to_string(),
                        })
                    }
                },
            }
        };

        Ok(PortResolution {
            port: port.to_string(),
            country: country.to_string(),
            freight_multiplier,
            tariff_rate: tariff.tariff_rate,
            metal_tariff: tariff.metal_tariff,
            duty_multiplier: self.duty_multiplier(supplier, part.metal_type.as_deref(), &part.division),
            exempt_division,
            tariff_defaulted,
        })
    }

    /// 基准价画像: 运费/关税取现供应商，关税附加不套用供应商豁免
    pub fn resolve_benchmark(
        &self,
        part: &Part,
        incumbent: &SupplierId,
        policy: TariffPolicy,
    ) -> Result<PortResolution, ResolveError> {
        let mut resolution = self.resolve(part, incumbent, policy)?;
        resolution.duty_multiplier = self.metal_duty(part.metal_type.as_deref(), &part.division);
        Ok(resolution)
    }

    pub fn port_of(&self, row_id: &str, supplier: &SupplierId) -> Option<&'a str> {
        self.data.supplier_ports.port(row_id, supplier)
    }

    /// 仅查港口所属国家（不要求运费/关税齐全）
    pub fn country_of(&self, row_id: &str, supplier: &SupplierId) -> Option<&'a str> {
        let port = self.port_of(row_id, supplier)?;
        self.data.port_countries.country(port)
    }
}
