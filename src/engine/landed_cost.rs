// ==========================================
// 到岸成本定标系统 - 到岸成本计算器
// ==========================================
// 免关税事业部: 单价 × 运费系数
// 其他事业部:   单价 × (运费系数 + 从价税率 + 金属附加税 + 关税附加)
// 红线: 单价为 0 或缺失 → 不可用（None），不产生 0 成本
// 红线: 基准价与供应商报价走同一套系数，不允许分叉
// ==========================================

use crate::domain::types::round4;
use crate::engine::resolver::PortResolution;
use rust_decimal::Decimal;

// ==========================================
// LandedCostCalculator
// ==========================================
pub struct LandedCostCalculator;

impl Default for LandedCostCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl LandedCostCalculator {
    pub fn new() -> Self {
        Self
    }

    /// 到岸单价（四位小数）
    pub fn landed_cost(&self, unit_price: Option<Decimal>, resolution: &PortResolution) -> Option<Decimal> {
        let price = unit_price.filter(|p| *p > Decimal::ZERO)?;
        Some(round4(price * resolution.total_multiplier()))
    }

    /// 扩展成本 = 年用量 × 单价
    pub fn extended(&self, volume: Option<Decimal>, unit: Option<Decimal>) -> Option<Decimal> {
        match (volume, unit) {
            (Some(v), Some(u)) => Some(round4(v * u)),
            _ => None,
        }
    }
}
