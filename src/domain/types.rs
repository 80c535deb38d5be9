// ==========================================
// 到岸成本定标系统 - 领域类型定义
// ==========================================
// 金额一律使用 Decimal，统一四位小数、四舍五入（half-up）
// 缺失值统一使用 Option::None，输出时渲染为哨兵 "-"
// ==========================================

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// 零件行号（ROW ID #）
pub type RowId = String;

/// 缺失值哨兵
pub const UNAVAILABLE: &str = "-";

/// 金额/比例统一保留位数
pub const MONEY_DP: u32 = 4;

/// 四位小数四舍五入（half-up，远离零）
pub fn round4(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// 渲染可缺失数值
pub fn fmt_opt(value: Option<Decimal>) -> String {
    match value {
        Some(v) => v.normalize().to_string(),
        None => UNAVAILABLE.to_string(),
    }
}

// ==========================================
// 供应商标识 (Supplier Id)
// ==========================================
// 供应商作为一等键，不再依赖列名后缀匹配
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(String);

impl SupplierId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SupplierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SupplierId {
    fn from(value: &str) -> Self {
        SupplierId::new(value)
    }
}

impl From<String> for SupplierId {
    fn from(value: String) -> Self {
        SupplierId::new(value)
    }
}

impl Borrow<str> for SupplierId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ==========================================
// 报价轮次 (Bid Round)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Round {
    R1,
    R2,
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::R1 => write!(f, "R1"),
            Round::R2 => write!(f, "R2"),
        }
    }
}

// ==========================================
// 可授标标识 (Awardable)
// ==========================================
// 红线: 三态，不是布尔；无基准时为"未定义"，不是 No
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Awardable {
    Yes,
    No,
    NoBaseline,
}

impl Awardable {
    /// 由节约比例推导：> 0 → Yes，<= 0 → No，缺失 → NoBaseline
    pub fn from_pct(pct: Option<Decimal>) -> Self {
        match pct {
            Some(p) if p > Decimal::ZERO => Awardable::Yes,
            Some(_) => Awardable::No,
            None => Awardable::NoBaseline,
        }
    }
}

impl fmt::Display for Awardable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Awardable::Yes => write!(f, "Yes"),
            Awardable::No => write!(f, "No"),
            Awardable::NoBaseline => write!(f, "No baseline or bid"),
        }
    }
}

// ==========================================
// 定标分桶 (Award Bucket)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AwardBucket {
    Unassigned,             // 无有效报价
    IncumbentRetained,      // 保留现供应商
    MustAssignMinBid,       // 现供应商未报价，强制最低价
    CandidateForReassignment, // 现供应商报价但非最低
}

impl fmt::Display for AwardBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwardBucket::Unassigned => write!(f, "UNASSIGNED"),
            AwardBucket::IncumbentRetained => write!(f, "INCUMBENT_RETAINED"),
            AwardBucket::MustAssignMinBid => write!(f, "MUST_ASSIGN_MIN_BID"),
            AwardBucket::CandidateForReassignment => write!(f, "CANDIDATE_FOR_REASSIGNMENT"),
        }
    }
}

// ==========================================
// 量价区间 (Volume Band)
// ==========================================
// 11 个固定区间，按平均订单量落档
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeBand {
    B1To50,
    B51To200,
    B201To500,
    B501To1000,
    B1001To2000,
    B2001To5000,
    B5001To10000,
    B10001To25000,
    B25001To100000,
    B100001To250000,
    B250001Plus,
}

impl VolumeBand {
    pub const ALL: [VolumeBand; 11] = [
        VolumeBand::B1To50,
        VolumeBand::B51To200,
        VolumeBand::B201To500,
        VolumeBand::B501To1000,
        VolumeBand::B1001To2000,
        VolumeBand::B2001To5000,
        VolumeBand::B5001To10000,
        VolumeBand::B10001To25000,
        VolumeBand::B25001To100000,
        VolumeBand::B100001To250000,
        VolumeBand::B250001Plus,
    ];

    /// 区间下限/上限（含），最后一档无上限
    pub fn bounds(&self) -> (i64, Option<i64>) {
        match self {
            VolumeBand::B1To50 => (1, Some(50)),
            VolumeBand::B51To200 => (51, Some(200)),
            VolumeBand::B201To500 => (201, Some(500)),
            VolumeBand::B501To1000 => (501, Some(1000)),
            VolumeBand::B1001To2000 => (1001, Some(2000)),
            VolumeBand::B2001To5000 => (2001, Some(5000)),
            VolumeBand::B5001To10000 => (5001, Some(10000)),
            VolumeBand::B10001To25000 => (10001, Some(25000)),
            VolumeBand::B25001To100000 => (25001, Some(100000)),
            VolumeBand::B100001To250000 => (100001, Some(250000)),
            VolumeBand::B250001Plus => (250001, None),
        }
    }

    /// 价格表中的列名
    pub fn label(&self) -> &'static str {
        match self {
            VolumeBand::B1To50 => "1-50",
            VolumeBand::B51To200 => "51-200",
            VolumeBand::B201To500 => "201-500",
            VolumeBand::B501To1000 => "501-1000",
            VolumeBand::B1001To2000 => "1001-2000",
            VolumeBand::B2001To5000 => "2001-5000",
            VolumeBand::B5001To10000 => "5001-10000",
            VolumeBand::B10001To25000 => "10001-25000",
            VolumeBand::B25001To100000 => "25001-100000",
            VolumeBand::B100001To250000 => "100001-250000",
            VolumeBand::B250001Plus => "250001+",
        }
    }

    /// 按平均订单量落档
    ///
    /// 区间按闭区间比较，落在两档缝隙中的小数（如 50.5）不属于任何一档
    pub fn for_quantity(quantity: Decimal) -> Option<VolumeBand> {
        VolumeBand::ALL.iter().copied().find(|band| {
            let (low, high) = band.bounds();
            let above_low = quantity >= Decimal::from(low);
            let below_high = high.map_or(true, |h| quantity <= Decimal::from(h));
            above_low && below_high
        })
    }
}

impl fmt::Display for VolumeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round4_half_up() {
        assert_eq!(round4(dec!(1.23455)), dec!(1.2346));
        assert_eq!(round4(dec!(1.23454)), dec!(1.2345));
        assert_eq!(round4(dec!(-0.00005)), dec!(-0.0001));
    }

    #[test]
    fn test_volume_band_edges() {
        assert_eq!(VolumeBand::for_quantity(dec!(1)), Some(VolumeBand::B1To50));
        assert_eq!(VolumeBand::for_quantity(dec!(50)), Some(VolumeBand::B1To50));
        assert_eq!(VolumeBand::for_quantity(dec!(51)), Some(VolumeBand::B51To200));
        assert_eq!(
            VolumeBand::for_quantity(dec!(250001)),
            Some(VolumeBand::B250001Plus)
        );
        assert_eq!(VolumeBand::for_quantity(dec!(0)), None);
        assert_eq!(VolumeBand::for_quantity(dec!(50.5)), None);
    }

    #[test]
    fn test_awardable_tri_state() {
        assert_eq!(Awardable::from_pct(Some(dec!(0.01))), Awardable::Yes);
        assert_eq!(Awardable::from_pct(Some(dec!(0))), Awardable::No);
        assert_eq!(Awardable::from_pct(None), Awardable::NoBaseline);
        assert_eq!(Awardable::NoBaseline.to_string(), "No baseline or bid");
    }

    #[test]
    fn test_supplier_id_default_is_empty() {
        assert_eq!(SupplierId::default().as_str(), "");
        assert_eq!(SupplierId::new("  Coda "), SupplierId::from("Coda"));
    }

    #[test]
    fn test_supplier_id_trims() {
        assert_eq!(SupplierId::new("  Coda "), SupplierId::from("Coda"));
    }
}
