// ==========================================
// 到岸成本定标系统 - 节约计算引擎
// ==========================================
// 节约比例 = (基准 − 候选) / 基准，四位小数
// 节约金额 = 节约比例 × 扩展成本
// FOB 口径用 FOB 扩展成本，到岸口径用到岸扩展成本，两条口径并行保留
// 红线: 无基准 → 全部为 None，可授标为三态"无基准"
// ==========================================

use crate::domain::cost_sheet::{CherryPick, RankedBid};
use crate::domain::types::{round4, Awardable, SupplierId};
use rust_decimal::Decimal;

pub struct SavingsCalculator;

impl Default for SavingsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl SavingsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// 节约比例；基准或候选缺失/为 0 → None
    pub fn pct(&self, baseline: Option<Decimal>, candidate: Option<Decimal>) -> Option<Decimal> {
        let b = baseline.filter(|b| !b.is_zero())?;
        let c = candidate.filter(|c| !c.is_zero())?;
        Some(round4((b - c) / b))
    }

    /// 节约金额
    pub fn usd(&self, pct: Option<Decimal>, basis: Option<Decimal>) -> Option<Decimal> {
        match (pct, basis) {
            (Some(p), Some(b)) => Some(round4(p * b)),
            _ => None,
        }
    }

    /// 按节约比例 + 金额一次算出（受基准门控）
    pub fn savings(
        &self,
        has_baseline: bool,
        baseline: Option<Decimal>,
        candidate: Option<Decimal>,
        basis: Option<Decimal>,
    ) -> (Option<Decimal>, Option<Decimal>) {
        if !has_baseline {
            return (None, None);
        }
        let pct = self.pct(baseline, candidate);
        (pct, self.usd(pct, basis))
    }

    /// 升序排名，并列保持输入顺序（稳定排序）
    pub fn rank_bids<I>(&self, bids: I) -> Vec<RankedBid>
    where
        I: IntoIterator<Item = (SupplierId, Decimal)>,
    {
        let mut ranked: Vec<RankedBid> = bids
            .into_iter()
            .map(|(supplier, value)| RankedBid { supplier, value })
            .collect();
        ranked.sort_by(|a, b| a.value.cmp(&b.value));
        ranked
    }

    /// 最低价/次低价 + 挑选节约 + 可授标
    pub fn cherry_pick(
        &self,
        ranked: &[RankedBid],
        has_baseline: bool,
        baseline: Option<Decimal>,
        basis: Option<Decimal>,
    ) -> CherryPick {
        let min = ranked.first().cloned();
        let second = ranked.get(1).cloned();
        let (savings_pct, savings_usd) =
            self.savings(has_baseline, baseline, min.as_ref().map(|m| m.value), basis);
        let awardable = if has_baseline {
            Some(Awardable::from_pct(savings_pct))
        } else {
            None
        };
        CherryPick {
            min,
            second,
            savings_pct,
            savings_usd,
            awardable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pct_and_usd() {
        let calc = SavingsCalculator::new();
        let pct = calc.pct(Some(dec!(1.50)), Some(dec!(1.20)));
        assert_eq!(pct, Some(dec!(0.2000)));
        assert_eq!(calc.usd(pct, Some(dec!(150))), Some(dec!(30.0000)));
        assert_eq!(calc.pct(Some(Decimal::ZERO), Some(dec!(1))), None);
        assert_eq!(calc.pct(Some(dec!(1)), None), None);
    }

    #[test]
    fn test_no_baseline_is_unavailable() {
        let calc = SavingsCalculator::new();
        assert_eq!(
            calc.savings(false, Some(dec!(1)), Some(dec!(0.5)), Some(dec!(10))),
            (None, None)
        );
        let ranked = calc.rank_bids(vec![(SupplierId::from("A"), dec!(1))]);
        let pick = calc.cherry_pick(&ranked, false, None, None);
        assert_eq!(pick.awardable(), Awardable::NoBaseline);
        assert!(pick.savings_pct.is_none());
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let calc = SavingsCalculator::new();
        let ranked = calc.rank_bids(vec![
            (SupplierId::from("B"), dec!(2)),
            (SupplierId::from("A"), dec!(1)),
            (SupplierId::from("C"), dec!(1)),
        ]);
        let order: Vec<&str> = ranked.iter().map(|r| r.supplier.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
    }

    #[test]
    fn test_awardable_requires_positive_savings() {
        let calc = SavingsCalculator::new();
        let ranked = calc.rank_bids(vec![(SupplierId::from("A"), dec!(2))]);
        let pick = calc.cherry_pick(&ranked, true, Some(dec!(2)), Some(dec!(100)));
        assert_eq!(pick.savings_pct, Some(Decimal::ZERO));
        assert_eq!(pick.awardable(), Awardable::No);
    }
}
