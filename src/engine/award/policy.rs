// ==========================================
// 到岸成本定标系统 - 定标策略接口
// ==========================================
// 策略按固定顺序依次作用于决策表，后写者生效
// 每个策略只改派，不增删零件
// 用量上限不入链: 分桶时按输入顺序拦截
// ==========================================

use crate::config::{CapMetric, PolicyConfig};
use crate::domain::decision::DecisionTable;
use crate::domain::types::SupplierId;
use crate::engine::award::context::AwardContext;
use crate::engine::award::policies::{
    DiscontinuedSupplierPolicy, FallbackExclusionPolicy, RestrictedPartsPolicy,
    SupplierExclusionPolicy, TailRationalizationPolicy, VolumeCapPolicy,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

// ==========================================
// AwardPolicy Trait
// ==========================================
pub trait AwardPolicy {
    /// 策略名（日志与报告）
    fn name(&self) -> String;

    /// 作用于决策表
    fn apply(
        &self,
        table: &mut DecisionTable,
        ctx: &AwardContext<'_>,
        acc: &mut AwardAccumulator,
    ) -> PolicyReport;
}

// ==========================================
// AwardAccumulator - 跨策略累计量
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AwardAccumulator {
    totals: HashMap<(SupplierId, CapMetric), Decimal>,
}

impl AwardAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, supplier: &SupplierId, metric: CapMetric) -> Decimal {
        self.totals
            .get(&(supplier.clone(), metric))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn add(&mut self, supplier: &SupplierId, metric: CapMetric, amount: Decimal) {
        *self.totals.entry((supplier.clone(), metric)).or_default() += amount;
    }

    /// (供应商, 口径, 累计值)，按供应商名排序
    pub fn entries(&self) -> Vec<(SupplierId, CapMetric, Decimal)> {
        let mut entries: Vec<_> = self
            .totals
            .iter()
            .map(|((s, m), v)| (s.clone(), *m, *v))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.label().cmp(b.1.label())));
        entries
    }
}

// ==========================================
// PolicyReport - 单策略执行报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyReport {
    pub policy: String,
    /// 命中策略条件的零件数
    pub examined: usize,
    /// 改派成功数
    pub reassigned: usize,
    /// 保留原供应商（无替代或改派失败）
    pub kept: usize,
}

impl PolicyReport {
    pub fn new(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, reassigned: bool) {
        self.examined += 1;
        if reassigned {
            self.reassigned += 1;
        } else {
            self.kept += 1;
        }
    }
}

/// 由配置构造策略链（保持配置顺序，跳过用量上限）
pub fn build_policies(configs: &[PolicyConfig]) -> Vec<Box<dyn AwardPolicy>> {
    configs
        .iter()
        .filter_map(|config| -> Option<Box<dyn AwardPolicy>> {
            match config {
                PolicyConfig::FallbackExclusion {
                    supplier,
                    fallback,
                    part_numbers,
                } => Some(Box::new(FallbackExclusionPolicy::new(supplier, fallback, part_numbers))),
                PolicyConfig::SupplierExclusion { supplier } => {
                    Some(Box::new(SupplierExclusionPolicy::new(supplier)))
                }
                PolicyConfig::RestrictedParts {
                    supplier,
                    label,
                    row_ids,
                } => Some(Box::new(RestrictedPartsPolicy::new(supplier, label, row_ids))),
                PolicyConfig::DiscontinuedSupplier { suppliers } => {
                    Some(Box::new(DiscontinuedSupplierPolicy::new(suppliers)))
                }
                PolicyConfig::TailRationalization {
                    threshold,
                    candidates,
                } => Some(Box::new(TailRationalizationPolicy::new(*threshold, candidates.as_deref()))),
                PolicyConfig::VolumeCap { .. } => None,
            }
        })
        .collect()
}

/// 由配置收集用量上限（保持配置顺序）
pub fn build_caps(configs: &[PolicyConfig]) -> Vec<VolumeCapPolicy> {
    configs
        .iter()
        .filter_map(|config| match config {
            PolicyConfig::VolumeCap {
                supplier,
                metric,
                cap,
                retain_incumbents,
                allowed_incumbents,
            } => Some(VolumeCapPolicy::new(
                supplier,
                *metric,
                *cap,
                retain_incumbents,
                allowed_incumbents.as_deref(),
            )),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_policies;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accumulator_is_keyed_by_supplier_and_metric() {
        let mut acc = AwardAccumulator::new();
        let manek = SupplierId::from("Manek Metalcraft");
        acc.add(&manek, CapMetric::Volume, dec!(100));
        acc.add(&manek, CapMetric::Volume, dec!(50));
        acc.add(&manek, CapMetric::FobSpend, dec!(7));
        assert_eq!(acc.get(&manek, CapMetric::Volume), dec!(150));
        assert_eq!(acc.get(&manek, CapMetric::FobSpend), dec!(7));
        assert_eq!(acc.get(&SupplierId::from("Other"), CapMetric::Volume), Decimal::ZERO);
        assert_eq!(acc.entries().len(), 2);
    }

    #[test]
    fn test_build_default_chain_keeps_order() {
        let policies = build_policies(&default_policies());
        let kinds: Vec<String> = policies.iter().map(|p| p.name()).collect();
        assert_eq!(kinds.len(), 5);
        assert!(kinds[0].starts_with("fallback_exclusion"));
        assert!(kinds[4].starts_with("tail_rationalization"));

        let caps: Vec<String> = build_caps(&default_policies()).iter().map(|c| c.name()).collect();
        assert_eq!(caps.len(), 3);
        assert!(caps.iter().all(|c| c.starts_with("volume_cap")));
    }
}
