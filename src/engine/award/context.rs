// ==========================================
// 到岸成本定标系统 - 定标上下文
// ==========================================
// 职责: 为"把零件授予某供应商"计算整行字段，并原子提交
// 红线: 改派前先算齐全部字段，失败时保留原决策（只记日志）
// ==========================================

use crate::domain::cost_sheet::{ConsolidatedSheet, PartCostSheet, RankedBid};
use crate::domain::decision::{Assignment, DecisionTable};
use crate::domain::part::Part;
use crate::domain::types::{round4, AwardBucket, SupplierId};
use crate::engine::landed_cost::LandedCostCalculator;
use crate::engine::resolver::{ReferenceResolver, ResolveError, TariffPolicy};
use crate::engine::savings::SavingsCalculator;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

// ==========================================
// 改派错误（逐行收敛）
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReassignError {
    #[error("零件不存在: {0}")]
    UnknownPart(String),

    #[error("零件 {row_id} 上供应商 {supplier} 无可用到岸报价")]
    NoViableBid { row_id: String, supplier: String },

    #[error("零件 {row_id} 现供应商基准到岸成本不可用: {source}")]
    Reference {
        row_id: String,
        #[source]
        source: ResolveError,
    },
}

// ==========================================
// AwardContext
// ==========================================
pub struct AwardContext<'a> {
    pub sheet: &'a ConsolidatedSheet,
    resolver: ReferenceResolver<'a>,
    landed: LandedCostCalculator,
    savings: SavingsCalculator,
    incumbents: BTreeSet<SupplierId>,
}

impl<'a> AwardContext<'a> {
    pub fn new(sheet: &'a ConsolidatedSheet, resolver: ReferenceResolver<'a>) -> Self {
        Self {
            sheet,
            resolver,
            landed: LandedCostCalculator::new(),
            savings: SavingsCalculator::new(),
            incumbents: sheet.incumbent_set(),
        }
    }

    /// 全部现供应商
    pub fn incumbents(&self) -> &BTreeSet<SupplierId> {
        &self.incumbents
    }

    pub fn resolver(&self) -> &ReferenceResolver<'a> {
        &self.resolver
    }

    fn lookup(&self, row_id: &str) -> Result<(&'a Part, &'a PartCostSheet), ReassignError> {
        match (self.sheet.part(row_id), self.sheet.get(row_id)) {
            (Some(part), Some(cost)) => Ok((part, cost)),
            _ => Err(ReassignError::UnknownPart(row_id.to_string())),
        }
    }

    /// 现供应商基准到岸成本
    ///
    /// 基准价 × (运费 + 关税 + 金属关税)，不含关税附加；关税缺失即不可用
    pub fn incumbent_derived_landed(&self, row_id: &str) -> Result<Decimal, ReassignError> {
        let (part, cost) = self.lookup(row_id)?;
        let incumbent = cost
            .incumbent
            .as_ref()
            .ok_or_else(|| ReassignError::NoViableBid {
                row_id: row_id.to_string(),
                supplier: crate::domain::types::UNAVAILABLE.to_string(),
            })?;
        let resolution = self
            .resolver
            .resolve(part, incumbent, TariffPolicy::Require)
            .map_err(|source| ReassignError::Reference {
                row_id: row_id.to_string(),
                source,
            })?
            .without_duty();
        self.landed
            .landed_cost(cost.benchmark, &resolution)
            .ok_or_else(|| ReassignError::NoViableBid {
                row_id: row_id.to_string(),
                supplier: incumbent.to_string(),
            })
    }

    /// 到岸可比报价升序（排除指定供应商，并列保持输入顺序）
    pub fn ranked_alternatives(&self, row_id: &str, excluding: &[&SupplierId]) -> Vec<RankedBid> {
        match self.sheet.get(row_id) {
            Some(cost) => self.savings.rank_bids(
                cost.viable_quotes()
                    .filter(|q| !excluding.contains(&&q.supplier))
                    .filter_map(|q| q.landed.map(|v| (q.supplier.clone(), v))),
            ),
            None => Vec::new(),
        }
    }

    /// 次低到岸报价（排除当前供应商）
    pub fn next_lowest(&self, row_id: &str, current: &SupplierId) -> Option<RankedBid> {
        self.ranked_alternatives(row_id, &[current]).into_iter().next()
    }

    pub fn has_viable_bid(&self, row_id: &str, supplier: &SupplierId) -> bool {
        self.sheet
            .get(row_id)
            .and_then(|c| c.quote(supplier))
            .map_or(false, |q| q.landed.is_some())
    }

    /// 授予 supplier 时的整行字段
    pub fn assignment_for(
        &self,
        row_id: &str,
        supplier: &SupplierId,
        bucket: AwardBucket,
        reason: impl Into<String>,
    ) -> Result<Assignment, ReassignError> {
        let (part, cost) = self.lookup(row_id)?;
        let quote = cost.quote(supplier);
        let is_incumbent = cost.incumbent.as_ref() == Some(supplier);

        let (fob_quote, fob_savings_pct, fob_savings_usd, landed_cost, landed_savings_pct, landed_savings_usd) =
            match quote.filter(|q| q.landed.is_some()) {
                Some(q) => (
                    Some(q.fob),
                    q.fob_savings_pct,
                    q.fob_savings_usd,
                    q.landed,
                    q.landed_savings_pct,
                    q.landed_savings_usd,
                ),
                // 现供应商无可用报价: 基准价走自身画像
                None if is_incumbent => {
                    let derived = self.incumbent_derived_landed(row_id)?;
                    let (landed_pct, landed_usd) = self.savings.savings(
                        cost.has_baseline(),
                        cost.benchmark_landed,
                        Some(derived),
                        cost.landed_extended_cost,
                    );
                    match quote {
                        Some(q) => (
                            Some(q.fob),
                            q.fob_savings_pct,
                            q.fob_savings_usd,
                            Some(derived),
                            landed_pct,
                            landed_usd,
                        ),
                        None => (cost.benchmark, None, None, Some(derived), landed_pct, landed_usd),
                    }
                }
                None => {
                    return Err(ReassignError::NoViableBid {
                        row_id: row_id.to_string(),
                        supplier: supplier.to_string(),
                    })
                }
            };

        let landed_extended_cost = landed_cost
            .zip(part.annual_volume)
            .map(|(l, v)| round4(l * v));

        Ok(Assignment {
            selected: Some(supplier.clone()),
            bucket,
            reason: reason.into(),
            fob_quote,
            fob_savings_pct,
            fob_savings_usd,
            landed_savings_pct,
            landed_savings_usd,
            landed_cost,
            landed_extended_cost,
            is_totally_new: !self.incumbents.contains(supplier),
            part_switched: !is_incumbent,
        })
    }

    /// 改派: 先算齐字段再整行提交
    pub fn reassign(
        &self,
        table: &mut DecisionTable,
        row_id: &str,
        supplier: &SupplierId,
        bucket: AwardBucket,
        reason: impl Into<String>,
    ) -> Result<(), ReassignError> {
        let assignment = self.assignment_for(row_id, supplier, bucket, reason)?;
        if table.commit(row_id, assignment) {
            Ok(())
        } else {
            Err(ReassignError::UnknownPart(row_id.to_string()))
        }
    }

    /// 改派失败时记日志并保留原决策，返回是否成功
    pub fn try_reassign(
        &self,
        table: &mut DecisionTable,
        row_id: &str,
        supplier: &SupplierId,
        bucket: AwardBucket,
        reason: impl Into<String>,
    ) -> bool {
        match self.reassign(table, row_id, supplier, bucket, reason) {
            Ok(()) => true,
            Err(e) => {
                warn!(row_id = %row_id, supplier = %supplier, error = %e, "改派失败，保留原决策");
                false
            }
        }
    }

    /// 更新原因（供应商与数据不变）
    pub fn annotate(&self, table: &mut DecisionTable, row_id: &str, reason: impl Into<String>) {
        if let Some(decision) = table.get(row_id) {
            let mut assignment = decision.assignment.clone();
            assignment.reason = reason.into();
            table.commit(row_id, assignment);
        }
    }
}
