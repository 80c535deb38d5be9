// ==========================================
// 到岸成本定标系统 - 覆写策略实现
// ==========================================
// 1. FallbackExclusion:    指定零件号排除某供应商 → 固定备选
// 2. SupplierExclusion:    整体排除某供应商 → 次低到岸价
// 3. RestrictedParts:      限定行号排除某供应商 → 次低到岸价
// 4. DiscontinuedSupplier: 停供供应商 → 次低价 / 现供应商
// 5. TailRationalization:  尾部供应商 → 大供应商
// 6. VolumeCap:            用量/金额上限 → 次低价 / 现供应商（分桶时拦截）
// 红线: 改派失败保留原决策；尾部整合不得改派大供应商
// ==========================================

use crate::config::{CapMetric, DiscontinuedList};
use crate::domain::decision::{Assignment, AwardDecision, DecisionTable};
use crate::domain::types::{AwardBucket, RowId, SupplierId};
use crate::engine::award::context::AwardContext;
use crate::engine::award::policy::{AwardAccumulator, AwardPolicy, PolicyReport};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

const FORCED_TO_INCUMBENT: &str = "Forced to incumbent because no other bid on it.";
const HAS_TO_STAY: &str = "Has to stay with it.";
const NO_ALTERNATIVE: &str = "No alternative suppliers available";
const RATIONALIZED: &str = "Rationalized to other bidder than than bidder based on logic";
const INCUMBENT_ANYWAY: &str = "incumbent anyway";

/// 改派后的分桶: 回到现供应商即保留，否则沿用原分桶
fn bucket_after(decision: &AwardDecision, next: &SupplierId) -> AwardBucket {
    if decision.incumbent.as_ref() == Some(next) {
        AwardBucket::IncumbentRetained
    } else if decision.bucket() == AwardBucket::IncumbentRetained {
        AwardBucket::CandidateForReassignment
    } else {
        decision.bucket()
    }
}

/// 改派并记账
fn move_to(
    ctx: &AwardContext<'_>,
    table: &mut DecisionTable,
    row_id: &str,
    next: &SupplierId,
    reason: String,
) -> bool {
    let bucket = match table.get(row_id) {
        Some(decision) => bucket_after(decision, next),
        None => return false,
    };
    ctx.try_reassign(table, row_id, next, bucket, reason)
}

fn supplier_set(names: &[String]) -> HashSet<SupplierId> {
    names.iter().map(|n| SupplierId::from(n.trim())).collect()
}

/// 唯一有效报价时: 现供应商即当前 → 只能保留；否则强制回现供应商
fn single_bid_fallback(
    current: &SupplierId,
    incumbent: Option<&SupplierId>,
) -> Result<(SupplierId, String), String> {
    match incumbent {
        Some(inc) if inc != current => Ok((inc.clone(), FORCED_TO_INCUMBENT.to_string())),
        _ => Err(HAS_TO_STAY.to_string()),
    }
}

// ==========================================
// 1. FallbackExclusionPolicy
// ==========================================
pub struct FallbackExclusionPolicy {
    supplier: SupplierId,
    fallback: SupplierId,
    part_numbers: HashSet<String>,
}

impl FallbackExclusionPolicy {
    pub fn new(supplier: &str, fallback: &str, part_numbers: &[String]) -> Self {
        Self {
            supplier: SupplierId::from(supplier.trim()),
            fallback: SupplierId::from(fallback.trim()),
            part_numbers: part_numbers
                .iter()
                .map(|p| p.trim().to_uppercase())
                .collect(),
        }
    }
}

impl AwardPolicy for FallbackExclusionPolicy {
    fn name(&self) -> String {
        format!("fallback_exclusion({})", self.supplier)
    }

    fn apply(
        &self,
        table: &mut DecisionTable,
        ctx: &AwardContext<'_>,
        _acc: &mut AwardAccumulator,
    ) -> PolicyReport {
        let mut report = PolicyReport::new(self.name());
        for row_id in table.rows_selecting(&self.supplier) {
            let listed = ctx
                .sheet
                .part(&row_id)
                .map_or(false, |p| self.part_numbers.contains(&p.normalized_part_id()));
            if !listed {
                continue;
            }
            let reason = format!("{} avoided: Defaulted to {}", self.supplier, self.fallback);
            report.record(move_to(ctx, table, &row_id, &self.fallback, reason));
        }
        info!(policy = %report.policy, reassigned = report.reassigned, kept = report.kept, "策略执行完成");
        report
    }
}

// ==========================================
// 2/3. 排除类策略（次低到岸价）
// ==========================================
fn exclude_supplier(
    ctx: &AwardContext<'_>,
    table: &mut DecisionTable,
    row_id: &str,
    supplier: &SupplierId,
    prefix: &str,
) -> bool {
    match ctx.next_lowest(row_id, supplier) {
        Some(bid) => {
            let reason = format!(
                "{}: Reassigned to lowest bidder excluding {} (${:.2})",
                prefix, supplier, bid.value
            );
            move_to(ctx, table, row_id, &bid.supplier, reason)
        }
        None => {
            debug!(row_id = %row_id, supplier = %supplier, "无替代供应商，保留");
            ctx.annotate(table, row_id, format!("{} kept: {}", supplier, NO_ALTERNATIVE));
            false
        }
    }
}

pub struct SupplierExclusionPolicy {
    supplier: SupplierId,
}

impl SupplierExclusionPolicy {
    pub fn new(supplier: &str) -> Self {
        Self {
            supplier: SupplierId::from(supplier.trim()),
        }
    }
}

impl AwardPolicy for SupplierExclusionPolicy {
    fn name(&self) -> String {
        format!("supplier_exclusion({})", self.supplier)
    }

    fn apply(
        &self,
        table: &mut DecisionTable,
        ctx: &AwardContext<'_>,
        _acc: &mut AwardAccumulator,
    ) -> PolicyReport {
        let mut report = PolicyReport::new(self.name());
        let prefix = format!("{} avoided", self.supplier);
        for row_id in table.rows_selecting(&self.supplier) {
            report.record(exclude_supplier(ctx, table, &row_id, &self.supplier, &prefix));
        }
        info!(policy = %report.policy, reassigned = report.reassigned, kept = report.kept, "策略执行完成");
        report
    }
}

pub struct RestrictedPartsPolicy {
    supplier: SupplierId,
    label: String,
    row_ids: HashSet<RowId>,
}

impl RestrictedPartsPolicy {
    pub fn new(supplier: &str, label: &str, row_ids: &[String]) -> Self {
        Self {
            supplier: SupplierId::from(supplier.trim()),
            label: label.to_string(),
            row_ids: row_ids.iter().map(|r| r.trim().to_string()).collect(),
        }
    }
}

impl AwardPolicy for RestrictedPartsPolicy {
    fn name(&self) -> String {
        format!("restricted_parts({}, {})", self.supplier, self.label)
    }

    fn apply(
        &self,
        table: &mut DecisionTable,
        ctx: &AwardContext<'_>,
        _acc: &mut AwardAccumulator,
    ) -> PolicyReport {
        let mut report = PolicyReport::new(self.name());
        let prefix = format!("{} avoided for {}", self.supplier, self.label);
        for row_id in table.rows_selecting(&self.supplier) {
            if !self.row_ids.contains(&row_id) {
                continue;
            }
            report.record(exclude_supplier(ctx, table, &row_id, &self.supplier, &prefix));
        }
        info!(policy = %report.policy, reassigned = report.reassigned, kept = report.kept, "策略执行完成");
        report
    }
}

// ==========================================
// 4. DiscontinuedSupplierPolicy
// ==========================================
pub struct DiscontinuedSupplierPolicy {
    lists: Vec<(SupplierId, HashSet<RowId>)>,
}

impl DiscontinuedSupplierPolicy {
    pub fn new(lists: &[DiscontinuedList]) -> Self {
        Self {
            lists: lists
                .iter()
                .map(|l| {
                    (
                        SupplierId::from(l.supplier.trim()),
                        l.row_ids.iter().map(|r| r.trim().to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// 停供后的下一选择
    fn next_best(
        ctx: &AwardContext<'_>,
        row_id: &str,
        current: &SupplierId,
        incumbent: Option<&SupplierId>,
        valid: u32,
    ) -> Result<(SupplierId, String), String> {
        if valid == 1 {
            return single_bid_fallback(current, incumbent);
        }
        if let Some(bid) = ctx.next_lowest(row_id, current) {
            return Ok((bid.supplier, format!("Lowest bidder other than {}", current)));
        }
        single_bid_fallback(current, incumbent).map_err(|_| NO_ALTERNATIVE.to_string())
    }
}

impl AwardPolicy for DiscontinuedSupplierPolicy {
    fn name(&self) -> String {
        let names: Vec<&str> = self.lists.iter().map(|(s, _)| s.as_str()).collect();
        format!("discontinued_supplier({})", names.join(", "))
    }

    fn apply(
        &self,
        table: &mut DecisionTable,
        ctx: &AwardContext<'_>,
        _acc: &mut AwardAccumulator,
    ) -> PolicyReport {
        let mut report = PolicyReport::new(self.name());
        for (supplier, rows) in &self.lists {
            for row_id in table.rows_selecting(supplier) {
                let valid = ctx.sheet.get(&row_id).map_or(0, |c| c.valid_supplier_count);
                if !rows.contains(&row_id) || valid < 1 {
                    continue;
                }
                let incumbent = table.get(&row_id).and_then(|d| d.incumbent.clone());
                match Self::next_best(ctx, &row_id, supplier, incumbent.as_ref(), valid) {
                    Ok((next, inner)) => {
                        let reason = format!("{} no longer supplies: {}", supplier, inner);
                        report.record(move_to(ctx, table, &row_id, &next, reason));
                    }
                    Err(inner) => {
                        ctx.annotate(
                            table,
                            &row_id,
                            format!("{} no longer supplies: {}", supplier, inner),
                        );
                        report.record(false);
                    }
                }
            }
        }
        info!(policy = %report.policy, reassigned = report.reassigned, kept = report.kept, "策略执行完成");
        report
    }
}

// ==========================================
// 5. TailRationalizationPolicy
// ==========================================
// 大供应商: 已授标到岸扩展成本合计 >= 阈值（进入本策略时快照）
pub struct TailRationalizationPolicy {
    threshold: Decimal,
    candidates: Option<Vec<SupplierId>>,
}

impl TailRationalizationPolicy {
    pub fn new(threshold: Decimal, candidates: Option<&[String]>) -> Self {
        Self {
            threshold,
            candidates: candidates.map(|c| c.iter().map(|n| SupplierId::from(n.trim())).collect()),
        }
    }

    /// (大供应商, 尾部供应商)
    pub fn partition(&self, table: &DecisionTable) -> (BTreeSet<SupplierId>, BTreeSet<SupplierId>) {
        let totals = table.awarded_landed_totals();
        let large: BTreeSet<SupplierId> = totals
            .iter()
            .filter(|(_, total)| **total >= self.threshold)
            .map(|(s, _)| s.clone())
            .collect();
        let tail: BTreeSet<SupplierId> = match &self.candidates {
            Some(candidates) => candidates
                .iter()
                .filter(|s| !large.contains(*s))
                .cloned()
                .collect(),
            None => totals
                .keys()
                .filter(|s| !large.contains(*s))
                .cloned()
                .collect(),
        };
        (large, tail)
    }

    fn next_large(
        ctx: &AwardContext<'_>,
        row_id: &str,
        current: &SupplierId,
        incumbent: Option<&SupplierId>,
        valid: u32,
        large: &BTreeSet<SupplierId>,
    ) -> Result<(SupplierId, String), String> {
        if valid == 1 {
            return single_bid_fallback(current, incumbent);
        }
        if let Some(inc) = incumbent {
            if inc != current && large.contains(inc) && ctx.has_viable_bid(row_id, inc) {
                return Ok((inc.clone(), RATIONALIZED.to_string()));
            }
        }
        if let Some(bid) = ctx
            .ranked_alternatives(row_id, &[current])
            .into_iter()
            .find(|b| large.contains(&b.supplier))
        {
            return Ok((bid.supplier, RATIONALIZED.to_string()));
        }
        match incumbent {
            Some(inc) if inc != current => Ok((inc.clone(), INCUMBENT_ANYWAY.to_string())),
            _ => Err(NO_ALTERNATIVE.to_string()),
        }
    }
}

impl AwardPolicy for TailRationalizationPolicy {
    fn name(&self) -> String {
        format!("tail_rationalization({})", self.threshold)
    }

    fn apply(
        &self,
        table: &mut DecisionTable,
        ctx: &AwardContext<'_>,
        _acc: &mut AwardAccumulator,
    ) -> PolicyReport {
        let mut report = PolicyReport::new(self.name());
        let (large, tail) = self.partition(table);
        debug!(large = large.len(), tail = tail.len(), "尾部供应商识别完成");

        let rows: Vec<(RowId, SupplierId, Option<SupplierId>)> = table
            .iter_in_sequence()
            .into_iter()
            .filter_map(|d| {
                d.selected()
                    .filter(|s| tail.contains(*s))
                    .map(|s| (d.row_id.clone(), s.clone(), d.incumbent.clone()))
            })
            .collect();

        for (row_id, current, incumbent) in rows {
            let valid = ctx.sheet.get(&row_id).map_or(0, |c| c.valid_supplier_count);
            if valid < 1 {
                continue;
            }
            match Self::next_large(ctx, &row_id, &current, incumbent.as_ref(), valid, &large) {
                Ok((next, inner)) => {
                    let reason = format!("Rationalized from {}: {}", current, inner);
                    report.record(move_to(ctx, table, &row_id, &next, reason));
                }
                Err(inner) => {
                    debug!(row_id = %row_id, supplier = %current, reason = %inner, "尾部供应商保留");
                    report.record(false);
                }
            }
        }
        info!(policy = %report.policy, reassigned = report.reassigned, kept = report.kept, "策略执行完成");
        report
    }
}

// ==========================================
// 6. VolumeCapPolicy
// ==========================================
// 分桶时按输入顺序拦截"候选改派"且授予该供应商的零件:
//   已超上限            → 次低价 / 现供应商
//   现供应商在保留名单  → 保留现供应商，计入累计
//   现供应商允许接手    → 保持授标，计入累计
//   其他                → 次低价 / 现供应商
// 拦截先于覆写策略，让出结果仍受排除与尾部整合约束
pub struct VolumeCapPolicy {
    supplier: SupplierId,
    metric: CapMetric,
    cap: Decimal,
    retain_incumbents: HashSet<SupplierId>,
    allowed_incumbents: Option<HashSet<SupplierId>>,
}

impl VolumeCapPolicy {
    pub fn new(
        supplier: &str,
        metric: CapMetric,
        cap: Decimal,
        retain_incumbents: &[String],
        allowed_incumbents: Option<&[String]>,
    ) -> Self {
        Self {
            supplier: SupplierId::from(supplier.trim()),
            metric,
            cap,
            retain_incumbents: supplier_set(retain_incumbents),
            allowed_incumbents: allowed_incumbents.map(supplier_set),
        }
    }

    pub fn name(&self) -> String {
        format!("volume_cap({}, {}, {})", self.supplier, self.metric.label(), self.cap)
    }

    /// 单零件计入上限的量
    fn measure(&self, ctx: &AwardContext<'_>, row_id: &str, assignment: &Assignment) -> Decimal {
        let volume = ctx
            .sheet
            .part(row_id)
            .map_or(Decimal::ZERO, |p| p.volume_or_zero());
        match self.metric {
            CapMetric::Volume => volume,
            CapMetric::FobSpend => assignment.fob_quote.unwrap_or(Decimal::ZERO) * volume,
        }
    }

    fn allows(&self, incumbent: Option<&SupplierId>) -> bool {
        match &self.allowed_incumbents {
            None => true,
            Some(allowed) => incumbent.map_or(false, |inc| allowed.contains(inc)),
        }
    }

    /// 让出零件: 次低价（可能就是现供应商），无报价时回现供应商
    fn divert(
        &self,
        ctx: &AwardContext<'_>,
        row_id: &str,
        incumbent: Option<&SupplierId>,
        prefix: &str,
    ) -> Option<Assignment> {
        let target = match ctx.next_lowest(row_id, &self.supplier) {
            Some(bid) => Some((bid.supplier, format!("Lowest bidder other than {}", self.supplier))),
            None => incumbent
                .filter(|inc| **inc != self.supplier)
                .map(|inc| (inc.clone(), "Incumbent retained".to_string())),
        };
        let Some((next, inner)) = target else {
            warn!(row_id = %row_id, supplier = %self.supplier, "无可让出对象，保持授标");
            return None;
        };
        let bucket = if incumbent == Some(&next) {
            AwardBucket::IncumbentRetained
        } else {
            AwardBucket::CandidateForReassignment
        };
        self.build(ctx, row_id, &next, bucket, format!("{}: {}", prefix, inner))
    }

    fn build(
        &self,
        ctx: &AwardContext<'_>,
        row_id: &str,
        next: &SupplierId,
        bucket: AwardBucket,
        reason: String,
    ) -> Option<Assignment> {
        match ctx.assignment_for(row_id, next, bucket, reason) {
            Ok(assignment) => Some(assignment),
            Err(e) => {
                warn!(row_id = %row_id, supplier = %next, error = %e, "改派失败，保留原决策");
                None
            }
        }
    }

    /// 拦截初始授标；不涉及该供应商时返回 None，否则返回是否改派
    pub fn intercept(
        &self,
        ctx: &AwardContext<'_>,
        row_id: &str,
        incumbent: Option<&SupplierId>,
        assignment: &mut Assignment,
        acc: &mut AwardAccumulator,
    ) -> Option<bool> {
        if assignment.bucket != AwardBucket::CandidateForReassignment
            || assignment.selected.as_ref() != Some(&self.supplier)
        {
            return None;
        }

        let amount = self.measure(ctx, row_id, assignment);
        let used = acc.get(&self.supplier, self.metric);

        let (replacement, counted) = if used > self.cap {
            let prefix = format!("{} cap reached", self.supplier);
            (self.divert(ctx, row_id, incumbent, &prefix), false)
        } else if let Some(inc) = incumbent.filter(|i| self.retain_incumbents.contains(*i)) {
            let reason = format!("Incumbent Supplier {} prefered over {}", inc, self.supplier);
            (self.build(ctx, row_id, inc, AwardBucket::IncumbentRetained, reason), true)
        } else if self.allows(incumbent) {
            acc.add(&self.supplier, self.metric, amount);
            return Some(false);
        } else {
            let prefix = format!("{} reserved for allowed incumbents", self.supplier);
            (self.divert(ctx, row_id, incumbent, &prefix), false)
        };

        let moved = replacement.is_some();
        if counted || !moved {
            acc.add(&self.supplier, self.metric, amount);
        }
        if let Some(next) = replacement {
            debug!(row_id = %row_id, supplier = %self.supplier, to = ?next.selected, "上限拦截改派");
            *assignment = next;
        }
        Some(moved)
    }
}
