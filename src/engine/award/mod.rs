// ==========================================
// 到岸成本定标系统 - 定标引擎
// ==========================================
// 阶段 3: 初始分桶（用量上限按输入顺序拦截）
// 阶段 4: 授标顺序（强制最低价 → 候选按到岸节约降序 → 保留 → 未授标）
// 阶段 5: 覆写策略级联
// 红线: 每个零件恰好一条决策
// ==========================================

// 模块声明
pub mod classify;
pub mod context;
pub mod policies;
pub mod policy;

// 重导出核心类型
pub use classify::Classifier;
pub use context::{AwardContext, ReassignError};
pub use policies::{
    DiscontinuedSupplierPolicy, FallbackExclusionPolicy, RestrictedPartsPolicy,
    SupplierExclusionPolicy, TailRationalizationPolicy, VolumeCapPolicy,
};

// 重导出 Trait 接口
pub use policy::{build_caps, build_policies, AwardAccumulator, AwardPolicy, PolicyReport};

use crate::config::PolicyConfig;
use crate::domain::decision::DecisionTable;
use crate::domain::types::{AwardBucket, RowId};
use rust_decimal::Decimal;
use tracing::{info, instrument};

/// 定标结果
pub struct AwardOutcome {
    pub decisions: DecisionTable,
    pub reports: Vec<PolicyReport>,
    pub accumulator: AwardAccumulator,
}

// ==========================================
// AwardEngine
// ==========================================
pub struct AwardEngine {
    classifier: Classifier,
    caps: Vec<VolumeCapPolicy>,
    policies: Vec<Box<dyn AwardPolicy>>,
}

impl AwardEngine {
    pub fn new(policies: Vec<Box<dyn AwardPolicy>>) -> Self {
        Self {
            classifier: Classifier::new(),
            caps: Vec::new(),
            policies,
        }
    }

    pub fn with_caps(mut self, caps: Vec<VolumeCapPolicy>) -> Self {
        self.caps = caps;
        self
    }

    pub fn from_config(configs: &[PolicyConfig]) -> Self {
        Self::new(build_policies(configs)).with_caps(build_caps(configs))
    }

    /// 仅分桶与排序（不跑策略）
    pub fn initial_decisions(&self, ctx: &AwardContext<'_>) -> DecisionTable {
        self.initial_decisions_with(ctx, &mut AwardAccumulator::new()).0
    }

    /// 分桶、上限拦截与排序
    pub fn initial_decisions_with(
        &self,
        ctx: &AwardContext<'_>,
        acc: &mut AwardAccumulator,
    ) -> (DecisionTable, Vec<PolicyReport>) {
        let mut table = DecisionTable::new();
        let mut reports: Vec<PolicyReport> =
            self.caps.iter().map(|cap| PolicyReport::new(cap.name())).collect();
        let mut must_assign: Vec<RowId> = Vec::new();
        let mut candidates: Vec<(RowId, Decimal)> = Vec::new();
        let mut retained: Vec<RowId> = Vec::new();
        let mut unassigned: Vec<RowId> = Vec::new();

        for cost in ctx.sheet.rows() {
            let mut assignment = self.classifier.classify(ctx, cost);
            let row_id = cost.row_id.clone();
            for (cap, report) in self.caps.iter().zip(reports.iter_mut()) {
                if let Some(moved) =
                    cap.intercept(ctx, &row_id, cost.incumbent.as_ref(), &mut assignment, acc)
                {
                    report.record(moved);
                }
            }
            match assignment.bucket {
                AwardBucket::MustAssignMinBid => must_assign.push(row_id.clone()),
                AwardBucket::CandidateForReassignment => candidates.push((
                    row_id.clone(),
                    assignment.landed_savings_usd.unwrap_or(Decimal::ZERO),
                )),
                AwardBucket::IncumbentRetained => retained.push(row_id.clone()),
                AwardBucket::Unassigned => unassigned.push(row_id.clone()),
            }
            table.insert(row_id, cost.incumbent.clone(), assignment);
        }

        info!(
            must_assign = must_assign.len(),
            candidates = candidates.len(),
            retained = retained.len(),
            unassigned = unassigned.len(),
            "初始分桶完成"
        );
        for report in &reports {
            info!(policy = %report.policy, reassigned = report.reassigned, kept = report.kept, "上限拦截完成");
        }

        // 稳定排序: 节约相同保持输入顺序
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        let mut sequence = must_assign;
        sequence.extend(candidates.into_iter().map(|(id, _)| id));
        sequence.extend(retained);
        sequence.extend(unassigned);
        table.set_sequence(sequence);
        (table, reports)
    }

    /// 完整定标
    #[instrument(skip(self, ctx), fields(parts = ctx.sheet.len(), caps = self.caps.len(), policies = self.policies.len()))]
    pub fn run(&self, ctx: &AwardContext<'_>) -> AwardOutcome {
        let mut accumulator = AwardAccumulator::new();
        let (mut decisions, mut reports) = self.initial_decisions_with(ctx, &mut accumulator);
        reports.extend(
            self.policies
                .iter()
                .map(|policy| policy.apply(&mut decisions, ctx, &mut accumulator)),
        );

        info!(
            decisions = decisions.len(),
            reassigned = reports.iter().map(|r| r.reassigned).sum::<usize>(),
            "定标完成"
        );
        AwardOutcome {
            decisions,
            reports,
            accumulator,
        }
    }
}
