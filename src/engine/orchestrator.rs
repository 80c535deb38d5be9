// ==========================================
// 到岸成本定标系统 - 流水线编排器
// ==========================================
// 用途: 按固定阶段顺序协调各引擎
//   0. 剔除排除名单现供应商的零件
//   1-2. 成本汇总 + 最低价/次低价
//   3-5. 分桶 → 授标顺序 → 覆写策略级联
//   6. 方案汇总
// 红线: 阶段顺序即不变量，后一阶段只读前一阶段的完整结果
// ==========================================

use crate::config::RunConfig;
use crate::domain::cost_sheet::ConsolidatedSheet;
use crate::domain::decision::DecisionTable;
use crate::domain::part::BidSheet;
use crate::domain::reference::ReferenceData;
use crate::engine::aggregation::{ScenarioAggregates, ScenarioAggregator};
use crate::engine::award::{AwardAccumulator, AwardContext, AwardEngine, PolicyReport};
use crate::engine::consolidator::Consolidator;
use crate::engine::resolver::ReferenceResolver;
use tracing::{debug, info, instrument};

// ==========================================
// PipelineOutput - 流水线结果
// ==========================================
pub struct PipelineOutput {
    pub consolidated: ConsolidatedSheet,
    pub decisions: DecisionTable,
    pub reports: Vec<PolicyReport>,
    pub accumulator: AwardAccumulator,
    pub aggregates: ScenarioAggregates,
    /// 因排除名单剔除的零件数
    pub dropped_parts: usize,
}

// ==========================================
// AwardPipeline
// ==========================================
pub struct AwardPipeline<'a> {
    data: &'a ReferenceData,
    config: &'a RunConfig,
}

impl<'a> AwardPipeline<'a> {
    pub fn new(data: &'a ReferenceData, config: &'a RunConfig) -> Self {
        Self { data, config }
    }

    /// 执行完整流水线
    #[instrument(skip(self, sheet), fields(parts = sheet.parts.len()))]
    pub fn run(&self, mut sheet: BidSheet) -> PipelineOutput {
        // ==========================================
        // 步骤0-2: 剔除 + 成本汇总
        // ==========================================
        debug!("步骤0-2: 成本汇总");
        let consolidator =
            Consolidator::new(self.data, &self.config.resolver, &self.config.benchmark);
        let dropped_parts = consolidator
            .benchmark_engine()
            .drop_excluded_incumbents(&mut sheet);
        let consolidated = consolidator.consolidate(sheet);

        // ==========================================
        // 步骤3-6: 定标 + 汇总
        // ==========================================
        debug!("步骤3-6: 定标与汇总");
        let (outcome, aggregates) = {
            let ctx = AwardContext::new(
                &consolidated,
                ReferenceResolver::new(self.data, &self.config.resolver),
            );
            let outcome = AwardEngine::from_config(&self.config.award.policies).run(&ctx);
            let aggregates =
                ScenarioAggregator::new(&consolidated, ctx.resolver()).aggregate(&outcome.decisions);
            (outcome, aggregates)
        };

        info!(
            parts = consolidated.len(),
            dropped = dropped_parts,
            decisions = outcome.decisions.len(),
            "流水线执行完成"
        );

        PipelineOutput {
            consolidated,
            decisions: outcome.decisions,
            reports: outcome.reports,
            accumulator: outcome.accumulator,
            aggregates,
            dropped_parts,
        }
    }
}
