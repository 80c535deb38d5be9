// ==========================================
// 到岸成本定标系统 - 引擎层
// ==========================================
// 职责: 到岸成本核算、基准对比与定标规则
// 红线: 引擎不做文件 IO，所有授标必须输出 reason
// ==========================================

pub mod aggregation;
pub mod award;
pub mod benchmark;
pub mod consolidator;
pub mod landed_cost;
pub mod orchestrator;
pub mod resolver;
pub mod savings;

// 重导出核心引擎
pub use aggregation::{
    GroupRollup, ScenarioAggregates, ScenarioAggregator, ScenarioSummary, SupplierRollup,
};
pub use award::{
    AwardAccumulator, AwardContext, AwardEngine, AwardOutcome, AwardPolicy, PolicyReport,
    ReassignError,
};
pub use benchmark::{BenchmarkEngine, BenchmarkResolution};
pub use consolidator::Consolidator;
pub use landed_cost::LandedCostCalculator;
pub use orchestrator::{AwardPipeline, PipelineOutput};
pub use resolver::{PortResolution, ReferenceResolver, ResolveError, TariffPolicy};
pub use savings::SavingsCalculator;
