// ==========================================
// 到岸成本定标系统 - 核心库
// ==========================================
// 技术栈: Rust + CSV/Excel + rust_decimal
// 系统定位: 决策支持系统（批处理，人工最终定标）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 成本与定标规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 导出层 - 报表输出
pub mod export;

// 配置层 - 运行配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AwardBucket, Awardable, Round, RowId, SupplierId, VolumeBand};

// 领域实体
pub use domain::{
    AwardDecision, BidRecord, BidSheet, ConsolidatedSheet, DecisionTable, Part, PartCostSheet,
    ReferenceData,
};

// 引擎
pub use engine::{AwardEngine, AwardPipeline, Consolidator, LandedCostCalculator, PipelineOutput};

// 配置
pub use config::{PolicyConfig, RunConfig};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "到岸成本定标系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
