// ==========================================
// 到岸成本定标系统 - 配置层
// ==========================================
// 职责: 运行配置加载（JSON），默认值即生产常量
// ==========================================

pub mod policy_config;
pub mod run_config;

// 重导出核心配置类型
pub use policy_config::{default_policies, CapMetric, DiscontinuedList, PolicyConfig};
pub use run_config::{
    AwardConfig, BenchmarkConfig, ConfigError, DivisionTariff, InputPaths, OutputPaths,
    ResolverConfig, RunConfig, CONFIG_ENV_VAR,
};
