// ==========================================
// 到岸成本定标系统 - 领域模型层
// ==========================================
// 职责: 定义零件/报价/参考表/成本汇总/定标决策等实体
// 红线: 不含文件读写逻辑,不含引擎逻辑
// ==========================================

pub mod cost_sheet;
pub mod decision;
pub mod part;
pub mod reference;
pub mod types;

// 重导出核心类型
pub use cost_sheet::{AsIsSavings, CherryPick, ConsolidatedSheet, PartCostSheet, RankedBid, SupplierQuote};
pub use decision::{Assignment, AwardDecision, DecisionTable};
pub use part::{BidRecord, BidSheet, Part};
pub use reference::{
    BenchmarkPriceTable, BenchmarkRow, FreightTable, PartOverrides, PortCountryMap,
    ReferenceData, SupplierDirectory, SupplierNameMap, SupplierPortTable, TariffEntry,
    TariffTable,
};
pub use types::{
    round4, Awardable, AwardBucket, Round, RowId, SupplierId, VolumeBand, UNAVAILABLE,
};
