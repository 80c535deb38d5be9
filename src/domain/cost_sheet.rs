// ==========================================
// 到岸成本定标系统 - 成本汇总表
// ==========================================
// 职责: 承载阶段 1/2 的计算结果（逐零件、逐供应商）
// 红线: 无基准时所有节约/可授标字段为 None，不是 0
// ==========================================

use crate::domain::part::{BidSheet, Part};
use crate::domain::types::{Awardable, Round, RowId, SupplierId, VolumeBand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

// ==========================================
// SupplierQuote - 单供应商成本与节约
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct SupplierQuote {
    pub supplier: SupplierId,
    /// 生效轮次（R2 优先）
    pub round: Round,
    /// 生效 FOB 单价
    pub fob: Decimal,
    pub r1: Option<Decimal>,
    pub port: Option<String>,
    pub country: Option<String>,
    /// 到岸单价；参考数据缺失时为 None
    pub landed: Option<Decimal>,
    /// 关税缺失被按 0 处理（需人工复核）
    pub tariff_defaulted: bool,

    // R1 → R2 降幅
    pub r1_r2_delta_pct: Option<Decimal>,
    pub r1_r2_delta_usd: Option<Decimal>,

    // 两条并行的节约口径
    pub fob_savings_pct: Option<Decimal>,
    pub fob_savings_usd: Option<Decimal>,
    pub landed_savings_pct: Option<Decimal>,
    pub landed_savings_usd: Option<Decimal>,
}

// ==========================================
// RankedBid - 排序后的报价
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedBid {
    pub supplier: SupplierId,
    pub value: Decimal,
}

/// 最低价/次低价 + 挑选节约
#[derive(Debug, Clone, Default, Serialize)]
pub struct CherryPick {
    pub min: Option<RankedBid>,
    pub second: Option<RankedBid>,
    pub savings_pct: Option<Decimal>,
    pub savings_usd: Option<Decimal>,
    pub awardable: Option<Awardable>,
}

impl CherryPick {
    pub fn awardable(&self) -> Awardable {
        self.awardable.unwrap_or(Awardable::NoBaseline)
    }
}

/// 现供应商"维持现状"节约
#[derive(Debug, Clone, Default, Serialize)]
pub struct AsIsSavings {
    pub r1_pct: Option<Decimal>,
    pub r1_usd: Option<Decimal>,
    pub final_pct: Option<Decimal>,
    pub final_usd: Option<Decimal>,
    pub final_landed_pct: Option<Decimal>,
    pub final_landed_usd: Option<Decimal>,
}

// ==========================================
// PartCostSheet - 单零件成本汇总
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct PartCostSheet {
    pub row_id: RowId,
    pub division: String,
    pub metal_type: Option<String>,
    pub annual_volume: Option<Decimal>,

    // 基准价
    pub volume_band: Option<VolumeBand>,
    pub benchmark: Option<Decimal>,
    pub most_common_supplier: Option<String>,
    pub incumbent: Option<SupplierId>,
    pub benchmark_landed: Option<Decimal>,
    pub extended_cost: Option<Decimal>,
    pub landed_extended_cost: Option<Decimal>,

    pub valid_supplier_count: u32,
    pub as_is: AsIsSavings,

    // FOB 口径
    pub r1_min: Option<RankedBid>,
    pub fob: CherryPick,
    /// R2 最低价是否优于 R1 最低价
    pub r2_improved: Awardable,

    // 到岸口径
    pub landed: CherryPick,

    /// 有生效报价的供应商（供应商输入顺序）
    pub quotes: Vec<SupplierQuote>,
}

impl PartCostSheet {
    /// 是否存在有效基准（基准价 > 0 且有效供应商数 > 0）
    pub fn has_baseline(&self) -> bool {
        self.benchmark.map_or(false, |b| b > Decimal::ZERO) && self.valid_supplier_count > 0
    }

    pub fn quote(&self, supplier: &SupplierId) -> Option<&SupplierQuote> {
        self.quotes.iter().find(|q| &q.supplier == supplier)
    }

    /// 到岸成本可用的报价（参与竞标）
    pub fn viable_quotes(&self) -> impl Iterator<Item = &SupplierQuote> {
        self.quotes.iter().filter(|q| q.landed.is_some())
    }

    /// 现供应商是否有生效报价
    pub fn incumbent_bid(&self) -> bool {
        self.incumbent
            .as_ref()
            .map_or(false, |inc| self.quote(inc).is_some())
    }
}

// ==========================================
// ConsolidatedSheet - 汇总成本表
// ==========================================
#[derive(Debug, Clone)]
pub struct ConsolidatedSheet {
    pub bid_sheet: BidSheet,
    rows: Vec<PartCostSheet>,
    index: HashMap<RowId, usize>,
}

impl ConsolidatedSheet {
    /// rows 必须与 bid_sheet.parts 一一对应、顺序一致
    pub fn new(bid_sheet: BidSheet, rows: Vec<PartCostSheet>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.row_id.clone(), i))
            .collect();
        Self {
            bid_sheet,
            rows,
            index,
        }
    }

    pub fn rows(&self) -> &[PartCostSheet] {
        &self.rows
    }

    pub fn get(&self, row_id: &str) -> Option<&PartCostSheet> {
        self.index.get(row_id).map(|&i| &self.rows[i])
    }

    pub fn part(&self, row_id: &str) -> Option<&Part> {
        self.index
            .get(row_id)
            .and_then(|&i| self.bid_sheet.parts.get(i))
    }

    /// (零件, 成本汇总) 输入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&Part, &PartCostSheet)> {
        self.bid_sheet.parts.iter().zip(self.rows.iter())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 全部现供应商集合（判定"全新供应商"）
    pub fn incumbent_set(&self) -> BTreeSet<SupplierId> {
        self.rows
            .iter()
            .filter_map(|r| r.incumbent.clone())
            .collect()
    }
}
