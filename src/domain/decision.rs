// ==========================================
// 到岸成本定标系统 - 定标决策表
// ==========================================
// 红线: 每个零件恰好一条决策（选定供应商或未授标）
// 红线: 改派必须整行原子覆盖，不允许残留旧供应商的节约数据
// ==========================================

use crate::domain::types::{AwardBucket, RowId, SupplierId};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

// ==========================================
// Assignment - 一次授标写入的全部字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub selected: Option<SupplierId>,
    pub bucket: AwardBucket,
    pub reason: String,
    pub fob_quote: Option<Decimal>,
    pub fob_savings_pct: Option<Decimal>,
    pub fob_savings_usd: Option<Decimal>,
    pub landed_savings_pct: Option<Decimal>,
    pub landed_savings_usd: Option<Decimal>,
    pub landed_cost: Option<Decimal>,
    pub landed_extended_cost: Option<Decimal>,
    pub is_totally_new: bool,
    pub part_switched: bool,
}

impl Assignment {
    /// 未授标
    pub fn unassigned(reason: impl Into<String>) -> Self {
        Self {
            selected: None,
            bucket: AwardBucket::Unassigned,
            reason: reason.into(),
            fob_quote: None,
            fob_savings_pct: None,
            fob_savings_usd: None,
            landed_savings_pct: None,
            landed_savings_usd: None,
            landed_cost: None,
            landed_extended_cost: None,
            is_totally_new: false,
            part_switched: false,
        }
    }
}

// ==========================================
// AwardDecision - 单零件决策
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct AwardDecision {
    pub row_id: RowId,
    pub incumbent: Option<SupplierId>,
    #[serde(flatten)]
    pub assignment: Assignment,
    /// 被覆写的次数（诊断用）
    pub revisions: u32,
}

impl AwardDecision {
    pub fn selected(&self) -> Option<&SupplierId> {
        self.assignment.selected.as_ref()
    }

    pub fn bucket(&self) -> AwardBucket {
        self.assignment.bucket
    }

    pub fn is_selected(&self, supplier: &SupplierId) -> bool {
        self.selected() == Some(supplier)
    }

    pub fn is_incumbent_retained(&self) -> bool {
        match (&self.assignment.selected, &self.incumbent) {
            (Some(s), Some(i)) => s == i,
            _ => false,
        }
    }
}

// ==========================================
// DecisionTable - 决策表
// ==========================================
// decisions 保持输入顺序；sequence 为授标顺序
// （强制最低价 → 候选按节约降序 → 保留现供应商 → 未授标）
#[derive(Debug, Clone, Default)]
pub struct DecisionTable {
    decisions: Vec<AwardDecision>,
    index: HashMap<RowId, usize>,
    sequence: Vec<RowId>,
}

impl DecisionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记零件的首次决策；同一零件重复登记时覆盖并保持单条
    pub fn insert(&mut self, row_id: RowId, incumbent: Option<SupplierId>, assignment: Assignment) {
        if let Some(&i) = self.index.get(&row_id) {
            self.decisions[i].assignment = assignment;
            self.decisions[i].revisions += 1;
            return;
        }
        self.index.insert(row_id.clone(), self.decisions.len());
        self.decisions.push(AwardDecision {
            row_id,
            incumbent,
            assignment,
            revisions: 0,
        });
    }

    /// 整行覆盖（最后写入者生效）
    pub fn commit(&mut self, row_id: &str, assignment: Assignment) -> bool {
        match self.index.get(row_id) {
            Some(&i) => {
                let decision = &mut self.decisions[i];
                decision.assignment = assignment;
                decision.revisions += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, row_id: &str) -> Option<&AwardDecision> {
        self.index.get(row_id).map(|&i| &self.decisions[i])
    }

    /// 输入顺序
    pub fn iter(&self) -> impl Iterator<Item = &AwardDecision> {
        self.decisions.iter()
    }

    /// 授标顺序（未排序时退化为输入顺序）
    pub fn iter_in_sequence(&self) -> Vec<&AwardDecision> {
        if self.sequence.is_empty() {
            return self.decisions.iter().collect();
        }
        self.sequence.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn sequence(&self) -> &[RowId] {
        &self.sequence
    }

    pub fn set_sequence(&mut self, sequence: Vec<RowId>) {
        self.sequence = sequence;
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// 当前授予某供应商的零件（授标顺序）
    pub fn rows_selecting(&self, supplier: &SupplierId) -> Vec<RowId> {
        self.iter_in_sequence()
            .into_iter()
            .filter(|d| d.is_selected(supplier))
            .map(|d| d.row_id.clone())
            .collect()
    }

    /// 各供应商已授标到岸扩展成本合计
    pub fn awarded_landed_totals(&self) -> HashMap<SupplierId, Decimal> {
        let mut totals: HashMap<SupplierId, Decimal> = HashMap::new();
        for d in &self.decisions {
            if let Some(s) = d.selected() {
                *totals.entry(s.clone()).or_default() +=
                    d.assignment.landed_extended_cost.unwrap_or(Decimal::ZERO);
            }
        }
        totals
    }
}
