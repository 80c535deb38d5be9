// ==========================================
// 到岸成本定标系统 - 零件与报价实体
// ==========================================
// 报价容器: map[RowId][SupplierId] → BidRecord
// 供应商顺序 = 输入表头顺序（用于稳定排序的并列裁决）
// ==========================================

use crate::domain::types::{Round, RowId, SupplierId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// Part - 零件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub row_id: RowId,
    pub part_number: String,
    pub division: String,
    pub metal_type: Option<String>,
    pub description: Option<String>,
    pub product_group: Option<String>,
    pub part_family: Option<String>,
    pub annual_volume: Option<Decimal>,
    pub average_order_quantity: Option<Decimal>,

    /// 输入表中的"Valid Supplier"列（缺失时由报价推导）
    pub valid_supplier_count: Option<u32>,

    /// 原始行（与 BidSheet.headers 对齐），用于回写增强表
    #[serde(skip)]
    pub raw: Vec<String>,
}

impl Part {
    /// 归一化零件号（TRIM + UPPER）
    pub fn normalized_part_id(&self) -> String {
        self.part_number.trim().to_uppercase()
    }

    /// 年用量（缺失视为 0，仅用于汇总）
    pub fn volume_or_zero(&self) -> Decimal {
        self.annual_volume.unwrap_or(Decimal::ZERO)
    }
}

// ==========================================
// BidRecord - 单零件单供应商报价
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRecord {
    pub r1: Option<Decimal>,
    pub r2: Option<Decimal>,
}

impl BidRecord {
    pub fn new(r1: Option<Decimal>, r2: Option<Decimal>) -> Self {
        Self { r1, r2 }
    }

    /// 指定轮次的有效报价（缺失或为 0 视为无报价）
    pub fn round(&self, round: Round) -> Option<Decimal> {
        let value = match round {
            Round::R1 => self.r1,
            Round::R2 => self.r2,
        };
        value.filter(|v| !v.is_zero())
    }

    /// 生效报价: R2 存在且非 0 时取 R2，否则回退 R1
    pub fn effective(&self) -> Option<(Round, Decimal)> {
        self.round(Round::R2)
            .map(|v| (Round::R2, v))
            .or_else(|| self.round(Round::R1).map(|v| (Round::R1, v)))
    }
}

// ==========================================
// BidSheet - 汇总报价表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BidSheet {
    /// 原始表头（保持输入顺序）
    pub headers: Vec<String>,
    /// 零件（输入顺序）
    pub parts: Vec<Part>,
    /// 供应商（表头出现顺序）
    pub suppliers: Vec<SupplierId>,
    bids: HashMap<RowId, HashMap<SupplierId, BidRecord>>,
}

impl BidSheet {
    pub fn new(headers: Vec<String>, suppliers: Vec<SupplierId>) -> Self {
        Self {
            headers,
            parts: Vec::new(),
            suppliers,
            bids: HashMap::new(),
        }
    }

    pub fn push_part(&mut self, part: Part, bids: HashMap<SupplierId, BidRecord>) {
        self.bids.insert(part.row_id.clone(), bids);
        self.parts.push(part);
    }

    pub fn bid(&self, row_id: &str, supplier: &SupplierId) -> Option<&BidRecord> {
        self.bids.get(row_id).and_then(|m| m.get(supplier))
    }

    /// 按供应商输入顺序遍历某零件的全部报价
    pub fn bids_for<'a>(
        &'a self,
        row_id: &'a str,
    ) -> impl Iterator<Item = (&'a SupplierId, &'a BidRecord)> + 'a {
        let row = self.bids.get(row_id);
        self.suppliers
            .iter()
            .filter_map(move |s| row.and_then(|m| m.get(s)).map(|b| (s, b)))
    }

    /// 有效报价供应商数（生效报价非空）
    pub fn bidding_supplier_count(&self, row_id: &str) -> u32 {
        self.bids_for(row_id)
            .filter(|(_, b)| b.effective().is_some())
            .count() as u32
    }

    /// 按行号剔除零件
    pub fn retain_parts<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Part) -> bool,
    {
        let bids = &mut self.bids;
        self.parts.retain(|p| {
            let kept = keep(p);
            if !kept {
                bids.remove(&p.row_id);
            }
            kept
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_effective_prefers_r2() {
        let bid = BidRecord::new(Some(dec!(2.0)), Some(dec!(1.5)));
        assert_eq!(bid.effective(), Some((Round::R2, dec!(1.5))));
    }

    #[test]
    fn test_effective_falls_back_on_zero_r2() {
        let bid = BidRecord::new(Some(dec!(2.0)), Some(dec!(0)));
        assert_eq!(bid.effective(), Some((Round::R1, dec!(2.0))));

        let none = BidRecord::new(None, Some(Decimal::ZERO));
        assert_eq!(none.effective(), None);
    }

    #[test]
    fn test_bids_for_follows_supplier_order() {
        let suppliers = vec![SupplierId::from("B"), SupplierId::from("A")];
        let mut sheet = BidSheet::new(vec![], suppliers);
        let part = Part {
            row_id: "1".to_string(),
            part_number: "P-1".to_string(),
            division: "Midland".to_string(),
            metal_type: None,
            description: None,
            product_group: None,
            part_family: None,
            annual_volume: None,
            average_order_quantity: None,
            valid_supplier_count: None,
            raw: vec![],
        };
        let mut bids = HashMap::new();
        bids.insert(SupplierId::from("A"), BidRecord::new(None, Some(dec!(1))));
        bids.insert(SupplierId::from("B"), BidRecord::new(None, Some(dec!(2))));
        sheet.push_part(part, bids);

        let order: Vec<&str> = sheet.bids_for("1").map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
        assert_eq!(sheet.bidding_supplier_count("1"), 2);
    }
}
