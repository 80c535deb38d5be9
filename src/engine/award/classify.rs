// ==========================================
// 到岸成本定标系统 - 初始分桶
// ==========================================
// 无有效报价          → UNASSIGNED
// 现供应商未报价      → 基准到岸更低则保留，否则强制最低价
// 现供应商即最低价    → INCUMBENT_RETAINED
// 现供应商报价非最低  → CANDIDATE_FOR_REASSIGNMENT（授予最低价）
// ==========================================

use crate::domain::cost_sheet::PartCostSheet;
use crate::domain::decision::Assignment;
use crate::domain::types::AwardBucket;
use crate::engine::award::context::AwardContext;
use tracing::{debug, warn};

pub const NO_VALID_SUPPLIERS: &str = "No valid suppliers";
pub const INCUMBENT_LOWEST: &str = "Incumbent retained (lowest bid)";
pub const INCUMBENT_WAPP_LOWER: &str =
    "Incumbent did not bid, but its WAPP landed is lower than Lowest Bid.";
pub const MUST_ASSIGN_MIN: &str = "Incumbent did not bid, using Final Minimum Bid Landed Supplier";
pub const CANDIDATE: &str = "Incumbent bid, but not lowest; eligible for new supplier assignment";

pub struct Classifier;

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    /// 单零件初始决策
    pub fn classify(&self, ctx: &AwardContext<'_>, cost: &PartCostSheet) -> Assignment {
        let row_id = cost.row_id.as_str();
        let min = match cost.landed.min.as_ref() {
            Some(min) if cost.valid_supplier_count > 0 => min,
            _ => return Assignment::unassigned(NO_VALID_SUPPLIERS),
        };

        let (supplier, bucket, reason) = match cost.incumbent.as_ref() {
            None => (&min.supplier, AwardBucket::MustAssignMinBid, MUST_ASSIGN_MIN),
            Some(inc) if !ctx.has_viable_bid(row_id, inc) => {
                match ctx.incumbent_derived_landed(row_id) {
                    Ok(derived) if derived < min.value => {
                        (inc, AwardBucket::IncumbentRetained, INCUMBENT_WAPP_LOWER)
                    }
                    Ok(_) => (&min.supplier, AwardBucket::MustAssignMinBid, MUST_ASSIGN_MIN),
                    Err(e) => {
                        debug!(row_id = %row_id, error = %e, "现供应商基准到岸不可用，按最低价处理");
                        (&min.supplier, AwardBucket::MustAssignMinBid, MUST_ASSIGN_MIN)
                    }
                }
            }
            Some(inc) if *inc == min.supplier => (inc, AwardBucket::IncumbentRetained, INCUMBENT_LOWEST),
            Some(_) => (&min.supplier, AwardBucket::CandidateForReassignment, CANDIDATE),
        };

        ctx.assignment_for(row_id, supplier, bucket, reason)
            .unwrap_or_else(|e| {
                warn!(row_id = %row_id, supplier = %supplier, error = %e, "初始授标失败，记为未授标");
                Assignment::unassigned(NO_VALID_SUPPLIERS)
            })
    }
}
