// ==========================================
// 到岸成本定标系统 - 运行摘要（JSON）
// ==========================================

use crate::config::CapMetric;
use crate::domain::types::SupplierId;
use crate::engine::aggregation::ScenarioSummary;
use crate::engine::orchestrator::PipelineOutput;
use crate::engine::PolicyReport;
use crate::export::error::ExportResult;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// 上限累计量
#[derive(Debug, Clone, Serialize)]
pub struct CapUsage {
    pub supplier: SupplierId,
    pub metric: CapMetric,
    pub used: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub parts: usize,
    pub dropped_parts: usize,
    pub summary: ScenarioSummary,
    pub policies: Vec<PolicyReport>,
    pub caps: Vec<CapUsage>,
    pub outputs: Vec<PathBuf>,
}

impl RunSummary {
    pub fn from_output(output: &PipelineOutput, outputs: Vec<PathBuf>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            version: crate::VERSION.to_string(),
            parts: output.consolidated.len(),
            dropped_parts: output.dropped_parts,
            summary: output.aggregates.summary.clone(),
            policies: output.reports.clone(),
            caps: output
                .accumulator
                .entries()
                .into_iter()
                .map(|(supplier, metric, used)| CapUsage {
                    supplier,
                    metric,
                    used,
                })
                .collect(),
            outputs,
        }
    }

    pub fn write_to_path(&self, path: &Path) -> ExportResult<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        info!(run_id = %self.run_id, path = %path.display(), "运行摘要已导出");
        Ok(())
    }
}
