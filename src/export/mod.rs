// ==========================================
// 到岸成本定标系统 - 导出层
// ==========================================
// 职责: 增强汇总表、定标方案表、汇总表与 JSON 运行摘要
// 红线: 单元格着色不在导出范围内
// ==========================================

// 模块声明
pub mod consolidated_writer;
pub mod error;
pub mod run_summary;
pub mod scenario_writer;

// 重导出核心类型
pub use consolidated_writer::ConsolidatedWriter;
pub use error::{ExportError, ExportResult};
pub use run_summary::{CapUsage, RunSummary};
pub use scenario_writer::{summary_rows, RollupWriter, ScenarioWriter};

use crate::config::OutputPaths;
use crate::domain::reference::SupplierDirectory;
use crate::engine::orchestrator::PipelineOutput;
use std::path::PathBuf;
use tracing::instrument;

// ==========================================
// ReportExporter - 全部输出
// ==========================================
pub struct ReportExporter<'a> {
    outputs: &'a OutputPaths,
}

impl<'a> ReportExporter<'a> {
    pub fn new(outputs: &'a OutputPaths) -> Self {
        Self { outputs }
    }

    /// 写出全部文件，返回运行摘要
    #[instrument(skip_all, fields(directory = %self.outputs.directory.display()))]
    pub fn export_all(
        &self,
        output: &PipelineOutput,
        directory: &SupplierDirectory,
    ) -> ExportResult<RunSummary> {
        std::fs::create_dir_all(&self.outputs.directory).map_err(|e| {
            ExportError::OutputDirectory(format!("{}: {}", self.outputs.directory.display(), e))
        })?;

        let consolidated = self.outputs.path_of(&self.outputs.consolidated);
        let scenario = self.outputs.path_of(&self.outputs.scenario);
        let suppliers = self.outputs.path_of(&self.outputs.supplier_rollup);
        let countries = self.outputs.path_of(&self.outputs.country_rollup);
        let metals = self.outputs.path_of(&self.outputs.metal_rollup);
        let summary_json = self.outputs.path_of(&self.outputs.summary_json);

        ConsolidatedWriter::new().write_to_path(&output.consolidated, &consolidated)?;
        ScenarioWriter::new(&output.consolidated, &output.aggregates, directory)
            .write_to_path(&output.decisions, &scenario)?;
        RollupWriter::new().write_all(&output.aggregates, &suppliers, &countries, &metals)?;

        let written: Vec<PathBuf> = vec![
            consolidated,
            scenario,
            suppliers,
            countries,
            metals,
            summary_json.clone(),
        ];
        let summary = RunSummary::from_output(output, written);
        summary.write_to_path(&summary_json)?;
        Ok(summary)
    }
}
