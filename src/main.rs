// ==========================================
// 到岸成本定标系统 - 命令行入口
// ==========================================
// 用法: landed-award [config.json]
// 致命错误仅限: 配置不可读、输入表缺失/不可读、输出写入失败
// ==========================================

use anyhow::{Context, Result};
use landed_award::config::RunConfig;
use landed_award::engine::AwardPipeline;
use landed_award::export::ReportExporter;
use landed_award::importer::{BidSheetImporter, ReferenceImporter};
use landed_award::logging;

fn main() -> Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", landed_award::APP_NAME);
    tracing::info!("系统版本: {}", landed_award::VERSION);
    tracing::info!("==================================================");

    // 配置
    let cli_arg = std::env::args().nth(1);
    let config_path = RunConfig::resolve_path(cli_arg.as_deref());
    let config = RunConfig::load(&config_path)
        .with_context(|| format!("无法加载运行配置: {}", config_path.display()))?;

    // 导入
    let reference = ReferenceImporter::default()
        .import_all(&config.inputs, &config.resolver)
        .context("参考表导入失败")?;
    let bid_importer = BidSheetImporter::new();
    let mut sheet = bid_importer
        .import(&config.inputs.bid_sheet)
        .with_context(|| format!("报价表导入失败: {}", config.inputs.bid_sheet.display()))?;
    bid_importer.apply_overrides(&mut sheet, &reference.overrides);

    // 流水线
    let output = AwardPipeline::new(&reference, &config).run(sheet);

    // 导出
    let summary = ReportExporter::new(&config.outputs)
        .export_all(&output, &reference.supplier_directory)
        .context("输出写入失败")?;

    let s = &summary.summary;
    tracing::info!(
        run_id = %summary.run_id,
        parts = summary.parts,
        retained = s.incumbent_retained_parts,
        new_supplier = s.new_supplier_parts,
        net_new = s.net_new_supplier_parts,
        not_awarded = s.not_awarded_parts,
        landed_savings = %s.total_landed_savings_usd,
        fob_savings = %s.total_fob_savings_usd,
        "定标运行完成"
    );
    Ok(())
}
