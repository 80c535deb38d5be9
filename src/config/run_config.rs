// ==========================================
// 到岸成本定标系统 - 运行配置
// ==========================================
// 职责: 输入/输出路径、参考数据解析参数、基准参数、策略级联
// 加载顺序: CLI 参数 → LANDED_AWARD_CONFIG → <config_dir>/landed-award/config.json
// ==========================================

use crate::config::policy_config::{default_policies, PolicyConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// 配置文件环境变量
pub const CONFIG_ENV_VAR: &str = "LANDED_AWARD_CONFIG";

// ==========================================
// 配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(String),

    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件格式错误 ({path}): {message}")]
    ParseError { path: String, message: String },
}

// ==========================================
// 输入文件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub bid_sheet: PathBuf,
    pub benchmark_prices: PathBuf,
    pub benchmark_skip_rows: usize,
    pub supplier_names: PathBuf,
    /// ERP 名称表前两行为标题
    pub supplier_names_skip_rows: usize,
    pub supplier_ports: PathBuf,
    pub freight: PathBuf,
    pub part_tariffs: PathBuf,
    pub division_tariffs: Option<PathBuf>,
    pub output_reference: Option<PathBuf>,
    pub part_number_overrides: Option<PathBuf>,
    pub material_overrides: Option<PathBuf>,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            bid_sheet: PathBuf::from("input/bid_sheet.csv"),
            benchmark_prices: PathBuf::from("input/wapp.xlsx"),
            benchmark_skip_rows: 0,
            supplier_names: PathBuf::from("input/supplier_names.xlsx"),
            supplier_names_skip_rows: 2,
            supplier_ports: PathBuf::from("input/supplier_ports.csv"),
            freight: PathBuf::from("input/freight_multipliers.csv"),
            part_tariffs: PathBuf::from("input/tariff_part_level.csv"),
            division_tariffs: None,
            output_reference: Some(PathBuf::from("input/output_reference.csv")),
            part_number_overrides: None,
            material_overrides: None,
        }
    }
}

// ==========================================
// 输出文件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    pub directory: PathBuf,
    pub consolidated: String,
    pub scenario: String,
    pub supplier_rollup: String,
    pub country_rollup: String,
    pub metal_rollup: String,
    pub summary_json: String,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            consolidated: "consolidated_landed.csv".to_string(),
            scenario: "scenario_decisions.csv".to_string(),
            supplier_rollup: "supplier_rollup.csv".to_string(),
            country_rollup: "country_rollup.csv".to_string(),
            metal_rollup: "metal_rollup.csv".to_string(),
            summary_json: "run_summary.json".to_string(),
        }
    }
}

impl OutputPaths {
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.directory.join(file_name)
    }
}

// ==========================================
// 参考数据解析
// ==========================================
/// 事业部级关税
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionTariff {
    pub division: String,
    pub country: String,
    pub metal_type: String,
    pub rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// 免关税事业部（到岸 = 单价 × 运费系数）
    pub exempt_divisions: Vec<String>,
    /// 免关税供应商
    pub duty_exempt_suppliers: Vec<String>,
    /// 金属类型 → 关税附加（键按去空白、忽略大小写匹配）
    pub duty_rates: BTreeMap<String, Decimal>,
    pub port_countries: BTreeMap<String, String>,
    pub division_tariffs: Vec<DivisionTariff>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            exempt_divisions: vec!["Buchanan".to_string()],
            duty_exempt_suppliers: vec!["Luxecasting".to_string()],
            duty_rates: default_duty_rates(),
            port_countries: default_port_countries(),
            division_tariffs: default_division_tariffs(),
        }
    }
}

fn default_duty_rates() -> BTreeMap<String, Decimal> {
    [
        ("Steel", dec!(0.05)),
        ("Stainless Steel", dec!(0.05)),
        ("Brass", dec!(0.03)),
        ("Lead-free bronze", dec!(0.03)),
        ("Lead-free brass", dec!(0.03)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_port_countries() -> BTreeMap<String, String> {
    [
        ("DALIAN", "China"),
        ("NINGBO", "China"),
        ("QINGDAO", "China"),
        ("QINGDAO2", "China"),
        ("SHANGHAI", "China"),
        ("SHENZHEN", "China"),
        ("TIANJIN", "China"),
        ("XINGANG", "China"),
        ("XIAMEN", "China"),
        ("AHMEDABAD", "India"),
        ("CHENNAI", "India"),
        ("DADRI", "India"),
        ("MUMBAI", "India"),
        ("MUNDRA", "India"),
        ("NHAVA SHEVA", "India"),
        ("VIRGINIA", "India"),
        ("SURABAYA", "Indonesia"),
        ("PORT KLANG", "Malaysia"),
        ("PASIR GUDANG", "Malaysia"),
        ("TANJUNG PELAPAS", "Malaysia"),
        ("BUSAN", "South Korea"),
        ("KAOHSIUNG", "Taiwan"),
        ("KEELUNG", "Taiwan"),
        ("TAICHUNG", "Taiwan"),
        ("TAIPEI", "Taiwan"),
        ("BANGKOK", "Thailand"),
        ("LAEM CHABANG", "Thailand"),
        ("HO CHI MINH CITY", "Vietnam"),
        ("VUNG TAU", "Vietnam"),
        ("HAI PHONG", "Vietnam"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

const TARIFF_METALS: [&str; 11] = [
    "Aluminum",
    "Brass",
    "Lead-free brass",
    "Brass/plastic",
    "Steel",
    "Stainless Steel",
    "Bronze",
    "Iron",
    "Lead-free bronze",
    "Zinc",
    "Copper",
];

/// 事业部级关税默认表
///
/// Midland: 铝/钢/不锈钢 0.50，黄铜类 0，其余金属中国 0.55、其他国家 0.10
/// Buchanan: 全部为 0
fn default_division_tariffs() -> Vec<DivisionTariff> {
    let midland_countries = [
        "China",
        "India",
        "United States of America",
        "Indonesia",
        "Malaysia",
        "Taiwan",
        "Thailand",
        "Vietnam",
    ];
    let buchanan_countries = [
        "China",
        "China2",
        "India",
        "Indonesia",
        "Malaysia",
        "Taiwan",
        "Thailand",
        "Vietnam",
    ];

    let mut table = Vec::new();
    for country in midland_countries {
        for metal in TARIFF_METALS {
            let rate = match metal {
                "Aluminum" | "Steel" | "Stainless Steel" => dec!(0.50),
                "Brass" | "Lead-free brass" | "Brass/plastic" => Decimal::ZERO,
                _ if country == "China" => dec!(0.55),
                _ => dec!(0.10),
            };
            table.push(DivisionTariff {
                division: "Midland".to_string(),
                country: country.to_string(),
                metal_type: metal.to_string(),
                rate,
            });
        }
    }
    for country in buchanan_countries {
        for metal in TARIFF_METALS {
            table.push(DivisionTariff {
                division: "Buchanan".to_string(),
                country: country.to_string(),
                metal_type: metal.to_string(),
                rate: Decimal::ZERO,
            });
        }
    }
    table
}

// ==========================================
// 基准价
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// 现供应商在此名单中的零件整体剔除
    pub excluded_incumbents: Vec<String>,
    /// 被电子表格误转为日期的零件号（YYYY-MM-DD）
    pub date_mangled_part_ids: Vec<String>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            excluded_incumbents: vec!["Bugatti Group".to_string()],
            date_mangled_part_ids: Vec::new(),
        }
    }
}

// ==========================================
// 定标
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwardConfig {
    pub policies: Vec<PolicyConfig>,
}

impl Default for AwardConfig {
    fn default() -> Self {
        Self {
            policies: default_policies(),
        }
    }
}

// ==========================================
// RunConfig - 运行配置总表
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub inputs: InputPaths,
    pub outputs: OutputPaths,
    pub resolver: ResolverConfig,
    pub benchmark: BenchmarkConfig,
    pub award: AwardConfig,
}

impl RunConfig {
    /// 从 JSON 文件加载（缺省字段取默认值）
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let raw = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: RunConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        info!(
            path = %path.display(),
            policies = config.award.policies.len(),
            "运行配置已加载"
        );
        Ok(config)
    }

    /// 按 CLI 参数 → 环境变量 → 用户配置目录 解析配置路径
    pub fn resolve_path(cli_arg: Option<&str>) -> PathBuf {
        if let Some(arg) = cli_arg.map(str::trim).filter(|s| !s.is_empty()) {
            return PathBuf::from(arg);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        let mut path = PathBuf::from("./config.json");
        if let Some(config_dir) = dirs::config_dir() {
            path = config_dir.join("landed-award").join("config.json");
        }
        debug!(path = %path.display(), "使用默认配置路径");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_reproduce_production_constants() {
        let config = RunConfig::default();
        assert_eq!(config.resolver.exempt_divisions, vec!["Buchanan"]);
        assert_eq!(config.resolver.duty_exempt_suppliers, vec!["Luxecasting"]);
        assert_eq!(config.resolver.duty_rates["Steel"], dec!(0.05));
        assert_eq!(config.resolver.port_countries["NINGBO"], "China");
        assert_eq!(config.benchmark.excluded_incumbents, vec!["Bugatti Group"]);

        let china_bronze = config
            .resolver
            .division_tariffs
            .iter()
            .find(|t| t.division == "Midland" && t.country == "China" && t.metal_type == "Bronze")
            .unwrap();
        assert_eq!(china_bronze.rate, dec!(0.55));
        let india_zinc = config
            .resolver
            .division_tariffs
            .iter()
            .find(|t| t.division == "Midland" && t.country == "India" && t.metal_type == "Zinc")
            .unwrap();
        assert_eq!(india_zinc.rate, dec!(0.10));
    }

    #[test]
    fn test_load_partial_json_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"outputs": {{"directory": "out"}}, "award": {{"policies": []}}}}"#
        )
        .unwrap();

        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.outputs.directory, PathBuf::from("out"));
        assert_eq!(config.outputs.scenario, "scenario_decisions.csv");
        assert!(config.award.policies.is_empty());
        assert_eq!(config.resolver.exempt_divisions, vec!["Buchanan"]);
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            RunConfig::load("missing-config.json"),
            Err(ConfigError::NotFound(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(matches!(
            RunConfig::load(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_resolve_path_prefers_cli_argument() {
        assert_eq!(
            RunConfig::resolve_path(Some("run.json")),
            PathBuf::from("run.json")
        );
    }
}
