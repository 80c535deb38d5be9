// ==========================================
// 到岸成本定标系统 - 定标策略配置
// ==========================================
// 职责: 覆写策略的有序声明（按 kind 打标签的 JSON 列表）
// 红线: 列表顺序即执行顺序，调整顺序会改变结果
// 用量上限在分桶时按输入顺序拦截，先于其余策略；多个上限按列表顺序依次拦截
// ==========================================

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 上限口径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapMetric {
    /// 累计年用量
    Volume,
    /// 累计 FOB 扩展金额
    FobSpend,
}

impl CapMetric {
    pub fn label(&self) -> &'static str {
        match self {
            CapMetric::Volume => "volume",
            CapMetric::FobSpend => "fob_spend",
        }
    }
}

/// 停供供应商及其受影响零件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscontinuedList {
    pub supplier: String,
    #[serde(default)]
    pub row_ids: Vec<String>,
}

// ==========================================
// PolicyConfig - 单条覆写策略
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// 指定零件号上的供应商排除，改派固定备选供应商
    FallbackExclusion {
        supplier: String,
        fallback: String,
        #[serde(default)]
        part_numbers: Vec<String>,
    },
    /// 供应商整体排除，改派次低到岸价供应商
    SupplierExclusion { supplier: String },
    /// 限定行号上的供应商排除（如红铜件）
    RestrictedParts {
        supplier: String,
        label: String,
        #[serde(default)]
        row_ids: Vec<String>,
    },
    /// 停供供应商替换
    DiscontinuedSupplier {
        #[serde(default)]
        suppliers: Vec<DiscontinuedList>,
    },
    /// 尾部供应商整合
    TailRationalization {
        threshold: Decimal,
        /// 显式尾部名单；缺省时按阈值自动识别
        #[serde(default)]
        candidates: Option<Vec<String>>,
    },
    /// 供应商用量/金额上限
    VolumeCap {
        supplier: String,
        metric: CapMetric,
        cap: Decimal,
        /// 该供应商为最低价时优先保留的现供应商
        #[serde(default)]
        retain_incumbents: Vec<String>,
        /// 上限内允许从这些现供应商接手；缺省为不限
        #[serde(default)]
        allowed_incumbents: Option<Vec<String>>,
    },
}

impl PolicyConfig {
    /// 策略名称（日志用）
    pub fn kind(&self) -> &'static str {
        match self {
            PolicyConfig::FallbackExclusion { .. } => "fallback_exclusion",
            PolicyConfig::SupplierExclusion { .. } => "supplier_exclusion",
            PolicyConfig::RestrictedParts { .. } => "restricted_parts",
            PolicyConfig::DiscontinuedSupplier { .. } => "discontinued_supplier",
            PolicyConfig::TailRationalization { .. } => "tail_rationalization",
            PolicyConfig::VolumeCap { .. } => "volume_cap",
        }
    }
}

pub const BINZHOU_ZELI: &str = "Binzhou Zeli";
pub const LUXECASTING: &str = "Luxecasting";
pub const WEST_LEGEND_MTD: &str = "West Legend-MTD";
pub const MANEK_METALCRAFT: &str = "Manek Metalcraft";
pub const PUSHTI_METAL: &str = "Pushti Metal";
pub const MAYANK: &str = "Mayank";
pub const BRASS_PRO_INDUSTRIAL: &str = "Brass Pro Industrial";

/// 大供应商阈值（到岸扩展成本）
pub const TAIL_THRESHOLD: Decimal = dec!(100000);

const BINZHOU_EXCLUDED_PARTS: [&str; 31] = [
    "CGBSL-200-A1", "CGDSL-200-A1", "CGCSL-200CR-A1", "CDCSL-200-A1", "CDCSL-300-A1",
    "CGBSL-300-A1", "CGDSL-300-A1", "CGCSL-300CR-A1", "CGBSL-400-A1", "CGDSL-400-A1",
    "CDCSL-400-A1", "CDCSL-200-SS1", "CGCSL-400CR-A1", "CGBSL-200-SS1", "CGCSL-200CR-SS1",
    "CGDSL-200-SS1", "CDCSL-600-A1", "CDCSL-300-SS1", "CGDSL-600-A1", "CGBSL-300-SS1",
    "CGCSL-600CR-A1", "CGDSL-300-SS1", "CGCSL-300CR-SS1", "CDCSL-400-SS1", "CGBSL-400-SS1",
    "CGDSL-400-SS1", "CGCSL-400CR-SS1", "CDCSL-600-SS1", "CGBSL-600-SS1", "CGDSL-600-SS1",
    "CGCSL-600CR-SS1",
];

const TAIL_CANDIDATES: [&str; 7] = [
    "Giraffe Stainless",
    "Union Metal Products",
    "WEFLO",
    "Tianjin Outshine",
    "Sichuan Y&J",
    "Guangzhou Hopetrol",
    "Swati Enterprise",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// 默认策略级联
///
/// 行号名单（红铜件限制 / 停供零件）较长，随 config/award_run.json 下发
pub fn default_policies() -> Vec<PolicyConfig> {
    vec![
        PolicyConfig::FallbackExclusion {
            supplier: BINZHOU_ZELI.to_string(),
            fallback: LUXECASTING.to_string(),
            part_numbers: owned(&BINZHOU_EXCLUDED_PARTS),
        },
        PolicyConfig::SupplierExclusion {
            supplier: WEST_LEGEND_MTD.to_string(),
        },
        PolicyConfig::RestrictedParts {
            supplier: MANEK_METALCRAFT.to_string(),
            label: "red brass".to_string(),
            row_ids: Vec::new(),
        },
        PolicyConfig::DiscontinuedSupplier {
            suppliers: vec![
                DiscontinuedList {
                    supplier: "Oston Industrial".to_string(),
                    row_ids: Vec::new(),
                },
                DiscontinuedList {
                    supplier: "ZHEJIANG WANDEKAI".to_string(),
                    row_ids: Vec::new(),
                },
                DiscontinuedList {
                    supplier: "Coda".to_string(),
                    row_ids: Vec::new(),
                },
            ],
        },
        PolicyConfig::TailRationalization {
            threshold: TAIL_THRESHOLD,
            candidates: Some(owned(&TAIL_CANDIDATES)),
        },
        PolicyConfig::VolumeCap {
            supplier: PUSHTI_METAL.to_string(),
            metric: CapMetric::Volume,
            cap: dec!(1000000),
            retain_incumbents: vec![MAYANK.to_string()],
            allowed_incumbents: Some(vec![BRASS_PRO_INDUSTRIAL.to_string()]),
        },
        PolicyConfig::VolumeCap {
            supplier: MANEK_METALCRAFT.to_string(),
            metric: CapMetric::Volume,
            cap: dec!(6400000),
            retain_incumbents: vec![MAYANK.to_string()],
            allowed_incumbents: Some(vec![BRASS_PRO_INDUSTRIAL.to_string()]),
        },
        PolicyConfig::VolumeCap {
            supplier: MANEK_METALCRAFT.to_string(),
            metric: CapMetric::FobSpend,
            cap: dec!(3500000),
            retain_incumbents: Vec::new(),
            allowed_incumbents: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_config_tagged_by_kind() {
        let json = r#"[
            {"kind": "supplier_exclusion", "supplier": "West Legend-MTD"},
            {"kind": "tail_rationalization", "threshold": 100000},
            {"kind": "volume_cap", "supplier": "Pushti Metal", "metric": "volume", "cap": "1000000"}
        ]"#;
        let policies: Vec<PolicyConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(policies.len(), 3);
        assert_eq!(policies[0].kind(), "supplier_exclusion");
        match &policies[1] {
            PolicyConfig::TailRationalization { threshold, candidates } => {
                assert_eq!(*threshold, dec!(100000));
                assert!(candidates.is_none());
            }
            other => panic!("unexpected policy: {:?}", other),
        }
        match &policies[2] {
            PolicyConfig::VolumeCap {
                cap,
                metric,
                allowed_incumbents,
                ..
            } => {
                assert_eq!(*cap, dec!(1000000));
                assert_eq!(*metric, CapMetric::Volume);
                assert!(allowed_incumbents.is_none());
            }
            other => panic!("unexpected policy: {:?}", other),
        }
    }

    #[test]
    fn test_default_cascade_order() {
        let kinds: Vec<&str> = default_policies().iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "fallback_exclusion",
                "supplier_exclusion",
                "restricted_parts",
                "discontinued_supplier",
                "tail_rationalization",
                "volume_cap",
                "volume_cap",
                "volume_cap",
            ]
        );
    }
}
