// ==========================================
// 到岸成本定标系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / UPPER / NULL 标准化 / 数值解析
// 红线: 非数值单元格按缺失处理，不中断整行
// ==========================================

use crate::importer::importer_trait::DataCleaner as DataCleanerTrait;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

/// 视为缺失的文本
const NULL_TOKENS: [&str; 6] = ["-", "nan", "none", "null", "n/a", "#n/a"];

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            let lowered = trimmed.to_lowercase();
            if trimmed.is_empty() || NULL_TOKENS.contains(&lowered.as_str()) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn parse_decimal(&self, value: Option<&str>) -> Option<Decimal> {
        let text = self.normalize_null(value)?;
        let cleaned: String = text
            .chars()
            .filter(|c| *c != ',' && *c != '$' && !c.is_whitespace())
            .collect();

        let parsed = Decimal::from_str(&cleaned)
            .or_else(|_| Decimal::from_scientific(&cleaned))
            .ok();
        if parsed.is_none() {
            debug!(value = %text, "非数值单元格按缺失处理");
        }
        parsed
    }
}

impl DataCleaner {
    /// 解析非负整数（有效供应商数等）
    pub fn parse_count(&self, value: Option<&str>) -> Option<u32> {
        self.parse_decimal(value)
            .filter(|d| !d.is_sign_negative())
            .and_then(|d| d.trunc().to_u32())
    }

    /// 日期字符串（YYYY-MM-DD）→ Excel 序列号（1899-12-30 为第 0 天）
    pub fn excel_serial(&self, value: &str) -> Option<i64> {
        let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()?;
        let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
        Some(date.signed_duration_since(base).num_days())
    }
}
