// ==========================================
// 车队管理后台 - 规则型 Schema
// ==========================================
// 职责: 以声明式字段规则实现 Schema（单行规则 + 批内唯一）
// 规则:
// - 必填缺失时不再对该字段执行其它规则
// - 批内唯一只标记重复出现的后续行，首行不报错
// ==========================================

use crate::domain::column::{ColumnSet, ColumnType};
use crate::domain::row::{CellValue, RowPayload};
use crate::domain::validation::{FieldIssue, SchemaOutcome};
use crate::importer::import_trait::Schema;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;

// ==========================================
// Rule - 单字段规则
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    Number { min: Option<f64>, max: Option<f64> },
    /// YYYY-MM-DD 或 YYYYMMDD
    Date,
    MaxLength(usize),
    OneOf(Vec<String>),
    /// 批内唯一（仅在 validate_batch 中生效）
    Unique,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: String,
    pub rule: Rule,
}

#[derive(Debug, Clone, Default)]
pub struct RuleSchema {
    rules: Vec<FieldRule>,
}

impl RuleSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按列描述符派生基础规则（必填 / 数值 / 日期）
    pub fn from_columns(columns: &ColumnSet) -> Self {
        let mut schema = Self::new();
        for column in columns.columns() {
            if column.required {
                schema = schema.rule(&column.key, Rule::Required);
            }
            match column.column_type {
                ColumnType::Number => {
                    schema = schema.rule(&column.key, Rule::Number { min: None, max: None });
                }
                ColumnType::Date => {
                    schema = schema.rule(&column.key, Rule::Date);
                }
                ColumnType::String => {}
            }
        }
        schema
    }

    pub fn rule(mut self, field: &str, rule: Rule) -> Self {
        self.rules.push(FieldRule {
            field: field.to_string(),
            rule,
        });
        self
    }

    /// 设置数值范围；已有数值规则时就地替换上下限
    pub fn range(mut self, field: &str, min: Option<f64>, max: Option<f64>) -> Self {
        let existing = self
            .rules
            .iter_mut()
            .find(|r| r.field == field && matches!(r.rule, Rule::Number { .. }));
        match existing {
            Some(found) => found.rule = Rule::Number { min, max },
            None => {
                self.rules.push(FieldRule {
                    field: field.to_string(),
                    rule: Rule::Number { min, max },
                });
            }
        }
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    fn check_record(&self, record: &RowPayload) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        let mut missing: Vec<&str> = Vec::new();

        for field_rule in &self.rules {
            let field = field_rule.field.as_str();
            if missing.contains(&field) {
                continue;
            }

            let value = record.get(field).filter(|v| !is_blank(v));
            let message = match (&field_rule.rule, value) {
                (Rule::Required, None) => {
                    missing.push(field);
                    Some("必填字段不能为空".to_string())
                }
                (_, None) | (Rule::Required, Some(_)) | (Rule::Unique, Some(_)) => None,
                (Rule::Number { min, max }, Some(v)) => check_number(v, *min, *max),
                (Rule::Date, Some(v)) => check_date(v),
                (Rule::MaxLength(limit), Some(v)) => {
                    let len = cell_text(v).chars().count();
                    (len > *limit).then(|| format!("长度不能超过 {} 个字符", limit))
                }
                (Rule::OneOf(options), Some(v)) => {
                    let text = cell_text(v);
                    (!options.iter().any(|o| o == &text))
                        .then(|| format!("取值必须为以下之一: {}", options.join(", ")))
                }
            };

            if let Some(message) = message {
                issues.push(FieldIssue::new(field, message));
            }
        }

        issues
    }

    fn unique_fields(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|r| r.rule == Rule::Unique)
            .map(|r| r.field.as_str())
    }
}

impl Schema for RuleSchema {
    fn validate(&self, record: &RowPayload) -> SchemaOutcome {
        let issues = self.check_record(record);
        if issues.is_empty() {
            SchemaOutcome::Valid
        } else {
            SchemaOutcome::Invalid(issues)
        }
    }

    fn validate_batch(&self, records: &[RowPayload]) -> Vec<SchemaOutcome> {
        let mut issues: Vec<Vec<FieldIssue>> =
            records.iter().map(|r| self.check_record(r)).collect();

        for field in self.unique_fields() {
            let mut seen: HashMap<String, usize> = HashMap::new();
            for (idx, record) in records.iter().enumerate() {
                let Some(value) = record.get(field).filter(|v| !is_blank(v)) else {
                    continue;
                };
                let key = cell_text(value).to_lowercase();
                match seen.get(&key) {
                    Some(first) => issues[idx].push(FieldIssue::new(
                        field,
                        format!("与第 {} 行重复", first + 1),
                    )),
                    None => {
                        seen.insert(key, idx);
                    }
                }
            }
        }

        issues
            .into_iter()
            .map(|list| {
                if list.is_empty() {
                    SchemaOutcome::Valid
                } else {
                    SchemaOutcome::Invalid(list)
                }
            })
            .collect()
    }
}

fn is_blank(value: &CellValue) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// 单元格文本；富单元格取其 text
fn cell_text(value: &CellValue) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => match map.get("text") {
            Some(Value::String(s)) => s.trim().to_string(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

fn check_number(value: &CellValue, min: Option<f64>, max: Option<f64>) -> Option<String> {
    let Some(n) = value.as_f64() else {
        return Some("必须为数值".to_string());
    };
    if let Some(min) = min {
        if n < min {
            return Some(format!("不能小于 {}", min));
        }
    }
    if let Some(max) = max {
        if n > max {
            return Some(format!("不能大于 {}", max));
        }
    }
    None
}

fn check_date(value: &CellValue) -> Option<String> {
    let text = cell_text(value);
    let parsed = NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&text, "%Y%m%d"));
    match parsed {
        Ok(_) => None,
        Err(_) => Some("日期格式无效，应为 YYYY-MM-DD".to_string()),
    }
}
