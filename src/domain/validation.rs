// ==========================================
// 车队管理后台 - 校验结果模型
// ==========================================
// 职责: Schema 返回值 / 错误索引 / 校验器故障
// ==========================================

use crate::domain::row::RowId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 错误索引：RowId → (字段 key → 错误信息)；无条目即该行无错
pub type ErrorIndex = HashMap<RowId, HashMap<String, String>>;

// ==========================================
// FieldIssue - 一条结构化校验失败
// ==========================================
// path 第一段即出错字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub path: Vec<String>,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: vec![field.into()],
            message: message.into(),
        }
    }

    pub fn field(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }
}

// ==========================================
// SchemaOutcome - Schema 对单行的判定
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SchemaOutcome {
    Valid,
    Invalid(Vec<FieldIssue>),
    /// 校验器自身异常（无结构化字段信息）
    Fault(String),
}

// ==========================================
// ValidatorFault - 与普通字段错误分开上报
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorFault {
    pub row_id: RowId,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: ErrorIndex,
    pub faults: Vec<ValidatorFault>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.faults.is_empty()
    }
}
