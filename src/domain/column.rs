// ==========================================
// 车队管理后台 - 列描述符
// ==========================================
// 职责: 定义可导入字段（key / label / 类型 / 必填）
// 红线: 列描述符不可变，按实体类型静态声明
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

// ==========================================
// ColumnType - 字段类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Date,
}

// ==========================================
// ColumnDescriptor - 单个可导入字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,   // 标准字段标识
    pub label: String, // 表头显示文本
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub required: bool,
    /// 可接受的表头别名（如 "车牌" 之于 "车牌号"）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ColumnDescriptor {
    /// 创建字符串类型、非必填的描述符
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            column_type: ColumnType::String,
            required: false,
            aliases: Vec::new(),
        }
    }

    pub fn number(mut self) -> Self {
        self.column_type = ColumnType::Number;
        self
    }

    pub fn date(mut self) -> Self {
        self.column_type = ColumnType::Date;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn is_number(&self) -> bool {
        self.column_type == ColumnType::Number
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColumnSetError {
    #[error("列描述符为空: {0}")]
    Empty(String),

    #[error("列 key 重复: {0}")]
    DuplicateKey(String),
}

// ==========================================
// ColumnSet - 某一实体类型的全部列
// ==========================================
// 顺序即模板列顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    entity: String,
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    pub fn new(
        entity: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
    ) -> Result<Self, ColumnSetError> {
        let entity = entity.into();
        if columns.is_empty() {
            return Err(ColumnSetError::Empty(entity));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.key.as_str()) {
                return Err(ColumnSetError::DuplicateKey(column.key.clone()));
            }
        }

        Ok(Self { entity, columns })
    }

    /// 内置列集合（由单元测试保证 key 不重复）
    pub(crate) fn builtin(entity: &str, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            entity: entity.to_string(),
            columns,
        }
    }

    /// 实体名称（用于模板文件名与批次记录）
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
