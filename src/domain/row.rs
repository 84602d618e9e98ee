// ==========================================
// 车队管理后台 - 导入行模型
// ==========================================
// 职责: 原始行 / 标准行 / 行标识 / 落库载荷
// 红线: RowId 只在会话内部使用，绝不进入落库载荷
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// 单元格值：字符串 / 数值 / 布尔为原始值，JSON 对象为富单元格
pub type CellValue = Value;

/// 原始行：表头（已映射为 key，未映射保留原文）→ 单元格值，保持列顺序
pub type RawRow = Map<String, CellValue>;

/// 落库载荷：去掉 RowId 后的 key → 值
pub type RowPayload = Map<String, CellValue>;

// ==========================================
// RowId - 会话内行标识
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for RowId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

// ==========================================
// CanonicalRow - 类型转换后的标准行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub id: RowId,
    pub fields: Map<String, CellValue>,
}

impl CanonicalRow {
    pub fn new(id: RowId, fields: Map<String, CellValue>) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }

    /// 返回替换了单个字段的新行（原行不变）
    pub fn with_field(&self, key: &str, value: CellValue) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key.to_string(), value);
        Self {
            id: self.id,
            fields,
        }
    }

    /// 去掉 RowId，得到落库载荷
    pub fn to_payload(&self) -> RowPayload {
        self.fields.clone()
    }
}
