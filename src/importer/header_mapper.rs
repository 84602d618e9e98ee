// ==========================================
// 车队管理后台 - 表头映射器
// ==========================================
// 职责: 源表头文本 → 标准字段 key
// 顺序: label 精确 → key 精确 → 别名精确 → label/别名忽略大小写
// 未匹配的表头保留原文
// ==========================================

use crate::domain::column::ColumnSet;
use std::collections::HashMap;

pub struct HeaderMapper {
    by_label: HashMap<String, String>,
    by_key: HashMap<String, String>,
    by_alias: HashMap<String, String>,
    by_folded: HashMap<String, String>,
}

impl HeaderMapper {
    pub fn new(columns: &ColumnSet) -> Self {
        let mut by_label = HashMap::new();
        let mut by_key = HashMap::new();
        let mut by_alias = HashMap::new();
        let mut by_folded = HashMap::new();

        for column in columns.columns() {
            by_label
                .entry(column.label.trim().to_string())
                .or_insert_with(|| column.key.clone());
            by_key.insert(column.key.clone(), column.key.clone());
            by_folded
                .entry(column.label.trim().to_lowercase())
                .or_insert_with(|| column.key.clone());

            for alias in &column.aliases {
                by_alias
                    .entry(alias.trim().to_string())
                    .or_insert_with(|| column.key.clone());
                by_folded
                    .entry(alias.trim().to_lowercase())
                    .or_insert_with(|| column.key.clone());
            }
        }

        Self {
            by_label,
            by_key,
            by_alias,
            by_folded,
        }
    }

    /// 解析单个表头；空表头返回 None（该列不参与映射）
    pub fn resolve(&self, header: &str) -> Option<String> {
        let header = header.trim();
        if header.is_empty() {
            return None;
        }

        let key = self
            .by_label
            .get(header)
            .or_else(|| self.by_key.get(header))
            .or_else(|| self.by_alias.get(header))
            .or_else(|| self.by_folded.get(&header.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| header.to_string());

        Some(key)
    }

    /// 解析整行表头
    pub fn resolve_all<'a, I>(&self, headers: I) -> Vec<Option<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        headers.into_iter().map(|h| self.resolve(h)).collect()
    }
}
