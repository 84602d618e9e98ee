// ==========================================
// 车队管理后台 - 类型转换器
// ==========================================
// 职责: 原始单元格 → 按列类型转换后的值
// 红线: 纯函数、从不失败；转换失败时保留原值，由 Schema 报错
// ==========================================

use crate::domain::column::{ColumnDescriptor, ColumnSet, ColumnType};
use crate::domain::row::{CellValue, RawRow};
use serde_json::{Map, Number, Value};

// 2^53，超出后 f64 无法精确表示整数
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

pub struct TypeCoercer;

impl TypeCoercer {
    /// 整行转换；未声明的字段原样保留，缺失字段保持缺失
    pub fn coerce(raw: &RawRow, columns: &ColumnSet) -> Map<String, CellValue> {
        let mut fields = Map::new();
        for (key, value) in raw {
            let coerced = match columns.get(key) {
                Some(descriptor) => Self::coerce_value(descriptor, value),
                None => value.clone(),
            };
            fields.insert(key.clone(), coerced);
        }
        fields
    }

    /// 单元格转换
    pub fn coerce_value(descriptor: &ColumnDescriptor, value: &CellValue) -> CellValue {
        match descriptor.column_type {
            ColumnType::Number => coerce_number(value),
            // 日期解析由 Schema 负责
            ColumnType::String | ColumnType::Date => value.clone(),
        }
    }
}

fn coerce_number(value: &CellValue) -> CellValue {
    match value {
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => number_value(n).unwrap_or_else(|| value.clone()),
            Err(_) => value.clone(),
        },
        _ => value.clone(),
    }
}

/// f64 → JSON 数值；整数值存为整数，非有限值返回 None
pub fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        return Some(Value::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::column::ColumnDescriptor;
    use serde_json::json;

    fn columns() -> ColumnSet {
        ColumnSet::new(
            "Person",
            vec![
                ColumnDescriptor::new("name", "Name").required(),
                ColumnDescriptor::new("age", "Age").number(),
                ColumnDescriptor::new("born", "Born").date(),
            ],
        )
        .unwrap()
    }

    fn raw(pairs: &[(&str, Value)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_number_string_is_parsed() {
        let fields = TypeCoercer::coerce(&raw(&[("age", json!("30"))]), &columns());
        assert_eq!(fields.get("age"), Some(&json!(30)));

        let fields = TypeCoercer::coerce(&raw(&[("age", json!(" 2.5 "))]), &columns());
        assert_eq!(fields.get("age"), Some(&json!(2.5)));
    }

    #[test]
    fn test_unparseable_number_keeps_raw_value() {
        for input in [json!("thirty"), json!("NaN"), json!("inf"), json!(""), json!(true)] {
            let fields = TypeCoercer::coerce(&raw(&[("age", input.clone())]), &columns());
            assert_eq!(fields.get("age"), Some(&input));
        }
    }

    #[test]
    fn test_numeric_value_is_kept() {
        let fields = TypeCoercer::coerce(&raw(&[("age", json!(41))]), &columns());
        assert_eq!(fields.get("age"), Some(&json!(41)));
    }

    #[test]
    fn test_string_date_and_unmapped_pass_through() {
        let fields = TypeCoercer::coerce(
            &raw(&[
                ("name", json!("007")),
                ("born", json!("20240101")),
                ("Notes", json!("12")),
            ]),
            &columns(),
        );
        assert_eq!(fields.get("name"), Some(&json!("007")));
        assert_eq!(fields.get("born"), Some(&json!("20240101")));
        assert_eq!(fields.get("Notes"), Some(&json!("12")));
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let fields = TypeCoercer::coerce(&raw(&[("name", json!("Alice"))]), &columns());
        assert!(!fields.contains_key("age"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(3.0), Some(json!(3)));
        assert_eq!(number_value(-0.5), Some(json!(-0.5)));
        assert_eq!(number_value(f64::NAN), None);
        assert_eq!(number_value(f64::INFINITY), None);
    }
}
