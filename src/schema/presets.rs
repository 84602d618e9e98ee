// ==========================================
// 车队管理后台 - 内置实体校验规则
// ==========================================
// 职责: 为每种 EntityKind 提供默认 RuleSchema
// 说明: 基础规则由列描述符派生，此处只追加业务规则
// ==========================================

use crate::domain::entity::EntityKind;
use crate::schema::rule_schema::{Rule, RuleSchema};

pub fn schema_for(kind: EntityKind) -> RuleSchema {
    let base = RuleSchema::from_columns(&kind.column_set());
    match kind {
        EntityKind::Part => base
            .rule("part_number", Rule::Unique)
            .rule("part_number", Rule::MaxLength(64))
            .range("unit_price", Some(0.0), None)
            .range("stock_quantity", Some(0.0), None),
        EntityKind::Customer => base
            .rule("tax_id", Rule::MaxLength(13))
            .rule("tax_id", Rule::Unique)
            .range("credit_limit", Some(0.0), None),
        EntityKind::Vehicle => base
            .rule("plate", Rule::Unique)
            .rule("vin", Rule::MaxLength(17))
            .rule("vin", Rule::Unique)
            .range("year", Some(1950.0), Some(2100.0))
            .range("mileage", Some(0.0), None),
        EntityKind::Driver => base
            .rule("license_number", Rule::Unique)
            .rule("license_number", Rule::MaxLength(32)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::row::RowPayload;
    use crate::domain::validation::SchemaOutcome;
    use crate::importer::import_trait::Schema;
    use serde_json::{json, Value};

    fn payload(value: Value) -> RowPayload {
        match value {
            Value::Object(map) => map,
            _ => RowPayload::new(),
        }
    }

    #[test]
    fn test_every_rule_targets_a_declared_column() {
        for kind in EntityKind::ALL {
            let columns = kind.column_set();
            for rule in schema_for(kind).rules() {
                assert!(
                    columns.get(&rule.field).is_some(),
                    "{} 规则引用了未声明字段 {}",
                    kind,
                    rule.field
                );
            }
        }
    }

    #[test]
    fn test_vehicle_preset() {
        let schema = schema_for(EntityKind::Vehicle);
        let records = vec![
            payload(json!({"plate": "ABC-123", "brand": "Volvo", "model": "FH", "year": 2019})),
            payload(json!({"plate": "ABC-123", "brand": "Volvo", "model": "FH", "year": 1890})),
        ];

        let outcomes = schema.validate_batch(&records);

        assert_eq!(outcomes[0], SchemaOutcome::Valid);
        match &outcomes[1] {
            SchemaOutcome::Invalid(issues) => {
                let fields: Vec<&str> = issues.iter().filter_map(|i| i.field()).collect();
                assert!(fields.contains(&"plate"));
                assert!(fields.contains(&"year"));
            }
            other => panic!("应为 Invalid，实际 {:?}", other),
        }
    }

    #[test]
    fn test_part_price_must_be_non_negative() {
        let schema = schema_for(EntityKind::Part);
        let outcome = schema.validate(&payload(json!({
            "part_number": "P-1",
            "name": "Filter",
            "unit_price": -1
        })));
        assert!(matches!(outcome, SchemaOutcome::Invalid(_)));
    }
}
