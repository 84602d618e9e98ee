// ==========================================
// 车队管理后台 - 校验引擎
// ==========================================
// 职责: 用 Schema 校验整批标准行，生成 ErrorIndex
// 规则:
// - 每次都校验全部行（跨行规则依赖整批，不做增量校验）
// - 同一行同一字段多条错误时后者覆盖前者
// - 无结构化字段信息的失败记为 ValidatorFault，不混入 ErrorIndex
// ==========================================

use crate::domain::row::{CanonicalRow, RowPayload};
use crate::domain::validation::{SchemaOutcome, ValidationReport, ValidatorFault};
use crate::importer::import_trait::Schema;
use tracing::{debug, warn};

pub struct ValidationEngine;

impl ValidationEngine {
    pub fn validate(rows: &[CanonicalRow], schema: &dyn Schema) -> ValidationReport {
        let payloads: Vec<RowPayload> = rows.iter().map(CanonicalRow::to_payload).collect();
        let outcomes = schema.validate_batch(&payloads);

        let mut report = ValidationReport::default();

        if outcomes.len() != rows.len() {
            warn!(
                rows = rows.len(),
                outcomes = outcomes.len(),
                "Schema 返回结果数量与行数不一致"
            );
        }

        for (idx, row) in rows.iter().enumerate() {
            let outcome = match outcomes.get(idx) {
                Some(outcome) => outcome,
                None => {
                    report.faults.push(ValidatorFault {
                        row_id: row.id,
                        message: "校验器未返回该行结果".to_string(),
                    });
                    continue;
                }
            };

            match outcome {
                SchemaOutcome::Valid => {}
                SchemaOutcome::Invalid(issues) => {
                    for issue in issues {
                        match issue.field() {
                            Some(field) => {
                                report
                                    .errors
                                    .entry(row.id)
                                    .or_default()
                                    .insert(field.to_string(), issue.message.clone());
                            }
                            None => {
                                warn!(row_id = %row.id, message = %issue.message, "校验失败缺少字段路径");
                                report.faults.push(ValidatorFault {
                                    row_id: row.id,
                                    message: issue.message.clone(),
                                });
                            }
                        }
                    }
                }
                SchemaOutcome::Fault(message) => {
                    warn!(row_id = %row.id, message = %message, "校验器异常");
                    report.faults.push(ValidatorFault {
                        row_id: row.id,
                        message: message.clone(),
                    });
                }
            }
        }

        debug!(
            rows = rows.len(),
            error_rows = report.errors.len(),
            faults = report.faults.len(),
            "整批校验完成"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::row::RowId;
    use crate::domain::validation::FieldIssue;
    use serde_json::{json, Map, Value};

    fn row(value: Value) -> CanonicalRow {
        let fields: Map<String, Value> = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        CanonicalRow::new(RowId::new(), fields)
    }

    // 年龄必须为数值；"boom" 名字触发校验器异常
    struct AgeSchema;

    impl Schema for AgeSchema {
        fn validate(&self, record: &RowPayload) -> SchemaOutcome {
            if record.get("name") == Some(&json!("boom")) {
                return SchemaOutcome::Fault("unexpected".to_string());
            }
            match record.get("age") {
                Some(Value::Number(_)) => SchemaOutcome::Valid,
                _ => SchemaOutcome::Invalid(vec![
                    FieldIssue::new("age", "first"),
                    FieldIssue::new("age", "年龄必须为数值"),
                ]),
            }
        }
    }

    #[test]
    fn test_valid_rows_have_no_entry() {
        let rows = vec![row(json!({"age": 3})), row(json!({"age": "x"}))];
        let report = ValidationEngine::validate(&rows, &AgeSchema);

        assert_eq!(report.errors.len(), 1);
        assert!(!report.errors.contains_key(&rows[0].id));
    }

    #[test]
    fn test_last_error_per_field_wins() {
        let rows = vec![row(json!({"age": "x"}))];
        let report = ValidationEngine::validate(&rows, &AgeSchema);

        assert_eq!(report.errors[&rows[0].id]["age"], "年龄必须为数值");
    }

    #[test]
    fn test_fault_is_reported_separately() {
        let rows = vec![row(json!({"name": "boom", "age": "x"}))];
        let report = ValidationEngine::validate(&rows, &AgeSchema);

        assert!(report.errors.is_empty());
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].row_id, rows[0].id);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_issue_without_path_is_fault() {
        struct PathlessSchema;
        impl Schema for PathlessSchema {
            fn validate(&self, _record: &RowPayload) -> SchemaOutcome {
                SchemaOutcome::Invalid(vec![FieldIssue {
                    path: vec![],
                    message: "整行无效".to_string(),
                }])
            }
        }

        let rows = vec![row(json!({"a": 1}))];
        let report = ValidationEngine::validate(&rows, &PathlessSchema);
        assert!(report.errors.is_empty());
        assert_eq!(report.faults.len(), 1);
    }
}
