// ==========================================
// 车队管理后台 - 错误报告导出
// ==========================================
// 职责: 将会话中的行与错误导出为 CSV，供用户离线修正
// 格式: 列 label ... + 未声明列(原表头) ... + "错误信息"；每行按会话顺序输出
// ==========================================

use crate::domain::row::CellValue;
use crate::importer::correction_session::CorrectionSession;
use crate::importer::error::{ImportError, ImportResult};
use csv::WriterBuilder;
use serde_json::Value;

pub const ERROR_COLUMN_LABEL: &str = "错误信息";

/// 导出错误报告
///
/// # 参数
/// - session: 当前会话
/// - only_errors: 为 true 时只导出有错误的行
pub fn export_error_report(session: &CorrectionSession, only_errors: bool) -> ImportResult<Vec<u8>> {
    let columns = session.columns().columns();
    let extra_keys = undeclared_keys(session);
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<&str> = columns.iter().map(|c| c.label.as_str()).collect();
    header.extend(extra_keys.iter().map(String::as_str));
    header.push(ERROR_COLUMN_LABEL);
    writer.write_record(&header)?;

    for row in session.rows() {
        let errors = session.errors().get(&row.id);
        if only_errors && errors.is_none() {
            continue;
        }

        let mut record: Vec<String> = columns
            .iter()
            .map(|c| row.get(&c.key).map(cell_to_text).unwrap_or_default())
            .collect();
        record.extend(
            extra_keys
                .iter()
                .map(|key| row.get(key).map(cell_to_text).unwrap_or_default()),
        );

        // 按列顺序拼接错误，未声明字段的错误排在最后
        let message = match errors {
            Some(fields) => {
                let mut parts: Vec<String> = columns
                    .iter()
                    .filter_map(|c| fields.get(&c.key).map(|m| format!("{}: {}", c.label, m)))
                    .collect();
                let mut extra: Vec<String> = fields
                    .iter()
                    .filter(|(key, _)| session.columns().get(key).is_none())
                    .map(|(key, m)| format!("{}: {}", key, m))
                    .collect();
                extra.sort();
                parts.extend(extra);
                parts.join("; ")
            }
            None => String::new(),
        };
        record.push(message);

        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ImportError::ReportError(e.to_string()))
}

/// 未在列集合中声明的字段，按首次出现顺序
fn undeclared_keys(session: &CorrectionSession) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for row in session.rows() {
        for key in row.fields.keys() {
            if session.columns().get(key).is_none() && !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

fn cell_to_text(value: &CellValue) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
