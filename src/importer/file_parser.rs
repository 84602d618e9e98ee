// ==========================================
// 车队管理后台 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xlsm) / CSV (.csv)
// 选择: 仅按文件扩展名，不做内容嗅探
// ==========================================

use crate::domain::column::ColumnSet;
use crate::domain::row::{CellValue, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_mapper::HeaderMapper;
use crate::importer::import_trait::FileParser;
use crate::importer::type_coercer::number_value;
use calamine::{Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, instrument};

// ==========================================
// CSV Parser 实现
// ==========================================
// 手写扫描器: `"` 翻转引号状态，仅在引号外按 `,` 切分，
// 首尾同时为 `"` 时去掉这一对引号。
// 已知限制: 不处理 `""` 转义，字段内含转义引号时会切分错误（沿用既有行为）。
pub struct CsvParser;

impl CsvParser {
    /// 切分单行
    pub fn tokenize_line(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;

        for ch in line.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(ch);
                }
                ',' if !in_quotes => {
                    fields.push(strip_quotes(&current));
                    current.clear();
                }
                _ => current.push(ch),
            }
        }
        fields.push(strip_quotes(&current));

        fields
    }
}

fn strip_quotes(field: &str) -> String {
    let trimmed = field.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, bytes: &[u8], columns: &ColumnSet) -> ImportResult<Vec<RawRow>> {
        let text = String::from_utf8(bytes.to_vec())?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

        // 读取表头
        let header_line = match lines.next() {
            Some(line) if !line.trim().is_empty() => line,
            _ => return Ok(Vec::new()),
        };
        let mapper = HeaderMapper::new(columns);
        let header_tokens = CsvParser::tokenize_line(header_line);
        let headers = mapper.resolve_all(header_tokens.iter().map(String::as_str));

        // 读取所有行
        let mut records = Vec::new();
        for line in lines {
            let values = CsvParser::tokenize_line(line);
            let mut row = RawRow::new();

            for (col_idx, header) in headers.iter().enumerate() {
                let (Some(key), Some(value)) = (header, values.get(col_idx)) else {
                    continue;
                };
                if !value.is_empty() {
                    row.insert(key.clone(), Value::String(value.clone()));
                }
            }

            // 跳过完全空白的行
            if row.is_empty() {
                continue;
            }

            records.push(row);
        }

        Ok(records)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 仅读取第一个工作表，第一行为表头。
// 单元格展开顺序见 unwrap_cell。
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, bytes: &[u8], columns: &ColumnSet) -> ImportResult<Vec<RawRow>> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))?;

        // 无工作表视为空文件
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => {
                debug!("Excel 文件无工作表");
                return Ok(Vec::new());
            }
        };

        let mut rows = range.rows();
        let header_row = match rows.next() {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };

        let mapper = HeaderMapper::new(columns);
        let headers: Vec<Option<String>> = header_row
            .iter()
            .map(|cell| match cell {
                Data::Empty => None,
                other => mapper.resolve(&other.to_string()),
            })
            .collect();

        let mut records = Vec::new();
        for data_row in rows {
            let mut row = RawRow::new();

            for (col_idx, cell) in data_row.iter().enumerate() {
                let Some(Some(key)) = headers.get(col_idx) else {
                    continue;
                };
                if let Some(value) = unwrap_cell(cell) {
                    row.insert(key.clone(), value);
                }
            }

            // 跳过完全空白的行
            if row.is_empty() {
                continue;
            }

            records.push(row);
        }

        Ok(records)
    }
}

/// 单元格 → CellValue
///
/// 1. 空单元格 / 空白字符串 → None
/// 2. 字符串、整数、浮点、布尔 → 原样（整数值浮点转为整数）
/// 3. 富单元格先转成 JSON 对象，再按 `text` → `result` → 对象本身 的顺序展开：
///    - 日期时间: `{"serial", "text"}`，展开为 ISO 文本
///    - ISO 日期/时长: `{"text"}`
///    - 错误值: `{"error"}`，保留对象
pub fn unwrap_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => Some(number_value(*f).unwrap_or_else(|| Value::String(f.to_string()))),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            Some(unwrap_rich(json!({
                "serial": serial,
                "text": excel_serial_to_text(serial),
            })))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(unwrap_rich(json!({ "text": s }))),
        Data::Error(e) => Some(unwrap_rich(json!({ "error": e.to_string() }))),
    }
}

/// 富单元格展开: `text` 优先，其次 `result`，否则保留原对象
pub fn unwrap_rich(value: Value) -> Value {
    let Value::Object(map) = &value else {
        return value;
    };

    for field in ["text", "result"] {
        match map.get(field) {
            Some(Value::Null) | None => continue,
            Some(inner) => return inner.clone(),
        }
    }

    value
}

/// Excel 序列号 → ISO 文本（1900 日期系统）
fn excel_serial_to_text(serial: f64) -> Value {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return Value::Null;
    };
    if !serial.is_finite() {
        return Value::Null;
    }

    let days = serial.floor() as i64;
    let seconds = ((serial - serial.floor()) * 86_400.0).round() as i64;
    // 超出 chrono 可表示范围时返回 Null，不 panic
    let offset = Duration::try_days(days)
        .zip(Duration::try_seconds(seconds))
        .and_then(|(d, s)| d.checked_add(&s));
    let Some(datetime) = epoch
        .and_hms_opt(0, 0, 0)
        .zip(offset)
        .and_then(|(base, offset)| base.checked_add_signed(offset))
    else {
        return Value::Null;
    };

    if seconds == 0 {
        Value::String(datetime.format("%Y-%m-%d").to_string())
    } else {
        Value::String(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// ingest: 文件字节 + 文件名 → 原始行
    #[instrument(skip(self, bytes, columns), fields(entity = columns.entity(), size = bytes.len()))]
    pub fn ingest(
        &self,
        bytes: &[u8],
        filename_hint: &str,
        columns: &ColumnSet,
    ) -> ImportResult<Vec<RawRow>> {
        let ext = Path::new(filename_hint)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let rows = match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_rows(bytes, columns)?,
            "xlsx" | "xlsm" => ExcelParser.parse_to_raw_rows(bytes, columns)?,
            _ => return Err(ImportError::UnsupportedFormat(filename_hint.to_string())),
        };

        info!(file = filename_hint, rows = rows.len(), "文件解析完成");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::column::ColumnDescriptor;

    fn ab_columns() -> ColumnSet {
        ColumnSet::new(
            "Test",
            vec![
                ColumnDescriptor::new("a", "a"),
                ColumnDescriptor::new("b", "b"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_csv_skip_empty_rows() {
        let rows = CsvParser
            .parse_to_raw_rows(b"a,b\n1,2\n,\n3,4", &ab_columns())
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("a"), Some(&Value::String("1".to_string())));
        assert_eq!(rows[1].get("b"), Some(&Value::String("4".to_string())));
    }

    #[test]
    fn test_csv_crlf_and_header_mapping() {
        let columns = ColumnSet::new(
            "Customer",
            vec![ColumnDescriptor::new("name", "Name")],
        )
        .unwrap();
        let rows = CsvParser
            .parse_to_raw_rows(b" Name ,Notes\r\nAlice,vip\r\n", &columns)
            .unwrap();

        assert_eq!(rows.len(), 1);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "Notes"]);
    }

    #[test]
    fn test_csv_quoted_comma() {
        assert_eq!(
            CsvParser::tokenize_line(r#"1,"Main St, 5",x"#),
            vec!["1", "Main St, 5", "x"]
        );
    }

    #[test]
    fn test_csv_doubled_quotes_are_not_unescaped() {
        // 沿用既有行为: `""` 只翻转两次状态，引号原样保留
        assert_eq!(
            CsvParser::tokenize_line(r#""say ""hi""",2"#),
            vec![r#"say ""hi"""#, "2"]
        );
    }

    #[test]
    fn test_csv_short_row_leaves_fields_absent() {
        let rows = CsvParser
            .parse_to_raw_rows(b"a,b\n1", &ab_columns())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].get("b").is_none());
    }

    #[test]
    fn test_csv_invalid_utf8_is_parse_error() {
        let err = CsvParser
            .parse_to_raw_rows(&[0x61, 0x0a, 0xff, 0xfe], &ab_columns())
            .unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_csv_empty_input() {
        let rows = CsvParser.parse_to_raw_rows(b"", &ab_columns()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = UniversalFileParser.ingest(b"a,b", "data.txt", &ab_columns());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_corrupt_xlsx_is_parse_error() {
        let result = UniversalFileParser.ingest(b"not a zip", "data.xlsx", &ab_columns());
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }

    #[test]
    fn test_unwrap_rich_order() {
        assert_eq!(
            unwrap_rich(json!({"text": "Link", "result": 3})),
            json!("Link")
        );
        assert_eq!(unwrap_rich(json!({"result": 3})), json!(3));
        assert_eq!(
            unwrap_rich(json!({"error": "#DIV/0!"})),
            json!({"error": "#DIV/0!"})
        );
        assert_eq!(unwrap_rich(json!("plain")), json!("plain"));
    }

    #[test]
    fn test_unwrap_cell_primitives() {
        assert_eq!(unwrap_cell(&Data::Empty), None);
        assert_eq!(unwrap_cell(&Data::String("  ".to_string())), None);
        assert_eq!(unwrap_cell(&Data::Float(0.0)), Some(json!(0)));
        assert_eq!(unwrap_cell(&Data::Float(2.5)), Some(json!(2.5)));
        assert_eq!(unwrap_cell(&Data::Int(7)), Some(json!(7)));
        assert_eq!(unwrap_cell(&Data::Bool(true)), Some(json!(true)));
    }

    #[test]
    fn test_excel_serial_to_text() {
        assert_eq!(excel_serial_to_text(45_292.0), json!("2024-01-01"));
        assert_eq!(excel_serial_to_text(45_292.5), json!("2024-01-01T12:00:00"));
        assert_eq!(excel_serial_to_text(1.0e12), Value::Null);
        assert_eq!(excel_serial_to_text(-1.0e15), Value::Null);
        assert_eq!(excel_serial_to_text(f64::NAN), Value::Null);
    }
}
