// ==========================================
// 车队管理后台 - 导入模板生成器
// ==========================================
// 职责: 按列描述符生成可下载的 xlsx 样例文件
// 内容: 第 1 行为列 label；第 2 行为样例（数值列 0，其余 "Sample <Label>"）
// 红线: 生成结果必须能被 FileIngestor 以同一列集合原样读回
// ==========================================

use crate::domain::column::ColumnSet;
use crate::importer::error::{ImportError, ImportResult};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// xlsx MIME 类型
pub const TEMPLATE_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const DEFAULT_SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

/// 模板文件名: `<实体名小写>_import_template.xlsx`
pub fn template_file_name(entity: &str) -> String {
    format!("{}_import_template.xlsx", entity.to_lowercase())
}

pub struct TemplateGenerator {
    sheet_name: String,
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SHEET_NAME)
    }
}

impl TemplateGenerator {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }

    pub fn generate(&self, columns: &ColumnSet) -> ImportResult<Vec<u8>> {
        let mut shared = SharedStrings::default();
        let mut header_cells = String::new();
        let mut sample_cells = String::new();

        for (idx, column) in columns.columns().iter().enumerate() {
            let col = column_name(idx);

            let label_idx = shared.intern(&column.label);
            header_cells.push_str(&format!(r#"<c r="{col}1" t="s"><v>{label_idx}</v></c>"#));

            if column.is_number() {
                sample_cells.push_str(&format!(r#"<c r="{col}2"><v>0</v></c>"#));
            } else {
                let sample_idx = shared.intern(&format!("Sample {}", column.label));
                sample_cells.push_str(&format!(r#"<c r="{col}2" t="s"><v>{sample_idx}</v></c>"#));
            }
        }

        let last_col = column_name(columns.len().saturating_sub(1));
        let sheet_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1:{last_col}2"/><sheetData><row r="1">{header_cells}</row><row r="2">{sample_cells}</row></sheetData></worksheet>"#
        );
        let workbook_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            escape_xml(&self.sheet_name)
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let shared_xml = shared.to_xml();
        let parts: [(&str, &str); 6] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", ROOT_RELS_XML),
            ("xl/workbook.xml", &workbook_xml),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML),
            ("xl/worksheets/sheet1.xml", &sheet_xml),
            ("xl/sharedStrings.xml", &shared_xml),
        ];
        for (name, content) in parts {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes())
                .map_err(|e| ImportError::TemplateError(e.to_string()))?;
        }

        let bytes = zip.finish()?.into_inner();
        debug!(entity = columns.entity(), size = bytes.len(), "导入模板已生成");
        Ok(bytes)
    }
}

#[derive(Default)]
struct SharedStrings {
    items: Vec<String>,
}

impl SharedStrings {
    fn intern(&mut self, text: &str) -> usize {
        if let Some(idx) = self.items.iter().position(|s| s == text) {
            return idx;
        }
        self.items.push(text.to_string());
        self.items.len() - 1
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
            self.items.len()
        );
        for item in &self.items {
            xml.push_str(&format!(
                r#"<si><t xml:space="preserve">{}</t></si>"#,
                escape_xml(item)
            ));
        }
        xml.push_str("</sst>");
        xml
    }
}

/// 0 → A, 25 → Z, 26 → AA
fn column_name(mut idx: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::column::ColumnDescriptor;
    use crate::importer::file_parser::UniversalFileParser;
    use calamine::{Data, Reader, Xlsx};
    use serde_json::json;

    fn kn_columns() -> ColumnSet {
        ColumnSet::new(
            "Kit",
            vec![
                ColumnDescriptor::new("k", "K").number(),
                ColumnDescriptor::new("n", "N"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_template_content() {
        let bytes = TemplateGenerator::default().generate(&kn_columns()).unwrap();

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

        assert_eq!(
            rows[0],
            vec![Data::String("K".to_string()), Data::String("N".to_string())]
        );
        assert_eq!(rows[1][0], Data::Float(0.0));
        assert_eq!(rows[1][1], Data::String("Sample N".to_string()));
    }

    #[test]
    fn test_template_round_trip() {
        let columns = kn_columns();
        let bytes = TemplateGenerator::default().generate(&columns).unwrap();

        let rows = UniversalFileParser
            .ingest(&bytes, &template_file_name("Kit"), &columns)
            .unwrap();

        assert_eq!(rows.len(), 1);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["k", "n"]);
        assert_eq!(rows[0].get("k"), Some(&json!(0)));
        assert_eq!(rows[0].get("n"), Some(&json!("Sample N")));
    }

    #[test]
    fn test_template_escapes_labels() {
        let columns = ColumnSet::new(
            "Part",
            vec![ColumnDescriptor::new("rd", "R&D <Cost>")],
        )
        .unwrap();
        let bytes = TemplateGenerator::new("Parts & Co").generate(&columns).unwrap();

        let rows = UniversalFileParser
            .ingest(&bytes, "part.xlsx", &columns)
            .unwrap();
        assert_eq!(rows[0].get("rd"), Some(&json!("Sample R&D <Cost>")));
    }

    #[test]
    fn test_template_file_name() {
        assert_eq!(template_file_name("Customer"), "customer_import_template.xlsx");
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
    }
}
