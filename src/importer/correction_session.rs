// ==========================================
// 车队管理后台 - 纠错会话
// ==========================================
// 职责: 持有一次导入的全部行与错误索引，支持逐格修改
// 红线:
// - errors 永远是对当前 rows 重新整批校验的结果，从不直接修改
// - RowId 在会话生命周期内唯一且稳定
// - 行顺序与源文件一致
// ==========================================

use crate::domain::column::ColumnSet;
use crate::domain::row::{CanonicalRow, CellValue, RawRow, RowId};
use crate::domain::session::ImportSummary;
use crate::domain::validation::{ErrorIndex, ValidatorFault};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_trait::Schema;
use crate::importer::type_coercer::TypeCoercer;
use crate::importer::validation_engine::ValidationEngine;
use std::sync::Arc;
use tracing::{debug, info};

pub struct CorrectionSession {
    columns: Arc<ColumnSet>,
    schema: Arc<dyn Schema>,
    rows: Vec<CanonicalRow>,
    errors: ErrorIndex,
    faults: Vec<ValidatorFault>,
}

impl CorrectionSession {
    /// 由解析结果创建会话：分配 RowId → 类型转换 → 整批校验
    pub fn new(raw_rows: Vec<RawRow>, columns: Arc<ColumnSet>, schema: Arc<dyn Schema>) -> Self {
        let rows: Vec<CanonicalRow> = raw_rows
            .iter()
            .map(|raw| CanonicalRow::new(RowId::new(), TypeCoercer::coerce(raw, &columns)))
            .collect();

        let report = ValidationEngine::validate(&rows, schema.as_ref());
        info!(
            entity = columns.entity(),
            rows = rows.len(),
            error_rows = report.errors.len(),
            "导入会话已创建"
        );

        Self {
            columns,
            schema,
            rows,
            errors: report.errors,
            faults: report.faults,
        }
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn errors(&self) -> &ErrorIndex {
        &self.errors
    }

    pub fn faults(&self) -> &[ValidatorFault] {
        &self.faults
    }

    pub fn row(&self, row_id: RowId) -> Option<&CanonicalRow> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    pub fn field_error(&self, row_id: RowId, field_key: &str) -> Option<&str> {
        self.errors
            .get(&row_id)
            .and_then(|fields| fields.get(field_key))
            .map(String::as_str)
    }

    /// 修改单元格
    ///
    /// 新值按该字段的列类型转换后替换（生成新行值），然后对全部行重新校验，
    /// 整体替换 errors / faults。
    pub fn update_cell(
        &mut self,
        row_id: RowId,
        field_key: &str,
        value: CellValue,
    ) -> ImportResult<()> {
        let idx = self
            .rows
            .iter()
            .position(|r| r.id == row_id)
            .ok_or(ImportError::RowNotFound(row_id))?;

        let value = match self.columns.get(field_key) {
            Some(descriptor) => TypeCoercer::coerce_value(descriptor, &value),
            None => value,
        };
        self.rows[idx] = self.rows[idx].with_field(field_key, value);

        self.revalidate();
        debug!(
            row_id = %row_id,
            field = field_key,
            error_rows = self.errors.len(),
            "单元格已修改"
        );
        Ok(())
    }

    /// 汇总：有错行数即 ErrorIndex 条目数
    pub fn compute_summary(&self) -> ImportSummary {
        let total_rows = self.rows.len();
        let error_row_count = self.errors.len();
        ImportSummary {
            total_rows,
            error_row_count,
            valid_count: total_rows.saturating_sub(error_row_count),
        }
    }

    /// 无字段错误且无校验器故障时才可提交
    pub fn is_committable(&self) -> bool {
        self.errors.is_empty() && self.faults.is_empty()
    }

    fn revalidate(&mut self) {
        let report = ValidationEngine::validate(&self.rows, self.schema.as_ref());
        self.errors = report.errors;
        self.faults = report.faults;
    }
}
