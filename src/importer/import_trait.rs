// ==========================================
// 车队管理后台 - 导入管道 Trait
// ==========================================
// 职责: 定义文件解析与 Schema 校验接口（不包含实现）
// ==========================================

use crate::domain::column::ColumnSet;
use crate::domain::row::{RawRow, RowPayload};
use crate::domain::validation::SchemaOutcome;
use crate::importer::error::ImportResult;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件字节 → 原始行
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件字节为原始行记录（表头已按列描述符映射）
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - columns: 列描述符集合（用于表头映射）
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 按源文件顺序的行记录（空白行已跳过）
    /// - Err: 文件不可读/已损坏
    fn parse_to_raw_rows(&self, bytes: &[u8], columns: &ColumnSet) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// Schema Trait
// ==========================================
// 用途: 按实体类型插拔的行校验规则
// 实现者: RuleSchema 或业务方自定义
pub trait Schema: Send + Sync {
    /// 校验单行（不含 RowId）
    fn validate(&self, record: &RowPayload) -> SchemaOutcome;

    /// 校验整批
    ///
    /// 默认逐行调用 validate；跨行规则（批内唯一等）需覆写本方法。
    /// 返回值与入参一一对应。
    fn validate_batch(&self, records: &[RowPayload]) -> Vec<SchemaOutcome> {
        records.iter().map(|r| self.validate(r)).collect()
    }
}
