// ==========================================
// 车队管理后台 - 领域模型层
// ==========================================
// 职责: 定义列描述符、导入行、校验结果与会话视图
// 红线: 不含数据访问逻辑,不含解析逻辑
// ==========================================

pub mod column;
pub mod entity;
pub mod row;
pub mod session;
pub mod validation;

// 重导出核心类型
pub use column::{ColumnDescriptor, ColumnSet, ColumnSetError, ColumnType};
pub use entity::EntityKind;
pub use row::{CanonicalRow, CellValue, RawRow, RowId, RowPayload};
pub use session::{CommitReceipt, ImportSummary, SessionSnapshot};
pub use validation::{
    ErrorIndex, FieldIssue, SchemaOutcome, ValidationReport, ValidatorFault,
};
