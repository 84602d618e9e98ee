// ==========================================
// 车队管理后台 - 批量导入层
// ==========================================
// 职责: 文件 → 原始行 → 标准行 → 校验 → 纠错 → 提交
// 支持: CSV, Excel (xlsx/xlsm)
// ==========================================

// 模块声明
pub mod committer;
pub mod correction_session;
pub mod error;
pub mod error_report;
pub mod file_parser;
pub mod header_mapper;
pub mod import_trait;
pub mod template_generator;
pub mod type_coercer;
pub mod validation_engine;

// 重导出核心类型
pub use committer::Committer;
pub use correction_session::CorrectionSession;
pub use error::{ImportError, ImportResult};
pub use error_report::export_error_report;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use header_mapper::HeaderMapper;
pub use template_generator::{template_file_name, TemplateGenerator, TEMPLATE_MIME_TYPE};
pub use type_coercer::TypeCoercer;
pub use validation_engine::ValidationEngine;

// 重导出 Trait 接口
pub use import_trait::{FileParser, Schema};
