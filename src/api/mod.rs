// ==========================================
// 车队管理后台 - API 层
// ==========================================
// 职责: 提供批量导入业务 API,供前端命令/CLI 调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, TemplateDownload};
