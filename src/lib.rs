// ==========================================
// 车队管理后台 - 批量导入核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 表格文件批量导入（上传 → 纠错 → 提交），人工确认后落库
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 列描述符 / 行 / 校验结果
pub mod domain;

// 导入层 - 解析、转换、校验、纠错、提交
pub mod importer;

// 校验规则层 - Schema 实现
pub mod schema;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 导入设置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CanonicalRow, CellValue, ColumnDescriptor, ColumnSet, ColumnType, CommitReceipt, EntityKind,
    ErrorIndex, ImportSummary, RawRow, RowId, RowPayload, SessionSnapshot,
};

// 导入管道
pub use importer::{
    Committer, CorrectionSession, ImportError, ImportResult, Schema, TemplateGenerator,
    TypeCoercer, UniversalFileParser, ValidationEngine,
};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车队管理后台 - 批量导入";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
