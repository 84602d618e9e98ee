// ==========================================
// 车队管理后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 解析错误（致命） / 提交错误（保留会话） / 会话操作错误
// 说明: 字段级校验失败是数据（ErrorIndex），不走错误通道
// ==========================================

use crate::domain::column::ColumnSetError;
use crate::domain::row::RowId;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（ParseError 族）=====
    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件过大: {size} 字节，上限 {limit} 字节")]
    FileTooLarge { size: usize, limit: usize },

    #[error("行数超限: {rows} 行，上限 {limit} 行")]
    TooManyRows { rows: usize, limit: usize },

    // ===== 列定义错误 =====
    #[error("列定义非法: {0}")]
    InvalidColumnSet(#[from] ColumnSetError),

    // ===== 会话操作错误 =====
    #[error("行不存在: {0}")]
    RowNotFound(RowId),

    // ===== 提交错误 =====
    #[error("存在 {error_rows} 行校验错误、{faults} 个校验器故障，禁止提交")]
    CommitBlocked { error_rows: usize, faults: usize },

    #[error("批量导入失败: {0}")]
    CommitFailed(String),

    // ===== 模板/导出错误 =====
    #[error("模板生成失败: {0}")]
    TemplateError(String),

    #[error("错误报告导出失败: {0}")]
    ReportError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否属于文件解析类错误（此时不会创建会话）
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ImportError::UnsupportedFormat(_)
                | ImportError::FileReadError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::ReportError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<zip::result::ZipError>
impl From<zip::result::ZipError> for ImportError {
    fn from(err: zip::result::ZipError) -> Self {
        ImportError::TemplateError(err.to_string())
    }
}

// 实现 From<std::string::FromUtf8Error>
impl From<std::string::FromUtf8Error> for ImportError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ImportError::CsvParseError(format!("文件不是有效的 UTF-8 文本: {}", err))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
