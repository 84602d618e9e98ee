// ==========================================
// 车队管理后台 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将导入层/仓储层错误转换为用户可读的错误消息
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("提交失败: {0}")]
    CommitFailed(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            e if e.is_parse_error() => ApiError::ImportError(e.to_string()),
            e @ (ImportError::FileTooLarge { .. } | ImportError::TooManyRows { .. }) => {
                ApiError::InvalidInput(e.to_string())
            }
            e @ ImportError::RowNotFound(_) => ApiError::NotFound(e.to_string()),
            e @ ImportError::CommitBlocked { .. } => ApiError::ValidationError(e.to_string()),
            ImportError::CommitFailed(msg) => ApiError::CommitFailed(msg),
            e @ (ImportError::ConfigReadError { .. } | ImportError::ConfigValueError { .. }) => {
                ApiError::ConfigError(e.to_string())
            }
            ImportError::Other(err) => ApiError::Other(err),
            e => ApiError::InternalError(e.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::Rejected(msg) => ApiError::CommitFailed(msg),
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::row::RowId;

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::UnsupportedFormat("pdf".to_string()).into();
        assert!(matches!(api_err, ApiError::ImportError(_)));

        let api_err: ApiError = ImportError::TooManyRows { rows: 10, limit: 5 }.into();
        match api_err {
            ApiError::InvalidInput(msg) => assert!(msg.contains("10")),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }

        let api_err: ApiError = ImportError::RowNotFound(RowId::new()).into();
        assert!(matches!(api_err, ApiError::NotFound(_)));

        let api_err: ApiError = ImportError::CommitBlocked {
            error_rows: 1,
            faults: 0,
        }
        .into();
        assert!(matches!(api_err, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "ImportBatch".to_string(),
            id: "B001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ImportBatch"));
                assert!(msg.contains("B001"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::Rejected("后端不可用".to_string()).into();
        assert!(matches!(api_err, ApiError::CommitFailed(_)));
    }
}
