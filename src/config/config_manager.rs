// ==========================================
// 车队管理后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::import_settings::{
    DEFAULT_MAX_FILE_BYTES, DEFAULT_MAX_ROWS, DEFAULT_TEMPLATE_SHEET_NAME,
};
use crate::db::{configure_sqlite_connection, ensure_schema};
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&guard)
                .and_then(|_| ensure_schema(&guard))
                .map_err(|e| ImportError::ConfigReadError {
                    key: "*".to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        debug!(config_key = key, value, "配置已写入");
        Ok(())
    }

    /// 读取正整数配置，缺省时返回默认值
    fn get_positive_usize(&self, key: &str, default: usize) -> ImportResult<usize> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ImportError::ConfigValueError {
                key: key.to_string(),
                value: raw,
                message: "必须为正整数".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_rows(&self) -> ImportResult<usize> {
        self.get_positive_usize(config_keys::IMPORT_MAX_ROWS, DEFAULT_MAX_ROWS)
    }

    async fn get_max_file_bytes(&self) -> ImportResult<usize> {
        self.get_positive_usize(config_keys::IMPORT_MAX_FILE_BYTES, DEFAULT_MAX_FILE_BYTES)
    }

    async fn get_template_sheet_name(&self) -> ImportResult<String> {
        let key = config_keys::IMPORT_TEMPLATE_SHEET_NAME;
        match self.get_global_config_value(key)? {
            None => Ok(DEFAULT_TEMPLATE_SHEET_NAME.to_string()),
            Some(raw) => {
                let name = raw.trim();
                // Excel 工作表名上限 31 字符，且不得含 []:*?/\
                let invalid = name.is_empty()
                    || name.chars().count() > 31
                    || name.contains(['[', ']', ':', '*', '?', '/', '\\']);
                if invalid {
                    return Err(ImportError::ConfigValueError {
                        key: key.to_string(),
                        value: raw.clone(),
                        message: "工作表名称无效".to_string(),
                    });
                }
                Ok(name.to_string())
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const IMPORT_MAX_ROWS: &str = "import/max_rows";
    pub const IMPORT_MAX_FILE_BYTES: &str = "import/max_file_bytes";
    pub const IMPORT_TEMPLATE_SHEET_NAME: &str = "import/template_sheet_name";
}
