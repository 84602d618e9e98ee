// ==========================================
// 车队管理后台 - 批量导入 Repository 实现
// ==========================================
// 职责: 将一批载荷写入 SQLite（使用 rusqlite）
// 红线:
// - 整批在一个事务内写入，任何一行失败则整批回滚
// - Repository 不含校验规则，只做落库
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::row::RowPayload;
use crate::domain::session::CommitReceipt;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_repo::ImportRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// import_batch 表记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatchEntity {
    pub batch_id: String,
    pub entity: String,
    pub row_count: usize,
    pub imported_at: DateTime<Utc>,
}

// ==========================================
// SqliteImportRepository
// ==========================================
pub struct SqliteImportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteImportRepository {
    /// 打开数据库文件并建表
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_schema()?;
        Ok(repo)
    }

    /// 使用共享连接创建（与 ConfigManager 共用同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_schema()?;
        Ok(repo)
    }

    pub fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        ensure_schema(&conn)?;
        Ok(())
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中写入批次头与全部记录
    fn insert_batch_tx(
        tx: &Transaction,
        batch: &ImportBatchEntity,
        rows: &[RowPayload],
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO import_batch (batch_id, entity, row_count, imported_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                batch.batch_id,
                batch.entity,
                batch.row_count as i64,
                batch.imported_at.to_rfc3339(),
            ],
        )?;

        let mut stmt = tx.prepare(
            r#"
            INSERT INTO import_record (batch_id, seq_no, payload_json)
            VALUES (?1, ?2, ?3)
            "#,
        )?;
        for (seq_no, row) in rows.iter().enumerate() {
            let payload_json = serde_json::to_string(row)?;
            stmt.execute(params![batch.batch_id, seq_no as i64, payload_json])?;
        }

        Ok(())
    }

    /// 按导入时间倒序列出某实体的批次
    pub fn list_batches(&self, entity: &str) -> RepositoryResult<Vec<ImportBatchEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, entity, row_count, imported_at
            FROM import_batch
            WHERE entity = ?1
            ORDER BY imported_at DESC
            "#,
        )?;

        let raw = stmt
            .query_map(params![entity], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(batch_id, entity, row_count, imported_at)| {
                let imported_at = DateTime::parse_from_rfc3339(&imported_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
                Ok(ImportBatchEntity {
                    batch_id,
                    entity,
                    row_count: row_count.max(0) as usize,
                    imported_at,
                })
            })
            .collect()
    }

    /// 按写入顺序读取某批次的全部载荷
    pub fn load_batch_rows(&self, batch_id: &str) -> RepositoryResult<Vec<RowPayload>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT payload_json
            FROM import_record
            WHERE batch_id = ?1
            ORDER BY seq_no ASC
            "#,
        )?;

        let raw = stmt
            .query_map(params![batch_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        raw.iter()
            .map(|json| Ok(serde_json::from_str::<RowPayload>(json)?))
            .collect()
    }
}

#[async_trait]
impl ImportRepository for SqliteImportRepository {
    async fn import_rows(
        &self,
        entity: &str,
        rows: Vec<RowPayload>,
    ) -> RepositoryResult<CommitReceipt> {
        if rows.is_empty() {
            return Err(RepositoryError::Rejected("没有可导入的行".to_string()));
        }

        let batch = ImportBatchEntity {
            batch_id: Uuid::new_v4().to_string(),
            entity: entity.to_string(),
            row_count: rows.len(),
            imported_at: Utc::now(),
        };

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 出错时 tx 在 drop 时回滚
        Self::insert_batch_tx(&tx, &batch, &rows)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(batch_id = %batch.batch_id, entity, rows = batch.row_count, "导入批次已落库");

        Ok(CommitReceipt {
            batch_id: batch.batch_id,
            entity: batch.entity,
            row_count: batch.row_count,
            committed_at: batch.imported_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::NamedTempFile;

    fn payload(value: Value) -> RowPayload {
        match value {
            Value::Object(map) => map,
            _ => RowPayload::new(),
        }
    }

    fn repo() -> (NamedTempFile, SqliteImportRepository) {
        let file = NamedTempFile::new().unwrap();
        let repo = SqliteImportRepository::new(file.path().to_str().unwrap()).unwrap();
        (file, repo)
    }

    #[tokio::test]
    async fn test_import_rows_persists_batch() {
        let (_file, repo) = repo();
        let rows = vec![
            payload(json!({"plate": "ABC", "year": 2020})),
            payload(json!({"plate": "XYZ", "year": 2018})),
        ];

        let receipt = repo.import_rows("Vehicle", rows.clone()).await.unwrap();

        assert_eq!(receipt.row_count, 2);
        let batches = repo.list_batches("Vehicle").unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].batch_id, receipt.batch_id);
        assert_eq!(repo.load_batch_rows(&receipt.batch_id).unwrap(), rows);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let (_file, repo) = repo();
        let result = repo.import_rows("Vehicle", vec![]).await;
        assert!(matches!(result, Err(RepositoryError::Rejected(_))));
        assert!(repo.list_batches("Vehicle").unwrap().is_empty());
    }

    #[test]
    fn test_list_batches_filters_entity() {
        let (_file, repo) = repo();
        assert!(repo.list_batches("Driver").unwrap().is_empty());
        assert!(repo.load_batch_rows("missing").unwrap().is_empty());
    }
}
