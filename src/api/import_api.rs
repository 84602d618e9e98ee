// ==========================================
// 车队管理后台 - 批量导入API
// ==========================================
// 职责: 管理导入会话的生命周期（上传 → 纠错 → 提交/放弃）
// 红线:
// - 每个会话由独立的 tokio Mutex 保护，同一会话同一时刻只有一个写者
// - 仅在提交成功后销毁会话；提交失败时会话保留供重试
// - 文件解析与模板生成在阻塞线程池执行，不占用异步运行时
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader, ImportSettings};
use crate::db::{open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::domain::entity::EntityKind;
use crate::domain::row::{CellValue, RowId};
use crate::domain::session::{CommitReceipt, ImportSummary, SessionSnapshot};
use crate::importer::{
    export_error_report, template_file_name, Committer, CorrectionSession, ImportError,
    TemplateGenerator, UniversalFileParser, TEMPLATE_MIME_TYPE,
};
use crate::repository::{ImportRepository, SqliteImportRepository};
use crate::schema::schema_for;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 模板下载响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDownload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

struct ManagedSession {
    entity: EntityKind,
    session: CorrectionSession,
    // 提交成功后置位；仍持有旧句柄的等待者据此判定会话已关闭
    closed: bool,
}

type SessionHandle = Arc<Mutex<ManagedSession>>;

/// 导入API
pub struct ImportApi {
    settings: ImportSettings,
    repo: Arc<dyn ImportRepository>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(repo: Arc<dyn ImportRepository>, settings: ImportSettings) -> Self {
        Self {
            settings,
            repo,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 打开数据库：设置读自 config_kv，提交写入同一库
    pub async fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let conn = Arc::new(StdMutex::new(conn));

        let config = ConfigManager::from_connection(conn.clone())?;
        let settings = config.load_import_settings().await?;
        let schema_version = {
            let guard = conn
                .lock()
                .map_err(|e| ApiError::InternalError(format!("锁获取失败: {}", e)))?;
            read_schema_version(&guard).map_err(|e| ApiError::DatabaseError(e.to_string()))?
        };
        if schema_version != Some(CURRENT_SCHEMA_VERSION) {
            warn!(
                db_path,
                found = ?schema_version,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema 版本与程序不一致"
            );
        }
        let repo = SqliteImportRepository::from_connection(conn)?;

        info!(db_path, max_rows = settings.max_rows, schema_version = ?schema_version, "导入API已初始化");
        Ok(Self::new(Arc::new(repo), settings))
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// 上传文件并创建纠错会话
    ///
    /// # 参数
    /// - entity: 导入的实体类型
    /// - bytes: 文件内容
    /// - file_name: 原始文件名（用于判断格式）
    ///
    /// # 返回
    /// - Ok(SessionSnapshot): 新会话的初始快照（已完成首轮校验）
    /// - Err(ApiError): 文件过大/行数超限/无法解析，此时不创建会话
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn open_session(
        &self,
        entity: EntityKind,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> ApiResult<SessionSnapshot> {
        let limit = self.settings.max_file_bytes;
        if bytes.len() > limit {
            return Err(ImportError::FileTooLarge {
                size: bytes.len(),
                limit,
            }
            .into());
        }

        let max_rows = self.settings.max_rows;
        let file_name = file_name.to_string();
        let session = tokio::task::spawn_blocking(move || -> Result<CorrectionSession, ImportError> {
            let columns = Arc::new(entity.column_set());
            let raw_rows = UniversalFileParser.ingest(&bytes, &file_name, &columns)?;
            if raw_rows.len() > max_rows {
                return Err(ImportError::TooManyRows {
                    rows: raw_rows.len(),
                    limit: max_rows,
                });
            }
            Ok(CorrectionSession::new(
                raw_rows,
                columns,
                Arc::new(schema_for(entity)),
            ))
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("解析任务异常: {}", e)))??;

        let session_id = Uuid::new_v4().to_string();
        let managed = ManagedSession {
            entity,
            session,
            closed: false,
        };
        let snapshot = snapshot_of(&session_id, &managed);

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::new(Mutex::new(managed)));

        info!(
            session_id = %session_id,
            entity = %entity,
            rows = snapshot.summary.total_rows,
            error_rows = snapshot.summary.error_row_count,
            "导入会话已打开"
        );
        Ok(snapshot)
    }

    /// 修改单元格并返回最新汇总
    pub async fn update_cell(
        &self,
        session_id: &str,
        row_id: RowId,
        field_key: &str,
        value: CellValue,
    ) -> ApiResult<ImportSummary> {
        let handle = self.session_handle(session_id).await?;
        let mut managed = lock_open(&handle, session_id).await?;
        managed.session.update_cell(row_id, field_key, value)?;
        Ok(managed.session.compute_summary())
    }

    pub async fn summary(&self, session_id: &str) -> ApiResult<ImportSummary> {
        let handle = self.session_handle(session_id).await?;
        let managed = lock_open(&handle, session_id).await?;
        Ok(managed.session.compute_summary())
    }

    pub async fn snapshot(&self, session_id: &str) -> ApiResult<SessionSnapshot> {
        let handle = self.session_handle(session_id).await?;
        let managed = lock_open(&handle, session_id).await?;
        Ok(snapshot_of(session_id, &managed))
    }

    /// 提交会话
    ///
    /// 成功后会话被移除；被拒绝或持久化失败时会话原样保留。
    #[instrument(skip(self))]
    pub async fn commit(&self, session_id: &str) -> ApiResult<CommitReceipt> {
        let handle = self.session_handle(session_id).await?;
        let mut managed = lock_open(&handle, session_id).await?;

        let committer = Committer::new(self.repo.clone());
        let receipt = committer.commit(&managed.session).await?;

        // 持有会话锁期间关闭并移除：排队中的调用方拿到锁后看到 closed，不会重复提交
        managed.closed = true;
        self.sessions.write().await.remove(session_id);
        info!(
            session_id,
            entity = %managed.entity,
            batch_id = %receipt.batch_id,
            "导入会话已提交并关闭"
        );
        Ok(receipt)
    }

    /// 放弃会话
    pub async fn discard(&self, session_id: &str) -> ApiResult<()> {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(handle) => {
                // 等待进行中的操作结束，之后持有旧句柄者一律视为已关闭
                handle.lock().await.closed = true;
                info!(session_id, "导入会话已放弃");
                Ok(())
            }
            None => {
                warn!(session_id, "放弃不存在的导入会话");
                Err(ApiError::NotFound(format!("导入会话(id={})不存在", session_id)))
            }
        }
    }

    /// 下载导入模板
    pub async fn download_template(&self, entity: EntityKind) -> ApiResult<TemplateDownload> {
        let sheet_name = self.settings.template_sheet_name.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            TemplateGenerator::new(sheet_name).generate(&entity.column_set())
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("模板生成任务异常: {}", e)))??;

        Ok(TemplateDownload {
            file_name: template_file_name(entity.name()),
            mime_type: TEMPLATE_MIME_TYPE.to_string(),
            bytes,
        })
    }

    /// 导出错误报告 CSV
    pub async fn export_errors(&self, session_id: &str, only_errors: bool) -> ApiResult<Vec<u8>> {
        let handle = self.session_handle(session_id).await?;
        let managed = lock_open(&handle, session_id).await?;
        Ok(export_error_report(&managed.session, only_errors)?)
    }

    /// 当前打开的会话数
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn session_handle(&self, session_id: &str) -> ApiResult<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("导入会话(id={})不存在", session_id)))
    }
}

/// 获取会话锁；会话已被提交或放弃时返回 NotFound
async fn lock_open<'a>(
    handle: &'a SessionHandle,
    session_id: &str,
) -> ApiResult<MutexGuard<'a, ManagedSession>> {
    let managed = handle.lock().await;
    if managed.closed {
        return Err(ApiError::NotFound(format!("导入会话(id={})已关闭", session_id)));
    }
    Ok(managed)
}

fn snapshot_of(session_id: &str, managed: &ManagedSession) -> SessionSnapshot {
    let session = &managed.session;
    SessionSnapshot {
        session_id: session_id.to_string(),
        entity: managed.entity.name().to_string(),
        rows: session.rows().to_vec(),
        errors: session.errors().clone(),
        faults: session.faults().to_vec(),
        summary: session.compute_summary(),
    }
}
