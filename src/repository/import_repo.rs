// ==========================================
// 车队管理后台 - 批量导入 Repository Trait
// ==========================================
// 职责: 定义批量导入持久化接口（不包含业务逻辑）
// 红线: Repository 不含校验规则，只做落库
// ==========================================

use crate::domain::row::RowPayload;
use crate::domain::session::CommitReceipt;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportRepository Trait
// ==========================================
// 用途: 提交器的持久化协作方
// 实现者: SqliteImportRepository / 远端 REST 适配器
#[async_trait]
pub trait ImportRepository: Send + Sync {
    /// 批量导入一批已校验的行
    ///
    /// # 参数
    /// - entity: 实体名称
    /// - rows: 落库载荷（不含 RowId）
    ///
    /// # 返回
    /// - Ok(CommitReceipt): 批次回执
    /// - Err: 持久化被拒绝或传输失败（整批不落库）
    async fn import_rows(
        &self,
        entity: &str,
        rows: Vec<RowPayload>,
    ) -> RepositoryResult<CommitReceipt>;
}
