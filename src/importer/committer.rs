// ==========================================
// 车队管理后台 - 提交器
// ==========================================
// 职责: 去掉 RowId、重新类型转换后整批交给持久化协作方
// 红线:
// - 存在任何行错误或校验器故障时拒绝提交（内部守卫，不依赖调用方）
// - 不提交部分有效行
// - 失败时会话 rows / errors 保持不变（只借用会话）
// ==========================================

use crate::domain::row::RowPayload;
use crate::domain::session::CommitReceipt;
use crate::importer::correction_session::CorrectionSession;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::type_coercer::TypeCoercer;
use crate::repository::ImportRepository;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub struct Committer {
    repo: Arc<dyn ImportRepository>,
}

impl Committer {
    pub fn new(repo: Arc<dyn ImportRepository>) -> Self {
        Self { repo }
    }

    /// 构造落库载荷：去掉 RowId，并防御性地重新做一次类型转换
    pub fn build_payloads(session: &CorrectionSession) -> Vec<RowPayload> {
        session
            .rows()
            .iter()
            .map(|row| TypeCoercer::coerce(&row.to_payload(), session.columns()))
            .collect()
    }

    #[instrument(skip(self, session), fields(entity = session.columns().entity()))]
    pub async fn commit(&self, session: &CorrectionSession) -> ImportResult<CommitReceipt> {
        if !session.is_committable() {
            let error_rows = session.errors().len();
            let faults = session.faults().len();
            warn!(error_rows, faults, "存在未修正的错误，拒绝提交");
            return Err(ImportError::CommitBlocked { error_rows, faults });
        }

        let payloads = Self::build_payloads(session);
        let row_count = payloads.len();

        match self
            .repo
            .import_rows(session.columns().entity(), payloads)
            .await
        {
            Ok(receipt) => {
                info!(batch_id = %receipt.batch_id, rows = row_count, "批量导入提交成功");
                Ok(receipt)
            }
            Err(e) => {
                error!(error = %e, rows = row_count, "批量导入提交失败，会话数据保留");
                Err(ImportError::CommitFailed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::column::{ColumnDescriptor, ColumnSet};
    use crate::domain::row::RawRow;
    use crate::domain::validation::{FieldIssue, SchemaOutcome};
    use crate::importer::import_trait::Schema;
    use crate::repository::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct AgeSchema;

    impl Schema for AgeSchema {
        fn validate(&self, record: &RowPayload) -> SchemaOutcome {
            match record.get("age") {
                Some(Value::Number(_)) => SchemaOutcome::Valid,
                _ => SchemaOutcome::Invalid(vec![FieldIssue::new("age", "年龄必须为数值")]),
            }
        }
    }

    #[derive(Default)]
    struct RecordingRepo {
        fail: bool,
        received: Mutex<Vec<Vec<RowPayload>>>,
    }

    #[async_trait]
    impl ImportRepository for RecordingRepo {
        async fn import_rows(
            &self,
            entity: &str,
            rows: Vec<RowPayload>,
        ) -> RepositoryResult<CommitReceipt> {
            if self.fail {
                return Err(RepositoryError::Rejected("后端不可用".to_string()));
            }
            let row_count = rows.len();
            self.received.lock().unwrap().push(rows);
            Ok(CommitReceipt {
                batch_id: "B001".to_string(),
                entity: entity.to_string(),
                row_count,
                committed_at: Utc::now(),
            })
        }
    }

    fn session(ages: &[Value]) -> CorrectionSession {
        let columns = ColumnSet::new(
            "Person",
            vec![
                ColumnDescriptor::new("name", "Name"),
                ColumnDescriptor::new("age", "Age").number(),
            ],
        )
        .unwrap();
        let raw: Vec<RawRow> = ages
            .iter()
            .map(|age| {
                let mut row = RawRow::new();
                row.insert("name".to_string(), json!("n"));
                row.insert("age".to_string(), age.clone());
                row
            })
            .collect();
        CorrectionSession::new(raw, Arc::new(columns), Arc::new(AgeSchema))
    }

    #[tokio::test]
    async fn test_commit_refused_with_errors() {
        let repo = Arc::new(RecordingRepo::default());
        let committer = Committer::new(repo.clone());
        let session = session(&[json!("1"), json!("x")]);

        let result = committer.commit(&session).await;

        assert!(matches!(
            result,
            Err(ImportError::CommitBlocked { error_rows: 1, faults: 0 })
        ));
        assert!(repo.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_forwards_payloads_without_row_id() {
        let repo = Arc::new(RecordingRepo::default());
        let committer = Committer::new(repo.clone());
        let session = session(&[json!("1"), json!(2)]);

        let receipt = committer.commit(&session).await.unwrap();

        assert_eq!(receipt.row_count, 2);
        let received = repo.received.lock().unwrap();
        assert_eq!(
            Value::Object(received[0][0].clone()),
            json!({"name": "n", "age": 1})
        );
    }

    #[tokio::test]
    async fn test_commit_failure_preserves_session() {
        let repo = Arc::new(RecordingRepo {
            fail: true,
            ..Default::default()
        });
        let committer = Committer::new(repo);
        let session = session(&[json!("5")]);
        let rows_before = session.rows().to_vec();

        let result = committer.commit(&session).await;

        assert!(matches!(result, Err(ImportError::CommitFailed(_))));
        assert_eq!(session.rows(), rows_before.as_slice());
        assert!(session.errors().is_empty());
    }
}
