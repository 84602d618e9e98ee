// ==========================================
// 导入管道集成测试
// ==========================================
// 覆盖: 文件解析 → 类型转换 → 校验 → 纠错 → 提交 的完整链路

use fleet_import::domain::{ColumnDescriptor, ColumnSet, RowPayload};
use fleet_import::importer::{
    Committer, CorrectionSession, ImportError, TemplateGenerator, UniversalFileParser,
};
use fleet_import::repository::{ImportRepository, SqliteImportRepository};
use serde_json::json;
use std::sync::Arc;

use test_helpers::{create_test_db, person_columns, NumericAgeSchema};

fn open_session(csv: &str) -> CorrectionSession {
    let columns = Arc::new(person_columns());
    let raw = UniversalFileParser
        .ingest(csv.as_bytes(), "people.csv", &columns)
        .expect("CSV 解析失败");
    CorrectionSession::new(raw, columns, Arc::new(NumericAgeSchema))
}

/// Alice/Bob 场景：一行有效一行错误，禁止提交
#[tokio::test]
async fn test_alice_bob_scenario() {
    let session = open_session("Name,Age\nAlice,30\nBob,thirty");

    let rows = session.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("age"), Some(&json!(30)));
    assert_eq!(rows[1].get("age"), Some(&json!("thirty")));

    assert_eq!(session.errors().len(), 1);
    let bob_errors = &session.errors()[&rows[1].id];
    assert_eq!(bob_errors.len(), 1);
    assert!(bob_errors.contains_key("age"));

    let summary = session.compute_summary();
    assert_eq!(
        (summary.total_rows, summary.error_row_count, summary.valid_count),
        (2, 1, 1)
    );

    let (_tmp, db_path) = create_test_db().unwrap();
    let repo = Arc::new(SqliteImportRepository::new(&db_path).unwrap());
    let committer = Committer::new(repo.clone());

    let result = committer.commit(&session).await;
    assert!(matches!(result, Err(ImportError::CommitBlocked { error_rows: 1, .. })));
    assert!(repo.list_batches("Person").unwrap().is_empty());
}

/// 修正错误后提交，落库载荷不含行标识
#[tokio::test]
async fn test_fix_then_commit() {
    let mut session = open_session("Name,Age\nAlice,30\nBob,thirty");
    let bob = session.rows()[1].id;

    session.update_cell(bob, "age", json!("31")).unwrap();
    assert!(session.errors().is_empty());

    let (_tmp, db_path) = create_test_db().unwrap();
    let repo = Arc::new(SqliteImportRepository::new(&db_path).unwrap());
    let receipt = Committer::new(repo.clone()).commit(&session).await.unwrap();

    assert_eq!(receipt.row_count, 2);
    assert_eq!(receipt.entity, "Person");

    let stored: Vec<RowPayload> = repo.load_batch_rows(&receipt.batch_id).unwrap();
    assert_eq!(
        json!(stored),
        json!([{"name": "Alice", "age": 30}, {"name": "Bob", "age": 31}])
    );
    for payload in &stored {
        assert!(!payload.contains_key("id"));
        assert!(!payload.values().any(|v| v == &json!(bob.to_string())));
    }
}

/// 空白行跳过
#[test]
fn test_blank_rows_are_skipped() {
    let columns = ColumnSet::new(
        "Pair",
        vec![ColumnDescriptor::new("a", "a"), ColumnDescriptor::new("b", "b")],
    )
    .unwrap();

    let rows = UniversalFileParser
        .ingest(b"a,b\n1,2\n,\n3,4", "pairs.csv", &columns)
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("a"), Some(&json!("1")));
    assert_eq!(rows[1].get("b"), Some(&json!("4")));
}

/// 同一值重复编辑：结果与编辑一次相同
#[test]
fn test_repeated_edit_is_idempotent() {
    let mut twice = open_session("Name,Age\nAlice,30\nBob,thirty");
    let alice = twice.rows()[0].id;

    twice.update_cell(alice, "age", json!("x")).unwrap();
    let rows_once = twice.rows().to_vec();
    let errors_once = twice.errors().clone();

    twice.update_cell(alice, "age", json!("x")).unwrap();
    assert_eq!(twice.rows(), rows_once.as_slice());
    assert_eq!(twice.errors(), &errors_once);
}

/// 模板 → 解析 往返：表头映射回 key，样例行保留
#[test]
fn test_template_round_trip() {
    let columns = ColumnSet::new(
        "Kit",
        vec![
            ColumnDescriptor::new("k", "K").number(),
            ColumnDescriptor::new("n", "N"),
        ],
    )
    .unwrap();

    let bytes = TemplateGenerator::default().generate(&columns).unwrap();
    let rows = UniversalFileParser
        .ingest(&bytes, "kit_import_template.xlsx", &columns)
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("k"), Some(&json!(0)));
    assert_eq!(rows[0].get("n"), Some(&json!("Sample N")));
}

/// 持久化失败时会话保持不变
#[tokio::test]
async fn test_repository_failure_keeps_session() {
    use async_trait::async_trait;
    use fleet_import::domain::CommitReceipt;
    use fleet_import::repository::{RepositoryError, RepositoryResult};

    struct DownRepo;

    #[async_trait]
    impl ImportRepository for DownRepo {
        async fn import_rows(
            &self,
            _entity: &str,
            _rows: Vec<RowPayload>,
        ) -> RepositoryResult<CommitReceipt> {
            Err(RepositoryError::DatabaseConnectionError("connection refused".to_string()))
        }
    }

    let session = open_session("Name,Age\nAlice,30");
    let before = session.rows().to_vec();

    let result = Committer::new(Arc::new(DownRepo)).commit(&session).await;

    assert!(matches!(result, Err(ImportError::CommitFailed(_))));
    assert_eq!(session.rows(), before.as_slice());
    assert!(session.is_committable());
}
