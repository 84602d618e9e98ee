// ==========================================
// 车队管理后台 - 导入会话对外视图
// ==========================================

use crate::domain::row::CanonicalRow;
use crate::domain::validation::{ErrorIndex, ValidatorFault};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ImportSummary - 会话汇总
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,      // 总行数
    pub error_row_count: usize, // 有错误的行数
    pub valid_count: usize,     // 无错误的行数
}

// ==========================================
// SessionSnapshot - 只读快照（供前端渲染）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub entity: String,
    pub rows: Vec<CanonicalRow>,
    pub errors: ErrorIndex,
    pub faults: Vec<ValidatorFault>,
    pub summary: ImportSummary,
}

// ==========================================
// CommitReceipt - 提交结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub batch_id: String,   // 持久化端生成的批次 ID
    pub entity: String,
    pub row_count: usize,
    pub committed_at: DateTime<Utc>,
}
