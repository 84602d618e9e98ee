// ==========================================
// 车队管理后台 - 导入设置
// ==========================================
// 职责: 导入管道的运行时上限与模板参数
// 存储: config_kv 表（缺省时使用 Default）
// ==========================================

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ROWS: usize = 5_000;
pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_TEMPLATE_SHEET_NAME: &str = "Sheet1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub max_rows: usize,       // 单次导入最大行数
    pub max_file_bytes: usize, // 上传文件大小上限
    pub template_sheet_name: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            template_sheet_name: DEFAULT_TEMPLATE_SHEET_NAME.to_string(),
        }
    }
}
