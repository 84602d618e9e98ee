// ==========================================
// 车队管理后台 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_settings::ImportSettings;
use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 单次导入最大行数
    ///
    /// # 默认值
    /// - 5000
    async fn get_max_rows(&self) -> ImportResult<usize>;

    /// 上传文件大小上限（字节）
    ///
    /// # 默认值
    /// - 10 MiB
    async fn get_max_file_bytes(&self) -> ImportResult<usize>;

    /// 模板工作表名称
    ///
    /// # 默认值
    /// - Sheet1
    async fn get_template_sheet_name(&self) -> ImportResult<String>;

    /// 一次性读取全部导入设置
    async fn load_import_settings(&self) -> ImportResult<ImportSettings> {
        Ok(ImportSettings {
            max_rows: self.get_max_rows().await?,
            max_file_bytes: self.get_max_file_bytes().await?,
            template_sheet_name: self.get_template_sheet_name().await?,
        })
    }
}
