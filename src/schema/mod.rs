// ==========================================
// 车队管理后台 - 校验规则层
// ==========================================
// 职责: Schema 的内置实现与各实体默认规则
// ==========================================

pub mod presets;
pub mod rule_schema;

pub use presets::schema_for;
pub use rule_schema::{FieldRule, Rule, RuleSchema};
