// ==========================================
// 食堂数据导入系统 - 领域模型层
// ==========================================
// 职责: 定义记录类别、行模型、导入结果与统计结构
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import_report;
pub mod record;
pub mod stats;
pub mod types;

// 重导出核心类型
pub use import_report::{BatchReport, FileReport, FileStatus, SheetReport};
pub use record::{CellValue, FieldValue, RawRow, ResolvedRow, SheetData};
pub use stats::{DailyStats, RangeCollectResult, StatsTotals};
pub use types::{FieldSpec, FieldType, RecordCategory};
