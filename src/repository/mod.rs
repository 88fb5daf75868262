// ==========================================
// 食堂数据导入系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有值使用参数化绑定,标识符来自静态定义
// ==========================================

pub mod daily_stats_repo;
pub mod error;
pub mod record_store;
pub mod record_store_impl;

// 重导出核心仓储
pub use daily_stats_repo::{DailyStatsRepository, SUMMARY_TABLE};
pub use error::{RepositoryError, RepositoryResult};
pub use record_store::{RecordStore, TableHandle, CREATED_AT_COLUMN};
pub use record_store_impl::SqliteRecordStore;
