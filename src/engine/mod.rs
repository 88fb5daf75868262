// ==========================================
// 食堂数据导入系统 - 引擎层
// ==========================================
// 职责: 实现统计规则,不拼 SQL
// ==========================================

pub mod daily_stats;

// 重导出核心引擎
pub use daily_stats::DailyStatsCollector;
