// ==========================================
// 食堂数据导入系统 - 核心库
// ==========================================
// 技术栈: Rust + calamine + SQLite
// 系统定位: 食堂消费/车辆打卡/门禁 Excel 导出数据入库与每日统计
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录类别与行模型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 每日统计
pub mod engine;

// 导入层 - 外部工作簿
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FieldSpec, FieldType, RecordCategory};

// 领域实体
pub use domain::{BatchReport, DailyStats, FileReport, FileStatus, SheetReport};

// 导入与存储
pub use importer::{ExcelSheetReader, RecordImporter, RecordImporterImpl, ValueNormalizer};
pub use repository::{DailyStatsRepository, RecordStore, SqliteRecordStore};

// 引擎
pub use engine::DailyStatsCollector;

// 配置
pub use config::IngestConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "食堂数据导入系统";
