// ==========================================
// 食堂数据导入系统 - 配置层
// ==========================================
// 职责: 系统配置管理,支持多级覆写
// 来源: 默认值 / .env 文件 / 环境变量 / 命令行参数
// ==========================================

pub mod ingest_config;

// 重导出核心配置
pub use ingest_config::{config_keys, parse_header_row, parse_utc_offset, IngestConfig};
