// ==========================================
// 食堂数据导入系统 - 导入配置
// ==========================================
// 职责: 配置加载与校验,支持多级覆写
// 优先级: 命令行参数 > 环境变量 > .env 文件 > 默认值
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::{FixedOffset, Offset, Utc};
use std::path::PathBuf;
use tracing::debug;

// ==========================================
// 配置键（环境变量名）
// ==========================================
pub mod config_keys {
    pub const DATA_DIR: &str = "DATA_DIR";
    pub const IMPORT_DIR: &str = "IMPORT_DIR";
    pub const DB_PATH: &str = "DB_PATH";
    pub const EXCEL_HEADER_ROW: &str = "EXCEL_HEADER_ROW";
    pub const RECORD_UTC_OFFSET: &str = "RECORD_UTC_OFFSET";
}

// ==========================================
// 默认值
// ==========================================
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_IMPORT_DIR: &str = "import/";
pub const DEFAULT_DB_FILE: &str = "canteen.db";
pub const DEFAULT_HEADER_ROW: usize = 1;
pub const DEFAULT_UTC_OFFSET: &str = "+08:00";

#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub data_dir: PathBuf,
    pub import_dir: PathBuf,
    pub db_path: Option<PathBuf>, // 未设置时为 {data_dir}/canteen.db
    pub excel_header_row: usize,
    pub utc_offset: FixedOffset,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            import_dir: PathBuf::from(DEFAULT_IMPORT_DIR),
            db_path: None,
            excel_header_row: DEFAULT_HEADER_ROW,
            utc_offset: parse_utc_offset(DEFAULT_UTC_OFFSET).unwrap_or_else(|_| Utc.fix()),
        }
    }
}

impl IngestConfig {
    /// 从进程环境加载（先读取 .env 文件,已存在的环境变量不会被覆盖）
    pub fn load() -> ImportResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "已加载 .env 文件"),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ImportError::FileReadError(format!(".env 文件读取失败: {}", e)));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（未设置的键使用默认值）
    pub fn from_lookup<F>(lookup: F) -> ImportResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(config_keys::DATA_DIR) {
            config.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(config_keys::IMPORT_DIR) {
            config.import_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(config_keys::DB_PATH) {
            config.db_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup(config_keys::EXCEL_HEADER_ROW) {
            config.excel_header_row = parse_header_row(&v)?;
        }
        if let Some(v) = lookup(config_keys::RECORD_UTC_OFFSET) {
            config.utc_offset = parse_utc_offset(&v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// 校验配置取值
    pub fn validate(&self) -> ImportResult<()> {
        if self.excel_header_row == 0 {
            return Err(ImportError::ConfigValueError {
                key: config_keys::EXCEL_HEADER_ROW.to_string(),
                value: "0".to_string(),
                message: "表头行号从 1 开始".to_string(),
            });
        }
        Ok(())
    }

    /// 导入目录: {data_dir}/{import_dir}
    pub fn import_root(&self) -> PathBuf {
        self.data_dir.join(&self.import_dir)
    }

    /// 数据库文件路径
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DEFAULT_DB_FILE))
    }
}

/// 解析表头行号（从 1 开始的正整数）
pub fn parse_header_row(value: &str) -> ImportResult<usize> {
    let row: usize = value
        .trim()
        .parse()
        .map_err(|_| ImportError::ConfigValueError {
            key: config_keys::EXCEL_HEADER_ROW.to_string(),
            value: value.to_string(),
            message: "应为正整数".to_string(),
        })?;
    if row == 0 {
        return Err(ImportError::ConfigValueError {
            key: config_keys::EXCEL_HEADER_ROW.to_string(),
            value: value.to_string(),
            message: "表头行号从 1 开始".to_string(),
        });
    }
    Ok(row)
}

/// 解析 UTC 偏移（格式: ±HH:MM）
pub fn parse_utc_offset(value: &str) -> ImportResult<FixedOffset> {
    value
        .trim()
        .parse::<FixedOffset>()
        .map_err(|e| ImportError::ConfigValueError {
            key: config_keys::RECORD_UTC_OFFSET.to_string(),
            value: value.to_string(),
            message: e.to_string(),
        })
}
