// ==========================================
// 食堂数据导入系统 - 导入结果模型
// ==========================================
// 用途: 导入接口返回值（逐文件 / 逐工作表 / 整批）
// ==========================================

use crate::domain::types::RecordCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// FileStatus - 单文件处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Processed,
    Skipped(String),
    Failed(String),
}

impl FileStatus {
    pub fn is_processed(&self) -> bool {
        matches!(self, FileStatus::Processed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileStatus::Failed(_))
    }
}

// ==========================================
// SheetReport - 单工作表导入统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetReport {
    pub sheet_name: String,
    pub total_rows: usize,
    pub written_rows: usize,
    pub missing_columns: Vec<String>, // 工作表中未找到的源列名
    pub coerced_to_null: usize,       // 类型转换失败置空的字段数
}

// ==========================================
// FileReport - 单文件导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file_path: String,
    pub category: Option<RecordCategory>,
    pub status: FileStatus,
    pub sheets: Vec<SheetReport>,
    pub elapsed_ms: u128,
}

impl FileReport {
    pub fn new(file_path: impl Into<String>, category: Option<RecordCategory>) -> Self {
        Self {
            file_path: file_path.into(),
            category,
            status: FileStatus::Processed,
            sheets: Vec::new(),
            elapsed_ms: 0,
        }
    }

    pub fn skipped(
        file_path: impl Into<String>,
        category: Option<RecordCategory>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: FileStatus::Skipped(reason.into()),
            ..Self::new(file_path, category)
        }
    }

    /// 已落库行数（失败工作表不计入）
    pub fn rows_written(&self) -> usize {
        self.sheets.iter().map(|s| s.written_rows).sum()
    }
}

// ==========================================
// BatchReport - 整批（目录）导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub started_at: DateTime<Utc>,
    pub files: Vec<FileReport>,
    pub counts_before: BTreeMap<String, i64>, // 表名 → 导入前行数
    pub counts_after: BTreeMap<String, i64>,  // 表名 → 导入后行数
    pub elapsed_ms: u128,
}

impl BatchReport {
    pub fn processed_count(&self) -> usize {
        self.files.iter().filter(|f| f.status.is_processed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Skipped(_)))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| f.status.is_failed()).count()
    }

    pub fn rows_written(&self) -> usize {
        self.files.iter().map(|f| f.rows_written()).sum()
    }

    /// 各表行数变化（导入后 - 导入前）
    pub fn count_delta(&self, table: &str) -> i64 {
        let before = self.counts_before.get(table).copied().unwrap_or(0);
        let after = self.counts_after.get(table).copied().unwrap_or(0);
        after - before
    }
}
