// ==========================================
// 食堂数据导入系统 - 行记录模型
// ==========================================
// 原始行: 原始表头 → 单元格值（保留日期/标量语义）
// 规范行: 目标字段 → 规范化后的类型值
// ==========================================

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// CellValue - 单元格原始值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => {
                // 整数值的浮点数不带小数部分
                if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
                    write!(f, "{:.0}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// 原始行: 原始表头（与工作表中字面一致）→ 单元格值
pub type RawRow = HashMap<String, CellValue>;

// ==========================================
// SheetData - 单个工作表的读取结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub sheet_name: String,
    pub rows: Vec<RawRow>,
    pub headers: Vec<String>, // 原始表头（有序,空表头已替换为 col_N）
}

// ==========================================
// FieldValue - 规范化后的字段值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Timestamp(DateTime<FixedOffset>),
    Text(String),
}

// ==========================================
// ResolvedRow - 规范行（不含主键字段）
// ==========================================
// 字段顺序与类别 Excel 映射顺序一致
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRow {
    pub values: Vec<(&'static str, Option<FieldValue>)>,
}

impl ResolvedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, value: Option<FieldValue>) {
        self.values.push((field, value));
    }

    /// 按字段名取值（字段缺失或为 NULL 均返回 None）
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, v)| v.as_ref())
    }
}
