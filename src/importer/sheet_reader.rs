// ==========================================
// 食堂数据导入系统 - 工作簿读取器
// ==========================================
// 支持: Excel (.xlsx / .xlsm),只读
// 输出: 每个工作表的 (名称, 原始行, 原始表头)
// ==========================================

use crate::domain::record::{CellValue, RawRow, SheetData};
use crate::importer::classifier::is_supported_workbook;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::record_importer_trait::SheetReader;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::debug;

/// 空表头占位名（列号从 1 开始）
pub fn placeholder_header(column: usize) -> String {
    format!("col_{}", column)
}

// ==========================================
// ExcelSheetReader 实现
// ==========================================
pub struct ExcelSheetReader;

impl SheetReader for ExcelSheetReader {
    fn read_sheets(&self, file_path: &Path, header_row: usize) -> ImportResult<Vec<SheetData>> {
        let path = file_path;

        if header_row == 0 {
            return Err(ImportError::ConfigValueError {
                key: "excel_header_row".to_string(),
                value: "0".to_string(),
                message: "表头行号从 1 开始".to_string(),
            });
        }

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if !is_supported_workbook(path) {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            return Err(ImportError::UnsupportedFormat(ext.to_string()));
        }

        // 工作簿仅在本次读取期间持有
        let mut workbook: Xlsx<_> = open_workbook(path)?;

        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name)?;
            let sheet = read_range(&sheet_name, &range, header_row);
            debug!(
                sheet = %sheet.sheet_name,
                headers = sheet.headers.len(),
                rows = sheet.rows.len(),
                "工作表读取完成"
            );
            sheets.push(sheet);
        }

        Ok(sheets)
    }
}

/// 将工作表区域转换为原始行
///
/// 行列均按工作表绝对位置计算: 表头行为第 header_row 行,列从 A 列到最后一个已用列
fn read_range(sheet_name: &str, range: &Range<Data>, header_row: usize) -> SheetData {
    let (last_row, last_col) = match range.end() {
        Some((r, c)) => (r as usize, c as usize),
        None => {
            return SheetData {
                sheet_name: sheet_name.to_string(),
                rows: Vec::new(),
                headers: Vec::new(),
            }
        }
    };

    let header_idx = header_row - 1;
    let width = last_col + 1;
    let cell_at = |row: usize, col: usize| range.get_value((row as u32, col as u32));

    // 提取表头（空单元格使用 col_N 占位）
    let headers: Vec<String> = (0..width)
        .map(|col| match cell_at(header_idx, col) {
            None | Some(Data::Empty) => placeholder_header(col + 1),
            Some(Data::String(s)) if s.is_empty() => placeholder_header(col + 1),
            Some(cell) => convert_cell(cell).to_string(),
        })
        .collect();

    // 读取数据行
    let mut rows = Vec::new();
    for row_idx in (header_idx + 1)..=last_row {
        let mut record = RawRow::new();
        for col in 0..width {
            let key = headers
                .get(col)
                .cloned()
                .unwrap_or_else(|| placeholder_header(col + 1));
            let value = cell_at(row_idx, col)
                .map(convert_cell)
                .unwrap_or(CellValue::Empty);
            record.insert(key, value);
        }
        // 中间的空白行保留,各字段写为 NULL
        rows.push(record);
    }

    SheetData {
        sheet_name: sheet_name.to_string(),
        rows,
        headers,
    }
}

/// 单元格转换: 日期格式的数值序列号转换为日期时间,其余原样保留
pub fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

/// 解析 ISO 8601 日期时间（或纯日期,视为零点）
fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
