// ==========================================
// 食堂数据导入系统 - 导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::domain::import_report::{BatchReport, FileReport};
use crate::domain::record::SheetData;
use crate::domain::types::RecordCategory;
use crate::importer::error::ImportResult;
use std::path::Path;

// ==========================================
// RecordImporter Trait
// ==========================================
// 用途: 导入主接口,供命令行/调度器调用
// 实现者: RecordImporterImpl
pub trait RecordImporter {
    /// 导入单个工作簿文件
    ///
    /// # 参数
    /// - file_path: 工作簿路径（.xlsx / .xlsm）
    /// - header_row: 表头所在行（从 1 开始）
    /// - category_filter: 仅导入这些类别（None 表示全部）
    ///
    /// # 返回
    /// - FileReport: 处理结果（已处理 / 跳过 / 失败及原因）与各工作表行数
    ///
    /// # 说明
    /// - 单文件失败不会以 Err 形式返回,失败原因记录在 FileReport.status 中
    fn ingest(
        &self,
        file_path: &Path,
        header_row: usize,
        category_filter: Option<&[RecordCategory]>,
    ) -> FileReport;

    /// 递归扫描目录并逐个导入工作簿
    ///
    /// # 返回
    /// - Ok(BatchReport): 每个文件的结果 + 各表导入前后行数
    /// - Err: 目录无法遍历、导入前后计数失败
    fn ingest_directory(
        &self,
        root: &Path,
        header_row: usize,
        category_filter: Option<&[RecordCategory]>,
    ) -> ImportResult<BatchReport>;
}

// ==========================================
// SheetReader Trait
// ==========================================
// 用途: 工作簿读取接口
// 实现者: ExcelSheetReader
pub trait SheetReader {
    /// 读取工作簿中全部工作表
    ///
    /// # 参数
    /// - file_path: 工作簿路径
    /// - header_row: 表头所在行（从 1 开始）
    ///
    /// # 返回
    /// - Ok(Vec<SheetData>): 按工作簿顺序的工作表数据
    /// - Err: 文件不存在、格式错误、解析失败
    fn read_sheets(&self, file_path: &Path, header_row: usize) -> ImportResult<Vec<SheetData>>;
}
