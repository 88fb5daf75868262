// ==========================================
// 食堂数据导入系统 - 文件分类器
// ==========================================
// 职责: 根据文件名确定目标记录类别
// 规则: 忽略大小写的子串匹配,按 RecordCategory::ALL 顺序先匹配者胜出
// ==========================================

use crate::domain::types::RecordCategory;
use std::path::Path;

/// 支持的工作簿扩展名（小写）
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// 根据文件名（不含扩展名）确定记录类别
///
/// 无法识别时返回 None,调用方跳过该文件
pub fn classify(file_stem: &str) -> Option<RecordCategory> {
    let fname = file_stem.to_lowercase();
    RecordCategory::ALL
        .into_iter()
        .find(|category| fname.contains(category.file_marker()))
}

/// 根据文件路径确定记录类别（先去掉目录与扩展名）
pub fn classify_path(path: &Path) -> Option<RecordCategory> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    classify(stem)
}

/// 是否为支持的工作簿文件（.xlsx / .xlsm,忽略大小写）
pub fn is_supported_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
