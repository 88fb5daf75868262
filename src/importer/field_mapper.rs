// ==========================================
// 食堂数据导入系统 - 字段映射器
// ==========================================
// 职责: 源列名 → 工作表实际表头 → 目标字段
// 规则: 按规范化表头匹配; 未匹配时回退为源列名本身,
//       后续取值为 NULL 而不是报错
// ==========================================

use crate::domain::record::{RawRow, ResolvedRow};
use crate::domain::types::{FieldType, RecordCategory};
use crate::importer::header::canonicalize_header;
use crate::importer::value_normalizer::ValueNormalizer;
use std::collections::HashMap;

// ==========================================
// HeaderBinding - 单个目标字段的取值键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBinding {
    pub target_field: &'static str,
    pub source_label: &'static str,
    pub lookup_key: String, // 工作表中的实际表头,未匹配时为源列名
    pub matched: bool,
}

// ==========================================
// HeaderMap - 工作表级字段映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    pub category: RecordCategory,
    pub bindings: Vec<HeaderBinding>,
}

impl HeaderMap {
    /// 未在工作表中找到的源列名
    pub fn missing_columns(&self) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|b| !b.matched)
            .map(|b| b.source_label.to_string())
            .collect()
    }

    pub fn lookup_key(&self, target_field: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.target_field == target_field)
            .map(|b| b.lookup_key.as_str())
    }
}

/// 行映射结果: 规范行 + 本行转换失败的字段数
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub row: ResolvedRow,
    pub coerced_to_null: usize,
}

pub struct FieldMapper;

impl FieldMapper {
    /// 为一个工作表建立字段映射
    ///
    /// # 参数
    /// - category: 记录类别（提供 Excel 映射）
    /// - headers: 工作表原始表头
    ///
    /// # 说明
    /// - 多个表头规范形式相同时,取最后一个
    pub fn resolve_headers(&self, category: RecordCategory, headers: &[String]) -> HeaderMap {
        let canonical: HashMap<String, &String> = headers
            .iter()
            .map(|h| (canonicalize_header(h), h))
            .collect();

        let bindings = category
            .excel_mapping()
            .iter()
            .map(|&(source_label, target_field)| {
                match canonical.get(&canonicalize_header(source_label)) {
                    Some(actual) => HeaderBinding {
                        target_field,
                        source_label,
                        lookup_key: (*actual).clone(),
                        matched: true,
                    },
                    None => HeaderBinding {
                        target_field,
                        source_label,
                        lookup_key: source_label.to_string(),
                        matched: false,
                    },
                }
            })
            .collect();

        HeaderMap { category, bindings }
    }

    /// 将原始行映射为规范行（字段顺序与 Excel 映射一致）
    pub fn map_row(
        &self,
        header_map: &HeaderMap,
        row: &RawRow,
        normalizer: &ValueNormalizer,
    ) -> MappedRow {
        let mut resolved = ResolvedRow::new();
        let mut coerced_to_null = 0;

        for binding in &header_map.bindings {
            let field_type = header_map
                .category
                .field(binding.target_field)
                .map(|f| f.field_type)
                .unwrap_or(FieldType::Text);

            let result = normalizer.normalize(
                binding.target_field,
                row.get(&binding.lookup_key),
                field_type,
            );
            if result.degraded {
                coerced_to_null += 1;
            }
            resolved.push(binding.target_field, result.value);
        }

        MappedRow {
            row: resolved,
            coerced_to_null,
        }
    }
}
