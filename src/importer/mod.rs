// ==========================================
// 食堂数据导入系统 - 导入层
// ==========================================
// 职责: 外部工作簿导入,生成规范行并落库
// 支持: Excel (.xlsx / .xlsm)
// ==========================================

// 模块声明
pub mod classifier;
pub mod error;
pub mod field_mapper;
pub mod header;
pub mod record_importer_impl;
pub mod record_importer_trait;
pub mod sheet_reader;
pub mod value_normalizer;

// 重导出核心类型
pub use classifier::{classify, classify_path, is_supported_workbook};
pub use error::{CoercionError, ImportError, ImportResult};
pub use field_mapper::{FieldMapper, HeaderMap};
pub use header::{canonicalize_header, headers_equivalent};
pub use record_importer_impl::RecordImporterImpl;
pub use sheet_reader::ExcelSheetReader;
pub use value_normalizer::{Normalized, ValueNormalizer};

// 重导出 Trait 接口
pub use record_importer_trait::{RecordImporter, SheetReader};
