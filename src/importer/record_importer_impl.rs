// ==========================================
// 食堂数据导入系统 - 记录导入器实现
// ==========================================
// 职责: 整合导入流程,从工作簿到数据库
// 流程: 分类 → 读取 → 建表 → 表头映射 → 值规范化 → 按工作表落库
// 红线: 单个文件失败不影响后续文件
// ==========================================

use crate::domain::import_report::{BatchReport, FileReport, FileStatus, SheetReport};
use crate::domain::record::{ResolvedRow, SheetData};
use crate::domain::types::RecordCategory;
use crate::importer::classifier::{classify_path, is_supported_workbook};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::record_importer_trait::{RecordImporter, SheetReader};
use crate::importer::value_normalizer::ValueNormalizer;
use crate::repository::record_store::{RecordStore, TableHandle};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use walkdir::WalkDir;

// ==========================================
// RecordImporterImpl - 记录导入器实现
// ==========================================
pub struct RecordImporterImpl<S>
where
    S: RecordStore,
{
    // 数据访问层
    store: S,

    // 导入组件
    sheet_reader: Box<dyn SheetReader>,
    field_mapper: FieldMapper,
    normalizer: ValueNormalizer,
}

impl<S> RecordImporterImpl<S>
where
    S: RecordStore,
{
    /// 创建新的 RecordImporter 实例
    ///
    /// # 参数
    /// - store: 记录存储
    /// - sheet_reader: 工作簿读取器
    /// - normalizer: 值规范化器（携带时区偏移）
    pub fn new(store: S, sheet_reader: Box<dyn SheetReader>, normalizer: ValueNormalizer) -> Self {
        Self {
            store,
            sheet_reader,
            field_mapper: FieldMapper,
            normalizer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 读取工作簿并逐个工作表落库
    ///
    /// 某个工作表写入失败时立即返回,之前已提交的工作表保留
    fn ingest_sheets(
        &self,
        file_path: &Path,
        category: RecordCategory,
        header_row: usize,
        report: &mut FileReport,
    ) -> ImportResult<()> {
        // === 步骤 1: 读取工作簿 ===
        let sheets = self.sheet_reader.read_sheets(file_path, header_row)?;
        debug!(sheets = sheets.len(), "工作簿读取完成");
        if sheets.is_empty() {
            warn!(file = %file_path.display(), "工作簿中没有工作表,不建表");
            return Ok(());
        }

        // === 步骤 2: 确保目标表存在 ===
        let table = self.store.ensure_table(category)?;
        if table.created {
            info!(table = %table.table_name, "已创建目标表");
        }

        // === 步骤 3: 逐个工作表映射并写入 ===
        for sheet in &sheets {
            let sheet_report = self.ingest_sheet(&table, sheet)?;
            report.sheets.push(sheet_report);
        }

        Ok(())
    }

    fn ingest_sheet(&self, table: &TableHandle, sheet: &SheetData) -> ImportResult<SheetReport> {
        let header_map = self
            .field_mapper
            .resolve_headers(table.category, &sheet.headers);

        let missing_columns = header_map.missing_columns();
        if !missing_columns.is_empty() {
            warn!(
                sheet = %sheet.sheet_name,
                table = %table.table_name,
                missing = ?missing_columns,
                "工作表缺少映射列,对应字段将置为 NULL"
            );
        }

        let mut coerced_to_null = 0;
        let rows: Vec<ResolvedRow> = sheet
            .rows
            .iter()
            .map(|raw| {
                let mapped = self.field_mapper.map_row(&header_map, raw, &self.normalizer);
                coerced_to_null += mapped.coerced_to_null;
                mapped.row
            })
            .collect();

        if coerced_to_null > 0 {
            warn!(
                sheet = %sheet.sheet_name,
                fields = coerced_to_null,
                "部分字段值无法转换,已置为 NULL"
            );
        }

        let written_rows = self
            .store
            .insert_batch(table, &rows)
            .map_err(|source| ImportError::BatchWriteError {
                table: table.table_name.clone(),
                sheet: sheet.sheet_name.clone(),
                source,
            })?;

        info!(
            sheet = %sheet.sheet_name,
            table = %table.table_name,
            rows = written_rows,
            "工作表导入完成"
        );

        Ok(SheetReport {
            sheet_name: sheet.sheet_name.clone(),
            total_rows: sheet.rows.len(),
            written_rows,
            missing_columns,
            coerced_to_null,
        })
    }

    /// 收集目录下全部工作簿（按路径排序）
    fn collect_workbooks(&self, root: &Path) -> ImportResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if entry.file_type().is_file() && is_supported_workbook(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// 各记录表当前行数（表不存在的不计入）
    fn snapshot_counts(&self) -> ImportResult<BTreeMap<String, i64>> {
        let mut counts = BTreeMap::new();
        for category in RecordCategory::ALL {
            if let Some(count) = self.store.count_rows(category)? {
                counts.insert(category.table_name().to_string(), count);
            }
        }
        Ok(counts)
    }
}

impl<S> RecordImporter for RecordImporterImpl<S>
where
    S: RecordStore,
{
    #[instrument(skip(self, file_path, category_filter), fields(file = %file_path.display()))]
    fn ingest(
        &self,
        file_path: &Path,
        header_row: usize,
        category_filter: Option<&[RecordCategory]>,
    ) -> FileReport {
        let start_time = Instant::now();
        let path_str = file_path.display().to_string();

        if !is_supported_workbook(file_path) {
            warn!("不支持的文件扩展名,跳过");
            return FileReport::skipped(path_str, None, "不支持的文件扩展名");
        }

        let category = match classify_path(file_path) {
            Some(c) => c,
            None => {
                warn!("无法从文件名识别记录类别,跳过");
                return FileReport::skipped(path_str, None, "无法识别文件类别");
            }
        };

        if let Some(filter) = category_filter {
            if !filter.contains(&category) {
                info!(table = category.table_name(), "不在本次导入范围内,跳过");
                return FileReport::skipped(path_str, Some(category), "不在本次导入范围内");
            }
        }

        info!(table = category.table_name(), "开始导入 {}", category.label());

        let mut report = FileReport::new(path_str, Some(category));
        match self.ingest_sheets(file_path, category, header_row, &mut report) {
            Ok(()) => {
                info!(
                    sheets = report.sheets.len(),
                    rows = report.rows_written(),
                    "文件导入完成"
                );
            }
            Err(e) => {
                error!(error = %e, "文件导入失败");
                report.status = FileStatus::Failed(e.to_string());
            }
        }

        report.elapsed_ms = start_time.elapsed().as_millis();
        report
    }

    #[instrument(skip(self, root, category_filter), fields(batch_id))]
    fn ingest_directory(
        &self,
        root: &Path,
        header_row: usize,
        category_filter: Option<&[RecordCategory]>,
    ) -> ImportResult<BatchReport> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        if !root.is_dir() {
            return Err(ImportError::FileNotFound(root.display().to_string()));
        }

        info!(batch_id = %batch_id, root = %root.display(), "开始批量导入");

        let counts_before = self.snapshot_counts()?;
        for (table, count) in &counts_before {
            info!(table = %table, rows = count, "导入前行数");
        }

        let files = self.collect_workbooks(root)?;
        info!(files = files.len(), "扫描到工作簿");

        let reports: Vec<FileReport> = files
            .iter()
            .map(|path| self.ingest(path, header_row, category_filter))
            .collect();

        let counts_after = self.snapshot_counts()?;

        let report = BatchReport {
            batch_id,
            started_at,
            files: reports,
            counts_before,
            counts_after,
            elapsed_ms: start_time.elapsed().as_millis(),
        };

        for table in report.counts_after.keys() {
            info!(
                table = %table,
                rows = report.counts_after[table],
                delta = report.count_delta(table),
                "导入后行数"
            );
        }
        info!(
            processed = report.processed_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            rows = report.rows_written(),
            elapsed_ms = report.elapsed_ms as u64,
            "批量导入完成"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{CellValue, RawRow};
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use chrono::{FixedOffset, NaiveDate};
    use std::cell::RefCell;

    // ==========================================
    // 测试桩: 内存存储 + 固定工作表读取器
    // ==========================================
    #[derive(Default)]
    struct MemoryStore {
        tables: RefCell<BTreeMap<&'static str, Vec<ResolvedRow>>>,
        fail_on_call: Option<usize>,
        calls: RefCell<usize>,
    }

    impl RecordStore for MemoryStore {
        fn lookup_table(&self, category: RecordCategory) -> RepositoryResult<Option<Vec<String>>> {
            Ok(self
                .tables
                .borrow()
                .get(category.table_name())
                .map(|_| category.schema().iter().map(|f| f.name.to_string()).collect()))
        }

        fn ensure_table(&self, category: RecordCategory) -> RepositoryResult<TableHandle> {
            let created = self.lookup_table(category)?.is_none();
            self.tables
                .borrow_mut()
                .entry(category.table_name())
                .or_default();
            Ok(TableHandle {
                category,
                table_name: category.table_name().to_string(),
                columns: category.schema().iter().map(|f| f.name.to_string()).collect(),
                created,
            })
        }

        fn insert_batch(&self, table: &TableHandle, rows: &[ResolvedRow]) -> RepositoryResult<usize> {
            let call = {
                let mut calls = self.calls.borrow_mut();
                *calls += 1;
                *calls
            };
            if self.fail_on_call == Some(call) {
                return Err(RepositoryError::DatabaseTransactionError("模拟失败".to_string()));
            }
            self.tables
                .borrow_mut()
                .entry(table.category.table_name())
                .or_default()
                .extend(rows.iter().cloned());
            Ok(rows.len())
        }

        fn count_rows(&self, category: RecordCategory) -> RepositoryResult<Option<i64>> {
            Ok(self
                .tables
                .borrow()
                .get(category.table_name())
                .map(|rows| rows.len() as i64))
        }
    }

    struct FixedReader(Vec<SheetData>);

    impl SheetReader for FixedReader {
        fn read_sheets(&self, _file_path: &Path, _header_row: usize) -> ImportResult<Vec<SheetData>> {
            Ok(self.0.clone())
        }
    }

    fn consumption_sheet(name: &str, people: &[&str]) -> SheetData {
        let ndt = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let rows = people
            .iter()
            .map(|p| {
                let mut row = RawRow::new();
                row.insert("消费时间".to_string(), CellValue::DateTime(ndt));
                row.insert("姓名".to_string(), CellValue::Text(p.to_string()));
                row.insert("餐别".to_string(), CellValue::Text("午餐".to_string()));
                row
            })
            .collect();
        SheetData {
            sheet_name: name.to_string(),
            rows,
            headers: vec!["消费时间".into(), "姓名".into(), "餐别".into()],
        }
    }

    fn importer(store: MemoryStore, sheets: Vec<SheetData>) -> RecordImporterImpl<MemoryStore> {
        RecordImporterImpl::new(
            store,
            Box::new(FixedReader(sheets)),
            ValueNormalizer::new(FixedOffset::east_opt(8 * 3600).unwrap()),
        )
    }

    #[test]
    fn test_unrecognized_file_is_skipped() {
        let imp = importer(MemoryStore::default(), vec![consumption_sheet("S1", &["张三"])]);
        let report = imp.ingest(Path::new("report.xlsx"), 1, None);

        assert!(matches!(report.status, FileStatus::Skipped(_)));
        assert_eq!(report.rows_written(), 0);
        assert_eq!(imp.store().count_rows(RecordCategory::Consumption).unwrap(), None);
    }

    #[test]
    fn test_unsupported_extension_is_skipped() {
        let imp = importer(MemoryStore::default(), vec![]);
        let report = imp.ingest(Path::new("consumelog.csv"), 1, None);
        assert_eq!(
            report.status,
            FileStatus::Skipped("不支持的文件扩展名".to_string())
        );
    }

    #[test]
    fn test_filtered_category_is_skipped() {
        let imp = importer(MemoryStore::default(), vec![consumption_sheet("S1", &["张三"])]);
        let filter = [RecordCategory::DoorAccess];
        let report = imp.ingest(Path::new("consumelog_2024.xlsx"), 1, Some(&filter));

        assert!(matches!(report.status, FileStatus::Skipped(_)));
        assert_eq!(report.category, Some(RecordCategory::Consumption));
    }

    #[test]
    fn test_workbook_without_sheets_provisions_nothing() {
        let imp = importer(MemoryStore::default(), vec![]);
        let report = imp.ingest(Path::new("consumelog_2024.xlsx"), 1, None);

        assert_eq!(report.status, FileStatus::Processed);
        assert!(report.sheets.is_empty());
        assert_eq!(imp.store().lookup_table(RecordCategory::Consumption).unwrap(), None);
        assert_eq!(*imp.store().calls.borrow(), 0);
    }

    #[test]
    fn test_ingest_writes_every_sheet() {
        let imp = importer(
            MemoryStore::default(),
            vec![
                consumption_sheet("S1", &["张三", "李四"]),
                consumption_sheet("S2", &["王五"]),
            ],
        );
        let report = imp.ingest(Path::new("consumelog_2024.xlsx"), 1, None);

        assert_eq!(report.status, FileStatus::Processed);
        assert_eq!(report.sheets.len(), 2);
        assert_eq!(report.rows_written(), 3);
        assert_eq!(imp.store().count_rows(RecordCategory::Consumption).unwrap(), Some(3));
    }

    #[test]
    fn test_write_failure_keeps_earlier_sheets_and_stops() {
        let store = MemoryStore {
            fail_on_call: Some(2),
            ..Default::default()
        };
        let imp = importer(
            store,
            vec![
                consumption_sheet("S1", &["张三"]),
                consumption_sheet("S2", &["李四"]),
                consumption_sheet("S3", &["王五"]),
            ],
        );
        let report = imp.ingest(Path::new("consumelog_2024.xlsx"), 1, None);

        assert!(report.status.is_failed());
        assert_eq!(report.sheets.len(), 1);
        assert_eq!(report.rows_written(), 1);
        assert_eq!(*imp.store().calls.borrow(), 2);
        assert_eq!(imp.store().count_rows(RecordCategory::Consumption).unwrap(), Some(1));
    }

    #[test]
    fn test_missing_column_reported_per_sheet() {
        let mut sheet = consumption_sheet("S1", &["张三"]);
        sheet.headers.retain(|h| h != "餐别");
        for row in &mut sheet.rows {
            row.remove("餐别");
        }
        let imp = importer(MemoryStore::default(), vec![sheet]);
        let report = imp.ingest(Path::new("consumelog_2024.xlsx"), 1, None);

        assert_eq!(report.status, FileStatus::Processed);
        assert_eq!(report.sheets[0].missing_columns, vec!["餐别".to_string()]);
        assert_eq!(report.sheets[0].written_rows, 1);

        let tables = imp.store().tables.borrow();
        let row = &tables["canteen_records"][0];
        assert_eq!(row.get("type"), None);
        assert!(row.get("name").is_some());
    }
}
