// ==========================================
// 食堂数据导入系统 - 记录存储实现
// ==========================================
// 职责: 实现目标表的建表/批量写入/计数（使用 rusqlite）
// 存储: 时间戳以 RFC 3339（带时区偏移）文本存储
// 红线: 已存在的表原样复用,不做任何 ALTER
// ==========================================

use crate::db::{open_sqlite_connection, quote_identifier, table_exists};
use crate::domain::record::{FieldValue, ResolvedRow};
use crate::domain::types::{FieldType, RecordCategory};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::{RecordStore, TableHandle, CREATED_AT_COLUMN};
use rusqlite::types::ToSqlOutput;
use rusqlite::{params_from_iter, Connection, ToSql};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            FieldValue::Text(s) => Ok(ToSqlOutput::from(s.as_str())),
            FieldValue::Timestamp(ts) => Ok(ToSqlOutput::from(ts.to_rfc3339())),
        }
    }
}

/// 读取表的列定义（表不存在返回 None）
fn lookup_columns(conn: &Connection, table: &str) -> rusqlite::Result<Option<Vec<String>>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    if columns.is_empty() {
        Ok(None)
    } else {
        Ok(Some(columns))
    }
}

/// 根据类别表结构生成建表语句
fn create_table_sql(category: RecordCategory) -> String {
    let mut columns: Vec<String> = category
        .schema()
        .iter()
        .map(|field| {
            let column_type = match field.field_type {
                FieldType::Identifier => "INTEGER PRIMARY KEY AUTOINCREMENT",
                FieldType::Timestamp => "TEXT",
                FieldType::Text => "TEXT",
            };
            format!("{} {}", quote_identifier(field.name), column_type)
        })
        .collect();
    columns.push(format!(
        "{} TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        quote_identifier(CREATED_AT_COLUMN)
    ));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_identifier(category.table_name()),
        columns.join(",\n    ")
    )
}

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// 创建新的存储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与统计仓储共用同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 清空记录表并重置自增序列
    ///
    /// # 返回
    /// - Ok(Some(n)): 删除的行数
    /// - Ok(None): 表不存在,已跳过
    pub fn truncate(&self, category: RecordCategory) -> RepositoryResult<Option<usize>> {
        let conn = self.lock()?;
        let table = category.table_name();
        if !table_exists(&conn, table)? {
            return Ok(None);
        }

        let tx = conn.unchecked_transaction()?;
        let deleted = tx.execute(&format!("DELETE FROM {}", quote_identifier(table)), [])?;
        if table_exists(&tx, "sqlite_sequence")? {
            tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1", [table])?;
        }
        tx.commit()?;

        info!(table = table, deleted = deleted, "记录表已清空");
        Ok(Some(deleted))
    }
}

impl RecordStore for SqliteRecordStore {
    fn lookup_table(&self, category: RecordCategory) -> RepositoryResult<Option<Vec<String>>> {
        let conn = self.lock()?;
        Ok(lookup_columns(&conn, category.table_name())?)
    }

    fn ensure_table(&self, category: RecordCategory) -> RepositoryResult<TableHandle> {
        let conn = self.lock()?;
        let table_name = category.table_name();

        // 第一步: 查询已有表
        if let Some(columns) = lookup_columns(&conn, table_name)? {
            debug!(table = table_name, columns = ?columns, "复用已有目标表");
            return Ok(TableHandle {
                category,
                table_name: table_name.to_string(),
                columns,
                created: false,
            });
        }

        // 第二步: 按表结构建表
        conn.execute_batch(&create_table_sql(category))?;
        let columns = lookup_columns(&conn, table_name)?.ok_or_else(|| {
            RepositoryError::InternalError(format!("建表后仍未找到表: {}", table_name))
        })?;
        info!(table = table_name, "目标表已创建");

        Ok(TableHandle {
            category,
            table_name: table_name.to_string(),
            columns,
            created: true,
        })
    }

    fn insert_batch(&self, table: &TableHandle, rows: &[ResolvedRow]) -> RepositoryResult<usize> {
        let writable: Vec<&'static str> = table
            .category
            .schema()
            .iter()
            .filter(|f| f.is_writable())
            .map(|f| f.name)
            .collect();

        // 已有表缺少写入列时,写入前直接失败
        let missing: Vec<String> = writable
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RepositoryError::SchemaMismatch {
                table: table.table_name.clone(),
                missing,
            });
        }

        if rows.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&table.table_name),
            writable
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
            (1..=writable.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let values: Vec<Option<&FieldValue>> =
                    writable.iter().map(|c| row.get(c)).collect();
                stmt.execute(params_from_iter(values))?;
                count += 1;
            }
        }

        // 未提交的事务在 drop 时回滚
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    fn count_rows(&self, category: RecordCategory) -> RepositoryResult<Option<i64>> {
        let conn = self.lock()?;
        let table = category.table_name();
        if !table_exists(&conn, table)? {
            return Ok(None);
        }

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(Some(count))
    }
}
