// ==========================================
// 食堂数据导入系统 - 记录存储 Trait
// ==========================================
// 职责: 定义导入管道依赖的存储接口（不包含实现）
// 能力: 建表（先查后建,幂等）/ 事务化批量写入 / 行数统计
// 红线: Repository 不含业务规则,只做数据访问
// ==========================================

use crate::domain::record::ResolvedRow;
use crate::domain::types::RecordCategory;
use crate::repository::error::RepositoryResult;

/// 建表时附加的创建时间列
pub const CREATED_AT_COLUMN: &str = "created_at";

// ==========================================
// TableHandle - 目标表句柄
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub category: RecordCategory,
    pub table_name: String,
    pub columns: Vec<String>, // 表中实际存在的列（按表定义顺序）
    pub created: bool,        // 本次调用是否新建了表
}

impl TableHandle {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

// ==========================================
// RecordStore Trait
// ==========================================
// 实现者: SqliteRecordStore（使用 rusqlite）
pub trait RecordStore {
    /// 查询已有表的列定义
    ///
    /// # 返回
    /// - Ok(Some(columns)): 表已存在
    /// - Ok(None): 表不存在
    fn lookup_table(&self, category: RecordCategory) -> RepositoryResult<Option<Vec<String>>>;

    /// 确保目标表存在（不存在则按表结构创建,已存在则原样复用）
    ///
    /// # 说明
    /// - 幂等: 重复调用不会重复建表,也不会修改已有表结构
    fn ensure_table(&self, category: RecordCategory) -> RepositoryResult<TableHandle>;

    /// 在单个事务中批量写入规范行（不写入主键字段）
    ///
    /// # 返回
    /// - Ok(usize): 写入行数
    /// - Err: 写入失败（整个事务回滚,不会部分提交）
    fn insert_batch(&self, table: &TableHandle, rows: &[ResolvedRow]) -> RepositoryResult<usize>;

    /// 统计表行数（表不存在时返回 None）
    fn count_rows(&self, category: RecordCategory) -> RepositoryResult<Option<i64>>;
}
