// ==========================================
// 食堂数据导入系统 - 每日统计仓储
// ==========================================
// 职责: 从记录表计算单日去重人数,读写 daily_summary_stats
// 说明: record_date 为 RFC 3339 文本,前 10 位为本地日期,
//       第 12~19 位为本地时间
// ==========================================

use crate::db::{quote_identifier, table_exists};
use crate::domain::stats::DailyStats;
use crate::domain::types::RecordCategory;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// 汇总表名
pub const SUMMARY_TABLE: &str = "daily_summary_stats";

/// 早上打卡截止时间（不含）
const MORNING_CUTOFF: &str = "09:00:00";
/// 午餐时段 [开始, 结束)
const LUNCH_START: &str = "11:00:00";
const LUNCH_END: &str = "14:00:00";
/// 午餐消费类型关键字
const LUNCH_KEYWORD: &str = "午餐";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct DailyStatsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DailyStatsRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保汇总表存在
    pub fn ensure_summary_table(&self) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                stat_date TEXT NOT NULL UNIQUE,
                vehicle_morning_count INTEGER NOT NULL DEFAULT 0,
                personnel_morning_count INTEGER NOT NULL DEFAULT 0,
                lunch_consumption_count INTEGER NOT NULL DEFAULT 0,
                total_morning_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )"#,
            table = SUMMARY_TABLE
        ))?;
        Ok(())
    }

    /// 9 点前打卡的去重人数（表不存在时为 0）
    ///
    /// # 参数
    /// - category: 车辆打卡或门禁记录
    pub fn count_morning_checkins(
        &self,
        category: RecordCategory,
        date: NaiveDate,
    ) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let table = category.table_name();
        if !table_exists(&conn, table)? {
            debug!(table = table, "记录表不存在,计为 0");
            return Ok(0);
        }

        let sql = format!(
            r#"SELECT COUNT(DISTINCT name) FROM {}
               WHERE substr(record_date, 1, 10) = ?1
                 AND substr(record_date, 12, 8) < ?2
                 AND name IS NOT NULL"#,
            quote_identifier(table)
        );
        let count: i64 = conn.query_row(
            &sql,
            params![date.format(DATE_FORMAT).to_string(), MORNING_CUTOFF],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 午餐时段内消费类型包含"午餐"的去重人数（表不存在时为 0）
    pub fn count_lunch_consumption(&self, date: NaiveDate) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let table = RecordCategory::Consumption.table_name();
        if !table_exists(&conn, table)? {
            debug!(table = table, "记录表不存在,计为 0");
            return Ok(0);
        }

        let sql = format!(
            r#"SELECT COUNT(DISTINCT name) FROM {}
               WHERE substr(record_date, 1, 10) = ?1
                 AND substr(record_date, 12, 8) >= ?2
                 AND substr(record_date, 12, 8) < ?3
                 AND type LIKE ?4
                 AND name IS NOT NULL"#,
            quote_identifier(table)
        );
        let count: i64 = conn.query_row(
            &sql,
            params![
                date.format(DATE_FORMAT).to_string(),
                LUNCH_START,
                LUNCH_END,
                format!("%{}%", LUNCH_KEYWORD)
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 写入或更新单日统计（按 stat_date 覆盖）
    pub fn upsert(&self, stats: &DailyStats) -> RepositoryResult<()> {
        self.ensure_summary_table()?;
        let conn = self.lock()?;
        conn.execute(
            &format!(
                r#"INSERT INTO {table} (
                    stat_date, vehicle_morning_count, personnel_morning_count,
                    lunch_consumption_count, total_morning_count
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(stat_date) DO UPDATE SET
                    vehicle_morning_count = excluded.vehicle_morning_count,
                    personnel_morning_count = excluded.personnel_morning_count,
                    lunch_consumption_count = excluded.lunch_consumption_count,
                    total_morning_count = excluded.total_morning_count,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')"#,
                table = SUMMARY_TABLE
            ),
            params![
                stats.stat_date.format(DATE_FORMAT).to_string(),
                stats.vehicle_morning,
                stats.personnel_morning,
                stats.lunch_consumption,
                stats.total_morning(),
            ],
        )?;
        Ok(())
    }

    /// 查询日期范围内已保存的统计（含首尾,按日期升序）
    pub fn list_range(&self, start: NaiveDate, end: NaiveDate) -> RepositoryResult<Vec<DailyStats>> {
        let conn = self.lock()?;
        if !table_exists(&conn, SUMMARY_TABLE)? {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(&format!(
            r#"SELECT stat_date, vehicle_morning_count, personnel_morning_count,
                      lunch_consumption_count
               FROM {}
               WHERE stat_date >= ?1 AND stat_date <= ?2
               ORDER BY stat_date"#,
            SUMMARY_TABLE
        ))?;

        let rows = stmt
            .query_map(
                params![
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    let stat_date: String = row.get(0)?;
                    Ok((stat_date, row.get(1)?, row.get(2)?, row.get(3)?))
                },
            )?
            .collect::<rusqlite::Result<Vec<(String, i64, i64, i64)>>>()?;

        rows.into_iter()
            .map(|(stat_date, vehicle, personnel, lunch)| {
                let stat_date = NaiveDate::parse_from_str(&stat_date, DATE_FORMAT).map_err(|e| {
                    RepositoryError::InternalError(format!("统计日期格式错误 {}: {}", stat_date, e))
                })?;
                Ok(DailyStats {
                    stat_date,
                    vehicle_morning: vehicle,
                    personnel_morning: personnel,
                    lunch_consumption: lunch,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_with(sql: &str) -> DailyStatsRepository {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(sql).unwrap();
        DailyStatsRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_morning_counts_distinct_before_nine() {
        let repo = repo_with(
            r#"
            CREATE TABLE vehicle_records (id INTEGER PRIMARY KEY, record_date TEXT, name TEXT, type TEXT);
            INSERT INTO vehicle_records (record_date, name) VALUES
                ('2024-01-15T07:30:00+08:00', '张三'),
                ('2024-01-15T08:59:59+08:00', '张三'),
                ('2024-01-15T08:10:00+08:00', '李四'),
                ('2024-01-15T09:00:00+08:00', '王五'),
                ('2024-01-14T08:00:00+08:00', '赵六'),
                ('2024-01-15T08:00:00+08:00', NULL);
            "#,
        );

        assert_eq!(
            repo.count_morning_checkins(RecordCategory::VehicleCheckpoint, day())
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_missing_table_counts_zero() {
        let repo = repo_with("");
        assert_eq!(
            repo.count_morning_checkins(RecordCategory::DoorAccess, day()).unwrap(),
            0
        );
        assert_eq!(repo.count_lunch_consumption(day()).unwrap(), 0);
    }

    #[test]
    fn test_lunch_window_and_type() {
        let repo = repo_with(
            r#"
            CREATE TABLE canteen_records (id INTEGER PRIMARY KEY, record_date TEXT, name TEXT, type TEXT);
            INSERT INTO canteen_records (record_date, name, type) VALUES
                ('2024-01-15T11:00:00+08:00', '张三', '午餐'),
                ('2024-01-15T12:30:00+08:00', '张三', '午餐'),
                ('2024-01-15T13:59:00+08:00', '李四', '职工午餐'),
                ('2024-01-15T14:00:00+08:00', '王五', '午餐'),
                ('2024-01-15T12:00:00+08:00', '赵六', '晚餐'),
                ('2024-01-15T10:59:00+08:00', '孙七', '午餐');
            "#,
        );

        assert_eq!(repo.count_lunch_consumption(day()).unwrap(), 2);
    }

    #[test]
    fn test_upsert_overwrites_same_date() {
        let repo = repo_with("");
        let mut stats = DailyStats {
            stat_date: day(),
            vehicle_morning: 1,
            personnel_morning: 2,
            lunch_consumption: 3,
        };
        repo.upsert(&stats).unwrap();
        stats.lunch_consumption = 4;
        repo.upsert(&stats).unwrap();

        let saved = repo.list_range(day(), day()).unwrap();
        assert_eq!(saved, vec![stats]);

        let conn = repo.lock().unwrap();
        let total: i64 = conn
            .query_row(
                "SELECT total_morning_count FROM daily_summary_stats WHERE stat_date = '2024-01-15'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_list_range_without_table_is_empty() {
        let repo = repo_with("");
        assert!(repo.list_range(day(), day()).unwrap().is_empty());
    }
}
