// ==========================================
// 食堂数据导入系统 - 每日统计引擎
// ==========================================
// 职责: 汇总单日车辆/门禁早上打卡人数与午餐消费人数
// 红线: Engine 不拼 SQL,查询全部委托给 DailyStatsRepository
// ==========================================

use crate::domain::stats::{DailyStats, RangeCollectResult, StatsTotals};
use crate::domain::types::RecordCategory;
use crate::repository::daily_stats_repo::DailyStatsRepository;
use crate::repository::error::RepositoryResult;
use chrono::{Duration, NaiveDate};
use tracing::{error, info, instrument};

pub struct DailyStatsCollector {
    repo: DailyStatsRepository,
}

impl DailyStatsCollector {
    pub fn new(repo: DailyStatsRepository) -> Self {
        Self { repo }
    }

    /// 计算单日统计（不落库）
    #[instrument(skip(self))]
    pub fn collect(&self, date: NaiveDate) -> RepositoryResult<DailyStats> {
        let stats = DailyStats {
            stat_date: date,
            vehicle_morning: self
                .repo
                .count_morning_checkins(RecordCategory::VehicleCheckpoint, date)?,
            personnel_morning: self
                .repo
                .count_morning_checkins(RecordCategory::DoorAccess, date)?,
            lunch_consumption: self.repo.count_lunch_consumption(date)?,
        };

        info!(
            vehicle_morning = stats.vehicle_morning,
            personnel_morning = stats.personnel_morning,
            lunch_consumption = stats.lunch_consumption,
            total_morning = stats.total_morning(),
            "单日统计完成"
        );
        Ok(stats)
    }

    /// 保存单日统计（同一日期重复保存时覆盖）
    pub fn save(&self, stats: &DailyStats) -> RepositoryResult<()> {
        self.repo.upsert(stats)?;
        info!(stat_date = %stats.stat_date, "统计数据已保存");
        Ok(())
    }

    /// 计算并保存单日统计
    ///
    /// # 参数
    /// - dry_run: 为 true 时只计算不保存
    pub fn collect_and_save(&self, date: NaiveDate, dry_run: bool) -> RepositoryResult<DailyStats> {
        let stats = self.collect(date)?;
        if !dry_run {
            self.save(&stats)?;
        }
        Ok(stats)
    }

    /// 逐日计算日期范围（含首尾）,单日失败不影响其他日期
    pub fn collect_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        dry_run: bool,
    ) -> RangeCollectResult {
        let mut result = RangeCollectResult::default();

        let mut date = start;
        while date <= end {
            result.total_days += 1;
            match self.collect_and_save(date, dry_run) {
                Ok(_) => result.success_count += 1,
                Err(e) => {
                    error!(stat_date = %date, error = %e, "单日统计失败");
                    result.failed_dates.push(date);
                }
            }
            date += Duration::days(1);
        }

        info!(
            total_days = result.total_days,
            success = result.success_count,
            failed = result.failed_count(),
            "日期范围统计完成"
        );
        result
    }

    /// 查询已保存的统计及合计
    pub fn summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<(Vec<DailyStats>, StatsTotals)> {
        let days = self.repo.list_range(start, end)?;
        let totals = StatsTotals::from_days(&days);
        Ok((days, totals))
    }
}
