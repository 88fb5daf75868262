// ==========================================
// 食堂数据导入系统 - 每日统计模型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DailyStats - 单日统计
// ==========================================
// 人数均按姓名去重
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub stat_date: NaiveDate,
    pub vehicle_morning: i64,   // 车辆 9 点前打卡人数
    pub personnel_morning: i64, // 人员 9 点前门禁人数
    pub lunch_consumption: i64, // 午餐消费人数
}

impl DailyStats {
    pub fn total_morning(&self) -> i64 {
        self.vehicle_morning + self.personnel_morning
    }

    /// 午餐消费占早上打卡人数比率（百分比）,无打卡时为 None
    pub fn lunch_ratio(&self) -> Option<f64> {
        let total = self.total_morning();
        if total > 0 {
            Some(self.lunch_consumption as f64 / total as f64 * 100.0)
        } else {
            None
        }
    }
}

// ==========================================
// RangeCollectResult - 日期范围统计结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeCollectResult {
    pub total_days: usize,
    pub success_count: usize,
    pub failed_dates: Vec<NaiveDate>,
}

impl RangeCollectResult {
    pub fn failed_count(&self) -> usize {
        self.failed_dates.len()
    }
}

// ==========================================
// StatsTotals - 汇总合计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsTotals {
    pub days: usize,
    pub vehicle_morning: i64,
    pub personnel_morning: i64,
    pub lunch_consumption: i64,
}

impl StatsTotals {
    pub fn from_days(days: &[DailyStats]) -> Self {
        days.iter().fold(
            Self {
                days: days.len(),
                ..Self::default()
            },
            |mut acc, d| {
                acc.vehicle_morning += d.vehicle_morning;
                acc.personnel_morning += d.personnel_morning;
                acc.lunch_consumption += d.lunch_consumption;
                acc
            },
        )
    }

    pub fn total_morning(&self) -> i64 {
        self.vehicle_morning + self.personnel_morning
    }

    /// 合计午餐消费占早上打卡人数比率（百分比）
    pub fn lunch_ratio(&self) -> Option<f64> {
        let total = self.total_morning();
        if total > 0 {
            Some(self.lunch_consumption as f64 / total as f64 * 100.0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_and_ratio() {
        let stats = DailyStats {
            stat_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            vehicle_morning: 3,
            personnel_morning: 1,
            lunch_consumption: 2,
        };
        assert_eq!(stats.total_morning(), 4);
        assert_eq!(stats.lunch_ratio(), Some(50.0));
    }

    #[test]
    fn test_ratio_none_without_checkins() {
        let stats = DailyStats {
            stat_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            vehicle_morning: 0,
            personnel_morning: 0,
            lunch_consumption: 5,
        };
        assert_eq!(stats.lunch_ratio(), None);
    }

    #[test]
    fn test_totals_sum_days() {
        let day = |d: u32, v: i64, p: i64, l: i64| DailyStats {
            stat_date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            vehicle_morning: v,
            personnel_morning: p,
            lunch_consumption: l,
        };
        let totals = StatsTotals::from_days(&[day(1, 2, 3, 4), day(2, 1, 4, 1)]);

        assert_eq!(totals.days, 2);
        assert_eq!(totals.total_morning(), 10);
        assert_eq!(totals.lunch_ratio(), Some(50.0));
        assert_eq!(StatsTotals::from_days(&[]).lunch_ratio(), None);
    }
}
