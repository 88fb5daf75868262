// ==========================================
// 每日统计集成测试
// ==========================================
// 测试目标: 导入真实工作簿后计算单日统计并写入汇总表
// ==========================================


use canteen_ingest::engine::DailyStatsCollector;
use canteen_ingest::importer::RecordImporter;
use canteen_ingest::repository::DailyStatsRepository;
use chrono::NaiveDate;
use test_helpers::{
    count_rows, create_test_db, create_test_importer, datetime, open_test_connection,
    write_consumption_workbook, write_workbook, Cell, FixtureSheet,
};

fn checkin_sheet(
    headers: [&'static str; 3],
    rows: &[(chrono::NaiveDateTime, &'static str, &'static str)],
) -> FixtureSheet {
    let mut data = vec![headers.iter().map(|h| Cell::Text(*h)).collect::<Vec<_>>()];
    for (time, name, kind) in rows {
        data.push(vec![Cell::DateTime(*time), Cell::Text(*name), Cell::Text(*kind)]);
    }
    FixtureSheet::new("Sheet1", data)
}

#[test]
fn test_stats_after_import() {
    let dir = tempfile::tempdir().unwrap();

    write_workbook(
        &dir.path().join("打卡明细数据_0115.xlsx"),
        &[checkin_sheet(
            ["打卡时间", "姓名", "打卡类型"],
            &[
                (datetime(2024, 1, 15, 7, 40, 0), "张三", "进场"),
                (datetime(2024, 1, 15, 8, 55, 0), "张三", "进场"),
                (datetime(2024, 1, 15, 8, 10, 0), "李四", "进场"),
                (datetime(2024, 1, 15, 9, 30, 0), "王五", "进场"),
            ],
        )],
    )
    .unwrap();
    write_workbook(
        &dir.path().join("dooreventinfo_0115.xlsx"),
        &[checkin_sheet(
            ["事件时间", "人员姓名", "控制器"],
            &[
                (datetime(2024, 1, 15, 8, 0, 0), "赵六", "东门"),
                (datetime(2024, 1, 16, 8, 0, 0), "孙七", "东门"),
            ],
        )],
    )
    .unwrap();
    write_consumption_workbook(
        &dir.path().join("consumelog_0115.xlsx"),
        &[
            (datetime(2024, 1, 15, 11, 50, 0), "张三", "午餐"),
            (datetime(2024, 1, 15, 12, 20, 0), "李四", "午餐"),
            (datetime(2024, 1, 15, 12, 40, 0), "李四", "午餐"),
            (datetime(2024, 1, 15, 18, 0, 0), "赵六", "晚餐"),
        ],
    )
    .unwrap();

    let (_db_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    let importer = create_test_importer(conn.clone());
    let report = importer.ingest_directory(dir.path(), 1, None).unwrap();
    assert_eq!(report.failed_count(), 0);

    let collector = DailyStatsCollector::new(DailyStatsRepository::new(conn.clone()));
    let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let stats = collector.collect_and_save(day, false).unwrap();

    assert_eq!(stats.vehicle_morning, 2);
    assert_eq!(stats.personnel_morning, 1);
    assert_eq!(stats.lunch_consumption, 2);
    assert_eq!(stats.total_morning(), 3);
    assert_eq!(count_rows(&conn, "daily_summary_stats"), 1);

    // 重复统计同一天只更新,不新增
    collector.collect_and_save(day, false).unwrap();
    assert_eq!(count_rows(&conn, "daily_summary_stats"), 1);

    let (days, totals) = collector.summary(day, day).unwrap();
    assert_eq!(days, vec![stats]);
    assert_eq!(totals.days, 1);
}

#[test]
fn test_stats_on_empty_database() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    let collector = DailyStatsCollector::new(DailyStatsRepository::new(conn.clone()));

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
    let result = collector.collect_range(start, end, false);

    assert_eq!(result.total_days, 7);
    assert_eq!(result.success_count, 7);
    assert_eq!(count_rows(&conn, "daily_summary_stats"), 7);

    let (_, totals) = collector.summary(start, end).unwrap();
    assert_eq!(totals.total_morning(), 0);
    assert_eq!(totals.lunch_ratio(), None);
}
