// ==========================================
// 食堂数据导入系统 - 命令行主入口
// ==========================================
// 子命令:
// - import: 递归扫描导入目录,工作簿逐个入库
// - stats:  每日统计（单日 / 日期范围 / 汇总）
// - clear:  清空记录表并重置自增序列
// ==========================================

use anyhow::{bail, Context, Result};
use canteen_ingest::config::{parse_utc_offset, IngestConfig};
use canteen_ingest::db::open_shared_connection;
use canteen_ingest::domain::{BatchReport, DailyStats, FileStatus, RecordCategory};
use canteen_ingest::importer::{ExcelSheetReader, RecordImporter, RecordImporterImpl, ValueNormalizer};
use canteen_ingest::repository::{DailyStatsRepository, RecordStore, SqliteRecordStore};
use canteen_ingest::{logging, DailyStatsCollector, APP_NAME, VERSION};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 食堂/车辆/门禁 Excel 导出数据入库与每日统计
#[derive(Parser, Debug)]
#[command(name = "canteen-ingest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 数据根目录（覆盖 DATA_DIR）
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// 数据库文件路径（覆盖 DB_PATH）
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// 记录时间的 UTC 偏移,格式 ±HH:MM（覆盖 RECORD_UTC_OFFSET）
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset: Option<String>,

    /// 输出 info 级别日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 日志以 JSON 行格式输出
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 导入 {data_dir}/{import_dir} 下的全部工作簿
    Import {
        /// 导入目录（相对 data_dir,覆盖 IMPORT_DIR）
        #[arg(long)]
        import_dir: Option<PathBuf>,

        /// 仅导入指定表（可重复）: canteen_records / vehicle_records / door_records
        #[arg(long = "table")]
        tables: Vec<RecordCategory>,

        /// 表头所在行（从 1 开始,覆盖 EXCEL_HEADER_ROW）
        #[arg(long)]
        excel_header_row: Option<usize>,

        /// 以 JSON 输出导入报告
        #[arg(long)]
        json: bool,
    },

    /// 计算并保存每日统计
    Stats {
        /// 统计日期（YYYY-MM-DD）,默认昨天
        #[arg(long, conflicts_with_all = ["start_date", "end_date"])]
        date: Option<NaiveDate>,

        /// 开始日期（YYYY-MM-DD）
        #[arg(long, requires = "end_date")]
        start_date: Option<NaiveDate>,

        /// 结束日期（YYYY-MM-DD）
        #[arg(long, requires = "start_date")]
        end_date: Option<NaiveDate>,

        /// 显示已保存统计的汇总（需要开始与结束日期）
        #[arg(long, requires = "start_date")]
        summary: bool,

        /// 只计算不保存
        #[arg(long)]
        dry_run: bool,
    },

    /// 清空记录表并重置自增序列
    Clear {
        /// 仅清空指定表（可重复）,默认全部
        #[arg(long = "table")]
        tables: Vec<RecordCategory>,

        /// 确认执行（不可恢复）
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("错误: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = IngestConfig::load().context("加载配置失败")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(path) = cli.db_path {
        config.db_path = Some(path);
    }
    if let Some(offset) = cli.utc_offset.as_deref() {
        config.utc_offset = parse_utc_offset(offset)?;
    }

    info!(app = APP_NAME, version = VERSION, "启动");

    match cli.command {
        Command::Import {
            import_dir,
            tables,
            excel_header_row,
            json,
        } => {
            if let Some(dir) = import_dir {
                config.import_dir = dir;
            }
            if let Some(row) = excel_header_row {
                config.excel_header_row = row;
            }
            config.validate()?;
            run_import(&config, &tables, json)
        }
        Command::Stats {
            date,
            start_date,
            end_date,
            summary,
            dry_run,
        } => run_stats(&config, date, start_date.zip(end_date), summary, dry_run),
        Command::Clear { tables, yes } => run_clear(&config, &tables, yes),
    }
}

/// 打开共享数据库连接（必要时创建所在目录）
fn open_database(config: &IngestConfig) -> Result<Arc<Mutex<Connection>>> {
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }
    let conn = open_shared_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path.display()))?;
    info!(db = %db_path.display(), "数据库已连接");
    Ok(conn)
}

// ==========================================
// import
// ==========================================
fn run_import(config: &IngestConfig, tables: &[RecordCategory], json: bool) -> Result<ExitCode> {
    let root = config.import_root();
    if !root.is_dir() {
        bail!("导入目录不存在: {}", root.display());
    }

    let conn = open_database(config)?;
    let importer = RecordImporterImpl::new(
        SqliteRecordStore::from_connection(conn),
        Box::new(ExcelSheetReader),
        ValueNormalizer::new(config.utc_offset),
    );

    let filter = if tables.is_empty() { None } else { Some(tables) };
    let report = importer.ingest_directory(&root, config.excel_header_row, filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_batch_report(&report);
    }

    Ok(if report.failed_count() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_batch_report(report: &BatchReport) {
    println!("导入批次: {}", report.batch_id);
    for file in &report.files {
        match &file.status {
            FileStatus::Processed => println!(
                "  [完成] {} → {} 行",
                file.file_path,
                file.rows_written()
            ),
            FileStatus::Skipped(reason) => println!("  [跳过] {} ({})", file.file_path, reason),
            FileStatus::Failed(reason) => println!("  [失败] {} ({})", file.file_path, reason),
        }
    }

    println!("{}", "-".repeat(60));
    for category in RecordCategory::ALL {
        let table = category.table_name();
        let before = report.counts_before.get(table).copied().unwrap_or(0);
        let after = report.counts_after.get(table).copied().unwrap_or(0);
        println!(
            "  {:<16} 导入前 {:>8}  导入后 {:>8}  新增 {:>8}",
            table,
            before,
            after,
            report.count_delta(table)
        );
    }
    println!(
        "文件: 完成 {} / 跳过 {} / 失败 {},写入 {} 行,耗时 {} ms",
        report.processed_count(),
        report.skipped_count(),
        report.failed_count(),
        report.rows_written(),
        report.elapsed_ms
    );
}

// ==========================================
// stats
// ==========================================
fn run_stats(
    config: &IngestConfig,
    date: Option<NaiveDate>,
    range: Option<(NaiveDate, NaiveDate)>,
    summary: bool,
    dry_run: bool,
) -> Result<ExitCode> {
    let conn = open_database(config)?;
    let collector = DailyStatsCollector::new(DailyStatsRepository::new(conn));

    if let Some((start, end)) = range {
        if start > end {
            bail!("开始日期 {} 晚于结束日期 {}", start, end);
        }

        if summary {
            let (days, totals) = collector.summary(start, end)?;
            println!("统计汇总 ({} 至 {}):", start, end);
            println!("{}", "-".repeat(60));
            println!(
                "{:<12} {:>8} {:>8} {:>8} {:>8}",
                "日期", "车辆打卡", "人员打卡", "午餐消费", "总计"
            );
            println!("{}", "-".repeat(60));
            for day in &days {
                println!(
                    "{:<12} {:>8} {:>8} {:>8} {:>8}",
                    day.stat_date.to_string(),
                    day.vehicle_morning,
                    day.personnel_morning,
                    day.lunch_consumption,
                    day.total_morning()
                );
            }
            println!("{}", "-".repeat(60));
            println!(
                "{:<12} {:>8} {:>8} {:>8} {:>8}",
                format!("合计({}天)", totals.days),
                totals.vehicle_morning,
                totals.personnel_morning,
                totals.lunch_consumption,
                totals.total_morning()
            );
            match totals.lunch_ratio() {
                Some(ratio) => println!("午餐消费 / 早上打卡: {:.1}%", ratio),
                None => println!("午餐消费 / 早上打卡: -"),
            }
            return Ok(ExitCode::SUCCESS);
        }

        let result = collector.collect_range(start, end, dry_run);
        println!(
            "统计完成: 共 {} 天,成功 {} 天,失败 {} 天",
            result.total_days,
            result.success_count,
            result.failed_count()
        );
        for failed in &result.failed_dates {
            println!("  失败日期: {}", failed);
        }
        return Ok(if result.failed_dates.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    // 默认统计昨天（按记录所在时区）
    let target = match date {
        Some(d) => d,
        None => Utc::now().with_timezone(&config.utc_offset).date_naive() - Duration::days(1),
    };
    let stats = collector.collect_and_save(target, dry_run)?;
    print_daily_stats(&stats, dry_run);
    Ok(ExitCode::SUCCESS)
}

fn print_daily_stats(stats: &DailyStats, dry_run: bool) {
    println!("{} 统计{}:", stats.stat_date, if dry_run { "（未保存）" } else { "" });
    println!("  车辆早上打卡人数: {}", stats.vehicle_morning);
    println!("  人员早上打卡人数: {}", stats.personnel_morning);
    println!("  早上打卡合计:     {}", stats.total_morning());
    println!("  午餐消费人数:     {}", stats.lunch_consumption);
}

// ==========================================
// clear
// ==========================================
fn run_clear(config: &IngestConfig, tables: &[RecordCategory], yes: bool) -> Result<ExitCode> {
    let targets: Vec<RecordCategory> = if tables.is_empty() {
        RecordCategory::ALL.to_vec()
    } else {
        tables.to_vec()
    };

    if !yes {
        let names: Vec<&str> = targets.iter().map(|c| c.table_name()).collect();
        eprintln!(
            "将清空表 {} 的全部数据且不可恢复,确认请添加 --yes",
            names.join(", ")
        );
        return Ok(ExitCode::FAILURE);
    }

    let store = SqliteRecordStore::from_connection(open_database(config)?);
    for category in targets {
        let before = store.count_rows(category)?;
        match store.truncate(category)? {
            Some(deleted) => println!(
                "  {:<16} 已删除 {} 行（清空前 {} 行）",
                category.table_name(),
                deleted,
                before.unwrap_or(0)
            ),
            None => println!("  {:<16} 表不存在,跳过", category.table_name()),
        }
    }
    Ok(ExitCode::SUCCESS)
}
