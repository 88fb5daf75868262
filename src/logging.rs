// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志系统
///
/// # 参数
/// - verbose: 未设置 RUST_LOG 时使用 info 级别（否则为 warn）
/// - json: 以 JSON 行格式输出,便于日志采集
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器,设置后优先生效
///   例如: RUST_LOG=debug 或 RUST_LOG=canteen_ingest=trace
///
/// # 示例
/// ```no_run
/// use canteen_ingest::logging;
/// logging::init(true, false);
/// ```
pub fn init(verbose: bool, json: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    // 重复初始化时忽略（例如被嵌入到其他程序中）
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
