use tracing_subscriber::{EnvFilter, fmt};

/// 初始化日志系统
///
/// 支持通过 RUST_LOG 环境变量控制日志级别，默认级别: warn。
/// 指令替换和断言分派的细节在 debug 级别输出。
///
/// 示例:
/// - RUST_LOG=debug rucheck subst "~today+1"
/// - RUST_LOG=rucheck::variable=trace rucheck subst @body.xml
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // 日志写入 stderr，stdout 只保留命令结果
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .try_init();

    tracing::debug!("Logger initialized");
}
