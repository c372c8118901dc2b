use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 初始化日志系统
///
/// 配置了 `log_file` 时额外写入按天滚动的日志文件，返回的 guard
/// 必须由调用方持有到进程结束，否则缓冲中的日志会丢失。
pub fn init_logging(
    log_level: &str,
    log_format: Option<&str>,
    log_file: Option<&str>,
    quiet: bool,
) -> Result<Option<WorkerGuard>> {
    // 如果静默模式，只输出错误
    let level = if quiet { "error" } else { log_level };

    // RUST_LOG 优先
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = match log_format {
        Some("json") => fmt::layer().json().boxed(),
        Some("pretty") | Some("dev") => fmt::layer().pretty().boxed(),
        _ => fmt::layer().compact().boxed(),
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .context("日志文件路径无效")?
                .to_string_lossy()
                .to_string();
            std::fs::create_dir_all(dir)
                .with_context(|| format!("无法创建日志目录: {}", dir.display()))?;

            let appender = tracing_appender::rolling::daily(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("日志系统初始化失败")?;

    Ok(guard)
}
