//! 可观测性：进程级日志初始化（仅在应用最外层调用）
//!
//! 控制台彩色输出 + 按日轮转的日志文件（全部级别 / 仅 ERROR 两份）。
//! 库内部不依赖这里的全局状态：每个智能体持有自己的 span。

use std::fs;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

use crate::config::LoggingSection;

/// 非阻塞文件写入的守卫；进程存活期间必须持有，drop 时 flush
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// RUST_LOG 优先，否则使用配置中的级别
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

pub fn init(cfg: &LoggingSection) -> anyhow::Result<LogGuards> {
    let mut guards = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if cfg.to_console {
        let console = fmt::layer().with_target(true);
        if cfg.json {
            layers.push(console.json().boxed());
        } else {
            layers.push(console.boxed());
        }
    }

    if cfg.to_file {
        fs::create_dir_all(&cfg.dir)?;

        let (main_writer, guard) = tracing_appender::non_blocking(rolling::daily(
            &cfg.dir,
            format!("{}.log", cfg.file_name),
        ));
        guards.push(guard);
        let main = fmt::layer()
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_writer(main_writer);
        if cfg.json {
            layers.push(main.json().boxed());
        } else {
            layers.push(main.boxed());
        }

        let (error_writer, guard) = tracing_appender::non_blocking(rolling::daily(
            &cfg.dir,
            format!("{}_error.log", cfg.file_name),
        ));
        guards.push(guard);
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(error_writer)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(&cfg.level))
        .try_init()?;

    tracing::info!(
        level = %cfg.level,
        dir = %cfg.dir.display(),
        to_file = cfg.to_file,
        "logging initialized"
    );
    Ok(LogGuards { _guards: guards })
}
