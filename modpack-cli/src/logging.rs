//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。日志写到 stderr，
//! stdout 只输出打包结果。

use crate::config::LogConfig;
use clap::ValueEnum;
use modpack_config::Phase;
use std::fs::File;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// 按阶段构建 target 过滤器
pub fn targets(log_config: &LogConfig) -> Targets {
    Phase::all().into_iter().fold(
        Targets::new()
            .with_default(log_config.global)
            .with_target("modpack::cli", log_config.global),
        |targets, phase| targets.with_target(phase.target(), log_config.level_for(phase)),
    )
}

/// 使用指定格式和日志配置初始化日志系统，`file` 存在时同时写入文件
pub fn init(log_config: &LogConfig, format: LogFormat, file: Option<File>) {
    let targets = targets(log_config);

    let mut layers = vec![format_layer(format, io::stderr)
        .with_filter(targets.clone())
        .boxed()];

    if let Some(file) = file {
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file))
                .with_filter(targets)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();
}

/// Create formatter layer based on format
fn format_layer<W, F>(format: LogFormat, make_writer: F) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
    }
}
