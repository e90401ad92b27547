//! 日志初始化
//!
//! `RUST_LOG` 存在时优先于配置中的日志级别

use crate::config::{LogFormat, LoggingConfig};
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// 构建日志过滤器
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(config.level.trim())
            .with_context(|| format!("Invalid log level: {}", config.level)),
    }
}

/// 安装全局日志订阅者；已安装时保持原订阅者不变
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    if let Err(e) = installed {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }

    Ok(())
}
