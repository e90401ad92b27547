//! # DentScan管理模块
//!
//! 提供配置管理和日志初始化等运维功能

pub mod config;
pub mod logging;

pub use config::{AnalysisConfig, ConfigManager, DentscanConfig, LogFormat, LoggingConfig, UploadConfig};
pub use logging::init_logging;
