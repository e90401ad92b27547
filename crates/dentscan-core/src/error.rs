//! 错误定义模块

use thiserror::Error;

/// DentScan系统统一错误类型
#[derive(Error, Debug)]
pub enum DentscanError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },

    #[error("检查尚未完成分析: {0}")]
    NotCompleted(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("分析错误: {0}")]
    Analysis(String),

    #[error("会话已关闭")]
    SessionClosed,

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// DentScan系统统一结果类型
pub type Result<T> = std::result::Result<T, DentscanError>;
