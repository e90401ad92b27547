//! # DentScan Core
//!
//! 牙科X光片分析系统的核心模块，提供基础数据结构、状态推导规则、错误定义和通用工具。

pub mod error;
pub mod models;
pub mod utils;

pub use error::{DentscanError, Result};
pub use models::*;
