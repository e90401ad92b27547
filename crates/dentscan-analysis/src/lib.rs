//! # DentScan分析模块
//!
//! 提供牙科X光片的报告合成功能，包括：
//! - 发现项目录：所有可能发现项及其静态属性
//! - 分析引擎：由一次随机抽样确定性地合成分析结果
//! - 随机源与分析器接口：便于测试时注入固定值

pub mod engine;
pub mod taxonomy;

// 重新导出主要类型
pub use engine::{
    synthesize, Analyzer, FixedDraw, RandomSource, SequenceDraw, SimulatedAnalyzer, ThreadRandom,
};
pub use taxonomy::{FindingTemplate, FINDING_CATALOG};
