//! DentScan 牙科X光片分析系统
//!
//! 汇总各子crate，供演示程序使用

pub use dentscan_admin as admin;
pub use dentscan_analysis as analysis;
pub use dentscan_core as domain;
pub use dentscan_workflow as workflow;
