//! # DentScan工作流模块
//!
//! 提供检查从上传到出具报告的完整流程管理，包括：
//! - 检查状态机：管理检查记录的生命周期状态转换
//! - 分析调度：可取消的延时分析任务及进度信号
//! - 检查会话：提交检查、维护历史记录、会话销毁时取消未完成分析
//! - 报告汇总：历史记录的统计与筛选
//! - 报告导出：只读的文本和JSON报告

pub mod history;
pub mod progress;
pub mod record;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod state_machine;

// 重新导出主要类型
pub use history::{ReportFilter, ReportStats, StatusFilter};
pub use progress::{AnalysisProgress, AnalysisTiming, ANALYSIS_STEPS};
pub use record::{ScanRecord, UploadRequest};
pub use report::{render_json_report, render_text_report};
pub use scheduler::{schedule_analysis, AnalysisHandle};
pub use session::{DashboardView, ScanSession};
pub use state_machine::{ScanEvent, ScanStateMachine};
