//! 分析进度
//!
//! 进度只用于展示，不属于检查记录的数据

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 分析处理步骤
pub const ANALYSIS_STEPS: [&str; 10] = [
    "Initializing AI model...",
    "Loading X-ray image...",
    "Detecting tooth regions...",
    "Examining dental structures...",
    "Analyzing for cavities...",
    "Checking bone density...",
    "Detecting infections...",
    "Evaluating gum health...",
    "Generating report...",
    "Finalizing analysis...",
];

/// 模拟分析的时间参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisTiming {
    pub step_duration: Duration,
    pub settle: Duration, // 最后一步结束后到出结果的间隔
    pub progress_interval: Duration,
}

impl AnalysisTiming {
    /// 从进入 `Analyzing` 到调用分析引擎的总延时
    pub fn total_delay(&self) -> Duration {
        self.steps_duration() + self.settle
    }

    fn steps_duration(&self) -> Duration {
        self.step_duration * ANALYSIS_STEPS.len() as u32
    }
}

impl Default for AnalysisTiming {
    fn default() -> Self {
        Self {
            step_duration: Duration::from_millis(300),
            settle: Duration::from_millis(500),
            progress_interval: Duration::from_millis(50),
        }
    }
}

/// 进度快照
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AnalysisProgress {
    pub percent: u8,
    pub step_index: usize,
    pub step: &'static str,
}

impl AnalysisProgress {
    /// 已耗时 `elapsed` 时的进度
    pub fn at(elapsed: Duration, timing: &AnalysisTiming) -> Self {
        let total = timing.steps_duration().as_millis();
        let percent = if total == 0 {
            100
        } else {
            (elapsed.as_millis() * 100 / total).min(100) as u8
        };

        let step_index = if timing.step_duration.is_zero() {
            ANALYSIS_STEPS.len() - 1
        } else {
            let index = elapsed.as_millis() / timing.step_duration.as_millis();
            (index as usize).min(ANALYSIS_STEPS.len() - 1)
        };

        Self {
            percent,
            step_index,
            step: ANALYSIS_STEPS[step_index],
        }
    }

    pub fn started() -> Self {
        Self {
            percent: 0,
            step_index: 0,
            step: ANALYSIS_STEPS[0],
        }
    }

    pub fn finished() -> Self {
        let step_index = ANALYSIS_STEPS.len() - 1;
        Self {
            percent: 100,
            step_index,
            step: ANALYSIS_STEPS[step_index],
        }
    }

    /// 已完成的步骤名称
    pub fn completed_steps(&self) -> &'static [&'static str] {
        &ANALYSIS_STEPS[..=self.step_index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delay() {
        assert_eq!(AnalysisTiming::default().total_delay(), Duration::from_millis(3500));
    }

    #[test]
    fn test_progress_midway() {
        let timing = AnalysisTiming::default();
        let progress = AnalysisProgress::at(Duration::from_millis(1500), &timing);
        assert_eq!(progress.percent, 50);
        assert_eq!(progress.step_index, 5);
        assert_eq!(progress.step, "Checking bone density...");
        assert_eq!(progress.completed_steps().len(), 6);
    }

    #[test]
    fn test_progress_clamped() {
        let timing = AnalysisTiming::default();
        let progress = AnalysisProgress::at(Duration::from_secs(10), &timing);
        assert_eq!(progress, AnalysisProgress::finished());
    }

    #[test]
    fn test_zero_step_duration() {
        let timing = AnalysisTiming {
            step_duration: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(AnalysisProgress::at(Duration::ZERO, &timing).percent, 100);
    }
}
