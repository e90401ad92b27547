//! 检查状态机
//!
//! 管理检查记录的生命周期状态转换：
//! `Uploaded → Analyzing → Completed`，分析器无法完成时进入 `Failed`。

use crate::record::ScanRecord;
use dentscan_core::{AnalysisResult, DentscanError, Result, ScanStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 检查状态转换事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScanEvent {
    AnalysisStarted,
    AnalysisSucceeded,
    AnalysisFailed,
}

/// 检查状态机
#[derive(Debug)]
pub struct ScanStateMachine {
    transitions: HashMap<(ScanStatus, ScanEvent), ScanStatus>,
}

impl ScanStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        transitions.insert((ScanStatus::Uploaded, ScanEvent::AnalysisStarted), ScanStatus::Analyzing);
        transitions.insert((ScanStatus::Analyzing, ScanEvent::AnalysisSucceeded), ScanStatus::Completed);
        transitions.insert((ScanStatus::Analyzing, ScanEvent::AnalysisFailed), ScanStatus::Failed);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: &ScanStatus, event: &ScanEvent) -> bool {
        self.transitions.contains_key(&(*from, *event))
    }

    /// 计算状态转换结果
    pub fn transition(&self, from: &ScanStatus, event: &ScanEvent) -> Result<ScanStatus> {
        match self.transitions.get(&(*from, *event)) {
            Some(to) => Ok(*to),
            None => Err(DentscanError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 获取状态的所有可能事件
    pub fn get_possible_events(&self, current_state: &ScanStatus) -> Vec<ScanEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| state == current_state)
            .map(|(_, event)| *event)
            .collect()
    }

    /// 开始分析
    pub fn start_analysis(&self, record: &mut ScanRecord) -> Result<()> {
        let to = self.transition(&record.status(), &ScanEvent::AnalysisStarted)?;
        record.set_lifecycle(to, None, None);
        tracing::info!("Scan {} entered {:?}", record.id(), to);
        Ok(())
    }

    /// 以分析结果完成检查，记录只会完成一次
    pub fn complete(&self, record: &mut ScanRecord, result: AnalysisResult) -> Result<()> {
        let to = self.transition(&record.status(), &ScanEvent::AnalysisSucceeded)?;
        tracing::info!(
            "Scan {} completed: status {}, score {}",
            record.id(),
            result.status(),
            result.overall_score()
        );
        record.set_lifecycle(to, Some(result), None);
        Ok(())
    }

    /// 分析失败
    pub fn fail(&self, record: &mut ScanRecord, reason: String) -> Result<()> {
        let to = self.transition(&record.status(), &ScanEvent::AnalysisFailed)?;
        tracing::warn!("Scan {} failed: {}", record.id(), reason);
        record.set_lifecycle(to, None, Some(reason));
        Ok(())
    }
}

impl Default for ScanStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UploadRequest;
    use dentscan_analysis::synthesize;

    fn record() -> ScanRecord {
        ScanRecord::new(UploadRequest {
            image_ref: "mem://1".to_string(),
            file_name: "opg.jpg".to_string(),
            file_size: 1024,
            patient: None,
        })
    }

    #[test]
    fn test_valid_transitions() {
        let sm = ScanStateMachine::new();

        assert!(sm.can_transition(&ScanStatus::Uploaded, &ScanEvent::AnalysisStarted));
        assert!(sm.can_transition(&ScanStatus::Analyzing, &ScanEvent::AnalysisSucceeded));
        assert!(sm.can_transition(&ScanStatus::Analyzing, &ScanEvent::AnalysisFailed));
    }

    #[test]
    fn test_invalid_transitions() {
        let sm = ScanStateMachine::new();

        assert!(!sm.can_transition(&ScanStatus::Completed, &ScanEvent::AnalysisStarted));
        assert!(!sm.can_transition(&ScanStatus::Uploaded, &ScanEvent::AnalysisSucceeded));
        assert!(sm.get_possible_events(&ScanStatus::Completed).is_empty());
        assert!(sm.get_possible_events(&ScanStatus::Failed).is_empty());
    }

    #[test]
    fn test_full_lifecycle() {
        let sm = ScanStateMachine::new();
        let mut record = record();

        sm.start_analysis(&mut record).unwrap();
        assert_eq!(record.status(), ScanStatus::Analyzing);
        assert!(record.analysis_result().is_err());

        sm.complete(&mut record, synthesize(0.95)).unwrap();
        assert_eq!(record.status(), ScanStatus::Completed);
        assert_eq!(record.analysis_result().unwrap().overall_score(), 50);
    }

    #[test]
    fn test_completes_only_once() {
        let sm = ScanStateMachine::new();
        let mut record = record();
        sm.start_analysis(&mut record).unwrap();
        sm.complete(&mut record, synthesize(0.1)).unwrap();

        let err = sm.complete(&mut record, synthesize(0.95)).unwrap_err();
        assert!(matches!(err, DentscanError::InvalidStateTransition { .. }));
        assert_eq!(record.analysis_result().unwrap().overall_score(), 95);

        assert!(sm.start_analysis(&mut record).is_err());
        assert_eq!(record.status(), ScanStatus::Completed);
    }

    #[test]
    fn test_complete_requires_analyzing() {
        let sm = ScanStateMachine::new();
        let mut record = record();

        assert!(sm.complete(&mut record, synthesize(0.5)).is_err());
        assert_eq!(record.status(), ScanStatus::Uploaded);
        assert!(record.health_status().is_none());
    }

    #[test]
    fn test_failure_is_terminal() {
        let sm = ScanStateMachine::new();
        let mut record = record();
        sm.start_analysis(&mut record).unwrap();
        sm.fail(&mut record, "engine unavailable".to_string()).unwrap();

        assert_eq!(record.status(), ScanStatus::Failed);
        assert_eq!(record.failure_reason(), Some("engine unavailable"));
        assert!(record.analysis_result().is_err());
        assert!(sm.complete(&mut record, synthesize(0.1)).is_err());
    }
}
