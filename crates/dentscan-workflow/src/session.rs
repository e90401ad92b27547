//! 检查会话
//!
//! 协调状态机、分析调度和历史记录。会话关闭或被丢弃后，
//! 尚未完成的分析不会再执行，记录停留在 `Analyzing`。

use crate::{
    history::{ReportFilter, ReportStats},
    progress::{AnalysisProgress, AnalysisTiming},
    record::{ScanRecord, UploadRequest},
    scheduler::{schedule_analysis, AnalysisHandle},
    state_machine::ScanStateMachine,
};
use dentscan_analysis::Analyzer;
use dentscan_core::{DentscanError, Result, ScanStatus};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

/// 仪表盘视图：筛选结果及全部历史的统计
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub scans: Vec<ScanRecord>,
    pub stats: ReportStats,
}

/// 分析中的检查
#[derive(Debug)]
struct PendingScan {
    record: ScanRecord,
    handle: AnalysisHandle,
}

#[derive(Debug)]
struct SessionState {
    pending: HashMap<Uuid, PendingScan>,
    history: Vec<ScanRecord>, // 最新的在前
    failed: Vec<ScanRecord>,
    closed: bool,
    settled: watch::Sender<u64>, // 每次有检查结束或会话关闭时递增
}

impl SessionState {
    fn find(&self, scan_id: Uuid) -> Option<&ScanRecord> {
        self.pending
            .get(&scan_id)
            .map(|pending| &pending.record)
            .or_else(|| self.history.iter().find(|r| r.id() == scan_id))
            .or_else(|| self.failed.iter().find(|r| r.id() == scan_id))
    }

    fn notify_settled(&self) {
        self.settled.send_modify(|generation| *generation += 1);
    }
}

/// 检查会话
pub struct ScanSession {
    state: Arc<RwLock<SessionState>>,
    state_machine: Arc<ScanStateMachine>,
    analyzer: Arc<dyn Analyzer>,
    timing: AnalysisTiming,
}

impl ScanSession {
    /// 创建新的检查会话
    pub fn new(analyzer: Arc<dyn Analyzer>, timing: AnalysisTiming) -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(SessionState {
                pending: HashMap::new(),
                history: Vec::new(),
                failed: Vec::new(),
                closed: false,
                settled,
            })),
            state_machine: Arc::new(ScanStateMachine::new()),
            analyzer,
            timing,
        }
    }

    /// 提交上传的影像，返回进入 `Analyzing` 的记录快照
    pub async fn submit(&self, request: UploadRequest) -> Result<ScanRecord> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(DentscanError::SessionClosed);
        }

        let mut record = ScanRecord::new(request);
        self.state_machine.start_analysis(&mut record)?;
        let scan_id = record.id();

        tracing::info!(
            "Scheduling analysis for scan {} ({}) in {:?}",
            scan_id,
            record.file_name(),
            self.timing.total_delay()
        );

        let weak_state = Arc::downgrade(&self.state);
        let state_machine = self.state_machine.clone();
        let analyzer = self.analyzer.clone();
        let handle = schedule_analysis(scan_id, self.timing, move || {
            run_analysis(weak_state, state_machine, analyzer, scan_id)
        });

        let snapshot = record.clone();
        state.pending.insert(scan_id, PendingScan { record, handle });
        Ok(snapshot)
    }

    /// 按ID查找检查记录
    pub async fn get(&self, scan_id: Uuid) -> Option<ScanRecord> {
        let state = self.state.read().await;
        state.find(scan_id).cloned()
    }

    /// 等待检查结束（完成或失败）
    pub async fn wait_for(&self, scan_id: Uuid) -> Result<ScanRecord> {
        let mut settled = self.state.read().await.settled.subscribe();

        loop {
            {
                let state = self.state.read().await;
                match state.find(scan_id) {
                    Some(record) if record.status().is_terminal() => return Ok(record.clone()),
                    Some(_) if state.closed => return Err(DentscanError::SessionClosed),
                    Some(_) => {}
                    None => return Err(DentscanError::NotFound(scan_id.to_string())),
                }
            }

            if settled.changed().await.is_err() {
                return Err(DentscanError::SessionClosed);
            }
        }
    }

    /// 订阅分析中检查的进度
    pub async fn progress(&self, scan_id: Uuid) -> Option<watch::Receiver<AnalysisProgress>> {
        let state = self.state.read().await;
        state.pending.get(&scan_id).map(|pending| pending.handle.progress())
    }

    /// 已完成检查的历史记录，最新的在前
    pub async fn history(&self) -> Vec<ScanRecord> {
        self.state.read().await.history.clone()
    }

    /// 分析失败的检查
    pub async fn failed(&self) -> Vec<ScanRecord> {
        self.state.read().await.failed.clone()
    }

    pub async fn pending_count(&self) -> usize {
        self.state.read().await.pending.len()
    }

    /// 历史记录统计
    pub async fn stats(&self) -> ReportStats {
        let state = self.state.read().await;
        ReportStats::from_records(&state.history)
    }

    /// 按筛选条件查询历史记录
    pub async fn dashboard(&self, filter: &ReportFilter) -> DashboardView {
        let state = self.state.read().await;
        DashboardView {
            scans: filter.apply(&state.history).into_iter().cloned().collect(),
            stats: ReportStats::from_records(&state.history),
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }

    /// 关闭会话并取消所有未完成的分析
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        if state.closed {
            return;
        }
        state.closed = true;

        for pending in state.pending.values_mut() {
            pending.handle.cancel();
        }

        tracing::warn!(
            "Scan session closed, {} pending analyses cancelled",
            state.pending.len()
        );
        state.notify_settled();
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

/// 到期后执行分析并完成状态转换
async fn run_analysis(
    state: Weak<RwLock<SessionState>>,
    state_machine: Arc<ScanStateMachine>,
    analyzer: Arc<dyn Analyzer>,
    scan_id: Uuid,
) {
    let image_ref = {
        let Some(state) = state.upgrade() else { return };
        let state = state.read().await;
        if state.closed {
            return;
        }
        match state.pending.get(&scan_id) {
            Some(pending) => pending.record.image_ref().to_string(),
            None => return,
        }
    };

    let outcome = analyzer.analyze(&image_ref).await;

    let Some(state) = state.upgrade() else { return };
    let mut state = state.write().await;
    if state.closed {
        tracing::warn!("Discarding analysis of scan {}: session closed", scan_id);
        return;
    }
    let Some(PendingScan { mut record, .. }) = state.pending.remove(&scan_id) else {
        return;
    };

    let transition = match outcome {
        Ok(result) => state_machine.complete(&mut record, result),
        Err(e) => state_machine.fail(&mut record, e.to_string()),
    };

    match (transition, record.status()) {
        (Err(e), _) => tracing::error!("Scan {} could not settle: {}", scan_id, e),
        (Ok(()), ScanStatus::Completed) => state.history.insert(0, record),
        (Ok(()), _) => state.failed.push(record),
    }
    state.notify_settled();
}
