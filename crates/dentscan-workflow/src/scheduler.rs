//! 分析调度
//!
//! 进入 `Analyzing` 后延时调用分析引擎。任务通过显式句柄取消，
//! 句柄被丢弃时同样视为取消。

use crate::progress::{AnalysisProgress, AnalysisTiming};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

/// 延时分析任务句柄
#[derive(Debug)]
pub struct AnalysisHandle {
    scan_id: Uuid,
    cancel_tx: Option<oneshot::Sender<()>>,
    progress_rx: watch::Receiver<AnalysisProgress>,
    task: JoinHandle<()>,
}

impl AnalysisHandle {
    /// 取消任务；到期回调尚未开始执行时不会再执行
    pub fn cancel(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
            tracing::debug!("Cancellation requested for scan {}", self.scan_id);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// 订阅进度信号
    pub fn progress(&self) -> watch::Receiver<AnalysisProgress> {
        self.progress_rx.clone()
    }
}

/// 调度一次延时分析
///
/// `timing.total_delay()` 到期后执行 `on_due`，期间按 `progress_interval` 发布进度。
/// 在 `on_due` 完成之前收到取消则立即退出。
pub fn schedule_analysis<F, Fut>(scan_id: Uuid, timing: AnalysisTiming, on_due: F) -> AnalysisHandle
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    let (progress_tx, progress_rx) = watch::channel(AnalysisProgress::started());

    let task = tokio::spawn(async move {
        let started = Instant::now();
        let deadline = tokio::time::sleep(timing.total_delay());
        tokio::pin!(deadline);

        let period = timing.progress_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);

        loop {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => {
                    tracing::warn!("Analysis for scan {} cancelled before completion", scan_id);
                    return;
                }
                _ = &mut deadline => break,
                _ = ticker.tick() => {
                    let progress = AnalysisProgress::at(started.elapsed(), &timing);
                    tracing::debug!("Scan {} progress {}%: {}", scan_id, progress.percent, progress.step);
                    let _ = progress_tx.send(progress);
                }
            }
        }

        let _ = progress_tx.send(AnalysisProgress::finished());

        tokio::select! {
            biased;
            _ = &mut cancel_rx => {
                tracing::warn!("Analysis for scan {} cancelled while running", scan_id);
            }
            _ = on_due() => {}
        }
    });

    AnalysisHandle {
        scan_id,
        cancel_tx: Some(cancel_tx),
        progress_rx,
        task,
    }
}
