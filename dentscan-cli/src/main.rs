//! DentScan命令行程序

mod upload;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dentscan_admin::{init_logging, ConfigManager};
use dentscan_analysis::{FixedDraw, SimulatedAnalyzer, ThreadRandom};
use dentscan_core::{AgeRange, PatientInfo, MEDICAL_HISTORY_CONDITIONS};
use dentscan_workflow::{
    render_json_report, render_text_report, ReportFilter, ScanRecord, ScanSession, StatusFilter,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 报告输出格式
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// DentScan命令行参数
#[derive(Parser, Debug)]
#[command(name = "dentscan")]
#[command(about = "牙科X光片分析与健康报告")]
struct Args {
    /// 待分析的X光片 (jpg/jpeg/png)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// 患者姓名
    #[arg(long)]
    patient_name: Option<String>,

    /// 年龄段 (0-17, 18-30, 31-50, 51-70, 70+)
    #[arg(long)]
    age_range: Option<AgeRange>,

    /// 既往病史，可多次指定
    #[arg(long = "history")]
    medical_history: Vec<String>,

    /// 固定随机值 [0, 1)，用于复现分析结果
    #[arg(long)]
    draw: Option<f64>,

    /// 仪表盘状态过滤 (all, healthy, attention, urgent)
    #[arg(long, default_value = "all")]
    status: StatusFilter,

    /// 仪表盘搜索（文件名或患者姓名）
    #[arg(short, long, default_value = "")]
    query: String,

    /// 报告格式
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    fn patient(&self) -> Result<Option<PatientInfo>> {
        let mut patient = PatientInfo {
            name: self.patient_name.clone(),
            age_range: self.age_range,
            ..Default::default()
        };

        for condition in &self.medical_history {
            let known = MEDICAL_HISTORY_CONDITIONS
                .iter()
                .find(|c| c.eq_ignore_ascii_case(condition.trim()))
                .with_context(|| {
                    format!(
                        "未知病史 {}，可选: {}",
                        condition,
                        MEDICAL_HISTORY_CONDITIONS.join(", ")
                    )
                })?;
            patient.toggle_condition(known, true);
        }

        Ok((!patient.is_empty()).then_some(patient))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = ConfigManager::new(args.config.as_deref())?;
    let mut config = config_manager.get_config().await;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    // 初始化日志
    init_logging(&config.logging)?;

    info!("启动DentScan分析...");
    info!("  步骤时长: {}ms", config.analysis.step_duration_ms);
    info!("  允许格式: {}", config.upload.allowed_extensions.join(", "));

    let analyzer = match args.draw {
        Some(draw) => SimulatedAnalyzer::new(FixedDraw(draw)),
        None => SimulatedAnalyzer::new(ThreadRandom),
    };
    let session = ScanSession::new(Arc::new(analyzer), config.analysis.timing());
    let patient = args.patient()?;

    let mut submitted = Vec::new();
    for path in &args.files {
        let request = match upload::collect_upload(path, &config.upload, patient.clone()) {
            Ok(request) => request,
            Err(e) => {
                println!("❌ {}: {}", path.display(), e);
                continue;
            }
        };

        let record = session.submit(request).await?;
        println!("📤 已上传 {} ({})", record.file_name(), record.id());
        submitted.push(record.id());
    }

    for scan_id in submitted {
        tokio::select! {
            result = wait_with_progress(&session, scan_id) => {
                match result {
                    Ok(record) => print_report(&record, args.format)?,
                    Err(e) => error!("检查 {} 未完成: {}", scan_id, e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("收到中断信号，取消未完成的分析");
                session.shutdown().await;
                return Ok(());
            }
        }
    }

    print_dashboard(&session, &ReportFilter::new(args.status, args.query.clone())).await;
    session.shutdown().await;

    Ok(())
}

/// 等待检查结束并打印分析进度
async fn wait_with_progress(session: &ScanSession, scan_id: Uuid) -> dentscan_core::Result<ScanRecord> {
    if let Some(mut progress) = session.progress(scan_id).await {
        let mut last_step = None;
        loop {
            let current = *progress.borrow_and_update();
            if last_step != Some(current.step_index) {
                println!("  ⏳ {:>3}% {}", current.percent, current.step);
                last_step = Some(current.step_index);
            }
            if progress.changed().await.is_err() {
                break;
            }
        }
    }

    session.wait_for(scan_id).await
}

fn print_report(record: &ScanRecord, format: OutputFormat) -> Result<()> {
    match record.analysis_result() {
        Ok(_) => {
            let report = match format {
                OutputFormat::Text => render_text_report(record)?,
                OutputFormat::Json => render_json_report(record)?,
            };
            println!("\n{}", report);
        }
        Err(_) => {
            println!(
                "⚠️  {} 分析失败: {}",
                record.file_name(),
                record.failure_reason().unwrap_or("unknown")
            );
        }
    }
    Ok(())
}

async fn print_dashboard(session: &ScanSession, filter: &ReportFilter) {
    let view = session.dashboard(filter).await;

    println!("\n📊 检查历史");
    println!(
        "  总计: {}  健康: {}  需关注: {}  紧急: {}",
        view.stats.total, view.stats.healthy, view.stats.attention, view.stats.urgent
    );

    if view.scans.is_empty() {
        println!("  (没有符合条件的报告)");
        return;
    }

    for record in &view.scans {
        let (score, status) = record
            .analysis_result()
            .map(|r| (r.overall_score(), r.status().label()))
            .unwrap_or((0, "-"));
        println!(
            "  • {} {:<24} {:>3}/100  {:<16} {}",
            record.uploaded_at().format("%Y-%m-%d %H:%M"),
            record.file_name(),
            score,
            status,
            record.patient_name().unwrap_or("-")
        );
    }
}
