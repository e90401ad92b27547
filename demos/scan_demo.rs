//! 检查会话演示程序
//!
//! 展示影像提交、分析进度、报告生成、历史筛选以及会话关闭时取消未完成的分析

use dentscan::admin::{init_logging, LoggingConfig};
use dentscan::analysis::{SequenceDraw, SimulatedAnalyzer};
use dentscan::domain::{AgeRange, HealthStatus, PatientInfo};
use dentscan::workflow::{
    render_text_report, AnalysisTiming, ReportFilter, ScanSession, StatusFilter, UploadRequest,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    init_logging(&LoggingConfig::default())?;

    println!("🚀 DentScan 检查会话演示\n");

    // 1. 依次得到无发现、需关注、紧急三种结果
    let analyzer = SimulatedAnalyzer::new(SequenceDraw::new(vec![0.1, 0.45, 0.9, 0.2]));
    let timing = AnalysisTiming {
        step_duration: Duration::from_millis(20),
        settle: Duration::from_millis(40),
        progress_interval: Duration::from_millis(10),
    };
    let session = ScanSession::new(Arc::new(analyzer), timing);

    // 2. 提交影像
    let mut maya = PatientInfo::with_name("Maya Chen");
    maya.age_range = Some(AgeRange::From31To50);
    maya.toggle_condition("Diabetes", true);

    let uploads = vec![
        upload("panoramic_2026.png", Some(maya.clone())),
        upload("bitewing_left.jpg", Some(PatientInfo::with_name("Jon Bell"))),
        upload("periapical.jpeg", Some(maya)),
    ];

    let mut scan_ids = Vec::new();
    for request in uploads {
        let record = session.submit(request).await?;
        println!("📤 已提交 {} -> {:?}", record.file_name(), record.status());
        scan_ids.push(record.id());
    }

    // 3. 等待分析完成
    for scan_id in &scan_ids {
        let record = session.wait_for(*scan_id).await?;
        let result = record.analysis_result()?;
        println!(
            "✅ {}: {}/100 {} ({} 项发现)",
            record.file_name(),
            result.overall_score(),
            result.status().label(),
            result.findings().len()
        );
    }

    // 4. 显示最新报告
    if let Some(latest) = session.history().await.first() {
        println!("\n{}", render_text_report(latest)?);
    }

    // 5. 历史统计与筛选
    let stats = session.stats().await;
    println!("📊 历史统计:");
    println!("   总计: {}", stats.total);
    for status in HealthStatus::all() {
        println!("   {}: {}", status.label(), stats.count(status));
    }

    let view = session
        .dashboard(&ReportFilter::new(StatusFilter::All, "maya"))
        .await;
    println!("\n🔍 搜索 \"maya\": {} 条", view.scans.len());
    for record in &view.scans {
        println!("   - {} ({})", record.file_name(), record.id());
    }

    // 6. 关闭会话时取消未完成的分析
    let pending = session.submit(upload("unfinished.png", None)).await?;
    session.shutdown().await;
    tokio::time::sleep(timing.total_delay() * 2).await;

    let still = session.get(pending.id()).await;
    println!(
        "\n🛑 会话关闭后 {} 的状态: {:?}",
        pending.file_name(),
        still.map(|r| r.status())
    );

    Ok(())
}

fn upload(file_name: &str, patient: Option<PatientInfo>) -> UploadRequest {
    UploadRequest {
        image_ref: format!("demo://{}", file_name),
        file_name: file_name.to_string(),
        file_size: 2 * 1024 * 1024,
        patient,
    }
}
