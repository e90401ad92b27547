//! 报告导出
//!
//! 由已完成的检查记录生成只读报告，不修改记录

use crate::record::ScanRecord;
use dentscan_core::{utils::format_file_size, AnalysisResult, Finding, Result};

/// 生成Markdown格式的文本报告
pub fn render_text_report(record: &ScanRecord) -> Result<String> {
    let result = record.analysis_result()?;
    let mut output = String::new();

    output.push_str("# Dental X-Ray Analysis Report\n\n");
    output.push_str(&scan_section(record));
    output.push_str(&overview_section(result));
    output.push_str(&findings_section(result.findings()));
    output.push_str(&recommendations_section(result.recommendations()));
    output.push_str(
        "---\n\n*This report is generated automatically and does not replace a professional dental examination.*\n",
    );

    Ok(output)
}

/// 生成JSON格式的报告
pub fn render_json_report(record: &ScanRecord) -> Result<String> {
    record.analysis_result()?;
    Ok(serde_json::to_string_pretty(record)?)
}

fn scan_section(record: &ScanRecord) -> String {
    let mut section = String::new();

    section.push_str("## Scan\n\n");
    section.push_str(&format!("- **Scan ID:** {}\n", record.id()));
    section.push_str(&format!("- **File:** {}\n", record.file_name()));
    section.push_str(&format!("- **Size:** {}\n", format_file_size(record.file_size())));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        record.uploaded_at().format("%B %-d, %Y")
    ));

    if let Some(patient) = record.patient() {
        if let Some(name) = patient.name.as_deref().filter(|n| !n.is_empty()) {
            section.push_str(&format!("- **Patient:** {}\n", name));
        }
        if let Some(age_range) = patient.age_range {
            section.push_str(&format!("- **Age Range:** {}\n", age_range));
        }
        if !patient.medical_history.is_empty() {
            let history: Vec<&str> = patient.medical_history.iter().map(String::as_str).collect();
            section.push_str(&format!("- **Medical History:** {}\n", history.join(", ")));
        }
    }
    section.push('\n');

    section
}

fn overview_section(result: &AnalysisResult) -> String {
    let mut section = String::new();
    let breakdown = result.severity_breakdown();

    section.push_str("## Overview\n\n");
    section.push_str(&format!(
        "- **Overall Health Score:** {}/100 ({})\n",
        result.overall_score(),
        result.score_band()
    ));
    section.push_str(&format!("- **Status:** {}\n", result.status().label()));
    section.push_str(&format!(
        "- **Findings:** {} urgent, {} moderate, {} healthy\n\n",
        breakdown.urgent, breakdown.moderate, breakdown.healthy
    ));
    section.push_str(result.summary());
    section.push_str("\n\n");

    section
}

fn findings_section(findings: &[Finding]) -> String {
    let mut section = String::new();

    section.push_str("## Findings\n\n");
    if findings.is_empty() {
        section.push_str("No findings.\n\n");
        return section;
    }

    for finding in findings {
        let tooth = finding
            .tooth_number
            .as_deref()
            .map(|t| format!(" (tooth {})", t))
            .unwrap_or_default();
        section.push_str(&format!("### {}{}\n\n", finding.condition, tooth));
        section.push_str(&format!("- **Location:** {}\n", finding.location));
        section.push_str(&format!("- **Severity:** {}\n", finding.severity));
        section.push_str(&format!("- **Confidence:** {}%\n\n", finding.confidence));
        section.push_str(&finding.description);
        section.push_str("\n\n");
        section.push_str(&format!("> {}\n\n", finding.recommendation));
    }

    section
}

fn recommendations_section(recommendations: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Recommendations\n\n");
    for (i, recommendation) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, recommendation));
    }
    section.push('\n');

    section
}
