//! 核心数据模型定义

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::DentscanError;

/// 常见既往病史选项
pub const MEDICAL_HISTORY_CONDITIONS: [&str; 4] = [
    "Diabetes",
    "Heart Disease",
    "Previous Dental Surgery",
    "Gum Disease",
];

/// 患者年龄段
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeRange {
    #[serde(rename = "0-17")]
    Under18,
    #[serde(rename = "18-30")]
    From18To30,
    #[serde(rename = "31-50")]
    From31To50,
    #[serde(rename = "51-70")]
    From51To70,
    #[serde(rename = "70+")]
    Over70,
}

impl AgeRange {
    /// 所有年龄段，按从小到大排列
    pub fn all() -> [AgeRange; 5] {
        [
            AgeRange::Under18,
            AgeRange::From18To30,
            AgeRange::From31To50,
            AgeRange::From51To70,
            AgeRange::Over70,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeRange::Under18 => "0-17",
            AgeRange::From18To30 => "18-30",
            AgeRange::From31To50 => "31-50",
            AgeRange::From51To70 => "51-70",
            AgeRange::Over70 => "70+",
        }
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} years", self.label())
    }
}

impl FromStr for AgeRange {
    type Err = DentscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeRange::all()
            .into_iter()
            .find(|range| range.label() == s.trim())
            .ok_or_else(|| DentscanError::Validation(format!("未知年龄段: {}", s)))
    }
}

/// 患者信息（可选，随检查一同提交）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientInfo {
    pub name: Option<String>,
    pub age_range: Option<AgeRange>,
    pub medical_history: BTreeSet<String>, // 既往病史标签
}

impl PatientInfo {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// 勾选或取消某项病史
    pub fn toggle_condition(&mut self, condition: &str, checked: bool) {
        if checked {
            self.medical_history.insert(condition.to_string());
        } else {
            self.medical_history.remove(condition);
        }
    }

    /// 是否未填写任何信息
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, str::is_empty)
            && self.age_range.is_none()
            && self.medical_history.is_empty()
    }
}

/// 发现项严重程度，`Healthy < Moderate < Urgent`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Healthy,
    Moderate,
    Urgent,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Healthy => write!(f, "healthy"),
            Severity::Moderate => write!(f, "moderate"),
            Severity::Urgent => write!(f, "urgent"),
        }
    }
}

/// 报告总体状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Attention,
    Urgent,
}

impl HealthStatus {
    /// 由发现项严重程度推导总体状态。
    ///
    /// 存在任一 `Urgent` 即为 `Urgent`；否则存在 `Moderate` 即为 `Attention`；
    /// 其余情况（包括只有 `Healthy` 发现项）为 `Healthy`。
    /// 所有展示层都应调用此函数，而不是自行推导。
    pub fn from_findings(findings: &[Finding]) -> Self {
        match findings.iter().map(|f| f.severity).max() {
            Some(Severity::Urgent) => HealthStatus::Urgent,
            Some(Severity::Moderate) => HealthStatus::Attention,
            Some(Severity::Healthy) | None => HealthStatus::Healthy,
        }
    }

    pub fn all() -> [HealthStatus; 3] {
        [HealthStatus::Healthy, HealthStatus::Attention, HealthStatus::Urgent]
    }

    /// 展示用标签
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Attention => "Attention Needed",
            HealthStatus::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Attention => write!(f, "attention"),
            HealthStatus::Urgent => write!(f, "urgent"),
        }
    }
}

impl FromStr for HealthStatus {
    type Err = DentscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "healthy" => Ok(HealthStatus::Healthy),
            "attention" => Ok(HealthStatus::Attention),
            "urgent" => Ok(HealthStatus::Urgent),
            other => Err(DentscanError::Validation(format!("未知报告状态: {}", other))),
        }
    }
}

/// 检查生命周期状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Uploaded, // 已上传
    Analyzing, // 分析中
    Completed, // 已完成
    Failed, // 分析失败
}

impl ScanStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

/// 分数区间，供展示层着色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Good => write!(f, "good"),
            ScoreBand::Fair => write!(f, "fair"),
            ScoreBand::Poor => write!(f, "poor"),
        }
    }
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            ScoreBand::Good
        } else if score >= 60 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

/// 单个检测发现
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub id: String,
    pub condition: String,
    pub location: String,
    pub tooth_number: Option<String>,
    pub confidence: u8, // 置信度百分比 0-100
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
}

/// 无发现项时的总体分数
pub const CLEAR_SCORE: u8 = 95;
/// 总体分数下限
pub const MIN_SCORE: u8 = 50;

/// 由发现数量计算总体分数
pub fn overall_score(finding_count: usize) -> u8 {
    if finding_count == 0 {
        return CLEAR_SCORE;
    }
    let penalty = finding_count.saturating_mul(10);
    85usize.saturating_sub(penalty).max(MIN_SCORE as usize) as u8
}

/// 按严重程度统计发现数量
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityBreakdown {
    pub urgent: usize,
    pub moderate: usize,
    pub healthy: usize,
}

/// 分析结果
///
/// 分数和状态都由发现项推导，构造后不可修改。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AnalysisResult {
    overall_score: u8,
    status: HealthStatus,
    findings: Vec<Finding>,
    summary: String,
    recommendations: Vec<String>,
}

impl AnalysisResult {
    /// 由发现项（按检测顺序）构造结果
    pub fn from_findings(
        findings: Vec<Finding>,
        summary: String,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            overall_score: overall_score(findings.len()),
            status: HealthStatus::from_findings(&findings),
            findings,
            summary,
            recommendations,
        }
    }

    pub fn overall_score(&self) -> u8 {
        self.overall_score
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::from_score(self.overall_score)
    }

    /// 各严重程度的发现数量
    pub fn severity_breakdown(&self) -> SeverityBreakdown {
        self.findings
            .iter()
            .fold(SeverityBreakdown::default(), |mut acc, finding| {
                match finding.severity {
                    Severity::Urgent => acc.urgent += 1,
                    Severity::Moderate => acc.moderate += 1,
                    Severity::Healthy => acc.healthy += 1,
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(id: &str, severity: Severity) -> Finding {
        Finding {
            id: id.to_string(),
            condition: "Test".to_string(),
            location: "Upper Left Quadrant".to_string(),
            tooth_number: None,
            confidence: 90,
            severity,
            description: String::new(),
            recommendation: String::new(),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Healthy < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Urgent);
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(HealthStatus::from_findings(&[]), HealthStatus::Healthy);
        assert_eq!(
            HealthStatus::from_findings(&[finding("1", Severity::Healthy)]),
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthStatus::from_findings(&[
                finding("1", Severity::Healthy),
                finding("2", Severity::Moderate)
            ]),
            HealthStatus::Attention
        );
        assert_eq!(
            HealthStatus::from_findings(&[
                finding("1", Severity::Moderate),
                finding("2", Severity::Urgent),
                finding("3", Severity::Healthy)
            ]),
            HealthStatus::Urgent
        );
    }

    #[test]
    fn test_overall_score() {
        assert_eq!(overall_score(0), 95);
        assert_eq!(overall_score(1), 75);
        assert_eq!(overall_score(2), 65);
        assert_eq!(overall_score(3), 55);
        assert_eq!(overall_score(4), 50);
        assert_eq!(overall_score(9), 50);
    }

    #[test]
    fn test_score_band() {
        assert_eq!(ScoreBand::from_score(95), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(80), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(65), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(55), ScoreBand::Poor);
        assert_eq!(ScoreBand::from_score(79).to_string(), "fair");
        assert_eq!(ScoreBand::Poor.to_string(), "poor");
    }

    #[test]
    fn test_result_is_derived() {
        let result = AnalysisResult::from_findings(
            vec![finding("1", Severity::Moderate), finding("2", Severity::Healthy)],
            "summary".to_string(),
            vec![],
        );
        assert_eq!(result.overall_score(), 65);
        assert_eq!(result.status(), HealthStatus::Attention);
        assert_eq!(
            result.severity_breakdown(),
            SeverityBreakdown { urgent: 0, moderate: 1, healthy: 1 }
        );
    }

    #[test]
    fn test_age_range_parse() {
        assert_eq!("31-50".parse::<AgeRange>().unwrap(), AgeRange::From31To50);
        assert_eq!("70+".parse::<AgeRange>().unwrap(), AgeRange::Over70);
        assert!("12-20".parse::<AgeRange>().is_err());
        assert_eq!(
            serde_json::to_string(&AgeRange::Under18).unwrap(),
            "\"0-17\""
        );
    }

    #[test]
    fn test_health_status_parse() {
        assert_eq!("Urgent".parse::<HealthStatus>().unwrap(), HealthStatus::Urgent);
        assert!("unknown".parse::<HealthStatus>().is_err());
    }

    #[test]
    fn test_toggle_condition() {
        let mut patient = PatientInfo::default();
        assert!(patient.is_empty());

        patient.toggle_condition("Diabetes", true);
        patient.toggle_condition("Gum Disease", true);
        patient.toggle_condition("Diabetes", false);

        assert_eq!(patient.medical_history.len(), 1);
        assert!(patient.medical_history.contains("Gum Disease"));
        assert!(!patient.is_empty());
    }
}
