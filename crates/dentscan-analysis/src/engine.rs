//! 分析引擎
//!
//! 由单次随机抽样合成分析结果。同一个抽样值复用于所有候选发现项，
//! 因此给定抽样值时输出完全确定。

use crate::taxonomy::FINDING_CATALOG;
use async_trait::async_trait;
use dentscan_core::{AnalysisResult, DentscanError, Finding, Result};
use rand::Rng;
use std::sync::Mutex;

const CLEAR_SUMMARY: &str = "Your dental X-ray shows generally healthy teeth and supporting structures. No significant issues were detected.";

const CLEAR_RECOMMENDATIONS: [&str; 3] = [
    "Continue regular dental check-ups every 6 months",
    "Maintain good oral hygiene with brushing and flossing",
    "Consider professional cleaning if not done recently",
];

const FOLLOW_UP_RECOMMENDATIONS: [&str; 4] = [
    "Schedule a dental appointment for professional evaluation",
    "Bring this report to discuss findings with your dentist",
    "Maintain good oral hygiene while waiting for appointment",
    "Monitor any symptoms like pain or sensitivity",
];

/// 由抽样值 `draw`（取值于 [0,1)）合成分析结果
pub fn synthesize(draw: f64) -> AnalysisResult {
    let findings: Vec<Finding> = FINDING_CATALOG
        .iter()
        .filter(|template| template.is_triggered(draw))
        .map(|template| template.to_finding())
        .collect();

    let (summary, recommendations) = if findings.is_empty() {
        (CLEAR_SUMMARY.to_string(), to_owned_list(&CLEAR_RECOMMENDATIONS))
    } else {
        let noun = if findings.len() > 1 { "findings" } else { "finding" };
        (
            format!(
                "Analysis complete. {} {} detected that require attention.",
                findings.len(),
                noun
            ),
            to_owned_list(&FOLLOW_UP_RECOMMENDATIONS),
        )
    };

    AnalysisResult::from_findings(findings, summary, recommendations)
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// 随机源
pub trait RandomSource: Send {
    /// 返回 [0,1) 内的抽样值
    fn draw(&mut self) -> f64;
}

/// 线程本地随机数生成器
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn draw(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// 固定抽样值
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw(pub f64);

impl RandomSource for FixedDraw {
    fn draw(&mut self) -> f64 {
        self.0
    }
}

/// 依次返回给定抽样值，用尽后重复最后一个
#[derive(Debug, Clone)]
pub struct SequenceDraw {
    values: Vec<f64>,
    position: usize,
}

impl SequenceDraw {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, position: 0 }
    }
}

impl RandomSource for SequenceDraw {
    fn draw(&mut self) -> f64 {
        let value = self
            .values
            .get(self.position)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(0.0);
        self.position += 1;
        value
    }
}

/// 分析器接口
///
/// 实现可能失败，失败时检查进入 `Failed` 状态。
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, image_ref: &str) -> Result<AnalysisResult>;
}

/// 模拟分析器，不读取影像内容，只依赖随机源
pub struct SimulatedAnalyzer {
    source: Mutex<Box<dyn RandomSource>>,
}

impl SimulatedAnalyzer {
    pub fn new(source: impl RandomSource + 'static) -> Self {
        Self {
            source: Mutex::new(Box::new(source)),
        }
    }

    fn next_draw(&self) -> Result<f64> {
        let mut source = self
            .source
            .lock()
            .map_err(|_| DentscanError::Analysis("随机源锁已中毒".to_string()))?;
        Ok(source.draw())
    }
}

impl Default for SimulatedAnalyzer {
    fn default() -> Self {
        Self::new(ThreadRandom)
    }
}

impl std::fmt::Debug for SimulatedAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedAnalyzer").finish_non_exhaustive()
    }
}

#[async_trait]
impl Analyzer for SimulatedAnalyzer {
    async fn analyze(&self, image_ref: &str) -> Result<AnalysisResult> {
        let draw = self.next_draw()?;
        if !(0.0..1.0).contains(&draw) {
            return Err(DentscanError::Analysis(format!(
                "抽样值超出范围 [0,1): {}",
                draw
            )));
        }

        let result = synthesize(draw);
        tracing::debug!(
            "Synthesized result for {} (draw {:.3}): {} findings, score {}",
            image_ref,
            draw,
            result.findings().len(),
            result.overall_score()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentscan_core::{HealthStatus, Severity};

    fn conditions(result: &AnalysisResult) -> Vec<&str> {
        result
            .findings()
            .iter()
            .map(|f| f.condition.as_str())
            .collect()
    }

    #[test]
    fn test_no_findings() {
        let result = synthesize(0.1);
        assert!(result.findings().is_empty());
        assert_eq!(result.overall_score(), 95);
        assert_eq!(result.status(), HealthStatus::Healthy);
        assert_eq!(result.summary(), CLEAR_SUMMARY);
        assert_eq!(result.recommendations().len(), 3);
    }

    #[test]
    fn test_single_finding() {
        let result = synthesize(0.35);
        assert_eq!(conditions(&result), vec!["Cavity Detected"]);
        assert_eq!(result.overall_score(), 75);
        assert_eq!(result.status(), HealthStatus::Attention);
        assert_eq!(
            result.summary(),
            "Analysis complete. 1 finding detected that require attention."
        );
        assert_eq!(result.recommendations().len(), 4);
    }

    #[test]
    fn test_mid_draw_overlapping_thresholds() {
        let result = synthesize(0.6);
        assert_eq!(
            conditions(&result),
            vec![
                "Cavity Detected",
                "Early Bone Loss",
                "Root Canal Treatment Detected"
            ]
        );
        assert_eq!(result.overall_score(), 55);
        assert_eq!(result.status(), HealthStatus::Attention);
    }

    #[test]
    fn test_all_findings() {
        let result = synthesize(0.95);
        assert_eq!(
            conditions(&result),
            vec![
                "Cavity Detected",
                "Early Bone Loss",
                "Impacted Wisdom Tooth",
                "Root Canal Treatment Detected"
            ]
        );
        assert_eq!(result.overall_score(), 50);
        assert_eq!(result.status(), HealthStatus::Urgent);
        assert_eq!(
            result.summary(),
            "Analysis complete. 4 findings detected that require attention."
        );
    }

    #[test]
    fn test_gating_boundaries() {
        const CAVITY: &str = "Cavity Detected";
        const BONE_LOSS: &str = "Early Bone Loss";
        const WISDOM: &str = "Impacted Wisdom Tooth";
        const ROOT_CANAL: &str = "Root Canal Treatment Detected";

        let cases: [(f64, &[&str]); 10] = [
            (0.0, &[]),
            (0.3, &[]),
            (0.301, &[CAVITY]),
            (0.4, &[CAVITY]),
            (0.401, &[CAVITY, ROOT_CANAL]),
            (0.5, &[CAVITY, ROOT_CANAL]),
            (0.501, &[CAVITY, BONE_LOSS, ROOT_CANAL]),
            (0.7, &[CAVITY, BONE_LOSS, ROOT_CANAL]),
            (0.701, &[CAVITY, BONE_LOSS, WISDOM, ROOT_CANAL]),
            (0.999, &[CAVITY, BONE_LOSS, WISDOM, ROOT_CANAL]),
        ];

        for (draw, expected) in cases {
            assert_eq!(conditions(&synthesize(draw)), expected.to_vec(), "draw {}", draw);
        }
    }

    #[test]
    fn test_finding_attributes() {
        let rows = [
            ("1", "Cavity Detected", "#14", 87, Severity::Moderate),
            ("2", "Early Bone Loss", "#19", 72, Severity::Moderate),
            ("3", "Impacted Wisdom Tooth", "#32", 94, Severity::Urgent),
            ("4", "Root Canal Treatment Detected", "#11", 96, Severity::Healthy),
        ];

        let result = synthesize(0.99);
        assert_eq!(result.findings().len(), rows.len());
        for (finding, (id, condition, tooth, confidence, severity)) in
            result.findings().iter().zip(rows)
        {
            assert_eq!(finding.id, id);
            assert_eq!(finding.condition, condition);
            assert_eq!(finding.tooth_number.as_deref(), Some(tooth));
            assert_eq!(finding.confidence, confidence);
            assert_eq!(finding.severity, severity);
        }
    }

    #[test]
    fn test_score_non_increasing_in_draw() {
        let mut previous = u8::MAX;
        for step in 0..100 {
            let score = synthesize(step as f64 / 100.0).overall_score();
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_healthy_severity_only_stays_healthy() {
        let result = AnalysisResult::from_findings(
            vec![FINDING_CATALOG[3].to_finding()],
            String::new(),
            vec![],
        );
        assert_eq!(result.findings()[0].severity, Severity::Healthy);
        assert_eq!(result.status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_sequence_draw_repeats_last() {
        let mut source = SequenceDraw::new(vec![0.2, 0.8]);
        assert_eq!(source.draw(), 0.2);
        assert_eq!(source.draw(), 0.8);
        assert_eq!(source.draw(), 0.8);
    }

    #[test]
    fn test_thread_random_in_range() {
        let mut source = ThreadRandom;
        for _ in 0..1000 {
            let draw = source.draw();
            assert!((0.0..1.0).contains(&draw));
        }
    }

    #[tokio::test]
    async fn test_simulated_analyzer_uses_source() {
        let analyzer = SimulatedAnalyzer::new(FixedDraw(0.95));
        let result = analyzer.analyze("scan.png").await.unwrap();
        assert_eq!(result.status(), HealthStatus::Urgent);
    }

    #[tokio::test]
    async fn test_simulated_analyzer_rejects_out_of_range() {
        let analyzer = SimulatedAnalyzer::new(FixedDraw(1.0));
        let err = analyzer.analyze("scan.png").await.unwrap_err();
        assert!(matches!(err, DentscanError::Analysis(_)));
    }
}
