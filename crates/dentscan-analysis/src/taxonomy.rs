//! 发现项目录
//!
//! 固定的发现项清单，顺序即检测顺序

use dentscan_core::{Finding, Severity};

/// 发现项模板
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FindingTemplate {
    pub id: &'static str,
    pub condition: &'static str,
    pub location: &'static str,
    pub tooth_number: &'static str,
    pub confidence: u8,
    pub severity: Severity,
    pub threshold: f64, // 抽样值严格大于此阈值时触发
    pub description: &'static str,
    pub recommendation: &'static str,
}

impl FindingTemplate {
    /// 给定抽样值是否触发此发现项
    pub fn is_triggered(&self, draw: f64) -> bool {
        draw > self.threshold
    }

    pub fn to_finding(&self) -> Finding {
        Finding {
            id: self.id.to_string(),
            condition: self.condition.to_string(),
            location: self.location.to_string(),
            tooth_number: Some(self.tooth_number.to_string()),
            confidence: self.confidence,
            severity: self.severity,
            description: self.description.to_string(),
            recommendation: self.recommendation.to_string(),
        }
    }
}

pub const FINDING_CATALOG: [FindingTemplate; 4] = [
    FindingTemplate {
        id: "1",
        condition: "Cavity Detected",
        location: "Upper Right Quadrant",
        tooth_number: "#14",
        confidence: 87,
        severity: Severity::Moderate,
        threshold: 0.3,
        description: "A moderate-sized cavity has been detected on tooth #14. The decay appears to affect the outer enamel layer and may be extending into the dentin.",
        recommendation: "Schedule a dental appointment for examination and possible filling. Early treatment can prevent further decay.",
    },
    FindingTemplate {
        id: "2",
        condition: "Early Bone Loss",
        location: "Lower Left Quadrant",
        tooth_number: "#19",
        confidence: 72,
        severity: Severity::Moderate,
        threshold: 0.5,
        description: "Minor bone loss detected around tooth #19, which may indicate early periodontal disease or previous infection.",
        recommendation: "Consult with your dentist about periodontal health. Regular cleanings and proper oral hygiene are essential.",
    },
    FindingTemplate {
        id: "3",
        condition: "Impacted Wisdom Tooth",
        location: "Lower Right Quadrant",
        tooth_number: "#32",
        confidence: 94,
        severity: Severity::Urgent,
        threshold: 0.7,
        description: "Wisdom tooth #32 appears to be partially impacted and may be causing pressure on adjacent teeth.",
        recommendation: "Urgent: Consult with an oral surgeon to evaluate if extraction is necessary. Impacted wisdom teeth can lead to infection and pain.",
    },
    FindingTemplate {
        id: "4",
        condition: "Root Canal Treatment Detected",
        location: "Upper Left Quadrant",
        tooth_number: "#11",
        confidence: 96,
        severity: Severity::Healthy,
        threshold: 0.4,
        description: "Previous root canal treatment visible on tooth #11. The treatment appears to be successful with no signs of infection.",
        recommendation: "Continue regular dental check-ups to monitor the treated tooth. No immediate action required.",
    },
];
