//! 检查记录

use chrono::{DateTime, Utc};
use dentscan_core::{
    utils::generate_scan_id, AnalysisResult, DentscanError, HealthStatus, PatientInfo, Result,
    ScanStatus,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 上传请求
///
/// 影像已由上传方完成类型和大小校验，这里不再重复校验。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub image_ref: String,
    pub file_name: String,
    pub file_size: u64,
    pub patient: Option<PatientInfo>,
}

/// 检查记录
///
/// 生命周期字段只能经由 [`crate::ScanStateMachine`] 修改，
/// 分析结果当且仅当状态为 `Completed` 时存在。
#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord {
    id: Uuid,
    image_ref: String,
    file_name: String,
    file_size: u64,
    uploaded_at: DateTime<Utc>,
    patient: Option<PatientInfo>,
    status: ScanStatus,
    result: Option<AnalysisResult>,
    failure_reason: Option<String>,
}

impl ScanRecord {
    /// 由上传请求创建记录，初始状态为 `Uploaded`
    pub fn new(request: UploadRequest) -> Self {
        Self {
            id: generate_scan_id(),
            image_ref: request.image_ref,
            file_name: request.file_name,
            file_size: request.file_size,
            uploaded_at: Utc::now(),
            patient: request.patient,
            status: ScanStatus::Uploaded,
            result: None,
            failure_reason: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn image_ref(&self) -> &str {
        &self.image_ref
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn patient(&self) -> Option<&PatientInfo> {
        self.patient.as_ref()
    }

    pub fn patient_name(&self) -> Option<&str> {
        self.patient.as_ref().and_then(|p| p.name.as_deref())
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// 读取分析结果，记录未完成时返回错误
    pub fn analysis_result(&self) -> Result<&AnalysisResult> {
        match (&self.status, &self.result) {
            (ScanStatus::Completed, Some(result)) => Ok(result),
            _ => Err(DentscanError::NotCompleted(self.id.to_string())),
        }
    }

    /// 报告状态，未完成的记录没有报告状态
    pub fn health_status(&self) -> Option<HealthStatus> {
        self.result.as_ref().map(AnalysisResult::status)
    }

    pub(crate) fn set_lifecycle(
        &mut self,
        status: ScanStatus,
        result: Option<AnalysisResult>,
        failure_reason: Option<String>,
    ) {
        self.status = status;
        self.result = result;
        self.failure_reason = failure_reason;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UploadRequest {
        UploadRequest {
            image_ref: "/tmp/opg.png".to_string(),
            file_name: "opg.png".to_string(),
            file_size: 2048,
            patient: Some(PatientInfo::with_name("Amina Yusuf")),
        }
    }

    #[test]
    fn test_new_record() {
        let record = ScanRecord::new(request());
        assert_eq!(record.status(), ScanStatus::Uploaded);
        assert_eq!(record.file_name(), "opg.png");
        assert_eq!(record.patient_name(), Some("Amina Yusuf"));
        assert!(record.health_status().is_none());
    }

    #[test]
    fn test_result_requires_completion() {
        let record = ScanRecord::new(request());
        let err = record.analysis_result().unwrap_err();
        assert!(matches!(err, DentscanError::NotCompleted(_)));
    }

    #[test]
    fn test_unique_ids() {
        assert_ne!(ScanRecord::new(request()).id(), ScanRecord::new(request()).id());
    }
}
