//! 影像上传校验
//!
//! 只接受允许扩展名且不超过大小上限的影像文件，被拒绝的文件不会生成检查记录

use dentscan_admin::UploadConfig;
use dentscan_core::{utils::format_file_size, DentscanError, PatientInfo, Result};
use dentscan_workflow::UploadRequest;
use std::path::Path;

/// 校验影像文件并生成上传请求
pub fn collect_upload(
    path: &Path,
    config: &UploadConfig,
    patient: Option<PatientInfo>,
) -> Result<UploadRequest> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(DentscanError::Validation(format!(
            "不是文件: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !config
        .allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
    {
        return Err(DentscanError::Validation(format!(
            "请上传影像文件 ({}): {}",
            config.allowed_extensions.join(", "),
            path.display()
        )));
    }

    let file_size = metadata.len();
    if file_size > config.max_file_size_bytes {
        return Err(DentscanError::Validation(format!(
            "文件大小 {} 超过上限 {}",
            format_file_size(file_size),
            format_file_size(config.max_file_size_bytes)
        )));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let image_ref = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string();

    tracing::debug!("Accepted upload {} ({} bytes)", file_name, file_size);

    Ok(UploadRequest {
        image_ref,
        file_name,
        file_size,
        patient: patient.filter(|p| !p.is_empty()),
    })
}
