//! 通用工具函数

use uuid::Uuid;

/// 生成唯一的检查ID
pub fn generate_scan_id() -> Uuid {
    Uuid::new_v4()
}

/// 以MB为单位格式化文件大小，保留两位小数
pub fn format_file_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// 忽略大小写的子串匹配，空查询总是匹配
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_scan_id() {
        assert_ne!(generate_scan_id(), generate_scan_id());
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0.00 MB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.00 MB");
        assert_eq!(format_file_size(1_572_864), "1.50 MB");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Panoramic_OPG.png", "opg"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("bitewing.jpg", "opg"));
    }
}
