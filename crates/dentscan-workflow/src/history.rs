//! 报告汇总
//!
//! 对检查历史做统计和筛选。两者都是纯函数，不修改历史记录，不改变顺序。

use crate::record::ScanRecord;
use dentscan_core::{utils::contains_ignore_case, DentscanError, HealthStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 报告状态过滤条件
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Only(HealthStatus),
}

impl StatusFilter {
    pub fn accepts(&self, status: Option<HealthStatus>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => status == Some(*wanted),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = DentscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse::<HealthStatus>().map(StatusFilter::Only)
        }
    }
}

/// 仪表盘筛选条件
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportFilter {
    pub status: StatusFilter,
    pub query: String, // 文件名或患者姓名，不区分大小写
}

impl ReportFilter {
    pub fn new(status: StatusFilter, query: impl Into<String>) -> Self {
        Self {
            status,
            query: query.into(),
        }
    }

    /// 记录是否同时满足状态条件和搜索条件
    pub fn matches(&self, record: &ScanRecord) -> bool {
        self.status.accepts(record.health_status()) && self.matches_query(record)
    }

    fn matches_query(&self, record: &ScanRecord) -> bool {
        if self.query.is_empty() {
            return true;
        }

        contains_ignore_case(record.file_name(), &self.query)
            || record
                .patient_name()
                .map_or(false, |name| contains_ignore_case(name, &self.query))
    }

    /// 按原顺序保留满足条件的记录
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a ScanRecord>
    where
        I: IntoIterator<Item = &'a ScanRecord>,
    {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}

/// 报告统计
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportStats {
    pub total: usize,
    pub healthy: usize,
    pub attention: usize,
    pub urgent: usize,
}

impl ReportStats {
    /// 未完成的记录只计入总数
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ScanRecord>,
    {
        let mut stats = Self::default();

        for record in records {
            stats.total += 1;
            match record.health_status() {
                Some(HealthStatus::Healthy) => stats.healthy += 1,
                Some(HealthStatus::Attention) => stats.attention += 1,
                Some(HealthStatus::Urgent) => stats.urgent += 1,
                None => {}
            }
        }

        stats
    }

    pub fn count(&self, status: HealthStatus) -> usize {
        match status {
            HealthStatus::Healthy => self.healthy,
            HealthStatus::Attention => self.attention,
            HealthStatus::Urgent => self.urgent,
        }
    }
}
