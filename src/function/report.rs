// report.rs
use serde::{Serialize, Serializer};
use std::fmt;

// 权限分类,Error为传输全部失败时的未定值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    Read,
    Forbidden,
    NotFound,
    Unknown(u16),
    #[default]
    Error,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Read => write!(f, "Read"),
            Permission::Forbidden => write!(f, "Forbidden"),
            Permission::NotFound => write!(f, "Not Found"),
            Permission::Unknown(code) => write!(f, "Unknown ({})", code),
            Permission::Error => write!(f, "Error"),
        }
    }
}

impl Serialize for Permission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

// 单个存储桶的探测结果
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub bucket_name: String,
    pub is_public: bool,
    pub permission: Permission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl ScanOutcome {
    pub fn new(bucket_name: &str) -> Self {
        ScanOutcome {
            bucket_name: bucket_name.to_string(),
            is_public: false,
            permission: Permission::default(),
            error: None,
            elapsed_ms: 0,
        }
    }
}

// 综合扫描报告结构
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub results: Vec<ScanOutcome>,
    pub scan_timestamp: String,
    pub scan_duration_ms: u64,
    pub scan_config: ReportConfig,
    pub public_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ReportConfig {
    pub targets_scanned: usize,
}

// 将结果集渲染为文本报告,保持传入顺序
pub fn format_results(outcomes: &[ScanOutcome]) -> String {
    let mut report = String::new();
    for outcome in outcomes {
        let status = if outcome.is_public { "Public" } else { "Private" };

        report.push_str(&format!("Bucket: {}\n", outcome.bucket_name));
        report.push_str(&format!("Status: {}\n", status));
        report.push_str(&format!("Permissions: {}\n", outcome.permission));
        if let Some(error) = &outcome.error {
            report.push_str(&format!("Error: {}\n", error));
        }
        report.push_str(&format!("Response Time: {}ms\n", outcome.elapsed_ms));
        report.push_str("-------------------\n");
    }
    report
}
