// bridge.rs 面向移动端/外部宿主的同步桥接层
use super::report::ScanOutcome;
use super::scanner::Scanner;
use super::ScanError;
use serde::Serialize;
use tokio::runtime::Runtime;

// 对外暴露的扁平结果结构
#[derive(Debug, Clone, Serialize)]
pub struct BridgeResult {
    pub bucket_name: String,
    pub is_public: bool,
    pub permissions: String,
    pub error: String,
    pub response_time: u64,
}

impl From<ScanOutcome> for BridgeResult {
    fn from(outcome: ScanOutcome) -> Self {
        BridgeResult {
            bucket_name: outcome.bucket_name,
            is_public: outcome.is_public,
            permissions: outcome.permission.to_string(),
            error: outcome.error.unwrap_or_default(),
            response_time: outcome.elapsed_ms,
        }
    }
}

// 持有独立运行时,供非异步宿主同步调用
pub struct ScannerBridge {
    scanner: Scanner,
    runtime: Runtime,
}

impl ScannerBridge {
    pub fn new() -> Result<Self, ScanError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(ScannerBridge {
            scanner: Scanner::new()?,
            runtime,
        })
    }

    pub fn scan_single_bucket(&self, bucket_name: &str) -> BridgeResult {
        self.runtime
            .block_on(self.scanner.scan_bucket(bucket_name))
            .into()
    }

    pub fn scan_multiple_buckets(&self, bucket_names: Vec<String>) -> Vec<BridgeResult> {
        self.runtime
            .block_on(self.scanner.scan_buckets(bucket_names))
            .into_iter()
            .map(BridgeResult::from)
            .collect()
    }

    pub fn set_user_agent(&self, user_agent: &str) {
        self.scanner.set_user_agent(user_agent);
    }

    pub fn set_timeout(&self, seconds: u64) -> Result<(), ScanError> {
        self.scanner.set_timeout_secs(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::report::Permission;

    #[test]
    fn bridge_result_flattens_outcome() {
        let outcome = ScanOutcome {
            bucket_name: "demo".to_string(),
            is_public: true,
            permission: Permission::Read,
            error: None,
            elapsed_ms: 42,
        };

        let result = BridgeResult::from(outcome);
        assert_eq!(result.bucket_name, "demo");
        assert!(result.is_public);
        assert_eq!(result.permissions, "Read");
        assert_eq!(result.error, "");
        assert_eq!(result.response_time, 42);
    }

    #[test]
    fn bridge_result_keeps_error_text() {
        let outcome = ScanOutcome {
            error: Some("连接错误".to_string()),
            ..ScanOutcome::new("dead-bucket")
        };

        let result = BridgeResult::from(outcome);
        assert!(!result.is_public);
        assert_eq!(result.permissions, "Error");
        assert_eq!(result.error, "连接错误");
    }

    #[test]
    fn bridge_setters_validate_timeout() {
        let bridge = ScannerBridge::new().unwrap();
        bridge.set_user_agent("BridgeAgent/1.0");
        assert!(bridge.set_timeout(0).is_err());
        assert!(bridge.set_timeout(30).is_ok());
    }
}
