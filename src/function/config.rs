// config.rs
use structopt::StructOpt;
use std::path::PathBuf;
use super::ScanError;

#[derive(Debug, StructOpt)]
pub struct Config {
    /// 目标存储桶名称 (例如: my-bucket)
    #[structopt(short, long)]
    pub bucket: Option<String>,

    /// 存储桶名称字典文件路径 (每行一个名称)
    #[structopt(short = "f", long)]
    pub bucket_file: Option<PathBuf>,

    /// 请求超时时间 (秒)
    #[structopt(long, default_value = "10")]
    pub timeout: u64,

    /// User-Agent 请求头
    #[structopt(long, default_value = "S3Scanner/1.0")]
    pub user_agent: String,

    /// 自定义存储服务端点 (例如: https://minio.example.com:9000)
    #[structopt(long)]
    pub endpoint: Option<String>,

    /// 代理服务器 (例如: http://localhost:8080)
    #[structopt(long)]
    pub proxy: Option<String>,

    /// 以JSON格式输出扫描报告
    #[structopt(long)]
    pub json: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), ScanError> {
        // 至少提供一个扫描目标
        if self.bucket.is_none() && self.bucket_file.is_none() {
            return Err(ScanError::InvalidConfig(
                "请通过--bucket或--bucket-file指定扫描目标".to_string(),
            ));
        }

        // 验证桶名非空
        if let Some(bucket) = &self.bucket {
            if bucket.trim().is_empty() {
                return Err(ScanError::InvalidConfig("存储桶名称不能为空。".to_string()));
            }
        }

        // 验证字典路径存在
        if let Some(file) = &self.bucket_file {
            if !file.exists() {
                return Err(ScanError::InvalidConfig("字典文件不存在。".to_string()));
            }
        }

        // 验证超时合理性
        if self.timeout == 0 {
            return Err(ScanError::InvalidConfig("超时时间必须大于0。".to_string()));
        }

        // 验证端点
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ScanError::InvalidConfig(
                    "端点URL必须以http://或https://开头".to_string(),
                ));
            }
        }

        // 验证代理
        if let Some(proxy) = &self.proxy {
            if !proxy.starts_with("http://") && !proxy.starts_with("https://") {
                return Err(ScanError::InvalidConfig(
                    "代理URL必须以http://或https://开头".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            bucket: Some("my-bucket".to_string()),
            bucket_file: None,
            timeout: 10,
            user_agent: "S3Scanner/1.0".to_string(),
            endpoint: None,
            proxy: None,
            json: false,
        }
    }

    #[test]
    fn validate_accepts_base_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_requires_a_target() {
        let mut config = base_config();
        config.bucket = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_bucket_name() {
        let mut config = base_config();
        config.bucket = Some("   ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = base_config();
        config.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_bucket_file() {
        let mut config = base_config();
        config.bucket = None;
        config.bucket_file = Some(PathBuf::from("/no/such/dictionary.txt"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_endpoint_without_scheme() {
        let mut config = base_config();
        config.endpoint = Some("minio.example.com:9000".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_endpoint_and_proxy_with_scheme() {
        let mut config = base_config();
        config.endpoint = Some("https://minio.example.com:9000".to_string());
        config.proxy = Some("http://localhost:8080".to_string());
        assert!(config.validate().is_ok());
    }
}
