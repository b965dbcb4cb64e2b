// scanner.rs
use super::{Config, ScanError};
use super::report::{format_results, Permission, ReportConfig, ScanOutcome, ScanReport};
use reqwest::Client;
use std::fs;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle};
use chrono::Local;
use tokio::sync::{mpsc, Semaphore};

// 批量扫描的并发探测上限
pub const MAX_CONCURRENT_SCANS: usize = 20;

pub const DEFAULT_USER_AGENT: &str = "S3Scanner/1.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// 同一命名空间的两种寻址方式,按固定顺序尝试
const VIRTUAL_HOST_TEMPLATE: &str = "https://{bucket}.s3.amazonaws.com";
const PATH_STYLE_TEMPLATE: &str = "https://s3.amazonaws.com/{bucket}";

// 会话级扫描配置,每次探测开始时取快照,改动只影响之后开始的探测
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub endpoints: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            endpoints: vec![
                VIRTUAL_HOST_TEMPLATE.to_string(),
                PATH_STYLE_TEMPLATE.to_string(),
            ],
        }
    }
}

impl ScannerConfig {
    // 按模板展开候选URL
    pub fn candidate_urls(&self, bucket_name: &str) -> Vec<String> {
        self.endpoints
            .iter()
            .map(|template| template.replace("{bucket}", bucket_name))
            .collect()
    }
}

// 从自定义端点推导两种寻址方式的模板
pub fn endpoint_templates(endpoint: &str) -> Vec<String> {
    let trimmed = endpoint.trim_end_matches('/');
    let (scheme, host) = trimmed.split_once("://").unwrap_or(("https", trimmed));
    vec![
        format!("{}://{{bucket}}.{}", scheme, host),
        format!("{}://{}/{{bucket}}", scheme, host),
    ]
}

// 状态码到权限分类的映射
fn classify_status(status: u16) -> (bool, Permission) {
    match status {
        200 => (true, Permission::Read),
        403 => (false, Permission::Forbidden),
        404 => (false, Permission::NotFound),
        code => (false, Permission::Unknown(code)),
    }
}

#[derive(Clone)]
pub struct Scanner {
    client: Client,
    config: Arc<RwLock<ScannerConfig>>,
}

impl Scanner {
    pub fn new() -> Result<Self, ScanError> {
        Self::with_config(ScannerConfig::default(), None)
    }

    pub fn with_config(config: ScannerConfig, proxy: Option<&str>) -> Result<Self, ScanError> {
        Ok(Scanner {
            client: build_client(proxy)?,
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub fn set_user_agent(&self, user_agent: &str) {
        self.config.write().unwrap().user_agent = user_agent.to_string();
    }

    pub fn set_timeout_secs(&self, seconds: u64) -> Result<(), ScanError> {
        if seconds == 0 {
            return Err(ScanError::InvalidConfig("超时时间必须大于0。".to_string()));
        }
        self.config.write().unwrap().timeout = Duration::from_secs(seconds);
        Ok(())
    }

    // 探测单个存储桶是否公开可读
    pub async fn scan_bucket(&self, bucket_name: &str) -> ScanOutcome {
        // 取配置快照,两个候选共用同一份
        let config = self.config.read().unwrap().clone();
        let start_time = Instant::now();
        let mut outcome = ScanOutcome::new(bucket_name);

        for url in config.candidate_urls(bucket_name) {
            match self
                .client
                .get(&url)
                .header("User-Agent", &config.user_agent)
                .timeout(config.timeout)
                .send()
                .await
            {
                Ok(response) => {
                    let (is_public, permission) = classify_status(response.status().as_u16());
                    outcome.is_public = is_public;
                    outcome.permission = permission;
                    // 收到HTTP响应即为定论,覆盖先前候选的传输错误
                    outcome.error = None;
                    break;
                }
                Err(e) => {
                    // 传输失败,记下错误后回退到下一候选
                    outcome.error = Some(ScanError::from(e).to_string());
                }
            }
        }

        outcome.elapsed_ms = start_time.elapsed().as_millis() as u64;
        outcome
    }

    // 并发扫描多个存储桶,结果按完成顺序返回
    pub async fn scan_buckets(&self, bucket_names: Vec<String>) -> Vec<ScanOutcome> {
        self.scan_buckets_with_progress(bucket_names, None).await
    }

    pub async fn scan_buckets_with_progress(
        &self,
        bucket_names: Vec<String>,
        progress: Option<ProgressBar>,
    ) -> Vec<ScanOutcome> {
        if bucket_names.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_SCANS));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = Vec::with_capacity(bucket_names.len());

        for bucket_name in bucket_names {
            let scanner = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();

            tasks.push(tokio::spawn(async move {
                // 先占并发槽位,探测结束随permit一起释放
                let _permit = semaphore.acquire().await.unwrap();
                let outcome = scanner.scan_bucket(&bucket_name).await;
                let _ = tx.send(outcome);
            }));
        }
        drop(tx);

        // 单点收集,全部发送端关闭后退出
        let mut results = Vec::with_capacity(tasks.len());
        while let Some(outcome) = rx.recv().await {
            if let Some(pb) = &progress {
                pb.set_message(format!("已完成: {}", outcome.bucket_name));
                pb.inc(1);
            }
            results.push(outcome);
        }

        // 等待全部任务退出后才返回
        futures::future::join_all(tasks).await;

        results
    }
}

fn build_client(proxy: Option<&str>) -> Result<Client, ScanError> {
    let mut client_builder = Client::builder();

    // 配置代理
    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ScanError::InvalidConfig(format!("代理配置错误: {}", e)))?;
        client_builder = client_builder.proxy(proxy);
    }

    // 创建客户端,进程内共享连接池
    let client = client_builder
        .build()
        .map_err(|e| ScanError::ClientError(format!("创建HTTP客户端失败: {}", e)))?;

    Ok(client)
}

pub async fn run_scan(config: Config) -> Result<Vec<ScanOutcome>, ScanError> {
    // 验证配置
    config.validate()?;

    println!("正在初始化扫描...");

    // 初始化扫描器
    let mut scanner_config = ScannerConfig::default();
    scanner_config.user_agent = config.user_agent.clone();
    scanner_config.timeout = Duration::from_secs(config.timeout);
    if let Some(endpoint) = &config.endpoint {
        scanner_config.endpoints = endpoint_templates(endpoint);
    }
    let scanner = Scanner::with_config(scanner_config, config.proxy.as_deref())?;

    // 加载目标
    let targets = load_targets(&config)?;
    let target_count = targets.len();
    println!("已加载 {} 个存储桶名称", target_count);

    let overall_start = Instant::now();

    // 单目标直接探测,批量走并发调度
    let outcomes = if target_count == 1 {
        vec![scanner.scan_bucket(&targets[0]).await]
    } else {
        let pb = ProgressBar::new(target_count as u64);
        pb.set_style(ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"));

        let outcomes = scanner
            .scan_buckets_with_progress(targets, Some(pb.clone()))
            .await;
        pb.finish_with_message("扫描完成");
        outcomes
    };

    // 生成报告
    let report = ScanReport {
        public_count: outcomes.iter().filter(|o| o.is_public).count(),
        error_count: outcomes.iter().filter(|o| o.error.is_some()).count(),
        scan_timestamp: Local::now().to_string(),
        scan_duration_ms: overall_start.elapsed().as_millis() as u64,
        scan_config: ReportConfig {
            targets_scanned: target_count,
        },
        results: outcomes,
    };

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_results(&report.results));
        print_summary(&report);
    }

    Ok(report.results)
}

fn load_targets(config: &Config) -> Result<Vec<String>, ScanError> {
    let mut targets = Vec::new();

    if let Some(bucket) = &config.bucket {
        targets.push(bucket.trim().to_string());
    }

    // 从字典文件加载名称
    if let Some(file) = &config.bucket_file {
        let names = fs::read_to_string(file)
            .map_err(|e| ScanError::IOError(format!("无法读取字典文件: {}", e)))?
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();

        targets.extend(names);
    }

    // 确保目标列表不为空
    if targets.is_empty() {
        return Err(ScanError::InvalidConfig("目标列表为空".into()));
    }

    Ok(targets)
}

fn print_summary(report: &ScanReport) {
    println!("\n=== 扫描摘要 ===");
    println!("扫描目标数: {}", report.scan_config.targets_scanned);
    println!("扫描耗时: {}ms", report.scan_duration_ms);
    println!("扫描时间戳: {}", report.scan_timestamp);

    // 状态统计
    let forbidden_count = report
        .results
        .iter()
        .filter(|o| o.permission == Permission::Forbidden)
        .count();
    let not_found_count = report
        .results
        .iter()
        .filter(|o| o.permission == Permission::NotFound)
        .count();

    println!("\n状态统计:");
    println!("  - 公开可读: {}", report.public_count);
    println!("  - 403禁止访问: {}", forbidden_count);
    println!("  - 404不存在: {}", not_found_count);
    println!("  - 探测失败: {}", report.error_count);

    // 公开存储桶列表
    let public_buckets: Vec<_> = report.results.iter().filter(|o| o.is_public).collect();
    if !public_buckets.is_empty() {
        println!("\n公开存储桶 ({}项):", public_buckets.len());
        for (i, outcome) in public_buckets.iter().enumerate().take(10) {
            println!("  {}. {}", i + 1, outcome.bucket_name);
        }
        if public_buckets.len() > 10 {
            println!("  ... 等 {} 项", public_buckets.len() - 10);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_status_matches_contract() {
        assert_eq!(classify_status(200), (true, Permission::Read));
        assert_eq!(classify_status(403), (false, Permission::Forbidden));
        assert_eq!(classify_status(404), (false, Permission::NotFound));
        assert_eq!(classify_status(451), (false, Permission::Unknown(451)));
        assert_eq!(classify_status(500), (false, Permission::Unknown(500)));
    }

    #[test]
    fn candidate_urls_follow_fixed_order() {
        let config = ScannerConfig::default();
        let urls = config.candidate_urls("my-bucket");
        assert_eq!(
            urls,
            vec![
                "https://my-bucket.s3.amazonaws.com".to_string(),
                "https://s3.amazonaws.com/my-bucket".to_string(),
            ]
        );
    }

    #[test]
    fn endpoint_templates_derive_both_conventions() {
        let templates = endpoint_templates("https://minio.example.com:9000/");
        assert_eq!(
            templates,
            vec![
                "https://{bucket}.minio.example.com:9000".to_string(),
                "https://minio.example.com:9000/{bucket}".to_string(),
            ]
        );
    }

    #[test]
    fn endpoint_templates_default_to_https() {
        let templates = endpoint_templates("storage.internal");
        assert_eq!(templates[0], "https://{bucket}.storage.internal");
        assert_eq!(templates[1], "https://storage.internal/{bucket}");
    }

    #[test]
    fn set_timeout_rejects_zero() {
        let scanner = Scanner::new().unwrap();
        assert!(scanner.set_timeout_secs(0).is_err());
        assert!(scanner.set_timeout_secs(5).is_ok());
    }
}
