pub mod config;
pub mod scanner;
pub mod report;
pub mod bridge;
pub mod error;

pub use self::config::Config;
pub use self::scanner::{run_scan, Scanner, ScannerConfig};
pub use self::report::{format_results, Permission, ScanOutcome};
pub use self::bridge::{BridgeResult, ScannerBridge};
pub use self::error::ScanError;
