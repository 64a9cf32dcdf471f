pub mod args;
pub mod profiles;

use crate::types::{ClientConfigLocation, S3Credentials};

pub const DEFAULT_REGION: &str = "eu-west-1";
pub const DEFAULT_WORKER_SIZE: u16 = 10;
pub const DEFAULT_MAX_KEYS: i32 = 1000;

/// Which operation the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Delete,
    Version,
}

/// Main configuration for an inventory / purge run.
///
/// # Quick Start
///
/// ```
/// use s3cleaner_rs::Config;
///
/// let config = Config::for_bucket("my-bucket");
/// assert_eq!(config.worker_size, 10);
/// assert_eq!(config.client_config.region, "eu-west-1");
/// assert!(config.force);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub operation: Operation,
    /// `None` means the binary asks the operator to pick one.
    pub bucket: Option<String>,
    pub include_all_versions: bool,
    pub client_config: ClientConfig,
    pub tracing_config: Option<TracingConfig>,
    pub worker_size: u16,
    pub max_keys: i32,
    pub rate_limit_objects: Option<u32>,
    pub dry_run: bool,
    pub force: bool,
}

impl Config {
    /// A configuration for library use against one bucket.
    ///
    /// `force` is set so no interactive confirmation is expected.
    pub fn for_bucket(bucket: &str) -> Self {
        Config {
            bucket: Some(bucket.to_string()),
            force: true,
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            operation: Operation::List,
            bucket: None,
            include_all_versions: false,
            client_config: ClientConfig::default(),
            tracing_config: None,
            worker_size: DEFAULT_WORKER_SIZE,
            max_keys: DEFAULT_MAX_KEYS,
            rate_limit_objects: None,
            dry_run: false,
            force: false,
        }
    }
}

/// AWS S3 client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_config_location: ClientConfigLocation,
    pub credential: S3Credentials,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub retry_config: RetryConfig,
    pub cli_timeout_config: CLITimeoutConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            client_config_location: ClientConfigLocation::default(),
            credential: S3Credentials::FromEnvironment,
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
            force_path_style: false,
            retry_config: RetryConfig::default(),
            cli_timeout_config: CLITimeoutConfig::default(),
        }
    }
}

/// Retry configuration handed to the AWS SDK.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            aws_max_attempts: 10,
            initial_backoff_milliseconds: 100,
        }
    }
}

/// Timeout configuration handed to the AWS SDK.
#[derive(Debug, Clone, Default)]
pub struct CLITimeoutConfig {
    pub operation_timeout_milliseconds: Option<u64>,
    pub operation_attempt_timeout_milliseconds: Option<u64>,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

/// Tracing (logging) configuration.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}
