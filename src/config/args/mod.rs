use crate::config::{
    CLITimeoutConfig, ClientConfig, Config, DEFAULT_MAX_KEYS, DEFAULT_REGION, DEFAULT_WORKER_SIZE,
    Operation, RetryConfig, TracingConfig,
};
use crate::types::{AccessKeys, ClientConfigLocation, S3Credentials};
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::ffi::OsString;
use std::path::PathBuf;


const DEFAULT_AWS_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_ALL_VERSIONS: bool = false;
const DEFAULT_DRY_RUN: bool = false;
const DEFAULT_FORCE: bool = false;

const MAX_KEYS_LIMIT: i32 = 1000;

const ERROR_MESSAGE_WORKER_SIZE_ZERO: &str = "Worker size must be at least 1.";
const ERROR_MESSAGE_MAX_KEYS_OUT_OF_RANGE: &str = "Max keys must be between 1 and 1000.";
const ERROR_MESSAGE_RATE_LIMIT_ZERO: &str = "Rate limit must be at least 1 object per second.";
const ERROR_MESSAGE_SECRET_KEY_REQUIRED: &str =
    "--secret-key is required when --access-key is specified.";

/// s3cleaner - list and purge objects of an Amazon S3 bucket.
///
/// s3cleaner lists objects (optionally every object version) of a bucket
/// and removes them after confirmation.
///
/// Example:
///   s3cleaner ls -b my-bucket
///   s3cleaner ls -a -b my-bucket
///   s3cleaner -p dev del -a -b my-bucket
#[derive(Parser, Clone, Debug)]
#[command(name = "s3cleaner", version, about, long_about = None)]
pub struct CLIArgs {
    #[command(subcommand)]
    pub command: Command,

    // -----------------------------------------------------------------------
    // Target
    // -----------------------------------------------------------------------
    /// Use a specific profile from your AWS credential file.
    #[arg(short = 'p', long, global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "Target")]
    pub profile: Option<String>,

    /// The region to use. Overrides config/env settings.
    #[arg(short = 'r', long, global = true, default_value = DEFAULT_REGION, value_parser = NonEmptyStringValueParser::new(), help_heading = "Target")]
    pub region: String,

    /// The bucket name to use. Prompts for one when omitted.
    #[arg(short = 'b', long, global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "Target")]
    pub bucket: Option<String>,

    // -----------------------------------------------------------------------
    // Performance
    // -----------------------------------------------------------------------
    /// Max keys per listing request (page size, 1-1000).
    #[arg(long, env, global = true, default_value_t = DEFAULT_MAX_KEYS, help_heading = "Performance")]
    pub max_keys: i32,

    /// Maximum listing pages and delete requests per second.
    #[arg(long, env, global = true, help_heading = "Performance")]
    pub rate_limit_objects: Option<u32>,

    // -----------------------------------------------------------------------
    // Logging
    // -----------------------------------------------------------------------
    /// Verbosity level. -q (quiet), default (normal), -v, -vv, -vvv.
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Output logs in JSON format.
    #[arg(long, env, global = true, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Logging")]
    pub json_tracing: bool,

    /// Enable AWS SDK tracing.
    #[arg(long, env, global = true, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Logging")]
    pub aws_sdk_tracing: bool,

    /// Enable tracing span events.
    #[arg(long, env, global = true, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Logging")]
    pub span_events_tracing: bool,

    /// Disable colored output in logs.
    #[arg(long, env, global = true, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Logging")]
    pub disable_color_tracing: bool,

    // -----------------------------------------------------------------------
    // Retry
    // -----------------------------------------------------------------------
    /// Maximum retry attempts for AWS SDK operations.
    #[arg(long, env, global = true, default_value_t = DEFAULT_AWS_MAX_ATTEMPTS, help_heading = "Retry")]
    pub aws_max_attempts: u32,

    /// Initial backoff in milliseconds for SDK retries.
    #[arg(long, env, global = true, default_value_t = DEFAULT_INITIAL_BACKOFF_MILLISECONDS, help_heading = "Retry")]
    pub initial_backoff_milliseconds: u64,

    // -----------------------------------------------------------------------
    // Timeout
    // -----------------------------------------------------------------------
    /// Overall operation timeout in milliseconds.
    #[arg(long, env, global = true, help_heading = "Timeout")]
    pub operation_timeout_milliseconds: Option<u64>,

    /// Per-attempt operation timeout in milliseconds.
    #[arg(long, env, global = true, help_heading = "Timeout")]
    pub operation_attempt_timeout_milliseconds: Option<u64>,

    /// Connection timeout in milliseconds.
    #[arg(long, env, global = true, help_heading = "Timeout")]
    pub connect_timeout_milliseconds: Option<u64>,

    /// Read timeout in milliseconds.
    #[arg(long, env, global = true, help_heading = "Timeout")]
    pub read_timeout_milliseconds: Option<u64>,

    // -----------------------------------------------------------------------
    // AWS
    // -----------------------------------------------------------------------
    /// AWS config file path.
    #[arg(long, env, global = true, help_heading = "AWS")]
    pub aws_config_file: Option<PathBuf>,

    /// AWS shared credentials file path.
    #[arg(long, env, global = true, help_heading = "AWS")]
    pub aws_shared_credentials_file: Option<PathBuf>,

    /// AWS access key ID. Takes precedence over profiles.
    #[arg(long, env = "S3CLEANER_ACCESS_KEY", global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub access_key: Option<String>,

    /// AWS secret access key.
    #[arg(long, env = "S3CLEANER_SECRET_KEY", global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub secret_key: Option<String>,

    /// AWS session token.
    #[arg(long, env = "S3CLEANER_SESSION_TOKEN", global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub session_token: Option<String>,

    /// Custom S3-compatible endpoint URL (e.g. MinIO).
    #[arg(long, env, global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub endpoint_url: Option<String>,

    /// Force path-style access (required for some S3-compatible services).
    #[arg(long, env, global = true, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "AWS")]
    pub force_path_style: bool,
}

/// The fixed set of operations the binary offers.
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// List S3 objects of a specified bucket.
    #[command(long_about = r#"List S3 objects of a specified bucket.

EXAMPLES:
  s3cleaner ls -b mybucket
      Name:          prefix/test.txt
      Last modified: 2020-08-13 14:33:29 UTC

      Found 1 items in bucket mybucket

  s3cleaner ls -a -b mybucket
      Name:          test.txt (Latest Version) - Version ID: a0RyXDUUC1qbrDzsZFyUhUJ8mxTiBEPb
      Last modified: 2020-08-14 09:34:36 UTC

      Found 1 versions in bucket mybucket"#)]
    Ls(LsArgs),

    /// Delete S3 objects of a specified bucket.
    Del(DelArgs),

    /// Display the version of this tool as JSON.
    Version,
}

#[derive(Args, Clone, Debug)]
pub struct LsArgs {
    /// All object versions are also included.
    #[arg(short = 'a', long = "all", default_value_t = DEFAULT_ALL_VERSIONS)]
    pub all_versions: bool,
}

#[derive(Args, Clone, Debug)]
pub struct DelArgs {
    /// All object versions (and delete markers) are deleted permanently.
    #[arg(short = 'a', long = "all", default_value_t = DEFAULT_ALL_VERSIONS)]
    pub all_versions: bool,

    /// List what would be deleted without deleting anything.
    #[arg(short = 'd', long, env, default_value_t = DEFAULT_DRY_RUN)]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(short = 'f', long, env, default_value_t = DEFAULT_FORCE)]
    pub force: bool,

    /// Number of concurrent delete requests.
    #[arg(long, env, default_value_t = DEFAULT_WORKER_SIZE)]
    pub worker_size: u16,
}

/// Parse command-line arguments into a `CLIArgs` struct.
///
/// # Example
///
/// ```
/// use s3cleaner_rs::config::args::{Command, parse_from_args};
///
/// let args = vec!["s3cleaner", "ls", "-a", "-b", "my-bucket"];
/// let cli_args = parse_from_args(args).unwrap();
/// assert!(matches!(cli_args.command, Command::Ls(ref ls) if ls.all_versions));
/// ```
pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

/// Parse arguments and build a Config in one step.
pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    Config::try_from(cli_args)
}

impl CLIArgs {
    fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_KEYS_LIMIT).contains(&self.max_keys) {
            return Err(ERROR_MESSAGE_MAX_KEYS_OUT_OF_RANGE.to_string());
        }
        if self.rate_limit_objects == Some(0) {
            return Err(ERROR_MESSAGE_RATE_LIMIT_ZERO.to_string());
        }
        if self.access_key.is_some() && self.secret_key.is_none() {
            return Err(ERROR_MESSAGE_SECRET_KEY_REQUIRED.to_string());
        }
        if let Command::Del(ref del) = self.command {
            if del.worker_size == 0 {
                return Err(ERROR_MESSAGE_WORKER_SIZE_ZERO.to_string());
            }
        }
        Ok(())
    }

    fn build_client_config(&self) -> ClientConfig {
        let credential = if let Some(ref access_key) = self.access_key {
            S3Credentials::Credentials {
                access_keys: AccessKeys {
                    access_key: access_key.clone(),
                    secret_access_key: self.secret_key.clone().unwrap_or_default(),
                    session_token: self.session_token.clone(),
                },
            }
        } else if let Some(ref profile) = self.profile {
            S3Credentials::Profile(profile.clone())
        } else {
            S3Credentials::FromEnvironment
        };

        ClientConfig {
            client_config_location: ClientConfigLocation {
                aws_config_file: self.aws_config_file.clone(),
                aws_shared_credentials_file: self.aws_shared_credentials_file.clone(),
            },
            credential,
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
            force_path_style: self.force_path_style,
            retry_config: RetryConfig {
                aws_max_attempts: self.aws_max_attempts,
                initial_backoff_milliseconds: self.initial_backoff_milliseconds,
            },
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: self.operation_timeout_milliseconds,
                operation_attempt_timeout_milliseconds: self.operation_attempt_timeout_milliseconds,
                connect_timeout_milliseconds: self.connect_timeout_milliseconds,
                read_timeout_milliseconds: self.read_timeout_milliseconds,
            },
        }
    }

    fn build_tracing_config(&self) -> Option<TracingConfig> {
        let log_level = self.verbosity.log_level()?;

        Some(TracingConfig {
            tracing_level: log_level,
            json_tracing: self.json_tracing,
            aws_sdk_tracing: self.aws_sdk_tracing,
            span_events_tracing: self.span_events_tracing,
            disable_color_tracing: self.disable_color_tracing,
        })
    }
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(args: CLIArgs) -> Result<Self, Self::Error> {
        args.validate()?;

        let client_config = args.build_client_config();
        let tracing_config = args.build_tracing_config();

        let mut config = Config {
            bucket: args.bucket.clone(),
            client_config,
            tracing_config,
            max_keys: args.max_keys,
            rate_limit_objects: args.rate_limit_objects,
            ..Config::default()
        };

        match args.command {
            Command::Ls(ls) => {
                config.operation = Operation::List;
                config.include_all_versions = ls.all_versions;
            }
            Command::Del(del) => {
                config.operation = Operation::Delete;
                config.include_all_versions = del.all_versions;
                config.dry_run = del.dry_run;
                config.force = del.force;
                config.worker_size = del.worker_size;
            }
            Command::Version => {
                config.operation = Operation::Version;
            }
        }

        Ok(config)
    }
}
