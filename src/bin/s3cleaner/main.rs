use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, trace};

use s3cleaner_rs::config::args::CLIArgs;
use s3cleaner_rs::config::profiles::resolve_profile;
use s3cleaner_rs::config::{Config, Operation};
use s3cleaner_rs::safety::SafetyChecker;
use s3cleaner_rs::types::S3Credentials;
use s3cleaner_rs::{
    Cleaner, create_pipeline_cancellation_token, exit_code_from_error, is_cancelled_error, storage,
};

mod ctrl_c_handler;
mod selector;
mod tracing_init;
mod version;

use selector::StdioSelector;

/// s3cleaner - list and purge objects of an Amazon S3 bucket.
///
/// A thin wrapper over the s3cleaner-rs library.
#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    let config = load_config_exit_if_err();

    start_tracing_if_necessary(&config);

    trace!("config = {:?}", config);

    if let Err(e) = run(config).await {
        if is_cancelled_error(&e) {
            debug!("operation cancelled by user.");
            return;
        }

        error!("{e:#}");
        std::process::exit(exit_code_from_error(&e));
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn load_config_exit_if_err() -> Config {
    match Config::try_from(CLIArgs::parse()) {
        Ok(config) => config,
        Err(error_message) => {
            clap::Error::raw(clap::error::ErrorKind::ValueValidation, error_message).exit()
        }
    }
}

fn start_tracing_if_necessary(config: &Config) -> bool {
    let Some(tracing_config) = config.tracing_config.as_ref() else {
        return false;
    };

    tracing_init::init_tracing(tracing_config);
    true
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn run(mut config: Config) -> Result<()> {
    if config.operation == Operation::Version {
        println!("{}", version::version_json()?);
        return Ok(());
    }

    if matches!(config.client_config.credential, S3Credentials::FromEnvironment) {
        let profile = resolve_profile(
            None,
            config
                .client_config
                .client_config_location
                .aws_config_file
                .as_deref(),
            &StdioSelector,
        )
        .await?;
        config.client_config.credential = S3Credentials::from_profile(&profile);
    }

    let cancellation_token = create_pipeline_cancellation_token();
    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    let storage = storage::open(&config.client_config, config.rate_limit_objects).await?;
    let safety = SafetyChecker::new(&config);
    let cleaner = Cleaner::new(config, storage, cancellation_token);

    let bucket = cleaner.resolve_bucket(&StdioSelector).await?;

    let start_time = tokio::time::Instant::now();
    let mut stdout = std::io::stdout();

    match cleaner.config().operation {
        Operation::List => {
            cleaner.list(&bucket, &mut stdout).await?;
        }
        Operation::Delete => {
            cleaner.purge(&bucket, &safety, &mut stdout).await?;
        }
        Operation::Version => {}
    }

    debug!(
        duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32()),
        "s3cleaner has been completed."
    );

    Ok(())
}
