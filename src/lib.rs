/*!
# Overview
s3cleaner-rs lists and purges the contents of Amazon S3 (and S3-compatible)
buckets.

## Features
- **Complete listings**: every page of a listing is followed, for current
  objects or for every version and delete marker
- **Bounded parallel deletion**: one request per object through a worker pool,
  with per-item failure isolation and outcomes in input order
- **Safety**: dry-run mode, confirmation prompt, force flag
- **Library-First**: the `s3cleaner` CLI is a thin wrapper over this library

## As a Library

```toml
[dependencies]
s3cleaner-rs = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use s3cleaner_rs::config::args::parse_from_args;
use s3cleaner_rs::safety::SafetyChecker;
use s3cleaner_rs::{Cleaner, Config, create_pipeline_cancellation_token, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = vec!["s3cleaner", "--bucket", "my-bucket", "del", "--all", "--force"];

    let config = Config::try_from(parse_from_args(args)?).map_err(anyhow::Error::msg)?;
    let storage = storage::open(&config.client_config, config.rate_limit_objects).await?;
    let safety = SafetyChecker::new(&config);
    let cleaner = Cleaner::new(config, storage, create_pipeline_cancellation_token());

    let summary = cleaner
        .purge("my-bucket", &safety, &mut std::io::stdout())
        .await?;
    println!("{} deleted", summary.deleted);
    Ok(())
}
```
*/

pub mod cleaner;
pub mod config;
pub mod deleter;
pub mod lister;
pub mod report;
pub mod safety;
pub mod selection;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cleaner::Cleaner;
pub use config::Config;
pub use deleter::ObjectDeleter;
pub use lister::ObjectLister;
pub use report::{DeletionSummary, InventoryReport};
pub use types::error::{BatchAborted, S3cleanerError, exit_code_from_error, is_cancelled_error};
pub use types::token::{PipelineCancellationToken, create_pipeline_cancellation_token};
pub use types::{DeletionOutcome, ObjectRecord};
