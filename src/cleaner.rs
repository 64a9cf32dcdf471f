//! The `ls` and `del` flows on top of the lister, the deleter and the
//! confirmation gate.

use std::io::Write;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::deleter::ObjectDeleter;
use crate::lister::ObjectLister;
use crate::report::{DeletionSummary, InventoryReport};
use crate::safety::{Approval, SafetyChecker};
use crate::selection::Selector;
use crate::storage::Storage;
use crate::types::DeletionOutcome;
use crate::types::error::S3cleanerError;
use crate::types::token::PipelineCancellationToken;

/// Runs inventories and purges against one storage connection.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> anyhow::Result<()> {
/// use s3cleaner_rs::{Cleaner, Config, create_pipeline_cancellation_token, storage};
///
/// let config = Config::for_bucket("my-bucket");
/// let storage = storage::open(&config.client_config, config.rate_limit_objects).await?;
/// let cleaner = Cleaner::new(config, storage, create_pipeline_cancellation_token());
///
/// let report = cleaner.inventory("my-bucket").await?;
/// println!("{}", report.summary_line());
/// # Ok(())
/// # }
/// ```
pub struct Cleaner {
    config: Config,
    storage: Storage,
    cancellation_token: PipelineCancellationToken,
}

impl Cleaner {
    pub fn new(
        config: Config,
        storage: Storage,
        cancellation_token: PipelineCancellationToken,
    ) -> Self {
        Self {
            config,
            storage,
            cancellation_token,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configured bucket, or one picked from `list_buckets()`.
    pub async fn resolve_bucket(&self, selector: &dyn Selector) -> Result<String> {
        if let Some(bucket) = self.config.bucket.as_ref().filter(|b| !b.is_empty()) {
            return Ok(bucket.clone());
        }

        let buckets = self.storage.list_buckets().await?;
        if buckets.is_empty() {
            return Err(anyhow!(S3cleanerError::InvalidConfig(
                "no bucket is accessible with these credentials.".to_string()
            )));
        }

        let label = format!("Buckets: {}", buckets.len());
        let bucket = selector.select_one(&label, &buckets)?;
        debug!(bucket = bucket, "bucket selected.");

        Ok(bucket)
    }

    pub async fn inventory(&self, bucket: &str) -> Result<InventoryReport> {
        ObjectLister::new(
            self.storage.clone(),
            self.config.max_keys,
            self.cancellation_token.clone(),
        )
        .list(bucket, self.config.include_all_versions)
        .await
    }

    /// `ls`: enumerates `bucket` and writes the listing to `out`.
    pub async fn list<W: Write>(&self, bucket: &str, out: &mut W) -> Result<InventoryReport> {
        let report = self.inventory(bucket).await?;
        report.write_listing(out)?;
        Ok(report)
    }

    /// `del`: enumerates `bucket`, writes the plan, asks `safety` and
    /// deletes everything that was listed.
    ///
    /// Errors with `Cancelled` when the operator declines, `PartialFailure`
    /// when some items failed (also when a cancelled batch already had
    /// failures), and [`BatchAborted`](crate::BatchAborted) when the batch
    /// stopped early. Failure lines and the summary are written in
    /// every case where deletion started.
    pub async fn purge<W: Write>(
        &self,
        bucket: &str,
        safety: &SafetyChecker,
        out: &mut W,
    ) -> Result<DeletionSummary> {
        let report = self.inventory(bucket).await?;
        report.write_deletion_plan(out)?;
        out.flush()?;

        if report.is_empty() {
            info!(bucket = bucket, "nothing to delete.");
            return Ok(DeletionSummary::default());
        }

        if safety.check_before_deletion()? == Approval::DryRun {
            writeln!(
                out,
                "Dry run: {} items would be deleted from bucket {bucket}",
                report.total()
            )?;
            return Ok(DeletionSummary::default());
        }

        let deleter = ObjectDeleter::new(
            self.storage.clone(),
            self.config.worker_size,
            self.cancellation_token.clone(),
        );

        match deleter.delete_all(bucket, report.records()).await {
            Ok(outcomes) => {
                let summary = write_outcomes(bucket, &outcomes, out)?;
                summary.into_result()
            }
            Err(aborted) => {
                let summary = write_outcomes(bucket, &aborted.completed, out)?;
                // Items that failed before Ctrl-C still make the run a partial failure.
                if aborted.cause == S3cleanerError::Cancelled && summary.has_failures() {
                    warn!(
                        bucket = bucket,
                        failed = summary.failed,
                        "deletion cancelled after some items failed."
                    );
                    summary.into_result()?;
                }
                Err(anyhow!(aborted))
            }
        }
    }
}

fn write_outcomes<W: Write>(
    bucket: &str,
    outcomes: &[DeletionOutcome],
    out: &mut W,
) -> Result<DeletionSummary> {
    for outcome in outcomes.iter().filter(|o| !o.succeeded) {
        writeln!(out, "{}", DeletionSummary::failure_line(outcome))?;
    }

    let summary = DeletionSummary::from_outcomes(outcomes);
    writeln!(out, "{}", summary.summary_line(bucket))?;

    Ok(summary)
}
