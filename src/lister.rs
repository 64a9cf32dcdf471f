use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::report::InventoryReport;
use crate::storage::Storage;
use crate::types::error::S3cleanerError;
use crate::types::token::PipelineCancellationToken;
use crate::types::{ObjectRecord, PageToken};

/// Enumerates a bucket into a complete, ordered sequence of records.
///
/// Pages are fetched one after another until the service reports no further
/// pages. Records keep the service's order; within one version page, object
/// versions come before delete markers. A failure on any page discards the
/// pages already read.
///
/// # Example
///
/// ```no_run
/// # async fn example(storage: s3cleaner_rs::storage::Storage) -> anyhow::Result<()> {
/// use s3cleaner_rs::{ObjectLister, create_pipeline_cancellation_token};
///
/// let lister = ObjectLister::new(storage, 1000, create_pipeline_cancellation_token());
/// let report = lister.list("my-bucket", true).await?;
/// println!("{}", report.summary_line());
/// # Ok(())
/// # }
/// ```
pub struct ObjectLister {
    storage: Storage,
    max_keys: i32,
    cancellation_token: PipelineCancellationToken,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum ListingKind {
    Current,
    AllVersions,
}

impl ObjectLister {
    pub fn new(
        storage: Storage,
        max_keys: i32,
        cancellation_token: PipelineCancellationToken,
    ) -> Self {
        Self {
            storage,
            max_keys,
            cancellation_token,
        }
    }

    /// Every current object of `bucket`, without version ids.
    pub async fn list_current(&self, bucket: &str) -> Result<Vec<ObjectRecord>> {
        self.collect_pages(bucket, ListingKind::Current).await
    }

    /// Every version and delete marker of every key of `bucket`.
    ///
    /// `is_latest_version` is taken from the service as-is.
    pub async fn list_all_versions(&self, bucket: &str) -> Result<Vec<ObjectRecord>> {
        self.collect_pages(bucket, ListingKind::AllVersions).await
    }

    pub async fn list(&self, bucket: &str, include_all_versions: bool) -> Result<InventoryReport> {
        let records = if include_all_versions {
            self.list_all_versions(bucket).await?
        } else {
            self.list_current(bucket).await?
        };

        Ok(InventoryReport::new(bucket, records, include_all_versions))
    }

    async fn collect_pages(&self, bucket: &str, kind: ListingKind) -> Result<Vec<ObjectRecord>> {
        if bucket.is_empty() {
            return Err(anyhow!(S3cleanerError::InvalidConfig(
                "bucket name must not be empty.".to_string()
            )));
        }

        debug!(bucket = bucket, kind = ?kind, "listing has started.");

        let mut records = Vec::new();
        let mut token: Option<PageToken> = None;
        let mut pages: u64 = 0;

        loop {
            if self.cancellation_token.is_cancelled() {
                info!(bucket = bucket, "listing cancelled.");
                return Err(anyhow!(S3cleanerError::Cancelled));
            }

            let page = self
                .fetch_page(bucket, kind, token.clone())
                .await
                .with_context(|| S3cleanerError::List {
                    bucket: bucket.to_string(),
                })?;
            pages += 1;

            debug!(
                bucket = bucket,
                page = pages,
                records = page.records.len(),
                "listing page received."
            );
            records.extend(page.records);

            match page.next {
                None => break,
                Some(next) if token.as_ref() == Some(&next) => {
                    return Err(anyhow!("listing returned the same page token twice: {next:?}"))
                        .context(S3cleanerError::List {
                            bucket: bucket.to_string(),
                        });
                }
                Some(next) => token = Some(next),
            }
        }

        info!(
            bucket = bucket,
            pages = pages,
            total = records.len(),
            "listing has been completed."
        );

        Ok(records)
    }

    async fn fetch_page(
        &self,
        bucket: &str,
        kind: ListingKind,
        token: Option<PageToken>,
    ) -> Result<crate::types::ListPage> {
        match kind {
            ListingKind::Current => {
                let continuation_token = match token {
                    None => None,
                    Some(PageToken::Continuation(token)) => Some(token),
                    Some(other) => {
                        return Err(anyhow!(
                            "unexpected page token for an object listing: {other:?}"
                        ));
                    }
                };
                self.storage
                    .list_objects_page(bucket, continuation_token, self.max_keys)
                    .await
            }
            ListingKind::AllVersions => {
                self.storage
                    .list_object_versions_page(bucket, token, self.max_keys)
                    .await
            }
        }
    }
}
