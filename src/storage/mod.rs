use anyhow::{Result, anyhow};
use async_trait::async_trait;
use dyn_clone::DynClone;
use leaky_bucket::RateLimiter;
use std::sync::Arc;
use tracing::debug;

use crate::config::ClientConfig;
use crate::types::error::S3cleanerError;
use crate::types::{DeleteObjectResult, ListPage, PageToken};

pub mod s3;

/// Type alias for a boxed Storage trait object.
pub type Storage = Box<dyn StorageTrait + Send + Sync>;

/// Authenticated access to one endpoint and region.
///
/// The lister and deleter only ever see this trait; the AWS implementation
/// lives in [`s3::S3Storage`] and tests plug in in-memory fakes.
#[async_trait]
pub trait StorageTrait: DynClone {
    /// Fetches one page of current objects.
    ///
    /// `next` of the returned page is `None` when the service reports no
    /// further pages.
    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ListPage>;

    /// Fetches one page of object versions and delete markers.
    async fn list_object_versions_page(
        &self,
        bucket: &str,
        marker: Option<PageToken>,
        max_keys: i32,
    ) -> Result<ListPage>;

    /// Deletes one object, or one exact version when `version_id` is given.
    ///
    /// Failures carry an [`S3cleanerError::DeleteItem`] or
    /// [`S3cleanerError::ConnectionLost`].
    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<String>,
    ) -> Result<DeleteObjectResult>;

    /// Names of every bucket visible to the connection.
    async fn list_buckets(&self) -> Result<Vec<String>>;
}

dyn_clone::clone_trait_object!(StorageTrait);

// Default refill interval 100ms
const REFILL_PER_INTERVAL_DIVIDER: usize = 10;

/// Builds the objects-per-second limiter shared by listing and deletion.
pub fn create_rate_limiter(rate_limit_objects: Option<u32>) -> Option<Arc<RateLimiter>> {
    rate_limit_objects.map(|rate_limit_value| {
        let refill = if (rate_limit_value as usize) <= REFILL_PER_INTERVAL_DIVIDER {
            1
        } else {
            rate_limit_value as usize / REFILL_PER_INTERVAL_DIVIDER
        };
        Arc::new(
            RateLimiter::builder()
                .max(rate_limit_value as usize)
                .initial(rate_limit_value as usize)
                .refill(refill)
                .fair(true)
                .build(),
        )
    })
}

/// Opens a connection: loads the SDK configuration and resolves credentials
/// once. Any failure is an [`S3cleanerError::Auth`].
///
/// # Example
///
/// ```no_run
/// # async fn example() -> anyhow::Result<()> {
/// use s3cleaner_rs::Config;
/// use s3cleaner_rs::storage;
///
/// let config = Config::for_bucket("my-bucket");
/// let storage = storage::open(&config.client_config, config.rate_limit_objects).await?;
/// let buckets = storage.list_buckets().await?;
/// # Ok(())
/// # }
/// ```
pub async fn open(
    client_config: &ClientConfig,
    rate_limit_objects: Option<u32>,
) -> Result<Storage> {
    if client_config.region.is_empty() {
        return Err(anyhow!(S3cleanerError::InvalidConfig(
            "region must not be empty.".to_string()
        )));
    }

    let sdk_config = client_config.load_sdk_config().await;
    if let Err(e) = s3::verify_credentials(&sdk_config).await {
        return Err(anyhow!(S3cleanerError::Auth(format!("{e:#}"))));
    }

    debug!(
        region = client_config.region,
        endpoint_url = client_config.endpoint_url,
        "connection opened."
    );

    let client = client_config.create_client(&sdk_config);
    Ok(s3::S3Storage::boxed(
        client,
        create_rate_limiter(rate_limit_objects),
    ))
}
