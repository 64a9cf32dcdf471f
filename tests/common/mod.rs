//! Shared E2E test infrastructure for s3cleaner-rs.
//!
//! `TestHelper` creates and tears down buckets against real AWS S3 and runs
//! the library's `ls` / `del` flows. Everything uses the
//! `s3cleaner-e2e-test` AWS profile.

#![allow(dead_code)]

use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration, Delete,
    ObjectIdentifier, VersioningConfiguration,
};
use s3cleaner_rs::config::args::build_config_from_args;
use s3cleaner_rs::safety::SafetyChecker;
use s3cleaner_rs::{
    Cleaner, Config, DeletionSummary, InventoryReport, create_pipeline_cancellation_token, storage,
};
use uuid::Uuid;

/// AWS profile used for all E2E tests.
const AWS_PROFILE: &str = "s3cleaner-e2e-test";

/// Used only when the profile carries no region.
const DEFAULT_REGION: &str = "us-east-1";

/// Default timeout for one E2E test.
pub const E2E_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

/// Deletes every version, every object and the bucket when dropped.
///
/// Needs a multi-threaded runtime (`#[tokio::test(flavor = "multi_thread")]`).
pub struct BucketGuard {
    helper: Arc<TestHelper>,
    bucket: String,
}

impl Drop for BucketGuard {
    fn drop(&mut self) {
        let helper = self.helper.clone();
        let bucket = self.bucket.clone();
        // The test may already be panicking; never panic twice.
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            tokio::task::block_in_place(|| {
                tokio::runtime::Handle::current().block_on(async move {
                    helper.delete_bucket_cascade(&bucket).await;
                });
            });
        }));
    }
}

/// Result of one `del` run.
#[derive(Debug)]
pub struct PurgeResult {
    pub summary: Option<DeletionSummary>,
    pub error: Option<anyhow::Error>,
    pub output: String,
}

pub struct TestHelper {
    client: Client,
    region: String,
}

impl TestHelper {
    pub async fn new() -> Arc<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(AWS_PROFILE)
            .load()
            .await;

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let client = Client::new(&sdk_config);

        Arc::new(Self { client, region })
    }

    pub fn bucket_guard(self: &Arc<Self>, bucket: &str) -> BucketGuard {
        BucketGuard {
            helper: Arc::clone(self),
            bucket: bucket.to_string(),
        }
    }

    /// `s3cleaner-e2e-<uuid>`, unique across parallel runs.
    pub fn generate_bucket_name(&self) -> String {
        format!("s3cleaner-e2e-{}", Uuid::new_v4())
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    pub async fn create_bucket(&self, bucket: &str) {
        let mut builder = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint.
        if self.region != "us-east-1" {
            let config = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build();
            builder = builder.create_bucket_configuration(config);
        }

        builder
            .send()
            .await
            .unwrap_or_else(|e| panic!("Failed to create bucket {bucket}: {e}"));
    }

    pub async fn create_versioned_bucket(&self, bucket: &str) {
        self.create_bucket(bucket).await;

        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .unwrap_or_else(|e| panic!("Failed to enable versioning on {bucket}: {e}"));
    }

    /// Removes every version and delete marker, then the bucket.
    pub async fn delete_bucket_cascade(&self, bucket: &str) {
        let versions = self.try_list_object_versions(bucket).await.unwrap_or_default();
        let identifiers: Vec<ObjectIdentifier> = versions
            .iter()
            .filter_map(|(key, version_id)| {
                ObjectIdentifier::builder()
                    .key(key.trim_start_matches(DELETE_MARKER_PREFIX))
                    .version_id(version_id)
                    .build()
                    .ok()
            })
            .collect();

        for chunk in identifiers.chunks(1000) {
            let Ok(delete) = Delete::builder()
                .set_objects(Some(chunk.to_vec()))
                .quiet(true)
                .build()
            else {
                continue;
            };
            let _ = self
                .client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await;
        }

        let _ = self.client.delete_bucket().bucket(bucket).send().await;
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    pub async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body.into())
            .send()
            .await
            .unwrap_or_else(|e| panic!("Failed to put object {key} in {bucket}: {e}"));
    }

    /// Uploads `count` small objects named `{prefix}{i:05}` concurrently.
    pub async fn put_numbered_objects(&self, bucket: &str, prefix: &str, count: usize) {
        let mut set = tokio::task::JoinSet::new();

        for i in 0..count {
            let client = self.client.clone();
            let bucket = bucket.to_string();
            let key = format!("{prefix}{i:05}");
            set.spawn(async move {
                client
                    .put_object()
                    .bucket(&bucket)
                    .key(&key)
                    .body(vec![b'x'; 16].into())
                    .send()
                    .await
                    .unwrap_or_else(|e| panic!("Failed to put object {key} in {bucket}: {e}"));
            });
        }

        while let Some(result) = set.join_next().await {
            result.expect("Upload task panicked");
        }
    }

    /// Current object keys of the bucket.
    pub async fn list_objects(&self, bucket: &str) -> Vec<String> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .unwrap_or_else(|e| panic!("Failed to list objects in {bucket}: {e}"));

            keys.extend(resp.contents().iter().filter_map(|o| o.key().map(String::from)));

            if resp.is_truncated() != Some(true) {
                break;
            }
            continuation_token = resp.next_continuation_token().map(String::from);
        }

        keys
    }

    /// `(key, version_id)` pairs; delete markers carry a `[delete-marker]`
    /// prefix on the key.
    pub async fn list_object_versions(&self, bucket: &str) -> Vec<(String, String)> {
        self.try_list_object_versions(bucket)
            .await
            .unwrap_or_else(|e| panic!("Failed to list object versions in {bucket}: {e}"))
    }

    async fn try_list_object_versions(&self, bucket: &str) -> anyhow::Result<Vec<(String, String)>> {
        let mut result = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_object_versions()
                .bucket(bucket)
                .set_key_marker(key_marker.take())
                .set_version_id_marker(version_id_marker.take())
                .send()
                .await?;

            for v in resp.versions() {
                if let (Some(key), Some(vid)) = (v.key(), v.version_id()) {
                    result.push((key.to_string(), vid.to_string()));
                }
            }
            for m in resp.delete_markers() {
                if let (Some(key), Some(vid)) = (m.key(), m.version_id()) {
                    result.push((format!("{DELETE_MARKER_PREFIX}{key}"), vid.to_string()));
                }
            }

            if resp.is_truncated() != Some(true) {
                break;
            }
            key_marker = resp.next_key_marker().map(String::from);
            version_id_marker = resp.next_version_id_marker().map(String::from);
        }

        Ok(result)
    }

    // -----------------------------------------------------------------------
    // s3cleaner runs
    // -----------------------------------------------------------------------

    /// Builds a `Config` from CLI-style arguments, prepending the binary name
    /// and appending `--profile s3cleaner-e2e-test` and the helper's region
    /// unless given.
    pub fn build_config(&self, args: Vec<&str>) -> Config {
        let mut full_args: Vec<String> = vec!["s3cleaner".to_string()];
        full_args.extend(args.iter().map(|s| s.to_string()));

        if !full_args.iter().any(|a| a == "--profile" || a == "-p") {
            full_args.push("--profile".to_string());
            full_args.push(AWS_PROFILE.to_string());
        }
        if !full_args.iter().any(|a| a == "--region" || a == "-r") {
            full_args.push("--region".to_string());
            full_args.push(self.region.clone());
        }

        build_config_from_args(full_args)
            .unwrap_or_else(|e| panic!("Failed to build config from args: {e}"))
    }

    async fn cleaner(config: Config) -> Cleaner {
        let storage = storage::open(&config.client_config, config.rate_limit_objects)
            .await
            .unwrap_or_else(|e| panic!("Failed to open storage: {e:#}"));
        Cleaner::new(config, storage, create_pipeline_cancellation_token())
    }

    pub async fn run_list(config: Config) -> (InventoryReport, String) {
        let bucket = config.bucket.clone().expect("e2e runs name a bucket");
        let cleaner = Self::cleaner(config).await;

        let mut out = Vec::new();
        let report = cleaner
            .list(&bucket, &mut out)
            .await
            .unwrap_or_else(|e| panic!("Listing {bucket} failed: {e:#}"));

        (report, String::from_utf8(out).unwrap())
    }

    /// Runs `del`. Without `--force` the stdio prompt would block, so callers
    /// pass `--force` or `--dry-run`.
    pub async fn run_purge(config: Config) -> PurgeResult {
        let bucket = config.bucket.clone().expect("e2e runs name a bucket");
        let safety = SafetyChecker::new(&config);
        let cleaner = Self::cleaner(config).await;

        let mut out = Vec::new();
        let result = cleaner.purge(&bucket, &safety, &mut out).await;
        let output = String::from_utf8(out).unwrap();

        match result {
            Ok(summary) => PurgeResult {
                summary: Some(summary),
                error: None,
                output,
            },
            Err(e) => PurgeResult {
                summary: None,
                error: Some(e),
                output,
            },
        }
    }
}

pub const DELETE_MARKER_PREFIX: &str = "[delete-marker]";

/// Wraps an async E2E test body with [`E2E_TIMEOUT`].
#[macro_export]
macro_rules! e2e_timeout {
    ($body:expr) => {
        tokio::time::timeout(common::E2E_TIMEOUT, $body)
            .await
            .expect("E2E test timed out")
    };
}
