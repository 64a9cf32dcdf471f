pub mod client_builder;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::list_object_versions::ListObjectVersionsOutput;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use leaky_bucket::RateLimiter;
use std::sync::Arc;

use crate::storage::{Storage, StorageTrait};
use crate::types::error::S3cleanerError;
use crate::types::{DeleteObjectResult, ListPage, ObjectRecord, PageToken};

/// Error codes meaning the session's credentials no longer work.
const CONNECTION_LOST_ERROR_CODES: &[&str] = &[
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidAccessKeyId",
    "InvalidToken",
    "SignatureDoesNotMatch",
    "TokenRefreshRequired",
];

/// Extracts the S3 error code and message from an AWS SDK error.
///
/// For service errors (S3 API responses), returns the S3 error code
/// (e.g. "AccessDenied", "NoSuchKey") and the human-readable error
/// message from the response. For other error types (network, timeout,
/// construction failure), returns "N/A" as the code and the full error
/// description as the message.
fn extract_sdk_error_details<E: std::fmt::Display + ProvideErrorMetadata>(
    e: &SdkError<E>,
) -> (String, String) {
    if let Some(service_err) = e.as_service_error() {
        (
            service_err.code().unwrap_or("unknown").to_string(),
            service_err.message().unwrap_or("no message").to_string(),
        )
    } else {
        ("N/A".to_string(), e.to_string())
    }
}

/// Maps a failed delete request onto the error taxonomy.
///
/// Credential errors end the batch; everything else stays per-object.
pub fn classify_delete_error(code: String, message: String) -> S3cleanerError {
    if CONNECTION_LOST_ERROR_CODES.contains(&code.as_str()) {
        S3cleanerError::ConnectionLost(format!("{code}: {message}"))
    } else {
        S3cleanerError::DeleteItem { code, message }
    }
}

fn classify_sdk_delete_error<E: std::fmt::Display + ProvideErrorMetadata>(
    e: &SdkError<E>,
) -> S3cleanerError {
    let (code, message) = extract_sdk_error_details(e);

    // Requests fail to build when no credentials can be resolved for signing.
    if matches!(e, SdkError::ConstructionFailure(_)) {
        return S3cleanerError::ConnectionLost(message);
    }

    classify_delete_error(code, message)
}

/// Turns one ListObjectsV2 response into a page.
pub fn page_from_list_objects_output(output: &ListObjectsV2Output) -> Result<ListPage> {
    let records = output
        .contents()
        .iter()
        .map(ObjectRecord::try_from)
        .collect::<Result<Vec<_>>>()?;

    let next = if output.is_truncated() == Some(true) {
        let token = output
            .next_continuation_token()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                anyhow!("ListObjectsV2 reported a truncated page without a continuation token.")
            })?;
        Some(PageToken::Continuation(token.to_string()))
    } else {
        None
    };

    Ok(ListPage { records, next })
}

/// Turns one ListObjectVersions response into a page: versions first, then
/// delete markers.
pub fn page_from_list_object_versions_output(
    output: &ListObjectVersionsOutput,
) -> Result<ListPage> {
    let mut records = output
        .versions()
        .iter()
        .map(ObjectRecord::try_from)
        .collect::<Result<Vec<_>>>()?;
    for marker in output.delete_markers() {
        records.push(ObjectRecord::try_from(marker)?);
    }

    let next = if output.is_truncated() == Some(true) {
        let key_marker = output
            .next_key_marker()
            .filter(|marker| !marker.is_empty())
            .ok_or_else(|| {
                anyhow!("ListObjectVersions reported a truncated page without a key marker.")
            })?;
        Some(PageToken::VersionMarker {
            key_marker: key_marker.to_string(),
            version_id_marker: output.next_version_id_marker().map(String::from),
        })
    } else {
        None
    };

    Ok(ListPage { records, next })
}

/// S3 storage backed by the AWS SDK.
#[derive(Clone)]
pub struct S3Storage {
    client: Arc<Client>,
    rate_limit_objects_per_sec: Option<Arc<RateLimiter>>,
}

impl S3Storage {
    pub fn boxed(client: Client, rate_limit_objects_per_sec: Option<Arc<RateLimiter>>) -> Storage {
        Box::new(S3Storage {
            client: Arc::new(client),
            rate_limit_objects_per_sec,
        })
    }

    /// Acquires one token when a rate limit is configured.
    async fn exec_rate_limit_objects_per_sec(&self) {
        if let Some(ref rate_limiter) = self.rate_limit_objects_per_sec {
            rate_limiter.acquire_one().await;
        }
    }
}

#[async_trait]
impl StorageTrait for S3Storage {
    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ListPage> {
        self.exec_rate_limit_objects_per_sec().await;

        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token)
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = bucket,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 ListObjectsV2 API call failed for bucket '{}': {} ({}).",
                    bucket,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow!(e).context("aws_sdk_s3::client::list_objects_v2() failed.")
            })?;

        page_from_list_objects_output(&output)
    }

    async fn list_object_versions_page(
        &self,
        bucket: &str,
        marker: Option<PageToken>,
        max_keys: i32,
    ) -> Result<ListPage> {
        self.exec_rate_limit_objects_per_sec().await;

        let (key_marker, version_id_marker) = match marker {
            Some(PageToken::VersionMarker {
                key_marker,
                version_id_marker,
            }) => (Some(key_marker), version_id_marker),
            Some(PageToken::Continuation(token)) => {
                return Err(anyhow!(
                    "a continuation token ({token}) cannot resume a version listing."
                ));
            }
            None => (None, None),
        };

        let output = self
            .client
            .list_object_versions()
            .bucket(bucket)
            .set_key_marker(key_marker)
            .set_version_id_marker(version_id_marker)
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = bucket,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 ListObjectVersions API call failed for bucket '{}': {} ({}).",
                    bucket,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow!(e).context("aws_sdk_s3::client::list_object_versions() failed.")
            })?;

        page_from_list_object_versions_output(&output)
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<String>,
    ) -> Result<DeleteObjectResult> {
        self.exec_rate_limit_objects_per_sec().await;

        let output = self
            .client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .set_version_id(version_id.clone())
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::warn!(
                    bucket = bucket,
                    key = key,
                    version_id = version_id,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 DeleteObject API call failed for s3://{}/{}: {} ({}).",
                    bucket,
                    key,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow!(classify_sdk_delete_error(&e))
            })?;

        Ok(DeleteObjectResult {
            delete_marker_created: output.delete_marker() == Some(true),
            version_id: output.version_id().map(String::from),
        })
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let mut buckets = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_buckets()
                .set_continuation_token(continuation_token.clone())
                .send()
                .await
                .map_err(|e| {
                    let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                    tracing::error!(
                        s3_error_code = s3_error_code,
                        s3_error_message = s3_error_message,
                        "S3 ListBuckets API call failed: {} ({}).",
                        s3_error_code,
                        s3_error_message,
                    );
                    anyhow!(e).context("aws_sdk_s3::client::list_buckets() failed.")
                })?;

            buckets.extend(
                output
                    .buckets()
                    .iter()
                    .filter_map(|bucket| bucket.name().map(String::from)),
            );

            match output.continuation_token().filter(|token| !token.is_empty()) {
                Some(token) if continuation_token.as_deref() != Some(token) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(buckets)
    }
}

/// Resolves credentials once so a bad profile or key pair fails up front.
pub async fn verify_credentials(sdk_config: &aws_config::SdkConfig) -> Result<()> {
    use aws_credential_types::provider::ProvideCredentials;

    let provider = sdk_config
        .credentials_provider()
        .ok_or_else(|| anyhow!("no credentials provider is configured."))?;

    provider
        .provide_credentials()
        .await
        .context("failed to resolve AWS credentials.")?;

    Ok(())
}
