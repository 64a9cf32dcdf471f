//! Shared test utilities for the s3cleaner library crate.
//!
//! Provides the in-memory [`MockStorage`] backend used by the lister,
//! deleter and safety tests, plus small record builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::storage::{Storage, StorageTrait};
use crate::types::error::S3cleanerError;
use crate::types::{DeleteObjectResult, ListPage, ObjectRecord, PageToken};

/// Initialise a dummy tracing subscriber for tests.
///
/// Uses `try_init` so that only the first call in a process actually
/// installs the subscriber; subsequent calls are silently ignored.
pub(crate) fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

pub(crate) fn test_timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

/// A current (unversioned) record.
pub(crate) fn make_record(key: &str) -> ObjectRecord {
    ObjectRecord::current(key, test_timestamp(1_597_329_209), 10).unwrap()
}

/// A versioned record.
pub(crate) fn make_version(key: &str, version_id: &str, is_latest: bool) -> ObjectRecord {
    ObjectRecord::version(key, version_id, is_latest, test_timestamp(1_597_397_676), 10).unwrap()
}

/// Records of delete_object calls made to the mock.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DeleteObjectCall {
    pub bucket: String,
    pub key: String,
    pub version_id: Option<String>,
}

/// A paged, in-memory storage backend.
///
/// Page `i` hands out the token `page-{i+1}` unless it is the last page.
#[derive(Clone, Default)]
pub(crate) struct MockStorage {
    current_pages: Arc<Vec<Vec<ObjectRecord>>>,
    version_pages: Arc<Vec<Vec<ObjectRecord>>>,
    buckets: Arc<Vec<String>>,
    /// Listing fails when this page index is requested.
    list_error_at_page: Option<usize>,
    /// Every page claims a next page with the same token.
    stuck_token: bool,
    /// delete_object fails for these keys with the given error.
    delete_errors: Arc<HashMap<String, S3cleanerError>>,
    /// delete_object sleeps this long for the given key.
    delete_delays: Arc<HashMap<String, u64>>,
    versioned_bucket: bool,
    pub delete_object_calls: Arc<Mutex<Vec<DeleteObjectCall>>>,
    pub list_page_calls: Arc<AtomicUsize>,
    pub list_buckets_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl MockStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_current_pages(mut self, pages: Vec<Vec<ObjectRecord>>) -> Self {
        self.current_pages = Arc::new(pages);
        self
    }

    pub(crate) fn with_version_pages(mut self, pages: Vec<Vec<ObjectRecord>>) -> Self {
        self.version_pages = Arc::new(pages);
        self
    }

    pub(crate) fn with_buckets(mut self, buckets: &[&str]) -> Self {
        self.buckets = Arc::new(buckets.iter().map(|b| b.to_string()).collect());
        self
    }

    pub(crate) fn failing_list_at_page(mut self, page: usize) -> Self {
        self.list_error_at_page = Some(page);
        self
    }

    pub(crate) fn with_stuck_token(mut self) -> Self {
        self.stuck_token = true;
        self
    }

    pub(crate) fn failing_delete(mut self, key: &str, error: S3cleanerError) -> Self {
        Arc::make_mut(&mut self.delete_errors).insert(key.to_string(), error);
        self
    }

    pub(crate) fn with_delete_delay(mut self, key: &str, millis: u64) -> Self {
        Arc::make_mut(&mut self.delete_delays).insert(key.to_string(), millis);
        self
    }

    /// Unversioned deletes report a created delete marker.
    pub(crate) fn versioned(mut self) -> Self {
        self.versioned_bucket = true;
        self
    }

    pub(crate) fn boxed(&self) -> Storage {
        Box::new(self.clone())
    }

    pub(crate) fn deleted_keys(&self) -> Vec<(String, Option<String>)> {
        self.delete_object_calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| (call.key.clone(), call.version_id.clone()))
            .collect()
    }

    pub(crate) fn delete_call_count(&self) -> usize {
        self.delete_object_calls.lock().unwrap().len()
    }

    fn page_index(&self, token: Option<&str>) -> Result<usize> {
        match token {
            None => Ok(0),
            Some("stuck") => Ok(0),
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|index| index.parse().ok())
                .ok_or_else(|| anyhow!("unknown page token: {token}")),
        }
    }

    fn serve_page(
        &self,
        pages: &[Vec<ObjectRecord>],
        index: usize,
        make_token: impl Fn(String) -> PageToken,
    ) -> Result<ListPage> {
        self.list_page_calls.fetch_add(1, Ordering::SeqCst);

        if self.list_error_at_page == Some(index) {
            return Err(anyhow!("AccessDenied: Access Denied"));
        }

        let records = pages.get(index).cloned().unwrap_or_default();
        let next = if self.stuck_token {
            Some(make_token("stuck".to_string()))
        } else if index + 1 < pages.len() {
            Some(make_token(format!("page-{}", index + 1)))
        } else {
            None
        };

        Ok(ListPage { records, next })
    }
}

#[async_trait]
impl StorageTrait for MockStorage {
    async fn list_objects_page(
        &self,
        _bucket: &str,
        continuation_token: Option<String>,
        _max_keys: i32,
    ) -> Result<ListPage> {
        let index = self.page_index(continuation_token.as_deref())?;
        self.serve_page(&self.current_pages, index, PageToken::Continuation)
    }

    async fn list_object_versions_page(
        &self,
        _bucket: &str,
        marker: Option<PageToken>,
        _max_keys: i32,
    ) -> Result<ListPage> {
        let index = match marker {
            None => 0,
            Some(PageToken::VersionMarker { ref key_marker, .. }) => {
                self.page_index(Some(key_marker))?
            }
            Some(other) => return Err(anyhow!("unexpected marker: {other:?}")),
        };
        self.serve_page(&self.version_pages, index, |token| {
            PageToken::VersionMarker {
                key_marker: token,
                version_id_marker: None,
            }
        })
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<String>,
    ) -> Result<DeleteObjectResult> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        self.delete_object_calls
            .lock()
            .unwrap()
            .push(DeleteObjectCall {
                bucket: bucket.to_string(),
                key: key.to_string(),
                version_id: version_id.clone(),
            });

        let delay = self.delete_delays.get(key).copied().unwrap_or(1);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.delete_errors.get(key) {
            return Err(anyhow!(error.clone()));
        }

        let delete_marker_created = self.versioned_bucket && version_id.is_none();
        Ok(DeleteObjectResult {
            delete_marker_created,
            version_id: if delete_marker_created {
                Some(format!("marker-of-{key}"))
            } else {
                version_id
            },
        })
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        self.list_buckets_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.buckets.as_ref().clone())
    }
}
