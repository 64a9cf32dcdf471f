//! Deletion executor.
//!
//! [`ObjectDeleter`] issues one delete request per record through a bounded
//! pool of tasks and returns one outcome per record, in input order. A
//! failing item never stops the batch; lost credentials and cancellation do.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::storage::Storage;
use crate::types::error::{BatchAborted, S3cleanerError};
use crate::types::token::PipelineCancellationToken;
use crate::types::{DeleteObjectResult, DeletionOutcome, ObjectRecord};


const UNKNOWN_ERROR_CODE: &str = "N/A";

/// Deletes a batch of records with at most `worker_size` requests in flight.
///
/// # Example
///
/// ```no_run
/// # async fn example(storage: s3cleaner_rs::storage::Storage, records: Vec<s3cleaner_rs::ObjectRecord>) {
/// use s3cleaner_rs::{ObjectDeleter, create_pipeline_cancellation_token};
///
/// let deleter = ObjectDeleter::new(storage, 10, create_pipeline_cancellation_token());
/// match deleter.delete_all("my-bucket", &records).await {
///     Ok(outcomes) => println!("{} attempted", outcomes.len()),
///     Err(aborted) => eprintln!("{aborted}"),
/// }
/// # }
/// ```
pub struct ObjectDeleter {
    storage: Storage,
    worker_size: u16,
    cancellation_token: PipelineCancellationToken,
}

impl ObjectDeleter {
    pub fn new(
        storage: Storage,
        worker_size: u16,
        cancellation_token: PipelineCancellationToken,
    ) -> Self {
        Self {
            storage,
            worker_size: worker_size.max(1),
            cancellation_token,
        }
    }

    /// Deletes every record of `items` from `bucket`.
    ///
    /// Records with a version id remove exactly that version; records without
    /// one remove the current object (a delete marker on versioned buckets).
    /// Not-found responses count as success.
    ///
    /// On `ConnectionLost` or cancellation no further requests start,
    /// in-flight requests finish, and the outcomes collected so far are
    /// returned inside [`BatchAborted`].
    pub async fn delete_all(
        &self,
        bucket: &str,
        items: &[ObjectRecord],
    ) -> Result<Vec<DeletionOutcome>, BatchAborted> {
        if items.is_empty() {
            debug!(bucket = bucket, "nothing to delete.");
            return Ok(vec![]);
        }

        info!(
            bucket = bucket,
            count = items.len(),
            worker_size = self.worker_size,
            "deletion has started."
        );

        let semaphore = Arc::new(Semaphore::new(self.worker_size as usize));
        // Cancelled by Ctrl-C (through the parent) or by a worker that lost
        // its credentials.
        let abort_token = self.cancellation_token.child_token();

        let mut join_set = JoinSet::new();
        let mut task_indices = HashMap::new();
        let mut slots: Vec<Option<DeletionOutcome>> = vec![None; items.len()];

        for (index, record) in items.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = abort_token.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                break;
            };

            let storage = self.storage.clone();
            let task_token = abort_token.clone();
            let bucket = bucket.to_string();
            let record = record.clone();

            let handle = join_set.spawn(async move {
                if task_token.is_cancelled() {
                    return (index, None);
                }

                debug!(
                    key = record.key(),
                    version_id = record.version_id(),
                    "sending DeleteObject request."
                );
                let result = storage
                    .delete_object(&bucket, record.key(), record.version_id().map(String::from))
                    .await;
                let outcome = outcome_from_result(&record, result);

                if outcome
                    .error
                    .as_ref()
                    .is_some_and(S3cleanerError::is_fatal_for_batch)
                {
                    task_token.cancel();
                }
                drop(permit);

                (index, Some(outcome))
            });
            task_indices.insert(handle.id(), index);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((_, (index, outcome))) => slots[index] = outcome,
                Err(e) => {
                    let Some(&index) = task_indices.get(&e.id()) else {
                        error!(error = %e, "delete task failed for an unknown item.");
                        continue;
                    };
                    error!(key = items[index].key(), error = %e, "delete task failed.");
                    slots[index] = Some(DeletionOutcome::failed(
                        &items[index],
                        S3cleanerError::DeleteItem {
                            code: UNKNOWN_ERROR_CODE.to_string(),
                            message: format!("delete task failed: {e}"),
                        },
                    ));
                }
            }
        }

        let fatal_error = slots.iter().flatten().find_map(|outcome| {
            outcome
                .error
                .as_ref()
                .filter(|error| error.is_fatal_for_batch())
                .cloned()
        });
        let attempted_all = slots.iter().all(Option::is_some);
        let outcomes: Vec<DeletionOutcome> = slots.into_iter().flatten().collect();

        if let Some(cause) = fatal_error {
            error!(
                bucket = bucket,
                attempted = outcomes.len(),
                total = items.len(),
                cause = %cause,
                "deletion batch aborted."
            );
            return Err(BatchAborted {
                cause,
                completed: outcomes,
            });
        }

        if !attempted_all {
            warn!(
                bucket = bucket,
                attempted = outcomes.len(),
                total = items.len(),
                "deletion cancelled."
            );
            return Err(BatchAborted {
                cause: S3cleanerError::Cancelled,
                completed: outcomes,
            });
        }

        let failed = outcomes.iter().filter(|o| !o.succeeded).count();
        info!(
            bucket = bucket,
            deleted = outcomes.len() - failed,
            failed = failed,
            "deletion has been completed."
        );

        Ok(outcomes)
    }
}

fn outcome_from_result(record: &ObjectRecord, result: Result<DeleteObjectResult>) -> DeletionOutcome {
    match result {
        Ok(deleted) => {
            debug!(
                key = record.key(),
                version_id = record.version_id(),
                delete_marker_created = deleted.delete_marker_created,
                "DeleteObject succeeded."
            );
            DeletionOutcome::deleted(record, &deleted)
        }
        Err(e) => {
            let error = e
                .downcast_ref::<S3cleanerError>()
                .cloned()
                .unwrap_or_else(|| S3cleanerError::DeleteItem {
                    code: UNKNOWN_ERROR_CODE.to_string(),
                    message: format!("{e:#}"),
                });

            if error.is_not_found() {
                debug!(
                    key = record.key(),
                    version_id = record.version_id(),
                    "object already absent."
                );
                return DeletionOutcome::already_absent(record);
            }

            warn!(
                key = record.key(),
                version_id = record.version_id(),
                error = %error,
                "failed to delete object."
            );
            DeletionOutcome::failed(record, error)
        }
    }
}
