use s3cleaner_rs::PipelineCancellationToken;
use tokio::task::JoinHandle;
use tokio::{select, signal};
use tracing::{debug, warn};

/// Cancels `cancellation_token` on Ctrl-C. Listing stops before its next page
/// and a running batch lets in-flight deletes finish.
pub fn spawn_ctrl_c_handler(cancellation_token: PipelineCancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        select! {
            _ = cancellation_token.cancelled() => {
                debug!("cancellation_token canceled.")
            }
            _ = signal::ctrl_c() => {
                warn!("ctrl-c received, stopping after in-flight requests.");
                cancellation_token.cancel();
            }
        }
    })
}
