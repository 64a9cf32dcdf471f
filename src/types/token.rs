/// A cancellation token used to stop an enumeration or a deletion batch.
///
/// Call [`cancel()`](tokio_util::sync::CancellationToken::cancel) on it
/// (e.g. from a Ctrl-C handler): listing stops before the next page and the
/// deleter starts no new requests, letting in-flight ones finish.
pub type PipelineCancellationToken = tokio_util::sync::CancellationToken;

/// Create a new [`PipelineCancellationToken`].
///
/// # Example
///
/// ```
/// use s3cleaner_rs::create_pipeline_cancellation_token;
///
/// let token = create_pipeline_cancellation_token();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
pub fn create_pipeline_cancellation_token() -> PipelineCancellationToken {
    tokio_util::sync::CancellationToken::new()
}
