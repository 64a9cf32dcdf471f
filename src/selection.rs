use anyhow::Result;

/// Picks one entry out of a list of candidates (a profile or a bucket).
///
/// The engine never talks to a terminal itself; the binary injects a
/// stdin/stdout implementation and tests inject canned answers.
pub trait Selector: Send + Sync {
    /// Returns the chosen candidate.
    ///
    /// Implementations return `S3cleanerError::Cancelled` when the operator
    /// aborts the selection.
    fn select_one(&self, label: &str, candidates: &[String]) -> Result<String>;
}

/// Case-insensitive substring search over candidates, preserving order.
///
/// An empty query matches everything.
pub fn filter_candidates<'a>(candidates: &'a [String], query: &str) -> Vec<&'a String> {
    let query = query.to_lowercase();
    candidates
        .iter()
        .filter(|candidate| candidate.to_lowercase().contains(&query))
        .collect()
}
