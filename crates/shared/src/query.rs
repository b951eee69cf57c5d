use anyhow::{bail, Result};

use crate::interest::InterestFilter;
use crate::schedule::SubmissionWindow;

/// Compose the arXiv search expression for one query cycle.
///
/// When a previous run recorded a last-update stamp it supersedes the
/// computed window start, so repeated runs pick up strictly from the last
/// successful fetch instead of re-covering a recomputed lookback.
pub fn build_query(
    window: &SubmissionWindow,
    interests: &[InterestFilter],
    previous_last_update: Option<&str>,
) -> Result<String> {
    if interests.is_empty() {
        bail!("No interests configured. Run with --interests to add some.");
    }

    let start = match previous_last_update {
        Some(stamp) => stamp.to_string(),
        None => window.start_stamp(),
    };

    let clauses = interests
        .iter()
        .map(|i| format!("{}:\"{}\"", i.category.code(), i.query))
        .collect::<Vec<_>>()
        .join(" OR ");

    Ok(format!(
        "submittedDate:[{} TO {}] AND ({})",
        start,
        window.end_stamp(),
        clauses
    ))
}
