//! Resolution of symbolic base references

use crate::error::{GitSourceError, RevisionError, TraversalError};
use crate::git::provider::HistoryProvider;

/// Prefixes tried, in order, when resolving a short reference name
const REVISION_PREFIXES: [&str; 3] = ["", "refs/heads/", "refs/remotes/origin/"];

/// Resolve a branch, tag, short name or sha to a commit sha
///
/// Tries `base` as given, then as a local branch, then as a branch of `origin`.
/// Any failure other than "reference not found" is returned immediately.
pub fn resolve_base<P>(repo: &P, base: &str) -> Result<String, GitSourceError>
where
    P: HistoryProvider + ?Sized,
{
    for prefix in REVISION_PREFIXES {
        let revision = format!("{}{}", prefix, base);
        match repo.resolve_revision(&revision) {
            Ok(sha) => return Ok(sha),
            Err(RevisionError::NotFound(_)) => continue,
            Err(RevisionError::Failed(reason)) => {
                return Err(TraversalError::RevisionFailed { revision, reason }.into());
            }
        }
    }

    Err(TraversalError::NoBaseRefs(base.to_string()).into())
}
