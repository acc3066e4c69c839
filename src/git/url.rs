//! Remote URL helpers: credential stripping and browsable links

use crate::error::TraversalError;
use regex::Regex;
use std::sync::LazyLock;
use url::{ParseError, Url};

/// `user@host:path`, the scp-like form git accepts for SSH remotes
static SCP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._~-]+@[A-Za-z0-9.-]+:").expect("scp-like pattern is valid")
});

/// Whether the remote uses the scp-like SSH short form
pub fn is_scp_like(remote: &str) -> bool {
    !remote.contains("://") && SCP_LIKE.is_match(remote)
}

/// Remove any embedded user-info from a remote URL
///
/// scp-like SSH remotes carry no password and are returned unchanged, as are
/// plain filesystem paths (a remote cloned from a local directory). Anything
/// else must parse as a URL.
pub fn sanitize_url(remote: &str) -> Result<String, TraversalError> {
    if is_scp_like(remote) {
        return Ok(remote.to_string());
    }

    let mut parsed = match Url::parse(remote) {
        Ok(parsed) => parsed,
        Err(ParseError::RelativeUrlWithoutBase) => return Ok(remote.to_string()),
        Err(e) => return Err(TraversalError::SanitizeFailed(e.to_string())),
    };

    if parsed.has_host() {
        parsed
            .set_password(None)
            .and_then(|_| parsed.set_username(""))
            .map_err(|_| {
                TraversalError::SanitizeFailed("user info cannot be removed".to_string())
            })?;
    }

    Ok(parsed.to_string())
}

/// Craft a link to a file at a commit on common git hosts (GitHub/GitLab)
///
/// An empty `file` links to the commit itself. Bitbucket only supports commit links.
pub fn generate_link(repo: &str, commit: &str, file: &str) -> String {
    let base = repo.strip_suffix(".git").unwrap_or(repo);

    if repo.contains("bitbucket.org/") {
        return format!("{}/commits/{}", base, commit);
    }

    if file.is_empty() {
        format!("{}/commit/{}", base, commit)
    } else {
        format!("{}/blob/{}/{}", base, commit, file)
    }
}
