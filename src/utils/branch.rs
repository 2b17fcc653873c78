//! Branch reference normalization.
//!
//! Providers such as Azure Repos address branches by full ref name
//! (`refs/heads/main`) while the uniform interface exposes short names
//! (`main`).

/// Prefix of fully qualified branch references.
pub const BRANCH_PREFIX: &str = "refs/heads/";

/// Adds the `refs/heads/` prefix unless the name already carries it.
///
/// # Example
///
/// ```
/// use vcsclient::utils::add_branch_prefix;
///
/// assert_eq!(add_branch_prefix("main"), "refs/heads/main");
/// assert_eq!(add_branch_prefix("refs/heads/main"), "refs/heads/main");
/// ```
#[must_use]
pub fn add_branch_prefix(branch: &str) -> String {
    if branch.starts_with(BRANCH_PREFIX) {
        branch.to_string()
    } else {
        format!("{BRANCH_PREFIX}{}", branch.trim_start_matches('/'))
    }
}

/// Strips a leading `refs/heads/`, leaving other refs untouched.
///
/// # Example
///
/// ```
/// use vcsclient::utils::strip_branch_prefix;
///
/// assert_eq!(strip_branch_prefix("refs/heads/feature/x"), "feature/x");
/// assert_eq!(strip_branch_prefix("refs/tags/v1"), "refs/tags/v1");
/// ```
#[inline]
#[must_use]
pub fn strip_branch_prefix(reference: &str) -> &str {
    reference.strip_prefix(BRANCH_PREFIX).unwrap_or(reference)
}
