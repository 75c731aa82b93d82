//! core::naming
//!
//! Release branch naming rules.
//!
//! A stable branch is named after the version being released, which is the
//! project's current snapshot version with the snapshot marker removed.

/// Marker carried by pre-release (snapshot) version strings.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Namespace every stable branch lives under.
pub const STABLE_PREFIX: &str = "stable/";

/// Derive the stable branch name from a snapshot version.
///
/// Every occurrence of [`SNAPSHOT_SUFFIX`] is removed, not only a trailing
/// one, and the result is prefixed with [`STABLE_PREFIX`]. Removal repeats
/// until no marker is left, so a marker assembled by an earlier removal
/// (`"-SNAP-SNAPSHOTSHOT"`) is stripped too. The function is total: an
/// empty version yields `"stable/"`.
///
/// # Example
///
/// ```
/// use stablecut::core::naming::stable_branch_name;
///
/// assert_eq!(stable_branch_name("1.4.0-SNAPSHOT"), "stable/1.4.0");
/// assert_eq!(stable_branch_name("2.1.0"), "stable/2.1.0");
/// assert_eq!(stable_branch_name(""), "stable/");
/// ```
pub fn stable_branch_name(current_snapshot: &str) -> String {
    let mut version = current_snapshot.replace(SNAPSHOT_SUFFIX, "");
    // Each pass strictly shortens the string, so this terminates.
    while version.contains(SNAPSHOT_SUFFIX) {
        version = version.replace(SNAPSHOT_SUFFIX, "");
    }
    format!("{STABLE_PREFIX}{version}")
}
