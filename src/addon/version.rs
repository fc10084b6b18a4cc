//! Extension version comparison.

use semver::Version;

// Accepts `v1.12.0` and short forms such as `1.12`.
fn parse(version: &str) -> Option<Version> {
    let v = version.trim();
    let v = v.strip_prefix('v').unwrap_or(v);
    Version::parse(v)
        .or_else(|_| Version::parse(&format!("{v}.0")))
        .ok()
}

/// Whether moving from `installed` to `requested` is a downgrade.
///
/// Versions are compared as semver when both parse, otherwise as plain
/// strings.
pub fn is_downgrade(requested: &str, installed: &str) -> bool {
    match (parse(requested), parse(installed)) {
        (Some(requested), Some(installed)) => requested < installed,
        _ => requested < installed,
    }
}
