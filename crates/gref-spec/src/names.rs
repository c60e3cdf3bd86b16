//! Validation for the two sides of a refspec.
//!
//! Each side is a reference name pattern following git's ref-format rules:
//! - Must be non-empty and must not be exactly `@`
//! - Must not contain whitespace, control characters, `~`, `^`, `:`, `?`,
//!   `[`, `\`
//! - Must not contain `..` or `@{`
//! - Must not start or end with `/`, and must not end with `.`
//! - Must not contain consecutive slashes (`//`)
//! - Components must not start with `.` or end with `.lock`
//! - May contain at most one `*` wildcard
//!
//! Short names such as `main` or `HEAD` are accepted; refspecs commonly use
//! them on the remote side.

use crate::error::{RefSpecError, Result};

/// Characters that are forbidden anywhere in a pattern.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '[', '\\'];

/// The wildcard character.
pub const WILDCARD: char = '*';

/// Validate a single refspec side, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use gref_spec::names::validate_pattern;
///
/// assert!(validate_pattern("refs/heads/*").is_ok());
/// assert!(validate_pattern("main").is_ok());
/// assert!(validate_pattern("refs/*/heads/*").is_err());
/// assert!(validate_pattern("refs/heads/a..b").is_err());
/// ```
pub fn validate_pattern(pattern: &str) -> Result<()> {
    check_pattern(pattern).map_err(|reason| RefSpecError::malformed(pattern, reason))
}

/// Returns `true` if the pattern contains a wildcard.
pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains(WILDCARD)
}

pub(crate) fn check_pattern(pattern: &str) -> std::result::Result<(), String> {
    if pattern.is_empty() {
        return Err("pattern must not be empty".into());
    }

    if pattern == "@" {
        return Err("'@' alone is not a valid name".into());
    }

    if let Some(ch) = pattern
        .chars()
        .find(|c| c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(format!("contains forbidden character: {ch:?}"));
    }

    if pattern.matches(WILDCARD).count() > 1 {
        return Err("at most one '*' wildcard is allowed".into());
    }

    if pattern.contains("..") {
        return Err("must not contain '..'".into());
    }

    if pattern.contains("@{") {
        return Err("must not contain '@{'".into());
    }

    if pattern.starts_with('/') || pattern.ends_with('/') {
        return Err("must not start or end with '/'".into());
    }

    if pattern.ends_with('.') {
        return Err("must not end with '.'".into());
    }

    if pattern.contains("//") {
        return Err("must not contain consecutive slashes '//'".into());
    }

    for component in pattern.split('/') {
        if component.starts_with('.') {
            return Err(format!("component must not start with '.': {component:?}"));
        }
        if component.ends_with(".lock") {
            return Err(format!("component must not end with '.lock': {component:?}"));
        }
    }

    Ok(())
}
