//! The [`RefSpec`] type: parsing, matching, and name translation.

use std::fmt;

use serde::Serialize;

use crate::error::{RefSpecError, Result};
use crate::names::{check_pattern, is_wildcard, WILDCARD};
use crate::types::{Direction, RefSpecRecord};

/// A parsed fetch or push refspec, e.g. `+refs/heads/*:refs/remotes/origin/*`.
///
/// Immutable once parsed. When the source side contains a wildcard, a
/// non-empty destination contains one too (and vice versa).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RefSpec {
    specification: String,
    source: String,
    destination: String,
    force: bool,
    direction: Direction,
}

impl RefSpec {
    /// Parse a refspec string for the given direction.
    ///
    /// A leading `+` marks the refspec as forced. The remainder is split on
    /// the first unescaped `:`. Without a `:`, the destination is empty:
    /// matching references are transferred but not stored under a mapped
    /// name, and what to do with them is up to the caller.
    pub fn parse(spec: &str, direction: Direction) -> Result<Self> {
        let (force, body) = match spec.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        let (source, destination) = split_unescaped(body);

        if source.is_empty() {
            return Err(RefSpecError::malformed(spec, "source must not be empty"));
        }
        check_pattern(source)
            .map_err(|reason| RefSpecError::malformed(spec, format!("source {source:?}: {reason}")))?;
        if !destination.is_empty() {
            check_pattern(destination).map_err(|reason| {
                RefSpecError::malformed(spec, format!("destination {destination:?}: {reason}"))
            })?;
            if is_wildcard(source) != is_wildcard(destination) {
                return Err(RefSpecError::malformed(
                    spec,
                    "a wildcard must appear on both sides or on neither",
                ));
            }
        }

        Ok(Self {
            specification: spec.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            force,
            direction,
        })
    }

    /// Parse a fetch refspec.
    pub fn fetch(spec: &str) -> Result<Self> {
        Self::parse(spec, Direction::Fetch)
    }

    /// Parse a push refspec.
    pub fn push(spec: &str) -> Result<Self> {
        Self::parse(spec, Direction::Push)
    }

    /// Build a refspec from a record extracted from a native remote.
    pub fn build_from(record: &RefSpecRecord) -> Result<Self> {
        Self::parse(&record.specification, record.direction)
    }

    /// The refspec string exactly as it was parsed.
    pub fn specification(&self) -> &str {
        &self.specification
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The destination pattern. Empty when the refspec has no `:`.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether a non-fast-forward update is permitted.
    pub fn is_force(&self) -> bool {
        self.force
    }

    pub fn is_wildcard(&self) -> bool {
        is_wildcard(&self.source)
    }

    pub fn has_destination(&self) -> bool {
        !self.destination.is_empty()
    }

    /// Returns `true` if `name` matches the source side.
    pub fn matches(&self, name: &str) -> bool {
        capture(&self.source, name).is_some()
    }

    /// Returns `true` if `name` matches the destination side.
    pub fn destination_matches(&self, name: &str) -> bool {
        self.has_destination() && capture(&self.destination, name).is_some()
    }

    /// Map a source-side name into the destination namespace.
    ///
    /// `refs/heads/main` through `+refs/heads/*:refs/remotes/origin/*`
    /// becomes `refs/remotes/origin/main`. A non-wildcard refspec returns its
    /// destination verbatim, which is empty when the refspec has none.
    pub fn transform(&self, name: &str) -> Result<String> {
        let captured = capture(&self.source, name).ok_or_else(|| self.no_match(name))?;
        Ok(substitute(&self.destination, captured))
    }

    /// Map a destination-side name back into the source namespace.
    pub fn reverse_transform(&self, name: &str) -> Result<String> {
        if !self.has_destination() {
            return Err(self.no_match(name));
        }
        let captured = capture(&self.destination, name).ok_or_else(|| self.no_match(name))?;
        Ok(substitute(&self.source, captured))
    }

    fn no_match(&self, name: &str) -> RefSpecError {
        RefSpecError::NoMatch {
            spec: self.specification.clone(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.force {
            f.write_str("+")?;
        }
        f.write_str(&self.source)?;
        if self.has_destination() {
            write!(f, ":{}", self.destination)?;
        }
        Ok(())
    }
}

/// Split on the first `:` not preceded by a backslash.
fn split_unescaped(body: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, ch) in body.char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            ':' if !escaped => return (&body[..i], &body[i + 1..]),
            _ => escaped = false,
        }
    }
    (body, "")
}

/// Match `name` against `pattern`, returning the text captured by the
/// wildcard (empty for exact matches). The capture may be empty.
fn capture<'a>(pattern: &str, name: &'a str) -> Option<&'a str> {
    match pattern.split_once(WILDCARD) {
        None => (pattern == name).then_some(""),
        Some((prefix, suffix)) => {
            if name.len() < prefix.len() + suffix.len() {
                return None;
            }
            name.strip_prefix(prefix)?.strip_suffix(suffix)
        }
    }
}

fn substitute(pattern: &str, captured: &str) -> String {
    match pattern.split_once(WILDCARD) {
        Some((prefix, suffix)) => format!("{prefix}{captured}{suffix}"),
        None => pattern.to_string(),
    }
}
