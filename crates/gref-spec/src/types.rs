//! Direction and raw record types shared by refspec producers and consumers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RefSpecError;

/// The synchronization direction a refspec governs.
///
/// The direction is never encoded in the refspec string itself; it comes from
/// the configuration list the string was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Maps remote references into local tracking references.
    Fetch,
    /// Maps local references onto the remote.
    Push,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Fetch => "fetch",
            Direction::Push => "push",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = RefSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let marker = s.trim();
        if marker.eq_ignore_ascii_case("fetch") {
            Ok(Direction::Fetch)
        } else if marker.eq_ignore_ascii_case("push") {
            Ok(Direction::Push)
        } else {
            Err(RefSpecError::malformed(
                s,
                "direction must be 'fetch' or 'push'",
            ))
        }
    }
}

/// A refspec as extracted from a native remote, before validation.
///
/// Sources produce records; [`RefSpec::build_from`](crate::RefSpec::build_from)
/// turns them into validated refspecs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefSpecRecord {
    /// The refspec string exactly as configured.
    pub specification: String,
    /// Which configuration list the string came from.
    pub direction: Direction,
}

impl RefSpecRecord {
    pub fn new(specification: impl Into<String>, direction: Direction) -> Self {
        Self {
            specification: specification.into(),
            direction,
        }
    }

    pub fn fetch(specification: impl Into<String>) -> Self {
        Self::new(specification, Direction::Fetch)
    }

    pub fn push(specification: impl Into<String>) -> Self {
        Self::new(specification, Direction::Push)
    }
}
