//! Refspec parsing and reference-name translation.
//!
//! A refspec pairs a source reference pattern with a destination pattern and
//! tells a fetch or push which references to transfer and where to store them.
//! This crate parses refspec strings, validates their shape, and maps concrete
//! reference names between the local and remote namespaces.
//!
//! # Quick Start
//!
//! ```rust
//! use gref_spec::{Direction, RefSpec};
//!
//! let spec = RefSpec::parse("+refs/heads/*:refs/remotes/origin/*", Direction::Fetch).unwrap();
//! assert!(spec.is_force());
//! assert!(spec.matches("refs/heads/main"));
//! assert_eq!(spec.transform("refs/heads/main").unwrap(), "refs/remotes/origin/main");
//! ```
//!
//! # Modules
//!
//! - [`error`] — Error types for parsing and matching
//! - [`names`] — Validation of individual refspec sides
//! - [`refspec`] — The [`RefSpec`] type
//! - [`types`] — [`Direction`] and the raw [`RefSpecRecord`]

pub mod error;
pub mod names;
pub mod refspec;
pub mod types;

pub use error::{RefSpecError, Result};
pub use names::validate_pattern;
pub use refspec::RefSpec;
pub use types::{Direction, RefSpecRecord};
