//! Per-remote refspec collections.
//!
//! A [`Remote`] names a remote on some [`RefSpecSource`] and owns its
//! [`RefSpecCollection`]: the remote's configured refspecs, read once on first
//! access and cached for the remote's lifetime. The collection answers the
//! question every fetch and push has to ask: which local name does this
//! remote reference map to?
//!
//! # Quick Start
//!
//! ```rust
//! use gref_remote::{InMemorySource, Remote};
//! use gref_spec::RefSpecRecord;
//!
//! let source = InMemorySource::new().with_remote(
//!     "origin",
//!     [RefSpecRecord::fetch("+refs/heads/*:refs/remotes/origin/*")],
//! );
//! let origin = Remote::new(&source, "origin");
//! let mapped = origin.refspecs().find_fetch_mapping("refs/heads/main").unwrap();
//! assert_eq!(mapped, "refs/remotes/origin/main");
//! ```
//!
//! # Modules
//!
//! - [`error`] — Error types for loading and lookup
//! - [`traits`] — The [`RefSpecSource`] / [`RemoteHandle`] capability interface
//! - [`collection`] — [`RefSpecCollection`], the lazy-load state machine
//! - [`remote`] — [`Remote`]
//! - [`git`] — [`GitSource`], backed by libgit2
//! - [`config`] — [`ConfigSource`], backed by a TOML document
//! - [`memory`] — [`InMemorySource`] for tests

pub mod collection;
pub mod config;
pub mod error;
pub mod git;
pub mod memory;
pub mod remote;
pub mod traits;

pub use collection::{RefSpecCollection, RefSpecs};
pub use config::{ConfigSource, RemoteConfig, RemotesConfig};
pub use error::{RemoteError, RemoteResult};
pub use git::{GitSource, GitSourceOptions};
pub use memory::{Fault, InMemorySource};
pub use remote::Remote;
pub use traits::{RefSpecSource, RemoteHandle};
