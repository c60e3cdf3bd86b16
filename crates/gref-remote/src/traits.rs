//! The capability interface between refspec collections and whatever stores
//! remote configuration.
//!
//! A [`RefSpecSource`] opens one [`RemoteHandle`] per load. The handle is a
//! scoped resource: it is owned by the call that opened it and released when
//! it is dropped, on success and failure paths alike.

use gref_spec::RefSpecRecord;

use crate::error::RemoteResult;

/// Something that can open named remotes and list their refspecs.
///
/// Implementations: the libgit2-backed [`GitSource`](crate::GitSource), the
/// TOML-backed [`ConfigSource`](crate::ConfigSource), and the
/// [`InMemorySource`](crate::InMemorySource) test double.
pub trait RefSpecSource {
    /// Open a handle to the named remote.
    ///
    /// Fails with [`RemoteError::RemoteNotFound`](crate::RemoteError::RemoteNotFound)
    /// if the source has no such remote.
    fn open_remote(&self, name: &str) -> RemoteResult<Box<dyn RemoteHandle + '_>>;
}

/// An open remote. Dropping it releases the underlying native resource.
pub trait RemoteHandle {
    /// Number of configured refspecs, fetch and push combined.
    fn refspec_count(&self) -> RemoteResult<usize>;

    /// Extract the refspec at `index`. Only valid for `index < refspec_count()`.
    fn refspec(&self, index: usize) -> RemoteResult<RefSpecRecord>;
}
