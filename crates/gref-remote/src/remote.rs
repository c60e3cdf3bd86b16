//! A named remote and its refspec collection.

use crate::collection::RefSpecCollection;
use crate::traits::RefSpecSource;

/// A named remote on a [`RefSpecSource`].
///
/// Owns the remote's [`RefSpecCollection`]; the collection cannot outlive the
/// source it reads from.
#[derive(Debug)]
pub struct Remote<'s> {
    refspecs: RefSpecCollection<'s>,
}

impl<'s> Remote<'s> {
    pub fn new(source: &'s dyn RefSpecSource, name: impl Into<String>) -> Self {
        Self {
            refspecs: RefSpecCollection::new(source, name),
        }
    }

    pub fn name(&self) -> &str {
        self.refspecs.remote_name()
    }

    /// The remote's refspecs. Loaded on first access.
    pub fn refspecs(&self) -> &RefSpecCollection<'s> {
        &self.refspecs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySource;
    use gref_spec::RefSpecRecord;

    #[test]
    fn remote_exposes_its_refspecs() {
        let source = InMemorySource::new().with_remote(
            "origin",
            [RefSpecRecord::fetch("+refs/heads/*:refs/remotes/origin/*")],
        );
        let remote = Remote::new(&source, "origin");
        assert_eq!(remote.name(), "origin");
        assert_eq!(
            remote.refspecs().find_fetch_mapping("refs/heads/main").unwrap(),
            "refs/remotes/origin/main"
        );
    }

    #[test]
    fn two_remotes_load_independently() {
        let source = InMemorySource::new()
            .with_remote("origin", [RefSpecRecord::fetch("refs/heads/*:refs/remotes/origin/*")])
            .with_remote("upstream", [RefSpecRecord::fetch("refs/heads/*:refs/remotes/upstream/*")]);
        let origin = Remote::new(&source, "origin");
        let upstream = Remote::new(&source, "upstream");

        origin.refspecs().load().unwrap();
        assert!(!upstream.refspecs().is_loaded());
        assert_eq!(
            upstream.refspecs().find_fetch_mapping("refs/heads/dev").unwrap(),
            "refs/remotes/upstream/dev"
        );
        assert_eq!(source.opens(), 2);
    }
}
