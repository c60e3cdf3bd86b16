//! The lazily loaded, cached refspec list of one remote.
//!
//! A [`RefSpecCollection`] moves through four states:
//!
//! - `Unloaded`: nothing read yet (also the state after `RemoteNotFound`)
//! - `Loading`: a load is running
//! - `Loaded`: the full, ordered list is cached; the source is never asked again
//! - `Failed`: the last load failed part way or was interrupted by a panic;
//!   the cause is kept and the next access retries
//!
//! A load is all-or-nothing. The collection is `!Sync`: serializing access
//! to one remote is the caller's job and the compiler enforces it.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

use gref_spec::{Direction, RefSpec};
use tracing::{debug, info, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::traits::RefSpecSource;

enum LoadState {
    Unloaded,
    Loading,
    Loaded(Rc<[RefSpec]>),
    Failed(Arc<RemoteError>),
}

impl LoadState {
    fn label(&self) -> &'static str {
        match self {
            LoadState::Unloaded => "unloaded",
            LoadState::Loading => "loading",
            LoadState::Loaded(_) => "loaded",
            LoadState::Failed(_) => "failed",
        }
    }
}

/// Holds the collection in `Loading` for the duration of one load.
///
/// If the load unwinds before [`finish`](Self::finish) is called, the state
/// drops to `Failed` so the next access retries.
struct LoadGuard<'a> {
    state: &'a RefCell<LoadState>,
    remote: &'a str,
}

impl LoadGuard<'_> {
    fn finish(self, next: LoadState) {
        *self.state.borrow_mut() = next;
        std::mem::forget(self);
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        warn!(remote = %self.remote, "refspec load interrupted");
        if let Ok(mut state) = self.state.try_borrow_mut() {
            *state = LoadState::Failed(Arc::new(RemoteError::LoadAborted {
                remote: self.remote.to_string(),
            }));
        }
    }
}

/// A shared view of a loaded refspec list, in declaration order.
///
/// Cheap to clone. Every enumeration of the same loaded collection hands out
/// the same underlying list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefSpecs(Rc<[RefSpec]>);

impl RefSpecs {
    /// Returns `true` if both views share the same cached list.
    pub fn same_list(&self, other: &RefSpecs) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for RefSpecs {
    type Target = [RefSpec];

    fn deref(&self) -> &[RefSpec] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a RefSpecs {
    type Item = &'a RefSpec;
    type IntoIter = std::slice::Iter<'a, RefSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The refspecs configured on one remote of a [`RefSpecSource`].
pub struct RefSpecCollection<'s> {
    remote: String,
    source: &'s dyn RefSpecSource,
    state: RefCell<LoadState>,
}

impl<'s> RefSpecCollection<'s> {
    /// Create an unloaded collection. Nothing is read until first access.
    pub fn new(source: &'s dyn RefSpecSource, remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            source,
            state: RefCell::new(LoadState::Unloaded),
        }
    }

    pub fn remote_name(&self) -> &str {
        &self.remote
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.borrow(), LoadState::Loaded(_))
    }

    /// The cause of the last failed load, if the collection is in the
    /// failed state.
    pub fn last_error(&self) -> Option<Arc<RemoteError>> {
        match &*self.state.borrow() {
            LoadState::Failed(cause) => Some(Arc::clone(cause)),
            _ => None,
        }
    }

    /// Enumerate the refspecs, loading them on first access.
    ///
    /// Once loaded, repeated calls return the cached list without touching
    /// the source. After a failure the next call performs a full reload.
    pub fn enumerate(&self) -> RemoteResult<RefSpecs> {
        match &*self.state.borrow() {
            LoadState::Loaded(specs) => return Ok(RefSpecs(Rc::clone(specs))),
            LoadState::Loading => {
                return Err(RemoteError::LoadInProgress {
                    remote: self.remote.clone(),
                })
            }
            LoadState::Unloaded | LoadState::Failed(_) => {}
        }

        let previous = self.state.replace(LoadState::Loading);
        if let LoadState::Failed(cause) = &previous {
            debug!(remote = %self.remote, reason = %cause, "retrying refspec load");
        }
        let guard = LoadGuard {
            state: &self.state,
            remote: &self.remote,
        };

        match retrieve_refspecs(self.source, &self.remote) {
            Ok(specs) => {
                let specs: Rc<[RefSpec]> = specs.into();
                info!(remote = %self.remote, count = specs.len(), "loaded refspecs");
                guard.finish(LoadState::Loaded(Rc::clone(&specs)));
                Ok(RefSpecs(specs))
            }
            Err(err @ RemoteError::RemoteNotFound { .. }) => {
                warn!(remote = %self.remote, error = %err, "refspec load failed");
                guard.finish(LoadState::Unloaded);
                Err(err)
            }
            Err(cause) => {
                warn!(remote = %self.remote, error = %cause, "refspec load failed");
                let cause = Arc::new(cause);
                guard.finish(LoadState::Failed(Arc::clone(&cause)));
                Err(RemoteError::Load {
                    remote: self.remote.clone(),
                    source: cause,
                })
            }
        }
    }

    /// Load eagerly, discarding the list.
    pub fn load(&self) -> RemoteResult<()> {
        self.enumerate().map(|_| ())
    }

    pub fn len(&self) -> RemoteResult<usize> {
        Ok(self.enumerate()?.len())
    }

    pub fn is_empty(&self) -> RemoteResult<bool> {
        Ok(self.enumerate()?.is_empty())
    }

    /// The fetch-direction refspecs, in declaration order.
    pub fn fetch_refspecs(&self) -> RemoteResult<Vec<RefSpec>> {
        self.with_direction(Direction::Fetch)
    }

    /// The push-direction refspecs, in declaration order.
    pub fn push_refspecs(&self) -> RemoteResult<Vec<RefSpec>> {
        self.with_direction(Direction::Push)
    }

    fn with_direction(&self, direction: Direction) -> RemoteResult<Vec<RefSpec>> {
        Ok(self
            .enumerate()?
            .iter()
            .filter(|spec| spec.direction() == direction)
            .cloned()
            .collect())
    }

    /// The first refspec of `direction` whose source matches `name`.
    pub fn matching_refspec(&self, direction: Direction, name: &str) -> RemoteResult<Option<RefSpec>> {
        Ok(self
            .enumerate()?
            .iter()
            .find(|spec| spec.direction() == direction && spec.matches(name))
            .cloned())
    }

    /// Map `name` through the first matching fetch refspec.
    ///
    /// Order matters: when several fetch refspecs match, the one declared
    /// first wins.
    pub fn find_fetch_mapping(&self, name: &str) -> RemoteResult<String> {
        self.find_mapping(Direction::Fetch, name)
    }

    /// Map `name` through the first matching push refspec.
    pub fn find_push_mapping(&self, name: &str) -> RemoteResult<String> {
        self.find_mapping(Direction::Push, name)
    }

    fn find_mapping(&self, direction: Direction, name: &str) -> RemoteResult<String> {
        let spec = self
            .matching_refspec(direction, name)?
            .ok_or_else(|| RemoteError::NotFound {
                remote: self.remote.clone(),
                name: name.to_string(),
                direction,
            })?;
        let mapped = spec.transform(name)?;
        debug!(remote = %self.remote, %direction, refspec = %spec, from = name, to = %mapped, "mapped reference");
        Ok(mapped)
    }
}

impl fmt::Debug for RefSpecCollection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("RefSpecCollection");
        out.field("remote", &self.remote);
        match self.state.try_borrow() {
            Ok(state) => {
                out.field("state", &state.label());
                if let LoadState::Loaded(specs) = &*state {
                    out.field("count", &specs.len());
                }
            }
            Err(_) => {
                out.field("state", &"busy");
            }
        }
        out.finish()
    }
}

/// Read every refspec of `remote` through one scoped handle.
///
/// Returns the first failure unwrapped; the caller decides how it is
/// reported. The handle is dropped before returning.
fn retrieve_refspecs(source: &dyn RefSpecSource, remote: &str) -> RemoteResult<Vec<RefSpec>> {
    let handle = source.open_remote(remote)?;
    let count = handle.refspec_count()?;
    debug!(remote, count, "reading refspecs");

    let mut refspecs = Vec::with_capacity(count);
    for index in 0..count {
        let record = handle.refspec(index)?;
        refspecs.push(RefSpec::build_from(&record)?);
    }
    Ok(refspecs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Fault, InMemorySource};
    use crate::traits::RemoteHandle;
    use gref_spec::{RefSpecError, RefSpecRecord};
    use std::cell::{Cell, OnceCell};
    use std::panic::{self, AssertUnwindSafe};

    fn origin_source() -> InMemorySource {
        InMemorySource::new().with_remote(
            "origin",
            [
                RefSpecRecord::fetch("+refs/heads/*:refs/remotes/origin/*"),
                RefSpecRecord::fetch("refs/tags/*:refs/tags/*"),
                RefSpecRecord::push("refs/heads/main:refs/heads/main"),
            ],
        )
    }

    // ---- Loading ----

    #[test]
    fn nothing_is_read_before_first_access() {
        let source = origin_source();
        let refspecs = RefSpecCollection::new(&source, "origin");
        assert!(!refspecs.is_loaded());
        assert_eq!(source.opens(), 0);
    }

    #[test]
    fn loads_in_declaration_order() {
        let source = origin_source();
        let refspecs = RefSpecCollection::new(&source, "origin");
        let specs = refspecs.enumerate().unwrap();
        let strings: Vec<&str> = specs.iter().map(|s| s.specification()).collect();
        assert_eq!(
            strings,
            vec![
                "+refs/heads/*:refs/remotes/origin/*",
                "refs/tags/*:refs/tags/*",
                "refs/heads/main:refs/heads/main",
            ]
        );
        assert_eq!(specs[2].direction(), Direction::Push);
        assert!(refspecs.is_loaded());
    }

    #[test]
    fn re_enumeration_uses_cache() {
        let source = origin_source();
        let refspecs = RefSpecCollection::new(&source, "origin");
        let first = refspecs.enumerate().unwrap();
        let second = refspecs.enumerate().unwrap();
        assert_eq!(first, second);
        assert!(first.same_list(&second));
        assert_eq!(source.opens(), 1);

        // Queries go through the same cache.
        refspecs.find_fetch_mapping("refs/heads/main").unwrap();
        assert_eq!(refspecs.len().unwrap(), 3);
        assert_eq!(source.opens(), 1);
    }

    #[test]
    fn empty_remote_loads_successfully() {
        let source = InMemorySource::new().with_remote("bare", []);
        let refspecs = RefSpecCollection::new(&source, "bare");
        let specs = refspecs.enumerate().unwrap();
        assert!(specs.is_empty());
        assert!(refspecs.is_loaded());
        assert!(refspecs.is_empty().unwrap());
        assert_eq!((&specs).into_iter().count(), 0);
    }

    #[test]
    fn handle_released_after_successful_load() {
        let source = origin_source();
        let refspecs = RefSpecCollection::new(&source, "origin");
        refspecs.load().unwrap();
        assert_eq!(source.live_handles(), 0);
    }

    // ---- Failure paths ----

    #[test]
    fn missing_remote_propagates_verbatim() {
        let source = origin_source();
        let refspecs = RefSpecCollection::new(&source, "upstream");
        let err = refspecs.enumerate().unwrap_err();
        assert!(matches!(err, RemoteError::RemoteNotFound { ref name } if name == "upstream"));
        assert!(!refspecs.is_loaded());
        assert!(refspecs.last_error().is_none());

        // Configure the remote and retry.
        source.add_remote("upstream", [RefSpecRecord::fetch("refs/heads/*:refs/remotes/upstream/*")]);
        assert_eq!(refspecs.len().unwrap(), 1);
    }

    #[test]
    fn item_failure_aborts_whole_load() {
        let source = origin_source();
        source.set_fault("origin", Some(Fault::Item(1)));
        let refspecs = RefSpecCollection::new(&source, "origin");

        let err = refspecs.enumerate().unwrap_err();
        match &err {
            RemoteError::Load { remote, source } => {
                assert_eq!(remote, "origin");
                assert!(matches!(**source, RemoteError::Native(_)));
            }
            other => panic!("expected Load, got: {other}"),
        }
        assert!(!refspecs.is_loaded());
        let cause = refspecs.last_error().unwrap();
        assert!(matches!(*cause, RemoteError::Native(_)));
        assert_eq!(source.live_handles(), 0);
    }

    #[test]
    fn count_failure_is_wrapped() {
        let source = origin_source();
        source.set_fault("origin", Some(Fault::Count));
        let refspecs = RefSpecCollection::new(&source, "origin");
        let err = refspecs.enumerate().unwrap_err();
        assert!(matches!(err, RemoteError::Load { .. }));
        assert!(err.is_retryable());
        assert_eq!(source.live_handles(), 0);
    }

    #[test]
    fn malformed_refspec_aborts_load() {
        let source = InMemorySource::new().with_remote(
            "origin",
            [
                RefSpecRecord::fetch("+refs/heads/*:refs/remotes/origin/*"),
                RefSpecRecord::fetch("refs/heads/*:refs/remotes/origin/main"),
            ],
        );
        let refspecs = RefSpecCollection::new(&source, "origin");
        let err = refspecs.enumerate().unwrap_err();
        match err {
            RemoteError::Load { source: cause, .. } => {
                assert!(matches!(*cause, RemoteError::RefSpec(RefSpecError::Malformed { .. })));
            }
            other => panic!("expected Load, got: {other}"),
        }
        assert!(!refspecs.is_loaded());
    }

    #[test]
    fn failed_load_is_retried() {
        let source = origin_source();
        source.set_fault("origin", Some(Fault::Item(2)));
        let refspecs = RefSpecCollection::new(&source, "origin");
        assert!(refspecs.enumerate().is_err());

        source.set_fault("origin", None);
        let specs = refspecs.enumerate().unwrap();
        assert_eq!(specs.len(), 3);
        assert!(refspecs.last_error().is_none());
        assert_eq!(source.opens(), 2);
        assert_eq!(source.live_handles(), 0);
    }

    /// Calls back into the collection it is loading before opening.
    struct ReentrantSource<'c> {
        inner: InMemorySource,
        collection: OnceCell<&'c RefSpecCollection<'c>>,
        nested: RefCell<Option<RemoteResult<usize>>>,
    }

    impl RefSpecSource for ReentrantSource<'_> {
        fn open_remote(&self, name: &str) -> RemoteResult<Box<dyn RemoteHandle + '_>> {
            if let Some(collection) = self.collection.get() {
                *self.nested.borrow_mut() = Some(collection.len());
            }
            self.inner.open_remote(name)
        }
    }

    #[test]
    fn reentrant_access_during_load_is_rejected() {
        let source = ReentrantSource {
            inner: origin_source(),
            collection: OnceCell::new(),
            nested: RefCell::new(None),
        };
        let refspecs = RefSpecCollection::new(&source, "origin");
        assert!(source.collection.set(&refspecs).is_ok());

        assert_eq!(refspecs.len().unwrap(), 3);
        let nested = source.nested.borrow_mut().take().unwrap();
        assert!(matches!(
            nested,
            Err(RemoteError::LoadInProgress { ref remote }) if remote == "origin"
        ));
        assert!(refspecs.is_loaded());
        assert_eq!(source.inner.opens(), 1);
        assert_eq!(source.inner.live_handles(), 0);
    }

    /// Panics on the first open, then behaves.
    struct PanickingSource {
        inner: InMemorySource,
        panicked: Cell<bool>,
    }

    impl RefSpecSource for PanickingSource {
        fn open_remote(&self, name: &str) -> RemoteResult<Box<dyn RemoteHandle + '_>> {
            if !self.panicked.replace(true) {
                panic!("source crashed while opening {name}");
            }
            self.inner.open_remote(name)
        }
    }

    #[test]
    fn panic_during_load_leaves_collection_retryable() {
        let source = PanickingSource {
            inner: origin_source(),
            panicked: Cell::new(false),
        };
        let refspecs = RefSpecCollection::new(&source, "origin");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| refspecs.enumerate()));
        assert!(outcome.is_err());
        assert!(!refspecs.is_loaded());
        assert!(matches!(
            refspecs.last_error().as_deref(),
            Some(RemoteError::LoadAborted { .. })
        ));
        assert!(format!("{refspecs:?}").contains("failed"));

        // The next access reloads instead of reporting a load in progress.
        assert_eq!(refspecs.len().unwrap(), 3);
        assert!(refspecs.last_error().is_none());
        assert_eq!(source.inner.opens(), 1);
    }

    // ---- Mapping ----

    #[test]
    fn fetch_mapping_through_wildcard() {
        let source = origin_source();
        let refspecs = RefSpecCollection::new(&source, "origin");
        assert_eq!(
            refspecs.find_fetch_mapping("refs/heads/main").unwrap(),
            "refs/remotes/origin/main"
        );
        assert_eq!(
            refspecs.find_fetch_mapping("refs/tags/v1.0").unwrap(),
            "refs/tags/v1.0"
        );
    }

    #[test]
    fn fetch_mapping_first_match_wins() {
        let source = InMemorySource::new().with_remote(
            "origin",
            [
                RefSpecRecord::push("refs/heads/main:refs/heads/pushed"),
                RefSpecRecord::fetch("refs/heads/main:refs/remotes/origin/trunk"),
                RefSpecRecord::fetch("+refs/heads/*:refs/remotes/origin/*"),
            ],
        );
        let refspecs = RefSpecCollection::new(&source, "origin");
        assert_eq!(
            refspecs.find_fetch_mapping("refs/heads/main").unwrap(),
            "refs/remotes/origin/trunk"
        );
        assert_eq!(
            refspecs.find_fetch_mapping("refs/heads/dev").unwrap(),
            "refs/remotes/origin/dev"
        );
        assert_eq!(
            refspecs.find_push_mapping("refs/heads/main").unwrap(),
            "refs/heads/pushed"
        );
    }

    #[test]
    fn no_fetch_mapping_is_not_found() {
        let source = origin_source();
        let refspecs = RefSpecCollection::new(&source, "origin");
        let err = refspecs.find_fetch_mapping("refs/notes/commits").unwrap_err();
        assert!(matches!(
            err,
            RemoteError::NotFound { direction: Direction::Fetch, .. }
        ));
        // Still usable afterwards.
        assert!(refspecs.is_loaded());
        assert!(refspecs.find_fetch_mapping("refs/heads/main").is_ok());
    }

    #[test]
    fn push_refspecs_ignored_for_fetch() {
        let source = InMemorySource::new().with_remote(
            "origin",
            [RefSpecRecord::push("refs/heads/*:refs/heads/*")],
        );
        let refspecs = RefSpecCollection::new(&source, "origin");
        assert!(refspecs.find_fetch_mapping("refs/heads/main").is_err());
        assert!(refspecs.matching_refspec(Direction::Push, "refs/heads/main").unwrap().is_some());
    }

    #[test]
    fn direction_filters() {
        let source = origin_source();
        let refspecs = RefSpecCollection::new(&source, "origin");
        assert_eq!(refspecs.fetch_refspecs().unwrap().len(), 2);
        let push = refspecs.push_refspecs().unwrap();
        assert_eq!(push.len(), 1);
        assert_eq!(push[0].source(), "refs/heads/main");
    }

    #[test]
    fn debug_shows_state_and_count() {
        let source = origin_source();
        let refspecs = RefSpecCollection::new(&source, "origin");
        assert!(format!("{refspecs:?}").contains("unloaded"));
        refspecs.load().unwrap();
        let shown = format!("{refspecs:?}");
        assert!(shown.contains("loaded"));
        assert!(shown.contains("count: 3"));
    }
}
