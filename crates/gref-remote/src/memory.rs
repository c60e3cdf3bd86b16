//! In-memory refspec source for testing.
//!
//! [`InMemorySource`] keeps remotes in a `HashMap` behind a `RwLock` and
//! accounts for every handle it hands out, so tests can assert that loads
//! open the remote exactly once and release every handle. Faults can be
//! injected per remote to exercise failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use gref_spec::RefSpecRecord;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::{RefSpecSource, RemoteHandle};

/// Where an injected failure fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Reading the refspec count fails.
    Count,
    /// Extracting the refspec at this index fails.
    Item(usize),
}

#[derive(Clone, Debug, Default)]
struct RemoteEntry {
    records: Vec<RefSpecRecord>,
    fault: Option<Fault>,
}

/// An in-memory implementation of [`RefSpecSource`].
#[derive(Debug, Default)]
pub struct InMemorySource {
    remotes: RwLock<HashMap<String, RemoteEntry>>,
    opens: AtomicUsize,
    live_handles: AtomicUsize,
}

impl InMemorySource {
    /// Create a new source with no remotes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`add_remote`](Self::add_remote).
    pub fn with_remote(
        self,
        name: impl Into<String>,
        records: impl IntoIterator<Item = RefSpecRecord>,
    ) -> Self {
        self.add_remote(name, records);
        self
    }

    /// Register (or replace) a remote with its refspecs in declaration order.
    pub fn add_remote(&self, name: impl Into<String>, records: impl IntoIterator<Item = RefSpecRecord>) {
        let entry = RemoteEntry {
            records: records.into_iter().collect(),
            fault: None,
        };
        self.remotes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.into(), entry);
    }

    /// Remove a remote. Returns `true` if it existed.
    pub fn remove_remote(&self, name: &str) -> bool {
        self.remotes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(name)
            .is_some()
    }

    /// Inject (or clear, with `None`) a failure for the named remote.
    pub fn set_fault(&self, name: &str, fault: Option<Fault>) {
        if let Some(entry) = self
            .remotes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get_mut(name)
        {
            entry.fault = fault;
        }
    }

    /// Number of successful `open_remote` calls so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of handles opened and not yet dropped.
    pub fn live_handles(&self) -> usize {
        self.live_handles.load(Ordering::SeqCst)
    }
}

impl RefSpecSource for InMemorySource {
    fn open_remote(&self, name: &str) -> RemoteResult<Box<dyn RemoteHandle + '_>> {
        let entry = self
            .remotes
            .read()
            .map_err(|e| RemoteError::Native(format!("lock poisoned: {e}")))?
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::RemoteNotFound {
                name: name.to_string(),
            })?;

        self.opens.fetch_add(1, Ordering::SeqCst);
        self.live_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryHandle {
            entry,
            live_handles: &self.live_handles,
        }))
    }
}

struct MemoryHandle<'s> {
    entry: RemoteEntry,
    live_handles: &'s AtomicUsize,
}

impl RemoteHandle for MemoryHandle<'_> {
    fn refspec_count(&self) -> RemoteResult<usize> {
        if self.entry.fault == Some(Fault::Count) {
            return Err(RemoteError::Native("injected failure reading count".into()));
        }
        Ok(self.entry.records.len())
    }

    fn refspec(&self, index: usize) -> RemoteResult<RefSpecRecord> {
        if self.entry.fault == Some(Fault::Item(index)) {
            return Err(RemoteError::Native(format!(
                "injected failure reading refspec {index}"
            )));
        }
        self.entry
            .records
            .get(index)
            .cloned()
            .ok_or(RemoteError::IndexOutOfRange {
                index,
                count: self.entry.records.len(),
            })
    }
}

impl Drop for MemoryHandle<'_> {
    fn drop(&mut self) {
        self.live_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
