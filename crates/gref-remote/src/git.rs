//! libgit2-backed refspec source.
//!
//! Reads `remote.<name>.fetch` and `remote.<name>.push` through `git2`. The
//! remote handle is a `git2::Remote` and each per-refspec handle is a
//! `git2::Refspec` borrowed from it; both are freed when dropped.

use std::path::Path;

use git2::{ErrorCode, Repository};
use gref_spec::{Direction, RefSpecRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::{RefSpecSource, RemoteHandle};

/// Options for [`GitSource`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSourceOptions {
    /// When a name is not a configured remote but looks like a URL, open an
    /// anonymous remote for it instead of failing.
    pub allow_from_url: bool,
}

/// A [`RefSpecSource`] over a git repository on disk.
pub struct GitSource {
    repo: Repository,
    options: GitSourceOptions,
}

impl GitSource {
    /// Discover the repository containing `path`.
    pub fn open(path: &Path) -> RemoteResult<Self> {
        let repo = Repository::discover(path)?;
        debug!(git_dir = %repo.path().display(), "opened repository");
        Ok(Self::from_repository(repo))
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self {
            repo,
            options: GitSourceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GitSourceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Names of all configured remotes.
    pub fn remote_names(&self) -> RemoteResult<Vec<String>> {
        let names = self.repo.remotes()?;
        Ok(names.iter().flatten().map(String::from).collect())
    }
}

impl RefSpecSource for GitSource {
    fn open_remote(&self, name: &str) -> RemoteResult<Box<dyn RemoteHandle + '_>> {
        let remote = match self.repo.find_remote(name) {
            Ok(remote) => remote,
            // Invalid remote names (URLs among them) come back as InvalidSpec.
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
                if self.options.allow_from_url && looks_like_url(name) {
                    debug!(url = name, "opening anonymous remote");
                    self.repo.remote_anonymous(name)?
                } else {
                    return Err(RemoteError::RemoteNotFound {
                        name: name.to_string(),
                    });
                }
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Box::new(GitRemoteHandle { remote }))
    }
}

struct GitRemoteHandle<'r> {
    remote: git2::Remote<'r>,
}

impl RemoteHandle for GitRemoteHandle<'_> {
    fn refspec_count(&self) -> RemoteResult<usize> {
        Ok(self.remote.refspecs().count())
    }

    fn refspec(&self, index: usize) -> RemoteResult<RefSpecRecord> {
        let refspec = self
            .remote
            .get_refspec(index)
            .ok_or_else(|| RemoteError::IndexOutOfRange {
                index,
                count: self.remote.refspecs().count(),
            })?;
        let specification = refspec
            .str()
            .ok_or_else(|| RemoteError::Native(format!("refspec {index} is not valid UTF-8")))?;
        let direction = match refspec.direction() {
            git2::Direction::Fetch => Direction::Fetch,
            git2::Direction::Push => Direction::Push,
        };
        Ok(RefSpecRecord::new(specification, direction))
    }
}

/// URLs (`scheme://...`), scp-style addresses (`host:path`), and local paths.
fn looks_like_url(name: &str) -> bool {
    name.contains("://")
        || name.starts_with('/')
        || name.starts_with("./")
        || name.starts_with("../")
        || name.contains(':')
}
