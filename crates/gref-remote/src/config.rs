//! TOML-backed refspec source.
//!
//! ```toml
//! [remotes.origin]
//! url = "https://example.com/project.git"
//! fetch = ["+refs/heads/*:refs/remotes/origin/*"]
//! push = ["refs/heads/main:refs/heads/main"]
//! ```
//!
//! Fetch refspecs come before push refspecs in declaration order, the same
//! order git uses for a remote's config section.

use std::collections::BTreeMap;
use std::path::Path;

use gref_spec::RefSpecRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::{RefSpecSource, RemoteHandle};

/// Top-level configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotesConfig {
    #[serde(default)]
    pub remotes: BTreeMap<String, RemoteConfig>,
}

/// One `[remotes.<name>]` table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub fetch: Vec<String>,
    #[serde(default)]
    pub push: Vec<String>,
}

impl RemoteConfig {
    /// The refspec records of this remote, fetch first.
    pub fn records(&self) -> Vec<RefSpecRecord> {
        self.fetch
            .iter()
            .map(RefSpecRecord::fetch)
            .chain(self.push.iter().map(RefSpecRecord::push))
            .collect()
    }
}

impl RemotesConfig {
    pub fn from_toml_str(text: &str) -> RemoteResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| RemoteError::Config(e.to_string()))?;
        for name in config.remotes.keys() {
            validate_remote_name(name)?;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> RemoteResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), remotes = config.remotes.len(), "loaded remotes config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> RemoteResult<String> {
        toml::to_string(self).map_err(|e| RemoteError::Config(e.to_string()))
    }
}

/// Remote names must be a single path component usable inside a refspec.
pub fn validate_remote_name(name: &str) -> RemoteResult<()> {
    let invalid = |reason: &str| RemoteError::Config(format!("invalid remote name {name:?}: {reason}"));
    if name.contains('/') {
        return Err(invalid("must not contain '/'"));
    }
    if name.contains('*') {
        return Err(invalid("must not contain '*'"));
    }
    gref_spec::validate_pattern(name).map_err(|e| match e {
        gref_spec::RefSpecError::Malformed { reason, .. } => invalid(&reason),
        other => RemoteError::RefSpec(other),
    })
}

/// A [`RefSpecSource`] over a [`RemotesConfig`].
#[derive(Clone, Debug, Default)]
pub struct ConfigSource {
    config: RemotesConfig,
}

impl ConfigSource {
    pub fn new(config: RemotesConfig) -> Self {
        Self { config }
    }

    pub fn load(path: &Path) -> RemoteResult<Self> {
        RemotesConfig::load(path).map(Self::new)
    }

    pub fn config(&self) -> &RemotesConfig {
        &self.config
    }
}

impl RefSpecSource for ConfigSource {
    fn open_remote(&self, name: &str) -> RemoteResult<Box<dyn RemoteHandle + '_>> {
        let remote = self
            .config
            .remotes
            .get(name)
            .ok_or_else(|| RemoteError::RemoteNotFound {
                name: name.to_string(),
            })?;
        Ok(Box::new(ConfigRemoteHandle {
            records: remote.records(),
        }))
    }
}

struct ConfigRemoteHandle {
    records: Vec<RefSpecRecord>,
}

impl RemoteHandle for ConfigRemoteHandle {
    fn refspec_count(&self) -> RemoteResult<usize> {
        Ok(self.records.len())
    }

    fn refspec(&self, index: usize) -> RemoteResult<RefSpecRecord> {
        self.records
            .get(index)
            .cloned()
            .ok_or(RemoteError::IndexOutOfRange {
                index,
                count: self.records.len(),
            })
    }
}
