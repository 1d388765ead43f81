// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Persisted record of the bars this installation has voted for.
//!
//! The set is stored as a JSON array of bar names. It is append-only: the
//! application never removes a name once written.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use thiserror::Error;

/// File name of the persisted set inside the data directory.
pub const VOTED_FILE_NAME: &str = "voted.json";

#[derive(Debug, Error)]
pub enum VoteGuardError {
    #[error("vote guard file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("vote guard file {path} is not a JSON list of names: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Storage behind the one-vote-per-bar check.
pub trait VoteGuardStore {
    /// Whether a vote for `bar_name` was already recorded.
    fn contains(&self, bar_name: &str) -> bool;

    /// Record a vote for `bar_name`.
    ///
    /// The name is remembered for the rest of the session even when
    /// persisting it fails.
    fn insert(&mut self, bar_name: &str) -> Result<(), VoteGuardError>;
}

/// Session-only guard.
#[derive(Debug, Clone, Default)]
pub struct MemoryVoteGuard {
    names: BTreeSet<String>,
}

impl MemoryVoteGuard {
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl VoteGuardStore for MemoryVoteGuard {
    fn contains(&self, bar_name: &str) -> bool {
        self.names.contains(bar_name)
    }

    fn insert(&mut self, bar_name: &str) -> Result<(), VoteGuardError> {
        self.names.insert(bar_name.to_string());
        Ok(())
    }
}

/// Guard persisted to a JSON file.
#[derive(Debug)]
pub struct FileVoteGuard {
    path: PathBuf,
    names: BTreeSet<String>,
    /// Set when a damaged file is still in the way and must not be replaced.
    write_blocked: bool,
}

impl FileVoteGuard {
    /// Load the set from `path`. A missing file is an empty set.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, VoteGuardError> {
        let path = path.into();
        let names = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| VoteGuardError::Json {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeSet::new(),
            Err(source) => {
                return Err(VoteGuardError::Io { path, source });
            }
        };
        Ok(Self {
            path,
            names,
            write_blocked: false,
        })
    }

    /// Load the set from `path`, recovering what it can from a damaged file.
    ///
    /// An unreadable or corrupt file is moved aside to `voted.json.corrupt`
    /// and any names that still parse are kept. If it cannot be moved, the
    /// guard never writes over it.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(path.clone()) {
            Ok(guard) => {
                debug!("Loaded {} voted bars from {}", guard.names.len(), path.display());
                guard
            }
            Err(e) => {
                warn!("Vote guard file is damaged: {e}");
                let names = salvage(&path);
                let aside = path.with_extension("json.corrupt");
                let write_blocked = match fs::rename(&path, &aside) {
                    Ok(()) => {
                        warn!("Moved damaged vote guard file to {}", aside.display());
                        false
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                    Err(e) => {
                        error!(
                            "Could not move {} aside, votes will not be saved: {e}",
                            path.display()
                        );
                        true
                    }
                };
                if !names.is_empty() {
                    info!("Recovered {} voted bars from damaged file", names.len());
                }
                Self {
                    path,
                    names,
                    write_blocked,
                }
            }
        }
    }

    /// Where the set is persisted.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), VoteGuardError> {
        let io_err = |source| VoteGuardError::Io {
            path: self.path.clone(),
            source,
        };

        if self.write_blocked {
            return Err(io_err(io::Error::other(
                "refusing to replace a damaged file that could not be moved aside",
            )));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(&self.names).map_err(|source| {
            VoteGuardError::Json {
                path: self.path.clone(),
                source,
            }
        })?;

        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

/// Names from the first JSON array in a damaged file, ignoring invalid bytes
/// and anything after the array.
fn salvage(path: &Path) -> BTreeSet<String> {
    let Ok(bytes) = fs::read(path) else {
        return BTreeSet::new();
    };
    let text = String::from_utf8_lossy(&bytes);
    serde_json::Deserializer::from_str(&text)
        .into_iter::<BTreeSet<String>>()
        .next()
        .and_then(Result::ok)
        .unwrap_or_default()
}

impl VoteGuardStore for FileVoteGuard {
    fn contains(&self, bar_name: &str) -> bool {
        self.names.contains(bar_name)
    }

    fn insert(&mut self, bar_name: &str) -> Result<(), VoteGuardError> {
        if self.names.insert(bar_name.to_string()) {
            self.persist()
        } else {
            Ok(())
        }
    }
}
