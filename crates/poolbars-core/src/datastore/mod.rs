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

//! Remote data store access.
//!
//! The backend exposes two reads (bars and vote rows) and one write (an
//! atomic vote increment). [`SupabaseClient`] implements [`DataStore`] over
//! the PostgREST endpoints.

mod retry;
mod supabase;

use std::future::Future;

use log::{error, info};
use thiserror::Error;

use crate::model::{Bar, VoteRecord};

pub use reqwest::StatusCode;
pub use retry::RetryPolicy;
pub use supabase::{SupabaseClient, SupabaseConfig};

#[derive(Debug, Error)]
pub enum DataStoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} returned {status}: {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl DataStoreError {
    /// Whether retrying the same request may succeed.
    ///
    /// Timeouts and gateway timeouts are not retried: the increment may
    /// already have landed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            DataStoreError::Http(e) => e.is_connect(),
            DataStoreError::Status { status, .. } => matches!(
                *status,
                StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
            ),
            DataStoreError::Decode { .. } => false,
        }
    }
}

/// The remote backend holding bars and votes.
pub trait DataStore {
    /// Every bar record.
    fn list_bars(&self) -> impl Future<Output = Result<Vec<Bar>, DataStoreError>> + Send;

    /// Every vote tally row.
    fn list_votes(&self) -> impl Future<Output = Result<Vec<VoteRecord>, DataStoreError>> + Send;

    /// Atomically add one to the counter for `bar_name`.
    fn increment_vote(
        &self,
        bar_name: &str,
    ) -> impl Future<Output = Result<(), DataStoreError>> + Send;
}

/// Everything loaded at startup.
///
/// A failed fetch leaves its list empty and records the error for display.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub bars: Vec<Bar>,
    pub votes: Vec<VoteRecord>,
    pub bar_error: Option<String>,
    pub vote_error: Option<String>,
}

impl Snapshot {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.bar_error.is_some() || self.vote_error.is_some()
    }
}

/// Fetch bars and votes concurrently.
pub async fn load_snapshot<D: DataStore>(store: &D) -> Snapshot {
    let (bars, votes) = tokio::join!(store.list_bars(), store.list_votes());

    let mut snapshot = Snapshot::default();
    match bars {
        Ok(bars) => {
            info!("Loaded {} bars", bars.len());
            snapshot.bars = bars;
        }
        Err(e) => {
            error!("Failed to load bars: {e}");
            snapshot.bar_error = Some(e.to_string());
        }
    }
    match votes {
        Ok(votes) => {
            info!("Loaded {} vote rows", votes.len());
            snapshot.votes = votes;
        }
        Err(e) => {
            error!("Failed to load votes: {e}");
            snapshot.vote_error = Some(e.to_string());
        }
    }
    snapshot
}
