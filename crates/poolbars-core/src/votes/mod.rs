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

//! Vote counts and the one-vote-per-bar guard.
//!
//! A vote goes through two steps. [`VoteLedger::begin`] checks the guard and
//! hands out a [`PendingVote`]; once the backend increment has finished,
//! [`VoteLedger::complete`] applies the result. The split lets the UI thread
//! own the ledger while the request runs elsewhere. [`VoteLedger::vote`]
//! does both for callers that can await the store directly.

mod guard;

use std::collections::{HashMap, HashSet};

use log::{error, info, warn};
use thiserror::Error;

use crate::datastore::{DataStore, DataStoreError};
use crate::model::VoteRecord;

pub use guard::{FileVoteGuard, MemoryVoteGuard, VoteGuardError, VoteGuardStore, VOTED_FILE_NAME};

/// Result of a vote attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The backend counted the vote and the local count went up by one.
    Applied,
    /// This installation already voted for the bar; nothing was sent.
    AlreadyVoted,
    /// The backend increment failed; a retry is allowed.
    Failed,
}

/// Why [`VoteLedger::begin`] refused to start a vote.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoteRejection {
    #[error("already voted for {0}")]
    AlreadyVoted(String),

    #[error("a vote for {0} is still being sent")]
    InFlight(String),
}

/// Ticket for a vote whose backend increment has not finished yet.
#[must_use = "a pending vote must be passed to VoteLedger::complete"]
#[derive(Debug, PartialEq, Eq)]
pub struct PendingVote {
    bar_name: String,
}

impl PendingVote {
    #[must_use]
    pub fn bar_name(&self) -> &str {
        &self.bar_name
    }
}

/// Bar name to vote count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    counts: HashMap<String, u64>,
}

impl VoteTally {
    /// Build a tally from backend rows. A later row for the same name wins.
    #[must_use]
    pub fn from_records(records: &[VoteRecord]) -> Self {
        let counts = records
            .iter()
            .map(|record| (record.bar_name.clone(), record.count))
            .collect();
        Self { counts }
    }

    /// Count for `bar_name`, zero when the bar has no row.
    #[must_use]
    pub fn get(&self, bar_name: &str) -> u64 {
        self.counts.get(bar_name).copied().unwrap_or(0)
    }

    /// Add one vote and return the new count.
    pub fn increment(&mut self, bar_name: &str) -> u64 {
        let count = self.counts.entry(bar_name.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Vote counts plus the guard that keeps them honest.
#[derive(Debug)]
pub struct VoteLedger<G> {
    tally: VoteTally,
    guard: G,
    in_flight: HashSet<String>,
}

impl<G: VoteGuardStore> VoteLedger<G> {
    pub fn new(guard: G) -> Self {
        Self {
            tally: VoteTally::default(),
            guard,
            in_flight: HashSet::new(),
        }
    }

    /// Replace the counts with the backend's rows.
    pub fn seed(&mut self, records: &[VoteRecord]) {
        self.tally = VoteTally::from_records(records);
        info!("Seeded vote tally with {} bars", self.tally.len());
    }

    #[must_use]
    pub fn count(&self, bar_name: &str) -> u64 {
        self.tally.get(bar_name)
    }

    #[must_use]
    pub fn has_voted(&self, bar_name: &str) -> bool {
        self.guard.contains(bar_name)
    }

    /// Whether a vote for `bar_name` is waiting on the backend.
    #[must_use]
    pub fn is_in_flight(&self, bar_name: &str) -> bool {
        self.in_flight.contains(bar_name)
    }

    #[must_use]
    pub fn tally(&self) -> &VoteTally {
        &self.tally
    }

    /// Check the guard and start a vote for `bar_name`.
    pub fn begin(&mut self, bar_name: &str) -> Result<PendingVote, VoteRejection> {
        if self.guard.contains(bar_name) {
            return Err(VoteRejection::AlreadyVoted(bar_name.to_string()));
        }
        if !self.in_flight.insert(bar_name.to_string()) {
            return Err(VoteRejection::InFlight(bar_name.to_string()));
        }
        Ok(PendingVote {
            bar_name: bar_name.to_string(),
        })
    }

    /// Apply the backend's answer for a pending vote.
    pub fn complete(
        &mut self,
        pending: PendingVote,
        result: Result<(), DataStoreError>,
    ) -> VoteOutcome {
        let PendingVote { bar_name } = pending;
        self.in_flight.remove(&bar_name);

        match result {
            Ok(()) => {
                let count = self.tally.increment(&bar_name);
                if let Err(e) = self.guard.insert(&bar_name) {
                    error!("Vote for {bar_name} counted but not remembered: {e}");
                }
                info!("Vote for {bar_name} applied, now {count}");
                VoteOutcome::Applied
            }
            Err(e) => {
                warn!("Vote for {bar_name} did not register: {e}");
                VoteOutcome::Failed
            }
        }
    }

    /// Drop a pending vote that was never sent. Counts and guard stay as they were.
    pub fn abandon(&mut self, pending: PendingVote) {
        self.in_flight.remove(&pending.bar_name);
    }

    /// Cast a vote for `bar_name` against `store`.
    ///
    /// A vote already in flight for the same bar reports `AlreadyVoted`.
    pub async fn vote<D: DataStore>(&mut self, bar_name: &str, store: &D) -> VoteOutcome {
        let pending = match self.begin(bar_name) {
            Ok(pending) => pending,
            Err(rejection) => {
                info!("{rejection}");
                return VoteOutcome::AlreadyVoted;
            }
        };
        let result = store.increment_vote(bar_name).await;
        self.complete(pending, result)
    }

    /// The guard backing this ledger.
    pub fn guard(&self) -> &G {
        &self.guard
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use reqwest::StatusCode;

    use super::*;
    use crate::model::Bar;

    #[derive(Debug, Default)]
    struct FakeStore {
        fail: AtomicBool,
        increments: AtomicUsize,
        names: Mutex<Vec<String>>,
    }

    impl DataStore for FakeStore {
        async fn list_bars(&self) -> Result<Vec<Bar>, DataStoreError> {
            Ok(Vec::new())
        }

        async fn list_votes(&self) -> Result<Vec<VoteRecord>, DataStoreError> {
            Ok(Vec::new())
        }

        async fn increment_vote(&self, bar_name: &str) -> Result<(), DataStoreError> {
            self.increments.fetch_add(1, Ordering::SeqCst);
            self.names.lock().unwrap().push(bar_name.to_string());
            if self.fail.load(Ordering::SeqCst) {
                Err(unavailable())
            } else {
                Ok(())
            }
        }
    }

    fn unavailable() -> DataStoreError {
        DataStoreError::Status {
            operation: "increment_vote",
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        }
    }

    fn record(name: &str, count: u64) -> VoteRecord {
        VoteRecord {
            bar_name: name.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn test_vote_then_already_voted() {
        let store = FakeStore::default();
        let mut ledger = VoteLedger::new(MemoryVoteGuard::default());
        ledger.seed(&[record("Breakroom", 4)]);

        assert_eq!(ledger.vote("Breakroom", &store).await, VoteOutcome::Applied);
        assert_eq!(ledger.count("Breakroom"), 5);
        assert!(ledger.has_voted("Breakroom"));

        assert_eq!(ledger.vote("Breakroom", &store).await, VoteOutcome::AlreadyVoted);
        assert_eq!(ledger.count("Breakroom"), 5);
        assert_eq!(store.increments.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_vote_leaves_state_and_allows_retry() {
        let store = FakeStore::default();
        store.fail.store(true, Ordering::SeqCst);
        let mut ledger = VoteLedger::new(MemoryVoteGuard::default());
        ledger.seed(&[record("Breakroom", 4)]);

        assert_eq!(ledger.vote("Breakroom", &store).await, VoteOutcome::Failed);
        assert_eq!(ledger.count("Breakroom"), 4);
        assert!(!ledger.has_voted("Breakroom"));
        assert!(!ledger.is_in_flight("Breakroom"));

        store.fail.store(false, Ordering::SeqCst);
        assert_eq!(ledger.vote("Breakroom", &store).await, VoteOutcome::Applied);
        assert_eq!(ledger.count("Breakroom"), 5);
        assert_eq!(store.increments.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_vote_sends_bar_name() {
        let store = FakeStore::default();
        let mut ledger = VoteLedger::new(MemoryVoteGuard::default());

        ledger.vote("New Spot", &store).await;
        assert_eq!(*store.names.lock().unwrap(), vec!["New Spot".to_string()]);
        assert_eq!(ledger.count("New Spot"), 1);
    }

    #[test]
    fn test_begin_rejects_in_flight_and_voted() {
        let mut ledger = VoteLedger::new(MemoryVoteGuard::default());

        let pending = ledger.begin("Breakroom").unwrap();
        assert_eq!(pending.bar_name(), "Breakroom");
        assert_eq!(
            ledger.begin("Breakroom"),
            Err(VoteRejection::InFlight("Breakroom".to_string()))
        );

        // Other bars are independent.
        let other = ledger.begin("Eagle").unwrap();
        assert_eq!(ledger.complete(other, Err(unavailable())), VoteOutcome::Failed);

        assert_eq!(ledger.complete(pending, Ok(())), VoteOutcome::Applied);
        assert_eq!(
            ledger.begin("Breakroom"),
            Err(VoteRejection::AlreadyVoted("Breakroom".to_string()))
        );
        assert!(ledger.begin("Eagle").is_ok());
    }

    #[test]
    fn test_abandoned_vote_can_start_again() {
        let mut ledger = VoteLedger::new(MemoryVoteGuard::default());
        let pending = ledger.begin("Eagle").unwrap();
        ledger.abandon(pending);

        assert!(!ledger.is_in_flight("Eagle"));
        assert!(!ledger.has_voted("Eagle"));
        assert_eq!(ledger.count("Eagle"), 0);
        assert!(ledger.begin("Eagle").is_ok());
    }

    #[test]
    fn test_ledger_persists_through_file_guard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VOTED_FILE_NAME);

        let mut ledger = VoteLedger::new(FileVoteGuard::open_or_empty(&path));
        let pending = ledger.begin("Breakroom").unwrap();
        ledger.complete(pending, Ok(()));

        let restarted = VoteLedger::new(FileVoteGuard::open_or_empty(&path));
        assert!(restarted.has_voted("Breakroom"));
        assert_eq!(restarted.guard().path(), path.as_path());
    }

    #[test]
    fn test_tally_later_rows_win() {
        let tally = VoteTally::from_records(&[record("A", 1), record("B", 2), record("A", 7)]);
        assert_eq!(tally.get("A"), 7);
        assert_eq!(tally.get("B"), 2);
        assert_eq!(tally.get("C"), 0);
    }

    #[test]
    fn test_counts_never_decrease() {
        let mut tally = VoteTally::default();
        let mut last = 0;
        for _ in 0..10 {
            let next = tally.increment("A");
            assert!(next > last);
            last = next;
        }
    }
}
