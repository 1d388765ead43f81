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

//! Background worker for data store calls.
//!
//! A dedicated thread runs a Tokio runtime. It loads the startup snapshot
//! once, then serves vote commands until the UI side goes away. Results come
//! back over a std channel that the UI drains once per frame.

use std::io;
use std::sync::mpsc as std_mpsc;
use std::thread;

use eframe::egui;
use log::{error, info};
use poolbars_core::{load_snapshot, DataStore, DataStoreError, PendingVote, Snapshot};
use tokio::sync::mpsc;

/// Work for the background thread.
#[derive(Debug)]
pub enum BackendCommand {
    Vote(PendingVote),
}

/// Results for the UI thread.
#[derive(Debug)]
pub enum BackendEvent {
    Loaded(Snapshot),
    VoteFinished {
        pending: PendingVote,
        result: Result<(), DataStoreError>,
    },
}

/// Handle to the background worker.
///
/// Dropping it closes the command channel, which stops the worker.
#[derive(Debug)]
pub struct Backend {
    commands: mpsc::UnboundedSender<BackendCommand>,
    events: std_mpsc::Receiver<BackendEvent>,
}

impl Backend {
    /// Start the worker thread for `store`.
    pub fn spawn<D>(store: D, ctx: egui::Context) -> io::Result<Self>
    where
        D: DataStore + Clone + Send + Sync + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = std_mpsc::channel();

        thread::Builder::new()
            .name("poolbars-backend".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!("Failed to start background runtime: {e}");
                        let _ = event_tx.send(BackendEvent::Loaded(Snapshot {
                            bar_error: Some(e.to_string()),
                            ..Snapshot::default()
                        }));
                        ctx.request_repaint();
                        return;
                    }
                };
                runtime.block_on(run(store, command_rx, event_tx, ctx));
            })?;

        Ok(Self {
            commands: command_tx,
            events: event_rx,
        })
    }

    /// Queue a vote. Hands the ticket back if the worker is gone.
    pub fn vote(&self, pending: PendingVote) -> Result<(), PendingVote> {
        self.commands
            .send(BackendCommand::Vote(pending))
            .map_err(|mpsc::error::SendError(BackendCommand::Vote(pending))| pending)
    }

    /// Everything the worker reported since the last call.
    pub fn drain(&self) -> Vec<BackendEvent> {
        self.events.try_iter().collect()
    }
}

async fn run<D>(
    store: D,
    mut commands: mpsc::UnboundedReceiver<BackendCommand>,
    events: std_mpsc::Sender<BackendEvent>,
    ctx: egui::Context,
) where
    D: DataStore + Clone + Send + Sync + 'static,
{
    let snapshot = load_snapshot(&store).await;
    if events.send(BackendEvent::Loaded(snapshot)).is_err() {
        return;
    }
    ctx.request_repaint();

    while let Some(command) = commands.recv().await {
        match command {
            BackendCommand::Vote(pending) => {
                let store = store.clone();
                let events = events.clone();
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    let result = store.increment_vote(pending.bar_name()).await;
                    let _ = events.send(BackendEvent::VoteFinished { pending, result });
                    ctx.request_repaint();
                });
            }
        }
    }

    info!("Backend worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use poolbars_core::{Bar, MemoryVoteGuard, VoteLedger, VoteOutcome, VoteRecord};

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct FakeStore {
        fail_votes: Arc<AtomicBool>,
    }

    impl DataStore for FakeStore {
        async fn list_bars(&self) -> Result<Vec<Bar>, DataStoreError> {
            Ok(vec![breakroom()])
        }

        async fn list_votes(&self) -> Result<Vec<VoteRecord>, DataStoreError> {
            Ok(vec![VoteRecord {
                bar_name: "Breakroom".to_string(),
                count: 2,
            }])
        }

        async fn increment_vote(&self, _bar_name: &str) -> Result<(), DataStoreError> {
            if self.fail_votes.load(Ordering::SeqCst) {
                Err(DataStoreError::Status {
                    operation: "increment_vote",
                    status: poolbars_core::datastore::StatusCode::SERVICE_UNAVAILABLE,
                    body: String::new(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn breakroom() -> Bar {
        Bar {
            id: 1,
            name: "Breakroom".to_string(),
            address: "1 Valencia St".to_string(),
            lat: Some(37.77),
            lon: Some(-122.42),
            num_tables: Some(3),
            guinness: true,
            live_table: false,
            website: None,
            free_pool: poolbars_core::FreePoolDays::default(),
        }
    }

    fn wait_for(backend: &Backend) -> BackendEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(event) = backend.drain().into_iter().next() {
                return event;
            }
            assert!(Instant::now() < deadline, "backend did not answer in time");
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_loads_snapshot_then_votes() {
        let backend = Backend::spawn(FakeStore::default(), egui::Context::default()).unwrap();

        let BackendEvent::Loaded(snapshot) = wait_for(&backend) else {
            panic!("expected the snapshot first");
        };
        assert_eq!(snapshot.bars.len(), 1);
        assert_eq!(snapshot.votes[0].count, 2);

        let mut ledger = VoteLedger::new(MemoryVoteGuard::default());
        ledger.seed(&snapshot.votes);
        backend.vote(ledger.begin("Breakroom").unwrap()).unwrap();

        let BackendEvent::VoteFinished { pending, result } = wait_for(&backend) else {
            panic!("expected a vote result");
        };
        assert_eq!(ledger.complete(pending, result), VoteOutcome::Applied);
        assert_eq!(ledger.count("Breakroom"), 3);
    }

    #[test]
    fn test_failed_vote_is_reported() {
        let store = FakeStore::default();
        store.fail_votes.store(true, Ordering::SeqCst);
        let backend = Backend::spawn(store, egui::Context::default()).unwrap();
        let _ = wait_for(&backend);

        let mut ledger = VoteLedger::new(MemoryVoteGuard::default());
        backend.vote(ledger.begin("Breakroom").unwrap()).unwrap();

        let BackendEvent::VoteFinished { pending, result } = wait_for(&backend) else {
            panic!("expected a vote result");
        };
        assert!(result.is_err());
        assert_eq!(ledger.complete(pending, result), VoteOutcome::Failed);
        assert!(!ledger.has_voted("Breakroom"));
    }
}
