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

//! Core logic for the pool bars map.
//!
//! This library holds everything the map application does that is not
//! drawing pixels. Each layer can be used independently and is driven
//! through small traits, so none of it needs a live network or map widget:
//!
//! - **Model**: bar records and vote rows as the data store returns them
//! - **Filter layer**: the name/table/amenity predicate over the bar list
//! - **Viewport layer**: which filtered bars are inside the visible bounds
//! - **Marker layer**: marker reconciliation and the single open popup,
//!   driven against any [`MapSurface`]
//! - **Vote layer**: the vote tally and the one-vote-per-bar guard
//! - **Data store layer**: the [`DataStore`] trait and a Supabase REST client
//!
//! # Filtering
//!
//! ```
//! use chrono::Weekday;
//! use poolbars_core::{filter_bars, Bar, FilterCriteria, TableBucket};
//!
//! let bars: Vec<Bar> = serde_json::from_str(
//!     r#"[{"id": 1, "name": "Breakroom", "address": "1 Main St",
//!          "lat": 37.77, "long": -122.43, "num_tables": 3,
//!          "guinness": true, "live_table": false}]"#,
//! )
//! .unwrap();
//!
//! let criteria = FilterCriteria {
//!     tables: TableBucket::ThreeOrMore,
//!     guinness_only: true,
//!     ..Default::default()
//! };
//! assert_eq!(filter_bars(&bars, &criteria, Weekday::Mon).len(), 1);
//! ```
//!
//! # Voting
//!
//! ```no_run
//! use poolbars_core::{MemoryVoteGuard, SupabaseClient, SupabaseConfig, VoteLedger};
//!
//! # async fn example() -> Result<(), poolbars_core::DataStoreError> {
//! let store = SupabaseClient::new(SupabaseConfig::new(
//!     "https://example.supabase.co",
//!     "public-anon-key",
//! ))?;
//! let mut ledger = VoteLedger::new(MemoryVoteGuard::default());
//! let outcome = ledger.vote("Breakroom", &store).await;
//! println!("{outcome:?}, now at {}", ledger.count("Breakroom"));
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod datastore;
pub mod filter;
pub mod geo;
pub mod markers;
pub mod model;
pub mod secrets;
pub mod viewport;
pub mod votes;

pub use clock::{Clock, FixedClock, LocalClock};
pub use datastore::{
    load_snapshot, DataStore, DataStoreError, RetryPolicy, Snapshot, SupabaseClient,
    SupabaseConfig,
};
pub use filter::{filter_bars, FilterCriteria, ParseBucketError, TableBucket};
pub use geo::{BoundingBox, EdgePadding, LatLon, WebMercator};
pub use markers::{
    ClickOutcome, FlyTo, MapEvent, MapSurface, MarkerGlyph, MarkerManager, ReconcileReport,
};
pub use model::{Bar, BarId, FreePoolDays, VoteRecord};
pub use secrets::{ConfiguredSecrets, Secrets, StartupError};
pub use viewport::{bars_in_bounds, ViewportSync};
pub use votes::{
    FileVoteGuard, MemoryVoteGuard, PendingVote, VoteGuardError, VoteGuardStore, VoteLedger,
    VoteOutcome, VoteRejection, VoteTally,
};
