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

//! Application state owned by the UI thread.
//!
//! Wires the filter, viewport, marker and vote layers together. Nothing in
//! here draws; the UI reads from it and forwards user input to it.

use chrono::Weekday;
use log::{debug, info};
use poolbars_core::{
    filter_bars, Bar, BarId, ClickOutcome, DataStoreError, FilterCriteria, MapEvent, MapSurface,
    MarkerManager, PendingVote, Snapshot, ViewportSync, VoteGuardStore, VoteLedger, VoteOutcome,
    VoteRejection,
};

/// A short message shown over the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

#[derive(Debug)]
pub struct AppState<G> {
    bars: Vec<Bar>,
    filtered: Vec<Bar>,
    criteria: FilterCriteria,
    today: Weekday,
    loading: bool,
    load_errors: Vec<String>,
    viewport: ViewportSync,
    markers: MarkerManager,
    ledger: VoteLedger<G>,
}

impl<G: VoteGuardStore> AppState<G> {
    pub fn new(ledger: VoteLedger<G>, today: Weekday) -> Self {
        Self {
            bars: Vec::new(),
            filtered: Vec::new(),
            criteria: FilterCriteria::default(),
            today,
            loading: true,
            load_errors: Vec::new(),
            viewport: ViewportSync::new(),
            markers: MarkerManager::new(),
            ledger,
        }
    }

    /// Take in the startup data and put markers on the map.
    pub fn apply_snapshot<S: MapSurface>(&mut self, snapshot: Snapshot, surface: &mut S) {
        let Snapshot {
            bars,
            votes,
            bar_error,
            vote_error,
        } = snapshot;

        self.bars = bars;
        self.ledger.seed(&votes);
        self.load_errors = [
            bar_error.map(|e| format!("Could not load bars: {e}")),
            vote_error.map(|e| format!("Could not load votes: {e}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        self.loading = false;
        info!("{} bars ready", self.bars.len());
        self.refilter(surface);
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load_errors(&self) -> &[String] {
        &self.load_errors
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn today(&self) -> Weekday {
        self.today
    }

    /// Replace the filter selection, refiltering if anything changed.
    pub fn set_criteria<S: MapSurface>(&mut self, criteria: FilterCriteria, surface: &mut S) {
        if criteria != self.criteria {
            self.criteria = criteria;
            self.refilter(surface);
        }
    }

    /// Move to a new day; only matters while free pool tonight is on.
    pub fn set_today<S: MapSurface>(&mut self, today: Weekday, surface: &mut S) {
        if today != self.today {
            debug!("Day changed to {today}");
            self.today = today;
            if self.criteria.free_pool_tonight {
                self.refilter(surface);
            }
        }
    }

    fn refilter<S: MapSurface>(&mut self, surface: &mut S) {
        if self.loading {
            return;
        }
        self.filtered = filter_bars(&self.bars, &self.criteria, self.today);
        debug!("{} of {} bars match", self.filtered.len(), self.bars.len());
        self.markers.reconcile(&self.filtered, surface);
        self.viewport.on_filter_changed(&self.filtered);
    }

    /// Handle a load or camera-settled notification from the map.
    pub fn handle_map_event<S: MapSurface>(&mut self, event: MapEvent, surface: &S) {
        let bounds = surface.bounds();
        match event {
            MapEvent::Loaded => self.viewport.on_loaded(bounds, &self.filtered),
            MapEvent::CameraSettled => self.viewport.on_camera_settled(bounds, &self.filtered),
        };
    }

    pub fn filtered(&self) -> &[Bar] {
        &self.filtered
    }

    /// Bars for the list panel: every match while searching, otherwise the ones on screen.
    pub fn list_bars(&self) -> &[Bar] {
        if self.criteria.query.is_empty() {
            self.viewport.visible()
        } else {
            &self.filtered
        }
    }

    fn find(&self, id: BarId) -> Option<&Bar> {
        self.filtered.iter().find(|bar| bar.id == id)
    }

    pub fn click_marker<S: MapSurface>(&mut self, id: BarId, surface: &mut S) -> Option<ClickOutcome> {
        let bar = self.filtered.iter().find(|bar| bar.id == id)?;
        Some(self.markers.click(bar, surface))
    }

    pub fn select_from_list<S: MapSurface>(&mut self, id: BarId, surface: &mut S) {
        if let Some(bar) = self.filtered.iter().find(|bar| bar.id == id) {
            self.markers.select(bar, surface);
        }
    }

    pub fn close_popup<S: MapSurface>(&mut self, surface: &mut S) {
        self.markers.clear_selection(surface);
    }

    pub fn selection(&self) -> Option<BarId> {
        self.markers.selection()
    }

    /// The bar whose popup is open.
    pub fn popup_bar(&self) -> Option<&Bar> {
        self.markers.popup().and_then(|id| self.find(id))
    }

    pub fn vote_count(&self, bar_name: &str) -> u64 {
        self.ledger.count(bar_name)
    }

    pub fn has_voted(&self, bar_name: &str) -> bool {
        self.ledger.has_voted(bar_name)
    }

    pub fn is_vote_in_flight(&self, bar_name: &str) -> bool {
        self.ledger.is_in_flight(bar_name)
    }

    /// Start a vote, or explain why not.
    pub fn start_vote(&mut self, bar_name: &str) -> Result<PendingVote, Notice> {
        self.ledger.begin(bar_name).map_err(|rejection| match rejection {
            VoteRejection::AlreadyVoted(name) => {
                Notice::info(format!("You already voted for {name}"))
            }
            VoteRejection::InFlight(name) => {
                Notice::info(format!("Still sending your vote for {name}"))
            }
        })
    }

    /// Give up on a vote that could not be handed to the backend.
    pub fn abandon_vote(&mut self, pending: PendingVote) -> Notice {
        let notice = Notice::error(format!(
            "Vote for {} could not be sent, try again",
            pending.bar_name()
        ));
        self.ledger.abandon(pending);
        notice
    }

    /// Apply a finished vote and describe the outcome.
    pub fn finish_vote(
        &mut self,
        pending: PendingVote,
        result: Result<(), DataStoreError>,
    ) -> (VoteOutcome, Notice) {
        let name = pending.bar_name().to_string();
        let outcome = self.ledger.complete(pending, result);
        let notice = match outcome {
            VoteOutcome::Applied => Notice::info(format!("Thanks for voting for {name}!")),
            VoteOutcome::AlreadyVoted => Notice::info(format!("You already voted for {name}")),
            VoteOutcome::Failed => {
                Notice::error(format!("Vote for {name} did not register, try again"))
            }
        };
        (outcome, notice)
    }
}

#[cfg(test)]
mod tests {
    use poolbars_core::datastore::StatusCode;
    use poolbars_core::{
        BoundingBox, FileVoteGuard, FlyTo, FreePoolDays, LatLon, MarkerGlyph, MemoryVoteGuard,
        TableBucket, VoteRecord,
    };

    use super::*;

    #[derive(Debug, Default)]
    struct FakeSurface {
        bounds: Option<BoundingBox>,
        markers: Vec<BarId>,
        popup: Option<BarId>,
        flights: usize,
    }

    impl MapSurface for FakeSurface {
        fn zoom(&self) -> f64 {
            12.0
        }

        fn bounds(&self) -> Option<BoundingBox> {
            self.bounds
        }

        fn fly_to(&mut self, _target: FlyTo) {
            self.flights += 1;
        }

        fn place_marker(&mut self, id: BarId, _position: LatLon, _glyph: MarkerGlyph) {
            self.markers.push(id);
        }

        fn update_marker(&mut self, _id: BarId, _position: LatLon, _glyph: MarkerGlyph) {}

        fn remove_marker(&mut self, id: BarId) {
            self.markers.retain(|m| *m != id);
        }

        fn open_popup(&mut self, id: BarId, _position: LatLon) {
            self.popup = Some(id);
        }

        fn close_popup(&mut self) {
            self.popup = None;
        }
    }

    fn bar(id: BarId, name: &str, lat: f64, lon: f64) -> Bar {
        Bar {
            id,
            name: name.to_string(),
            address: format!("{id} Valencia St"),
            lat: Some(lat),
            lon: Some(lon),
            num_tables: Some(1),
            guinness: false,
            live_table: false,
            website: None,
            free_pool: FreePoolDays::default(),
        }
    }

    fn snapshot() -> Snapshot {
        let mut breakroom = bar(1, "Breakroom", 37.77, -122.42);
        breakroom.num_tables = Some(3);
        breakroom.guinness = true;
        let mut eagle = bar(2, "Eagle", 37.77, -122.41);
        eagle.free_pool.friday = true;
        let far = bar(3, "Far Away", 38.50, -121.50);

        Snapshot {
            bars: vec![breakroom, eagle, far],
            votes: vec![VoteRecord {
                bar_name: "Breakroom".to_string(),
                count: 4,
            }],
            ..Snapshot::default()
        }
    }

    fn city() -> BoundingBox {
        BoundingBox::new(37.70, -122.50, 37.80, -122.40)
    }

    fn loaded() -> (AppState<MemoryVoteGuard>, FakeSurface) {
        let mut state = AppState::new(VoteLedger::new(MemoryVoteGuard::default()), Weekday::Mon);
        let mut surface = FakeSurface {
            bounds: Some(city()),
            ..Default::default()
        };
        state.apply_snapshot(snapshot(), &mut surface);
        state.handle_map_event(MapEvent::Loaded, &surface);
        (state, surface)
    }

    fn ids(bars: &[Bar]) -> Vec<BarId> {
        bars.iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_no_markers_while_loading() {
        let mut state = AppState::new(VoteLedger::new(MemoryVoteGuard::default()), Weekday::Mon);
        let mut surface = FakeSurface::default();

        state.set_criteria(
            FilterCriteria {
                guinness_only: true,
                ..Default::default()
            },
            &mut surface,
        );
        assert!(state.is_loading());
        assert!(surface.markers.is_empty());
    }

    #[test]
    fn test_snapshot_places_markers_and_seeds_votes() {
        let (state, surface) = loaded();

        assert!(!state.is_loading());
        assert_eq!(surface.markers.len(), 3);
        assert_eq!(state.vote_count("Breakroom"), 4);
        assert_eq!(ids(state.list_bars()), vec![1, 2]);
    }

    #[test]
    fn test_list_shows_all_matches_while_searching() {
        let (mut state, mut surface) = loaded();

        state.set_criteria(
            FilterCriteria {
                query: "a".to_string(),
                ..Default::default()
            },
            &mut surface,
        );
        assert_eq!(ids(state.list_bars()), vec![1, 2, 3]);
    }

    #[test]
    fn test_filter_removes_markers_and_closes_popup() {
        let (mut state, mut surface) = loaded();
        state.click_marker(2, &mut surface);
        assert_eq!(state.popup_bar().map(|b| b.id), Some(2));

        state.set_criteria(
            FilterCriteria {
                tables: TableBucket::ThreeOrMore,
                ..Default::default()
            },
            &mut surface,
        );

        assert_eq!(surface.markers, vec![1]);
        assert_eq!(surface.popup, None);
        assert_eq!(state.selection(), None);
        assert_eq!(ids(state.list_bars()), vec![1]);
    }

    #[test]
    fn test_free_pool_follows_the_day() {
        let (mut state, mut surface) = loaded();
        state.set_criteria(
            FilterCriteria {
                free_pool_tonight: true,
                ..Default::default()
            },
            &mut surface,
        );
        assert!(state.filtered().is_empty());

        state.set_today(Weekday::Fri, &mut surface);
        assert_eq!(ids(state.filtered()), vec![2]);
    }

    #[test]
    fn test_click_toggles_and_list_selects() {
        let (mut state, mut surface) = loaded();

        assert_eq!(state.click_marker(1, &mut surface), Some(ClickOutcome::Opened(1)));
        assert_eq!(state.click_marker(1, &mut surface), Some(ClickOutcome::Closed(1)));

        state.select_from_list(1, &mut surface);
        state.select_from_list(1, &mut surface);
        assert_eq!(state.selection(), Some(1));
        assert_eq!(surface.flights, 3);

        state.close_popup(&mut surface);
        assert_eq!(state.popup_bar(), None);
        assert_eq!(state.click_marker(99, &mut surface), None);
    }

    #[test]
    fn test_vote_keeps_selection() {
        let (mut state, mut surface) = loaded();
        state.click_marker(1, &mut surface);

        let pending = state.start_vote("Breakroom").unwrap();
        assert!(state.is_vote_in_flight("Breakroom"));
        assert!(state.start_vote("Breakroom").is_err());

        let (outcome, notice) = state.finish_vote(pending, Ok(()));
        assert_eq!(outcome, VoteOutcome::Applied);
        assert!(!notice.is_error);
        assert_eq!(state.vote_count("Breakroom"), 5);
        assert_eq!(state.selection(), Some(1));

        let again = state.start_vote("Breakroom").unwrap_err();
        assert!(again.text.contains("already voted"));
    }

    #[test]
    fn test_failed_vote_is_an_error_notice() {
        let (mut state, _surface) = loaded();
        let pending = state.start_vote("Eagle").unwrap();
        let failure = DataStoreError::Status {
            operation: "increment_vote",
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };

        let (outcome, notice) = state.finish_vote(pending, Err(failure));
        assert_eq!(outcome, VoteOutcome::Failed);
        assert!(notice.is_error);
        assert!(!state.has_voted("Eagle"));
    }

    #[test]
    fn test_votes_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voted.json");

        let mut state = AppState::new(VoteLedger::new(FileVoteGuard::open_or_empty(&path)), Weekday::Mon);
        let pending = state.start_vote("Eagle").unwrap();
        state.finish_vote(pending, Ok(()));

        let mut restarted =
            AppState::new(VoteLedger::new(FileVoteGuard::open_or_empty(&path)), Weekday::Mon);
        assert!(restarted.has_voted("Eagle"));
        assert!(restarted.start_vote("Eagle").is_err());
    }

    #[test]
    fn test_load_errors_are_kept() {
        let mut state = AppState::new(VoteLedger::new(MemoryVoteGuard::default()), Weekday::Mon);
        let mut surface = FakeSurface::default();
        state.apply_snapshot(
            Snapshot {
                bar_error: Some("timed out".to_string()),
                ..Snapshot::default()
            },
            &mut surface,
        );

        assert_eq!(state.load_errors(), ["Could not load bars: timed out".to_string()]);
        assert!(state.filtered().is_empty());
    }
}
