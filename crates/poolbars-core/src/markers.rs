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

//! Marker and popup lifecycle.
//!
//! [`MarkerManager`] keeps the markers on a [`MapSurface`] in step with the
//! filtered bar list and owns the selection. Each bar's marker moves through
//! `ABSENT -> PLACED -> REMOVED`; a placed marker whose bar changed is
//! updated in place. At most one popup is open at any time.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use log::{debug, info};

use crate::geo::{BoundingBox, EdgePadding, LatLon};
use crate::model::{Bar, BarId};

/// Zoom level the camera flies to (at least) when a popup opens.
pub const DETAIL_ZOOM: f64 = 14.0;

/// Length of the fly-to animation when a popup opens.
pub const FLY_TO_DURATION: Duration = Duration::from_millis(1200);

/// Header chrome height the camera keeps the selected marker below.
pub const POPUP_TOP_PADDING: f32 = 300.0;

/// Label drawn for a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerGlyph {
    /// The bar has a live table tonight.
    LiveTable,
    /// Regular pool bar.
    Default,
}

impl MarkerGlyph {
    #[must_use]
    pub fn for_bar(bar: &Bar) -> Self {
        if bar.live_table {
            MarkerGlyph::LiveTable
        } else {
            MarkerGlyph::Default
        }
    }

    /// Emoji rendered as the marker label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerGlyph::LiveTable => "📣",
            MarkerGlyph::Default => "🎱",
        }
    }
}

/// An animated camera transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub center: LatLon,
    pub zoom: f64,
    pub duration: Duration,
    pub padding: EdgePadding,
}

/// Notifications a map surface raises between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    /// The map rendered for the first time and has bounds.
    Loaded,
    /// The camera stopped moving after a pan, zoom or fly-to.
    CameraSettled,
}

/// The map widget as seen by the lifecycle manager.
///
/// Implement this trait to drive markers and popups on a concrete map.
pub trait MapSurface {
    /// Current camera zoom.
    fn zoom(&self) -> f64;

    /// Visible region, `None` until the map has rendered once.
    fn bounds(&self) -> Option<BoundingBox>;

    /// Start an animated camera move.
    fn fly_to(&mut self, target: FlyTo);

    /// Attach a new marker for `id`.
    fn place_marker(&mut self, id: BarId, position: LatLon, glyph: MarkerGlyph);

    /// Change an attached marker without recreating it.
    fn update_marker(&mut self, id: BarId, position: LatLon, glyph: MarkerGlyph);

    /// Detach the marker for `id`.
    fn remove_marker(&mut self, id: BarId);

    /// Anchor the popup for `id` at `position`.
    fn open_popup(&mut self, id: BarId, position: LatLon);

    /// Detach the open popup, if any.
    fn close_popup(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlacedMarker {
    position: LatLon,
    glyph: MarkerGlyph,
}

/// Surface calls made by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub placed: usize,
    pub updated: usize,
    pub removed: usize,
    /// The popup was force-closed because its bar was filtered out.
    pub popup_closed: bool,
}

impl ReconcileReport {
    /// Whether the pass touched the surface at all.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of clicking a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The bar became active and its popup opened.
    Opened(BarId),
    /// The bar was already active; selection cleared and popup closed.
    Closed(BarId),
}

/// Reconciles markers with the filtered list and owns the selection.
#[derive(Debug, Default)]
pub struct MarkerManager {
    markers: BTreeMap<BarId, PlacedMarker>,
    selection: Option<BarId>,
    popup: Option<BarId>,
}

impl MarkerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active bar, if any.
    #[must_use]
    pub fn selection(&self) -> Option<BarId> {
        self.selection
    }

    /// The bar whose popup is open, if any.
    #[must_use]
    pub fn popup(&self) -> Option<BarId> {
        self.popup
    }

    /// Whether a marker is placed for `id`.
    #[must_use]
    pub fn is_placed(&self, id: BarId) -> bool {
        self.markers.contains_key(&id)
    }

    /// Number of placed markers.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Bring the surface in line with `filtered`.
    ///
    /// Running this twice with the same input makes no surface calls the
    /// second time.
    pub fn reconcile<S: MapSurface>(&mut self, filtered: &[Bar], surface: &mut S) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let wanted: BTreeMap<BarId, PlacedMarker> = filtered
            .iter()
            .filter_map(|bar| {
                bar.position().map(|position| {
                    (
                        bar.id,
                        PlacedMarker {
                            position,
                            glyph: MarkerGlyph::for_bar(bar),
                        },
                    )
                })
            })
            .collect();

        let stale: Vec<BarId> = self
            .markers
            .keys()
            .filter(|id| !wanted.contains_key(id))
            .copied()
            .collect();
        for id in stale {
            surface.remove_marker(id);
            self.markers.remove(&id);
            report.removed += 1;
        }

        for (id, marker) in wanted {
            match self.markers.get(&id) {
                None => {
                    surface.place_marker(id, marker.position, marker.glyph);
                    self.markers.insert(id, marker);
                    report.placed += 1;
                }
                Some(existing) if *existing != marker => {
                    surface.update_marker(id, marker.position, marker.glyph);
                    self.markers.insert(id, marker);
                    report.updated += 1;
                }
                Some(_) => {}
            }
        }

        if let Some(active) = self.selection {
            let still_listed: BTreeSet<BarId> = filtered.iter().map(|bar| bar.id).collect();
            if !still_listed.contains(&active) {
                info!("Bar {active} no longer matches the filters, closing its popup");
                report.popup_closed = self.popup.is_some();
                self.close(surface);
                self.selection = None;
            }
        }

        if !report.is_noop() {
            debug!(
                "Markers reconciled: {} placed, {} updated, {} removed",
                report.placed, report.updated, report.removed
            );
        }

        report
    }

    /// Handle a click on `bar`'s marker: toggles the selection.
    pub fn click<S: MapSurface>(&mut self, bar: &Bar, surface: &mut S) -> ClickOutcome {
        if self.selection == Some(bar.id) {
            self.clear_selection(surface);
            ClickOutcome::Closed(bar.id)
        } else {
            self.select(bar, surface);
            ClickOutcome::Opened(bar.id)
        }
    }

    /// Make `bar` active, open its popup and fly to it.
    ///
    /// Unlike a marker click this never toggles. A bar without coordinates
    /// becomes active without a popup.
    pub fn select<S: MapSurface>(&mut self, bar: &Bar, surface: &mut S) {
        self.close(surface);
        self.selection = Some(bar.id);

        let Some(position) = bar.position() else {
            debug!("Bar {} has no coordinates, selecting without popup", bar.id);
            return;
        };

        surface.open_popup(bar.id, position);
        self.popup = Some(bar.id);

        surface.fly_to(FlyTo {
            center: position,
            zoom: surface.zoom().max(DETAIL_ZOOM),
            duration: FLY_TO_DURATION,
            padding: EdgePadding::top(POPUP_TOP_PADDING),
        });
    }

    /// Clear the selection and close the popup.
    pub fn clear_selection<S: MapSurface>(&mut self, surface: &mut S) {
        self.close(surface);
        self.selection = None;
    }

    fn close<S: MapSurface>(&mut self, surface: &mut S) {
        if self.popup.take().is_some() {
            surface.close_popup();
        }
    }
}
