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

//! [`MapSurface`] implementation on top of a `walkers` slippy map.
//!
//! The surface keeps its own marker registry and popup anchor, drives the
//! camera during fly-to animations, and turns per-frame camera state into
//! [`MapEvent`]s.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use eframe::egui;
use log::debug;
use poolbars_core::{
    BarId, BoundingBox, FlyTo, LatLon, MapEvent, MapSurface, MarkerGlyph, WebMercator,
};
use walkers::{HttpTiles, Map, MapMemory};

use super::camera::{CameraPose, Flight, SettleDetector};
use super::plugin::{to_lat_lon, to_position, BarMarkersPlugin, FrameReport};

/// What the UI needs to know after the map was drawn.
#[derive(Debug, Clone, Copy)]
pub struct MapFrame {
    pub clicked: Option<BarId>,
    pub popup_anchor: Option<egui::Pos2>,
}

pub struct WalkersSurface {
    tiles: HttpTiles,
    memory: MapMemory,
    home: LatLon,
    markers: BTreeMap<BarId, (LatLon, MarkerGlyph)>,
    popup: Option<(BarId, LatLon)>,
    bounds: Option<BoundingBox>,
    flight: Option<Flight>,
    settle: SettleDetector,
    loaded: bool,
    events: Vec<MapEvent>,
}

impl fmt::Debug for WalkersSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkersSurface")
            .field("home", &self.home)
            .field("markers", &self.markers.len())
            .field("popup", &self.popup)
            .field("bounds", &self.bounds)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl WalkersSurface {
    pub fn new(tiles: HttpTiles, home: LatLon, zoom: f64) -> Self {
        let mut memory = MapMemory::default();
        memory.center_at(to_position(home));
        if let Err(e) = memory.set_zoom(zoom) {
            debug!("Keeping default zoom, {zoom} rejected: {e:?}");
        }

        Self {
            tiles,
            memory,
            home,
            markers: BTreeMap::new(),
            popup: None,
            bounds: None,
            flight: None,
            settle: SettleDetector::default(),
            loaded: false,
            events: Vec::new(),
        }
    }

    fn pose(&self) -> CameraPose {
        CameraPose {
            center: self.memory.detached().map_or(self.home, to_lat_lon),
            zoom: self.memory.zoom(),
        }
    }

    fn apply(&mut self, pose: CameraPose) {
        self.memory.center_at(to_position(pose.center));
        if let Err(e) = self.memory.set_zoom(pose.zoom) {
            debug!("Zoom {} out of range: {e:?}", pose.zoom);
        }
    }

    /// Advance any running fly-to, draw the map and collect this frame's events.
    pub fn show(&mut self, ui: &mut egui::Ui) -> MapFrame {
        let now = Instant::now();
        if let Some(flight) = self.flight {
            self.apply(flight.sample(now));
            if flight.is_finished(now) {
                self.flight = None;
            } else {
                ui.ctx().request_repaint();
            }
        }

        let mut report = FrameReport::default();
        let response = {
            let plugin = BarMarkersPlugin {
                markers: &self.markers,
                popup: self.popup,
                selected: self.popup.map(|(id, _)| id),
                report: &mut report,
            };
            let map = Map::new(Some(&mut self.tiles), &mut self.memory, to_position(self.home))
                .with_plugin(plugin);
            ui.add(map)
        };

        // Manual panning cancels a fly-to in progress.
        if response.dragged() {
            self.flight = None;
        }

        self.bounds = report.bounds.or(self.bounds);

        let busy = response.dragged() || self.flight.is_some();
        let settled = self.settle.observe(self.pose(), busy);
        if self.bounds.is_some() {
            if !self.loaded {
                self.loaded = true;
                debug!("Map loaded");
                self.events.push(MapEvent::Loaded);
            } else if settled {
                self.events.push(MapEvent::CameraSettled);
            }
        }
        if self.settle.is_moving() {
            ui.ctx().request_repaint();
        }

        MapFrame {
            clicked: report.clicked,
            popup_anchor: report.popup_anchor,
        }
    }

    /// Events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }
}

impl MapSurface for WalkersSurface {
    fn zoom(&self) -> f64 {
        self.memory.zoom()
    }

    fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    fn fly_to(&mut self, target: FlyTo) {
        let destination = CameraPose {
            center: WebMercator::padded_center(target.center, target.zoom, target.padding),
            zoom: target.zoom,
        };
        debug!("Flying to {:?} at zoom {}", target.center, target.zoom);
        self.flight = Some(Flight::new(
            self.pose(),
            destination,
            target.duration,
            Instant::now(),
        ));
    }

    fn place_marker(&mut self, id: BarId, position: LatLon, glyph: MarkerGlyph) {
        self.markers.insert(id, (position, glyph));
    }

    fn update_marker(&mut self, id: BarId, position: LatLon, glyph: MarkerGlyph) {
        if let Some(marker) = self.markers.get_mut(&id) {
            *marker = (position, glyph);
        }
    }

    fn remove_marker(&mut self, id: BarId) {
        self.markers.remove(&id);
    }

    fn open_popup(&mut self, id: BarId, position: LatLon) {
        self.popup = Some((id, position));
    }

    fn close_popup(&mut self) {
        self.popup = None;
    }
}
