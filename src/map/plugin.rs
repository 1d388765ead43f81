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

//! Map plugin that draws bar markers and reports what happened on the map.

use std::collections::BTreeMap;

use eframe::egui;
use poolbars_core::{BarId, BoundingBox, LatLon, MarkerGlyph};
use walkers::{MapMemory, Plugin, Position, Projector};

/// Clicks farther than this from every marker miss.
const HIT_RADIUS: f32 = 18.0;
const MARKER_RADIUS: f32 = 14.0;
const MARKER_FONT_SIZE: f32 = 20.0;

pub fn to_position(point: LatLon) -> Position {
    walkers::lat_lon(point.lat, point.lon)
}

pub fn to_lat_lon(position: Position) -> LatLon {
    LatLon::new(position.y(), position.x())
}

/// What the plugin observed during one frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameReport {
    /// Geographic extent of the map widget
    pub bounds: Option<BoundingBox>,
    /// Marker under the pointer when the map was clicked
    pub clicked: Option<BarId>,
    /// Screen position of the open popup's marker
    pub popup_anchor: Option<egui::Pos2>,
}

/// Draws every placed marker and hit-tests clicks against them.
pub struct BarMarkersPlugin<'a> {
    pub markers: &'a BTreeMap<BarId, (LatLon, MarkerGlyph)>,
    pub popup: Option<(BarId, LatLon)>,
    pub selected: Option<BarId>,
    pub report: &'a mut FrameReport,
}

impl Plugin for BarMarkersPlugin<'_> {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _memory: &MapMemory,
    ) {
        let Self {
            markers,
            popup,
            selected,
            report,
        } = *self;

        let rect = response.rect;
        let top_left = to_lat_lon(projector.unproject(rect.min.to_vec2()));
        let bottom_right = to_lat_lon(projector.unproject(rect.max.to_vec2()));
        report.bounds = Some(BoundingBox::from_corners(top_left, bottom_right));

        let painter = ui.painter().with_clip_rect(rect);
        let click_pos = if response.clicked() {
            response.interact_pointer_pos()
        } else {
            None
        };

        let mut closest: Option<(f32, BarId)> = None;

        for (id, (point, glyph)) in markers {
            let screen = projector.project(to_position(*point)).to_pos2();
            if !rect.expand(MARKER_RADIUS).contains(screen) {
                continue;
            }

            let ring = match glyph {
                MarkerGlyph::LiveTable => egui::Color32::from_rgb(220, 38, 38),
                MarkerGlyph::Default => egui::Color32::from_rgb(55, 65, 81),
            };
            let ring_width = if selected == Some(*id) { 4.0 } else { 2.0 };

            painter.circle_filled(screen, MARKER_RADIUS, egui::Color32::WHITE);
            painter.circle_stroke(screen, MARKER_RADIUS, egui::Stroke::new(ring_width, ring));
            painter.text(
                screen,
                egui::Align2::CENTER_CENTER,
                glyph.as_str(),
                egui::FontId::proportional(MARKER_FONT_SIZE),
                egui::Color32::BLACK,
            );

            if let Some(click) = click_pos {
                let distance = screen.distance(click);
                if distance <= HIT_RADIUS && closest.is_none_or(|(best, _)| distance < best) {
                    closest = Some((distance, *id));
                }
            }
        }

        report.clicked = closest.map(|(_, id)| id);
        report.popup_anchor = popup.map(|(_, point)| projector.project(to_position(point)).to_pos2());
    }
}
