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

//! Tracks which filtered bars are currently on screen.
//!
//! The visible list is recomputed when the map finishes loading, when the
//! camera settles, and when the filtered list changes while the camera is
//! still. Until the map has produced bounds once, nothing is visible.

use log::debug;

use crate::geo::BoundingBox;
use crate::model::{Bar, BarId};

/// Bars whose coordinate lies inside `bounds`, edges included, in input order.
///
/// Bars without a usable coordinate are never inside any box.
#[must_use]
pub fn bars_in_bounds(bars: &[Bar], bounds: &BoundingBox) -> Vec<Bar> {
    bars.iter()
        .filter(|bar| bar.position().is_some_and(|p| bounds.contains(p)))
        .cloned()
        .collect()
}

/// On-screen subset of the filtered bars.
#[derive(Debug, Default)]
pub struct ViewportSync {
    bounds: Option<BoundingBox>,
    visible: Vec<Bar>,
}

impl ViewportSync {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The map finished its initial load.
    pub fn on_loaded(&mut self, bounds: Option<BoundingBox>, filtered: &[Bar]) -> bool {
        self.on_bounds(bounds, filtered)
    }

    /// The camera stopped moving.
    pub fn on_camera_settled(&mut self, bounds: Option<BoundingBox>, filtered: &[Bar]) -> bool {
        self.on_bounds(bounds, filtered)
    }

    /// The filtered list changed while the camera was stationary.
    pub fn on_filter_changed(&mut self, filtered: &[Bar]) -> bool {
        match self.bounds {
            Some(bounds) => self.replace(bars_in_bounds(filtered, &bounds)),
            None => false,
        }
    }

    fn on_bounds(&mut self, bounds: Option<BoundingBox>, filtered: &[Bar]) -> bool {
        // A surface without a projection yet reports no bounds; keep the last known box.
        let Some(bounds) = bounds.or(self.bounds) else {
            return false;
        };
        self.bounds = Some(bounds);
        self.replace(bars_in_bounds(filtered, &bounds))
    }

    fn replace(&mut self, visible: Vec<Bar>) -> bool {
        if visible == self.visible {
            return false;
        }
        debug!("{} bars in view", visible.len());
        self.visible = visible;
        true
    }

    /// Whether the map has reported bounds at least once.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.bounds.is_some()
    }

    /// The last bounds the map reported.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Bars currently on screen.
    #[must_use]
    pub fn visible(&self) -> &[Bar] {
        &self.visible
    }

    /// Whether the bar with `id` is currently on screen.
    #[must_use]
    pub fn is_visible(&self, id: BarId) -> bool {
        self.visible.iter().any(|bar| bar.id == id)
    }
}
