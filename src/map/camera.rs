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

//! Camera animation and settle detection.

use std::time::{Duration, Instant};

use poolbars_core::LatLon;

/// Camera center and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub center: LatLon,
    pub zoom: f64,
}

/// An in-progress animated camera move.
#[derive(Debug, Clone, Copy)]
pub struct Flight {
    from: CameraPose,
    to: CameraPose,
    started: Instant,
    duration: Duration,
}

impl Flight {
    pub fn new(from: CameraPose, to: CameraPose, duration: Duration, started: Instant) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    /// Final pose of the flight
    pub fn destination(&self) -> CameraPose {
        self.to
    }

    /// Fraction of the flight completed at `now`, clamped to `0..=1`.
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Camera pose at `now`.
    pub fn sample(&self, now: Instant) -> CameraPose {
        let t = ease_in_out(self.progress(now));
        CameraPose {
            center: LatLon::new(
                lerp(self.from.center.lat, self.to.center.lat, t),
                lerp(self.from.center.lon, self.to.center.lon, t),
            ),
            zoom: lerp(self.from.zoom, self.to.zoom, t),
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Cubic ease-in-out over `0..=1`.
fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Notices when the camera stops moving.
///
/// Feed it the pose once per frame; it reports a settle on the first still
/// frame after any movement.
#[derive(Debug, Default)]
pub struct SettleDetector {
    last: Option<CameraPose>,
    moving: bool,
}

impl SettleDetector {
    /// Record this frame's pose. `busy` marks frames where the user is still
    /// dragging or an animation is running.
    pub fn observe(&mut self, pose: CameraPose, busy: bool) -> bool {
        let changed = self.last.is_some_and(|last| !same_pose(last, pose));
        self.last = Some(pose);

        if changed || busy {
            self.moving = true;
            return false;
        }

        std::mem::take(&mut self.moving)
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }
}

fn same_pose(a: CameraPose, b: CameraPose) -> bool {
    const EPSILON: f64 = 1e-9;
    (a.center.lat - b.center.lat).abs() < EPSILON
        && (a.center.lon - b.center.lon).abs() < EPSILON
        && (a.zoom - b.zoom).abs() < EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(lat: f64, lon: f64, zoom: f64) -> CameraPose {
        CameraPose {
            center: LatLon::new(lat, lon),
            zoom,
        }
    }

    #[test]
    fn test_flight_endpoints() {
        let start = Instant::now();
        let flight = Flight::new(
            pose(37.70, -122.50, 12.0),
            pose(37.80, -122.40, 14.0),
            Duration::from_millis(1200),
            start,
        );

        assert_eq!(flight.sample(start), pose(37.70, -122.50, 12.0));
        let end = flight.sample(start + Duration::from_millis(1200));
        assert!((end.zoom - 14.0).abs() < 1e-9);
        assert!((end.center.lat - 37.80).abs() < 1e-9);
        assert!(flight.is_finished(start + Duration::from_secs(2)));
        assert!(!flight.is_finished(start + Duration::from_millis(600)));
    }

    #[test]
    fn test_flight_midpoint_and_monotonic() {
        let start = Instant::now();
        let flight = Flight::new(
            pose(0.0, 0.0, 10.0),
            pose(1.0, 1.0, 14.0),
            Duration::from_millis(1000),
            start,
        );

        let mid = flight.sample(start + Duration::from_millis(500));
        assert!((mid.zoom - 12.0).abs() < 1e-9);

        let mut last = 10.0;
        for ms in (0..=1000).step_by(50) {
            let zoom = flight.sample(start + Duration::from_millis(ms)).zoom;
            assert!(zoom >= last);
            last = zoom;
        }
    }

    #[test]
    fn test_zero_duration_lands_immediately() {
        let start = Instant::now();
        let flight = Flight::new(pose(0.0, 0.0, 10.0), pose(1.0, 1.0, 14.0), Duration::ZERO, start);
        assert_eq!(flight.sample(start), flight.destination());
    }

    #[test]
    fn test_settle_after_movement() {
        let mut detector = SettleDetector::default();

        assert!(!detector.observe(pose(0.0, 0.0, 12.0), false));
        assert!(!detector.observe(pose(0.1, 0.0, 12.0), false));
        assert!(detector.is_moving());
        assert!(detector.observe(pose(0.1, 0.0, 12.0), false));
        assert!(!detector.observe(pose(0.1, 0.0, 12.0), false));
    }

    #[test]
    fn test_busy_frames_delay_settle() {
        let mut detector = SettleDetector::default();
        detector.observe(pose(0.0, 0.0, 12.0), false);

        // Holding the map still while dragging is not a settle.
        assert!(!detector.observe(pose(0.0, 0.0, 12.0), true));
        assert!(!detector.observe(pose(0.0, 0.0, 12.0), true));
        assert!(detector.observe(pose(0.0, 0.0, 12.0), false));
    }

    #[test]
    fn test_zoom_change_counts_as_movement() {
        let mut detector = SettleDetector::default();
        detector.observe(pose(0.0, 0.0, 12.0), false);
        assert!(!detector.observe(pose(0.0, 0.0, 12.5), false));
        assert!(detector.observe(pose(0.0, 0.0, 12.5), false));
    }
}
