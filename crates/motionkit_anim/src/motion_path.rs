// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion path sampling.
//!
//! A path is a time-stamped point sequence. Each segment is either linear or
//! a cubic bezier, decided per segment by the handles present on its two
//! endpoints, so one path can mix both kinds.

use crate::keyframe::{by_time, Interpolation};
use serde::{Deserialize, Serialize};

/// Bezier handle, relative to the point it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PathHandle {
    /// Horizontal offset
    pub x: f64,
    /// Vertical offset
    pub y: f64,
}

impl PathHandle {
    /// Create a handle offset
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point on a motion path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionPathPoint {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
    /// Time in seconds at which the layer reaches this point
    pub time: f64,
    /// Incoming handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_in: Option<PathHandle>,
    /// Outgoing handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_out: Option<PathHandle>,
}

impl MotionPathPoint {
    /// Create a point without handles
    pub fn new(x: f64, y: f64, time: f64) -> Self {
        Self {
            x,
            y,
            time,
            handle_in: None,
            handle_out: None,
        }
    }

    /// Set both handles
    pub fn with_handles(mut self, handle_in: PathHandle, handle_out: PathHandle) -> Self {
        self.handle_in = Some(handle_in);
        self.handle_out = Some(handle_out);
        self
    }

    /// Set the incoming handle
    pub fn with_handle_in(mut self, handle: PathHandle) -> Self {
        self.handle_in = Some(handle);
        self
    }

    /// Set the outgoing handle
    pub fn with_handle_out(mut self, handle: PathHandle) -> Self {
        self.handle_out = Some(handle);
        self
    }
}

/// A time-sampled 2D trajectory
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionPath {
    /// Path points, in any order
    pub points: Vec<MotionPathPoint>,
    /// Reserved; sampling ignores it
    #[serde(default)]
    pub closed: bool,
    /// Whether sampling reports the tangent heading
    #[serde(default)]
    pub auto_orient: bool,
}

impl MotionPath {
    /// Create a path from points
    pub fn new(points: Vec<MotionPathPoint>) -> Self {
        Self {
            points,
            closed: false,
            auto_orient: false,
        }
    }

    /// Enable or disable auto-orient
    pub fn with_auto_orient(mut self, auto_orient: bool) -> Self {
        self.auto_orient = auto_orient;
        self
    }

    /// Earliest and latest point times
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let sorted = self.sorted_points();
        Some((sorted.first()?.time, sorted.last()?.time))
    }

    /// Time spanned by the path, 0 when it has fewer than two points
    pub fn duration(&self) -> f64 {
        self.time_range().map_or(0.0, |(start, end)| end - start)
    }

    /// Sample the path at `time`
    pub fn evaluate(&self, time: f64) -> PathSample {
        evaluate(self, time)
    }

    /// Sample `steps + 1` evenly spaced positions across the path's time range.
    ///
    /// Used to draw a preview polyline.
    pub fn sample_polyline(&self, steps: usize) -> Vec<(f64, f64)> {
        let Some((start, end)) = self.time_range() else {
            return Vec::new();
        };
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| {
                let time = Interpolation::lerp(start, end, i as f64 / steps as f64);
                let sample = evaluate(self, time);
                (sample.x, sample.y)
            })
            .collect()
    }

    fn sorted_points(&self) -> Vec<&MotionPathPoint> {
        let mut sorted: Vec<&MotionPathPoint> = self.points.iter().collect();
        sorted.sort_by(|a, b| by_time(a.time, b.time));
        sorted
    }
}

/// Position (and heading) sampled from a motion path
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PathSample {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
    /// Tangent heading in degrees; `None` unless the path auto-orients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl PathSample {
    fn at(point: &MotionPathPoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
            rotation: None,
        }
    }
}

/// Sample `path` at `time`.
///
/// Before the first point or at/after the last, the sample clamps to that
/// point's position with no rotation.
pub fn evaluate(path: &MotionPath, time: f64) -> PathSample {
    let sorted = path.sorted_points();

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return PathSample::default();
    };

    if time < first.time {
        return PathSample::at(first);
    }
    if time >= last.time {
        return PathSample::at(last);
    }

    let segment = sorted
        .windows(2)
        .map(|pair| (pair[0], pair[1]))
        .find(|(current, next)| current.time <= time && time <= next.time);

    let Some((current, next)) = segment else {
        return PathSample::at(last);
    };

    let u = Interpolation::progress(current.time, next.time, time);
    let (x, y, tangent) = match (current.handle_out, next.handle_in) {
        (Some(handle_out), Some(handle_in)) => {
            let x = CubicAxis::new(current.x, handle_out.x, next.x, handle_in.x);
            let y = CubicAxis::new(current.y, handle_out.y, next.y, handle_in.y);
            (x.position(u), y.position(u), (x.tangent(u), y.tangent(u)))
        }
        _ => (
            Interpolation::lerp(current.x, next.x, u),
            Interpolation::lerp(current.y, next.y, u),
            (next.x - current.x, next.y - current.y),
        ),
    };

    PathSample {
        x,
        y,
        rotation: path.auto_orient.then(|| heading(tangent)),
    }
}

/// Heading of a tangent vector in degrees
fn heading((dx, dy): (f64, f64)) -> f64 {
    dy.atan2(dx).to_degrees()
}

/// One axis of a bezier segment, with handles resolved to absolute control points
struct CubicAxis {
    p0: f64,
    p1: f64,
    p2: f64,
    p3: f64,
}

impl CubicAxis {
    fn new(start: f64, handle_out: f64, end: f64, handle_in: f64) -> Self {
        Self {
            p0: start,
            p1: start + handle_out,
            p2: end + handle_in,
            p3: end,
        }
    }

    fn position(&self, u: f64) -> f64 {
        Interpolation::bezier(self.p0, self.p1, self.p2, self.p3, u)
    }

    fn tangent(&self, u: f64) -> f64 {
        Interpolation::bezier_derivative(self.p0, self.p1, self.p2, self.p3, u)
    }
}
