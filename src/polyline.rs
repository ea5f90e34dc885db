//! Polyline representation for route geometries.
//!
//! Points are kept decoded as `(lat, lng)` pairs. The persisted form is a
//! JSON list of `[lat, lng]` arrays, produced and parsed at the boundary.

use serde::{Deserialize, Serialize};

/// A polyline representing a route geometry as decoded coordinates.
///
/// Serializes transparently as `[[lat, lng], ...]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    ///
    /// Each point is a (latitude, longitude) tuple.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append `steps + 1` evenly spaced points from `from` to `to`, both ends
    /// included. Consecutive segments therefore repeat their shared vertex.
    pub fn push_segment(&mut self, from: (f64, f64), to: (f64, f64), steps: usize) {
        let steps = steps.max(1);
        self.points.reserve(steps + 1);
        for j in 0..=steps {
            let ratio = j as f64 / steps as f64;
            self.points.push((
                from.0 + (to.0 - from.0) * ratio,
                from.1 + (to.1 - from.1) * ratio,
            ));
        }
    }

    /// Serialize for the `route_polyline` field.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
