//! Travel distance and time estimation over resolved points.
//!
//! Straight segments between consecutive points; no road network.

use crate::distance::equirectangular_km;
use crate::error::EstimateError;
use crate::model::{ResolvedPoint, RoadType, TransportMethod};
use crate::polyline::Polyline;

/// Minimum interpolation steps per segment.
pub const MIN_SEGMENT_STEPS: usize = 10;

/// Interpolation steps per kilometre of segment length.
pub const STEPS_PER_KM: f64 = 10.0;

/// Assumed speed in km/h for a vehicle on a given class of road.
pub fn speed_kmh(method: TransportMethod, road: RoadType) -> f64 {
    use RoadType::*;
    use TransportMethod::*;

    match (method, road) {
        (Car, Street) => 40.0,
        (Car, MainStreet) => 50.0,
        (Car, Boulevard) => 45.0,
        (Car, Highway) => 80.0,
        (Motorcycle, Street) => 35.0,
        (Motorcycle, MainStreet) => 45.0,
        (Motorcycle, Boulevard) => 40.0,
        (Motorcycle, Highway) => 70.0,
        (Scooter, _) => 25.0,
        (Bicycle, Street) => 18.0,
        (Bicycle, MainStreet) => 15.0,
        (Bicycle, Boulevard) => 20.0,
        (Bicycle, Highway) => 12.0,
    }
}

/// Interpolation steps for a segment of the given length.
pub fn segment_steps(distance_km: f64) -> usize {
    MIN_SEGMENT_STEPS.max((distance_km * STEPS_PER_KM).floor() as usize)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteEstimate {
    pub polyline: Polyline,
    pub distance_km: f64,
    pub duration_minutes: f64,
}

/// Estimate the path through `points` in order.
///
/// The destination point of each segment sets the road class, and thus the
/// speed, for the whole segment.
pub fn estimate(
    points: &[ResolvedPoint],
    method: TransportMethod,
) -> Result<RouteEstimate, EstimateError> {
    if points.len() < 2 {
        return Err(EstimateError::TooFewPoints(points.len()));
    }

    let mut polyline = Polyline::default();
    let mut distance_km = 0.0;
    let mut duration_minutes = 0.0;

    for pair in points.windows(2) {
        let (start, end) = (pair[0], pair[1]);

        let segment_km = equirectangular_km(start.coords(), end.coords());
        distance_km += segment_km;
        duration_minutes += segment_km / speed_kmh(method, end.road_type) * 60.0;

        polyline.push_segment(start.coords(), end.coords(), segment_steps(segment_km));
    }

    Ok(RouteEstimate {
        polyline,
        distance_km,
        duration_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64, road_type: RoadType) -> ResolvedPoint {
        ResolvedPoint::new(lat, lng, road_type)
    }

    #[test]
    fn test_needs_two_points() {
        let single = [point(32.0, 34.0, RoadType::Street)];
        assert_eq!(
            estimate(&single, TransportMethod::Car),
            Err(EstimateError::TooFewPoints(1))
        );
        assert_eq!(
            estimate(&[], TransportMethod::Car),
            Err(EstimateError::TooFewPoints(0))
        );
    }

    #[test]
    fn test_short_segment_uses_minimum_steps() {
        let points = [
            point(32.0819, 34.7816, RoadType::MainStreet),
            point(32.0871, 34.7769, RoadType::MainStreet),
        ];
        let estimate = estimate(&points, TransportMethod::Car).unwrap();
        assert_eq!(estimate.polyline.len(), MIN_SEGMENT_STEPS + 1);
        assert_eq!(estimate.polyline.points()[0], points[0].coords());
        assert_eq!(*estimate.polyline.points().last().unwrap(), points[1].coords());
    }

    #[test]
    fn test_long_segment_gets_denser_sampling() {
        assert_eq!(segment_steps(0.3), 10);
        assert_eq!(segment_steps(1.09), 10);
        assert_eq!(segment_steps(2.55), 25);
        assert_eq!(segment_steps(54.0), 540);
    }

    #[test]
    fn test_destination_road_type_sets_speed() {
        // 1.11 km due north.
        let start = point(32.0, 34.0, RoadType::Street);
        let on_highway = point(32.01, 34.0, RoadType::Highway);
        let on_street = point(32.01, 34.0, RoadType::Street);

        let fast = estimate(&[start, on_highway], TransportMethod::Car).unwrap();
        let slow = estimate(&[start, on_street], TransportMethod::Car).unwrap();

        assert!((fast.duration_minutes - 1.11 / 80.0 * 60.0).abs() < 1e-9);
        assert!((slow.duration_minutes - 1.11 / 40.0 * 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_multi_segment_accumulates() {
        let points = [
            point(32.0, 34.0, RoadType::Street),
            point(32.01, 34.0, RoadType::MainStreet),
            point(32.02, 34.0, RoadType::MainStreet),
        ];
        let estimate = estimate(&points, TransportMethod::Bicycle).unwrap();
        assert!((estimate.distance_km - 2.22).abs() < 1e-9);
        assert!((estimate.duration_minutes - 2.22 / 15.0 * 60.0).abs() < 1e-9);
        // 1.11 km segments take 11 steps, one above the minimum.
        assert_eq!(estimate.polyline.len(), 2 * (segment_steps(1.11) + 1));
        assert_eq!(segment_steps(1.11), MIN_SEGMENT_STEPS + 1);
    }

    #[test]
    fn test_scooter_speed_is_flat() {
        for road in [RoadType::Street, RoadType::MainStreet, RoadType::Boulevard, RoadType::Highway] {
            assert_eq!(speed_kmh(TransportMethod::Scooter, road), 25.0);
        }
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let points = [
            point(32.0819, 34.7816, RoadType::MainStreet),
            point(32.0117, 34.7628, RoadType::MainStreet),
        ];
        let first = estimate(&points, TransportMethod::Motorcycle).unwrap();
        let second = estimate(&points, TransportMethod::Motorcycle).unwrap();
        assert_eq!(first, second);
    }
}
