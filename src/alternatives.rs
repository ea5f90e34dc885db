//! Single-detour alternatives for routes with poor shelter coverage.
//!
//! Greedy and deliberately simple: each candidate is start → shelter → end
//! through one of the first few shelters in the region, in table order. No
//! attempt is made to minimise added time or maximise coverage.

use tracing::debug;

use crate::distance::{equirectangular_km, planar_km};
use crate::error::AlternativeGenerationError;
use crate::model::{
    round_minutes, round_tenth, AlternativeRoute, LatLng, ResolvedPoint, Shelter, TransportMethod,
};
use crate::polyline::Polyline;
use crate::scorer::shelters_near;

/// Shelters farther than this from either endpoint are out of the region.
pub const REGION_RADIUS_KM: f64 = 15.0;

/// Fewer region shelters than this and no alternatives are offered.
pub const MIN_REGION_SHELTERS: usize = 2;

pub const MAX_CANDIDATES: usize = 3;
pub const MAX_ALTERNATIVES: usize = 2;

/// Fixed interpolation steps per detour segment.
pub const DETOUR_STEPS: usize = 15;

/// Fixed search radius for detours, independent of transport method.
pub const DETOUR_RADIUS_M: f64 = 600.0;

/// Detour legs are assumed to run on main streets.
pub fn main_street_speed_kmh(method: TransportMethod) -> f64 {
    match method {
        TransportMethod::Car => 50.0,
        TransportMethod::Motorcycle => 45.0,
        TransportMethod::Scooter => 25.0,
        TransportMethod::Bicycle => 15.0,
    }
}

/// Score in `[30, 100]`: 30 plus 20 per shelter found along the detour.
pub fn detour_score(shelter_count: usize) -> u8 {
    let count = u32::try_from(shelter_count).unwrap_or(u32::MAX);
    count.saturating_mul(20).saturating_add(30).min(100) as u8
}

/// Shelters within the region radius of both `start` and `end`, in input order.
pub fn region_shelters<'a>(
    start: (f64, f64),
    end: (f64, f64),
    shelters: &'a [Shelter],
) -> Vec<&'a Shelter> {
    shelters
        .iter()
        .filter(|shelter| {
            planar_km(start, shelter.coords()) < REGION_RADIUS_KM
                && planar_km(end, shelter.coords()) < REGION_RADIUS_KM
        })
        .collect()
}

/// Up to two detours through shelters near the original route.
///
/// `points` are the original route's resolved points; only the first and
/// last are used. `original_minutes` is the unrounded original duration.
pub fn generate_alternatives(
    points: &[ResolvedPoint],
    method: TransportMethod,
    shelters: &[Shelter],
    original_minutes: f64,
) -> Result<Vec<AlternativeRoute>, AlternativeGenerationError> {
    let (start, end) = match (points.first(), points.last()) {
        (Some(start), Some(end)) if points.len() >= 2 => (start.coords(), end.coords()),
        _ => return Err(AlternativeGenerationError::MissingEndpoints),
    };

    let region = region_shelters(start, end, shelters);
    if region.len() < MIN_REGION_SHELTERS {
        debug!(region = region.len(), "not enough shelters in region for alternatives");
        return Ok(Vec::new());
    }

    let mut alternatives = Vec::new();
    for (index, via) in region.into_iter().take(MAX_CANDIDATES).enumerate() {
        let alternative = detour(index, start, end, via, method, shelters, original_minutes);
        if alternative.shelter_count > 0 {
            alternatives.push(alternative);
        }
    }
    alternatives.truncate(MAX_ALTERNATIVES);

    Ok(alternatives)
}

fn detour(
    index: usize,
    start: (f64, f64),
    end: (f64, f64),
    via: &Shelter,
    method: TransportMethod,
    shelters: &[Shelter],
    original_minutes: f64,
) -> AlternativeRoute {
    let waypoint = via.coords();
    let speed = main_street_speed_kmh(method);
    let mut polyline = Polyline::default();
    let mut distance_km = 0.0;
    let mut minutes = 0.0;

    for (from, to) in [(start, waypoint), (waypoint, end)] {
        let segment_km = equirectangular_km(from, to);
        distance_km += segment_km;
        minutes += segment_km / speed * 60.0;
        polyline.push_segment(from, to, DETOUR_STEPS);
    }

    let found = shelters_near(&polyline, shelters, DETOUR_RADIUS_M);
    let shelter_count = found.len() as u32;
    let via_name = if via.name.trim().is_empty() {
        "nearby shelter"
    } else {
        via.name.as_str()
    };

    AlternativeRoute {
        id: format!("alt-{}", index + 1),
        name: format!("Via {}", via_name),
        polyline,
        shelter_count,
        estimated_duration: round_minutes(minutes),
        additional_time: round_minutes(minutes - original_minutes),
        distance_km: round_tenth(distance_km),
        safety_score: detour_score(found.len()),
        description: format!("Alternative route with {} shelters on the way", shelter_count),
        waypoint: LatLng {
            lat: waypoint.0,
            lng: waypoint.1,
        },
        shelters: found,
    }
}
