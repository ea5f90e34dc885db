//! Shelter proximity filtering and the route safety score.

use rayon::prelude::*;

use crate::distance::equirectangular_m;
use crate::model::{Shelter, TransportMethod};
use crate::polyline::Polyline;

/// Radius used when no transport method is known.
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 500.0;

pub const MIN_SAFETY_SCORE: u32 = 20;
pub const MAX_SAFETY_SCORE: u32 = 100;

/// Points per shelter found along the route.
pub const SCORE_PER_SHELTER: u32 = 15;

/// How far from the path a shelter may be and still count as on the way.
pub fn search_radius_m(method: Option<TransportMethod>) -> f64 {
    match method {
        Some(TransportMethod::Car) => 800.0,
        Some(TransportMethod::Motorcycle) => 600.0,
        Some(TransportMethod::Scooter) => 400.0,
        Some(TransportMethod::Bicycle) => 300.0,
        None => DEFAULT_SEARCH_RADIUS_M,
    }
}

/// Shelters within `radius_m` of any sample of `polyline`, in input order.
///
/// This is shelters × samples work; shelters are checked in parallel.
pub fn shelters_near(polyline: &Polyline, shelters: &[Shelter], radius_m: f64) -> Vec<Shelter> {
    let samples = polyline.points();
    shelters
        .par_iter()
        .filter(|shelter| {
            samples
                .iter()
                .any(|&sample| equirectangular_m(sample, shelter.coords()) <= radius_m)
        })
        .cloned()
        .collect()
}

/// Trip-length component of the safety score.
pub fn distance_bonus(distance_km: f64) -> u32 {
    if distance_km < 10.0 {
        25
    } else if distance_km < 20.0 {
        15
    } else {
        5
    }
}

pub fn mode_bonus(method: TransportMethod) -> u32 {
    match method {
        TransportMethod::Car => 10,
        TransportMethod::Motorcycle => 5,
        TransportMethod::Scooter | TransportMethod::Bicycle => 0,
    }
}

/// Safety score in `[20, 100]`.
pub fn safety_score(shelter_count: usize, distance_km: f64, method: TransportMethod) -> u8 {
    let shelters = u32::try_from(shelter_count)
        .unwrap_or(u32::MAX)
        .saturating_mul(SCORE_PER_SHELTER);
    let raw = shelters
        .saturating_add(distance_bonus(distance_km))
        .saturating_add(mode_bonus(method));
    raw.clamp(MIN_SAFETY_SCORE, MAX_SAFETY_SCORE) as u8
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShelterCoverage {
    pub shelters: Vec<Shelter>,
    pub safety_score: u8,
}

/// Shelters on the way for `method`, and the resulting safety score.
pub fn score_route(
    polyline: &Polyline,
    distance_km: f64,
    method: TransportMethod,
    shelters: &[Shelter],
) -> ShelterCoverage {
    let nearby = shelters_near(polyline, shelters, search_radius_m(Some(method)));
    let safety_score = safety_score(nearby.len(), distance_km, method);
    ShelterCoverage {
        shelters: nearby,
        safety_score,
    }
}
