//! Route analysis: resolve, estimate, score, persist, then look for detours.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::alternatives::generate_alternatives;
use crate::error::{AnalysisError, EstimateError, UnresolvedAddress};
use crate::estimator::{estimate, RouteEstimate};
use crate::model::{
    round_minutes, round_tenth, AlternativeRoute, AnalysisResult, ResolvedPoint, Route, RouteInput,
    RouteRequest, RouteStatus, Shelter, TransportMethod, Waypoint,
};
use crate::scorer::{score_route, ShelterCoverage};
use crate::shelters::{RetryPolicy, ShelterLoader};
use crate::traits::{Geocoder, RouteStore, ShelterStore};

/// Below this many shelters on the way, alternatives are generated.
pub const MIN_COVERED_SHELTERS: usize = 2;

/// Name given to the synthetic stop of a chosen alternative.
pub const INTERMEDIATE_STOP: &str = "Intermediate stop";

/// Name used for a chosen alternative when the base route has none.
pub const DEFAULT_ROUTE_NAME: &str = "Route";

/// Resolve every address in order, stopping at the first failure.
pub fn resolve_all<G>(
    geocoder: &G,
    addresses: &[&str],
) -> Result<Vec<ResolvedPoint>, UnresolvedAddress>
where
    G: Geocoder + ?Sized,
{
    addresses.iter().map(|address| geocoder.resolve(address)).collect()
}

/// Estimate and score a path without touching the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub estimate: RouteEstimate,
    pub coverage: ShelterCoverage,
}

pub fn plan_route(
    points: &[ResolvedPoint],
    method: TransportMethod,
    shelters: &[Shelter],
) -> Result<PlannedRoute, EstimateError> {
    let estimate = estimate(points, method)?;
    let coverage = score_route(&estimate.polyline, estimate.distance_km, method, shelters);
    Ok(PlannedRoute { estimate, coverage })
}

/// Runs analyses against a geocoder and the backend stores.
///
/// At most one analysis or alternative selection runs at a time per
/// analyzer; a second call while one is in flight fails immediately.
#[derive(Debug)]
pub struct RouteAnalyzer<G, S, R> {
    geocoder: G,
    shelters: S,
    routes: R,
    loader: ShelterLoader,
    is_analyzing: AtomicBool,
}

impl<G, S, R> RouteAnalyzer<G, S, R>
where
    G: Geocoder,
    S: ShelterStore,
    R: RouteStore,
{
    pub fn new(geocoder: G, shelters: S, routes: R) -> Self {
        Self {
            geocoder,
            shelters,
            routes,
            loader: ShelterLoader::default(),
            is_analyzing: AtomicBool::new(false),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.loader = ShelterLoader::new(policy);
        self
    }

    pub fn is_analyzing(&self) -> bool {
        self.is_analyzing.load(Ordering::Acquire)
    }

    /// Give back the geocoder and stores.
    pub fn into_parts(self) -> (G, S, R) {
        (self.geocoder, self.shelters, self.routes)
    }

    /// Analyse and persist `request` as a planned route.
    ///
    /// Address and persistence failures abort the whole analysis. A shelter
    /// list outage degrades to the demo shelters and is reported in
    /// `shelter_warning`. Alternatives are best-effort.
    pub fn analyze(&self, request: &RouteRequest) -> Result<AnalysisResult, AnalysisError> {
        let _guard = self.begin()?;
        let method = request.transport_method;
        info!(
            start = %request.start_address,
            end = %request.end_address,
            %method,
            "analysing route"
        );

        let load = self.loader.load(&self.shelters, None);

        let points = resolve_all(&self.geocoder, &request.all_addresses())?;
        let planned = plan_route(&points, method, &load.shelters)?;
        let PlannedRoute { estimate, coverage } = planned;

        let waypoints = request
            .waypoint_addresses()
            .into_iter()
            .zip(&points[1..])
            .map(|(address, point)| Waypoint::located(address, point.lat, point.lng))
            .collect();

        let input = RouteInput {
            name: request.name.clone().filter(|name| !name.trim().is_empty()),
            start_address: request.start_address.clone(),
            end_address: request.end_address.clone(),
            waypoints,
            transport_method: method,
            status: RouteStatus::Planned,
            shelter_count: coverage.shelters.len() as u32,
            estimated_duration: round_minutes(estimate.duration_minutes),
            distance_km: round_tenth(estimate.distance_km),
            safety_score: coverage.safety_score,
            route_polyline: estimate.polyline.to_json()?,
        };
        let route = self.routes.create(&input)?;
        info!(
            route_id = %route.id,
            shelters = route.shelter_count,
            safety_score = route.safety_score,
            "route saved"
        );

        let alternative_routes = if coverage.shelters.len() < MIN_COVERED_SHELTERS {
            self.alternatives(&points, method, &load.shelters, estimate.duration_minutes)
        } else {
            Vec::new()
        };

        Ok(AnalysisResult {
            route,
            shelters: coverage.shelters,
            polyline: estimate.polyline,
            alternative_routes,
            shelter_warning: load.failure,
        })
    }

    /// Persist a chosen alternative as a new planned route derived from `base`.
    pub fn select_alternative(
        &self,
        base: &Route,
        alternative: &AlternativeRoute,
    ) -> Result<AnalysisResult, AnalysisError> {
        let _guard = self.begin()?;

        let base_name = base
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_ROUTE_NAME);

        let input = RouteInput {
            name: Some(format!("{} - {}", base_name, alternative.name)),
            start_address: base.start_address.clone(),
            end_address: base.end_address.clone(),
            waypoints: vec![Waypoint::located(
                INTERMEDIATE_STOP,
                alternative.waypoint.lat,
                alternative.waypoint.lng,
            )],
            transport_method: base.transport_method,
            status: RouteStatus::Planned,
            shelter_count: alternative.shelter_count,
            estimated_duration: alternative.estimated_duration,
            distance_km: alternative.distance_km,
            safety_score: alternative.safety_score,
            route_polyline: alternative.polyline.to_json()?,
        };
        let route = self.routes.create(&input)?;
        info!(route_id = %route.id, alternative = %alternative.id, "alternative route saved");

        Ok(AnalysisResult {
            route,
            shelters: alternative.shelters.clone(),
            polyline: alternative.polyline.clone(),
            alternative_routes: Vec::new(),
            shelter_warning: None,
        })
    }

    fn alternatives(
        &self,
        points: &[ResolvedPoint],
        method: TransportMethod,
        shelters: &[Shelter],
        original_minutes: f64,
    ) -> Vec<AlternativeRoute> {
        match generate_alternatives(points, method, shelters, original_minutes) {
            Ok(alternatives) => {
                debug!(count = alternatives.len(), "generated alternative routes");
                alternatives
            }
            Err(err) => {
                warn!(error = %err, "could not generate alternative routes");
                Vec::new()
            }
        }
    }

    fn begin(&self) -> Result<AnalyzingGuard<'_>, AnalysisError> {
        self.is_analyzing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AnalysisError::AlreadyAnalyzing)?;
        Ok(AnalyzingGuard(&self.is_analyzing))
    }
}

/// Clears the in-flight flag however the analysis ends.
struct AnalyzingGuard<'a>(&'a AtomicBool);

impl Drop for AnalyzingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::StaticGeocoder;
    use crate::model::RoadType;

    #[test]
    fn test_resolve_all_stops_at_first_unknown() {
        let err = resolve_all(
            &StaticGeocoder::default(),
            &["דיזנגוף 1, תל אביב", "מקום לא ידוע", "עוד מקום לא ידוע"],
        )
        .unwrap_err();
        assert_eq!(err.address, "מקום לא ידוע");
    }

    #[test]
    fn test_plan_route_without_shelters() {
        let points = [
            ResolvedPoint::new(32.0819, 34.7816, RoadType::MainStreet),
            ResolvedPoint::new(32.0871, 34.7769, RoadType::MainStreet),
        ];
        let planned = plan_route(&points, TransportMethod::Car, &[]).unwrap();
        assert!(planned.estimate.distance_km > 0.0);
        assert!(planned.coverage.shelters.is_empty());
        // No shelters, short trip, by car: 25 + 10.
        assert_eq!(planned.coverage.safety_score, 35);
    }

    #[test]
    fn test_plan_route_needs_two_points() {
        let points = [ResolvedPoint::new(32.0, 34.0, RoadType::Street)];
        assert_eq!(
            plan_route(&points, TransportMethod::Car, &[]),
            Err(EstimateError::TooFewPoints(1))
        );
    }
}
