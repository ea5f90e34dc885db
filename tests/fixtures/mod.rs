//! Test fixtures for shelter-route.
//!
//! Provides:
//! - Tel Aviv area addresses and shelters
//! - In-memory shelter, route and session stores that record their calls
#![allow(dead_code)]

pub mod israeli_locations;

pub use israeli_locations::*;

use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};

use shelter_route::error::BackendError;
use shelter_route::model::{
    NewShelter, Route, RouteFilter, RouteInput, RouteUpdate, Shelter, User, NEWEST_FIRST,
};
use shelter_route::traits::{RouteStore, Session, ShelterStore};

pub const OWNER: &str = "dana@example.com";

/// Fixed clock start for stored routes.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 20, 8, 0, 0).unwrap()
}

// ============================================================================
// Shelter store
// ============================================================================

/// Shelter collection that can be told to fail its next few listings.
#[derive(Debug, Default)]
pub struct MockShelters {
    shelters: Mutex<Vec<Shelter>>,
    failures_left: Mutex<u32>,
    list_calls: Mutex<u32>,
    bulk_created: Mutex<Vec<NewShelter>>,
    rejects_writes: bool,
}

impl MockShelters {
    pub fn new(shelters: Vec<Shelter>) -> Self {
        Self {
            shelters: Mutex::new(shelters),
            ..Default::default()
        }
    }

    pub fn failing(mut self, times: u32) -> Self {
        self.failures_left = Mutex::new(times);
        self
    }

    /// `bulk_create` fails; listings still work.
    pub fn rejecting_writes(mut self) -> Self {
        self.rejects_writes = true;
        self
    }

    pub fn list_calls(&self) -> u32 {
        *self.list_calls.lock().unwrap()
    }

    pub fn bulk_created(&self) -> Vec<NewShelter> {
        self.bulk_created.lock().unwrap().clone()
    }

    pub fn stored(&self) -> Vec<Shelter> {
        self.shelters.lock().unwrap().clone()
    }
}

impl ShelterStore for MockShelters {
    fn list(&self, _sort: Option<&str>) -> Result<Vec<Shelter>, BackendError> {
        *self.list_calls.lock().unwrap() += 1;
        let mut failures = self.failures_left.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(BackendError::Unavailable("connection reset".to_string()));
        }
        Ok(self.shelters.lock().unwrap().clone())
    }

    fn bulk_create(&self, shelters: &[NewShelter]) -> Result<(), BackendError> {
        if self.rejects_writes {
            return Err(BackendError::Status {
                status: 403,
                body: "read-only".to_string(),
            });
        }
        let mut stored = self.shelters.lock().unwrap();
        for shelter in shelters {
            let id = format!("shelter-{}", stored.len() + 1);
            stored.push(shelter.clone().with_id(id));
        }
        self.bulk_created.lock().unwrap().extend_from_slice(shelters);
        Ok(())
    }
}

// ============================================================================
// Route store
// ============================================================================

/// Route collection owned by [`OWNER`]. Each created route is stamped one
/// minute after the previous one.
#[derive(Debug, Default)]
pub struct MockRoutes {
    routes: Mutex<Vec<Route>>,
    updates: Mutex<Vec<(String, RouteUpdate)>>,
    unavailable: bool,
}

impl MockRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the backend were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, RouteUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.unavailable {
            Err(BackendError::Unavailable("route service down".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RouteStore for MockRoutes {
    fn create(&self, input: &RouteInput) -> Result<Route, BackendError> {
        self.check()?;
        let mut routes = self.routes.lock().unwrap();
        let stamp = epoch() + Duration::minutes(routes.len() as i64);
        let route = Route {
            id: format!("route-{}", routes.len() + 1),
            name: input.name.clone(),
            start_address: input.start_address.clone(),
            end_address: input.end_address.clone(),
            waypoints: input.waypoints.clone(),
            transport_method: input.transport_method,
            status: input.status,
            shelter_count: input.shelter_count,
            estimated_duration: input.estimated_duration,
            distance_km: input.distance_km,
            safety_score: input.safety_score,
            route_polyline: input.route_polyline.clone(),
            created_by: OWNER.to_string(),
            created_date: stamp,
            updated_date: stamp,
        };
        routes.push(route.clone());
        Ok(route)
    }

    fn update(&self, id: &str, update: &RouteUpdate) -> Result<Route, BackendError> {
        self.check()?;
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), update.clone()));

        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|route| route.id == id)
            .ok_or_else(|| BackendError::Status {
                status: 404,
                body: format!("no route {}", id),
            })?;
        if let Some(status) = update.status {
            route.status = status;
        }
        route.updated_date = route.updated_date + Duration::hours(1);
        Ok(route.clone())
    }

    fn filter(
        &self,
        filter: &RouteFilter,
        sort: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Route>, BackendError> {
        self.check()?;
        let mut found: Vec<Route> = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .filter(|route| filter.matches(route))
            .cloned()
            .collect();
        if sort == NEWEST_FIRST {
            found.sort_by(|a, b| b.created_date.cmp(&a.created_date));
        }
        if let Some(limit) = limit {
            found.truncate(limit);
        }
        Ok(found)
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug)]
pub enum MockSession {
    SignedIn(User),
    SignedOut,
    Broken,
}

impl MockSession {
    pub fn owner() -> Self {
        MockSession::SignedIn(User {
            email: OWNER.to_string(),
            full_name: Some("Dana Levi".to_string()),
        })
    }
}

impl Session for MockSession {
    fn me(&self) -> Result<User, BackendError> {
        match self {
            MockSession::SignedIn(user) => Ok(user.clone()),
            MockSession::SignedOut => Err(BackendError::Unauthenticated),
            MockSession::Broken => Err(BackendError::Status {
                status: 500,
                body: "internal error".to_string(),
            }),
        }
    }

    fn logout(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
