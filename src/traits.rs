//! Collaborator interfaces for route analysis.
//!
//! The hosted backend and the geocoding source sit behind these traits so
//! the estimator and scorer never depend on a concrete provider.

use crate::error::{BackendError, UnresolvedAddress};
use crate::model::{
    NewShelter, ResolvedPoint, Route, RouteFilter, RouteInput, RouteUpdate, Shelter, User,
};

/// Turns a free-text address into a coordinate and road class.
pub trait Geocoder {
    fn resolve(&self, address: &str) -> Result<ResolvedPoint, UnresolvedAddress>;
}

/// Read access to the shelter collection, plus the bulk insert used by sync.
pub trait ShelterStore {
    /// List all shelters. `sort` is a field name, `-` prefixed for descending.
    fn list(&self, sort: Option<&str>) -> Result<Vec<Shelter>, BackendError>;

    fn bulk_create(&self, shelters: &[NewShelter]) -> Result<(), BackendError>;
}

/// Persistence for analysed routes.
pub trait RouteStore {
    /// Store a new route. The backend assigns id, owner and dates.
    fn create(&self, input: &RouteInput) -> Result<Route, BackendError>;

    fn update(&self, id: &str, update: &RouteUpdate) -> Result<Route, BackendError>;

    /// Routes matching `filter`, ordered by `sort`, at most `limit` of them.
    fn filter(
        &self,
        filter: &RouteFilter,
        sort: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Route>, BackendError>;
}

/// The signed-in user.
pub trait Session {
    /// Fails with [`BackendError::Unauthenticated`] when nobody is signed in.
    fn me(&self) -> Result<User, BackendError>;

    fn logout(&self) -> Result<(), BackendError>;
}
