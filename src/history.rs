//! A user's saved routes: listing, status changes and dashboard figures.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{BackendError, StatusChangeError};
use crate::model::{Route, RouteFilter, RouteStatus, RouteUpdate, User, NEWEST_FIRST};
use crate::traits::{RouteStore, Session};

/// Routes shown on the dashboard.
pub const RECENT_ROUTES_LIMIT: usize = 10;

/// Whether someone is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedIn(User),
    LoginRequired { login_url: String },
}

/// The signed-in user, or where to send them to sign in.
///
/// Only [`BackendError::Unauthenticated`] turns into a redirect; any other
/// failure is returned as is.
pub fn ensure_signed_in<S>(session: &S, login_url: &str) -> Result<SessionState, BackendError>
where
    S: Session + ?Sized,
{
    match session.me() {
        Ok(user) => Ok(SessionState::SignedIn(user)),
        Err(BackendError::Unauthenticated) => Ok(SessionState::LoginRequired {
            login_url: login_url.to_string(),
        }),
        Err(err) => Err(err),
    }
}

/// Routes created by the signed-in user, newest first.
pub fn my_routes<S, R>(
    session: &S,
    store: &R,
    limit: Option<usize>,
) -> Result<Vec<Route>, BackendError>
where
    S: Session + ?Sized,
    R: RouteStore + ?Sized,
{
    let user = session.me()?;
    store.filter(&RouteFilter::created_by(user.email), NEWEST_FIRST, limit)
}

/// Move `route` to `next`, rejecting transitions the lifecycle does not allow.
pub fn transition_route<R>(
    store: &R,
    route: &Route,
    next: RouteStatus,
) -> Result<Route, StatusChangeError>
where
    R: RouteStore + ?Sized,
{
    if !route.status.can_transition_to(next) {
        return Err(StatusChangeError::InvalidTransition {
            from: route.status,
            to: next,
        });
    }

    let updated = store.update(&route.id, &RouteUpdate::status(next))?;
    info!(route_id = %route.id, from = %route.status, to = %next, "route status changed");
    Ok(updated)
}

pub fn complete_route<R>(store: &R, route: &Route) -> Result<Route, StatusChangeError>
where
    R: RouteStore + ?Sized,
{
    transition_route(store, route, RouteStatus::Completed)
}

pub fn remove_route<R>(store: &R, route: &Route) -> Result<Route, StatusChangeError>
where
    R: RouteStore + ?Sized,
{
    transition_route(store, route, RouteStatus::Removed)
}

/// Routes grouped for display. Planned routes count as current.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteBuckets {
    pub current: Vec<Route>,
    pub completed: Vec<Route>,
    pub removed: Vec<Route>,
}

impl RouteBuckets {
    pub fn from_routes(routes: impl IntoIterator<Item = Route>) -> Self {
        let mut buckets = RouteBuckets::default();
        for route in routes {
            match route.status {
                RouteStatus::Planned | RouteStatus::Active => buckets.current.push(route),
                RouteStatus::Completed => buckets.completed.push(route),
                RouteStatus::Removed => buckets.removed.push(route),
            }
        }
        buckets
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub active_routes: usize,
    pub completed_today: usize,
    pub total_shelters: usize,
}

impl DashboardStats {
    /// `now` decides what "today" is, in UTC.
    pub fn compute(routes: &[Route], total_shelters: usize, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        DashboardStats {
            active_routes: routes
                .iter()
                .filter(|route| route.status == RouteStatus::Active)
                .count(),
            completed_today: routes
                .iter()
                .filter(|route| {
                    route.status == RouteStatus::Completed && route.updated_date.date_naive() == today
                })
                .count(),
            total_shelters,
        }
    }
}
