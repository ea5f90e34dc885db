//! shelter-route core
//!
//! Route analysis with emergency-shelter awareness: address resolution,
//! travel estimation, shelter proximity scoring and detour alternatives.

pub mod model;
pub mod traits;
pub mod error;
pub mod distance;
pub mod polyline;
pub mod geocode;
pub mod estimator;
pub mod scorer;
pub mod alternatives;
pub mod analysis;
pub mod shelters;
pub mod history;
pub mod backend;
