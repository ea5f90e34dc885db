//! Error types for route analysis and backend access.
//!
//! Address and estimation failures abort an analysis; backend failures are
//! retried or propagated depending on the call site; alternative-route
//! failures are only ever logged.

use thiserror::Error;

use crate::model::RouteStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transport method: {0:?}")]
pub struct UnknownTransportMethod(pub String);

/// The resolver found no city and street pair in the address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not find the address \"{address}\"; make sure it includes both the city and the street name")]
pub struct UnresolvedAddress {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimateError {
    #[error("a route needs at least 2 points, got {0}")]
    TooFewPoints(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlternativeGenerationError {
    #[error("original route has no resolved start or end point")]
    MissingEndpoints,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("not signed in")]
    Unauthenticated,

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("an analysis is already in progress")]
    AlreadyAnalyzing,

    #[error(transparent)]
    UnresolvedAddress(#[from] UnresolvedAddress),

    #[error(transparent)]
    Estimate(#[from] EstimateError),

    #[error("failed to save route: {0}")]
    Persistence(#[from] BackendError),

    #[error("failed to encode route polyline: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A saved route's status could not be changed.
#[derive(Debug, Error)]
pub enum StatusChangeError {
    #[error("route cannot move from {from} to {to}")]
    InvalidTransition { from: RouteStatus, to: RouteStatus },

    #[error("failed to update route: {0}")]
    Backend(#[from] BackendError),
}
