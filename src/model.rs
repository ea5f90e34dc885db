//! Records exchanged with the backend and produced by route analysis.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UnknownTransportMethod;
use crate::polyline::Polyline;

/// Sort key for listings, newest first.
pub const NEWEST_FIRST: &str = "-created_date";

/// Road class of a resolved address; drives the assumed travel speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    Street,
    MainStreet,
    Boulevard,
    Highway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMethod {
    Car,
    Motorcycle,
    Scooter,
    Bicycle,
}

impl TransportMethod {
    pub const ALL: [TransportMethod; 4] = [
        TransportMethod::Car,
        TransportMethod::Motorcycle,
        TransportMethod::Scooter,
        TransportMethod::Bicycle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMethod::Car => "car",
            TransportMethod::Motorcycle => "motorcycle",
            TransportMethod::Scooter => "scooter",
            TransportMethod::Bicycle => "bicycle",
        }
    }
}

impl fmt::Display for TransportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMethod {
    type Err = UnknownTransportMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransportMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnknownTransportMethod(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Planned,
    Active,
    Completed,
    Removed,
}

impl RouteStatus {
    /// Whether a route in this status may move to `next`.
    ///
    /// `removed` is terminal; `completed` can only be removed.
    pub fn can_transition_to(self, next: RouteStatus) -> bool {
        use RouteStatus::*;
        matches!(
            (self, next),
            (Planned, Active)
                | (Planned, Completed)
                | (Active, Completed)
                | (Planned, Removed)
                | (Active, Removed)
                | (Completed, Removed)
        )
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RouteStatus::Planned => "planned",
            RouteStatus::Active => "active",
            RouteStatus::Completed => "completed",
            RouteStatus::Removed => "removed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelterType {
    Public,
    Private,
    Commercial,
    Residential,
}

/// A plain coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// An address resolved to a coordinate and the class of road it sits on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    pub lat: f64,
    pub lng: f64,
    pub road_type: RoadType,
}

impl ResolvedPoint {
    pub fn new(lat: f64, lng: f64, road_type: RoadType) -> Self {
        Self { lat, lng, road_type }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Waypoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn located(address: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            address: address.into(),
            latitude: Some(lat),
            longitude: Some(lng),
        }
    }
}

/// A persisted route as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_address: String,
    pub end_address: String,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    pub transport_method: TransportMethod,
    pub status: RouteStatus,
    #[serde(default)]
    pub shelter_count: u32,
    /// Minutes.
    #[serde(default)]
    pub estimated_duration: u32,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub safety_score: u8,
    /// JSON list of `[lat, lng]` pairs.
    #[serde(default)]
    pub route_polyline: String,
    #[serde(default)]
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Payload for creating a route; the backend assigns id, owner and dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_address: String,
    pub end_address: String,
    pub waypoints: Vec<Waypoint>,
    pub transport_method: TransportMethod,
    pub status: RouteStatus,
    pub shelter_count: u32,
    pub estimated_duration: u32,
    pub distance_km: f64,
    pub safety_score: u8,
    pub route_polyline: String,
}

/// Partial route update. Only status changes are issued by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RouteStatus>,
}

impl RouteUpdate {
    pub fn status(status: RouteStatus) -> Self {
        Self {
            status: Some(status),
        }
    }
}

/// Equality filter for `RouteStore::filter`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RouteStatus>,
}

impl RouteFilter {
    pub fn created_by(email: impl Into<String>) -> Self {
        Self {
            created_by: Some(email.into()),
            status: None,
        }
    }

    pub fn matches(&self, route: &Route) -> bool {
        self.created_by
            .as_ref()
            .is_none_or(|email| *email == route.created_by)
            && self.status.is_none_or(|status| status == route.status)
    }
}

/// What a user submits to have a route analysed.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub name: Option<String>,
    pub start_address: String,
    pub end_address: String,
    pub waypoints: Vec<String>,
    pub transport_method: TransportMethod,
}

impl RouteRequest {
    pub fn new(
        start_address: impl Into<String>,
        end_address: impl Into<String>,
        transport_method: TransportMethod,
    ) -> Self {
        Self {
            name: None,
            start_address: start_address.into(),
            end_address: end_address.into(),
            waypoints: Vec::new(),
            transport_method,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn via(mut self, address: impl Into<String>) -> Self {
        self.waypoints.push(address.into());
        self
    }

    /// Waypoint addresses with blank entries dropped, in order.
    pub fn waypoint_addresses(&self) -> Vec<&str> {
        self.waypoints
            .iter()
            .map(|address| address.trim())
            .filter(|address| !address.is_empty())
            .collect()
    }

    /// Start, waypoints and end, in path order.
    pub fn all_addresses(&self) -> Vec<&str> {
        let mut addresses = Vec::with_capacity(self.waypoints.len() + 2);
        addresses.push(self.start_address.as_str());
        addresses.extend(self.waypoint_addresses());
        addresses.push(self.end_address.as_str());
        addresses
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub capacity: u32,
    #[serde(rename = "type")]
    pub kind: ShelterType,
    #[serde(default)]
    pub accessibility: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Shelter {
    pub fn coords(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// A shelter not yet stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShelter {
    pub name: String,
    pub address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub capacity: u32,
    #[serde(rename = "type")]
    pub kind: ShelterType,
    pub accessibility: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewShelter {
    pub fn with_id(self, id: impl Into<String>) -> Shelter {
        Shelter {
            id: id.into(),
            name: self.name,
            address: self.address,
            city: self.city,
            latitude: self.latitude,
            longitude: self.longitude,
            capacity: self.capacity,
            kind: self.kind,
            accessibility: self.accessibility,
            operating_hours: self.operating_hours,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// A detour through an extra shelter, offered when the primary route is
/// poorly covered. Not persisted until chosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeRoute {
    pub id: String,
    pub name: String,
    pub polyline: Polyline,
    pub shelters: Vec<Shelter>,
    pub shelter_count: u32,
    pub estimated_duration: u32,
    pub additional_time: u32,
    pub distance_km: f64,
    pub safety_score: u8,
    pub description: String,
    pub waypoint: LatLng,
}

/// Shelter list could not be fetched; the demo set was used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelterLoadFailure {
    pub retries: u32,
    pub max_retries: u32,
    pub last_error: String,
}

impl fmt::Display for ShelterLoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unable to load the shelter list ({}/{} retries): {}",
            self.retries, self.max_retries, self.last_error
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub route: Route,
    pub shelters: Vec<Shelter>,
    pub polyline: Polyline,
    pub alternative_routes: Vec<AlternativeRoute>,
    pub shelter_warning: Option<ShelterLoadFailure>,
}

/// Round to one decimal place, as stored in `distance_km`.
pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round minutes to a whole, non-negative count.
pub(crate) fn round_minutes(value: f64) -> u32 {
    value.round().max(0.0) as u32
}
