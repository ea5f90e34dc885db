//! Tel Aviv area locations and shelters for realistic test fixtures.
//!
//! Street coordinates match the built-in address table, so analyses of
//! these addresses land on the same points.

use shelter_route::model::{Shelter, ShelterType};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    pub fn shelter(&self, id: &str) -> Shelter {
        shelter(id, self.name, self.lat, self.lng)
    }
}

// ============================================================================
// Addresses understood by the static geocoder
// ============================================================================

/// Resolves to (32.0819, 34.7816), main street.
pub const DIZENGOFF_10: &str = "דיזנגוף 10, תל אביב";
/// Resolves to (32.0871, 34.7769), main street.
pub const BEN_YEHUDA_20: &str = "בן יהודה 20, תל אביב";
pub const ROTHSCHILD_5: &str = "רוטשילד 5, תל אביב";
pub const UNKNOWN_ADDRESS: &str = "רחוב לא קיים 5, אילת";

// ============================================================================
// Shelter sites
// ============================================================================

/// Right next to the Dizengoff start point.
pub const DIZENGOFF_SQUARE: Location = Location::new("מקלט דיזנגוף", 32.0809, 34.7806);

/// About 900 m south of the Dizengoff start point, off the route.
pub const SOUTH_OF_DIZENGOFF: Location = Location::new("מקלט דרומי", 32.0738, 34.7816);

/// Near the Ben Yehuda end point.
pub const BEN_YEHUDA_CORNER: Location = Location::new("מקלט בן יהודה", 32.0861, 34.7759);

/// Off-route shelters still within the Tel Aviv region.
pub const REGION_SHELTERS: &[Location] = &[
    Location::new("מקלט רוטשילד", 32.0644, 34.7719),
    Location::new("מקלט אלנבי", 32.0663, 34.7719),
    Location::new("מקלט חולון", 32.0117, 34.7628),
];

/// Far outside the Tel Aviv region.
pub const HAIFA_SHELTER: Location = Location::new("מקלט חיפה", 32.8191, 34.9983);

pub fn shelter(id: &str, name: &str, lat: f64, lng: f64) -> Shelter {
    Shelter {
        id: id.to_string(),
        name: name.to_string(),
        address: String::new(),
        city: "תל אביב".to_string(),
        latitude: lat,
        longitude: lng,
        capacity: 100,
        kind: ShelterType::Public,
        accessibility: true,
        operating_hours: None,
        notes: None,
    }
}

/// The region shelters, ids `region-1`..
pub fn region_shelters() -> Vec<Shelter> {
    REGION_SHELTERS
        .iter()
        .enumerate()
        .map(|(i, location)| location.shelter(&format!("region-{}", i + 1)))
        .collect()
}
