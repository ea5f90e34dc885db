//! Table-backed address resolution.
//!
//! A stand-in for a real geocoding service: addresses are matched by plain
//! substring search against a small built-in table of Israeli streets.

use tracing::debug;

use crate::error::UnresolvedAddress;
use crate::model::{ResolvedPoint, RoadType};
use crate::model::RoadType::{Boulevard, Highway, MainStreet};
use crate::traits::Geocoder;

/// Degrees added to both lat and lng per unit of `house number mod 100`.
pub const HOUSE_NUMBER_OFFSET_DEG: f64 = 0.0001;

#[derive(Debug, Clone, Copy)]
pub struct StreetEntry {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub road_type: RoadType,
}

impl StreetEntry {
    pub const fn new(name: &'static str, lat: f64, lng: f64, road_type: RoadType) -> Self {
        Self {
            name,
            lat,
            lng,
            road_type,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CityEntry {
    pub name: &'static str,
    pub streets: &'static [StreetEntry],
}

pub const ISRAELI_ADDRESSES: &[CityEntry] = &[
    CityEntry {
        name: "תל אביב",
        streets: &[
            StreetEntry::new("דיזנגוף", 32.0809, 34.7806, MainStreet),
            StreetEntry::new("בן יהודה", 32.0851, 34.7749, MainStreet),
            StreetEntry::new("רוטשילד", 32.0644, 34.7719, Boulevard),
            StreetEntry::new("יגאל אלון", 32.0719, 34.7926, Highway),
            StreetEntry::new("הירקון", 32.0853, 34.7818, MainStreet),
            StreetEntry::new("אלנבי", 32.0663, 34.7719, MainStreet),
            StreetEntry::new("ארלוזורוב", 32.0894, 34.7803, MainStreet),
            StreetEntry::new("יפו", 32.0543, 34.7546, MainStreet),
        ],
    },
    CityEntry {
        name: "חולון",
        streets: &[
            StreetEntry::new("יצחק רבין", 32.0117, 34.7628, MainStreet),
            StreetEntry::new("סוקולוב", 32.0145, 34.7565, MainStreet),
            StreetEntry::new("ויצמן", 32.0098, 34.7634, MainStreet),
            StreetEntry::new("הרצל", 32.0089, 34.7591, MainStreet),
        ],
    },
    CityEntry {
        name: "ירושלים",
        streets: &[
            StreetEntry::new("יפו", 31.7857, 35.2066, MainStreet),
            StreetEntry::new("הרצל", 31.7964, 35.1053, MainStreet),
            StreetEntry::new("בן יהודה", 31.7804, 35.2197, MainStreet),
            StreetEntry::new("בגין", 31.7589, 35.2087, Highway),
        ],
    },
    CityEntry {
        name: "חיפה",
        streets: &[
            StreetEntry::new("הרצל", 32.8191, 34.9983, MainStreet),
            StreetEntry::new("נורדאו", 32.8134, 35.0041, MainStreet),
            StreetEntry::new("בן גוריון", 32.8156, 35.0073, MainStreet),
        ],
    },
];

/// Resolves addresses against an ordered city → street table.
///
/// Cities are tried in table order; within the first city named in the
/// address, the first street also named in it wins. There is no ranking
/// and no fuzzy matching.
#[derive(Debug, Clone, Copy)]
pub struct StaticGeocoder {
    table: &'static [CityEntry],
}

impl Default for StaticGeocoder {
    fn default() -> Self {
        Self {
            table: ISRAELI_ADDRESSES,
        }
    }
}

impl StaticGeocoder {
    pub fn new(table: &'static [CityEntry]) -> Self {
        Self { table }
    }

    fn lookup(&self, address: &str) -> Option<&'static StreetEntry> {
        let address = address.to_lowercase();
        self.table
            .iter()
            .filter(|city| address.contains(&city.name.to_lowercase()))
            .find_map(|city| {
                city.streets
                    .iter()
                    .find(|street| address.contains(&street.name.to_lowercase()))
            })
    }
}

impl Geocoder for StaticGeocoder {
    fn resolve(&self, address: &str) -> Result<ResolvedPoint, UnresolvedAddress> {
        let street = self.lookup(address).ok_or_else(|| UnresolvedAddress {
            address: address.to_string(),
        })?;

        let offset = house_number_offset(address);
        debug!(address, street = street.name, offset, "resolved address");

        Ok(ResolvedPoint::new(
            street.lat + offset,
            street.lng + offset,
            street.road_type,
        ))
    }
}

/// Offset derived from the first run of digits in the address, so that
/// different houses on the same street do not coincide.
pub fn house_number_offset(address: &str) -> f64 {
    house_number_mod_100(address).map_or(0.0, |n| n as f64 * HOUSE_NUMBER_OFFSET_DEG)
}

fn house_number_mod_100(address: &str) -> Option<u32> {
    let digits = address
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit());

    let mut found = false;
    let mut value = 0;
    for c in digits {
        found = true;
        value = (value * 10 + c.to_digit(10)?) % 100;
    }
    found.then_some(value)
}
