//! Flat-earth distance approximations.
//!
//! Degrees are scaled by ~111 km per degree, with longitude corrected by
//! the cosine of a reference latitude. Only valid over short distances;
//! no geodesic or road-network distance is computed anywhere.

/// Kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Metres per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Equirectangular distance in kilometres.
///
/// The longitude correction uses the latitude of `from`.
pub fn equirectangular_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let d_lat = (lat2 - lat1) * KM_PER_DEGREE;
    let d_lng = (lng2 - lng1) * KM_PER_DEGREE * lat1.to_radians().cos();

    (d_lat.powi(2) + d_lng.powi(2)).sqrt()
}

/// Equirectangular distance in metres from a path sample to a target.
///
/// The longitude correction uses the latitude of `sample`.
pub fn equirectangular_m(sample: (f64, f64), target: (f64, f64)) -> f64 {
    let (lat1, lng1) = sample;
    let (lat2, lng2) = target;

    let d_lat = (lat2 - lat1) * METERS_PER_DEGREE;
    let d_lng = (lng2 - lng1) * METERS_PER_DEGREE * lat1.to_radians().cos();

    (d_lat.powi(2) + d_lng.powi(2)).sqrt()
}

/// Uncorrected planar distance in kilometres, used for the coarse
/// "same region" check. Longitude degrees are treated as latitude degrees.
pub fn planar_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let d_lat = (to.0 - from.0) * KM_PER_DEGREE;
    let d_lng = (to.1 - from.1) * KM_PER_DEGREE;

    (d_lat.powi(2) + d_lng.powi(2)).sqrt()
}
