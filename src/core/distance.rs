/// Earth's mean radius in miles
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Calculate the haversine great-circle distance between two points in miles
///
/// # Arguments
/// * `lat1` - Latitude of first point in signed decimal degrees
/// * `lon1` - Longitude of first point in signed decimal degrees
/// * `lat2` - Latitude of second point in signed decimal degrees
/// * `lon2` - Longitude of second point in signed decimal degrees
///
/// # Returns
/// Distance in miles. NaN inputs propagate NaN; guard with
/// [`valid_coordinates`] before calling.
#[inline]
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Collapse an optional lat/lng pair into a usable coordinate, rejecting
/// missing or non-finite components.
#[inline]
pub fn valid_coordinates(lat: Option<f64>, lon: Option<f64>) -> Option<(f64, f64)> {
    match (lat, lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
        _ => None,
    }
}
