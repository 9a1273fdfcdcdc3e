//! Great-circle distance in statute miles.

use crate::domain::Location;

pub const STATUTE_MILES_PER_NAUTICAL_MILE: f64 = 1.150_779_45;

const NAUTICAL_MILES_PER_DEGREE: f64 = 60.0;

/// Distance between two points using the spherical law of cosines.
pub fn distance_miles(a: &Location, b: &Location) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lon1 = a.longitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let lon2 = b.longitude.to_radians();

    // Rounding can push the cosine just past 1.0 for identical points
    let cos_angle = (lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * (lon1 - lon2).cos()).clamp(-1.0, 1.0);
    let angle = cos_angle.acos();

    let nautical_miles = NAUTICAL_MILES_PER_DEGREE * angle.to_degrees();
    STATUTE_MILES_PER_NAUTICAL_MILE * nautical_miles
}
