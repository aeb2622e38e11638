/// Mean Earth radius in metres.
const EARTH_RADIUS_METRES: f64 = 6_371_000.0;

/// Walking pace assumed for all pedestrian legs, in km/h.
pub const WALK_SPEED_KMH: f64 = 4.5;

/// Great-circle distance between two coordinates, in metres.
pub fn haversine_metres(
    latitude_a: f64,
    longitude_a: f64,
    latitude_b: f64,
    longitude_b: f64,
) -> f64 {
    let phi_a = latitude_a.to_radians();
    let phi_b = latitude_b.to_radians();
    let half_dlat = (latitude_b - latitude_a).to_radians() / 2.0;
    let half_dlon = (longitude_b - longitude_a).to_radians() / 2.0;

    let h = half_dlat.sin().powi(2)
        + phi_a.cos() * phi_b.cos() * half_dlon.sin().powi(2);
    2.0 * EARTH_RADIUS_METRES * h.sqrt().asin()
}

/// A latitude/longitude box enclosing a radius around a point. Cheap
/// containment checks cull candidates before the exact distance is paid.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lon
            && longitude <= self.max_lon
    }
}

pub fn bounding_box(latitude: f64, longitude: f64, radius_metres: f64) -> BoundingBox {
    let lat_delta = (radius_metres / EARTH_RADIUS_METRES).to_degrees();
    // longitude degrees shrink with distance from the equator
    let lon_delta = (radius_metres
        / (EARTH_RADIUS_METRES * latitude.to_radians().cos()))
    .to_degrees();
    BoundingBox {
        min_lat: latitude - lat_delta,
        max_lat: latitude + lat_delta,
        min_lon: longitude - lon_delta,
        max_lon: longitude + lon_delta,
    }
}

/// Minutes needed to walk the given distance at the assumed pace,
/// rounded up to the next whole minute.
pub fn walk_minutes(metres: f64) -> u32 {
    if metres <= 0.0 {
        return 0;
    }
    let metres_per_minute = WALK_SPEED_KMH * 1000.0 / 60.0;
    (metres / metres_per_minute).ceil() as u32
}
