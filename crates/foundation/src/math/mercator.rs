use super::geodesy::WGS84_A;

/// Latitude bound of the square Web Mercator domain (degrees).
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

/// Spherical Web Mercator forward projection (EPSG:3857).
///
/// Input in degrees, output in meters. Latitudes approaching the poles blow
/// up in y; callers are expected to stay within `MERCATOR_MAX_LAT_DEG`.
pub fn lonlat_to_mercator(lon_deg: f64, lat_deg: f64) -> [f64; 2] {
    let x = WGS84_A * lon_deg.to_radians();
    let lat_rad = lat_deg.to_radians();
    let y = WGS84_A * ((std::f64::consts::FRAC_PI_4 + lat_rad / 2.0).tan()).ln();
    [x, y]
}

pub fn mercator_to_lonlat(x: f64, y: f64) -> [f64; 2] {
    let lon = (x / WGS84_A).to_degrees();
    let lat = (2.0 * (y / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    [lon, lat]
}

#[cfg(test)]
mod tests {
    use super::{MERCATOR_MAX_LAT_DEG, lonlat_to_mercator, mercator_to_lonlat};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_origin() {
        assert_eq!(lonlat_to_mercator(0.0, 0.0), [0.0, 0.0]);
    }

    #[test]
    fn round_trip_mid_latitudes() {
        let [x, y] = lonlat_to_mercator(72.5714, 23.0225);
        let [lon, lat] = mercator_to_lonlat(x, y);
        assert_close(lon, 72.5714, 1e-9);
        assert_close(lat, 23.0225, 1e-9);
    }

    #[test]
    fn y_grows_steeply_past_the_domain_edge() {
        let [_, y_edge] = lonlat_to_mercator(0.0, MERCATOR_MAX_LAT_DEG);
        assert!(y_edge.is_finite());
        let [_, y_near_pole] = lonlat_to_mercator(0.0, 89.99);
        assert!(y_near_pole > 2.0 * y_edge);
    }
}
