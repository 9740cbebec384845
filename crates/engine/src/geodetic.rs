use foundation::math::{
    Ecef, Geodetic, MERCATOR_MAX_LAT_DEG, ecef_to_geodetic, geodetic_to_ecef, lonlat_to_mercator,
    mercator_to_lonlat, wrap_longitude_deg,
};

use crate::reference::{
    AxisOrder, CRS84, CoordinateReference, EPSG_3857, EPSG_4326, EPSG_4978, EPSG_4979,
};
use crate::transform::{CoordinateTransform, TransformError, TransformOptions, TransformProvider};

/// Built-in transform provider over the WGS84 reference family.
///
/// Sources must be geographic; targets may be geographic, geocentric (ECEF)
/// or Web Mercator. Anything else is an unsupported pair.
#[derive(Debug, Clone)]
pub struct GeodeticProvider {
    frames: Vec<CoordinateReference>,
}

impl GeodeticProvider {
    pub fn new() -> Self {
        Self {
            frames: vec![
                CoordinateReference::new(CRS84, AxisOrder::LonLat, false),
                CoordinateReference::new(EPSG_4326, AxisOrder::LatLon, false),
                CoordinateReference::new(EPSG_4979, AxisOrder::LatLon, true),
                CoordinateReference::new(EPSG_4978, AxisOrder::LonLat, true),
                CoordinateReference::new(EPSG_3857, AxisOrder::LonLat, false),
            ],
        }
    }

    pub fn frames(&self) -> &[CoordinateReference] {
        &self.frames
    }
}

impl Default for GeodeticProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn is_geographic(id: &str) -> bool {
    id == CRS84 || id == EPSG_4326 || id == EPSG_4979
}

impl TransformProvider for GeodeticProvider {
    fn reference(&self, id: &str) -> Option<CoordinateReference> {
        self.frames.iter().find(|r| r.id == id).cloned()
    }

    fn create_transform(
        &self,
        source: &CoordinateReference,
        target: &CoordinateReference,
        options: TransformOptions,
    ) -> Result<Box<dyn CoordinateTransform>, TransformError> {
        if self.reference(&source.id).is_none() {
            return Err(TransformError::UnknownReference(source.id.clone()));
        }
        if self.reference(&target.id).is_none() {
            return Err(TransformError::UnknownReference(target.id.clone()));
        }
        if !is_geographic(&source.id) {
            return Err(TransformError::UnsupportedPair {
                source: source.id.clone(),
                target: target.id.clone(),
            });
        }

        let kind = if is_geographic(&target.id) {
            TargetKind::Geographic
        } else if target.id == EPSG_4978 {
            TargetKind::Ecef
        } else if target.id == EPSG_3857 {
            TargetKind::Mercator
        } else {
            return Err(TransformError::UnsupportedPair {
                source: source.id.clone(),
                target: target.id.clone(),
            });
        };

        Ok(Box::new(GeodeticTransform {
            source: source.clone(),
            target: target.clone(),
            kind,
            wrap: options.normalize_wrap_around,
        }))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TargetKind {
    Geographic,
    Ecef,
    Mercator,
}

struct GeodeticTransform {
    source: CoordinateReference,
    target: CoordinateReference,
    kind: TargetKind,
    wrap: bool,
}

impl GeodeticTransform {
    /// Reads `coords` in the source's axis order into (lon, lat, alt) degrees.
    fn read_source(&self, coords: [f64; 3]) -> Result<(f64, f64, f64), TransformError> {
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::NonFinite {
                reference: self.source.id.clone(),
            });
        }
        let (lon, lat) = match self.source.axis_order {
            AxisOrder::LonLat => (coords[0], coords[1]),
            AxisOrder::LatLon => (coords[1], coords[0]),
        };
        if !(-90.0..=90.0).contains(&lat) {
            return Err(TransformError::OutOfDomain {
                reference: self.source.id.clone(),
                message: format!("latitude {lat} outside [-90, 90]"),
            });
        }
        let lon = if self.wrap { wrap_longitude_deg(lon) } else { lon };
        Ok((lon, lat, coords[2]))
    }

    fn write_source(&self, lon: f64, lat: f64, alt: f64) -> [f64; 3] {
        match self.source.axis_order {
            AxisOrder::LonLat => [lon, lat, alt],
            AxisOrder::LatLon => [lat, lon, alt],
        }
    }

    fn check_finite(&self, out: [f64; 3], reference: &str) -> Result<[f64; 3], TransformError> {
        if out.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::NonFinite {
                reference: reference.to_string(),
            });
        }
        Ok(out)
    }
}

impl CoordinateTransform for GeodeticTransform {
    fn forward(&self, coords: [f64; 3]) -> Result<[f64; 3], TransformError> {
        let (lon, lat, alt) = self.read_source(coords)?;

        let out = match self.kind {
            TargetKind::Geographic => {
                let z = if self.target.has_altitude { alt } else { 0.0 };
                match self.target.axis_order {
                    AxisOrder::LonLat => [lon, lat, z],
                    AxisOrder::LatLon => [lat, lon, z],
                }
            }
            TargetKind::Ecef => {
                let ecef = geodetic_to_ecef(Geodetic::from_degrees(lat, lon, alt));
                ecef.as_array()
            }
            TargetKind::Mercator => {
                if lat.abs() > MERCATOR_MAX_LAT_DEG {
                    return Err(TransformError::OutOfDomain {
                        reference: self.target.id.clone(),
                        message: format!("latitude {lat} outside the Mercator domain"),
                    });
                }
                let [x, y] = lonlat_to_mercator(lon, lat);
                [x, y, 0.0]
            }
        };

        self.check_finite(out, &self.target.id)
    }

    fn inverse(&self, coords: [f64; 3]) -> Result<[f64; 3], TransformError> {
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::NonFinite {
                reference: self.target.id.clone(),
            });
        }

        let (lon, lat, alt) = match self.kind {
            TargetKind::Geographic => {
                let (lon, lat) = match self.target.axis_order {
                    AxisOrder::LonLat => (coords[0], coords[1]),
                    AxisOrder::LatLon => (coords[1], coords[0]),
                };
                (lon, lat, coords[2])
            }
            TargetKind::Ecef => {
                let geo = ecef_to_geodetic(Ecef::from_array(coords));
                (geo.lon_deg(), geo.lat_deg(), geo.alt_m)
            }
            TargetKind::Mercator => {
                let [lon, lat] = mercator_to_lonlat(coords[0], coords[1]);
                (lon, lat, 0.0)
            }
        };

        self.check_finite(self.write_source(lon, lat, alt), &self.source.id)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeodeticProvider, TransformProvider};
    use crate::reference::{CRS84, EPSG_3857, EPSG_4326, EPSG_4978, EPSG_4979};
    use crate::transform::{TransformError, TransformOptions};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn provider() -> GeodeticProvider {
        GeodeticProvider::new()
    }

    #[test]
    fn lonlat_to_ecef_round_trip() {
        let p = provider();
        let src = p.reference(CRS84).unwrap();
        let dst = p.reference(EPSG_4978).unwrap();
        let tx = p
            .create_transform(&src, &dst, TransformOptions::default())
            .unwrap();

        let native = tx.forward([72.5714, 23.0225, 1000.0]).unwrap();
        let back = tx.inverse(native).unwrap();
        assert_close(back[0], 72.5714, 1e-9);
        assert_close(back[1], 23.0225, 1e-9);
        assert_close(back[2], 1000.0, 1e-6);
    }

    #[test]
    fn latlon_source_reads_swapped_axes() {
        let p = provider();
        let src = p.reference(EPSG_4326).unwrap();
        let dst = p.reference(EPSG_4978).unwrap();
        let tx = p
            .create_transform(&src, &dst, TransformOptions::default())
            .unwrap();

        // EPSG:4326 input order is [lat, lon].
        let native = tx.forward([23.0225, 72.5714, 0.0]).unwrap();
        let back = tx.inverse(native).unwrap();
        assert_close(back[0], 23.0225, 1e-9);
        assert_close(back[1], 72.5714, 1e-9);
    }

    #[test]
    fn geographic_target_drops_altitude_when_2d() {
        let p = provider();
        let src = p.reference(CRS84).unwrap();
        let tx_2d = p
            .create_transform(
                &src,
                &p.reference(EPSG_4326).unwrap(),
                TransformOptions::default(),
            )
            .unwrap();
        assert_eq!(tx_2d.forward([10.0, 20.0, 500.0]).unwrap(), [
            20.0, 10.0, 0.0
        ]);

        let tx_3d = p
            .create_transform(
                &src,
                &p.reference(EPSG_4979).unwrap(),
                TransformOptions::default(),
            )
            .unwrap();
        assert_eq!(tx_3d.forward([10.0, 20.0, 500.0]).unwrap(), [
            20.0, 10.0, 500.0
        ]);
    }

    #[test]
    fn mercator_rejects_polar_latitudes() {
        let p = provider();
        let src = p.reference(CRS84).unwrap();
        let dst = p.reference(EPSG_3857).unwrap();
        let tx = p
            .create_transform(&src, &dst, TransformOptions::default())
            .unwrap();
        assert!(matches!(
            tx.forward([0.0, 89.0, 0.0]),
            Err(TransformError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn wrap_normalization_is_opt_in() {
        let p = provider();
        let src = p.reference(CRS84).unwrap();
        let dst = p.reference(EPSG_3857).unwrap();

        let plain = p
            .create_transform(&src, &dst, TransformOptions::default())
            .unwrap();
        let wrapped = p
            .create_transform(&src, &dst, TransformOptions {
                normalize_wrap_around: true,
            })
            .unwrap();

        let a = plain.forward([190.0, 0.0, 0.0]).unwrap();
        let b = wrapped.forward([190.0, 0.0, 0.0]).unwrap();
        assert!(a[0] > 0.0);
        assert!(b[0] < 0.0);
    }

    #[test]
    fn non_geographic_source_is_unsupported() {
        let p = provider();
        let src = p.reference(EPSG_4978).unwrap();
        let dst = p.reference(CRS84).unwrap();
        assert!(matches!(
            p.create_transform(&src, &dst, TransformOptions::default()),
            Err(TransformError::UnsupportedPair { .. })
        ));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let p = provider();
        let src = p.reference(CRS84).unwrap();
        let dst = p.reference(EPSG_4978).unwrap();
        let tx = p
            .create_transform(&src, &dst, TransformOptions::default())
            .unwrap();
        assert!(matches!(
            tx.forward([f64::NAN, 0.0, 0.0]),
            Err(TransformError::NonFinite { .. })
        ));
    }
}
