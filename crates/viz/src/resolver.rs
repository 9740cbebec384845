use std::collections::BTreeMap;
use std::sync::Arc;

use engine::reference::{CRS84, CoordinateReference, EPSG_4326};
use engine::transform::{
    CoordinateTransform, TransformError, TransformOptions, TransformProvider,
};
use foundation::bounds::Aabb2;
use foundation::math::Vec3;

use crate::config::{SourceMode, VizConfig};

/// Fixed probe coordinate used for the empirical source-frame choice.
///
/// The probe runs at a single location; references whose distortion varies
/// strongly across the globe could in principle pick differently elsewhere.
/// Known approximation, inherited behavior.
pub const PROBE_LON: f64 = 72.5714;
pub const PROBE_LAT: f64 = 23.0225;

/// Geographic input coordinate in degrees (and meters of altitude).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoCoord {
    pub lon: f64,
    pub lat: f64,
    pub alt: Option<f64>,
}

impl GeoCoord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            alt: None,
        }
    }

    pub fn with_alt(lon: f64, lat: f64, alt: f64) -> Self {
        Self {
            lon,
            lat,
            alt: Some(alt),
        }
    }
}

/// Result of the debug round-trip probe.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub source_id: String,
    pub native: Vec3,
    pub back_lon: f64,
    pub back_lat: f64,
}

/// Cache key schema: (resolved source id, target id, wrap-around flag).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TransformKey {
    source: String,
    target: String,
    wrap: bool,
}

/// Picks a geographic source frame per target and caches the transforms.
///
/// Both caches live for the resolver's lifetime; entries are immutable once
/// created and never invalidated except through `configure`/`clear_caches`.
pub struct TransformResolver {
    provider: Arc<dyn TransformProvider>,
    source_mode: SourceMode,
    wrap: bool,
    source_choices: BTreeMap<String, CoordinateReference>,
    transforms: BTreeMap<TransformKey, Box<dyn CoordinateTransform>>,
}

impl TransformResolver {
    pub fn new(provider: Arc<dyn TransformProvider>) -> Self {
        Self {
            provider,
            source_mode: SourceMode::Auto,
            wrap: false,
            source_choices: BTreeMap::new(),
            transforms: BTreeMap::new(),
        }
    }

    /// Applies startup configuration. The transform cache is always dropped
    /// (the wrap flag participates in its key); the source-choice cache only
    /// when the forced mode changed, since the probe result does not depend
    /// on wrap normalization for the in-domain probe coordinate.
    pub fn configure(&mut self, config: &VizConfig) {
        if config.source_mode != self.source_mode {
            self.source_choices.clear();
        }
        self.source_mode = config.source_mode;
        self.wrap = config.normalize_wrap_around;
        self.transforms.clear();
    }

    /// Drops both caches; meant for tests.
    pub fn clear_caches(&mut self) {
        self.source_choices.clear();
        self.transforms.clear();
    }

    fn candidate(&self, id: &str) -> Result<CoordinateReference, TransformError> {
        self.provider
            .reference(id)
            .ok_or_else(|| TransformError::UnknownReference(id.to_string()))
    }

    /// Chooses which of the two candidate geographic frames round-trips the
    /// probe coordinate best into `target`. Memoized per target id.
    pub fn resolve_source(
        &mut self,
        target: &CoordinateReference,
    ) -> Result<CoordinateReference, TransformError> {
        match self.source_mode {
            SourceMode::LonLat => return self.candidate(CRS84),
            SourceMode::LatLon => return self.candidate(EPSG_4326),
            SourceMode::Auto => {}
        }

        if let Some(choice) = self.source_choices.get(&target.id) {
            return Ok(choice.clone());
        }

        let lonlat = self.candidate(CRS84)?;
        let latlon = self.candidate(EPSG_4326)?;
        let err_lonlat = self.probe_error(&lonlat, target);
        let err_latlon = self.probe_error(&latlon, target);

        if err_lonlat.is_infinite() && err_latlon.is_infinite() {
            return Err(TransformError::UnsupportedPair {
                source: format!("{CRS84}, {EPSG_4326}"),
                target: target.id.clone(),
            });
        }

        // Ties favor the lon-lat-ordered candidate.
        let choice = if err_lonlat <= err_latlon { lonlat } else { latlon };
        self.source_choices
            .insert(target.id.clone(), choice.clone());
        Ok(choice)
    }

    /// Round-trip error of the probe coordinate through `source` → `target`
    /// → back, as |Δlon| + |Δlat|. A candidate that cannot be constructed or
    /// fails mid-flight scores infinite rather than failing the resolution.
    fn probe_error(&self, source: &CoordinateReference, target: &CoordinateReference) -> f64 {
        let options = TransformOptions {
            normalize_wrap_around: self.wrap,
        };
        let Ok(tx) = self.provider.create_transform(source, target, options) else {
            return f64::INFINITY;
        };

        let input = order_coords(source, PROBE_LON, PROBE_LAT, 0.0);
        let Ok(native) = tx.forward(input) else {
            return f64::INFINITY;
        };
        let Ok(back) = tx.inverse(native) else {
            return f64::INFINITY;
        };

        let (back_lon, back_lat) = read_coords(source, back);
        (back_lon - PROBE_LON).abs() + (back_lat - PROBE_LAT).abs()
    }

    fn transform_for(
        &mut self,
        source: &CoordinateReference,
        target: &CoordinateReference,
    ) -> Result<&dyn CoordinateTransform, TransformError> {
        let key = TransformKey {
            source: source.id.clone(),
            target: target.id.clone(),
            wrap: self.wrap,
        };
        if !self.transforms.contains_key(&key) {
            let tx = self.provider.create_transform(source, target, TransformOptions {
                normalize_wrap_around: self.wrap,
            })?;
            self.transforms.insert(key.clone(), tx);
        }
        Ok(self.transforms[&key].as_ref())
    }

    /// Transforms one geographic coordinate into `target`'s native space.
    ///
    /// For 3D targets the altitude (default 0) is preserved so 2D input never
    /// produces flattened geometry.
    pub fn to_native(
        &mut self,
        target: &CoordinateReference,
        coord: GeoCoord,
    ) -> Result<Vec3, TransformError> {
        let source = self.resolve_source(target)?;
        let tx = self.transform_for(&source, target)?;
        let input = order_coords(&source, coord.lon, coord.lat, coord.alt.unwrap_or(0.0));
        let out = tx.forward(input)?;
        Ok(Vec3::from_array(out))
    }

    /// Batch variant of `to_native`; fails wholesale on the first bad input.
    pub fn to_native_coords(
        &mut self,
        target: &CoordinateReference,
        coords: &[GeoCoord],
    ) -> Result<Vec<Vec3>, TransformError> {
        let mut out = Vec::with_capacity(coords.len());
        for c in coords {
            out.push(self.to_native(target, *c)?);
        }
        Ok(out)
    }

    /// Transforms a lon/lat rectangle's corners and returns the covering
    /// native-space box.
    pub fn bounds_from_rect(
        &mut self,
        target: &CoordinateReference,
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Aabb2, TransformError> {
        let a = self.to_native(target, GeoCoord::new(min_lon, min_lat))?;
        let b = self.to_native(target, GeoCoord::new(max_lon, max_lat))?;
        Ok(Aabb2::from_corners([a.x, a.y], [b.x, b.y]))
    }

    /// Diagnostic probe: forward and back through the cached transform.
    pub fn roundtrip(
        &mut self,
        target: &CoordinateReference,
        lon: f64,
        lat: f64,
    ) -> Result<RoundTrip, TransformError> {
        let source = self.resolve_source(target)?;
        let tx = self.transform_for(&source, target)?;
        let native = tx.forward(order_coords(&source, lon, lat, 0.0))?;
        let back = tx.inverse(native)?;
        let (back_lon, back_lat) = read_coords(&source, back);
        Ok(RoundTrip {
            source_id: source.id.clone(),
            native: Vec3::from_array(native),
            back_lon,
            back_lat,
        })
    }

    pub fn cached_transform_count(&self) -> usize {
        self.transforms.len()
    }
}

fn order_coords(source: &CoordinateReference, lon: f64, lat: f64, alt: f64) -> [f64; 3] {
    match source.axis_order {
        engine::reference::AxisOrder::LonLat => [lon, lat, alt],
        engine::reference::AxisOrder::LatLon => [lat, lon, alt],
    }
}

fn read_coords(source: &CoordinateReference, coords: [f64; 3]) -> (f64, f64) {
    match source.axis_order {
        engine::reference::AxisOrder::LonLat => (coords[0], coords[1]),
        engine::reference::AxisOrder::LatLon => (coords[1], coords[0]),
    }
}
