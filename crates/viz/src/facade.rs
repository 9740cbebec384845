use std::collections::BTreeSet;
use std::sync::Arc;

use engine::canvas::DrawCanvas;
use engine::reference::CoordinateReference;
use engine::shape::Shape;
use engine::transform::TransformProvider;
use foundation::ids::IdAllocator;
use mesh::MeshSpec;
use symbology::painter::PaintCaches;
use symbology::style::{LayerKind, MeshPointStyle, PointStyle, StyleDefinition};

use crate::VizError;
use crate::collection::{Attributes, ChangeEvent, FeatureId};
use crate::config::VizConfig;
use crate::registry::{CreatedLayer, LayerDefinition, LayerEntry, LayerId, LayerRegistry};
use crate::resolver::{GeoCoord, TransformResolver};
use crate::store;

/// Where a feature landed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FeatureRef {
    pub layer: LayerId,
    pub feature: FeatureId,
}

/// The map the facade registers drawable collections with.
///
/// `map_reference` doubles as the default target reference for layers that
/// do not name one.
pub trait MapBackend {
    fn map_reference(&self) -> CoordinateReference;
    fn attach_layer(&mut self, id: LayerId, label: &str);
    fn detach_layer(&mut self, id: LayerId);
}

/// Backend with no renderer behind it; keeps the attach/detach ledger so
/// hosts and tests can observe lifecycle calls.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    reference: CoordinateReference,
    pub attached: Vec<LayerId>,
}

impl HeadlessBackend {
    pub fn new(reference: CoordinateReference) -> Self {
        Self {
            reference,
            attached: Vec::new(),
        }
    }
}

impl MapBackend for HeadlessBackend {
    fn map_reference(&self) -> CoordinateReference {
        self.reference.clone()
    }

    fn attach_layer(&mut self, id: LayerId, _label: &str) {
        self.attached.push(id);
    }

    fn detach_layer(&mut self, id: LayerId) {
        self.attached.retain(|l| *l != id);
    }
}

/// Application-facing visualization facade.
///
/// Describes drawables in lon/lat/alt terms and realizes them as registered
/// layers, transformed features and paint-time styles. All operations are
/// synchronous and run on the caller's thread.
pub struct Viz {
    provider: Arc<dyn TransformProvider>,
    backend: Box<dyn MapBackend>,
    resolver: TransformResolver,
    registry: LayerRegistry,
    feature_ids: IdAllocator,
    caches: PaintCaches,
    config: VizConfig,
}

impl Viz {
    pub fn new(provider: Arc<dyn TransformProvider>, backend: Box<dyn MapBackend>) -> Self {
        Self {
            resolver: TransformResolver::new(provider.clone()),
            provider,
            backend,
            registry: LayerRegistry::new(),
            feature_ids: IdAllocator::new(),
            caches: PaintCaches::new(),
            config: VizConfig::default(),
        }
    }

    pub fn with_config(
        provider: Arc<dyn TransformProvider>,
        backend: Box<dyn MapBackend>,
        config: VizConfig,
    ) -> Self {
        let mut viz = Self::new(provider, backend);
        viz.configure(config);
        viz
    }

    /// Applies startup configuration; see `TransformResolver::configure` for
    /// the cache consequences.
    pub fn configure(&mut self, config: VizConfig) {
        self.config = config;
        self.resolver.configure(&config);
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Drops every process-wide cache (transforms, source choices, sprites,
    /// compiled meshes). Meant for tests.
    pub fn clear_caches(&mut self) {
        self.resolver.clear_caches();
        self.caches.clear();
    }

    /* ----------------------------- layers ----------------------------- */

    pub fn create_layer(&mut self, def: LayerDefinition) -> Result<CreatedLayer, VizError> {
        let map_reference = self.backend.map_reference();
        let created = self.registry.create_layer(
            def,
            &map_reference,
            self.provider.as_ref(),
            self.config.debug,
        )?;
        self.backend.attach_layer(created.id, &created.label);
        Ok(created)
    }

    /// Idempotent, declarative layer setup: reuse by (label, kind,
    /// reference) or create. Safe to call on every scenario reload.
    pub fn get_or_create_layer(&mut self, def: LayerDefinition) -> Result<CreatedLayer, VizError> {
        let map_reference = self.backend.map_reference();
        let (created, is_new) = self.registry.get_or_create_layer(
            def,
            &map_reference,
            self.provider.as_ref(),
            self.config.debug,
        )?;
        if is_new {
            self.backend.attach_layer(created.id, &created.label);
        }
        Ok(created)
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> Result<(), VizError> {
        self.registry.set_active_layer(id)
    }

    pub fn active_layer(&self) -> Option<LayerId> {
        self.registry.active()
    }

    pub fn layer(&self, id: LayerId) -> Result<&LayerEntry, VizError> {
        self.registry.get(id)
    }

    pub fn find_layer_by_label(
        &self,
        label: &str,
        kind: Option<LayerKind>,
        reference: Option<&str>,
    ) -> Option<LayerId> {
        self.registry.find_by_label(label, kind, reference).map(|e| e.id)
    }

    pub fn set_layer_visibility(&mut self, id: LayerId, visible: bool) -> Result<(), VizError> {
        self.registry.set_visibility(id, visible)
    }

    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f64) -> Result<(), VizError> {
        self.registry.set_opacity(id, opacity)
    }

    pub fn update_layer_style(
        &mut self,
        id: LayerId,
        style: StyleDefinition,
    ) -> Result<(), VizError> {
        self.registry.update_layer_style(id, style)
    }

    /// Merges a style patch into the first layer matching (label, kind).
    /// Returns whether a layer was found.
    pub fn update_layer_style_by_label(
        &mut self,
        label: &str,
        kind: LayerKind,
        patch: &StyleDefinition,
    ) -> Result<bool, VizError> {
        let hit = self
            .registry
            .find_by_label(label, Some(kind), None)
            .map(|e| (e.id, e.style.merged_with(patch)));
        let Some((id, merged)) = hit else {
            return Ok(false);
        };
        self.registry.update_layer_style(id, merged)?;
        Ok(true)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Result<(), VizError> {
        self.registry.remove(id)?;
        self.backend.detach_layer(id);
        Ok(())
    }

    /* ---------------------- features (active layer) ---------------------- */

    fn active(&self) -> Result<LayerId, VizError> {
        self.registry.active().ok_or(VizError::NoActiveLayer)
    }

    pub fn add_point(
        &mut self,
        lon: f64,
        lat: f64,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let layer = self.active()?;
        self.add_point_to(layer, lon, lat, attrs, style)
    }

    pub fn add_point_3d(
        &mut self,
        lon: f64,
        lat: f64,
        alt: f64,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let layer = self.active()?;
        self.add_point_3d_to(layer, lon, lat, alt, attrs, style)
    }

    pub fn add_polyline(
        &mut self,
        coords: &[GeoCoord],
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let layer = self.active()?;
        self.add_polyline_to(layer, coords, attrs, style)
    }

    pub fn add_polyline_3d(
        &mut self,
        coords: &[[f64; 3]],
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let layer = self.active()?;
        self.add_polyline_3d_to(layer, coords, attrs, style)
    }

    pub fn add_polygon(
        &mut self,
        ring: &[GeoCoord],
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let layer = self.active()?;
        self.add_polygon_to(layer, ring, attrs, style)
    }

    pub fn add_extruded_polygon(
        &mut self,
        ring: &[GeoCoord],
        min_height: f64,
        max_height: f64,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let layer = self.active()?;
        self.add_extruded_polygon_to(layer, ring, min_height, max_height, attrs, style)
    }

    pub fn add_extruded_polyline(
        &mut self,
        coords: &[GeoCoord],
        min_height: f64,
        max_height: f64,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let layer = self.active()?;
        self.add_extruded_polyline_to(layer, coords, min_height, max_height, attrs, style)
    }

    pub fn add_mesh_icon(
        &mut self,
        lon: f64,
        lat: f64,
        alt: Option<f64>,
        spec: MeshSpec,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let layer = self.active()?;
        self.add_mesh_icon_to(layer, lon, lat, alt, spec, attrs, style)
    }

    /* ---------------------- features (explicit layer) ---------------------- */

    pub fn add_point_to(
        &mut self,
        layer: LayerId,
        lon: f64,
        lat: f64,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let reference = self.layer_reference(layer)?;
        let native = self.resolver.to_native(&reference, GeoCoord::new(lon, lat))?;
        self.insert(layer, Shape::Point(native), attrs, style)
    }

    pub fn add_point_3d_to(
        &mut self,
        layer: LayerId,
        lon: f64,
        lat: f64,
        alt: f64,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let reference = self.layer_reference(layer)?;
        let native = self
            .resolver
            .to_native(&reference, GeoCoord::with_alt(lon, lat, alt))?;
        self.insert(layer, Shape::Point(native), attrs, style)
    }

    pub fn add_polyline_to(
        &mut self,
        layer: LayerId,
        coords: &[GeoCoord],
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let reference = self.layer_reference(layer)?;
        let points = self.resolver.to_native_coords(&reference, coords)?;
        self.insert(layer, Shape::Polyline(points), attrs, style)
    }

    pub fn add_polyline_3d_to(
        &mut self,
        layer: LayerId,
        coords: &[[f64; 3]],
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let geo: Vec<GeoCoord> = coords
            .iter()
            .map(|c| GeoCoord::with_alt(c[0], c[1], c[2]))
            .collect();
        self.add_polyline_to(layer, &geo, attrs, style)
    }

    pub fn add_polygon_to(
        &mut self,
        layer: LayerId,
        ring: &[GeoCoord],
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let reference = self.layer_reference(layer)?;
        let points = self.resolver.to_native_coords(&reference, ring)?;
        self.insert(layer, Shape::polygon(points), attrs, style)
    }

    pub fn add_extruded_polygon_to(
        &mut self,
        layer: LayerId,
        ring: &[GeoCoord],
        min_height: f64,
        max_height: f64,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let reference = self.layer_reference(layer)?;
        let points = self.resolver.to_native_coords(&reference, ring)?;
        let shape = Shape::extruded(Shape::polygon(points), min_height, max_height);
        self.insert(layer, shape, attrs, style)
    }

    pub fn add_extruded_polyline_to(
        &mut self,
        layer: LayerId,
        coords: &[GeoCoord],
        min_height: f64,
        max_height: f64,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let reference = self.layer_reference(layer)?;
        let points = self.resolver.to_native_coords(&reference, coords)?;
        let shape = Shape::extruded(Shape::Polyline(points), min_height, max_height);
        self.insert(layer, shape, attrs, style)
    }

    /// Adds a point feature whose symbol is a procedural mesh. The mesh spec
    /// becomes the feature's point style; an explicit style patch wins over
    /// it field by field.
    pub fn add_mesh_icon_to(
        &mut self,
        layer: LayerId,
        lon: f64,
        lat: f64,
        alt: Option<f64>,
        spec: MeshSpec,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let reference = self.layer_reference(layer)?;
        let coord = match alt {
            Some(alt) => GeoCoord::with_alt(lon, lat, alt),
            None => GeoCoord::new(lon, lat),
        };
        let native = self.resolver.to_native(&reference, coord)?;

        let mesh_style = StyleDefinition {
            point: Some(PointStyle::Mesh(MeshPointStyle { spec })),
            ..Default::default()
        };
        let merged = match style {
            Some(patch) => mesh_style.merged_with(&patch),
            None => mesh_style,
        };
        self.insert(layer, Shape::Point(native), attrs, Some(merged))
    }

    /* ------------------------- feature updates ------------------------- */

    pub fn update_attributes(
        &mut self,
        layer: LayerId,
        feature: FeatureId,
        attrs: &Attributes,
    ) -> Result<(), VizError> {
        store::update_attributes(self.registry.get_mut(layer)?, feature, attrs)
    }

    pub fn update_feature_style(
        &mut self,
        layer: LayerId,
        feature: FeatureId,
        patch: &StyleDefinition,
    ) -> Result<(), VizError> {
        store::update_feature_style(self.registry.get_mut(layer)?, feature, patch)
    }

    /// Best-effort deletion; unknown feature ids are skipped silently, an
    /// unknown layer is still an error.
    pub fn delete_features(&mut self, layer: LayerId, ids: &[FeatureId]) -> Result<(), VizError> {
        store::delete_features(self.registry.get_mut(layer)?, ids);
        Ok(())
    }

    /// Hands the layer's accumulated change events to the host.
    pub fn drain_layer_events(&mut self, layer: LayerId) -> Result<Vec<ChangeEvent>, VizError> {
        Ok(self.registry.get_mut(layer)?.collection.drain_events())
    }

    /* ----------------------------- painting ----------------------------- */

    /// Paint hook for one feature, invoked by the engine per visible feature
    /// per frame.
    pub fn paint_feature(
        &mut self,
        layer: LayerId,
        feature: FeatureId,
        canvas: &mut dyn DrawCanvas,
        selected: bool,
    ) -> Result<(), VizError> {
        let entry = self.registry.get(layer)?;
        let f = entry
            .collection
            .get(feature)
            .ok_or(VizError::FeatureNotFound { layer, feature })?;
        entry
            .painter()
            .paint(&mut self.caches, canvas, &f.shape, f.style.as_ref(), selected);
        Ok(())
    }

    /// Paints every feature of a visible layer; returns how many were drawn.
    pub fn paint_layer(
        &mut self,
        layer: LayerId,
        canvas: &mut dyn DrawCanvas,
        selected: &BTreeSet<FeatureId>,
    ) -> Result<usize, VizError> {
        let entry = self.registry.get(layer)?;
        if !entry.visible {
            return Ok(0);
        }
        let mut painted = 0;
        for f in entry.collection.iter() {
            entry.painter().paint(
                &mut self.caches,
                canvas,
                &f.shape,
                f.style.as_ref(),
                selected.contains(&f.id),
            );
            painted += 1;
        }
        Ok(painted)
    }

    /* ----------------------------- internals ----------------------------- */

    fn layer_reference(&self, layer: LayerId) -> Result<CoordinateReference, VizError> {
        Ok(self.registry.get(layer)?.reference().clone())
    }

    fn insert(
        &mut self,
        layer: LayerId,
        shape: Shape,
        attrs: Attributes,
        style: Option<StyleDefinition>,
    ) -> Result<FeatureRef, VizError> {
        let entry = self.registry.get_mut(layer)?;
        let feature = store::insert_feature(entry, &mut self.feature_ids, shape, attrs, style);
        Ok(FeatureRef { layer, feature })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use engine::canvas::RecordingCanvas;
    use engine::geodetic::GeodeticProvider;
    use engine::reference::{EPSG_4326, EPSG_4978};
    use engine::shape::Shape;
    use engine::transform::TransformProvider;
    use mesh::{MeshShape, MeshSpec};
    use symbology::style::{CircleStyle, LayerKind, PointStyle, StyleDefinition};

    use super::{HeadlessBackend, Viz};
    use crate::VizError;
    use crate::collection::{Attributes, FeatureId};
    use crate::registry::LayerDefinition;
    use crate::resolver::GeoCoord;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn ecef_viz() -> Viz {
        let provider = Arc::new(GeodeticProvider::new());
        let backend = HeadlessBackend::new(provider.reference(EPSG_4978).unwrap());
        Viz::new(provider, Box::new(backend))
    }

    fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attributes {
        let mut out = Attributes::new();
        for (k, v) in pairs {
            out.insert((*k).to_string(), v.clone());
        }
        out
    }

    #[test]
    fn end_to_end_aircraft_scenario() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("Aircraft", LayerKind::Point))
            .unwrap();

        let f = viz
            .add_point_3d(
                10.0,
                20.0,
                1000.0,
                attrs(&[("name", serde_json::Value::from("A1"))]),
                None,
            )
            .unwrap();

        let entry = viz.layer(layer.id).unwrap();
        assert_eq!(entry.collection.len(), 1);
        let feature = entry.collection.get(f.feature).unwrap();
        assert_eq!(feature.attrs["name"], "A1");
        assert!(feature.style.is_none());

        // Inverse-transforming the native geometry recovers the input.
        let Shape::Point(native) = &feature.shape else {
            panic!("expected a point");
        };
        assert!(native.length() > 6_000_000.0);
        let ecef = foundation::math::Ecef::new(native.x, native.y, native.z);
        let geo = foundation::math::ecef_to_geodetic(ecef);
        assert_close(geo.lon_deg(), 10.0, 1e-6);
        assert_close(geo.lat_deg(), 20.0, 1e-6);
        assert_close(geo.alt_m, 1000.0, 1e-6);

        // Painting uses the layer default (no override): one icon draw.
        let mut canvas = RecordingCanvas::new();
        viz.paint_feature(layer.id, f.feature, &mut canvas, false)
            .unwrap();
        assert_eq!(canvas.icons.len(), 1);
    }

    #[test]
    fn active_layer_routes_adds_and_is_required() {
        let mut viz = ecef_viz();
        assert!(matches!(
            viz.add_point(0.0, 0.0, Attributes::new(), None),
            Err(VizError::NoActiveLayer)
        ));

        let a = viz
            .create_layer(LayerDefinition::new("A", LayerKind::Point))
            .unwrap();
        let b = viz
            .create_layer(LayerDefinition::new("B", LayerKind::Point))
            .unwrap();

        // Creation activates the newest layer.
        viz.add_point(1.0, 1.0, Attributes::new(), None).unwrap();
        assert_eq!(viz.layer(b.id).unwrap().collection.len(), 1);

        viz.set_active_layer(a.id).unwrap();
        viz.add_point(2.0, 2.0, Attributes::new(), None).unwrap();
        assert_eq!(viz.layer(a.id).unwrap().collection.len(), 1);
    }

    #[test]
    fn feature_ids_are_unique_across_layers() {
        let mut viz = ecef_viz();
        let a = viz
            .create_layer(LayerDefinition::new("A", LayerKind::Point))
            .unwrap();
        let b = viz
            .create_layer(LayerDefinition::new("B", LayerKind::Point))
            .unwrap();

        let mut seen = BTreeSet::new();
        for layer in [a.id, b.id, a.id, b.id] {
            let f = viz
                .add_point_to(layer, 0.0, 0.0, Attributes::new(), None)
                .unwrap();
            assert!(seen.insert(f.feature));
        }
    }

    #[test]
    fn update_attributes_requires_the_feature() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("A", LayerKind::Point))
            .unwrap();
        let err = viz
            .update_attributes(layer.id, FeatureId(999), &Attributes::new())
            .unwrap_err();
        assert!(matches!(err, VizError::FeatureNotFound { .. }));

        let f = viz.add_point(5.0, 5.0, Attributes::new(), None).unwrap();
        viz.update_attributes(
            layer.id,
            f.feature,
            &attrs(&[("status", serde_json::Value::from("active"))]),
        )
        .unwrap();
        let feature = viz.layer(layer.id).unwrap().collection.get(f.feature).unwrap();
        assert_eq!(feature.attrs["status"], "active");
    }

    #[test]
    fn delete_is_idempotent_but_layer_lookup_is_not() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("A", LayerKind::Point))
            .unwrap();
        let f = viz.add_point(0.0, 0.0, Attributes::new(), None).unwrap();

        viz.delete_features(layer.id, &[f.feature, FeatureId(12345)])
            .unwrap();
        assert!(viz.layer(layer.id).unwrap().collection.is_empty());
        // Deleting again stays silent.
        viz.delete_features(layer.id, &[f.feature]).unwrap();

        assert!(matches!(
            viz.delete_features(crate::registry::LayerId(77), &[]),
            Err(VizError::LayerNotFound(_))
        ));
    }

    #[test]
    fn removed_layer_rejects_further_operations() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("Tmp", LayerKind::Polygon))
            .unwrap();
        viz.remove_layer(layer.id).unwrap();
        assert!(matches!(
            viz.layer(layer.id),
            Err(VizError::LayerNotFound(_))
        ));
        assert!(matches!(
            viz.paint_feature(layer.id, FeatureId(1), &mut RecordingCanvas::new(), false),
            Err(VizError::LayerNotFound(_))
        ));
    }

    #[test]
    fn feature_style_patch_survives_layer_style_update() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("Styled", LayerKind::Point))
            .unwrap();
        let f = viz.add_point(0.0, 0.0, Attributes::new(), None).unwrap();

        let blue = StyleDefinition {
            point: Some(PointStyle::Circle(CircleStyle {
                fill: Some(foundation::color::Rgba::parse("#0000ff").unwrap()),
                ..Default::default()
            })),
            ..Default::default()
        };
        viz.update_feature_style(layer.id, f.feature, &blue).unwrap();

        // Replacing the layer default leaves the override in place.
        viz.update_layer_style(layer.id, StyleDefinition {
            opacity: Some(0.5),
            ..Default::default()
        })
        .unwrap();

        let feature = viz.layer(layer.id).unwrap().collection.get(f.feature).unwrap();
        let style = feature.style.as_ref().unwrap();
        assert!(matches!(style.point, Some(PointStyle::Circle(_))));
    }

    #[test]
    fn mesh_icon_feature_paints_a_mesh_draw() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("Radars", LayerKind::Point))
            .unwrap();
        let spec = MeshSpec::new(MeshShape::Dome {
            radius_x: 500.0,
            radius_y: 500.0,
            radius_z: 300.0,
            vertical_slices: 24,
            horizontal_slices: 16,
        });
        let f = viz
            .add_mesh_icon(70.0, 20.0, Some(0.0), spec, Attributes::new(), None)
            .unwrap();

        let mut canvas = RecordingCanvas::new();
        viz.paint_feature(layer.id, f.feature, &mut canvas, false)
            .unwrap();
        assert_eq!(canvas.mesh_icons.len(), 1);
        assert_eq!(canvas.mesh_icons[0].1.mesh.positions.len(), 25 * 17);
    }

    #[test]
    fn paint_layer_skips_hidden_layers_and_counts_draws() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("Pts", LayerKind::Point))
            .unwrap();
        for i in 0..3 {
            viz.add_point(i as f64, 0.0, Attributes::new(), None).unwrap();
        }

        let mut canvas = RecordingCanvas::new();
        let painted = viz
            .paint_layer(layer.id, &mut canvas, &BTreeSet::new())
            .unwrap();
        assert_eq!(painted, 3);
        assert_eq!(canvas.icons.len(), 3);

        viz.set_layer_visibility(layer.id, false).unwrap();
        let mut canvas = RecordingCanvas::new();
        let painted = viz
            .paint_layer(layer.id, &mut canvas, &BTreeSet::new())
            .unwrap();
        assert_eq!(painted, 0);
        assert_eq!(canvas.draw_count(), 0);
    }

    #[test]
    fn layer_events_record_the_mutation_history() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("Audit", LayerKind::Point))
            .unwrap();
        let f = viz.add_point(0.0, 0.0, Attributes::new(), None).unwrap();
        viz.update_attributes(layer.id, f.feature, &Attributes::new())
            .unwrap();
        viz.delete_features(layer.id, &[f.feature]).unwrap();

        let events = viz.drain_layer_events(layer.id).unwrap();
        assert_eq!(events.len(), 3);
        assert!(viz.drain_layer_events(layer.id).unwrap().is_empty());
    }

    #[test]
    fn update_layer_style_by_label_merges_patch() {
        let mut viz = ecef_viz();
        viz.create_layer(
            LayerDefinition::new("Routes", LayerKind::Polyline).with_style(StyleDefinition {
                line: Some(symbology::style::LineStyle {
                    width: Some(1.0),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        )
        .unwrap();

        let patch = StyleDefinition {
            line: Some(symbology::style::LineStyle {
                color: Some(foundation::color::Rgba::parse("#0b41f0").unwrap()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(
            viz.update_layer_style_by_label("Routes", LayerKind::Polyline, &patch)
                .unwrap()
        );
        assert!(
            !viz.update_layer_style_by_label("Missing", LayerKind::Polyline, &patch)
                .unwrap()
        );

        let id = viz
            .find_layer_by_label("Routes", Some(LayerKind::Polyline), None)
            .unwrap();
        let style = &viz.layer(id).unwrap().style;
        let line = style.line.as_ref().unwrap();
        assert_eq!(line.width, Some(1.0));
        assert!(line.color.is_some());
    }

    #[test]
    fn extruded_polygon_keeps_the_ring_and_heights() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("Zones", LayerKind::Polygon))
            .unwrap();
        let ring = [
            GeoCoord::new(0.0, 0.0),
            GeoCoord::new(0.1, 0.0),
            GeoCoord::new(0.1, 0.1),
            GeoCoord::new(0.0, 0.1),
        ];
        let f = viz
            .add_extruded_polygon(&ring, 0.0, 5000.0, Attributes::new(), None)
            .unwrap();

        let entry = viz.layer(layer.id).unwrap();
        let Shape::Extruded {
            base,
            min_height,
            max_height,
        } = &entry.collection.get(f.feature).unwrap().shape
        else {
            panic!("expected extruded shape");
        };
        assert_eq!(*min_height, 0.0);
        assert_eq!(*max_height, 5000.0);
        let Shape::Polygon { rings } = base.as_ref() else {
            panic!("expected polygon base");
        };
        assert_eq!(rings[0].len(), 4);
    }

    #[test]
    fn latlon_layer_reference_still_takes_lonlat_input() {
        // A layer bound to the lat-lon-ordered geographic reference: the
        // facade API stays lon/lat and the resolver handles the reordering.
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(
                LayerDefinition::new("Flat", LayerKind::Point).with_reference(EPSG_4326),
            )
            .unwrap();
        let f = viz
            .add_point_to(layer.id, 10.0, 20.0, Attributes::new(), None)
            .unwrap();
        let entry = viz.layer(layer.id).unwrap();
        let Shape::Point(p) = &entry.collection.get(f.feature).unwrap().shape else {
            panic!("expected point");
        };
        // Native EPSG:4326 coordinates are [lat, lon].
        assert_eq!((p.x, p.y), (20.0, 10.0));
    }

    #[test]
    fn non_finite_input_inserts_nothing() {
        let mut viz = ecef_viz();
        let layer = viz
            .create_layer(LayerDefinition::new("A", LayerKind::Point))
            .unwrap();
        let err = viz.add_point(f64::NAN, 0.0, Attributes::new(), None);
        assert!(matches!(err, Err(VizError::Transform(_))));
        assert!(viz.layer(layer.id).unwrap().collection.is_empty());
        assert!(viz.drain_layer_events(layer.id).unwrap().is_empty());
    }

    #[test]
    fn unknown_layer_reference_fails_creation() {
        let mut viz = ecef_viz();
        let err = viz
            .create_layer(LayerDefinition::new("X", LayerKind::Point).with_reference("EPSG:9999"))
            .unwrap_err();
        assert!(matches!(err, VizError::Transform(_)));
        assert!(viz.registry().is_empty());
    }

    #[test]
    fn polyline_3d_keeps_vertex_altitudes() {
        let provider = Arc::new(GeodeticProvider::new());
        let backend = HeadlessBackend::new(provider.reference("EPSG:4979").unwrap());
        let mut viz = Viz::new(provider, Box::new(backend));
        viz.create_layer(LayerDefinition::new("Route", LayerKind::Polyline))
            .unwrap();

        let f = viz
            .add_polyline_3d(
                &[[10.0, 20.0, 1000.0], [10.5, 20.5, 2000.0]],
                Attributes::new(),
                None,
            )
            .unwrap();
        let entry = viz.layer(f.layer).unwrap();
        let Shape::Polyline(pts) = &entry.collection.get(f.feature).unwrap().shape else {
            panic!("expected polyline");
        };
        assert_eq!(pts[0].z, 1000.0);
        assert_eq!(pts[1].z, 2000.0);
        assert!(entry.collection.get(f.feature).unwrap().shape.has_altitude());
    }
}
