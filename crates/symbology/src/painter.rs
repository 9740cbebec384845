use std::collections::BTreeMap;
use std::sync::Arc;

use engine::canvas::{
    DrapeTarget, DrawCanvas, FillStyle, IconAnchor, IconDraw, ShapeDraw, StrokeStyle,
};
use engine::shape::Shape;
use engine::sprite::{Sprite, Stroke, circle_sprite};
use foundation::color::Rgba;
use mesh::{MeshDigest, MeshIcon, MeshSpec, TriangleMesh};
use serde::{Deserialize, Serialize};

use crate::resolve::{ResolvedPointSymbol, resolve_line, resolve_point, resolve_polygon};
use crate::style::{LayerKind, StyleDefinition};

/// Opt-in debug tracing. All flags default off; nothing is logged unless
/// `enabled` and the specific flag are both set.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub paint_logs: bool,
    #[serde(default)]
    pub store_logs: bool,
}

impl DebugConfig {
    pub fn paint_logs_enabled(&self) -> bool {
        self.enabled && self.paint_logs
    }

    pub fn store_logs_enabled(&self) -> bool {
        self.enabled && self.store_logs
    }
}

/// Key schema for the circle sprite cache: exact bit patterns of the size and
/// stroke width plus quantized colors. Callers keep the key space bounded by
/// not generating unbounded distinct sizes/colors; there is no eviction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CircleKey {
    size_bits: u64,
    fill: [u8; 4],
    outline: [u8; 4],
    width_bits: u64,
}

/// Process-wide paint caches, owned by the facade and shared by every layer
/// painter. Growth is unbounded by design; `clear` exists for tests.
#[derive(Debug, Default)]
pub struct PaintCaches {
    circles: BTreeMap<CircleKey, Arc<Sprite>>,
    meshes: BTreeMap<MeshDigest, Arc<TriangleMesh>>,
}

impl PaintCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.circles.clear();
        self.meshes.clear();
    }

    pub fn circle_count(&self) -> usize {
        self.circles.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Rasterizes (or reuses) the sprite for a circle marker.
    pub fn circle(&mut self, size: f64, fill: Rgba, outline: Rgba, outline_width: f64) -> Arc<Sprite> {
        let key = CircleKey {
            size_bits: size.to_bits(),
            fill: fill.to_rgba8(),
            outline: outline.to_rgba8(),
            width_bits: outline_width.to_bits(),
        };
        self.circles
            .entry(key)
            .or_insert_with(|| {
                let stroke = (outline_width > 0.0).then_some(Stroke {
                    color: outline,
                    width: outline_width,
                });
                Arc::new(circle_sprite(size, fill, stroke))
            })
            .clone()
    }

    /// Builds (or reuses) the compiled mesh for a spec and wraps it with the
    /// spec's render parameters. The mesh is keyed by the shape digest, so a
    /// stale entry simply never gets hit again once the shape changes.
    pub fn mesh_icon(&mut self, spec: &MeshSpec) -> MeshIcon {
        let digest = spec.shape.digest();
        let compiled = self
            .meshes
            .entry(digest)
            .or_insert_with(|| Arc::new(spec.shape.build()))
            .clone();
        spec.icon_with_mesh(compiled)
    }
}

/// Per-layer paint hook: resolves style for each feature and issues draw
/// primitives. Rebuilt whenever the layer's default style changes.
#[derive(Debug, Clone)]
pub struct Painter {
    kind: LayerKind,
    layer_style: StyleDefinition,
    debug: DebugConfig,
}

impl Painter {
    pub fn new(kind: LayerKind, layer_style: StyleDefinition, debug: DebugConfig) -> Self {
        Self {
            kind,
            layer_style,
            debug,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn layer_style(&self) -> &StyleDefinition {
        &self.layer_style
    }

    /// Paints one feature. Deterministic for a given (shape, style, selected)
    /// triple; the only side effects are cache fills.
    pub fn paint(
        &self,
        caches: &mut PaintCaches,
        canvas: &mut dyn DrawCanvas,
        shape: &Shape,
        override_style: Option<&StyleDefinition>,
        selected: bool,
    ) {
        let style = match override_style {
            Some(patch) => self.layer_style.merged_with(patch),
            None => self.layer_style.clone(),
        };

        if self.debug.paint_logs_enabled() {
            log::debug!("paint {:?} selected={selected}", self.kind);
        }

        match self.kind {
            LayerKind::Point => self.paint_point(caches, canvas, shape, &style, selected),
            LayerKind::Polyline => paint_line(canvas, shape, &style, selected),
            LayerKind::Polygon => paint_polygon(canvas, shape, &style, selected),
        }
    }

    fn paint_point(
        &self,
        caches: &mut PaintCaches,
        canvas: &mut dyn DrawCanvas,
        shape: &Shape,
        style: &StyleDefinition,
        selected: bool,
    ) {
        let Some(anchor) = shape.anchor() else {
            return;
        };

        match resolve_point(style, selected) {
            ResolvedPointSymbol::Mesh { spec } => {
                let icon = caches.mesh_icon(&spec);
                canvas.draw_mesh_icon(anchor, &icon);
            }
            ResolvedPointSymbol::Icon {
                sprite: Some(sprite),
                width,
                height,
                anchor: icon_anchor,
                rotation_deg,
                opacity,
            } => {
                // 3D point markers must not be snapped onto the terrain.
                let drape = if shape.has_altitude() {
                    DrapeTarget::NotDraped
                } else {
                    DrapeTarget::Terrain
                };
                canvas.draw_icon(anchor, &IconDraw {
                    sprite,
                    width,
                    height,
                    anchor: IconAnchor {
                        x: icon_anchor[0],
                        y: icon_anchor[1],
                    },
                    rotation_deg,
                    opacity,
                    drape,
                });
            }
            ResolvedPointSymbol::Icon { sprite: None, .. } => {
                // No raster supplied: fall back to the default circle marker.
                let fallback = StyleDefinition {
                    point: None,
                    ..style.clone()
                };
                self.draw_circle(caches, canvas, anchor, &fallback, selected);
            }
            ResolvedPointSymbol::Circle { .. } => {
                self.draw_circle(caches, canvas, anchor, style, selected);
            }
        }
    }

    fn draw_circle(
        &self,
        caches: &mut PaintCaches,
        canvas: &mut dyn DrawCanvas,
        anchor: foundation::math::Vec3,
        style: &StyleDefinition,
        selected: bool,
    ) {
        let ResolvedPointSymbol::Circle {
            size,
            fill,
            outline,
            outline_width,
        } = resolve_point(style, selected)
        else {
            return;
        };
        let sprite = caches.circle(size, fill, outline, outline_width);
        let (w, h) = (sprite.width as f64, sprite.height as f64);
        canvas.draw_icon(anchor, &IconDraw {
            sprite,
            width: w,
            height: h,
            anchor: IconAnchor::default(),
            rotation_deg: 0.0,
            opacity: 1.0,
            drape: DrapeTarget::Terrain,
        });
    }
}

fn paint_line(
    canvas: &mut dyn DrawCanvas,
    shape: &Shape,
    style: &StyleDefinition,
    selected: bool,
) {
    let line = resolve_line(style, selected);
    let drape = if shape.has_altitude() {
        DrapeTarget::NotDraped
    } else {
        DrapeTarget::Terrain
    };
    canvas.draw_shape(shape, &ShapeDraw {
        stroke: Some(StrokeStyle {
            color: line.color,
            width: line.width,
            dash: line.dash,
        }),
        fill: None,
        drape,
    });
}

fn paint_polygon(
    canvas: &mut dyn DrawCanvas,
    shape: &Shape,
    style: &StyleDefinition,
    selected: bool,
) {
    let pg = resolve_polygon(style, selected);
    let drape = if shape.has_altitude() {
        DrapeTarget::NotDraped
    } else {
        DrapeTarget::Terrain
    };
    canvas.draw_shape(shape, &ShapeDraw {
        stroke: Some(StrokeStyle {
            color: pg.outline,
            width: pg.outline_width,
            dash: None,
        }),
        fill: Some(FillStyle { color: pg.fill }),
        drape,
    });
}
