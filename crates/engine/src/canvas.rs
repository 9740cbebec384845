use std::sync::Arc;

use foundation::color::Rgba;
use foundation::math::Vec3;
use mesh::MeshIcon;

use crate::shape::Shape;
use crate::sprite::Sprite;
use crate::tessellate::triangulate_rings;

/// Whether 2D content is projected onto the terrain surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrapeTarget {
    Terrain,
    NotDraped,
}

/// Anchor inside an icon as fractions of its size; (0.5, 0.5) is centered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IconAnchor {
    pub x: f32,
    pub y: f32,
}

impl Default for IconAnchor {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconDraw {
    pub sprite: Arc<Sprite>,
    pub width: f64,
    pub height: f64,
    pub anchor: IconAnchor,
    pub rotation_deg: f64,
    pub opacity: f64,
    pub drape: DrapeTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f64,
    pub dash: Option<Vec<f64>>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FillStyle {
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDraw {
    pub stroke: Option<StrokeStyle>,
    pub fill: Option<FillStyle>,
    pub drape: DrapeTarget,
}

/// Draw primitives the rendering engine exposes to per-feature painters.
///
/// Implementations are supplied by the host; painters must stay deterministic
/// for a given (shape, style) pair.
pub trait DrawCanvas {
    fn draw_icon(&mut self, at: Vec3, icon: &IconDraw);
    fn draw_mesh_icon(&mut self, at: Vec3, icon: &MeshIcon);
    fn draw_shape(&mut self, shape: &Shape, style: &ShapeDraw);
}

/// Canvas double that records every draw call, standing in for the engine in
/// tests. Filled polygons are tessellated the way a software renderer would,
/// so tests can assert on produced triangles.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub icons: Vec<(Vec3, IconDraw)>,
    pub mesh_icons: Vec<(Vec3, MeshIcon)>,
    pub shapes: Vec<(Shape, ShapeDraw)>,
    pub fill_triangles: Vec<Vec3>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_count(&self) -> usize {
        self.icons.len() + self.mesh_icons.len() + self.shapes.len()
    }

    pub fn clear(&mut self) {
        self.icons.clear();
        self.mesh_icons.clear();
        self.shapes.clear();
        self.fill_triangles.clear();
    }
}

impl DrawCanvas for RecordingCanvas {
    fn draw_icon(&mut self, at: Vec3, icon: &IconDraw) {
        self.icons.push((at, icon.clone()));
    }

    fn draw_mesh_icon(&mut self, at: Vec3, icon: &MeshIcon) {
        self.mesh_icons.push((at, icon.clone()));
    }

    fn draw_shape(&mut self, shape: &Shape, style: &ShapeDraw) {
        if style.fill.is_some()
            && let Shape::Polygon { rings } = shape
        {
            self.fill_triangles.extend(triangulate_rings(rings));
        }
        self.shapes.push((shape.clone(), style.clone()));
    }
}
