use std::sync::Arc;

use foundation::color::Rgba;
use serde::{Deserialize, Serialize};

use crate::build::{self, TriangleMesh};

/// Declarative description of a procedural solid.
///
/// Pure value: replaced, never mutated. The variant tag plus its numeric
/// parameters fully determine the triangle mesh, which is what the rebuild
/// digest hashes over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MeshShape {
    Ellipsoid {
        #[serde(default = "default_radius_axis")]
        radius_x: f64,
        #[serde(default = "default_radius_axis")]
        radius_y: f64,
        #[serde(default = "default_radius_axis")]
        radius_z: f64,
        #[serde(default = "default_vertical_slices")]
        vertical_slices: u32,
        #[serde(default = "default_horizontal_slices")]
        horizontal_slices: u32,
    },
    Dome {
        #[serde(default = "default_radius_axis")]
        radius_x: f64,
        #[serde(default = "default_radius_axis")]
        radius_y: f64,
        #[serde(default = "default_radius_axis")]
        radius_z: f64,
        #[serde(default = "default_vertical_slices")]
        vertical_slices: u32,
        #[serde(default = "default_horizontal_slices")]
        horizontal_slices: u32,
    },
    Cone {
        #[serde(default = "default_radius")]
        radius: f64,
        #[serde(default = "default_height")]
        height: f64,
        #[serde(default = "default_slices")]
        slices: u32,
    },
    Cylinder {
        #[serde(default = "default_radius")]
        radius: f64,
        #[serde(default = "default_height")]
        height: f64,
        #[serde(default = "default_slices")]
        slices: u32,
    },
    Arrow {
        #[serde(default = "default_shaft_radius")]
        shaft_radius: f64,
        #[serde(default = "default_shaft_length")]
        shaft_length: f64,
        #[serde(default = "default_radius_axis")]
        tip_radius: f64,
        #[serde(default = "default_height")]
        tip_length: f64,
        #[serde(default = "default_slices")]
        slices: u32,
    },
}

fn default_radius_axis() -> f64 {
    10.0
}
fn default_vertical_slices() -> u32 {
    24
}
fn default_horizontal_slices() -> u32 {
    16
}
fn default_radius() -> f64 {
    8.0
}
fn default_height() -> f64 {
    20.0
}
fn default_slices() -> u32 {
    48
}
fn default_shaft_radius() -> f64 {
    5.0
}
fn default_shaft_length() -> f64 {
    40.0
}

impl MeshShape {
    /// Triangulates this shape into fresh buffers.
    pub fn build(&self) -> TriangleMesh {
        match *self {
            MeshShape::Ellipsoid {
                radius_x,
                radius_y,
                radius_z,
                vertical_slices,
                horizontal_slices,
            } => build::ellipsoid(
                radius_x,
                radius_y,
                radius_z,
                vertical_slices,
                horizontal_slices,
            ),
            MeshShape::Dome {
                radius_x,
                radius_y,
                radius_z,
                vertical_slices,
                horizontal_slices,
            } => build::dome(
                radius_x,
                radius_y,
                radius_z,
                vertical_slices,
                horizontal_slices,
            ),
            MeshShape::Cone {
                radius,
                height,
                slices,
            } => build::cone(radius, height, slices),
            MeshShape::Cylinder {
                radius,
                height,
                slices,
            } => build::cylinder(radius, height, slices),
            MeshShape::Arrow {
                shaft_radius,
                shaft_length,
                tip_radius,
                tip_length,
                slices,
            } => build::arrow(shaft_radius, shaft_length, tip_radius, tip_length, slices),
        }
    }

    /// Stable content digest over the shape tag and its parameters.
    ///
    /// Equal shapes always digest equally; this is the rebuild-cache key, so
    /// a compiled mesh is reused exactly when the declarative geometry is
    /// unchanged.
    pub fn digest(&self) -> MeshDigest {
        // Field order in the serialized form is declaration order, which is
        // stable for a given crate version.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        MeshDigest(*blake3::hash(&bytes).as_bytes())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshDigest(pub [u8; 32]);

impl std::fmt::Display for MeshDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Scalar-or-per-axis scale, normalized to three axes before drawing.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeshScale {
    Uniform(f64),
    PerAxis {
        #[serde(default = "default_scale_axis")]
        x: f64,
        #[serde(default = "default_scale_axis")]
        y: f64,
        #[serde(default = "default_scale_axis")]
        z: f64,
    },
}

fn default_scale_axis() -> f64 {
    1.0
}

impl MeshScale {
    pub fn to_axes(self) -> [f64; 3] {
        match self {
            MeshScale::Uniform(s) => [s, s, s],
            MeshScale::PerAxis { x, y, z } => [x, y, z],
        }
    }
}

impl Default for MeshScale {
    fn default() -> Self {
        MeshScale::Uniform(1.0)
    }
}

/// Per-axis angles (degrees) or offsets (meters).
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Axis3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Shape plus placement/appearance parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSpec {
    #[serde(flatten)]
    pub shape: MeshShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default)]
    pub scale: MeshScale,
    #[serde(default)]
    pub rotation: Axis3,
    #[serde(default)]
    pub translation: Axis3,
    #[serde(default = "default_light_intensity")]
    pub light_intensity: f64,
    #[serde(default)]
    pub transparency: bool,
}

fn default_light_intensity() -> f64 {
    1.0
}

impl MeshSpec {
    pub fn new(shape: MeshShape) -> Self {
        Self {
            shape,
            color: None,
            scale: MeshScale::default(),
            rotation: Axis3::default(),
            translation: Axis3::default(),
            light_intensity: 1.0,
            transparency: false,
        }
    }

    /// Wraps an already-compiled mesh with this spec's render parameters.
    pub fn icon_with_mesh(&self, mesh: Arc<TriangleMesh>) -> MeshIcon {
        MeshIcon {
            mesh,
            digest: self.shape.digest(),
            color: self.color,
            scale: self.scale.to_axes(),
            rotation: self.rotation,
            translation: self.translation,
            light_intensity: self.light_intensity,
            transparency: self.transparency,
        }
    }
}

/// Renderable unit: compiled mesh plus placement/appearance parameters,
/// consumable by the engine's mesh-icon draw primitive.
#[derive(Debug, Clone)]
pub struct MeshIcon {
    pub mesh: Arc<TriangleMesh>,
    pub digest: MeshDigest,
    pub color: Option<Rgba>,
    pub scale: [f64; 3],
    pub rotation: Axis3,
    pub translation: Axis3,
    pub light_intensity: f64,
    pub transparency: bool,
}

/// Compiles the spec's shape and wraps it. Each call triangulates anew;
/// callers wanting reuse go through a digest-keyed cache instead.
pub fn build_icon(spec: &MeshSpec) -> MeshIcon {
    spec.icon_with_mesh(Arc::new(spec.shape.build()))
}
