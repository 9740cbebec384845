use foundation::math::Vec3;

/// Engine-native geometry, already expressed in a layer's reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Vec3),
    Polyline(Vec<Vec3>),
    Polygon { rings: Vec<Vec<Vec3>> },
    Extruded {
        base: Box<Shape>,
        min_height: f64,
        max_height: f64,
    },
}

impl Shape {
    /// Polygon with a single outer ring.
    pub fn polygon(outer: Vec<Vec3>) -> Self {
        Shape::Polygon { rings: vec![outer] }
    }

    pub fn extruded(base: Shape, min_height: f64, max_height: f64) -> Self {
        Shape::Extruded {
            base: Box::new(base),
            min_height,
            max_height,
        }
    }

    /// Anchor position for icon-style draws.
    pub fn anchor(&self) -> Option<Vec3> {
        match self {
            Shape::Point(p) => Some(*p),
            Shape::Polyline(pts) => pts.first().copied(),
            Shape::Polygon { rings } => rings.first().and_then(|r| r.first()).copied(),
            Shape::Extruded { base, .. } => base.anchor(),
        }
    }

    /// Whether any vertex carries a non-zero altitude component.
    ///
    /// Used to decide terrain draping: geometry that already sits above the
    /// surface must not be snapped back onto it.
    pub fn has_altitude(&self) -> bool {
        fn nonzero_z(p: &Vec3) -> bool {
            p.z.is_finite() && p.z != 0.0
        }
        match self {
            Shape::Point(p) => nonzero_z(p),
            Shape::Polyline(pts) => pts.iter().any(nonzero_z),
            Shape::Polygon { rings } => rings.iter().flatten().any(nonzero_z),
            Shape::Extruded {
                base,
                min_height,
                max_height,
            } => *min_height != 0.0 || *max_height != 0.0 || base.has_altitude(),
        }
    }
}
