use std::sync::Arc;

use engine::sprite::Sprite;
use foundation::color::Rgba;
use mesh::MeshSpec;

use crate::style::{PointStyle, StyleDefinition};

// Fallback palette, matching the painter's historical defaults.
const SELECTED_ACCENT: Rgba = Rgba::new(0.0, 0.82, 1.0, 1.0);
const DEFAULT_LINE: Rgba = Rgba::new(0.098, 0.463, 0.824, 1.0);
const DEFAULT_POINT_FILL: Rgba = Rgba::new(1.0, 0.341, 0.133, 1.0);
const SELECTED_POINT_FILL: Rgba = Rgba::new(0.231, 0.831, 1.0, 1.0);
const DEFAULT_POLYGON_OUTLINE: Rgba = Rgba::new(0.149, 0.196, 0.22, 1.0);
const DEFAULT_POLYGON_FILL: Rgba = Rgba::new(1.0, 0.341, 0.133, 0.25);
const SELECTED_POLYGON_FILL: Rgba = Rgba::new(0.0, 0.82, 1.0, 0.25);

/// Fully-resolved point symbol, ready for the paint dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPointSymbol {
    Circle {
        size: f64,
        fill: Rgba,
        outline: Rgba,
        outline_width: f64,
    },
    Icon {
        sprite: Option<Arc<Sprite>>,
        width: f64,
        height: f64,
        anchor: [f32; 2],
        rotation_deg: f64,
        opacity: f64,
    },
    Mesh {
        spec: MeshSpec,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine {
    pub color: Rgba,
    pub width: f64,
    pub dash: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPolygon {
    pub fill: Rgba,
    pub outline: Rgba,
    pub outline_width: f64,
}

fn layer_alpha(style: &StyleDefinition) -> f64 {
    style.opacity.map(|o| o.clamp(0.0, 1.0)).unwrap_or(1.0)
}

/// Resolves the point sub-style, folding layer opacity into the fill and
/// applying the uniform selection emphasis (+1 outline width).
pub fn resolve_point(style: &StyleDefinition, selected: bool) -> ResolvedPointSymbol {
    let alpha = layer_alpha(style);
    let emphasis = if selected { 1.0 } else { 0.0 };

    match style.point.as_ref() {
        Some(PointStyle::Mesh(m)) => ResolvedPointSymbol::Mesh {
            spec: m.spec.clone(),
        },
        Some(PointStyle::Icon(icon)) => {
            let size_default = 20.0;
            ResolvedPointSymbol::Icon {
                sprite: icon.sprite.clone(),
                width: icon.width.unwrap_or(size_default),
                height: icon.height.unwrap_or(size_default),
                anchor: icon.anchor.unwrap_or([0.5, 0.5]),
                rotation_deg: icon.rotation_deg.unwrap_or(0.0),
                opacity: icon.opacity.unwrap_or(1.0).clamp(0.0, 1.0) * alpha,
            }
        }
        Some(PointStyle::Circle(c)) => resolve_circle(Some(c), selected, alpha, emphasis),
        None => resolve_circle(None, selected, alpha, emphasis),
    }
}

fn resolve_circle(
    circle: Option<&crate::style::CircleStyle>,
    selected: bool,
    alpha: f64,
    emphasis: f64,
) -> ResolvedPointSymbol {
    let fill = circle.and_then(|c| c.fill).unwrap_or(if selected {
        SELECTED_POINT_FILL
    } else {
        DEFAULT_POINT_FILL
    });
    let outline = circle.and_then(|c| c.outline).unwrap_or(if selected {
        SELECTED_ACCENT
    } else {
        Rgba::opaque(0.0, 0.0, 0.0)
    });
    ResolvedPointSymbol::Circle {
        size: circle.and_then(|c| c.size).unwrap_or(12.0),
        fill: fill.with_alpha_factor(alpha),
        outline,
        outline_width: circle.and_then(|c| c.outline_width).unwrap_or(1.0) + emphasis,
    }
}

/// Resolves the line sub-style, folding layer opacity into the stroke color
/// and widening selected lines by one pixel.
pub fn resolve_line(style: &StyleDefinition, selected: bool) -> ResolvedLine {
    let alpha = layer_alpha(style);
    let line = style.line.as_ref();
    let base_color = line
        .and_then(|l| l.color)
        .unwrap_or(if selected { SELECTED_ACCENT } else { DEFAULT_LINE });
    ResolvedLine {
        color: base_color.with_alpha_factor(alpha),
        width: line.and_then(|l| l.width).unwrap_or(2.0) + if selected { 1.0 } else { 0.0 },
        dash: line.and_then(|l| l.dash.clone()),
    }
}

/// Resolves the polygon sub-style; fill alpha is folded, the outline color is
/// left as declared.
pub fn resolve_polygon(style: &StyleDefinition, selected: bool) -> ResolvedPolygon {
    let alpha = layer_alpha(style);
    let pg = style.polygon.as_ref();
    let fill = pg.and_then(|p| p.fill).unwrap_or(if selected {
        SELECTED_POLYGON_FILL
    } else {
        DEFAULT_POLYGON_FILL
    });
    let outline = pg.and_then(|p| p.outline).unwrap_or(if selected {
        SELECTED_ACCENT
    } else {
        DEFAULT_POLYGON_OUTLINE
    });
    ResolvedPolygon {
        fill: fill.with_alpha_factor(alpha),
        outline,
        outline_width: pg.and_then(|p| p.outline_width).unwrap_or(1.0)
            + if selected { 1.0 } else { 0.0 },
    }
}
