use std::sync::Arc;

use engine::sprite::Sprite;
use foundation::color::Rgba;
use mesh::MeshSpec;
use serde::{Deserialize, Serialize};

/// What a drawable collection holds; drives painter dispatch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Point,
    Polyline,
    Polygon,
}

/// Declarative, partial style record.
///
/// Every field is optional; a layer's defaults and a feature's override are
/// both expressed as this type, and resolution merges them field by field
/// with the override winning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<PointStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<PolygonStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelStyle>,
    /// Layer-wide opacity multiplier folded into sub-style alpha at paint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl StyleDefinition {
    /// Merges `patch` over `self`: present patch fields win, missing fields
    /// fall through to the base.
    pub fn merged_with(&self, patch: &StyleDefinition) -> StyleDefinition {
        StyleDefinition {
            point: merge_point(self.point.as_ref(), patch.point.as_ref()),
            line: merge_option(self.line.as_ref(), patch.line.as_ref(), LineStyle::merged),
            polygon: merge_option(
                self.polygon.as_ref(),
                patch.polygon.as_ref(),
                PolygonStyle::merged,
            ),
            label: merge_option(self.label.as_ref(), patch.label.as_ref(), LabelStyle::merged),
            opacity: patch.opacity.or(self.opacity),
        }
    }
}

fn merge_option<T: Clone>(
    base: Option<&T>,
    patch: Option<&T>,
    merge: impl Fn(&T, &T) -> T,
) -> Option<T> {
    match (base, patch) {
        (Some(b), Some(p)) => Some(merge(b, p)),
        (None, Some(p)) => Some(p.clone()),
        (Some(b), None) => Some(b.clone()),
        (None, None) => None,
    }
}

fn merge_point(base: Option<&PointStyle>, patch: Option<&PointStyle>) -> Option<PointStyle> {
    match (base, patch) {
        // Same symbol kind: merge field by field. A mesh spec is a pure
        // value and is replaced, never merged.
        (Some(PointStyle::Circle(b)), Some(PointStyle::Circle(p))) => {
            Some(PointStyle::Circle(b.merged(p)))
        }
        (Some(PointStyle::Icon(b)), Some(PointStyle::Icon(p))) => {
            Some(PointStyle::Icon(b.merged(p)))
        }
        (_, Some(p)) => Some(p.clone()),
        (Some(b), None) => Some(b.clone()),
        (None, None) => None,
    }
}

/// Point symbol as a tagged variant; the paint pipeline switches on the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "symbol", rename_all = "snake_case")]
pub enum PointStyle {
    Circle(CircleStyle),
    Icon(IconStyle),
    Mesh(MeshPointStyle),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircleStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_width: Option<f64>,
}

impl CircleStyle {
    fn merged(&self, patch: &CircleStyle) -> CircleStyle {
        CircleStyle {
            size: patch.size.or(self.size),
            fill: patch.fill.or(self.fill),
            outline: patch.outline.or(self.outline),
            outline_width: patch.outline_width.or(self.outline_width),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconStyle {
    /// Raster image supplied by the host; not part of the serialized form.
    #[serde(skip)]
    pub sprite: Option<Arc<Sprite>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Anchor as fractions of the icon size; (0.5, 0.5) is centered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<[f32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl IconStyle {
    fn merged(&self, patch: &IconStyle) -> IconStyle {
        IconStyle {
            sprite: patch.sprite.clone().or_else(|| self.sprite.clone()),
            width: patch.width.or(self.width),
            height: patch.height.or(self.height),
            anchor: patch.anchor.or(self.anchor),
            rotation_deg: patch.rotation_deg.or(self.rotation_deg),
            opacity: patch.opacity.or(self.opacity),
        }
    }
}

/// Declarative mesh symbol: the spec alone; compiled geometry lives in the
/// digest-keyed paint cache, never on the style record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshPointStyle {
    #[serde(flatten)]
    pub spec: MeshSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
}

impl LineStyle {
    fn merged(&self, patch: &LineStyle) -> LineStyle {
        LineStyle {
            width: patch.width.or(self.width),
            color: patch.color.or(self.color),
            dash: patch.dash.clone().or_else(|| self.dash.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_width: Option<f64>,
}

impl PolygonStyle {
    fn merged(&self, patch: &PolygonStyle) -> PolygonStyle {
        PolygonStyle {
            fill: patch.fill.or(self.fill),
            outline: patch.outline.or(self.outline),
            outline_width: patch.outline_width.or(self.outline_width),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    /// Attribute key whose value is shown as the label text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl LabelStyle {
    fn merged(&self, patch: &LabelStyle) -> LabelStyle {
        LabelStyle {
            field: patch.field.clone().or_else(|| self.field.clone()),
            color: patch.color.or(self.color),
            visible: patch.visible.or(self.visible),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CircleStyle, LineStyle, PointStyle, StyleDefinition};
    use foundation::color::Rgba;
    use mesh::{MeshShape, MeshSpec};
    use pretty_assertions::assert_eq;

    fn circle(size: Option<f64>, fill: Option<Rgba>) -> PointStyle {
        PointStyle::Circle(CircleStyle {
            size,
            fill,
            ..Default::default()
        })
    }

    #[test]
    fn override_wins_and_missing_fields_fall_through() {
        let base = StyleDefinition {
            point: Some(circle(Some(10.0), Some(Rgba::parse("#ff0000").unwrap()))),
            ..Default::default()
        };
        let patch = StyleDefinition {
            point: Some(circle(None, Some(Rgba::parse("#0000ff").unwrap()))),
            ..Default::default()
        };

        let merged = base.merged_with(&patch);
        let PointStyle::Circle(c) = merged.point.unwrap() else {
            panic!("expected circle");
        };
        assert_eq!(c.size, Some(10.0));
        assert_eq!(c.fill, Some(Rgba::parse("#0000ff").unwrap()));
    }

    #[test]
    fn symbol_kind_change_replaces_the_point_style() {
        let base = StyleDefinition {
            point: Some(circle(Some(10.0), None)),
            ..Default::default()
        };
        let patch = StyleDefinition {
            point: Some(PointStyle::Mesh(super::MeshPointStyle {
                spec: MeshSpec::new(MeshShape::Cone {
                    radius: 8.0,
                    height: 20.0,
                    slices: 48,
                }),
            })),
            ..Default::default()
        };

        let merged = base.merged_with(&patch);
        assert!(matches!(merged.point, Some(PointStyle::Mesh(_))));
    }

    #[test]
    fn opacity_patches_over_base() {
        let base = StyleDefinition {
            opacity: Some(0.8),
            ..Default::default()
        };
        let patch = StyleDefinition::default();
        assert_eq!(base.merged_with(&patch).opacity, Some(0.8));

        let patch = StyleDefinition {
            opacity: Some(0.25),
            ..Default::default()
        };
        assert_eq!(base.merged_with(&patch).opacity, Some(0.25));
    }

    #[test]
    fn line_merge_keeps_base_dash() {
        let base = StyleDefinition {
            line: Some(LineStyle {
                width: Some(2.0),
                color: None,
                dash: Some(vec![4.0, 2.0]),
            }),
            ..Default::default()
        };
        let patch = StyleDefinition {
            line: Some(LineStyle {
                width: Some(5.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = base.merged_with(&patch);
        let line = merged.line.unwrap();
        assert_eq!(line.width, Some(5.0));
        assert_eq!(line.dash, Some(vec![4.0, 2.0]));
    }

    #[test]
    fn style_survives_json_round_trip() {
        let style = StyleDefinition {
            point: Some(circle(Some(12.0), Some(Rgba::parse("#22c55e").unwrap()))),
            opacity: Some(0.5),
            ..Default::default()
        };
        let json = serde_json::to_string(&style).unwrap();
        let back: StyleDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, style);
    }
}
