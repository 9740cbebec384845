use std::collections::BTreeMap;

use engine::canvas::{FillStyle, ShapeDraw, StrokeStyle};
use foundation::color::Rgba;
use serde::{Deserialize, Serialize};

/// Live-telemetry feature kinds this registry styles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Aircraft,
    Trail,
}

/// Complete style for the moving-point marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub size: f64,
    pub fill: Rgba,
    pub outline: Rgba,
    pub outline_width: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            size: 12.0,
            fill: Rgba::from_rgba8(0x22, 0xc5, 0x5e, 255),
            outline: Rgba::from_rgba8(0x0f, 0x17, 0x2a, 255),
            outline_width: 2.0,
        }
    }
}

/// Complete style for the trail line behind an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailStyle {
    pub color: Rgba,
    pub width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
}

impl Default for TrailStyle {
    fn default() -> Self {
        Self {
            color: Rgba::from_rgba8(0x38, 0xbd, 0xf8, 230),
            width: 2.0,
            dash: None,
        }
    }
}

/// Which optional fields the aircraft label shows, in fixed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftLabelConfig {
    pub show_name: bool,
    pub show_altitude: bool,
    pub show_speed: bool,
    pub show_heading: bool,
    pub priority: f64,
}

impl Default for AircraftLabelConfig {
    fn default() -> Self {
        Self {
            show_name: true,
            show_altitude: true,
            show_speed: false,
            show_heading: false,
            priority: -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailLabelConfig {
    pub show_name: bool,
    pub show_point_count: bool,
    pub priority: f64,
}

impl Default for TrailLabelConfig {
    fn default() -> Self {
        Self {
            show_name: true,
            show_point_count: false,
            priority: 0.0,
        }
    }
}

/// Partial marker override: present fields win over the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_width: Option<f64>,
}

impl MarkerOverride {
    fn merged(&self, patch: &MarkerOverride) -> MarkerOverride {
        MarkerOverride {
            size: patch.size.or(self.size),
            fill: patch.fill.or(self.fill),
            outline: patch.outline.or(self.outline),
            outline_width: patch.outline_width.or(self.outline_width),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrailOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
}

impl TrailOverride {
    fn merged(&self, patch: &TrailOverride) -> TrailOverride {
        TrailOverride {
            color: patch.color.or(self.color),
            width: patch.width.or(self.width),
            dash: patch.dash.clone().or_else(|| self.dash.clone()),
        }
    }
}

/// Per-entity override: independent marker and trail fragments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackOverride {
    #[serde(default)]
    pub point: MarkerOverride,
    #[serde(default)]
    pub line: TrailOverride,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackDefaults {
    #[serde(default)]
    pub aircraft_point: MarkerStyle,
    #[serde(default)]
    pub trail_line: TrailStyle,
    #[serde(default)]
    pub aircraft_label: AircraftLabelConfig,
    #[serde(default)]
    pub trail_label: TrailLabelConfig,
}

/// Serializable snapshot of the whole registry; survives scenario save/load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackStyleSnapshot {
    #[serde(default)]
    pub defaults: TrackDefaults,
    #[serde(default)]
    pub overrides: BTreeMap<String, TrackOverride>,
}

/// Values pulled off a live entity when composing its label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSample {
    pub name: Option<String>,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub point_count: Option<u32>,
}

/// Composed label text plus draw priority (lower draws on top).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLabel {
    pub text: Option<String>,
    pub priority: f64,
}

/// Resolved body + label for one paint of a telemetry feature.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPaint {
    pub body: ShapeDraw,
    pub label: TrackLabel,
}

/// Style registry for live entities, keyed by external entity id.
///
/// Overrides survive re-renders of the same entity and are only ever removed
/// explicitly; callers owning entity lifecycles clear overrides when an
/// entity is permanently gone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackStyleRegistry {
    defaults: TrackDefaults,
    overrides: BTreeMap<String, TrackOverride>,
}

impl TrackStyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every override and restores built-in defaults.
    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    pub fn defaults(&self) -> &TrackDefaults {
        &self.defaults
    }

    pub fn set_defaults(&mut self, defaults: TrackDefaults) {
        self.defaults = defaults;
    }

    pub fn override_for(&self, entity_id: &str) -> Option<&TrackOverride> {
        self.overrides.get(entity_id)
    }

    /// Deep-merges `patch` into the entity's existing override.
    pub fn set_aircraft_override(&mut self, entity_id: impl Into<String>, patch: TrackOverride) {
        let entry = self.overrides.entry(entity_id.into()).or_default();
        entry.point = entry.point.merged(&patch.point);
        entry.line = entry.line.merged(&patch.line);
    }

    pub fn clear_aircraft_override(&mut self, entity_id: &str) -> bool {
        self.overrides.remove(entity_id).is_some()
    }

    pub fn snapshot(&self) -> TrackStyleSnapshot {
        TrackStyleSnapshot {
            defaults: self.defaults.clone(),
            overrides: self.overrides.clone(),
        }
    }

    pub fn import_snapshot(&mut self, snapshot: TrackStyleSnapshot) {
        self.defaults = snapshot.defaults;
        self.overrides = snapshot.overrides;
    }

    /// Default → override merge, then selection emphasis (+1 outline width).
    pub fn resolve_aircraft_point(&self, entity_id: &str, selected: bool) -> MarkerStyle {
        let base = &self.defaults.aircraft_point;
        let ov = self.overrides.get(entity_id).map(|o| &o.point);
        let mut style = MarkerStyle {
            size: ov.and_then(|o| o.size).unwrap_or(base.size),
            fill: ov.and_then(|o| o.fill).unwrap_or(base.fill),
            outline: ov.and_then(|o| o.outline).unwrap_or(base.outline),
            outline_width: ov.and_then(|o| o.outline_width).unwrap_or(base.outline_width),
        };
        if selected {
            style.outline_width += 1.0;
        }
        style
    }

    /// Default → override merge, then selection emphasis (+1 line width).
    pub fn resolve_trail_line(&self, entity_id: &str, selected: bool) -> TrailStyle {
        let base = &self.defaults.trail_line;
        let ov = self.overrides.get(entity_id).map(|o| &o.line);
        let mut style = TrailStyle {
            color: ov.and_then(|o| o.color).unwrap_or(base.color),
            width: ov.and_then(|o| o.width).unwrap_or(base.width),
            dash: ov
                .and_then(|o| o.dash.clone())
                .or_else(|| base.dash.clone()),
        };
        if selected {
            style.width += 1.0;
        }
        style
    }

    /// Table-driven label composition: each enabled field with a present
    /// value contributes one part, in fixed order, joined by " | ".
    pub fn aircraft_label(&self, sample: &TrackSample, selected: bool) -> TrackLabel {
        let cfg = &self.defaults.aircraft_label;
        let mut parts: Vec<String> = Vec::new();

        if cfg.show_name {
            parts.push(sample.name.clone().unwrap_or_else(|| "Aircraft".into()));
        }
        if cfg.show_altitude && let Some(alt) = sample.altitude_m {
            parts.push(format!("{} m", alt.round()));
        }
        if cfg.show_speed && let Some(speed) = sample.speed_mps {
            parts.push(format!("{} m/s", speed.round()));
        }
        if cfg.show_heading && let Some(heading) = sample.heading_deg {
            parts.push(format!("{}\u{b0}", heading.round()));
        }

        compose_label(parts, cfg.priority, selected)
    }

    pub fn trail_label(&self, sample: &TrackSample, selected: bool) -> TrackLabel {
        let cfg = &self.defaults.trail_label;
        let mut parts: Vec<String> = Vec::new();

        if cfg.show_name {
            parts.push(sample.name.clone().unwrap_or_else(|| "Trail".into()));
        }
        if cfg.show_point_count && let Some(count) = sample.point_count {
            parts.push(format!("{count} pts"));
        }

        compose_label(parts, cfg.priority, selected)
    }

    /// Full paint resolution for one feature: body draw style plus label.
    pub fn style_for(
        &self,
        kind: TrackKind,
        entity_id: &str,
        sample: &TrackSample,
        selected: bool,
    ) -> TrackPaint {
        match kind {
            TrackKind::Aircraft => {
                let st = self.resolve_aircraft_point(entity_id, selected);
                TrackPaint {
                    body: ShapeDraw {
                        stroke: Some(StrokeStyle {
                            color: st.outline,
                            width: st.outline_width,
                            dash: None,
                        }),
                        fill: Some(FillStyle { color: st.fill }),
                        drape: engine::canvas::DrapeTarget::NotDraped,
                    },
                    label: self.aircraft_label(sample, selected),
                }
            }
            TrackKind::Trail => {
                let st = self.resolve_trail_line(entity_id, selected);
                TrackPaint {
                    body: ShapeDraw {
                        stroke: Some(StrokeStyle {
                            color: st.color,
                            width: st.width,
                            dash: st.dash,
                        }),
                        fill: None,
                        drape: engine::canvas::DrapeTarget::NotDraped,
                    },
                    label: self.trail_label(sample, selected),
                }
            }
        }
    }
}

fn compose_label(parts: Vec<String>, priority: f64, selected: bool) -> TrackLabel {
    let text = if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    };
    // Selected entities force draw-on-top semantics.
    let priority = if selected { f64::NEG_INFINITY } else { priority };
    TrackLabel { text, priority }
}

#[cfg(test)]
mod tests {
    use super::{
        AircraftLabelConfig, MarkerOverride, TrackDefaults, TrackOverride, TrackSample,
        TrackStyleRegistry, TrailOverride,
    };
    use foundation::color::Rgba;
    use pretty_assertions::assert_eq;

    fn sample() -> TrackSample {
        TrackSample {
            name: Some("A1".into()),
            altitude_m: Some(10_000.4),
            speed_mps: Some(250.0),
            heading_deg: Some(90.0),
            point_count: Some(14),
        }
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let reg = TrackStyleRegistry::new();
        let st = reg.resolve_aircraft_point("a-1", false);
        assert_eq!(st.size, 12.0);
        assert_eq!(st.outline_width, 2.0);
    }

    #[test]
    fn override_fields_win_and_merge_deeply() {
        let mut reg = TrackStyleRegistry::new();
        reg.set_aircraft_override("a-1", TrackOverride {
            point: MarkerOverride {
                fill: Some(Rgba::parse("#ff0000").unwrap()),
                ..Default::default()
            },
            ..Default::default()
        });
        // A later patch on a different field keeps the earlier one.
        reg.set_aircraft_override("a-1", TrackOverride {
            point: MarkerOverride {
                size: Some(16.0),
                ..Default::default()
            },
            ..Default::default()
        });

        let st = reg.resolve_aircraft_point("a-1", false);
        assert_eq!(st.size, 16.0);
        assert_eq!(st.fill.to_rgba8(), [255, 0, 0, 255]);
        // Untouched entities keep defaults.
        let other = reg.resolve_aircraft_point("a-2", false);
        assert_eq!(other.size, 12.0);
    }

    #[test]
    fn selection_emphasis_adds_one() {
        let reg = TrackStyleRegistry::new();
        assert_eq!(reg.resolve_aircraft_point("x", true).outline_width, 3.0);
        assert_eq!(reg.resolve_trail_line("x", true).width, 3.0);
    }

    #[test]
    fn clear_restores_defaults_for_that_entity_only() {
        let mut reg = TrackStyleRegistry::new();
        reg.set_aircraft_override("a-1", TrackOverride {
            line: TrailOverride {
                width: Some(9.0),
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(reg.clear_aircraft_override("a-1"));
        assert!(!reg.clear_aircraft_override("a-1"));
        assert_eq!(reg.resolve_trail_line("a-1", false).width, 2.0);
    }

    #[test]
    fn aircraft_label_respects_show_flags_and_order() {
        let mut reg = TrackStyleRegistry::new();
        let label = reg.aircraft_label(&sample(), false);
        assert_eq!(label.text.as_deref(), Some("A1 | 10000 m"));

        reg.set_defaults(TrackDefaults {
            aircraft_label: AircraftLabelConfig {
                show_speed: true,
                show_heading: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let label = reg.aircraft_label(&sample(), false);
        assert_eq!(label.text.as_deref(), Some("A1 | 10000 m | 250 m/s | 90\u{b0}"));
    }

    #[test]
    fn missing_values_are_skipped_not_rendered_empty() {
        let reg = TrackStyleRegistry::new();
        let label = reg.aircraft_label(
            &TrackSample {
                name: None,
                ..Default::default()
            },
            false,
        );
        assert_eq!(label.text.as_deref(), Some("Aircraft"));
    }

    #[test]
    fn selected_labels_take_extreme_priority() {
        let reg = TrackStyleRegistry::new();
        let normal = reg.aircraft_label(&sample(), false);
        let selected = reg.aircraft_label(&sample(), true);
        assert_eq!(normal.priority, -1.0);
        assert_eq!(selected.priority, f64::NEG_INFINITY);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut reg = TrackStyleRegistry::new();
        reg.set_aircraft_override("a-7", TrackOverride {
            point: MarkerOverride {
                fill: Some(Rgba::parse("#123456").unwrap()),
                ..Default::default()
            },
            ..Default::default()
        });

        let json = serde_json::to_string(&reg.snapshot()).unwrap();
        let snapshot = serde_json::from_str(&json).unwrap();

        let mut restored = TrackStyleRegistry::new();
        restored.import_snapshot(snapshot);
        assert_eq!(restored, reg);
    }

    #[test]
    fn reset_all_clears_overrides_and_defaults() {
        let mut reg = TrackStyleRegistry::new();
        reg.set_aircraft_override("a-1", TrackOverride::default());
        reg.reset_all();
        assert!(reg.override_for("a-1").is_none());
        assert_eq!(reg, TrackStyleRegistry::new());
    }
}
