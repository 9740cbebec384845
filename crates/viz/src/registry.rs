use std::collections::BTreeMap;

use engine::reference::CoordinateReference;
use engine::transform::{TransformError, TransformProvider};
use foundation::ids::IdAllocator;
use symbology::painter::{DebugConfig, Painter};
use symbology::style::{LayerKind, StyleDefinition};

use crate::VizError;
use crate::collection::FeatureCollection;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lyr-{}", self.0)
    }
}

/// Declarative layer setup, safe to re-issue on every scenario reload.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDefinition {
    /// Explicit id; collides loudly, unlike generated ids.
    pub id: Option<u64>,
    pub label: String,
    pub kind: LayerKind,
    /// Reference id; the map's current reference when absent.
    pub reference: Option<String>,
    pub style: Option<StyleDefinition>,
    pub visible: bool,
}

impl LayerDefinition {
    pub fn new(label: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: None,
            label: label.into(),
            kind,
            reference: None,
            style: None,
            visible: true,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_style(mut self, style: StyleDefinition) -> Self {
        self.style = Some(style);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// What a successful create/get-or-create hands back to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedLayer {
    pub id: LayerId,
    pub label: String,
    pub kind: LayerKind,
}

/// One registered drawable collection and everything needed to paint it.
#[derive(Debug, Clone)]
pub struct LayerEntry {
    pub id: LayerId,
    pub label: String,
    pub kind: LayerKind,
    pub visible: bool,
    pub style: StyleDefinition,
    pub debug: DebugConfig,
    pub collection: FeatureCollection,
    painter: Painter,
}

impl LayerEntry {
    pub fn reference(&self) -> &CoordinateReference {
        self.collection.reference()
    }

    pub fn painter(&self) -> &Painter {
        &self.painter
    }

    fn rebuild_painter(&mut self) {
        self.painter = Painter::new(self.kind, self.style.clone(), self.debug);
    }
}

/// Owns every layer entry; lifecycle is
/// `absent → created → (style-updated)* → removed`.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    entries: BTreeMap<LayerId, LayerEntry>,
    active: Option<LayerId>,
    ids: IdAllocator,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerEntry> {
        self.entries.values()
    }

    pub fn active(&self) -> Option<LayerId> {
        self.active
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> Result<(), VizError> {
        if !self.entries.contains_key(&id) {
            return Err(VizError::LayerNotFound(id));
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn get(&self, id: LayerId) -> Result<&LayerEntry, VizError> {
        self.entries.get(&id).ok_or(VizError::LayerNotFound(id))
    }

    pub fn get_mut(&mut self, id: LayerId) -> Result<&mut LayerEntry, VizError> {
        self.entries.get_mut(&id).ok_or(VizError::LayerNotFound(id))
    }

    /// Linear scan for the first entry matching label (and kind/reference
    /// when given). Layers number in the tens; this is not a hot path.
    pub fn find_by_label(
        &self,
        label: &str,
        kind: Option<LayerKind>,
        reference: Option<&str>,
    ) -> Option<&LayerEntry> {
        self.entries.values().find(|e| {
            e.label == label
                && kind.is_none_or(|k| e.kind == k)
                && reference.is_none_or(|r| e.reference().id == r)
        })
    }

    /// Creates a fresh layer bound to its reference and marks it active.
    pub fn create_layer(
        &mut self,
        def: LayerDefinition,
        map_reference: &CoordinateReference,
        provider: &dyn TransformProvider,
        debug: DebugConfig,
    ) -> Result<CreatedLayer, VizError> {
        let id = match def.id {
            Some(explicit) => {
                let id = LayerId(explicit);
                if self.entries.contains_key(&id) {
                    return Err(VizError::DuplicateLayerId(id));
                }
                id
            }
            None => {
                // Generated ids skip over explicitly taken ones.
                let mut id = LayerId(self.ids.next());
                while self.entries.contains_key(&id) {
                    id = LayerId(self.ids.next());
                }
                id
            }
        };

        let reference = match def.reference.as_deref() {
            Some(ref_id) => provider
                .reference(ref_id)
                .ok_or_else(|| TransformError::UnknownReference(ref_id.to_string()))?,
            None => map_reference.clone(),
        };

        let kind = def.kind;
        let style = def.style.unwrap_or_default();
        let entry = LayerEntry {
            id,
            label: def.label.clone(),
            kind,
            visible: def.visible,
            style: style.clone(),
            debug,
            collection: FeatureCollection::new(reference),
            painter: Painter::new(kind, style, debug),
        };
        self.entries.insert(id, entry);
        self.active = Some(id);

        Ok(CreatedLayer {
            id,
            label: def.label,
            kind,
        })
    }

    /// Reuses an existing layer matching (label, kind, reference) or creates
    /// one. A hit becomes the active layer and optionally refreshes its
    /// default style; it never duplicates the underlying collection.
    ///
    /// Returns the layer plus whether it was newly created.
    pub fn get_or_create_layer(
        &mut self,
        def: LayerDefinition,
        map_reference: &CoordinateReference,
        provider: &dyn TransformProvider,
        debug: DebugConfig,
    ) -> Result<(CreatedLayer, bool), VizError> {
        let existing = self
            .find_by_label(&def.label, Some(def.kind), def.reference.as_deref())
            .map(|e| (e.id, e.label.clone(), e.kind));

        if let Some((id, label, kind)) = existing {
            self.active = Some(id);
            if let Some(style) = def.style {
                self.update_layer_style(id, style)?;
            }
            return Ok((CreatedLayer { id, label, kind }, false));
        }

        let created = self.create_layer(def, map_reference, provider, debug)?;
        Ok((created, true))
    }

    pub fn set_visibility(&mut self, id: LayerId, visible: bool) -> Result<(), VizError> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    /// Folds a clamped opacity into the layer's default style.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f64) -> Result<(), VizError> {
        let entry = self.get_mut(id)?;
        entry.style.opacity = Some(opacity.clamp(0.0, 1.0));
        entry.rebuild_painter();
        Ok(())
    }

    /// Replaces the layer's default style and rebuilds its paint hook.
    /// Existing features are untouched; their resolved style recomputes
    /// lazily on the next paint.
    pub fn update_layer_style(&mut self, id: LayerId, style: StyleDefinition) -> Result<(), VizError> {
        let entry = self.get_mut(id)?;
        entry.style = style;
        entry.rebuild_painter();
        Ok(())
    }

    /// Forgets the entry entirely. Paint callbacks still in flight for a
    /// removed layer are a caller bug; the registry does not guard them.
    pub fn remove(&mut self, id: LayerId) -> Result<LayerEntry, VizError> {
        let entry = self
            .entries
            .remove(&id)
            .ok_or(VizError::LayerNotFound(id))?;
        if self.active == Some(id) {
            self.active = None;
        }
        Ok(entry)
    }
}
