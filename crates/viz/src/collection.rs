use std::collections::BTreeMap;

use engine::reference::CoordinateReference;
use engine::shape::Shape;
use symbology::style::StyleDefinition;

/// Feature id, unique within the owning collection (monotonic, process-wide,
/// never reused across a session).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub u64);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f-{}", self.0)
    }
}

/// Free-form attribute bag attached to a feature.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// One drawable record: geometry already in the layer's reference, an
/// attribute bag, and an optional style override.
///
/// Geometry is never mutated in place; any change replaces the feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub shape: Shape,
    pub attrs: Attributes,
    pub style: Option<StyleDefinition>,
}

impl Feature {
    pub fn new(id: FeatureId, shape: Shape) -> Self {
        Self {
            id,
            shape,
            attrs: Attributes::new(),
            style: None,
        }
    }

    /// Copy with `attrs` merged over the existing bag; geometry preserved
    /// verbatim.
    pub fn with_merged_attrs(&self, attrs: &Attributes) -> Feature {
        let mut next = self.clone();
        for (k, v) in attrs {
            next.attrs.insert(k.clone(), v.clone());
        }
        next
    }

    /// Copy with the style override replaced.
    pub fn with_style(&self, style: Option<StyleDefinition>) -> Feature {
        let mut next = self.clone();
        next.style = style;
        next
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

/// Append-only audit record of collection mutations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub feature: FeatureId,
}

/// In-memory drawable collection bound to one reference frame.
///
/// Iteration order is ascending feature id, which for monotonic ids is
/// insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    reference: CoordinateReference,
    features: BTreeMap<FeatureId, Feature>,
    events: Vec<ChangeEvent>,
}

impl FeatureCollection {
    pub fn new(reference: CoordinateReference) -> Self {
        Self {
            reference,
            features: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn reference(&self) -> &CoordinateReference {
        &self.reference
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.features.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    pub fn add(&mut self, feature: Feature) {
        let id = feature.id;
        self.features.insert(id, feature);
        self.events.push(ChangeEvent {
            kind: ChangeKind::Added,
            feature: id,
        });
    }

    /// Replaces an existing feature (copy-on-write update).
    ///
    /// Returns false and records nothing when the id is unknown.
    pub fn put(&mut self, feature: Feature) -> bool {
        let id = feature.id;
        if !self.features.contains_key(&id) {
            return false;
        }
        self.features.insert(id, feature);
        self.events.push(ChangeEvent {
            kind: ChangeKind::Updated,
            feature: id,
        });
        true
    }

    /// Removes by id; unknown ids are a silent no-op (idempotent deletion).
    pub fn remove(&mut self, id: FeatureId) -> bool {
        if self.features.remove(&id).is_none() {
            return false;
        }
        self.events.push(ChangeEvent {
            kind: ChangeKind::Removed,
            feature: id,
        });
        true
    }

    /// Hands the accumulated change log to the host and clears it.
    pub fn drain_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[ChangeEvent] {
        &self.events
    }
}
