use engine::shape::Shape;
use foundation::ids::IdAllocator;
use symbology::style::StyleDefinition;

use crate::VizError;
use crate::collection::{Attributes, Feature, FeatureId};
use crate::registry::LayerEntry;

/// Allocates an id and inserts a feature carrying `{attrs, style}` into the
/// entry's collection. The single write path for every `add_*` operation.
pub(crate) fn insert_feature(
    entry: &mut LayerEntry,
    ids: &mut IdAllocator,
    shape: Shape,
    attrs: Attributes,
    style: Option<StyleDefinition>,
) -> FeatureId {
    let id = FeatureId(ids.next());
    let mut feature = Feature::new(id, shape);
    feature.attrs = attrs;
    feature.style = style;

    if entry.debug.store_logs_enabled() {
        log::debug!("[store:{}] add {id}", entry.label);
    }
    entry.collection.add(feature);
    id
}

/// Copy-on-write attribute merge; geometry is preserved verbatim.
pub(crate) fn update_attributes(
    entry: &mut LayerEntry,
    feature: FeatureId,
    attrs: &Attributes,
) -> Result<(), VizError> {
    let existing = entry
        .collection
        .get(feature)
        .ok_or(VizError::FeatureNotFound {
            layer: entry.id,
            feature,
        })?;
    let next = existing.with_merged_attrs(attrs);

    if entry.debug.store_logs_enabled() {
        log::debug!("[store:{}] update attrs {feature}", entry.label);
    }
    entry.collection.put(next);
    Ok(())
}

/// Copy-on-write style patch: the existing override (if any) merged with the
/// patch becomes the feature's new override.
pub(crate) fn update_feature_style(
    entry: &mut LayerEntry,
    feature: FeatureId,
    patch: &StyleDefinition,
) -> Result<(), VizError> {
    let existing = entry
        .collection
        .get(feature)
        .ok_or(VizError::FeatureNotFound {
            layer: entry.id,
            feature,
        })?;
    let merged = match existing.style.as_ref() {
        Some(current) => current.merged_with(patch),
        None => patch.clone(),
    };
    let next = existing.with_style(Some(merged));

    if entry.debug.store_logs_enabled() {
        log::debug!("[store:{}] update style {feature}", entry.label);
    }
    entry.collection.put(next);
    Ok(())
}

/// Best-effort per-id removal; missing ids are silently skipped.
pub(crate) fn delete_features(entry: &mut LayerEntry, ids: &[FeatureId]) {
    for id in ids {
        let removed = entry.collection.remove(*id);
        if removed && entry.debug.store_logs_enabled() {
            log::debug!("[store:{}] remove {id}", entry.label);
        }
    }
}
