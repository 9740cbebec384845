pub mod collection;
pub mod config;
pub mod facade;
pub mod registry;
pub mod resolver;
pub mod store;

pub use collection::*;
pub use config::*;
pub use facade::*;
pub use registry::*;
pub use resolver::*;

use collection::FeatureId;
use engine::transform::TransformError;
use registry::LayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VizError {
    LayerNotFound(LayerId),
    DuplicateLayerId(LayerId),
    FeatureNotFound { layer: LayerId, feature: FeatureId },
    NoActiveLayer,
    Transform(TransformError),
}

impl std::fmt::Display for VizError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VizError::LayerNotFound(id) => write!(f, "layer '{id}' not found"),
            VizError::DuplicateLayerId(id) => write!(f, "layer with id '{id}' already exists"),
            VizError::FeatureNotFound { layer, feature } => {
                write!(f, "feature '{feature}' not found in layer '{layer}'")
            }
            VizError::NoActiveLayer => write!(f, "no active layer"),
            VizError::Transform(err) => write!(f, "transform failed: {err}"),
        }
    }
}

impl std::error::Error for VizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VizError::Transform(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransformError> for VizError {
    fn from(err: TransformError) -> Self {
        VizError::Transform(err)
    }
}
