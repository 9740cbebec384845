use serde::{Deserialize, Serialize};
use symbology::painter::DebugConfig;

/// Which geographic source frame incoming lon/lat coordinates are read in.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Pick empirically per target frame by round-trip probing.
    #[default]
    Auto,
    /// Force the lon-lat-ordered candidate (CRS:84).
    LonLat,
    /// Force the lat-lon-ordered candidate (EPSG:4326).
    LatLon,
}

/// Process-wide configuration, set once at startup.
///
/// Changing it later is supported for completeness (the resolver drops its
/// transform cache) but is not meant to be toggled per call.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VizConfig {
    #[serde(default)]
    pub source_mode: SourceMode,
    #[serde(default)]
    pub normalize_wrap_around: bool,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl VizConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
