/// Axis order of geographic coordinates as a reference expects them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AxisOrder {
    LonLat,
    LatLon,
}

/// Descriptor for a coordinate system geometry can be expressed in.
///
/// References are engine-managed and immutable; the facade only ever holds
/// and compares them by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateReference {
    pub id: String,
    pub axis_order: AxisOrder,
    /// Whether the reference carries a third (altitude) dimension.
    pub has_altitude: bool,
}

impl CoordinateReference {
    pub fn new(id: impl Into<String>, axis_order: AxisOrder, has_altitude: bool) -> Self {
        Self {
            id: id.into(),
            axis_order,
            has_altitude,
        }
    }
}

/// Geographic WGS84 with lon-lat axis order.
pub const CRS84: &str = "CRS:84";
/// Geographic WGS84 with lat-lon axis order.
pub const EPSG_4326: &str = "EPSG:4326";
/// Geographic WGS84 with an ellipsoidal height axis.
pub const EPSG_4979: &str = "EPSG:4979";
/// Earth-centered, Earth-fixed Cartesian.
pub const EPSG_4978: &str = "EPSG:4978";
/// Spherical Web Mercator.
pub const EPSG_3857: &str = "EPSG:3857";
