pub mod ecef;
pub mod geodesy;
pub mod mercator;
pub mod vec;

pub use ecef::*;
pub use geodesy::*;
pub use mercator::*;
pub use vec::*;
