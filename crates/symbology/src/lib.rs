pub mod painter;
pub mod resolve;
pub mod style;
pub mod telemetry;

pub use painter::*;
pub use resolve::*;
pub use style::*;
pub use telemetry::*;
