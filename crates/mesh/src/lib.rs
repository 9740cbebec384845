pub mod build;
pub mod icon;

pub use build::*;
pub use icon::*;
