//! Pure domain types with minimal dependencies
//!
//! Types here know nothing about rendering pipelines, async runtimes or
//! persistence, so every other module can depend on them.

pub mod annotation;
pub mod color;
pub mod geometry;
pub mod selection;
pub mod settings;

pub use annotation::*;
pub use color::*;
pub use geometry::*;
pub use selection::*;
pub use settings::*;
