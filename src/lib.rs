//! Screenshot framing editor core
//!
//! Layers a captured screenshot over a configurable background, applies
//! background-only effects, shadows and rounds the screenshot, and overlays
//! editable vector annotations. Rendering runs as a debounced preview and as a
//! full-resolution export that share the same compositing primitives.

pub mod annotations;
pub mod assets;
pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod session;

pub use error::{EditorError, Result};
