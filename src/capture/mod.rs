//! Capture-side collaborators
//!
//! This module consolidates:
//! - Subject image loading from a capture reference (image.rs)
//! - OCR text recognition (ocr.rs)

pub mod image;
pub mod ocr;

pub use image::SubjectImage;
