//! Error kinds surfaced by the editor core

use thiserror::Error;

/// Errors produced by the compositor, render pipeline and collaborators.
///
/// Payloads are plain strings so the error can be cloned into every waiter of
/// a shared in-flight decode.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("Failed to decode image '{reference}': {reason}")]
    ImageDecodeFailure { reference: String, reason: String },

    #[error("Drawing surface unavailable: {0}")]
    CanvasContextUnavailable(String),

    #[error("Failed to encode export: {0}")]
    ExportEncodeFailure(String),

    #[error("Stored asset value '{0}' could not be resolved")]
    AssetResolutionAmbiguous(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Text recognition failed: {0}")]
    OcrFailure(String),

    #[error("Clipboard is not available: {0}")]
    ClipboardUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EditorError {
    pub fn decode(reference: impl Into<String>, reason: impl ToString) -> Self {
        EditorError::ImageDecodeFailure {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }

    /// Message suitable for an inline notice or toast
    pub fn user_message(&self) -> String {
        match self {
            EditorError::ImageDecodeFailure { reference, .. } => {
                format!("Could not load background image ({reference}), using white")
            }
            EditorError::CanvasContextUnavailable(_) => {
                "Preview could not be rendered, showing the last good preview".to_string()
            }
            EditorError::ExportEncodeFailure(_) => "Could not export the image".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        EditorError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
