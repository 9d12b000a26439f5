//! Error types for slide content extraction and classification dispatch.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during extraction, rule loading, or dispatch.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read a file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The requested slide range is not a valid 1-based inclusive range.
    #[error("Invalid slide range: {0}")]
    InvalidRange(String),

    /// The document source cannot yield a slide at the requested number.
    #[error("Slide {number} is out of range (presentation has {slide_count} slides)")]
    SlideOutOfRange { number: usize, slide_count: usize },

    /// The parts catalog exists but cannot be deserialized.
    ///
    /// Distinct from an absent catalog, which degrades to an empty match
    /// list.
    #[error("Malformed parts catalog {}: {message}", .path.display())]
    MalformedCatalog { path: PathBuf, message: String },

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParse(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// Failed to serialize a payload for the generation service.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The generation service call failed.
    #[error("Generation service error: {0}")]
    Generation(String),
}
