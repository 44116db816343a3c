//! Error types for the pdf-rotulos library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pdf-rotulos library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding/decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The document could not be rasterized into page images
    #[error("Cannot read document {}: {reason}", .path.display())]
    UnreadableDocument { path: PathBuf, reason: String },

    /// Malformed schedule start time
    #[error("Invalid time format: {0:?} (expected HH:MM)")]
    InvalidTimeFormat(String),

    /// Stamping was requested but no coupon carries a time label
    #[error("No coupons carry a time label; apply a schedule first")]
    NothingToStamp,

    /// Annotation or save failure while producing the output document
    #[error("Stamping failed: {0}")]
    Stamping(String),

    /// Malformed calibration override expression
    #[error("Invalid override: {0}")]
    InvalidOverride(String),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// General error
    #[error("{0}")]
    General(String),
}
