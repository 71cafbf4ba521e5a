use thiserror::Error;

/// Errors produced while parsing a brush colour
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("Colour must start with '#': {0:?}")]
    MissingHash(String),

    #[error("Colour must have 3 or 6 hex digits, got {0}")]
    InvalidLength(usize),

    #[error("Invalid hex digit in colour: {0:?}")]
    InvalidDigit(String),
}

/// Errors that can occur while exporting the flattened canvas
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to write export file: {0}")]
    Write(#[from] std::io::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
