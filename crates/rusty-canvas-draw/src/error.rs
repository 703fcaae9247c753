//! Drawing and element decoding errors.

use thiserror::Error;

/// A fault raised while rasterizing or encoding a surface.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    #[error("invalid font: {0:?}")]
    InvalidFont(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("text layout error: {0}")]
    Text(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    /// Properties missing, or of the wrong type, for the element kind.
    #[error("invalid {kind} properties: {source}")]
    InvalidProperties {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Why an add-element request produced no element.
#[derive(Debug, Error)]
pub enum ElementError {
    #[error("Element type is required")]
    MissingType,

    #[error("Unknown element type: {0}")]
    UnknownType(String),

    /// The kind is known but its properties cannot be drawn.
    #[error(transparent)]
    Draw(#[from] DrawError),
}
