//! Raster drawing for Rusty Canvas.
//!
//! A [`Surface`] wraps a `tiny-skia` pixmap. Shapes are rasterized directly
//! with `tiny-skia`; text is laid out by `usvg` against a shared [`FontBook`]
//! and composited with `resvg`. A [`CanvasRecord`] pairs a surface with its
//! bookkeeping and is what the gateway registry stores per canvas id.

pub mod color;
pub mod element;
pub mod error;
pub mod export;
pub mod record;
pub mod surface;
pub mod text;

pub use color::Rgba;
pub use element::{CircleProps, Element, RectangleProps, TextAlign, TextBaseline, TextProps};
pub use error::{DrawError, ElementError};
pub use record::CanvasRecord;
pub use surface::Surface;
pub use text::{FontBook, FontSpec};
