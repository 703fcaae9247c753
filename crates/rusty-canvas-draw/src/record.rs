//! A canvas surface together with its bookkeeping.

use chrono::Utc;

use rusty_canvas_core::types::{CanvasMetadata, CanvasSummary, Dimensions};

use crate::element::Element;
use crate::error::DrawError;
use crate::export;
use crate::surface::Surface;
use crate::text::FontBook;

/// One registered canvas.
#[derive(Debug)]
pub struct CanvasRecord {
    surface: Surface,
    metadata: CanvasMetadata,
}

impl CanvasRecord {
    pub fn new(surface: Surface, extra: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            surface,
            metadata: CanvasMetadata::new(extra, Utc::now()),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn metadata(&self) -> &CanvasMetadata {
        &self.metadata
    }

    pub fn dimensions(&self) -> Dimensions {
        self.surface.dimensions()
    }

    pub fn summary(&self, id: &str) -> CanvasSummary {
        CanvasSummary {
            id: id.to_string(),
            dimensions: self.dimensions(),
            metadata: self.metadata.clone(),
        }
    }

    /// Draw an element and count it. Metadata changes only if drawing succeeds.
    pub fn add_element(&mut self, element: &Element, fonts: &FontBook) -> Result<&CanvasMetadata, DrawError> {
        self.surface.draw(element, fonts)?;
        self.metadata.record_element(Utc::now());
        Ok(&self.metadata)
    }

    pub fn preview_png(&self) -> Result<Vec<u8>, DrawError> {
        self.surface.encode_png()
    }

    /// The HTML export document for the current content.
    pub fn export_html(&self) -> Result<String, DrawError> {
        let png = self.surface.encode_png()?;
        Ok(export::html_document(self.surface.width(), self.surface.height(), &png))
    }
}
