//! The canvas registry: id → surface + metadata.
//!
//! The map sits behind a registry-wide `RwLock`; each record has its own
//! `Mutex`, so draws on one canvas are serialized while other canvases stay
//! available. Rasterization and PNG encoding run on the blocking pool with
//! the record's lock held.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use rusty_canvas_core::config::Config;
use rusty_canvas_core::types::{CanvasMetadata, CanvasSummary};
use rusty_canvas_draw::{CanvasRecord, DrawError, Element, FontBook, Rgba, Surface};

use crate::error::ApiError;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_BACKGROUND: &str = "white";

/// Body of `POST /canvas`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCanvas {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

type SharedRecord = Arc<Mutex<CanvasRecord>>;

pub struct CanvasRegistry {
    canvases: RwLock<IndexMap<String, SharedRecord>>,
    fonts: FontBook,
    max_width: u32,
    max_height: u32,
}

impl Default for CanvasRegistry {
    fn default() -> Self {
        Self::new(FontBook::empty(), Config::default().max_dimensions())
    }
}

impl CanvasRegistry {
    pub fn new(fonts: FontBook, (max_width, max_height): (u32, u32)) -> Self {
        Self {
            canvases: RwLock::new(IndexMap::new()),
            fonts,
            max_width,
            max_height,
        }
    }

    /// Build a registry with the fonts and limits from `config`.
    pub fn from_config(config: &Config) -> Self {
        let canvas = config.canvas();
        let fonts = FontBook::load(
            canvas.system_fonts,
            &config.font_dirs(),
            config.default_font_family().as_deref(),
        );
        Self::new(fonts, config.max_dimensions())
    }

    /// Create (or replace) a canvas.
    ///
    /// Re-using an existing id overwrites that canvas in place; it keeps its
    /// position in the listing.
    pub async fn create(&self, request: NewCanvas) -> Result<CanvasSummary, ApiError> {
        let id = request
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Validation("Canvas ID is required".into()))?;

        let width = request.width.unwrap_or(DEFAULT_WIDTH);
        let height = request.height.unwrap_or(DEFAULT_HEIGHT);
        if width == 0 || height == 0 {
            return Err(ApiError::Validation(
                "Canvas width and height must be greater than 0".into(),
            ));
        }
        if width > self.max_width || height > self.max_height {
            return Err(ApiError::Validation(format!(
                "Canvas dimensions {width}x{height} exceed the maximum of {}x{}",
                self.max_width, self.max_height
            )));
        }

        let background_name = request
            .background_color
            .as_deref()
            .unwrap_or(DEFAULT_BACKGROUND);
        let background = Rgba::parse(background_name).map_err(|_| {
            ApiError::Validation(format!("Invalid background color: {background_name}"))
        })?;

        let extra = match request.metadata {
            None | Some(serde_json::Value::Null) => serde_json::Map::new(),
            Some(serde_json::Value::Object(map)) => map,
            Some(_) => return Err(ApiError::Validation("metadata must be an object".into())),
        };

        let surface = Surface::new(width, height, background)
            .map_err(|e| ApiError::draw("Failed to create canvas", e))?;
        let record = CanvasRecord::new(surface, extra);
        let summary = record.summary(&id);

        let replaced = self
            .canvases
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(record)))
            .is_some();

        if replaced {
            warn!(canvas_id = %id, "Canvas re-created, previous content discarded");
        } else {
            #[cfg(feature = "metrics")]
            crate::metrics::record_canvas_created();
        }
        info!(canvas_id = %id, width, height, "Canvas initialized");

        Ok(summary)
    }

    pub async fn get(&self, id: &str) -> Result<CanvasSummary, ApiError> {
        let record = self.record(id).await?;
        let record = record.lock().await;
        Ok(record.summary(id))
    }

    /// All canvases in creation order.
    pub async fn list(&self) -> Vec<CanvasSummary> {
        let entries: Vec<(String, SharedRecord)> = self
            .canvases
            .read()
            .await
            .iter()
            .map(|(id, record)| (id.clone(), Arc::clone(record)))
            .collect();

        let mut summaries = Vec::with_capacity(entries.len());
        for (id, record) in entries {
            summaries.push(record.lock().await.summary(&id));
        }
        summaries
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.canvases
            .write()
            .await
            .shift_remove(id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        #[cfg(feature = "metrics")]
        crate::metrics::record_canvas_deleted();
        info!(canvas_id = %id, "Canvas deleted");
        Ok(())
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.canvases.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.canvases.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Draw an element and return the updated metadata.
    pub async fn add_element(&self, id: &str, element: Element) -> Result<CanvasMetadata, ApiError> {
        let mut record = self.lock_owned(id).await?;
        let fonts = self.fonts.clone();
        let kind = element.kind();

        let metadata = run_blocking(move || {
            record
                .add_element(&element, &fonts)
                .map(CanvasMetadata::clone)
        })
        .await?
        .map_err(|e| ApiError::draw("Failed to add element", e))?;

        #[cfg(feature = "metrics")]
        crate::metrics::record_element(kind);
        debug!(canvas_id = %id, kind, element_count = metadata.element_count, "Element added");

        Ok(metadata)
    }

    /// HTML export document plus the metadata at export time.
    pub async fn export_html(&self, id: &str) -> Result<(String, CanvasMetadata), ApiError> {
        let record = self.lock_owned(id).await?;
        run_blocking(move || -> Result<_, DrawError> {
            let html = record.export_html()?;
            Ok((html, record.metadata().clone()))
        })
        .await?
        .map_err(|e| ApiError::draw("Export failed", e))
    }

    /// PNG bytes of the current content.
    pub async fn preview_png(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        let record = self.lock_owned(id).await?;
        let png = run_blocking(move || record.preview_png())
            .await?
            .map_err(|e| ApiError::draw("Failed to create preview", e))?;
        debug!(canvas_id = %id, bytes = png.len(), "Preview encoded");
        Ok(png)
    }

    async fn record(&self, id: &str) -> Result<SharedRecord, ApiError> {
        self.canvases
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn lock_owned(&self, id: &str) -> Result<OwnedMutexGuard<CanvasRecord>, ApiError> {
        Ok(self.record(id).await?.lock_owned().await)
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("drawing task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn new_canvas(id: &str) -> NewCanvas {
        NewCanvas {
            id: Some(id.into()),
            ..NewCanvas::default()
        }
    }

    fn red_square() -> Element {
        Element::from_request(
            Some("rectangle"),
            Some(json!({"x": 0, "y": 0, "width": 50, "height": 50, "color": "red"})),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let registry = CanvasRegistry::default();
        let summary = registry.create(new_canvas("c1")).await.unwrap();
        assert_eq!(summary.id, "c1");
        assert_eq!(summary.dimensions.width, 800);
        assert_eq!(summary.dimensions.height, 600);
        assert_eq!(summary.metadata.element_count, 0);
        assert_eq!(summary.metadata.created_at, summary.metadata.last_modified);
    }

    #[tokio::test]
    async fn test_create_requires_id() {
        let registry = CanvasRegistry::default();
        for id in [None, Some(String::new())] {
            let err = registry
                .create(NewCanvas { id, ..NewCanvas::default() })
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let registry = CanvasRegistry::new(FontBook::empty(), (100, 100));

        let too_big = NewCanvas { width: Some(101), ..new_canvas("a") };
        let zero = NewCanvas { height: Some(0), ..new_canvas("b") };
        let bad_color = NewCanvas {
            width: Some(10),
            height: Some(10),
            background_color: Some("plaid".into()),
            ..new_canvas("c")
        };
        let bad_meta = NewCanvas {
            width: Some(10),
            height: Some(10),
            metadata: Some(json!([1, 2])),
            ..new_canvas("d")
        };

        for request in [too_big, zero, bad_color, bad_meta] {
            let err = registry.create(request).await.unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "got {err:?}");
        }
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_get_list_delete() {
        let registry = CanvasRegistry::default();
        for id in ["b", "a", "c"] {
            registry
                .create(NewCanvas { width: Some(10), height: Some(10), ..new_canvas(id) })
                .await
                .unwrap();
        }

        let ids: Vec<String> = registry.list().await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        registry.delete("a").await.unwrap();
        assert!(matches!(registry.get("a").await, Err(ApiError::NotFound(_))));
        assert!(matches!(registry.delete("a").await, Err(ApiError::NotFound(_))));

        let ids: Vec<String> = registry.list().await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_recreate_overwrites() {
        let registry = CanvasRegistry::default();
        registry.create(new_canvas("c1")).await.unwrap();
        registry.add_element("c1", red_square()).await.unwrap();

        let summary = registry
            .create(NewCanvas {
                width: Some(20),
                height: Some(20),
                metadata: Some(json!({"v": 2})),
                ..new_canvas("c1")
            })
            .await
            .unwrap();
        assert_eq!(summary.metadata.element_count, 0);
        assert_eq!(registry.len().await, 1);

        let fetched = registry.get("c1").await.unwrap();
        assert_eq!(fetched.dimensions.width, 20);
        assert_eq!(fetched.metadata.extra["v"], 2);
    }

    #[tokio::test]
    async fn test_add_elements_counts_and_orders() {
        let registry = CanvasRegistry::default();
        registry.create(new_canvas("c1")).await.unwrap();

        let mut previous = registry.get("c1").await.unwrap().metadata.last_modified;
        for n in 1..=5 {
            let meta = registry.add_element("c1", red_square()).await.unwrap();
            assert_eq!(meta.element_count, n);
            assert!(meta.last_modified >= previous);
            previous = meta.last_modified;
        }
        assert_eq!(registry.get("c1").await.unwrap().metadata.element_count, 5);
    }

    #[tokio::test]
    async fn test_add_element_missing_canvas() {
        let registry = CanvasRegistry::default();
        let err = registry.add_element("ghost", red_square()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_draw_failure_keeps_count() {
        let registry = CanvasRegistry::default();
        registry.create(new_canvas("c1")).await.unwrap();

        let bad = Element::from_request(
            Some("circle"),
            Some(json!({"centerX": 1, "centerY": 1, "radius": -5, "fillColor": "red"})),
        )
        .unwrap();
        let err = registry.add_element("c1", bad).await.unwrap_err();
        assert!(matches!(err, ApiError::Draw { message: "Failed to add element", .. }));
        assert_eq!(registry.get("c1").await.unwrap().metadata.element_count, 0);
    }

    #[tokio::test]
    async fn test_preview_and_export() {
        let registry = CanvasRegistry::default();
        assert!(matches!(registry.preview_png("c1").await, Err(ApiError::NotFound(_))));
        assert!(matches!(registry.export_html("c1").await, Err(ApiError::NotFound(_))));

        registry
            .create(NewCanvas { width: Some(100), height: Some(100), ..new_canvas("c1") })
            .await
            .unwrap();
        registry.add_element("c1", red_square()).await.unwrap();

        let png = registry.preview_png("c1").await.unwrap();
        let pixmap = tiny_skia::Pixmap::decode_png(&png).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (100, 100));
        let p = pixmap.pixel(25, 25).unwrap();
        assert_eq!((p.red(), p.green(), p.blue()), (255, 0, 0));

        let (html, metadata) = registry.export_html("c1").await.unwrap();
        assert_eq!(metadata.element_count, 1);
        assert!(html.contains("<image"));
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_all_counted() {
        let registry = Arc::new(CanvasRegistry::default());
        registry
            .create(NewCanvas { width: Some(64), height: Some(64), ..new_canvas("c1") })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.add_element("c1", red_square()).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(registry.get("c1").await.unwrap().metadata.element_count, 16);
    }
}
