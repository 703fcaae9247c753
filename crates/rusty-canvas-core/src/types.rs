use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata keys owned by the server; caller-supplied values for them are dropped.
pub const RESERVED_METADATA_KEYS: [&str; 3] = ["createdAt", "lastModified", "elementCount"];

/// Pixel dimensions of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Bookkeeping attached to every canvas.
///
/// Caller-supplied fields are flattened next to the server-owned timestamps
/// and element count, so the JSON shape is a single flat object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasMetadata {
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub element_count: u64,
}

impl CanvasMetadata {
    pub fn new(mut extra: serde_json::Map<String, serde_json::Value>, now: DateTime<Utc>) -> Self {
        for key in RESERVED_METADATA_KEYS {
            extra.remove(key);
        }
        Self {
            extra,
            created_at: now,
            last_modified: now,
            element_count: 0,
        }
    }

    /// Count one more drawn element.
    ///
    /// `last_modified` never moves backwards, even if the wall clock does.
    pub fn record_element(&mut self, now: DateTime<Utc>) {
        self.last_modified = now.max(self.last_modified);
        self.element_count += 1;
    }

    /// Milliseconds between creation and `now`.
    pub fn age_millis(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_milliseconds()
    }
}

/// Public view of a canvas: what `GET /canvas/:id` and `GET /canvas` return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSummary {
    pub id: String,
    pub dimensions: Dimensions,
    pub metadata: CanvasMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_metadata_drops_reserved_keys() {
        let extra = json!({
            "owner": "ada",
            "elementCount": 99,
            "createdAt": "yesterday"
        });
        let now = Utc::now();
        let meta = CanvasMetadata::new(extra.as_object().unwrap().clone(), now);
        assert_eq!(meta.element_count, 0);
        assert_eq!(meta.created_at, now);
        assert_eq!(meta.last_modified, now);
        assert_eq!(meta.extra.len(), 1);
        assert_eq!(meta.extra["owner"], "ada");
    }

    #[test]
    fn test_metadata_serializes_flat() {
        let extra = json!({ "title": "sketch" });
        let meta = CanvasMetadata::new(extra.as_object().unwrap().clone(), Utc::now());
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["title"], "sketch");
        assert_eq!(value["elementCount"], 0);
        assert!(value["createdAt"].is_string());
        assert!(value["lastModified"].is_string());
    }

    #[test]
    fn test_record_element_is_monotonic() {
        let now = Utc::now();
        let mut meta = CanvasMetadata::new(serde_json::Map::new(), now);

        meta.record_element(now + Duration::seconds(5));
        assert_eq!(meta.element_count, 1);
        assert_eq!(meta.last_modified, now + Duration::seconds(5));

        // Clock stepped backwards
        meta.record_element(now + Duration::seconds(1));
        assert_eq!(meta.element_count, 2);
        assert_eq!(meta.last_modified, now + Duration::seconds(5));
        assert!(meta.last_modified >= meta.created_at);
    }

    #[test]
    fn test_summary_roundtrip_shape() {
        let summary = CanvasSummary {
            id: "c1".into(),
            dimensions: Dimensions { width: 100, height: 50 },
            metadata: CanvasMetadata::new(serde_json::Map::new(), Utc::now()),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["id"], "c1");
        assert_eq!(value["dimensions"]["width"], 100);
        assert_eq!(value["dimensions"]["height"], 50);

        let back: CanvasSummary = serde_json::from_value(value).unwrap();
        assert_eq!(back, summary);
    }
}
