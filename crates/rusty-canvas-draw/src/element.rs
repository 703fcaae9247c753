//! Drawable element kinds and their properties.

use serde::{Deserialize, Deserializer};
use serde::de::DeserializeOwned;

use crate::error::{DrawError, ElementError};

pub const DEFAULT_FONT: &str = "20px Arial";
pub const DEFAULT_STROKE_WIDTH: f32 = 1.0;

/// One drawable element, decoded from `{type, properties}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Rectangle(RectangleProps),
    Circle(CircleProps),
    Text(TextProps),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleProps {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub stroke_color: Option<String>,
    #[serde(default)]
    pub stroke_width: Option<f32>,
    /// Corner radius; clamped to half the shorter side. `true` means 1.
    #[serde(default, deserialize_with = "corner_radius")]
    pub rounded: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleProps {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default)]
    pub stroke_color: Option<String>,
    #[serde(default)]
    pub stroke_width: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// CSS font shorthand, e.g. `"bold 24px Helvetica"`.
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub baseline: TextBaseline,
    #[serde(default)]
    pub max_width: Option<f32>,
}

/// Horizontal alignment relative to the text's `x` coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Right,
    #[default]
    Center,
    Start,
    End,
}

/// Vertical alignment relative to the text's `y` coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    Top,
    Hanging,
    #[default]
    Middle,
    Alphabetic,
    Ideographic,
    Bottom,
}

impl TextProps {
    pub fn font(&self) -> &str {
        self.font
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(DEFAULT_FONT)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CornerRadius {
    Radius(f32),
    Flag(bool),
}

fn corner_radius<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
    Ok(match Option::<CornerRadius>::deserialize(deserializer)? {
        Some(CornerRadius::Radius(r)) => Some(r),
        Some(CornerRadius::Flag(true)) => Some(1.0),
        Some(CornerRadius::Flag(false)) | None => None,
    })
}

/// Effective stroke width: absent or non-positive widths fall back to 1.
pub(crate) fn stroke_width(width: Option<f32>) -> f32 {
    width
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(DEFAULT_STROKE_WIDTH)
}

impl Element {
    /// Decode an element from the request's `type` tag and `properties` object.
    ///
    /// Missing `properties` decode as an empty object, so required fields
    /// surface as property errors rather than a missing-body error.
    pub fn from_request(
        kind: Option<&str>,
        properties: Option<serde_json::Value>,
    ) -> Result<Self, ElementError> {
        let kind = kind.ok_or(ElementError::MissingType)?;
        let properties = properties.unwrap_or_else(|| serde_json::json!({}));

        match kind {
            "rectangle" => decode("rectangle", properties).map(Element::Rectangle),
            "circle" => decode("circle", properties).map(Element::Circle),
            "text" => decode("text", properties).map(Element::Text),
            "" => Err(ElementError::MissingType),
            other => Err(ElementError::UnknownType(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Element::Rectangle(_) => "rectangle",
            Element::Circle(_) => "circle",
            Element::Text(_) => "text",
        }
    }
}

fn decode<T: DeserializeOwned>(
    kind: &'static str,
    properties: serde_json::Value,
) -> Result<T, ElementError> {
    serde_json::from_value(properties)
        .map_err(|source| DrawError::InvalidProperties { kind, source }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_rectangle() {
        let el = Element::from_request(
            Some("rectangle"),
            Some(json!({"x": 0, "y": 5, "width": 50, "height": 40, "color": "red", "rounded": 8})),
        )
        .unwrap();
        assert_eq!(el.kind(), "rectangle");
        assert_eq!(
            el,
            Element::Rectangle(RectangleProps {
                x: 0.0,
                y: 5.0,
                width: 50.0,
                height: 40.0,
                color: Some("red".into()),
                stroke_color: None,
                stroke_width: None,
                rounded: Some(8.0),
            })
        );
    }

    #[test]
    fn test_decode_circle() {
        let el = Element::from_request(
            Some("circle"),
            Some(json!({"centerX": 10, "centerY": 12.5, "radius": 4, "strokeColor": "blue", "strokeWidth": 3})),
        )
        .unwrap();
        match el {
            Element::Circle(c) => {
                assert_eq!(c.center_y, 12.5);
                assert_eq!(c.stroke_color.as_deref(), Some("blue"));
                assert_eq!(c.stroke_width, Some(3.0));
                assert_eq!(c.fill_color, None);
            }
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_text_defaults() {
        let el = Element::from_request(
            Some("text"),
            Some(json!({"text": "Hello", "x": 50, "y": 20})),
        )
        .unwrap();
        match el {
            Element::Text(t) => {
                assert_eq!(t.font(), DEFAULT_FONT);
                assert_eq!(t.align, TextAlign::Center);
                assert_eq!(t.baseline, TextBaseline::Middle);
                assert_eq!(t.max_width, None);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_text_alignment() {
        let el = Element::from_request(
            Some("text"),
            Some(json!({"text": "x", "x": 0, "y": 0, "align": "right", "baseline": "top"})),
        )
        .unwrap();
        let Element::Text(t) = el else { panic!("expected text") };
        assert_eq!(t.align, TextAlign::Right);
        assert_eq!(t.baseline, TextBaseline::Top);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = Element::from_request(Some("triangle"), Some(json!({}))).unwrap_err();
        assert!(matches!(err, ElementError::UnknownType(ref t) if t == "triangle"));
        assert_eq!(err.to_string(), "Unknown element type: triangle");
    }

    #[test]
    fn test_missing_type_rejected() {
        assert!(matches!(
            Element::from_request(None, Some(json!({}))),
            Err(ElementError::MissingType)
        ));
        assert!(matches!(
            Element::from_request(Some(""), None),
            Err(ElementError::MissingType)
        ));
    }

    #[test]
    fn test_missing_and_mistyped_properties() {
        let err = Element::from_request(Some("circle"), None).unwrap_err();
        assert!(matches!(
            err,
            ElementError::Draw(DrawError::InvalidProperties { kind: "circle", .. })
        ));

        let err = Element::from_request(
            Some("rectangle"),
            Some(json!({"x": "left", "y": 0, "width": 1, "height": 1})),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("invalid rectangle properties"));
    }

    #[test]
    fn test_rounded_accepts_flag() {
        let rounded = |value: serde_json::Value| {
            let el = Element::from_request(
                Some("rectangle"),
                Some(json!({"x": 0, "y": 0, "width": 10, "height": 10, "rounded": value})),
            )
            .unwrap();
            let Element::Rectangle(r) = el else { panic!("expected rectangle") };
            r.rounded
        };
        assert_eq!(rounded(json!(true)), Some(1.0));
        assert_eq!(rounded(json!(false)), None);
        assert_eq!(rounded(json!(null)), None);
        assert_eq!(rounded(json!(6)), Some(6.0));
        assert!(Element::from_request(
            Some("rectangle"),
            Some(json!({"x": 0, "y": 0, "width": 10, "height": 10, "rounded": "big"})),
        )
        .is_err());
    }

    #[test]
    fn test_stroke_width_fallback() {
        assert_eq!(stroke_width(None), 1.0);
        assert_eq!(stroke_width(Some(0.0)), 1.0);
        assert_eq!(stroke_width(Some(-2.0)), 1.0);
        assert_eq!(stroke_width(Some(4.5)), 4.5);
    }
}
