//! Raster drawing surface backed by a `tiny-skia` pixmap.

use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};
use tracing::debug;

use rusty_canvas_core::types::Dimensions;

use crate::color::{self, Rgba};
use crate::element::{self, CircleProps, Element, RectangleProps};
use crate::error::DrawError;
use crate::text::{self, FontBook};

/// Cubic bezier control distance for a quarter circle: 4/3 * tan(π/8).
const KAPPA: f32 = 0.552_284_8;

/// An in-memory raster canvas.
pub struct Surface {
    pixmap: Pixmap,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish()
    }
}

impl Surface {
    /// Allocate a `width` x `height` surface filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgba) -> Result<Self, DrawError> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            DrawError::Surface(format!("cannot allocate a {width}x{height} surface"))
        })?;
        pixmap.fill(background.to_skia());
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Straight-alpha color of one pixel, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba {
            r: p.red(),
            g: p.green(),
            b: p.blue(),
            a: p.alpha(),
        })
    }

    /// Rasterize one element. On error the surface is left unchanged.
    pub fn draw(&mut self, element: &Element, fonts: &FontBook) -> Result<(), DrawError> {
        match element {
            Element::Rectangle(props) => self.draw_rectangle(props),
            Element::Circle(props) => self.draw_circle(props),
            Element::Text(props) => text::draw_text(&mut self.pixmap, props, fonts),
        }
    }

    fn draw_rectangle(&mut self, props: &RectangleProps) -> Result<(), DrawError> {
        let fill = color::parse_optional(props.color.as_deref())?;
        let stroke = color::parse_optional(props.stroke_color.as_deref())?;
        ensure_finite("rectangle", &[props.x, props.y, props.width, props.height])?;

        // Negative sizes extend left/up from the origin point.
        let (x, width) = normalize_span(props.x, props.width);
        let (y, height) = normalize_span(props.y, props.height);

        let radius = props
            .rounded
            .filter(|r| r.is_finite() && *r > 0.0)
            .map(|r| r.min(width / 2.0).min(height / 2.0))
            .unwrap_or(0.0);

        let path = if radius > 0.0 {
            rounded_rect_path(x, y, width, height, radius)
        } else {
            Rect::from_xywh(x, y, width, height).map(PathBuilder::from_rect)
        };
        let path = path.ok_or_else(|| {
            DrawError::InvalidGeometry(format!(
                "rectangle {}x{} at ({}, {})",
                props.width, props.height, props.x, props.y
            ))
        })?;

        self.paint(&path, fill, stroke, element::stroke_width(props.stroke_width));
        Ok(())
    }

    fn draw_circle(&mut self, props: &CircleProps) -> Result<(), DrawError> {
        let fill = color::parse_optional(props.fill_color.as_deref())?;
        let stroke = color::parse_optional(props.stroke_color.as_deref())?;
        ensure_finite("circle", &[props.center_x, props.center_y, props.radius])?;

        if props.radius < 0.0 {
            return Err(DrawError::InvalidGeometry(format!(
                "circle radius {} is negative",
                props.radius
            )));
        }
        if props.radius == 0.0 {
            debug!("Skipping zero-radius circle");
            return Ok(());
        }

        let path = PathBuilder::from_circle(props.center_x, props.center_y, props.radius)
            .ok_or_else(|| {
                DrawError::InvalidGeometry(format!(
                    "circle of radius {} at ({}, {})",
                    props.radius, props.center_x, props.center_y
                ))
            })?;

        self.paint(&path, fill, stroke, element::stroke_width(props.stroke_width));
        Ok(())
    }

    /// Fill first, then stroke, each only when a color was given.
    fn paint(&mut self, path: &Path, fill: Option<Rgba>, stroke: Option<Rgba>, stroke_width: f32) {
        if let Some(fill) = fill {
            self.pixmap.fill_path(
                path,
                &solid_paint(fill),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
        if let Some(stroke) = stroke {
            let style = Stroke {
                width: stroke_width,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(path, &solid_paint(stroke), &style, Transform::identity(), None);
        }
    }

    /// Encode the current content as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, DrawError> {
        self.pixmap
            .encode_png()
            .map_err(|e| DrawError::Encode(e.to_string()))
    }
}

fn solid_paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn ensure_finite(shape: &str, values: &[f32]) -> Result<(), DrawError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(DrawError::InvalidGeometry(format!(
            "{shape} has non-finite coordinates: {values:?}"
        )))
    }
}

fn normalize_span(origin: f32, size: f32) -> (f32, f32) {
    if size < 0.0 {
        (origin + size, -size)
    } else {
        (origin, size)
    }
}

/// Rounded rectangle with circular corners of `r` (already clamped).
fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<Path> {
    let k = r * KAPPA;
    let (right, bottom) = (x + w, y + h);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}
