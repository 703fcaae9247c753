//! Text layout and rasterization.
//!
//! Each text element is expressed as a one-node SVG document the size of the
//! canvas, laid out by `usvg` against the shared font database, and
//! composited onto the pixmap with `resvg`. Font, alignment and color live
//! only in that throwaway document, so nothing carries over to later draws.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tiny_skia::{Pixmap, Transform};
use tracing::{debug, info, warn};
use usvg::fontdb;

use crate::color::Rgba;
use crate::element::{TextAlign, TextBaseline, TextProps};
use crate::error::DrawError;

const SANS_SERIF_FAMILIES: &[&str] = &[
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "DejaVu Sans",
    "Noto Sans",
    "Roboto",
];
const SERIF_FAMILIES: &[&str] = &[
    "Times New Roman",
    "Times",
    "Liberation Serif",
    "DejaVu Serif",
    "Noto Serif",
];
const MONOSPACE_FAMILIES: &[&str] = &[
    "Courier New",
    "Courier",
    "Liberation Mono",
    "DejaVu Sans Mono",
    "Noto Sans Mono",
];

/// Fonts available to text elements. Cheap to clone.
///
/// The generic CSS families always resolve to a loaded face, and every text
/// element falls back to `sans-serif`, so a missing family still draws.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<fontdb::Database>,
    fallback: Option<String>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.face_count())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl FontBook {
    /// A font book with no faces. Text elements lay out but draw no glyphs.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
            fallback: None,
        }
    }

    /// Load the host's installed fonts plus any extra directories.
    ///
    /// `preferred_family` becomes the fallback face when it is installed.
    pub fn load(system_fonts: bool, font_dirs: &[PathBuf], preferred_family: Option<&str>) -> Self {
        let mut db = fontdb::Database::new();
        if system_fonts {
            db.load_system_fonts();
        }
        for dir in font_dirs {
            if dir.is_dir() {
                db.load_fonts_dir(dir);
            } else {
                warn!(dir = %dir.display(), "Font directory not found, skipping");
            }
        }

        let fallback = assign_generic_families(&mut db, preferred_family);
        match &fallback {
            Some(family) => info!(faces = db.len(), fallback = %family, "Font database loaded"),
            None => warn!("No fonts loaded, text elements will draw nothing"),
        }
        Self {
            db: Arc::new(db),
            fallback,
        }
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Family that `sans-serif` and unknown families resolve to.
    pub fn fallback_family(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    fn options(&self) -> usvg::Options<'static> {
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.db);
        options
    }
}

/// Point the generic families at loaded faces. Returns the sans-serif choice.
fn assign_generic_families(db: &mut fontdb::Database, preferred: Option<&str>) -> Option<String> {
    let sans = preferred
        .and_then(|name| find_family(db, &[name]))
        .or_else(|| {
            if preferred.is_some() {
                warn!(family = ?preferred, "Configured default font family is not installed");
            }
            find_family(db, SANS_SERIF_FAMILIES)
        })
        .or_else(|| first_family(db, |face| !face.monospaced))
        .or_else(|| first_family(db, |_| true))?;

    let serif = find_family(db, SERIF_FAMILIES).unwrap_or_else(|| sans.clone());
    let monospace = find_family(db, MONOSPACE_FAMILIES)
        .or_else(|| first_family(db, |face| face.monospaced))
        .unwrap_or_else(|| sans.clone());

    debug!(%sans, %serif, %monospace, "Generic font families assigned");
    db.set_sans_serif_family(sans.clone());
    db.set_serif_family(serif);
    db.set_monospace_family(monospace);
    db.set_cursive_family(sans.clone());
    db.set_fantasy_family(sans.clone());
    Some(sans)
}

/// First candidate with a loaded face, in the face's own spelling.
fn find_family(db: &fontdb::Database, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|wanted| {
        db.faces()
            .flat_map(|face| face.families.iter())
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(name, _)| name.clone())
    })
}

fn first_family(db: &fontdb::Database, accept: impl Fn(&fontdb::FaceInfo) -> bool) -> Option<String> {
    db.faces()
        .filter(|face| accept(face))
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
}

/// A parsed CSS font shorthand: `[style] [weight] <size><unit> <family>`.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size_px: f32,
    pub weight: u16,
    pub italic: bool,
}

impl FromStr for FontSpec {
    type Err = DrawError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || DrawError::InvalidFont(input.to_string());
        let tokens: Vec<&str> = input.split_whitespace().collect();

        let mut weight = 400;
        let mut italic = false;

        for (i, token) in tokens.iter().enumerate() {
            if let Some(size_px) = parse_font_size(token) {
                let family = tokens[i + 1..].join(" ");
                if family.is_empty() {
                    return Err(invalid());
                }
                return Ok(Self {
                    family,
                    size_px,
                    weight,
                    italic,
                });
            }

            match token.to_ascii_lowercase().as_str() {
                "italic" | "oblique" => italic = true,
                "bold" | "bolder" => weight = 700,
                "lighter" => weight = 300,
                "normal" | "small-caps" => {}
                other => match other.parse::<u16>() {
                    Ok(w) if (1..=1000).contains(&w) => weight = w,
                    _ => return Err(invalid()),
                },
            }
        }

        Err(invalid())
    }
}

/// Parse a font size token (optionally followed by `/line-height`) into pixels.
fn parse_font_size(token: &str) -> Option<f32> {
    let size = token.split('/').next()?;
    let (number, mul, div) = if let Some(n) = size.strip_suffix("px") {
        (n, 1.0, 1.0)
    } else if let Some(n) = size.strip_suffix("pt") {
        (n, 4.0, 3.0)
    } else if let Some(n) = size.strip_suffix("rem") {
        (n, 16.0, 1.0)
    } else if let Some(n) = size.strip_suffix("em") {
        (n, 16.0, 1.0)
    } else if let Some(n) = size.strip_suffix('%') {
        (n, 16.0, 100.0)
    } else {
        return None;
    };
    let value: f32 = number.parse().ok()?;
    let px = value * mul / div;
    (px.is_finite() && px > 0.0).then_some(px)
}

impl TextAlign {
    fn svg_anchor(self) -> &'static str {
        match self {
            TextAlign::Left | TextAlign::Start => "start",
            TextAlign::Center => "middle",
            TextAlign::Right | TextAlign::End => "end",
        }
    }
}

impl TextBaseline {
    fn svg_baseline(self) -> &'static str {
        match self {
            TextBaseline::Top => "text-before-edge",
            TextBaseline::Hanging => "hanging",
            TextBaseline::Middle => "central",
            TextBaseline::Alphabetic => "alphabetic",
            TextBaseline::Ideographic => "ideographic",
            TextBaseline::Bottom => "text-after-edge",
        }
    }
}

/// Escape text for use in XML content and attribute values.
pub(crate) fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' | '\r' | '\t' | '\u{c}' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

fn text_document(width: u32, height: u32, props: &TextProps, font: &FontSpec, color: Rgba) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" font-style="{style}" "#,
            r#"text-anchor="{anchor}" dominant-baseline="{baseline}" fill="{fill}" fill-opacity="{opacity}" xml:space="preserve">"#,
            "{text}</text></svg>"
        ),
        w = width,
        h = height,
        x = props.x,
        y = props.y,
        family = escape_xml(&format!("{}, sans-serif", font.family)),
        size = font.size_px,
        weight = font.weight,
        style = if font.italic { "italic" } else { "normal" },
        anchor = props.align.svg_anchor(),
        baseline = props.baseline.svg_baseline(),
        fill = color.svg_fill(),
        opacity = color.opacity(),
        text = escape_xml(&props.text),
    )
}

/// Lay out and composite one text element onto `pixmap`.
///
/// Everything that can fail runs before the pixmap is touched.
pub(crate) fn draw_text(pixmap: &mut Pixmap, props: &TextProps, fonts: &FontBook) -> Result<(), DrawError> {
    let color = match props.text_color.as_deref().map(str::trim) {
        None | Some("") => Rgba::BLACK,
        Some(c) => Rgba::parse(c)?,
    };
    let font: FontSpec = props.font().parse()?;

    if !props.x.is_finite() || !props.y.is_finite() {
        return Err(DrawError::InvalidGeometry(format!(
            "text position ({}, {}) is not finite",
            props.x, props.y
        )));
    }

    // A non-positive maxWidth draws nothing, as on an HTML canvas.
    if let Some(max_width) = props.max_width {
        if !(max_width.is_finite() && max_width > 0.0) {
            debug!(max_width, "Skipping text with non-positive maxWidth");
            return Ok(());
        }
    }

    let svg = text_document(pixmap.width(), pixmap.height(), props, &font, color);
    let tree = usvg::Tree::from_str(&svg, &fonts.options())
        .map_err(|e| DrawError::Text(e.to_string()))?;

    if tree.root().children().is_empty() {
        debug!(family = %font.family, "No glyphs produced for text element");
        return Ok(());
    }

    let mut transform = Transform::identity();
    if let Some(max_width) = props.max_width {
        let laid_out = tree.root().abs_bounding_box().width();
        if laid_out > max_width {
            // Squeeze horizontally around the anchor x.
            let sx = max_width / laid_out;
            transform = Transform::from_row(sx, 0.0, 0.0, 1.0, props.x * (1.0 - sx), 0.0);
        }
    }

    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(())
}

/// The DejaVu Sans face bundled with the crate's tests.
#[cfg(test)]
pub(crate) fn bundled_fonts() -> FontBook {
    let dir = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts"));
    FontBook::load(false, &[dir], None)
}

/// Inclusive `(min_x, min_y, max_x, max_y)` of every non-white pixel.
#[cfg(test)]
pub(crate) fn ink_bounds(pixmap: &Pixmap) -> Option<(u32, u32, u32, u32)> {
    let width = pixmap.width();
    pixmap
        .pixels()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.red() != 255 || p.green() != 255 || p.blue() != 255)
        .map(|(i, _)| (i as u32 % width, i as u32 / width))
        .fold(None, |acc, (x, y)| match acc {
            None => Some((x, y, x, y)),
            Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
        })
}
