//! Standalone HTML/SVG export documents.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// SVG wrapping the PNG raster as a base64 `<image>` sized to the canvas.
pub fn svg_document(width: u32, height: u32, png: &[u8]) -> String {
    let data = STANDARD.encode(png);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
        <svg
          width="{width}"
          height="{height}"
          viewBox="0 0 {width} {height}"
          xmlns="http://www.w3.org/2000/svg"
          xmlns:xlink="http://www.w3.org/1999/xlink"
          version="1.1"
        >
          <rect width="100%" height="100%" fill="white"/>
          <image
            width="100%"
            height="100%"
            preserveAspectRatio="none"
            xlink:href="data:image/png;base64,{data}"
          />
        </svg>"#
    )
}

/// Minimal styled HTML page that centers the SVG export.
pub fn html_document(width: u32, height: u32, png: &[u8]) -> String {
    let svg = svg_document(width, height, png);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Canvas Export</title>
    <style>
        body {{
            margin: 0;
            min-height: 100vh;
            display: flex;
            justify-content: center;
            align-items: center;
            background-color: #f0f0f0;
        }}
        .canvas-container {{
            background: white;
            box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);
            margin: 20px;
            max-width: 100%;
            overflow: auto;
        }}
        svg {{
            display: block;
            max-width: 100%;
            height: auto;
        }}
    </style>
</head>
<body>
    <div class="canvas-container">
        {svg}
    </div>
</body>
</html>"#
    )
}

/// Download filename for a canvas export, safe to place in a header.
pub fn attachment_filename(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("canvas-{safe}.html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_embeds_base64_png() {
        let png = [0x89, b'P', b'N', b'G', 1, 2, 3];
        let svg = svg_document(120, 80, &png);
        assert!(svg.contains(r#"width="120""#));
        assert!(svg.contains(r#"height="80""#));
        assert!(svg.contains(r#"viewBox="0 0 120 80""#));
        assert!(svg.contains(&format!("data:image/png;base64,{}", STANDARD.encode(png))));
    }

    #[test]
    fn test_html_wraps_svg() {
        let html = html_document(10, 10, b"png");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Canvas Export</title>"));
        assert!(html.contains("<image"));
        assert!(html.contains("class=\"canvas-container\""));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(attachment_filename("c1"), "canvas-c1.html");
        assert_eq!(attachment_filename("my board.v2"), "canvas-my_board.v2.html");
        assert_eq!(attachment_filename("a\"b/c"), "canvas-a_b_c.html");
    }
}
