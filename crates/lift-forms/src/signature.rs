//! Signature capture
//!
//! Freehand strokes on a fixed-size canvas, exported as an SVG data URI
//! for the save-signature endpoint.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt::Write;

use crate::error::{FormsError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Drawing surface state
#[derive(Debug, Clone)]
pub struct SignaturePad {
    width: u32,
    height: u32,
    stroke_width: f32,
    strokes: Vec<Vec<Point>>,
    drawing: bool,
}

impl SignaturePad {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, stroke_width: 2.0, strokes: Vec::new(), drawing: false }
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn strokes(&self) -> &[Vec<Point>] { &self.strokes }

    fn clamp(&self, x: f32, y: f32) -> Point {
        Point {
            x: x.clamp(0.0, self.width as f32),
            y: y.clamp(0.0, self.height as f32),
        }
    }

    /// Pointer down
    pub fn begin_stroke(&mut self, x: f32, y: f32) {
        let point = self.clamp(x, y);
        self.strokes.push(vec![point]);
        self.drawing = true;
    }

    /// Pointer move; ignored unless a stroke is open
    pub fn line_to(&mut self, x: f32, y: f32) {
        if !self.drawing {
            return;
        }
        let point = self.clamp(x, y);
        if let Some(stroke) = self.strokes.last_mut() {
            if stroke.last() != Some(&point) {
                stroke.push(point);
            }
        }
    }

    /// Pointer up or leave
    pub fn end_stroke(&mut self) {
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        svg.push_str(r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);
        for stroke in &self.strokes {
            let mut points = stroke.iter();
            let Some(first) = points.next() else { continue };
            let mut d = format!("M{:.1} {:.1}", first.x, first.y);
            if stroke.len() == 1 {
                // A tap still leaves a dot
                let _ = write!(d, " l0.1 0");
            }
            for p in points {
                let _ = write!(d, " L{:.1} {:.1}", p.x, p.y);
            }
            let _ = write!(
                svg,
                r##"<path d="{}" fill="none" stroke="#000000" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"/>"##,
                d, self.stroke_width
            );
        }
        svg.push_str("</svg>");
        svg
    }

    /// `data:image/svg+xml;base64,...`, refused when nothing was drawn
    pub fn to_data_uri(&self) -> Result<String> {
        if self.is_empty() {
            return Err(FormsError::EmptySignature);
        }
        Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(self.to_svg())))
    }
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new(400, 150)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_clamped_to_canvas() {
        let mut pad = SignaturePad::new(100, 50);
        pad.begin_stroke(-5.0, 10.0);
        pad.line_to(150.0, 80.0);
        pad.end_stroke();
        assert_eq!(pad.strokes()[0], vec![Point { x: 0.0, y: 10.0 }, Point { x: 100.0, y: 50.0 }]);
    }

    #[test]
    fn test_moves_without_stroke_ignored() {
        let mut pad = SignaturePad::default();
        pad.line_to(10.0, 10.0);
        assert!(pad.is_empty());
        assert!(matches!(pad.to_data_uri(), Err(FormsError::EmptySignature)));
    }

    #[test]
    fn test_data_uri_decodes_to_svg() {
        let mut pad = SignaturePad::new(200, 80);
        pad.begin_stroke(10.0, 10.0);
        pad.line_to(20.0, 30.0);
        pad.end_stroke();
        let uri = pad.to_data_uri().unwrap();
        let encoded = uri.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(svg.contains(r#"d="M10.0 10.0 L20.0 30.0""#));
        assert!(svg.starts_with("<svg"));

        pad.clear();
        assert!(pad.is_empty());
    }
}
