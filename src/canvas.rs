use std::fmt;
use std::path::Path;

use anyhow::Context;
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// Drawing operations the starfield needs from its host display.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn set_global_alpha(&mut self, alpha: f64);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rgb: (u8, u8, u8));
    fn set_stroke_color(&mut self, color: Hsl);
    fn set_line_width(&mut self, width: f64);
    fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    /// Degrees, `[0, 360)`.
    pub hue: f64,
    /// Percent, `[0, 100]`.
    pub saturation: f64,
    /// Percent, `[0, 100]`.
    pub lightness: f64,
}

impl Hsl {
    pub fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    pub fn to_rgb(self) -> (u8, u8, u8) {
        let h = self.hue.rem_euclid(360.0) / 60.0;
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = l - c * 0.5;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        (to_u8(r + m), to_u8(g + m), to_u8(b + m))
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({},{}%,{}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

#[inline]
fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// RGBA8 raster on a `tiny_skia::Pixmap`, source-over with a global alpha.
///
/// Every paint starts from opaque black, so the premultiplied pixmap bytes
/// read back as plain RGBA.
pub struct Canvas {
    width: usize,
    height: usize,
    /// `None` while either side is zero; tiny-skia refuses empty pixmaps.
    pixmap: Option<Pixmap>,
    global_alpha: f64,
    stroke_rgb: (u8, u8, u8),
    line_width: f64,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        let mut canvas = Self {
            width,
            height,
            pixmap: None,
            global_alpha: 1.0,
            stroke_rgb: (0, 0, 0),
            line_width: 1.0,
        };
        canvas.resize(width, height);
        canvas
    }

    /// Reallocates the pixmap. Contents are cleared to opaque black.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixmap = u32::try_from(width)
            .ok()
            .zip(u32::try_from(height).ok())
            .and_then(|(w, h)| Pixmap::new(w, h));
        self.clear();
    }

    pub fn clear(&mut self) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(Color::BLACK);
        }
    }

    pub fn pixels(&self) -> &[u8] {
        self.pixmap.as_ref().map_or(&[][..], |p| p.data())
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let px = self
            .pixmap
            .as_ref()?
            .pixel(x as u32, y as u32)?
            .demultiply();
        Some((px.red(), px.green(), px.blue()))
    }

    pub fn global_alpha(&self) -> f64 {
        self.global_alpha
    }

    pub fn encode_png(&self) -> anyhow::Result<Vec<u8>> {
        let pixmap = self
            .pixmap
            .as_ref()
            .with_context(|| format!("cannot encode a {}x{} canvas", self.width, self.height))?;
        pixmap.encode_png().context("PNG encoding failed")
    }

    pub fn save_png(&self, path: &Path) -> anyhow::Result<()> {
        let pixmap = self
            .pixmap
            .as_ref()
            .with_context(|| format!("cannot save a {}x{} canvas", self.width, self.height))?;
        pixmap
            .save_png(path)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    fn paint(&self, rgb: (u8, u8, u8)) -> Paint<'static> {
        let mut color = Color::from_rgba8(rgb.0, rgb.1, rgb.2, 255);
        color.apply_opacity(self.global_alpha as f32);
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        paint
    }
}

impl Surface for Canvas {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if alpha.is_finite() {
            self.global_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rgb: (u8, u8, u8)) {
        if ![x, y, w, h].iter().all(|v| v.is_finite()) || w <= 0.0 || h <= 0.0 {
            return;
        }
        // Clip up front so far-off rects never reach the rasteriser.
        let left = x.max(0.0);
        let top = y.max(0.0);
        let right = (x + w).min(self.width as f64);
        let bottom = (y + h).min(self.height as f64);
        if left >= right || top >= bottom {
            return;
        }
        let Some(rect) = Rect::from_ltrb(left as f32, top as f32, right as f32, bottom as f32)
        else {
            return;
        };
        let paint = self.paint(rgb);
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    fn set_stroke_color(&mut self, color: Hsl) {
        self.stroke_rgb = color.to_rgb();
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.line_width = width;
        }
    }

    fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(x0 as f32, y0 as f32);
        pb.line_to(x1 as f32, y1 as f32);
        let Some(path) = pb.finish() else {
            return;
        };

        let paint = self.paint(self.stroke_rgb);
        let stroke = Stroke {
            width: self.line_width as f32,
            ..Default::default()
        };
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    GlobalAlpha(f64),
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        rgb: (u8, u8, u8),
    },
    StrokeColor(Hsl),
    LineWidth(f64),
    Line {
        from: (f64, f64),
        to: (f64, f64),
    },
}

/// Surface that records every call instead of rasterising.
pub struct RecordingSurface {
    width: usize,
    height: usize,
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Line { .. }))
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ops.push(DrawOp::GlobalAlpha(alpha));
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rgb: (u8, u8, u8)) {
        self.ops.push(DrawOp::FillRect { x, y, w, h, rgb });
    }

    fn set_stroke_color(&mut self, color: Hsl) {
        self.ops.push(DrawOp::StrokeColor(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(DrawOp::LineWidth(width));
    }

    fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        self.ops.push(DrawOp::Line {
            from: (x0, y0),
            to: (x1, y1),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_conversion_hits_primaries() {
        assert_eq!(Hsl::new(0.0, 100.0, 50.0).to_rgb(), (255, 0, 0));
        assert_eq!(Hsl::new(120.0, 100.0, 50.0).to_rgb(), (0, 255, 0));
        assert_eq!(Hsl::new(240.0, 100.0, 50.0).to_rgb(), (0, 0, 255));
        assert_eq!(Hsl::new(360.0, 100.0, 50.0).to_rgb(), (255, 0, 0));
    }

    #[test]
    fn zero_saturation_is_grey() {
        let (r, g, b) = Hsl::new(200.0, 0.0, 80.0).to_rgb();
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, 204);
    }

    #[test]
    fn blend_moves_quarter_way_at_quarter_alpha() {
        let mut c = Canvas::new(2, 2);
        c.set_global_alpha(0.25);
        c.fill_rect(0.0, 0.0, 2.0, 2.0, (200, 100, 40));
        for (x, y) in [(0, 0), (1, 1)] {
            let (r, g, b) = c.pixel(x, y).unwrap();
            assert!(r.abs_diff(50) <= 1, "red {r}");
            assert!(g.abs_diff(25) <= 1, "green {g}");
            assert!(b.abs_diff(10) <= 1, "blue {b}");
        }
    }

    #[test]
    fn thin_stroke_still_leaves_a_trace() {
        let mut c = Canvas::new(8, 8);
        c.set_stroke_color(Hsl::new(0.0, 0.0, 100.0));
        c.set_line_width(0.1);
        c.stroke_line(1.0, 3.5, 6.0, 3.5);
        let lit = (2..=4).any(|y| c.pixel(3, y).is_some_and(|(r, _, _)| r > 0));
        assert!(lit, "hairline left no coverage");
        assert_eq!(c.pixel(0, 0), Some((0, 0, 0)));
    }

    #[test]
    fn zero_size_canvas_has_no_pixmap() {
        let mut c = Canvas::new(0, 4);
        assert!(c.pixels().is_empty());
        c.fill_rect(0.0, 0.0, 4.0, 4.0, (255, 255, 255));
        c.stroke_line(0.0, 0.0, 3.0, 3.0);
        assert!(c.encode_png().is_err());
        c.resize(2, 2);
        assert_eq!(c.pixels().len(), 2 * 2 * 4);
    }
}
