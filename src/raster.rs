//! Software rasterizer implementing [`DrawContext`] over an RGBA frame buffer
//! (the layout `pixels` hands out).

use std::f64::consts::TAU;

use glam::DVec2;
use rusttype::{point, Font, PositionedGlyph, Scale};
use tracing::trace;

use crate::color::Color;
use crate::config::{CssFont, LineCap};
use crate::surface::{DrawContext, Path, Segment, StateStack};

// ============================================================================
// CORE DATA TYPES
// ============================================================================

pub struct PixelCanvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
    font: Option<&'a Font<'static>>,
    background: Color,
    state: StateStack,
    path: Path,
}

impl<'a> PixelCanvas<'a> {
    /// Wraps a `width * height * 4` RGBA buffer.
    ///
    /// # Panics
    ///
    /// If `frame` is shorter than `width * height * 4` bytes.
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        let needed = width * height * 4;
        assert!(
            frame.len() >= needed,
            "frame buffer holds {} bytes, a {width}x{height} RGBA canvas needs {needed}",
            frame.len()
        );
        Self {
            frame,
            width,
            height,
            font: None,
            background: Color::WHITE,
            state: StateStack::default(),
            path: Path::default(),
        }
    }

    /// Font used for every `fill_text`; without one, text is skipped.
    pub fn with_font(mut self, font: Option<&'a Font<'static>>) -> Self {
        self.font = font;
        self
    }

    /// Color written by `clear_rect`.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let px = self.frame.get(idx..idx + 3)?;
        Some(Color::new(px[0], px[1], px[2]))
    }

    fn scale(&self) -> Scale {
        Scale::uniform(self.state.current().font.size_px)
    }
}

impl DrawContext for PixelCanvas<'_> {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn height(&self) -> f64 {
        self.height as f64
    }

    fn save(&mut self) {
        self.state.save();
    }

    fn restore(&mut self) {
        self.state.restore();
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.state.translate(x, y);
    }

    fn rotate(&mut self, angle: f64) {
        self.state.rotate(angle);
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.state.current_mut().stroke = color;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.state.current_mut().fill = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.current_mut().line_width = width;
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.current_mut().line_cap = cap;
    }

    fn set_font(&mut self, font: &CssFont) {
        self.state.current_mut().font = font.clone();
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let a = self.state.to_device(x, y);
        let b = self.state.to_device(x + width, y + height);
        let (min, max) = (a.min(b), a.max(b));
        let x0 = (min.x.floor().max(0.0) as usize).min(self.width);
        let y0 = (min.y.floor().max(0.0) as usize).min(self.height);
        let x1 = (max.x.ceil().max(0.0) as usize).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as usize).min(self.height);
        let (r, g, b) = self.background.as_tuple();
        for y in y0..y1 {
            let row = y * self.width * 4;
            for chunk in self.frame[row + x0 * 4..row + x1 * 4].chunks_exact_mut(4) {
                chunk.copy_from_slice(&[r, g, b, 0xff]);
            }
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        self.path.arc(&self.state, x, y, radius, start, end);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(&self.state, x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(&self.state, x, y);
    }

    fn stroke(&mut self) {
        let state = self.state.current();
        let pen = Pen {
            width: state.line_width,
            color: state.stroke,
            cap: state.line_cap,
        };
        let segments = self.path.segments().to_vec();
        let mut target = Target {
            frame: &mut *self.frame,
            width: self.width,
            height: self.height,
        };
        for segment in segments {
            match segment {
                Segment::Arc {
                    center,
                    radius,
                    start,
                    end,
                } => stroke_arc(&mut target, center, radius, start, end, &pen),
                Segment::Line { from, to } => stroke_line(&mut target, from, to, &pen),
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let Some(font) = self.font else {
            trace!(text, "no font loaded, skipping text");
            return;
        };
        let origin = self.state.to_device(x, y);
        let scale = self.scale();
        let color = self.state.current().fill;
        let mut target = Target {
            frame: &mut *self.frame,
            width: self.width,
            height: self.height,
        };
        draw_text(&mut target, origin, text, font, scale, color);
    }

    fn measure_text(&self, text: &str) -> f64 {
        match self.font {
            Some(font) => text_advance(text, font, self.scale()),
            None => 0.0,
        }
    }
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

struct Target<'f> {
    frame: &'f mut [u8],
    width: usize,
    height: usize,
}

struct Pen {
    width: f64,
    color: Color,
    cap: LineCap,
}

fn set_pixel(target: &mut Target, x: i64, y: i64, color: Color, alpha: f32) {
    if x < 0 || y < 0 || x as usize >= target.width || y as usize >= target.height {
        return;
    }
    let idx = (y as usize * target.width + x as usize) * 4;
    let src = [color.r as f32, color.g as f32, color.b as f32];
    let a = alpha.clamp(0.0, 1.0);
    let dst = &mut target.frame[idx..idx + 4];
    for channel in 0..3 {
        dst[channel] = (src[channel] * a + dst[channel] as f32 * (1.0 - a)).round() as u8;
    }
    dst[3] = 0xff;
}

/// Bounding box of a device-space region, clipped to the frame.
fn pixel_bounds(target: &Target, min: DVec2, max: DVec2) -> (i64, i64, i64, i64) {
    (
        (min.x.floor() as i64).max(0),
        (min.y.floor() as i64).max(0),
        (max.x.ceil() as i64).min(target.width as i64 - 1),
        (max.y.ceil() as i64).min(target.height as i64 - 1),
    )
}

/// Clockwise sweep from `start` to `end`, as a canvas measures it.
fn clockwise_sweep(start: f64, end: f64) -> f64 {
    if end - start >= TAU {
        TAU
    } else {
        (end - start).rem_euclid(TAU)
    }
}

fn stroke_arc(target: &mut Target, center: DVec2, radius: f64, start: f64, end: f64, pen: &Pen) {
    let sweep = clockwise_sweep(start, end);
    if sweep == 0.0 || radius < 0.0 {
        return;
    }
    let half = pen.width / 2.0;
    // Square caps extend the band by half the line width along the arc.
    let overhang = match pen.cap {
        LineCap::Square if radius > 0.0 => half / radius,
        _ => 0.0,
    };
    let reach = DVec2::splat(radius + half + 1.0);
    let (x0, y0, x1, y1) = pixel_bounds(target, center - reach, center + reach);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let offset = DVec2::new(x as f64 + 0.5, y as f64 + 0.5) - center;
            let dist = offset.length();
            let aa = 1.0 - ((dist - radius).abs() - half).clamp(0.0, 1.0);
            if aa <= 0.01 {
                continue;
            }
            let rel = (offset.y.atan2(offset.x) - start).rem_euclid(TAU);
            let in_arc = sweep >= TAU || rel <= sweep + overhang || rel >= TAU - overhang;
            if in_arc {
                set_pixel(target, x, y, pen.color, aa as f32);
            }
        }
    }
    if pen.cap == LineCap::Round && sweep < TAU {
        for angle in [start, start + sweep] {
            let tip = center + DVec2::new(angle.cos(), angle.sin()) * radius;
            draw_disc(target, tip, half, pen.color);
        }
    }
}

fn stroke_line(target: &mut Target, from: DVec2, to: DVec2, pen: &Pen) {
    let half = pen.width / 2.0;
    let dir = (to - from).normalize_or_zero();
    if dir == DVec2::ZERO {
        if pen.cap == LineCap::Round {
            draw_disc(target, from, half, pen.color);
        }
        return;
    }
    let (from, to) = match pen.cap {
        LineCap::Square => (from - dir * half, to + dir * half),
        _ => (from, to),
    };
    let d = to - from;
    let len_sq = d.length_squared();
    let pad = DVec2::splat(half + 1.0);
    let (x0, y0, x1, y1) = pixel_bounds(target, from.min(to) - pad, from.max(to) + pad);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
            let t_raw = (p - from).dot(d) / len_sq;
            if pen.cap != LineCap::Round && !(0.0..=1.0).contains(&t_raw) {
                continue;
            }
            let closest = from + d * t_raw.clamp(0.0, 1.0);
            let dist = (p - closest).length();
            let aa = (1.0 - (dist - half).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                set_pixel(target, x, y, pen.color, aa as f32);
            }
        }
    }
}

fn draw_disc(target: &mut Target, center: DVec2, radius: f64, color: Color) {
    let reach = DVec2::splat(radius + 1.0);
    let (x0, y0, x1, y1) = pixel_bounds(target, center - reach, center + reach);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dist = (DVec2::new(x as f64 + 0.5, y as f64 + 0.5) - center).length();
            let aa = 1.0 - (dist - radius).clamp(0.0, 1.0);
            if aa > 0.01 {
                set_pixel(target, x, y, color, aa as f32);
            }
        }
    }
}

// ============================================================================
// TEXT
// ============================================================================

fn layout(text: &str, font: &Font<'static>, scale: Scale, origin: DVec2) -> Vec<PositionedGlyph<'static>> {
    font.layout(text, scale, point(origin.x as f32, origin.y as f32))
        .collect()
}

/// Advance width of `text`, matching what a canvas `measureText` reports.
fn text_advance(text: &str, font: &Font<'static>, scale: Scale) -> f64 {
    let glyphs = layout(text, font, scale, DVec2::ZERO);
    match (glyphs.first(), glyphs.last()) {
        (Some(first), Some(last)) => (last.position().x - first.position().x
            + last.unpositioned().h_metrics().advance_width) as f64,
        _ => 0.0,
    }
}

/// Rasterizes `text` with its baseline starting at `origin`.
fn draw_text(
    target: &mut Target,
    origin: DVec2,
    text: &str,
    font: &Font<'static>,
    scale: Scale,
    color: Color,
) {
    for glyph in layout(text, font, scale, origin) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = bb.min.x as i64 + gx as i64;
                let py = bb.min.y as i64 + gy as i64;
                set_pixel(target, px, py, color, v);
            });
        }
    }
}
