//! The 2D immediate-mode drawing context the gauge renders through, plus the
//! bookkeeping (state stack, current path) shared by the backends.

use std::collections::HashMap;

use glam::{DAffine2, DVec2};

use crate::color::Color;
use crate::config::{CssFont, LineCap};

// ============================================================================
// DRAWING CONTEXT
// ============================================================================

/// Canvas-style drawing context.
///
/// Angles are in radians and grow clockwise from the positive x axis; y grows
/// downward. Coordinates passed to path and text calls are in the local frame
/// set up by `translate`/`rotate`.
pub trait DrawContext {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);

    fn set_stroke_color(&mut self, color: Color);
    fn set_fill_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_font(&mut self, font: &CssFont);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn begin_path(&mut self);
    /// Adds a clockwise arc around `(x, y)` from `start` to `end`.
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn stroke(&mut self);

    /// Draws `text` with its left edge at `x` and its baseline at `y`.
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn measure_text(&self, text: &str) -> f64;
}

/// Looks up drawing surfaces by identifier.
pub trait SurfaceProvider {
    fn surface(&mut self, id: &str) -> Option<&mut dyn DrawContext>;
}

impl<C: DrawContext> SurfaceProvider for HashMap<String, C> {
    fn surface(&mut self, id: &str) -> Option<&mut dyn DrawContext> {
        self.get_mut(id).map(|ctx| ctx as &mut dyn DrawContext)
    }
}

/// A provider holding exactly one surface.
#[derive(Debug)]
pub struct NamedSurface<C> {
    id: String,
    context: C,
}

impl<C: DrawContext> NamedSurface<C> {
    pub fn new(id: impl Into<String>, context: C) -> Self {
        Self {
            id: id.into(),
            context,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_inner(self) -> C {
        self.context
    }
}

impl<C: DrawContext> SurfaceProvider for NamedSurface<C> {
    fn surface(&mut self, id: &str) -> Option<&mut dyn DrawContext> {
        if id == self.id {
            Some(&mut self.context)
        } else {
            None
        }
    }
}

// ============================================================================
// SHARED BACKEND STATE
// ============================================================================

/// Everything `save`/`restore` covers.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawState {
    pub transform: DAffine2,
    pub stroke: Color,
    pub fill: Color,
    pub line_width: f64,
    pub line_cap: LineCap,
    pub font: CssFont,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: DAffine2::IDENTITY,
            stroke: Color::BLACK,
            fill: Color::BLACK,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            font: CssFont {
                size_px: 10.0,
                family: "sans-serif".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StateStack {
    current: DrawState,
    saved: Vec<DrawState>,
}

impl StateStack {
    pub fn current(&self) -> &DrawState {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut DrawState {
        &mut self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Unbalanced restores are ignored, as on a canvas.
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.current = state;
        }
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.current.transform =
            self.current.transform * DAffine2::from_translation(DVec2::new(x, y));
    }

    pub fn rotate(&mut self, angle: f64) {
        self.current.transform = self.current.transform * DAffine2::from_angle(angle);
    }

    /// Maps a local point to device space.
    pub fn to_device(&self, x: f64, y: f64) -> DVec2 {
        self.current.transform.transform_point2(DVec2::new(x, y))
    }

    /// Rotation of the local frame relative to the device.
    pub fn rotation(&self) -> f64 {
        let x_axis = self.current.transform.matrix2.x_axis;
        x_axis.y.atan2(x_axis.x)
    }
}

/// A path segment, already mapped to device space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Arc {
        center: DVec2,
        radius: f64,
        start: f64,
        end: f64,
    },
    Line {
        from: DVec2,
        to: DVec2,
    },
}

/// The path under construction between `begin_path` and `stroke`.
#[derive(Debug, Clone, Default)]
pub struct Path {
    segments: Vec<Segment>,
    cursor: Option<DVec2>,
}

impl Path {
    pub fn clear(&mut self) {
        self.segments.clear();
        self.cursor = None;
    }

    pub fn arc(&mut self, state: &StateStack, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        let rotation = state.rotation();
        let (start, end) = (start + rotation, end + rotation);
        let center = state.to_device(x, y);
        self.segments.push(Segment::Arc {
            center,
            radius,
            start,
            end,
        });
        self.cursor = Some(center + DVec2::new(end.cos(), end.sin()) * radius);
    }

    pub fn move_to(&mut self, state: &StateStack, x: f64, y: f64) {
        self.cursor = Some(state.to_device(x, y));
    }

    pub fn line_to(&mut self, state: &StateStack, x: f64, y: f64) {
        let to = state.to_device(x, y);
        if let Some(from) = self.cursor {
            self.segments.push(Segment::Line { from, to });
        }
        self.cursor = Some(to);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}
