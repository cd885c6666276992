//! Arc and tick-mark primitives. Both draw around the local origin and leave
//! the context state as they found it.

use std::f64::consts::FRAC_PI_2;

use crate::color::Color;
use crate::config::LineCap;
use crate::surface::DrawContext;

/// Strokes an arc of radius `radius - line_width` from `start` to `end`.
pub fn draw_arc(
    ctx: &mut dyn DrawContext,
    radius: f64,
    start: f64,
    end: f64,
    line_width: f64,
    color: Color,
    cap: LineCap,
) {
    ctx.save();
    ctx.set_stroke_color(color);
    ctx.set_line_width(line_width);
    ctx.set_line_cap(cap);
    ctx.begin_path();
    ctx.arc(0.0, 0.0, radius - line_width, start, end);
    ctx.stroke();
    ctx.restore();
}

/// One pass of tick marks: the first `active` of `total` evenly spaced ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickRun {
    pub total: u32,
    pub active: u32,
    /// Outer end of each tick.
    pub radius: f64,
    pub start: f64,
    pub end: f64,
    pub width: f64,
    pub height: f64,
    pub color: Color,
    pub cap: LineCap,
    pub fixup: f64,
}

impl TickRun {
    pub fn gap(&self) -> f64 {
        tick_gap(self.total, self.start, self.end, self.fixup)
    }
}

/// Angle between neighbouring ticks. `fixup` is part of every gap.
pub fn tick_gap(total: u32, start: f64, end: f64, fixup: f64) -> f64 {
    (end - start).abs() / total as f64 + fixup
}

/// Absolute angle of tick `index`.
pub fn tick_angle(start: f64, gap: f64, index: u32) -> f64 {
    start + index as f64 * gap
}

/// Draws the run in a rotating frame: one turn to face `start`, then one
/// `gap` turn after every tick, so tick N ends up at `start + N * gap`.
pub fn draw_tick_marks(ctx: &mut dyn DrawContext, run: &TickRun) {
    let gap = run.gap();
    let inner = run.radius - run.height;
    ctx.save();
    // Local +y points along `start` after this turn.
    ctx.rotate(-FRAC_PI_2 + run.start);
    for _ in 0..run.active.min(run.total) {
        ctx.set_stroke_color(run.color);
        ctx.set_line_width(run.width);
        ctx.set_line_cap(run.cap);
        ctx.begin_path();
        ctx.move_to(0.0, run.radius);
        ctx.line_to(0.0, inner);
        ctx.stroke();
        ctx.rotate(gap);
    }
    ctx.restore();
}

/// `ceil(percent / 100 * total)`, computed exactly.
pub fn active_tick_count(percent: u32, total: u32) -> u32 {
    (u64::from(percent) * u64::from(total)).div_ceil(100) as u32
}

/// End angle of the progress arc for `percent` of the sweep.
pub fn progress_end_angle(start: f64, end: f64, percent: u32) -> f64 {
    start + (percent as f64 / 100.0) * (end - start).abs()
}
