//! The gauge itself: one render pass at a given percent, and the count-up
//! animation that drives it frame by frame.

use std::fmt;

use tracing::{debug, info, warn};

use crate::color::Color;
use crate::config::{CssFont, GaugeConfig, GaugeOptions, ARC_CAP};
use crate::error::{GaugeError, Result};
use crate::geometry::{active_tick_count, draw_arc, draw_tick_marks, progress_end_angle, TickRun};
use crate::scheduler::{Animation, FrameHost, FrameTask, ImmediateFrames, Phase};
use crate::surface::{DrawContext, SurfaceProvider};

/// Called after every rendered frame with the percent it showed.
pub type FrameObserver = Box<dyn FnMut(i32)>;

// ============================================================================
// RENDERING
// ============================================================================

/// Clears the surface and draws the whole gauge at `percent`.
///
/// Percents at or below zero show only the cover; percents above 100 are
/// drawn as 100.
pub fn render_frame(ctx: &mut dyn DrawContext, config: &GaugeConfig, percent: i32) {
    let (width, height) = (ctx.width(), ctx.height());
    ctx.save();
    ctx.clear_rect(0.0, 0.0, width, height);
    ctx.translate(config.cx, config.cy - config.arc.line_width / 2.0);

    if !config.label.is_empty() {
        draw_centered_text(
            ctx,
            &config.label,
            &config.label_font,
            config.label_offset_top,
        );
    }
    draw_cover(ctx, config);
    draw_progress(ctx, config, percent);
    ctx.restore();
}

fn draw_centered_text(ctx: &mut dyn DrawContext, text: &str, font: &CssFont, offset_top: f64) {
    ctx.save();
    ctx.set_font(font);
    ctx.set_fill_color(Color::BLACK);
    let width = ctx.measure_text(text);
    ctx.fill_text(text, -width / 2.0, offset_top);
    ctx.restore();
}

fn tick_run(config: &GaugeConfig, active: u32, color: Color) -> TickRun {
    TickRun {
        total: config.tick_mark.number,
        active,
        radius: config.tick_radius(),
        start: config.start_angle,
        end: config.end_angle,
        width: config.tick_mark.width,
        height: config.tick_mark.height,
        color,
        cap: config.line_cap,
        fixup: config.tick_mark.fixed,
    }
}

/// Full-sweep background arc plus every tick, in the default color.
fn draw_cover(ctx: &mut dyn DrawContext, config: &GaugeConfig) {
    draw_arc(
        ctx,
        config.arc_radius(),
        config.start_angle,
        config.end_angle,
        config.arc.line_width,
        config.default_color,
        ARC_CAP,
    );
    if config.show_tick_mark {
        let run = tick_run(config, config.tick_mark.number, config.default_color);
        draw_tick_marks(ctx, &run);
    }
}

fn draw_progress(ctx: &mut dyn DrawContext, config: &GaugeConfig, percent: i32) {
    if percent <= 0 {
        if config.show_percent {
            draw_centered_text(ctx, "0%", &config.percent_font, config.percent_offset_top);
        }
        return;
    }

    let percent = percent.min(100) as u32;
    let end = progress_end_angle(config.start_angle, config.end_angle, percent);
    let active = active_tick_count(percent, config.tick_mark.number);
    let color = config.color.select(percent, config.default_color);

    if config.show_percent {
        draw_centered_text(
            ctx,
            &format!("{percent}%"),
            &config.percent_font,
            config.percent_offset_top,
        );
    }
    draw_arc(
        ctx,
        config.arc_radius(),
        config.start_angle,
        end,
        config.arc.line_width,
        color,
        ARC_CAP,
    );
    if config.show_tick_mark {
        draw_tick_marks(ctx, &tick_run(config, active, color));
    }
}

// ============================================================================
// ANIMATION
// ============================================================================

/// Counts from 0 up to the target, one percent per frame.
pub struct GaugeAnimation {
    surface_id: String,
    config: GaugeConfig,
    target: i32,
    current: i32,
    observer: Option<FrameObserver>,
}

impl GaugeAnimation {
    pub fn new(
        surface_id: impl Into<String>,
        config: GaugeConfig,
        target: i32,
        observer: Option<FrameObserver>,
    ) -> Self {
        Self {
            surface_id: surface_id.into(),
            config,
            target,
            current: 0,
            observer,
        }
    }

    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }

    pub fn config(&self) -> &GaugeConfig {
        &self.config
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    /// Percent shown by the most recent frame.
    pub fn current(&self) -> i32 {
        self.current
    }
}

impl fmt::Debug for GaugeAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaugeAnimation")
            .field("surface_id", &self.surface_id)
            .field("target", &self.target)
            .field("current", &self.current)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Animation for GaugeAnimation {
    fn render(&mut self, ctx: &mut dyn DrawContext) {
        render_frame(ctx, &self.config, self.current);
        debug!(surface = %self.surface_id, percent = self.current, "rendered frame");
        if let Some(observer) = self.observer.as_mut() {
            observer(self.current);
        }
    }

    fn advance(&mut self) -> bool {
        if self.current < self.target {
            self.current += 1;
            true
        } else {
            false
        }
    }
}

pub type GaugeTask = FrameTask<GaugeAnimation>;

impl FrameTask<GaugeAnimation> {
    /// Runs the frame the host just fired.
    ///
    /// If the surface has gone away the task is cancelled and the error
    /// returned.
    pub fn resume(
        &mut self,
        surfaces: &mut dyn SurfaceProvider,
        host: &mut dyn FrameHost,
    ) -> Result<Phase> {
        if self.phase() == Phase::Done {
            return Ok(Phase::Done);
        }
        let id = self.animation().surface_id().to_string();
        match surfaces.surface(&id) {
            Some(ctx) => Ok(self.run_frame(ctx, host)),
            None => {
                warn!(surface = %id, "surface disappeared, cancelling animation");
                self.cancel(host);
                Err(GaugeError::SurfaceUnavailable { id })
            }
        }
    }

    /// Fires queued frames until the animation finishes. Returns the number
    /// of frames rendered in total.
    pub fn run_to_completion(
        &mut self,
        surfaces: &mut dyn SurfaceProvider,
        frames: &mut ImmediateFrames,
    ) -> Result<u64> {
        while self.phase() != Phase::Done && frames.fire().is_some() {
            self.resume(surfaces, frames)?;
        }
        Ok(self.frames_rendered())
    }
}

/// Starts a gauge animation on surface `surface_id`.
///
/// The first frame (0%) is drawn before this returns; the host then fires one
/// frame per percent until `percent` is reached. `options` override the
/// defaults for the surface's size.
pub fn draw_gauge(
    surfaces: &mut dyn SurfaceProvider,
    host: &mut dyn FrameHost,
    surface_id: &str,
    percent: i32,
    options: &GaugeOptions,
    observer: Option<FrameObserver>,
) -> Result<GaugeTask> {
    let Some(ctx) = surfaces.surface(surface_id) else {
        warn!(surface = %surface_id, "no such surface");
        return Err(GaugeError::SurfaceUnavailable {
            id: surface_id.to_string(),
        });
    };

    let defaults = GaugeConfig::defaults(ctx.width(), ctx.height());
    let config = GaugeConfig::resolve(&defaults, options)?;
    if percent > 100 {
        warn!(percent, "target above 100%, frames past 100 redraw the full gauge");
    }
    info!(
        surface = %surface_id,
        percent,
        width = ctx.width(),
        height = ctx.height(),
        "starting gauge"
    );

    let mut task = FrameTask::new(GaugeAnimation::new(surface_id, config, percent, observer));
    task.run_frame(ctx, host);
    Ok(task)
}
