//! Animated circular progress gauges.
//!
//! [`draw_gauge`] resolves [`GaugeOptions`] against a surface, draws the first
//! frame and hands back a [`GaugeTask`] that counts the gauge up one percent
//! per frame. Anything implementing [`DrawContext`] can be drawn on: the
//! [`PixelCanvas`] software rasterizer (used with `pixels`) or the recording
//! [`Scene`].
//!
//! ```
//! use std::collections::HashMap;
//! use arcgauge::{draw_gauge, GaugeOptions, ImmediateFrames, Scene};
//!
//! let mut surfaces = HashMap::from([("cpu".to_string(), Scene::new(300.0, 300.0))]);
//! let mut frames = ImmediateFrames::new();
//! let options = GaugeOptions::builder().label("CPU").show_tick_mark(true).build();
//!
//! let mut task = draw_gauge(&mut surfaces, &mut frames, "cpu", 75, &options, None)?;
//! assert_eq!(task.run_to_completion(&mut surfaces, &mut frames)?, 76);
//! # Ok::<(), arcgauge::GaugeError>(())
//! ```

// ============================================================================
// MODULES
// ============================================================================

pub mod color;
pub mod config;
pub mod error;
pub mod gauge;
pub mod geometry;
pub mod raster;
pub mod scene;
pub mod scheduler;
pub mod surface;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use color::{Color, ColorBands};
pub use config::{ArcStyle, CssFont, GaugeConfig, GaugeOptions, LineCap, TickMarkStyle};
pub use error::{GaugeError, Result};
pub use gauge::{draw_gauge, render_frame, FrameObserver, GaugeAnimation, GaugeTask};
pub use raster::PixelCanvas;
pub use scene::{DrawCommand, Scene};
pub use scheduler::{Animation, CancelToken, FrameHandle, FrameHost, FrameTask, ImmediateFrames, Phase};
pub use surface::{DrawContext, NamedSurface, SurfaceProvider};
