use std::error::Error;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arcgauge::{
    draw_gauge, Color, FrameHandle, FrameHost, FrameObserver, GaugeError, GaugeOptions, GaugeTask,
    ImmediateFrames, NamedSurface, Phase, PixelCanvas,
};
use clap::Parser;
use pixels::{Pixels, SurfaceTexture};
use rand::Rng;
use rusttype::Font;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

const SURFACE_ID: &str = "gauge";

#[derive(Parser, Debug)]
#[command(version, about = "Animated circular progress gauge")]
struct Cli {
    /// Target percent; random 0..=100 when omitted
    #[arg(short, long, allow_hyphen_values = true)]
    percent: Option<i32>,

    #[arg(short, long)]
    label: Option<String>,

    /// Show tick marks
    #[arg(long)]
    ticks: bool,

    /// Gauge options as JSON, e.g. '{"lineCap": "butt", "color": {"0": "#333"}}'
    #[arg(long, conflicts_with = "options_file")]
    options: Option<String>,

    /// Read gauge options from a JSON file
    #[arg(long)]
    options_file: Option<PathBuf>,

    #[arg(long, default_value_t = 300)]
    width: u32,

    #[arg(long, default_value_t = 300)]
    height: u32,

    /// TTF/OTF font for the percent and label; text is skipped without one
    #[arg(long)]
    font: Option<PathBuf>,

    /// Background color behind the gauge
    #[arg(long, default_value = "#ffffff")]
    background: Color,

    /// Animation frames per second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Render the final frame to this PNG instead of opening a window
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if !cli.fps.is_finite() || cli.fps <= 0.0 {
        return Err(format!("--fps must be positive, got {}", cli.fps).into());
    }
    let options = gauge_options(&cli)?;
    let font = load_font(cli.font.as_deref())?;
    let percent = cli
        .percent
        .unwrap_or_else(|| rand::rng().random_range(0..=100));

    match &cli.output {
        Some(path) => render_png(&cli, &options, percent, font.as_ref(), path),
        None => run_window(&cli, options, percent, font.as_ref()),
    }
}

/// JSON options first, then the dedicated flags on top.
fn gauge_options(cli: &Cli) -> Result<GaugeOptions, Box<dyn Error>> {
    let mut options = match (&cli.options, &cli.options_file) {
        (Some(json), _) => GaugeOptions::from_json(json)?,
        (None, Some(path)) => GaugeOptions::from_json(&fs::read_to_string(path)?)?,
        (None, None) => GaugeOptions::default(),
    };
    if let Some(label) = &cli.label {
        options.label = Some(label.clone());
    }
    if cli.ticks {
        options.show_tick_mark = Some(true);
    }
    Ok(options)
}

fn load_font(path: Option<&Path>) -> Result<Option<Font<'static>>, Box<dyn Error>> {
    let Some(path) = path else {
        warn!("no --font given, percent and label text will not be drawn");
        return Ok(None);
    };
    let data = fs::read(path)?;
    let font = Font::try_from_vec(data)
        .ok_or_else(|| format!("{} is not a usable TTF/OTF font", path.display()))?;
    info!(path = %path.display(), "loaded font");
    Ok(Some(font))
}

// ============================================================================
// HEADLESS
// ============================================================================

fn render_png(
    cli: &Cli,
    options: &GaugeOptions,
    percent: i32,
    font: Option<&Font<'static>>,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let (width, height) = (cli.width as usize, cli.height as usize);
    let mut buffer = vec![0u8; width * height * 4];

    let canvas = PixelCanvas::new(&mut buffer, width, height)
        .with_font(font)
        .with_background(cli.background);
    let mut surface = NamedSurface::new(SURFACE_ID, canvas);
    let mut frames = ImmediateFrames::new();
    let mut task = draw_gauge(&mut surface, &mut frames, SURFACE_ID, percent, options, None)?;
    let rendered = task.run_to_completion(&mut surface, &mut frames)?;
    drop(surface);

    let mut encoder = png::Encoder::new(BufWriter::new(File::create(path)?), cli.width, cli.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.write_header()?.write_image_data(&buffer)?;

    info!(frames = rendered, path = %path.display(), "wrote final frame");
    Ok(())
}

// ============================================================================
// WINDOW
// ============================================================================

/// Turns requested frames into `request_redraw` calls, throttled to the
/// target frame rate by the event loop.
struct RedrawHost {
    window: Arc<Window>,
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl FrameHost for RedrawHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle::new(self.next_id);
        self.next_id += 1;
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

fn run_window(
    cli: &Cli,
    options: GaugeOptions,
    percent: i32,
    font: Option<&Font<'static>>,
) -> Result<(), Box<dyn Error>> {
    let (width, height) = (cli.width as usize, cli.height as usize);
    let title = match &cli.label {
        Some(label) => format!("{label} - arcgauge"),
        None => "arcgauge".to_string(),
    };

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(&title)
        .with_inner_size(LogicalSize::new(cli.width as f64, cli.height as f64))
        .with_resizable(false)
        .build(&event_loop)?;
    let window = Arc::new(window);

    let size = window.inner_size();
    let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
    let mut pixels = Pixels::new(cli.width, cli.height, surface_texture)?;

    let title_window = Arc::clone(&window);
    let mut observer: Option<FrameObserver> = Some(Box::new(move |shown| {
        title_window.set_title(&format!("{title} ({shown}%)"));
    }));

    let mut host = RedrawHost {
        window: Arc::clone(&window),
        next_id: 0,
        pending: None,
    };
    let mut task: Option<GaugeTask> = None;
    let mut failure: Option<GaugeError> = None;
    let failure_slot = &mut failure;
    let background = cli.background;

    let frame_duration = Duration::from_secs_f64(1.0 / cli.fps);
    let mut last_frame = Instant::now();
    let mut due = false;
    window.request_redraw();

    event_loop.run(move |event, window_target| {
        window_target.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    if let Some(task) = task.as_mut() {
                        task.cancel(&mut host);
                    }
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    let _ = pixels.resize_surface(new_size.width, new_size.height);
                }
                WindowEvent::RedrawRequested => {
                    let canvas = PixelCanvas::new(pixels.frame_mut(), width, height)
                        .with_font(font)
                        .with_background(background);
                    let mut surface = NamedSurface::new(SURFACE_ID, canvas);

                    let step = match task {
                        Some(ref mut running) if due => {
                            due = false;
                            host.pending = None;
                            running.resume(&mut surface, &mut host).map(|phase| {
                                if phase == Phase::Done {
                                    info!(percent, "gauge reached its target");
                                }
                            })
                        }
                        // Expose or resize: the buffer still holds the last frame.
                        Some(_) => Ok(()),
                        None => match draw_gauge(
                            &mut surface,
                            &mut host,
                            SURFACE_ID,
                            percent,
                            &options,
                            observer.take(),
                        ) {
                            Ok(started) => {
                                task = Some(started);
                                Ok(())
                            }
                            Err(err) => Err(err),
                        },
                    };
                    drop(surface);

                    if let Err(err) = step {
                        error!(%err, "gauge failed");
                        *failure_slot = Some(err);
                        window_target.exit();
                        return;
                    }
                    if let Err(err) = pixels.render() {
                        error!(%err, "pixels render failed");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if host.pending.is_some() && !due && last_frame.elapsed() >= frame_duration {
                    due = true;
                    host.window.request_redraw();
                    last_frame = Instant::now();
                }
            }
            _ => {}
        }
    })?;

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
