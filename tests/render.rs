use arcgauge::{
    draw_gauge, Color, DrawContext, GaugeOptions, ImmediateFrames, NamedSurface, PixelCanvas,
};

const RED: Color = Color::new(0xfc, 0x39, 0x1e);
const BLUE: Color = Color::new(0x4c, 0xa3, 0xfc);
const GRAY: Color = Color::new(0xe5, 0xe5, 0xe5);

const SIZE: usize = 300;

/// Renders a gauge to completion into a fresh RGBA buffer.
fn render(percent: i32, options: &GaugeOptions) -> Vec<u8> {
    let mut buffer = vec![0u8; SIZE * SIZE * 4];
    let mut surface = NamedSurface::new("gauge", PixelCanvas::new(&mut buffer, SIZE, SIZE));
    let mut frames = ImmediateFrames::new();
    let mut task = draw_gauge(&mut surface, &mut frames, "gauge", percent, options, None).unwrap();
    task.run_to_completion(&mut surface, &mut frames).unwrap();
    buffer
}

fn pixel(buffer: &[u8], x: usize, y: usize) -> Color {
    let idx = (y * SIZE + x) * 4;
    Color::new(buffer[idx], buffer[idx + 1], buffer[idx + 2])
}

// With the defaults on 300x300 the center sits at (150, 144) and the band is
// centered on radius 136.

#[test]
fn full_gauge_paints_the_whole_band() {
    let buffer = render(100, &GaugeOptions::default());
    assert_eq!(pixel(&buffer, 286, 144), BLUE);
    assert_eq!(pixel(&buffer, 13, 144), BLUE);
    assert_eq!(pixel(&buffer, 150, 280), BLUE);
    // Inside and outside the ring stay background.
    assert_eq!(pixel(&buffer, 150, 150), Color::WHITE);
    assert_eq!(pixel(&buffer, 2, 2), Color::WHITE);
}

#[test]
fn half_gauge_leaves_the_left_side_uncovered() {
    let buffer = render(50, &GaugeOptions::default());
    assert_eq!(pixel(&buffer, 286, 144), RED);
    assert_eq!(pixel(&buffer, 13, 144), GRAY);
}

#[test]
fn zero_shows_only_the_cover() {
    let buffer = render(0, &GaugeOptions::default());
    assert_eq!(pixel(&buffer, 286, 144), GRAY);
    assert_eq!(pixel(&buffer, 150, 8), GRAY);
}

#[test]
fn every_pixel_is_opaque_after_a_frame() {
    let buffer = render(10, &GaugeOptions::default());
    assert!(buffer.chunks_exact(4).all(|px| px[3] == 0xff));
}

#[test]
fn custom_default_color_reaches_the_cover() {
    let options = GaugeOptions::builder().default_color("#102030").build();
    let buffer = render(0, &options);
    assert_eq!(pixel(&buffer, 13, 144), Color::new(0x10, 0x20, 0x30));
}

#[test]
fn canvas_without_font_measures_nothing() {
    let mut buffer = vec![0u8; 4 * 4 * 4];
    let canvas = PixelCanvas::new(&mut buffer, 4, 4);
    assert_eq!(canvas.measure_text("100%"), 0.0);
    assert_eq!(canvas.width(), 4.0);
}
