//! Retained-mode recording backend.
//!
//! A [`Scene`] implements [`DrawContext`] by appending device-space
//! [`DrawCommand`]s instead of touching pixels, which makes a frame easy to
//! inspect.

use glam::DVec2;

use crate::color::Color;
use crate::config::{CssFont, LineCap};
use crate::surface::{DrawContext, Path, Segment, StateStack};

/// Average advance of one character, as a fraction of the font size.
const GLYPH_ADVANCE_EM: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear {
        origin: DVec2,
        width: f64,
        height: f64,
    },
    Arc {
        center: DVec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        line_width: f64,
        color: Color,
        cap: LineCap,
    },
    Line {
        from: DVec2,
        to: DVec2,
        line_width: f64,
        color: Color,
        cap: LineCap,
    },
    Text {
        origin: DVec2,
        text: String,
        font_size: f32,
        color: Color,
    },
}

#[derive(Debug, Clone)]
pub struct Scene {
    width: f64,
    height: f64,
    state: StateStack,
    path: Path,
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            state: StateStack::default(),
            path: Path::default(),
            commands: Vec::new(),
        }
    }

    fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands since the most recent clear, i.e. the last full frame.
    pub fn last_frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Clear { .. }))
            .unwrap_or(0);
        &self.commands[start..]
    }

    /// Number of clears recorded, one per rendered frame.
    pub fn frame_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear { .. }))
            .count()
    }

    /// Depth of the save stack; zero once every `save` has been restored.
    pub fn save_depth(&self) -> usize {
        self.state.depth()
    }
}

impl DrawContext for Scene {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
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
        let origin = self.state.to_device(x, y);
        self.add_command(DrawCommand::Clear {
            origin,
            width,
            height,
        });
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
        let state = self.state.current().clone();
        let strokes: Vec<DrawCommand> = self
            .path
            .segments()
            .iter()
            .map(|segment| match *segment {
                Segment::Arc {
                    center,
                    radius,
                    start,
                    end,
                } => DrawCommand::Arc {
                    center,
                    radius,
                    start_angle: start,
                    end_angle: end,
                    line_width: state.line_width,
                    color: state.stroke,
                    cap: state.line_cap,
                },
                Segment::Line { from, to } => DrawCommand::Line {
                    from,
                    to,
                    line_width: state.line_width,
                    color: state.stroke,
                    cap: state.line_cap,
                },
            })
            .collect();
        self.commands.extend(strokes);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let state = self.state.current();
        let command = DrawCommand::Text {
            origin: self.state.to_device(x, y),
            text: text.to_string(),
            font_size: state.font.size_px,
            color: state.fill,
        };
        self.add_command(command);
    }

    /// Approximates the width as half an em per character.
    fn measure_text(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.state.current().font.size_px as f64 * GLYPH_ADVANCE_EM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strokes_use_state_at_stroke_time() {
        let mut scene = Scene::new(100.0, 100.0);
        scene.translate(50.0, 50.0);
        scene.begin_path();
        scene.move_to(0.0, 0.0);
        scene.line_to(10.0, 0.0);
        scene.set_line_width(3.0);
        scene.set_stroke_color(Color::WHITE);
        scene.stroke();

        assert_eq!(
            scene.commands(),
            &[DrawCommand::Line {
                from: DVec2::new(50.0, 50.0),
                to: DVec2::new(60.0, 50.0),
                line_width: 3.0,
                color: Color::WHITE,
                cap: LineCap::Butt,
            }]
        );
    }

    #[test]
    fn last_frame_starts_at_latest_clear() {
        let mut scene = Scene::new(10.0, 10.0);
        scene.clear_rect(0.0, 0.0, 10.0, 10.0);
        scene.fill_text("a", 0.0, 0.0);
        scene.clear_rect(0.0, 0.0, 10.0, 10.0);
        scene.fill_text("b", 0.0, 0.0);

        assert_eq!(scene.frame_count(), 2);
        assert_eq!(scene.last_frame().len(), 2);
        assert!(matches!(
            &scene.last_frame()[1],
            DrawCommand::Text { text, .. } if text == "b"
        ));
    }

    #[test]
    fn measures_half_an_em_per_char() {
        let mut scene = Scene::new(10.0, 10.0);
        scene.set_font(&"20px Arial".parse().unwrap());
        assert_eq!(scene.measure_text("75%"), 30.0);
    }
}
