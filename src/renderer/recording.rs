//! Headless surface that records draw calls
//!
//! Used by the native binary and tests. Clearing drops everything drawn
//! so far, like clearing a real raster.

use glam::Vec2;

use super::{Rect, Shadow, Surface};
use crate::color::Hsla;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Save,
    Restore,
    Translate(Vec2),
    Rotate(f32),
    Alpha(f32),
    Blur(f32),
    Shadow(Option<Shadow>),
    FillRect { rect: Rect, color: Hsla },
    StrokeRect { rect: Rect, color: Hsla, width: f32 },
    Text { text: String, pos: Vec2, font_px: f32, color: Hsla },
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Vec2,
    commands: Vec<DrawCommand>,
    clears: u64,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
            clears: 0,
        }
    }

    /// Commands since the last clear
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Labels drawn since the last clear, in draw order
    pub fn labels(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> u64 {
        self.clears
    }

    /// Nothing drawn since the last clear
    pub fn is_blank(&self) -> bool {
        self.commands
            .iter()
            .all(|c| !matches!(c, DrawCommand::FillRect { .. } | DrawCommand::Text { .. }))
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
        self.commands.clear();
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
        self.clears += 1;
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::Translate(Vec2::new(x, y)));
    }

    fn rotate(&mut self, radians: f32) {
        self.commands.push(DrawCommand::Rotate(radians));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCommand::Alpha(alpha));
    }

    fn set_blur(&mut self, px: f32) {
        self.commands.push(DrawCommand::Blur(px));
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.commands.push(DrawCommand::Shadow(shadow));
    }

    fn fill_rect(&mut self, rect: Rect, color: Hsla) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Hsla, width: f32) {
        self.commands.push(DrawCommand::StrokeRect { rect, color, width });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_px: f32, color: Hsla) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos: Vec2::new(x, y),
            font_px,
            color,
        });
    }
}
