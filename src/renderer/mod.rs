//! Dual-layer rendering
//!
//! Blocks are split by size onto two stacked surfaces: normal blocks on the
//! lower one, giants on the upper one with a soft blur. Both are cleared and
//! redrawn every frame; there is no depth buffer, layering fakes depth.

pub mod block;
#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod recording;

pub use block::{draw_block, label_font_px};
#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;
pub use recording::{DrawCommand, RecordingSurface};

use glam::Vec2;

use crate::color::{block_opacity, color_for_scale};
use crate::consts::{DEFAULT_ACCENT, OCCLUSION_DIM_ALPHA};
use crate::cull_margin;
use crate::sim::{Block, EngineState};

/// Axis-aligned rectangle in the current (possibly rotated) frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Drop shadow applied to subsequent draws
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: crate::color::Hsla,
    pub blur: f32,
    pub offset: Vec2,
}

/// A 2D raster target with Canvas2D-style state
pub trait Surface {
    /// Size in pixels
    fn size(&self) -> Vec2;
    fn resize(&mut self, width: f32, height: f32);
    fn clear(&mut self);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn rotate(&mut self, radians: f32);

    fn set_alpha(&mut self, alpha: f32);
    /// Gaussian blur radius for subsequent draws; 0 disables
    fn set_blur(&mut self, px: f32);
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    fn fill_rect(&mut self, rect: Rect, color: crate::color::Hsla);
    fn stroke_rect(&mut self, rect: Rect, color: crate::color::Hsla, width: f32);
    /// Text centered on (x, y)
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_px: f32, color: crate::color::Hsla);
}

/// Split blocks into (normal, giant) by their resting scale
pub fn partition(blocks: &[Block], giant_threshold: f32) -> (Vec<&Block>, Vec<&Block>) {
    blocks
        .iter()
        .partition(|block| !block.is_giant(giant_threshold))
}

/// Block center lies inside the reach of a strictly larger block
fn is_occluded(block: &Block, others: &[Block], cell_size: f32) -> bool {
    others.iter().any(|other| {
        other.id != block.id
            && other.base_scale() > block.base_scale()
            && other.pos.distance(block.pos) < cull_margin(other.base_scale(), cell_size) * 0.5
    })
}

fn draw_layer<S: Surface>(surface: &mut S, blocks: &[&Block], state: &EngineState) {
    let settings = &state.settings;
    let bevel = settings.quality.bevel_enabled();

    for block in blocks {
        let mut alpha = block_opacity(block, state.clock_ms, settings);
        if settings.occlusion_dimming
            && !block.is_giant(settings.giant_threshold)
            && is_occluded(block, &state.blocks, settings.cell_size)
        {
            alpha *= OCCLUSION_DIM_ALPHA;
        }
        if alpha <= 0.0 {
            continue;
        }

        let hex = block.token.color_hex.as_deref().unwrap_or(DEFAULT_ACCENT);
        let color = color_for_scale(hex, block.base_scale(), settings.giant_threshold);
        draw_block(surface, block, color, alpha, settings, bevel);
    }
}

/// Clear both layers and draw the arena onto them
pub fn render_layers<S: Surface>(lower: &mut S, upper: &mut S, state: &EngineState) {
    lower.clear();
    upper.clear();

    let (normal, giant) = partition(&state.blocks, state.settings.giant_threshold);

    draw_layer(lower, &normal, state);

    upper.save();
    upper.set_blur(state.settings.effective_blur_px());
    draw_layer(upper, &giant, state);
    upper.restore();
}

/// Clear both layers without drawing
pub fn clear_layers<S: Surface>(lower: &mut S, upper: &mut S) {
    lower.clear();
    upper.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{EngineSettings, QualityPreset};
    use crate::sim::{BlockPhase, Shape, TETROMINOES, TechToken};
    use std::rc::Rc;

    fn block(id: u32, scale: f32, pos: Vec2) -> Block {
        Block {
            id,
            pos,
            vel: Vec2::ZERO,
            shape: Shape::from_rows(TETROMINOES[1]),
            scale,
            original_scale: scale,
            rotation: 0.5,
            rotation_speed: 0.0,
            phase: BlockPhase::Falling,
            explosion_start_ms: None,
            token: Rc::new(TechToken::new("rust").with_color("#dea584")),
        }
    }

    fn state_with(blocks: Vec<Block>) -> EngineState {
        let mut state = EngineState::new(1, EngineSettings::default(), &[]);
        state.bounds = Vec2::new(800.0, 600.0);
        state.blocks = blocks;
        state
    }

    fn surfaces() -> (RecordingSurface, RecordingSurface) {
        (
            RecordingSurface::new(800.0, 600.0),
            RecordingSurface::new(800.0, 600.0),
        )
    }

    #[test]
    fn test_partition_by_threshold() {
        let blocks = vec![
            block(1, 0.5, Vec2::ZERO),
            block(2, 2.5, Vec2::ZERO),
            block(3, 3.2, Vec2::ZERO),
        ];
        let (normal, giant) = partition(&blocks, 2.5);
        assert_eq!(normal.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(giant.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_layers_get_their_blocks() {
        let state = state_with(vec![
            block(1, 1.0, Vec2::new(100.0, 100.0)),
            block(2, 3.5, Vec2::new(400.0, 300.0)),
        ]);
        let (mut lower, mut upper) = surfaces();
        render_layers(&mut lower, &mut upper, &state);

        assert_eq!(lower.labels(), vec!["rust"]);
        assert_eq!(upper.labels(), vec!["rust"]);
        assert!(!lower.commands().iter().any(|c| matches!(c, DrawCommand::Blur(px) if *px > 0.0)));
        assert!(upper.commands().iter().any(|c| matches!(c, DrawCommand::Blur(px) if *px > 0.0)));
    }

    #[test]
    fn test_giant_layer_translucent() {
        let state = state_with(vec![block(1, 3.5, Vec2::new(400.0, 300.0))]);
        let (mut lower, mut upper) = surfaces();
        render_layers(&mut lower, &mut upper, &state);
        let alpha = upper
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::Alpha(a) => Some(*a),
                _ => None,
            })
            .expect("alpha set");
        assert!(alpha < 1.0);
    }

    #[test]
    fn test_low_quality_no_blur() {
        let mut state = state_with(vec![block(1, 3.5, Vec2::new(400.0, 300.0))]);
        state.settings.apply_preset(QualityPreset::Low);
        let (mut lower, mut upper) = surfaces();
        render_layers(&mut lower, &mut upper, &state);
        assert!(!upper.commands().iter().any(|c| matches!(c, DrawCommand::Blur(px) if *px > 0.0)));
    }

    #[test]
    fn test_each_frame_starts_clean() {
        let state = state_with(vec![block(1, 1.0, Vec2::new(100.0, 100.0))]);
        let (mut lower, mut upper) = surfaces();
        render_layers(&mut lower, &mut upper, &state);
        render_layers(&mut lower, &mut upper, &state);
        assert_eq!(lower.labels().len(), 1);
        assert_eq!(lower.clear_count(), 2);
    }

    #[test]
    fn test_exploded_block_not_drawn() {
        let mut exploded = block(1, 3.5, Vec2::new(400.0, 300.0));
        exploded.explosion_start_ms = Some(0.0);
        let state = state_with(vec![exploded]);
        let (mut lower, mut upper) = surfaces();
        render_layers(&mut lower, &mut upper, &state);
        assert!(upper.labels().is_empty());
    }

    #[test]
    fn test_occlusion_reach_ignores_explosion_scale() {
        let small = block(1, 0.5, Vec2::new(400.0, 300.0));
        let mut giant = block(2, 3.5, Vec2::new(500.0, 300.0));
        giant.phase = BlockPhase::Exploding;
        giant.explosion_start_ms = Some(0.0);
        giant.scale = 0.1;

        let state = state_with(vec![small.clone(), giant.clone()]);
        assert!(is_occluded(&small, &state.blocks, crate::consts::CELL_SIZE));

        // Overshoot does not widen the reach
        giant.scale = 5.25;
        giant.pos = Vec2::new(550.0, 300.0);
        let state = state_with(vec![small.clone(), giant]);
        assert!(!is_occluded(&small, &state.blocks, crate::consts::CELL_SIZE));
    }

    #[test]
    fn test_occlusion_dimming_opt_in() {
        let small = block(1, 0.5, Vec2::new(400.0, 300.0));
        let big = block(2, 2.0, Vec2::new(405.0, 300.0));

        let alpha_of_small = |state: &EngineState| {
            let (mut lower, mut upper) = surfaces();
            render_layers(&mut lower, &mut upper, state);
            lower
                .commands()
                .iter()
                .filter_map(|c| match c {
                    DrawCommand::Alpha(a) => Some(*a),
                    _ => None,
                })
                .fold(f32::MAX, f32::min)
        };

        let mut state = state_with(vec![small, big]);
        assert_eq!(alpha_of_small(&state), 1.0);

        state.settings.occlusion_dimming = true;
        assert!((alpha_of_small(&state) - OCCLUSION_DIM_ALPHA).abs() < 1e-6);
    }
}
