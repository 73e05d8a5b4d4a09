//! Drawing a single block: rotated cell grid, bevel, outline, label

use glam::Vec2;

use super::{Rect, Shadow, Surface};
use crate::color::Hsla;
use crate::settings::EngineSettings;
use crate::sim::Block;

/// Bevel strip width as a fraction of the cell
const BEVEL: f32 = 0.15;
const HIGHLIGHT: Hsla = Hsla::new(0.0, 0.0, 100.0, 0.28);
const SHADE: Hsla = Hsla::new(0.0, 0.0, 0.0, 0.25);
const LABEL: Hsla = Hsla::new(0.0, 0.0, 100.0, 1.0);
const LABEL_SHADOW: Hsla = Hsla::new(0.0, 0.0, 0.0, 0.6);

/// Label size grows with the block, within readable limits
pub fn label_font_px(scale: f32) -> f32 {
    (10.0 + 4.0 * scale).clamp(10.0, 28.0)
}

/// Outline (width, color) by size tier
fn outline(color: Hsla, scale: f32, giant_threshold: f32) -> (f32, Hsla) {
    if scale > giant_threshold {
        (2.5, Hsla::new(0.0, 0.0, 100.0, 0.3))
    } else if scale < 1.0 {
        (1.0, color.lighten(-15.0))
    } else {
        (1.5, color.lighten(-25.0))
    }
}

fn bevel_cell<S: Surface>(surface: &mut S, cell: Rect) {
    let strip = cell.w * BEVEL;
    surface.fill_rect(Rect::new(cell.x, cell.y, cell.w, strip), HIGHLIGHT);
    surface.fill_rect(Rect::new(cell.x, cell.y, strip, cell.h), HIGHLIGHT);
    surface.fill_rect(Rect::new(cell.x, cell.y + cell.h - strip, cell.w, strip), SHADE);
    surface.fill_rect(Rect::new(cell.x + cell.w - strip, cell.y, strip, cell.h), SHADE);
}

/// Draw `block` centered on its position, rotated, with its label upright
pub fn draw_block<S: Surface>(
    surface: &mut S,
    block: &Block,
    color: Hsla,
    alpha: f32,
    settings: &EngineSettings,
    bevel: bool,
) {
    let cell = settings.cell_size * block.scale;
    let half = Vec2::new(
        block.shape.cols() as f32 * cell,
        block.shape.rows() as f32 * cell,
    ) * 0.5;
    let (outline_width, outline_color) =
        outline(color, block.base_scale(), settings.giant_threshold);

    surface.save();
    surface.translate(block.pos.x, block.pos.y);
    surface.rotate(block.rotation);
    surface.set_alpha(alpha.clamp(0.0, 1.0));

    for (row, col) in block.shape.filled_cells() {
        let rect = Rect::new(
            col as f32 * cell - half.x,
            row as f32 * cell - half.y,
            cell,
            cell,
        );
        surface.fill_rect(rect, color);
        if bevel {
            bevel_cell(surface, rect);
        }
        surface.stroke_rect(rect, outline_color, outline_width);
    }

    // Counter-rotate so the label stays upright
    surface.rotate(-block.rotation);
    surface.set_shadow(Some(Shadow {
        color: LABEL_SHADOW,
        blur: 4.0,
        offset: Vec2::new(0.0, 1.0),
    }));
    surface.fill_text(
        block.token.label(),
        0.0,
        0.0,
        label_font_px(block.scale),
        LABEL,
    );
    surface.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCommand, RecordingSurface};
    use crate::sim::{BlockPhase, Shape, TETROMINOES, TechToken};
    use std::rc::Rc;

    fn t_block(rotation: f32) -> Block {
        Block {
            id: 1,
            pos: Vec2::new(200.0, 150.0),
            vel: Vec2::ZERO,
            shape: Shape::from_rows(TETROMINOES[2]),
            scale: 1.0,
            original_scale: 1.0,
            rotation,
            rotation_speed: 0.0,
            phase: BlockPhase::Falling,
            explosion_start_ms: None,
            token: Rc::new(TechToken::new("typescript").with_display_name("TypeScript")),
        }
    }

    #[test]
    fn test_label_counter_rotated() {
        let mut surface = RecordingSurface::new(400.0, 300.0);
        let color = Hsla::new(210.0, 60.0, 50.0, 1.0);
        draw_block(&mut surface, &t_block(0.7), color, 1.0, &EngineSettings::default(), true);

        let commands = surface.commands();
        let text_at = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::Text { .. }))
            .expect("label drawn");
        // Net rotation in effect when the label is drawn is zero
        let net: f32 = commands[..text_at]
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rotate(r) => Some(*r),
                _ => None,
            })
            .sum();
        assert!(net.abs() < 1e-6);
        assert!(commands[..text_at]
            .iter()
            .any(|c| matches!(c, DrawCommand::Shadow(Some(_)))));
        assert_eq!(surface.labels(), vec!["TypeScript"]);
    }

    #[test]
    fn test_one_fill_per_cell_plus_bevel() {
        let color = Hsla::new(210.0, 60.0, 50.0, 1.0);
        let count_fills = |bevel: bool| {
            let mut surface = RecordingSurface::new(400.0, 300.0);
            draw_block(&mut surface, &t_block(0.0), color, 1.0, &EngineSettings::default(), bevel);
            surface
                .commands()
                .iter()
                .filter(|c| matches!(c, DrawCommand::FillRect { .. }))
                .count()
        };
        assert_eq!(count_fills(false), 4);
        assert_eq!(count_fills(true), 4 * 5);
    }

    #[test]
    fn test_cells_centered_on_position() {
        let mut surface = RecordingSurface::new(400.0, 300.0);
        let color = Hsla::new(0.0, 50.0, 50.0, 1.0);
        draw_block(&mut surface, &t_block(0.0), color, 1.0, &EngineSettings::default(), false);
        let rects: Vec<Rect> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        let min_x = rects.iter().map(|r| r.x).fold(f32::MAX, f32::min);
        let max_x = rects.iter().map(|r| r.x + r.w).fold(f32::MIN, f32::max);
        assert!((min_x + max_x).abs() < 1e-4);
    }
}
