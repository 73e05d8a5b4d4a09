//! Simulation frame
//!
//! One call to `tick` is one simulation frame: spawn, integrate, cull.
//! Rendering is the engine's job.

use std::f32::consts::TAU;

use glam::Vec2;

use super::explosion::{explosion_progress, explosion_scale};
use super::spawn::{burst_origin, spawn_burst, spawn_giant, spawn_periodic};
use super::state::{Block, BlockPhase, EngineState};
use crate::consts::*;
use crate::cull_margin;
use crate::settings::EngineSettings;

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Blocks created by the initial burst
    pub burst: usize,
    /// Blocks created by the periodic spawner or the giant trigger
    pub spawned: usize,
    pub culled: usize,
}

/// Advance one block by one frame.
///
/// `origin_y` is the burst launch height; a bursting block settles once it
/// is descending below it.
pub fn step_block(block: &mut Block, settings: &EngineSettings, clock_ms: f64, origin_y: f32) {
    let giant = block.is_giant(settings.giant_threshold);

    match block.phase {
        BlockPhase::Bursting => {
            block.vel.y += settings.gravity;
            block.pos += block.vel;
            block.vel.x *= settings.horizontal_drag;
            block.rotation += block.rotation_speed;

            if block.vel.y > 0.0 && block.pos.y > origin_y {
                if giant {
                    block.phase = BlockPhase::Exploding;
                    block.explosion_start_ms = Some(clock_ms);
                    block.scale = explosion_scale(block.original_scale, 0.0);
                    block.vel.y = 0.0;
                } else {
                    block.phase = BlockPhase::Falling;
                }
            }
        }

        BlockPhase::Exploding => {
            let start = block.explosion_start_ms.unwrap_or(clock_ms);
            let progress = explosion_progress(start, clock_ms, settings.explosion_duration_ms);

            block.pos.x += block.vel.x;
            block.vel.x *= settings.horizontal_drag;
            block.rotation += block.rotation_speed;

            if progress >= 1.0 {
                block.scale = block.original_scale;
                block.phase = BlockPhase::Falling;
            } else {
                block.scale = explosion_scale(block.original_scale, progress);
            }
        }

        BlockPhase::Falling => {
            let fall = if giant {
                settings.fall_speed * settings.giant_fall_multiplier
            } else {
                settings.fall_speed
            };
            block.pos.y += fall;
            block.vel.x *= settings.horizontal_drag;
            block.pos.x += block.vel.x;
            block.rotation += block.rotation_speed;

            if giant {
                block.rotation_speed = (block.rotation_speed * GIANT_ROTATION_GROWTH)
                    .clamp(-GIANT_MAX_ROTATION_SPEED, GIANT_MAX_ROTATION_SPEED);
            } else {
                block.rotation_speed *= ROTATION_DECAY;
            }
        }
    }

    // NaN survives clamp; is_valid() catches it at cull time
    block.scale = block.scale.clamp(MIN_SCALE, MAX_SCALE);
    block.rotation = block.rotation.rem_euclid(TAU);
}

/// Out of bounds (below or beside the surface) and not mid-explosion, or broken.
///
/// The area above the top edge is the periodic spawn zone and the apex of
/// the burst arc, so it never culls.
pub fn should_cull(block: &Block, bounds: Vec2, cell_size: f32) -> bool {
    if !block.is_valid() {
        return true;
    }
    if block.phase == BlockPhase::Exploding {
        return false;
    }
    let margin = cull_margin(block.base_scale(), cell_size);
    block.pos.y > bounds.y + margin || block.pos.x < -margin || block.pos.x > bounds.x + margin
}

/// Remove every block that should go. Swap-remove keeps this O(1) per block.
pub fn cull(state: &mut EngineState) -> usize {
    let mut removed = 0;
    let mut i = 0;
    while i < state.blocks.len() {
        if should_cull(&state.blocks[i], state.bounds, state.settings.cell_size) {
            let block = state.remove_block(i);
            log::debug!("Culled block {} ({})", block.id, block.token.label());
            removed += 1;
        } else {
            i += 1;
        }
    }
    removed
}

/// Advance the engine state by one frame of `dt_ms` simulated time
pub fn tick(state: &mut EngineState, dt_ms: f64) -> TickReport {
    let mut report = TickReport::default();
    if !state.has_area() {
        return report;
    }

    state.frame += 1;
    state.clock_ms += dt_ms;

    // Blocks spawned below are first advanced next frame
    let settled = state.blocks.len();

    if !state.burst_done && !state.tokens.is_empty() {
        report.burst = spawn_burst(state);
    }

    if state.clock_ms - state.last_spawn_ms >= state.settings.spawn_interval_ms {
        state.last_spawn_ms = state.clock_ms;
        if spawn_periodic(state) {
            report.spawned += 1;
        }
    }

    while state.pending_giants > 0 {
        state.pending_giants -= 1;
        if spawn_giant(state) {
            report.spawned += 1;
        } else {
            log::debug!("Giant block request dropped (population cap)");
        }
    }

    let origin_y = burst_origin(state.bounds).y;
    let clock_ms = state.clock_ms;
    let settings = &state.settings;
    for block in state.blocks[..settled].iter_mut() {
        step_block(block, settings, clock_ms, origin_y);
    }

    report.culled = cull(state);
    report
}
