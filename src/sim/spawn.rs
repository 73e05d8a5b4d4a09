//! Block spawning
//!
//! Three paths create blocks:
//! - the initial radial burst (one block per token, exempt from the cap)
//! - the periodic top-of-surface spawner
//! - the host's "spawn one giant now" trigger
//!
//! Sizes come from tiered distributions; randomness is always passed in.

use std::f32::consts::TAU;
use std::ops::Range;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;

use super::shapes::random_shape;
use super::state::{Block, BlockPhase, EngineState, TechToken};
use crate::consts::*;

/// Size class of a spawned block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeTier {
    Small,
    Medium,
    Giant,
}

impl SizeTier {
    pub fn scale_range(&self) -> Range<f32> {
        match self {
            SizeTier::Small => 0.3..0.8,
            SizeTier::Medium => 1.2..2.0,
            SizeTier::Giant => 3.0..4.0,
        }
    }
}

/// Tier probabilities; giant takes whatever small and medium leave
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierWeights {
    pub small: f32,
    pub medium: f32,
}

impl TierWeights {
    pub fn giant(&self) -> f32 {
        (1.0 - self.small - self.medium).max(0.0)
    }
}

/// Burst mix: 55% small, 40% medium, 5% giant
pub const BURST_TIERS: TierWeights = TierWeights {
    small: 0.55,
    medium: 0.40,
};

/// Periodic mix leans small; giants are expensive to draw
pub const PERIODIC_TIERS: TierWeights = TierWeights {
    small: 0.65,
    medium: 0.33,
};

pub fn pick_tier<R: Rng + ?Sized>(rng: &mut R, weights: &TierWeights) -> SizeTier {
    let roll: f32 = rng.random();
    if roll < weights.small {
        SizeTier::Small
    } else if roll < weights.small + weights.medium {
        SizeTier::Medium
    } else {
        SizeTier::Giant
    }
}

pub fn random_scale<R: Rng + ?Sized>(rng: &mut R, tier: SizeTier) -> f32 {
    rng.random_range(tier.scale_range())
}

/// Spin inversely proportional to scale, random direction
pub fn rotation_speed_for<R: Rng + ?Sized>(rng: &mut R, scale: f32) -> f32 {
    let magnitude = (BASE_ROTATION_SPEED / scale.max(MIN_SCALE)).min(MAX_ROTATION_SPEED);
    rng.random_range(-1.0f32..=1.0) * magnitude
}

/// Where burst blocks launch from
pub fn burst_origin(bounds: Vec2) -> Vec2 {
    Vec2::new(bounds.x * 0.5, bounds.y * BURST_ORIGIN_Y)
}

fn new_block<R: Rng + ?Sized>(
    rng: &mut R,
    id: u32,
    token: Rc<TechToken>,
    pos: Vec2,
    vel: Vec2,
    scale: f32,
    phase: BlockPhase,
) -> Block {
    Block {
        id,
        pos,
        vel,
        shape: random_shape(rng),
        scale,
        original_scale: scale,
        rotation: rng.random_range(0.0..TAU),
        rotation_speed: rotation_speed_for(rng, scale),
        phase,
        explosion_start_ms: None,
        token,
    }
}

/// One burst block for token `index` of `count`
pub fn burst_block<R: Rng + ?Sized>(
    rng: &mut R,
    id: u32,
    token: Rc<TechToken>,
    index: usize,
    count: usize,
    origin: Vec2,
) -> Block {
    let jitter = rng.random_range(-BURST_ANGLE_JITTER..=BURST_ANGLE_JITTER);
    let angle = (index as f32 / count.max(1) as f32) * TAU + jitter;
    let speed = rng.random_range(BURST_SPEED_MIN..BURST_SPEED_MAX);
    let vel = Vec2::new(angle.cos() * speed, angle.sin() * speed - BURST_UPWARD_BIAS);
    let tier = pick_tier(rng, &BURST_TIERS);
    let scale = random_scale(rng, tier);
    new_block(rng, id, token, origin, vel, scale, BlockPhase::Bursting)
}

/// A block entering from above the top edge, already falling
pub fn falling_block<R: Rng + ?Sized>(
    rng: &mut R,
    id: u32,
    token: Rc<TechToken>,
    bounds: Vec2,
    scale: f32,
    cell_size: f32,
) -> Block {
    let x = rng.random_range(bounds.x * 0.2..=bounds.x * 0.8);
    let y = -cell_size * scale * 2.0;
    let vel = Vec2::new(rng.random_range(-0.5f32..=0.5), 0.0);
    new_block(rng, id, token, Vec2::new(x, y), vel, scale, BlockPhase::Falling)
}

/// Launch one block per token from the burst origin. Ignores the population cap.
pub fn spawn_burst(state: &mut EngineState) -> usize {
    let count = state.tokens.len();
    if count == 0 {
        return 0;
    }
    let origin = burst_origin(state.bounds);
    for index in 0..count {
        let id = state.next_block_id();
        let token = Rc::clone(&state.tokens[index]);
        let block = burst_block(&mut state.rng, id, token, index, count, origin);
        state.blocks.push(block);
    }
    state.burst_done = true;
    log::info!("Burst spawned {} blocks", count);
    count
}

fn spawn_falling(state: &mut EngineState, tier: Option<SizeTier>) -> bool {
    if state.tokens.is_empty() || state.blocks.len() >= state.settings.max_blocks {
        return false;
    }
    let token = Rc::clone(&state.tokens[state.rng.random_range(0..state.tokens.len())]);
    let tier = tier.unwrap_or_else(|| pick_tier(&mut state.rng, &PERIODIC_TIERS));
    let scale = random_scale(&mut state.rng, tier);
    let id = state.next_block_id();
    let block = falling_block(
        &mut state.rng,
        id,
        token,
        state.bounds,
        scale,
        state.settings.cell_size,
    );
    log::debug!("Spawned {:?} block {} ({})", tier, id, block.token.label());
    state.blocks.push(block);
    true
}

/// Periodic spawn; refuses when at the cap or when there are no tokens
pub fn spawn_periodic(state: &mut EngineState) -> bool {
    spawn_falling(state, None)
}

/// Host-triggered giant block, subject to the same cap
pub fn spawn_giant(state: &mut EngineState) -> bool {
    spawn_falling(state, Some(SizeTier::Giant))
}
