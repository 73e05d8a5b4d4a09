//! Simulation module
//!
//! All block behavior lives here. This module has no rendering or platform
//! dependencies:
//! - Fixed frame step only
//! - Injected/seeded RNG only
//! - State passed explicitly, never captured

pub mod explosion;
pub mod shapes;
pub mod spawn;
pub mod state;
pub mod tick;

pub use explosion::{explosion_fade, explosion_progress, explosion_scale};
pub use shapes::{Shape, TETROMINOES, random_shape, rotate90};
pub use spawn::{
    BURST_TIERS, PERIODIC_TIERS, SizeTier, TierWeights, burst_origin, pick_tier, spawn_burst,
    spawn_giant, spawn_periodic,
};
pub use state::{Block, BlockPhase, EngineState, RngState, TechToken};
pub use tick::{TickReport, cull, should_cull, step_block, tick};
