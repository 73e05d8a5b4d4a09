//! Stackfall - falling tech-stack blocks for page backgrounds
//!
//! Core modules:
//! - `sim`: Simulation (shapes, spawning, physics, culling)
//! - `color`: Accent color parsing and scale-dependent shading
//! - `renderer`: Dual-layer Canvas2D-style drawing
//! - `engine`: Per-frame loop driver that ties sim and renderer together
//! - `settings`: Data-driven tuning
//! - `web`: Browser host binding (wasm32 only)

pub mod color;
pub mod engine;
pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use settings::{EngineSettings, QualityPreset};
pub use sim::{Block, BlockPhase, EngineState, TechToken};

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation frame (60 Hz); physics constants are per frame
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Maximum simulation frames per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Host deltas above this are clamped (tab was in the background)
    pub const MAX_FRAME_DELTA_MS: f64 = 100.0;

    /// Population cap for the periodic spawner
    pub const MAX_BLOCKS: usize = 40;
    /// Periodic spawn interval
    pub const SPAWN_INTERVAL_MS: f64 = 800.0;

    /// Edge length of one shape cell at scale 1.0, in pixels
    pub const CELL_SIZE: f32 = 20.0;
    /// Blocks above this scale are "giant"
    pub const GIANT_THRESHOLD: f32 = 2.5;
    /// Scale clamp applied during integration
    pub const MIN_SCALE: f32 = 0.05;
    pub const MAX_SCALE: f32 = 8.0;

    /// Burst launch origin as a fraction of the surface height
    pub const BURST_ORIGIN_Y: f32 = 0.85;
    /// Burst launch speed range (pixels/frame)
    pub const BURST_SPEED_MIN: f32 = 10.0;
    pub const BURST_SPEED_MAX: f32 = 18.0;
    /// Upward bias added to burst vertical velocity
    pub const BURST_UPWARD_BIAS: f32 = 8.0;
    /// Angular jitter on each burst launch direction (radians)
    pub const BURST_ANGLE_JITTER: f32 = 0.2;

    /// Downward acceleration during the burst arc (pixels/frame²)
    pub const GRAVITY: f32 = 0.5;
    /// Horizontal velocity damping per frame
    pub const HORIZONTAL_DRAG: f32 = 0.98;
    /// Steady-state fall speed (pixels/frame)
    pub const FALL_SPEED: f32 = 2.0;
    /// Giant blocks fall this many times faster
    pub const GIANT_FALL_MULTIPLIER: f32 = 3.0;

    /// Rotation speed numerator; actual speed is divided by scale
    pub const BASE_ROTATION_SPEED: f32 = 0.06;
    /// Hard cap on rotation speed (radians/frame)
    pub const MAX_ROTATION_SPEED: f32 = 0.2;
    /// Per-frame rotation decay for normal blocks
    pub const ROTATION_DECAY: f32 = 0.995;
    /// Per-frame rotation growth for giant blocks
    pub const GIANT_ROTATION_GROWTH: f32 = 1.002;
    /// Giant spin never grows past this (radians/frame)
    pub const GIANT_MAX_ROTATION_SPEED: f32 = 0.03;

    /// Duration of the scripted explosion sequence
    pub const EXPLOSION_DURATION_MS: f64 = 2000.0;
    /// Scale an explosion starts from
    pub const EXPLOSION_SEED_SCALE: f32 = 0.1;
    /// Peak overshoot relative to original scale
    pub const EXPLOSION_OVERSHOOT: f32 = 1.5;
    /// Leg boundaries (normalized progress)
    pub const EXPLOSION_GROW_END: f32 = 0.3;
    pub const EXPLOSION_OVERSHOOT_END: f32 = 0.7;

    /// Opacity applied to giant blocks
    pub const GIANT_OPACITY: f32 = 0.35;
    /// Blur radius for the giant layer (pixels)
    pub const GIANT_BLUR_PX: f32 = 2.0;
    /// Alpha multiplier for blocks hidden behind larger ones
    pub const OCCLUSION_DIM_ALPHA: f32 = 0.4;

    /// Accent used when a token has no color or a malformed one
    pub const DEFAULT_ACCENT: &str = "#61dafb";
}

/// Cull margin for a block of the given scale: the widest a rotated shape can reach
#[inline]
pub fn cull_margin(scale: f32, cell_size: f32) -> f32 {
    cell_size * scale * 4.0
}
