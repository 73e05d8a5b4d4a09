//! Engine state and core simulation types
//!
//! Everything the loop driver mutates lives in `EngineState`, so a test can
//! step N frames without a real timer.

use std::rc::Rc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::shapes::Shape;
use crate::settings::EngineSettings;

/// A technology supplied by the host page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechToken {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub color_hex: Option<String>,
}

impl TechToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            color_hex: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_color(mut self, color_hex: impl Into<String>) -> Self {
        self.color_hex = Some(color_hex.into());
        self
    }

    /// Text drawn on the block
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Physics phase of a block. Only moves forward:
/// Bursting -> Falling, or Bursting -> Exploding -> Falling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockPhase {
    /// Parabolic launch arc from the burst origin
    Bursting,
    /// Scripted grow/overshoot/fade sequence (giant burst blocks only)
    Exploding,
    /// Steady-state fall
    Falling,
}

/// A live block
#[derive(Debug, Clone)]
pub struct Block {
    pub id: u32,
    /// Center of the shape, in surface pixels
    pub pos: Vec2,
    pub vel: Vec2,
    pub shape: Shape,
    pub scale: f32,
    /// Scale before an explosion started; equals `scale` otherwise
    pub original_scale: f32,
    /// Radians
    pub rotation: f32,
    /// Radians per frame
    pub rotation_speed: f32,
    pub phase: BlockPhase,
    /// Simulation clock (ms) when the explosion started
    pub explosion_start_ms: Option<f64>,
    pub token: Rc<TechToken>,
}

impl Block {
    /// Scale used for tiering, color and layer choice. Stable through an explosion.
    #[inline]
    pub fn base_scale(&self) -> f32 {
        self.original_scale
    }

    #[inline]
    pub fn is_giant(&self, threshold: f32) -> bool {
        self.base_scale() > threshold
    }

    /// Explosion finished; the block keeps falling fully faded until culled
    #[inline]
    pub fn has_exploded(&self) -> bool {
        self.phase == BlockPhase::Falling && self.explosion_start_ms.is_some()
    }

    /// Non-finite or out-of-range values make a block a cull candidate
    pub fn is_valid(&self) -> bool {
        self.pos.is_finite()
            && self.vel.is_finite()
            && self.rotation.is_finite()
            && self.rotation_speed.is_finite()
            && self.scale.is_finite()
            && self.scale > 0.0
    }
}

/// RNG state wrapper; the seed is kept so a run can be reproduced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Complete engine state owned by the loop driver
#[derive(Debug, Clone)]
pub struct EngineState {
    pub settings: EngineSettings,
    pub rng_state: RngState,
    pub rng: Pcg32,
    /// Tokens to spawn from (shared with every block spawned from them)
    pub tokens: Vec<Rc<TechToken>>,
    /// Live blocks; order has no meaning (culling swap-removes)
    pub blocks: Vec<Block>,
    /// Surface size in pixels
    pub bounds: Vec2,
    /// Simulated time (ms), advances only on enabled frames
    pub clock_ms: f64,
    /// Clock value at the last periodic spawn
    pub last_spawn_ms: f64,
    /// Initial burst has run for the current token list
    pub burst_done: bool,
    /// Giant blocks requested by the host but not yet spawned
    pub pending_giants: u32,
    /// Simulation frame counter
    pub frame: u64,
    next_id: u32,
}

impl EngineState {
    pub fn new(seed: u64, settings: EngineSettings, tokens: &[TechToken]) -> Self {
        let rng_state = RngState::new(seed);
        Self {
            settings,
            rng: rng_state.to_rng(),
            rng_state,
            tokens: tokens.iter().cloned().map(Rc::new).collect(),
            blocks: Vec::new(),
            bounds: Vec2::ZERO,
            clock_ms: 0.0,
            last_spawn_ms: 0.0,
            burst_done: false,
            pending_giants: 0,
            frame: 0,
            next_id: 1,
        }
    }

    /// Allocate a new block ID
    pub fn next_block_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Replace the token list and start over: clears the arena and burst
    /// flag and reseeds the RNG, so a restart replays the same sequence
    pub fn reset(&mut self, tokens: &[TechToken]) {
        self.tokens = tokens.iter().cloned().map(Rc::new).collect();
        self.rng = self.rng_state.to_rng();
        self.blocks.clear();
        self.burst_done = false;
        self.pending_giants = 0;
        self.last_spawn_ms = self.clock_ms;
    }

    pub fn same_tokens(&self, tokens: &[TechToken]) -> bool {
        self.tokens.len() == tokens.len()
            && self.tokens.iter().zip(tokens).all(|(a, b)| **a == *b)
    }

    /// Surface has a usable size
    pub fn has_area(&self) -> bool {
        self.bounds.x > 0.0 && self.bounds.y > 0.0
    }

    /// Remove a block in O(1); the last block takes its slot
    pub fn remove_block(&mut self, index: usize) -> Block {
        self.blocks.swap_remove(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_label_falls_back_to_name() {
        let token = TechToken::new("rust");
        assert_eq!(token.label(), "rust");
        let token = token.with_display_name("Rust");
        assert_eq!(token.label(), "Rust");
    }

    #[test]
    fn test_token_json_is_camel_case() {
        let token: TechToken =
            serde_json::from_str(r##"{"name":"go","displayName":"Go","colorHex":"#00add8"}"##)
                .expect("valid token");
        assert_eq!(token.label(), "Go");
        assert_eq!(token.color_hex.as_deref(), Some("#00add8"));

        let bare: TechToken = serde_json::from_str(r#"{"name":"zig"}"#).expect("valid token");
        assert_eq!(bare.display_name, None);
    }

    #[test]
    fn test_reset_clears_arena() {
        let tokens = vec![TechToken::new("a")];
        let mut state = EngineState::new(1, EngineSettings::default(), &tokens);
        state.burst_done = true;
        state.pending_giants = 2;
        assert!(state.same_tokens(&tokens));

        let other = vec![TechToken::new("b")];
        assert!(!state.same_tokens(&other));
        state.reset(&other);
        assert!(!state.burst_done);
        assert_eq!(state.pending_giants, 0);
        assert!(state.blocks.is_empty());
        assert_eq!(state.tokens[0].name, "b");
    }

    #[test]
    fn test_reset_reseeds_rng() {
        use rand::Rng;

        let tokens = vec![TechToken::new("a")];
        let mut state = EngineState::new(99, EngineSettings::default(), &tokens);
        let first: Vec<u32> = (0..8).map(|_| state.rng.random()).collect();

        state.reset(&[TechToken::new("b")]);
        let replay: Vec<u32> = (0..8).map(|_| state.rng.random()).collect();
        assert_eq!(first, replay);
        assert_eq!(state.rng_state.seed, 99);
    }
}
