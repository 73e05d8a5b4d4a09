//! Engine settings and tuning
//!
//! Defaults live in `crate::consts`. A JSON override can be stored in
//! LocalStorage for tweaking the effect without a rebuild.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{EngineError, Result};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Population cap for this preset
    pub fn max_blocks(&self) -> usize {
        match self {
            QualityPreset::Low => 20,
            QualityPreset::Medium => MAX_BLOCKS,
            QualityPreset::High => 60,
        }
    }

    /// Whether the giant layer gets its soft blur
    pub fn blur_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }

    /// Whether cells are drawn with highlight/shadow edges
    pub fn bevel_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Population ===
    /// Periodic spawner refuses to add beyond this
    pub max_blocks: usize,
    /// Simulated time between periodic spawns
    pub spawn_interval_ms: f64,

    // === Physics (per 60 Hz frame) ===
    pub gravity: f32,
    pub horizontal_drag: f32,
    pub fall_speed: f32,
    pub giant_fall_multiplier: f32,
    pub explosion_duration_ms: f64,

    // === Geometry ===
    pub giant_threshold: f32,
    pub cell_size: f32,

    // === Rendering ===
    pub giant_blur_px: f32,
    /// Dim blocks sitting behind larger ones
    pub occlusion_dimming: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            max_blocks: MAX_BLOCKS,
            spawn_interval_ms: SPAWN_INTERVAL_MS,

            gravity: GRAVITY,
            horizontal_drag: HORIZONTAL_DRAG,
            fall_speed: FALL_SPEED,
            giant_fall_multiplier: GIANT_FALL_MULTIPLIER,
            explosion_duration_ms: EXPLOSION_DURATION_MS,

            giant_threshold: GIANT_THRESHOLD,
            cell_size: CELL_SIZE,

            giant_blur_px: GIANT_BLUR_PX,
            occlusion_dimming: false,
        }
    }
}

impl EngineSettings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        self.max_blocks = preset.max_blocks();
    }

    /// Blur radius actually used for the giant layer
    pub fn effective_blur_px(&self) -> f32 {
        if self.quality.blur_enabled() {
            self.giant_blur_px
        } else {
            0.0
        }
    }

    /// Parse and validate a JSON settings document
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would break the simulation
    pub fn validate(&self) -> Result<()> {
        if self.max_blocks == 0 {
            return Err(EngineError::InvalidSettings("max_blocks must be > 0".into()));
        }
        if !(self.spawn_interval_ms > 0.0) {
            return Err(EngineError::InvalidSettings(
                "spawn_interval_ms must be > 0".into(),
            ));
        }
        if !(self.explosion_duration_ms > 0.0) || !self.explosion_duration_ms.is_finite() {
            return Err(EngineError::InvalidSettings(
                "explosion_duration_ms must be finite and > 0".into(),
            ));
        }
        if !(self.giant_threshold > 0.0) || !(self.cell_size > 0.0) {
            return Err(EngineError::InvalidSettings(
                "giant_threshold and cell_size must be > 0".into(),
            ));
        }
        let physics = [
            self.gravity,
            self.horizontal_drag,
            self.fall_speed,
            self.giant_fall_multiplier,
            self.giant_blur_px,
        ];
        if physics.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidSettings(
                "physics values must be finite".into(),
            ));
        }
        Ok(())
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "stackfall_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
