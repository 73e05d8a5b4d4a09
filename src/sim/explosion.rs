//! Scripted explosion curve for giant burst blocks
//!
//! Progress `p` runs 0..1 over the explosion duration:
//! - `[0, 0.3)`   grow from a seed scale to the original scale
//! - `[0.3, 0.7)` overshoot to 1.5x original
//! - `[0.7, 1)`   settle back to original while fading out
//!
//! Each leg starts where the previous one ends, so the curve is continuous.

use crate::consts::{
    EXPLOSION_GROW_END, EXPLOSION_OVERSHOOT, EXPLOSION_OVERSHOOT_END, EXPLOSION_SEED_SCALE,
};

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn ease_out(t: f32) -> f32 {
    t * (2.0 - t)
}

#[inline]
fn ease_in_out(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Normalized progress of an explosion, clamped to [0, 1]
pub fn explosion_progress(start_ms: f64, now_ms: f64, duration_ms: f64) -> f32 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    ((now_ms - start_ms) / duration_ms).clamp(0.0, 1.0) as f32
}

/// Scale at progress `p` for a block whose resting scale is `original`
pub fn explosion_scale(original: f32, progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    let peak = original * EXPLOSION_OVERSHOOT;

    if p < EXPLOSION_GROW_END {
        let t = p / EXPLOSION_GROW_END;
        lerp(EXPLOSION_SEED_SCALE, original, ease_out(t))
    } else if p < EXPLOSION_OVERSHOOT_END {
        let t = (p - EXPLOSION_GROW_END) / (EXPLOSION_OVERSHOOT_END - EXPLOSION_GROW_END);
        lerp(original, peak, ease_out(t))
    } else {
        let t = (p - EXPLOSION_OVERSHOOT_END) / (1.0 - EXPLOSION_OVERSHOOT_END);
        lerp(peak, original, ease_in_out(t))
    }
}

/// Opacity multiplier: 1 until the last leg, then linear to 0
pub fn explosion_fade(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    if p < EXPLOSION_OVERSHOOT_END {
        1.0
    } else {
        1.0 - (p - EXPLOSION_OVERSHOOT_END) / (1.0 - EXPLOSION_OVERSHOOT_END)
    }
}
