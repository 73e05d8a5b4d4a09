//! Accent colors and scale-dependent shading
//!
//! Token colors arrive as hex strings. They are converted to HSL, then
//! desaturated/lightened depending on block size: small blocks read pale,
//! giants read as translucent atmosphere. Parsing never fails; bad input
//! falls back to `DEFAULT_ACCENT`.

use std::fmt;

use crate::consts::{DEFAULT_ACCENT, GIANT_OPACITY};
use crate::settings::EngineSettings;
use crate::sim::{Block, BlockPhase, explosion_fade, explosion_progress};

/// HSL color with alpha. Hue in degrees, saturation/lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    pub a: f32,
}

impl Hsla {
    pub const fn new(h: f32, s: f32, l: f32, a: f32) -> Self {
        Self { h, s, l, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Shift lightness, clamped to [0, 100]
    pub fn lighten(self, amount: f32) -> Self {
        Self {
            l: (self.l + amount).clamp(0.0, 100.0),
            ..self
        }
    }
}

/// CSS `hsla()` form, accepted by Canvas2D fill/stroke styles
impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({:.0}, {:.1}%, {:.1}%, {:.3})",
            self.h, self.s, self.l, self.a
        )
    }
}

/// Parse `#rrggbb`, `rrggbb`, `#rgb` or `rgb`
pub fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
    if !digits.is_ascii() {
        return None;
    }
    match digits.len() {
        6 => {
            let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
            Some([channel(0)?, channel(2)?, channel(4)?])
        }
        3 => {
            let channel = |i: usize| {
                u8::from_str_radix(&digits[i..i + 1], 16)
                    .ok()
                    .map(|v| v * 17)
            };
            Some([channel(0)?, channel(1)?, channel(2)?])
        }
        _ => None,
    }
}

pub fn rgb_to_hsl([r, g, b]: [u8; 3]) -> Hsla {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsla::new(0.0, 0.0, l * 100.0, 1.0);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsla::new(h * 60.0, s * 100.0, l * 100.0, 1.0)
}

/// Hex to HSL, substituting the default accent for malformed input
pub fn hex_to_hsl(hex: &str) -> Hsla {
    let rgb = parse_hex(hex)
        .or_else(|| parse_hex(DEFAULT_ACCENT))
        .unwrap_or([0x61, 0xda, 0xfb]);
    rgb_to_hsl(rgb)
}

/// Saturation multiplier: pale below 1.0, full through medium, washed out for giants
pub fn saturation_factor(scale: f32, giant_threshold: f32) -> f32 {
    if scale > giant_threshold {
        0.35
    } else if scale < 1.0 {
        0.6 + 0.4 * scale.max(0.0)
    } else {
        1.0
    }
}

/// Lightness offset in percentage points
pub fn lightness_offset(scale: f32, giant_threshold: f32) -> f32 {
    if scale > giant_threshold {
        20.0
    } else if scale < 1.0 {
        15.0 * (1.0 - scale.max(0.0))
    } else {
        0.0
    }
}

/// Fill color for a block of `scale` with accent `hex` (alpha 1)
pub fn color_for_scale(hex: &str, scale: f32, giant_threshold: f32) -> Hsla {
    let base = hex_to_hsl(hex);
    Hsla {
        s: (base.s * saturation_factor(scale, giant_threshold)).clamp(0.0, 100.0),
        ..base
    }
    .lighten(lightness_offset(scale, giant_threshold))
}

/// Opacity for a block right now: full, reduced for giants, and faded
/// through the last leg of an explosion (zero once it has finished)
pub fn block_opacity(block: &Block, clock_ms: f64, settings: &EngineSettings) -> f32 {
    let base = if block.is_giant(settings.giant_threshold) {
        GIANT_OPACITY
    } else {
        1.0
    };

    let fade = match (block.phase, block.explosion_start_ms) {
        (BlockPhase::Exploding, Some(start)) => explosion_fade(explosion_progress(
            start,
            clock_ms,
            settings.explosion_duration_ms,
        )),
        (BlockPhase::Falling, Some(_)) => 0.0,
        _ => 1.0,
    };

    base * fade
}
