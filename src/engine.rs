//! Loop driver
//!
//! The host calls `Engine::frame(dt_ms)` once per display frame. Each call
//! runs zero or more fixed simulation frames (spawn, integrate, cull) and
//! then redraws both layers. Enable/disable and the giant-block trigger are
//! plain signals read at the top of the next frame.

use glam::Vec2;

use crate::color::parse_hex;
use crate::consts::{FRAME_MS, MAX_FRAME_DELTA_MS, MAX_SUBSTEPS};
use crate::renderer::{Surface, clear_layers, render_layers};
use crate::settings::EngineSettings;
use crate::sim::{EngineState, TechToken, TickReport, tick};

/// Callback fired when the engine is toggled
pub type ToggleCallback = Box<dyn FnMut(bool)>;

/// Lower and upper drawing layers
struct Layers<S> {
    lower: S,
    upper: S,
}

pub struct Engine<S: Surface> {
    state: EngineState,
    layers: Option<Layers<S>>,
    enabled: bool,
    accumulator: f64,
    /// Last giant-trigger counter seen from the host; counting starts at 0
    trigger_seen: u64,
    on_toggle: Option<ToggleCallback>,
}

fn warn_bad_colors(tokens: &[TechToken]) {
    for token in tokens {
        if let Some(hex) = token.color_hex.as_deref() {
            if parse_hex(hex).is_none() {
                log::warn!(
                    "Token '{}' has malformed color {:?}, using default accent",
                    token.name,
                    hex
                );
            }
        }
    }
}

impl<S: Surface> Engine<S> {
    pub fn new(tokens: &[TechToken], settings: EngineSettings, seed: u64) -> Self {
        warn_bad_colors(tokens);
        log::info!("Engine created with {} tokens, seed {}", tokens.len(), seed);
        Self {
            state: EngineState::new(seed, settings, tokens),
            layers: None,
            enabled: true,
            accumulator: 0.0,
            trigger_seen: 0,
            on_toggle: None,
        }
    }

    /// Provide the two drawing layers. Bounds follow the lower layer's size.
    pub fn attach_surfaces(&mut self, lower: S, upper: S) {
        self.state.bounds = lower.size();
        self.layers = Some(Layers { lower, upper });
    }

    /// Take the layers back; the engine becomes a no-op until reattached
    pub fn detach_surfaces(&mut self) -> Option<(S, S)> {
        self.layers.take().map(|l| (l.lower, l.upper))
    }

    pub fn surfaces(&self) -> Option<(&S, &S)> {
        self.layers.as_ref().map(|l| (&l.lower, &l.upper))
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EngineState {
        &mut self.state
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Replace the token list. A different list restarts from scratch.
    /// Returns whether a reset happened.
    pub fn set_tokens(&mut self, tokens: &[TechToken]) -> bool {
        if self.state.same_tokens(tokens) {
            return false;
        }
        warn_bad_colors(tokens);
        self.state.reset(tokens);
        self.accumulator = 0.0;
        log::info!("Token list changed ({} tokens), engine reset", tokens.len());
        true
    }

    /// Pause or resume. Pausing keeps every block where it is and blanks the layers.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.accumulator = 0.0;
        if !enabled {
            if let Some(layers) = self.layers.as_mut() {
                clear_layers(&mut layers.lower, &mut layers.upper);
            }
        }
        log::info!("Engine {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Flip enabled and notify the host
    pub fn toggle(&mut self) -> bool {
        let enabled = !self.enabled;
        self.set_enabled(enabled);
        if let Some(callback) = self.on_toggle.as_mut() {
            callback(enabled);
        }
        enabled
    }

    pub fn set_on_toggle(&mut self, callback: impl FnMut(bool) + 'static) {
        self.on_toggle = Some(Box::new(callback));
    }

    /// Host counter for "spawn a giant block now". The counter starts at 0
    /// and each increment queues one giant. A lower value (host reset its
    /// counter) only moves the baseline.
    pub fn set_spawn_trigger(&mut self, counter: u64) {
        if counter > self.trigger_seen {
            let requested = (counter - self.trigger_seen).min(u32::MAX as u64) as u32;
            self.state.pending_giants = self.state.pending_giants.saturating_add(requested);
            log::debug!("Queued {} giant block(s)", requested);
        }
        self.trigger_seen = counter;
    }

    /// Resize both layers to match their container
    pub fn resize(&mut self, width: f32, height: f32) {
        let width = width.max(0.0);
        let height = height.max(0.0);
        if let Some(layers) = self.layers.as_mut() {
            layers.lower.resize(width, height);
            layers.upper.resize(width, height);
        }
        self.state.bounds = Vec2::new(width, height);
        log::debug!("Resized to {}x{}", width, height);
    }

    /// One host frame. Does nothing while disabled or without surfaces.
    pub fn frame(&mut self, dt_ms: f64) -> TickReport {
        let mut report = TickReport::default();

        if !self.enabled {
            return report;
        }
        let Some(layers) = self.layers.as_mut() else {
            return report;
        };
        if !self.state.has_area() {
            return report;
        }

        let dt_ms = if dt_ms.is_finite() {
            dt_ms.clamp(0.0, MAX_FRAME_DELTA_MS)
        } else {
            0.0
        };
        self.accumulator += dt_ms;

        let mut substeps = 0;
        while self.accumulator >= FRAME_MS && substeps < MAX_SUBSTEPS {
            let step = tick(&mut self.state, FRAME_MS);
            report.burst += step.burst;
            report.spawned += step.spawned;
            report.culled += step.culled;
            self.accumulator -= FRAME_MS;
            substeps += 1;
        }
        // Drop time we could not catch up on
        self.accumulator = self.accumulator.min(FRAME_MS);

        render_layers(&mut layers.lower, &mut layers.upper, &self.state);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingSurface;
    use crate::sim::BlockPhase;
    use std::cell::Cell;
    use std::rc::Rc;

    fn tokens(n: usize) -> Vec<TechToken> {
        let colors = ["#f74c00", "#3178c6", "#00add8", "not-a-color", "#61dafb"];
        (0..n)
            .map(|i| TechToken::new(format!("tech{i}")).with_color(colors[i % colors.len()]))
            .collect()
    }

    fn engine(n: usize, seed: u64) -> Engine<RecordingSurface> {
        let mut engine = Engine::new(&tokens(n), EngineSettings::default(), seed);
        engine.attach_surfaces(
            RecordingSurface::new(800.0, 600.0),
            RecordingSurface::new(800.0, 600.0),
        );
        engine
    }

    #[test]
    fn test_first_frame_bursts_all_tokens() {
        let mut engine = engine(5, 1);
        let report = engine.frame(FRAME_MS);
        assert_eq!(report.burst, 5);
        assert_eq!(engine.state().blocks.len(), 5);
        assert!(engine
            .state()
            .blocks
            .iter()
            .all(|b| b.phase == BlockPhase::Bursting));
    }

    #[test]
    fn test_burst_blocks_all_cull_without_periodic_spawns() {
        for seed in 0..5 {
            let mut settings = EngineSettings::default();
            settings.spawn_interval_ms = f64::INFINITY;
            let mut engine = Engine::new(&tokens(5), settings, seed);
            engine.attach_surfaces(
                RecordingSurface::new(800.0, 600.0),
                RecordingSurface::new(800.0, 600.0),
            );
            for _ in 0..500 {
                engine.frame(FRAME_MS);
            }
            assert!(engine.state().blocks.is_empty(), "seed {seed}");
        }
    }

    #[test]
    fn test_pause_preserves_state() {
        let mut engine = engine(8, 3);
        for _ in 0..30 {
            engine.frame(FRAME_MS);
        }
        let snapshot = |e: &Engine<RecordingSurface>| {
            e.state()
                .blocks
                .iter()
                .map(|b| (b.id, b.pos, b.phase, b.scale, b.rotation))
                .collect::<Vec<_>>()
        };
        let before = snapshot(&engine);
        let clock = engine.state().clock_ms;

        engine.set_enabled(false);
        for _ in 0..50 {
            assert_eq!(engine.frame(FRAME_MS), TickReport::default());
        }
        let (lower, upper) = engine.surfaces().expect("attached");
        assert!(lower.is_blank() && upper.is_blank());

        engine.set_enabled(true);
        assert_eq!(snapshot(&engine), before);
        assert_eq!(engine.state().clock_ms, clock);

        engine.frame(FRAME_MS);
        assert_ne!(snapshot(&engine), before);
    }

    #[test]
    fn test_no_surface_is_noop() {
        let mut engine: Engine<RecordingSurface> =
            Engine::new(&tokens(5), EngineSettings::default(), 1);
        for _ in 0..10 {
            engine.frame(FRAME_MS);
        }
        assert!(engine.state().blocks.is_empty());
        assert!(!engine.state().burst_done);
    }

    #[test]
    fn test_empty_tokens_stay_idle() {
        let mut engine = engine(0, 1);
        for _ in 0..200 {
            engine.frame(FRAME_MS);
        }
        assert!(engine.state().blocks.is_empty());
    }

    #[test]
    fn test_cap_holds_after_periodic_spawns() {
        let mut settings = EngineSettings::default();
        settings.max_blocks = 10;
        settings.spawn_interval_ms = FRAME_MS;
        let mut engine = Engine::new(&tokens(3), settings, 11);
        engine.attach_surfaces(
            RecordingSurface::new(800.0, 600.0),
            RecordingSurface::new(800.0, 600.0),
        );
        engine.frame(FRAME_MS);
        for _ in 0..600 {
            engine.frame(FRAME_MS);
            assert!(engine.state().blocks.len() <= 10);
        }
    }

    #[test]
    fn test_substeps_follow_host_time() {
        let mut engine = engine(3, 1);
        engine.frame(FRAME_MS / 2.0);
        assert_eq!(engine.state().frame, 0);
        engine.frame(FRAME_MS / 2.0);
        assert_eq!(engine.state().frame, 1);

        // Long stall is clamped to a few frames
        engine.frame(10_000.0);
        assert!(engine.state().frame <= 1 + MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_token_change_resets() {
        let mut engine = engine(5, 2);
        for _ in 0..10 {
            engine.frame(FRAME_MS);
        }
        assert!(!engine.set_tokens(&tokens(5)));
        assert!(engine.set_tokens(&tokens(3)));
        assert!(engine.state().blocks.is_empty());
        assert!(!engine.state().burst_done);

        let report = engine.frame(FRAME_MS);
        assert_eq!(report.burst, 3);
    }

    fn giant_fallers(engine: &Engine<RecordingSurface>) -> usize {
        engine
            .state()
            .blocks
            .iter()
            .filter(|b| b.phase == BlockPhase::Falling && b.scale >= 3.0)
            .count()
    }

    #[test]
    fn test_spawn_trigger_counts_increments() {
        let mut settings = EngineSettings::default();
        settings.spawn_interval_ms = f64::INFINITY;
        let mut engine = Engine::new(&tokens(2), settings, 4);
        engine.attach_surfaces(
            RecordingSurface::new(800.0, 600.0),
            RecordingSurface::new(800.0, 600.0),
        );

        engine.frame(FRAME_MS);
        assert_eq!(engine.state().blocks.len(), 2);

        engine.set_spawn_trigger(3);
        let report = engine.frame(FRAME_MS);
        assert_eq!(report.spawned, 3);
        assert!(giant_fallers(&engine) >= 3);

        // Same value again queues nothing
        engine.set_spawn_trigger(3);
        assert_eq!(engine.frame(FRAME_MS).spawned, 0);
    }

    #[test]
    fn test_first_trigger_increment_spawns_giant() {
        let mut settings = EngineSettings::default();
        settings.spawn_interval_ms = f64::INFINITY;
        let mut engine = Engine::new(&tokens(2), settings, 8);
        engine.attach_surfaces(
            RecordingSurface::new(800.0, 600.0),
            RecordingSurface::new(800.0, 600.0),
        );
        engine.frame(FRAME_MS);

        engine.set_spawn_trigger(1);
        let report = engine.frame(FRAME_MS);
        assert_eq!(report.spawned, 1);
        assert_eq!(engine.state().pending_giants, 0);
        assert!(giant_fallers(&engine) >= 1);
    }

    #[test]
    fn test_trigger_reset_moves_baseline() {
        let mut engine = engine(2, 5);
        engine.set_spawn_trigger(4);
        assert_eq!(engine.state().pending_giants, 4);
        engine.frame(FRAME_MS);

        engine.set_spawn_trigger(0);
        assert_eq!(engine.state().pending_giants, 0);
        engine.set_spawn_trigger(1);
        assert_eq!(engine.state().pending_giants, 1);
    }

    #[test]
    fn test_toggle_notifies_host() {
        let mut engine = engine(2, 1);
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        engine.set_on_toggle(move |enabled| sink.set(Some(enabled)));

        assert!(!engine.toggle());
        assert_eq!(seen.get(), Some(false));
        assert!(!engine.enabled());
        assert!(engine.toggle());
        assert_eq!(seen.get(), Some(true));
    }

    #[test]
    fn test_resize_updates_layers_and_bounds() {
        let mut engine = engine(2, 1);
        engine.resize(1024.0, 768.0);
        let (lower, upper) = engine.surfaces().expect("attached");
        assert_eq!(lower.size(), Vec2::new(1024.0, 768.0));
        assert_eq!(upper.size(), Vec2::new(1024.0, 768.0));
        assert_eq!(engine.state().bounds, Vec2::new(1024.0, 768.0));
    }

    #[test]
    fn test_detached_engine_stops() {
        let mut engine = engine(4, 1);
        engine.frame(FRAME_MS);
        let count = engine.state().blocks.len();
        assert!(engine.detach_surfaces().is_some());
        engine.frame(FRAME_MS);
        assert_eq!(engine.state().blocks.len(), count);
        assert_eq!(engine.state().frame, 1);
    }
}
