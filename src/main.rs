//! Stackfall entry point
//!
//! The browser build is driven through `StackfallHandle` from the host page.
//! Natively this runs the engine headless against recording surfaces and
//! logs what happened, which is handy for tuning without a browser.
//!
//! Usage: `stackfall [frames] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use stackfall::consts::FRAME_MS;
    use stackfall::renderer::RecordingSurface;
    use stackfall::sim::{BlockPhase, TechToken};
    use stackfall::{Engine, EngineSettings};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let frames: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(600);
    let seed: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(42);

    let tokens = vec![
        TechToken::new("rust").with_display_name("Rust").with_color("#dea584"),
        TechToken::new("typescript").with_display_name("TypeScript").with_color("#3178c6"),
        TechToken::new("react").with_display_name("React").with_color("#61dafb"),
        TechToken::new("postgres").with_display_name("PostgreSQL").with_color("#336791"),
        TechToken::new("docker").with_display_name("Docker").with_color("#2496ed"),
        TechToken::new("wasm").with_display_name("WebAssembly").with_color("#654ff0"),
        TechToken::new("go"),
    ];

    let mut engine = Engine::new(&tokens, EngineSettings::default(), seed);
    engine.attach_surfaces(
        RecordingSurface::new(1280.0, 720.0),
        RecordingSurface::new(1280.0, 720.0),
    );
    log::info!("Stackfall (native) running {} frames, seed {}", frames, seed);

    let (mut burst, mut spawned, mut culled, mut peak) = (0, 0, 0, 0);
    for frame in 0..frames {
        // One giant every five seconds
        if frame > 0 && frame % 300 == 0 {
            engine.set_spawn_trigger(frame / 300);
        }
        let report = engine.frame(FRAME_MS);
        burst += report.burst;
        spawned += report.spawned;
        culled += report.culled;
        peak = peak.max(engine.state().blocks.len());

        if frame % 60 == 0 {
            let count = |phase: BlockPhase| {
                engine
                    .state()
                    .blocks
                    .iter()
                    .filter(|b| b.phase == phase)
                    .count()
            };
            log::debug!(
                "t={:.1}s blocks={} bursting={} exploding={} falling={}",
                engine.state().clock_ms / 1000.0,
                engine.state().blocks.len(),
                count(BlockPhase::Bursting),
                count(BlockPhase::Exploding),
                count(BlockPhase::Falling),
            );
        }
    }

    let labels = engine
        .surfaces()
        .map(|(lower, upper)| lower.labels().len() + upper.labels().len())
        .unwrap_or(0);
    log::info!(
        "Done: burst={} spawned={} culled={} peak={} live={} drawn_last_frame={}",
        burst,
        spawned,
        culled,
        peak,
        engine.state().blocks.len(),
        labels
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is StackfallHandle::mount, this is just to satisfy the compiler
}
