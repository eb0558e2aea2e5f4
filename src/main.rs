//! Horde Survivor headless runner
//!
//! Plays one run at a fixed 60 fps with scripted input and logs the report.
//!
//! Usage: `horde-survivor [tuning.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::Path;

    use horde_survivor::sim::{SimEvent, TickInput};
    use horde_survivor::{GamePhase, Session, Tuning};

    /// Frame length in milliseconds
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up after this much simulated time
    const MAX_RUN_SECONDS: f64 = 600.0;
    /// Held keys change every few seconds so the player circles
    const WALK_PATTERN: [&[&str]; 4] = [&["ArrowRight"], &["s"], &["ArrowLeft", "a"], &["w"]];
    const WALK_SECONDS: f64 = 3.0;

    env_logger::init();
    log::info!("Horde Survivor (headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => Tuning::load_or_default(Path::new(&path)),
        None => Tuning::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    let mut session = Session::new(tuning, seed);
    session.start();

    let mut now = 0.0;
    while now < MAX_RUN_SECONDS * 1000.0 {
        let step = (now / 1000.0 / WALK_SECONDS) as usize % WALK_PATTERN.len();
        let input = TickInput::from_keys(WALK_PATTERN[step].iter().copied());

        session.frame(now, &input);
        now += FRAME_MS;

        for event in session.events() {
            if let SimEvent::MonsterKilled { kind, .. } = event {
                log::debug!("Killed {}", kind.name());
            }
        }

        match session.phase() {
            GamePhase::LevelUp => {
                if let Some(upgrade) = session.choose_upgrade(0) {
                    println!("Level {}: took {} (level {})", session.progression.level(), upgrade.name(), upgrade.level());
                }
            }
            GamePhase::GameOver => break,
            _ => {}
        }
    }

    let report = session.report();
    log::info!("Run finished in phase {:?}", session.phase());
    println!("\n=== Run report ===");
    println!("Time survived: {}", report.time_label());
    println!("Level reached: {}", report.level);
    println!("Monsters killed: {}", report.kills);
    println!("Gold collected: {}", report.gold);

    match session.snapshot().to_json() {
        Ok(json) => log::debug!("Final snapshot: {}", json),
        Err(e) => log::warn!("Could not serialize snapshot: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless runner on wasm; embedders drive `Session::frame` directly
}
