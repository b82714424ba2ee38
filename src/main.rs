//! Dish Guessr entry point
//!
//! The web build is driven from the page through `platform::web`. Natively
//! this plays one headless game against a catalog with a simulated player
//! and clock, which is handy for checking a catalog export.
//!
//! Usage: `dish-guessr [catalog.json]` (data kept in `$DISH_GUESSR_DATA`,
//! default `.dish-guessr/`)

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Dish Guessr (native) starting...");

    if let Err(e) = native::run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;
    use std::path::PathBuf;
    use std::time::Duration;

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use dish_guessr::highscores::{HighScores, format_date};
    use dish_guessr::platform::{FileStorage, now_ms};
    use dish_guessr::sim::{GameEvent, RoundEngine, RoundPhase};
    use dish_guessr::{GameConfig, GeoPoint, PersistentSessionStore, StaticCatalog};

    const SAMPLE_CATALOG: &str = r#"[
        {"id": "pho", "name": "Pho", "latitude": 21.0278, "longitude": 105.8342,
         "images": ["pho-1.jpg", "pho-2.jpg"], "origin_label": "Hanoi, Vietnam"},
        {"id": "paella", "name": "Paella", "latitude": 39.4699, "longitude": -0.3763,
         "images": ["paella-1.jpg"], "origin_label": "Valencia, Spain"},
        {"id": "mole-negro", "name": "Mole negro", "latitude": 17.0732, "longitude": -96.7266,
         "images": ["mole-1.jpg", "mole-2.jpg", "mole-3.jpg"], "origin_label": "Oaxaca, Mexico"},
        {"id": "khachapuri", "name": "Adjarian khachapuri", "latitude": 41.6168, "longitude": 41.6367,
         "images": ["khachapuri-1.jpg"], "origin_label": "Batumi, Georgia"},
        {"id": "poutine", "name": "Poutine", "latitude": 46.8139, "longitude": -71.2080,
         "images": ["poutine-1.jpg", "poutine-2.jpg"], "origin_label": "Quebec, Canada"},
        {"id": "bobotie", "name": "Bobotie", "latitude": -33.9249, "longitude": 18.4241,
         "images": ["bobotie-1.jpg"], "origin_label": "Cape Town, South Africa"},
        {"id": "laksa", "name": "Laksa", "latitude": 1.3521, "longitude": 103.8198,
         "images": ["laksa-1.jpg", "laksa-2.jpg"], "origin_label": "Singapore"},
        {"id": "pavlova", "name": "Pavlova", "latitude": -41.2865, "longitude": 174.7762,
         "images": ["pavlova-1.jpg"], "origin_label": "Wellington, New Zealand"}
    ]"#;

    /// Upper bound on simulated seconds, far beyond one game
    const MAX_SIMULATED_SECS: u32 = 3600;

    pub(crate) fn run() -> Result<(), Box<dyn Error>> {
        let catalog = match std::env::args().nth(1) {
            Some(path) => StaticCatalog::from_path(&PathBuf::from(path))?,
            None => StaticCatalog::from_json(SAMPLE_CATALOG)?,
        };

        let data_dir = std::env::var("DISH_GUESSR_DATA").unwrap_or_else(|_| ".dish-guessr".into());
        let storage = FileStorage::open(data_dir)?;
        let config = GameConfig::load(&storage);
        let mut high_scores = HighScores::load(&storage);

        let seed = now_ms() as u64;
        let mut player = Pcg32::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
        let mut engine = RoundEngine::new(&catalog, PersistentSessionStore::new(storage), config, seed);

        println!(
            "{} rounds, {}s each, up to {} points",
            engine.config().rounds_per_game,
            engine.config().round_time_secs,
            engine.config().max_score()
        );
        engine.start_game()?;
        let mut summary = None;
        let mut think_secs = 0;
        let mut waited_secs = 0;
        for _ in 0..MAX_SIMULATED_SECS {
            if engine.phase() == RoundPhase::Playing && waited_secs >= think_secs {
                if let Some(target) = engine.round().map(|r| r.correct_position()) {
                    let guess = GeoPoint::new(
                        target.lat + player.random_range(-12.0..12.0),
                        target.lng + player.random_range(-25.0..25.0),
                    );
                    if let Some(guess) = guess.clamped() {
                        engine.place_guess(guess);
                    }
                }
                engine.submit_guess();
            }
            engine.update(Duration::from_secs(1));
            waited_secs += 1;

            for event in engine.drain_events() {
                match event {
                    GameEvent::RoundStarted { round, dish, .. } => {
                        println!("Round {round}: {} ({})", dish.name, dish.origin_label);
                        think_secs = player.random_range(3..15);
                        waited_secs = 0;
                    }
                    GameEvent::RoundScored {
                        distance_km, score, ..
                    } => match distance_km {
                        Some(d) => println!("  {d:>7.0} km -> {score} points"),
                        None => println!("  no guess -> {score} points"),
                    },
                    GameEvent::GameFinished { summary: s } => summary = Some(s),
                    _ => {}
                }
            }
            if summary.is_some() {
                break;
            }
        }

        let Some(summary) = summary else {
            return Err("game did not finish".into());
        };
        println!(
            "\nFinal score: {} / {} ({:.0} km off in total)",
            summary.total_score,
            summary.max_score(),
            summary.total_distance_km
        );

        if let Some(rank) = high_scores.add_summary(&summary) {
            println!("New high score! Rank #{rank}");
            high_scores.save(engine.store_mut().storage_mut())?;
        }
        let now = now_ms();
        for (i, entry) in high_scores.entries.iter().enumerate() {
            println!(
                "{:>2}. {:>6} / {}  {}",
                i + 1,
                entry.score,
                entry.max_score,
                format_date(entry.timestamp, now)
            );
        }
        Ok(())
    }
}
