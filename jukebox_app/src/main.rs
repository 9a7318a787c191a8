//! Jukebox demo application
//!
//! Exercises the audio stack end to end: loads the banks shipped under
//! `resources/banks`, starts a music track with a fade-in, fires a
//! positioned one-shot partway through, and pumps the director at roughly
//! frame rate before shutting down cleanly.

use sound_engine::prelude::*;
use std::time::{Duration, Instant};

const FRAME_TIME: Duration = Duration::from_millis(16);
const DEMO_SECONDS: f32 = 6.0;

fn run() -> Result<(), AudioError> {
    let settings = match AudioSettings::load_from_file("resources/audio_settings.toml") {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Falling back to default audio settings: {e}");
            AudioSettings::default()
        }
    };

    log::info!("Creating audio engine...");
    let mut engine = AudioEngine::new();
    engine.initialize(&settings)?;

    let mut director = AudioDirector::new(settings);
    match director.load_banks(&mut engine) {
        Ok(count) => log::info!("Jukebox ready with {count} bank(s)"),
        Err(e) => log::error!("Bank loading failed: {e}"),
    }

    engine.set_listener(Vec3::zeros(), -Vec3::z(), Vec3::y());

    if let Err(e) = director.play_music(&mut engine, "event:/Music/Theme", Some(2.0)) {
        log::error!("Could not start music: {e}");
    }

    let start = Instant::now();
    let mut last_frame = start;
    let mut one_shot_fired = false;

    while start.elapsed().as_secs_f32() < DEMO_SECONDS {
        let now = Instant::now();
        let delta_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        if !one_shot_fired && start.elapsed().as_secs_f32() > 3.0 {
            one_shot_fired = true;
            log::info!("Firing positioned one-shot");
            if let Err(e) = director.play_one_shot(
                &mut engine,
                "event:/SFX/Blip",
                Some(Vec3::new(2.0, 0.0, -1.0)),
            ) {
                log::error!("One-shot failed: {e}");
            }
        }

        director.update(&mut engine, delta_time);
        std::thread::sleep(FRAME_TIME);
    }

    log::info!(
        "Demo finished ({} voice(s) still playing)",
        engine.playing_voice_count()
    );
    director.stop_music(&mut engine, true);
    engine.shutdown();
    Ok(())
}

fn main() {
    sound_engine::foundation::logging::init();

    if let Err(e) = run() {
        log::error!("Jukebox failed: {e}");
        std::process::exit(1);
    }
}
