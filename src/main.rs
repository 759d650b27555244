//! Headless demo: brings audio up, plays a tone at the origin, walks a
//! listener in a circle around it, shuts down
//!
//! Usage: `audio-runtime [settings.ron]`

use std::time::Duration;

use audio_runtime::audio::rodio_backend::pcm16_wav;
use audio_runtime::prelude::*;

const FRAMES: u64 = 120;
const FRAME_TIME: Duration = Duration::from_millis(16);
const TONE_RATE: u32 = 44_100;
const TONE_HZ: f32 = 440.0;

/// Two seconds of a sine tone, faded out so it ends without a click
fn tone() -> Vec<i16> {
    let len = TONE_RATE as usize * 2;
    (0..len)
        .map(|i| {
            let t = i as f32 / TONE_RATE as f32;
            let fade = 1.0 - i as f32 / len as f32;
            let sample = (t * TONE_HZ * std::f32::consts::TAU).sin() * fade * 0.3;
            (sample * f32::from(i16::MAX)) as i16
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    log::info!(
        "Starting audio runtime ({} channels)",
        settings.audio.max_channels
    );

    let mut engine = Engine::new(settings, RodioBackend::create);
    if engine.audio().state() == AudioState::Failed {
        log::warn!("Audio unavailable, continuing without sound");
    }

    engine.load_world("demo");
    engine.context_mut().world.spawn((
        Name::new("Listener"),
        Transform::from_position(Vec3::new(0.0, 1.7, 0.0)),
        AudioListener,
    ));
    let listener = engine
        .activate_tagged_listener()
        .ok_or("demo world has no listener")?;
    engine.set_mode(EngineMode::Game);

    if let Some(backend) = engine.audio_mut().backend_mut() {
        if let Err(e) = backend.play_at(pcm16_wav(&tone(), TONE_RATE), Vec3::ZERO) {
            log::warn!("Could not play demo tone: {e}");
        }
    }

    for frame in 0..FRAMES {
        let angle = frame as f32 / FRAMES as f32 * std::f32::consts::TAU;
        if let Ok(mut transform) = engine.context_mut().world.get_mut::<Transform>(listener) {
            transform.position = Vec3::new(angle.cos() * 5.0, 1.7, angle.sin() * 5.0);
            transform.rotation = Quat::from_rotation_y(-angle);
        }

        engine.tick();
        std::thread::sleep(FRAME_TIME);
    }

    let ctx = engine.context();
    for line in ctx.debug.get_all_lines(&ctx.profiler) {
        log::info!("{line}");
    }

    engine.unload_world();
    engine.shutdown();
    Ok(())
}
