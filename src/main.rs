//! Puzzle Host - native demo session
//!
//! Drives the reference engine through the bridge the way a touch UI
//! would, then writes the rendered puzzle and its save next to the
//! settings. Usage: `puzzle-host [output-dir]`.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use glam::Vec2;
use puzzle_host::effects::LogEffects;
use puzzle_host::engine::demo::{GAME_NAME, LightsOut};
use puzzle_host::keys::{HostKey, Modifiers};
use puzzle_host::settings::DefaultParams;
use puzzle_host::{
    BridgeResult, CoordinateSpace, EngineBridge, HostSettings, InteractionEngine, PuzzleUserSettings,
};

fn main() {
    env_logger::init();
    log::info!("Puzzle Host (native) starting...");

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    if let Err(e) = run(&out_dir) {
        log::error!("demo session failed: {}", e);
        std::process::exit(1);
    }
}

fn run(out_dir: &Path) -> BridgeResult<()> {
    let settings_path = out_dir.join("puzzle-host.json");
    let record_path = out_dir.join("lights.json");
    let settings = HostSettings::load(&settings_path);
    let mut record = PuzzleUserSettings::load(&record_path);

    let mut bridge = EngineBridge::new(Box::new(LightsOut::new()), settings.clone());
    bridge.set_redraw_listener(Box::new(|surface| {
        log::debug!(
            "redraw {}x{}",
            surface.space().width(),
            surface.space().height()
        );
    }));

    let (w, h) = bridge.start_with(&record)?;
    bridge.set_visible(true);
    log::info!("{} {} at {}x{}", GAME_NAME, bridge.game_id().unwrap_or_default(), w, h);

    // The image is shown at engine pixels / device pixel ratio.
    let dpr = settings.device_pixel_ratio.max(1.0);
    let mut interaction = InteractionEngine::new(&settings, Box::new(LogEffects));
    interaction.set_puzzle(
        CoordinateSpace::new(w, h),
        bridge.tilesize(),
        Vec2::new(w as f32, h as f32) / dpr,
    );

    // Tap the top-left light: its centre sits one tile in from each edge.
    let first = Vec2::splat(bridge.tilesize() as f32 / dpr);
    let now = Instant::now();
    interaction.touch_down(first, now);
    interaction.touch_up(first, now + Duration::from_millis(80), &mut bridge);

    // Then work the keyboard cursor.
    let plain = Modifiers::default();
    for key in [HostKey::Return, HostKey::Right, HostKey::Down, HostKey::Return] {
        interaction.host_key(key, plain, &mut bridge);
    }

    for _ in 0..60 {
        bridge.tick(1.0 / 60.0);
    }
    log::info!(
        "status {:?}, {}",
        bridge.status(),
        bridge.status_text().unwrap_or("")
    );

    if let Some(surface) = bridge.surface() {
        let png = out_dir.join("lights.png");
        surface.save_png(&png)?;
        log::info!("rendered puzzle written to {}", png.display());
    }
    bridge.export_savegame(out_dir, GAME_NAME)?;

    record.saved_game = bridge.save_game();
    record.preferences = Some(bridge.save_preferences());
    record.default_params = bridge.current_preset().map(DefaultParams::Preset);
    record.save(&record_path)?;
    settings.save(&settings_path)?;

    // Next game in the background, as the UI does after a win.
    bridge.start_generation()?;
    match bridge.wait_generation(Duration::from_secs(10)) {
        Some(Ok(_)) => log::info!("next game {}", bridge.game_id().unwrap_or_default()),
        Some(Err(e)) => log::warn!("{}", e),
        None => {
            log::warn!("generation still running, abandoning it");
            bridge.cancel_generation();
        }
    }
    Ok(())
}
