//! The host-facing puzzle bridge
//!
//! [`EngineBridge`] owns the engine handle for the active puzzle together
//! with its drawing surface, animation timer and config codec. Every outer
//! call runs the engine to completion against the surface and then tells
//! the redraw listener, once, if anything changed.
//!
//! The bridge is driven from one thread. Only game generation leaves it,
//! and then on a forked handle; while that runs, play input is refused.

pub mod generation;
pub mod timer;

pub use generation::PendingGeneration;
pub use timer::AnimationTimer;

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::consts::{DEFAULT_BACKGROUND, FRAME_INTERVAL};
use crate::coords::CoordinateSpace;
use crate::engine::{
    CancelToken, ConfigKind, ConfigMenu, ConfigMenuCodec, Frontend, Midend, PresetList, PuzzleStatus,
};
use crate::error::{BridgeError, BridgeResult};
use crate::input::KeySink;
use crate::keys::{KeyResult, NO_POSITION, UI_REDO, UI_UNDO};
use crate::renderer::{DrawingApi, DrawingSurface, Palette, TextRenderer};
use crate::settings::{DefaultParams, HostSettings, PuzzleUserSettings};
use crate::stream::{ByteStream, StreamRole};

/// Called with the surface after an engine call changed it.
pub type RedrawListener = Box<dyn FnMut(&DrawingSurface)>;

/// Name used in exported save files when no preset matches.
const CUSTOM_GAME: &str = "Custom Game";

/// What the engine sees of the host during one call.
struct HostFrontend<'a> {
    surface: &'a mut DrawingSurface,
    timer: &'a mut AnimationTimer,
}

impl Frontend for HostFrontend<'_> {
    fn drawing(&mut self) -> &mut dyn DrawingApi {
        &mut *self.surface
    }

    fn activate_timer(&mut self) {
        self.timer.activate();
    }

    fn deactivate_timer(&mut self) {
        self.timer.deactivate();
    }
}

pub struct EngineBridge {
    midend: Box<dyn Midend>,
    settings: HostSettings,
    codec: ConfigMenuCodec,
    text: TextRenderer,
    surface: Option<DrawingSurface>,
    timer: AnimationTimer,
    generation: Option<PendingGeneration>,
    redraw: Option<RedrawListener>,
}

impl EngineBridge {
    pub fn new(midend: Box<dyn Midend>, settings: HostSettings) -> Self {
        let text = TextRenderer::with_override(settings.font_path.as_deref());
        Self::with_text(midend, settings, text)
    }

    pub fn with_text(midend: Box<dyn Midend>, settings: HostSettings, text: TextRenderer) -> Self {
        let codec = ConfigMenuCodec::new(settings.config_exclusions.clone());
        Self {
            midend,
            settings,
            codec,
            text,
            surface: None,
            timer: AnimationTimer::new(),
            generation: None,
            redraw: None,
        }
    }

    pub fn set_redraw_listener(&mut self, listener: RedrawListener) {
        self.redraw = Some(listener);
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    pub fn game_name(&self) -> &str {
        self.midend.game_name()
    }

    pub fn surface(&self) -> Option<&DrawingSurface> {
        self.surface.as_ref()
    }

    /// Run one engine call against the surface, then signal a redraw if
    /// anything was drawn.
    fn with_frontend<R>(&mut self, call: impl FnOnce(&mut dyn Midend, &mut dyn Frontend) -> R) -> BridgeResult<R> {
        let surface = self.surface.as_mut().ok_or(BridgeError::NoActiveGame)?;
        let mut fe = HostFrontend {
            surface,
            timer: &mut self.timer,
        };
        let result = call(self.midend.as_mut(), &mut fe);
        self.signal_redraw();
        Ok(result)
    }

    fn signal_redraw(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if !surface.take_dirty() {
            return;
        }
        if let Some(listener) = self.redraw.as_mut() {
            listener(surface);
        }
    }

    // === Game lifecycle ===

    /// Start a game: resume `savegame` if it loads, otherwise generate one
    /// here and now. Returns the drawing size.
    pub fn new_game(&mut self, savegame: Option<&str>, prefs: Option<&str>) -> BridgeResult<(i32, i32)> {
        if self.generation.is_some() {
            return Err(BridgeError::GenerationInFlight);
        }
        if let Some(prefs) = prefs {
            let mut stream = ByteStream::from_text(StreamRole::Preferences, prefs);
            if let Err(e) = self.midend.load_prefs(&mut stream) {
                log::warn!("stored preferences rejected: {}", e);
            }
        }

        let resumed = match savegame {
            Some(text) => {
                let mut stream = ByteStream::from_text(StreamRole::SaveGame, text);
                match self.midend.deserialise(&mut stream) {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("saved game rejected, starting fresh: {}", e);
                        false
                    }
                }
            }
            None => false,
        };
        if !resumed {
            self.midend
                .new_game(&host_seed(), &CancelToken::new())
                .map_err(BridgeError::GenerationFailed)?;
        }
        self.install()
    }

    /// Size the freshly started game, give it a new surface and draw it.
    /// The old surface stays in place if the new one cannot be allocated.
    fn install(&mut self) -> BridgeResult<(i32, i32)> {
        let requested = self.settings.puzzle_size;
        let (w, h) = self
            .midend
            .size((requested, requested), true, self.settings.device_pixel_ratio);
        let colours = self.midend.colours([DEFAULT_BACKGROUND; 3]);
        let palette = Palette::from_rgb(&colours, self.settings.dark_theme);
        let surface = DrawingSurface::new(CoordinateSpace::new(w, h), palette, self.text.clone())?;
        self.timer.reset();
        self.surface = Some(surface);

        self.with_frontend(|midend, fe| midend.force_redraw(fe))?;
        log::info!(
            "{} game {} ready at {}x{}",
            self.midend.game_name(),
            self.midend.game_id().unwrap_or_default(),
            w,
            h
        );
        Ok((w, h))
    }

    /// Generate the next game in the background.
    pub fn start_generation(&mut self) -> BridgeResult<()> {
        if self.generation.is_some() {
            return Err(BridgeError::GenerationInFlight);
        }
        log::info!("generating new {} game", self.midend.game_name());
        self.generation = Some(PendingGeneration::spawn(self.midend.fork(), host_seed())?);
        Ok(())
    }

    pub fn is_generating(&self) -> bool {
        self.generation.is_some()
    }

    /// True once generation has run long enough to show a spinner.
    pub fn show_loading(&self) -> bool {
        self.generation.as_ref().is_some_and(|g| g.show_loading())
    }

    fn adopt(&mut self, outcome: BridgeResult<Box<dyn Midend>>) -> BridgeResult<(i32, i32)> {
        match outcome {
            Ok(midend) => {
                self.midend = midend;
                self.install()
            }
            Err(e) => {
                log::warn!("{}; keeping the previous puzzle", e);
                Err(e)
            }
        }
    }

    /// Adopt a finished generation. `None` while it is still running or
    /// when none was started.
    pub fn poll_generation(&mut self) -> Option<BridgeResult<(i32, i32)>> {
        let outcome = self.generation.as_mut()?.try_finish()?;
        self.generation = None;
        Some(self.adopt(outcome))
    }

    /// Like [`poll_generation`](Self::poll_generation) but blocks up to `timeout`.
    pub fn wait_generation(&mut self, timeout: Duration) -> Option<BridgeResult<(i32, i32)>> {
        let outcome = self.generation.as_mut()?.wait(timeout)?;
        self.generation = None;
        Some(self.adopt(outcome))
    }

    pub fn cancel_generation(&mut self) {
        if let Some(pending) = self.generation.take() {
            pending.cancel();
        }
    }

    /// Apply stored per-puzzle settings and start the first game.
    pub fn start_with(&mut self, record: &PuzzleUserSettings) -> BridgeResult<(i32, i32)> {
        match &record.default_params {
            Some(DefaultParams::Custom(items)) => {
                let menu = ConfigMenu {
                    kind: ConfigKind::Settings,
                    title: String::new(),
                    items: items.clone(),
                };
                if let Err(e) = self.write_config(&menu) {
                    log::warn!("stored custom parameters rejected: {}", e);
                }
            }
            Some(DefaultParams::Preset(id)) => {
                if self.presets().find(*id).is_some() {
                    self.midend.set_preset(*id);
                } else {
                    log::warn!("stored preset {} no longer exists", id);
                }
            }
            None => {}
        }
        self.new_game(record.saved_game.as_deref(), record.preferences.as_deref())
    }

    // === Play ===

    pub fn send_keypress(&mut self, x: i32, y: i32, code: i32) -> KeyResult {
        if self.generation.is_some() {
            log::debug!("key {:#x} ignored while generating", code);
            return KeyResult::Unused;
        }
        self.with_frontend(|midend, fe| midend.process_key(x, y, code, fe))
            .unwrap_or(KeyResult::Unused)
    }

    pub fn undo(&mut self) -> KeyResult {
        self.send_keypress(NO_POSITION.0, NO_POSITION.1, UI_UNDO)
    }

    pub fn redo(&mut self) -> KeyResult {
        self.send_keypress(NO_POSITION.0, NO_POSITION.1, UI_REDO)
    }

    pub fn can_undo(&self) -> bool {
        self.midend.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.midend.can_redo()
    }

    pub fn can_solve(&self) -> bool {
        self.midend.can_solve()
    }

    pub fn restart(&mut self) -> BridgeResult<()> {
        if self.generation.is_some() {
            return Err(BridgeError::GenerationInFlight);
        }
        self.with_frontend(|midend, fe| midend.restart_game(fe))
    }

    pub fn solve(&mut self) -> BridgeResult<()> {
        if self.generation.is_some() {
            return Err(BridgeError::GenerationInFlight);
        }
        self.with_frontend(|midend, fe| midend.solve(fe))?
            .map_err(BridgeError::Engine)
    }

    pub fn status(&self) -> PuzzleStatus {
        self.midend.status()
    }

    // === Animation ===

    /// The puzzle view appeared or went away.
    pub fn set_visible(&mut self, visible: bool) {
        self.timer.set_visible(visible);
    }

    pub fn is_animating(&self) -> bool {
        self.timer.is_running()
    }

    /// Feed frame time; runs any animation steps that are due.
    pub fn tick(&mut self, dt: f32) {
        if self.generation.is_some() {
            return;
        }
        let steps = self.timer.advance(dt);
        if steps == 0 {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let mut fe = HostFrontend {
            surface,
            timer: &mut self.timer,
        };
        for _ in 0..steps {
            self.midend.timer(FRAME_INTERVAL, &mut fe);
            if !fe.timer.is_requested() {
                break;
            }
        }
        self.signal_redraw();
    }

    // === Persistence ===

    /// Serialised game, only when there is progress worth resuming.
    pub fn save_game(&self) -> Option<String> {
        if !self.midend.can_undo() || self.midend.status() != PuzzleStatus::InProgress {
            return None;
        }
        let mut stream = ByteStream::new(StreamRole::SaveGame);
        self.midend.serialise(&mut stream);
        Some(stream.into_text())
    }

    /// Replace the current game with a saved one. On failure the current
    /// game is left as it was.
    pub fn load_game(&mut self, text: &str) -> BridgeResult<(i32, i32)> {
        if self.generation.is_some() {
            return Err(BridgeError::GenerationInFlight);
        }
        let previous = self.surface.is_some().then(|| {
            let mut stream = ByteStream::new(StreamRole::SaveGame);
            self.midend.serialise(&mut stream);
            stream.into_text()
        });
        let mut stream = ByteStream::from_text(StreamRole::SaveGame, text);
        self.midend
            .deserialise(&mut stream)
            .map_err(BridgeError::Engine)?;
        log::info!("loaded saved {} game", self.midend.game_name());

        let err = match self.install() {
            Ok(size) => return Ok(size),
            Err(e) => e,
        };
        if let Some(previous) = previous {
            log::warn!("saved game could not be shown, restoring the previous one: {}", err);
            let mut stream = ByteStream::from_text(StreamRole::SaveGame, &previous);
            let restored = self
                .midend
                .deserialise(&mut stream)
                .map_err(BridgeError::Engine)
                .and_then(|()| self.install());
            if let Err(e) = restored {
                log::error!("previous game could not be restored: {}", e);
            }
        }
        Err(err)
    }

    pub fn save_preferences(&self) -> String {
        let mut stream = ByteStream::new(StreamRole::Preferences);
        self.midend.save_prefs(&mut stream);
        stream.into_text()
    }

    pub fn load_preferences(&mut self, text: &str) -> BridgeResult<()> {
        let mut stream = ByteStream::from_text(StreamRole::Preferences, text);
        self.midend
            .load_prefs(&mut stream)
            .map_err(BridgeError::Engine)?;
        self.redraw_if_active();
        Ok(())
    }

    /// Puzzle kind a save belongs to, without loading it.
    pub fn identify_game(&self, text: &str) -> Option<String> {
        let mut stream = ByteStream::from_text(StreamRole::SaveGame, text);
        match self.midend.identify(&mut stream) {
            Ok(name) => Some(name),
            Err(e) => {
                log::warn!("cannot identify saved game: {}", e);
                None
            }
        }
    }

    pub fn savegame_filename(&self, title: &str) -> String {
        let preset = self
            .current_preset()
            .and_then(|id| self.presets().find(id).map(|p| p.title.clone()));
        format!("{} - {}.sav", title, preset.as_deref().unwrap_or(CUSTOM_GAME))
    }

    /// Write the current game into `dir`. `None` when there is nothing to save.
    pub fn export_savegame(&self, dir: &Path, title: &str) -> BridgeResult<Option<PathBuf>> {
        let Some(text) = self.save_game() else {
            return Ok(None);
        };
        let path = dir.join(self.savegame_filename(title));
        std::fs::write(&path, text)?;
        log::info!("exported game to {}", path.display());
        Ok(Some(path))
    }

    // === Presets and config ===

    pub fn presets(&self) -> PresetList {
        PresetList::flatten(&self.midend.presets())
    }

    pub fn current_preset(&self) -> Option<i32> {
        self.midend.which_preset()
    }

    /// Switch to a preset and start a game with it.
    pub fn set_preset(&mut self, id: i32) -> BridgeResult<(i32, i32)> {
        if self.generation.is_some() {
            return Err(BridgeError::GenerationInFlight);
        }
        if !self.midend.set_preset(id) {
            return Err(BridgeError::UnknownPreset(id));
        }
        log::info!("preset {} selected", id);
        self.new_game(None, None)
    }

    /// Current form of `kind`. Forms the engine lacks, or cannot describe
    /// properly, come back empty.
    pub fn config(&self, kind: ConfigKind) -> ConfigMenu {
        let Some(raw) = self.midend.get_config(kind) else {
            return ConfigMenu::empty(kind);
        };
        match self.codec.decode(kind, &raw) {
            Ok(menu) => menu,
            Err(e) => {
                log::warn!("{}", e);
                ConfigMenu::empty(kind)
            }
        }
    }

    fn write_config(&mut self, menu: &ConfigMenu) -> BridgeResult<()> {
        let mut raw = self
            .midend
            .get_config(menu.kind)
            .ok_or(BridgeError::NoConfig(menu.kind))?;
        self.codec.encode(menu, &mut raw.items);
        self.midend
            .set_config(menu.kind, &raw.items)
            .map_err(BridgeError::Engine)
    }

    /// Apply an edited form. Parameter, seed and game id forms start a new
    /// game and return its size; preferences just redraw.
    pub fn apply_config(&mut self, menu: &ConfigMenu) -> BridgeResult<Option<(i32, i32)>> {
        if self.generation.is_some() {
            return Err(BridgeError::GenerationInFlight);
        }
        self.write_config(menu)?;
        match menu.kind {
            ConfigKind::Preferences => {
                self.redraw_if_active();
                Ok(None)
            }
            ConfigKind::Settings | ConfigKind::Seed | ConfigKind::Description => {
                self.new_game(None, None).map(Some)
            }
        }
    }

    fn redraw_if_active(&mut self) {
        if self.surface.is_some() {
            let _ = self.with_frontend(|midend, fe| midend.force_redraw(fe));
        }
    }

    // === Queries ===

    pub fn game_id(&self) -> Option<String> {
        self.midend.game_id()
    }

    pub fn random_seed(&self) -> Option<String> {
        self.midend.random_seed()
    }

    pub fn tilesize(&self) -> i32 {
        self.midend.tilesize()
    }

    pub fn wants_statusbar(&self) -> bool {
        self.midend.wants_statusbar()
    }

    /// Status line text, when the engine uses one.
    pub fn status_text(&self) -> Option<&str> {
        if !self.wants_statusbar() {
            return None;
        }
        self.surface.as_ref()?.status_text()
    }
}

impl KeySink for EngineBridge {
    fn send_key(&mut self, x: i32, y: i32, code: i32) -> KeyResult {
        self.send_keypress(x, y, code)
    }
}

/// Seed for a fresh game: the current time.
fn host_seed() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}
