//! Lights: a small toggle-grid engine
//!
//! Pressing a cell flips it and its orthogonal neighbours; the puzzle is
//! solved when every light is off. It implements the whole [`Midend`]
//! contract (presets, every config form, undo/redo, save files,
//! preferences, a completion flash on the timer, blitter-backed cursor)
//! and exists to drive the host end to end.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{
    CancelToken, ConfigKind, Frontend, Midend, PresetMenuEntry, PuzzleStatus, RawConfig,
    RawConfigItem, RawConfigValue,
};
use crate::keys::*;
use crate::renderer::text::{ALIGN_HCENTRE, ALIGN_VCENTRE};
use crate::renderer::{BLITTER_FROMSAVED, BlitterHandle, FontType, NO_COLOUR, TextAlign};
use crate::stream::{ReadSource, WriteSink, read_line};

pub const GAME_NAME: &str = "Lights";

const COL_BACKGROUND: i32 = 0;
const COL_LIT: i32 = 1;
const COL_UNLIT: i32 = 2;
const COL_GRID: i32 = 3;
const COL_HIGHLIGHT: i32 = 4;

const FLASH_TIME: f32 = 0.3;
const FLASH_FRAME: f32 = 0.1;
const MIN_SIZE: i32 = 2;
const MAX_SIZE: i32 = 12;
const PREFERRED_TILE: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Difficulty {
    Easy,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Params {
    size: i32,
    difficulty: Difficulty,
}

impl Params {
    const fn new(size: i32, difficulty: Difficulty) -> Self {
        Self { size, difficulty }
    }

    fn cells(&self) -> usize {
        (self.size * self.size) as usize
    }

    /// Compact form, e.g. `5h` for 5x5 hard.
    fn encode(&self) -> String {
        let mut s = self.size.to_string();
        if self.difficulty == Difficulty::Hard {
            s.push('h');
        }
        s
    }

    fn decode(text: &str) -> Result<Self, String> {
        let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
        let size: i32 = digits
            .parse()
            .map_err(|_| format!("Invalid parameters '{text}'"))?;
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(format!("Size must be between {MIN_SIZE} and {MAX_SIZE}"));
        }
        let difficulty = match &text[digits.len()..] {
            "" => Difficulty::Easy,
            "h" => Difficulty::Hard,
            other => return Err(format!("Unknown parameter flags '{other}'")),
        };
        Ok(Params::new(size, difficulty))
    }
}

const PRESETS: [(&str, Params); 4] = [
    ("3x3 Easy", Params::new(3, Difficulty::Easy)),
    ("5x5 Easy", Params::new(5, Difficulty::Easy)),
    ("5x5 Hard", Params::new(5, Difficulty::Hard)),
    ("7x7 Hard", Params::new(7, Difficulty::Hard)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Prefs {
    show_moves: bool,
    ctrl_free: bool,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            show_moves: true,
            ctrl_free: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Move {
    Press(usize),
    /// Several presses at once (solve, restart).
    Many(Vec<usize>),
}

impl Move {
    fn encode(&self) -> String {
        match self {
            Move::Press(i) => format!("p{i}"),
            Move::Many(cells) => {
                let list: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
                format!("m{}", list.join("."))
            }
        }
    }

    fn decode(text: &str, cells: usize) -> Result<Self, String> {
        let bad = || format!("Invalid move '{text}'");
        let check = |i: usize| if i < cells { Ok(i) } else { Err(bad()) };
        if let Some(rest) = text.strip_prefix('p') {
            let i = rest.parse().map_err(|_| bad())?;
            Ok(Move::Press(check(i)?))
        } else if let Some(rest) = text.strip_prefix('m') {
            if rest.is_empty() {
                return Ok(Move::Many(Vec::new()));
            }
            let cells = rest
                .split('.')
                .map(|s| s.parse().map_err(|_| bad()).and_then(check))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Move::Many(cells))
        } else {
            Err(bad())
        }
    }

    fn cells(&self) -> &[usize] {
        match self {
            Move::Press(i) => std::slice::from_ref(i),
            Move::Many(cells) => cells,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    Seed,
    Description,
}

pub struct LightsOut {
    /// Parameters for the next game.
    params: Params,
    /// Parameters of the game on the board.
    board: Params,
    prefs: Prefs,

    // Set through the seed / game id forms, consumed by the next new game.
    pending: Pending,
    pending_text: String,

    seed: Option<String>,
    initial: Vec<bool>,
    /// Presses that produced `initial`, when known.
    scramble: Option<Vec<bool>>,
    lit: Vec<bool>,
    moves: Vec<Move>,
    undone: Vec<Move>,
    completed: bool,

    cursor: (i32, i32),
    cursor_visible: bool,
    pressed: Option<usize>,

    tile: i32,
    border: i32,
    flash: Option<f32>,
    cursor_blitter: Option<BlitterHandle>,
    cursor_saved: bool,
}

impl Default for LightsOut {
    fn default() -> Self {
        Self::with_params(PRESETS[1].1, Prefs::default())
    }
}

impl LightsOut {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_params(params: Params, prefs: Prefs) -> Self {
        Self {
            params,
            board: params,
            prefs,
            pending: Pending::None,
            pending_text: String::new(),
            seed: None,
            initial: Vec::new(),
            scramble: None,
            lit: Vec::new(),
            moves: Vec::new(),
            undone: Vec::new(),
            completed: false,
            cursor: (0, 0),
            cursor_visible: false,
            pressed: None,
            tile: PREFERRED_TILE as i32,
            border: PREFERRED_TILE as i32 / 2,
            flash: None,
            cursor_blitter: None,
            cursor_saved: false,
        }
    }

    fn n(&self) -> i32 {
        self.board.size
    }

    fn canvas(&self) -> i32 {
        self.n() * self.tile + 2 * self.border
    }

    fn toggle(lit: &mut [bool], params: &Params, cell: usize) {
        let n = params.size;
        let (r, c) = ((cell as i32) / n, (cell as i32) % n);
        for (r, c) in [(r, c), (r - 1, c), (r + 1, c), (r, c - 1), (r, c + 1)] {
            if (0..n).contains(&r) && (0..n).contains(&c) {
                let i = (r * n + c) as usize;
                lit[i] = !lit[i];
            }
        }
    }

    fn apply(&mut self, mv: &Move) {
        for &cell in mv.cells() {
            Self::toggle(&mut self.lit, &self.board, cell);
        }
    }

    /// Cells pressed an odd number of times since the start.
    fn press_parity(&self) -> Vec<bool> {
        let mut parity = vec![false; self.board.cells()];
        for mv in &self.moves {
            for &cell in mv.cells() {
                parity[cell] = !parity[cell];
            }
        }
        parity
    }

    fn is_solved(&self) -> bool {
        !self.lit.is_empty() && self.lit.iter().all(|l| !l)
    }

    fn reset_play(&mut self) {
        self.lit = self.initial.clone();
        self.moves.clear();
        self.undone.clear();
        self.completed = false;
        self.cursor = (0, 0);
        self.cursor_visible = false;
        self.pressed = None;
        self.flash = None;
    }

    fn record(&mut self, mv: Move, fe: &mut dyn Frontend) {
        self.apply(&mv);
        self.moves.push(mv);
        self.undone.clear();
        if self.is_solved() && !self.completed {
            self.completed = true;
            self.flash = Some(0.0);
            fe.activate_timer();
        }
    }

    fn cell_at(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (x - self.border, y - self.border);
        if x < 0 || y < 0 || self.tile <= 0 {
            return None;
        }
        let (c, r) = (x / self.tile, y / self.tile);
        (c < self.n() && r < self.n()).then_some((r * self.n() + c) as usize)
    }

    fn cursor_cell(&self) -> usize {
        (self.cursor.1 * self.n() + self.cursor.0) as usize
    }

    fn flash_on(&self) -> bool {
        self.flash
            .is_some_and(|t| ((t / FLASH_FRAME) as i32) % 2 == 0)
    }

    fn status_text(&self) -> String {
        let count = self.moves.len();
        if self.completed {
            format!("Solved in {count} moves")
        } else if self.prefs.show_moves {
            format!("Moves: {count}")
        } else {
            String::new()
        }
    }

    fn redraw(&mut self, fe: &mut dyn Frontend, full: bool) {
        if self.lit.is_empty() {
            return;
        }
        let cells = self.board.cells();
        let (tile, border, canvas) = (self.tile, self.border, self.canvas());
        let dr = fe.drawing();
        dr.start_draw();

        if full || self.cursor_blitter.is_none() {
            dr.draw_rect(0, 0, canvas, canvas, COL_BACKGROUND);
            dr.draw_text(
                canvas / 2,
                border / 2,
                FontType::Variable,
                (border / 2).max(6),
                TextAlign::from_raw(ALIGN_HCENTRE | ALIGN_VCENTRE),
                COL_GRID,
                GAME_NAME,
            );
            dr.draw_update(0, 0, canvas, canvas);
            if let Some(old) = self.cursor_blitter.take() {
                dr.blitter_free(old);
            }
            self.cursor_blitter = Some(dr.blitter_new(tile, tile));
            self.cursor_saved = false;
        } else if self.cursor_saved {
            if let Some(bl) = self.cursor_blitter {
                dr.blitter_load(bl, BLITTER_FROMSAVED, BLITTER_FROMSAVED);
            }
            self.cursor_saved = false;
        }

        let flash = self.flash_on();
        for cell in 0..cells {
            let lit = self.lit[cell];
            let x = border + (cell as i32 % self.n()) * tile;
            let y = border + (cell as i32 / self.n()) * tile;
            let colour = if flash {
                COL_HIGHLIGHT
            } else if lit {
                COL_LIT
            } else {
                COL_UNLIT
            };
            dr.clip(x, y, tile, tile);
            dr.draw_rect(x, y, tile, tile, COL_GRID);
            dr.draw_rect(x + 1, y + 1, tile - 2, tile - 2, colour);
            if lit {
                dr.draw_circle(x + tile / 2, y + tile / 2, (tile / 6).max(1), COL_BACKGROUND, COL_GRID);
            }
            dr.unclip();
            dr.draw_update(x, y, tile, tile);
        }

        if self.cursor_visible {
            if let Some(bl) = self.cursor_blitter {
                let x = border + self.cursor.0 * tile;
                let y = border + self.cursor.1 * tile;
                dr.blitter_save(bl, x, y);
                self.cursor_saved = true;
                let (cx, cy, r) = (x + tile / 2, y + tile / 2, tile / 3);
                let diamond = [(cx, cy - r), (cx + r, cy), (cx, cy + r), (cx - r, cy)];
                dr.draw_polygon(&diamond, NO_COLOUR, COL_HIGHLIGHT);
                let underline = (y + tile - 3) as f32;
                dr.draw_thick_line(
                    2.0,
                    (cx - r) as f32,
                    underline,
                    (cx + r) as f32,
                    underline,
                    COL_HIGHLIGHT,
                );
                dr.draw_update(x, y, tile, tile);
            }
        }

        let status = self.status_text();
        dr.status_bar(&status);
        dr.end_draw();
    }

    fn move_cursor(&mut self, code: i32) -> KeyResult {
        let n = self.n();
        let (mut c, mut r) = self.cursor;
        match code {
            CURSOR_UP => r -= 1,
            CURSOR_DOWN => r += 1,
            CURSOR_LEFT => c -= 1,
            _ => c += 1,
        }
        c = c.clamp(0, n - 1);
        r = r.clamp(0, n - 1);
        let changed = (c, r) != self.cursor || !self.cursor_visible;
        self.cursor = (c, r);
        self.cursor_visible = true;
        if changed {
            KeyResult::SomeEffect
        } else {
            KeyResult::NoEffect
        }
    }

    fn seed_hash(seed: &str) -> u64 {
        // FNV-1a; stable across runs and platforms.
        seed.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
            (h ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
        })
    }

    fn decode_bits(bits: &str, cells: usize) -> Result<Vec<bool>, String> {
        if bits.len() != cells {
            return Err("Game description has wrong length".to_string());
        }
        bits.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err("Game description may only contain 0 and 1".to_string()),
            })
            .collect()
    }

    fn encode_bits(bits: &[bool]) -> String {
        bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }

    fn parse_game_id(text: &str) -> Result<(Params, Vec<bool>), String> {
        let (params, bits) = text
            .split_once(':')
            .ok_or_else(|| "Game ID is missing ':'".to_string())?;
        let params = Params::decode(params)?;
        let lit = Self::decode_bits(bits, params.cells())?;
        Ok((params, lit))
    }

    fn config_string(items: &[RawConfigItem], index: usize) -> Result<&str, String> {
        match items.get(index).map(|i| &i.value) {
            Some(RawConfigValue::String(s)) => Ok(s),
            _ => Err("Malformed configuration".to_string()),
        }
    }

    fn config_bool(items: &[RawConfigItem], index: usize) -> Result<bool, String> {
        match items.get(index).map(|i| &i.value) {
            Some(RawConfigValue::Boolean(b)) => Ok(*b),
            _ => Err("Malformed configuration".to_string()),
        }
    }
}

impl Midend for LightsOut {
    fn game_name(&self) -> &str {
        GAME_NAME
    }

    fn fork(&self) -> Box<dyn Midend> {
        let mut forked = Self::with_params(self.params, self.prefs);
        forked.pending = self.pending;
        forked.pending_text = self.pending_text.clone();
        Box::new(forked)
    }

    fn new_game(&mut self, seed: &str, cancel: &CancelToken) -> Result<(), String> {
        if cancel.is_cancelled() {
            return Err("Generation cancelled".to_string());
        }

        if self.pending == Pending::Description {
            let (params, lit) = Self::parse_game_id(&self.pending_text)?;
            self.params = params;
            self.board = params;
            self.initial = lit;
            self.scramble = None;
            self.seed = None;
        } else {
            let seed = if self.pending == Pending::Seed {
                self.pending_text.clone()
            } else {
                seed.to_string()
            };
            let mut rng = Pcg32::seed_from_u64(Self::seed_hash(&seed));
            let cells = self.params.cells();
            let presses = match self.params.difficulty {
                Difficulty::Easy => self.params.size as usize,
                Difficulty::Hard => (cells / 2).max(1),
            };
            let mut scramble = vec![false; cells];
            for _ in 0..presses {
                if cancel.is_cancelled() {
                    return Err("Generation cancelled".to_string());
                }
                let cell = rng.random_range(0..cells);
                scramble[cell] = !scramble[cell];
            }
            let mut lit = vec![false; cells];
            for (cell, &pressed) in scramble.iter().enumerate() {
                if pressed {
                    Self::toggle(&mut lit, &self.params, cell);
                }
            }
            if lit.iter().all(|l| !l) {
                scramble[0] = !scramble[0];
                Self::toggle(&mut lit, &self.params, 0);
            }
            self.board = self.params;
            self.initial = lit;
            self.scramble = Some(scramble);
            self.seed = Some(seed);
        }

        self.pending = Pending::None;
        self.pending_text.clear();
        self.reset_play();
        log::debug!("{} generated {}", GAME_NAME, self.board.encode());
        Ok(())
    }

    fn size(&mut self, requested: (i32, i32), user_size: bool, device_pixel_ratio: f32) -> (i32, i32) {
        let n = self.n();
        let preferred = (PREFERRED_TILE * device_pixel_ratio) as i32;
        let fit = requested.0.min(requested.1) / (n + 1);
        self.tile = (if user_size { fit } else { preferred.min(fit) }).max(4);
        self.border = self.tile / 2;
        // A resize comes with a fresh surface.
        self.cursor_blitter = None;
        self.cursor_saved = false;
        let canvas = self.canvas();
        (canvas, canvas)
    }

    fn tilesize(&self) -> i32 {
        self.tile
    }

    fn colours(&self, background: [f32; 3]) -> Vec<[f32; 3]> {
        vec![
            background,
            [1.0, 0.85, 0.2],
            [0.25, 0.25, 0.3],
            [0.0, 0.0, 0.0],
            [0.3, 0.5, 1.0],
        ]
    }

    fn force_redraw(&mut self, fe: &mut dyn Frontend) {
        self.redraw(fe, true);
    }

    fn process_key(&mut self, x: i32, y: i32, button: i32, fe: &mut dyn Frontend) -> KeyResult {
        if self.lit.is_empty() {
            return KeyResult::Unused;
        }
        let code = button & !MOD_MASK;
        let result = match code {
            UI_QUIT => return KeyResult::Quit,
            c if c == 'q' as i32 && ((button & MOD_CTRL) != 0 || self.prefs.ctrl_free) => {
                return KeyResult::Quit;
            }
            UI_UNDO => match self.moves.pop() {
                Some(mv) => {
                    self.apply(&mv);
                    self.undone.push(mv);
                    self.completed = self.is_solved();
                    KeyResult::SomeEffect
                }
                None => KeyResult::NoEffect,
            },
            UI_REDO => match self.undone.pop() {
                Some(mv) => {
                    self.apply(&mv);
                    self.moves.push(mv);
                    self.completed = self.is_solved();
                    KeyResult::SomeEffect
                }
                None => KeyResult::NoEffect,
            },
            _ if self.completed && !is_cursor_move(code) => KeyResult::NoEffect,
            LEFT_BUTTON => {
                self.pressed = self.cell_at(x, y);
                if std::mem::take(&mut self.cursor_visible) {
                    KeyResult::SomeEffect
                } else {
                    KeyResult::NoEffect
                }
            }
            LEFT_DRAG => {
                if self.pressed.is_some() && self.pressed != self.cell_at(x, y) {
                    self.pressed = None;
                }
                KeyResult::NoEffect
            }
            LEFT_RELEASE => match self.pressed.take() {
                Some(cell) if Some(cell) == self.cell_at(x, y) => {
                    self.record(Move::Press(cell), fe);
                    KeyResult::SomeEffect
                }
                _ => KeyResult::NoEffect,
            },
            RIGHT_BUTTON | RIGHT_DRAG | RIGHT_RELEASE => KeyResult::NoEffect,
            CURSOR_UP | CURSOR_DOWN | CURSOR_LEFT | CURSOR_RIGHT => self.move_cursor(code),
            CURSOR_SELECT => {
                if self.cursor_visible {
                    let cell = self.cursor_cell();
                    self.record(Move::Press(cell), fe);
                } else {
                    self.cursor_visible = true;
                }
                KeyResult::SomeEffect
            }
            _ => KeyResult::Unused,
        };
        if result == KeyResult::SomeEffect {
            self.redraw(fe, false);
        }
        result
    }

    fn timer(&mut self, tplus: f32, fe: &mut dyn Frontend) {
        let Some(elapsed) = self.flash else {
            fe.deactivate_timer();
            return;
        };
        let elapsed = elapsed + tplus;
        if elapsed >= FLASH_TIME {
            self.flash = None;
            fe.deactivate_timer();
        } else {
            self.flash = Some(elapsed);
        }
        self.redraw(fe, false);
    }

    fn restart_game(&mut self, fe: &mut dyn Frontend) {
        let parity = self.press_parity();
        let cells: Vec<usize> = (0..parity.len()).filter(|&i| parity[i]).collect();
        if cells.is_empty() {
            return;
        }
        self.apply(&Move::Many(cells.clone()));
        self.moves.push(Move::Many(cells));
        self.undone.clear();
        self.completed = self.is_solved();
        self.redraw(fe, false);
    }

    fn solve(&mut self, fe: &mut dyn Frontend) -> Result<(), String> {
        let Some(scramble) = &self.scramble else {
            return Err("Solution not known for this puzzle".to_string());
        };
        if self.is_solved() {
            return Err("Puzzle is already solved".to_string());
        }
        let parity = self.press_parity();
        let cells: Vec<usize> = (0..parity.len())
            .filter(|&i| scramble[i] != parity[i])
            .collect();
        let mv = Move::Many(cells);
        self.apply(&mv);
        self.moves.push(mv);
        self.undone.clear();
        // Solved by the engine: no completion flash.
        self.completed = true;
        self.redraw(fe, false);
        Ok(())
    }

    fn status(&self) -> PuzzleStatus {
        if self.is_solved() {
            PuzzleStatus::Solved
        } else {
            PuzzleStatus::InProgress
        }
    }

    fn can_undo(&self) -> bool {
        !self.moves.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    fn can_solve(&self) -> bool {
        true
    }

    fn can_configure(&self) -> bool {
        true
    }

    fn wants_statusbar(&self) -> bool {
        true
    }

    fn which_preset(&self) -> Option<i32> {
        PRESETS
            .iter()
            .position(|(_, p)| *p == self.params)
            .map(|i| i as i32)
    }

    fn presets(&self) -> Vec<PresetMenuEntry> {
        let entry = |i: usize| PresetMenuEntry::Preset {
            id: i as i32,
            title: PRESETS[i].0.to_string(),
        };
        vec![
            entry(0),
            entry(1),
            entry(2),
            PresetMenuEntry::Submenu {
                title: "Large".to_string(),
                entries: vec![entry(3)],
            },
        ]
    }

    fn set_preset(&mut self, id: i32) -> bool {
        match usize::try_from(id).ok().and_then(|i| PRESETS.get(i)) {
            Some((_, params)) => {
                self.params = *params;
                true
            }
            None => false,
        }
    }

    fn game_id(&self) -> Option<String> {
        if self.initial.is_empty() {
            return None;
        }
        Some(format!(
            "{}:{}",
            self.board.encode(),
            Self::encode_bits(&self.initial)
        ))
    }

    fn random_seed(&self) -> Option<String> {
        self.seed
            .as_ref()
            .map(|s| format!("{}#{}", self.board.encode(), s))
    }

    fn get_config(&self, kind: ConfigKind) -> Option<RawConfig> {
        let (title, mut items) = match kind {
            ConfigKind::Settings => (
                format!("{GAME_NAME} configuration"),
                vec![
                    RawConfigItem::new("Size", RawConfigValue::String(self.params.size.to_string())),
                    RawConfigItem::new(
                        "Difficulty",
                        RawConfigValue::Choices {
                            names: ":Easy:Hard".to_string(),
                            selected: match self.params.difficulty {
                                Difficulty::Easy => 0,
                                Difficulty::Hard => 1,
                            },
                        },
                    ),
                ],
            ),
            ConfigKind::Seed => (
                format!("{GAME_NAME} random seed"),
                vec![RawConfigItem::new(
                    "Game random seed",
                    RawConfigValue::String(self.random_seed().unwrap_or_default()),
                )],
            ),
            ConfigKind::Description => (
                format!("{GAME_NAME} game ID"),
                vec![RawConfigItem::new(
                    "Game ID",
                    RawConfigValue::String(self.game_id().unwrap_or_default()),
                )],
            ),
            ConfigKind::Preferences => (
                format!("{GAME_NAME} preferences"),
                vec![
                    RawConfigItem::new("Show move count", RawConfigValue::Boolean(self.prefs.show_moves)),
                    RawConfigItem::new(
                        "Keyboard shortcuts without Ctrl",
                        RawConfigValue::Boolean(self.prefs.ctrl_free),
                    ),
                ],
            ),
        };
        items.push(RawConfigItem::end());
        Some(RawConfig { title, items })
    }

    fn set_config(&mut self, kind: ConfigKind, items: &[RawConfigItem]) -> Result<(), String> {
        match kind {
            ConfigKind::Settings => {
                let size: i32 = Self::config_string(items, 0)?
                    .trim()
                    .parse()
                    .map_err(|_| "Size must be a number".to_string())?;
                if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
                    return Err(format!("Size must be between {MIN_SIZE} and {MAX_SIZE}"));
                }
                let difficulty = match items.get(1).map(|i| &i.value) {
                    Some(RawConfigValue::Choices { selected: 0, .. }) => Difficulty::Easy,
                    Some(RawConfigValue::Choices { selected: 1, .. }) => Difficulty::Hard,
                    _ => return Err("Unknown difficulty".to_string()),
                };
                self.params = Params::new(size, difficulty);
            }
            ConfigKind::Seed => {
                let text = Self::config_string(items, 0)?.trim();
                let seed = match text.split_once('#') {
                    Some((params, seed)) => {
                        let params = Params::decode(params)?;
                        self.params = params;
                        seed
                    }
                    None => text,
                };
                if seed.is_empty() {
                    return Err("Seed must not be empty".to_string());
                }
                self.pending = Pending::Seed;
                self.pending_text = seed.to_string();
            }
            ConfigKind::Description => {
                let text = Self::config_string(items, 0)?.trim().to_string();
                let (params, _) = Self::parse_game_id(&text)?;
                self.params = params;
                self.pending = Pending::Description;
                self.pending_text = text;
            }
            ConfigKind::Preferences => {
                let show_moves = Self::config_bool(items, 0)?;
                let ctrl_free = Self::config_bool(items, 1)?;
                self.prefs = Prefs {
                    show_moves,
                    ctrl_free,
                };
                    }
        }
        Ok(())
    }

    fn serialise(&self, sink: &mut dyn WriteSink) {
        let mut line = |key: &str, value: &str| {
            sink.write(key.as_bytes());
            sink.write(b":");
            sink.write(value.as_bytes());
            sink.write(b"\n");
        };
        line("GAME", GAME_NAME);
        line("PARAMS", &self.board.encode());
        if let Some(seed) = &self.seed {
            line("SEED", seed);
        }
        line("DESC", &Self::encode_bits(&self.initial));
        if let Some(scramble) = &self.scramble {
            line("SCRAMBLE", &Self::encode_bits(scramble));
        }
        let moves: Vec<String> = self.moves.iter().map(Move::encode).collect();
        line("MOVES", &moves.join(","));
    }

    fn deserialise(&mut self, source: &mut dyn ReadSource) -> Result<(), String> {
        let mut params = None;
        let mut seed = None;
        let mut desc = None;
        let mut scramble = None;
        let mut moves_text = None;

        let mut first = true;
        while let Some(line) = read_line(source) {
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| "Save file is malformed".to_string())?;
            if first {
                if key != "GAME" {
                    return Err("This does not look like a save file".to_string());
                }
                if value != GAME_NAME {
                    return Err(format!("Save file is for {value}, not {GAME_NAME}"));
                }
                first = false;
                continue;
            }
            match key {
                "PARAMS" => params = Some(Params::decode(value)?),
                "SEED" => seed = Some(value.to_string()),
                "DESC" => desc = Some(value.to_string()),
                "SCRAMBLE" => scramble = Some(value.to_string()),
                "MOVES" => moves_text = Some(value.to_string()),
                other => log::debug!("ignoring save key {}", other),
            }
        }
        if first {
            return Err("Save file is empty".to_string());
        }

        let params = params.ok_or_else(|| "Save file has no parameters".to_string())?;
        let cells = params.cells();
        let initial = Self::decode_bits(
            &desc.ok_or_else(|| "Save file has no game description".to_string())?,
            cells,
        )?;
        let scramble = scramble
            .map(|s| Self::decode_bits(&s, cells))
            .transpose()?;
        let moves = match moves_text.as_deref() {
            None | Some("") => Vec::new(),
            Some(text) => text
                .split(',')
                .map(|m| Move::decode(m, cells))
                .collect::<Result<Vec<_>, _>>()?,
        };

        // Everything parsed; commit.
        self.params = params;
        self.board = params;
        self.seed = seed;
        self.initial = initial;
        self.scramble = scramble;
        self.reset_play();
        for mv in &moves {
            for &cell in mv.cells() {
                Self::toggle(&mut self.lit, &self.board, cell);
            }
        }
        self.moves = moves;
        self.completed = self.is_solved();
        Ok(())
    }

    fn save_prefs(&self, sink: &mut dyn WriteSink) {
        let flag = |b: bool| if b { "1" } else { "0" };
        sink.write(format!("show-moves={}\n", flag(self.prefs.show_moves)).as_bytes());
        sink.write(format!("ctrl-free={}\n", flag(self.prefs.ctrl_free)).as_bytes());
    }

    fn load_prefs(&mut self, source: &mut dyn ReadSource) -> Result<(), String> {
        let mut prefs = self.prefs;
        while let Some(line) = read_line(source) {
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| format!("Malformed preference line '{line}'"))?;
            let value = match value {
                "1" => true,
                "0" => false,
                _ => return Err(format!("Invalid value for preference '{key}'")),
            };
            match key {
                "show-moves" => prefs.show_moves = value,
                "ctrl-free" => prefs.ctrl_free = value,
                other => log::debug!("ignoring unknown preference {}", other),
            }
        }
        self.prefs = prefs;
        Ok(())
    }

    fn identify(&self, source: &mut dyn ReadSource) -> Result<String, String> {
        match read_line(source).as_deref().and_then(|l| l.split_once(':')) {
            Some(("GAME", name)) if !name.is_empty() => Ok(name.to_string()),
            _ => Err("This does not look like a save file".to_string()),
        }
    }
}
