//! The retained bitmap the engine draws into
//!
//! One surface per game: it is replaced, never resized, when a new game
//! reports different dimensions.

use std::path::Path;

use glam::Vec2;
use tiny_skia::{Pixmap, PremultipliedColorU8};

use super::blitter::{BlitterHandle, BlitterStore};
use super::palette::Palette;
use super::raster::Raster;
use super::shapes;
use super::text::{FontType, TextAlign, TextRenderer};
use super::DrawingApi;
use crate::coords::CoordinateSpace;
use crate::error::{BridgeError, BridgeResult};

pub struct DrawingSurface {
    raster: Raster,
    palette: Palette,
    text: TextRenderer,
    blitters: BlitterStore,
    status: Option<String>,
    /// Set by any primitive or update notice, cleared by the host's redraw.
    dirty: bool,
    in_draw: bool,
}

impl DrawingSurface {
    /// Allocate a surface and clear it to the palette background.
    pub fn new(space: CoordinateSpace, palette: Palette, text: TextRenderer) -> BridgeResult<Self> {
        let mut raster = Raster::new(space)?;
        raster.clear(palette.background());
        log::debug!(
            "allocated {}x{} surface, {} colours",
            space.width(),
            space.height(),
            palette.len()
        );
        Ok(Self {
            raster,
            palette,
            text,
            blitters: BlitterStore::new(),
            status: None,
            dirty: true,
            in_draw: false,
        })
    }

    pub fn space(&self) -> &CoordinateSpace {
        self.raster.space()
    }

    pub fn pixmap(&self) -> &Pixmap {
        self.raster.pixmap()
    }

    /// Pixel at an engine-space location.
    pub fn pixel(&self, x: i32, y: i32) -> Option<PremultipliedColorU8> {
        self.raster.pixel(x, y)
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_clipped(&self) -> bool {
        self.raster.is_clipped()
    }

    pub fn live_blitters(&self) -> usize {
        self.blitters.live()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear and return the redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn save_png(&self, path: &Path) -> BridgeResult<()> {
        self.raster
            .pixmap()
            .save_png(path)
            .map_err(|e| BridgeError::Io(std::io::Error::other(e.to_string())))
    }

    /// Engine pixel centre in raster space.
    fn centre(&self, x: i32, y: i32) -> Vec2 {
        let space = self.raster.space();
        Vec2::new(x as f32 + 0.5, space.to_raster_yf(y as f32 + 0.5))
    }
}

impl DrawingApi for DrawingSurface {
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        _font: FontType,
        size: i32,
        align: TextAlign,
        colour: i32,
        text: &str,
    ) {
        if text.is_empty() {
            log::debug!("empty text at ({}, {}), skipped", x, y);
            return;
        }
        let Some(colour) = self.palette.resolve(colour) else {
            return;
        };
        let size = size as f32;
        let anchor = self.raster.space().to_raster(x, y);
        let origin = self.text.anchor(text, anchor, size, align);
        self.text.draw(&mut self.raster, text, origin, size, colour);
        self.dirty = true;
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: i32) {
        let Some(colour) = self.palette.resolve(colour) else {
            return;
        };
        let ry = self.raster.space().to_raster_y(y, h);
        let Some(rect) = shapes::rect(x as f32, ry as f32, w as f32, h as f32) else {
            return;
        };
        self.raster.fill_rect(rect, colour);
        self.dirty = true;
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: i32) {
        let Some(colour) = self.palette.resolve(colour) else {
            return;
        };
        if let Some(path) = shapes::line(self.centre(x1, y1), self.centre(x2, y2)) {
            self.raster.stroke_path(&path, colour, 1.0);
            self.dirty = true;
        }
    }

    fn draw_polygon(&mut self, points: &[(i32, i32)], fill: i32, outline: i32) {
        let points: Vec<Vec2> = points.iter().map(|&(x, y)| self.centre(x, y)).collect();
        let Some(path) = shapes::polygon(&points) else {
            return;
        };
        if let Some(fill) = self.palette.resolve(fill) {
            self.raster.fill_path(&path, fill);
        }
        if let Some(outline) = self.palette.resolve(outline) {
            self.raster.stroke_path(&path, outline, 1.0);
        }
        self.dirty = true;
    }

    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, fill: i32, outline: i32) {
        let Some(path) = shapes::circle(self.centre(cx, cy), radius as f32) else {
            return;
        };
        if let Some(fill) = self.palette.resolve(fill) {
            self.raster.fill_path(&path, fill);
        }
        if let Some(outline) = self.palette.resolve(outline) {
            self.raster.stroke_path(&path, outline, 1.0);
        }
        self.dirty = true;
    }

    fn draw_thick_line(&mut self, thickness: f32, x1: f32, y1: f32, x2: f32, y2: f32, colour: i32) {
        let Some(colour) = self.palette.resolve(colour) else {
            return;
        };
        let space = self.raster.space();
        let a = Vec2::new(x1, space.to_raster_yf(y1));
        let b = Vec2::new(x2, space.to_raster_yf(y2));
        if let Some(path) = shapes::line(a, b) {
            self.raster.stroke_path(&path, colour, thickness.max(1.0));
            self.dirty = true;
        }
    }

    fn draw_update(&mut self, _x: i32, _y: i32, _w: i32, _h: i32) {
        self.dirty = true;
    }

    fn clip(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let ry = self.raster.space().to_raster_y(y, h);
        match shapes::rect(x as f32, ry as f32, w as f32, h as f32) {
            Some(rect) => self.raster.clip_to(rect),
            None => log::debug!("empty clip {}x{} ignored", w, h),
        }
    }

    fn unclip(&mut self) {
        self.raster.unclip();
    }

    fn start_draw(&mut self) {
        self.in_draw = true;
    }

    fn end_draw(&mut self) {
        self.in_draw = false;
        if self.raster.is_clipped() {
            log::debug!("draw batch ended while clipped");
        }
    }

    fn status_bar(&mut self, text: &str) {
        self.status = Some(text.to_string());
        self.dirty = true;
    }

    fn blitter_new(&mut self, w: i32, h: i32) -> BlitterHandle {
        self.blitters.create(w, h)
    }

    fn blitter_free(&mut self, handle: BlitterHandle) {
        self.blitters.free(handle);
    }

    fn blitter_save(&mut self, handle: BlitterHandle, x: i32, y: i32) {
        self.blitters.save(&self.raster, handle, x, y);
    }

    fn blitter_load(&mut self, handle: BlitterHandle, x: i32, y: i32) {
        self.blitters.load(&mut self.raster, handle, x, y);
        self.dirty = true;
    }
}
