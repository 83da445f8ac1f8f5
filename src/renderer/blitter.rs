//! Blitters: saved rectangular fragments of the raster
//!
//! The engine uses these for flicker-free animation: save what is under a
//! sprite, draw the sprite, later restore the saved pixels. Handles are
//! generational indices, so a stale or freed handle is recognised and
//! ignored instead of touching someone else's fragment.

use tiny_skia::Pixmap;

use super::raster::Raster;

/// Coordinate meaning "restore at the position last saved from".
pub const BLITTER_FROMSAVED: i32 = -1;

/// Opaque handle handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlitterHandle {
    index: u32,
    generation: u32,
}

impl BlitterHandle {
    /// Pack into a non-zero integer for the C boundary.
    pub fn to_raw(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64 + 1)
    }

    /// Unpack a value produced by [`Self::to_raw`]. Zero is never a handle.
    pub fn from_raw(raw: u64) -> Option<Self> {
        let low = (raw & 0xffff_ffff) as u32;
        let index = low.checked_sub(1)?;
        Some(Self {
            index,
            generation: (raw >> 32) as u32,
        })
    }
}

/// Pixels captured by the last save, plus where they came from.
struct Capture {
    image: Pixmap,
    /// Requested origin, engine space.
    x: i32,
    y: i32,
    /// Offset of the captured part within the requested rectangle when the
    /// request hung off the canvas edge.
    dx: i32,
    dy: i32,
}

struct Blitter {
    width: i32,
    height: i32,
    capture: Option<Capture>,
}

struct Slot {
    generation: u32,
    blitter: Option<Blitter>,
}

#[derive(Default)]
pub struct BlitterStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl BlitterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live blitters.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.blitter.is_some()).count()
    }

    pub fn create(&mut self, width: i32, height: i32) -> BlitterHandle {
        let blitter = Blitter {
            width: width.max(0),
            height: height.max(0),
            capture: None,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.blitter = Some(blitter);
            BlitterHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                blitter: Some(blitter),
            });
            BlitterHandle {
                index,
                generation: 0,
            }
        }
    }

    fn get_mut(&mut self, handle: BlitterHandle) -> Option<&mut Blitter> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.blitter.as_mut()
    }

    /// Release a blitter. Unknown and already-freed handles are ignored.
    pub fn free(&mut self, handle: BlitterHandle) {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            log::debug!("free of unknown blitter {:?}", handle);
            return;
        };
        if slot.generation != handle.generation || slot.blitter.is_none() {
            log::debug!("free of stale blitter {:?}", handle);
            return;
        }
        slot.blitter = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
    }

    /// Capture the raster under `(x, y, w, h)`, engine space, no Y flip.
    ///
    /// Only the part that overlaps the canvas is kept. No overlap clears
    /// the capture, so a later load does nothing.
    pub fn save(&mut self, raster: &Raster, handle: BlitterHandle, x: i32, y: i32) {
        let space = *raster.space();
        let Some(blitter) = self.get_mut(handle) else {
            log::warn!("save into unknown blitter {:?}", handle);
            return;
        };

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + blitter.width).min(space.width());
        let y1 = (y + blitter.height).min(space.height());
        if x1 <= x0 || y1 <= y0 {
            blitter.capture = None;
            return;
        }

        blitter.capture = raster
            .copy_fragment(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32)
            .map(|image| Capture {
                image,
                x,
                y,
                dx: x0 - x,
                dy: y0 - y,
            });
    }

    /// Paint a captured fragment back.
    ///
    /// With [`BLITTER_FROMSAVED`] for both coordinates the stored origin is
    /// used as-is in fragment (top-left) convention. Explicit coordinates
    /// go through the drawing Y flip and are placed bottom-left. Loading a
    /// blitter that was never saved does nothing.
    pub fn load(&mut self, raster: &mut Raster, handle: BlitterHandle, x: i32, y: i32) {
        let Some(blitter) = self.get_mut(handle) else {
            log::warn!("load from unknown blitter {:?}", handle);
            return;
        };
        let Some(capture) = &blitter.capture else {
            return;
        };

        if x == BLITTER_FROMSAVED && y == BLITTER_FROMSAVED {
            raster.place_fragment_top_left(
                &capture.image,
                capture.x + capture.dx,
                capture.y + capture.dy,
            );
        } else {
            let height = capture.image.height() as i32;
            let raster_y = raster.space().to_raster_y(y + capture.dy, height);
            raster.place_fragment(&capture.image, x + capture.dx, raster_y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::CoordinateSpace;
    use tiny_skia::{Color, PremultipliedColorU8, Rect};

    fn raster() -> Raster {
        let mut r = Raster::new(CoordinateSpace::new(20, 20)).unwrap();
        r.clear(Color::WHITE);
        r
    }

    fn paint_engine_rect(r: &mut Raster, x: i32, y: i32, w: i32, h: i32, colour: Color) {
        let ry = r.space().to_raster_y(y, h);
        r.fill_rect(
            Rect::from_xywh(x as f32, ry as f32, w as f32, h as f32).unwrap(),
            colour,
        );
    }

    fn region(r: &Raster, x: i32, y: i32, w: i32, h: i32) -> Vec<PremultipliedColorU8> {
        let mut out = Vec::new();
        for py in y..y + h {
            for px in x..x + w {
                out.push(r.pixel(px, py).unwrap());
            }
        }
        out
    }

    #[test]
    fn test_handle_raw_round_trip() {
        let h = BlitterHandle {
            index: 3,
            generation: 7,
        };
        assert_ne!(h.to_raw(), 0);
        assert_eq!(BlitterHandle::from_raw(h.to_raw()), Some(h));
        assert_eq!(BlitterHandle::from_raw(0), None);
    }

    #[test]
    fn test_load_before_save_is_noop() {
        let mut r = raster();
        let mut store = BlitterStore::new();
        let h = store.create(4, 4);
        let before = region(&r, 0, 0, 20, 20);
        store.load(&mut r, h, 2, 2);
        store.load(&mut r, h, BLITTER_FROMSAVED, BLITTER_FROMSAVED);
        assert_eq!(region(&r, 0, 0, 20, 20), before);
    }

    #[test]
    fn test_save_then_restore_at_saved_origin() {
        let mut r = raster();
        paint_engine_rect(&mut r, 3, 4, 2, 2, Color::BLACK);
        let mut store = BlitterStore::new();
        let h = store.create(5, 5);
        store.save(&r, h, 2, 3);
        let captured = region(&r, 2, 3, 5, 5);

        // Scribble over the saved area, and somewhere else entirely.
        paint_engine_rect(&mut r, 0, 0, 10, 10, Color::from_rgba8(0, 0, 255, 255));
        paint_engine_rect(&mut r, 15, 15, 3, 3, Color::from_rgba8(0, 255, 0, 255));
        assert_ne!(region(&r, 2, 3, 5, 5), captured);

        store.load(&mut r, h, BLITTER_FROMSAVED, BLITTER_FROMSAVED);
        assert_eq!(region(&r, 2, 3, 5, 5), captured);
    }

    #[test]
    fn test_explicit_load_lands_on_same_pixels() {
        let mut r = raster();
        paint_engine_rect(&mut r, 1, 1, 3, 2, Color::BLACK);
        let mut store = BlitterStore::new();
        let h = store.create(3, 2);
        store.save(&r, h, 1, 1);
        let captured = region(&r, 1, 1, 3, 2);

        store.load(&mut r, h, 10, 12);
        assert_eq!(region(&r, 10, 12, 3, 2), captured);
    }

    #[test]
    fn test_save_clipped_at_canvas_edge() {
        let mut r = raster();
        paint_engine_rect(&mut r, 0, 0, 2, 2, Color::BLACK);
        let mut store = BlitterStore::new();
        let h = store.create(4, 4);
        store.save(&r, h, -2, -2);
        let captured = region(&r, 0, 0, 2, 2);

        paint_engine_rect(&mut r, 0, 0, 2, 2, Color::WHITE);
        store.load(&mut r, h, BLITTER_FROMSAVED, BLITTER_FROMSAVED);
        assert_eq!(region(&r, 0, 0, 2, 2), captured);
    }

    #[test]
    fn test_save_off_canvas_clears_capture() {
        let mut r = raster();
        let mut store = BlitterStore::new();
        let h = store.create(4, 4);
        store.save(&r, h, 0, 0);
        store.save(&r, h, 100, 100);
        paint_engine_rect(&mut r, 0, 0, 4, 4, Color::BLACK);
        let before = region(&r, 0, 0, 20, 20);
        store.load(&mut r, h, BLITTER_FROMSAVED, BLITTER_FROMSAVED);
        assert_eq!(region(&r, 0, 0, 20, 20), before);
    }

    #[test]
    fn test_double_free_and_stale_handles() {
        let mut r = raster();
        let mut store = BlitterStore::new();
        let a = store.create(2, 2);
        store.free(a);
        store.free(a);
        assert_eq!(store.live(), 0);

        // Slot is reused with a new generation; the old handle stays dead.
        let b = store.create(2, 2);
        assert_ne!(a, b);
        store.save(&r, b, 0, 0);
        store.free(a);
        assert_eq!(store.live(), 1);
        store.load(&mut r, a, BLITTER_FROMSAVED, BLITTER_FROMSAVED);

        store.free(BlitterHandle {
            index: 99,
            generation: 0,
        });
        assert_eq!(store.live(), 1);
    }
}
