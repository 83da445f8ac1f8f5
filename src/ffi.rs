//! C-ABI adapter for engines built as C code
//!
//! Such engines draw through a table of function pointers that all take an
//! opaque context first. [`DRAWING_TABLE`] points every entry at a
//! trampoline that recovers a [`DrawingContext`] from that pointer and calls
//! the matching [`DrawingApi`] method. The stream callbacks do the same for
//! a [`ByteStream`].
//!
//! Null contexts, null strings and null point arrays are skipped.

use std::ffi::{CStr, c_char, c_int, c_void};

use crate::renderer::{BlitterHandle, DrawingApi, FontType, TextAlign};
use crate::stream::{ByteStream, ReadSource, WriteSink};

/// What the engine's opaque drawing handle points at.
pub struct DrawingContext<'a> {
    api: &'a mut dyn DrawingApi,
}

impl<'a> DrawingContext<'a> {
    pub fn new(api: &'a mut dyn DrawingApi) -> Self {
        Self { api }
    }

    /// The pointer to hand to the engine. Valid while `self` is borrowed.
    pub fn as_handle(&mut self) -> *mut c_void {
        self as *mut Self as *mut c_void
    }
}

#[repr(C)]
pub struct DrawingTable {
    pub draw_text: Option<
        unsafe extern "C" fn(*mut c_void, c_int, c_int, c_int, c_int, c_int, c_int, *const c_char),
    >,
    pub draw_rect: Option<unsafe extern "C" fn(*mut c_void, c_int, c_int, c_int, c_int, c_int)>,
    pub draw_line: Option<unsafe extern "C" fn(*mut c_void, c_int, c_int, c_int, c_int, c_int)>,
    pub draw_polygon: Option<unsafe extern "C" fn(*mut c_void, *const c_int, c_int, c_int, c_int)>,
    pub draw_circle: Option<unsafe extern "C" fn(*mut c_void, c_int, c_int, c_int, c_int, c_int)>,
    pub draw_update: Option<unsafe extern "C" fn(*mut c_void, c_int, c_int, c_int, c_int)>,
    pub clip: Option<unsafe extern "C" fn(*mut c_void, c_int, c_int, c_int, c_int)>,
    pub unclip: Option<unsafe extern "C" fn(*mut c_void)>,
    pub start_draw: Option<unsafe extern "C" fn(*mut c_void)>,
    pub end_draw: Option<unsafe extern "C" fn(*mut c_void)>,
    pub status_bar: Option<unsafe extern "C" fn(*mut c_void, *const c_char)>,
    pub blitter_new: Option<unsafe extern "C" fn(*mut c_void, c_int, c_int) -> u64>,
    pub blitter_free: Option<unsafe extern "C" fn(*mut c_void, u64)>,
    pub blitter_save: Option<unsafe extern "C" fn(*mut c_void, u64, c_int, c_int)>,
    pub blitter_load: Option<unsafe extern "C" fn(*mut c_void, u64, c_int, c_int)>,
    pub text_fallback:
        Option<unsafe extern "C" fn(*mut c_void, *const *const c_char, c_int) -> *mut c_char>,
    pub draw_thick_line: Option<unsafe extern "C" fn(*mut c_void, f32, f32, f32, f32, f32, c_int)>,
}

pub static DRAWING_TABLE: DrawingTable = DrawingTable {
    draw_text: Some(draw_text),
    draw_rect: Some(draw_rect),
    draw_line: Some(draw_line),
    draw_polygon: Some(draw_polygon),
    draw_circle: Some(draw_circle),
    draw_update: Some(draw_update),
    clip: Some(clip),
    unclip: Some(unclip),
    start_draw: Some(start_draw),
    end_draw: Some(end_draw),
    status_bar: Some(status_bar),
    blitter_new: Some(blitter_new),
    blitter_free: Some(blitter_free),
    blitter_save: Some(blitter_save),
    blitter_load: Some(blitter_load),
    text_fallback: Some(text_fallback),
    draw_thick_line: Some(draw_thick_line),
};

#[unsafe(no_mangle)]
pub extern "C" fn puzzle_host_drawing_table() -> *const DrawingTable {
    &DRAWING_TABLE
}

/// # Safety
/// `ctx` is null or a live [`DrawingContext`] from [`DrawingContext::as_handle`].
unsafe fn api<'a>(ctx: *mut c_void) -> Option<&'a mut dyn DrawingApi> {
    let ctx = unsafe { (ctx as *mut DrawingContext<'a>).as_mut() };
    match ctx {
        Some(ctx) => Some(&mut *ctx.api),
        None => {
            log::warn!("drawing call with null context skipped");
            None
        }
    }
}

/// # Safety
/// `s` is null or a NUL-terminated string.
unsafe fn text<'a>(s: *const c_char) -> Option<std::borrow::Cow<'a, str>> {
    if s.is_null() {
        log::warn!("null text pointer skipped");
        return None;
    }
    Some(unsafe { CStr::from_ptr(s) }.to_string_lossy())
}

unsafe extern "C" fn draw_text(
    ctx: *mut c_void,
    x: c_int,
    y: c_int,
    fonttype: c_int,
    fontsize: c_int,
    align: c_int,
    colour: c_int,
    s: *const c_char,
) {
    let (Some(api), Some(s)) = (unsafe { api(ctx) }, unsafe { text(s) }) else {
        return;
    };
    api.draw_text(
        x,
        y,
        FontType::from_raw(fonttype),
        fontsize,
        TextAlign::from_raw(align),
        colour,
        &s,
    );
}

unsafe extern "C" fn draw_rect(ctx: *mut c_void, x: c_int, y: c_int, w: c_int, h: c_int, colour: c_int) {
    if let Some(api) = unsafe { api(ctx) } {
        api.draw_rect(x, y, w, h, colour);
    }
}

unsafe extern "C" fn draw_line(ctx: *mut c_void, x1: c_int, y1: c_int, x2: c_int, y2: c_int, colour: c_int) {
    if let Some(api) = unsafe { api(ctx) } {
        api.draw_line(x1, y1, x2, y2, colour);
    }
}

/// `coords` holds `npoints` x/y pairs.
unsafe extern "C" fn draw_polygon(
    ctx: *mut c_void,
    coords: *const c_int,
    npoints: c_int,
    fill: c_int,
    outline: c_int,
) {
    let Some(api) = (unsafe { api(ctx) }) else {
        return;
    };
    if coords.is_null() || npoints <= 0 {
        log::warn!("polygon without points skipped");
        return;
    }
    let raw = unsafe { std::slice::from_raw_parts(coords, npoints as usize * 2) };
    let points: Vec<(i32, i32)> = raw.chunks_exact(2).map(|p| (p[0], p[1])).collect();
    api.draw_polygon(&points, fill, outline);
}

unsafe extern "C" fn draw_circle(
    ctx: *mut c_void,
    cx: c_int,
    cy: c_int,
    radius: c_int,
    fill: c_int,
    outline: c_int,
) {
    if let Some(api) = unsafe { api(ctx) } {
        api.draw_circle(cx, cy, radius, fill, outline);
    }
}

unsafe extern "C" fn draw_update(ctx: *mut c_void, x: c_int, y: c_int, w: c_int, h: c_int) {
    if let Some(api) = unsafe { api(ctx) } {
        api.draw_update(x, y, w, h);
    }
}

unsafe extern "C" fn clip(ctx: *mut c_void, x: c_int, y: c_int, w: c_int, h: c_int) {
    if let Some(api) = unsafe { api(ctx) } {
        api.clip(x, y, w, h);
    }
}

unsafe extern "C" fn unclip(ctx: *mut c_void) {
    if let Some(api) = unsafe { api(ctx) } {
        api.unclip();
    }
}

unsafe extern "C" fn start_draw(ctx: *mut c_void) {
    if let Some(api) = unsafe { api(ctx) } {
        api.start_draw();
    }
}

unsafe extern "C" fn end_draw(ctx: *mut c_void) {
    if let Some(api) = unsafe { api(ctx) } {
        api.end_draw();
    }
}

unsafe extern "C" fn status_bar(ctx: *mut c_void, s: *const c_char) {
    if let (Some(api), Some(s)) = (unsafe { api(ctx) }, unsafe { text(s) }) {
        api.status_bar(&s);
    }
}

/// Zero when there is no context; real handles are never zero.
unsafe extern "C" fn blitter_new(ctx: *mut c_void, w: c_int, h: c_int) -> u64 {
    match unsafe { api(ctx) } {
        Some(api) => api.blitter_new(w, h).to_raw(),
        None => 0,
    }
}

unsafe extern "C" fn blitter_free(ctx: *mut c_void, bl: u64) {
    let Some(api) = (unsafe { api(ctx) }) else {
        return;
    };
    match BlitterHandle::from_raw(bl) {
        Some(handle) => api.blitter_free(handle),
        None => log::debug!("free of null blitter ignored"),
    }
}

unsafe extern "C" fn blitter_save(ctx: *mut c_void, bl: u64, x: c_int, y: c_int) {
    if let (Some(api), Some(handle)) = (unsafe { api(ctx) }, BlitterHandle::from_raw(bl)) {
        api.blitter_save(handle, x, y);
    }
}

unsafe extern "C" fn blitter_load(ctx: *mut c_void, bl: u64, x: c_int, y: c_int) {
    if let (Some(api), Some(handle)) = (unsafe { api(ctx) }, BlitterHandle::from_raw(bl)) {
        api.blitter_load(handle, x, y);
    }
}

/// The engine frees the returned string itself, so it comes from `malloc`.
unsafe extern "C" fn text_fallback(
    ctx: *mut c_void,
    strings: *const *const c_char,
    nstrings: c_int,
) -> *mut c_char {
    let Some(api) = (unsafe { api(ctx) }) else {
        return std::ptr::null_mut();
    };
    if strings.is_null() || nstrings <= 0 {
        return std::ptr::null_mut();
    }
    let raw = unsafe { std::slice::from_raw_parts(strings, nstrings as usize) };
    let owned: Vec<String> = raw
        .iter()
        .filter_map(|&s| unsafe { text(s) })
        .map(|s| s.into_owned())
        .collect();
    let candidates: Vec<&str> = owned.iter().map(String::as_str).collect();
    api.text_fallback(&candidates)
        .map_or(std::ptr::null_mut(), |s| malloc_string(&s))
}

/// NUL-terminated copy of `s` on the C heap, or null when `s` holds a NUL
/// or allocation fails.
fn malloc_string(s: &str) -> *mut c_char {
    let bytes = s.as_bytes();
    if bytes.contains(&0) {
        return std::ptr::null_mut();
    }
    let buf = unsafe { libc::malloc(bytes.len() + 1) } as *mut u8;
    if buf.is_null() {
        log::warn!("text fallback allocation of {} bytes failed", bytes.len() + 1);
        return std::ptr::null_mut();
    }
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
        *buf.add(bytes.len()) = 0;
    }
    buf as *mut c_char
}

unsafe extern "C" fn draw_thick_line(
    ctx: *mut c_void,
    thickness: f32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    colour: c_int,
) {
    if let Some(api) = unsafe { api(ctx) } {
        api.draw_thick_line(thickness, x1, y1, x2, y2, colour);
    }
}

/// Engine write callback: `ctx` points at a [`ByteStream`].
///
/// # Safety
/// `ctx` is null or a live `ByteStream`; `buf` holds `len` bytes.
pub unsafe extern "C" fn write_stream(ctx: *mut c_void, buf: *const c_void, len: c_int) {
    let Some(stream) = (unsafe { (ctx as *mut ByteStream).as_mut() }) else {
        log::warn!("stream write with null context skipped");
        return;
    };
    if buf.is_null() || len <= 0 {
        return;
    }
    let bytes = unsafe { std::slice::from_raw_parts(buf as *const u8, len as usize) };
    stream.write(bytes);
}

/// Engine read callback. False at end of stream.
///
/// # Safety
/// `ctx` is null or a live `ByteStream`; `buf` has room for `len` bytes.
pub unsafe extern "C" fn read_stream(ctx: *mut c_void, buf: *mut c_void, len: c_int) -> bool {
    let Some(stream) = (unsafe { (ctx as *mut ByteStream).as_mut() }) else {
        log::warn!("stream read with null context skipped");
        return false;
    };
    if buf.is_null() || len <= 0 {
        return false;
    }
    let out = unsafe { std::slice::from_raw_parts_mut(buf as *mut u8, len as usize) };
    stream.read(out) > 0
}
