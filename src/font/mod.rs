// src/font/mod.rs

//! Font backend contract consumed by layout and compositing.
//!
//! A backend answers glyph metric queries, rasterizes characters on request
//! into an atlas texture, and is told to `reset` once a render call is done.
//! Real font engines live outside this crate; [`HeadlessFont`] is a
//! deterministic synthetic backend used by tests and the demo binary.

pub mod atlas;
pub mod headless;

pub use headless::{GlyphShape, HeadlessFont, RasterizeRequest};

use crate::geometry::Vec2;
use crate::glyph::FontStyle;
use crate::texture::Texture;

/// Placement of one rasterized glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    /// Lower-left corner of the glyph box relative to the pen on the baseline.
    pub min: Vec2,
    /// Upper-right corner of the glyph box.
    pub max: Vec2,
    /// Horizontal pen advance.
    pub advance: f32,
    /// Atlas UVs of the bottom-left, top-left, top-right and bottom-right corners.
    pub uv: [Vec2; 4],
}

/// Font backend trait.
///
/// Implementors own a glyph atlas that may grow between calls. The renderer
/// never keeps a backend beyond a single render call.
pub trait FontBackend {
    /// Look up a glyph that has already been rasterized.
    ///
    /// # Arguments
    /// * `ch` - Character to find
    /// * `size` - Pixel size
    /// * `style` - Bold/italic request
    ///
    /// # Returns
    /// Some(metrics) if the glyph is available in the atlas, None otherwise
    fn glyph_metrics(&self, ch: char, size: i32, style: FontStyle) -> Option<GlyphMetrics>;

    /// Rasterize `characters` into the atlas. Best effort: characters the
    /// backend cannot provide stay missing.
    fn request_rasterize(&mut self, characters: &str, size: i32, style: FontStyle);

    /// The texture backing every UV returned by [`FontBackend::glyph_metrics`].
    fn atlas(&self) -> &Texture;

    /// Called once after each completed render call; the backend may drop
    /// transient rasterization state.
    fn reset(&mut self);
}

/// One entry of the ordered font list passed to the renderer. Unset entries
/// fall back to font 0.
pub type FontSlot<'a> = Option<&'a mut dyn FontBackend>;

/// Maps a tag-selected font index to the index actually used.
pub fn resolve_font(fonts: &[FontSlot<'_>], index: usize) -> usize {
    match fonts.get(index) {
        Some(Some(_)) => index,
        _ => 0,
    }
}

/// Borrows the backend at `index`, if one is set.
pub fn font_at<'f>(fonts: &'f [FontSlot<'_>], index: usize) -> Option<&'f dyn FontBackend> {
    fonts.get(index).and_then(|slot| slot.as_deref())
}
