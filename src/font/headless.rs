// src/font/headless.rs

//! Headless synthetic font backend.
//!
//! Produces deterministic block glyphs without any font files: each glyph is a
//! 3x3 grid of cells whose on/off pattern is derived from the character code.
//! Bold widens the body, italic shears it. Used by tests and the demo binary.

use indexmap::IndexMap;
use log::{debug, trace, warn};
use std::collections::HashSet;

use super::atlas::ShelfPacker;
use super::{FontBackend, GlyphMetrics};
use crate::geometry::Vec2;
use crate::glyph::FontStyle;
use crate::texture::{Texture, WrapMode};

const INITIAL_ATLAS_SIZE: usize = 128;
const MAX_ATLAS_SIZE: usize = 4096;
const ATLAS_PADDING: usize = 1;

/// Glyph body fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlyphShape {
    /// 3x3 cell pattern from the character code; the centre cell is always on.
    #[default]
    Pattern,
    /// Every body texel fully covered.
    Solid,
}

/// One recorded `request_rasterize` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterizeRequest {
    pub characters: String,
    pub size: i32,
    pub style: FontStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GlyphKey {
    ch: char,
    size: i32,
    style: FontStyle,
}

/// Coverage bitmap, bottom row first.
struct Bitmap {
    width: usize,
    height: usize,
    coverage: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct HeadlessFont {
    shape: GlyphShape,
    atlas: Texture,
    packer: ShelfPacker,
    /// Insertion order doubles as the repack order when the atlas grows.
    glyphs: IndexMap<GlyphKey, GlyphMetrics>,
    refused: HashSet<char>,
    requests: Vec<RasterizeRequest>,
    reset_count: usize,
}

impl HeadlessFont {
    pub fn new() -> Self {
        Self::with_shape(GlyphShape::Pattern)
    }

    /// A font whose glyphs are fully covered boxes.
    pub fn solid() -> Self {
        Self::with_shape(GlyphShape::Solid)
    }

    pub fn with_shape(shape: GlyphShape) -> Self {
        Self {
            shape,
            atlas: Texture::new(INITIAL_ATLAS_SIZE, INITIAL_ATLAS_SIZE).with_wrap(WrapMode::Clamp),
            packer: ShelfPacker::new(INITIAL_ATLAS_SIZE, INITIAL_ATLAS_SIZE, ATLAS_PADDING),
            glyphs: IndexMap::new(),
            refused: HashSet::new(),
            requests: Vec::new(),
            reset_count: 0,
        }
    }

    /// Marks characters this font can never provide.
    pub fn refuse(&mut self, characters: &str) {
        self.refused.extend(characters.chars());
    }

    /// Every `request_rasterize` call received so far, resets included.
    pub fn requests(&self) -> &[RasterizeRequest] {
        &self.requests
    }

    pub fn reset_count(&self) -> usize {
        self.reset_count
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Rasterizes one glyph into free atlas space.
    ///
    /// # Returns
    /// The glyph's metrics, or None when the atlas has no room left
    fn place(&mut self, key: GlyphKey) -> Option<GlyphMetrics> {
        let size = key.size.max(1) as f32;
        let bitmap = synthesize(self.shape, key.ch, size, key.style);
        let descent = (size * 0.15).round();
        let w = bitmap.width as f32;
        let h = bitmap.height as f32;

        if bitmap.width == 0 || bitmap.height == 0 {
            return Some(GlyphMetrics {
                min: Vec2::ZERO,
                max: Vec2::ZERO,
                advance: (size * 0.3).round(),
                uv: [Vec2::ZERO; 4],
            });
        }

        let (x0, y0) = self.packer.allocate(bitmap.width, bitmap.height)?;
        for y in 0..bitmap.height {
            for x in 0..bitmap.width {
                let c = bitmap.coverage[y * bitmap.width + x];
                self.atlas.set(x0 + x, y0 + y, [1.0, 1.0, 1.0, c]);
            }
        }

        let (aw, ah) = self.packer.size();
        let (aw, ah) = (aw as f32, ah as f32);
        let u0 = x0 as f32 / aw;
        let v0 = y0 as f32 / ah;
        let u1 = (x0 as f32 + w) / aw;
        let v1 = (y0 as f32 + h) / ah;
        Some(GlyphMetrics {
            min: Vec2::new(0.0, -descent),
            max: Vec2::new(w, h - descent),
            advance: w + (size * 0.1).round().max(1.0),
            uv: [
                Vec2::new(u0, v0),
                Vec2::new(u0, v1),
                Vec2::new(u1, v1),
                Vec2::new(u1, v0),
            ],
        })
    }

    /// Doubles the atlas and repacks every glyph.
    fn grow(&mut self) -> bool {
        let (side, _) = self.packer.size();
        if side >= MAX_ATLAS_SIZE {
            return false;
        }
        let side = (side * 2).min(MAX_ATLAS_SIZE);
        debug!("HeadlessFont: Growing atlas to {}x{}", side, side);
        self.atlas.reallocate(side, side);
        self.packer.reset(side, side);

        let keys: Vec<GlyphKey> = self.glyphs.keys().copied().collect();
        for key in keys {
            match self.place(key) {
                Some(metrics) => {
                    self.glyphs.insert(key, metrics);
                }
                None => return self.grow(),
            }
        }
        true
    }
}

impl Default for HeadlessFont {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBackend for HeadlessFont {
    fn glyph_metrics(&self, ch: char, size: i32, style: FontStyle) -> Option<GlyphMetrics> {
        self.glyphs.get(&GlyphKey { ch, size, style }).copied()
    }

    fn request_rasterize(&mut self, characters: &str, size: i32, style: FontStyle) {
        debug!(
            "HeadlessFont: Rasterize {:?} at {} px, style {:?}",
            characters, size, style
        );
        self.requests.push(RasterizeRequest {
            characters: characters.to_string(),
            size,
            style,
        });

        for ch in characters.chars() {
            let key = GlyphKey { ch, size, style };
            if self.glyphs.contains_key(&key) {
                continue;
            }
            if self.refused.contains(&ch) {
                trace!("HeadlessFont: Refusing '{}' (U+{:X})", ch, ch as u32);
                continue;
            }
            let metrics = match self.place(key) {
                Some(m) => Some(m),
                None if self.grow() => self.place(key),
                None => None,
            };
            match metrics {
                Some(m) => {
                    self.glyphs.insert(key, m);
                }
                None => warn!(
                    "HeadlessFont: Atlas full, dropping '{}' (U+{:X})",
                    ch, ch as u32
                ),
            }
        }
    }

    fn atlas(&self) -> &Texture {
        &self.atlas
    }

    fn reset(&mut self) {
        trace!("HeadlessFont: Reset, dropping {} glyphs", self.glyphs.len());
        self.reset_count += 1;
        self.glyphs.clear();
        self.atlas.reallocate(INITIAL_ATLAS_SIZE, INITIAL_ATLAS_SIZE);
        self.packer.reset(INITIAL_ATLAS_SIZE, INITIAL_ATLAS_SIZE);
    }
}

/// Cell bits for `ch`; bit `row * 3 + col`, row 0 at the bottom.
fn pattern_bits(ch: char) -> u32 {
    (((ch as u32).wrapping_mul(0x9E37_79B1) >> 23) & 0x1FF) | 0x10
}

fn synthesize(shape: GlyphShape, ch: char, size: f32, style: FontStyle) -> Bitmap {
    if ch.is_whitespace() {
        return Bitmap {
            width: 0,
            height: 0,
            coverage: Vec::new(),
        };
    }

    let height = (size * 0.7).round().max(1.0) as usize;
    let mut body = (size * 0.5).round().max(1.0) as usize;
    if style.contains(FontStyle::BOLD) {
        body += (size / 8.0).round().max(1.0) as usize;
    }
    let slant = if style.contains(FontStyle::ITALIC) {
        (height as f32 * 0.2).round() as usize
    } else {
        0
    };
    let width = body + slant;
    let bits = pattern_bits(ch);

    let mut coverage = vec![0.0; width * height];
    for y in 0..height {
        let shift = slant * y / height;
        let row = y * 3 / height;
        for x in shift..shift + body {
            let covered = match shape {
                GlyphShape::Solid => true,
                GlyphShape::Pattern => {
                    let col = (x - shift) * 3 / body;
                    bits & (1 << (row * 3 + col)) != 0
                }
            };
            if covered {
                coverage[y * width + x] = 1.0;
            }
        }
    }
    Bitmap {
        width,
        height,
        coverage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn glyphs_exist_only_after_request() {
        let mut font = HeadlessFont::new();
        assert!(font.glyph_metrics('A', 20, FontStyle::NORMAL).is_none());
        font.request_rasterize("AB", 20, FontStyle::NORMAL);
        let a = font.glyph_metrics('A', 20, FontStyle::NORMAL).unwrap();
        assert_eq!(a.min, Vec2::new(0.0, -3.0));
        assert_eq!(a.max, Vec2::new(10.0, 11.0));
        assert_eq!(a.advance, 12.0);
        assert!(font.glyph_metrics('A', 21, FontStyle::NORMAL).is_none());
        assert!(font.glyph_metrics('A', 20, FontStyle::BOLD).is_none());
    }

    #[test]
    fn bold_is_wider_and_italic_is_slanted() {
        let mut font = HeadlessFont::solid();
        for style in [FontStyle::NORMAL, FontStyle::BOLD, FontStyle::ITALIC] {
            font.request_rasterize("m", 40, style);
        }
        let normal = font.glyph_metrics('m', 40, FontStyle::NORMAL).unwrap();
        let bold = font.glyph_metrics('m', 40, FontStyle::BOLD).unwrap();
        let italic = font.glyph_metrics('m', 40, FontStyle::ITALIC).unwrap();
        assert!(bold.max.x > normal.max.x);
        assert!(italic.max.x > normal.max.x);
        assert_eq!(italic.max.y, normal.max.y);
    }

    #[test]
    fn whitespace_has_advance_but_no_box() {
        let mut font = HeadlessFont::new();
        font.request_rasterize(" ", 20, FontStyle::NORMAL);
        let space = font.glyph_metrics(' ', 20, FontStyle::NORMAL).unwrap();
        assert_eq!(space.min, space.max);
        assert_eq!(space.advance, 6.0);
    }

    #[test]
    fn refused_characters_stay_missing() {
        let mut font = HeadlessFont::new();
        font.refuse("?");
        font.request_rasterize("a?", 16, FontStyle::NORMAL);
        assert!(font.glyph_metrics('a', 16, FontStyle::NORMAL).is_some());
        assert!(font.glyph_metrics('?', 16, FontStyle::NORMAL).is_none());
        assert_eq!(font.requests().len(), 1);
        assert_eq!(font.requests()[0].characters, "a?");
    }

    #[test]
    fn atlas_grows_and_keeps_uvs_valid() {
        let mut font = HeadlessFont::solid();
        let text: String = ('A'..='Z').chain('a'..='z').collect();
        font.request_rasterize(&text, 64, FontStyle::NORMAL);
        assert!(font.atlas().width() > INITIAL_ATLAS_SIZE);
        assert_eq!(font.glyph_count(), 52);
        // Contract: the centre of every glyph box samples full coverage
        for ch in text.chars() {
            let m = font.glyph_metrics(ch, 64, FontStyle::NORMAL).unwrap();
            let centre = Vec2::new(
                (m.uv[0].x + m.uv[2].x) * 0.5,
                (m.uv[0].y + m.uv[2].y) * 0.5,
            );
            assert_eq!(font.atlas().sample(centre).a, 1.0);
        }
    }

    #[test]
    fn reset_drops_glyphs() {
        let mut font = HeadlessFont::new();
        font.request_rasterize("xyz", 12, FontStyle::NORMAL);
        font.reset();
        assert_eq!(font.reset_count(), 1);
        assert_eq!(font.glyph_count(), 0);
        assert!(font.glyph_metrics('x', 12, FontStyle::NORMAL).is_none());
    }

    #[test]
    fn pattern_always_covers_centre_cell() {
        for ch in ['A', 'q', '7', '字'] {
            let bitmap = synthesize(GlyphShape::Pattern, ch, 30.0, FontStyle::NORMAL);
            let (cx, cy) = (bitmap.width / 2, bitmap.height / 2);
            assert_eq!(bitmap.coverage[cy * bitmap.width + cx], 1.0);
        }
    }
}
