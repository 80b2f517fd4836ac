// src/texture.rs

//! `Texture`: an RGBA `f32` image with bilinear sampling.
//!
//! Used for font atlases, the optional text pattern texture and effect color
//! textures. Rows are stored bottom row first so texture `v` and canvas `y`
//! both point up.

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

use crate::color::Color;
use crate::geometry::Vec2;

/// Addressing applied to texel coordinates outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Tile the image (pattern textures).
    #[default]
    Repeat,
    /// Reuse the edge texel (atlases).
    Clamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<[f32; 4]>,
    wrap: WrapMode,
}

impl Texture {
    /// A fully transparent texture.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width * height],
            wrap: WrapMode::Repeat,
        }
    }

    /// Wraps existing pixels (bottom row first).
    ///
    /// # Returns
    /// `None` when `pixels.len() != width * height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<[f32; 4]>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pixels,
            wrap: WrapMode::Repeat,
        })
    }

    /// Loads an image file and converts it to straight-alpha RGBA.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("Failed to open texture {}", path.display()))?
            .to_rgba8();
        let (width, height) = (img.width() as usize, img.height() as usize);
        debug!("Loaded texture {} ({}x{})", path.display(), width, height);
        let raw = img.into_raw();
        let mut pixels = Vec::with_capacity(width * height);
        // Image rows are top-down.
        for row in raw.chunks_exact(width * 4).rev() {
            for px in row.chunks_exact(4) {
                pixels.push(Color::from_rgba8([px[0], px[1], px[2], px[3]]).to_array());
            }
        }
        Ok(Self {
            width,
            height,
            pixels,
            wrap: WrapMode::Repeat,
        })
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    /// Texel at integer coordinates; transparent when out of range.
    pub fn get(&self, x: usize, y: usize) -> [f32; 4] {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            [0.0; 4]
        }
    }

    pub fn set(&mut self, x: usize, y: usize, px: [f32; 4]) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = px;
        }
    }

    /// Clears every texel to transparent and changes the size.
    pub fn reallocate(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, [0.0; 4]);
    }

    fn fetch(&self, x: i64, y: i64) -> [f32; 4] {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x, y) = match self.wrap {
            WrapMode::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
            WrapMode::Clamp => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        };
        self.pixels[(y * w + x) as usize]
    }

    /// Bilinear sample at normalized `uv` (texel centres at `(i + 0.5) / size`).
    pub fn sample(&self, uv: Vec2) -> Color {
        if self.is_empty() {
            return Color::CLEAR;
        }
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);
        let c00 = self.fetch(x0, y0);
        let c10 = self.fetch(x0 + 1, y0);
        let c01 = self.fetch(x0, y0 + 1);
        let c11 = self.fetch(x0 + 1, y0 + 1);
        let mut out = [0.0; 4];
        for i in 0..4 {
            let bottom = c00[i] + (c10[i] - c00[i]) * fx;
            let top = c01[i] + (c11[i] - c01[i]) * fx;
            out[i] = bottom + (top - bottom) * fy;
        }
        Color::from_array(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        let white = [1.0; 4];
        let black = [0.0, 0.0, 0.0, 1.0];
        Texture::from_pixels(2, 2, vec![white, black, black, white]).unwrap()
    }

    #[test]
    fn sampling_texel_centres_is_exact() {
        let t = checker();
        assert_eq!(t.sample(Vec2::new(0.25, 0.25)), Color::WHITE);
        assert_eq!(t.sample(Vec2::new(0.75, 0.25)), Color::BLACK);
    }

    #[test]
    fn repeat_and_clamp_addressing() {
        let t = checker();
        assert_eq!(t.sample(Vec2::new(1.25, 0.25)), Color::WHITE);
        let t = t.with_wrap(WrapMode::Clamp);
        assert_eq!(t.sample(Vec2::new(-3.0, 0.25)), Color::WHITE);
    }

    #[test]
    fn bilinear_midpoint_averages() {
        let t = checker().with_wrap(WrapMode::Clamp);
        let c = t.sample(Vec2::new(0.5, 0.25));
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn from_pixels_checks_length() {
        assert!(Texture::from_pixels(3, 3, vec![[0.0; 4]; 8]).is_none());
    }
}
