// src/rasterizer/buffer.rs

//! Off-screen pixel buffers and the pool that recycles them between renders.

use anyhow::{Context, Result};
use image::RgbaImage;
use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::Color;
use crate::geometry::Vec2;

pub type Pixel = [f32; 4];

/// Default idle buffer limit of a [`BufferPool`]: the working set of a few
/// recent canvas sizes.
pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// Where the final output buffer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocPolicy {
    /// Checked out of the compositor's pool; hand it back with `release`.
    Pooled,
    /// A fresh buffer owned by the caller.
    #[default]
    Owned,
}

/// RGBA `f32` image, bottom row first. Pixel `(x, y)` covers
/// `[x, x + 1) × [y, y + 1)` in canvas units, its centre sits at `+0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl PixelBuffer {
    /// A fully transparent buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, px: Pixel) {
        let idx = y * self.width + x;
        self.pixels[idx] = px;
    }

    pub fn color_at(&self, x: usize, y: usize) -> Color {
        Color::from_array(self.get(x, y))
    }

    pub fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
    }

    pub fn copy_from(&mut self, other: &PixelBuffer) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        self.pixels.copy_from_slice(&other.pixels);
    }

    /// Fetches a pixel, transparent outside the buffer.
    pub fn fetch(&self, x: i64, y: i64) -> Pixel {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return [0.0; 4];
        }
        self.pixels[y as usize * self.width + x as usize]
    }

    /// Bilinear sample at canvas position `p`.
    pub fn sample(&self, p: Vec2) -> Pixel {
        let x = p.x - 0.5;
        let y = p.y - 0.5;
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
        out
    }

    /// Single channel of [`PixelBuffer::sample`].
    pub fn sample_channel(&self, p: Vec2, channel: usize) -> f32 {
        self.sample_channel_or(p, channel, 0.0)
    }

    /// Bilinear sample of one channel that reads `outside` beyond the buffer.
    pub fn sample_channel_or(&self, p: Vec2, channel: usize, outside: f32) -> f32 {
        let x = p.x - 0.5;
        let y = p.y - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);
        let at = |x: i64, y: i64| {
            if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                outside
            } else {
                self.pixels[y as usize * self.width + x as usize][channel]
            }
        };
        let bottom = at(x0, y0) + (at(x0 + 1, y0) - at(x0, y0)) * fx;
        let top = at(x0, y0 + 1) + (at(x0 + 1, y0 + 1) - at(x0, y0 + 1)) * fx;
        bottom + (top - bottom) * fy
    }

    /// Fetches a pixel, repeating the edge outside the buffer.
    pub fn fetch_clamped(&self, x: i64, y: i64) -> Pixel {
        let x = x.clamp(0, self.width as i64 - 1);
        let y = y.clamp(0, self.height as i64 - 1);
        self.pixels[y as usize * self.width + x as usize]
    }

    /// Converts to 8-bit straight-alpha RGBA. With `flip_vertical` the rows
    /// are written top row first, as image files expect.
    pub fn to_image(&self, flip_vertical: bool) -> RgbaImage {
        let mut img = RgbaImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            let row = if flip_vertical { self.height - 1 - y } else { y };
            for x in 0..self.width {
                let px = Color::from_array(self.get(x, y)).to_rgba8();
                img.put_pixel(x as u32, row as u32, image::Rgba(px));
            }
        }
        img
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P, flip_vertical: bool) -> Result<()> {
        let path = path.as_ref();
        self.to_image(flip_vertical)
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write PNG {}", path.display()))?;
        debug!(
            "Saved {}x{} buffer to {}",
            self.width,
            self.height,
            path.display()
        );
        Ok(())
    }
}

/// Straight-alpha "over": paints `color` with opacity `alpha` onto `dst`.
pub fn blend_over(dst: &mut Pixel, color: Color, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let below = dst[3] * (1.0 - alpha);
    let out = alpha + below;
    let src = [color.r, color.g, color.b];
    for i in 0..3 {
        dst[i] = (src[i] * alpha + dst[i] * below) / out;
    }
    dst[3] = out;
}

/// Recycles buffers by size, keeping at most `capacity` idle buffers in
/// total. When full, buffers of the least recently used size go first.
#[derive(Debug)]
pub struct BufferPool {
    capacity: usize,
    /// Ordered from least to most recently used size.
    idle: IndexMap<(usize, usize), Vec<PixelBuffer>>,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            idle: IndexMap::new(),
        }
    }

    /// A cleared buffer of the requested size.
    pub fn checkout(&mut self, width: usize, height: usize) -> PixelBuffer {
        let key = (width, height);
        let reused = self.idle.shift_remove(&key).and_then(|mut slot| {
            let buffer = slot.pop();
            if !slot.is_empty() {
                self.idle.insert(key, slot);
            }
            buffer
        });
        match reused {
            Some(mut buffer) => {
                buffer.clear();
                buffer
            }
            None => {
                trace!("BufferPool: allocating {}x{}", width, height);
                PixelBuffer::new(width, height)
            }
        }
    }

    pub fn give_back(&mut self, buffer: PixelBuffer) {
        if self.capacity == 0 {
            return;
        }
        let key = (buffer.width, buffer.height);
        let mut slot = self.idle.shift_remove(&key).unwrap_or_default();
        slot.push(buffer);
        self.idle.insert(key, slot);

        let mut excess = self.idle_count().saturating_sub(self.capacity);
        while excess > 0 {
            let Some(oldest) = self.idle.get_index_mut(0).map(|(_, slot)| slot) else {
                break;
            };
            let dropped = oldest.len().min(excess);
            oldest.truncate(oldest.len() - dropped);
            excess -= dropped;
            if oldest.is_empty() {
                if let Some(((w, h), _)) = self.idle.shift_remove_index(0) {
                    trace!("BufferPool: evicted {}x{} buffers, pool full", w, h);
                }
            }
        }
    }

    /// Number of idle buffers across every size.
    pub fn idle_count(&self) -> usize {
        self.idle.values().map(Vec::len).sum()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(DEFAULT_POOL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_transparent_outside() {
        let mut buf = PixelBuffer::new(2, 2);
        buf.set(0, 0, [1.0; 4]);
        assert_eq!(buf.sample(Vec2::new(0.5, 0.5)), [1.0; 4]);
        assert_eq!(buf.sample(Vec2::new(-3.0, 0.5)), [0.0; 4]);
        // Halfway to the transparent border.
        assert_eq!(buf.sample(Vec2::new(0.0, 0.5))[3], 0.5);
        assert_eq!(buf.sample_channel_or(Vec2::new(0.0, 0.5), 3, 1.0), 1.0);
        assert_eq!(buf.sample_channel_or(Vec2::new(-1.0, 0.5), 0, 0.25), 0.25);
    }

    #[test]
    fn over_blends_straight_alpha() {
        let mut px = [0.0, 0.0, 1.0, 1.0];
        blend_over(&mut px, Color::new(1.0, 0.0, 0.0, 1.0), 0.5);
        assert_eq!(px, [0.5, 0.0, 0.5, 1.0]);
        let mut px = [0.0; 4];
        blend_over(&mut px, Color::WHITE, 0.25);
        assert_eq!(px, [1.0, 1.0, 1.0, 0.25]);
    }

    #[test]
    fn pool_recycles_cleared_buffers() {
        let mut pool = BufferPool::new(1);
        let mut a = pool.checkout(4, 3);
        a.set(1, 1, [1.0; 4]);
        pool.give_back(a);
        pool.give_back(PixelBuffer::new(4, 3));
        assert_eq!(pool.idle_count(), 1);
        let b = pool.checkout(4, 3);
        assert!(b.pixels().iter().all(|p| *p == [0.0; 4]));
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn pool_evicts_least_recently_used_sizes() {
        let mut pool = BufferPool::new(3);
        pool.give_back(PixelBuffer::new(1, 1));
        pool.give_back(PixelBuffer::new(2, 2));
        pool.give_back(PixelBuffer::new(2, 2));
        // Touch 1x1 so 2x2 becomes the oldest size.
        let one = pool.checkout(1, 1);
        pool.give_back(one);
        pool.give_back(PixelBuffer::new(3, 3));
        assert_eq!(pool.idle_count(), 3);

        pool.checkout(1, 1);
        pool.checkout(3, 3);
        assert_eq!(pool.idle_count(), 1);
        pool.checkout(2, 2);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn zero_capacity_pool_keeps_nothing() {
        let mut pool = BufferPool::new(0);
        pool.give_back(PixelBuffer::new(2, 2));
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn image_export_flips_rows() {
        let mut buf = PixelBuffer::new(1, 2);
        buf.set(0, 0, [1.0, 0.0, 0.0, 1.0]);
        let img = buf.to_image(true);
        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
        let img = buf.to_image(false);
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }
}
