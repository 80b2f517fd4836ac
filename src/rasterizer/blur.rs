// src/rasterizer/blur.rs

//! Blur and edge-field passes over single channels of the working buffer.

use crate::geometry::Vec2;

use super::buffer::PixelBuffer;

/// Channel assignment of the working buffer after the offset pass.
pub const OUTLINE: usize = 0;
pub const SPACIAL: usize = 1;
pub const INNER: usize = 2;
pub const GLOW: usize = 3;

/// Binomial weights of the 9 taps, spread evenly over `[-1, 1] × dir`.
const TAPS: [f32; 9] = [
    1.0 / 256.0,
    8.0 / 256.0,
    28.0 / 256.0,
    56.0 / 256.0,
    70.0 / 256.0,
    56.0 / 256.0,
    28.0 / 256.0,
    8.0 / 256.0,
    1.0 / 256.0,
];

/// Unit ring sampled by the omni edge field.
const RING: [Vec2; 12] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(0.87, 0.5),
    Vec2::new(0.5, 0.87),
    Vec2::new(0.0, 1.0),
    Vec2::new(-0.5, 0.87),
    Vec2::new(-0.87, 0.5),
    Vec2::new(-1.0, 0.0),
    Vec2::new(-0.87, -0.5),
    Vec2::new(-0.5, -0.87),
    Vec2::new(0.0, -1.0),
    Vec2::new(0.5, -0.87),
    Vec2::new(0.87, -0.5),
];

const FIELD_THRESHOLD: f32 = 0.0005;

/// Longest directional edge field, in pixels.
const MAX_DIRECTIONAL_STEPS: f32 = 32.0;

/// One directional blur over one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurPass {
    pub dir: Vec2,
    pub channel: usize,
    /// Applied after the clip: `max(sum - level_min, 0) * scale`.
    pub scale: f32,
    pub level_min: f32,
    /// Value read beyond the canvas edge.
    pub border: f32,
}

impl BlurPass {
    pub fn new(dir: Vec2, channel: usize) -> Self {
        Self {
            dir,
            channel,
            scale: 1.0,
            level_min: 0.0,
            border: 0.0,
        }
    }

    pub fn scaled(self, scale: f32) -> Self {
        Self { scale, ..self }
    }

    pub fn clipped(self, level_min: f32) -> Self {
        Self { level_min, ..self }
    }

    pub fn bordered(self, border: f32) -> Self {
        Self { border, ..self }
    }
}

fn centre(x: usize, y: usize) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

fn clamps(channel: usize) -> bool {
    channel == OUTLINE || channel == INNER
}

/// Blurs `pass.channel` of `src` into `dst`; other channels are copied.
pub fn directional_blur(src: &PixelBuffer, dst: &mut PixelBuffer, pass: &BlurPass) {
    dst.copy_from(src);
    let ch = pass.channel;
    for y in 0..src.height() {
        for x in 0..src.width() {
            let c = centre(x, y);
            let sum: f32 = TAPS
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let t = (i as f32 - 4.0) / 4.0;
                    w * src.sample_channel_or(c + pass.dir * t, ch, pass.border)
                })
                .sum();
            let mut out = (sum - pass.level_min).max(0.0) * pass.scale;
            if clamps(ch) {
                out = out.clamp(0.0, 1.0);
            }
            let mut px = dst.get(x, y);
            px[ch] = out;
            dst.set(x, y, px);
        }
    }
}

/// Value given to pixels reached at step `i` of an edge field `blur` wide.
pub fn field_falloff(i: usize, blur: f32) -> f32 {
    let v1 = 1.0 - i as f32 / blur;
    let v2 = 1.0 - (i + 1) as f32 / blur;
    (v1 + v2.max(0.0)) * 0.5 * (v1 / (v1 - v2)).min(1.0)
}

/// Grows `channel` inwards from every non-zero pixel, one ring step per
/// iteration, each step assigning the next [`field_falloff`] value. Beyond the
/// canvas the channel reads as 1.
pub fn extend_omni(work: &mut PixelBuffer, scratch: &mut PixelBuffer, channel: usize, blur: f32) {
    let steps = blur.ceil().max(0.0) as usize;
    for i in 0..steps {
        let val = field_falloff(i, blur);
        scratch.copy_from(work);
        for y in 0..work.height() {
            for x in 0..work.width() {
                if work.get(x, y)[channel] >= FIELD_THRESHOLD {
                    continue;
                }
                let c = centre(x, y);
                let reach = RING
                    .iter()
                    .map(|o| work.sample_channel_or(c + *o, channel, 1.0))
                    .fold(0.0f32, f32::max);
                if reach > FIELD_THRESHOLD {
                    let mut px = scratch.get(x, y);
                    px[channel] = val;
                    scratch.set(x, y, px);
                }
            }
        }
        std::mem::swap(work, scratch);
    }
}

/// Reaches along `dir` for non-zero pixels of `channel`, up to
/// `min(blur, 32)` pixels away, fading with distance. Beyond the canvas the
/// channel reads as 1.
pub fn extend_directional(src: &PixelBuffer, dst: &mut PixelBuffer, channel: usize, dir: Vec2, blur: f32) {
    dst.copy_from(src);
    let steps = blur.min(MAX_DIRECTIONAL_STEPS).ceil().max(0.0) as usize;
    for y in 0..src.height() {
        for x in 0..src.width() {
            let c = centre(x, y);
            let own = src.get(x, y)[channel];
            let best = (0..steps)
                .map(|i| src.sample_channel_or(c + dir * (i + 1) as f32, channel, 1.0) * field_falloff(i, blur))
                .fold(own, f32::max);
            let mut px = dst.get(x, y);
            px[channel] = best;
            dst.set(x, y, px);
        }
    }
}

/// Multiplies `channel` by the alpha of `mask`.
pub fn apply_mask(buf: &mut PixelBuffer, mask: &PixelBuffer, channel: usize) {
    for (px, m) in buf.pixels_mut().iter_mut().zip(mask.pixels()) {
        px[channel] *= m[3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: usize, height: usize, channel: usize, value: f32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height);
        for px in buf.pixels_mut() {
            px[channel] = value;
        }
        buf
    }

    #[test]
    fn blur_keeps_interior_of_flat_field() {
        let src = filled(9, 9, SPACIAL, 0.5);
        let mut dst = PixelBuffer::new(9, 9);
        directional_blur(&src, &mut dst, &BlurPass::new(Vec2::new(2.0, 0.0), SPACIAL));
        assert!((dst.get(4, 4)[SPACIAL] - 0.5).abs() < 1e-6);
        // The transparent border pulls the edge down.
        assert!(dst.get(0, 4)[SPACIAL] < 0.5);
        assert_eq!(dst.get(4, 4)[GLOW], 0.0);
    }

    #[test]
    fn clip_and_scale_harden_outline() {
        let src = filled(3, 3, OUTLINE, 0.3);
        let mut dst = PixelBuffer::new(3, 3);
        let pass = BlurPass::new(Vec2::ZERO, OUTLINE).clipped(0.2).scaled(200.0);
        directional_blur(&src, &mut dst, &pass);
        assert_eq!(dst.get(1, 1)[OUTLINE], 1.0);
        let pass = BlurPass::new(Vec2::ZERO, OUTLINE).clipped(0.4).scaled(200.0);
        directional_blur(&src, &mut dst, &pass);
        assert_eq!(dst.get(1, 1)[OUTLINE], 0.0);
    }

    #[test]
    fn falloff_decreases_and_ends_partial() {
        assert_eq!(field_falloff(0, 4.0), 0.875);
        assert_eq!(field_falloff(3, 4.0), 0.125);
        // Last step of a fractional width is scaled by what remains of it.
        assert!((field_falloff(2, 2.5) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn omni_field_decreases_inwards() {
        // A zero block inside a field of ones.
        let mut work = filled(16, 16, INNER, 1.0);
        for y in 2..14 {
            for x in 2..14 {
                work.set(x, y, [0.0; 4]);
            }
        }
        let mut scratch = PixelBuffer::new(16, 16);
        extend_omni(&mut work, &mut scratch, INNER, 4.0);
        let row: Vec<f32> = (0..16).map(|x| work.get(x, 8)[INNER]).collect();
        assert_eq!(row[1], 1.0);
        assert_eq!(row[2], field_falloff(0, 4.0));
        assert_eq!(row[3], field_falloff(1, 4.0));
        assert_eq!(row[5], field_falloff(3, 4.0));
        assert_eq!(row[6], 0.0);
        assert_eq!(row[10], field_falloff(3, 4.0));
    }

    #[test]
    fn omni_field_starts_at_the_canvas_edge() {
        let mut work = PixelBuffer::new(6, 6);
        let mut scratch = PixelBuffer::new(6, 6);
        extend_omni(&mut work, &mut scratch, INNER, 2.0);
        assert_eq!(work.get(0, 3)[INNER], field_falloff(0, 2.0));
        assert_eq!(work.get(1, 3)[INNER], field_falloff(1, 2.0));
        assert_eq!(work.get(2, 3)[INNER], 0.0);
    }

    #[test]
    fn directional_field_reaches_one_way() {
        let mut src = PixelBuffer::new(8, 1);
        src.set(7, 0, [0.0, 0.0, 1.0, 0.0]);
        let mut dst = PixelBuffer::new(8, 1);
        extend_directional(&src, &mut dst, INNER, Vec2::new(1.0, 0.0), 3.0);
        assert!(dst.get(6, 0)[INNER] > 0.0);
        assert_eq!(dst.get(3, 0)[INNER], 0.0);

        extend_directional(&src, &mut dst, INNER, Vec2::new(-1.0, 0.0), 3.0);
        assert_eq!(dst.get(6, 0)[INNER], 0.0);
    }
}
