// src/rasterizer/passes.rs

//! Pass schedules (offset ring, outline, shadow/glow spread) and the 3D
//! light and extrusion passes.

use std::f32::consts::{FRAC_1_SQRT_2, TAU};

use crate::color::Color;
use crate::effects::ExtrusionLight;
use crate::geometry::Vec2;

use super::blur::{BlurPass, GLOW, INNER, OUTLINE};
use super::buffer::PixelBuffer;

/// The 16 offsets of a soft ring `extend` pixels wide, around `center`.
pub fn ring_offsets(extend: f32, center: Vec2) -> [Vec2; 16] {
    let e3 = extend;
    let e0 = -e3;
    let e1 = e0 + (e3 - e0) / 3.0;
    let e2 = (e1 + e3) * 0.5;
    let p = |x: f32, y: f32| Vec2::new(x, y) + center;
    [
        p(e0 * 0.8, e0 * 0.8),
        p(e1 * 0.8, e0),
        p(e2 * 0.8, e0),
        p(e3 * 0.8, e0 * 0.8),
        p(e0, e1 * 0.8),
        p(e1, e1),
        p(e2, e1),
        p(e3, e1 * 0.8),
        p(e0, e2 * 0.8),
        p(e1, e2),
        p(e2, e2),
        p(e3, e2 * 0.8),
        p(e0 * 0.8, e3 * 0.8),
        p(e1 * 0.8, e3),
        p(e2 * 0.8, e3),
        p(e3 * 0.8, e3 * 0.8),
    ]
}

/// Fills `offsets` with the samples an effect needs: the ring when it has an
/// extend, otherwise its centre alone.
pub fn sample_offsets(offsets: &mut Vec<Vec2>, extend: f32, center: Vec2) {
    offsets.clear();
    if extend > 0.0 {
        offsets.extend_from_slice(&ring_offsets(extend, center));
    } else {
        offsets.push(center);
    }
}

/// Builds the working buffer from the text and the 3D body.
///
/// r: body coverage (outline seed), g: body coverage dilated over the shadow
/// samples, b: one minus text coverage (inner seed), a: body coverage dilated
/// over the glow samples. An empty sample list leaves its channel at zero.
pub fn offset_pass(
    text: &PixelBuffer,
    body: &PixelBuffer,
    work: &mut PixelBuffer,
    shadow: &[Vec2],
    glow: &[Vec2],
) {
    let dilate = |c: Vec2, offsets: &[Vec2]| {
        offsets
            .iter()
            .map(|o| body.sample(c - *o)[3])
            .fold(0.0f32, f32::max)
    };
    for y in 0..work.height() {
        for x in 0..work.width() {
            let c = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            work.set(
                x,
                y,
                [
                    body.get(x, y)[3],
                    dilate(c, shadow),
                    1.0 - text.get(x, y)[3],
                    dilate(c, glow),
                ],
            );
        }
    }
}

/// The outline pass chain for an outline `size` pixels wide.
///
/// Returns the passes and the alpha fade applied to the outline color (sizes
/// below 0.75 are drawn at 0.75 and faded instead).
pub fn outline_passes(size: f32) -> (Vec<BlurPass>, f32) {
    let (o, fade) = if size < 0.75 {
        (0.75, size / 0.75)
    } else {
        (size, 1.0)
    };
    let grow = (1.5 * o + 1.0) / (o + 1.0);
    let tc = (o * 0.7).powi(4);
    let clip = (0.04 * tc + 1.0) / (tc + 1.0);
    let soft = (o * o).min((o.max(1.0) - 1.0).abs().powf(0.25) + 1.0);
    let radius = (o - soft * 0.8) * 0.7;
    let diag = radius * FRAC_1_SQRT_2;

    let passes = vec![
        BlurPass::new(Vec2::new(radius, 0.0), OUTLINE).scaled(grow),
        BlurPass::new(Vec2::new(0.0, radius), OUTLINE).scaled(grow),
        BlurPass::new(Vec2::new(diag, diag), OUTLINE).scaled(grow),
        BlurPass::new(Vec2::new(diag, -diag), OUTLINE)
            .scaled(200.0)
            .clipped(clip),
        BlurPass::new(Vec2::new(soft, soft), OUTLINE),
        BlurPass::new(Vec2::new(soft, -soft), OUTLINE),
    ];
    (passes, fade)
}

/// Per-pass gain for shadow and glow: `|intensity|^0.25` above 1, else 1.
pub fn intensity_gain(intensity: f32) -> f32 {
    let abs = intensity.abs();
    if abs > 1.0 {
        abs.powf(0.25)
    } else {
        1.0
    }
}

/// Shadow/glow spread: `blur.x` along `blur_angle`, `blur.y` across it, each
/// as four passes at 0.1, 0.2, 0.5 and 1.0 of the full width.
pub fn spread_passes(blur_angle: f32, blur: Vec2, channel: usize, gain: f32) -> Vec<BlurPass> {
    let (sin, cos) = blur_angle.to_radians().sin_cos();
    let mut passes = Vec::with_capacity(8);
    let axes = [
        (blur.x, Vec2::new(blur.x * cos, blur.x * sin)),
        (blur.y, Vec2::new(-blur.y * sin, blur.y * cos)),
    ];
    for (width, dir) in axes {
        if width == 0.0 {
            continue;
        }
        for f in [0.1, 0.2, 0.5, 1.0] {
            passes.push(BlurPass::new(dir * f, channel).scaled(gain));
        }
    }
    passes
}

/// The two diagonal passes of width `px`.
pub fn diagonal_passes(px: f32, channel: usize) -> [BlurPass; 2] {
    [
        BlurPass::new(Vec2::new(px, px), channel),
        BlurPass::new(Vec2::new(px, -px), channel),
    ]
}

/// Smoothing of the inner edge field; beyond the canvas counts as outside.
pub fn field_smoothing(px: f32) -> [BlurPass; 2] {
    diagonal_passes(px, INNER).map(|p| p.bordered(1.0))
}

/// Light softening: the two diagonal passes on the alpha channel.
pub fn soften_passes(soft: f32) -> [BlurPass; 2] {
    diagonal_passes(soft, GLOW)
}

/// Lights the text by direction: every covered pixel takes the light color
/// found at the angle of its outward normal (or, on flat coverage, of its
/// offset from `center`), turned by `light.phase` degrees.
pub fn light_pass(
    text: &PixelBuffer,
    coverage: &PixelBuffer,
    lit: &mut PixelBuffer,
    light: &ExtrusionLight,
    center: Vec2,
) {
    let phase = light.phase.to_radians();
    for y in 0..text.height() {
        for x in 0..text.width() {
            let t = text.get(x, y);
            if t[3] <= 0.0 {
                lit.set(x, y, [0.0; 4]);
                continue;
            }
            let (xi, yi) = (x as i64, y as i64);
            let grad = Vec2::new(
                coverage.fetch(xi + 1, yi)[3] - coverage.fetch(xi - 1, yi)[3],
                coverage.fetch(xi, yi + 1)[3] - coverage.fetch(xi, yi - 1)[3],
            );
            let normal = if grad.length() > 1e-4 {
                -grad
            } else {
                Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center
            };
            let angle = if normal.is_zero() {
                0.0
            } else {
                normal.y.atan2(normal.x)
            };
            let l = light.light.evaluate(((angle + phase) / TAU).rem_euclid(1.0));
            let gain = 2.0 * l.a;
            lit.set(
                x,
                y,
                [t[0] * l.r * gain, t[1] * l.g * gain, t[2] * l.b * gain, t[3]],
            );
        }
    }
}

/// Composites samples front to back, fading deeper ones toward `faded`.
/// `samples` yields `(position, depth)` with depth in `[0, 1]`.
fn march(lit: &PixelBuffer, faded: Color, samples: impl Iterator<Item = (Vec2, f32)>) -> [f32; 4] {
    let mut rgb = [0.0f32; 3];
    let mut alpha = 0.0f32;
    for (p, depth) in samples {
        let s = lit.sample(p);
        if s[3] <= 0.0 {
            continue;
        }
        let fade = (faded.a * depth).clamp(0.0, 1.0);
        let c = [faded.r, faded.g, faded.b];
        let weight = (1.0 - alpha) * s[3].min(1.0);
        for i in 0..3 {
            rgb[i] += weight * (s[i] + (c[i] - s[i]) * fade);
        }
        alpha += weight;
        if alpha >= 0.999 {
            break;
        }
    }
    if alpha <= 0.0 {
        return [0.0; 4];
    }
    [rgb[0] / alpha, rgb[1] / alpha, rgb[2] / alpha, alpha]
}

/// Parallel extrusion: the body extends `length` pixels along `dir`.
pub fn extrude_orthographic(lit: &PixelBuffer, body: &mut PixelBuffer, dir: Vec2, length: f32, faded: Color) {
    let steps = length.ceil().max(1.0) as usize;
    let step = length / steps as f32;
    for y in 0..body.height() {
        for x in 0..body.width() {
            let c = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let samples =
                (0..=steps).map(|k| (c - dir * (k as f32 * step), k as f32 / steps as f32));
            body.set(x, y, march(lit, faded, samples));
        }
    }
}

/// Perspective extrusion: every text point extends toward `vanishing` by
/// `stretch` of its distance to it, in `steps` samples.
pub fn extrude_perspective(
    lit: &PixelBuffer,
    body: &mut PixelBuffer,
    vanishing: Vec2,
    stretch: f32,
    steps: usize,
    faded: Color,
) {
    let steps = steps.max(1);
    for y in 0..body.height() {
        for x in 0..body.width() {
            let c = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let samples = (0..=steps).map_while(|k| {
                let depth = k as f32 / steps as f32;
                let t = stretch * depth;
                // Points at the vanishing point itself have no source.
                (1.0 - t > 1e-4).then(|| ((c - vanishing * t) * (1.0 / (1.0 - t)), depth))
            });
            body.set(x, y, march(lit, faded, samples));
        }
    }
}
