// src/rasterizer/blend.rs

//! The blend stage: resolved effect colors plus the final per-pixel blend.
//!
//! Each effect owns one [`FxSlot`]. A render programs every slot, either with
//! the effect's color or back to the neutral (transparent, single stop, no
//! texture) state, so nothing from a previous render survives into the next.

use std::sync::Arc;

use crate::color::{Color, Gradient};
use crate::effects::{FxColor, FxFill};
use crate::geometry::{inverse_lerp, Rect, Vec2};
use crate::texture::Texture;

use super::blur::{GLOW, INNER, OUTLINE, SPACIAL};
use super::buffer::{blend_over, PixelBuffer};
use super::raster::projected_range;

/// An effect color resolved over its rectangle, in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct FxSlot {
    gradient: Gradient,
    /// Zero for a solid color.
    direction: Vec2,
    range: (f32, f32),
    texture: Option<Arc<Texture>>,
    tiling: Vec2,
    offset: Vec2,
    rect: Rect,
}

impl FxSlot {
    pub fn neutral() -> Self {
        Self {
            gradient: Gradient::neutral(),
            direction: Vec2::ZERO,
            range: (0.0, 0.0),
            texture: None,
            tiling: Vec2::ONE,
            offset: Vec2::ZERO,
            rect: Rect::default(),
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == FxSlot::neutral()
    }

    /// Resolves `color` over `rect`, scaling every alpha by `fade`.
    pub fn resolve(color: &FxColor, fade: f32, rect: Rect) -> Self {
        let (gradient, direction, range) = match &color.fill {
            FxFill::Solid(c) => (Gradient::solid(c.with_alpha(c.a * fade)), Vec2::ZERO, (0.0, 0.0)),
            FxFill::Gradient { gradient, angle } => {
                let dir = Vec2::from_angle_deg(*angle);
                (gradient.faded(fade), dir, projected_range(dir, rect))
            }
        };
        Self {
            gradient,
            direction,
            range,
            texture: color.texture.clone(),
            tiling: color.tiling,
            offset: color.offset,
            rect,
        }
    }

    pub fn sample(&self, p: Vec2) -> Color {
        let t = if self.direction.is_zero() {
            0.0
        } else {
            inverse_lerp(self.range.0, self.range.1, self.direction.dot(p))
        };
        let color = self.gradient.evaluate(t);
        match &self.texture {
            Some(tex) => color * tex.sample(self.rect.normalize(p) * self.tiling + self.offset),
            None => color,
        }
    }
}

impl Default for FxSlot {
    fn default() -> Self {
        FxSlot::neutral()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SpacialBlend {
    #[default]
    None,
    /// Shadow color times the spacial channel, times `opacity`.
    Shadow { opacity: f32 },
    /// The extruded 3D body buffer.
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InnerMode {
    #[default]
    None,
    AlphaBlend { power: f32 },
    Additive { power: f32, multiply: f32 },
    Emboss {
        light_dir: Vec2,
        intensity: f32,
        bevel: f32,
    },
}

/// Scalar blend parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendSettings {
    pub text_blend: f32,
    /// `Some(fill_text)` when an outline is drawn.
    pub outline: Option<bool>,
    pub spacial: SpacialBlend,
    pub inner: InnerMode,
    /// Clamped to `[-1, 1]`; 0 when there is no glow.
    pub glow: f32,
    pub glow_power: f32,
}

impl Default for BlendSettings {
    fn default() -> Self {
        Self {
            text_blend: 1.0,
            outline: None,
            spacial: SpacialBlend::None,
            inner: InnerMode::None,
            glow: 0.0,
            glow_power: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlendStage {
    outline: FxSlot,
    outer: FxSlot,
    inner: FxSlot,
    glow: FxSlot,
    pub settings: BlendSettings,
}

/// `1 - (1 - v)^power`: powers above 1 strengthen, below 1 weaken.
fn shape(v: f32, power: f32) -> f32 {
    1.0 - (1.0 - v.clamp(0.0, 1.0)).powf(power)
}

impl BlendStage {
    pub fn outline(&self) -> &FxSlot {
        &self.outline
    }

    /// Shadow color slot.
    pub fn outer(&self) -> &FxSlot {
        &self.outer
    }

    pub fn inner(&self) -> &FxSlot {
        &self.inner
    }

    pub fn glow(&self) -> &FxSlot {
        &self.glow
    }

    pub fn set_outline(&mut self, color: Option<(&FxColor, f32, Rect)>) {
        self.outline = program(color);
    }

    pub fn set_outer(&mut self, color: Option<(&FxColor, f32, Rect)>) {
        self.outer = program(color);
    }

    pub fn set_inner(&mut self, color: Option<(&FxColor, f32, Rect)>) {
        self.inner = program(color);
    }

    pub fn set_glow(&mut self, color: Option<(&FxColor, f32, Rect)>) {
        self.glow = program(color);
    }

    /// Composites the layers bottom to top into `out`: spacial, outline,
    /// text with its inner effect, glow.
    pub fn blend(&self, text: &PixelBuffer, body: &PixelBuffer, work: &PixelBuffer, out: &mut PixelBuffer) {
        let s = &self.settings;
        for y in 0..out.height() {
            for x in 0..out.width() {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let t = text.get(x, y);
                let w = work.get(x, y);
                let mut dst = [0.0f32; 4];

                match s.spacial {
                    SpacialBlend::Shadow { opacity } => {
                        let c = self.outer.sample(p);
                        blend_over(&mut dst, c, w[SPACIAL].clamp(0.0, 1.0) * opacity * c.a);
                    }
                    SpacialBlend::Body => {
                        let b = body.get(x, y);
                        blend_over(&mut dst, Color::from_array(b), b[3]);
                    }
                    SpacialBlend::None => {}
                }

                if let Some(fill_text) = s.outline {
                    let coverage = w[OUTLINE].clamp(0.0, 1.0);
                    let coverage = if fill_text { coverage } else { coverage * (1.0 - t[3]) };
                    let c = self.outline.sample(p);
                    blend_over(&mut dst, c, coverage * c.a);
                }

                if t[3] > 0.0 {
                    let rgb = self.inner_color(Color::from_array(t), w[INNER], work, x, y, p);
                    blend_over(&mut dst, rgb, t[3] * s.text_blend);
                }

                if s.glow != 0.0 {
                    let c = self.glow.sample(p);
                    let k = shape(w[GLOW], s.glow_power) * c.a * s.glow;
                    dst = add_glow(dst, c, k);
                }

                out.set(x, y, dst);
            }
        }
    }

    fn inner_color(&self, text: Color, field: f32, work: &PixelBuffer, x: usize, y: usize, p: Vec2) -> Color {
        match self.settings.inner {
            InnerMode::None => text,
            InnerMode::AlphaBlend { power } => {
                let c = self.inner.sample(p);
                let v = shape(field, power) * c.a;
                text.lerp(c, v).with_alpha(text.a)
            }
            InnerMode::Additive { power, multiply } => {
                let c = self.inner.sample(p);
                let v = shape(field, power) * c.a * multiply;
                Color::new(text.r + c.r * v, text.g + c.g * v, text.b + c.b * v, text.a)
            }
            InnerMode::Emboss {
                light_dir,
                intensity,
                bevel,
            } => {
                let (xi, yi) = (x as i64, y as i64);
                // Height rises away from the edge, where the field falls.
                let slope = Vec2::new(
                    work.fetch_clamped(xi - 1, yi)[INNER] - work.fetch_clamped(xi + 1, yi)[INNER],
                    work.fetch_clamped(xi, yi - 1)[INNER] - work.fetch_clamped(xi, yi + 1)[INNER],
                ) * 0.5;
                let shade = (-slope.dot(light_dir) * bevel).clamp(-1.0, 1.0) * intensity;
                if shade >= 0.0 {
                    let c = self.inner.sample(p);
                    let v = shade * c.a;
                    Color::new(text.r + c.r * v, text.g + c.g * v, text.b + c.b * v, text.a)
                } else {
                    let k = (1.0 + shade).max(0.0);
                    Color::new(text.r * k, text.g * k, text.b * k, text.a)
                }
            }
        }
    }
}

fn program(color: Option<(&FxColor, f32, Rect)>) -> FxSlot {
    match color {
        Some((color, fade, rect)) => FxSlot::resolve(color, fade, rect),
        None => FxSlot::neutral(),
    }
}

/// Adds (`k > 0`) or subtracts (`k < 0`) glow light in premultiplied space.
fn add_glow(dst: [f32; 4], c: Color, k: f32) -> [f32; 4] {
    let a = dst[3];
    let mut premul = [dst[0] * a, dst[1] * a, dst[2] * a];
    let src = [c.r, c.g, c.b];
    let out_a = if k > 0.0 { a + k * (1.0 - a) } else { a };
    for i in 0..3 {
        premul[i] = (premul[i] + src[i] * k).max(0.0);
    }
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    [
        (premul[0] / out_a).min(1.0),
        (premul[1] / out_a).min(1.0),
        (premul[2] / out_a).min(1.0),
        out_a.min(1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_slot_fades_alpha() {
        let slot = FxSlot::resolve(&FxColor::solid(Color::new(1.0, 0.0, 0.0, 0.8)), 0.5, Rect::default());
        let c = slot.sample(Vec2::new(3.0, 4.0));
        assert_eq!(c, Color::new(1.0, 0.0, 0.0, 0.4));
        assert!(!slot.is_neutral());
    }

    #[test]
    fn gradient_slot_spans_rect() {
        let color = FxColor::gradient(Gradient::linear(Color::BLACK, Color::WHITE), 90.0);
        let slot = FxSlot::resolve(&color, 1.0, Rect::new(0.0, 10.0, 4.0, 20.0));
        assert!(slot.sample(Vec2::new(2.0, 10.0)).r < 1e-4);
        assert!((slot.sample(Vec2::new(2.0, 20.0)).r - 0.5).abs() < 1e-4);
        assert!((slot.sample(Vec2::new(2.0, 40.0)).r - 1.0).abs() < 1e-4);
    }

    #[test]
    fn clearing_programs_neutral_state() {
        let mut stage = BlendStage::default();
        stage.set_glow(Some((&FxColor::solid(Color::WHITE), 1.0, Rect::new(0.0, 0.0, 5.0, 5.0))));
        assert!(!stage.glow().is_neutral());
        stage.set_glow(None);
        assert!(stage.glow().is_neutral());
        assert_eq!(stage.glow().sample(Vec2::new(1.0, 1.0)), Color::CLEAR);
    }

    #[test]
    fn glow_adds_and_subtracts() {
        let lit = add_glow([0.0; 4], Color::WHITE, 0.5);
        assert_eq!(lit, [1.0, 1.0, 1.0, 0.5]);
        let dark = add_glow([1.0, 1.0, 1.0, 1.0], Color::WHITE, -0.25);
        assert_eq!(dark, [0.75, 0.75, 0.75, 1.0]);
    }

    #[test]
    fn shape_curve() {
        assert_eq!(shape(0.5, 1.0), 0.5);
        assert_eq!(shape(0.5, 2.0), 0.75);
        assert_eq!(shape(2.0, 2.0), 1.0);
    }
}
