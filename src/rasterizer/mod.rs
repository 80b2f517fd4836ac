// src/rasterizer/mod.rs

//! The compositing pipeline.
//!
//! A [`Compositor`] turns a laid-out [`TextMesh`] and an [`EffectParams`]
//! block into one pixel buffer:
//!
//! ```text
//! TextMesh ─► text ─► 3D body ─► offset pass ─► outline / shadow / glow / inner ─► blend ─► out
//!            (mask)   (or copy)   (r g b a)       (directional blurs, edge fields)
//! ```
//!
//! All intermediate buffers come from the compositor's own pool, so one
//! compositor serves one render at a time and keeps no state between renders
//! other than recycled memory and the blend stage.

pub mod blend;
pub mod blur;
pub mod buffer;
pub mod canvas;
pub mod passes;
pub mod raster;

pub use blend::{BlendSettings, BlendStage, FxSlot, InnerMode, SpacialBlend};
pub use buffer::{AllocPolicy, BufferPool, PixelBuffer, DEFAULT_POOL_CAPACITY};
pub use canvas::{CanvasLayout, Padding};

use log::{debug, trace};

use crate::effects::{blur_power, EffectParams, FxColor, InnerBlend, InnerEffect, SpacialEffect};
use crate::geometry::{Rect, Vec2};
use crate::layout::TextMesh;
use crate::texture::Texture;

use blur::{apply_mask, directional_blur, extend_directional, extend_omni, BlurPass, GLOW, INNER, SPACIAL};
use passes::{
    extrude_orthographic, extrude_perspective, field_smoothing, intensity_gain, light_pass,
    offset_pass, outline_passes, sample_offsets, soften_passes, spread_passes,
};

/// Output of one composite call.
#[derive(Debug, Clone, PartialEq)]
pub struct Composited {
    pub buffer: PixelBuffer,
    pub canvas: CanvasLayout,
}

/// Runs `passes` in order, ping-ponging between `work` and `scratch`.
/// The result always ends up in `work`.
fn run_passes(passes: &[BlurPass], work: &mut PixelBuffer, scratch: &mut PixelBuffer) {
    for pass in passes {
        directional_blur(work, scratch, pass);
        std::mem::swap(work, scratch);
    }
}

/// A compositing pipeline instance with its own buffer pool.
#[derive(Debug, Default)]
pub struct Compositor {
    pool: BufferPool,
    stage: BlendStage,
    shadow_offsets: Vec<Vec2>,
    glow_offsets: Vec<Vec2>,
}

impl Compositor {
    /// A compositor whose pool keeps up to `pool_capacity` idle buffers.
    pub fn new(pool_capacity: usize) -> Self {
        Self {
            pool: BufferPool::new(pool_capacity),
            ..Self::default()
        }
    }

    pub fn stage(&self) -> &BlendStage {
        &self.stage
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Returns a pooled output buffer for reuse.
    pub fn release(&mut self, buffer: PixelBuffer) {
        self.pool.give_back(buffer);
    }

    /// Composites `mesh` with `params`.
    ///
    /// # Arguments
    /// * `atlases` - Atlas of each font, indexed like the submesh font indices
    /// * `policy` - Where the output buffer comes from
    ///
    /// # Returns
    /// `None` for an empty mesh or a canvas larger than
    /// [`canvas::MAX_CANVAS_SIDE`]; nothing is allocated in either case.
    pub fn composite(
        &mut self,
        mesh: &TextMesh,
        atlases: &[Option<&Texture>],
        params: &EffectParams,
        policy: AllocPolicy,
    ) -> Option<Composited> {
        let bounds = mesh.bounds()?;
        let canvas = CanvasLayout::new(bounds, params)?;
        let (width, height) = (canvas.width, canvas.height);

        let mut text = self.pool.checkout(width, height);
        raster::draw_mesh(&mut text, mesh, atlases, params, &canvas);

        let mut body = self.pool.checkout(width, height);
        let mut scratch = self.pool.checkout(width, height);
        let extruded = self.build_body(&text, &mut body, &mut scratch, params, &canvas);

        match params.spacial() {
            SpacialEffect::Shadow(s) => sample_offsets(&mut self.shadow_offsets, s.extend, s.offset),
            _ => self.shadow_offsets.clear(),
        }
        match params.glow() {
            Some(g) => sample_offsets(&mut self.glow_offsets, g.extend, Vec2::ZERO),
            None => self.glow_offsets.clear(),
        }
        let mut work = self.pool.checkout(width, height);
        offset_pass(&text, &body, &mut work, &self.shadow_offsets, &self.glow_offsets);

        let mut settings = BlendSettings {
            text_blend: params.text_blend(),
            spacial: if extruded {
                SpacialBlend::Body
            } else {
                SpacialBlend::None
            },
            ..BlendSettings::default()
        };
        self.outline_stage(params, &canvas, &mut work, &mut scratch, &mut settings);
        self.shadow_stage(params, &canvas, &mut work, &mut scratch, &mut settings);
        self.glow_stage(params, &canvas, &mut work, &mut scratch, &mut settings);
        self.inner_stage(params, &canvas, &text, &mut work, &mut scratch, &mut settings);
        self.stage.settings = settings;
        trace!("Blend settings: {:?}", settings);

        let mut out = match policy {
            AllocPolicy::Pooled => self.pool.checkout(width, height),
            AllocPolicy::Owned => PixelBuffer::new(width, height),
        };
        self.stage.blend(&text, &body, &work, &mut out);

        for buffer in [text, body, scratch, work] {
            self.pool.give_back(buffer);
        }
        debug!("Composited {}x{} ({:?})", width, height, policy);
        Some(Composited {
            buffer: out,
            canvas,
        })
    }

    /// Fills `body` with the 3D extrusion of `text`, or a copy of it.
    ///
    /// # Returns
    /// true when an extrusion was drawn.
    fn build_body(
        &mut self,
        text: &PixelBuffer,
        body: &mut PixelBuffer,
        scratch: &mut PixelBuffer,
        params: &EffectParams,
        canvas: &CanvasLayout,
    ) -> bool {
        let light = match params.spacial() {
            SpacialEffect::Perspective3D(p) if p.stretch > 0.0 => &p.light,
            SpacialEffect::Orthographic3D(o) if o.length > 0.0 => &o.light,
            _ => {
                body.copy_from(text);
                return false;
            }
        };

        let mut coverage = self.pool.checkout(canvas.width, canvas.height);
        if light.soft > 0.0 {
            let [first, second] = soften_passes(light.soft);
            directional_blur(text, scratch, &first);
            directional_blur(scratch, &mut coverage, &second);
        } else {
            coverage.copy_from(text);
        }
        light_pass(text, &coverage, scratch, light, canvas.text_rect.center());
        self.pool.give_back(coverage);

        match params.spacial() {
            SpacialEffect::Orthographic3D(o) => {
                debug!("Orthographic extrusion: {} px at {} deg", o.length, o.direction);
                extrude_orthographic(scratch, body, Vec2::from_angle_deg(o.direction), o.length, light.faded);
            }
            SpacialEffect::Perspective3D(p) => {
                let vanishing = canvas.vanishing_point(p.endpoint);
                let steps = 2 * perspective_reach(canvas.text_rect, vanishing, p.stretch);
                debug!("Perspective extrusion toward {:?}, {} steps", vanishing, steps);
                extrude_perspective(scratch, body, vanishing, p.stretch, steps, light.faded);
            }
            _ => {}
        }
        true
    }

    fn outline_stage(
        &mut self,
        params: &EffectParams,
        canvas: &CanvasLayout,
        work: &mut PixelBuffer,
        scratch: &mut PixelBuffer,
        settings: &mut BlendSettings,
    ) {
        let Some(outline) = params.outline() else {
            self.stage.set_outline(None);
            return;
        };
        let (passes, fade) = outline_passes(outline.size);
        run_passes(&passes, work, scratch);
        let rect = canvas.text_rect.expand(outline.size.max(0.75));
        self.stage.set_outline(Some((&outline.color, fade, rect)));
        settings.outline = Some(outline.fill_text);
    }

    fn shadow_stage(
        &mut self,
        params: &EffectParams,
        canvas: &CanvasLayout,
        work: &mut PixelBuffer,
        scratch: &mut PixelBuffer,
        settings: &mut BlendSettings,
    ) {
        let (SpacialEffect::Shadow(shadow), Some(reach)) = (params.spacial(), canvas::shadow_reach(params)) else {
            self.stage.set_outer(None);
            return;
        };
        let passes = spread_passes(shadow.blur_angle, shadow.blur, SPACIAL, intensity_gain(shadow.intensity));
        run_passes(&passes, work, scratch);
        let text = canvas.text_rect;
        let rect = Rect::new(
            text.x + reach.min.x,
            text.y + reach.min.y,
            text.width + reach.max.x - reach.min.x,
            text.height + reach.max.y - reach.min.y,
        );
        self.stage.set_outer(Some((&shadow.color, 1.0, rect)));
        settings.spacial = SpacialBlend::Shadow {
            opacity: shadow.intensity.min(1.0),
        };
    }

    fn glow_stage(
        &mut self,
        params: &EffectParams,
        canvas: &CanvasLayout,
        work: &mut PixelBuffer,
        scratch: &mut PixelBuffer,
        settings: &mut BlendSettings,
    ) {
        let Some(glow) = params.glow() else {
            self.stage.set_glow(None);
            return;
        };
        let passes = spread_passes(glow.blur_angle, glow.blur, GLOW, intensity_gain(glow.intensity));
        run_passes(&passes, work, scratch);
        self.stage.set_glow(Some((&glow.color, 1.0, canvas.canvas_rect())));
        settings.glow = glow.intensity.clamp(-1.0, 1.0);
        settings.glow_power = blur_power(glow.blur_fix);
    }

    fn inner_stage(
        &mut self,
        params: &EffectParams,
        canvas: &CanvasLayout,
        text: &PixelBuffer,
        work: &mut PixelBuffer,
        scratch: &mut PixelBuffer,
        settings: &mut BlendSettings,
    ) {
        let rect = canvas.text_rect;
        let mode = |blend: InnerBlend, fix: f32| match blend {
            InnerBlend::AlphaBlend => InnerMode::AlphaBlend {
                power: blur_power(fix),
            },
            InnerBlend::Additive(multiply) => InnerMode::Additive {
                power: blur_power(fix),
                multiply,
            },
        };
        match params.inner() {
            InnerEffect::None => {
                self.stage.set_inner(None);
            }
            InnerEffect::Blur {
                blur,
                color,
                blur_fix,
                blend,
            } => {
                extend_omni(work, scratch, INNER, *blur);
                run_passes(&field_smoothing(1.0), work, scratch);
                apply_mask(work, text, INNER);
                self.stage.set_inner(Some((color, 1.0, rect)));
                settings.inner = mode(*blend, *blur_fix);
            }
            InnerEffect::Shadow {
                angle,
                blur,
                color,
                blur_fix,
                blend,
            } => {
                extend_directional(work, scratch, INNER, Vec2::from_angle_deg(*angle), *blur);
                std::mem::swap(work, scratch);
                apply_mask(work, text, INNER);
                run_passes(&field_smoothing(1.0), work, scratch);
                self.stage.set_inner(Some((color, 1.0, rect)));
                settings.inner = mode(*blend, *blur_fix);
            }
            InnerEffect::Emboss {
                light_color,
                light_angle,
                intensity,
                bevel,
            } => {
                extend_omni(work, scratch, INNER, *bevel);
                run_passes(&field_smoothing(1.0), work, scratch);
                run_passes(&field_smoothing(2.0), work, scratch);
                let light = FxColor::solid(*light_color);
                self.stage.set_inner(Some((&light, 1.0, rect)));
                settings.inner = InnerMode::Emboss {
                    light_dir: Vec2::from_angle_deg(*light_angle),
                    intensity: *intensity,
                    bevel: *bevel,
                };
            }
        }
    }
}

/// Pixels a perspective extrusion may travel: the longest corner distance to
/// the vanishing point, scaled by `stretch`.
fn perspective_reach(text: Rect, vanishing: Vec2, stretch: f32) -> usize {
    let (min, max) = (text.min(), text.max());
    let far = [min, Vec2::new(min.x, max.y), max, Vec2::new(max.x, min.y)]
        .iter()
        .map(|c| c.distance(vanishing))
        .fold(0.0f32, f32::max);
    (far * stretch).ceil().max(1.0) as usize
}

#[cfg(test)]
mod tests;
