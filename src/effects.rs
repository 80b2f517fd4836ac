// src/effects.rs

//! The effect parameter block: how text is colored and which effects
//! (outline, spacial shadow/3D, inner effect, glow) are drawn around it.
//!
//! [`EffectParams`] is an immutable value assembled with
//! [`EffectParamsBuilder`]. Mutually exclusive effect groups are sum types:
//! the last builder call for a group wins.

use std::sync::Arc;

use crate::color::{Color, Gradient};
use crate::geometry::Vec2;
use crate::texture::Texture;

/// Maps a blur curve fix to the exponent applied to blurred coverage.
/// Negative values weaken the effect, positive values strengthen it.
pub fn blur_power(fix: f32) -> f32 {
    if fix < 0.0 {
        1.0 / (1.0 - fix)
    } else {
        fix + 1.0
    }
}

/// Color source of an effect.
#[derive(Debug, Clone, PartialEq)]
pub enum FxFill {
    Solid(Color),
    /// `angle` in degrees: 0 runs left to right, 90 bottom to top.
    Gradient { gradient: Gradient, angle: f32 },
}

/// Effect color: a solid color or gradient, optionally multiplied by a
/// texture placed with `tiling`/`offset` over the effect's rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct FxColor {
    pub fill: FxFill,
    pub texture: Option<Arc<Texture>>,
    pub tiling: Vec2,
    pub offset: Vec2,
}

impl FxColor {
    pub fn solid(color: Color) -> Self {
        Self {
            fill: FxFill::Solid(color),
            texture: None,
            tiling: Vec2::ONE,
            offset: Vec2::ZERO,
        }
    }

    pub fn gradient(gradient: Gradient, angle: f32) -> Self {
        Self {
            fill: FxFill::Gradient { gradient, angle },
            ..Self::solid(Color::WHITE)
        }
    }

    pub fn with_texture(self, texture: Arc<Texture>) -> Self {
        self.with_texture_placed(texture, Vec2::ONE, Vec2::ZERO)
    }

    pub fn with_texture_placed(mut self, texture: Arc<Texture>, tiling: Vec2, offset: Vec2) -> Self {
        self.texture = Some(texture);
        self.tiling = tiling;
        self.offset = offset;
        self
    }
}

impl Default for FxColor {
    fn default() -> Self {
        FxColor::solid(Color::WHITE)
    }
}

impl From<Color> for FxColor {
    fn from(color: Color) -> Self {
        FxColor::solid(color)
    }
}

/// Global text color.
#[derive(Debug, Clone, PartialEq)]
pub enum TextColor {
    Solid(Color),
    /// With `per_char` the gradient spans every character on its own (and
    /// turns with it); otherwise it spans the whole text.
    Gradient {
        gradient: Gradient,
        angle: f32,
        per_char: bool,
    },
}

impl Default for TextColor {
    fn default() -> Self {
        TextColor::Solid(Color::WHITE)
    }
}

/// Pattern texture multiplied into the text color.
#[derive(Debug, Clone, PartialEq)]
pub struct TextTexture {
    pub texture: Arc<Texture>,
    pub tiling: Vec2,
    pub offset: Vec2,
    /// Place the pattern per character instead of over the text bounds.
    pub per_char: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapezoidAxis {
    /// The non-parallel edges are the horizontal ones.
    Horizontal,
    /// The non-parallel edges are the vertical ones.
    Vertical,
}

/// Warps every character box into a trapezoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trapezoid {
    pub axis: TrapezoidAxis,
    /// Length ratio of the two parallel edges.
    pub ratio: f32,
    /// Bends the non-parallel edges; 0 keeps them straight.
    pub concave_convex: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    /// Pixels, always > 0.
    pub size: f32,
    pub color: FxColor,
    /// Fill the text area with outline color instead of cutting it out.
    pub fill_text: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub offset: Vec2,
    /// Grows the shadow shape before blurring.
    pub extend: f32,
    /// Degrees; `blur.x` runs along this angle, `blur.y` across it.
    pub blur_angle: f32,
    pub blur: Vec2,
    pub color: FxColor,
    /// Always > 0.
    pub intensity: f32,
}

/// Light shared by both extrusion modes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionLight {
    /// RGB: color the far end fades to; A: how far it fades.
    pub faded: Color,
    /// Light color by direction around the text, one full turn over `t` in
    /// `[0, 1]`; alpha darkens (< 0.5) or brightens (> 0.5) the lit edge.
    pub light: Gradient,
    /// Degrees added to the light direction.
    pub phase: f32,
    /// Edge softening in pixels before lighting.
    pub soft: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Perspective3D {
    /// Vanishing point relative to the text bounds (0..1 spans the bounds).
    pub endpoint: Vec2,
    /// Depth as a fraction of the distance to the vanishing point.
    pub stretch: f32,
    pub light: ExtrusionLight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Orthographic3D {
    /// Degrees; the body extrudes along this direction.
    pub direction: f32,
    /// Depth in pixels.
    pub length: f32,
    pub light: ExtrusionLight,
}

/// The mutually exclusive shadow / 3D group.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SpacialEffect {
    #[default]
    None,
    Shadow(Shadow),
    Perspective3D(Perspective3D),
    Orthographic3D(Orthographic3D),
}

impl SpacialEffect {
    pub fn is_3d(&self) -> bool {
        matches!(
            self,
            SpacialEffect::Perspective3D(_) | SpacialEffect::Orthographic3D(_)
        )
    }
}

/// How an inner blur is combined with the text color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InnerBlend {
    AlphaBlend,
    /// Colored blur times the factor is added; the factor may be negative.
    Additive(f32),
}

impl InnerBlend {
    fn additive(multiply: f32) -> Self {
        if multiply == 0.0 {
            InnerBlend::AlphaBlend
        } else {
            InnerBlend::Additive(multiply)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InnerEffect {
    #[default]
    None,
    /// Blur inwards from every edge.
    Blur {
        blur: f32,
        color: FxColor,
        blur_fix: f32,
        blend: InnerBlend,
    },
    /// Blur inwards from one side. `angle` is normalized to `[-360, 0)`.
    Shadow {
        angle: f32,
        blur: f32,
        color: FxColor,
        blur_fix: f32,
        blend: InnerBlend,
    },
    /// `light_angle` is normalized to `(0, 360]`.
    Emboss {
        light_color: Color,
        light_angle: f32,
        intensity: f32,
        bevel: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glow {
    pub extend: f32,
    pub blur_angle: f32,
    pub blur: Vec2,
    pub color: FxColor,
    pub blur_fix: f32,
    /// Non-zero; negative subtracts.
    pub intensity: f32,
}

/// Immutable effect parameter block.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectParams {
    line_height: f32,
    line_space: f32,
    text_color: TextColor,
    text_texture: Option<TextTexture>,
    char_space: f32,
    incline: Vec2,
    text_blend: f32,
    scale: Vec2,
    trapezoid: Option<Trapezoid>,
    outline: Option<Outline>,
    spacial: SpacialEffect,
    inner: InnerEffect,
    glow: Option<Glow>,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            line_height: 1.0,
            line_space: 0.0,
            text_color: TextColor::default(),
            text_texture: None,
            char_space: 0.0,
            incline: Vec2::ZERO,
            text_blend: 1.0,
            scale: Vec2::ONE,
            trapezoid: None,
            outline: None,
            spacial: SpacialEffect::None,
            inner: InnerEffect::None,
            glow: None,
        }
    }
}

impl EffectParams {
    pub fn builder() -> EffectParamsBuilder {
        EffectParamsBuilder::default()
    }

    /// A builder starting from this block.
    pub fn to_builder(&self) -> EffectParamsBuilder {
        EffectParamsBuilder {
            params: self.clone(),
        }
    }

    /// Baseline distance for `font_size`: `line_height * font_size + line_space`.
    pub fn line_distance(&self, font_size: i32) -> f32 {
        self.line_height * font_size as f32 + self.line_space
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn line_space(&self) -> f32 {
        self.line_space
    }

    pub fn text_color(&self) -> &TextColor {
        &self.text_color
    }

    pub fn text_texture(&self) -> Option<&TextTexture> {
        self.text_texture.as_ref()
    }

    pub fn char_space(&self) -> f32 {
        self.char_space
    }

    pub fn incline(&self) -> Vec2 {
        self.incline
    }

    pub fn text_blend(&self) -> f32 {
        self.text_blend
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn trapezoid(&self) -> Option<&Trapezoid> {
        self.trapezoid.as_ref()
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.outline.as_ref()
    }

    pub fn spacial(&self) -> &SpacialEffect {
        &self.spacial
    }

    pub fn inner(&self) -> &InnerEffect {
        &self.inner
    }

    pub fn glow(&self) -> Option<&Glow> {
        self.glow.as_ref()
    }

    /// Angle of a per-character text gradient, if the text color is one.
    pub fn per_char_gradient_angle(&self) -> Option<f32> {
        match &self.text_color {
            TextColor::Gradient {
                angle,
                per_char: true,
                ..
            } => Some(*angle),
            _ => None,
        }
    }
}

/// Builder for [`EffectParams`]. Every method consumes and returns the builder.
#[derive(Debug, Clone, Default)]
pub struct EffectParamsBuilder {
    params: EffectParams,
}

impl EffectParamsBuilder {
    pub fn build(self) -> EffectParams {
        self.params
    }

    /// Final line distance is `height * font_size + space`.
    pub fn line_height_and_space(mut self, height: f32, space: f32) -> Self {
        self.params.line_height = height;
        self.params.line_space = space;
        self
    }

    pub fn text_color(mut self, color: Color) -> Self {
        self.params.text_color = TextColor::Solid(color);
        self
    }

    pub fn text_gradient(mut self, gradient: Gradient, angle: f32, per_char: bool) -> Self {
        self.params.text_color = TextColor::Gradient {
            gradient,
            angle,
            per_char,
        };
        self
    }

    pub fn text_texture(self, texture: Arc<Texture>, per_char: bool) -> Self {
        self.text_texture_placed(texture, Vec2::ONE, Vec2::ZERO, per_char)
    }

    pub fn text_texture_placed(
        mut self,
        texture: Arc<Texture>,
        tiling: Vec2,
        offset: Vec2,
        per_char: bool,
    ) -> Self {
        self.params.text_texture = Some(TextTexture {
            texture,
            tiling,
            offset,
            per_char,
        });
        self
    }

    pub fn clear_text_texture(mut self) -> Self {
        self.params.text_texture = None;
        self
    }

    pub fn char_space(mut self, space: f32) -> Self {
        self.params.char_space = space;
        self
    }

    /// `incline.x` shifts the top edge against the bottom edge, `incline.y`
    /// the right edge against the left edge.
    pub fn incline(mut self, incline: Vec2) -> Self {
        self.params.incline = incline;
        self
    }

    /// Opacity of the plain text layer in the final blend.
    pub fn text_blend(mut self, blend: f32) -> Self {
        self.params.text_blend = blend;
        self
    }

    pub fn scale(mut self, scale: Vec2) -> Self {
        self.params.scale = scale;
        self
    }

    pub fn trapezoid_horizontal(mut self, ratio: f32, concave_convex: f32) -> Self {
        self.params.trapezoid = Some(Trapezoid {
            axis: TrapezoidAxis::Horizontal,
            ratio,
            concave_convex,
        });
        self
    }

    pub fn trapezoid_vertical(mut self, ratio: f32, concave_convex: f32) -> Self {
        self.params.trapezoid = Some(Trapezoid {
            axis: TrapezoidAxis::Vertical,
            ratio,
            concave_convex,
        });
        self
    }

    /// Sets the outline. A size of 0 or less leaves the current outline as is.
    pub fn outline(mut self, size: f32, color: impl Into<FxColor>, fill_text: bool) -> Self {
        if size <= 0.0 {
            return self;
        }
        self.params.outline = Some(Outline {
            size,
            color: color.into(),
            fill_text,
        });
        self
    }

    pub fn reset_outline(mut self) -> Self {
        self.params.outline = None;
        self
    }

    /// Directional shadow. Replaces any 3D effect; an intensity of 0 or less
    /// turns the spacial group off.
    pub fn shadow_directional(
        mut self,
        offset: Vec2,
        extend: f32,
        blur_angle: f32,
        blur: Vec2,
        color: impl Into<FxColor>,
        intensity: f32,
    ) -> Self {
        self.params.spacial = if intensity > 0.0 {
            SpacialEffect::Shadow(Shadow {
                offset,
                extend,
                blur_angle,
                blur,
                color: color.into(),
                intensity,
            })
        } else {
            SpacialEffect::None
        };
        self
    }

    /// Shadow blurred equally in every direction.
    pub fn shadow(
        self,
        offset: Vec2,
        extend: f32,
        blur: f32,
        color: impl Into<FxColor>,
        intensity: f32,
    ) -> Self {
        self.shadow_directional(offset, extend, 0.0, Vec2::splat(blur), color, intensity)
    }

    /// Perspective extrusion towards `endpoint`. Replaces any shadow.
    #[allow(clippy::too_many_arguments)]
    pub fn perspective_3d(
        mut self,
        endpoint: Vec2,
        stretch: f32,
        faded: Color,
        light: Gradient,
        phase: f32,
        soft: f32,
    ) -> Self {
        self.params.spacial = SpacialEffect::Perspective3D(Perspective3D {
            endpoint,
            stretch,
            light: ExtrusionLight {
                faded,
                light,
                phase,
                soft,
            },
        });
        self
    }

    /// Parallel extrusion `length` pixels deep. Replaces any shadow.
    pub fn orthographic_3d(
        mut self,
        direction: f32,
        length: f32,
        faded: Color,
        light: Gradient,
        phase: f32,
        soft: f32,
    ) -> Self {
        self.params.spacial = SpacialEffect::Orthographic3D(Orthographic3D {
            direction,
            length,
            light: ExtrusionLight {
                faded,
                light,
                phase,
                soft,
            },
        });
        self
    }

    pub fn reset_spacial(mut self) -> Self {
        self.params.spacial = SpacialEffect::None;
        self
    }

    /// Inner blur from every edge, alpha blended. A blur of 0 or less turns
    /// the inner effect off.
    pub fn inner_alpha_blend(self, blur: f32, color: impl Into<FxColor>, blur_fix: f32) -> Self {
        self.inner_blur(blur, color.into(), blur_fix, InnerBlend::AlphaBlend)
    }

    pub fn inner_additive(
        self,
        blur: f32,
        color: impl Into<FxColor>,
        blur_fix: f32,
        multiply: f32,
    ) -> Self {
        self.inner_blur(blur, color.into(), blur_fix, InnerBlend::additive(multiply))
    }

    /// One-sided inner shadow along `angle` degrees, alpha blended.
    pub fn inner_shadow_alpha_blend(
        self,
        angle: f32,
        blur: f32,
        color: impl Into<FxColor>,
        blur_fix: f32,
    ) -> Self {
        self.inner_shadow(angle, blur, color.into(), blur_fix, InnerBlend::AlphaBlend)
    }

    pub fn inner_shadow_additive(
        self,
        angle: f32,
        blur: f32,
        color: impl Into<FxColor>,
        blur_fix: f32,
        multiply: f32,
    ) -> Self {
        self.inner_shadow(angle, blur, color.into(), blur_fix, InnerBlend::additive(multiply))
    }

    /// Bevel lit from `light_angle` degrees. A bevel of 0 or less or a zero
    /// intensity turns the inner effect off.
    pub fn inner_emboss(mut self, light_color: Color, light_angle: f32, intensity: f32, bevel: f32) -> Self {
        if bevel <= 0.0 || intensity == 0.0 {
            self.params.inner = InnerEffect::None;
            return self;
        }
        let mut light_angle = light_angle % 360.0;
        if light_angle <= 0.0 {
            light_angle += 360.0;
        }
        self.params.inner = InnerEffect::Emboss {
            light_color,
            light_angle,
            intensity,
            bevel,
        };
        self
    }

    pub fn reset_inner(mut self) -> Self {
        self.params.inner = InnerEffect::None;
        self
    }

    fn inner_blur(mut self, blur: f32, color: FxColor, blur_fix: f32, blend: InnerBlend) -> Self {
        self.params.inner = if blur > 0.0 {
            InnerEffect::Blur {
                blur,
                color,
                blur_fix,
                blend,
            }
        } else {
            InnerEffect::None
        };
        self
    }

    fn inner_shadow(
        mut self,
        angle: f32,
        blur: f32,
        color: FxColor,
        blur_fix: f32,
        blend: InnerBlend,
    ) -> Self {
        if blur <= 0.0 {
            self.params.inner = InnerEffect::None;
            return self;
        }
        let mut angle = angle % 360.0;
        if angle >= 0.0 {
            angle -= 360.0;
        }
        self.params.inner = InnerEffect::Shadow {
            angle,
            blur,
            color,
            blur_fix,
            blend,
        };
        self
    }

    /// Glow blurred `blur.x` along `blur_angle` and `blur.y` across it. An
    /// intensity of 0 turns the glow off.
    pub fn glow_directional(
        mut self,
        extend: f32,
        blur_angle: f32,
        blur: Vec2,
        color: impl Into<FxColor>,
        blur_fix: f32,
        intensity: f32,
    ) -> Self {
        self.params.glow = (intensity != 0.0).then(|| Glow {
            extend,
            blur_angle,
            blur,
            color: color.into(),
            blur_fix,
            intensity,
        });
        self
    }

    pub fn glow(
        self,
        extend: f32,
        blur: f32,
        color: impl Into<FxColor>,
        blur_fix: f32,
        intensity: f32,
    ) -> Self {
        self.glow_directional(extend, 0.0, Vec2::splat(blur), color, blur_fix, intensity)
    }

    pub fn reset_glow(mut self) -> Self {
        self.params.glow = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> Gradient {
        Gradient::linear(Color::WHITE, Color::BLACK)
    }

    #[test]
    fn defaults() {
        let p = EffectParams::default();
        assert_eq!(p.line_distance(32), 32.0);
        assert_eq!(p.text_color(), &TextColor::Solid(Color::WHITE));
        assert_eq!(p.text_blend(), 1.0);
        assert_eq!(p.scale(), Vec2::ONE);
        assert!(p.outline().is_none());
        assert_eq!(p.spacial(), &SpacialEffect::None);
        assert_eq!(p.inner(), &InnerEffect::None);
        assert!(p.glow().is_none());
    }

    #[test]
    fn zero_outline_is_a_no_op() {
        // Contract: a non-positive size never enables or replaces the outline
        let p = EffectParams::builder().outline(0.0, Color::BLACK, true).build();
        assert!(p.outline().is_none());

        let p = EffectParams::builder()
            .outline(2.0, Color::BLACK, false)
            .outline(-1.0, Color::WHITE, true)
            .build();
        let outline = p.outline().unwrap();
        assert_eq!(outline.size, 2.0);
        assert!(!outline.fill_text);
    }

    #[test]
    fn spacial_effects_are_exclusive_last_wins() {
        let p = EffectParams::builder()
            .shadow(Vec2::new(2.0, -2.0), 1.0, 3.0, Color::BLACK, 1.0)
            .perspective_3d(Vec2::new(0.5, 2.0), 0.2, Color::BLACK, light(), 0.0, 1.0)
            .build();
        assert!(matches!(p.spacial(), SpacialEffect::Perspective3D(_)));

        let p = p
            .to_builder()
            .shadow(Vec2::ZERO, 0.0, 2.0, Color::BLACK, 0.5)
            .build();
        match p.spacial() {
            SpacialEffect::Shadow(s) => {
                assert_eq!(s.blur, Vec2::splat(2.0));
                assert_eq!(s.blur_angle, 0.0);
            }
            other => panic!("expected shadow, got {:?}", other),
        }

        let p = p
            .to_builder()
            .orthographic_3d(45.0, 8.0, Color::BLACK, light(), 0.0, 0.0)
            .build();
        assert!(p.spacial().is_3d());
        assert_eq!(p.to_builder().reset_spacial().build().spacial(), &SpacialEffect::None);
    }

    #[test]
    fn non_positive_shadow_intensity_disables_spacial() {
        let p = EffectParams::builder()
            .orthographic_3d(0.0, 8.0, Color::BLACK, light(), 0.0, 0.0)
            .shadow(Vec2::ZERO, 0.0, 2.0, Color::BLACK, -3.0)
            .build();
        assert_eq!(p.spacial(), &SpacialEffect::None);
    }

    #[test]
    fn inner_angles_are_normalized() {
        let p = EffectParams::builder()
            .inner_shadow_alpha_blend(90.0, 3.0, Color::BLACK, 0.0)
            .build();
        assert!(matches!(p.inner(), InnerEffect::Shadow { angle, .. } if *angle == -270.0));

        let p = EffectParams::builder()
            .inner_shadow_additive(-450.0, 3.0, Color::BLACK, 0.0, 0.5)
            .build();
        assert!(matches!(
            p.inner(),
            InnerEffect::Shadow { angle, blend: InnerBlend::Additive(m), .. } if *angle == -90.0 && *m == 0.5
        ));

        let p = EffectParams::builder()
            .inner_emboss(Color::WHITE, -90.0, 1.0, 2.0)
            .build();
        assert!(matches!(p.inner(), InnerEffect::Emboss { light_angle, .. } if *light_angle == 270.0));
        let p = p.to_builder().inner_emboss(Color::WHITE, 0.0, 1.0, 2.0).build();
        assert!(matches!(p.inner(), InnerEffect::Emboss { light_angle, .. } if *light_angle == 360.0));
    }

    #[test]
    fn inner_guards_turn_the_effect_off() {
        let base = EffectParams::builder().inner_alpha_blend(2.0, Color::BLACK, 0.0);
        assert!(matches!(base.clone().build().inner(), InnerEffect::Blur { .. }));
        assert_eq!(base.clone().inner_additive(0.0, Color::BLACK, 0.0, 1.0).build().inner(), &InnerEffect::None);
        assert_eq!(base.clone().inner_emboss(Color::WHITE, 45.0, 0.0, 2.0).build().inner(), &InnerEffect::None);
        assert_eq!(base.inner_emboss(Color::WHITE, 45.0, 1.0, 0.0).build().inner(), &InnerEffect::None);
    }

    #[test]
    fn additive_with_zero_multiply_is_alpha_blend() {
        let p = EffectParams::builder()
            .inner_additive(2.0, Color::BLACK, 0.0, 0.0)
            .build();
        assert!(matches!(p.inner(), InnerEffect::Blur { blend: InnerBlend::AlphaBlend, .. }));
    }

    #[test]
    fn glow_needs_non_zero_intensity() {
        let p = EffectParams::builder().glow(2.0, 3.0, Color::WHITE, 0.0, 0.0).build();
        assert!(p.glow().is_none());
        let p = EffectParams::builder().glow(2.0, 3.0, Color::WHITE, 0.0, -0.5).build();
        assert_eq!(p.glow().unwrap().blur, Vec2::splat(3.0));
    }

    #[test]
    fn per_char_gradient_angle_only_for_per_char_gradients() {
        let g = Gradient::linear(Color::WHITE, Color::BLACK);
        let whole = EffectParams::builder().text_gradient(g.clone(), 30.0, false).build();
        assert_eq!(whole.per_char_gradient_angle(), None);
        let per_char = EffectParams::builder().text_gradient(g, 30.0, true).build();
        assert_eq!(per_char.per_char_gradient_angle(), Some(30.0));
    }

    #[test]
    fn blur_power_curve() {
        assert_eq!(blur_power(0.0), 1.0);
        assert_eq!(blur_power(1.0), 2.0);
        assert_eq!(blur_power(-1.0), 0.5);
    }
}
