// src/rasterizer/canvas.rs

//! Canvas sizing: how far every enabled effect may paint outside the glyph
//! bounds, and where the text lands inside the padded canvas.

use log::{debug, warn};

use crate::effects::{EffectParams, SpacialEffect};
use crate::geometry::{Rect, Vec2};

/// Largest canvas side in pixels.
pub const MAX_CANVAS_SIDE: usize = 16384;

/// Padding on each side of the glyph bounds, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub right: f32,
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
}

impl Padding {
    fn max(self, other: Padding) -> Padding {
        Padding {
            right: self.right.max(other.right),
            top: self.top.max(other.top),
            left: self.left.max(other.left),
            bottom: self.bottom.max(other.bottom),
        }
    }

    fn grow(self, amount: f32) -> Padding {
        Padding {
            right: self.right + amount,
            top: self.top + amount,
            left: self.left + amount,
            bottom: self.bottom + amount,
        }
    }

    /// Rounds up to whole pixels, ignoring float noise such as the
    /// `cos(90°)` residue of an axis-aligned direction.
    fn ceil(self) -> Padding {
        let up = |v: f32| (v - 1e-4).ceil().max(0.0);
        Padding {
            right: up(self.right),
            top: up(self.top),
            left: up(self.left),
            bottom: up(self.bottom),
        }
    }

    fn uniform(amount: f32) -> Padding {
        Padding {
            right: amount,
            top: amount,
            left: amount,
            bottom: amount,
        }
    }
}

/// Shadow reach relative to the glyph bounds: the shadow shape spans
/// `[min, max]` around each text pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowReach {
    pub min: Vec2,
    pub max: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    /// Glyph bounds in object space.
    pub bounds: Rect,
    pub padding: Padding,
    pub width: usize,
    pub height: usize,
    /// Glyph bounds inside the canvas, in pixels.
    pub text_rect: Rect,
}

impl CanvasLayout {
    /// Sizes the canvas for `bounds` plus the padding of every enabled effect.
    ///
    /// # Returns
    /// `None` when a side is not finite or exceeds [`MAX_CANVAS_SIDE`].
    pub fn new(bounds: Rect, params: &EffectParams) -> Option<Self> {
        let padding = effect_padding(bounds, params);
        let side = |extent: f32| {
            let extent = extent.ceil();
            (extent.is_finite() && extent <= MAX_CANVAS_SIDE as f32).then(|| extent.max(1.0) as usize)
        };
        let size = side(bounds.width + padding.left + padding.right)
            .zip(side(bounds.height + padding.bottom + padding.top))
            .filter(|(w, h)| w.checked_mul(*h).is_some());
        let Some((width, height)) = size else {
            warn!(
                "Canvas for bounds {:?}, padding {:?} exceeds {} px per side",
                bounds, padding, MAX_CANVAS_SIDE
            );
            return None;
        };
        let text_rect = Rect::new(
            padding.left,
            padding.bottom,
            width as f32 - padding.left - padding.right,
            height as f32 - padding.bottom - padding.top,
        );
        debug!(
            "Canvas {}x{} for bounds {:?}, padding {:?}",
            width, height, bounds, padding
        );
        Some(Self {
            bounds,
            padding,
            width,
            height,
            text_rect,
        })
    }

    /// Object-space point to canvas pixels.
    pub fn to_canvas(&self, p: Vec2) -> Vec2 {
        p - self.bounds.min() + Vec2::new(self.padding.left, self.padding.bottom)
    }

    /// Canvas pixels to object space.
    pub fn to_object(&self, p: Vec2) -> Vec2 {
        p + self.bounds.min() - Vec2::new(self.padding.left, self.padding.bottom)
    }

    pub fn canvas_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    /// Vanishing point of a perspective extrusion in canvas pixels.
    pub fn vanishing_point(&self, endpoint: Vec2) -> Vec2 {
        let size = Vec2::new(self.bounds.width, self.bounds.height);
        self.to_canvas(Vec2::new(endpoint.x * size.x, endpoint.y * size.y) + self.bounds.min())
    }
}

/// Offset range covered by the shadow, when one is enabled.
pub fn shadow_reach(params: &EffectParams) -> Option<ShadowReach> {
    match params.spacial() {
        SpacialEffect::Shadow(s) => {
            let blur = Vec2::splat(s.extend + s.blur.length());
            Some(ShadowReach {
                min: s.offset - blur,
                max: s.offset + blur,
            })
        }
        _ => None,
    }
}

/// Padding needed by every enabled effect, rounded up to whole pixels.
pub fn effect_padding(bounds: Rect, params: &EffectParams) -> Padding {
    let mut extend = Padding::default();
    if let Some(reach) = shadow_reach(params) {
        extend = extend.max(Padding {
            right: reach.max.x,
            top: reach.max.y,
            left: -reach.min.x,
            bottom: -reach.min.y,
        });
    }
    if let Some(glow) = params.glow() {
        extend = extend.max(Padding::uniform(glow.extend + glow.blur.length()));
    }

    let spacial = match params.spacial() {
        SpacialEffect::Orthographic3D(o) => {
            let off = Vec2::from_angle_deg(o.direction) * o.length;
            Padding {
                right: off.x,
                top: off.y,
                left: -off.x,
                bottom: -off.y,
            }
            .max(Padding::default())
        }
        SpacialEffect::Perspective3D(p) => {
            let size = Vec2::new(bounds.width, bounds.height);
            let ep = Vec2::new(p.endpoint.x * size.x, p.endpoint.y * size.y) + bounds.min();
            let (min, max) = (bounds.min(), bounds.max());
            Padding {
                right: (ep.x - max.x) * p.stretch,
                top: (ep.y - max.y) * p.stretch,
                left: (min.x - ep.x) * p.stretch,
                bottom: (min.y - ep.y) * p.stretch,
            }
            .max(Padding::default())
        }
        _ => Padding::default(),
    };
    let outline = params.outline().map_or(0.0, |o| o.size);

    extend.max(spacial.grow(outline)).ceil()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, Gradient};

    fn bounds() -> Rect {
        Rect::new(0.0, -3.0, 22.0, 14.0)
    }

    #[test]
    fn no_effects_no_padding() {
        let layout = CanvasLayout::new(bounds(), &EffectParams::default()).unwrap();
        assert_eq!(layout.padding, Padding::default());
        assert_eq!((layout.width, layout.height), (22, 14));
        assert_eq!(layout.text_rect, Rect::new(0.0, 0.0, 22.0, 14.0));
        assert_eq!(layout.to_canvas(Vec2::new(0.0, -3.0)), Vec2::ZERO);
    }

    #[test]
    fn oversized_canvas_is_refused() {
        let huge = Rect::new(0.0, 0.0, 1.0e9, 14.0);
        assert!(CanvasLayout::new(huge, &EffectParams::default()).is_none());
        let nan = Rect::new(0.0, 0.0, f32::NAN, 14.0);
        assert!(CanvasLayout::new(nan, &EffectParams::default()).is_none());

        let edge = Rect::new(0.0, 0.0, MAX_CANVAS_SIDE as f32, 1.0);
        let layout = CanvasLayout::new(edge, &EffectParams::default()).unwrap();
        assert_eq!(layout.width, MAX_CANVAS_SIDE);
        let params = EffectParams::builder().outline(1.0, Color::BLACK, false).build();
        assert!(CanvasLayout::new(edge, &params).is_none());
    }

    #[test]
    fn shadow_padding_follows_offset() {
        let params = EffectParams::builder()
            .shadow(Vec2::new(4.0, -2.0), 1.0, 0.0, Color::BLACK, 1.0)
            .build();
        let pad = effect_padding(bounds(), &params);
        assert_eq!(
            pad,
            Padding {
                right: 5.0,
                top: 0.0,
                left: 0.0,
                bottom: 3.0
            }
        );
    }

    #[test]
    fn orthographic_padding_is_one_sided() {
        let params = EffectParams::builder()
            .orthographic_3d(0.0, 6.0, Color::BLACK, Gradient::default(), 0.0, 0.0)
            .outline(1.5, Color::BLACK, false)
            .build();
        let pad = effect_padding(bounds(), &params);
        assert_eq!(pad.right, 8.0);
        assert_eq!(pad.left, 2.0);
        assert_eq!(pad.top, 2.0);
    }

    #[test]
    fn perspective_padding_reaches_toward_vanishing_point() {
        // Vanishing point straight above the text centre.
        let params = EffectParams::builder()
            .perspective_3d(Vec2::new(0.5, 3.0), 0.5, Color::BLACK, Gradient::default(), 0.0, 0.0)
            .build();
        let pad = effect_padding(bounds(), &params);
        // ep.y = 3 * 14 - 3 = 39, max.y = 11 -> (39 - 11) * 0.5
        assert_eq!(pad.top, 14.0);
        assert_eq!(pad.bottom, 0.0);
        assert_eq!(pad.left, 0.0);
        assert_eq!(pad.right, 0.0);
    }

    #[test]
    fn padding_is_monotonic_in_enabled_effects() {
        // Contract: enabling another effect never shrinks any side.
        let configs: Vec<fn(crate::effects::EffectParamsBuilder) -> crate::effects::EffectParamsBuilder> = vec![
            |b| b.outline(2.0, Color::BLACK, false),
            |b| b.shadow(Vec2::new(3.0, -3.0), 1.0, 2.0, Color::BLACK, 1.0),
            |b| b.glow(2.0, 4.0, Color::WHITE, 0.0, 1.0),
            |b| b.orthographic_3d(135.0, 5.0, Color::BLACK, Gradient::default(), 0.0, 0.0),
            |b| b.inner_alpha_blend(3.0, Color::BLACK, 0.0),
        ];
        for mask in 0u32..(1 << configs.len()) {
            for (i, extra) in configs.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    continue;
                }
                let mut base = EffectParams::builder();
                for (j, f) in configs.iter().enumerate() {
                    if mask & (1 << j) != 0 {
                        base = f(base);
                    }
                }
                let without = effect_padding(bounds(), &base.clone().build());
                let with = effect_padding(bounds(), &extra(base).build());
                // Spacial setters replace each other, so only compare when the
                // extra effect does not displace an enabled one.
                let displaces = (i == 1 || i == 3) && mask & 0b1010 != 0;
                if displaces {
                    continue;
                }
                assert!(with.right >= without.right, "mask {mask:#b} + {i}");
                assert!(with.top >= without.top, "mask {mask:#b} + {i}");
                assert!(with.left >= without.left, "mask {mask:#b} + {i}");
                assert!(with.bottom >= without.bottom, "mask {mask:#b} + {i}");
            }
        }
    }
}
