// src/rasterizer/raster.rs

//! Glyph quad rasterization into the text buffer.
//!
//! Every quad is a parallelogram after layout, so each pixel centre is mapped
//! back to quad-local `(u, v)` with the inverse of the quad's affine frame. The
//! trapezoid warp then runs in that local space, atlas coverage and vertex
//! attributes are interpolated bilinearly, and the global text color is
//! resolved per pixel.

use log::warn;

use crate::color::Color;
use crate::effects::{EffectParams, TextColor, TextTexture, Trapezoid, TrapezoidAxis};
use crate::geometry::{inverse_lerp, lerp, Rect, Vec2};
use crate::layout::{GlyphQuad, TextMesh};
use crate::texture::Texture;

use super::buffer::{blend_over, PixelBuffer};
use super::canvas::CanvasLayout;

/// Text color resolution shared by every quad of one render.
struct TextPaint<'a> {
    color: &'a TextColor,
    texture: Option<&'a TextTexture>,
    trapezoid: Option<&'a Trapezoid>,
    bounds: Rect,
    /// Whole-text gradient direction and the projected range of the bounds.
    gradient_dir: Vec2,
    gradient_range: (f32, f32),
}

impl<'a> TextPaint<'a> {
    fn new(params: &'a EffectParams, bounds: Rect) -> Self {
        let (gradient_dir, gradient_range) = match params.text_color() {
            TextColor::Gradient { angle, .. } => {
                let dir = Vec2::from_angle_deg(*angle);
                (dir, projected_range(dir, bounds))
            }
            TextColor::Solid(_) => (Vec2::ZERO, (0.0, 0.0)),
        };
        Self {
            color: params.text_color(),
            texture: params.text_texture(),
            trapezoid: params.trapezoid(),
            bounds,
            gradient_dir,
            gradient_range,
        }
    }

    fn color_at(&self, quad: &GlyphQuad, local: Vec2, object: Vec2) -> Color {
        let mut global = match self.color {
            TextColor::Solid(c) => *c,
            TextColor::Gradient {
                gradient,
                per_char: true,
                ..
            } => gradient.evaluate(bilerp(quad.vertices.map(|v| v.text_gradient), local)),
            TextColor::Gradient { gradient, .. } => {
                let (lo, hi) = self.gradient_range;
                gradient.evaluate(inverse_lerp(lo, hi, self.gradient_dir.dot(object)))
            }
        };
        if let Some(tex) = self.texture {
            let uv = if tex.per_char {
                local
            } else {
                self.bounds.normalize(object)
            };
            global = global * tex.texture.sample(uv * tex.tiling + tex.offset);
        }
        let own = bilerp_color(quad.vertices.map(|v| v.color), local);
        quad.color_override.apply(global, own)
    }
}

/// Smallest and largest projection of the rectangle's corners onto `dir`.
pub fn projected_range(dir: Vec2, rect: Rect) -> (f32, f32) {
    let (min, max) = (rect.min(), rect.max());
    [min, Vec2::new(min.x, max.y), max, Vec2::new(max.x, min.y)]
        .iter()
        .map(|c| dir.dot(*c))
        .fold((f32::MAX, f32::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)))
}

/// Maps warped local coordinates back to the undistorted glyph box.
/// `None` outside the trapezoid.
pub fn unwarp(trapezoid: &Trapezoid, local: Vec2) -> Option<Vec2> {
    let ratio = trapezoid.ratio.max(1e-3);
    let (near, far) = ((1.0 / ratio).min(1.0), ratio.min(1.0));
    let (along, across) = match trapezoid.axis {
        TrapezoidAxis::Horizontal => (local.x, local.y),
        TrapezoidAxis::Vertical => (local.y, local.x),
    };
    let k = lerp(near, far, along) * (1.0 + trapezoid.concave_convex * 4.0 * along * (1.0 - along));
    if k <= 1e-4 {
        return None;
    }
    let src = 0.5 + (across - 0.5) / k;
    if !(0.0..=1.0).contains(&src) {
        return None;
    }
    Some(match trapezoid.axis {
        TrapezoidAxis::Horizontal => Vec2::new(local.x, src),
        TrapezoidAxis::Vertical => Vec2::new(src, local.y),
    })
}

/// Draws every quad of `mesh` into `target`, each submesh sampling the atlas
/// of its font.
pub fn draw_mesh(
    target: &mut PixelBuffer,
    mesh: &TextMesh,
    atlases: &[Option<&Texture>],
    params: &EffectParams,
    canvas: &CanvasLayout,
) {
    let paint = TextPaint::new(params, canvas.bounds);
    for submesh in &mesh.submeshes {
        let Some(atlas) = atlases.get(submesh.font).copied().flatten() else {
            warn!("No atlas for font {}, skipping {} quads", submesh.font, submesh.quads.len());
            continue;
        };
        for quad in &submesh.quads {
            draw_quad(target, quad, atlas, &paint, canvas);
        }
    }
}

fn draw_quad(
    target: &mut PixelBuffer,
    quad: &GlyphQuad,
    atlas: &Texture,
    paint: &TextPaint<'_>,
    canvas: &CanvasLayout,
) {
    let corners = quad.positions().map(|p| canvas.to_canvas(p));
    let origin = corners[0];
    let edge_u = corners[3] - origin;
    let edge_v = corners[1] - origin;
    let det = edge_u.cross(edge_v);
    if det.abs() < 1e-6 {
        return;
    }

    let lo = corners.iter().fold(corners[0], |m, c| m.min(*c));
    let hi = corners.iter().fold(corners[0], |m, c| m.max(*c));
    let x0 = lo.x.floor().max(0.0) as usize;
    let y0 = lo.y.floor().max(0.0) as usize;
    let x1 = (hi.x.ceil().max(0.0) as usize).min(target.width());
    let y1 = (hi.y.ceil().max(0.0) as usize).min(target.height());
    let atlas_uv = quad.vertices.map(|v| v.atlas_uv);

    for y in y0..y1 {
        for x in x0..x1 {
            let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let d = centre - origin;
            let warped = Vec2::new(d.cross(edge_v) / det, edge_u.cross(d) / det);
            if !(0.0..=1.0).contains(&warped.x) || !(0.0..=1.0).contains(&warped.y) {
                continue;
            }
            let local = match paint.trapezoid {
                Some(t) => match unwarp(t, warped) {
                    Some(local) => local,
                    None => continue,
                },
                None => warped,
            };
            let coverage = atlas.sample(bilerp_vec(atlas_uv, local)).a;
            if coverage <= 0.0 {
                continue;
            }
            let color = paint.color_at(quad, local, canvas.to_object(centre));
            let px = &mut target.pixels_mut()[y * canvas.width + x];
            blend_over(px, color, color.a * coverage);
        }
    }
}

/// Interpolates per-corner values (bottom-left, top-left, top-right,
/// bottom-right) at local `(u, v)`.
fn bilerp(values: [f32; 4], local: Vec2) -> f32 {
    let bottom = lerp(values[0], values[3], local.x);
    let top = lerp(values[1], values[2], local.x);
    lerp(bottom, top, local.y)
}

fn bilerp_vec(values: [Vec2; 4], local: Vec2) -> Vec2 {
    let bottom = values[0].lerp(values[3], local.x);
    let top = values[1].lerp(values[2], local.x);
    bottom.lerp(top, local.y)
}

fn bilerp_color(values: [Color; 4], local: Vec2) -> Color {
    let channel = |f: fn(&Color) -> f32| bilerp(values.map(|c| f(&c)), local);
    Color::new(channel(|c| c.r), channel(|c| c.g), channel(|c| c.b), channel(|c| c.a))
}
