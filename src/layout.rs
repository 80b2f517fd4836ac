// src/layout.rs

//! Glyph layout: turns parsed characters into positioned glyph quads.
//!
//! The pen starts at the origin and advances along +x; a newline moves it down
//! by the line height. Each glyph box is scaled (and mirrored for negative
//! scale), sheared by its incline, rotated, then offset, all about the box's
//! diagonal midpoint. Quads are grouped into one [`Submesh`] per resolved font
//! in first-seen order.
//!
//! Layout is all-or-nothing: any glyph the font cannot provide is recorded as
//! a [`MissingGlyph`] and the resulting mesh must not be drawn.

use indexmap::IndexMap;
use log::{debug, trace};

use crate::color::Color;
use crate::font::{font_at, resolve_font, FontSlot};
use crate::geometry::{inverse_lerp, Rect, Vec2};
use crate::glyph::{CharInfo, ColorOverride, FontStyle, Locate, MissingGlyph};

/// Quad-local coordinates of the four corners, in vertex order.
pub const QUAD_CORNERS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadVertex {
    /// Object-space position.
    pub position: Vec2,
    pub atlas_uv: Vec2,
    pub color: Color,
    /// Per-character text gradient parameter in `[0, 1]`; 0 unless the text
    /// color is a per-character gradient.
    pub text_gradient: f32,
}

/// One character: corners in bottom-left, top-left, top-right, bottom-right
/// order (see [`QUAD_CORNERS`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub vertices: [QuadVertex; 4],
    pub color_override: ColorOverride,
}

impl GlyphQuad {
    pub fn positions(&self) -> [Vec2; 4] {
        self.vertices.map(|v| v.position)
    }
}

/// Quads drawn from one font's atlas.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Submesh {
    /// Resolved font index.
    pub font: usize,
    pub quads: Vec<GlyphQuad>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextMesh {
    pub submeshes: Vec<Submesh>,
}

impl TextMesh {
    pub fn quad_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.quads.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.quad_count() == 0
    }

    pub fn quads(&self) -> impl Iterator<Item = &GlyphQuad> {
        self.submeshes.iter().flat_map(|s| s.quads.iter())
    }

    /// Bounding box of every vertex; `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Rect> {
        let mut points = self.quads().flat_map(|q| q.positions());
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }
}

/// Layout knobs that apply to the whole text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutSettings {
    /// Distance between baselines.
    pub line_height: f32,
    /// Angle in degrees of a per-character text gradient, when the text color
    /// is one. An angle of 0 runs left to right.
    pub text_gradient_angle: Option<f32>,
}

/// Characters to request from one font at one size and style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRequest {
    pub font: usize,
    pub size: i32,
    pub style: FontStyle,
    pub characters: String,
}

/// Groups missing glyphs by `(font, size, style)` in first-seen order, each
/// character listed once per group.
pub fn group_missing(missing: &[MissingGlyph]) -> Vec<GlyphRequest> {
    let mut groups: IndexMap<(usize, i32, FontStyle), String> = IndexMap::new();
    for m in missing {
        let chars = groups.entry((m.font, m.size, m.style)).or_default();
        if !chars.contains(m.ch) {
            chars.push(m.ch);
        }
    }
    groups
        .into_iter()
        .map(|((font, size, style), characters)| GlyphRequest {
            font,
            size,
            style,
            characters,
        })
        .collect()
}

/// Layout engine. Keeps its mesh and missing list as scratch space reused
/// across calls.
#[derive(Debug, Default)]
pub struct LayoutEngine {
    mesh: TextMesh,
    missing: Vec<MissingGlyph>,
    spare: Vec<Vec<GlyphQuad>>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mesh built by the last [`LayoutEngine::layout`] call.
    pub fn mesh(&self) -> &TextMesh {
        &self.mesh
    }

    /// Glyphs the fonts could not provide during the last call.
    pub fn missing(&self) -> &[MissingGlyph] {
        &self.missing
    }

    /// Lays out `chars` against `fonts`.
    ///
    /// # Returns
    /// true when every glyph was available. On false the mesh is incomplete
    /// and [`LayoutEngine::missing`] lists what to request.
    pub fn layout(&mut self, chars: &[CharInfo], fonts: &[FontSlot<'_>], settings: &LayoutSettings) -> bool {
        self.clear();
        if font_at(fonts, 0).is_none() {
            debug!("Layout skipped: no fallback font");
            return true;
        }

        let text_dir = match settings.text_gradient_angle {
            Some(angle) if angle != 0.0 => Vec2::from_angle_deg(angle),
            _ => Vec2::new(1.0, 0.0),
        };
        let per_char_text_gradient = settings.text_gradient_angle.is_some();

        let mut base = Vec2::ZERO;
        let mut pen = Vec2::ZERO;

        for ci in chars {
            match ci.ch {
                '\n' => {
                    pen.x = ci.post_advance;
                    pen.y -= settings.line_height;
                    continue;
                }
                '\r' => continue,
                _ => {}
            }

            let font = resolve_font(fonts, ci.font);
            let Some(metrics) = font_at(fonts, font).and_then(|f| f.glyph_metrics(ci.ch, ci.size, ci.style))
            else {
                trace!("Missing glyph '{}' size {} in font {}", ci.ch, ci.size, font);
                self.missing.push(MissingGlyph {
                    font,
                    ch: ci.ch,
                    size: ci.size,
                    style: ci.style,
                });
                continue;
            };

            pen.x += ci.pre_advance + ci.char_space;

            let scale = ci.scale.abs();
            let mut lo = Vec2::new(metrics.min.x * scale.x, metrics.min.y * scale.y);
            let mut hi = Vec2::new(metrics.max.x * scale.x, metrics.max.y * scale.y);
            if ci.scale.x < 0.0 {
                std::mem::swap(&mut lo.x, &mut hi.x);
            }
            if ci.scale.y < 0.0 {
                std::mem::swap(&mut lo.y, &mut hi.y);
            }
            let origin = base + pen;
            let mut corners = [
                origin + lo,
                origin + Vec2::new(lo.x, hi.y),
                origin + hi,
                origin + Vec2::new(hi.x, lo.y),
            ];

            if !ci.incline.is_zero() {
                let pivot = (corners[0] + corners[2]) * 0.5;
                for c in corners.iter_mut() {
                    let p = *c - pivot;
                    *c = pivot + Vec2::new(p.x + p.y * ci.incline.x, p.y + p.x * ci.incline.y);
                }
            }

            let mut char_dir = text_dir;
            if ci.rotation != 0.0 {
                let pivot = (corners[0] + corners[2]) * 0.5;
                let rad = ci.rotation.to_radians();
                let (sin, cos) = rad.sin_cos();
                for c in corners.iter_mut() {
                    *c = pivot + (*c - pivot).rotate(cos, sin);
                }
                char_dir = text_dir.rotate(cos, sin);
            }

            let offset = ci.offset + Vec2::new(0.0, ci.voffset);
            for c in corners.iter_mut() {
                *c += offset;
            }

            let text_gradient = if per_char_text_gradient {
                normalized_projection(char_dir, corners, Vec2::ZERO)
            } else {
                [0.0; 4]
            };
            let colors = match ci.gradient_angle {
                Some(angle) => {
                    let pivot = (corners[0] + corners[2]) * 0.5;
                    normalized_projection(Vec2::from_angle_deg(angle), corners, pivot)
                        .map(|t| ci.color.lerp(ci.color2, t))
                }
                None => [ci.color; 4],
            };

            let vertices = std::array::from_fn(|i| QuadVertex {
                position: corners[i],
                atlas_uv: metrics.uv[i],
                color: colors[i],
                text_gradient: text_gradient[i],
            });
            self.submesh_for(font).quads.push(GlyphQuad {
                vertices,
                color_override: ci.color_override,
            });

            pen.x += metrics.advance * scale.x + ci.post_advance;
            match ci.locate {
                Locate::None => {}
                Locate::Absolute(p) => {
                    base = p;
                    pen = Vec2::ZERO;
                }
                Locate::Relative(p) => {
                    base += pen + p;
                    pen = Vec2::ZERO;
                }
            }
        }

        if !self.missing.is_empty() {
            debug!("Layout incomplete: {} missing glyphs", self.missing.len());
            return false;
        }
        trace!(
            "Layout: {} quads in {} submeshes",
            self.mesh.quad_count(),
            self.mesh.submeshes.len()
        );
        true
    }

    fn clear(&mut self) {
        for mut submesh in self.mesh.submeshes.drain(..) {
            submesh.quads.clear();
            self.spare.push(submesh.quads);
        }
        self.missing.clear();
    }

    fn submesh_for(&mut self, font: usize) -> &mut Submesh {
        let index = match self.mesh.submeshes.iter().position(|s| s.font == font) {
            Some(i) => i,
            None => {
                let quads = self.spare.pop().unwrap_or_default();
                self.mesh.submeshes.push(Submesh { font, quads });
                self.mesh.submeshes.len() - 1
            }
        };
        &mut self.mesh.submeshes[index]
    }
}

/// Projects `corners - pivot` onto `dir` and normalizes over the four values.
fn normalized_projection(dir: Vec2, corners: [Vec2; 4], pivot: Vec2) -> [f32; 4] {
    let d = corners.map(|c| dir.dot(c - pivot));
    let lo = d.iter().copied().fold(f32::MAX, f32::min);
    let hi = d.iter().copied().fold(f32::MIN, f32::max);
    d.map(|v| inverse_lerp(lo, hi, v))
}
