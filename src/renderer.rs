// src/renderer.rs

//! The render entry point.
//!
//! `ArtTextRenderer` drives one render call end to end: parse the markup,
//! lay it out against the caller's fonts (with one retry round for glyphs the
//! fonts had not rasterized yet), composite the effects and hand back the
//! finished pixels. Each renderer owns its parser, layout scratch and
//! compositor pool, so it serves one call at a time; independent renderers
//! can run on separate threads.

use log::{debug, info, trace};

use crate::effects::EffectParams;
use crate::font::{font_at, FontSlot};
use crate::geometry::{Rect, Vec2};
use crate::glyph::{FontStyle, MissingGlyph};
use crate::layout::{group_missing, LayoutEngine, LayoutSettings};
use crate::markup::{MarkupParser, ParseDefaults};
use crate::rasterizer::{AllocPolicy, Compositor, PixelBuffer};
use crate::texture::Texture;

/// A finished art text image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedText {
    pub buffer: PixelBuffer,
    /// Where the layout origin (pen start on the first baseline) lands in
    /// the buffer, in pixels from the lower-left corner.
    pub origin: Vec2,
    /// Glyph bounds inside the buffer, lower-left based.
    pub text_rect: Rect,
}

/// Result of [`ArtTextRenderer::render_text`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(RenderedText),
    /// Nothing to draw: empty content, no fallback font, no visible glyph,
    /// or an image too large to allocate.
    Empty,
    /// Glyphs still unavailable after the retry round. No image is produced.
    MissingGlyphs(Vec<MissingGlyph>),
}

impl RenderOutcome {
    pub fn rendered(&self) -> Option<&RenderedText> {
        match self {
            RenderOutcome::Rendered(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_rendered(self) -> Option<RenderedText> {
        match self {
            RenderOutcome::Rendered(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ArtTextRenderer {
    parser: MarkupParser,
    layout: LayoutEngine,
    compositor: Compositor,
}

impl ArtTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer whose compositor keeps at most `pool_capacity` idle buffers.
    pub fn with_pool_capacity(pool_capacity: usize) -> Self {
        Self {
            compositor: Compositor::new(pool_capacity),
            ..Self::default()
        }
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Hands a [`AllocPolicy::Pooled`] buffer back for reuse.
    pub fn release(&mut self, buffer: PixelBuffer) {
        self.compositor.release(buffer);
    }

    /// Renders `content` with the effects in `params`.
    ///
    /// # Arguments
    /// * `fonts` - Ordered font list; entry 0 is the fallback for unset or
    ///   out-of-range font tags
    /// * `content` - Markup text
    /// * `font_size` - Size before any `<size>` tag
    /// * `style` - Style before any `<b>`/`<i>` tag
    /// * `params` - Effect parameters
    /// * `policy` - How the output buffer is allocated
    ///
    /// # Returns
    /// The image, `Empty`, or the glyphs that stayed missing after asking
    /// each font once to rasterize them. Every font in `fonts` is reset after
    /// a successful render.
    pub fn render_text(
        &mut self,
        fonts: &mut [FontSlot<'_>],
        content: &str,
        font_size: i32,
        style: FontStyle,
        params: &EffectParams,
        policy: AllocPolicy,
    ) -> RenderOutcome {
        if content.is_empty() || font_at(fonts, 0).is_none() {
            trace!("render_text: nothing to render");
            return RenderOutcome::Empty;
        }

        let defaults = ParseDefaults {
            char_space: params.char_space(),
            incline: params.incline(),
            scale: params.scale(),
            ..ParseDefaults::new(font_size, style)
        };
        let chars = self.parser.parse(content, &defaults);
        let settings = LayoutSettings {
            line_height: params.line_distance(font_size),
            text_gradient_angle: params.per_char_gradient_angle(),
        };

        if !self.layout.layout(&chars, fonts, &settings) {
            let requests = group_missing(self.layout.missing());
            debug!(
                "render_text: {} missing glyphs, requesting {} groups",
                self.layout.missing().len(),
                requests.len()
            );
            for request in &requests {
                if let Some(Some(font)) = fonts.get_mut(request.font) {
                    font.request_rasterize(&request.characters, request.size, request.style);
                }
            }
            if !self.layout.layout(&chars, fonts, &settings) {
                info!(
                    "render_text: {} glyphs still missing after retry",
                    self.layout.missing().len()
                );
                return RenderOutcome::MissingGlyphs(self.layout.missing().to_vec());
            }
        }

        let composited = {
            let atlases: Vec<Option<&Texture>> = fonts
                .iter()
                .map(|slot| slot.as_deref().map(|font| font.atlas()))
                .collect();
            self.compositor
                .composite(self.layout.mesh(), &atlases, params, policy)
        };
        let Some(composited) = composited else {
            trace!("render_text: nothing composited");
            return RenderOutcome::Empty;
        };

        for font in fonts.iter_mut().flatten() {
            font.reset();
        }

        let canvas = composited.canvas;
        let origin = canvas.text_rect.min() - canvas.bounds.min();
        debug!(
            "render_text: {}x{} image, origin ({}, {})",
            canvas.width, canvas.height, origin.x, origin.y
        );
        RenderOutcome::Rendered(RenderedText {
            buffer: composited.buffer,
            origin,
            text_rect: canvas.text_rect,
        })
    }
}
