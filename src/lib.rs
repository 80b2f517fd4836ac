// src/lib.rs

//! Art text rendering: markup text in, an effect-composited RGBA image out.
//!
//! The pipeline runs markup parsing ([`markup`]), glyph layout against caller
//! supplied font backends ([`layout`], [`font`]) and CPU compositing of the
//! outline, shadow, 3D, inner and glow effects ([`rasterizer`]).
//! [`renderer::ArtTextRenderer`] ties the stages together.

pub mod color;
pub mod config;
pub mod effects;
pub mod font;
pub mod geometry;
pub mod glyph;
pub mod layout;
pub mod markup;
pub mod rasterizer;
pub mod renderer;
pub mod texture;

pub use effects::{EffectParams, EffectParamsBuilder};
pub use renderer::{ArtTextRenderer, RenderOutcome, RenderedText};
