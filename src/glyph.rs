// src/glyph.rs

//! Defines the per-character render descriptor `CharInfo` produced by the
//! markup parser, its style attributes (`FontStyle`, `ColorOverride`,
//! `Locate`), and the `MissingGlyph` record reported by layout.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geometry::Vec2;

bitflags! {
    /// Font style requested from a font backend. Bold and italic combine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FontStyle: u8 {
        const BOLD   = 1 << 0;
        const ITALIC = 1 << 1;
    }
}

impl FontStyle {
    pub const NORMAL: FontStyle = FontStyle::empty();
    pub const BOLD_ITALIC: FontStyle = FontStyle::BOLD.union(FontStyle::ITALIC);
}

/// How a character's own color combines with the globally resolved text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorOverride {
    /// Use the global text color.
    #[default]
    None,
    /// Replace the global text color.
    Override,
    Multiply,
    Add,
    Subtract,
}

impl ColorOverride {
    /// Applies the mode to the global text color `base`. Add and subtract
    /// saturate to `[0, 1]`.
    pub fn apply(self, base: Color, own: Color) -> Color {
        match self {
            ColorOverride::None => base,
            ColorOverride::Override => own,
            ColorOverride::Multiply => base * own,
            ColorOverride::Add => Color::new(
                base.r + own.r,
                base.g + own.g,
                base.b + own.b,
                base.a + own.a,
            )
            .saturate(),
            ColorOverride::Subtract => Color::new(
                base.r - own.r,
                base.g - own.g,
                base.b - own.b,
                base.a - own.a,
            )
            .saturate(),
        }
    }
}

/// Re-basing directive attached to a character by `<pos>` or `<move>`.
/// It takes effect after the character has been placed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Locate {
    #[default]
    None,
    /// Pen restarts at this absolute point.
    Absolute(Vec2),
    /// Pen base moves by the current pen position plus this delta.
    Relative(Vec2),
}

impl Locate {
    /// The point carried by the directive, zero when there is none.
    pub fn target(self) -> Vec2 {
        match self {
            Locate::None => Vec2::ZERO,
            Locate::Absolute(p) | Locate::Relative(p) => p,
        }
    }
}

/// One rendered character (newlines included) with its fully resolved style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharInfo {
    /// Index into the font list; out-of-range indices fall back to font 0.
    pub font: usize,
    pub ch: char,
    pub size: i32,
    pub style: FontStyle,
    pub color_override: ColorOverride,
    pub color: Color,
    /// Second color of a per-character gradient.
    pub color2: Color,
    /// Per-character gradient angle in degrees, normalized to `[0, 360)`.
    pub gradient_angle: Option<f32>,
    /// Degrees, counter-clockwise.
    pub rotation: f32,
    pub offset: Vec2,
    pub voffset: f32,
    /// Pen advance added before placing the glyph.
    pub pre_advance: f32,
    /// Pen advance added after the glyph (`<space>`); also the pen start of
    /// the next line when attached to a newline.
    pub post_advance: f32,
    pub char_space: f32,
    pub incline: Vec2,
    pub scale: Vec2,
    pub locate: Locate,
}

impl CharInfo {
    /// The style in effect before any tag is applied.
    pub fn base(
        size: i32,
        style: FontStyle,
        char_space: f32,
        incline: Vec2,
        scale: Vec2,
        rotation: f32,
    ) -> Self {
        Self {
            font: 0,
            ch: '\0',
            size,
            style,
            color_override: ColorOverride::None,
            color: Color::WHITE,
            color2: Color::WHITE,
            gradient_angle: None,
            rotation,
            offset: Vec2::ZERO,
            voffset: 0.0,
            pre_advance: 0.0,
            post_advance: 0.0,
            char_space,
            incline,
            scale,
            locate: Locate::None,
        }
    }
}

/// A character whose metrics the font backend could not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MissingGlyph {
    /// Resolved font index (after falling back to font 0).
    pub font: usize,
    pub ch: char,
    pub size: i32,
    pub style: FontStyle,
}
