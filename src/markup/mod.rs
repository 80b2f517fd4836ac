// src/markup/mod.rs

//! Markup parsing: turns annotated text into per-character render descriptors.
//!
//! Tags look like `<name>`, `<name=value>` and `</name>`. Scoped tags push the
//! current style onto a stack and a matching close tag restores it; `space`,
//! `pos`/`position`/`locate` and `move` are single-shot directives that modify
//! the previously emitted character instead.

mod lexer;
mod parser;
mod segment;
mod tags;
mod values;

pub use parser::MarkupParser;
pub use segment::StringSegment;

use crate::geometry::Vec2;
use crate::glyph::{CharInfo, FontStyle};

/// The style in effect before any tag opens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseDefaults {
    pub size: i32,
    pub style: FontStyle,
    pub char_space: f32,
    pub incline: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
}

impl ParseDefaults {
    pub fn new(size: i32, style: FontStyle) -> Self {
        Self {
            size,
            style,
            ..Self::default()
        }
    }

    pub(crate) fn base_char(&self) -> CharInfo {
        CharInfo::base(
            self.size,
            self.style,
            self.char_space,
            self.incline,
            self.scale,
            self.rotation,
        )
    }
}

impl Default for ParseDefaults {
    fn default() -> Self {
        Self {
            size: 32,
            style: FontStyle::NORMAL,
            char_space: 0.0,
            incline: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

/// Parses `content` with a throwaway parser.
pub fn parse(content: &str, defaults: &ParseDefaults) -> Vec<CharInfo> {
    MarkupParser::new().parse(content, defaults)
}
