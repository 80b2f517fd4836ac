// src/color.rs

//! Defines color values (`Color`, `NamedColor`), color literal parsing and
//! multi-stop `Gradient`s.
//!
//! Colors are straight (non-premultiplied) RGBA with `f32` channels nominally
//! in `[0, 1]`. Gradients follow the usual key-frame model: up to
//! [`MAX_GRADIENT_KEYS`] color keys and the same number of alpha keys, each
//! evaluated piecewise-linearly over `t` in `[0, 1]`.

use log::warn;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Maximum number of color keys and of alpha keys a gradient may carry.
pub const MAX_GRADIENT_KEYS: usize = 8;

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const CLEAR: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Every channel clamped to `[0, 1]`, as an 8-bit target would store it.
    pub fn saturate(self) -> Color {
        Color::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }

    /// Linear interpolation with `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    pub fn with_alpha(self, a: f32) -> Color {
        Color { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [f32; 4]) -> Color {
        Color::new(c[0], c[1], c[2], c[3])
    }

    /// Quantizes to 8 bits per channel, clamping out-of-range values.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub fn from_rgba8(px: [u8; 4]) -> Color {
        let f = |v: u8| v as f32 / 255.0;
        Color::new(f(px[0]), f(px[1]), f(px[2]), f(px[3]))
    }
}

/// Channel-wise product.
impl Mul for Color {
    type Output = Color;
    fn mul(self, rhs: Color) -> Color {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }
}

impl Default for Color {
    /// Text renders white unless told otherwise.
    fn default() -> Self {
        Color::WHITE
    }
}

/// The fixed set of color names accepted by markup color literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedColor {
    Red,
    Green,
    Blue,
    White,
    Black,
    Yellow,
    Cyan,
    Magenta,
    Gray,
    Clear,
}

impl NamedColor {
    /// Looks up a lowercase color name. `grey` is accepted as an alias of `gray`.
    pub fn from_name(name: &str) -> Option<Self> {
        let named = match name {
            "red" => NamedColor::Red,
            "green" => NamedColor::Green,
            "blue" => NamedColor::Blue,
            "white" => NamedColor::White,
            "black" => NamedColor::Black,
            "yellow" => NamedColor::Yellow,
            "cyan" => NamedColor::Cyan,
            "magenta" => NamedColor::Magenta,
            "gray" | "grey" => NamedColor::Gray,
            "clear" => NamedColor::Clear,
            _ => return None,
        };
        Some(named)
    }

    pub fn to_color(self) -> Color {
        match self {
            NamedColor::Red => Color::rgb(1.0, 0.0, 0.0),
            NamedColor::Green => Color::rgb(0.0, 1.0, 0.0),
            NamedColor::Blue => Color::rgb(0.0, 0.0, 1.0),
            NamedColor::White => Color::WHITE,
            NamedColor::Black => Color::BLACK,
            // Not pure yellow; matches the conventional engine palette value.
            NamedColor::Yellow => Color::rgb(1.0, 0.921_568_63, 0.015_686_275),
            NamedColor::Cyan => Color::rgb(0.0, 1.0, 1.0),
            NamedColor::Magenta => Color::rgb(1.0, 0.0, 1.0),
            NamedColor::Gray => Color::rgb(0.5, 0.5, 0.5),
            NamedColor::Clear => Color::CLEAR,
        }
    }
}

impl From<NamedColor> for Color {
    fn from(named: NamedColor) -> Self {
        named.to_color()
    }
}

/// Parses a color literal: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA` or a
/// [`NamedColor`] name.
///
/// # Returns
/// `None` for anything else, including hex literals with non-hex digits.
pub fn parse_color(text: &str) -> Option<Color> {
    match text.strip_prefix('#') {
        Some(digits) => parse_hex_color(digits),
        None => NamedColor::from_name(text).map(NamedColor::to_color),
    }
}

fn parse_hex_color(digits: &str) -> Option<Color> {
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let (width, max) = match digits.len() {
        3 | 4 => (1, 15.0),
        6 | 8 => (2, 255.0),
        _ => return None,
    };
    let channel = |i: usize| -> Option<f32> {
        let part = digits.get(i * width..(i + 1) * width)?;
        u8::from_str_radix(part, 16).ok().map(|v| v as f32 / max)
    };
    let a = if digits.len() == 4 || digits.len() == 8 {
        channel(3)?
    } else {
        1.0
    };
    Some(Color::new(channel(0)?, channel(1)?, channel(2)?, a))
}

/// A color stop. Only the RGB part of `color` is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorKey {
    pub color: Color,
    pub time: f32,
}

impl ColorKey {
    pub const fn new(color: Color, time: f32) -> Self {
        Self { color, time }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaKey {
    pub alpha: f32,
    pub time: f32,
}

impl AlphaKey {
    pub const fn new(alpha: f32, time: f32) -> Self {
        Self { alpha, time }
    }
}

/// Piecewise-linear color ramp with separate color and alpha stops.
///
/// Always holds at least one key of each kind; keys are kept sorted by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    color_keys: Vec<ColorKey>,
    alpha_keys: Vec<AlphaKey>,
}

impl Gradient {
    /// Builds a gradient, sorting keys by time.
    ///
    /// Keys beyond [`MAX_GRADIENT_KEYS`] are dropped with a warning; an empty
    /// key list is replaced by a single opaque white stop.
    pub fn new(mut color_keys: Vec<ColorKey>, mut alpha_keys: Vec<AlphaKey>) -> Self {
        color_keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        alpha_keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        if color_keys.len() > MAX_GRADIENT_KEYS {
            warn!(
                "Gradient has {} color keys, keeping the first {}",
                color_keys.len(),
                MAX_GRADIENT_KEYS
            );
            color_keys.truncate(MAX_GRADIENT_KEYS);
        }
        if alpha_keys.len() > MAX_GRADIENT_KEYS {
            warn!(
                "Gradient has {} alpha keys, keeping the first {}",
                alpha_keys.len(),
                MAX_GRADIENT_KEYS
            );
            alpha_keys.truncate(MAX_GRADIENT_KEYS);
        }
        if color_keys.is_empty() {
            color_keys.push(ColorKey::new(Color::WHITE, 1.0));
        }
        if alpha_keys.is_empty() {
            alpha_keys.push(AlphaKey::new(1.0, 1.0));
        }
        Self {
            color_keys,
            alpha_keys,
        }
    }

    /// A single-stop gradient that evaluates to `color` everywhere.
    pub fn solid(color: Color) -> Self {
        Self {
            color_keys: vec![ColorKey::new(color, 1.0)],
            alpha_keys: vec![AlphaKey::new(color.a, 1.0)],
        }
    }

    /// Two stops: `from` at `t = 0`, `to` at `t = 1`.
    pub fn linear(from: Color, to: Color) -> Self {
        Self::new(
            vec![ColorKey::new(from, 0.0), ColorKey::new(to, 1.0)],
            vec![AlphaKey::new(from.a, 0.0), AlphaKey::new(to.a, 1.0)],
        )
    }

    /// Fully transparent black, one stop of each kind.
    pub fn neutral() -> Self {
        Self::solid(Color::CLEAR)
    }

    pub fn color_keys(&self) -> &[ColorKey] {
        &self.color_keys
    }

    pub fn alpha_keys(&self) -> &[AlphaKey] {
        &self.alpha_keys
    }

    /// Returns a copy with every alpha key multiplied by `fade`.
    pub fn faded(&self, fade: f32) -> Gradient {
        Gradient {
            color_keys: self.color_keys.clone(),
            alpha_keys: self
                .alpha_keys
                .iter()
                .map(|k| AlphaKey::new(k.alpha * fade, k.time))
                .collect(),
        }
    }

    /// Samples the gradient at `t`, clamped to `[0, 1]`.
    pub fn evaluate(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let (lo, hi, f) = locate_segment(&self.color_keys, |k| k.time, t);
        let rgb = self.color_keys[lo]
            .color
            .lerp(self.color_keys[hi].color, f);
        let (lo, hi, f) = locate_segment(&self.alpha_keys, |k| k.time, t);
        let a0 = self.alpha_keys[lo].alpha;
        let a1 = self.alpha_keys[hi].alpha;
        rgb.with_alpha(a0 + (a1 - a0) * f)
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Gradient::solid(Color::WHITE)
    }
}

/// Finds the pair of keys bracketing `t` and the blend factor between them.
/// Before the first key or after the last one the nearest key wins.
fn locate_segment<K>(keys: &[K], time: impl Fn(&K) -> f32, t: f32) -> (usize, usize, f32) {
    let last = keys.len().saturating_sub(1);
    if keys.is_empty() || t <= time(&keys[0]) {
        return (0, 0, 0.0);
    }
    for i in 1..=last {
        let t1 = time(&keys[i]);
        if t <= t1 {
            let t0 = time(&keys[i - 1]);
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 1.0 };
            return (i - 1, i, f);
        }
    }
    (last, last, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color, b: Color) -> bool {
        (a.r - b.r).abs() < 1e-4
            && (a.g - b.g).abs() < 1e-4
            && (a.b - b.b).abs() < 1e-4
            && (a.a - b.a).abs() < 1e-4
    }

    #[test]
    fn parses_all_hex_forms() {
        // Contract: short forms scale by 1/15, long forms by 1/255
        assert_eq!(parse_color("#F00"), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert!(close(
            parse_color("#F008").unwrap(),
            Color::new(1.0, 0.0, 0.0, 8.0 / 15.0)
        ));
        assert_eq!(parse_color("#FF0000"), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert!(close(
            parse_color("#00ff0080").unwrap(),
            Color::new(0.0, 1.0, 0.0, 128.0 / 255.0)
        ));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(parse_color("#FF00"), Some(Color::new(1.0, 1.0, 0.0, 0.0)));
        assert_eq!(parse_color("#FF000"), None);
        assert_eq!(parse_color("#GG0000"), None);
        assert_eq!(parse_color("#"), None);
        assert_eq!(parse_color(""), None);
    }

    #[test]
    fn parses_named_colors() {
        assert_eq!(parse_color("red"), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(parse_color("grey"), parse_color("gray"));
        assert_eq!(parse_color("clear"), Some(Color::CLEAR));
        assert_eq!(parse_color("Red"), None);
        assert_eq!(parse_color("orange"), None);
    }

    #[test]
    fn gradient_interpolates_between_keys() {
        let g = Gradient::linear(Color::BLACK, Color::WHITE);
        assert!(close(g.evaluate(0.0), Color::BLACK));
        assert!(close(g.evaluate(0.5), Color::rgb(0.5, 0.5, 0.5)));
        assert!(close(g.evaluate(2.0), Color::WHITE));
    }

    #[test]
    fn gradient_holds_outer_keys() {
        // Contract: before the first key and after the last, the nearest key wins
        let g = Gradient::new(
            vec![
                ColorKey::new(Color::rgb(1.0, 0.0, 0.0), 0.25),
                ColorKey::new(Color::rgb(0.0, 0.0, 1.0), 0.75),
            ],
            vec![AlphaKey::new(1.0, 0.0)],
        );
        assert!(close(g.evaluate(0.1), Color::rgb(1.0, 0.0, 0.0)));
        assert!(close(g.evaluate(0.9), Color::rgb(0.0, 0.0, 1.0)));
        assert!(close(g.evaluate(0.5), Color::rgb(0.5, 0.0, 0.5)));
    }

    #[test]
    fn gradient_truncates_excess_keys() {
        let keys = (0..12)
            .map(|i| ColorKey::new(Color::WHITE, i as f32 / 11.0))
            .collect();
        let g = Gradient::new(keys, vec![]);
        assert_eq!(g.color_keys().len(), MAX_GRADIENT_KEYS);
        assert_eq!(g.alpha_keys().len(), 1);
    }

    #[test]
    fn faded_scales_alpha_only() {
        let g = Gradient::solid(Color::new(0.2, 0.4, 0.6, 0.8)).faded(0.5);
        assert!(close(g.evaluate(0.3), Color::new(0.2, 0.4, 0.6, 0.4)));
    }

    #[test]
    fn rgba8_round_trip_clamps() {
        assert_eq!(Color::new(2.0, -1.0, 0.5, 1.0).to_rgba8(), [255, 0, 128, 255]);
    }
}
