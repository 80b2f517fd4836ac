// src/markup/tags.rs

//! Tag semantics: how each recognized tag name changes the current style.

use log::trace;

use super::segment::StringSegment;
use super::values::{
    normalize_angle, parse_color_pair, parse_color_value, parse_em_float, parse_em_vec2,
    parse_float, parse_int, parse_vec2, round_to_int,
};
use crate::geometry::Vec2;
use crate::glyph::{CharInfo, ColorOverride, FontStyle, Locate};

/// Outcome of applying one opening tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum TagScope {
    /// Opens a scope: `CharInfo` is the style inside it. Unknown tags land
    /// here too, with an unchanged style, so their closing tag still matches.
    Scoped(CharInfo),
    /// Single-shot directive already applied to the previous character.
    Directive,
}

/// Applies the tag `name` with parameter `value` (empty when the tag had no
/// `=value` part).
///
/// # Arguments
/// * `current` - Style in effect where the tag opens.
/// * `previous` - Last emitted character, target of `space`/`pos`/`move`.
/// * `default_size` - Base font size, used by the `em` form of `pos`/`move`.
pub(super) fn apply_tag(
    name: &str,
    value: StringSegment<'_>,
    current: &CharInfo,
    previous: Option<&mut CharInfo>,
    default_size: i32,
) -> TagScope {
    let mut next = *current;
    let applied = match name {
        "font" => parse_int(value)
            .and_then(|i| usize::try_from(i).ok())
            .map(|font| next.font = font),
        "size" => resize(current.size, value).map(|size| next.size = size),
        "color" => apply_color(&mut next, value),
        "gradient" => apply_gradient(&mut next, value),
        "b" => {
            next.style.insert(FontStyle::BOLD);
            Some(())
        }
        "i" => {
            next.style.insert(FontStyle::ITALIC);
            Some(())
        }
        "bi" | "ib" => {
            next.style = FontStyle::BOLD_ITALIC;
            Some(())
        }
        "n" => {
            next.style = FontStyle::NORMAL;
            Some(())
        }
        "rot" | "rotate" | "rotation" => parse_float(value).map(|deg| next.rotation = deg),
        "offset" => parse_em_vec2(value, current.size).map(|v| next.offset = v),
        "voffset" => parse_em_float(value, current.size).map(|v| next.voffset = v),
        "cspace" => parse_em_float(value, current.size).map(|v| next.char_space = v),
        "scale" => parse_vec2(value)
            .or_else(|| parse_float(value).map(Vec2::splat))
            .map(|v| next.scale = v),
        "incline" => parse_vec2(value).map(|v| next.incline = v),
        "space" => {
            if let (Some(prev), Some(v)) = (previous, parse_em_float(value, current.size)) {
                prev.post_advance += v;
            }
            return TagScope::Directive;
        }
        "pos" | "position" | "locate" => {
            if let (Some(prev), Some(v)) = (previous, parse_em_vec2(value, default_size)) {
                prev.locate = Locate::Absolute(v);
            }
            return TagScope::Directive;
        }
        "move" => {
            if let (Some(prev), Some(v)) = (previous, parse_em_vec2(value, default_size)) {
                prev.locate = Locate::Relative(prev.locate.target() + v);
            }
            return TagScope::Directive;
        }
        _ => {
            trace!("Ignoring unknown tag <{}>", name);
            Some(())
        }
    };
    if applied.is_none() {
        trace!("Tag <{}> has an unusable value {:?}", name, value.as_str());
    }
    TagScope::Scoped(next)
}

/// `size` forms: `N`, `+N`, `-N`, `+P%`, `-P%`, `*R`, `xR`.
fn resize(size: i32, value: StringSegment<'_>) -> Option<i32> {
    let value = value.trim();
    match value.first_char()? {
        sign @ ('+' | '-') if value.last_char() == Some('%') => {
            let percent = parse_float(value.skip_first().skip_last())?;
            let delta = round_to_int(size as f32 * percent * 0.01);
            Some(if sign == '+' {
                size.saturating_add(delta)
            } else {
                size.saturating_sub(delta)
            })
        }
        '+' | '-' => parse_int(value).map(|delta| size.saturating_add(delta)),
        '*' | 'x' => parse_float(value.skip_first()).map(|ratio| round_to_int(size as f32 * ratio)),
        _ => parse_int(value),
    }
}

/// Splits the optional composition prefix off a color parameter.
fn split_override(value: StringSegment<'_>) -> (ColorOverride, StringSegment<'_>) {
    match value.first_char() {
        Some('*') | Some('x') => (ColorOverride::Multiply, value.skip_first()),
        Some('+') => (ColorOverride::Add, value.skip_first()),
        Some('-') => (ColorOverride::Subtract, value.skip_first()),
        _ => (ColorOverride::Override, value),
    }
}

fn apply_color(next: &mut CharInfo, value: StringSegment<'_>) -> Option<()> {
    let (mode, literal) = split_override(value.trim());
    let color = parse_color_value(literal)?;
    next.color_override = mode;
    next.color = color;
    next.gradient_angle = None;
    Some(())
}

/// `from-to,angle` with the same prefixes as `color`.
fn apply_gradient(next: &mut CharInfo, value: StringSegment<'_>) -> Option<()> {
    let (mode, body) = split_override(value.trim());
    let (colors, angle) = body.split_pair(',')?;
    let angle = parse_float(angle)?;
    let (from, to) = parse_color_pair(colors)?;
    next.color_override = mode;
    next.color = from;
    next.color2 = to;
    next.gradient_angle = Some(normalize_angle(angle));
    Some(())
}
