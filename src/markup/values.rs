// src/markup/values.rs

//! Parameter value parsers for tag arguments.
//!
//! Every parser trims blanks first and returns `None` on malformed input so
//! the caller can leave the affected style field untouched.

use super::segment::StringSegment;
use crate::color::{parse_color, Color};
use crate::geometry::Vec2;

pub(super) fn parse_int(value: StringSegment<'_>) -> Option<i32> {
    value.trim().as_str().parse().ok()
}

pub(super) fn parse_float(value: StringSegment<'_>) -> Option<f32> {
    let v: f32 = value.trim().as_str().parse().ok()?;
    v.is_finite().then_some(v)
}

/// Parses a plain number or the size-relative form `<n>em[+d|-d]`, which
/// evaluates to `n * size + d`.
pub(super) fn parse_em_float(value: StringSegment<'_>, size: i32) -> Option<f32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.find("em") {
        Some(at) if at > 0 => {
            let relative = parse_float(value.slice(0, at))?;
            let tail = value.slice(at + 2, value.len()).trim();
            let delta = match tail.first_char() {
                None => 0.0,
                Some('+') | Some('-') => parse_float(tail)?,
                Some(_) => return None,
            };
            Some(relative * size as f32 + delta)
        }
        _ => parse_float(value),
    }
}

/// `x,y` with plain numbers.
pub(super) fn parse_vec2(value: StringSegment<'_>) -> Option<Vec2> {
    let (x, y) = value.split_pair(',')?;
    Some(Vec2::new(parse_float(x)?, parse_float(y)?))
}

/// `x,y` where each component may use the `em` form.
pub(super) fn parse_em_vec2(value: StringSegment<'_>, size: i32) -> Option<Vec2> {
    let (x, y) = value.split_pair(',')?;
    Some(Vec2::new(
        parse_em_float(x, size)?,
        parse_em_float(y, size)?,
    ))
}

pub(super) fn parse_color_value(value: StringSegment<'_>) -> Option<Color> {
    parse_color(value.trim().as_str())
}

/// `from-to`: two color literals separated by a single `-`.
pub(super) fn parse_color_pair(value: StringSegment<'_>) -> Option<(Color, Color)> {
    let (from, to) = value.split_pair('-')?;
    Some((parse_color_value(from)?, parse_color_value(to)?))
}

/// Wraps an angle in degrees into `[0, 360)`.
pub(super) fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Rounds half to even, the rounding used for relative font sizes.
pub(super) fn round_to_int(v: f32) -> i32 {
    v.round_ties_even() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(s: &str) -> StringSegment<'_> {
        StringSegment::whole(s)
    }

    #[test]
    fn em_values_scale_with_size() {
        assert_eq!(parse_em_float(seg("0.5em"), 32), Some(16.0));
        assert_eq!(parse_em_float(seg("1em+3"), 20), Some(23.0));
        assert_eq!(parse_em_float(seg(" 1em-4 "), 20), Some(16.0));
        assert_eq!(parse_em_float(seg("7.5"), 20), Some(7.5));
    }

    #[test]
    fn em_tail_must_be_signed() {
        assert_eq!(parse_em_float(seg("1em3"), 20), None);
        assert_eq!(parse_em_float(seg("em"), 20), None);
        assert_eq!(parse_em_float(seg(""), 20), None);
    }

    #[test]
    fn vectors_need_two_components() {
        assert_eq!(parse_vec2(seg("1, -2")), Some(Vec2::new(1.0, -2.0)));
        assert_eq!(parse_vec2(seg("1")), None);
        assert_eq!(parse_vec2(seg("1,2,3")), None);
        assert_eq!(parse_em_vec2(seg("1em,0"), 10), Some(Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn color_pairs_split_on_single_dash() {
        let (a, b) = parse_color_pair(seg("red - #00F")).unwrap();
        assert_eq!(a, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(b, Color::rgb(0.0, 0.0, 1.0));
        assert!(parse_color_pair(seg("red-green-blue")).is_none());
    }

    #[test]
    fn angles_wrap_into_one_turn() {
        assert_eq!(normalize_angle(450.0), 90.0);
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(360.0), 0.0);
    }

    #[test]
    fn relative_sizes_round_half_to_even() {
        assert_eq!(round_to_int(2.5), 2);
        assert_eq!(round_to_int(3.5), 4);
        assert_eq!(round_to_int(16.0), 16);
    }
}
