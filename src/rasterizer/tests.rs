// src/rasterizer/tests.rs

use super::*;
use crate::color::{Color, Gradient};
use crate::font::{FontBackend, FontSlot, HeadlessFont};
use crate::glyph::FontStyle;
use crate::layout::{LayoutEngine, LayoutSettings};
use crate::markup::{parse, ParseDefaults};
use test_log::test;

// HeadlessFont at 20 px: box (0,-3)..(10,11), advance 12.
const SIZE: i32 = 20;

fn font(chars: &str) -> HeadlessFont {
    let mut font = HeadlessFont::solid();
    font.request_rasterize(chars, SIZE, FontStyle::NORMAL);
    font
}

fn mesh(font: &mut HeadlessFont, markup: &str) -> TextMesh {
    let chars = parse(markup, &ParseDefaults::new(SIZE, FontStyle::NORMAL));
    let fonts: [FontSlot<'_>; 1] = [Some(font as &mut dyn FontBackend)];
    let mut engine = LayoutEngine::new();
    let settings = LayoutSettings {
        line_height: SIZE as f32,
        text_gradient_angle: None,
    };
    assert!(engine.layout(&chars, &fonts, &settings));
    engine.mesh().clone()
}

fn composite(compositor: &mut Compositor, params: &EffectParams) -> Composited {
    let mut f = font("A");
    let m = mesh(&mut f, "A");
    compositor
        .composite(&m, &[Some(f.atlas())], params, AllocPolicy::Owned)
        .expect("non-empty mesh")
}

fn render(params: &EffectParams) -> Composited {
    composite(&mut Compositor::default(), params)
}

#[test]
fn empty_mesh_allocates_nothing() {
    // Contract: no glyphs, no output and no buffers
    let mut compositor = Compositor::default();
    let out = compositor.composite(&TextMesh::default(), &[], &EffectParams::default(), AllocPolicy::Pooled);
    assert!(out.is_none());
    assert_eq!(compositor.pool().idle_count(), 0);
}

#[test]
fn plain_text_fills_the_glyph_box() {
    let out = render(&EffectParams::default());
    assert_eq!((out.buffer.width(), out.buffer.height()), (10, 14));
    assert_eq!(out.canvas.text_rect, Rect::new(0.0, 0.0, 10.0, 14.0));
    assert_eq!(out.buffer.get(5, 7), [1.0; 4]);
}

#[test]
fn text_blend_scales_text_alpha() {
    let params = EffectParams::builder().text_blend(0.5).build();
    let out = render(&params);
    assert!((out.buffer.get(5, 7)[3] - 0.5).abs() < 1e-6);
}

#[test]
fn outline_surrounds_the_text() {
    let red = Color::rgb(1.0, 0.0, 0.0);
    let params = EffectParams::builder().outline(2.0, red, false).build();
    let out = render(&params);
    assert_eq!(out.canvas.text_rect, Rect::new(2.0, 2.0, 10.0, 14.0));
    let px = out.buffer.get(1, 9);
    assert!(px[3] > 0.05, "outline alpha {}", px[3]);
    assert_eq!(&px[..3], &[1.0, 0.0, 0.0]);
    // The text itself stays white.
    assert_eq!(out.buffer.get(7, 9), [1.0; 4]);
}

#[test]
fn shadow_lands_at_its_offset() {
    let params = EffectParams::builder()
        .text_color(Color::WHITE)
        .shadow(Vec2::new(4.0, -4.0), 0.0, 0.0, Color::BLACK, 1.0)
        .build();
    let out = render(&params);
    assert_eq!((out.buffer.width(), out.buffer.height()), (14, 18));
    assert_eq!(out.buffer.get(12, 2), [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(out.buffer.get(12, 17)[3], 0.0);
    assert_eq!(out.buffer.get(5, 10), [1.0; 4]);
}

#[test]
fn orthographic_body_extends_right() {
    let light = Gradient::solid(Color::new(1.0, 1.0, 1.0, 0.5));
    let params = EffectParams::builder()
        .orthographic_3d(0.0, 6.0, Color::CLEAR, light, 0.0, 0.0)
        .build();
    let out = render(&params);
    assert_eq!(out.buffer.width(), 16);
    assert!(out.buffer.get(13, 7)[3] > 0.99);
    assert!(out.buffer.get(15, 7)[3] > 0.99);
    assert_eq!(out.canvas.text_rect.x, 0.0);
}

#[test]
fn perspective_body_reaches_toward_vanishing_point() {
    let light = Gradient::solid(Color::new(1.0, 1.0, 1.0, 0.5));
    let params = EffectParams::builder()
        .perspective_3d(Vec2::new(0.5, 3.0), 0.25, Color::CLEAR, light, 0.0, 0.0)
        .build();
    let out = render(&params);
    // ep.y = 3 * 14 - 3 = 39; (39 - 11) * 0.25 = 7 px above the text.
    assert_eq!(out.buffer.height(), 21);
    assert!(out.buffer.get(5, 16)[3] > 0.5);
}

#[test]
fn glow_spreads_outside_the_text() {
    let params = EffectParams::builder().glow(3.0, 0.0, Color::WHITE, 0.0, 1.0).build();
    let out = render(&params);
    assert_eq!((out.buffer.width(), out.buffer.height()), (16, 20));
    assert!(out.buffer.get(1, 10)[3] > 0.9);
}

#[test]
fn inner_blur_tints_edges_only() {
    let red = Color::rgb(1.0, 0.0, 0.0);
    let params = EffectParams::builder().inner_alpha_blend(2.0, red, 0.0).build();
    let out = render(&params);
    assert!(out.buffer.get(0, 7)[1] < 0.9);
    assert_eq!(out.buffer.get(5, 7), [1.0; 4]);
}

#[test]
fn emboss_shades_opposite_edges_differently() {
    let params = EffectParams::builder()
        .inner_emboss(Color::WHITE, 180.0, 1.0, 3.0)
        .text_color(Color::rgb(0.5, 0.5, 0.5))
        .build();
    let out = render(&params);
    let left = out.buffer.get(0, 7)[0];
    let right = out.buffer.get(9, 7)[0];
    assert!(left > 0.5, "lit edge {}", left);
    assert!(right < 0.5, "shaded edge {}", right);
}

#[test]
fn disabled_effects_leave_neutral_blend_state() {
    // Contract: a render without an effect resets its blend slot
    let mut compositor = Compositor::default();
    let full = EffectParams::builder()
        .outline(2.0, Color::BLACK, false)
        .shadow(Vec2::new(2.0, -2.0), 1.0, 1.0, Color::BLACK, 1.0)
        .inner_alpha_blend(2.0, Color::BLACK, 0.0)
        .glow(2.0, 1.0, Color::WHITE, 0.0, 0.5)
        .build();
    composite(&mut compositor, &full);
    assert!(!compositor.stage().outline().is_neutral());
    assert!(!compositor.stage().outer().is_neutral());
    assert!(!compositor.stage().inner().is_neutral());
    assert!(!compositor.stage().glow().is_neutral());

    composite(&mut compositor, &EffectParams::default());
    assert!(compositor.stage().outline().is_neutral());
    assert!(compositor.stage().outer().is_neutral());
    assert!(compositor.stage().inner().is_neutral());
    assert!(compositor.stage().glow().is_neutral());
    assert_eq!(compositor.stage().settings, BlendSettings::default());
}

#[test]
fn compositing_is_deterministic() {
    let params = EffectParams::builder()
        .outline(1.5, Color::BLACK, true)
        .shadow(Vec2::new(3.0, -2.0), 1.0, 2.0, Color::BLACK, 2.0)
        .inner_shadow_additive(45.0, 2.0, Color::WHITE, 0.5, 0.8)
        .glow(1.0, 2.0, Color::WHITE, -0.5, -0.5)
        .build();
    let mut compositor = Compositor::default();
    let first = composite(&mut compositor, &params);
    let second = composite(&mut compositor, &params);
    assert_eq!(first, second);
    assert_eq!(first, render(&params));
}

#[test]
fn pooled_output_returns_to_the_pool() {
    let mut compositor = Compositor::default();
    let mut f = font("A");
    let m = mesh(&mut f, "A");
    let out = compositor
        .composite(&m, &[Some(f.atlas())], &EffectParams::default(), AllocPolicy::Pooled)
        .expect("non-empty mesh");
    let idle = compositor.pool().idle_count();
    compositor.release(out.buffer);
    assert_eq!(compositor.pool().idle_count(), idle + 1);
}
