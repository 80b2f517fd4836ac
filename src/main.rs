// src/main.rs

//! Demo binary: renders markup with the headless synthetic font and writes a PNG.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use art_text::color::Color;
use art_text::config::{Config, CONFIG};
use art_text::effects::EffectParams;
use art_text::font::{FontBackend, FontSlot, HeadlessFont};
use art_text::geometry::Vec2;
use art_text::glyph::FontStyle;
use art_text::{ArtTextRenderer, RenderOutcome};

#[derive(Parser)]
#[command(name = "art-text", about = "Render markup text with art effects into a PNG")]
struct Cli {
    /// Markup to render, e.g. "<color=#ff0000>Hello</color> world"
    markup: String,
    /// Output PNG path
    #[arg(long, short)]
    out: PathBuf,
    /// Font size in pixels (config default when omitted)
    #[arg(long)]
    font_size: Option<i32>,
    #[arg(long)]
    bold: bool,
    #[arg(long)]
    italic: bool,
    /// Outline size in pixels
    #[arg(long)]
    outline: Option<f32>,
    /// Shadow offset as DX,DY
    #[arg(long, value_parser = parse_offset)]
    shadow: Option<Vec2>,
    /// Glow extend in pixels
    #[arg(long)]
    glow: Option<f32>,
    /// JSON config file (overrides ART_TEXT_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_offset(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY, got {:?}", s))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad DX {:?}: {}", x, e))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad DY {:?}: {}", y, e))?;
    Ok(Vec2::new(x, y))
}

fn effect_params(cli: &Cli, config: &Config) -> EffectParams {
    let mut builder = config.text.effect_params().to_builder();
    if let Some(size) = cli.outline {
        builder = builder.outline(size, Color::BLACK, false);
    }
    if let Some(offset) = cli.shadow {
        builder = builder.shadow(offset, 0.0, 2.0, Color::BLACK.with_alpha(0.6), 1.0);
    }
    if let Some(extend) = cli.glow {
        builder = builder.glow(extend, 4.0, Color::new(1.0, 0.85, 0.2, 1.0), 0.0, 1.0);
    }
    builder.build()
}

fn main() -> Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_or_default(path),
        None => CONFIG.clone(),
    };

    let font_size = cli.font_size.unwrap_or(config.text.font_size);
    let mut style = FontStyle::from(config.text.font_style);
    style.set(FontStyle::BOLD, cli.bold || style.contains(FontStyle::BOLD));
    style.set(FontStyle::ITALIC, cli.italic || style.contains(FontStyle::ITALIC));
    let params = effect_params(&cli, &config);

    let mut font = HeadlessFont::new();
    let mut fonts: [FontSlot<'_>; 1] = [Some(&mut font as &mut dyn FontBackend)];
    let mut renderer = ArtTextRenderer::with_pool_capacity(config.render.pool_capacity);
    let outcome = renderer.render_text(
        &mut fonts,
        &cli.markup,
        font_size,
        style,
        &params,
        config.render.alloc_policy,
    );

    let text = match outcome {
        RenderOutcome::Rendered(text) => text,
        RenderOutcome::Empty => bail!("Nothing to render"),
        RenderOutcome::MissingGlyphs(missing) => {
            for m in &missing {
                warn!("Missing glyph '{}' at {} px in font {}", m.ch, m.size, m.font);
            }
            bail!("{} glyphs could not be rasterized", missing.len());
        }
    };

    text.buffer
        .save_png(&cli.out, config.export.flip_vertical)
        .with_context(|| format!("Failed to export {}", cli.out.display()))?;
    info!(
        "Wrote {}x{} image to {} (origin {:?})",
        text.buffer.width(),
        text.buffer.height(),
        cli.out.display(),
        text.origin
    );
    Ok(())
}
