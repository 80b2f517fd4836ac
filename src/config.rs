// src/config.rs

//! Renderer configuration.
//!
//! Every struct is `#[serde(default)]`, so a JSON file only needs the fields it
//! changes. The effect parameter block is deliberately absent: effects are
//! built in code through [`crate::effects::EffectParamsBuilder`].

use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::effects::EffectParams;
use crate::glyph::FontStyle;
use crate::rasterizer::{AllocPolicy, DEFAULT_POOL_CAPACITY};

/// Environment variable naming the JSON file [`CONFIG`] loads.
pub const CONFIG_ENV: &str = "ART_TEXT_CONFIG";

/// Process-wide configuration, loaded on first access.
pub static CONFIG: Lazy<Config> = Lazy::new(|| match std::env::var_os(CONFIG_ENV) {
    Some(path) => Config::load_or_default(Path::new(&path)),
    None => Config::default(),
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub text: TextConfig,
    pub render: RenderConfig,
    pub export: ExportConfig,
}

impl Config {
    /// Reads a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Like [`Config::load`], falling back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Using default config: {:#}", err);
                Self::default()
            }
        }
    }
}

/// Font style names as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleName {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl From<StyleName> for FontStyle {
    fn from(name: StyleName) -> Self {
        match name {
            StyleName::Normal => FontStyle::NORMAL,
            StyleName::Bold => FontStyle::BOLD,
            StyleName::Italic => FontStyle::ITALIC,
            StyleName::BoldItalic => FontStyle::BOLD_ITALIC,
        }
    }
}

/// Defaults for the text itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub font_size: i32,
    pub font_style: StyleName,
    /// Baseline distance as a multiple of the font size.
    pub line_height: f32,
    /// Extra baseline distance in pixels.
    pub line_space: f32,
    pub char_space: f32,
    pub text_blend: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        TextConfig {
            font_size: 32,
            font_style: StyleName::Normal,
            line_height: 1.0,
            line_space: 0.0,
            char_space: 0.0,
            text_blend: 1.0,
        }
    }
}

impl TextConfig {
    /// Effect parameters carrying these text settings and no effects.
    pub fn effect_params(&self) -> EffectParams {
        EffectParams::builder()
            .line_height_and_space(self.line_height, self.line_space)
            .char_space(self.char_space)
            .text_blend(self.text_blend)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub alloc_policy: AllocPolicy,
    /// Idle buffers kept by the compositor pool, across all sizes.
    pub pool_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            alloc_policy: AllocPolicy::Owned,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Pixel buffers are bottom-up; PNG rows are top-down.
    pub flip_vertical: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig { flip_vertical: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("art-text-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, contents).expect("write temp config");
        path
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let path = temp_file(
            "partial",
            r#"{ "text": { "font_size": 48, "font_style": "bold_italic" }, "render": { "alloc_policy": "pooled" } }"#,
        );
        let config = Config::load(&path).expect("valid config");
        std::fs::remove_file(&path).ok();

        assert_eq!(config.text.font_size, 48);
        assert_eq!(FontStyle::from(config.text.font_style), FontStyle::BOLD_ITALIC);
        assert_eq!(config.text.line_height, 1.0);
        assert_eq!(config.render.alloc_policy, AllocPolicy::Pooled);
        assert_eq!(config.render.pool_capacity, DEFAULT_POOL_CAPACITY);
        assert!(config.export.flip_vertical);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = temp_file("invalid", "{ not json");
        assert!(Config::load(&path).is_err());
        assert_eq!(Config::load_or_default(&path), Config::default());
        std::fs::remove_file(&path).ok();

        let missing = std::env::temp_dir().join("art-text-does-not-exist.json");
        assert_eq!(Config::load_or_default(&missing), Config::default());
    }

    #[test]
    fn text_settings_feed_effect_params() {
        let text = TextConfig {
            line_height: 1.5,
            line_space: 2.0,
            text_blend: 0.5,
            ..TextConfig::default()
        };
        let params = text.effect_params();
        assert_eq!(params.line_distance(20), 32.0);
        assert_eq!(params.text_blend(), 0.5);
    }
}
