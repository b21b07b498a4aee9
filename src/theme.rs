//! Theme colors for the kiosk UI
//!
//! Operators can drop a theme.toml next to the config to match the exhibit
//! branding; otherwise a built-in palette is used.

use ratatui::style::Color;
use serde::Deserialize;
use std::fs;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, selected grid cells
    pub danger: Color,      // Error notices
    pub success: Color,     // Filled slots, submit-ready hint
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Hints, disabled grid cells
    pub bg_selected: Color, // Cursor background
    pub inactive: Color,    // Inactive borders
    pub header: Color,      // Title line
}

/// On-disk theme file; every field optional, hex "#rrggbb" strings
#[derive(Debug, Deserialize, Default)]
struct ThemeFile {
    accent: Option<String>,
    danger: Option<String>,
    success: Option<String>,
    text: Option<String>,
    text_dim: Option<String>,
    bg_selected: Option<String>,
    inactive: Option<String>,
    header: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback palette
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

impl Theme {
    /// Load the operator theme file, falling back to the built-in palette
    pub fn load() -> Self {
        if let Some(theme) = Self::load_theme_file() {
            return theme;
        }
        Self::default()
    }

    fn load_theme_file() -> Option<Self> {
        let path = dirs::config_dir()?.join("kumo").join("theme.toml");
        let content = fs::read_to_string(&path).ok()?;

        let file: ThemeFile = match toml::from_str(&content) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Ignoring malformed theme.toml: {}", e);
                return None;
            }
        };

        let defaults = Self::default();
        let pick = |value: &Option<String>, fallback: Color| {
            value
                .as_deref()
                .and_then(parse_hex_color)
                .unwrap_or(fallback)
        };

        Some(Self {
            accent: pick(&file.accent, defaults.accent),
            danger: pick(&file.danger, defaults.danger),
            success: pick(&file.success, defaults.success),
            text: pick(&file.text, defaults.text),
            text_dim: pick(&file.text_dim, defaults.text_dim),
            bg_selected: pick(&file.bg_selected, defaults.bg_selected),
            inactive: pick(&file.inactive, defaults.inactive),
            header: pick(&file.header, defaults.header),
        })
    }
}

/// Parse "#rrggbb" (leading '#' optional) into a Color
fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors_with_and_without_hash() {
        assert_eq!(parse_hex_color("#ffc107"), Some(Color::Rgb(255, 193, 7)));
        assert_eq!(parse_hex_color("FFC107"), Some(Color::Rgb(255, 193, 7)));
        assert_eq!(parse_hex_color("not-a-color"), None);
        assert_eq!(parse_hex_color("#fff"), None);
    }
}
