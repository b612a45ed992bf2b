//! Colours: dot palette and UI, optionally loaded from a btop-style `theme[key]="value"` file.

use crate::Palette;
use crate::grid::DotColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of distinct dot colours a theme provides.
pub const DOT_COLORS: usize = 6;

/// One Dark: green, yellow, red, blue, magenta, cyan.
const ONEDARK_DOTS: [Color; DOT_COLORS] = [
    Color::Rgb(0x98, 0xC3, 0x79),
    Color::Rgb(0xE5, 0xC0, 0x7B),
    Color::Rgb(0xE0, 0x6C, 0x75),
    Color::Rgb(0x61, 0xAF, 0xEF),
    Color::Rgb(0xC6, 0x78, 0xDD),
    Color::Rgb(0x56, 0xB6, 0xC2),
];

const HIGH_CONTRAST_DOTS: [Color; DOT_COLORS] = [
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0x00, 0xFF, 0xFF),
];

/// Avoids red/green pairs (Tol bright scheme).
const COLORBLIND_DOTS: [Color; DOT_COLORS] = [
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0xBB, 0xBB, 0x00),
];

/// Theme file keys tried for each dot colour, first hit wins.
const DOT_KEYS: [&[&str]; DOT_COLORS] = [
    &["mem_box", "cpu_start"],
    &["title", "cpu_mid"],
    &["cpu_end", "temp_end"],
    &["cpu_box"],
    &["net_box"],
    &["hi_fg", "proc_misc"],
];

#[derive(Debug, Clone)]
pub struct Theme {
    pub dots: [Color; DOT_COLORS],
    /// Board background.
    pub bg: Color,
    /// Borders and chain connectors at rest.
    pub div_line: Color,
    pub main_fg: Color,
    pub title: Color,
    /// Keyboard cursor brackets.
    pub cursor: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark()
    }
}

impl Theme {
    pub fn onedark() -> Self {
        Self {
            dots: ONEDARK_DOTS,
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            cursor: Color::Rgb(0xFF, 0xFF, 0xFF),
        }
    }

    /// Load from a theme file, then apply `palette`. No path, or a path that
    /// does not exist, gives the defaults.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override dot colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => self.dots = HIGH_CONTRAST_DOTS,
            Palette::Colorblind => self.dots = COLORBLIND_DOTS,
        }
    }

    /// Unknown or malformed keys keep their One Dark value.
    fn from_map(map: &HashMap<String, String>) -> Self {
        let lookup = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()));
        let mut theme = Self::onedark();
        for (slot, keys) in theme.dots.iter_mut().zip(DOT_KEYS) {
            if let Some(c) = lookup(keys) {
                *slot = c;
            }
        }
        theme.bg = lookup(&["meter_bg"]).unwrap_or(theme.bg);
        theme.div_line = lookup(&["div_line"]).unwrap_or(theme.div_line);
        theme.main_fg = lookup(&["main_fg"]).unwrap_or(theme.main_fg);
        theme.title = lookup(&["title"]).unwrap_or(theme.title);
        theme.cursor = lookup(&["selected_fg", "hi_fg"]).unwrap_or(theme.cursor);
        theme
    }

    #[inline]
    pub fn dot_color(&self, color: DotColor) -> Color {
        self.dots[color.0 as usize % DOT_COLORS]
    }
}

/// Parse btop-style theme file into key -> value map. Comments and blank lines are skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(hex.to_string());
    if !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    let (r, g, b) = match hex.len() {
        6 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
        3 => (
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
