//! Dottytui: connect same-coloured dots in the terminal, close loops to clear a whole colour.

mod app;
mod game;
mod grid;
mod highscores;
mod input;
mod loops;
mod resolver;
mod selection;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Smallest and largest board side.
pub const MIN_SIDE: usize = 2;
pub const MAX_SIDE: usize = 16;

/// Fixed parameters of a game: board size, palette size, move budget, RNG seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub colors: u8,
    pub move_budget: u32,
    /// Seeds the board RNG; `None` draws a seed from the OS.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 6,
            colors: 5,
            move_budget: 30,
            seed: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board must be between 2x2 and 16x16, got {rows}x{cols}")]
    BoardSize { rows: usize, cols: usize },
    #[error("colour count must be between 1 and {max}, got {got}")]
    Colors { got: u8, max: usize },
    #[error("move budget must be at least 1")]
    MoveBudget,
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let side = MIN_SIDE..=MAX_SIDE;
        if !side.contains(&self.rows) || !side.contains(&self.cols) {
            return Err(ConfigError::BoardSize {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.colors == 0 || self.colors as usize > theme::DOT_COLORS {
            return Err(ConfigError::Colors {
                got: self.colors,
                max: theme::DOT_COLORS,
            });
        }
        if self.move_budget == 0 {
            return Err(ConfigError::MoveBudget);
        }
        Ok(())
    }
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            rows: args.rows,
            cols: args.cols,
            colors: args.colors,
            move_budget: args.moves,
            seed: args.seed,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let config = GameConfig::from(&args);
    config.validate()?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(err) => {
            tracing::warn!(%err, "theme not loaded, using defaults");
            theme::Theme::default()
        }
    };
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// The terminal owns stdout, so events only go somewhere when a log file is given.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install logger: {e}"))?;
    Ok(())
}

/// Dot-connecting puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "dottytui",
    version,
    about = "Dot-connecting puzzle in the terminal. Drag through same-coloured dots to clear them; close a loop to clear every dot of that colour.",
    long_about = "Dottytui is a terminal take on the classic dots puzzle.\n\n\
        Drag through orthogonally adjacent dots of one colour to select a chain. Release to clear it; \
        the dots above fall and new ones drop in. Closing a loop clears every dot of that colour on \
        the board. Each cleared dot scores a point; you have a fixed number of moves.\n\n\
        MOUSE:\n  Press on a dot, drag through the chain, release to clear.\n\n\
        KEYBOARD:\n  Arrows / hjkl  Move cursor (extends an active chain)\n  Space          Start chain / finish chain\n  \
        Enter          Finish chain   Esc  Drop chain\n  N              New game       Q    Quit"
)]
pub struct Args {
    /// Board rows.
    #[arg(long, default_value = "6", value_name = "N")]
    pub rows: usize,

    /// Board columns.
    #[arg(long, default_value = "6", value_name = "N")]
    pub cols: usize,

    /// Number of dot colours (1-6).
    #[arg(short, long, default_value = "5", value_name = "N")]
    pub colors: u8,

    /// Moves per game.
    #[arg(short, long, default_value = "30", value_name = "N")]
    pub moves: u32,

    /// Seed for reproducible boards.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the clear animation (moves finish as soon as the chain is released).
    #[arg(long)]
    pub no_animation: bool,

    /// Duration of the clear animation.
    #[arg(long, default_value = "350", value_name = "MS")]
    pub clear_ms: u32,

    /// Write debug logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!((config.rows, config.cols, config.move_budget), (6, 6, 30));
    }

    #[test]
    fn test_invalid_configs() {
        let base = GameConfig::default();
        assert_eq!(
            GameConfig { rows: 1, ..base.clone() }.validate(),
            Err(ConfigError::BoardSize { rows: 1, cols: 6 })
        );
        assert!(GameConfig { cols: 17, ..base.clone() }.validate().is_err());
        assert_eq!(
            GameConfig { colors: 0, ..base.clone() }.validate(),
            Err(ConfigError::Colors { got: 0, max: 6 })
        );
        assert!(GameConfig { colors: 7, ..base.clone() }.validate().is_err());
        assert_eq!(
            GameConfig { move_budget: 0, ..base }.validate(),
            Err(ConfigError::MoveBudget)
        );
    }

    #[test]
    fn test_args_map_to_config() {
        let args = Args::parse_from([
            "dottytui", "--rows", "8", "--cols", "7", "-c", "4", "-m", "12", "--seed", "9",
        ]);
        let config = GameConfig::from(&args);
        assert_eq!(
            config,
            GameConfig {
                rows: 8,
                cols: 7,
                colors: 4,
                move_budget: 12,
                seed: Some(9),
            }
        );
    }

    #[test]
    fn test_palette_aliases() {
        let args = Args::parse_from(["dottytui", "--palette", "colourblind"]);
        assert_eq!(args.palette, Palette::Colorblind);
    }
}
