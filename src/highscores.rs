//! Persist best scores per board configuration (XDG config or ~/.config/dottytui).

use crate::GameConfig;
use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

const FILENAME: &str = "highscores";

/// Returns the path to the high scores file (config dir / dottytui / highscores).
fn config_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("dottytui").join(FILENAME)
}

/// Scores are only comparable between games with the same board and budget.
pub fn config_key(config: &GameConfig) -> String {
    format!(
        "{}x{}c{}m{}",
        config.rows, config.cols, config.colors, config.move_budget
    )
}

/// Best score per configuration key. One `key score` pair per line on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HighScores {
    best: BTreeMap<String, u32>,
}

impl HighScores {
    /// Load from disk; a missing or unreadable file gives an empty table.
    pub fn load() -> Self {
        fs::read_to_string(config_path())
            .map(|s| Self::parse(&s))
            .unwrap_or_default()
    }

    /// Malformed lines are skipped.
    fn parse(s: &str) -> Self {
        let best = s
            .lines()
            .filter_map(|line| {
                let (key, score) = line.trim().split_once(' ')?;
                Some((key.to_string(), score.trim().parse().ok()?))
            })
            .collect();
        Self { best }
    }

    fn render(&self) -> String {
        self.best
            .iter()
            .map(|(key, score)| format!("{key} {score}\n"))
            .collect()
    }

    pub fn best(&self, key: &str) -> u32 {
        self.best.get(key).copied().unwrap_or(0)
    }

    /// Record a finished game. Returns true if it beat the previous best.
    pub fn record(&mut self, key: &str, score: u32) -> bool {
        if score > self.best(key) {
            self.best.insert(key.to_string(), score);
            true
        } else {
            false
        }
    }

    /// Save to disk. Creates config directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        Ok(())
    }
}
