//! App: terminal init, main loop, mouse and key handling.

use crate::game::{GameState, GameStatus, GestureEnd};
use crate::grid::{Grid, Position};
use crate::highscores::{self, HighScores};
use crate::input::{Action, key_to_action};
use crate::selection::DotStatus;
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info, warn};

/// Redraw budget per frame (~60 FPS) while the clear animation runs.
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

pub struct App {
    args: Args,
    theme: Theme,
    state: GameState,
    screen: Screen,
    /// Keyboard cursor; hidden while the mouse is in use.
    cursor: Position,
    show_cursor: bool,
    /// Last board cell fed to the engine during a mouse drag.
    drag_cell: Option<Position>,
    /// TachyonFX fade for the dots being cleared (created when the move is committed).
    clear_effect: Option<Effect>,
    /// Last time we processed the clear effect (for delta).
    clear_effect_process_time: Option<Instant>,
    high_scores: HighScores,
    score_key: String,
    new_record: bool,
    /// Terminal area of the last frame, for mapping mouse coordinates.
    last_area: Rect,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let state = GameState::new(&config);
        let high_scores = HighScores::load();
        let score_key = highscores::config_key(state.config());
        Ok(Self {
            args,
            theme,
            state,
            screen: Screen::Playing,
            cursor: Position::new(0, 0),
            show_cursor: true,
            drag_cell: None,
            clear_effect: None,
            clear_effect_process_time: None,
            high_scores,
            score_key,
            new_record: false,
            last_area: Rect::default(),
        })
    }

    fn reset_game(&mut self) {
        self.state.new_game();
        self.screen = Screen::Playing;
        self.drag_cell = None;
        self.clear_effect = None;
        self.clear_effect_process_time = None;
        self.new_record = false;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let cursor = self.show_cursor.then_some(self.cursor);
            let best = self.high_scores.best(&self.score_key);
            let mut area = self.last_area;
            terminal.draw(|f| {
                area = f.area();
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    cursor,
                    best,
                    self.new_record,
                    &mut self.clear_effect,
                    &mut self.clear_effect_process_time,
                    now,
                    self.args.no_animation,
                    self.args.clear_ms,
                )
            })?;
            self.last_area = area;

            if self.state.pending_move().is_some()
                && self.clear_effect.as_ref().is_some_and(Effect::done)
            {
                self.finish_pending();
            }

            // Block on input unless an animation needs frames.
            let timeout = if self.clear_effect.is_some() {
                Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed())
            } else {
                Duration::from_secs(1)
            };

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if !self.handle_action(key_to_action(key)) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.handle_mouse(mouse),
                        _ => {}
                    }
                }
            }
        }
    }

    /// Returns false when the app should exit.
    fn handle_action(&mut self, action: Action) -> bool {
        match (self.screen, action) {
            (_, Action::Quit) => return false,
            (_, Action::NewGame) => {
                info!("new game requested");
                self.reset_game();
            }
            (Screen::GameOver, _) => {}
            (Screen::Playing, _) if self.state.is_game_over() => {}
            (Screen::Playing, Action::Up | Action::Down | Action::Left | Action::Right) => {
                self.show_cursor = true;
                self.cursor = step_cursor(self.cursor, action, self.state.grid());
                if !self.state.selection().is_empty() {
                    self.state.process_dot(self.cursor);
                }
            }
            (Screen::Playing, Action::Select) => {
                self.show_cursor = true;
                if self.state.selection().is_empty() {
                    self.state.process_dot(self.cursor);
                } else {
                    self.end_gesture();
                }
            }
            (Screen::Playing, Action::Finish) => {
                if !self.state.selection().is_empty() {
                    self.end_gesture();
                }
            }
            (Screen::Playing, Action::Cancel) => self.state.clear_selected_dots(),
            (Screen::Playing, Action::None) => {}
        }
        true
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing || self.state.status() == GameStatus::GameOver {
            return;
        }
        let cell = crate::ui::cell_at(self.last_area, self.state.grid(), mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(cell) = cell else {
                    return;
                };
                self.show_cursor = false;
                self.cursor = cell;
                // A fresh press replaces any chain started from the keyboard.
                self.state.clear_selected_dots();
                if self.state.process_dot(cell) == DotStatus::Added {
                    self.drag_cell = Some(cell);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let (Some(from), Some(to)) = (self.drag_cell, cell) else {
                    return;
                };
                if from == to {
                    return;
                }
                for pos in drag_path(from, to) {
                    self.state.process_dot(pos);
                }
                self.cursor = to;
                self.drag_cell = Some(to);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.drag_cell.take().is_some() {
                    self.end_gesture();
                }
            }
            _ => {}
        }
    }

    fn end_gesture(&mut self) {
        match self.state.end_gesture() {
            GestureEnd::Cleared => debug!("gesture cleared"),
            GestureEnd::Committed(pending) => {
                debug!(dots = pending.len(), loop_closed = pending.loop_closed, "move committed");
                if self.args.no_animation {
                    self.finish_pending();
                }
            }
        }
    }

    fn finish_pending(&mut self) {
        self.clear_effect = None;
        self.clear_effect_process_time = None;
        match self.state.finish_move() {
            Ok(outcome) => {
                debug!(
                    removed = outcome.removed,
                    score = outcome.score,
                    moves_left = outcome.moves_left,
                    "board settled"
                );
                if outcome.game_over {
                    self.on_game_over();
                }
            }
            Err(err) => warn!(%err, "nothing to finish"),
        }
    }

    fn on_game_over(&mut self) {
        let score = self.state.score();
        self.new_record = self.high_scores.record(&self.score_key, score);
        if self.new_record {
            if let Err(err) = self.high_scores.save() {
                warn!(%err, "could not save high scores");
            }
        }
        info!(score, new_record = self.new_record, "final score recorded");
        self.screen = Screen::GameOver;
    }
}

/// Move the cursor one cell, staying on the board.
fn step_cursor(cursor: Position, action: Action, grid: &Grid) -> Position {
    let Position { row, col } = cursor;
    match action {
        Action::Up => Position::new(row.saturating_sub(1), col),
        Action::Down => Position::new((row + 1).min(grid.rows() - 1), col),
        Action::Left => Position::new(row, col.saturating_sub(1)),
        Action::Right => Position::new(row, (col + 1).min(grid.cols() - 1)),
        _ => cursor,
    }
}

/// Cells a drag passed through between two events, excluding `from`. Fast
/// drags along a row or column skip cells, so those are filled in; a diagonal
/// jump only reports where the pointer landed.
fn drag_path(from: Position, to: Position) -> Vec<Position> {
    if from.row == to.row {
        let cols: Vec<usize> = if from.col < to.col {
            (from.col + 1..=to.col).collect()
        } else {
            (to.col..from.col).rev().collect()
        };
        cols.into_iter().map(|col| Position::new(from.row, col)).collect()
    } else if from.col == to.col {
        let rows: Vec<usize> = if from.row < to.row {
            (from.row + 1..=to.row).collect()
        } else {
            (to.row..from.row).rev().collect()
        };
        rows.into_iter().map(|row| Position::new(row, from.col)).collect()
    } else {
        vec![to]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_stays_on_board() {
        let grid = Grid::from_rows(&[&[0, 0, 0], &[0, 0, 0]], 1);
        let corner = Position::new(0, 0);
        assert_eq!(step_cursor(corner, Action::Up, &grid), corner);
        assert_eq!(step_cursor(corner, Action::Left, &grid), corner);
        assert_eq!(step_cursor(corner, Action::Down, &grid), Position::new(1, 0));
        let far = Position::new(1, 2);
        assert_eq!(step_cursor(far, Action::Down, &grid), far);
        assert_eq!(step_cursor(far, Action::Right, &grid), far);
    }

    #[test]
    fn test_drag_path_fills_row_and_column_gaps() {
        assert_eq!(
            drag_path(Position::new(2, 0), Position::new(2, 3)),
            vec![Position::new(2, 1), Position::new(2, 2), Position::new(2, 3)]
        );
        assert_eq!(
            drag_path(Position::new(3, 1), Position::new(1, 1)),
            vec![Position::new(2, 1), Position::new(1, 1)]
        );
        assert_eq!(
            drag_path(Position::new(0, 0), Position::new(1, 1)),
            vec![Position::new(1, 1)]
        );
    }

    #[test]
    fn test_drag_path_back_over_previous_dot_backtracks() {
        // Dragging left onto the previous cell is a single step, which the
        // engine reads as a backtrack.
        assert_eq!(
            drag_path(Position::new(0, 2), Position::new(0, 1)),
            vec![Position::new(0, 1)]
        );
    }
}
