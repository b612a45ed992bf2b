//! Game state: grid, selection, pending move, score and move budget.
//!
//! A move is two calls. Gesture end commits the selection and returns the
//! removal set so the caller can animate it; `finish_move` applies it to the
//! grid later. Nothing on the board changes in between.

use crate::GameConfig;
use crate::grid::{Dot, Grid, Position};
use crate::resolver::{self, PendingMove};
use crate::selection::{DotStatus, Selection};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    GameOver,
}

/// What ending a gesture did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureEnd {
    /// One dot or fewer: the selection was discarded.
    Cleared,
    /// A move is pending until `finish_move`.
    Committed(PendingMove),
}

/// Result of applying a committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub removed: u32,
    pub score: u32,
    pub moves_left: u32,
    pub game_over: bool,
}

/// Calls made out of order. None of these change any state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("selection of {0} dot(s) is too short to commit")]
    SelectionTooShort(usize),
    #[error("a committed move is still waiting to be finished")]
    MovePending,
    #[error("no committed move to finish")]
    NoPendingMove,
    #[error("the game is over")]
    GameOver,
}

#[derive(Debug)]
pub struct GameState {
    config: GameConfig,
    rng: StdRng,
    grid: Grid,
    selection: Selection,
    pending: Option<PendingMove>,
    score: u32,
    moves_left: u32,
    status: GameStatus,
}

impl GameState {
    /// Start a game. `config` is expected to have passed [`GameConfig::validate`].
    pub fn new(config: &GameConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let grid = Grid::new(config.rows, config.cols, config.colors, &mut rng);
        let mut state = Self {
            config: config.clone(),
            rng,
            grid,
            selection: Selection::new(),
            pending: None,
            score: 0,
            moves_left: config.move_budget,
            status: GameStatus::InProgress,
        };
        state.reset_counters();
        info!(
            rows = config.rows,
            cols = config.cols,
            colors = config.colors,
            moves = config.move_budget,
            seed = ?config.seed,
            "new game"
        );
        state
    }

    /// Game over a fixed board, for tests.
    #[cfg(test)]
    pub fn with_grid(config: &GameConfig, grid: Grid) -> Self {
        let mut state = Self::new(config);
        state.grid = grid;
        state
    }

    /// Refill the board and reset score, budget, selection and any pending move.
    pub fn new_game(&mut self) {
        self.grid.generate(&mut self.rng);
        self.reset_counters();
        info!(moves = self.moves_left, "new game");
    }

    fn reset_counters(&mut self) {
        self.selection.clear();
        self.pending = None;
        self.score = 0;
        self.moves_left = self.config.move_budget;
        self.status = if self.moves_left == 0 {
            GameStatus::GameOver
        } else {
            GameStatus::InProgress
        };
    }

    /// Forward a touched cell to the selection.
    ///
    /// Ignored entirely while the game is over or a committed move is waiting
    /// to be finished. Panics if `pos` is outside the board.
    pub fn process_dot(&mut self, pos: Position) -> DotStatus {
        if self.status == GameStatus::GameOver || self.pending.is_some() {
            return DotStatus::Ignored;
        }
        let dot = self.grid.dot(pos);
        let had_loop = self.selection.closed_loop().is_some();
        let status = self.selection.propose(dot);
        if !had_loop {
            if let Some(info) = self.selection.closed_loop() {
                debug!(
                    start = info.start,
                    color = info.color.0,
                    enclosed = info.enclosed.len(),
                    "loop closed"
                );
            }
        }
        status
    }

    /// Drop the in-progress path without making a move. The path of a
    /// committed move stays until it is finished.
    pub fn clear_selected_dots(&mut self) {
        if self.pending.is_none() {
            self.selection.clear();
        }
    }

    pub fn selected_dots(&self) -> &[Dot] {
        self.selection.dots()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Gesture end: compute the removal set and hold it until `finish_move`.
    pub fn commit_selection(&mut self) -> Result<&PendingMove, MoveError> {
        if self.status == GameStatus::GameOver {
            return Err(MoveError::GameOver);
        }
        if self.pending.is_some() {
            return Err(MoveError::MovePending);
        }
        let pending = resolver::resolve(&self.selection, &self.grid)
            .ok_or(MoveError::SelectionTooShort(self.selection.len()))?;
        info!(
            chain = pending.chain_len,
            removal = pending.len(),
            looped = pending.loop_closed,
            "move committed"
        );
        Ok(&*self.pending.insert(pending))
    }

    /// Gesture end as the presentation layer sees it: short selections are
    /// cleared, longer ones committed.
    pub fn end_gesture(&mut self) -> GestureEnd {
        match self.commit_selection().cloned() {
            Ok(pending) => GestureEnd::Committed(pending),
            Err(MoveError::MovePending) => match &self.pending {
                Some(pending) => GestureEnd::Committed(pending.clone()),
                None => GestureEnd::Cleared,
            },
            Err(err) => {
                debug!(%err, "gesture ended without a move");
                self.selection.clear();
                GestureEnd::Cleared
            }
        }
    }

    pub fn pending_move(&self) -> Option<&PendingMove> {
        self.pending.as_ref()
    }

    /// Apply the pending removal: clear, drop and refill, then score it and
    /// spend one move.
    pub fn finish_move(&mut self) -> Result<MoveOutcome, MoveError> {
        let Some(pending) = self.pending.take() else {
            warn!("finish_move called with no committed move");
            return Err(MoveError::NoPendingMove);
        };
        let refilled = self.grid.remove_and_refill(&pending.removal, &mut self.rng);
        let removed = pending.len() as u32;
        self.score += removed;
        self.moves_left = self.moves_left.saturating_sub(1);
        self.selection.clear();
        if self.moves_left == 0 {
            self.status = GameStatus::GameOver;
        }
        debug!(removed, refilled, score = self.score, moves_left = self.moves_left, "move finished");
        if self.status == GameStatus::GameOver {
            info!(score = self.score, "game over");
        }
        Ok(MoveOutcome {
            removed,
            score: self.score,
            moves_left: self.moves_left,
            game_over: self.status == GameStatus::GameOver,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_game_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DotColor;
    use proptest::prelude::*;

    fn config(rows: usize, cols: usize, moves: u32) -> GameConfig {
        GameConfig {
            rows,
            cols,
            colors: 5,
            move_budget: moves,
            seed: Some(42),
        }
    }

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    /// 6x6 board: a row of three 0s at the top left, the rest never chainable
    /// with them.
    fn striped_6x6() -> Grid {
        Grid::from_rows(
            &[
                &[0, 0, 0, 1, 2, 3],
                &[1, 2, 3, 4, 1, 2],
                &[2, 3, 4, 1, 2, 3],
                &[3, 4, 1, 2, 3, 4],
                &[4, 1, 2, 3, 4, 1],
                &[1, 2, 3, 4, 1, 2],
            ],
            5,
        )
    }

    #[test]
    fn test_new_game_starts_full_and_fresh() {
        let mut game = GameState::new(&config(6, 6, 30));
        assert!(game.grid().is_full());
        assert_eq!(game.score(), 0);
        assert_eq!(game.moves_left(), 30);
        assert!(!game.is_game_over());
        assert!(game.selected_dots().is_empty());

        game.process_dot(p(0, 0));
        game.new_game();
        assert!(game.selected_dots().is_empty());
        assert!(game.pending_move().is_none());
        assert!(game.grid().is_full());
    }

    #[test]
    fn test_seed_makes_boards_reproducible() {
        let a = GameState::new(&config(6, 6, 30));
        let b = GameState::new(&config(6, 6, 30));
        assert_eq!(a.grid(), b.grid());
    }

    #[test]
    fn test_three_dot_move() {
        let mut game = GameState::with_grid(&config(6, 6, 30), striped_6x6());
        for col in 0..3 {
            assert_eq!(game.process_dot(p(0, col)), DotStatus::Added);
        }
        let GestureEnd::Committed(pending) = game.end_gesture() else {
            panic!("three dots should commit");
        };
        assert_eq!(pending.len(), 3);

        // Nothing moves until the move is finished.
        assert_eq!(game.grid(), &striped_6x6());
        assert_eq!(game.selected_dots().len(), 3);

        let outcome = game.finish_move().expect("pending move");
        assert_eq!(outcome.removed, 3);
        assert_eq!(game.score(), 3);
        assert_eq!(game.moves_left(), 29);
        assert!(!outcome.game_over);
        assert!(game.grid().is_full());
        assert!(game.selected_dots().is_empty());

        // Only the top row was cleared, so nothing below it fell.
        let before = striped_6x6();
        for row in 1..6 {
            for col in 0..6 {
                assert_eq!(game.grid().dot(p(row, col)), before.dot(p(row, col)));
            }
        }
    }

    #[test]
    fn test_single_dot_gesture_changes_nothing() {
        let mut game = GameState::with_grid(&config(6, 6, 30), striped_6x6());
        assert_eq!(game.process_dot(p(3, 3)), DotStatus::Added);
        game.clear_selected_dots();
        assert!(game.selected_dots().is_empty());
        assert_eq!(game.score(), 0);
        assert_eq!(game.moves_left(), 30);

        game.process_dot(p(3, 3));
        assert_eq!(game.end_gesture(), GestureEnd::Cleared);
        assert!(game.selected_dots().is_empty());
        assert_eq!(game.moves_left(), 30);
    }

    #[test]
    fn test_finish_without_commit_is_rejected() {
        let mut game = GameState::with_grid(&config(6, 6, 30), striped_6x6());
        assert_eq!(game.finish_move(), Err(MoveError::NoPendingMove));

        for col in 0..2 {
            game.process_dot(p(0, col));
        }
        game.commit_selection().expect("commit");
        game.finish_move().expect("first finish");
        assert_eq!(game.finish_move(), Err(MoveError::NoPendingMove));
        assert_eq!(game.score(), 2);
        assert_eq!(game.moves_left(), 29);
    }

    #[test]
    fn test_commit_rules() {
        let mut game = GameState::with_grid(&config(6, 6, 30), striped_6x6());
        assert_eq!(game.commit_selection(), Err(MoveError::SelectionTooShort(0)));
        game.process_dot(p(0, 0));
        game.process_dot(p(0, 1));
        game.commit_selection().expect("commit");
        assert_eq!(game.commit_selection(), Err(MoveError::MovePending));

        // Touches are ignored while the move is pending; so is clearing.
        assert_eq!(game.process_dot(p(0, 2)), DotStatus::Ignored);
        game.clear_selected_dots();
        assert_eq!(game.selected_dots().len(), 2);
        assert!(matches!(game.end_gesture(), GestureEnd::Committed(_)));
    }

    #[test]
    fn test_loop_bonus_clears_whole_color() {
        // Ten 0s: a 2x2 block plus six scattered.
        let grid = Grid::from_rows(
            &[
                &[0, 0, 1, 2, 0, 3],
                &[0, 0, 2, 3, 1, 4],
                &[1, 2, 0, 4, 2, 1],
                &[2, 3, 4, 0, 3, 2],
                &[3, 0, 1, 2, 4, 0],
                &[4, 1, 2, 3, 0, 1],
            ],
            5,
        );
        assert_eq!(grid.positions_of(DotColor(0)).count(), 10);
        let mut game = GameState::with_grid(&config(6, 6, 30), grid);
        for pos in [p(0, 0), p(0, 1), p(1, 1), p(1, 0), p(0, 0)] {
            assert_eq!(game.process_dot(pos), DotStatus::Added);
        }
        let pending = game.commit_selection().expect("loop commits").clone();
        assert!(pending.loop_closed);
        assert_eq!(pending.len(), 10);
        let outcome = game.finish_move().expect("finish");
        assert_eq!(outcome.removed, 10);
        assert_eq!(game.score(), 10);
        assert!(game.grid().is_full());
    }

    #[test]
    fn test_budget_runs_out() {
        let mut game = GameState::with_grid(&config(6, 6, 1), striped_6x6());
        game.process_dot(p(0, 0));
        game.process_dot(p(0, 1));
        game.end_gesture();
        let outcome = game.finish_move().expect("finish");
        assert!(outcome.game_over);
        assert_eq!(game.moves_left(), 0);
        assert!(game.is_game_over());

        assert_eq!(game.process_dot(p(0, 0)), DotStatus::Ignored);
        assert!(game.selected_dots().is_empty());
        assert_eq!(game.commit_selection(), Err(MoveError::GameOver));

        game.new_game();
        assert!(!game.is_game_over());
        assert_eq!(game.moves_left(), 1);
        assert_eq!(game.score(), 0);
    }

    fn check_path(path: &[Dot]) {
        for pair in path.windows(2) {
            assert!(pair[0].pos.is_adjacent(&pair[1].pos));
            assert_eq!(pair[0].color, pair[1].color);
        }
        for (i, a) in path.iter().enumerate() {
            assert!(path[i + 1..].iter().all(|b| b.pos != a.pos));
        }
    }

    proptest! {
        #[test]
        fn prop_random_play_keeps_invariants(
            seed in any::<u64>(),
            gestures in prop::collection::vec(prop::collection::vec((0usize..6, 0usize..6), 0..12), 1..20),
        ) {
            let cfg = GameConfig { seed: Some(seed), colors: 3, ..config(6, 6, 8) };
            let mut game = GameState::new(&cfg);
            for touches in gestures {
                let (score, moves) = (game.score(), game.moves_left());
                for (row, col) in touches {
                    game.process_dot(p(row, col));
                    check_path(game.selected_dots());
                }
                let chain = game.selected_dots().len();
                match game.end_gesture() {
                    GestureEnd::Cleared => {
                        prop_assert!(chain <= 1 || game.is_game_over());
                        prop_assert_eq!(game.score(), score);
                        prop_assert_eq!(game.moves_left(), moves);
                    }
                    GestureEnd::Committed(pending) => {
                        prop_assert!(pending.len() >= chain);
                        if pending.loop_closed {
                            let color = pending.color;
                            prop_assert!(game.grid().positions_of(color).all(|pos| pending.contains(pos)));
                        }
                        let outcome = game.finish_move().expect("committed move finishes");
                        prop_assert_eq!(game.score(), score + pending.len() as u32);
                        prop_assert_eq!(game.moves_left(), moves - 1);
                        prop_assert_eq!(outcome.game_over, game.moves_left() == 0);
                    }
                }
                prop_assert!(game.grid().is_full());
                prop_assert!(game.selected_dots().is_empty());
            }
        }
    }
}
