//! Turns a finished selection into the removal set for the next board mutation.

use crate::grid::{DotColor, Grid, Position};
use crate::loops;
use crate::selection::Selection;
use std::collections::BTreeSet;

/// A committed move waiting to be applied to the grid.
///
/// Produced at gesture end so the caller can animate it; the grid itself is
/// only changed by `GameState::finish_move`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    /// Distinct positions to clear, row-major.
    pub removal: Vec<Position>,
    pub color: DotColor,
    /// Dots in the selected chain.
    pub chain_len: usize,
    pub loop_closed: bool,
    /// Cells strictly inside a closed loop (display only).
    pub enclosed: Vec<Position>,
}

impl PendingMove {
    pub fn len(&self) -> usize {
        self.removal.len()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.removal.binary_search(&pos).is_ok()
    }
}

/// Removal set for `selection`: the chain, plus every dot of the chain's
/// colour when a loop was closed. `None` for selections of one dot or fewer.
pub fn resolve(selection: &Selection, grid: &Grid) -> Option<PendingMove> {
    if selection.len() <= 1 {
        return None;
    }
    let color = selection.color()?;
    let mut removal: BTreeSet<Position> = selection.dots().iter().map(|d| d.pos).collect();
    let (loop_closed, enclosed) = match selection.closed_loop() {
        Some(info) => {
            removal.extend(loops::color_bonus(grid, info.color));
            (true, info.enclosed.clone())
        }
        None => (false, Vec::new()),
    };
    Some(PendingMove {
        removal: removal.into_iter().collect(),
        color,
        chain_len: selection.len(),
        loop_closed,
        enclosed,
    })
}
