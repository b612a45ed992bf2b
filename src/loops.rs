//! Loop detection: a selection that steps back onto an earlier dot closes a cycle.

use crate::grid::{Dot, DotColor, Grid, Position};
use std::collections::HashSet;

/// A closed loop within the selection path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopInfo {
    /// The cycle is `path[start..]` plus the closing edge back to `path[start]`.
    pub start: usize,
    pub color: DotColor,
    /// Cells strictly inside the cycle, row-major.
    pub enclosed: Vec<Position>,
}

/// Returns the loop closed by stepping from the path's last dot onto `candidate`.
///
/// `candidate` must already be on the path, neither last nor second-to-last,
/// and orthogonally adjacent to the last dot.
pub fn detect(path: &[Dot], candidate: Dot) -> Option<LoopInfo> {
    let last = path.last()?;
    let start = path.iter().position(|d| d.pos == candidate.pos)?;
    if start + 2 >= path.len() || !candidate.pos.is_adjacent(&last.pos) {
        return None;
    }
    let cycle: Vec<Position> = path[start..].iter().map(|d| d.pos).collect();
    Some(LoopInfo {
        start,
        color: last.color,
        enclosed: enclosed_cells(&cycle),
    })
}

/// Cells strictly inside a closed cycle of orthogonal steps, searched within
/// the cycle's bounding box.
pub fn enclosed_cells(cycle: &[Position]) -> Vec<Position> {
    if cycle.len() < 4 {
        return Vec::new();
    }
    let on_cycle: HashSet<Position> = cycle.iter().copied().collect();
    let min_row = cycle.iter().map(|p| p.row).min().unwrap_or(0);
    let max_row = cycle.iter().map(|p| p.row).max().unwrap_or(0);
    let min_col = cycle.iter().map(|p| p.col).min().unwrap_or(0);
    let max_col = cycle.iter().map(|p| p.col).max().unwrap_or(0);

    let mut inside = Vec::new();
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            let pos = Position::new(row, col);
            if !on_cycle.contains(&pos) && crosses_odd(cycle, pos) {
                inside.push(pos);
            }
        }
    }
    inside
}

/// Even-odd test with a ray towards increasing column. Only vertical edges
/// can be crossed; the half-open row span counts a shared vertex once.
fn crosses_odd(cycle: &[Position], pos: Position) -> bool {
    let mut crossings = 0usize;
    for (i, a) in cycle.iter().enumerate() {
        let b = cycle[(i + 1) % cycle.len()];
        if a.col != b.col || a.col <= pos.col {
            continue;
        }
        let (lo, hi) = (a.row.min(b.row), a.row.max(b.row));
        if lo <= pos.row && pos.row < hi {
            crossings += 1;
        }
    }
    crossings % 2 == 1
}

/// Every dot on the board with the loop's colour.
pub fn color_bonus(grid: &Grid, color: DotColor) -> impl Iterator<Item = Position> + '_ {
    grid.positions_of(color)
}
