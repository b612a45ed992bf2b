//! The in-progress selection path: add, retract, close a loop.

use crate::grid::{Dot, DotColor};
use crate::loops::{self, LoopInfo};

/// Outcome of proposing a dot to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotStatus {
    /// Appended to the path, or closed a loop.
    Added,
    /// The player backtracked; the last dot was dropped.
    Removed,
    Ignored,
}

/// Ordered chain of distinct, adjacent, same-coloured dots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    path: Vec<Dot>,
    /// Set once a loop is closed; the path is frozen from then on.
    closed_loop: Option<LoopInfo>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dots(&self) -> &[Dot] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Colour of the chain, fixed by its first dot.
    pub fn color(&self) -> Option<DotColor> {
        self.path.first().map(|d| d.color)
    }

    pub fn closed_loop(&self) -> Option<&LoopInfo> {
        self.closed_loop.as_ref()
    }

    pub fn clear(&mut self) {
        self.path.clear();
        self.closed_loop = None;
    }

    /// Validate `dot` against the path and apply the outcome.
    ///
    /// Backtracking to the second-to-last dot wins over everything else, then
    /// loop closing, then a plain append.
    pub fn propose(&mut self, dot: Dot) -> DotStatus {
        if self.closed_loop.is_some() {
            return DotStatus::Ignored;
        }
        let Some(last) = self.path.last().copied() else {
            self.path.push(dot);
            return DotStatus::Added;
        };

        if let Some(index) = self.path.iter().position(|d| d.pos == dot.pos) {
            if index + 2 == self.path.len() {
                self.path.pop();
                return DotStatus::Removed;
            }
            return match loops::detect(&self.path, dot) {
                Some(info) => {
                    self.closed_loop = Some(info);
                    DotStatus::Added
                }
                None => DotStatus::Ignored,
            };
        }

        if dot.color == last.color && dot.pos.is_adjacent(&last.pos) {
            self.path.push(dot);
            DotStatus::Added
        } else {
            DotStatus::Ignored
        }
    }
}
