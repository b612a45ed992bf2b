//! Dot grid: random fill, gravity and refill.
//!
//! Row 0 is the top of the board; gravity pulls dots towards the last row.

use rand::Rng;

/// A cell coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Orthogonal neighbours only (Manhattan distance 1).
    pub fn is_adjacent(&self, other: &Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

/// Palette index of a dot (0..colors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DotColor(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dot {
    pub pos: Position,
    pub color: DotColor,
}

/// Fixed-size board of coloured dots.
///
/// Cells are only ever empty inside [`Grid::remove_and_refill`]; every public
/// accessor sees a full board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    colors: u8,
    /// cells[row * cols + col]
    cells: Vec<Option<DotColor>>,
}

impl Grid {
    /// New board filled with random dots.
    pub fn new<R: Rng + ?Sized>(rows: usize, cols: usize, colors: u8, rng: &mut R) -> Self {
        assert!(rows > 0 && cols > 0, "grid must have at least one cell");
        assert!(colors > 0, "palette must have at least one colour");
        let mut grid = Self {
            rows,
            cols,
            colors,
            cells: vec![None; rows * cols],
        };
        grid.generate(rng);
        grid
    }

    /// Board from explicit colour rows (top row first).
    #[cfg(test)]
    pub fn from_rows(rows: &[&[u8]], colors: u8) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        assert!(rows.iter().all(|r| r.len() == cols), "ragged layout");
        let cells = rows
            .iter()
            .flat_map(|r| r.iter().map(|&c| Some(DotColor(c))))
            .collect();
        Self {
            rows: rows.len(),
            cols,
            colors,
            cells,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn colors(&self) -> u8 {
        self.colors
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Panics on positions outside the board: callers own the coordinate mapping.
    #[inline]
    fn idx(&self, pos: Position) -> usize {
        assert!(
            self.contains(pos),
            "position ({}, {}) is outside the {}x{} grid",
            pos.row,
            pos.col,
            self.rows,
            self.cols
        );
        pos.row * self.cols + pos.col
    }

    /// The dot at `pos`.
    pub fn dot(&self, pos: Position) -> Dot {
        match self.cells[self.idx(pos)] {
            Some(color) => Dot { pos, color },
            None => panic!("cell ({}, {}) read while empty", pos.row, pos.col),
        }
    }

    /// All dots, row by row.
    pub fn dots(&self) -> impl Iterator<Item = Dot> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, cell)| {
            cell.map(|color| Dot {
                pos: Position::new(i / self.cols, i % self.cols),
                color,
            })
        })
    }

    /// Positions of every dot with the given colour.
    pub fn positions_of(&self, color: DotColor) -> impl Iterator<Item = Position> + '_ {
        self.dots()
            .filter(move |d| d.color == color)
            .map(|d| d.pos)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    fn random_color<R: Rng + ?Sized>(&self, rng: &mut R) -> DotColor {
        DotColor(rng.random_range(0..self.colors))
    }

    /// Fill every cell with a uniformly random colour. Existing matches are left alone.
    pub fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in 0..self.cells.len() {
            let color = self.random_color(rng);
            self.cells[i] = Some(color);
        }
    }

    /// Remove `cells`, let each affected column fall, then refill its top.
    ///
    /// Columns without a removed cell are not touched. Duplicate positions are
    /// harmless. Returns the number of new dots generated.
    pub fn remove_and_refill<R: Rng + ?Sized>(&mut self, cells: &[Position], rng: &mut R) -> usize {
        let mut columns = Vec::with_capacity(cells.len());
        for &pos in cells {
            let i = self.idx(pos);
            self.cells[i] = None;
            columns.push(pos.col);
        }
        columns.sort_unstable();
        columns.dedup();

        let mut refilled = 0;
        for col in columns {
            // Compact bottom-up so relative order is kept.
            let mut write = self.rows;
            for row in (0..self.rows).rev() {
                let i = row * self.cols + col;
                if let Some(color) = self.cells[i] {
                    write -= 1;
                    if write != row {
                        self.cells[write * self.cols + col] = Some(color);
                        self.cells[i] = None;
                    }
                }
            }
            for row in 0..write {
                let color = self.random_color(rng);
                self.cells[row * self.cols + col] = Some(color);
                refilled += 1;
            }
        }
        debug_assert!(self.is_full());
        refilled
    }
}
