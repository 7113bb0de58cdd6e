//! Board: square grid of tiles with swap, clear, gravity and refill.

use crate::error::GameError;
use crate::matcher::find_matches;
use crate::tile::TileKind;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Regeneration passes allowed before a fresh board is declared unsettleable.
pub const MAX_STABILIZE_PASSES: usize = 10_000;

/// Board coordinate. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance exactly 1.
    pub fn is_adjacent(&self, other: Pos) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// N×N board. Cells are stored row-major; `None` is an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Option<TileKind>>,
}

impl Grid {
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Every cell filled with a uniformly random kind. May contain matches.
    pub fn random<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let mut grid = Self::empty(size);
        grid.refill(rng);
        grid
    }

    /// Random board with no initial matches.
    ///
    /// Only the cells taking part in a match are re-rolled on each pass, so the board
    /// converges in a handful of passes. Gives up with `GameError::Unstable` after
    /// `MAX_STABILIZE_PASSES`.
    pub fn initialize<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<Self, GameError> {
        let mut grid = Self::random(size, rng);
        for pass in 0..MAX_STABILIZE_PASSES {
            let groups = find_matches(&grid);
            if groups.is_empty() {
                log::debug!("board settled after {} re-roll passes", pass);
                return Ok(grid);
            }
            for pos in groups.iter().flat_map(|g| g.cells.iter()) {
                grid.set(*pos, Some(TileKind::random(rng)));
            }
        }
        Err(GameError::Unstable {
            passes: MAX_STABILIZE_PASSES,
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    pub fn check(&self, pos: Pos) -> Result<(), GameError> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(GameError::InvalidCoordinate {
                row: pos.row,
                col: pos.col,
                size: self.size,
            })
        }
    }

    #[inline]
    fn index(&self, pos: Pos) -> usize {
        pos.row * self.size + pos.col
    }

    /// Tile at `pos`; `None` for empty cells and out-of-range coordinates.
    #[inline]
    pub fn get(&self, pos: Pos) -> Option<TileKind> {
        if !self.contains(pos) {
            return None;
        }
        self.cells[self.index(pos)]
    }

    #[inline]
    pub fn set(&mut self, pos: Pos, tile: Option<TileKind>) {
        if self.contains(pos) {
            let i = self.index(pos);
            self.cells[i] = tile;
        }
    }

    /// Exchange two cells. Adjacency is the caller's business; only bounds are checked.
    pub fn swap(&mut self, a: Pos, b: Pos) -> Result<(), GameError> {
        self.check(a)?;
        self.check(b)?;
        let (ia, ib) = (self.index(a), self.index(b));
        self.cells.swap(ia, ib);
        Ok(())
    }

    /// Empty the listed cells. Returns the kinds that were removed (already-empty cells are
    /// skipped, so the result can be shorter than `cells`).
    pub fn clear<'a, I>(&mut self, cells: I) -> Vec<TileKind>
    where
        I: IntoIterator<Item = &'a Pos>,
    {
        let mut removed = Vec::new();
        for &pos in cells {
            if let Some(kind) = self.get(pos) {
                removed.push(kind);
                self.set(pos, None);
            }
        }
        removed
    }

    /// Gravity: in each column, tiles slide down over empty cells keeping their order;
    /// the gaps end up at the top.
    pub fn compact(&mut self) {
        for col in 0..self.size {
            let mut write = self.size;
            for row in (0..self.size).rev() {
                let pos = Pos::new(row, col);
                if let Some(kind) = self.get(pos) {
                    write -= 1;
                    if write != row {
                        self.set(Pos::new(write, col), Some(kind));
                        self.set(pos, None);
                    }
                }
            }
        }
    }

    /// Fill every empty cell with a fresh random kind.
    pub fn refill<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for cell in self.cells.iter_mut().filter(|c| c.is_none()) {
            *cell = Some(TileKind::random(rng));
        }
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, Option<TileKind>)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| (Pos::new(i / self.size, i % self.size), *c))
    }
}

/// One line per row, one symbol per tile, `.` for empty.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for col in 0..self.size {
                let c = self.get(Pos::new(row, col)).map_or('.', |k| k.symbol());
                write!(f, "{c}")?;
            }
            if row + 1 < self.size {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Parses the `Display` form. Blank lines and surrounding whitespace are ignored; the
/// board must be square.
impl FromStr for Grid {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let size = rows.len();
        let mut grid = Self::empty(size);
        for (row, line) in rows.iter().enumerate() {
            let chars: Vec<char> = line.chars().collect();
            if chars.len() != size {
                return Err(GameError::ParseGrid(format!(
                    "row {} has {} cells, expected {}",
                    row,
                    chars.len(),
                    size
                )));
            }
            for (col, c) in chars.into_iter().enumerate() {
                let tile = match c {
                    '.' => None,
                    _ => Some(TileKind::from_symbol(c).ok_or_else(|| {
                        GameError::ParseGrid(format!("unknown tile '{}' at ({}, {})", c, row, col))
                    })?),
                };
                grid.set(Pos::new(row, col), tile);
            }
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grid(s: &str) -> Grid {
        s.parse().unwrap()
    }

    #[test]
    fn test_initialize_is_stable_and_full() {
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let g = Grid::initialize(8, &mut rng).unwrap();
            assert!(g.is_full());
            assert!(find_matches(&g).is_empty(), "seed {seed}:\n{g}");
        }
    }

    #[test]
    fn test_swap_and_bounds() {
        let mut g = grid("TYB\nCNW\nTYB");
        g.swap(Pos::new(0, 0), Pos::new(0, 1)).unwrap();
        assert_eq!(g.to_string(), "YTB\nCNW\nTYB");
        let before = g.clone();
        let err = g.swap(Pos::new(0, 0), Pos::new(3, 0)).unwrap_err();
        assert!(matches!(err, GameError::InvalidCoordinate { row: 3, .. }));
        assert_eq!(g, before);
    }

    #[test]
    fn test_clear_reports_removed_kinds() {
        let mut g = grid("TTT\nCNW\nB.B");
        let removed = g.clear(&[Pos::new(0, 0), Pos::new(0, 1), Pos::new(2, 1)]);
        assert_eq!(removed, vec![TileKind::Treat, TileKind::Treat]);
        assert_eq!(g.to_string(), "..T\nCNW\nB.B");
    }

    #[test]
    fn test_compact_keeps_column_order() {
        let mut g = grid("T...\n.Y..\nB.C.\n.W..");
        g.compact();
        assert_eq!(g.to_string(), "....\n....\nTY..\nBWC.");
    }

    #[test]
    fn test_compact_then_refill_fills_board() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut g = grid("T.TB\n....\nY.C.\n.W.N");
        g.compact();
        g.refill(&mut rng);
        assert_eq!(g.size(), 4);
        assert!(g.is_full());
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        assert!(matches!("TY\nT".parse::<Grid>(), Err(GameError::ParseGrid(_))));
        assert!(matches!("TZ\nTY".parse::<Grid>(), Err(GameError::ParseGrid(_))));
    }

    #[test]
    fn test_adjacency() {
        let p = Pos::new(3, 3);
        assert!(p.is_adjacent(Pos::new(2, 3)));
        assert!(p.is_adjacent(Pos::new(3, 4)));
        assert!(!p.is_adjacent(Pos::new(4, 4)));
        assert!(!p.is_adjacent(p));
    }
}
