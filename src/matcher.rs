//! Match detection: runs of three or more identical tiles, merged across directions.

use crate::grid::{Grid, Pos};
use crate::tile::TileKind;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

/// Disjoint set of same-kind cells cleared together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup {
    pub kind: TileKind,
    /// Unique cells in the order they were claimed.
    pub cells: Vec<Pos>,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Row,
    Column,
}

/// Straight runs of at least `MIN_RUN` tiles: all rows left to right, then all columns top
/// to bottom. The cursor skips past each run, so runs on one line never overlap.
fn find_runs(grid: &Grid) -> Vec<(TileKind, Vec<Pos>)> {
    let n = grid.size();
    let mut runs = Vec::new();
    for axis in [Axis::Row, Axis::Column] {
        for line in 0..n {
            let at = |i: usize| match axis {
                Axis::Row => Pos::new(line, i),
                Axis::Column => Pos::new(i, line),
            };
            let mut i = 0;
            while i + MIN_RUN <= n {
                let Some(kind) = grid.get(at(i)) else {
                    i += 1;
                    continue;
                };
                let mut end = i + 1;
                while end < n && grid.get(at(end)) == Some(kind) {
                    end += 1;
                }
                if end - i >= MIN_RUN {
                    runs.push((kind, (i..end).map(at).collect()));
                    i = end;
                } else {
                    i += 1;
                }
            }
        }
    }
    runs
}

/// All match groups on the board, in discovery order (row runs first).
///
/// A run that shares cells with groups found earlier is folded into the earliest of them,
/// together with any other group it touches, so an L, T or cross shape comes out as one
/// group. Every cell belongs to at most one group. Same board, same output.
pub fn find_matches(grid: &Grid) -> Vec<MatchGroup> {
    let n = grid.size();
    let mut groups: Vec<MatchGroup> = Vec::new();
    let mut owner: Vec<Option<usize>> = vec![None; n * n];
    let slot = |p: Pos| p.row * n + p.col;

    for (kind, cells) in find_runs(grid) {
        let mut touched: Vec<usize> = cells.iter().filter_map(|p| owner[slot(*p)]).collect();
        touched.sort_unstable();
        touched.dedup();

        let target = match touched.first() {
            Some(&first) => first,
            None => {
                groups.push(MatchGroup {
                    kind,
                    cells: Vec::with_capacity(cells.len()),
                });
                groups.len() - 1
            }
        };
        for &other in touched.iter().skip(1) {
            let moved = std::mem::take(&mut groups[other].cells);
            for p in &moved {
                owner[slot(*p)] = Some(target);
            }
            groups[target].cells.extend(moved);
        }
        for p in cells {
            if owner[slot(p)].is_none() {
                owner[slot(p)] = Some(target);
                groups[target].cells.push(p);
            }
        }
    }

    groups.retain(|g| !g.is_empty());
    groups
}

/// True if the board has no match anywhere.
pub fn is_stable(grid: &Grid) -> bool {
    find_runs(grid).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(s: &str) -> Grid {
        s.parse().unwrap()
    }

    fn p(row: usize, col: usize) -> Pos {
        Pos::new(row, col)
    }

    #[test]
    fn test_no_matches_on_checkerboard() {
        let g = grid("TYTY\nYTYT\nTYTY\nYTYT");
        assert!(find_matches(&g).is_empty());
        assert!(is_stable(&g));
    }

    #[test]
    fn test_horizontal_run_of_four() {
        let g = grid("BTTTT\nYCYCY\nCYCYC\nYCYCY\nNWNWN");
        let groups = find_matches(&g);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, TileKind::Treat);
        assert_eq!(groups[0].cells, vec![p(0, 1), p(0, 2), p(0, 3), p(0, 4)]);
    }

    #[test]
    fn test_l_shape_merges_into_one_group_of_five() {
        let g = grid("TTTY\nTYBC\nTBCY\nYCYB");
        let groups = find_matches(&g);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 5);
        assert_eq!(
            groups[0].cells,
            vec![p(0, 0), p(0, 1), p(0, 2), p(1, 0), p(2, 0)]
        );
    }

    #[test]
    fn test_t_shape_merges() {
        let g = grid("CTTTC\nYBTBY\nBYTYB\nYBYBY\nNWNWN");
        let groups = find_matches(&g);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 5);
    }

    #[test]
    fn test_column_joining_two_rows_becomes_one_group() {
        let g = grid("TTTY\nTYBC\nTTTB\nYCYN");
        let groups = find_matches(&g);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 7);
        let mut cells = groups[0].cells.clone();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 7);
    }

    #[test]
    fn test_separate_groups_keep_discovery_order() {
        let g = grid("TTTY\nYBCB\nCCNB\nWYWB");
        let groups = find_matches(&g);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, TileKind::Treat);
        assert_eq!(groups[1].kind, TileKind::Brush);
        assert_eq!(groups[1].cells, vec![p(1, 3), p(2, 3), p(3, 3)]);
    }

    #[test]
    fn test_empty_cells_never_match() {
        let g = grid("...Y\nTYBC\n.BCY\nYCYB");
        assert!(find_matches(&g).is_empty());
    }

    #[test]
    fn test_detection_is_deterministic() {
        let g = grid("TTTY\nTYBC\nTTTB\nYCYN");
        assert_eq!(find_matches(&g), find_matches(&g));
    }
}
