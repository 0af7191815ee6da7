//! Grid Pathfinding
//!
//! A* over a dense walkability grid. Cells are indexed `x + y * width`.
//!
//! ## Search rules
//!
//! - Step cost is the Euclidean step length (1 or √2)
//! - Heuristic: Euclidean with diagonals, Manhattan without
//! - Neighbors: up, right, down, left, then up-left, up-right, down-left,
//!   down-right; a diagonal needs both flanking orthogonal cells walkable
//! - Frontier pops the lowest f-score; equal scores pop in the order cells
//!   first entered the frontier
//! - Closed cells are never reopened
//!
//! "No path" is an empty result, never an error.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f32::consts::SQRT_2;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::rect::{Point, Rect};

/// Grid construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Rows of different lengths.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Offending row
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of the offending row
        found: usize,
    },

    /// Dimensions do not fit in `i32`.
    #[error("grid of {width}x{height} cells is too large")]
    TooLarge {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },

    /// Cell list does not match the stated dimensions.
    #[error("grid of {width}x{height} cells has {found} cell values")]
    CellCount {
        /// Stated width
        width: i32,
        /// Stated height
        height: i32,
        /// Number of cell values supplied
        found: usize,
    },
}

/// Dense walkability grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr")]
pub struct WalkGrid {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

/// Unchecked serialized form of [`WalkGrid`].
#[derive(Deserialize)]
struct GridRepr {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl TryFrom<GridRepr> for WalkGrid {
    type Error = GridError;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        let GridRepr { width, height, cells } = repr;
        let expected = (width >= 0 && height >= 0).then(|| width as usize * height as usize);
        if expected != Some(cells.len()) {
            return Err(GridError::CellCount { width, height, found: cells.len() });
        }
        Ok(Self { width, height, cells })
    }
}

impl WalkGrid {
    /// Create a grid with every cell set to `walkable`.
    ///
    /// Negative dimensions are treated as zero.
    pub fn new(width: i32, height: i32, walkable: bool) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![walkable; width as usize * height as usize],
        }
    }

    /// Build from rows (`rows[y][x]`).
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);

        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(GridError::Ragged {
                row,
                expected: width,
                found: r.len(),
            });
        }

        let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(GridError::TooLarge { width, height });
        };

        Ok(Self {
            width: w,
            height: h,
            cells: rows.concat(),
        })
    }

    /// Build from ASCII art: `#` is blocked, anything else is walkable.
    /// Blank lines are skipped.
    pub fn from_ascii(text: &str) -> Result<Self, GridError> {
        let rows: Vec<Vec<bool>> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().map(|c| c != '#').collect())
            .collect();
        Self::from_rows(&rows)
    }

    /// Width in cells.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Grid bounds as a rectangle at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn index(&self, cell: Point) -> Option<usize> {
        if self.bounds().contains(cell) {
            Some(cell.x as usize + cell.y as usize * self.width as usize)
        } else {
            None
        }
    }

    #[inline]
    fn cell_at(&self, index: usize) -> Point {
        let w = self.width as usize;
        Point::new((index % w) as i32, (index / w) as i32)
    }

    /// Check walkability. Out-of-bounds cells are not walkable.
    #[inline]
    pub fn is_walkable(&self, cell: Point) -> bool {
        self.index(cell).is_some_and(|i| self.cells[i])
    }

    /// Set walkability. Out-of-bounds cells are ignored.
    pub fn set_walkable(&mut self, cell: Point, walkable: bool) {
        if let Some(i) = self.index(cell) {
            self.cells[i] = walkable;
        }
    }

    /// Walkable neighbors in search order.
    fn neighbors(&self, cell: Point, allow_diagonal: bool, out: &mut Vec<Point>) {
        out.clear();
        let up = self.is_walkable(cell.offset(0, -1));
        let right = self.is_walkable(cell.offset(1, 0));
        let down = self.is_walkable(cell.offset(0, 1));
        let left = self.is_walkable(cell.offset(-1, 0));

        if up {
            out.push(cell.offset(0, -1));
        }
        if right {
            out.push(cell.offset(1, 0));
        }
        if down {
            out.push(cell.offset(0, 1));
        }
        if left {
            out.push(cell.offset(-1, 0));
        }

        if allow_diagonal {
            let diagonals = [
                (up && left, cell.offset(-1, -1)),
                (up && right, cell.offset(1, -1)),
                (down && left, cell.offset(-1, 1)),
                (down && right, cell.offset(1, 1)),
            ];
            for (flanks_open, corner) in diagonals {
                if flanks_open && self.is_walkable(corner) {
                    out.push(corner);
                }
            }
        }
    }

    /// Shortest path from `start` to `goal`, both inclusive.
    ///
    /// Returns `[start]` when they coincide and an empty list when either
    /// lies outside the grid or the goal is unreachable. The start cell
    /// itself need not be walkable.
    pub fn find_path(&self, start: Point, goal: Point, allow_diagonal: bool) -> Vec<Point> {
        let (Some(start_idx), Some(goal_idx)) = (self.index(start), self.index(goal)) else {
            debug!(%start, %goal, "Path endpoint outside grid");
            return Vec::new();
        };

        if start_idx == goal_idx {
            return vec![start];
        }

        let heuristic = |cell: Point| -> f32 {
            let dx = (goal.x - cell.x) as f32;
            let dy = (goal.y - cell.y) as f32;
            if allow_diagonal {
                (dx * dx + dy * dy).sqrt()
            } else {
                dx.abs() + dy.abs()
            }
        };

        let n = self.cells.len();
        let mut g_score = vec![f32::INFINITY; n];
        let mut f_score = vec![f32::INFINITY; n];
        let mut came_from: Vec<Option<usize>> = vec![None; n];
        let mut first_seen: Vec<Option<u64>> = vec![None; n];
        let mut closed = vec![false; n];

        let mut open = BinaryHeap::new();
        let mut next_seq = 0u64;

        g_score[start_idx] = 0.0;
        f_score[start_idx] = heuristic(start);
        first_seen[start_idx] = Some(next_seq);
        open.push(Frontier { f: f_score[start_idx], seq: next_seq, index: start_idx });
        next_seq += 1;

        let mut neighbors = Vec::with_capacity(8);
        let mut expanded = 0usize;

        while let Some(Frontier { f, index, .. }) = open.pop() {
            // Superseded entry or already expanded
            if closed[index] || f > f_score[index] {
                continue;
            }

            if index == goal_idx {
                let path = self.reconstruct(&came_from, goal_idx);
                debug!(%start, %goal, len = path.len(), expanded, "Path found");
                return path;
            }

            closed[index] = true;
            expanded += 1;

            let current = self.cell_at(index);
            self.neighbors(current, allow_diagonal, &mut neighbors);

            for &next in &neighbors {
                let Some(next_idx) = self.index(next) else {
                    continue;
                };
                if closed[next_idx] {
                    continue;
                }

                let step = if next.x != current.x && next.y != current.y { SQRT_2 } else { 1.0 };
                let tentative = g_score[index] + step;
                if tentative >= g_score[next_idx] {
                    continue;
                }

                came_from[next_idx] = Some(index);
                g_score[next_idx] = tentative;
                f_score[next_idx] = tentative + heuristic(next);

                let seq = *first_seen[next_idx].get_or_insert_with(|| {
                    next_seq += 1;
                    next_seq - 1
                });
                open.push(Frontier { f: f_score[next_idx], seq, index: next_idx });
            }
        }

        debug!(%start, %goal, expanded, "No path");
        Vec::new()
    }

    fn reconstruct(&self, came_from: &[Option<usize>], goal: usize) -> Vec<Point> {
        let mut path = vec![self.cell_at(goal)];
        let mut current = goal;
        while let Some(prev) = came_from[current] {
            path.push(self.cell_at(prev));
            current = prev;
        }
        path.reverse();
        path
    }
}

/// Frontier entry; `BinaryHeap` is a max-heap, so ordering is reversed.
#[derive(Clone, Copy, Debug)]
struct Frontier {
    f: f32,
    seq: u64,
    index: usize,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.total_cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

// =============================================================================
// TESTS
// =============================================================================
