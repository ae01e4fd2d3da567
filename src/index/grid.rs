//! Sparse uniform grid.
//!
//! An entry at `(x, y)` lives in cell `(floor(x / step), floor(y / step))`,
//! so a coordinate lying exactly on a cell edge belongs to the cell it starts.
//! Queries visit every cell overlapping the query's bounding square and then
//! filter exactly, which makes boundary points behave inclusively no matter
//! where the cell edges fall. Only occupied cells are stored.

use super::{IndexEntry, IndexKind, SpatialIndex, in_rect, normalize_corners, within_radius};
use geo::Coord;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

type Cell = (i64, i64);

/// Grid index sized for queries of roughly one cell radius.
pub struct GridIndex<T: IndexEntry> {
    step: f64,
    cells: FxHashMap<Cell, SmallVec<[T; 4]>>,
    len: usize,
}

impl<T: IndexEntry> GridIndex<T> {
    const FALLBACK_STEP: f64 = 1.0 / 256.0;

    pub fn new(step: f64) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            log::warn!(
                "invalid grid cell size {}, using {}",
                step,
                Self::FALLBACK_STEP
            );
            Self::FALLBACK_STEP
        };
        Self {
            step,
            cells: FxHashMap::default(),
            len: 0,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell_of(&self, x: f64, y: f64) -> Cell {
        ((x / self.step).floor() as i64, (y / self.step).floor() as i64)
    }

    /// Visit the entries of every occupied cell in the inclusive cell window.
    fn scan<F>(&self, lower_left: Coord, upper_right: Coord, mut visit: F)
    where
        F: FnMut(&T),
    {
        let (x0, y0) = self.cell_of(lower_left.x, lower_left.y);
        let (x1, y1) = self.cell_of(upper_right.x, upper_right.y);
        let window = (x1 as f64 - x0 as f64 + 1.0) * (y1 as f64 - y0 as f64 + 1.0);

        if window > self.cells.len() as f64 {
            for (&(cx, cy), bucket) in &self.cells {
                if (x0..=x1).contains(&cx) && (y0..=y1).contains(&cy) {
                    bucket.iter().for_each(&mut visit);
                }
            }
            return;
        }

        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    bucket.iter().for_each(&mut visit);
                }
            }
        }
    }
}

impl<T: IndexEntry> SpatialIndex<T> for GridIndex<T> {
    fn insert(&mut self, entry: T) {
        let cell = self.cell_of(entry.x(), entry.y());
        self.cells.entry(cell).or_default().push(entry);
        self.len += 1;
    }

    fn delete(&mut self, entry: &T) -> bool {
        let cell = self.cell_of(entry.x(), entry.y());
        let Some(bucket) = self.cells.get_mut(&cell) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|e| e == entry) else {
            return false;
        };
        bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.cells.remove(&cell);
        }
        self.len -= 1;
        true
    }

    fn within(&self, center: Coord, radius: f64) -> Vec<T> {
        let lower_left = Coord {
            x: center.x - radius,
            y: center.y - radius,
        };
        let upper_right = Coord {
            x: center.x + radius,
            y: center.y + radius,
        };
        let mut out = Vec::new();
        self.scan(lower_left, upper_right, |entry| {
            if within_radius(center, entry.x(), entry.y(), radius) {
                out.push(*entry);
            }
        });
        out
    }

    fn range(&self, lower_left: Coord, upper_right: Coord) -> Vec<T> {
        let (lower_left, upper_right) = normalize_corners(lower_left, upper_right);
        let mut out = Vec::new();
        self.scan(lower_left, upper_right, |entry| {
            if in_rect(lower_left, upper_right, entry.x(), entry.y()) {
                out.push(*entry);
            }
        });
        out
    }

    fn len(&self) -> usize {
        self.len
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Grid
    }
}
