//! Spatial indexes over the projected plane.
//!
//! Every zoom level keeps its entries in one of three interchangeable
//! implementations behind [`SpatialIndex`]. All of them answer radius and
//! rectangle queries exactly and inclusively, keep co-located entries side by
//! side, and share one distance predicate so that identical insert sequences
//! produce identical result sets.

pub mod grid;
pub mod kdtree;
pub mod rtree;

pub use grid::GridIndex;
pub use geocluster_types::IndexKind;
pub use kdtree::KdTree;
pub use rtree::RTreeIndex;

use geo::Coord;

/// A value stored in a spatial index.
///
/// Equality identifies the entry for deletion; the coordinates must not change
/// while the entry is indexed.
pub trait IndexEntry: Copy + PartialEq + Send + Sync + 'static {
    fn x(&self) -> f64;
    fn y(&self) -> f64;

    fn coord(&self) -> Coord {
        Coord {
            x: self.x(),
            y: self.y(),
        }
    }

    fn same_position(&self, other: &Self) -> bool {
        self.x() == other.x() && self.y() == other.y()
    }
}

/// Radius and rectangle queries over [`IndexEntry`] values.
pub trait SpatialIndex<T: IndexEntry>: Send + Sync {
    fn insert(&mut self, entry: T);

    /// Bulk insert.
    fn load(&mut self, entries: Vec<T>) {
        for entry in entries {
            self.insert(entry);
        }
    }

    /// Remove one entry equal to `entry`. Returns whether it was found.
    fn delete(&mut self, entry: &T) -> bool;

    /// Every entry whose distance to `center` is at most `radius`.
    fn within(&self, center: Coord, radius: f64) -> Vec<T>;

    /// Every entry inside the inclusive rectangle spanned by the two corners.
    fn range(&self, lower_left: Coord, upper_right: Coord) -> Vec<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> IndexKind;
}

/// Shared radius predicate.
#[inline]
pub fn within_radius(center: Coord, x: f64, y: f64, radius: f64) -> bool {
    let dx = x - center.x;
    let dy = y - center.y;
    dx * dx + dy * dy <= radius * radius
}

/// Shared inclusive rectangle predicate.
#[inline]
pub fn in_rect(lower_left: Coord, upper_right: Coord, x: f64, y: f64) -> bool {
    x >= lower_left.x && x <= upper_right.x && y >= lower_left.y && y <= upper_right.y
}

/// Order corners so that `lower_left <= upper_right` on both axes.
pub(crate) fn normalize_corners(a: Coord, b: Coord) -> (Coord, Coord) {
    (
        Coord {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
        },
        Coord {
            x: a.x.max(b.x),
            y: a.y.max(b.y),
        },
    )
}

/// Create an empty index of the given kind.
///
/// `cell_size` sizes the grid cells and is ignored by the tree indexes. It is
/// normally the radius the level is queried with.
pub fn create_index<T: IndexEntry>(kind: IndexKind, cell_size: f64) -> Box<dyn SpatialIndex<T>> {
    match kind {
        IndexKind::KdTree => Box::new(KdTree::new()),
        IndexKind::Grid => Box::new(GridIndex::new(cell_size)),
        IndexKind::RTree => Box::new(RTreeIndex::new()),
    }
}
