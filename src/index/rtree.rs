//! R*-tree index backed by `rstar`.

use super::{IndexEntry, IndexKind, SpatialIndex, in_rect, normalize_corners, within_radius};
use geo::Coord;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

#[derive(Clone, Copy, PartialEq)]
struct Slot<T>(T);

impl<T: IndexEntry> RTreeObject for Slot<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.0.x(), self.0.y()])
    }
}

impl<T: IndexEntry> PointDistance for Slot<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.0.x() - point[0];
        let dy = self.0.y() - point[1];
        dx * dx + dy * dy
    }
}

pub struct RTreeIndex<T: IndexEntry> {
    tree: RTree<Slot<T>>,
}

impl<T: IndexEntry> RTreeIndex<T> {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }
}

impl<T: IndexEntry> Default for RTreeIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: IndexEntry> SpatialIndex<T> for RTreeIndex<T> {
    fn insert(&mut self, entry: T) {
        self.tree.insert(Slot(entry));
    }

    fn load(&mut self, entries: Vec<T>) {
        if self.tree.size() == 0 {
            self.tree = RTree::bulk_load(entries.into_iter().map(Slot).collect());
        } else {
            for entry in entries {
                self.tree.insert(Slot(entry));
            }
        }
    }

    fn delete(&mut self, entry: &T) -> bool {
        self.tree.remove(&Slot(*entry)).is_some()
    }

    fn within(&self, center: Coord, radius: f64) -> Vec<T> {
        self.tree
            .locate_within_distance([center.x, center.y], radius * radius)
            .filter(|slot| within_radius(center, slot.0.x(), slot.0.y(), radius))
            .map(|slot| slot.0)
            .collect()
    }

    fn range(&self, lower_left: Coord, upper_right: Coord) -> Vec<T> {
        let (lower_left, upper_right) = normalize_corners(lower_left, upper_right);
        let envelope = AABB::from_corners(
            [lower_left.x, lower_left.y],
            [upper_right.x, upper_right.y],
        );
        self.tree
            .locate_in_envelope(&envelope)
            .filter(|slot| in_rect(lower_left, upper_right, slot.0.x(), slot.0.y()))
            .map(|slot| slot.0)
            .collect()
    }

    fn len(&self) -> usize {
        self.tree.size()
    }

    fn kind(&self) -> IndexKind {
        IndexKind::RTree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test_support::{Entry, ids};
    use geo::coord;

    #[test]
    fn test_bulk_load_then_update() {
        let mut index = RTreeIndex::new();
        index.load(vec![
            Entry::new(0.1, 0.1, 1),
            Entry::new(0.2, 0.2, 2),
            Entry::new(0.2, 0.2, 3),
        ]);
        index.insert(Entry::new(0.8, 0.8, 4));
        assert_eq!(index.len(), 4);

        assert!(index.delete(&Entry::new(0.2, 0.2, 2)));
        assert_eq!(ids(index.within(coord! { x: 0.2, y: 0.2 }, 0.15)), vec![1, 3]);
        assert_eq!(
            ids(index.range(coord! { x: 0.5, y: 0.5 }, coord! { x: 1.0, y: 1.0 })),
            vec![4]
        );
    }
}
