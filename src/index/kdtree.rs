//! Alternating-axis k-d tree.
//!
//! Nodes live in a flat arena and split on x at the root, then y, then x
//! again. An entry whose key is strictly less than the node's goes left,
//! anything else goes right. Entries sharing a node's exact position are kept
//! in that node's duplicate list; deleting the node's own entry promotes a
//! duplicate or leaves a tombstone that still routes searches. Once
//! tombstones make up more than half of the arena the tree is rebuilt from
//! its live entries.

use super::{IndexEntry, IndexKind, SpatialIndex, in_rect, normalize_corners, within_radius};
use geo::Coord;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    fn key<T: IndexEntry>(self, entry: &T) -> f64 {
        match self {
            Axis::X => entry.x(),
            Axis::Y => entry.y(),
        }
    }

    fn coord_key(self, coord: Coord) -> f64 {
        match self {
            Axis::X => coord.x,
            Axis::Y => coord.y,
        }
    }
}

struct Node<T> {
    entry: T,
    live: bool,
    duplicates: SmallVec<[T; 2]>,
    axis: Axis,
    left: Option<usize>,
    right: Option<usize>,
}

impl<T: IndexEntry> Node<T> {
    fn leaf(entry: T, axis: Axis) -> Self {
        Self {
            entry,
            live: true,
            duplicates: SmallVec::new(),
            axis,
            left: None,
            right: None,
        }
    }

    fn collect_into(&self, out: &mut Vec<T>) {
        if self.live {
            out.push(self.entry);
            out.extend(self.duplicates.iter().copied());
        }
    }
}

type Group<T> = (T, SmallVec<[T; 2]>);

/// k-d tree over projected coordinates.
pub struct KdTree<T: IndexEntry> {
    nodes: Vec<Node<T>>,
    root: Option<usize>,
    len: usize,
    dead: usize,
}

impl<T: IndexEntry> KdTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            len: 0,
            dead: 0,
        }
    }

    /// Number of tree nodes, tombstones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(usize, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((idx, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let node = &self.nodes[idx];
            stack.extend(node.left.map(|l| (l, depth + 1)));
            stack.extend(node.right.map(|r| (r, depth + 1)));
        }
        deepest
    }

    /// Replaces the whole arena with a balanced tree over `entries`.
    fn rebuild(&mut self, entries: Vec<T>) {
        let count = entries.len();
        let mut sorted = entries;
        sorted.sort_by(|a, b| a.x().total_cmp(&b.x()).then(a.y().total_cmp(&b.y())));
        let mut groups: Vec<Group<T>> = Vec::with_capacity(sorted.len());
        for entry in sorted {
            match groups.last_mut() {
                Some((head, duplicates)) if head.same_position(&entry) => duplicates.push(entry),
                _ => groups.push((entry, SmallVec::new())),
            }
        }

        self.nodes = Vec::with_capacity(groups.len());
        self.dead = 0;
        self.root = self.build(&mut groups, Axis::X);
        self.len = count;
    }

    fn reclaim_if_sparse(&mut self) {
        if self.dead * 2 <= self.nodes.len() {
            return;
        }
        let mut live = Vec::with_capacity(self.len);
        for node in &self.nodes {
            node.collect_into(&mut live);
        }
        self.rebuild(live);
    }

    fn push_node(&mut self, node: Node<T>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn build(&mut self, groups: &mut [Group<T>], axis: Axis) -> Option<usize> {
        if groups.is_empty() {
            return None;
        }
        groups.sort_by(|a, b| axis.key(&a.0).total_cmp(&axis.key(&b.0)));
        // equal keys must all land in the right subtree
        let mut mid = groups.len() / 2;
        while mid > 0 && axis.key(&groups[mid - 1].0) == axis.key(&groups[mid].0) {
            mid -= 1;
        }

        let (entry, duplicates) = (groups[mid].0, std::mem::take(&mut groups[mid].1));
        let idx = self.push_node(Node {
            duplicates,
            ..Node::leaf(entry, axis)
        });

        let (left, rest) = groups.split_at_mut(mid);
        let left = self.build(left, axis.next());
        let right = self.build(&mut rest[1..], axis.next());
        self.nodes[idx].left = left;
        self.nodes[idx].right = right;
        Some(idx)
    }
}

impl<T: IndexEntry> Default for KdTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: IndexEntry> SpatialIndex<T> for KdTree<T> {
    fn insert(&mut self, entry: T) {
        self.len += 1;
        let Some(mut idx) = self.root else {
            let root = self.push_node(Node::leaf(entry, Axis::X));
            self.root = Some(root);
            return;
        };

        loop {
            let node = &mut self.nodes[idx];
            if node.entry.same_position(&entry) {
                if node.live {
                    node.duplicates.push(entry);
                } else {
                    node.entry = entry;
                    node.live = true;
                    self.dead -= 1;
                }
                return;
            }

            let axis = node.axis;
            let go_left = axis.key(&entry) < axis.key(&node.entry);
            let next = if go_left { node.left } else { node.right };
            match next {
                Some(child) => idx = child,
                None => {
                    let child = self.push_node(Node::leaf(entry, axis.next()));
                    let node = &mut self.nodes[idx];
                    if go_left {
                        node.left = Some(child);
                    } else {
                        node.right = Some(child);
                    }
                    return;
                }
            }
        }
    }

    /// Builds a balanced tree when the tree is empty, inserts one by one otherwise.
    fn load(&mut self, entries: Vec<T>) {
        if !self.nodes.is_empty() {
            for entry in entries {
                self.insert(entry);
            }
            return;
        }

        self.rebuild(entries);
    }

    fn delete(&mut self, entry: &T) -> bool {
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            let node = &mut self.nodes[idx];
            if node.entry.same_position(entry) {
                if node.live && node.entry == *entry {
                    match node.duplicates.pop() {
                        Some(promoted) => node.entry = promoted,
                        None => {
                            node.live = false;
                            self.dead += 1;
                        }
                    }
                    self.len -= 1;
                    self.reclaim_if_sparse();
                    return true;
                }
                if let Some(pos) = node.duplicates.iter().position(|d| d == entry) {
                    node.duplicates.swap_remove(pos);
                    self.len -= 1;
                    return true;
                }
                return false;
            }
            let axis = node.axis;
            cursor = if axis.key(entry) < axis.key(&node.entry) {
                node.left
            } else {
                node.right
            };
        }
        false
    }

    fn within(&self, center: Coord, radius: f64) -> Vec<T> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if within_radius(center, node.entry.x(), node.entry.y(), radius) {
                node.collect_into(&mut out);
            }

            let split = node.axis.key(&node.entry);
            let c = node.axis.coord_key(center);
            if let Some(left) = node.left
                && c - radius <= split
            {
                stack.push(left);
            }
            if let Some(right) = node.right
                && c + radius >= split
            {
                stack.push(right);
            }
        }
        out
    }

    fn range(&self, lower_left: Coord, upper_right: Coord) -> Vec<T> {
        let (lower_left, upper_right) = normalize_corners(lower_left, upper_right);
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if in_rect(lower_left, upper_right, node.entry.x(), node.entry.y()) {
                node.collect_into(&mut out);
            }

            let split = node.axis.key(&node.entry);
            if let Some(left) = node.left
                && node.axis.coord_key(lower_left) <= split
            {
                stack.push(left);
            }
            if let Some(right) = node.right
                && node.axis.coord_key(upper_right) >= split
            {
                stack.push(right);
            }
        }
        out
    }

    fn len(&self) -> usize {
        self.len
    }

    fn kind(&self) -> IndexKind {
        IndexKind::KdTree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test_support::{Entry, ids};
    use geo::coord;

    #[test]
    fn test_duplicates_are_kept() {
        let mut tree = KdTree::new();
        tree.insert(Entry::new(0.3, 0.3, 1));
        tree.insert(Entry::new(0.3, 0.3, 2));
        tree.insert(Entry::new(0.3, 0.3, 3));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(ids(tree.within(coord! { x: 0.3, y: 0.3 }, 0.0)), vec![1, 2, 3]);
    }

    #[test]
    fn test_delete_promotes_duplicate_then_tombstones() {
        let mut tree = KdTree::new();
        tree.insert(Entry::new(0.5, 0.5, 1));
        tree.insert(Entry::new(0.5, 0.5, 2));
        tree.insert(Entry::new(0.2, 0.7, 3));

        assert!(tree.delete(&Entry::new(0.5, 0.5, 1)));
        assert_eq!(ids(tree.range(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 })), vec![2, 3]);

        assert!(tree.delete(&Entry::new(0.5, 0.5, 2)));
        assert!(!tree.delete(&Entry::new(0.5, 0.5, 2)));
        assert_eq!(tree.len(), 1);
        // the tombstone still routes to the left child
        assert_eq!(ids(tree.within(coord! { x: 0.2, y: 0.7 }, 0.01)), vec![3]);

        tree.insert(Entry::new(0.5, 0.5, 4));
        assert_eq!(tree.node_count(), 2);
        assert_eq!(ids(tree.within(coord! { x: 0.5, y: 0.5 }, 0.0)), vec![4]);
    }

    #[test]
    fn test_equal_keys_go_right() {
        let mut tree = KdTree::new();
        tree.insert(Entry::new(0.5, 0.1, 1));
        tree.insert(Entry::new(0.5, 0.9, 2));
        tree.insert(Entry::new(0.4, 0.9, 3));
        assert!(tree.delete(&Entry::new(0.5, 0.9, 2)));
        assert_eq!(ids(tree.range(coord! { x: 0.5, y: 0.0 }, coord! { x: 0.5, y: 1.0 })), vec![1]);
    }

    #[test]
    fn test_balanced_load() {
        let entries: Vec<Entry> = (0..1023)
            .map(|i| Entry::new((i % 37) as f64 / 37.0, (i / 37) as f64 / 28.0, i))
            .collect();
        let mut tree = KdTree::new();
        tree.load(entries.clone());
        assert_eq!(tree.len(), 1023);
        assert!(tree.depth() <= 20, "depth {}", tree.depth());

        for e in &entries {
            assert!(tree.delete(e), "missing {:?}", e);
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_balanced_load_keeps_duplicates_together() {
        let mut tree = KdTree::new();
        tree.load(vec![
            Entry::new(0.1, 0.1, 1),
            Entry::new(0.5, 0.5, 2),
            Entry::new(0.5, 0.5, 3),
            Entry::new(0.9, 0.2, 4),
        ]);
        assert_eq!(tree.node_count(), 3);
        assert!(tree.delete(&Entry::new(0.5, 0.5, 3)));
        assert!(tree.delete(&Entry::new(0.5, 0.5, 2)));
        assert_eq!(ids(tree.within(coord! { x: 0.5, y: 0.5 }, 0.6)), vec![1, 4]);
    }

    #[test]
    fn test_repeated_moves_reclaim_tombstones() {
        let mut tree = KdTree::new();
        for i in 0..100 {
            tree.insert(Entry::new((i % 10) as f64 / 10.0, (i / 10) as f64 / 10.0, i));
        }
        let mut moving = Entry::new(0.05, 0.05, 100);
        tree.insert(moving);

        for step in 1..=20_000u32 {
            assert!(tree.delete(&moving));
            let t = f64::from(step) / 20_000.0;
            moving = Entry::new(0.05 + 0.9 * t, 0.05 + 0.9 * (1.0 - t), 100);
            tree.insert(moving);
            assert!(tree.node_count() <= 2 * tree.len() + 1, "step {}: {} nodes", step, tree.node_count());
        }

        assert_eq!(tree.len(), 101);
        let all = tree.range(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        assert_eq!(all.len(), 101);
        assert_eq!(ids(tree.within(coord! { x: 0.95, y: 0.05 }, 1e-9)), vec![100]);
    }

    #[test]
    fn test_deleting_everything_empties_the_arena() {
        let mut tree = KdTree::new();
        let entries: Vec<Entry> = (0..50).map(|i| Entry::new(i as f64 / 50.0, 0.5, i)).collect();
        for &e in &entries {
            tree.insert(e);
        }
        for e in &entries {
            assert!(tree.delete(e));
        }
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);

        tree.insert(Entry::new(0.3, 0.3, 7));
        assert_eq!(ids(tree.within(coord! { x: 0.3, y: 0.3 }, 0.0)), vec![7]);
    }
}
