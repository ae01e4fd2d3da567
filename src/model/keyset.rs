use super::ClusterKey;
use rustc_hash::FxHashMap;

/// Insertion-ordered set of keys with O(1) insert, remove and lookup.
///
/// Removal swaps the last key into the hole, so iteration order depends only
/// on the sequence of operations.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    order: Vec<ClusterKey>,
    positions: FxHashMap<ClusterKey, usize>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the key was already present.
    pub fn insert(&mut self, key: ClusterKey) -> bool {
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key, self.order.len());
        self.order.push(key);
        true
    }

    pub fn remove(&mut self, key: ClusterKey) -> bool {
        let Some(pos) = self.positions.remove(&key) else {
            return false;
        };
        self.order.swap_remove(pos);
        if let Some(&moved) = self.order.get(pos) {
            self.positions.insert(moved, pos);
        }
        true
    }

    pub fn contains(&self, key: ClusterKey) -> bool {
        self.positions.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ClusterKey> + '_ {
        self.order.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ClusterKey> {
        self.order.clone()
    }

    /// Empty the set, returning its keys in order.
    pub fn take(&mut self) -> Vec<ClusterKey> {
        self.positions.clear();
        std::mem::take(&mut self.order)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut set = KeySet::new();
        for i in 0..5 {
            assert!(set.insert(ClusterKey(i)));
        }
        assert!(!set.insert(ClusterKey(2)));
        assert!(set.remove(ClusterKey(1)));
        assert!(!set.remove(ClusterKey(1)));
        assert_eq!(set.to_vec(), vec![ClusterKey(0), ClusterKey(4), ClusterKey(2), ClusterKey(3)]);
        assert!(set.remove(ClusterKey(3)));
        assert!(set.contains(ClusterKey(4)));
        assert_eq!(set.len(), 3);
        assert_eq!(set.take().len(), 3);
        assert!(set.is_empty());
    }
}
