use super::{Cluster, ClusterKey};
use crate::error::{ClusterError, Result};
use std::ops::{Index, IndexMut};

/// Owner of every node in a hierarchy.
///
/// Freed slots are not reused, so a stale key can never alias a newer node.
/// Indexing a freed key is a programming error and panics.
#[derive(Debug)]
pub struct ClusterArena {
    slots: Vec<Option<Cluster>>,
    live: usize,
    limit: usize,
}

impl Default for ClusterArena {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            limit: usize::MAX,
        }
    }
}

impl ClusterArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// An arena that hands out at most `limit` keys.
    #[cfg(test)]
    pub(crate) fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Store `cluster` under a fresh key.
    ///
    /// Fails once every `u32` key has been handed out.
    pub fn alloc(&mut self, cluster: Cluster) -> Result<ClusterKey> {
        let used = self.slots.len();
        let index = u32::try_from(used)
            .ok()
            .filter(|_| used < self.limit)
            .ok_or(ClusterError::CapacityExceeded(used))?;
        self.slots.push(Some(cluster));
        self.live += 1;
        Ok(ClusterKey(index))
    }

    pub fn free(&mut self, key: ClusterKey) -> Option<Cluster> {
        let cluster = self.slots.get_mut(key.index())?.take();
        if cluster.is_some() {
            self.live -= 1;
        }
        cluster
    }

    pub fn get(&self, key: ClusterKey) -> Option<&Cluster> {
        self.slots.get(key.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, key: ClusterKey) -> Option<&mut Cluster> {
        self.slots.get_mut(key.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, key: ClusterKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClusterKey, &Cluster)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (ClusterKey(i as u32), c)))
    }

    /// Make `child` a child of `parent`, updating both sides.
    pub fn link(&mut self, parent: ClusterKey, child: ClusterKey) {
        self[child].parent = Some(parent);
        self[parent].children.push(child);
    }

    /// Remove `child` from `parent`'s children and clear its parent.
    ///
    /// Returns whether `child` was a child of `parent`.
    pub fn unlink(&mut self, parent: ClusterKey, child: ClusterKey) -> bool {
        let node = &mut self[parent];
        let Some(pos) = node.children.iter().position(|&c| c == child) else {
            return false;
        };
        node.children.remove(pos);
        if node.advocator_child == Some(child) {
            node.advocator_child = None;
        }
        if self[child].parent == Some(parent) {
            self[child].parent = None;
        }
        true
    }

    /// Ancestors of `key`, nearest first.
    pub fn ancestors(&self, key: ClusterKey) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            next: self.get(key).and_then(|c| c.parent),
        }
    }
}

impl Index<ClusterKey> for ClusterArena {
    type Output = Cluster;

    fn index(&self, key: ClusterKey) -> &Cluster {
        match self.get(key) {
            Some(cluster) => cluster,
            None => panic!("cluster {:?} used after it was freed", key),
        }
    }
}

impl IndexMut<ClusterKey> for ClusterArena {
    fn index_mut(&mut self, key: ClusterKey) -> &mut Cluster {
        match self.get_mut(key) {
            Some(cluster) => cluster,
            None => panic!("cluster {:?} used after it was freed", key),
        }
    }
}

pub struct Ancestors<'a> {
    arena: &'a ClusterArena,
    next: Option<ClusterKey>,
}

impl Iterator for Ancestors<'_> {
    type Item = ClusterKey;

    fn next(&mut self) -> Option<ClusterKey> {
        let key = self.next?;
        self.next = self.arena.get(key).and_then(|c| c.parent);
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_unlink() {
        let mut arena = ClusterArena::new();
        let child = arena.alloc(Cluster::point(0.1, 0.1, 0, 3)).unwrap();
        let node = Cluster::parent_of(child, &arena[child]);
        let parent = arena.alloc(node).unwrap();
        arena[child].parent = Some(parent);
        let node = Cluster::parent_of(parent, &arena[parent]);
        let grand = arena.alloc(node).unwrap();
        arena[parent].parent = Some(grand);

        assert_eq!(arena.ancestors(child).collect::<Vec<_>>(), vec![parent, grand]);

        assert!(arena.unlink(parent, child));
        assert!(arena[parent].children.is_empty());
        assert_eq!(arena[parent].advocator_child, None);
        assert_eq!(arena[child].parent, None);
        assert!(!arena.unlink(parent, child));

        arena.link(parent, child);
        assert_eq!(arena[parent].children, vec![child]);
    }

    #[test]
    fn test_freed_slots_are_not_reused() {
        let mut arena = ClusterArena::new();
        let a = arena.alloc(Cluster::point(0.1, 0.1, 0, 3)).unwrap();
        assert!(arena.free(a).is_some());
        assert!(arena.free(a).is_none());
        let b = arena.alloc(Cluster::point(0.2, 0.2, 1, 3)).unwrap();
        assert_ne!(a, b);
        assert!(!arena.contains(a));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    #[should_panic(expected = "used after it was freed")]
    fn test_stale_key_panics() {
        let mut arena = ClusterArena::new();
        let a = arena.alloc(Cluster::point(0.1, 0.1, 0, 3)).unwrap();
        arena.free(a);
        let _ = arena[a].x;
    }

    #[test]
    fn test_alloc_fails_when_keys_run_out() {
        let mut arena = ClusterArena::with_limit(2);
        let a = arena.alloc(Cluster::point(0.1, 0.1, 0, 3)).unwrap();
        arena.alloc(Cluster::point(0.2, 0.2, 1, 3)).unwrap();
        arena.free(a);

        let err = arena.alloc(Cluster::point(0.3, 0.3, 2, 3)).unwrap_err();
        assert!(matches!(err, ClusterError::CapacityExceeded(2)));
        assert_eq!(arena.len(), 1);
    }
}
