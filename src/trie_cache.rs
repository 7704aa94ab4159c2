/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! In-memory, reference-counted cache of state-trie nodes.
//!
//! # Why reference counting
//!
//! Consecutive state roots share the overwhelming majority of their trie nodes. Keeping the most
//! recent *W* roots resolvable therefore cannot be done by keeping *W* disjoint node sets;
//! instead the cache is an arena of nodes keyed by content hash, each carrying a count of how
//! many pinned roots reference it. Pinning a new root increments the counts of its nodes;
//! dereferencing a root decrements them, and nodes reaching zero are evicted.
//!
//! Eviction timing is a correctness-relevant policy (it decides which historical states remain
//! answerable), not just a memory optimization, so the counts are explicit and owned here rather
//! than delegated to ambient garbage collection.
//!
//! # Who drives the cache
//!
//! The [insertion engine](crate::chain_store) commits the node set of every newly canonical
//! block and dereferences exactly the root that falls out the trailing edge of the retention
//! window each time the window advances by one.

use std::collections::HashMap;

use crate::engine::TrieNode;
use crate::types::data_types::CryptoHash;

struct NodeEntry {
    blob: Vec<u8>,
    refs: u32,
}

/// Arena of reference-counted trie nodes, pinned per owning state root.
pub struct TrieNodeCache {
    nodes: HashMap<CryptoHash, NodeEntry>,
    roots: HashMap<CryptoHash, Vec<CryptoHash>>,
}

impl TrieNodeCache {
    /// Create an empty cache.
    pub fn new() -> TrieNodeCache {
        TrieNodeCache {
            nodes: HashMap::new(),
            roots: HashMap::new(),
        }
    }

    /// Pin `root`'s node set, incrementing reference counts for nodes shared with roots already
    /// pinned.
    ///
    /// Committing a root that is already pinned is a no-op: a reorg that re-canonicalizes a
    /// block must not double-count its nodes.
    pub fn commit(&mut self, root: CryptoHash, nodes: Vec<TrieNode>) {
        if self.roots.contains_key(&root) {
            return;
        }

        let mut pinned = Vec::with_capacity(nodes.len());
        for node in nodes {
            pinned.push(node.hash);
            self.nodes
                .entry(node.hash)
                .and_modify(|entry| entry.refs += 1)
                .or_insert(NodeEntry {
                    blob: node.blob,
                    refs: 1,
                });
        }
        self.roots.insert(root, pinned);
    }

    /// Unpin `root`, decrementing the reference counts of its node set. Any node reaching zero
    /// references across all pinned roots is evicted.
    ///
    /// Dereferencing a root that is not pinned is a no-op.
    pub fn dereference(&mut self, root: &CryptoHash) {
        let pinned = match self.roots.remove(root) {
            Some(pinned) => pinned,
            None => return,
        };
        for hash in pinned {
            if let Some(entry) = self.nodes.get_mut(&hash) {
                entry.refs -= 1;
                if entry.refs == 0 {
                    self.nodes.remove(&hash);
                }
            }
        }
    }

    /// Is `root` currently pinned in this cache?
    pub fn contains(&self, root: &CryptoHash) -> bool {
        self.roots.contains_key(root)
    }

    /// Get the blob of the node identified by `hash`, if any pinned root references it.
    pub fn node(&self, hash: &CryptoHash) -> Option<&[u8]> {
        self.nodes.get(hash).map(|entry| entry.blob.as_slice())
    }

    /// The node set pinned under `root`, resolved back to owned nodes. Used to flush a root's
    /// generation to the live store on shutdown.
    pub fn nodes_of(&self, root: &CryptoHash) -> Option<Vec<TrieNode>> {
        let pinned = self.roots.get(root)?;
        Some(
            pinned
                .iter()
                .filter_map(|hash| {
                    self.nodes.get(hash).map(|entry| TrieNode {
                        hash: *hash,
                        blob: entry.blob.clone(),
                    })
                })
                .collect(),
        )
    }

    /// How many roots are currently pinned.
    pub fn pinned_roots(&self) -> usize {
        self.roots.len()
    }

    /// How many distinct nodes are currently held.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(tag: u8) -> TrieNode {
        TrieNode {
            hash: CryptoHash::new([tag; 32]),
            blob: vec![tag],
        }
    }

    #[test]
    fn shared_nodes_survive_dereference_of_one_owner() {
        let mut cache = TrieNodeCache::new();
        let root_a = CryptoHash::new([1; 32]);
        let root_b = CryptoHash::new([2; 32]);

        cache.commit(root_a, vec![node(1), node(10)]);
        cache.commit(root_b, vec![node(2), node(10)]);
        assert_eq!(cache.node_count(), 3);

        cache.dereference(&root_a);
        assert!(!cache.contains(&root_a));
        assert!(cache.contains(&root_b));
        // The shared node is still referenced by root_b.
        assert!(cache.node(&CryptoHash::new([10; 32])).is_some());
        assert!(cache.node(&CryptoHash::new([1; 32])).is_none());

        cache.dereference(&root_b);
        assert_eq!(cache.node_count(), 0);
    }

    #[test]
    fn recommitting_a_pinned_root_does_not_double_count() {
        let mut cache = TrieNodeCache::new();
        let root = CryptoHash::new([1; 32]);

        cache.commit(root, vec![node(1)]);
        cache.commit(root, vec![node(1)]);

        cache.dereference(&root);
        assert_eq!(cache.node_count(), 0);
        assert!(!cache.contains(&root));
    }
}
