use crate::positions::NodeRef;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Key wrapper: hashes by the node's Zobrist hash, compares by the reified
/// box configuration. The `backward` flag is not part of the key: a forward
/// and a backward position with equal boxes are the same key, which is
/// exactly the meet condition.
#[derive(Debug, Clone)]
struct TableKey(NodeRef);

impl Hash for TableKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.0.hash());
    }
}

impl PartialEq for TableKey {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        if self.0.hash() != other.0.hash() {
            return false;
        }
        self.0.boxes() == other.0.boxes()
    }
}

impl Eq for TableKey {}

/// Concurrent mapping from board position to the first stored instance.
/// Deduplicates positions within a search direction and detects meets
/// between the forward and backward searches.
pub struct TranspositionTable {
    map: DashMap<TableKey, NodeRef, ahash::RandomState>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        TranspositionTable {
            map: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Atomically insert `node` if no equal position is stored yet.
    /// Returns `None` on insertion, or the already-stored instance (which may
    /// have the opposite `backward` flag).
    pub fn put_if_absent(&self, node: &NodeRef) -> Option<NodeRef> {
        match self.map.entry(TableKey(node.clone())) {
            Entry::Occupied(entry) => Some(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(node.clone());
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
