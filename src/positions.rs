use crate::zobrist;
use std::sync::Arc;

pub type NodeRef = Arc<PositionNode>;

/// An immutable snapshot of the box positions reached by a search, hashable
/// via a Zobrist hash over the (sorted) box squares.
///
/// A node stores either the full sorted box array or just the one-box delta
/// against its parent. Delta nodes save most of the transposition table's
/// memory; reifying the boxes walks the parent chain to the nearest full
/// snapshot.
#[derive(Debug)]
pub struct PositionNode {
    repr: Repr,
    hash: u32,
    backward: bool,
    parent: Option<NodeRef>,
}

#[derive(Debug)]
enum Repr {
    Full(Box<[u16]>),
    Delta { old_box: u16, new_box: u16 },
}

impl PositionNode {
    /// A node holding the full box configuration. The input is sorted here;
    /// duplicate squares are a caller bug.
    pub fn full(mut boxes: Vec<u16>, backward: bool, parent: Option<NodeRef>) -> NodeRef {
        boxes.sort_unstable();
        debug_assert!(
            boxes.windows(2).all(|w| w[0] < w[1]),
            "duplicate box positions"
        );
        let hash = zobrist::hash_of(&boxes);
        Arc::new(PositionNode {
            repr: Repr::Full(boxes.into_boxed_slice()),
            hash,
            backward,
            parent,
        })
    }

    /// A node that stores only the moved box relative to `parent`.
    pub fn delta(old_box: u16, new_box: u16, backward: bool, parent: &NodeRef) -> NodeRef {
        let hash = parent.hash ^ zobrist::key(old_box as usize) ^ zobrist::key(new_box as usize);
        Arc::new(PositionNode {
            repr: Repr::Delta { old_box, new_box },
            hash,
            backward,
            parent: Some(parent.clone()),
        })
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn is_backward(&self) -> bool {
        self.backward
    }

    pub fn parent(&self) -> Option<&NodeRef> {
        self.parent.as_ref()
    }

    pub fn box_count(&self) -> usize {
        let mut node = self;
        loop {
            match &node.repr {
                Repr::Full(boxes) => return boxes.len(),
                Repr::Delta { .. } => {
                    node = node
                        .parent
                        .as_ref()
                        .expect("delta node without a parent");
                }
            }
        }
    }

    /// The sorted box configuration of this node.
    pub fn boxes(&self) -> Vec<u16> {
        let mut out = vec![0; self.box_count()];
        self.fill_boxes(&mut out);
        out
    }

    /// Reify the box configuration into `out` without allocating a fresh
    /// vector per call. `out` must have length `box_count()`.
    pub fn fill_boxes(&self, out: &mut [u16]) {
        let mut deltas: Vec<(u16, u16)> = Vec::new();
        let mut node = self;
        let full = loop {
            match &node.repr {
                Repr::Full(boxes) => break boxes,
                Repr::Delta { old_box, new_box } => {
                    deltas.push((*old_box, *new_box));
                    node = node
                        .parent
                        .as_ref()
                        .expect("delta node without a parent");
                }
            }
        };

        out.copy_from_slice(full);

        // Apply deltas root-first; the working array is only sorted again at
        // the end, so locating the old square is a linear scan.
        for &(old_box, new_box) in deltas.iter().rev() {
            let slot = out
                .iter()
                .position(|&square| square == old_box)
                .expect("delta references a box square missing from its parent");
            out[slot] = new_box;
        }

        out.sort_unstable();
    }
}

// Parent chains can be arbitrarily deep; unlinking them iteratively keeps a
// chain's drop from recursing once the last external reference goes away.
impl Drop for PositionNode {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            match Arc::try_unwrap(node) {
                Ok(mut inner) => parent = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_node_sorts_boxes() {
        let node = PositionNode::full(vec![9, 2, 5], false, None);
        assert_eq!(node.boxes(), vec![2, 5, 9]);
        assert_eq!(node.hash(), zobrist::hash_of(&[2, 5, 9]));
    }

    #[test]
    fn test_delta_reifies_to_full_form() {
        let root = PositionNode::full(vec![2, 5, 9], false, None);
        let child = PositionNode::delta(5, 7, false, &root);

        assert_eq!(child.boxes(), vec![2, 7, 9]);
        assert_eq!(child.hash(), zobrist::hash_of(&[2, 7, 9]));
    }

    #[test]
    fn test_delta_chain_reifies_in_order() {
        let root = PositionNode::full(vec![10, 20, 30], true, None);
        let a = PositionNode::delta(10, 12, true, &root);
        let b = PositionNode::delta(12, 14, true, &a);
        let c = PositionNode::delta(30, 28, true, &b);

        assert_eq!(c.boxes(), vec![14, 20, 28]);
        assert_eq!(c.hash(), zobrist::hash_of(&[14, 20, 28]));
        assert!(c.is_backward());
    }

    #[test]
    fn test_delta_keeps_boxes_sorted_after_crossing() {
        // Moving a box past another must still reify sorted.
        let root = PositionNode::full(vec![5, 6], false, None);
        let child = PositionNode::delta(5, 8, false, &root);
        assert_eq!(child.boxes(), vec![6, 8]);
    }

    #[test]
    fn test_fill_boxes_matches_boxes() {
        let root = PositionNode::full(vec![1, 2, 3, 4], false, None);
        let child = PositionNode::delta(2, 40, false, &root);

        let mut out = vec![0; 4];
        child.fill_boxes(&mut out);
        assert_eq!(out, child.boxes());
    }

    #[test]
    fn test_hash_equal_for_full_and_delta_of_same_state() {
        let root = PositionNode::full(vec![3, 8], false, None);
        let delta = PositionNode::delta(3, 4, false, &root);
        let full = PositionNode::full(vec![4, 8], false, None);

        assert_eq!(delta.hash(), full.hash());
        assert_eq!(delta.boxes(), full.boxes());
    }

    #[test]
    fn test_deep_chain_drops_without_overflow() {
        let mut node = PositionNode::full(vec![0, 1], false, None);
        for i in 0..200_000 {
            let from = if i % 2 == 0 { 0 } else { 100 };
            let to = if i % 2 == 0 { 100 } else { 0 };
            node = PositionNode::delta(from, to, false, &node);
        }
        drop(node);
    }
}
