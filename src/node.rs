//! Tree node representation.
//!
//! A [`Node`] carries the edge label that leads into it, an optional value
//! (a node with a value is a key-terminal), and an ordered list of children.
//! Children are sorted strictly ascending by the first character of their
//! edge labels; no two siblings may share a first character, which is what
//! makes the downward walk deterministic.
//!
//! Nodes are immutable once published, with one exception: each child slot
//! is an [`ArcSwap`] and acts as a publication point. A writer builds a
//! replacement subtree bottom-up and installs it with a single atomic store
//! into the parent's slot. Readers load slots without coordination; any
//! subtree reachable through a loaded slot is internally consistent.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// A single node of a radix tree.
///
/// The root is the only node with an empty edge label and the only node
/// permitted to have no value and fewer than two children.
pub struct Node<V> {
    /// Characters consumed by the edge leading into this node.
    /// Empty for the root, non-empty everywhere else.
    edge: Box<str>,

    /// Storage variant; see [`NodeRepr`].
    repr: NodeRepr<V>,
}

/// Storage variants for a node.
///
/// The variants mirror the observable shapes a node can take. Child lists
/// and values are laid out per variant so a leaf pays nothing for an empty
/// child list. A node with neither a value nor children is only ever the
/// root (an empty `Branch`).
enum NodeRepr<V> {
    /// A key-terminal with no children.
    Leaf {
        value: Arc<V>,
    },

    /// An interior branching node with no value. The root is always this
    /// variant, regardless of child count.
    Branch {
        children: Box<[ArcSwap<Node<V>>]>,
    },

    /// A key-terminal that also branches.
    BranchWithValue {
        value: Arc<V>,
        children: Box<[ArcSwap<Node<V>>]>,
    },
}

impl<V> Node<V> {
    /// Construct a node from its parts.
    ///
    /// Crate-internal: external callers go through a
    /// [`NodeFactory`](crate::factory::NodeFactory), which validates the
    /// sort and edge invariants first.
    pub(crate) fn from_parts(
        edge: Box<str>,
        value: Option<Arc<V>>,
        children: Vec<Arc<Self>>,
    ) -> Self {
        let repr: NodeRepr<V> = match (value, children.is_empty()) {
            (Some(value), true) => NodeRepr::Leaf { value },

            (Some(value), false) => NodeRepr::BranchWithValue {
                value,
                children: children.into_iter().map(ArcSwap::new).collect(),
            },

            (None, _) => NodeRepr::Branch {
                children: children.into_iter().map(ArcSwap::new).collect(),
            },
        };

        Self { edge, repr }
    }

    /// An empty root: empty edge, no value, no children.
    pub(crate) fn empty_root() -> Self {
        Self {
            edge: Box::from(""),
            repr: NodeRepr::Branch {
                children: Vec::new().into_boxed_slice(),
            },
        }
    }

    /// The characters consumed by the edge leading into this node.
    #[inline]
    #[must_use]
    pub fn incoming_edge(&self) -> &str {
        &self.edge
    }

    /// First character of the incoming edge, or `None` for the root.
    #[inline]
    #[must_use]
    pub fn first_edge_char(&self) -> Option<char> {
        self.edge.chars().next()
    }

    /// The value stored at this node, if it is a key-terminal.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&Arc<V>> {
        match &self.repr {
            NodeRepr::Leaf { value } | NodeRepr::BranchWithValue { value, .. } => Some(value),

            NodeRepr::Branch { .. } => None,
        }
    }

    /// Check whether this node is a key-terminal.
    #[inline]
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value().is_some()
    }

    /// Number of outgoing edges.
    #[inline]
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.child_slots().len()
    }

    /// The child slots, sorted ascending by first edge character.
    ///
    /// Slots are publication points: their contents may change between two
    /// loads, but a slot's first edge character never does.
    #[inline]
    pub(crate) fn child_slots(&self) -> &[ArcSwap<Self>] {
        match &self.repr {
            NodeRepr::Leaf { .. } => &[],

            NodeRepr::Branch { children } | NodeRepr::BranchWithValue { children, .. } => children,
        }
    }

    /// Snapshot the current children as owned handles, in sorted order.
    #[must_use]
    pub fn child_nodes(&self) -> Vec<Arc<Self>> {
        self.child_slots().iter().map(ArcSwap::load_full).collect()
    }

    /// Find the child whose edge label starts with `first_char`.
    ///
    /// Binary search over the sorted slots; the sort invariant guarantees at
    /// most one match.
    #[must_use]
    pub fn child_matching(&self, first_char: char) -> Option<Arc<Self>> {
        let slots: &[ArcSwap<Self>] = self.child_slots();

        slots
            .binary_search_by(|slot| {
                // Non-root children always have a non-empty edge.
                let child = slot.load();
                child.first_edge_char().cmp(&Some(first_char))
            })
            .ok()
            .map(|idx| slots[idx].load_full())
    }

    /// Republish `new_child` into the slot holding the child with the same
    /// first edge character.
    ///
    /// This is the atomic store that makes a rebuilt subtree reachable.
    /// Returns `false` if no slot matches (the caller's walk is stale, which
    /// cannot happen while the writer lock is held).
    pub(crate) fn update_child(&self, new_child: Arc<Self>) -> bool {
        let Some(first_char) = new_child.first_edge_char() else {
            return false;
        };

        let slots: &[ArcSwap<Self>] = self.child_slots();

        match slots.binary_search_by(|slot| {
            let child = slot.load();
            child.first_edge_char().cmp(&Some(first_char))
        }) {
            Ok(idx) => {
                slots[idx].store(new_child);
                true
            }

            Err(_) => false,
        }
    }

    /// Consume the node and return its child handles.
    ///
    /// Used by the iterative tree teardown to dismantle deep chains without
    /// recursing.
    pub(crate) fn into_child_arcs(self) -> Vec<Arc<Self>> {
        match self.repr {
            NodeRepr::Leaf { .. } => Vec::new(),

            NodeRepr::Branch { children } | NodeRepr::BranchWithValue { children, .. } => {
                children.into_vec().into_iter().map(ArcSwap::into_inner).collect()
            }
        }
    }
}

impl<V> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("edge", &self.edge)
            .field("has_value", &self.has_value())
            .field("children", &self.child_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(edge: &str, value: i32) -> Arc<Node<i32>> {
        Arc::new(Node::from_parts(Box::from(edge), Some(Arc::new(value)), Vec::new()))
    }

    fn branch(edge: &str, children: Vec<Arc<Node<i32>>>) -> Arc<Node<i32>> {
        Arc::new(Node::from_parts(Box::from(edge), None, children))
    }

    #[test]
    fn test_leaf_accessors() {
        let node = leaf("AM", 7);

        assert_eq!(node.incoming_edge(), "AM");
        assert_eq!(node.first_edge_char(), Some('A'));
        assert_eq!(node.value().map(|v| **v), Some(7));
        assert_eq!(node.child_count(), 0);
        assert!(node.child_nodes().is_empty());
    }

    #[test]
    fn test_branch_has_no_value() {
        let node = branch("T", vec![leaf("EAM", 1), leaf("OAST", 2)]);

        assert!(!node.has_value());
        assert_eq!(node.child_count(), 2);
    }

    #[test]
    fn test_child_matching_finds_unique_child() {
        let node = branch("", vec![leaf("APPLE", 1), leaf("BANANA", 2), leaf("CHERRY", 3)]);

        let hit = node.child_matching('B').expect("child with B");
        assert_eq!(hit.incoming_edge(), "BANANA");

        assert!(node.child_matching('D').is_none());
    }

    #[test]
    fn test_update_child_preserves_slot_order() {
        let node = branch("", vec![leaf("APPLE", 1), leaf("BANANA", 2)]);

        let replacement = leaf("BANDANA", 9);
        assert!(node.update_child(replacement));

        let hit = node.child_matching('B').expect("child with B");
        assert_eq!(hit.incoming_edge(), "BANDANA");
        assert_eq!(hit.value().map(|v| **v), Some(9));

        // The sibling slot is untouched.
        let other = node.child_matching('A').expect("child with A");
        assert_eq!(other.incoming_edge(), "APPLE");
    }

    #[test]
    fn test_update_child_rejects_unknown_first_char() {
        let node = branch("", vec![leaf("APPLE", 1)]);

        assert!(!node.update_child(leaf("ZEBRA", 9)));
    }

    #[test]
    fn test_empty_root_shape() {
        let root: Node<i32> = Node::empty_root();

        assert_eq!(root.incoming_edge(), "");
        assert_eq!(root.first_edge_char(), None);
        assert!(!root.has_value());
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn test_into_child_arcs_returns_children() {
        let node = Node::from_parts(
            Box::from("T"),
            None,
            vec![leaf("EAM", 1), leaf("OAST", 2)],
        );

        let children = node.into_child_arcs();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].incoming_edge(), "EAM");
        assert_eq!(children[1].incoming_edge(), "OAST");
    }
}
