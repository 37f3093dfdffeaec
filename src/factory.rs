//! Node construction.
//!
//! Trees never build [`Node`]s directly: every node is produced by a
//! [`NodeFactory`], which receives the exact attributes the node must honor
//! and may specialize storage for them. The default factory validates the
//! structural invariants and picks a storage variant; alternative factories
//! can substitute compact label representations or size-specialized child
//! lists without touching the tree algorithms.

use std::sync::Arc;

use crate::node::Node;

/// Produces tree nodes on demand.
///
/// Implementations must return a node honoring the attributes exactly:
/// `edge` as the incoming edge label, `value` as the stored value, and
/// `children` in the given order. The tree always supplies children sorted
/// strictly ascending by first edge character.
///
/// # Panics
///
/// Implementations are expected to panic when handed attributes that
/// violate the structural invariants (an empty non-root edge, unsorted
/// children). Such a fault propagates to the mutating caller before any
/// change is published, so the tree stays consistent.
pub trait NodeFactory {
    /// Create a node with the given attributes.
    fn create_node<V>(
        &self,
        edge: &str,
        value: Option<Arc<V>>,
        children: Vec<Arc<Node<V>>>,
        is_root: bool,
    ) -> Arc<Node<V>>;
}

/// The standard [`NodeFactory`].
///
/// Validates the edge and child-sort invariants, then selects a storage
/// variant from the attributes (leaf, branch, or value-bearing branch).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeFactory;

impl NodeFactory for DefaultNodeFactory {
    fn create_node<V>(
        &self,
        edge: &str,
        value: Option<Arc<V>>,
        children: Vec<Arc<Node<V>>>,
        is_root: bool,
    ) -> Arc<Node<V>> {
        assert!(
            is_root || !edge.is_empty(),
            "only the root may have an empty edge label"
        );

        for child in &children {
            assert!(
                child.first_edge_char().is_some(),
                "child nodes must have non-empty edge labels"
            );
        }

        // Children must be strictly ascending by first edge character;
        // equal first characters would make the walk ambiguous.
        for pair in children.windows(2) {
            let left = pair[0].first_edge_char();
            let right = pair[1].first_edge_char();

            assert!(
                left < right,
                "children must be sorted strictly ascending by first edge char: {left:?} vs {right:?}"
            );
        }

        Arc::new(Node::from_parts(Box::from(edge), value, children))
    }
}
