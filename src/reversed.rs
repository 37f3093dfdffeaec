//! The reversed-tree layer.
//!
//! [`ReversedTree`] stores keys reversed in an internal [`RadixTree`],
//! turning suffix queries into prefix queries: the keys ending with `q`
//! are exactly the keys whose reversal starts with `reverse(q)`. Keys are
//! reversed once more on the way out (via the tree's key transform hook),
//! so callers only ever see the original orientation.

use std::fmt;
use std::sync::Arc;

use crate::factory::{DefaultNodeFactory, NodeFactory};
use crate::node::Node;
use crate::tree::{
    ConcurrencyMode, KeyIter, KeyValuePair, KeyValuePairIter, RadixTree, TreeError, ValueIter,
};

fn reverse(key: &str) -> String {
    key.chars().rev().collect()
}

/// A map from character sequences to values supporting suffix queries,
/// backed by a radix tree of reversed keys.
///
/// # Example
///
/// ```rust
/// use contree::ReversedTree;
///
/// let tree: ReversedTree<u32> = ReversedTree::new();
/// tree.put("TEST", 1).unwrap();
/// tree.put("TOAST", 2).unwrap();
///
/// // Emission order follows the reversed keys ("TSAOT" < "TSET").
/// let keys: Vec<String> = tree.get_keys_ending_with("ST").collect();
/// assert_eq!(keys, vec!["TOAST", "TEST"]);
/// ```
pub struct ReversedTree<V, F: NodeFactory = DefaultNodeFactory> {
    tree: RadixTree<V, F>,
}

impl<V> ReversedTree<V> {
    /// Create an empty tree with the default node factory and lock-free
    /// reads.
    #[must_use]
    pub fn new() -> Self {
        Self::with_node_factory(DefaultNodeFactory)
    }
}

impl<V> Default for ReversedTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, F: NodeFactory> ReversedTree<V, F> {
    /// Create an empty tree using `factory` to build nodes.
    #[must_use]
    pub fn with_node_factory(factory: F) -> Self {
        Self::with_options(factory, ConcurrencyMode::default())
    }

    /// Create an empty tree, choosing the concurrency mode explicitly.
    #[must_use]
    pub fn with_options(factory: F, mode: ConcurrencyMode) -> Self {
        Self {
            // Undo the ingress reversal on every key leaving a traversal.
            tree: RadixTree::with_options(factory, mode, |key| reverse(&key)),
        }
    }

    /// Associate `value` with `key`, returning the previous value if the
    /// key was already stored.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyKey`] if `key` is empty.
    pub fn put(&self, key: &str, value: V) -> Result<Option<Arc<V>>, TreeError> {
        self.tree.put(&reverse(key), value)
    }

    /// Associate `value` with `key` only if the key has no value yet;
    /// returns the existing value otherwise.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyKey`] if `key` is empty.
    pub fn put_if_absent(&self, key: &str, value: V) -> Result<Option<Arc<V>>, TreeError> {
        self.tree.put_if_absent(&reverse(key), value)
    }

    /// Remove `key`, returning whether a value was removed.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyKey`] if `key` is empty.
    pub fn remove(&self, key: &str) -> Result<bool, TreeError> {
        self.tree.remove(&reverse(key))
    }

    /// Look up the value stored for exactly `key`.
    #[must_use]
    pub fn get_value_for_exact_key(&self, key: &str) -> Option<Arc<V>> {
        self.tree.get_value_for_exact_key(&reverse(key))
    }

    /// Keys ending with `suffix`, in ascending reversed-key order.
    #[must_use]
    pub fn get_keys_ending_with(&self, suffix: &str) -> KeyIter<V> {
        self.tree.get_keys_starting_with(&reverse(suffix))
    }

    /// Values of keys ending with `suffix`.
    #[must_use]
    pub fn get_values_for_keys_ending_with(&self, suffix: &str) -> ValueIter<V> {
        self.tree.get_values_for_keys_starting_with(&reverse(suffix))
    }

    /// `(key, value)` pairs for keys ending with `suffix`.
    #[must_use]
    pub fn get_key_value_pairs_for_keys_ending_with(&self, suffix: &str) -> KeyValuePairIter<V> {
        self.tree
            .get_key_value_pairs_for_keys_starting_with(&reverse(suffix))
    }

    /// The root of the internal reversed-key tree, for diagnostics.
    #[must_use]
    pub fn root_node(&self) -> Arc<Node<V>> {
        self.tree.root_node()
    }
}

impl<V: fmt::Display, F: NodeFactory> ReversedTree<V, F> {
    /// Render the internal reversed-key tree in the standard ASCII drawing.
    #[must_use]
    pub fn pretty_print(&self) -> String {
        self.tree.pretty_print()
    }
}

impl<V, F: NodeFactory> fmt::Debug for ReversedTree<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReversedTree").finish_non_exhaustive()
    }
}
