//! The concurrent radix tree.
//!
//! [`RadixTree`] maps character-sequence keys to values, storing keys in a
//! compressed trie: chains of single-child nodes are collapsed into
//! multi-character edge labels. Lookups, prefix queries and mutations all
//! start with the same downward walk (see [`crate::search`]); mutations
//! then rebuild the affected nodes bottom-up and publish the replacement
//! subtree with a single atomic store.
//!
//! # Concurrency
//!
//! Two modes, selected at construction:
//!
//! - [`ConcurrencyMode::LockFreeReads`] (default): a single writer lock
//!   serializes mutators; readers take no lock at all. A reader that loads
//!   a child slot sees either the full pre-mutation subtree or the full
//!   post-mutation subtree, never a mix within one subtree. Readers that
//!   already descended past a mutation point keep walking the abandoned
//!   subtree, which stays self-consistent until the last reference drops.
//! - [`ConcurrencyMode::RestrictedReads`]: a readers-writer lock; reads
//!   block while a writer holds the lock. Query iterators still observe
//!   snapshots - the read lock covers the walk that seeds the iterator,
//!   not the iteration itself.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::factory::{DefaultNodeFactory, NodeFactory};
use crate::node::Node;
use crate::search::{Classification, SearchResult, search};
use crate::tracing_helpers::trace_log;
use crate::traverse::{Descendants, LazyIterator};

// ============================================================================
//  Errors
// ============================================================================

/// Errors surfaced by tree mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Mutators require a non-empty key.
    EmptyKey,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "the key argument was empty"),
        }
    }
}

impl Error for TreeError {}

// ============================================================================
//  Configuration
// ============================================================================

/// Read-side locking discipline for a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    /// Readers take no lock; writers serialize among themselves.
    #[default]
    LockFreeReads,

    /// Readers share a read lock and block behind writers.
    RestrictedReads,
}

/// Hook applied to accumulated keys leaving a traversal.
///
/// The default is the identity; the reversed-tree wrapper substitutes a
/// reversal so that keys come back out the way they went in.
pub type KeyTransform = fn(String) -> String;

fn identity_transform(key: String) -> String {
    key
}

// ============================================================================
//  RadixTree
// ============================================================================

/// A concurrent map from character sequences to values, with prefix
/// queries.
///
/// Values are stored as `Arc<V>` and handed out by cheap clone, so reads
/// never copy the value itself.
///
/// # Example
///
/// ```rust
/// use contree::RadixTree;
///
/// let tree: RadixTree<u32> = RadixTree::new();
/// tree.put("TEST", 1).unwrap();
/// tree.put("TOAST", 2).unwrap();
/// tree.put("TEAM", 3).unwrap();
///
/// assert_eq!(tree.get_value_for_exact_key("TEST").map(|v| *v), Some(1));
///
/// let keys: Vec<String> = tree.get_keys_starting_with("TE").collect();
/// assert_eq!(keys, vec!["TEAM", "TEST"]);
/// ```
pub struct RadixTree<V, F: NodeFactory = DefaultNodeFactory> {
    /// The root slot. Republished wholesale when a mutation rebuilds the
    /// root; otherwise mutations publish into interior child slots.
    root: ArcSwap<Node<V>>,

    /// Writer serialization, and in restricted mode the read gate too.
    lock: RwLock<()>,

    mode: ConcurrencyMode,

    factory: F,

    key_transform: KeyTransform,
}

impl<V> RadixTree<V> {
    /// Create an empty tree with the default node factory and lock-free
    /// reads.
    #[must_use]
    pub fn new() -> Self {
        Self::with_node_factory(DefaultNodeFactory)
    }

    /// Create an empty tree whose readers block behind writers.
    #[must_use]
    pub fn with_restricted_concurrency() -> Self {
        Self::with_options(
            DefaultNodeFactory,
            ConcurrencyMode::RestrictedReads,
            identity_transform,
        )
    }
}

impl<V> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, F: NodeFactory> RadixTree<V, F> {
    /// Create an empty tree using `factory` to build nodes.
    #[must_use]
    pub fn with_node_factory(factory: F) -> Self {
        Self::with_options(factory, ConcurrencyMode::default(), identity_transform)
    }

    /// Create an empty tree, choosing every option explicitly.
    #[must_use]
    pub fn with_options(factory: F, mode: ConcurrencyMode, key_transform: KeyTransform) -> Self {
        let root: Arc<Node<V>> = factory.create_node("", None, Vec::new(), true);

        Self {
            root: ArcSwap::new(root),
            lock: RwLock::new(()),
            mode,
            factory,
            key_transform,
        }
    }

    /// The current root node.
    ///
    /// Intended for diagnostics (pretty printing, invariant checks); the
    /// returned handle is a snapshot and stays valid after later mutations.
    #[must_use]
    pub fn root_node(&self) -> Arc<Node<V>> {
        self.root.load_full()
    }

    // ------------------------------------------------------------------
    //  Mutators
    // ------------------------------------------------------------------

    /// Associate `value` with `key`, returning the previous value if the
    /// key was already stored.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyKey`] if `key` is empty.
    pub fn put(&self, key: &str, value: V) -> Result<Option<Arc<V>>, TreeError> {
        self.put_value(key, Arc::new(value), false)
    }

    /// Associate `value` with `key` only if the key has no value yet.
    ///
    /// Returns the existing value (and leaves the tree untouched) if one is
    /// present.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyKey`] if `key` is empty.
    pub fn put_if_absent(&self, key: &str, value: V) -> Result<Option<Arc<V>>, TreeError> {
        self.put_value(key, Arc::new(value), true)
    }

    pub(crate) fn put_value(
        &self,
        key: &str,
        value: Arc<V>,
        if_absent: bool,
    ) -> Result<Option<Arc<V>>, TreeError> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }

        let _write = self.lock.write();
        Ok(self.put_locked(key, value, if_absent))
    }

    /// Insert under the writer lock. The four mutation cases, dispatched on
    /// the walk classification.
    fn put_locked(&self, key: &str, value: Arc<V>, if_absent: bool) -> Option<Arc<V>> {
        let root: Arc<Node<V>> = self.root.load_full();
        let result: SearchResult<V> = search(&root, key);

        trace_log!(key, classification = ?result.classification, "put");

        match result.classification {
            Classification::ExactMatch => {
                let existing: Option<Arc<V>> = result.node_found.value().cloned();

                if if_absent && existing.is_some() {
                    return existing;
                }

                let replacement = self.factory.create_node(
                    result.node_found.incoming_edge(),
                    Some(value),
                    result.node_found.child_nodes(),
                    false,
                );

                self.publish(result.parent.as_deref(), replacement);
                existing
            }

            Classification::KeyEndsMidEdge => {
                // The key stops inside this node's edge: split the edge at
                // the boundary and hang the old node below the new one.
                let edge: &str = result.node_found.incoming_edge();
                let common: &str = &edge[..result.bytes_matched_in_node_found];
                let remainder: &str = &edge[result.bytes_matched_in_node_found..];

                let lower = self.factory.create_node(
                    remainder,
                    result.node_found.value().cloned(),
                    result.node_found.child_nodes(),
                    false,
                );

                let split = self.factory.create_node(common, Some(value), vec![lower], false);

                self.publish(result.parent.as_deref(), split);
                None
            }

            Classification::IncompleteCharsInEdge => {
                // Divergence inside the edge: split at the divergence point
                // into a valueless upper node with two children, the rebuilt
                // original and a new leaf for the rest of the key.
                let edge: &str = result.node_found.incoming_edge();
                let common: &str = &edge[..result.bytes_matched_in_node_found];
                let existing_remainder: &str = &edge[result.bytes_matched_in_node_found..];
                let key_remainder: &str = &key[result.bytes_matched..];

                let existing_branch = self.factory.create_node(
                    existing_remainder,
                    result.node_found.value().cloned(),
                    result.node_found.child_nodes(),
                    false,
                );

                let new_leaf =
                    self.factory.create_node(key_remainder, Some(value), Vec::new(), false);

                let mut children: Vec<Arc<Node<V>>> = vec![existing_branch, new_leaf];
                children.sort_by_key(|child| child.first_edge_char());

                let split = self.factory.create_node(common, None, children, false);

                self.publish(result.parent.as_deref(), split);
                None
            }

            Classification::NoSubtree | Classification::MatchRoot => {
                // Append a new leaf below the matched node.
                let key_remainder: &str = &key[result.bytes_matched..];

                let new_leaf =
                    self.factory.create_node(key_remainder, Some(value), Vec::new(), false);

                let mut children: Vec<Arc<Node<V>>> = result.node_found.child_nodes();
                let first: Option<char> = new_leaf.first_edge_char();
                let insert_at: usize = match children
                    .binary_search_by(|child| child.first_edge_char().cmp(&first))
                {
                    Ok(pos) | Err(pos) => pos,
                };
                children.insert(insert_at, new_leaf);

                let is_root: bool = result.parent.is_none();
                let rebuilt = self.factory.create_node(
                    result.node_found.incoming_edge(),
                    result.node_found.value().cloned(),
                    children,
                    is_root,
                );

                self.publish(result.parent.as_deref(), rebuilt);
                None
            }
        }
    }

    /// Remove `key`, returning whether a value was removed.
    ///
    /// Detached or value-stripped nodes are collapsed per the edge
    /// compression invariants: a valueless node is never left with a single
    /// child.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyKey`] if `key` is empty.
    pub fn remove(&self, key: &str) -> Result<bool, TreeError> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }

        let _write = self.lock.write();
        let root: Arc<Node<V>> = self.root.load_full();
        let result: SearchResult<V> = search(&root, key);

        trace_log!(key, classification = ?result.classification, "remove");

        Ok(self.remove_found(&result))
    }

    /// Remove the node a walk found, under the writer lock.
    fn remove_found(&self, result: &SearchResult<V>) -> bool {
        if result.classification != Classification::ExactMatch || !result.node_found.has_value() {
            return false;
        }

        let found: &Arc<Node<V>> = &result.node_found;
        let children: Vec<Arc<Node<V>>> = found.child_nodes();

        if children.len() >= 2 {
            // Still a branch point: just drop the value.
            let rebuilt = self.factory.create_node(
                found.incoming_edge(),
                None,
                children,
                false,
            );

            self.publish(result.parent.as_deref(), rebuilt);
            return true;
        }

        if let [child] = children.as_slice() {
            // Merge the edge into the single child.
            let merged_edge: String =
                format!("{}{}", found.incoming_edge(), child.incoming_edge());
            let merged = self.factory.create_node(
                &merged_edge,
                child.value().cloned(),
                child.child_nodes(),
                false,
            );

            self.publish(result.parent.as_deref(), merged);
            return true;
        }

        // Leaf: detach from the parent. A value-bearing node is never the
        // root, so the parent exists.
        let Some(parent) = result.parent.as_ref() else {
            return false;
        };

        let first: Option<char> = found.first_edge_char();
        let remaining: Vec<Arc<Node<V>>> = parent
            .child_nodes()
            .into_iter()
            .filter(|child| child.first_edge_char() != first)
            .collect();

        let parent_is_root: bool = result.grandparent.is_none();

        if !parent_is_root && !parent.has_value() && remaining.len() == 1 {
            // The parent became a valueless pass-through: collapse it into
            // its remaining child. One step suffices; the grandparent
            // already had a value or two children.
            let sibling: &Arc<Node<V>> = &remaining[0];
            let merged_edge: String =
                format!("{}{}", parent.incoming_edge(), sibling.incoming_edge());
            let merged = self.factory.create_node(
                &merged_edge,
                sibling.value().cloned(),
                sibling.child_nodes(),
                false,
            );

            self.publish(result.grandparent.as_deref(), merged);
        } else {
            let rebuilt = self.factory.create_node(
                parent.incoming_edge(),
                parent.value().cloned(),
                remaining,
                parent_is_root,
            );

            self.publish(result.grandparent.as_deref(), rebuilt);
        }

        true
    }

    /// Publish a rebuilt node into its parent's child slot, or into the
    /// root slot when it has no parent.
    fn publish(&self, parent: Option<&Node<V>>, node: Arc<Node<V>>) {
        match parent {
            Some(parent) => {
                let published: bool = parent.update_child(node);
                debug_assert!(published, "walk result went stale under the writer lock");
            }

            None => self.root.store(node),
        }
    }

    // ------------------------------------------------------------------
    //  Optimistic value replacement (suffix-tree support)
    // ------------------------------------------------------------------

    /// Replace the value at `key` only if the current value is identical
    /// (by pointer) to `expected`; `None` expects the key to be absent.
    ///
    /// Returns whether the replacement was applied. Callers loop: re-read,
    /// rebuild, retry.
    pub(crate) fn compare_and_set_value(
        &self,
        key: &str,
        expected: Option<&Arc<V>>,
        new_value: Arc<V>,
    ) -> Result<bool, TreeError> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }

        let _write = self.lock.write();
        let root: Arc<Node<V>> = self.root.load_full();
        let result: SearchResult<V> = search(&root, key);

        let current: Option<&Arc<V>> = match result.classification {
            Classification::ExactMatch => result.node_found.value(),
            _ => None,
        };

        let unchanged: bool = match (current, expected) {
            (None, None) => true,
            (Some(current), Some(expected)) => Arc::ptr_eq(current, expected),
            _ => false,
        };

        if !unchanged {
            return Ok(false);
        }

        self.put_locked(key, new_value, false);
        Ok(true)
    }

    /// Remove `key` only if its current value is identical (by pointer) to
    /// `expected`.
    pub(crate) fn remove_if_value(&self, key: &str, expected: &Arc<V>) -> Result<bool, TreeError> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }

        let _write = self.lock.write();
        let root: Arc<Node<V>> = self.root.load_full();
        let result: SearchResult<V> = search(&root, key);

        let unchanged: bool = result.classification == Classification::ExactMatch
            && result
                .node_found
                .value()
                .is_some_and(|current| Arc::ptr_eq(current, expected));

        if !unchanged {
            return Ok(false);
        }

        Ok(self.remove_found(&result))
    }

    // ------------------------------------------------------------------
    //  Readers
    // ------------------------------------------------------------------

    /// Look up the value stored for exactly `key`.
    ///
    /// Read-only; any key is accepted (an empty key simply has no value).
    #[must_use]
    pub fn get_value_for_exact_key(&self, key: &str) -> Option<Arc<V>> {
        let _read = self.read_guard();
        let root: Arc<Node<V>> = self.root.load_full();
        let result: SearchResult<V> = search(&root, key);

        match result.classification {
            Classification::ExactMatch => result.node_found.value().cloned(),

            _ => None,
        }
    }

    /// Keys starting with `prefix`, in ascending key order.
    ///
    /// Lazy: the subtree is walked as the iterator is consumed. Results
    /// reflect slot snapshots taken during descent; concurrent mutations in
    /// distant branches may or may not be visible.
    #[must_use]
    pub fn get_keys_starting_with(&self, prefix: &str) -> KeyIter<V> {
        KeyIter {
            inner: LazyIterator::new(self.subtree_matching_prefix(prefix)),
            transform: self.key_transform,
        }
    }

    /// Values of keys starting with `prefix`, in ascending key order.
    #[must_use]
    pub fn get_values_for_keys_starting_with(&self, prefix: &str) -> ValueIter<V> {
        ValueIter {
            inner: LazyIterator::new(self.subtree_matching_prefix(prefix)),
        }
    }

    /// `(key, value)` pairs for keys starting with `prefix`, in ascending
    /// key order.
    #[must_use]
    pub fn get_key_value_pairs_for_keys_starting_with(&self, prefix: &str) -> KeyValuePairIter<V> {
        KeyValuePairIter {
            inner: LazyIterator::new(self.subtree_matching_prefix(prefix)),
            transform: self.key_transform,
        }
    }

    /// Walk `prefix` and seed a traversal of the matching subtree.
    fn subtree_matching_prefix(&self, prefix: &str) -> Descendants<V> {
        let _read = self.read_guard();
        let root: Arc<Node<V>> = self.root.load_full();
        let result: SearchResult<V> = search(&root, prefix);

        match result.classification {
            Classification::ExactMatch => Descendants::new(prefix.to_owned(), result.node_found),

            Classification::KeyEndsMidEdge => {
                // The prefix ends inside this node's edge, so the node's
                // full path is the first candidate key.
                let remainder: &str =
                    &result.node_found.incoming_edge()[result.bytes_matched_in_node_found..];
                let mut key = String::with_capacity(prefix.len() + remainder.len());
                key.push_str(prefix);
                key.push_str(remainder);

                Descendants::new(key, result.node_found)
            }

            _ => Descendants::empty(),
        }
    }

    fn read_guard(&self) -> Option<RwLockReadGuard<'_, ()>> {
        match self.mode {
            ConcurrencyMode::LockFreeReads => None,

            ConcurrencyMode::RestrictedReads => Some(self.lock.read()),
        }
    }
}

impl<V: fmt::Display, F: NodeFactory> RadixTree<V, F> {
    /// Render the tree in the standard ASCII drawing.
    #[must_use]
    pub fn pretty_print(&self) -> String {
        crate::display::pretty_print(&self.root_node())
    }
}

impl<V, F: NodeFactory> fmt::Debug for RadixTree<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadixTree")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<V, F: NodeFactory> Drop for RadixTree<V, F> {
    fn drop(&mut self) {
        // Dismantle iteratively; suffix workloads produce chains as deep as
        // the longest key, which would overflow a recursive drop.
        let mut stack: Vec<Arc<Node<V>>> = vec![self.root.swap(Arc::new(Node::empty_root()))];

        while let Some(node) = stack.pop() {
            if let Ok(owned) = Arc::try_unwrap(node) {
                stack.extend(owned.into_child_arcs());
            }
        }
    }
}

// ============================================================================
//  Query iterators
// ============================================================================

/// A key and its value, as emitted by pair queries.
#[derive(Debug, Clone)]
pub struct KeyValuePair<V> {
    pub key: String,
    pub value: Arc<V>,
}

impl<V: PartialEq> PartialEq for KeyValuePair<V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl<V: Eq> Eq for KeyValuePair<V> {}

impl<V: fmt::Display> fmt::Display for KeyValuePair<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.key, self.value)
    }
}

/// Lazy iterator over stored keys in a matched subtree.
pub struct KeyIter<V> {
    inner: LazyIterator<Descendants<V>>,
    transform: KeyTransform,
}

impl<V> Iterator for KeyIter<V> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let (key, node) = self.inner.next()?;

            if node.has_value() {
                return Some((self.transform)(key));
            }
        }
    }
}

/// Lazy iterator over stored values in a matched subtree.
pub struct ValueIter<V> {
    inner: LazyIterator<Descendants<V>>,
}

impl<V> Iterator for ValueIter<V> {
    type Item = Arc<V>;

    fn next(&mut self) -> Option<Arc<V>> {
        loop {
            let (_, node) = self.inner.next()?;

            if let Some(value) = node.value() {
                return Some(Arc::clone(value));
            }
        }
    }
}

/// Lazy iterator over `(key, value)` pairs in a matched subtree.
pub struct KeyValuePairIter<V> {
    inner: LazyIterator<Descendants<V>>,
    transform: KeyTransform,
}

impl<V> Iterator for KeyValuePairIter<V> {
    type Item = KeyValuePair<V>;

    fn next(&mut self) -> Option<KeyValuePair<V>> {
        loop {
            let (key, node) = self.inner.next()?;

            if let Some(value) = node.value() {
                return Some(KeyValuePair {
                    key: (self.transform)(key),
                    value: Arc::clone(value),
                });
            }
        }
    }
}

// ============================================================================
//  Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn get(tree: &RadixTree<i32>, key: &str) -> Option<i32> {
        tree.get_value_for_exact_key(key).map(|v| *v)
    }

    #[test]
    fn test_put_into_empty_tree() {
        let tree: RadixTree<i32> = RadixTree::new();

        assert_eq!(tree.put("TEST", 1).unwrap(), None);
        assert_eq!(get(&tree, "TEST"), Some(1));
        assert_eq!(tree.pretty_print(), "○\n└── ○ TEST (1)\n");
    }

    #[test]
    fn test_put_splits_edge_on_divergence() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TEST", 1).unwrap();
        tree.put("TEAM", 2).unwrap();

        let expected = "\
○
└── ○ TE
    ├── ○ AM (2)
    └── ○ ST (1)
";
        assert_eq!(tree.pretty_print(), expected);
        assert_eq!(get(&tree, "TEST"), Some(1));
        assert_eq!(get(&tree, "TEAM"), Some(2));
        assert_eq!(get(&tree, "TE"), None);
    }

    #[test]
    fn test_put_three_keys_builds_nested_branches() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TEST", 1).unwrap();
        tree.put("TEAM", 2).unwrap();
        tree.put("TOAST", 3).unwrap();

        let expected = "\
○
└── ○ T
    ├── ○ E
    │   ├── ○ AM (2)
    │   └── ○ ST (1)
    └── ○ OAST (3)
";
        assert_eq!(tree.pretty_print(), expected);
    }

    #[test]
    fn test_put_key_ending_mid_edge_splits_node() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TOAST", 3).unwrap();
        tree.put("TOA", 9).unwrap();

        let expected = "\
○
└── ○ TOA (9)
    └── ○ ST (3)
";
        assert_eq!(tree.pretty_print(), expected);
        assert_eq!(get(&tree, "TOA"), Some(9));
        assert_eq!(get(&tree, "TOAST"), Some(3));
    }

    #[test]
    fn test_put_replaces_and_returns_previous_value() {
        let tree: RadixTree<i32> = RadixTree::new();

        assert_eq!(tree.put("APPLE", 1).unwrap(), None);
        assert_eq!(tree.put("APPLE", 2).unwrap().map(|v| *v), Some(1));
        assert_eq!(get(&tree, "APPLE"), Some(2));
    }

    #[test]
    fn test_put_sets_value_on_existing_branch_node() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TEST", 1).unwrap();
        tree.put("TEAM", 2).unwrap();

        // "TE" exists as a valueless branch node.
        assert_eq!(tree.put("TE", 7).unwrap(), None);
        assert_eq!(get(&tree, "TE"), Some(7));
        assert_eq!(get(&tree, "TEST"), Some(1));
    }

    #[test]
    fn test_put_if_absent_keeps_existing_value() {
        let tree: RadixTree<i32> = RadixTree::new();

        assert_eq!(tree.put_if_absent("K", 1).unwrap(), None);
        assert_eq!(tree.put_if_absent("K", 2).unwrap().map(|v| *v), Some(1));
        assert_eq!(get(&tree, "K"), Some(1));
    }

    #[test]
    fn test_put_if_absent_fills_valueless_branch() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TEST", 1).unwrap();
        tree.put("TEAM", 2).unwrap();

        assert_eq!(tree.put_if_absent("TE", 7).unwrap(), None);
        assert_eq!(get(&tree, "TE"), Some(7));
    }

    #[test]
    fn test_empty_key_rejected_by_mutators() {
        let tree: RadixTree<i32> = RadixTree::new();

        assert_eq!(tree.put("", 1), Err(TreeError::EmptyKey));
        assert_eq!(tree.put_if_absent("", 1), Err(TreeError::EmptyKey));
        assert_eq!(tree.remove(""), Err(TreeError::EmptyKey));
    }

    #[test]
    fn test_get_accepts_empty_key() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("A", 1).unwrap();

        assert_eq!(tree.get_value_for_exact_key(""), None);
    }

    #[test]
    fn test_remove_leaf_merges_lonely_parent() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TEST", 1).unwrap();
        tree.put("TEAM", 2).unwrap();
        tree.put("TOAST", 3).unwrap();

        assert!(tree.remove("TEST").unwrap());

        let expected = "\
○
└── ○ T
    ├── ○ EAM (2)
    └── ○ OAST (3)
";
        assert_eq!(tree.pretty_print(), expected);
        assert_eq!(get(&tree, "TEST"), None);
        assert_eq!(get(&tree, "TEAM"), Some(2));
    }

    #[test]
    fn test_remove_branch_value_keeps_children() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TEST", 1).unwrap();
        tree.put("TEAM", 2).unwrap();
        tree.put("TE", 7).unwrap();

        assert!(tree.remove("TE").unwrap());

        let expected = "\
○
└── ○ TE
    ├── ○ AM (2)
    └── ○ ST (1)
";
        assert_eq!(tree.pretty_print(), expected);
        assert_eq!(get(&tree, "TE"), None);
    }

    #[test]
    fn test_remove_node_with_single_child_merges_edges() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TOA", 9).unwrap();
        tree.put("TOAST", 3).unwrap();

        assert!(tree.remove("TOA").unwrap());

        assert_eq!(tree.pretty_print(), "○\n└── ○ TOAST (3)\n");
        assert_eq!(get(&tree, "TOAST"), Some(3));
    }

    #[test]
    fn test_remove_leaf_keeps_terminal_parent() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TOA", 9).unwrap();
        tree.put("TOAST", 3).unwrap();

        assert!(tree.remove("TOAST").unwrap());

        assert_eq!(tree.pretty_print(), "○\n└── ○ TOA (9)\n");
        assert_eq!(get(&tree, "TOA"), Some(9));
    }

    #[test]
    fn test_remove_missing_or_valueless_key_returns_false() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TEST", 1).unwrap();
        tree.put("TEAM", 2).unwrap();

        assert!(!tree.remove("APPLE").unwrap());
        assert!(!tree.remove("TE").unwrap());
        assert!(!tree.remove("TES").unwrap());
    }

    #[test]
    fn test_remove_last_key_restores_empty_tree() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("SOLO", 1).unwrap();

        assert!(tree.remove("SOLO").unwrap());
        assert_eq!(tree.pretty_print(), "○\n");
    }

    #[test]
    fn test_prefix_query_shapes() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TEST", 1).unwrap();
        tree.put("TEAM", 2).unwrap();
        tree.put("TOAST", 3).unwrap();

        let keys: Vec<String> = tree.get_keys_starting_with("TE").collect();
        assert_eq!(keys, vec!["TEAM", "TEST"]);

        let values: Vec<i32> = tree
            .get_values_for_keys_starting_with("TE")
            .map(|v| *v)
            .collect();
        assert_eq!(values, vec![2, 1]);

        let pairs: Vec<String> = tree
            .get_key_value_pairs_for_keys_starting_with("T")
            .map(|pair| pair.to_string())
            .collect();
        assert_eq!(pairs, vec!["(TEAM, 2)", "(TEST, 1)", "(TOAST, 3)"]);
    }

    #[test]
    fn test_prefix_query_with_prefix_ending_mid_edge() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TOAST", 3).unwrap();

        let keys: Vec<String> = tree.get_keys_starting_with("TO").collect();
        assert_eq!(keys, vec!["TOAST"]);
    }

    #[test]
    fn test_prefix_query_with_empty_prefix_returns_everything() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("B", 2).unwrap();
        tree.put("A", 1).unwrap();
        tree.put("C", 3).unwrap();

        let keys: Vec<String> = tree.get_keys_starting_with("").collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_prefix_query_without_match_is_empty() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("TEST", 1).unwrap();

        assert_eq!(tree.get_keys_starting_with("X").count(), 0);
        assert_eq!(tree.get_keys_starting_with("TESTING").count(), 0);
    }

    #[test]
    fn test_restricted_concurrency_mode_basic_ops() {
        let tree: RadixTree<i32> = RadixTree::with_restricted_concurrency();
        tree.put("TEST", 1).unwrap();

        assert_eq!(get(&tree, "TEST"), Some(1));
        assert!(tree.remove("TEST").unwrap());
        assert_eq!(get(&tree, "TEST"), None);
    }

    #[test]
    fn test_compare_and_set_value_from_absent() {
        let tree: RadixTree<i32> = RadixTree::new();

        assert!(tree.compare_and_set_value("K", None, Arc::new(1)).unwrap());
        assert_eq!(get(&tree, "K"), Some(1));

        // Absent expectation no longer holds.
        assert!(!tree.compare_and_set_value("K", None, Arc::new(2)).unwrap());
        assert_eq!(get(&tree, "K"), Some(1));
    }

    #[test]
    fn test_compare_and_set_value_requires_pointer_identity() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("K", 1).unwrap();

        let current = tree.get_value_for_exact_key("K").unwrap();
        let stranger = Arc::new(1);

        assert!(!tree
            .compare_and_set_value("K", Some(&stranger), Arc::new(2))
            .unwrap());
        assert!(tree
            .compare_and_set_value("K", Some(&current), Arc::new(2))
            .unwrap());
        assert_eq!(get(&tree, "K"), Some(2));
    }

    #[test]
    fn test_remove_if_value_requires_pointer_identity() {
        let tree: RadixTree<i32> = RadixTree::new();
        tree.put("K", 1).unwrap();

        let stranger = Arc::new(1);
        assert!(!tree.remove_if_value("K", &stranger).unwrap());

        let current = tree.get_value_for_exact_key("K").unwrap();
        assert!(tree.remove_if_value("K", &current).unwrap());
        assert_eq!(get(&tree, "K"), None);
    }

    #[test]
    fn test_drop_handles_deep_chains() {
        let tree: RadixTree<i32> = RadixTree::new();

        // A nested chain: every key is a prefix of the next.
        let mut key = String::new();
        for i in 0..2_000i32 {
            key.push(char::from(b'a' + (i % 26) as u8));
            tree.put(&key, i).unwrap();
        }

        drop(tree);
    }
}
