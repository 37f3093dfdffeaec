//! The suffix tree layer.
//!
//! [`SuffixTree`] indexes every suffix of every inserted key in an internal
//! [`RadixTree`] whose values are *originals sets*: the set of full keys
//! that contain the suffix. This turns suffix and substring matching into
//! prefix queries - a key ends with `q` iff one of its suffixes equals `q`
//! extended, and contains `q` iff one of its suffixes starts with `q`.
//!
//! Values are not stored in the radix tree at all; they live in a
//! concurrent map keyed by the exact original key, which doubles as the
//! originals set used to detect duplicate puts and to drive removal. A key
//! enters that map only after all of its suffixes are indexed, so a
//! concurrent reader can observe a key in a suffix set whose value is not
//! yet published; value queries drop such keys instead of surfacing an
//! absent value.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dashmap::{DashMap, Entry};

use crate::factory::{DefaultNodeFactory, NodeFactory};
use crate::node::Node;
use crate::tracing_helpers::trace_log;
use crate::tree::{ConcurrencyMode, KeyValuePair, RadixTree, TreeError};

// ============================================================================
//  Originals sets
// ============================================================================

/// Set semantics for the originals stored at each suffix.
///
/// Sets are immutable snapshots: mutation goes through [`with_key`] /
/// [`without_key`], which produce a new set of the same kind, and the tree
/// republishes the snapshot with a compare-and-set. Immutability is what
/// lets readers iterate a set without coordination.
///
/// [`with_key`]: OriginalKeys::with_key
/// [`without_key`]: OriginalKeys::without_key
pub trait OriginalKeys: fmt::Debug + Send + Sync {
    fn contains(&self, key: &str) -> bool;

    fn len(&self) -> usize;

    /// The keys, in this set kind's iteration order.
    fn keys(&self) -> Box<dyn Iterator<Item = Arc<str>> + '_>;

    /// A new set of the same kind with `key` added.
    fn with_key(&self, key: Arc<str>) -> Box<dyn OriginalKeys>;

    /// A new set of the same kind with `key` removed.
    fn without_key(&self, key: &str) -> Box<dyn OriginalKeys>;
}

/// The originals set stored as a radix-tree value.
///
/// Thin owner around an [`OriginalKeys`] implementation; displays as the
/// bracketed key list used by the pretty printer, e.g. `[BANANA, BANDANA]`.
#[derive(Debug)]
pub struct KeySet {
    inner: Box<dyn OriginalKeys>,
}

impl KeySet {
    /// An empty hash-backed set (the production default).
    ///
    /// Iteration order is unspecified.
    #[must_use]
    pub fn hashed() -> Self {
        Self {
            inner: Box::new(HashedKeys(HashSet::new())),
        }
    }

    /// An empty set that iterates in insertion order.
    ///
    /// Slower than [`KeySet::hashed`], but deterministic; used by tests
    /// that compare printed trees.
    #[must_use]
    pub fn insertion_ordered() -> Self {
        Self {
            inner: Box::new(InsertionOrderedKeys(Vec::new())),
        }
    }

    /// Wrap a custom [`OriginalKeys`] implementation.
    #[must_use]
    pub fn from_impl(inner: Box<dyn OriginalKeys>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    pub fn keys(&self) -> Box<dyn Iterator<Item = Arc<str>> + '_> {
        self.inner.keys()
    }

    #[must_use]
    pub fn with_key(&self, key: Arc<str>) -> Self {
        Self {
            inner: self.inner.with_key(key),
        }
    }

    #[must_use]
    pub fn without_key(&self, key: &str) -> Self {
        Self {
            inner: self.inner.without_key(key),
        }
    }
}

impl fmt::Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;

        for (index, key) in self.keys().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}")?;
        }

        write!(f, "]")
    }
}

#[derive(Debug, Clone)]
struct HashedKeys(HashSet<Arc<str>>);

impl OriginalKeys for HashedKeys {
    fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn keys(&self) -> Box<dyn Iterator<Item = Arc<str>> + '_> {
        Box::new(self.0.iter().cloned())
    }

    fn with_key(&self, key: Arc<str>) -> Box<dyn OriginalKeys> {
        let mut keys = self.0.clone();
        keys.insert(key);
        Box::new(Self(keys))
    }

    fn without_key(&self, key: &str) -> Box<dyn OriginalKeys> {
        let mut keys = self.0.clone();
        keys.remove(key);
        Box::new(Self(keys))
    }
}

#[derive(Debug, Clone)]
struct InsertionOrderedKeys(Vec<Arc<str>>);

impl OriginalKeys for InsertionOrderedKeys {
    fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|stored| &**stored == key)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn keys(&self) -> Box<dyn Iterator<Item = Arc<str>> + '_> {
        Box::new(self.0.iter().cloned())
    }

    fn with_key(&self, key: Arc<str>) -> Box<dyn OriginalKeys> {
        if self.contains(&key) {
            return Box::new(self.clone());
        }

        let mut keys = self.0.clone();
        keys.push(key);
        Box::new(Self(keys))
    }

    fn without_key(&self, key: &str) -> Box<dyn OriginalKeys> {
        let keys = self
            .0
            .iter()
            .filter(|stored| &***stored != key)
            .cloned()
            .collect();
        Box::new(Self(keys))
    }
}

/// Hook producing fresh originals sets; see [`SuffixTree::with_options`].
pub type KeySetFactory = fn() -> KeySet;

// ============================================================================
//  SuffixTree
// ============================================================================

/// A map from character sequences to values supporting suffix and
/// substring queries.
///
/// # Example
///
/// ```rust
/// use contree::SuffixTree;
///
/// let tree: SuffixTree<u32> = SuffixTree::new();
/// tree.put("BANANA", 1).unwrap();
/// tree.put("BANDANA", 2).unwrap();
///
/// let mut keys: Vec<_> = tree.get_keys_ending_with("ANA").collect();
/// keys.sort();
/// assert_eq!(keys.len(), 2);
///
/// let containing: Vec<_> = tree.get_keys_containing("ANAN").collect();
/// assert_eq!(&*containing[0], "BANANA");
/// ```
pub struct SuffixTree<V, F: NodeFactory = DefaultNodeFactory> {
    /// Suffix index: every suffix of every original key, mapped to the set
    /// of originals containing it.
    radix: RadixTree<KeySet, F>,

    /// Values keyed by exact original key. Key presence here is the
    /// originals set; insertion happens after suffix indexing.
    values: DashMap<Arc<str>, Arc<V>>,

    create_set_for_original_keys: KeySetFactory,
}

impl<V> SuffixTree<V> {
    /// Create an empty suffix tree with the default node factory,
    /// lock-free reads, and hash-backed originals sets.
    #[must_use]
    pub fn new() -> Self {
        Self::with_node_factory(DefaultNodeFactory)
    }
}

impl<V> Default for SuffixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, F: NodeFactory> SuffixTree<V, F> {
    /// Create an empty suffix tree using `factory` to build nodes.
    #[must_use]
    pub fn with_node_factory(factory: F) -> Self {
        Self::with_options(factory, ConcurrencyMode::default(), KeySet::hashed)
    }

    /// Create an empty suffix tree, choosing every option explicitly.
    ///
    /// `create_set_for_original_keys` produces the empty originals sets;
    /// substituting [`KeySet::insertion_ordered`] gives tests a
    /// deterministic iteration order.
    #[must_use]
    pub fn with_options(
        factory: F,
        mode: ConcurrencyMode,
        create_set_for_original_keys: KeySetFactory,
    ) -> Self {
        Self {
            radix: RadixTree::with_options(factory, mode, |key| key),
            values: DashMap::new(),
            create_set_for_original_keys,
        }
    }

    /// The root of the internal suffix index, for diagnostics.
    #[must_use]
    pub fn root_node(&self) -> Arc<Node<KeySet>> {
        self.radix.root_node()
    }

    /// Render the internal suffix index in the standard ASCII drawing.
    #[must_use]
    pub fn pretty_print(&self) -> String {
        self.radix.pretty_print()
    }

    // ------------------------------------------------------------------
    //  Mutators
    // ------------------------------------------------------------------

    /// Associate `value` with `key`, returning the previous value if the
    /// key was already stored.
    ///
    /// A repeated put only swaps the value; the suffixes of `key` are
    /// already indexed and are left alone.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyKey`] if `key` is empty.
    pub fn put(&self, key: &str, value: V) -> Result<Option<Arc<V>>, TreeError> {
        self.put_value(key, Arc::new(value), false)
    }

    /// Associate `value` with `key` only if the key has no value yet;
    /// returns the existing value otherwise.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyKey`] if `key` is empty.
    pub fn put_if_absent(&self, key: &str, value: V) -> Result<Option<Arc<V>>, TreeError> {
        self.put_value(key, Arc::new(value), true)
    }

    fn put_value(
        &self,
        key: &str,
        value: Arc<V>,
        if_absent: bool,
    ) -> Result<Option<Arc<V>>, TreeError> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }

        if let Some(existing) = self.get_value_for_exact_key(key) {
            if if_absent {
                return Ok(Some(existing));
            }

            // Known key: swap the value without touching the suffix index.
            return Ok(self.values.insert(Arc::from(key), value));
        }

        let key_arc: Arc<str> = Arc::from(key);

        for suffix in suffixes(key) {
            self.add_to_suffix_set(suffix, &key_arc)?;
        }

        // Publish into the originals map last, so queries never surface a
        // key whose suffixes are only partially indexed.
        if if_absent {
            match self.values.entry(key_arc) {
                Entry::Occupied(entry) => Ok(Some(Arc::clone(entry.get()))),

                Entry::Vacant(slot) => {
                    slot.insert(value);
                    Ok(None)
                }
            }
        } else {
            Ok(self.values.insert(key_arc, value))
        }
    }

    /// Remove `key` and drop it from every suffix entry; suffix entries
    /// left empty disappear from the index.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyKey`] if `key` is empty.
    pub fn remove(&self, key: &str) -> Result<bool, TreeError> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }

        if !self.values.contains_key(key) {
            return Ok(false);
        }

        for suffix in suffixes(key) {
            self.remove_from_suffix_set(suffix, key)?;
        }

        self.values.remove(key);
        Ok(true)
    }

    /// Add `key` to the originals set stored at `suffix`, installing the
    /// grown set with a compare-and-set and retrying on contention.
    fn add_to_suffix_set(&self, suffix: &str, key: &Arc<str>) -> Result<(), TreeError> {
        loop {
            match self.radix.get_value_for_exact_key(suffix) {
                Some(current) => {
                    if current.contains(key) {
                        return Ok(());
                    }

                    let grown = Arc::new(current.with_key(Arc::clone(key)));

                    if self.radix.compare_and_set_value(suffix, Some(&current), grown)? {
                        return Ok(());
                    }
                }

                None => {
                    let fresh =
                        Arc::new((self.create_set_for_original_keys)().with_key(Arc::clone(key)));

                    if self.radix.compare_and_set_value(suffix, None, fresh)? {
                        return Ok(());
                    }
                }
            }

            trace_log!(suffix, "originals set raced, retrying");
        }
    }

    /// Drop `key` from the originals set stored at `suffix`; an emptied set
    /// removes the suffix entry entirely.
    fn remove_from_suffix_set(&self, suffix: &str, key: &str) -> Result<(), TreeError> {
        loop {
            let Some(current) = self.radix.get_value_for_exact_key(suffix) else {
                return Ok(());
            };

            if !current.contains(key) {
                return Ok(());
            }

            let shrunk: KeySet = current.without_key(key);

            if shrunk.is_empty() {
                if self.radix.remove_if_value(suffix, &current)? {
                    return Ok(());
                }
            } else if self
                .radix
                .compare_and_set_value(suffix, Some(&current), Arc::new(shrunk))?
            {
                return Ok(());
            }

            trace_log!(suffix, "originals set raced, retrying");
        }
    }

    // ------------------------------------------------------------------
    //  Readers
    // ------------------------------------------------------------------

    /// Look up the value stored for exactly `key`.
    #[must_use]
    pub fn get_value_for_exact_key(&self, key: &str) -> Option<Arc<V>> {
        self.values.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Keys ending with `suffix`.
    ///
    /// A key ends with `suffix` exactly when `suffix` is one of its
    /// indexed suffixes, so this is the originals set stored at precisely
    /// `suffix` - no subtree walk. The empty suffix matches nothing; this
    /// is deliberately asymmetric with [`get_keys_containing`], where the
    /// empty fragment matches every stored key.
    ///
    /// [`get_keys_containing`]: Self::get_keys_containing
    pub fn get_keys_ending_with<'a>(
        &'a self,
        suffix: &str,
    ) -> Box<dyn Iterator<Item = Arc<str>> + 'a> {
        if suffix.is_empty() {
            return Box::new(std::iter::empty());
        }

        match self.radix.get_value_for_exact_key(suffix) {
            Some(set) => Box::new(set.keys().collect::<Vec<Arc<str>>>().into_iter()),

            None => Box::new(std::iter::empty()),
        }
    }

    /// Keys containing `fragment` as a substring.
    pub fn get_keys_containing<'a>(
        &'a self,
        fragment: &str,
    ) -> Box<dyn Iterator<Item = Arc<str>> + 'a> {
        if fragment.is_empty() {
            return Box::new(self.values.iter().map(|entry| Arc::clone(entry.key())));
        }

        self.keys_in_suffix_subtree(fragment)
    }

    /// Values of keys ending with `suffix`.
    ///
    /// A key can be visible in a suffix set before its value is published
    /// to the originals map; such keys are dropped rather than surfaced
    /// with an absent value.
    pub fn get_values_for_keys_ending_with<'a>(
        &'a self,
        suffix: &str,
    ) -> Box<dyn Iterator<Item = Arc<V>> + 'a> {
        let keys = self.get_keys_ending_with(suffix);
        Box::new(keys.filter_map(move |key| self.get_value_for_exact_key(&key)))
    }

    /// `(key, value)` pairs for keys ending with `suffix`.
    pub fn get_key_value_pairs_for_keys_ending_with<'a>(
        &'a self,
        suffix: &str,
    ) -> Box<dyn Iterator<Item = KeyValuePair<V>> + 'a> {
        let keys = self.get_keys_ending_with(suffix);
        Box::new(keys.filter_map(move |key| {
            let value = self.get_value_for_exact_key(&key);
            add_pair_if_present(&key, value)
        }))
    }

    /// Values of keys containing `fragment`.
    ///
    /// Keys whose value is not yet published are dropped, as in
    /// [`get_values_for_keys_ending_with`].
    ///
    /// [`get_values_for_keys_ending_with`]: Self::get_values_for_keys_ending_with
    pub fn get_values_for_keys_containing<'a>(
        &'a self,
        fragment: &str,
    ) -> Box<dyn Iterator<Item = Arc<V>> + 'a> {
        let keys = self.get_keys_containing(fragment);
        Box::new(keys.filter_map(move |key| self.get_value_for_exact_key(&key)))
    }

    /// `(key, value)` pairs for keys containing `fragment`.
    pub fn get_key_value_pairs_for_keys_containing<'a>(
        &'a self,
        fragment: &str,
    ) -> Box<dyn Iterator<Item = KeyValuePair<V>> + 'a> {
        let keys = self.get_keys_containing(fragment);
        Box::new(keys.filter_map(move |key| {
            let value = self.get_value_for_exact_key(&key);
            add_pair_if_present(&key, value)
        }))
    }

    /// Union of the originals sets in the subtree rooted at `prefix`,
    /// deduplicated, in traversal order.
    ///
    /// The iterator owns its snapshots, so it outlives the borrow of the
    /// tree that seeded it.
    fn keys_in_suffix_subtree(&self, prefix: &str) -> Box<dyn Iterator<Item = Arc<str>>> {
        let mut seen: HashSet<Arc<str>> = HashSet::new();

        Box::new(
            self.radix
                .get_values_for_keys_starting_with(prefix)
                .flat_map(|set| set.keys().collect::<Vec<Arc<str>>>())
                .filter(move |key| seen.insert(Arc::clone(key))),
        )
    }
}

impl<V, F: NodeFactory> fmt::Debug for SuffixTree<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuffixTree")
            .field("originals", &self.values.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
//  Null guard
// ============================================================================

/// Build a `(key, value)` pair only if the value is present.
///
/// A key becomes visible in a suffix set before its value is published to
/// the originals map; pair queries use this guard to drop the key for that
/// window rather than surface an absent value.
fn add_pair_if_present<V>(key: &Arc<str>, value: Option<Arc<V>>) -> Option<KeyValuePair<V>> {
    value.map(|value| KeyValuePair {
        key: String::from(&**key),
        value,
    })
}

/// Every non-empty suffix of `key`, longest first.
fn suffixes(key: &str) -> impl Iterator<Item = &str> {
    key.char_indices().map(|(start, _)| &key[start..])
}

// ============================================================================
//  Tests
// ============================================================================
