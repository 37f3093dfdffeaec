//! # Contree
//!
//! Concurrent in-memory associative containers keyed by character
//! sequences:
//!
//! - [`RadixTree`] - a compressed radix tree (space-efficient trie) mapping
//!   keys to values, with prefix queries.
//! - [`SuffixTree`] - indexes every suffix of every key, adding
//!   ends-with and substring queries.
//! - [`ReversedTree`] - stores keys reversed, adding ends-with queries
//!   without the space cost of a suffix index.
//!
//! ## Design
//!
//! All three share one core: an immutable-node radix tree whose child
//! slots are atomic `Arc` cells. Writers serialize on a tree-wide lock,
//! rebuild the affected nodes bottom-up (copy-on-write), and publish the
//! replacement with a single atomic store. Readers never lock: they load
//! child slots and keep `Arc` handles, so every subtree they reach stays
//! alive and internally consistent even while writers move the tree on.
//!
//! Readers that raced a writer may observe the pre-mutation state; query
//! iterators may mix tree versions across distant branches. That weak
//! consistency is the contract - per-subtree consistency is guaranteed,
//! cross-tree snapshots are not.
//!
//! ## Example
//!
//! ```rust
//! use contree::SuffixTree;
//!
//! let index: SuffixTree<u64> = SuffixTree::new();
//! index.put("BANANA", 1).unwrap();
//! index.put("BANDANA", 2).unwrap();
//!
//! let hits: Vec<_> = index.get_keys_containing("ANAN").collect();
//! assert_eq!(&*hits[0], "BANANA");
//! ```

pub mod display;
pub mod factory;
pub mod node;
pub mod reversed;
pub mod suffix;
pub mod traverse;
pub mod tree;

mod search;
mod tracing_helpers;

pub use factory::{DefaultNodeFactory, NodeFactory};
pub use node::Node;
pub use reversed::ReversedTree;
pub use suffix::{KeySet, KeySetFactory, OriginalKeys, SuffixTree};
pub use traverse::{ComputeNext, CursorError, LazyIterator, ProducerError};
pub use tree::{
    ConcurrencyMode, KeyIter, KeyTransform, KeyValuePair, KeyValuePairIter, RadixTree, TreeError,
    ValueIter,
};
