//! The downward prefix walk.
//!
//! Every tree operation starts here: given a key, walk from the root
//! following child edges by first-character match, consuming edge labels
//! greedily until the key runs out or an edge diverges. The walk returns
//! the deepest node reached, the two ancestors above it (mutators republish
//! into ancestor slots), and a classification of where the walk stopped.
//!
//! Matching is char-by-char on Unicode scalar values. Byte offsets are
//! tracked alongside char counts so callers can slice keys and edge labels
//! without re-scanning; divergence points always land on char boundaries.

use std::sync::Arc;

use crate::node::Node;

/// Where a walk stopped, relative to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classification {
    /// The key was consumed exactly at a node boundary.
    ExactMatch,

    /// The key was consumed partway through a node's edge label: the key is
    /// a proper prefix of that node's path, and the edge must be split to
    /// store it.
    KeyEndsMidEdge,

    /// The walk diverged inside an edge label with key characters left
    /// over: the edge must be split and a new branch added.
    IncompleteCharsInEdge,

    /// A node's edge was fully consumed, key characters remain, and no
    /// child starts with the next key character: a new leaf hangs here.
    NoSubtree,

    /// Degenerate form of [`Classification::NoSubtree`] at the root.
    MatchRoot,
}

/// Result of walking a key down from the root.
///
/// All node handles are owned snapshots; a lock-free reader can keep using
/// them after the tree has moved on.
pub(crate) struct SearchResult<V> {
    pub classification: Classification,

    /// Deepest node whose accumulated path is a prefix of the key.
    pub node_found: Arc<Node<V>>,

    /// Parent of `node_found`; `None` when `node_found` is the root.
    pub parent: Option<Arc<Node<V>>>,

    /// Grandparent of `node_found`, for edits that republish the parent.
    pub grandparent: Option<Arc<Node<V>>>,

    /// Key characters consumed before the walk stopped.
    pub chars_matched: usize,

    /// Of `chars_matched`, how many came from `node_found`'s edge label.
    pub chars_matched_in_node_found: usize,

    /// Byte offset into the key corresponding to `chars_matched`.
    pub bytes_matched: usize,

    /// Byte offset into `node_found`'s edge label corresponding to
    /// `chars_matched_in_node_found`.
    pub bytes_matched_in_node_found: usize,
}

/// Walk `key` down from `root`.
pub(crate) fn search<V>(root: &Arc<Node<V>>, key: &str) -> SearchResult<V> {
    let mut current: Arc<Node<V>> = Arc::clone(root);
    let mut parent: Option<Arc<Node<V>>> = None;
    let mut grandparent: Option<Arc<Node<V>>> = None;

    let mut chars_matched: usize = 0;
    let mut bytes_matched: usize = 0;
    let mut chars_in_node: usize = 0;
    let mut bytes_in_node: usize = 0;

    'walk: while bytes_matched < key.len() {
        // bytes_matched is always a char boundary of `key`.
        let next_char: char = match key[bytes_matched..].chars().next() {
            Some(c) => c,
            None => break,
        };

        let Some(child) = current.child_matching(next_char) else {
            break;
        };

        grandparent = parent.take();
        parent = Some(current);
        current = child;
        chars_in_node = 0;
        bytes_in_node = 0;

        for edge_char in current.incoming_edge().chars() {
            if bytes_matched >= key.len() {
                // Key exhausted partway through this edge.
                break 'walk;
            }

            let key_char: char = match key[bytes_matched..].chars().next() {
                Some(c) => c,
                None => break 'walk,
            };

            if edge_char != key_char {
                break 'walk;
            }

            chars_matched += 1;
            chars_in_node += 1;
            bytes_matched += key_char.len_utf8();
            bytes_in_node += edge_char.len_utf8();
        }
    }

    let key_consumed: bool = bytes_matched == key.len();
    let edge_consumed: bool = bytes_in_node == current.incoming_edge().len();

    let classification: Classification = match (key_consumed, edge_consumed) {
        (true, true) => Classification::ExactMatch,

        (true, false) => Classification::KeyEndsMidEdge,

        (false, false) => Classification::IncompleteCharsInEdge,

        (false, true) => {
            if parent.is_none() {
                Classification::MatchRoot
            } else {
                Classification::NoSubtree
            }
        }
    };

    SearchResult {
        classification,
        node_found: current,
        parent,
        grandparent,
        chars_matched,
        chars_matched_in_node_found: chars_in_node,
        bytes_matched,
        bytes_matched_in_node_found: bytes_in_node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{DefaultNodeFactory, NodeFactory};

    /// root -> "T" -> { "EAM"(1), "OAST"(2) }
    fn sample_tree() -> Arc<Node<i32>> {
        let factory = DefaultNodeFactory;
        let team = factory.create_node("EAM", Some(Arc::new(1)), Vec::new(), false);
        let toast = factory.create_node("OAST", Some(Arc::new(2)), Vec::new(), false);
        let t = factory.create_node("T", None, vec![team, toast], false);
        factory.create_node("", None, vec![t], true)
    }

    #[test]
    fn test_exact_match_at_terminal() {
        let root = sample_tree();
        let result = search(&root, "TEAM");

        assert_eq!(result.classification, Classification::ExactMatch);
        assert_eq!(result.node_found.incoming_edge(), "EAM");
        assert_eq!(result.chars_matched, 4);
        assert_eq!(result.chars_matched_in_node_found, 3);
        assert_eq!(result.parent.as_ref().map(|p| p.incoming_edge()), Some("T"));
        assert_eq!(result.grandparent.as_ref().map(|g| g.incoming_edge()), Some(""));
    }

    #[test]
    fn test_exact_match_at_branch_without_value() {
        let root = sample_tree();
        let result = search(&root, "T");

        assert_eq!(result.classification, Classification::ExactMatch);
        assert_eq!(result.node_found.incoming_edge(), "T");
        assert!(!result.node_found.has_value());
    }

    #[test]
    fn test_key_ends_mid_edge() {
        let root = sample_tree();
        let result = search(&root, "TE");

        assert_eq!(result.classification, Classification::KeyEndsMidEdge);
        assert_eq!(result.node_found.incoming_edge(), "EAM");
        assert_eq!(result.chars_matched, 2);
        assert_eq!(result.chars_matched_in_node_found, 1);
    }

    #[test]
    fn test_divergence_inside_edge() {
        let root = sample_tree();
        let result = search(&root, "TEST");

        assert_eq!(result.classification, Classification::IncompleteCharsInEdge);
        assert_eq!(result.node_found.incoming_edge(), "EAM");
        assert_eq!(result.chars_matched, 2);
        assert_eq!(result.chars_matched_in_node_found, 1);
    }

    #[test]
    fn test_no_subtree_below_matched_node() {
        let root = sample_tree();
        let result = search(&root, "TX");

        assert_eq!(result.classification, Classification::NoSubtree);
        assert_eq!(result.node_found.incoming_edge(), "T");
        assert_eq!(result.chars_matched, 1);
    }

    #[test]
    fn test_match_root_when_no_child_matches() {
        let root = sample_tree();
        let result = search(&root, "X");

        assert_eq!(result.classification, Classification::MatchRoot);
        assert!(result.parent.is_none());
        assert_eq!(result.chars_matched, 0);
    }

    #[test]
    fn test_empty_key_is_exact_match_at_root() {
        let root = sample_tree();
        let result = search(&root, "");

        assert_eq!(result.classification, Classification::ExactMatch);
        assert!(result.parent.is_none());
        assert!(!result.node_found.has_value());
    }

    #[test]
    fn test_multibyte_divergence_lands_on_char_boundary() {
        let factory = DefaultNodeFactory;
        let leaf = factory.create_node("née", Some(Arc::new(1)), Vec::new(), false);
        let root = factory.create_node("", None, vec![leaf], true);

        let result = search(&root, "nèe");

        assert_eq!(result.classification, Classification::IncompleteCharsInEdge);
        assert_eq!(result.chars_matched, 1);
        assert_eq!(result.bytes_matched, 1);
        assert!(result.node_found.incoming_edge().is_char_boundary(result.bytes_matched_in_node_found));
    }
}
