//! Lazy traversal.
//!
//! All query shapes are built on two pieces:
//!
//! - [`LazyIterator`], a polling cursor over a [`ComputeNext`] producer.
//!   The producer is only invoked when an element is demanded; repeated
//!   `has_next` calls without an intervening `next` are idempotent, a
//!   producer fault poisons the cursor, and `remove` is never supported.
//! - [`Descendants`], a producer emitting `(accumulated key, node)` pairs
//!   in pre-order for a subtree, using an explicit work stack so traversal
//!   depth never touches the call stack.
//!
//! Traversal observes a per-frame snapshot of each child slot at the moment
//! it descends. Under concurrent mutation the emitted sequence may mix tree
//! versions across distant branches; each individual subtree is consistent.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::node::Node;

/// Error raised by a producer while computing the next element.
pub type ProducerError = Box<dyn Error + Send + Sync + 'static>;

/// Errors surfaced by [`LazyIterator`].
#[derive(Debug)]
pub enum CursorError {
    /// `next` was called past end-of-data.
    NoSuchElement,

    /// The cursor was polled again after a producer fault poisoned it.
    IllegalState,

    /// `remove` is not supported by traversal cursors.
    UnsupportedOperation,

    /// The producer failed; the cursor is now poisoned.
    Producer(ProducerError),
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchElement => write!(f, "no more elements"),

            Self::IllegalState => write!(f, "cursor poisoned by an earlier producer fault"),

            Self::UnsupportedOperation => write!(f, "traversal cursors do not support removal"),

            Self::Producer(source) => write!(f, "producer fault: {source}"),
        }
    }
}

impl Error for CursorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Producer(source) => Some(source.as_ref()),

            _ => None,
        }
    }
}

/// A pull-based element producer.
///
/// `compute_next` returns `Ok(Some(item))` for each element, `Ok(None)` at
/// end-of-data, or `Err` on a fault. After returning `Ok(None)` or `Err`
/// the producer is not polled again.
pub trait ComputeNext {
    type Item;

    fn compute_next(&mut self) -> Result<Option<Self::Item>, ProducerError>;
}

/// Cursor state between polls.
enum CursorState<T> {
    /// No element computed yet; the producer must be polled.
    NotReady,

    /// An element was computed by `has_next` and awaits `next`.
    Ready(T),

    /// The producer reported end-of-data.
    Done,

    /// The producer faulted; all further polls fail.
    Poisoned,
}

/// A lazy polling cursor over a [`ComputeNext`] producer.
///
/// Mirrors the classic `hasNext`/`next` protocol: `has_next` computes and
/// caches at most one element, `next` hands it out. The cursor also
/// implements [`Iterator`] for infallible producers; in that view a
/// producer fault simply terminates iteration.
pub struct LazyIterator<P: ComputeNext> {
    producer: P,
    state: CursorState<P::Item>,
}

impl<P: ComputeNext> LazyIterator<P> {
    pub fn new(producer: P) -> Self {
        Self {
            producer,
            state: CursorState::NotReady,
        }
    }

    /// Check whether another element is available, computing it if needed.
    ///
    /// Idempotent until the cached element is consumed by [`next`]. A
    /// producer fault is returned once as [`CursorError::Producer`]; every
    /// subsequent poll fails with [`CursorError::IllegalState`].
    ///
    /// [`next`]: Self::next
    pub fn has_next(&mut self) -> Result<bool, CursorError> {
        match &self.state {
            CursorState::Ready(_) => return Ok(true),

            CursorState::Done => return Ok(false),

            CursorState::Poisoned => return Err(CursorError::IllegalState),

            CursorState::NotReady => {}
        }

        match self.producer.compute_next() {
            Ok(Some(item)) => {
                self.state = CursorState::Ready(item);
                Ok(true)
            }

            Ok(None) => {
                self.state = CursorState::Done;
                Ok(false)
            }

            Err(fault) => {
                self.state = CursorState::Poisoned;
                Err(CursorError::Producer(fault))
            }
        }
    }

    /// Consume and return the next element.
    ///
    /// Fails with [`CursorError::NoSuchElement`] past end-of-data.
    pub fn next_element(&mut self) -> Result<P::Item, CursorError> {
        if !self.has_next()? {
            return Err(CursorError::NoSuchElement);
        }

        match std::mem::replace(&mut self.state, CursorState::NotReady) {
            CursorState::Ready(item) => Ok(item),

            // has_next() returned true, so the element is cached.
            _ => Err(CursorError::IllegalState),
        }
    }

    /// Traversal cursors never support removal.
    pub fn remove(&mut self) -> Result<(), CursorError> {
        Err(CursorError::UnsupportedOperation)
    }
}

impl<P: ComputeNext> Iterator for LazyIterator<P> {
    type Item = P::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => self.next_element().ok(),

            _ => None,
        }
    }
}

/// Pre-order producer over a subtree.
///
/// Emits `(accumulated key, node)` for every node reachable from the start
/// frame, children visited in sorted order. Children are pushed onto the
/// work stack in reverse so the smaller first character pops first.
pub(crate) struct Descendants<V> {
    stack: Vec<(String, Arc<Node<V>>)>,
}

impl<V> Descendants<V> {
    /// Traverse the subtree rooted at `node`, whose accumulated path from
    /// the tree root spells `key`.
    pub(crate) fn new(key: String, node: Arc<Node<V>>) -> Self {
        Self {
            stack: vec![(key, node)],
        }
    }

    /// A traversal that yields nothing (no subtree matched the query).
    pub(crate) fn empty() -> Self {
        Self { stack: Vec::new() }
    }
}

impl<V> ComputeNext for Descendants<V> {
    type Item = (String, Arc<Node<V>>);

    fn compute_next(&mut self) -> Result<Option<Self::Item>, ProducerError> {
        let Some((key, node)) = self.stack.pop() else {
            return Ok(None);
        };

        for slot in node.child_slots().iter().rev() {
            let child = slot.load_full();
            let mut child_key = String::with_capacity(key.len() + child.incoming_edge().len());
            child_key.push_str(&key);
            child_key.push_str(child.incoming_edge());
            self.stack.push((child_key, child));
        }

        Ok(Some((key, node)))
    }
}
