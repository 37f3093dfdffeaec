//! Contract tests for the lazy polling cursor.

use contree::{ComputeNext, CursorError, LazyIterator, ProducerError};

/// Producer backed by a fixed list of values.
struct ListProducer {
    values: Vec<i32>,
    pos: usize,
}

impl ComputeNext for ListProducer {
    type Item = i32;

    fn compute_next(&mut self) -> Result<Option<i32>, ProducerError> {
        let next = self.values.get(self.pos).copied();
        self.pos += 1;
        Ok(next)
    }
}

/// Producer that fails on every poll.
struct FaultyProducer;

impl ComputeNext for FaultyProducer {
    type Item = i32;

    fn compute_next(&mut self) -> Result<Option<i32>, ProducerError> {
        Err("synthetic producer failure".into())
    }
}

fn new_lazy_iterator(values: &[i32]) -> LazyIterator<ListProducer> {
    LazyIterator::new(ListProducer {
        values: values.to_vec(),
        pos: 0,
    })
}

fn advance(cursor: &mut LazyIterator<ListProducer>, elements: usize) {
    for _ in 0..elements {
        cursor.next_element().expect("element during advance");
    }
}

#[test]
fn remove_is_unsupported() {
    let mut cursor = new_lazy_iterator(&[1, 2, 3, 4]);

    assert!(matches!(cursor.remove(), Err(CursorError::UnsupportedOperation)));
}

#[test]
fn iteration_with_idempotent_has_next() {
    let mut cursor = new_lazy_iterator(&[1, 2, 3, 4]);
    advance(&mut cursor, 3);

    // has_next holds its answer until the element is consumed.
    assert!(cursor.has_next().unwrap());
    assert!(cursor.has_next().unwrap());

    let mut values = Vec::new();
    while cursor.has_next().unwrap() {
        values.push(cursor.next_element().unwrap());
    }
    assert_eq!(values, vec![4]);
}

#[test]
fn next_past_end_is_no_such_element() {
    let mut cursor = new_lazy_iterator(&[1, 2, 3, 4]);
    advance(&mut cursor, 4);

    assert!(matches!(cursor.next_element(), Err(CursorError::NoSuchElement)));
}

#[test]
fn has_next_after_fault_is_illegal_state() {
    let mut cursor = LazyIterator::new(FaultyProducer);

    // First poll surfaces the producer's own error.
    match cursor.has_next() {
        Err(CursorError::Producer(source)) => {
            assert_eq!(source.to_string(), "synthetic producer failure");
        }

        other => panic!("expected producer fault, got {other:?}"),
    }

    // The cursor is now poisoned.
    assert!(matches!(cursor.has_next(), Err(CursorError::IllegalState)));
    assert!(matches!(cursor.next_element(), Err(CursorError::IllegalState)));
}

#[test]
fn iterator_view_yields_all_elements() {
    let values: Vec<i32> = new_lazy_iterator(&[1, 2, 3, 4]).collect();
    assert_eq!(values, vec![1, 2, 3, 4]);
}
