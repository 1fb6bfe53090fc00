use crate::runtime::Error;

/// Pull-based stream of items that may fail while producing them.
pub trait SequenceCursor<T> {
    fn next_item(&mut self) -> Option<Result<T, Error>>;

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }

    /// Whether another item follows, when the cursor can tell without
    /// consuming it.
    fn has_next_hint(&self) -> Option<bool> {
        match self.size_hint() {
            (lower, _) if lower > 0 => Some(true),
            (_, Some(0)) => Some(false),
            _ => None,
        }
    }

    /// Remaining length, when known exactly.
    fn exact_len(&self) -> Option<usize> {
        match self.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower),
            _ => None,
        }
    }
}

impl<T> SequenceCursor<T> for Box<dyn SequenceCursor<T>> {
    fn next_item(&mut self) -> Option<Result<T, Error>> {
        (**self).next_item()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (**self).size_hint()
    }
}

/// Cursor over an owned vector of items.
pub struct VecCursor<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> VecCursor<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items: items.into_iter() }
    }
}

impl<T> SequenceCursor<T> for VecCursor<T> {
    fn next_item(&mut self) -> Option<Result<T, Error>> {
        self.items.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<T> From<Vec<T>> for VecCursor<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

/// Adapts any fallible iterator, forwarding its size hint.
pub struct IterCursor<I> {
    iter: I,
}

impl<I> IterCursor<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<T, I: Iterator<Item = Result<T, Error>>> SequenceCursor<T> for IterCursor<I> {
    fn next_item(&mut self) -> Option<Result<T, Error>> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}
