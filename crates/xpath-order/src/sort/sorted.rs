use super::algorithm::try_sort_by;
use super::key::SortKeyEvaluator;
use super::record::{SortKeys, SortRecord};
use crate::compare::{AtomicComparer, ClassificationError};
use crate::consts::{DEFAULT_SORT_CAPACITY, SHRINK_SLACK_THRESHOLD};
use crate::context::{DynamicContext, FocusContext};
use crate::runtime::{Error, ErrorCode};
use crate::sequence::SequenceCursor;
use core::cell::RefCell;
use core::cmp::Ordering;
use std::rc::Rc;
use std::sync::Arc;

/// Supplies the records of a sort: the next item, bound into the focus at
/// `position` (1-based), plus whatever payload `G` travels with it.
pub(crate) trait RecordProducer<T, G> {
    fn next_record(&mut self, focus: &mut FocusContext<T>, position: usize) -> Result<Option<(T, G)>, Error>;

    /// Number of records still to come, when known without reading them.
    fn exact_len(&self) -> Option<usize>;

    /// Whether another record follows, when this can be answered without
    /// reading the whole source.
    fn lookahead(&self) -> Option<Result<bool, Error>>;
}

struct ItemProducer<T> {
    source: Box<dyn SequenceCursor<T>>,
}

impl<T: Clone> RecordProducer<T, ()> for ItemProducer<T> {
    fn next_record(&mut self, focus: &mut FocusContext<T>, position: usize) -> Result<Option<(T, ())>, Error> {
        match self.source.next_item() {
            None => Ok(None),
            Some(Err(e)) => Err(e),
            Some(Ok(item)) => {
                focus.bind_item(item.clone(), position);
                Ok(Some((item, ())))
            }
        }
    }

    fn exact_len(&self) -> Option<usize> {
        self.source.exact_len()
    }

    fn lookahead(&self) -> Option<Result<bool, Error>> {
        self.source.has_next_hint().map(Ok)
    }
}

struct PendingSort<T, G> {
    producer: Box<dyn RecordProducer<T, G>>,
    evaluator: Rc<dyn SortKeyEvaluator<T>>,
    comparers: Vec<Arc<dyn AtomicComparer>>,
    dyn_ctx: DynamicContext,
}

impl<T: Clone, G> PendingSort<T, G> {
    fn run(self) -> Result<Vec<SortRecord<T, G>>, Error> {
        let PendingSort {
            mut producer,
            evaluator,
            comparers,
            dyn_ctx,
        } = self;
        let host = dyn_ctx.host_language;
        let key_count = comparers.len();
        let known_len = producer.exact_len();

        let mut records: Vec<SortRecord<T, G>> = Vec::with_capacity(initial_capacity(known_len));
        let mut focus = FocusContext::new(dyn_ctx);
        focus.set_size(known_len);
        while let Some((value, group)) = producer.next_record(&mut focus, records.len() + 1)? {
            let mut keys = SortKeys::with_capacity(key_count);
            for index in 0..key_count {
                keys.push(evaluator.evaluate_sort_key(index, &focus)?);
            }
            let original_position = records.len();
            records.push(SortRecord::new(value, keys, original_position, group));
        }

        let (len, capacity) = (records.len(), records.capacity());
        let shrink = should_shrink(len, capacity);
        if shrink {
            records.shrink_to_fit();
        }
        tracing::debug!(records = len, capacity, shrink, "materialized sort input");

        try_sort_by(&mut records, &mut |a, b| compare_records(a, b, &comparers)).map_err(|err| {
            tracing::debug!(error = %err, host = ?host, "sort comparison failed");
            Error::sort_comparison(err, host)
        })?;
        tracing::debug!(records = len, keys = key_count, "sort complete");
        Ok(records)
    }
}

/// Initial record capacity: the known source length, else a default.
fn initial_capacity(known_len: Option<usize>) -> usize {
    known_len.unwrap_or(DEFAULT_SORT_CAPACITY)
}

/// A materialized array is shrunk when more than half of it is unused or the
/// unused tail exceeds [`SHRINK_SLACK_THRESHOLD`] records.
fn should_shrink(len: usize, capacity: usize) -> bool {
    len * 2 < capacity || capacity.saturating_sub(len) > SHRINK_SLACK_THRESHOLD
}

// Keys in priority order, then read order: the result is total, so the sort
// is stable whatever the algorithm.
fn compare_records<T, G>(
    a: &SortRecord<T, G>,
    b: &SortRecord<T, G>,
    comparers: &[Arc<dyn AtomicComparer>],
) -> Result<Ordering, ClassificationError> {
    for ((ka, kb), comparer) in a.sort_keys().iter().zip(b.sort_keys()).zip(comparers) {
        let ord = comparer.compare(ka.as_ref(), kb.as_ref())?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(a.original_position().cmp(&b.original_position()))
}

enum SortState<T, G> {
    Pending(Box<PendingSort<T, G>>),
    Running,
    Sorted(Rc<Vec<SortRecord<T, G>>>),
    Failed(Error),
}

/// Materialize-once sort state shared by every cursor over one sorted result.
pub(crate) struct SharedSort<T, G> {
    state: RefCell<SortState<T, G>>,
}

impl<T: Clone, G> SharedSort<T, G> {
    pub(crate) fn new(
        producer: Box<dyn RecordProducer<T, G>>,
        evaluator: Rc<dyn SortKeyEvaluator<T>>,
        comparers: Vec<Arc<dyn AtomicComparer>>,
        dyn_ctx: DynamicContext,
    ) -> Self {
        Self {
            state: RefCell::new(SortState::Pending(Box::new(PendingSort {
                producer,
                evaluator,
                comparers,
                dyn_ctx,
            }))),
        }
    }

    /// The sorted records, materializing and sorting on first use. A failure
    /// is stored and returned again on every later call without touching the
    /// source.
    pub(crate) fn records(&self) -> Result<Rc<Vec<SortRecord<T, G>>>, Error> {
        let taken = std::mem::replace(&mut *self.state.borrow_mut(), SortState::Running);
        let pending = match taken {
            SortState::Pending(pending) => pending,
            SortState::Sorted(records) => {
                *self.state.borrow_mut() = SortState::Sorted(records.clone());
                return Ok(records);
            }
            SortState::Failed(err) => {
                *self.state.borrow_mut() = SortState::Failed(err.clone());
                return Err(err);
            }
            SortState::Running => {
                return Err(Error::from_code(
                    ErrorCode::FOER0000,
                    "sort key evaluation requires the result of the sort it belongs to",
                ));
            }
        };
        match pending.run() {
            Ok(records) => {
                let records = Rc::new(records);
                *self.state.borrow_mut() = SortState::Sorted(records.clone());
                Ok(records)
            }
            Err(err) => {
                *self.state.borrow_mut() = SortState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Lookahead from the unread source; `None` once the sort has run or the
    /// source cannot tell.
    pub(crate) fn lookahead(&self) -> Option<Result<bool, Error>> {
        match &*self.state.borrow() {
            SortState::Pending(pending) => pending.producer.lookahead(),
            _ => None,
        }
    }
}

/// A lazily sorted sequence.
///
/// Nothing is read from the source until the first call that needs the
/// sorted order. Clones share one materialization: the source is read and
/// every sort key is evaluated exactly once, however many cursors exist.
pub struct SortedSequence<T> {
    shared: Rc<SharedSort<T, ()>>,
    records: Option<Rc<Vec<SortRecord<T>>>>,
    position: usize,
    fused: bool,
}

impl<T: Clone + 'static> SortedSequence<T> {
    /// Sort `source` by the keys `evaluator` computes, comparing key `i` with
    /// `comparers[i]`. Ties on every key keep their input order.
    pub fn new(
        source: impl SequenceCursor<T> + 'static,
        evaluator: Rc<dyn SortKeyEvaluator<T>>,
        comparers: Vec<Arc<dyn AtomicComparer>>,
        ctx: &DynamicContext,
    ) -> Self {
        let producer = ItemProducer {
            source: Box::new(source),
        };
        Self {
            shared: Rc::new(SharedSort::new(Box::new(producer), evaluator, comparers, ctx.clone())),
            records: None,
            position: 0,
            fused: false,
        }
    }
}

impl<T: Clone> SortedSequence<T> {
    fn sorted(&mut self) -> Result<Rc<Vec<SortRecord<T>>>, Error> {
        if let Some(records) = &self.records {
            return Ok(records.clone());
        }
        let records = self.shared.records()?;
        self.records = Some(records.clone());
        Ok(records)
    }

    /// Whether another item follows. Answered from the source without sorting
    /// when the source knows its length; otherwise this sorts.
    pub fn has_next(&self) -> Result<bool, Error> {
        if let Some(records) = &self.records {
            return Ok(self.position < records.len());
        }
        if let Some(answer) = self.shared.lookahead() {
            return answer;
        }
        Ok(self.position < self.shared.records()?.len())
    }

    /// Total number of items; sorts if that has not happened yet.
    pub fn length(&self) -> Result<usize, Error> {
        match &self.records {
            Some(records) => Ok(records.len()),
            None => Ok(self.shared.records()?.len()),
        }
    }

    /// Number of items returned so far, i.e. the position of the last one.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<T: Clone> Clone for SortedSequence<T> {
    /// A new cursor at the start of the same sorted result. Sorts first if
    /// needed so both cursors observe a single outcome; a failure stays
    /// stored in the shared state and surfaces on the next read.
    fn clone(&self) -> Self {
        let records = self.records.clone().or_else(|| self.shared.records().ok());
        Self {
            shared: self.shared.clone(),
            records,
            position: 0,
            fused: false,
        }
    }
}

impl<T: Clone> SequenceCursor<T> for SortedSequence<T> {
    fn next_item(&mut self) -> Option<Result<T, Error>> {
        let records = match self.sorted() {
            Ok(records) => records,
            Err(err) => return Some(Err(err)),
        };
        let item = records.get(self.position)?.value().clone();
        self.position += 1;
        Some(Ok(item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.records {
            Some(records) => {
                let remaining = records.len().saturating_sub(self.position);
                (remaining, Some(remaining))
            }
            None => (0, None),
        }
    }
}

impl<T: Clone> Iterator for SortedSequence<T> {
    type Item = Result<T, Error>;

    // Fused after an error; `next_item` keeps reporting it.
    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        let next = self.next_item();
        if matches!(next, Some(Err(_))) {
            self.fused = true;
        }
        next
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        SequenceCursor::size_hint(self)
    }
}
