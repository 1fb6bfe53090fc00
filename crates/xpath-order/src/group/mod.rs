//! Partitioning of a sequence into groups (`xsl:for-each-group`).
//!
//! Every grouping algorithm implements [`GroupIterator`]: it yields the
//! leading item of each group and gives access to the grouping key and to a
//! restartable iterator over the members of the current group.

pub mod adjacent;
pub mod boundary;
pub mod by;
pub mod for_each;
pub mod sorted;

use crate::context::FocusContext;
use crate::runtime::Error;
use crate::xdm::XdmAtomicValue;
use std::rc::Rc;

pub use adjacent::GroupAdjacentIterator;
pub use boundary::BoundaryGroupIterator;
pub use by::GroupByIterator;
pub use for_each::{ForEachGroup, GroupingAlgorithm};
pub use sorted::SortedGroupIterator;

pub trait GroupIterator<T> {
    /// Advance to the next group and return its leading item.
    fn next_group(&mut self) -> Result<Option<T>, Error>;

    /// Whether another group follows, without advancing.
    fn has_next(&self) -> Result<bool, Error>;

    /// Leading item of the current group.
    fn current(&self) -> Option<&T>;

    /// 1-based position of the current group; 0 before the first.
    fn position(&self) -> usize;

    /// Key of the current group; `None` for pattern-based grouping.
    fn current_grouping_key(&self) -> Option<&XdmAtomicValue>;

    /// A fresh iterator over every member of the current group, starting at
    /// the first member however much of it was consumed before.
    ///
    /// # Panics
    ///
    /// Panics when there is no current group (before the first call to
    /// `next_group` or after the last group).
    fn iterate_current_group(&self) -> GroupMembers<T>;

    /// Number of groups not yet returned, when known without reading ahead.
    fn group_count_hint(&self) -> Option<usize> {
        None
    }
}

impl<T> GroupIterator<T> for Box<dyn GroupIterator<T>> {
    fn next_group(&mut self) -> Result<Option<T>, Error> {
        (**self).next_group()
    }
    fn has_next(&self) -> Result<bool, Error> {
        (**self).has_next()
    }
    fn current(&self) -> Option<&T> {
        (**self).current()
    }
    fn position(&self) -> usize {
        (**self).position()
    }
    fn current_grouping_key(&self) -> Option<&XdmAtomicValue> {
        (**self).current_grouping_key()
    }
    fn iterate_current_group(&self) -> GroupMembers<T> {
        (**self).iterate_current_group()
    }
    fn group_count_hint(&self) -> Option<usize> {
        (**self).group_count_hint()
    }
}

pub(crate) fn no_current_group() -> ! {
    panic!("iterate_current_group called with no current group")
}

/// Restartable iterator over the members of one group.
///
/// Members are held once and shared; [`GroupMembers::restart`] yields a new
/// iterator from the first member without re-reading any source.
#[derive(Debug, Clone)]
pub struct GroupMembers<T> {
    members: Rc<[T]>,
    next: usize,
}

impl<T> GroupMembers<T> {
    pub fn new(members: Vec<T>) -> Self {
        Self {
            members: members.into(),
            next: 0,
        }
    }

    pub fn restart(&self) -> Self {
        Self {
            members: self.members.clone(),
            next: 0,
        }
    }

    /// Every member, regardless of the iteration state.
    pub fn as_slice(&self) -> &[T] {
        &self.members
    }
}

impl<T: Clone> Iterator for GroupMembers<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.members.get(self.next)?.clone();
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.members.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for GroupMembers<T> {}

/// Boundary test of `group-starting-with` / `group-ending-with`.
pub trait GroupPattern<T> {
    fn matches(&self, item: &T, focus: &FocusContext<T>) -> Result<bool, Error>;
}

impl<T, F> GroupPattern<T> for F
where
    F: Fn(&T, &FocusContext<T>) -> Result<bool, Error>,
{
    fn matches(&self, item: &T, focus: &FocusContext<T>) -> Result<bool, Error> {
        self(item, focus)
    }
}

/// Grouping key of `group-by` / `group-adjacent`, atomized. An empty vector
/// is the empty sequence.
pub trait GroupingKeyEvaluator<T> {
    fn grouping_keys(&self, item: &T, focus: &FocusContext<T>) -> Result<Vec<XdmAtomicValue>, Error>;
}

impl<T, F> GroupingKeyEvaluator<T> for F
where
    F: Fn(&T, &FocusContext<T>) -> Result<Vec<XdmAtomicValue>, Error>,
{
    fn grouping_keys(&self, item: &T, focus: &FocusContext<T>) -> Result<Vec<XdmAtomicValue>, Error> {
        self(item, focus)
    }
}
