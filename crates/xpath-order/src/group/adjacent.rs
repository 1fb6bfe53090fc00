use super::{GroupIterator, GroupMembers, GroupingKeyEvaluator, no_current_group};
use crate::collation::Collation;
use crate::compare::{AtomicComparer, AtomicSortComparer};
use crate::context::{DynamicContext, FocusContext};
use crate::runtime::{Error, ErrorCode};
use crate::sequence::SequenceCursor;
use crate::xdm::XdmAtomicValue;
use std::rc::Rc;
use std::sync::Arc;

/// `group-adjacent`: consecutive items with equal keys form a group.
pub struct GroupAdjacentIterator<T> {
    population: Box<dyn SequenceCursor<T>>,
    key: Rc<dyn GroupingKeyEvaluator<T>>,
    comparer: AtomicSortComparer,
    focus: FocusContext<T>,
    read: usize,
    current: Option<T>,
    current_key: Option<XdmAtomicValue>,
    next: Option<(T, XdmAtomicValue)>,
    members: Option<GroupMembers<T>>,
    position: usize,
    failed: Option<Error>,
}

impl<T: Clone + 'static> GroupAdjacentIterator<T> {
    /// Keys are compared for equality under `collation`.
    pub fn new(
        population: impl SequenceCursor<T> + 'static,
        key: Rc<dyn GroupingKeyEvaluator<T>>,
        collation: Arc<dyn Collation>,
        ctx: &DynamicContext,
    ) -> Result<Self, Error> {
        let mut focus = FocusContext::new(ctx.clone());
        focus.set_size(population.exact_len());
        let mut it = Self {
            population: Box::new(population),
            key,
            comparer: AtomicSortComparer::new(collation, ctx.implicit_timezone()),
            focus,
            read: 0,
            current: None,
            current_key: None,
            next: None,
            members: None,
            position: 0,
            failed: None,
        };
        it.next = it.pull_keyed()?;
        Ok(it)
    }

    // Next item with its key, evaluated with the item as context.
    fn pull_keyed(&mut self) -> Result<Option<(T, XdmAtomicValue)>, Error> {
        let Some(item) = self.population.next_item().transpose()? else {
            return Ok(None);
        };
        self.read += 1;
        self.focus.bind_item(item.clone(), self.read);
        let mut keys = self.key.grouping_keys(&item, &self.focus)?;
        if keys.len() != 1 {
            return Err(Error::from_code(
                ErrorCode::XTTE1100,
                format!(
                    "group-adjacent key of item {} must be a single atomic value, found {} values",
                    self.read,
                    keys.len()
                ),
            ));
        }
        let key = keys.remove(0);
        Ok(Some((item, key)))
    }

    fn same_key(&self, a: &XdmAtomicValue, b: &XdmAtomicValue) -> bool {
        // Values that cannot be compared are not equal
        self.comparer.equals(a, b).unwrap_or(false)
    }

    fn advance(&mut self, leader: T, key: &XdmAtomicValue) -> Result<Vec<T>, Error> {
        let mut members = vec![leader];
        while let Some((item, candidate)) = self.pull_keyed()? {
            if !self.same_key(key, &candidate) {
                self.next = Some((item, candidate));
                break;
            }
            members.push(item);
        }
        Ok(members)
    }
}

impl<T: Clone + 'static> GroupIterator<T> for GroupAdjacentIterator<T> {
    fn next_group(&mut self) -> Result<Option<T>, Error> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let Some((leader, key)) = self.next.take() else {
            self.current = None;
            self.current_key = None;
            self.members = None;
            return Ok(None);
        };
        self.current = Some(leader.clone());
        self.position += 1;
        match self.advance(leader, &key) {
            Ok(members) => {
                tracing::trace!(position = self.position, key = %key, members = members.len(), "adjacent group formed");
                self.current_key = Some(key);
                self.members = Some(GroupMembers::new(members));
                Ok(self.current.clone())
            }
            Err(err) => {
                self.failed = Some(err.clone());
                self.current = None;
                self.current_key = None;
                self.members = None;
                Err(err)
            }
        }
    }

    fn has_next(&self) -> Result<bool, Error> {
        match &self.failed {
            Some(err) => Err(err.clone()),
            None => Ok(self.next.is_some()),
        }
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn position(&self) -> usize {
        self.position
    }

    fn current_grouping_key(&self) -> Option<&XdmAtomicValue> {
        self.current_key.as_ref()
    }

    fn iterate_current_group(&self) -> GroupMembers<T> {
        match &self.members {
            Some(members) => members.restart(),
            None => no_current_group(),
        }
    }
}
