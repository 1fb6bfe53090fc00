use super::{GroupIterator, GroupMembers, GroupPattern, no_current_group};
use crate::context::{DynamicContext, FocusContext};
use crate::runtime::Error;
use crate::sequence::SequenceCursor;
use crate::xdm::XdmAtomicValue;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Start,
    End,
}

/// `group-starting-with` and `group-ending-with`.
///
/// One pass over the population, buffering only the members of the current
/// group. The leader of the following group is read ahead, which is what
/// answers [`GroupIterator::has_next`].
pub struct BoundaryGroupIterator<T> {
    population: Box<dyn SequenceCursor<T>>,
    pattern: Rc<dyn GroupPattern<T>>,
    boundary: Boundary,
    focus: FocusContext<T>,
    read: usize,
    current: Option<T>,
    next: Option<T>,
    members: Option<GroupMembers<T>>,
    position: usize,
    failed: Option<Error>,
}

impl<T: Clone + 'static> BoundaryGroupIterator<T> {
    /// A new group starts at every item matching `pattern`. The first item
    /// always starts the first group and is not tested.
    pub fn starting_with(
        population: impl SequenceCursor<T> + 'static,
        pattern: Rc<dyn GroupPattern<T>>,
        ctx: &DynamicContext,
    ) -> Result<Self, Error> {
        Self::new(Box::new(population), pattern, Boundary::Start, ctx)
    }

    /// A group ends at every item matching `pattern`, that item included.
    /// A trailing run without a matching item still forms a group.
    pub fn ending_with(
        population: impl SequenceCursor<T> + 'static,
        pattern: Rc<dyn GroupPattern<T>>,
        ctx: &DynamicContext,
    ) -> Result<Self, Error> {
        Self::new(Box::new(population), pattern, Boundary::End, ctx)
    }

    fn new(
        population: Box<dyn SequenceCursor<T>>,
        pattern: Rc<dyn GroupPattern<T>>,
        boundary: Boundary,
        ctx: &DynamicContext,
    ) -> Result<Self, Error> {
        let mut focus = FocusContext::new(ctx.clone());
        focus.set_size(population.exact_len());
        let mut it = Self {
            population,
            pattern,
            boundary,
            focus,
            read: 0,
            current: None,
            next: None,
            members: None,
            position: 0,
            failed: None,
        };
        it.next = it.pull()?;
        Ok(it)
    }

    fn pull(&mut self) -> Result<Option<T>, Error> {
        let item = self.population.next_item().transpose()?;
        if let Some(item) = &item {
            self.read += 1;
            self.focus.bind_item(item.clone(), self.read);
        }
        Ok(item)
    }

    fn advance_starting(&mut self, leader: T) -> Result<Vec<T>, Error> {
        let mut members = vec![leader];
        while let Some(item) = self.pull()? {
            if self.pattern.matches(&item, &self.focus)? {
                self.next = Some(item);
                break;
            }
            members.push(item);
        }
        Ok(members)
    }

    // The leader itself is tested too: a matching first item closes a group
    // of one.
    fn advance_ending(&mut self, leader: T) -> Result<Vec<T>, Error> {
        let mut members = Vec::new();
        let mut candidate = Some(leader);
        while let Some(item) = candidate.take() {
            let closes = self.pattern.matches(&item, &self.focus)?;
            members.push(item);
            if closes {
                self.next = self.pull()?;
                break;
            }
            candidate = self.pull()?;
        }
        Ok(members)
    }
}

impl<T: Clone + 'static> GroupIterator<T> for BoundaryGroupIterator<T> {
    fn next_group(&mut self) -> Result<Option<T>, Error> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let Some(leader) = self.next.take() else {
            self.current = None;
            self.members = None;
            return Ok(None);
        };
        self.current = Some(leader.clone());
        self.position += 1;
        let advanced = match self.boundary {
            Boundary::Start => self.advance_starting(leader),
            Boundary::End => self.advance_ending(leader),
        };
        match advanced {
            Ok(members) => {
                tracing::trace!(
                    boundary = ?self.boundary,
                    position = self.position,
                    members = members.len(),
                    "group formed"
                );
                self.members = Some(GroupMembers::new(members));
                Ok(self.current.clone())
            }
            Err(err) => {
                self.failed = Some(err.clone());
                self.current = None;
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
        None
    }

    fn iterate_current_group(&self) -> GroupMembers<T> {
        match &self.members {
            Some(members) => members.restart(),
            None => no_current_group(),
        }
    }
}
