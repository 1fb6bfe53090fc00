use super::{GroupIterator, GroupMembers, no_current_group};
use crate::compare::AtomicComparer;
use crate::context::{DynamicContext, FocusContext};
use crate::runtime::Error;
use crate::sort::key::SortKeyEvaluator;
use crate::sort::record::{GroupInfo, GroupRecord};
use crate::sort::sorted::{RecordProducer, SharedSort};
use crate::xdm::XdmAtomicValue;
use std::rc::Rc;
use std::sync::Arc;

// Reads group leaders, capturing key and members before any reordering.
struct GroupProducer<T> {
    groups: Box<dyn GroupIterator<T>>,
}

impl<T: Clone> RecordProducer<T, GroupInfo<T>> for GroupProducer<T> {
    fn next_record(
        &mut self,
        focus: &mut FocusContext<T>,
        position: usize,
    ) -> Result<Option<(T, GroupInfo<T>)>, Error> {
        let Some(leader) = self.groups.next_group()? else {
            return Ok(None);
        };
        let grouping_key = self.groups.current_grouping_key().cloned();
        let members = self.groups.iterate_current_group();
        focus.bind_item(leader.clone(), position);
        focus.bind_group(members.clone(), grouping_key.clone());
        Ok(Some((leader, GroupInfo { grouping_key, members })))
    }

    fn exact_len(&self) -> Option<usize> {
        self.groups.group_count_hint()
    }

    fn lookahead(&self) -> Option<Result<bool, Error>> {
        Some(self.groups.has_next())
    }
}

/// Groups of another [`GroupIterator`], returned in sorted order.
///
/// Sort keys are evaluated once per group with the leading item as context
/// item and the group bound as current group. Each sorted record keeps the
/// key and members captured from its own group.
pub struct SortedGroupIterator<T> {
    shared: SharedSort<T, GroupInfo<T>>,
    records: Option<Rc<Vec<GroupRecord<T>>>>,
    current: Option<usize>,
    returned: usize,
}

impl<T: Clone + 'static> SortedGroupIterator<T> {
    pub fn new(
        groups: Box<dyn GroupIterator<T>>,
        evaluator: Rc<dyn SortKeyEvaluator<T>>,
        comparers: Vec<Arc<dyn AtomicComparer>>,
        ctx: &DynamicContext,
    ) -> Self {
        let producer = GroupProducer { groups };
        Self {
            shared: SharedSort::new(Box::new(producer), evaluator, comparers, ctx.clone()),
            records: None,
            current: None,
            returned: 0,
        }
    }

    fn current_record(&self) -> Option<&GroupRecord<T>> {
        let records = self.records.as_ref()?;
        records.get(self.current?)
    }
}

impl<T: Clone + 'static> GroupIterator<T> for SortedGroupIterator<T> {
    fn next_group(&mut self) -> Result<Option<T>, Error> {
        let records = match &self.records {
            Some(records) => records.clone(),
            None => {
                let records = self.shared.records()?;
                self.records = Some(records.clone());
                records
            }
        };
        if self.returned >= records.len() {
            self.current = None;
            return Ok(None);
        }
        self.current = Some(self.returned);
        self.returned += 1;
        Ok(Some(records[self.returned - 1].value().clone()))
    }

    fn has_next(&self) -> Result<bool, Error> {
        if let Some(records) = &self.records {
            return Ok(self.returned < records.len());
        }
        if let Some(answer) = self.shared.lookahead() {
            return answer;
        }
        Ok(self.returned < self.shared.records()?.len())
    }

    fn current(&self) -> Option<&T> {
        self.current_record().map(|r| r.value())
    }

    fn position(&self) -> usize {
        self.current.map_or(0, |i| i + 1)
    }

    fn current_grouping_key(&self) -> Option<&XdmAtomicValue> {
        self.current_record()?.group().grouping_key.as_ref()
    }

    fn iterate_current_group(&self) -> GroupMembers<T> {
        match self.current_record() {
            Some(record) => record.group().members.restart(),
            None => no_current_group(),
        }
    }

    fn group_count_hint(&self) -> Option<usize> {
        self.records.as_ref().map(|r| r.len() - self.returned)
    }
}
