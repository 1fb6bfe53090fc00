use super::{GroupIterator, GroupMembers, GroupingKeyEvaluator, no_current_group};
use crate::collation::Collation;
use crate::compare::{date_instant, time_instant};
use crate::context::{DynamicContext, FocusContext};
use crate::runtime::Error;
use crate::sequence::SequenceCursor;
use crate::xdm::XdmAtomicValue;
use chrono::FixedOffset;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TemporalKind {
    DateTime,
    Date,
    Time,
}

/// Hashable form of a grouping key: values that are `eq` under the
/// collation map to the same key. Integers are kept exact, integral doubles
/// join the equal integer, and NaN groups with NaN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupingKey {
    Text(String),
    Integer(i64),
    Number(u64),
    Boolean(bool),
    Temporal(TemporalKind, i64, u32),
    YearMonth(i32),
    DayTime(i64),
    QName(Option<String>, String),
}

impl GroupingKey {
    fn new(value: &XdmAtomicValue, collation: &dyn Collation, tz: FixedOffset) -> Self {
        use XdmAtomicValue as V;
        if let V::Integer(i) = value {
            return GroupingKey::Integer(*i);
        }
        if let Some(d) = value.as_f64() {
            if let Some(i) = integral(d) {
                return GroupingKey::Integer(i);
            }
            let normalized = if d.is_nan() { f64::NAN } else { d };
            return GroupingKey::Number(normalized.to_bits());
        }
        match value {
            V::Boolean(b) => GroupingKey::Boolean(*b),
            V::DateTime(dt) => {
                GroupingKey::Temporal(TemporalKind::DateTime, dt.timestamp(), dt.timestamp_subsec_nanos())
            }
            V::Date { date, tz: own } => {
                let (secs, nanos) = date_instant(*date, *own, tz);
                GroupingKey::Temporal(TemporalKind::Date, secs, nanos)
            }
            V::Time { time, tz: own } => {
                let (secs, nanos) = time_instant(*time, *own, tz);
                GroupingKey::Temporal(TemporalKind::Time, secs, nanos)
            }
            V::YearMonthDuration(m) => GroupingKey::YearMonth(*m),
            V::DayTimeDuration(s) => GroupingKey::DayTime(*s),
            V::QName { ns_uri, local, .. } => GroupingKey::QName(ns_uri.clone(), local.clone()),
            other => GroupingKey::Text(collation.key(&other.string_value())),
        }
    }
}

// Integral values in i64 range share the key of the equal integer.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(d: f64) -> Option<i64> {
    (d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64).then(|| d as i64)
}

struct Group<T> {
    key: XdmAtomicValue,
    members: Vec<T>,
}

/// `group-by`: items with equal keys form a group, wherever they occur.
///
/// The population is read completely on construction. Groups come in order
/// of first appearance and members keep population order. An item whose key
/// expression yields several values joins one group per distinct value; an
/// item with an empty key joins none.
pub struct GroupByIterator<T> {
    groups: Vec<(T, XdmAtomicValue, GroupMembers<T>)>,
    current: Option<usize>,
    returned: usize,
}

impl<T: Clone + 'static> GroupByIterator<T> {
    pub fn new(
        mut population: impl SequenceCursor<T> + 'static,
        key: Rc<dyn GroupingKeyEvaluator<T>>,
        collation: Arc<dyn Collation>,
        ctx: &DynamicContext,
    ) -> Result<Self, Error> {
        let tz = ctx.implicit_timezone();
        let mut focus = FocusContext::new(ctx.clone());
        focus.set_size(population.exact_len());
        let mut groups: Vec<Group<T>> = Vec::new();
        let mut index: HashMap<GroupingKey, usize> = HashMap::new();
        let mut read = 0;
        while let Some(item) = population.next_item().transpose()? {
            read += 1;
            focus.bind_item(item.clone(), read);
            let mut joined: SmallVec<[usize; 4]> = SmallVec::new();
            for value in key.grouping_keys(&item, &focus)? {
                let slot = *index
                    .entry(GroupingKey::new(&value, collation.as_ref(), tz))
                    .or_insert_with(|| {
                        groups.push(Group {
                            key: value.clone(),
                            members: Vec::new(),
                        });
                        groups.len() - 1
                    });
                if !joined.contains(&slot) {
                    joined.push(slot);
                    groups[slot].members.push(item.clone());
                }
            }
        }
        tracing::debug!(items = read, groups = groups.len(), "group-by partitioned population");

        let groups = groups
            .into_iter()
            .filter_map(|g| {
                let leader = g.members.first()?.clone();
                Some((leader, g.key, GroupMembers::new(g.members)))
            })
            .collect();
        Ok(Self {
            groups,
            current: None,
            returned: 0,
        })
    }
}

impl<T: Clone + 'static> GroupIterator<T> for GroupByIterator<T> {
    fn next_group(&mut self) -> Result<Option<T>, Error> {
        if self.returned >= self.groups.len() {
            self.current = None;
            return Ok(None);
        }
        self.current = Some(self.returned);
        self.returned += 1;
        Ok(self.current().cloned())
    }

    fn has_next(&self) -> Result<bool, Error> {
        Ok(self.returned < self.groups.len())
    }

    fn current(&self) -> Option<&T> {
        self.current.map(|i| &self.groups[i].0)
    }

    fn position(&self) -> usize {
        self.current.map_or(0, |i| i + 1)
    }

    fn current_grouping_key(&self) -> Option<&XdmAtomicValue> {
        self.current.map(|i| &self.groups[i].1)
    }

    fn iterate_current_group(&self) -> GroupMembers<T> {
        match self.current {
            Some(i) => self.groups[i].2.restart(),
            None => no_current_group(),
        }
    }

    fn group_count_hint(&self) -> Option<usize> {
        Some(self.groups.len() - self.returned)
    }
}
