use crate::group::GroupMembers;
use crate::xdm::XdmAtomicValue;
use smallvec::SmallVec;

/// Evaluated sort keys of one record; most sorts use one or two keys.
pub type SortKeys = SmallVec<[Option<XdmAtomicValue>; 2]>;

/// An item together with its evaluated sort keys and its read position.
///
/// Keys are written once during materialization and only read afterwards.
/// `original_position` breaks ties, which is what keeps the sort stable.
#[derive(Debug, Clone)]
pub struct SortRecord<T, G = ()> {
    value: T,
    sort_keys: SortKeys,
    original_position: usize,
    group: G,
}

impl<T, G> SortRecord<T, G> {
    pub fn new(value: T, sort_keys: SortKeys, original_position: usize, group: G) -> Self {
        Self {
            value,
            sort_keys,
            original_position,
            group,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn sort_keys(&self) -> &[Option<XdmAtomicValue>] {
        &self.sort_keys
    }

    pub fn original_position(&self) -> usize {
        self.original_position
    }

    pub fn group(&self) -> &G {
        &self.group
    }
}

/// The grouping key and a grounded snapshot of the members of a group,
/// captured before the groups are reordered.
#[derive(Debug, Clone)]
pub struct GroupInfo<T> {
    pub grouping_key: Option<XdmAtomicValue>,
    pub members: GroupMembers<T>,
}

/// Record of one group leader in a sorted group iteration.
pub type GroupRecord<T> = SortRecord<T, GroupInfo<T>>;
