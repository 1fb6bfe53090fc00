pub mod collation;
pub mod compare;
pub mod consts;
pub mod context;
pub mod group;
pub mod runtime;
pub mod sequence;
pub mod sort;
pub mod xdm;

pub use collation::{Collation, CollationRegistry};
pub use compare::{AtomicComparer, AtomicSortComparer, ClassificationError};
pub use context::{DynamicContext, DynamicContextBuilder, FocusContext};
pub use group::{
    BoundaryGroupIterator, ForEachGroup, GroupAdjacentIterator, GroupByIterator, GroupIterator, GroupMembers,
    GroupPattern, GroupingAlgorithm, GroupingKeyEvaluator, SortedGroupIterator,
};
pub use runtime::{Error, ErrorCode, HostLanguage};
pub use sequence::{IterCursor, SequenceCursor, VecCursor};
pub use sort::{SortExpression, SortKeyDefinition, SortKeyEvaluator, SortedSequence};
pub use xdm::{ExpandedName, XdmAtomicValue};
