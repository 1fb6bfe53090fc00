//! Lazy, stable sorting of sequences by computed keys.

pub(crate) mod algorithm;
pub mod expression;
pub mod key;
pub mod record;
pub mod sorted;

pub use expression::SortExpression;
pub use key::{CaseOrder, SortDataType, SortKeyDefinition, SortKeyEvaluator, SortOrder};
pub use record::{GroupInfo, GroupRecord, SortKeys, SortRecord};
pub use sorted::SortedSequence;
