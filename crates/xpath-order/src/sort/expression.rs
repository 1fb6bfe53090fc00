use super::key::{SortKeyDefinition, SortKeyEvaluator};
use super::sorted::SortedSequence;
use crate::compare::AtomicComparer;
use crate::context::DynamicContext;
use crate::runtime::Error;
use crate::sequence::SequenceCursor;
use std::rc::Rc;
use std::sync::Arc;

/// A sort over one or more key definitions, as produced by `xsl:sort`
/// children or `fn:sort`.
#[derive(Debug, Clone)]
pub struct SortExpression {
    keys: Vec<SortKeyDefinition>,
}

impl SortExpression {
    /// # Panics
    ///
    /// Panics if `keys` is empty.
    pub fn new(keys: Vec<SortKeyDefinition>) -> Self {
        assert!(!keys.is_empty(), "a sort needs at least one sort key");
        Self { keys }
    }

    pub fn key_definitions(&self) -> &[SortKeyDefinition] {
        &self.keys
    }

    /// Bind every key definition to `ctx`.
    pub fn make_comparators(&self, ctx: &DynamicContext) -> Result<Vec<Arc<dyn AtomicComparer>>, Error> {
        self.keys.iter().map(|key| key.make_comparator(ctx)).collect()
    }

    /// Lazily sort `source`. Attribute errors surface here; key evaluation
    /// and comparison errors surface on the first read of the result.
    pub fn iterate<T: Clone + 'static>(
        &self,
        source: impl SequenceCursor<T> + 'static,
        evaluator: Rc<dyn SortKeyEvaluator<T>>,
        ctx: &DynamicContext,
    ) -> Result<SortedSequence<T>, Error> {
        let comparers = self.make_comparators(ctx)?;
        Ok(SortedSequence::new(source, evaluator, comparers, ctx))
    }
}
