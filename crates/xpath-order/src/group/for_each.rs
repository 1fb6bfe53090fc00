use super::{
    BoundaryGroupIterator, GroupAdjacentIterator, GroupByIterator, GroupIterator, GroupPattern,
    GroupingKeyEvaluator, SortedGroupIterator,
};
use crate::collation::{Collation, expand_collation_uri};
use crate::context::DynamicContext;
use crate::runtime::{Error, ErrorCode};
use crate::sequence::SequenceCursor;
use crate::sort::key::{SortKeyDefinition, SortKeyEvaluator};
use std::rc::Rc;
use std::sync::Arc;

/// How a `for-each-group` partitions its population.
pub enum GroupingAlgorithm<T> {
    By(Rc<dyn GroupingKeyEvaluator<T>>),
    Adjacent(Rc<dyn GroupingKeyEvaluator<T>>),
    StartingWith(Rc<dyn GroupPattern<T>>),
    EndingWith(Rc<dyn GroupPattern<T>>),
}

impl<T> GroupingAlgorithm<T> {
    pub fn name(&self) -> &'static str {
        match self {
            GroupingAlgorithm::By(_) => "group-by",
            GroupingAlgorithm::Adjacent(_) => "group-adjacent",
            GroupingAlgorithm::StartingWith(_) => "group-starting-with",
            GroupingAlgorithm::EndingWith(_) => "group-ending-with",
        }
    }

    /// Only key-based grouping compares values under a collation.
    pub fn uses_collation(&self) -> bool {
        matches!(self, GroupingAlgorithm::By(_) | GroupingAlgorithm::Adjacent(_))
    }
}

impl<T> Clone for GroupingAlgorithm<T> {
    fn clone(&self) -> Self {
        match self {
            GroupingAlgorithm::By(k) => GroupingAlgorithm::By(k.clone()),
            GroupingAlgorithm::Adjacent(k) => GroupingAlgorithm::Adjacent(k.clone()),
            GroupingAlgorithm::StartingWith(p) => GroupingAlgorithm::StartingWith(p.clone()),
            GroupingAlgorithm::EndingWith(p) => GroupingAlgorithm::EndingWith(p.clone()),
        }
    }
}

/// A configured `for-each-group`: the grouping algorithm, its collation and
/// optional sort keys for the groups.
pub struct ForEachGroup<T> {
    algorithm: GroupingAlgorithm<T>,
    collation_name: Option<String>,
    base_uri: Option<String>,
    sort: Option<(Vec<SortKeyDefinition>, Rc<dyn SortKeyEvaluator<T>>)>,
}

impl<T: Clone + 'static> ForEachGroup<T> {
    pub fn new(algorithm: GroupingAlgorithm<T>) -> Self {
        Self {
            algorithm,
            collation_name: None,
            base_uri: None,
            sort: None,
        }
    }

    pub fn with_collation(mut self, uri: impl Into<String>) -> Self {
        self.collation_name = Some(uri.into());
        self
    }

    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Return the groups sorted by `keys`, evaluated per group by
    /// `evaluator`. An empty key list leaves the groups in their natural
    /// order.
    pub fn with_sort(mut self, keys: Vec<SortKeyDefinition>, evaluator: Rc<dyn SortKeyEvaluator<T>>) -> Self {
        self.sort = if keys.is_empty() { None } else { Some((keys, evaluator)) };
        self
    }

    pub fn algorithm(&self) -> &GroupingAlgorithm<T> {
        &self.algorithm
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Partition `population` and, if sort keys were given, wrap the result
    /// in a [`SortedGroupIterator`].
    pub fn group_iterator(
        &self,
        population: impl SequenceCursor<T> + 'static,
        ctx: &DynamicContext,
    ) -> Result<Box<dyn GroupIterator<T>>, Error> {
        tracing::debug!(
            algorithm = self.algorithm_name(),
            sorted = self.sort.is_some(),
            "for-each-group"
        );
        let groups: Box<dyn GroupIterator<T>> = match &self.algorithm {
            GroupingAlgorithm::By(key) => {
                Box::new(GroupByIterator::new(population, key.clone(), self.collation(ctx)?, ctx)?)
            }
            GroupingAlgorithm::Adjacent(key) => {
                Box::new(GroupAdjacentIterator::new(population, key.clone(), self.collation(ctx)?, ctx)?)
            }
            GroupingAlgorithm::StartingWith(pattern) => {
                Box::new(BoundaryGroupIterator::starting_with(population, pattern.clone(), ctx)?)
            }
            GroupingAlgorithm::EndingWith(pattern) => {
                Box::new(BoundaryGroupIterator::ending_with(population, pattern.clone(), ctx)?)
            }
        };
        let Some((keys, evaluator)) = &self.sort else {
            return Ok(groups);
        };
        let comparers = keys
            .iter()
            .map(|key| key.make_comparator(ctx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(SortedGroupIterator::new(groups, evaluator.clone(), comparers, ctx)))
    }

    fn collation(&self, ctx: &DynamicContext) -> Result<Arc<dyn Collation>, Error> {
        let Some(name) = self.collation_name.as_deref() else {
            return Ok(ctx.default_collation());
        };
        let base = self.base_uri.as_deref().or(ctx.base_uri.as_deref());
        expand_collation_uri(name.trim(), base)
            .and_then(|uri| ctx.collation(&uri))
            .map_err(|e| e.recode(ErrorCode::XTDE1110))
    }
}
