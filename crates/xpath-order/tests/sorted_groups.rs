//! Sorting groups: each sorted group keeps its own key and members.

use platynui_xpath_order::collation::{CodepointCollation, Collation};
use platynui_xpath_order::context::FocusContext;
use platynui_xpath_order::{
    BoundaryGroupIterator, DynamicContext, DynamicContextBuilder, Error, ErrorCode, ForEachGroup, GroupByIterator,
    GroupIterator, GroupPattern, GroupingAlgorithm, GroupingKeyEvaluator, HostLanguage, SortKeyDefinition,
    SortKeyEvaluator, SortedGroupIterator, VecCursor, XdmAtomicValue,
};
use rstest::rstest;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

type Word = &'static str;

const FRUIT: [Word; 7] = ["apple", "banana", "cherry", "avocado", "blueberry", "apricot", "cranberry"];

fn initial() -> Rc<dyn GroupingKeyEvaluator<Word>> {
    Rc::new(|item: &Word, _focus: &FocusContext<Word>| -> Result<Vec<XdmAtomicValue>, Error> {
        Ok(item.chars().next().map(|c| XdmAtomicValue::from(c.to_string())).into_iter().collect())
    })
}

// Sort key: the current grouping key.
fn by_grouping_key() -> Rc<dyn SortKeyEvaluator<Word>> {
    Rc::new(|_i: usize, focus: &FocusContext<Word>| -> Result<Option<XdmAtomicValue>, Error> {
        Ok(focus.current_grouping_key().cloned())
    })
}

// Sort key: number of members of the current group.
fn by_group_size() -> Rc<dyn SortKeyEvaluator<Word>> {
    Rc::new(|_i: usize, focus: &FocusContext<Word>| -> Result<Option<XdmAtomicValue>, Error> {
        Ok(focus.current_group().map(|g| XdmAtomicValue::Integer(g.len() as i64)))
    })
}

fn fruit_groups() -> Box<dyn GroupIterator<Word>> {
    let codepoint: Arc<dyn Collation> = Arc::new(CodepointCollation);
    let groups =
        GroupByIterator::new(VecCursor::new(FRUIT.to_vec()), initial(), codepoint, &DynamicContext::default()).unwrap();
    Box::new(groups)
}

fn comparer(key: SortKeyDefinition) -> Vec<Arc<dyn platynui_xpath_order::AtomicComparer>> {
    vec![key.make_comparator(&DynamicContext::default()).unwrap()]
}

fn drain(it: &mut dyn GroupIterator<Word>) -> Vec<(Option<String>, Vec<Word>)> {
    let mut out = Vec::new();
    while let Some(leader) = it.next_group().unwrap() {
        let members: Vec<Word> = it.iterate_current_group().collect();
        assert_eq!(members.first(), Some(&leader));
        assert_eq!(it.current(), Some(&leader));
        out.push((it.current_grouping_key().map(XdmAtomicValue::string_value), members));
    }
    out
}

#[rstest]
fn groups_sorted_by_key_keep_their_members() {
    let mut it = SortedGroupIterator::new(
        fruit_groups(),
        by_grouping_key(),
        comparer(SortKeyDefinition::new().with_order("descending")),
        &DynamicContext::default(),
    );
    assert_eq!(
        drain(&mut it),
        vec![
            (Some("c".to_string()), vec!["cherry", "cranberry"]),
            (Some("b".to_string()), vec!["banana", "blueberry"]),
            (Some("a".to_string()), vec!["apple", "avocado", "apricot"]),
        ]
    );
}

#[rstest]
fn groups_sorted_by_size() {
    let mut it = SortedGroupIterator::new(
        fruit_groups(),
        by_group_size(),
        comparer(SortKeyDefinition::new()),
        &DynamicContext::default(),
    );
    let out = drain(&mut it);
    let sizes: Vec<usize> = out.iter().map(|(_, m)| m.len()).collect();
    assert_eq!(sizes, vec![2, 2, 3]);
    // Equal sizes keep their original group order
    assert_eq!(out[0].0.as_deref(), Some("b"));
    assert_eq!(out[1].0.as_deref(), Some("c"));
    assert_eq!(out[2].0.as_deref(), Some("a"));
}

#[rstest]
fn sorted_boundary_groups_have_no_key() {
    let pattern: Rc<dyn GroupPattern<Word>> =
        Rc::new(|item: &Word, _focus: &FocusContext<Word>| -> Result<bool, Error> { Ok(item.starts_with('#')) });
    let items = vec!["#h1", "a", "b", "#h2", "c", "#h3", "d", "e", "f"];
    let groups =
        BoundaryGroupIterator::starting_with(VecCursor::new(items), pattern, &DynamicContext::default()).unwrap();
    let mut it = SortedGroupIterator::new(
        Box::new(groups),
        by_group_size(),
        comparer(SortKeyDefinition::new().with_order("descending")),
        &DynamicContext::default(),
    );
    assert_eq!(
        drain(&mut it),
        vec![
            (None, vec!["#h3", "d", "e", "f"]),
            (None, vec!["#h1", "a", "b"]),
            (None, vec!["#h2", "c"]),
        ]
    );
}

#[rstest]
fn group_sort_keys_are_evaluated_once_per_group() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let evaluator: Rc<dyn SortKeyEvaluator<Word>> =
        Rc::new(move |_i: usize, focus: &FocusContext<Word>| -> Result<Option<XdmAtomicValue>, Error> {
            counter.set(counter.get() + 1);
            Ok(focus.current_grouping_key().cloned())
        });
    let mut it = SortedGroupIterator::new(
        fruit_groups(),
        evaluator,
        comparer(SortKeyDefinition::new()),
        &DynamicContext::default(),
    );
    // group-by knows its group count, so lookahead does not sort
    assert!(it.has_next().unwrap());
    assert_eq!(calls.get(), 0);
    assert_eq!(it.group_count_hint(), None);

    assert_eq!(drain(&mut it).len(), 3);
    assert_eq!(calls.get(), 3);
    assert!(!it.has_next().unwrap());
    assert_eq!(it.next_group().unwrap(), None);
    assert_eq!(calls.get(), 3);
}

#[rstest]
fn members_restart_after_sorting() {
    let mut it = SortedGroupIterator::new(
        fruit_groups(),
        by_grouping_key(),
        comparer(SortKeyDefinition::new()),
        &DynamicContext::default(),
    );
    assert_eq!(it.position(), 0);
    assert_eq!(it.next_group().unwrap(), Some("apple"));
    assert_eq!(it.position(), 1);
    let mut partial = it.iterate_current_group();
    partial.next();
    let again: Vec<Word> = it.iterate_current_group().collect();
    assert_eq!(again, vec!["apple", "avocado", "apricot"]);
    assert_eq!(it.current_grouping_key(), Some(&XdmAtomicValue::from("a")));
}

#[rstest]
#[case(HostLanguage::Xslt, ErrorCode::XTDE1030)]
#[case(HostLanguage::XPath, ErrorCode::XPTY0004)]
fn incomparable_group_keys(#[case] host: HostLanguage, #[case] code: ErrorCode) {
    // First group sorts by a number, the others by a string
    let evaluator: Rc<dyn SortKeyEvaluator<Word>> =
        Rc::new(|_i: usize, focus: &FocusContext<Word>| -> Result<Option<XdmAtomicValue>, Error> {
            Ok(Some(if focus.position() == 1 {
                XdmAtomicValue::Integer(1)
            } else {
                XdmAtomicValue::from("x")
            }))
        });
    let ctx = DynamicContextBuilder::new().with_host_language(host).build();
    let comparers = vec![SortKeyDefinition::new().make_comparator(&ctx).unwrap()];
    let mut it = SortedGroupIterator::new(fruit_groups(), evaluator, comparers, &ctx);
    assert_eq!(it.next_group().unwrap_err().code_enum(), code);
    assert_eq!(it.next_group().unwrap_err().code_enum(), code);
}

#[rstest]
fn for_each_group_with_sort() {
    let fg = ForEachGroup::new(GroupingAlgorithm::By(initial()))
        .with_sort(vec![SortKeyDefinition::new().with_order("descending")], by_grouping_key());
    let mut it = fg.group_iterator(VecCursor::new(FRUIT.to_vec()), &DynamicContext::default()).unwrap();
    let keys: Vec<Option<String>> = drain(&mut it).into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![Some("c".into()), Some("b".into()), Some("a".into())]);
}

#[rstest]
fn for_each_group_sort_attributes_are_validated() {
    let fg = ForEachGroup::new(GroupingAlgorithm::By(initial()))
        .with_sort(vec![SortKeyDefinition::new().with_data_type("date")], by_grouping_key());
    let err = fg
        .group_iterator(VecCursor::new(FRUIT.to_vec()), &DynamicContext::default())
        .err()
        .expect("invalid data-type");
    assert_eq!(err.code_enum(), ErrorCode::XTDE0030);
}
