//! Sort order tests: stability, key priority, descending order, empty keys
//! and comparison failures.

use platynui_xpath_order::context::FocusContext;
use platynui_xpath_order::{
    DynamicContext, DynamicContextBuilder, Error, ErrorCode, HostLanguage, SortExpression, SortKeyDefinition,
    SortKeyEvaluator, VecCursor, XdmAtomicValue,
};
use rstest::rstest;
use std::rc::Rc;

type Row = (i64, &'static str);

// Key 0 is the number, key 1 the tag.
fn row_keys() -> Rc<dyn SortKeyEvaluator<Row>> {
    Rc::new(|index: usize, focus: &FocusContext<Row>| -> Result<Option<XdmAtomicValue>, Error> {
        let (n, tag) = *focus.item().expect("item bound");
        Ok(Some(if index == 0 { XdmAtomicValue::Integer(n) } else { XdmAtomicValue::from(tag) }))
    })
}

// The item itself is the only key.
fn identity() -> Rc<dyn SortKeyEvaluator<Option<XdmAtomicValue>>> {
    Rc::new(
        |_index: usize, focus: &FocusContext<Option<XdmAtomicValue>>| -> Result<Option<XdmAtomicValue>, Error> {
            Ok(focus.item().cloned().flatten())
        },
    )
}

fn sort_rows(rows: Vec<Row>, keys: Vec<SortKeyDefinition>) -> Vec<Row> {
    let ctx = DynamicContext::default();
    SortExpression::new(keys)
        .iterate(VecCursor::new(rows), row_keys(), &ctx)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn sort_values(values: Vec<Option<XdmAtomicValue>>, key: SortKeyDefinition) -> Vec<String> {
    let ctx = DynamicContext::default();
    SortExpression::new(vec![key])
        .iterate(VecCursor::new(values), identity(), &ctx)
        .unwrap()
        .map(|r| r.unwrap().map_or_else(|| "()".to_string(), |v| v.string_value()))
        .collect()
}

fn strings(values: &[&str]) -> Vec<Option<XdmAtomicValue>> {
    values.iter().map(|s| Some(XdmAtomicValue::from(*s))).collect()
}

#[rstest]
fn equal_keys_keep_input_order() {
    let out = sort_rows(vec![(1, "a"), (1, "b"), (1, "c")], vec![SortKeyDefinition::new()]);
    assert_eq!(out, vec![(1, "a"), (1, "b"), (1, "c")]);
}

#[rstest]
fn stability_holds_for_large_inputs() {
    // Large enough to go through partitioning, not only insertion sort
    let rows: Vec<(i64, usize)> = (0..500).map(|i| ((i * 7 % 5) as i64, i)).collect();
    let evaluator: Rc<dyn SortKeyEvaluator<(i64, usize)>> =
        Rc::new(|_i: usize, focus: &FocusContext<(i64, usize)>| -> Result<Option<XdmAtomicValue>, Error> {
            Ok(focus.item().map(|(k, _)| XdmAtomicValue::Integer(*k)))
        });
    let ctx = DynamicContext::default();
    let out: Vec<(i64, usize)> = SortExpression::new(vec![SortKeyDefinition::new()])
        .iterate(VecCursor::new(rows), evaluator, &ctx)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(out.len(), 500);
    for pair in out.windows(2) {
        let ((ka, ia), (kb, ib)) = (pair[0], pair[1]);
        assert!(ka < kb || (ka == kb && ia < ib), "{:?} before {:?}", pair[0], pair[1]);
    }
}

#[rstest]
#[case("ascending", vec![1, 2, 3])]
#[case("descending", vec![3, 2, 1])]
fn single_numeric_key(#[case] order: &str, #[case] expected: Vec<i64>) {
    let rows = vec![(3, "x"), (1, "y"), (2, "z")];
    let out = sort_rows(rows, vec![SortKeyDefinition::new().with_order(order)]);
    assert_eq!(out.into_iter().map(|(n, _)| n).collect::<Vec<_>>(), expected);
}

#[rstest]
fn descending_keeps_ties_in_input_order() {
    let rows = vec![(1, "a"), (2, "b"), (1, "c"), (2, "d")];
    let out = sort_rows(rows, vec![SortKeyDefinition::new().with_order("descending")]);
    assert_eq!(out, vec![(2, "b"), (2, "d"), (1, "a"), (1, "c")]);
}

#[rstest]
fn second_key_breaks_ties() {
    let rows = vec![(1, "b"), (1, "a"), (2, "a")];
    let out = sort_rows(rows, vec![SortKeyDefinition::new(), SortKeyDefinition::new()]);
    assert_eq!(out, vec![(1, "a"), (1, "b"), (2, "a")]);
}

#[rstest]
fn keys_have_independent_orders() {
    let rows = vec![(1, "a"), (2, "a"), (1, "b"), (2, "b")];
    let keys = vec![
        SortKeyDefinition::new().with_order("descending"),
        SortKeyDefinition::new().with_order("descending"),
    ];
    assert_eq!(sort_rows(rows.clone(), keys), vec![(2, "b"), (2, "a"), (1, "b"), (1, "a")]);
    let keys = vec![SortKeyDefinition::new(), SortKeyDefinition::new().with_order("descending")];
    assert_eq!(sort_rows(rows, keys), vec![(1, "b"), (1, "a"), (2, "b"), (2, "a")]);
}

#[rstest]
#[case(SortKeyDefinition::new(), vec!["()", "1", "2"])]
#[case(SortKeyDefinition::new().with_empty_least(false), vec!["1", "2", "()"])]
#[case(SortKeyDefinition::new().with_order("descending"), vec!["2", "1", "()"])]
#[case(SortKeyDefinition::new().with_order("descending").with_empty_least(false), vec!["()", "2", "1"])]
fn empty_key_placement(#[case] key: SortKeyDefinition, #[case] expected: Vec<&str>) {
    let values = vec![Some(XdmAtomicValue::Integer(2)), None, Some(XdmAtomicValue::Integer(1))];
    assert_eq!(sort_values(values, key), expected);
}

#[rstest]
fn nan_sorts_after_empty_before_numbers() {
    let values = vec![
        Some(XdmAtomicValue::Double(1.5)),
        Some(XdmAtomicValue::Double(f64::NAN)),
        None,
        Some(XdmAtomicValue::Integer(-4)),
    ];
    assert_eq!(sort_values(values, SortKeyDefinition::new()), vec!["()", "NaN", "-4", "1.5"]);
}

#[rstest]
#[case("number", vec!["2", "9", "10"])]
#[case("text", vec!["10", "2", "9"])]
fn data_type_selects_comparison(#[case] data_type: &str, #[case] expected: Vec<&str>) {
    let key = SortKeyDefinition::new().with_data_type(data_type);
    assert_eq!(sort_values(strings(&["10", "9", "2"]), key), expected);
}

#[rstest]
fn number_data_type_puts_non_numbers_first() {
    let key = SortKeyDefinition::new().with_data_type("number");
    assert_eq!(sort_values(strings(&["3", "abc", "1"]), key), vec!["abc", "1", "3"]);
}

#[rstest]
#[case("upper-first", vec!["A", "a", "B", "b"])]
#[case("lower-first", vec!["a", "A", "b", "B"])]
fn case_order(#[case] order: &str, #[case] expected: Vec<&str>) {
    let key = SortKeyDefinition::new().with_case_order(order);
    assert_eq!(sort_values(strings(&["b", "B", "a", "A"]), key), expected);
}

#[rstest]
fn collation_controls_string_order() {
    let values = strings(&["b", "A", "a", "B"]);
    assert_eq!(sort_values(values.clone(), SortKeyDefinition::new()), vec!["A", "B", "a", "b"]);
    let key = SortKeyDefinition::new().with_collation(platynui_xpath_order::consts::SIMPLE_CASE_URI);
    assert_eq!(sort_values(values, key), vec!["A", "a", "b", "B"]);
}

#[rstest]
#[case(HostLanguage::Xslt, ErrorCode::XTDE1030)]
#[case(HostLanguage::XPath, ErrorCode::XPTY0004)]
#[case(HostLanguage::XQuery, ErrorCode::XPTY0004)]
fn incomparable_keys_fail_with_host_code(#[case] host: HostLanguage, #[case] code: ErrorCode) {
    let ctx = DynamicContextBuilder::new().with_host_language(host).build();
    let values = vec![Some(XdmAtomicValue::Integer(1)), Some(XdmAtomicValue::from("x"))];
    let mut sorted = SortExpression::new(vec![SortKeyDefinition::new()])
        .iterate(VecCursor::new(values), identity(), &ctx)
        .unwrap();
    let err = sorted.next().unwrap().unwrap_err();
    assert_eq!(err.code_enum(), code);
    assert!(err.source.is_some());
    assert!(sorted.next().is_none());
}

#[rstest]
fn mixed_numeric_types_sort_together() {
    let values = vec![
        Some(XdmAtomicValue::Double(2.5)),
        Some(XdmAtomicValue::Integer(2)),
        Some(XdmAtomicValue::Float(-1.0)),
        Some(XdmAtomicValue::Decimal(3.25)),
    ];
    assert_eq!(sort_values(values, SortKeyDefinition::new()), vec!["-1", "2", "2.5", "3.25"]);
}
