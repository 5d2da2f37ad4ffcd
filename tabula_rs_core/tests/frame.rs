use pretty_assertions::assert_eq;
use tabula_core::{
    df::StatType, Array, DataFrame, ElementKind, IntRange, Parallelism, TableError, Value,
};

fn prices() -> DataFrame<i64, &'static str> {
    DataFrame::from_columns(
        IntRange::new(0, 6),
        [
            ("ticker", Array::from_values(["a", "b", "a", "c", "b", "a"].map(Value::from).to_vec())),
            ("size", Array::Int(vec![3, 1, 3, 2, 1, 3])),
            ("price", Array::Double(vec![1.5, f64::NAN, 2.5, 4., f64::NAN, 0.5])),
        ],
    )
    .unwrap()
}

#[test]
fn test_key_ordinal_round_trip() {
    let frame = prices();
    let rows = frame.rows();
    for (i, key) in rows.keys().enumerate() {
        assert_eq!(rows.ordinal(key), Some(i));
        assert_eq!(rows.key(i), Some(key));
    }
    let cols = frame.cols();
    assert_eq!(cols.ordinal(&"price"), Some(2));
    assert_eq!(cols.ordinal(&"volume"), None);
}

#[test]
fn test_sort_is_stable_and_idempotent() {
    let mut frame = prices();
    frame.rows_mut().sort_by(true, &"size").unwrap();
    let once = frame.rows().key_array();
    assert_eq!(once, vec![1, 4, 3, 0, 2, 5]);
    frame.rows_mut().sort_by(true, &"size").unwrap();
    assert_eq!(frame.rows().key_array(), once);

    frame.rows_mut().sort_by(false, &"price").unwrap();
    assert_eq!(frame.rows().key_array(), vec![3, 2, 0, 5, 1, 4]);
    assert!(matches!(
        frame.rows_mut().sort_by(true, &"missing"),
        Err(TableError::KeyNotFound { .. })
    ));
}

#[test]
fn test_fill_is_bounded() {
    let mut frame = DataFrame::from_columns(
        0..6,
        [("x", Array::Double(vec![1., f64::NAN, f64::NAN, f64::NAN, 5., f64::NAN]))],
    )
    .unwrap();
    assert_eq!(frame.fill().down(2), 3);
    let filled = frame.column(&"x").unwrap().to_doubles().unwrap();
    assert_eq!(&filled[..3], &[1., 1., 1.]);
    assert!(filled[3].is_nan());
    assert_eq!(&filled[4..], &[5., 5.]);
}

#[test]
fn test_algebra_leaves_inputs_untouched() {
    let left = prices().cols().select_keys([&"size", &"price"]).unwrap();
    let right = left.copy();
    let sum = left.plus(&right).unwrap();
    assert_eq!(sum.get_int(&0, &"size").unwrap(), 6);
    assert_eq!(left.get_int(&0, &"size").unwrap(), 3);

    let narrow = left.cols().select_keys([&"size"]).unwrap();
    assert!(matches!(
        left.times(&narrow),
        Err(TableError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        prices().plus_scalar(1),
        Err(TableError::NotNumeric { .. })
    ));
}

fn snapshot(frame: &DataFrame<i64, &'static str>) -> (Vec<i64>, Vec<&'static str>, Vec<Array>) {
    let cols = frame.cols().key_array();
    let data = cols.iter().map(|c| frame.column(c).unwrap().clone()).collect();
    (frame.rows().key_array(), cols, data)
}

#[test]
fn test_row_count_mismatch_leaves_operands_untouched() {
    let short = prices()
        .cols()
        .select_keys([&"size", &"price"])
        .unwrap()
        .rows()
        .select_range(0, 2)
        .unwrap();
    let tall = prices()
        .cols()
        .select_keys([&"size", &"price"])
        .unwrap()
        .rows()
        .select_range(0, 3)
        .unwrap();
    let (short_before, tall_before) = (snapshot(&short), snapshot(&tall));
    for result in [short.plus(&tall), tall.minus(&short), short.divide(&tall)] {
        assert!(matches!(
            result,
            Err(TableError::ShapeMismatch { .. })
        ));
    }
    assert!(matches!(
        short.plus(&tall),
        Err(TableError::ShapeMismatch {
            left: (2, 2),
            right: (3, 2),
            ..
        })
    ));
    assert_eq!(snapshot(&short), short_before);
    assert_eq!(snapshot(&tall), tall_before);
}

#[test]
fn test_dot_identity_in_both_modes() {
    let matrix = DataFrame::from_columns(
        ["r0", "r1"],
        [("c0", Array::Int(vec![1, 3])), ("c1", Array::Int(vec![2, 4]))],
    )
    .unwrap();
    for parallelism in [Parallelism::Sequential, Parallelism::Parallel] {
        let mut identity = DataFrame::<&str, &str>::of_doubles(["r0", "r1"], ["r0", "r1"]).unwrap();
        identity.set_parallelism(parallelism);
        identity
            .apply_doubles(|v| Ok(if v.row_key() == v.col_key() { 1. } else { 0. }))
            .unwrap();
        let product = identity.dot(&matrix).unwrap();
        assert_eq!(product.column(&"c0").unwrap(), &Array::Double(vec![1., 3.]));
        assert_eq!(product.column(&"c1").unwrap(), &Array::Double(vec![2., 4.]));
    }
}

#[test]
fn test_copy_isolation() {
    let original = prices();
    let mut copy = original.copy();
    copy.set_value(&0, &"ticker", "z").unwrap();
    copy.rows_mut().sort_keys(false);
    copy.add_column("flag", ElementKind::Boolean).unwrap();
    assert_eq!(original.get_value(&0, &"ticker").unwrap(), Value::from("a"));
    assert_eq!(original.rows().first_key(), Some(&0));
    assert_eq!(original.col_count(), 3);
}

#[test]
fn test_expanding_stats() {
    let frame = DataFrame::from_columns(0..5, [("x", Array::Double(vec![1., 2., 3., 4., 5.]))]).unwrap();
    let expanding = frame.cols().stats().expanding(1).unwrap();
    let mean = expanding.mean();
    assert_eq!(mean.get_double_at(4, 0).unwrap(), 3.);
    let count = expanding.get(StatType::Count);
    assert_eq!(count.get_double_at(4, 0).unwrap(), 5.);
    let rolling = frame.cols().stats().rolling(3).unwrap().sum();
    assert!(rolling.get_double_at(1, 0).unwrap().is_nan());
    assert_eq!(rolling.get_double_at(4, 0).unwrap(), 12.);
}

#[test]
fn test_group_by_first_appearance() {
    let frame = prices();
    let groups = frame.rows().group_by(&["ticker"]).unwrap();
    assert_eq!(groups.len(), 3);
    let a = groups.group(&[Value::from("a")]).unwrap();
    assert_eq!(a.rows().key_array(), vec![0, 2, 5]);
    assert_eq!(a.cols().stats().mean().get_double(&"price", &StatType::Mean).unwrap(), 1.5);
}
