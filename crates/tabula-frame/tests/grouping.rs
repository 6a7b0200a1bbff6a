mod common;

use common::{people, sleep_data, strings};
use pretty_assertions::assert_eq;
use tabula_frame::{
    expr, Column, ColumnType, Evaluated, FrameError, GroupKey, NullPolicy, Selector, SortKey,
    Table, Value,
};

#[test]
fn null_is_a_group_of_its_own() {
    let grouped = sleep_data().group_by(&["vore"]).unwrap();
    assert_eq!(grouped.len(), 5);

    let keys = grouped.keys().unwrap();
    assert_eq!(keys.names(), vec!["vore"]);
    assert_eq!(
        strings(&keys, "vore"),
        vec![
            Some("carni".to_string()),
            Some("omni".to_string()),
            Some("herbi".to_string()),
            None,
            Some("insecti".to_string()),
        ]
    );

    let unknown = grouped
        .group(&GroupKey::new([("vore", Value::Null)]))
        .unwrap();
    assert_eq!(
        strings(unknown, "name"),
        vec![Some("Vesper mouse".to_string()), Some("Vole".to_string())]
    );
}

#[test]
fn key_order_does_not_matter() {
    let a = people().group_by(&["age", "last_name"]).unwrap();
    let b = people().group_by(&["last_name", "age"]).unwrap();
    let keys_a: Vec<&GroupKey> = a.groups().map(|g| g.key()).collect();
    let keys_b: Vec<&GroupKey> = b.groups().map(|g| g.key()).collect();
    assert_eq!(keys_a, keys_b);
    assert_eq!(a.len(), 4);
}

#[test]
fn ungroup_restores_every_row() {
    let sleep = sleep_data();
    let grouped = sleep.group_by(&["order"]).unwrap();
    let back = grouped.ungroup().unwrap();
    assert_eq!(back.nrow(), sleep.nrow());
    assert_eq!(back.names(), sleep.names());

    let mut expected = strings(&sleep, "name");
    let mut actual = strings(&back, "name");
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);
}

#[test]
fn grouped_summarize_has_one_row_per_group() {
    let out = people()
        .group_by(&["age"])
        .unwrap()
        .summarize_many(&[
            expr("mean_weight", |ctx| {
                Ok(ctx.col("weight")?.mean(NullPolicy::Exclude)?.into())
            }),
            expr("n", |ctx| Ok(ctx.nrow().into())),
        ])
        .unwrap();

    assert_eq!(out.names(), vec!["age", "mean_weight", "n"]);
    assert_eq!(out.column("age").unwrap().values(), vec![Value::Int(23), Value::Int(12)]);
    assert_eq!(
        out.column("mean_weight").unwrap().values(),
        vec![Value::Double(71.5), Value::Double(82.0)]
    );
}

#[test]
fn grouped_summarize_sees_the_group_key() {
    let out = sleep_data()
        .group_by(&["vore"])
        .unwrap()
        .summarize("label", |ctx| {
            let key = ctx.group_key().and_then(|k| k.get("vore")).cloned();
            Ok(Value::from(format!("{}", key.unwrap_or_default())).into())
        })
        .unwrap();
    assert_eq!(out.value(3, "label").unwrap(), Value::from("NA"));
}

#[test]
fn grouped_summarize_rejects_sequences() {
    let err = sleep_data()
        .group_by(&["vore"])
        .unwrap()
        .summarize("all", |ctx| Ok(ctx.col("name")?.into()))
        .unwrap_err();
    assert!(matches!(err, FrameError::NonScalarValue { .. }));
}

#[test]
fn grouped_select_keeps_key_columns_first() {
    let grouped = sleep_data().group_by(&["vore", "order"]).unwrap();
    let picked = grouped
        .select(&[Selector::starts_with("sleep"), "name".into()])
        .unwrap();
    assert_eq!(
        picked.names(),
        vec!["vore", "order", "name", "sleep_total", "sleep_rem"]
    );
    assert_eq!(picked.ncol(), 5);
    assert_eq!(picked.nrow(), 12);
}

#[test]
fn grouped_mutate_is_per_group() {
    let out = people()
        .group_by(&["last_name"])
        .unwrap()
        .mutate("family_size", |ctx| Ok(ctx.nrow().into()))
        .unwrap()
        .ungroup()
        .unwrap();
    let sizes: Vec<(Option<String>, Value)> = strings(&out, "first_name")
        .into_iter()
        .zip(out.column("family_size").unwrap().values())
        .collect();
    assert!(sizes.contains(&(Some("Anna".to_string()), Value::Int(2))));
    assert!(sizes.contains(&(Some("Horst".to_string()), Value::Int(1))));
}

#[test]
fn grouped_mutate_cannot_touch_keys() {
    let err = people()
        .group_by(&["age"])
        .unwrap()
        .mutate("age", |_| Ok(Evaluated::from(0i64)))
        .unwrap_err();
    assert!(matches!(err, FrameError::GroupingColumn { .. }));
}

#[test]
fn grouped_filter_drops_emptied_groups() {
    let grouped = sleep_data().group_by(&["vore"]).unwrap();
    let out = grouped
        .filter(|ctx| Ok(ctx.col("sleep_total")?.gt(14.0)))
        .unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(out.nrow(), 5);
    assert_eq!(out.ncol(), 7);
}

#[test]
fn grouped_row_verbs() {
    let grouped = sleep_data().group_by(&["vore"]).unwrap();

    let heads = grouped.head(1).unwrap();
    assert_eq!(heads.nrow(), 5);

    let tails = grouped.tail(2).unwrap();
    assert_eq!(tails.nrow(), 2 + 2 + 2 + 2 + 1);

    let sliced = grouped.slice(&[3]).unwrap();
    assert_eq!(sliced.len(), 2);
    assert!(grouped.slice(&[0]).is_err());

    let sorted = grouped
        .arrange(&[SortKey::desc("sleep_total")])
        .unwrap()
        .head(1)
        .unwrap()
        .ungroup()
        .unwrap();
    assert_eq!(
        strings(&sorted, "name"),
        ["Cheetah", "Owl monkey", "Mountain beaver", "Vole", "Big brown bat"]
            .map(|s| Some(s.to_string()))
            .to_vec()
    );
    // Tie at 14.4 between beaver and sloth keeps input order.
    let herbi = grouped
        .arrange(&[SortKey::desc("sleep_total")])
        .unwrap()
        .group(&GroupKey::new([("vore", Value::from("herbi"))]))
        .cloned()
        .unwrap();
    assert_eq!(strings(&herbi, "name")[0].as_deref(), Some("Mountain beaver"));
}

#[test]
fn grouped_count_matches_table_count() {
    let sleep = sleep_data();
    assert_eq!(
        sleep.group_by(&["vore"]).unwrap().count().unwrap(),
        sleep.count(&["vore"]).unwrap()
    );
}

#[test]
fn empty_key_list_yields_a_single_group() {
    let grouped = people().group_by::<&str>(&[]).unwrap();
    assert_eq!(grouped.len(), 1);
    let counted = grouped.count().unwrap();
    assert_eq!(counted.names(), vec!["n"]);
    assert_eq!(counted.value(0, "n").unwrap(), Value::Int(4));

    assert!(Table::empty().group_by::<&str>(&[]).unwrap().is_empty());
}

#[test]
fn unknown_grouping_column() {
    assert!(matches!(
        people().group_by(&["shoe_size"]),
        Err(FrameError::UnknownColumn { .. })
    ));
}

#[test]
fn summarize_over_no_groups_keeps_schema() {
    let empty = people().filter(|ctx| Ok(ctx.col("age")?.gt(100))).unwrap();
    let out = empty
        .group_by(&["last_name"])
        .unwrap()
        .summarize("total", |ctx| {
            Ok(ctx.col("weight")?.sum(NullPolicy::Exclude)?.into())
        })
        .unwrap();
    assert_eq!(out.nrow(), 0);
    assert_eq!(out.names(), vec!["last_name", "total"]);
    assert_eq!(out.column("total").unwrap().column_type(), ColumnType::Int);
}

#[test]
fn groups_may_disagree_on_result_kind_when_one_is_all_null() {
    let table = Table::new(vec![
        Column::strings("k", [Some("a"), Some("b")]),
        Column::ints("v", [None, Some(4i64)]),
    ])
    .unwrap();
    let out = table
        .group_by(&["k"])
        .unwrap()
        .mutate("w", |ctx| Ok(ctx.col("v")?.max(NullPolicy::Propagate)?.into()))
        .unwrap()
        .ungroup()
        .unwrap();
    assert_eq!(out.column("w").unwrap().values(), vec![Value::Null, Value::Int(4)]);
}

#[test]
fn grouped_mutate_rejects_groups_with_different_result_kinds() {
    let table = Table::new(vec![
        Column::strings("k", [Some("a"), Some("b"), Some("a")]),
        Column::ints("v", [Some(1i64), Some(2), Some(3)]),
    ])
    .unwrap();
    let err = table
        .group_by(&["k"])
        .unwrap()
        .mutate("w", |ctx| {
            let first = ctx.group_key().and_then(|key| key.get("k")) == Some(&Value::from("a"));
            Ok(if first { Value::Int(1) } else { Value::Double(1.5) }.into())
        })
        .unwrap_err();
    match err {
        FrameError::TypeMismatch {
            column,
            expected,
            actual,
        } => {
            assert_eq!(column, "w");
            assert_eq!(expected, ColumnType::Int);
            assert_eq!(actual, ColumnType::Double);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn all_null_group_results_take_the_agreed_kind() {
    let table = Table::new(vec![
        Column::strings("k", [Some("a"), Some("b")]),
        Column::ints("v", [None, Some(4i64)]),
    ])
    .unwrap();
    let grouped = table
        .group_by(&["k"])
        .unwrap()
        .mutate("w", |ctx| Ok(ctx.col("v")?.max(NullPolicy::Propagate)?.into()))
        .unwrap();
    for group in grouped.groups() {
        assert_eq!(group.table().column("w").unwrap().column_type(), ColumnType::Int);
    }
}
