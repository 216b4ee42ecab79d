//! Property-based relational algebra tests (proptest).

use proptest::prelude::*;

use relq::{join, sort, Filter, Query, Relation, SortSpec, Value};

/// Build a users-like relation from generated (age, country-code) pairs.
/// The row index is carried as a field so order properties are checkable.
fn users_from(rows: &[(i64, u8)]) -> Relation {
    const COUNTRIES: [&str; 3] = ["US", "IE", "FR"];
    Relation::build(
        ["row", "age", "country"],
        rows.iter()
            .enumerate()
            .map(|(i, &(age, country))| {
                vec![
                    Value::Int64(i as i64),
                    Value::Int64(age),
                    COUNTRIES[usize::from(country) % COUNTRIES.len()].into(),
                ]
            })
            .collect(),
    )
    .expect("generated rows are well-formed")
}

fn scores_from(rows: &[(u8, i64)]) -> Relation {
    Relation::build(
        ["row", "score"],
        rows.iter()
            .map(|&(row, score)| vec![Value::Int64(i64::from(row)), Value::Int64(score)])
            .collect(),
    )
    .expect("generated rows are well-formed")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Projection preserves row count, row order, and field values
    #[test]
    fn prop_projection_preserves_rows(rows in prop::collection::vec((0i64..100, 0u8..3), 0..40)) {
        let relation = users_from(&rows);
        let projected = relation.project(&["age".into()]).expect("age is declared");

        prop_assert_eq!(projected.len(), relation.len());
        for (i, tuple) in projected.iter().enumerate() {
            prop_assert_eq!(tuple.arity(), 1);
            prop_assert_eq!(tuple.get(0), relation.tuples()[i].get(1));
        }
    }

    /// Applying the same filter twice yields the same relation as once
    #[test]
    fn prop_filter_idempotent(rows in prop::collection::vec((0i64..100, 0u8..3), 0..40), threshold in 0i64..100) {
        let relation = users_from(&rows);
        let filter = Filter::custom(&["age"], move |values| {
            values[0].as_i64().unwrap_or(0) >= threshold
        });

        let once = filter.apply(&relation).expect("filter");
        let twice = filter.apply(&once).expect("filter");
        prop_assert_eq!(once, twice);
    }

    /// Joining A with B yields the same set of combined rows as B with A
    #[test]
    fn prop_join_symmetry(
        left in prop::collection::vec((0i64..20, 0u8..3), 0..20),
        right in prop::collection::vec((0u8..20, 0i64..1000), 0..20),
    ) {
        let a = users_from(&left);
        let b = scores_from(&right);

        let ab = join(&a, &b).expect("shared field 'row'");
        let ba = join(&b, &a).expect("shared field 'row'");
        prop_assert_eq!(ab.len(), ba.len());

        let fields: Vec<String> = ab.schema().field_names().to_vec();
        let ba = ba.project(&fields).expect("same logical fields");

        let mut ab_rows: Vec<String> = ab.iter().map(|t| t.to_string()).collect();
        let mut ba_rows: Vec<String> = ba.iter().map(|t| t.to_string()).collect();
        ab_rows.sort();
        ba_rows.sort();
        prop_assert_eq!(ab_rows, ba_rows);
    }

    /// Rows with equal sort keys keep their original relative order
    #[test]
    fn prop_sort_stability(rows in prop::collection::vec((0i64..5, 0u8..3), 0..40)) {
        let relation = users_from(&rows);
        let sorted = sort(&relation, &SortSpec::by(["age"]).descending())
            .expect("age is declared");

        // Within each age, the carried row index must stay increasing
        let mut last_row_for_age: std::collections::HashMap<i64, i64> =
            std::collections::HashMap::new();
        for tuple in sorted.iter() {
            let row = tuple.get(0).and_then(Value::as_i64).expect("row field");
            let age = tuple.get(1).and_then(Value::as_i64).expect("age field");
            if let Some(&previous) = last_row_for_age.get(&age) {
                prop_assert!(previous < row, "order broken within age {}", age);
            }
            last_row_for_age.insert(age, row);
        }
    }

    /// Top-N-per-group never emits more than N rows per group, and the
    /// total row count never grows
    #[test]
    fn prop_top_n_bounds(rows in prop::collection::vec((0i64..50, 0u8..3), 0..40), n in 1usize..4) {
        let relation = users_from(&rows);
        let out = Query::from(relation.clone())
            .top_per_group(&["country"], &["age"], n)
            .evaluate()
            .expect("query");

        prop_assert!(out.len() <= relation.len());

        let mut per_group: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();
        for tuple in out.iter() {
            let country = tuple
                .get(2)
                .and_then(|v| v.as_str().map(String::from))
                .expect("country field");
            *per_group.entry(country).or_default() += 1;
        }
        for (country, count) in per_group {
            prop_assert!(count <= n, "group {} has {} rows", country, count);
        }
    }
}
