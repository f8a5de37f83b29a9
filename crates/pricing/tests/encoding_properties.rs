use std::collections::BTreeMap;

use autoprice::{CategoryCodeTable, ListingTable, TableKind};
use proptest::prelude::*;

fn table(kind: TableKind, brands: &[Option<String>]) -> ListingTable {
    let headers = vec!["id".to_string(), "brand".to_string()];
    let rows = brands
        .iter()
        .enumerate()
        .map(|(i, brand)| vec![Some(i.to_string()), brand.clone()])
        .collect();
    ListingTable::new(kind, headers, rows).unwrap()
}

fn brand() -> impl Strategy<Value = Option<String>> {
    prop::option::weighted(0.9, "[A-Za-z][A-Za-z -]{0,8}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn codes_are_shared_and_injective(
        train in prop::collection::vec(brand(), 1..40),
        eval in prop::collection::vec(brand(), 1..40),
    ) {
        let columns = vec!["brand".to_string()];
        let training = table(TableKind::Training, &train);
        let evaluation = table(TableKind::Evaluation, &eval);
        let codes = CategoryCodeTable::fit_union(&columns, &[&training, &evaluation]).unwrap();

        let mut seen: BTreeMap<u32, Option<String>> = BTreeMap::new();
        for (kind, values) in [(TableKind::Training, &train), (TableKind::Evaluation, &eval)] {
            for value in values {
                let code = codes.encode(kind, "brand", value.as_deref()).unwrap();
                prop_assert!((code as usize) < codes.cardinality("brand"));
                if let Some(previous) = seen.insert(code, value.clone()) {
                    // absent cells share the placeholder category
                    let same = previous == *value
                        || previous.as_deref().unwrap_or("nan") == value.as_deref().unwrap_or("nan");
                    prop_assert!(same);
                }
            }
        }

        // codes are dense
        prop_assert_eq!(seen.len(), codes.cardinality("brand"));
    }

    #[test]
    fn union_does_not_depend_on_table_order(
        train in prop::collection::vec(brand(), 1..30),
        eval in prop::collection::vec(brand(), 1..30),
    ) {
        let columns = vec!["brand".to_string()];
        let training = table(TableKind::Training, &train);
        let evaluation = table(TableKind::Evaluation, &eval);

        let forward = CategoryCodeTable::fit_union(&columns, &[&training, &evaluation]).unwrap();
        let reverse = CategoryCodeTable::fit_union(&columns, &[&evaluation, &training]).unwrap();
        prop_assert_eq!(forward, reverse);
    }
}
