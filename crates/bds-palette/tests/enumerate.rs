use std::collections::HashSet;

use bds_palette::{StateValue, enumerate::Permutations, harvest::StateDomains};
use proptest::prelude::*;

fn domains(sizes: &[usize]) -> StateDomains {
    sizes
        .iter()
        .enumerate()
        .map(|(d, &n)| {
            (
                format!("dim_{d}"),
                (0..n as i32).map(StateValue::Int).collect(),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn combinations_are_the_full_product(sizes in prop::collection::vec(1usize..5, 0..5)) {
        let d = domains(&sizes);
        let all: Vec<_> = Permutations::new(&d).collect();
        prop_assert_eq!(all.len(), sizes.iter().product::<usize>());
        prop_assert_eq!(all.len(), Permutations::count_all(&d));

        let unique: HashSet<_> = all.iter().collect();
        prop_assert_eq!(unique.len(), all.len());
        prop_assert!(all.iter().all(|combo| combo.len() == sizes.len()));
    }
}
