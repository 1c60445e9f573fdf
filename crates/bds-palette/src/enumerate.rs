//! Cartesian expansion of per-dimension domains.

use crate::harvest::{StateDomains, StateValue};

/// Every combination of one value per dimension.
///
/// Dimensions vary in declaration order with the last one changing fastest.
/// No dimensions yields one empty combination. An empty domain yields none.
#[derive(Debug, Clone)]
pub struct Permutations<'a> {
    dims: Vec<(&'a str, &'a [StateValue])>,
    odometer: Vec<usize>,
    done: bool,
}

impl<'a> Permutations<'a> {
    #[must_use]
    pub fn new(domains: &'a StateDomains) -> Self {
        let dims: Vec<_> = domains
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
            .collect();
        let done = dims.iter().any(|(_, values)| values.is_empty());
        Self {
            odometer: vec![0; dims.len()],
            dims,
            done,
        }
    }

    /// Number of combinations, saturating.
    #[must_use]
    pub fn count_all(domains: &StateDomains) -> usize {
        domains
            .values()
            .fold(1usize, |acc, values| acc.saturating_mul(values.len()))
    }

    fn advance(&mut self) {
        for (slot, (_, values)) in self.odometer.iter_mut().zip(&self.dims).rev() {
            *slot += 1;
            if *slot < values.len() {
                return;
            }
            *slot = 0;
        }
        self.done = true;
    }
}

impl<'a> Iterator for Permutations<'a> {
    type Item = Vec<(&'a str, &'a StateValue)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self
            .dims
            .iter()
            .zip(&self.odometer)
            .map(|(&(name, values), &i)| (name, &values[i]))
            .collect();
        self.advance();
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use super::*;

    fn domains(dims: &[(&str, &[StateValue])]) -> StateDomains {
        dims.iter()
            .map(|(name, values)| ((*name).to_owned(), values.to_vec()))
            .collect()
    }

    #[test]
    fn test_last_dimension_varies_fastest() {
        let d = domains(&[
            ("facing", &["north".into(), "south".into()]),
            ("open", &[false.into(), true.into()]),
        ]);
        let all: Vec<Vec<String>> = Permutations::new(&d)
            .map(|combo| combo.iter().map(|(n, v)| format!("{n}={v:?}")).collect())
            .collect();
        assert_eq!(all.len(), 4);
        assert_eq!(
            all[1],
            [
                "facing=String(\"north\")".to_owned(),
                "open=Bool(true)".to_owned()
            ]
        );
        assert_eq!(all[2][0], "facing=String(\"south\")");
    }

    #[test]
    fn test_no_dimensions_is_one_empty_combination() {
        let d = IndexMap::new();
        let all: Vec<_> = Permutations::new(&d).collect();
        assert_eq!(all, vec![Vec::new()]);
        assert_eq!(Permutations::count_all(&d), 1);
    }

    #[test]
    fn test_empty_domain_yields_nothing() {
        let d = domains(&[("age", &[0.into(), 1.into()]), ("broken", &[])]);
        assert_eq!(Permutations::new(&d).count(), 0);
        assert_eq!(Permutations::count_all(&d), 0);
    }

    #[test]
    fn test_count_matches_product() {
        let d = domains(&[
            ("a", &[0.into(), 1.into(), 2.into()]),
            ("b", &[false.into(), true.into()]),
            ("c", &["x".into(), "y".into(), "z".into(), "w".into()]),
        ]);
        assert_eq!(Permutations::new(&d).count(), 24);
        assert_eq!(Permutations::count_all(&d), 24);
    }
}
