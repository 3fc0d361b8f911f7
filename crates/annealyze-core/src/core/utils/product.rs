/// Expands per-key option lists into every combination, first key varying slowest.
///
/// Each combination lists `(key, value)` in the order of `axes`. Expansion stops once
/// `limit` combinations have been produced. An axis with no options yields no combinations;
/// no axes at all yields a single empty combination.
pub fn cartesian_product<K: Clone, V: Clone>(
    axes: &[(K, Vec<V>)],
    limit: Option<usize>,
) -> Vec<Vec<(K, V)>> {
    if axes.iter().any(|(_, options)| options.is_empty()) {
        return Vec::new();
    }

    let mut combinations = Vec::new();
    let mut cursor = vec![0usize; axes.len()];
    loop {
        if limit.is_some_and(|max| combinations.len() >= max) {
            return combinations;
        }
        combinations.push(
            axes.iter()
                .zip(&cursor)
                .map(|((key, options), &i)| (key.clone(), options[i].clone()))
                .collect(),
        );

        let mut axis = axes.len();
        loop {
            if axis == 0 {
                return combinations;
            }
            axis -= 1;
            cursor[axis] += 1;
            if cursor[axis] < axes[axis].1.len() {
                break;
            }
            cursor[axis] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_in_odometer_order() {
        let axes = vec![("a", vec![1, 2]), ("b", vec![10, 20, 30])];
        let combos = cartesian_product(&axes, None);
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0], vec![("a", 1), ("b", 10)]);
        assert_eq!(combos[1], vec![("a", 1), ("b", 20)]);
        assert_eq!(combos[3], vec![("a", 2), ("b", 10)]);
        assert_eq!(combos[5], vec![("a", 2), ("b", 30)]);
    }

    #[test]
    fn limit_caps_the_number_of_combinations() {
        let axes = vec![("a", vec![1, 2, 3]), ("b", vec![1, 2, 3])];
        let combos = cartesian_product(&axes, Some(4));
        assert_eq!(combos.len(), 4);
        assert_eq!(combos[3], vec![("a", 2), ("b", 1)]);
    }

    #[test]
    fn empty_axis_produces_nothing() {
        let axes: Vec<(&str, Vec<u8>)> = vec![("a", vec![1]), ("b", vec![])];
        assert!(cartesian_product(&axes, None).is_empty());
    }

    #[test]
    fn no_axes_produce_one_empty_combination() {
        let axes: Vec<(&str, Vec<u8>)> = Vec::new();
        assert_eq!(cartesian_product(&axes, None), vec![Vec::new()]);
    }

    #[test]
    fn handles_many_axes_without_recursion() {
        let axes: Vec<(usize, Vec<u8>)> = (0..5000).map(|i| (i, vec![0, 1])).collect();
        let combos = cartesian_product(&axes, Some(3));
        assert_eq!(combos.len(), 3);
        assert_eq!(combos[1][4999], (4999, 1));
    }
}
