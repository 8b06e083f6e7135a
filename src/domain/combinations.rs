//! Combinatorial helpers used to enumerate course assignments.
//!
//! Every helper returns exactly one empty combination for empty input.

/// Every subset of `items`, preserving relative order within each subset.
///
/// Subsets not containing the first item come before those that do.
#[must_use]
pub fn subsets<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let Some((first, rest)) = items.split_first() else {
        return vec![Vec::new()];
    };
    let without = subsets(rest);
    let with = without.iter().map(|combination| {
        let mut combination = combination.clone();
        combination.insert(0, first.clone());
        combination
    });
    let mut all = without.clone();
    all.extend(with);
    all
}

/// Every subset of `items` with exactly `k` elements, in lexicographic index
/// order.
#[must_use]
pub fn choose<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if k > items.len() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for (position, item) in items.iter().enumerate() {
        for mut tail in choose(&items[position + 1..], k - 1) {
            tail.insert(0, item.clone());
            out.push(tail);
        }
    }
    out
}

/// Every subset of `items` whose total weight reaches `threshold` and would
/// fall below it if any one item were removed, in lexicographic index order.
///
/// A branch stops growing as soon as it reaches the threshold, and is cut
/// when the remaining items cannot make up the difference, so the search
/// never visits supersets of a cover.
#[must_use]
pub fn minimal_covers<T: Clone>(
    items: &[T],
    weight: impl Fn(&T) -> f32,
    threshold: f32,
) -> Vec<Vec<T>> {
    let weights: Vec<f32> = items.iter().map(weight).collect();
    let mut remaining = vec![0.0; items.len() + 1];
    for position in (0..items.len()).rev() {
        remaining[position] = remaining[position + 1] + weights[position].max(0.0);
    }

    let search = Cover {
        items,
        weights: &weights,
        remaining: &remaining,
        threshold,
    };
    let mut covers = Vec::new();
    search.extend(0, 0.0, &mut Vec::new(), &mut covers);
    covers
}

struct Cover<'a, T> {
    items: &'a [T],
    weights: &'a [f32],
    /// Sum of the non-negative weights from each position onwards.
    remaining: &'a [f32],
    threshold: f32,
}

impl<T: Clone> Cover<'_, T> {
    fn extend(
        &self,
        start: usize,
        total: f32,
        chosen: &mut Vec<usize>,
        covers: &mut Vec<Vec<T>>,
    ) {
        if total >= self.threshold {
            if chosen
                .iter()
                .all(|&position| total - self.weights[position] < self.threshold)
            {
                let cover = chosen
                    .iter()
                    .map(|&position| self.items[position].clone())
                    .collect();
                covers.push(cover);
            }
            return;
        }
        if total + self.remaining[start] < self.threshold {
            return;
        }
        for position in start..self.items.len() {
            chosen.push(position);
            self.extend(position + 1, total + self.weights[position], chosen, covers);
            chosen.pop();
        }
    }
}

/// The Cartesian product of `sets`: one element drawn from each set, in
/// order.
///
/// If any set is empty the product is empty.
#[must_use]
pub fn cartesian<T: Clone>(sets: &[Vec<T>]) -> Vec<Vec<T>> {
    sets.iter().fold(vec![Vec::new()], |partials, set| {
        partials
            .iter()
            .flat_map(|partial| {
                set.iter().map(move |element| {
                    let mut next = partial.clone();
                    next.push(element.clone());
                    next
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_yield_one_empty_combination() {
        let none: &[u8] = &[];
        assert_eq!(subsets(none), vec![Vec::<u8>::new()]);
        assert_eq!(choose(none, 0), vec![Vec::<u8>::new()]);
        assert_eq!(cartesian::<u8>(&[]), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn subsets_enumerates_power_set() {
        let all = subsets(&[1, 2, 3]);
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], Vec::<i32>::new());
        assert!(all.contains(&vec![1, 3]));
        assert!(all.contains(&vec![1, 2, 3]));
    }

    #[test]
    fn choose_picks_fixed_size_subsets() {
        assert_eq!(
            choose(&['a', 'b', 'c'], 2),
            vec![vec!['a', 'b'], vec!['a', 'c'], vec!['b', 'c']]
        );
        assert!(choose(&['a'], 2).is_empty());
    }

    #[test]
    fn minimal_covers_skip_redundant_items() {
        let covers = minimal_covers(&[('a', 2.0), ('b', 3.0), ('c', 6.0)], |item| item.1, 5.0);
        let names: Vec<String> = covers
            .iter()
            .map(|cover| cover.iter().map(|item| item.0).collect())
            .collect();
        assert_eq!(names, vec!["ab", "c"]);

        assert_eq!(minimal_covers(&[1.0_f32], |w| *w, 0.0), vec![Vec::<f32>::new()]);
        assert!(minimal_covers(&[1.0_f32, 1.0], |w| *w, 3.0).is_empty());
    }

    #[test]
    fn cartesian_crosses_all_sets() {
        let product = cartesian(&[vec![1, 2], vec![3], vec![4, 5]]);
        assert_eq!(
            product,
            vec![vec![1, 3, 4], vec![1, 3, 5], vec![2, 3, 4], vec![2, 3, 5]]
        );
        assert!(cartesian(&[vec![1], Vec::new()]).is_empty());
    }
}
