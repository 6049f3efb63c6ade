//! Distinct permutations of a small multiset.
//!
//! Walks permutations in lexicographic order starting from the sorted
//! arrangement, so each distinct ordering is produced exactly once.
//! A pattern like `99975` yields 20 orderings instead of 5! = 120.

/// Iterator over the distinct permutations of `N` items.
#[derive(Debug, Clone)]
pub struct DistinctPermutations<const N: usize> {
    next: Option<[u8; N]>,
}

impl<const N: usize> DistinctPermutations<N> {
    /// Start from any arrangement; it is sorted first so nothing is skipped.
    pub fn new(mut items: [u8; N]) -> Self {
        items.sort_unstable();
        Self { next: Some(items) }
    }
}

impl<const N: usize> Iterator for DistinctPermutations<N> {
    type Item = [u8; N];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut following = current;
        self.next = advance(&mut following).then_some(following);
        Some(current)
    }
}

/// Rearrange into the next lexicographic permutation.
///
/// Returns false when `items` is already the last (descending) arrangement.
fn advance(items: &mut [u8]) -> bool {
    let n = items.len();
    if n < 2 {
        return false;
    }

    // Rightmost ascent
    let mut i = n - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let pivot = i - 1;

    // Rightmost element larger than the pivot
    let mut j = n - 1;
    while items[j] <= items[pivot] {
        j -= 1;
    }

    items.swap(pivot, j);
    items[i..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_distinct_values() {
        let perms: Vec<[u8; 5]> = DistinctPermutations::new([1, 2, 3, 4, 5]).collect();
        assert_eq!(perms.len(), 120);
        let unique: HashSet<_> = perms.iter().collect();
        assert_eq!(unique.len(), 120);
    }

    #[test]
    fn test_repeated_values_are_not_duplicated() {
        // 5! / 3! = 20
        let perms: Vec<[u8; 5]> = DistinctPermutations::new([9, 9, 9, 7, 5]).collect();
        assert_eq!(perms.len(), 20);
        let unique: HashSet<_> = perms.iter().collect();
        assert_eq!(unique.len(), 20);
        assert_eq!(perms[0], [5, 7, 9, 9, 9]);
        assert_eq!(perms[19], [9, 9, 9, 7, 5]);
    }

    #[test]
    fn test_single_value_multiset() {
        let perms: Vec<[u8; 5]> = DistinctPermutations::new([4; 5]).collect();
        assert_eq!(perms, vec![[4; 5]]);
    }

    #[test]
    fn test_two_pairs() {
        // 5! / (2! * 2!) = 30
        assert_eq!(DistinctPermutations::new([1, 1, 5, 6, 6]).count(), 30);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn factorial(n: usize) -> usize {
            (1..=n).product()
        }

        /// 5! divided by k! for every digit repeated k times.
        fn multiset_permutations(items: [u8; 5]) -> usize {
            let mut counts = [0usize; 10];
            for &d in &items {
                counts[usize::from(d)] += 1;
            }
            counts.iter().fold(factorial(5), |n, &k| n / factorial(k))
        }

        proptest! {
            #[test]
            fn yields_each_distinct_arrangement_once(items in proptest::array::uniform5(0u8..=9)) {
                let perms: Vec<[u8; 5]> = DistinctPermutations::new(items).collect();
                prop_assert_eq!(perms.len(), multiset_permutations(items));

                let unique: HashSet<_> = perms.iter().collect();
                prop_assert_eq!(unique.len(), perms.len());

                let mut expected = items;
                expected.sort_unstable();
                for perm in &perms {
                    let mut sorted = *perm;
                    sorted.sort_unstable();
                    prop_assert_eq!(sorted, expected);
                }
                prop_assert!(perms.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
