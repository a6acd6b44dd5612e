//! Property tests for the enumerators and the admissibility rule.

use gkrust::construction::{is_admissible, sign_flip_count, NodeExpander, MAX_SUPPORTED_LEVEL};
use gkrust::iterators::{lattice_points::LatticePoints, partitions::Partitions, permutations::Permutations};
use proptest::prelude::*;

proptest! {
    #[test]
    fn partitions_are_sorted_and_bounded(ndim in 1usize..5, budget in 0usize..8) {
        let mut last_sum = 0;
        for p in Partitions::new(ndim, budget) {
            prop_assert_eq!(p.len(), ndim);
            prop_assert!(p.windows(2).all(|w| w[0] >= w[1]));
            let sum: usize = p.iter().sum();
            prop_assert!(sum <= budget);
            prop_assert!(sum >= last_sum);
            last_sum = sum;
        }
    }

    #[test]
    fn partitions_cover_every_sorted_lattice_point(ndim in 1usize..4, budget in 0usize..6) {
        let partitions: Vec<Vec<usize>> = Partitions::new(ndim, budget).collect();
        let mut sorted: Vec<Vec<usize>> = LatticePoints::new(ndim, budget)
            .filter(|q| q.windows(2).all(|w| w[0] >= w[1]))
            .collect();
        prop_assert_eq!(sorted.len(), partitions.len());
        sorted.sort();
        let mut expected = partitions.clone();
        expected.sort();
        prop_assert_eq!(sorted, expected);
    }

    #[test]
    fn lattice_points_are_lexicographic(ndim in 0usize..4, budget in 0usize..6) {
        let points: Vec<Vec<usize>> = LatticePoints::new(ndim, budget).collect();
        prop_assert_eq!(points.len(), LatticePoints::num_points(ndim, budget));
        prop_assert!(points.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(points.iter().all(|q| q.iter().sum::<usize>() <= budget));
    }

    #[test]
    fn permutations_are_distinct_and_counted(tuple in prop::collection::vec(0usize..4, 0..6)) {
        let perms: Vec<Vec<usize>> = Permutations::new(&tuple).collect();
        prop_assert_eq!(perms.len(), Permutations::num_permutations(&tuple));
        prop_assert!(perms.windows(2).all(|w| w[0] < w[1]));
        let mut sorted = tuple.clone();
        sorted.sort_unstable();
        for p in &perms {
            let mut q = p.clone();
            q.sort_unstable();
            prop_assert_eq!(&q, &sorted);
        }
    }

    #[test]
    fn admissibility_is_monotone(partition in prop::collection::vec(0usize..=MAX_SUPPORTED_LEVEL, 1..4), level in 0usize..30) {
        if is_admissible(&partition, level) {
            for d in 0..partition.len() {
                for smaller in 0..partition[d] {
                    let mut lowered = partition.clone();
                    lowered[d] = smaller;
                    prop_assert!(is_admissible(&lowered, level), "{:?} admissible but {:?} not", partition, lowered);
                }
            }
            prop_assert!(is_admissible(&partition, level + 1));
        }
    }

    #[test]
    fn sign_flips_double_per_nonzero_entry(partition in prop::collection::vec(0usize..3, 0..5)) {
        let nonzero = partition.iter().filter(|&&p| p != 0).count();
        prop_assert_eq!(sign_flip_count(&partition), 1 << nonzero);
        prop_assert_eq!(NodeExpander::num_nodes(&partition), Permutations::num_permutations(&partition) << nonzero);
    }
}
