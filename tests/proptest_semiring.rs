//! Property tests for the log-space semiring primitives.

use ctc_kernels::{log_add_exp2, log_add_exp3, log_sum_exp};
use proptest::prelude::*;

const FINITE: std::ops::Range<f64> = -50.0..50.0;

proptest! {
    /// Pairwise sum matches the naive definition on finite inputs.
    #[test]
    fn pairwise_matches_naive(a in FINITE, b in FINITE) {
        let result = log_add_exp2(a, b);
        let expected = (a.exp() + b.exp()).ln();
        prop_assert!((result - expected).abs() < 1e-9,
            "log_add_exp2({}, {}) = {}, naive {}", a, b, result, expected);
    }

    /// Pairwise sum is exactly commutative.
    #[test]
    fn pairwise_commutative(a in FINITE, b in FINITE) {
        prop_assert_eq!(log_add_exp2(a, b), log_add_exp2(b, a));
    }

    /// `-inf` is the additive identity.
    #[test]
    fn pairwise_identity(a in FINITE) {
        prop_assert_eq!(log_add_exp2(a, f64::NEG_INFINITY), a);
        prop_assert_eq!(log_add_exp2(f64::NEG_INFINITY, a), a);
    }

    /// Adding probability mass can only grow the sum, by at most ln(2).
    #[test]
    fn pairwise_bounds(a in FINITE, b in FINITE) {
        let result = log_add_exp2(a, b);
        let hi = a.max(b);
        prop_assert!(result >= hi);
        prop_assert!(result <= hi + 2.0f64.ln() + 1e-12);
    }

    /// Three-way sum matches the naive definition on finite inputs.
    #[test]
    fn threeway_matches_naive(a in FINITE, b in FINITE, c in FINITE) {
        let result = log_add_exp3(a, b, c);
        let expected = (a.exp() + b.exp() + c.exp()).ln();
        prop_assert!((result - expected).abs() < 1e-9,
            "log_add_exp3({}, {}, {}) = {}, naive {}", a, b, c, result, expected);
    }

    /// Three-way sum is permutation-invariant up to rounding.
    #[test]
    fn threeway_permutation_stable(a in FINITE, b in FINITE, c in FINITE) {
        let base = log_add_exp3(a, b, c);
        for permuted in [
            log_add_exp3(a, c, b),
            log_add_exp3(b, a, c),
            log_add_exp3(b, c, a),
            log_add_exp3(c, a, b),
            log_add_exp3(c, b, a),
        ] {
            prop_assert!((base - permuted).abs() < 1e-12);
        }
    }

    /// A `-inf` operand reduces the three-way sum to the pairwise one.
    #[test]
    fn threeway_absorbs_identity(a in FINITE, b in FINITE) {
        let pairwise = log_add_exp2(a, b);
        prop_assert_eq!(log_add_exp3(a, b, f64::NEG_INFINITY), pairwise);
        prop_assert_eq!(log_add_exp3(a, f64::NEG_INFINITY, b), pairwise);
        prop_assert_eq!(log_add_exp3(f64::NEG_INFINITY, a, b), pairwise);
    }

    /// The slice reduction agrees with a pairwise fold.
    #[test]
    fn slice_matches_pairwise_fold(values in prop::collection::vec(FINITE, 0..16)) {
        let folded = values
            .iter()
            .fold(f64::NEG_INFINITY, |acc, &v| log_add_exp2(acc, v));
        let result = log_sum_exp(&values);
        if values.is_empty() {
            prop_assert_eq!(result, f64::NEG_INFINITY);
        } else {
            prop_assert!((result - folded).abs() < 1e-9,
                "slice {} vs fold {}", result, folded);
        }
    }
}
