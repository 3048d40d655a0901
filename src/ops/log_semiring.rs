//! Log-space semiring arithmetic for numerically stable probability sums.
//!
//! Values represent natural-log probabilities, with `-inf` as the additive
//! identity (exact probability zero). Addition is log-sum-exp; multiplication
//! is plain `+`. The two- and three-way forms below are the primitives the
//! lattice recurrences are built from, so they are kept branch-light and
//! allocation-free.

use crate::kernel_types::LatticeFloat;

/// Compute `log(exp(a) + exp(b))` in a numerically stable way.
///
/// `-inf` inputs short-circuit to the other operand. This is both the
/// semiring identity and the guard against `exp(-inf - -inf)` producing NaN.
/// The finite path evaluates `log1p(exp(lo - hi)) + hi`, keeping the exponent
/// argument in `(-inf, 0]` so it can neither overflow nor lose the leading
/// term to cancellation.
#[inline]
pub fn log_add_exp2<T: LatticeFloat>(a: T, b: T) -> T {
    if a.is_neg_infinity() {
        return b;
    }
    if b.is_neg_infinity() {
        return a;
    }

    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    (lo - hi).exp().ln_1p() + hi
}

/// Compute `log(exp(a) + exp(b) + exp(c))` in a numerically stable way.
///
/// Any `-inf` input reduces the sum to [`log_add_exp2`] of the remaining two.
/// Otherwise the maximum is factored out and the two residual exponentials
/// are folded into a single `log1p` call. When several inputs tie for the
/// maximum, the first in argument order is used as the pivot; the result is
/// the same whichever maximal value is factored out.
#[inline]
pub fn log_add_exp3<T: LatticeFloat>(a: T, b: T, c: T) -> T {
    if a.is_neg_infinity() {
        return log_add_exp2(b, c);
    }
    if b.is_neg_infinity() {
        return log_add_exp2(a, c);
    }
    if c.is_neg_infinity() {
        return log_add_exp2(a, b);
    }

    let (m, x, y) = if a >= b && a >= c {
        (a, b, c)
    } else if b >= c {
        (b, a, c)
    } else {
        (c, a, b)
    };
    ((x - m).exp() + (y - m).exp()).ln_1p() + m
}

/// Compute `log(sum(exp(values)))` over a slice, max-shifted.
///
/// Returns `-inf` for an empty slice or when every entry is `-inf`.
pub fn log_sum_exp<T: LatticeFloat>(values: &[T]) -> T {
    let mut max = T::neg_infinity();
    for &v in values {
        max = max.max(v);
    }
    if max.is_neg_infinity() {
        return max;
    }

    let mut sum = T::zero();
    for &v in values {
        sum = sum + (v - max).exp();
    }
    // sum >= 1 because the max contributes exp(0); ln_1p(sum - 1) keeps the
    // same accuracy profile as the pairwise forms.
    (sum - T::from_f64(1.0)).ln_1p() + max
}
