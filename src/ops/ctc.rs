//! CTC forward-backward lattice computation.
//!
//! The lattice is the `T x S` grid of alignment states between `T` emission
//! frames and an expanded label sequence of length `S = 2L + 1` (a blank
//! before, between and after each of the `L` target labels). The forward pass
//! fills alpha (prefix log-probabilities), the backward pass fills beta
//! (suffix log-probabilities), and the reduce pass folds their pointwise
//! product into a `T x A` accumulator indexed by the original alphabet.
//!
//! All buffers are caller-allocated flat row-major slices and are fully
//! overwritten on each call; the passes hold no state and allocate nothing,
//! so independent examples can run concurrently without locking.
//!
//! Reference: Graves et al., "Connectionist Temporal Classification" (ICML 2006).

use crate::kernel_types::LatticeFloat;
use crate::ops::log_semiring::{log_add_exp2, log_add_exp3};

/// Shape descriptor for one CTC example.
#[derive(Debug, Clone, Copy)]
pub struct CtcConfig {
    /// Number of emission frames `T`.
    pub num_frames: usize,
    /// Alphabet size `A`, including the blank symbol.
    pub alphabet_size: usize,
    /// Expanded label length `S = 2L + 1`.
    pub num_states: usize,
}

impl CtcConfig {
    /// Build a config from the unexpanded target length `L`.
    pub fn from_target_len(num_frames: usize, alphabet_size: usize, target_len: usize) -> Self {
        Self {
            num_frames,
            alphabet_size,
            num_states: 2 * target_len + 1,
        }
    }

    /// Length of the `T x A` emission and gradient buffers.
    #[inline]
    pub fn emission_len(&self) -> usize {
        self.num_frames * self.alphabet_size
    }

    /// Length of the `T x S` alpha/beta buffers.
    #[inline]
    pub fn lattice_len(&self) -> usize {
        self.num_frames * self.num_states
    }

    /// Trellis columns reachable at frame `t`.
    ///
    /// Column `i` needs `ceil(i/2)` earlier frames to be entered and
    /// `ceil((S-1-i)/2)` later frames to still finish, so each row covers
    /// `[max(0, S - 2*(T-t)), min(2*(t+1), S))` rather than `0..S`. Cells
    /// outside this window stay at `-inf`.
    #[inline]
    pub fn band(&self, t: usize) -> std::ops::Range<usize> {
        debug_assert!(t < self.num_frames);
        let start = self
            .num_states
            .saturating_sub(2 * (self.num_frames - t));
        let end = (2 * (t + 1)).min(self.num_states);
        start..end.max(start)
    }
}

/// Expand a target label sequence with interleaved blanks.
///
/// `[l0, l1, ..]` becomes `[blank, l0, blank, l1, blank, ..]` of length
/// `2L + 1`, the state sequence the lattice passes walk over.
pub fn expand_labels(targets: &[u32], blank: u32) -> Vec<u32> {
    let mut expanded = Vec::with_capacity(2 * targets.len() + 1);
    expanded.push(blank);
    for &label in targets {
        expanded.push(label);
        expanded.push(blank);
    }
    expanded
}

/// Whether the forward transition into odd position `i` may skip the
/// preceding blank, i.e. arrive directly from `i - 2`.
///
/// Skipping is forbidden into blank (even) positions and between two equal
/// consecutive labels, which must keep their separating blank.
#[inline]
fn skip_allowed_fwd(labels: &[u32], i: usize) -> bool {
    debug_assert!(i >= 2);
    i % 2 == 1 && labels[i] != labels[i - 2]
}

/// Mirror of [`skip_allowed_fwd`] for the backward pass: whether position
/// `i` may hand off directly to `i + 2`.
#[inline]
fn skip_allowed_bwd(labels: &[u32], i: usize) -> bool {
    debug_assert!(i + 2 < labels.len());
    i % 2 == 1 && labels[i] != labels[i + 2]
}

#[inline]
fn debug_check_inputs(labels: &[u32], config: CtcConfig) {
    debug_assert!(config.num_frames >= 1, "num_frames must be >= 1");
    debug_assert!(config.alphabet_size >= 1, "alphabet_size must be >= 1");
    debug_assert!(
        config.num_states % 2 == 1,
        "num_states must be odd (2L + 1), got {}",
        config.num_states
    );
    debug_assert!(labels
        .iter()
        .all(|&l| (l as usize) < config.alphabet_size));
}

/// Forward pass: fill the `T x S` alpha lattice left-to-right in time.
///
/// `pa[t*S + i]` becomes the log-probability of emitting a prefix of the
/// lattice consistent with state `i` after frames `0..=t`. Cells outside the
/// reachable band stay `-inf`.
///
/// * `py` - emission log-probabilities: `[T, A]`
/// * `labels` - expanded label sequence: `[S]`
/// * `pa` - output alpha lattice: `[T, S]`, fully overwritten
///
/// # Panics
/// Panics if buffer lengths disagree with `config`. Label indices and the
/// oddness of `S` are the caller's contract, checked in debug builds only.
pub fn compute_alphas<T: LatticeFloat>(py: &[T], labels: &[u32], pa: &mut [T], config: CtcConfig) {
    let s = config.num_states;
    let a = config.alphabet_size;

    assert_eq!(py.len(), config.emission_len(), "py length mismatch");
    assert_eq!(labels.len(), s, "labels length mismatch");
    assert_eq!(pa.len(), config.lattice_len(), "pa length mismatch");
    debug_check_inputs(labels, config);

    pa.fill(T::neg_infinity());

    // Base case: the lattice starts at the leading blank or the first label;
    // band(0) is exactly that start window.
    for i in config.band(0) {
        pa[i] = py[labels[i] as usize];
    }

    for t in 1..config.num_frames {
        let row = t * s;
        let prev = row - s;
        let py_row = t * a;

        for i in config.band(t) {
            let emit = py[py_row + labels[i] as usize];
            pa[row + i] = match i {
                // Leading blank: self-loop only.
                0 => pa[prev] + emit,
                // First label: from self or the leading blank.
                1 => log_add_exp2(pa[prev + 1], pa[prev]) + emit,
                _ if skip_allowed_fwd(labels, i) => {
                    log_add_exp3(pa[prev + i], pa[prev + i - 1], pa[prev + i - 2]) + emit
                }
                _ => log_add_exp2(pa[prev + i], pa[prev + i - 1]) + emit,
            };
        }
    }
}

/// Backward pass: fill the `T x S` beta lattice right-to-left in time.
///
/// `pb[t*S + i]` becomes the log-probability of completing the lattice from
/// state `i` at frame `t`, emitting frames `t+1..T`. The final row is the
/// semiring one (log 1) at the two admissible end states, so that
/// `pa[t][i] + pb[t][i]` summed over a row is the total path probability at
/// every `t`. Cells outside the reachable band stay `-inf`.
///
/// * `py` - emission log-probabilities: `[T, A]`
/// * `labels` - expanded label sequence: `[S]`
/// * `pb` - output beta lattice: `[T, S]`, fully overwritten
///
/// # Panics
/// Panics if buffer lengths disagree with `config`. Label indices and the
/// oddness of `S` are the caller's contract, checked in debug builds only.
pub fn compute_betas<T: LatticeFloat>(py: &[T], labels: &[u32], pb: &mut [T], config: CtcConfig) {
    let s = config.num_states;
    let a = config.alphabet_size;
    let last = config.num_frames - 1;

    assert_eq!(py.len(), config.emission_len(), "py length mismatch");
    assert_eq!(labels.len(), s, "labels length mismatch");
    assert_eq!(pb.len(), config.lattice_len(), "pb length mismatch");
    debug_check_inputs(labels, config);

    pb.fill(T::neg_infinity());

    // Base case: the lattice may end at the trailing blank or the last
    // label; band(last) is exactly that end window.
    for i in config.band(last) {
        pb[last * s + i] = T::zero();
    }

    for t in (0..last).rev() {
        let row = t * s;
        let next = row + s;
        let py_next = (t + 1) * a;

        for i in config.band(t).rev() {
            // Invariant: pb[t][i] excludes frame t's emission; each successor
            // term carries frame t+1's emission for the state being entered.
            let stay = pb[next + i] + py[py_next + labels[i] as usize];
            pb[row + i] = if i == s - 1 {
                // Trailing blank: self-loop only.
                stay
            } else {
                let step = pb[next + i + 1] + py[py_next + labels[i + 1] as usize];
                if i + 2 < s && skip_allowed_bwd(labels, i) {
                    let skip = pb[next + i + 2] + py[py_next + labels[i + 2] as usize];
                    log_add_exp3(stay, step, skip)
                } else {
                    log_add_exp2(stay, step)
                }
            };
        }
    }
}

/// Pointwise log-domain product of the alpha and beta lattices.
///
/// Elementwise `pab[k] = pa[k] + pb[k]`; `-inf` cells stay `-inf`.
///
/// # Panics
/// Panics if the three buffers differ in length.
pub fn combine_alphas_betas<T: LatticeFloat>(pa: &[T], pb: &[T], pab: &mut [T]) {
    assert_eq!(pa.len(), pb.len(), "pa/pb length mismatch");
    assert_eq!(pa.len(), pab.len(), "pa/pab length mismatch");

    for ((out, &x), &y) in pab.iter_mut().zip(pa).zip(pb) {
        *out = x + y;
    }
}

/// Reduce the combined lattice into a `T x A` accumulator by alphabet symbol.
///
/// For each frame, every in-band trellis state adds its mass to the slot of
/// the symbol it carries: `pdy[t][labels[i]] += pab[t][i]` in the semiring.
/// Several states share a symbol (blank occupies every even position), so
/// this is a genuine many-to-one log-sum reduction, not an overwrite. Slots
/// no state maps to are left at `-inf`.
///
/// * `pab` - combined alpha+beta lattice: `[T, S]`
/// * `labels` - expanded label sequence: `[S]`
/// * `pdy` - output accumulator: `[T, A]`, fully overwritten
///
/// # Panics
/// Panics if buffer lengths disagree with `config`.
pub fn reduce_alphas_betas<T: LatticeFloat>(
    pab: &[T],
    labels: &[u32],
    pdy: &mut [T],
    config: CtcConfig,
) {
    let s = config.num_states;
    let a = config.alphabet_size;

    assert_eq!(pab.len(), config.lattice_len(), "pab length mismatch");
    assert_eq!(labels.len(), s, "labels length mismatch");
    assert_eq!(pdy.len(), config.emission_len(), "pdy length mismatch");
    debug_check_inputs(labels, config);

    pdy.fill(T::neg_infinity());

    for t in 0..config.num_frames {
        let row = t * s;
        let out_row = t * a;

        for i in config.band(t) {
            let slot = out_row + labels[i] as usize;
            pdy[slot] = log_add_exp2(pdy[slot], pab[row + i]);
        }
    }
}

/// Total log-probability of the label sequence: the semiring sum of the two
/// admissible end states in the final alpha row.
///
/// # Panics
/// Panics if `pa` length disagrees with `config`.
pub fn total_log_prob<T: LatticeFloat>(pa: &[T], config: CtcConfig) -> T {
    assert_eq!(pa.len(), config.lattice_len(), "pa length mismatch");

    let s = config.num_states;
    let last_row = (config.num_frames - 1) * s;
    if s >= 2 {
        log_add_exp2(pa[last_row + s - 1], pa[last_row + s - 2])
    } else {
        pa[last_row]
    }
}
