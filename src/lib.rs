//! ctc-kernels: CPU CTC forward-backward lattice kernels.
//!
//! This crate provides the training-side CTC (Connectionist Temporal
//! Classification) dynamic program with:
//! - **Log-Space Semiring**: stable `log_add_exp2`/`log_add_exp3` with `-inf`
//!   as the additive identity
//! - **Banded Lattice Passes**: forward alpha, backward beta, and the
//!   per-symbol reduce, restricted to the reachable diagonal band
//! - **Zero-Allocation Hot Path**: raw slice APIs over caller-owned flat
//!   row-major buffers, re-entrant across examples
//! - **Batch Fan-Out**: one rayon task per training example
//! - **C-ABI Exports**: flat `_f32`/`_f64` entry points for foreign callers
//!
//! # Quick Start
//!
//! ```
//! use ctc_kernels::{compute_alphas, expand_labels, total_log_prob, CtcConfig};
//!
//! let config = CtcConfig::from_target_len(3, 2, 1); // T=3, A=2, L=1
//! let labels = expand_labels(&[1], 0);              // [blank, 1, blank]
//! let py = vec![0.5f32.ln(); config.emission_len()];
//! let mut pa = vec![0.0f32; config.lattice_len()];
//! compute_alphas(&py, &labels, &mut pa, config);
//! let log_likelihood = total_log_prob(&pa, config);
//! assert!(log_likelihood.is_finite());
//! ```

pub mod ffi;
pub mod kernel_types;
pub mod ops;
pub mod validation;

// Log-space semiring exports
pub use ops::log_semiring::{log_add_exp2, log_add_exp3, log_sum_exp};

// Lattice pass exports
pub use ops::ctc::{
    combine_alphas_betas, compute_alphas, compute_betas, expand_labels, reduce_alphas_betas,
    total_log_prob, CtcConfig,
};

// Batch driver exports
pub use ops::ctc_batch::{compute_forward_backward, compute_forward_backward_batch, CtcExample};

// Shared type exports
pub use kernel_types::{CtcError, CtcResult, FloatType, LatticeFloat};
