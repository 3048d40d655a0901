//! Per-example forward-backward driver and batch fan-out.
//!
//! The lattice passes are pure functions over caller-owned buffers, so the
//! natural scaling unit is the training example: one task per example, no
//! shared mutable state, no locking. This module packages the per-example
//! call sequence (alphas, betas, combine, reduce) behind a validated entry
//! point and fans a batch out across a rayon pool.

use rayon::prelude::*;

use crate::kernel_types::{CtcError, CtcResult, LatticeFloat};
use crate::ops::ctc::{
    combine_alphas_betas, compute_alphas, compute_betas, reduce_alphas_betas, total_log_prob,
    CtcConfig,
};
use crate::validation;

/// Below this many examples the rayon fork-join overhead outweighs the work.
const PARALLEL_BATCH_THRESHOLD: usize = 2;

/// Borrowed buffers for one training example.
///
/// Each example carries its own frame count and label sequence; only the
/// alphabet is shared across a batch. All buffers are caller-allocated and
/// fully overwritten.
#[derive(Debug)]
pub struct CtcExample<'a, T: LatticeFloat> {
    /// Emission log-probabilities: `[T, A]`.
    pub emissions: &'a [T],
    /// Expanded label sequence: `[S]`.
    pub labels: &'a [u32],
    /// Alpha lattice output: `[T, S]`.
    pub alphas: &'a mut [T],
    /// Beta lattice output: `[T, S]`.
    pub betas: &'a mut [T],
    /// Combined alpha+beta lattice output: `[T, S]`.
    pub combined: &'a mut [T],
    /// Per-symbol accumulator output: `[T, A]`.
    pub gradients: &'a mut [T],
    /// Shapes for this example.
    pub config: CtcConfig,
}

fn validate_example<T: LatticeFloat>(example: &CtcExample<'_, T>) -> CtcResult<()> {
    let config = example.config;
    validation::validate_ctc_dims(config.num_frames, config.alphabet_size, config.num_states)
        .map_err(CtcError::InvalidConfig)?;
    validation::validate_labels(example.labels, config.alphabet_size, config.num_states)?;

    let emission_len = validation::checked_emission_len(config.num_frames, config.alphabet_size)
        .map_err(CtcError::InvalidConfig)?;
    let lattice_len = validation::checked_lattice_len(config.num_frames, config.num_states)
        .map_err(CtcError::InvalidConfig)?;

    validation::validate_buffer_len(example.emissions.len(), emission_len, "emissions")
        .map_err(CtcError::ShapeMismatch)?;
    validation::validate_buffer_len(example.alphas.len(), lattice_len, "alphas")
        .map_err(CtcError::ShapeMismatch)?;
    validation::validate_buffer_len(example.betas.len(), lattice_len, "betas")
        .map_err(CtcError::ShapeMismatch)?;
    validation::validate_buffer_len(example.combined.len(), lattice_len, "combined")
        .map_err(CtcError::ShapeMismatch)?;
    validation::validate_buffer_len(example.gradients.len(), emission_len, "gradients")
        .map_err(CtcError::ShapeMismatch)?;
    Ok(())
}

/// Run the full forward-backward sequence for one example.
///
/// Fills the example's alpha, beta, combined and gradient buffers and returns
/// its total log-probability. Unlike the raw passes this entry point
/// validates shapes up front and reports failures as [`CtcError`] instead of
/// panicking.
pub fn compute_forward_backward<T: LatticeFloat>(example: &mut CtcExample<'_, T>) -> CtcResult<T> {
    validate_example(example)?;
    let config = example.config;

    compute_alphas(example.emissions, example.labels, example.alphas, config);
    compute_betas(example.emissions, example.labels, example.betas, config);
    combine_alphas_betas(example.alphas, example.betas, example.combined);
    reduce_alphas_betas(example.combined, example.labels, example.gradients, config);

    let total = total_log_prob(example.alphas, config);
    if !total.is_finite() {
        // Legal outcome for an unalignable pair (S > 2T), but worth surfacing
        // during training since it produces no gradient signal.
        log::warn!(
            "ctc example has zero total probability (T={}, S={})",
            config.num_frames,
            config.num_states
        );
    }
    Ok(total)
}

/// Run [`compute_forward_backward`] over a batch, one task per example.
///
/// Examples are independent, so the batch fans out across the rayon pool;
/// tiny batches stay sequential. Per-example failures land in the returned
/// vector without aborting the rest of the batch.
pub fn compute_forward_backward_batch<T: LatticeFloat>(
    examples: &mut [CtcExample<'_, T>],
) -> Vec<CtcResult<T>> {
    if examples.len() < PARALLEL_BATCH_THRESHOLD {
        return examples
            .iter_mut()
            .map(|example| compute_forward_backward(example))
            .collect();
    }
    examples
        .par_iter_mut()
        .map(|example| compute_forward_backward(example))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_example(
        config: CtcConfig,
        emissions: &[f64],
        labels: &[u32],
    ) -> (CtcResult<f64>, Vec<f64>) {
        let mut alphas = vec![0.0; config.lattice_len()];
        let mut betas = vec![0.0; config.lattice_len()];
        let mut combined = vec![0.0; config.lattice_len()];
        let mut gradients = vec![0.0; config.emission_len()];
        let mut example = CtcExample {
            emissions,
            labels,
            alphas: &mut alphas,
            betas: &mut betas,
            combined: &mut combined,
            gradients: &mut gradients,
            config,
        };
        let total = compute_forward_backward(&mut example);
        (total, gradients)
    }

    #[test]
    fn test_forward_backward_total() {
        let config = CtcConfig {
            num_frames: 3,
            alphabet_size: 2,
            num_states: 3,
        };
        let emissions = vec![0.5f64.ln(); config.emission_len()];
        let (total, _) = run_example(config, &emissions, &[0, 1, 0]);
        let expected = (6.0 * 0.5f64.powi(3)).ln();
        assert!((total.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_even_num_states() {
        let config = CtcConfig {
            num_frames: 3,
            alphabet_size: 2,
            num_states: 4,
        };
        let emissions = vec![0.5f64.ln(); config.emission_len()];
        let (total, _) = run_example(config, &emissions, &[0, 1, 0, 1]);
        assert!(matches!(total, Err(CtcError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_label_out_of_range() {
        let config = CtcConfig {
            num_frames: 3,
            alphabet_size: 2,
            num_states: 3,
        };
        let emissions = vec![0.5f64.ln(); config.emission_len()];
        let (total, _) = run_example(config, &emissions, &[0, 9, 0]);
        assert!(matches!(total, Err(CtcError::LabelOutOfRange { .. })));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let config = CtcConfig {
            num_frames: 3,
            alphabet_size: 2,
            num_states: 3,
        };
        let emissions = vec![0.5f64.ln(); config.emission_len() - 1];
        let (total, _) = run_example(config, &emissions, &[0, 1, 0]);
        assert!(matches!(total, Err(CtcError::ShapeMismatch(_))));
    }

    #[test]
    fn test_unalignable_example_is_neg_infinity() {
        // S > 2T: no alignment, total probability zero, but not an error.
        let config = CtcConfig {
            num_frames: 1,
            alphabet_size: 3,
            num_states: 5,
        };
        let emissions = vec![(1.0f64 / 3.0).ln(); config.emission_len()];
        let (total, _) = run_example(config, &emissions, &[0, 1, 0, 2, 0]);
        assert_eq!(total.unwrap(), f64::NEG_INFINITY);
    }
}
