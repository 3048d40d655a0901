//! Shared precondition checks for the validating outer layers.
//!
//! The lattice passes themselves run under a trusted-caller contract and do
//! not validate beyond buffer lengths; the batch driver and the FFI surface
//! call these helpers before handing buffers to the hot path. Shape checks
//! return `Result<_, String>` so each layer can map failures into its own
//! error type; the label check returns [`CtcError`] directly since it carries
//! structured position data.

use crate::kernel_types::{CtcError, CtcResult};

/// Validate lattice dimensions (num_frames, alphabet_size, num_states).
///
/// `num_states` must be odd: the expanded label sequence always has the form
/// blank, label, blank, ..., blank of length `2L + 1`.
#[inline]
pub fn validate_ctc_dims(
    num_frames: usize,
    alphabet_size: usize,
    num_states: usize,
) -> Result<(), String> {
    if num_frames == 0 || alphabet_size == 0 || num_states == 0 {
        return Err("dimensions must be > 0".into());
    }
    if num_states % 2 == 0 {
        return Err(format!(
            "num_states {} must be odd (2 * target_len + 1)",
            num_states
        ));
    }
    Ok(())
}

/// Validate that every label indexes into the alphabet and that the sequence
/// length matches the declared state count.
#[inline]
pub fn validate_labels(labels: &[u32], alphabet_size: usize, num_states: usize) -> CtcResult<()> {
    if labels.len() != num_states {
        return Err(CtcError::ShapeMismatch(format!(
            "labels len {} != num_states {}",
            labels.len(),
            num_states
        )));
    }
    for (position, &label) in labels.iter().enumerate() {
        if label as usize >= alphabet_size {
            return Err(CtcError::LabelOutOfRange {
                label,
                position,
                alphabet_size,
            });
        }
    }
    Ok(())
}

/// Compute the `T * A` emission buffer length with overflow check.
#[inline]
pub fn checked_emission_len(num_frames: usize, alphabet_size: usize) -> Result<usize, String> {
    num_frames
        .checked_mul(alphabet_size)
        .ok_or_else(|| "emission length overflow".to_string())
}

/// Compute the `T * S` lattice buffer length with overflow check.
#[inline]
pub fn checked_lattice_len(num_frames: usize, num_states: usize) -> Result<usize, String> {
    num_frames
        .checked_mul(num_states)
        .ok_or_else(|| "lattice length overflow".to_string())
}

/// Validate an input buffer length against the expected element count.
#[inline]
pub fn validate_buffer_len(actual: usize, expected: usize, name: &str) -> Result<(), String> {
    if actual != expected {
        return Err(format!("{} len {} != expected {}", name, actual, expected));
    }
    Ok(())
}
