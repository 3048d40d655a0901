//! Flat C-ABI entry points for foreign callers.
//!
//! Thin wrappers over the safe kernels: raw pointer + dimension signatures,
//! an `i32` status return, and no panics or Rust types across the boundary.
//! Pointers are checked for null and dimensions for consistency before any
//! slice is formed, so a zero status means the call ran on well-formed
//! buffers; the numerical trusted-caller contract of the core passes is
//! otherwise unchanged.
//!
//! Every kernel is exported in `_f32` and `_f64` variants with identical
//! shapes, mirroring the monomorphized Rust API.

use std::slice;

use crate::kernel_types::LatticeFloat;
use crate::ops::ctc::{compute_alphas, compute_betas, reduce_alphas_betas, CtcConfig};
use crate::ops::log_semiring::{log_add_exp2, log_add_exp3};
use crate::validation;

/// Call completed on well-formed inputs.
pub const CTC_STATUS_OK: i32 = 0;
/// A required pointer was null.
pub const CTC_STATUS_NULL_POINTER: i32 = -1;
/// Dimensions were zero, inconsistent, or overflowed.
pub const CTC_STATUS_BAD_SHAPE: i32 = -2;
/// A label index fell outside the alphabet.
pub const CTC_STATUS_BAD_LABEL: i32 = -3;

#[no_mangle]
pub extern "C" fn ctc_log_add_exp2_f32(a: f32, b: f32) -> f32 {
    log_add_exp2(a, b)
}

#[no_mangle]
pub extern "C" fn ctc_log_add_exp2_f64(a: f64, b: f64) -> f64 {
    log_add_exp2(a, b)
}

#[no_mangle]
pub extern "C" fn ctc_log_add_exp3_f32(a: f32, b: f32, c: f32) -> f32 {
    log_add_exp3(a, b, c)
}

#[no_mangle]
pub extern "C" fn ctc_log_add_exp3_f64(a: f64, b: f64, c: f64) -> f64 {
    log_add_exp3(a, b, c)
}

/// Shared precondition gate for the lattice entry points.
///
/// Returns the validated config on success. The two buffer pointers are only
/// null-checked here; whether each is read or written is up to the caller.
fn check_lattice_call<T: LatticeFloat>(
    num_frames: usize,
    alphabet_size: usize,
    num_states: usize,
    emissions: *const T,
    labels: *const u32,
    lattice: *const T,
) -> Result<CtcConfig, i32> {
    if emissions.is_null() || labels.is_null() || lattice.is_null() {
        return Err(CTC_STATUS_NULL_POINTER);
    }
    if validation::validate_ctc_dims(num_frames, alphabet_size, num_states).is_err() {
        return Err(CTC_STATUS_BAD_SHAPE);
    }
    if validation::checked_emission_len(num_frames, alphabet_size).is_err()
        || validation::checked_lattice_len(num_frames, num_states).is_err()
    {
        return Err(CTC_STATUS_BAD_SHAPE);
    }
    // SAFETY: labels is non-null and the caller guarantees `num_states`
    // readable elements, per the documented contract of every entry point.
    let labels = unsafe { slice::from_raw_parts(labels, num_states) };
    if validation::validate_labels(labels, alphabet_size, num_states).is_err() {
        return Err(CTC_STATUS_BAD_LABEL);
    }
    Ok(CtcConfig {
        num_frames,
        alphabet_size,
        num_states,
    })
}

macro_rules! define_lattice_entry {
    ($fwd_name:ident, $bwd_name:ident, $reduce_name:ident, $ty:ty) => {
        /// Forward pass over raw buffers.
        ///
        /// # Safety
        /// `py` must point to `num_frames * alphabet_size` readable elements,
        /// `labels` to `num_states` readable elements, and `pa` to
        /// `num_frames * num_states` writable elements.
        #[no_mangle]
        pub unsafe extern "C" fn $fwd_name(
            num_frames: usize,
            alphabet_size: usize,
            num_states: usize,
            py: *const $ty,
            labels: *const u32,
            pa: *mut $ty,
        ) -> i32 {
            let config = match check_lattice_call(
                num_frames,
                alphabet_size,
                num_states,
                py,
                labels,
                pa as *const $ty,
            ) {
                Ok(config) => config,
                Err(status) => return status,
            };
            let py = slice::from_raw_parts(py, config.emission_len());
            let labels = slice::from_raw_parts(labels, num_states);
            let pa = slice::from_raw_parts_mut(pa, config.lattice_len());
            compute_alphas(py, labels, pa, config);
            CTC_STATUS_OK
        }

        /// Backward pass over raw buffers.
        ///
        /// # Safety
        /// Same buffer contract as the forward entry point, with `pb` as the
        /// `num_frames * num_states` writable output.
        #[no_mangle]
        pub unsafe extern "C" fn $bwd_name(
            num_frames: usize,
            alphabet_size: usize,
            num_states: usize,
            py: *const $ty,
            labels: *const u32,
            pb: *mut $ty,
        ) -> i32 {
            let config = match check_lattice_call(
                num_frames,
                alphabet_size,
                num_states,
                py,
                labels,
                pb as *const $ty,
            ) {
                Ok(config) => config,
                Err(status) => return status,
            };
            let py = slice::from_raw_parts(py, config.emission_len());
            let labels = slice::from_raw_parts(labels, num_states);
            let pb = slice::from_raw_parts_mut(pb, config.lattice_len());
            compute_betas(py, labels, pb, config);
            CTC_STATUS_OK
        }

        /// Reduce pass over raw buffers.
        ///
        /// # Safety
        /// `pab` must point to `num_frames * num_states` readable elements,
        /// `labels` to `num_states` readable elements, and `pdy` to
        /// `num_frames * alphabet_size` writable elements.
        #[no_mangle]
        pub unsafe extern "C" fn $reduce_name(
            num_frames: usize,
            alphabet_size: usize,
            num_states: usize,
            pab: *const $ty,
            labels: *const u32,
            pdy: *mut $ty,
        ) -> i32 {
            let config = match check_lattice_call(
                num_frames,
                alphabet_size,
                num_states,
                pdy as *const $ty,
                labels,
                pab,
            ) {
                Ok(config) => config,
                Err(status) => return status,
            };
            let pab = slice::from_raw_parts(pab, config.lattice_len());
            let labels = slice::from_raw_parts(labels, num_states);
            let pdy = slice::from_raw_parts_mut(pdy, config.emission_len());
            reduce_alphas_betas(pab, labels, pdy, config);
            CTC_STATUS_OK
        }
    };
}

define_lattice_entry!(
    ctc_compute_alphas_f32,
    ctc_compute_betas_f32,
    ctc_reduce_alphas_betas_f32,
    f32
);
define_lattice_entry!(
    ctc_compute_alphas_f64,
    ctc_compute_betas_f64,
    ctc_reduce_alphas_betas_f64,
    f64
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_scalar_exports_match_core() {
        assert_eq!(ctc_log_add_exp2_f64(0.0, 0.0), log_add_exp2(0.0f64, 0.0));
        assert_eq!(
            ctc_log_add_exp3_f32(1.0, 2.0, 3.0),
            log_add_exp3(1.0f32, 2.0, 3.0)
        );
    }

    #[test]
    fn test_null_pointer_status() {
        let labels = [0u32, 1, 0];
        let mut pa = [0.0f32; 9];
        let status = unsafe {
            ctc_compute_alphas_f32(3, 2, 3, ptr::null(), labels.as_ptr(), pa.as_mut_ptr())
        };
        assert_eq!(status, CTC_STATUS_NULL_POINTER);
    }

    #[test]
    fn test_bad_shape_status() {
        let py = [0.0f32; 6];
        let labels = [0u32, 1, 0, 1];
        let mut pa = [0.0f32; 12];
        let status = unsafe {
            // Even num_states is structurally invalid.
            ctc_compute_alphas_f32(3, 2, 4, py.as_ptr(), labels.as_ptr(), pa.as_mut_ptr())
        };
        assert_eq!(status, CTC_STATUS_BAD_SHAPE);
    }

    #[test]
    fn test_bad_label_status() {
        let py = [0.0f32; 6];
        let labels = [0u32, 7, 0];
        let mut pa = [0.0f32; 9];
        let status = unsafe {
            ctc_compute_alphas_f32(3, 2, 3, py.as_ptr(), labels.as_ptr(), pa.as_mut_ptr())
        };
        assert_eq!(status, CTC_STATUS_BAD_LABEL);
    }

    #[test]
    fn test_forward_through_ffi() {
        let config = CtcConfig {
            num_frames: 3,
            alphabet_size: 2,
            num_states: 3,
        };
        let py = vec![0.5f64.ln(); config.emission_len()];
        let labels = [0u32, 1, 0];
        let mut pa = vec![0.0f64; config.lattice_len()];
        let status = unsafe {
            ctc_compute_alphas_f64(3, 2, 3, py.as_ptr(), labels.as_ptr(), pa.as_mut_ptr())
        };
        assert_eq!(status, CTC_STATUS_OK);

        let mut expected = vec![0.0f64; config.lattice_len()];
        compute_alphas(&py, &labels, &mut expected, config);
        assert_eq!(pa, expected);
    }
}
