pub mod ctc;
pub mod ctc_batch;
pub mod log_semiring;

pub use ctc::CtcConfig;
pub use ctc_batch::CtcExample;
