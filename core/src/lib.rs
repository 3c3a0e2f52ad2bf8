//! Core visibility simulation for the Rust-based interferometry platform.
//!
//! The modules follow the measurement chain of an interferometric
//! simulator: array geometry and redundancy, sky/frame conversions,
//! baseline-lattice detection, the NUFFT evaluation paths, and the
//! dispatch layer that chooses between them.

pub mod array_interface;
pub mod grid;
pub mod math;
pub mod nufft;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{EvalConfig, EvalInput, EvalOutput, SimError, SimResult, VisibilityEvaluator};

// Re-exported so downstream crates build inputs against the same versions.
pub use ndarray;
pub use num_complex;
