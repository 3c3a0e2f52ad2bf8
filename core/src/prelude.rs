use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Shared configuration handed to an evaluator before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Requested transform accuracy (relative tolerance of the NUFFT paths).
    pub accuracy: f64,
}

/// Per-call input for a visibility evaluator.
///
/// `tx`/`ty` are topocentric direction cosines of the sources above the
/// horizon for one time step, `intensity` the matching beam-weighted source
/// strengths, and `uv` the baseline coordinates in wavelengths for one
/// frequency channel. `uv_scale` is the metres-to-wavelengths factor
/// (`freq / c`) that produced `uv`.
#[derive(Debug, Clone)]
pub struct EvalInput<'a> {
    pub tx: &'a [f64],
    pub ty: &'a [f64],
    pub intensity: &'a [Complex64],
    pub uv: &'a [[f64; 2]],
    pub uv_scale: f64,
}

/// Output produced by an evaluator: one visibility per requested baseline,
/// in input order.
#[derive(Debug, Clone)]
pub struct EvalOutput {
    pub visibilities: Vec<Complex64>,
}

/// Common error type for simulation and evaluation.
#[derive(thiserror::Error, Debug)]
pub enum SimError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("unsupported configuration: {0}")]
    Unsupported(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type SimResult<T> = Result<T, SimError>;

/// Trait describing the visibility-evaluation paths the dispatcher selects
/// between.
pub trait VisibilityEvaluator: Send {
    fn initialize(&mut self, config: &EvalConfig) -> SimResult<()>;
    fn evaluate(&mut self, input: &EvalInput) -> SimResult<EvalOutput>;
    fn cleanup(&mut self);
}
