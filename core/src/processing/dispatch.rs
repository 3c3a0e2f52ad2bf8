use crate::array_interface::Baseline;
use crate::grid::{BaselineLattice, GridDecision, GridDetector};
use crate::nufft::{direct_sum, KernelParams, Type1Plan, Type3Plan};
use crate::prelude::{
    EvalConfig, EvalInput, EvalOutput, SimError, SimResult, VisibilityEvaluator,
};
use crate::telemetry::{LogManager, MetricsRecorder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::f64::consts::PI;
use std::sync::Arc;

/// Requested evaluation strategy. `Auto` lets the dispatcher pick from the
/// lattice detection result and coarse cost estimates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EvalStrategy {
    Auto,
    Type1,
    Type3,
    Direct,
}

impl Default for EvalStrategy {
    fn default() -> Self {
        EvalStrategy::Auto
    }
}

/// The evaluation path actually selected for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChosenPath {
    Type1,
    Type3,
    Direct,
}

impl ChosenPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChosenPath::Type1 => "type1",
            ChosenPath::Type3 => "type3",
            ChosenPath::Direct => "direct",
        }
    }
}

/// Dispatcher tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    pub strategy: EvalStrategy,
    pub accuracy: f64,
    pub grid_tol: f64,
    /// Largest uniform output grid Type-1 may allocate outright.
    pub type1_mode_limit: u64,
    /// Below this populated fraction a detected lattice is considered too
    /// sparse for the uniform path unless it is small anyway.
    pub min_occupancy: f64,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            strategy: EvalStrategy::Auto,
            accuracy: 6e-8,
            grid_tol: GridDetector::DEFAULT_TOL,
            type1_mode_limit: 1 << 18,
            min_occupancy: 1.0 / 64.0,
        }
    }
}

/// Resolved evaluation plan: the path plus whatever the evaluator needs to
/// set itself up.
#[derive(Debug, Clone)]
pub struct EvalPlan {
    pub path: ChosenPath,
    pub lattice: Option<BaselineLattice>,
    pub accuracy: f64,
}

/// Chooses between the Type-1, Type-3 and direct evaluation paths and
/// constructs the matching evaluator.
pub struct VisibilityDispatcher {
    options: DispatchOptions,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl VisibilityDispatcher {
    pub fn new(options: DispatchOptions) -> Self {
        Self {
            options,
            logger: LogManager::new(),
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    /// Resolve the evaluation path for a baseline set. `n_sources` and
    /// `max_abs_uv` (wavelengths, at the highest frequency) feed the cost
    /// estimates.
    pub fn plan(
        &self,
        baselines: &[Baseline],
        n_sources: usize,
        max_abs_uv: f64,
    ) -> SimResult<EvalPlan> {
        if baselines.is_empty() {
            return Err(SimError::InvalidInput("no baselines to evaluate".into()));
        }
        let detector = GridDetector::new(self.options.grid_tol);

        let (path, lattice) = match self.options.strategy {
            EvalStrategy::Direct => (ChosenPath::Direct, None),
            EvalStrategy::Type3 => (ChosenPath::Type3, None),
            EvalStrategy::Type1 => match detector.detect_baselines(baselines) {
                GridDecision::Gridded(lattice) => (ChosenPath::Type1, Some(lattice)),
                GridDecision::Ungridded => {
                    self.metrics.record_error();
                    return Err(SimError::InvalidInput(
                        "uniform-grid evaluation forced on an ungridded baseline set".into(),
                    ));
                }
            },
            EvalStrategy::Auto => self.auto_choice(
                detector.detect_baselines(baselines),
                n_sources,
                baselines.len(),
                max_abs_uv,
            )?,
        };

        self.logger.record(
            &json!({
                "event": "dispatch",
                "path": path.as_str(),
                "baselines": baselines.len(),
                "sources": n_sources,
                "modes": lattice.as_ref().map(|l| l.mode_counts()),
            })
            .to_string(),
        );
        self.metrics.record_path(path);

        Ok(EvalPlan {
            path,
            lattice,
            accuracy: self.options.accuracy,
        })
    }

    fn auto_choice(
        &self,
        decision: GridDecision,
        n_sources: usize,
        n_baselines: usize,
        max_abs_uv: f64,
    ) -> SimResult<(ChosenPath, Option<BaselineLattice>)> {
        if let GridDecision::Gridded(lattice) = decision {
            let compact = lattice.mode_points() <= self.options.type1_mode_limit;
            if compact || lattice.occupancy() >= self.options.min_occupancy {
                return Ok((ChosenPath::Type1, Some(lattice)));
            }
        }

        let half_width = KernelParams::for_accuracy(self.options.accuracy, 16)?.half_width;
        let direct_work = n_sources as f64 * n_baselines as f64;
        if direct_work < estimate_type3_work(n_sources, n_baselines, max_abs_uv, half_width) {
            Ok((ChosenPath::Direct, None))
        } else {
            Ok((ChosenPath::Type3, None))
        }
    }

    /// Construct and initialize the evaluator described by a plan. Each
    /// worker thread builds its own instance.
    pub fn build(&self, plan: &EvalPlan) -> SimResult<Box<dyn VisibilityEvaluator>> {
        let mut evaluator: Box<dyn VisibilityEvaluator> = match plan.path {
            ChosenPath::Direct => Box::new(DirectEvaluator),
            ChosenPath::Type3 => Box::new(Type3Evaluator::default()),
            ChosenPath::Type1 => {
                let lattice = plan.lattice.clone().ok_or_else(|| {
                    SimError::Internal("uniform path planned without a lattice".into())
                })?;
                Box::new(Type1Evaluator::new(lattice))
            }
        };
        evaluator.initialize(&EvalConfig {
            accuracy: plan.accuracy,
        })?;
        Ok(evaluator)
    }
}

/// Spreading, fine-grid FFT and interpolation work of a Type-3 run, in the
/// same arbitrary units as `n_sources * n_baselines` for the direct path.
fn estimate_type3_work(
    n_sources: usize,
    n_baselines: usize,
    max_abs_uv: f64,
    half_width: usize,
) -> f64 {
    let kernel_cells = (2 * half_width * 2 * half_width) as f64;
    // Worst-case target stretch: points spanning the full periodic domain
    // compressed into its central half.
    let stretched = 4.0 * max_abs_uv;
    let modes = 2.0 * (stretched + half_width as f64 + 1.0) + 1.0;
    let fine = 2.0 * modes;
    let grid = fine * fine;
    (n_sources + n_baselines) as f64 * kernel_cells + grid * grid.log2().max(1.0)
}

/// Exact-summation path.
struct DirectEvaluator;

impl VisibilityEvaluator for DirectEvaluator {
    fn initialize(&mut self, _config: &EvalConfig) -> SimResult<()> {
        Ok(())
    }

    fn evaluate(&mut self, input: &EvalInput) -> SimResult<EvalOutput> {
        Ok(EvalOutput {
            visibilities: direct_sum(input.tx, input.ty, input.intensity, input.uv),
        })
    }

    fn cleanup(&mut self) {}
}

/// Fully non-uniform path.
#[derive(Default)]
struct Type3Evaluator {
    plan: Option<Type3Plan>,
}

impl VisibilityEvaluator for Type3Evaluator {
    fn initialize(&mut self, config: &EvalConfig) -> SimResult<()> {
        self.plan = Some(Type3Plan::new(config.accuracy)?);
        Ok(())
    }

    fn evaluate(&mut self, input: &EvalInput) -> SimResult<EvalOutput> {
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| SimError::Internal("evaluator not initialized".into()))?;

        let x: Vec<f64> = input.tx.iter().map(|&l| 2.0 * PI * l).collect();
        let y: Vec<f64> = input.ty.iter().map(|&m| 2.0 * PI * m).collect();
        let s: Vec<f64> = input.uv.iter().map(|p| p[0]).collect();
        let t: Vec<f64> = input.uv.iter().map(|p| p[1]).collect();

        Ok(EvalOutput {
            visibilities: plan.evaluate(&x, &y, input.intensity, &s, &t)?,
        })
    }

    fn cleanup(&mut self) {
        self.plan = None;
    }
}

/// Uniform-output path over a detected baseline lattice.
struct Type1Evaluator {
    lattice: BaselineLattice,
    plan: Option<Type1Plan>,
}

impl Type1Evaluator {
    fn new(lattice: BaselineLattice) -> Self {
        Self {
            lattice,
            plan: None,
        }
    }
}

impl VisibilityEvaluator for Type1Evaluator {
    fn initialize(&mut self, config: &EvalConfig) -> SimResult<()> {
        let [n1, n2] = self.lattice.mode_counts();
        self.plan = Some(Type1Plan::new(n1, n2, config.accuracy)?);
        Ok(())
    }

    fn evaluate(&mut self, input: &EvalInput) -> SimResult<EvalOutput> {
        let plan = self
            .plan
            .as_mut()
            .ok_or_else(|| SimError::Internal("evaluator not initialized".into()))?;
        if input.uv.len() != self.lattice.coords.len() {
            return Err(SimError::ShapeMismatch(format!(
                "{} baselines for a lattice of {}",
                input.uv.len(),
                self.lattice.coords.len()
            )));
        }

        // Project source positions onto the lattice basis so the integer
        // modes of the transform land exactly on the baselines.
        let basis = self.lattice.basis;
        let scale = 2.0 * PI * input.uv_scale;
        let n = input.tx.len();
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for j in 0..n {
            let l = input.tx[j];
            let m = input.ty[j];
            x.push(scale * (basis[0][0] * l + basis[0][1] * m));
            y.push(scale * (basis[1][0] * l + basis[1][1] * m));
        }

        let modes = plan.evaluate(&x, &y, input.intensity)?;
        let half = self.lattice.half_extent;
        let visibilities = self
            .lattice
            .coords
            .iter()
            .map(|&[c1, c2]| modes[((c1 + half[0]) as usize, (c2 + half[1]) as usize)])
            .collect();

        Ok(EvalOutput { visibilities })
    }

    fn cleanup(&mut self) {
        self.plan = None;
    }
}
