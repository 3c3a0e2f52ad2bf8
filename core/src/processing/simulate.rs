use crate::array_interface::{redundant_groups, ArrayLayout, Baseline};
use crate::grid::GridDetector;
use crate::math::{
    eci_to_enu_matrix, enu_to_az_za, point_source_crd_eq, rotate_to_topocentric,
    TopocentricRotation, DEFAULT_ARRAY_LATITUDE, SPEED_OF_LIGHT,
};
use crate::prelude::{EvalInput, SimError, SimResult};
use crate::processing::beam::Beam;
use crate::processing::buffer_pool::BufferPool;
use crate::processing::dispatch::{ChosenPath, DispatchOptions, EvalPlan, EvalStrategy, VisibilityDispatcher};
use ndarray::{parallel::prelude::*, Array2, Array3, Array4, ArrayView2, Axis};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Floating-point profile of a run. Computation is carried out in double
/// precision either way; the profile selects the default transform
/// tolerance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    pub fn default_accuracy(self) -> f64 {
        match self {
            Precision::Single => 6e-8,
            Precision::Double => 1e-12,
        }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Single
    }
}

/// Run-level configuration for a simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    pub precision: Precision,
    /// Explicit transform tolerance; overrides the precision default.
    pub accuracy: Option<f64>,
    pub strategy: EvalStrategy,
    /// Explicit `(ant1, ant2)` pairs to simulate. When absent, one
    /// representative per redundant group is simulated and expanded into
    /// the full antenna matrix.
    pub baselines: Option<Vec<(usize, usize)>>,
    pub include_autos: bool,
    pub grid_tol: f64,
    pub redundancy_tol: f64,
    /// Array latitude [radians].
    pub latitude: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            precision: Precision::default(),
            accuracy: None,
            strategy: EvalStrategy::Auto,
            baselines: None,
            include_autos: true,
            grid_tol: GridDetector::DEFAULT_TOL,
            redundancy_tol: 1.0,
            latitude: DEFAULT_ARRAY_LATITUDE,
        }
    }
}

impl SimulationOptions {
    pub fn resolved_accuracy(&self) -> f64 {
        self.accuracy
            .unwrap_or_else(|| self.precision.default_accuracy())
    }

    pub fn to_dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            strategy: self.strategy,
            accuracy: self.resolved_accuracy(),
            grid_tol: self.grid_tol,
            ..DispatchOptions::default()
        }
    }
}

/// Point-source catalogue: per-source flux densities [Jy] per frequency
/// channel and equatorial positions [radians].
#[derive(Debug, Clone)]
pub struct SkyModel {
    pub flux: Array2<f64>,
    pub ra: Vec<f64>,
    pub dec: Vec<f64>,
}

impl SkyModel {
    pub fn new(flux: Array2<f64>, ra: Vec<f64>, dec: Vec<f64>) -> SimResult<Self> {
        if flux.nrows() != ra.len() || ra.len() != dec.len() {
            return Err(SimError::ShapeMismatch(format!(
                "flux rows {}, ra {}, dec {}",
                flux.nrows(),
                ra.len(),
                dec.len()
            )));
        }
        Ok(Self { flux, ra, dec })
    }

    pub fn n_sources(&self) -> usize {
        self.ra.len()
    }
}

/// Simulated visibilities. Frequency is always the leading axis, matching
/// the per-channel evaluation order.
#[derive(Debug, Clone)]
pub enum VisOutput {
    /// Shape (n_freq, n_time, n_baseline), for an explicit baseline list.
    PerBaseline(Array3<Complex64>),
    /// Shape (n_freq, n_time, n_ant, n_ant), redundancy-expanded with
    /// conjugate filling.
    FullMatrix(Array4<Complex64>),
}

impl VisOutput {
    pub fn n_values(&self) -> usize {
        match self {
            VisOutput::PerBaseline(a) => a.len(),
            VisOutput::FullMatrix(a) => a.len(),
        }
    }

    pub fn to_vec(&self) -> Vec<Complex64> {
        match self {
            VisOutput::PerBaseline(a) => a.iter().copied().collect(),
            VisOutput::FullMatrix(a) => a.iter().copied().collect(),
        }
    }
}

/// A finished run: the visibilities plus the evaluation path that produced
/// them.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub visibilities: VisOutput,
    pub path: ChosenPath,
}

/// Simulate visibilities for a catalogue given observing LSTs; the
/// high-level entry that derives the coordinate transforms itself.
pub fn simulate_vis(
    layout: &ArrayLayout,
    sky: &SkyModel,
    freqs: &[f64],
    lsts: &[f64],
    beam: &dyn Beam,
    options: &SimulationOptions,
) -> SimResult<SimulationResult> {
    let crd_eq = point_source_crd_eq(&sky.ra, &sky.dec);
    let eq2tops: Vec<TopocentricRotation> = lsts
        .iter()
        .map(|&lst| eci_to_enu_matrix(lst, options.latitude))
        .collect();
    simulate(
        layout,
        sky.flux.view(),
        crd_eq.view(),
        &eq2tops,
        freqs,
        beam,
        options,
    )
}

/// Simulate visibilities from precomputed source vectors and per-time
/// topocentric rotations.
pub fn simulate(
    layout: &ArrayLayout,
    flux: ArrayView2<f64>,
    crd_eq: ArrayView2<f64>,
    eq2tops: &[TopocentricRotation],
    freqs: &[f64],
    beam: &dyn Beam,
    options: &SimulationOptions,
) -> SimResult<SimulationResult> {
    if layout.is_empty() {
        return Err(SimError::InvalidInput("empty antenna layout".into()));
    }
    if freqs.is_empty() || eq2tops.is_empty() {
        return Err(SimError::InvalidInput(
            "at least one frequency and one time step are required".into(),
        ));
    }
    if crd_eq.nrows() != 3 {
        return Err(SimError::ShapeMismatch(format!(
            "source vectors must be (3, n_src), got {} rows",
            crd_eq.nrows()
        )));
    }
    if flux.nrows() != crd_eq.ncols() || flux.ncols() != freqs.len() {
        return Err(SimError::ShapeMismatch(format!(
            "flux is {}x{} for {} sources and {} channels",
            flux.nrows(),
            flux.ncols(),
            crd_eq.ncols(),
            freqs.len()
        )));
    }

    // Representative baselines, plus the expansion table when simulating
    // whole redundant groups.
    let (reps, expansion) = match &options.baselines {
        Some(pairs) => {
            if pairs.is_empty() {
                return Err(SimError::InvalidInput("empty baseline selection".into()));
            }
            (layout.select_baselines(pairs)?, None)
        }
        None => {
            let groups = redundant_groups(layout, options.include_autos, options.redundancy_tol);
            let reps: Vec<Baseline> = groups.iter().map(|g| g.representative.clone()).collect();
            let mut table = Vec::with_capacity(groups.len());
            for group in &groups {
                let mut members = Vec::with_capacity(group.members.len());
                for member in &group.members {
                    members.push((
                        layout.slot_of(member.ant1)?,
                        layout.slot_of(member.ant2)?,
                        member.conjugate,
                    ));
                }
                table.push(members);
            }
            (reps, Some(table))
        }
    };

    let max_freq = freqs.iter().cloned().fold(0.0f64, f64::max);
    let max_abs_uv = reps
        .iter()
        .map(|b| {
            let [u, v] = b.uv_projection();
            (u * u + v * v).sqrt()
        })
        .fold(0.0f64, f64::max)
        * max_freq
        / SPEED_OF_LIGHT;

    let dispatcher = VisibilityDispatcher::new(options.to_dispatch_options());
    let plan = dispatcher.plan(&reps, crd_eq.ncols(), max_abs_uv)?;

    let uv_m: Vec<[f64; 2]> = reps.iter().map(|b| b.uv_projection()).collect();
    let n_freq = freqs.len();
    let n_time = eq2tops.len();
    let n_bl = reps.len();
    let n_ant = layout.len();

    let visibilities = match expansion {
        None => {
            let mut vis = Array3::<Complex64>::zeros((n_freq, n_time, n_bl));
            vis.axis_iter_mut(Axis(1))
                .into_par_iter()
                .zip(eq2tops.par_iter())
                .try_for_each(|(mut slice, rotation)| -> SimResult<()> {
                    let per_freq =
                        evaluate_timestep(crd_eq, rotation, flux, freqs, beam, &dispatcher, &plan, &uv_m)?;
                    for (fi, row) in per_freq.into_iter().enumerate() {
                        for (k, value) in row.into_iter().enumerate() {
                            slice[(fi, k)] = value;
                        }
                    }
                    Ok(())
                })?;
            VisOutput::PerBaseline(vis)
        }
        Some(table) => {
            let mut vis = Array4::<Complex64>::zeros((n_freq, n_time, n_ant, n_ant));
            vis.axis_iter_mut(Axis(1))
                .into_par_iter()
                .zip(eq2tops.par_iter())
                .try_for_each(|(mut slice, rotation)| -> SimResult<()> {
                    let per_freq =
                        evaluate_timestep(crd_eq, rotation, flux, freqs, beam, &dispatcher, &plan, &uv_m)?;
                    for (fi, row) in per_freq.into_iter().enumerate() {
                        for (k, value) in row.into_iter().enumerate() {
                            for &(slot1, slot2, conjugate) in &table[k] {
                                let v = if conjugate { value.conj() } else { value };
                                slice[(fi, slot1, slot2)] += v;
                                if slot1 != slot2 {
                                    slice[(fi, slot2, slot1)] += v.conj();
                                }
                            }
                        }
                    }
                    Ok(())
                })?;
            VisOutput::FullMatrix(vis)
        }
    };

    Ok(SimulationResult {
        visibilities,
        path: plan.path,
    })
}

/// One time step: rotate the catalogue into the topocentric frame, apply
/// the horizon cut and beam, and evaluate every frequency channel. Returns
/// one visibility row per channel.
#[allow(clippy::too_many_arguments)]
fn evaluate_timestep(
    crd_eq: ArrayView2<f64>,
    rotation: &TopocentricRotation,
    flux: ArrayView2<f64>,
    freqs: &[f64],
    beam: &dyn Beam,
    dispatcher: &VisibilityDispatcher,
    plan: &EvalPlan,
    uv_m: &[[f64; 2]],
) -> SimResult<Vec<Vec<Complex64>>> {
    let (east, north, up) = rotate_to_topocentric(crd_eq, rotation);

    let above: Vec<usize> = (0..up.len()).filter(|&j| up[j] > 0.0).collect();
    if above.is_empty() {
        return Ok(vec![vec![Complex64::default(); uv_m.len()]; freqs.len()]);
    }

    let tx: Vec<f64> = above.iter().map(|&j| east[j]).collect();
    let ty: Vec<f64> = above.iter().map(|&j| north[j]).collect();
    let angles: Vec<(f64, f64)> = above
        .iter()
        .map(|&j| enu_to_az_za(east[j], north[j], up[j]))
        .collect();

    let mut evaluator = dispatcher.build(plan)?;
    let mut pool = BufferPool::with_capacity(2);
    let mut per_freq = Vec::with_capacity(freqs.len());

    for (fi, &freq) in freqs.iter().enumerate() {
        let scale = freq / SPEED_OF_LIGHT;
        let uv: Vec<[f64; 2]> = uv_m.iter().map(|b| [b[0] * scale, b[1] * scale]).collect();

        let mut intensity = pool.checkout(above.len())?;
        for (slot, &j) in above.iter().enumerate() {
            let (az, za) = angles[slot];
            let amplitude = beam.amplitude(az, za, freq);
            // Half the Stokes intensity lands in this polarization channel.
            intensity[slot] = Complex64::new(0.5 * flux[(j, fi)] * amplitude * amplitude, 0.0);
        }

        let output = evaluator.evaluate(&EvalInput {
            tx: &tx,
            ty: &ty,
            intensity: &intensity,
            uv: &uv,
            uv_scale: scale,
        })?;
        pool.release(intensity);
        per_freq.push(output.visibilities);
    }

    evaluator.cleanup();
    Ok(per_freq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array_interface::Antenna;
    use crate::processing::beam::UniformBeam;

    const LST: f64 = 1.1;

    fn irregular_layout() -> ArrayLayout {
        ArrayLayout::new(vec![
            Antenna::new(0, [0.0, 0.0, 0.0]),
            Antenna::new(1, [13.0, 2.0, 0.0]),
            Antenna::new(2, [-5.0, 21.0, 0.0]),
        ])
        .unwrap()
    }

    fn grid_layout(spacing: f64) -> ArrayLayout {
        ArrayLayout::new(vec![
            Antenna::new(0, [0.0, 0.0, 0.0]),
            Antenna::new(1, [spacing, 0.0, 0.0]),
            Antenna::new(2, [0.0, spacing, 0.0]),
            Antenna::new(3, [spacing, spacing, 0.0]),
        ])
        .unwrap()
    }

    fn options_with_strategy(strategy: EvalStrategy) -> SimulationOptions {
        SimulationOptions {
            strategy,
            ..SimulationOptions::default()
        }
    }

    fn scattered_sky(n: usize, n_freq: usize, lat: f64) -> SkyModel {
        let mut ra = Vec::new();
        let mut dec = Vec::new();
        let mut flux = Array2::zeros((n, n_freq));
        for j in 0..n {
            let u = j as f64 + 1.0;
            ra.push(LST + ((u * 0.311).fract() - 0.5) * 0.25);
            dec.push(lat + ((u * 0.677).fract() - 0.5) * 0.25);
            for fi in 0..n_freq {
                flux[(j, fi)] = 0.5 + (u * 0.151).fract() + 0.1 * fi as f64;
            }
        }
        SkyModel::new(flux, ra, dec).unwrap()
    }

    #[test]
    fn zenith_source_yields_half_flux_on_every_baseline() {
        let layout = irregular_layout();
        let options = SimulationOptions {
            baselines: Some(vec![(0, 1), (0, 2), (1, 2)]),
            strategy: EvalStrategy::Direct,
            ..SimulationOptions::default()
        };
        let sky = SkyModel::new(
            Array2::from_elem((1, 1), 2.0),
            vec![LST],
            vec![options.latitude],
        )
        .unwrap();

        let result =
            simulate_vis(&layout, &sky, &[150e6], &[LST], &UniformBeam, &options).unwrap();
        match result.visibilities {
            VisOutput::PerBaseline(vis) => {
                assert_eq!(vis.dim(), (1, 1, 3));
                for value in vis.iter() {
                    assert!((value - Complex64::new(1.0, 0.0)).norm() < 1e-9);
                }
            }
            VisOutput::FullMatrix(_) => panic!("explicit baselines must stay per-baseline"),
        }
    }

    #[test]
    fn below_horizon_sources_contribute_nothing() {
        let layout = irregular_layout();
        let options = options_with_strategy(EvalStrategy::Direct);
        let sky = SkyModel::new(
            Array2::from_elem((1, 1), 5.0),
            vec![LST + std::f64::consts::PI],
            vec![-options.latitude],
        )
        .unwrap();

        let result =
            simulate_vis(&layout, &sky, &[150e6], &[LST], &UniformBeam, &options).unwrap();
        let values = result.visibilities.to_vec();
        assert!(!values.is_empty());
        assert!(values.iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn evaluation_paths_agree_on_a_gridded_array() {
        let layout = grid_layout(8.0);
        let sky = scattered_sky(6, 2, DEFAULT_ARRAY_LATITUDE);
        let freqs = [100e6, 150e6];
        let lsts = [LST, LST + 0.02];

        let mut outputs = Vec::new();
        for strategy in [EvalStrategy::Direct, EvalStrategy::Type1, EvalStrategy::Type3] {
            let options = options_with_strategy(strategy);
            let result =
                simulate_vis(&layout, &sky, &freqs, &lsts, &UniformBeam, &options).unwrap();
            outputs.push(result.visibilities.to_vec());
        }

        let reference = &outputs[0];
        let scale = reference
            .iter()
            .map(|v| v.norm())
            .fold(0.0f64, f64::max)
            .max(1.0);
        for other in &outputs[1..] {
            assert_eq!(other.len(), reference.len());
            for (a, b) in reference.iter().zip(other.iter()) {
                assert!(
                    (a - b).norm() < 1e-5 * scale,
                    "paths disagree: {} vs {}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn full_matrix_is_hermitian() {
        let layout = grid_layout(8.0);
        let sky = scattered_sky(4, 1, DEFAULT_ARRAY_LATITUDE);
        let options = options_with_strategy(EvalStrategy::Direct);

        let result =
            simulate_vis(&layout, &sky, &[150e6], &[LST], &UniformBeam, &options).unwrap();
        match result.visibilities {
            VisOutput::FullMatrix(vis) => {
                let n = layout.len();
                for i in 0..n {
                    for j in 0..n {
                        let forward = vis[(0, 0, i, j)];
                        let reverse = vis[(0, 0, j, i)];
                        assert!((forward - reverse.conj()).norm() < 1e-9);
                    }
                    let auto = vis[(0, 0, i, i)];
                    assert!(auto.im.abs() < 1e-9);
                    assert!(auto.re > 0.0);
                }
            }
            VisOutput::PerBaseline(_) => panic!("redundant run must expand to the full matrix"),
        }
    }

    #[test]
    fn flux_shape_mismatch_is_rejected() {
        let layout = irregular_layout();
        let sky = SkyModel::new(Array2::from_elem((1, 2), 1.0), vec![LST], vec![0.0]).unwrap();
        let options = SimulationOptions::default();
        // one flux channel versus two requested frequencies
        assert!(simulate_vis(
            &layout,
            &sky,
            &[150e6, 160e6, 170e6],
            &[LST],
            &UniformBeam,
            &options
        )
        .is_err());
    }

    #[test]
    fn accuracy_profile_resolves_defaults() {
        let single = SimulationOptions::default();
        assert!((single.resolved_accuracy() - 6e-8).abs() < 1e-20);
        let double = SimulationOptions {
            precision: Precision::Double,
            ..SimulationOptions::default()
        };
        assert!((double.resolved_accuracy() - 1e-12).abs() < 1e-24);
        let explicit = SimulationOptions {
            accuracy: Some(1e-6),
            ..SimulationOptions::default()
        };
        assert!((explicit.resolved_accuracy() - 1e-6).abs() < 1e-18);
    }
}
