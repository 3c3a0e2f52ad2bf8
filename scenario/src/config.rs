use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use viscore::processing::{Beam, CosineBeam, GaussianBeam, SimulationOptions, UniformBeam};

/// Full description of a synthetic observing run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub array: ArraySpec,
    pub sky: SkySpec,
    pub freqs: FrequencySpec,
    pub times: TimeSpec,
    #[serde(default)]
    pub beam: BeamSpec,
    #[serde(default)]
    pub options: SimulationOptions,
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario config {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario config {}", path_ref.display()))?;
        Ok(config)
    }
}

/// Antenna layout recipe.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ArraySpec {
    /// Regular east/north grid, the layout that exercises the uniform
    /// evaluation path.
    Grid {
        rows: usize,
        cols: usize,
        spacing_m: f64,
    },
    /// Seeded scatter inside a square aperture.
    Randomized {
        n_ants: usize,
        aperture_m: f64,
        seed: u64,
    },
}

/// Seeded point-source catalogue recipe: sources scattered around the
/// field centre within `field_radius_rad`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkySpec {
    pub n_sources: usize,
    pub flux_jy: f64,
    pub field_radius_rad: f64,
    pub seed: u64,
}

/// Evenly spaced frequency channels [Hz].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrequencySpec {
    pub start_hz: f64,
    pub step_hz: f64,
    pub count: usize,
}

impl FrequencySpec {
    pub fn channels(&self) -> Vec<f64> {
        (0..self.count)
            .map(|i| self.start_hz + i as f64 * self.step_hz)
            .collect()
    }
}

/// Evenly spaced local sidereal times [radians].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeSpec {
    pub start_lst_rad: f64,
    pub step_rad: f64,
    pub count: usize,
}

impl TimeSpec {
    pub fn lsts(&self) -> Vec<f64> {
        (0..self.count)
            .map(|i| self.start_lst_rad + i as f64 * self.step_rad)
            .collect()
    }

    pub fn centre_lst(&self) -> f64 {
        self.start_lst_rad + self.step_rad * (self.count.saturating_sub(1)) as f64 / 2.0
    }
}

/// Primary-beam recipe.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BeamSpec {
    Uniform,
    Gaussian { fwhm_deg: f64, ref_freq_hz: f64 },
    Cosine { power: f64 },
}

impl Default for BeamSpec {
    fn default() -> Self {
        BeamSpec::Uniform
    }
}

impl BeamSpec {
    pub fn build(&self) -> Box<dyn Beam> {
        match *self {
            BeamSpec::Uniform => Box::new(UniformBeam),
            BeamSpec::Gaussian {
                fwhm_deg,
                ref_freq_hz,
            } => Box::new(GaussianBeam::new(fwhm_deg.to_radians(), ref_freq_hz)),
            BeamSpec::Cosine { power } => Box::new(CosineBeam::new(power)),
        }
    }
}
