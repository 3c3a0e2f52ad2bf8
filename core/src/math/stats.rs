use num_complex::Complex64;

pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&v| v * v).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// RMS of complex magnitudes, used for run summaries.
    pub fn rms_magnitude(samples: &[Complex64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|v| v.norm_sqr()).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }
}
