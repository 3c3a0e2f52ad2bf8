use crate::prelude::{SimError, SimResult};
use std::f64::consts::PI;

/// Gaussian spreading parameters for one transform axis, following the
/// Dutt-Rokhlin accuracy parameterisation: an oversampled fine grid and a
/// truncated Gaussian whose width balances spreading truncation against
/// aliasing at the requested tolerance.
#[derive(Debug, Clone, Copy)]
pub struct KernelParams {
    /// Spreading half-width: each point touches `2 * half_width` fine-grid
    /// cells per axis.
    pub half_width: usize,
    /// Fine (oversampled) grid size for this axis, always even.
    pub fine_size: usize,
    /// Gaussian variance parameter; the kernel is `exp(-d^2 / (4 tau))`.
    pub tau: f64,
}

impl KernelParams {
    /// Parameters for `n_modes` output modes at the requested accuracy.
    pub fn for_accuracy(accuracy: f64, n_modes: usize) -> SimResult<Self> {
        if !(1e-33..0.1).contains(&accuracy) {
            return Err(SimError::InvalidInput(format!(
                "accuracy {} outside supported range",
                accuracy
            )));
        }
        if n_modes == 0 {
            return Err(SimError::InvalidInput("zero output modes".into()));
        }
        let ratio: f64 = if accuracy > 1e-11 { 2.0 } else { 3.0 };
        let half_width = (-accuracy.ln() / (PI * (ratio - 1.0) / (ratio - 0.5)) + 0.5) as usize;
        let half_width = half_width.max(2);
        let mut fine_size = (ratio as usize * n_modes).max(2 * half_width);
        if fine_size % 2 == 1 {
            fine_size += 1;
        }
        // Width follows the fine-grid spacing so the truncated tails stay at
        // the accuracy level even when the kernel width, not the mode count,
        // sets the grid size.
        let h = 2.0 * PI / fine_size as f64;
        let tau = h * h * half_width as f64 * ratio / (4.0 * PI * (ratio - 0.5));
        Ok(Self {
            half_width,
            fine_size,
            tau,
        })
    }

    /// Fine-grid spacing on the 2-pi periodic domain.
    pub fn spacing(&self) -> f64 {
        2.0 * PI / self.fine_size as f64
    }
}

/// Spreading weights of one point onto its `2 * half_width` nearest fine
/// cells. Returns the first touched cell index (unwrapped) and fills
/// `weights`.
pub fn spread_weights(params: &KernelParams, x: f64, weights: &mut [f64]) -> i64 {
    debug_assert_eq!(weights.len(), 2 * params.half_width);
    let h = params.spacing();
    let wrapped = x.rem_euclid(2.0 * PI);
    let centre = (wrapped / h).floor() as i64 + 1;
    let first = centre - params.half_width as i64;
    for (offset, weight) in weights.iter_mut().enumerate() {
        let cell = (first + offset as i64) as f64 * h;
        let d = wrapped - cell;
        *weight = (-0.25 * d * d / params.tau).exp();
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tighter_accuracy_widens_the_kernel() {
        let loose = KernelParams::for_accuracy(1e-4, 16).unwrap();
        let tight = KernelParams::for_accuracy(1e-9, 16).unwrap();
        assert!(tight.half_width > loose.half_width);
    }

    #[test]
    fn fine_grid_covers_oversampling_and_width() {
        let params = KernelParams::for_accuracy(1e-8, 3).unwrap();
        assert!(params.fine_size >= 2 * params.half_width);
        assert!(params.fine_size >= 2 * 3);
        assert_eq!(params.fine_size % 2, 0);
    }

    #[test]
    fn out_of_range_accuracy_is_rejected() {
        assert!(KernelParams::for_accuracy(0.5, 8).is_err());
        assert!(KernelParams::for_accuracy(0.0, 8).is_err());
    }

    #[test]
    fn weights_peak_near_the_point() {
        let params = KernelParams::for_accuracy(1e-6, 8).unwrap();
        let mut weights = vec![0.0; 2 * params.half_width];
        let x = 1.234;
        let first = spread_weights(&params, x, &mut weights);
        let peak = weights
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let peak_cell = (first + peak as i64) as f64 * params.spacing();
        assert!((peak_cell - x).abs() <= params.spacing());
    }
}
