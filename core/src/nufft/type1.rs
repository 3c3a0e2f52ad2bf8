use crate::math::fft::FftHelper;
use crate::nufft::kernel::{spread_weights, KernelParams};
use crate::prelude::{SimError, SimResult};
use ndarray::Array2;
use num_complex::Complex64;

/// Type-1 (non-uniform to uniform) 2D transform:
///
/// `F(k1, k2) = sum_j c_j * exp(-i (k1 x_j + k2 y_j))`
///
/// for integer modes `k1 in [-K1, K1]`, `k2 in [-K2, K2]`. Points are
/// interpreted on the 2-pi periodic domain, which is exact for integer
/// modes. Strengths are spread onto an oversampled fine grid with a
/// truncated Gaussian, transformed with one FFT, and deconvolved.
pub struct Type1Plan {
    n_modes: [usize; 2],
    params: [KernelParams; 2],
    fft: FftHelper,
    grid: Vec<Complex64>,
    weights1: Vec<f64>,
    weights2: Vec<f64>,
}

impl Type1Plan {
    /// `n_modes` must both be odd so the mode block is centred on zero.
    pub fn new(n1: usize, n2: usize, accuracy: f64) -> SimResult<Self> {
        if n1 % 2 == 0 || n2 % 2 == 0 {
            return Err(SimError::InvalidInput(format!(
                "mode counts must be odd, got {}x{}",
                n1, n2
            )));
        }
        let params1 = KernelParams::for_accuracy(accuracy, n1)?;
        let params2 = KernelParams::for_accuracy(accuracy, n2)?;
        let fft = FftHelper::new(params1.fine_size, params2.fine_size);
        let grid = vec![Complex64::default(); params1.fine_size * params2.fine_size];
        let weights1 = vec![0.0; 2 * params1.half_width];
        let weights2 = vec![0.0; 2 * params2.half_width];
        Ok(Self {
            n_modes: [n1, n2],
            params: [params1, params2],
            fft,
            grid,
            weights1,
            weights2,
        })
    }

    pub fn mode_counts(&self) -> [usize; 2] {
        self.n_modes
    }

    /// Transform strengths at `(x, y)` into the centred mode block, shape
    /// `(n1, n2)` with element `(i1, i2)` holding mode
    /// `(i1 - K1, i2 - K2)`.
    pub fn evaluate(
        &mut self,
        x: &[f64],
        y: &[f64],
        strengths: &[Complex64],
    ) -> SimResult<Array2<Complex64>> {
        if x.len() != y.len() || x.len() != strengths.len() {
            return Err(SimError::ShapeMismatch(format!(
                "point/strength lengths differ: {} / {} / {}",
                x.len(),
                y.len(),
                strengths.len()
            )));
        }

        let [p1, p2] = self.params;
        let (fine1, fine2) = (p1.fine_size, p2.fine_size);
        self.grid.iter_mut().for_each(|v| *v = Complex64::default());

        for ((&xj, &yj), &cj) in x.iter().zip(y.iter()).zip(strengths.iter()) {
            let first1 = spread_weights(&p1, xj, &mut self.weights1);
            let first2 = spread_weights(&p2, yj, &mut self.weights2);
            for (o1, &w1) in self.weights1.iter().enumerate() {
                let row = (first1 + o1 as i64).rem_euclid(fine1 as i64) as usize;
                let scaled = cj * w1;
                for (o2, &w2) in self.weights2.iter().enumerate() {
                    let col = (first2 + o2 as i64).rem_euclid(fine2 as i64) as usize;
                    self.grid[row * fine2 + col] += scaled * w2;
                }
            }
        }

        self.fft.forward(&mut self.grid);

        let [n1, n2] = self.n_modes;
        let half1 = (n1 as i64 - 1) / 2;
        let half2 = (n2 as i64 - 1) / 2;
        let norm = std::f64::consts::PI / (p1.tau * p2.tau).sqrt() / (fine1 * fine2) as f64;

        let mut out = Array2::default((n1, n2));
        for i1 in 0..n1 {
            let k1 = i1 as i64 - half1;
            let bin1 = k1.rem_euclid(fine1 as i64) as usize;
            let deconv1 = (p1.tau * (k1 * k1) as f64).exp();
            for i2 in 0..n2 {
                let k2 = i2 as i64 - half2;
                let bin2 = k2.rem_euclid(fine2 as i64) as usize;
                let deconv2 = (p2.tau * (k2 * k2) as f64).exp();
                out[(i1, i2)] = self.grid[bin1 * fine2 + bin2] * (norm * deconv1 * deconv2);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn synthetic_points(n: usize) -> (Vec<f64>, Vec<f64>, Vec<Complex64>) {
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        let mut c = Vec::with_capacity(n);
        for j in 0..n {
            let t = j as f64 + 1.0;
            x.push((t * 0.731).fract() * 2.0 * PI);
            y.push((t * 0.413).fract() * 2.0 * PI);
            c.push(Complex64::new((t * 1.37).sin(), (t * 0.59).cos()));
        }
        (x, y, c)
    }

    fn direct_modes(
        x: &[f64],
        y: &[f64],
        c: &[Complex64],
        n1: usize,
        n2: usize,
    ) -> Array2<Complex64> {
        let half1 = (n1 as i64 - 1) / 2;
        let half2 = (n2 as i64 - 1) / 2;
        let mut out = Array2::default((n1, n2));
        for i1 in 0..n1 {
            for i2 in 0..n2 {
                let k1 = (i1 as i64 - half1) as f64;
                let k2 = (i2 as i64 - half2) as f64;
                let mut acc = Complex64::default();
                for j in 0..x.len() {
                    acc += c[j] * Complex64::cis(-(k1 * x[j] + k2 * y[j]));
                }
                out[(i1, i2)] = acc;
            }
        }
        out
    }

    #[test]
    fn even_mode_counts_are_rejected() {
        assert!(Type1Plan::new(8, 5, 1e-8).is_err());
    }

    #[test]
    fn matches_direct_mode_summation() {
        let (x, y, c) = synthetic_points(25);
        let mut plan = Type1Plan::new(7, 5, 1e-9).unwrap();
        let fast = plan.evaluate(&x, &y, &c).unwrap();
        let exact = direct_modes(&x, &y, &c, 7, 5);

        let scale: f64 = c.iter().map(|v| v.norm()).sum();
        for (f, e) in fast.iter().zip(exact.iter()) {
            assert!(
                (f - e).norm() < 1e-6 * scale,
                "mode mismatch: {} vs {}",
                f,
                e
            );
        }
    }

    #[test]
    fn single_mode_recovers_total_strength() {
        let (x, y, c) = synthetic_points(10);
        let mut plan = Type1Plan::new(1, 1, 1e-8).unwrap();
        let out = plan.evaluate(&x, &y, &c).unwrap();
        let total: Complex64 = c.iter().sum();
        assert!((out[(0, 0)] - total).norm() < 1e-6 * total.norm().max(1.0));
    }

    #[test]
    fn negative_coordinates_wrap_exactly() {
        let x = vec![-1.3, 2.0];
        let y = vec![0.4, -2.6];
        let c = vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 1.0)];
        let mut plan = Type1Plan::new(5, 5, 1e-9).unwrap();
        let fast = plan.evaluate(&x, &y, &c).unwrap();
        let exact = direct_modes(&x, &y, &c, 5, 5);
        for (f, e) in fast.iter().zip(exact.iter()) {
            assert!((f - e).norm() < 1e-6);
        }
    }
}
