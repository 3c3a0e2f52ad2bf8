use crate::nufft::type1::Type1Plan;
use crate::prelude::{SimError, SimResult};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Fraction of the periodic domain the rescaled points may occupy. The
/// remaining headroom is what keeps the integer-sample interpolation below
/// the requested tolerance.
const POINT_COMPRESSION: f64 = 0.5;

/// Ceiling on the internal mode grid; beyond this the transform would need
/// more memory than a simulation-sized problem justifies.
const MAX_INTERNAL_MODES: u64 = 1 << 22;

/// Type-3 (non-uniform to non-uniform) 2D transform:
///
/// `F_k = sum_j c_j * exp(-i (s_k x_j + t_k y_j))`
///
/// for arbitrary real points `(x, y)` and targets `(s, t)`. Points are
/// compressed into the periodic domain, strengths pre-deconvolved, a Type-1
/// transform fills an internal uniform mode grid, and each target is
/// interpolated from its nearest modes with a truncated Gaussian.
pub struct Type3Plan {
    accuracy: f64,
    half_width: usize,
    tau: f64,
}

impl Type3Plan {
    pub fn new(accuracy: f64) -> SimResult<Self> {
        if !(1e-33..0.1).contains(&accuracy) {
            return Err(SimError::InvalidInput(format!(
                "accuracy {} outside supported range",
                accuracy
            )));
        }
        let half_width = ((-accuracy.ln() / (PI / 1.5)) + 0.5) as usize;
        let half_width = half_width.max(2);
        // Gaussian width for unit-spaced interpolation samples.
        let tau = half_width as f64 / (3.0 * PI);
        Ok(Self {
            accuracy,
            half_width,
            tau,
        })
    }

    pub fn evaluate(
        &self,
        x: &[f64],
        y: &[f64],
        strengths: &[Complex64],
        s: &[f64],
        t: &[f64],
    ) -> SimResult<Vec<Complex64>> {
        if x.len() != y.len() || x.len() != strengths.len() {
            return Err(SimError::ShapeMismatch(format!(
                "point/strength lengths differ: {} / {} / {}",
                x.len(),
                y.len(),
                strengths.len()
            )));
        }
        if s.len() != t.len() {
            return Err(SimError::ShapeMismatch(format!(
                "target lengths differ: {} / {}",
                s.len(),
                t.len()
            )));
        }
        if s.is_empty() {
            return Ok(Vec::new());
        }
        if x.is_empty() {
            return Ok(vec![Complex64::default(); s.len()]);
        }

        let axis_x = AxisScaling::fit(x, s);
        let axis_y = AxisScaling::fit(y, t);

        let n1 = axis_x.internal_modes(self.half_width);
        let n2 = axis_y.internal_modes(self.half_width);
        if (n1 as u64).saturating_mul(n2 as u64) > MAX_INTERNAL_MODES {
            return Err(SimError::Unsupported(format!(
                "internal mode grid {}x{} exceeds supported size",
                n1, n2
            )));
        }

        // Pre-deconvolve the interpolation kernel, then fill the internal
        // uniform grid with a Type-1 transform.
        let ghat_norm = 4.0 * PI * self.tau;
        let mut scaled_x = Vec::with_capacity(x.len());
        let mut scaled_y = Vec::with_capacity(y.len());
        let mut pre = Vec::with_capacity(strengths.len());
        for j in 0..x.len() {
            let xs = x[j] * axis_x.point_scale;
            let ys = y[j] * axis_y.point_scale;
            scaled_x.push(xs);
            scaled_y.push(ys);
            pre.push(strengths[j] * ((self.tau * (xs * xs + ys * ys)).exp() / ghat_norm));
        }

        let mut inner = Type1Plan::new(n1, n2, self.accuracy)?;
        let modes = inner.evaluate(&scaled_x, &scaled_y, &pre)?;

        let half1 = (n1 as i64 - 1) / 2;
        let half2 = (n2 as i64 - 1) / 2;
        let w = self.half_width as i64;

        let mut out = Vec::with_capacity(s.len());
        for k in 0..s.len() {
            let sk = s[k] / axis_x.point_scale;
            let tk = t[k] / axis_y.point_scale;
            let base1 = sk.floor() as i64;
            let base2 = tk.floor() as i64;
            let mut acc = Complex64::default();
            for n in (base1 - w + 1)..=(base1 + w) {
                let d1 = sk - n as f64;
                let w1 = (-d1 * d1 / (4.0 * self.tau)).exp();
                let i1 = (n + half1) as usize;
                for m in (base2 - w + 1)..=(base2 + w) {
                    let d2 = tk - m as f64;
                    let w2 = (-d2 * d2 / (4.0 * self.tau)).exp();
                    let i2 = (m + half2) as usize;
                    acc += modes[(i1, i2)] * (w1 * w2);
                }
            }
            out.push(acc);
        }
        Ok(out)
    }
}

/// Per-axis rescaling: points are compressed into the allowed slice of the
/// periodic domain and targets stretched by the inverse factor.
struct AxisScaling {
    point_scale: f64,
    target_extent: f64,
}

impl AxisScaling {
    fn fit(points: &[f64], targets: &[f64]) -> Self {
        let point_extent = points
            .iter()
            .fold(0.0f64, |acc, &v| acc.max(v.abs()))
            .max(1e-9);
        let target_extent = targets.iter().fold(0.0f64, |acc, &v| acc.max(v.abs()));
        let point_scale = PI * POINT_COMPRESSION / point_extent;
        Self {
            point_scale,
            target_extent: target_extent / point_scale,
        }
    }

    /// Internal modes needed to cover every stretched target plus the
    /// interpolation support, kept odd.
    fn internal_modes(&self, half_width: usize) -> usize {
        let reach = self.target_extent.ceil() as usize + half_width + 1;
        2 * reach + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(
        x: &[f64],
        y: &[f64],
        c: &[Complex64],
        s: &[f64],
        t: &[f64],
    ) -> Vec<Complex64> {
        s.iter()
            .zip(t.iter())
            .map(|(&sk, &tk)| {
                let mut acc = Complex64::default();
                for j in 0..x.len() {
                    acc += c[j] * Complex64::cis(-(sk * x[j] + tk * y[j]));
                }
                acc
            })
            .collect()
    }

    fn synthetic_scene() -> (Vec<f64>, Vec<f64>, Vec<Complex64>, Vec<f64>, Vec<f64>) {
        let n_points = 18;
        let n_targets = 12;
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut c = Vec::new();
        for j in 0..n_points {
            let u = j as f64 + 1.0;
            x.push(((u * 0.317).fract() - 0.5) * 2.0 * PI);
            y.push(((u * 0.551).fract() - 0.5) * 2.0 * PI);
            c.push(Complex64::new((u * 0.83).cos(), (u * 1.21).sin()));
        }
        let mut s = Vec::new();
        let mut t = Vec::new();
        for k in 0..n_targets {
            let u = k as f64 + 1.0;
            s.push(((u * 0.437).fract() - 0.5) * 15.0);
            t.push(((u * 0.673).fract() - 0.5) * 15.0);
        }
        (x, y, c, s, t)
    }

    #[test]
    fn matches_direct_summation() {
        let (x, y, c, s, t) = synthetic_scene();
        let plan = Type3Plan::new(1e-8).unwrap();
        let fast = plan.evaluate(&x, &y, &c, &s, &t).unwrap();
        let exact = direct(&x, &y, &c, &s, &t);
        let scale: f64 = c.iter().map(|v| v.norm()).sum();
        for (f, e) in fast.iter().zip(exact.iter()) {
            assert!(
                (f - e).norm() < 1e-5 * scale,
                "target mismatch: {} vs {}",
                f,
                e
            );
        }
    }

    #[test]
    fn zero_phase_target_returns_total_strength() {
        let (x, y, c, _, _) = synthetic_scene();
        let plan = Type3Plan::new(1e-8).unwrap();
        let fast = plan.evaluate(&x, &y, &c, &[0.0], &[0.0]).unwrap();
        let total: Complex64 = c.iter().sum();
        let scale: f64 = c.iter().map(|v| v.norm()).sum();
        assert!((fast[0] - total).norm() < 1e-6 * scale);
    }

    #[test]
    fn empty_sources_give_zeros() {
        let plan = Type3Plan::new(1e-8).unwrap();
        let out = plan
            .evaluate(&[], &[], &[], &[1.0, 2.0], &[0.0, 0.5])
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn concentrated_points_are_handled() {
        // All sources at the phase centre: every target sees the plain sum.
        let x = vec![0.0; 4];
        let y = vec![0.0; 4];
        let c = vec![Complex64::new(0.5, 0.0); 4];
        let plan = Type3Plan::new(1e-8).unwrap();
        let out = plan.evaluate(&x, &y, &c, &[3.0, -7.5], &[1.0, 2.0]).unwrap();
        for v in out {
            assert!((v - Complex64::new(2.0, 0.0)).norm() < 1e-6);
        }
    }
}
