use num_complex::Complex64;
use std::f64::consts::PI;

/// Exact visibility summation: for each baseline `(u, v)` in wavelengths,
///
/// `V = sum_j I_j * exp(-2 pi i (u * l_j + v * m_j))`
///
/// over the source direction cosines `(l, m)`. Quadratic cost; the
/// reference path for every transform and the cheapest one for tiny
/// problems.
pub fn direct_sum(
    l: &[f64],
    m: &[f64],
    intensity: &[Complex64],
    uv: &[[f64; 2]],
) -> Vec<Complex64> {
    uv.iter()
        .map(|&[u, v]| {
            let mut acc = Complex64::default();
            for j in 0..l.len() {
                let phase = -2.0 * PI * (u * l[j] + v * m[j]);
                acc += intensity[j] * Complex64::cis(phase);
            }
            acc
        })
        .collect()
}
