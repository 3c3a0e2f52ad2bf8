use crate::array_interface::Baseline;
use serde::{Deserialize, Serialize};

const MAX_REDUCTION_STEPS: usize = 64;

/// Recovered lattice structure of a baseline set.
///
/// `coords[k]` are the integer lattice coordinates of baseline `k` in the
/// `basis` (metres), so `baseline_k = coords[k][0] * basis[0] +
/// coords[k][1] * basis[1]` within the detection tolerance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineLattice {
    pub basis: [[f64; 2]; 2],
    pub coords: Vec<[i64; 2]>,
    pub half_extent: [i64; 2],
}

impl BaselineLattice {
    /// Number of output modes per axis for a Type-1 evaluation covering
    /// every coordinate, centred on zero.
    pub fn mode_counts(&self) -> [usize; 2] {
        [
            (2 * self.half_extent[0] + 1) as usize,
            (2 * self.half_extent[1] + 1) as usize,
        ]
    }

    pub fn mode_points(&self) -> u64 {
        let [n1, n2] = self.mode_counts();
        (n1 as u64).saturating_mul(n2 as u64)
    }

    /// Fraction of the implied mode grid populated by actual baselines.
    pub fn occupancy(&self) -> f64 {
        if self.coords.is_empty() {
            return 0.0;
        }
        self.coords.len() as f64 / self.mode_points() as f64
    }
}

/// Outcome of lattice detection.
#[derive(Debug, Clone)]
pub enum GridDecision {
    Gridded(BaselineLattice),
    Ungridded,
}

impl GridDecision {
    pub fn is_gridded(&self) -> bool {
        matches!(self, GridDecision::Gridded(_))
    }
}

/// Detects whether a baseline set lies on a regular lattice and recovers
/// the lattice basis.
///
/// The candidate basis is the shortest non-zero baseline together with the
/// shortest baseline not collinear with it, Lagrange-reduced; every
/// baseline is then verified to sit within `tol` metres of an integer
/// combination. Sets that are not generated by that candidate come back
/// `Ungridded`, which routes evaluation to the always-correct non-uniform
/// path.
#[derive(Debug, Clone)]
pub struct GridDetector {
    tol: f64,
}

impl GridDetector {
    pub const DEFAULT_TOL: f64 = 1e-4;

    pub fn new(tol: f64) -> Self {
        Self {
            tol: if tol > 0.0 { tol } else { Self::DEFAULT_TOL },
        }
    }

    pub fn detect_baselines(&self, baselines: &[Baseline]) -> GridDecision {
        let vectors: Vec<[f64; 2]> = baselines.iter().map(|b| b.uv_projection()).collect();
        self.detect(&vectors)
    }

    pub fn detect(&self, vectors: &[[f64; 2]]) -> GridDecision {
        let nonzero: Vec<[f64; 2]> = vectors
            .iter()
            .copied()
            .filter(|v| norm(*v) > self.tol)
            .collect();

        if nonzero.is_empty() {
            // Autos only: a degenerate lattice with every coordinate at the
            // origin.
            return GridDecision::Gridded(BaselineLattice {
                basis: [[1.0, 0.0], [0.0, 1.0]],
                coords: vec![[0, 0]; vectors.len()],
                half_extent: [0, 0],
            });
        }

        let b1 = *nonzero
            .iter()
            .min_by(|a, b| norm(**a).total_cmp(&norm(**b)))
            .expect("nonzero is not empty");

        let off_axis: Vec<[f64; 2]> = nonzero
            .iter()
            .copied()
            .filter(|v| line_distance(*v, b1) > self.tol)
            .collect();

        let basis = if off_axis.is_empty() {
            // Collinear set: complete with a perpendicular vector of equal
            // length so the second coordinate is always zero.
            [b1, [-b1[1], b1[0]]]
        } else {
            let b2 = *off_axis
                .iter()
                .min_by(|a, b| norm(**a).total_cmp(&norm(**b)))
                .expect("off_axis is not empty");
            match reduce_basis(b1, b2) {
                Some(reduced) => reduced,
                None => return GridDecision::Ungridded,
            }
        };

        let det = basis[0][0] * basis[1][1] - basis[0][1] * basis[1][0];
        if det.abs() < self.tol * self.tol {
            return GridDecision::Ungridded;
        }

        let mut coords = Vec::with_capacity(vectors.len());
        let mut half_extent = [0i64, 0i64];
        for &v in vectors {
            if norm(v) <= self.tol {
                coords.push([0, 0]);
                continue;
            }
            let m = (basis[1][1] * v[0] - basis[1][0] * v[1]) / det;
            let n = (-basis[0][1] * v[0] + basis[0][0] * v[1]) / det;
            let mi = m.round();
            let ni = n.round();
            let residual = [
                v[0] - mi * basis[0][0] - ni * basis[1][0],
                v[1] - mi * basis[0][1] - ni * basis[1][1],
            ];
            if norm(residual) > self.tol {
                return GridDecision::Ungridded;
            }
            let mi = mi as i64;
            let ni = ni as i64;
            half_extent[0] = half_extent[0].max(mi.abs());
            half_extent[1] = half_extent[1].max(ni.abs());
            coords.push([mi, ni]);
        }

        GridDecision::Gridded(BaselineLattice {
            basis,
            coords,
            half_extent,
        })
    }
}

impl Default for GridDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOL)
    }
}

fn norm(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

/// Distance of `v` from the line spanned by `axis`.
fn line_distance(v: [f64; 2], axis: [f64; 2]) -> f64 {
    let cross = (axis[0] * v[1] - axis[1] * v[0]).abs();
    cross / norm(axis)
}

/// Lagrange reduction of a 2D basis: the returned pair are the two shortest
/// vectors generating the same lattice as the inputs. Terminates when the
/// reduction step stops shrinking the longer vector (hexagonal lattices hit
/// an exact tie there).
fn reduce_basis(mut b1: [f64; 2], mut b2: [f64; 2]) -> Option<[[f64; 2]; 2]> {
    for _ in 0..MAX_REDUCTION_STEPS {
        if norm(b1) > norm(b2) {
            std::mem::swap(&mut b1, &mut b2);
        }
        let denom = b1[0] * b1[0] + b1[1] * b1[1];
        if denom == 0.0 {
            return None;
        }
        let mu = ((b2[0] * b1[0] + b2[1] * b1[1]) / denom).round();
        if mu == 0.0 {
            return Some([b1, b2]);
        }
        let candidate = [b2[0] - mu * b1[0], b2[1] - mu * b1[1]];
        if norm(candidate) + 1e-12 >= norm(b2) {
            return Some([b1, b2]);
        }
        b2 = candidate;
    }
    None
}
