use crate::config::{ArraySpec, SkySpec};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::FRAC_PI_2;
use viscore::array_interface::{Antenna, ArrayLayout};
use viscore::ndarray::Array2;
use viscore::processing::SkyModel;

/// Build an antenna layout from its recipe.
pub fn build_layout(spec: &ArraySpec) -> anyhow::Result<ArrayLayout> {
    let antennas = match *spec {
        ArraySpec::Grid {
            rows,
            cols,
            spacing_m,
        } => {
            let mut antennas = Vec::with_capacity(rows * cols);
            for r in 0..rows {
                for c in 0..cols {
                    antennas.push(Antenna::new(
                        r * cols + c,
                        [c as f64 * spacing_m, r as f64 * spacing_m, 0.0],
                    ));
                }
            }
            antennas
        }
        ArraySpec::Randomized {
            n_ants,
            aperture_m,
            seed,
        } => {
            let mut rng = StdRng::seed_from_u64(seed);
            let half = aperture_m / 2.0;
            (0..n_ants)
                .map(|id| {
                    Antenna::new(
                        id,
                        [rng.gen_range(-half..half), rng.gen_range(-half..half), 0.0],
                    )
                })
                .collect()
        }
    };
    Ok(ArrayLayout::new(antennas)?)
}

/// Build a seeded catalogue scattered around the field centre, with flat
/// spectra scaled by a per-source draw.
pub fn build_sky(
    spec: &SkySpec,
    latitude: f64,
    centre_lst: f64,
    n_channels: usize,
) -> anyhow::Result<SkyModel> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let mut ra = Vec::with_capacity(spec.n_sources);
    let mut dec = Vec::with_capacity(spec.n_sources);
    let mut flux = Array2::zeros((spec.n_sources, n_channels));

    let radius = spec.field_radius_rad.abs().max(1e-6);
    for j in 0..spec.n_sources {
        ra.push(centre_lst + rng.gen_range(-radius..radius));
        let d: f64 = latitude + rng.gen_range(-radius..radius);
        dec.push(d.clamp(-FRAC_PI_2, FRAC_PI_2));
        let base = spec.flux_jy * rng.gen_range(0.5..1.5);
        for fi in 0..n_channels {
            flux[(j, fi)] = base;
        }
    }

    Ok(SkyModel::new(flux, ra, dec)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_layout_has_row_times_col_antennas() {
        let layout = build_layout(&ArraySpec::Grid {
            rows: 3,
            cols: 4,
            spacing_m: 10.0,
        })
        .unwrap();
        assert_eq!(layout.len(), 12);
        assert_eq!(layout.position(5).unwrap(), [10.0, 10.0, 0.0]);
    }

    #[test]
    fn randomized_layout_is_reproducible() {
        let spec = ArraySpec::Randomized {
            n_ants: 6,
            aperture_m: 100.0,
            seed: 42,
        };
        let a = build_layout(&spec).unwrap();
        let b = build_layout(&spec).unwrap();
        for (x, y) in a.antennas().iter().zip(b.antennas().iter()) {
            assert_eq!(x.position, y.position);
        }
    }

    #[test]
    fn sky_respects_catalogue_size_and_bounds() {
        let spec = SkySpec {
            n_sources: 20,
            flux_jy: 2.0,
            field_radius_rad: 0.2,
            seed: 3,
        };
        let sky = build_sky(&spec, -0.5, 1.0, 3).unwrap();
        assert_eq!(sky.n_sources(), 20);
        assert_eq!(sky.flux.dim(), (20, 3));
        for &d in &sky.dec {
            assert!(d.abs() <= FRAC_PI_2);
        }
        for row in sky.flux.rows() {
            assert!(row.iter().all(|&f| f > 0.0));
        }
    }
}
