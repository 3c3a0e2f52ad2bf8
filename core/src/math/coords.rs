use ndarray::{Array2, ArrayView2};

/// Speed of light in vacuum [m/s], used to scale baselines to wavelengths.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Default array latitude [radians] when none is configured (HERA site).
pub const DEFAULT_ARRAY_LATITUDE: f64 = -0.5361913261514378;

/// Rotation from equatorial Cartesian coordinates to the topocentric
/// east/north/up frame, row-major.
pub type TopocentricRotation = [[f64; 3]; 3];

/// Unit Cartesian equatorial vectors for point sources, shape (3, n_src).
pub fn point_source_crd_eq(ra: &[f64], dec: &[f64]) -> Array2<f64> {
    let n = ra.len().min(dec.len());
    let mut crd = Array2::zeros((3, n));
    for (j, (&r, &d)) in ra.iter().zip(dec.iter()).enumerate() {
        crd[(0, j)] = r.cos() * d.cos();
        crd[(1, j)] = r.sin() * d.cos();
        crd[(2, j)] = d.sin();
    }
    crd
}

/// Rotation matrix taking equatorial Cartesian vectors to east/north/up at
/// the given local sidereal time and latitude. A source at the local zenith
/// (ra = lst, dec = latitude) maps to (0, 0, 1).
pub fn eci_to_enu_matrix(lst: f64, latitude: f64) -> TopocentricRotation {
    let (sin_h, cos_h) = lst.sin_cos();
    let (sin_l, cos_l) = latitude.sin_cos();
    [
        [-sin_h, cos_h, 0.0],
        [-sin_l * cos_h, -sin_l * sin_h, cos_l],
        [cos_l * cos_h, cos_l * sin_h, sin_l],
    ]
}

/// Apply a topocentric rotation to equatorial source vectors (3, n_src),
/// returning east, north and up components.
pub fn rotate_to_topocentric(
    crd_eq: ArrayView2<f64>,
    rotation: &TopocentricRotation,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = crd_eq.ncols();
    let mut east = Vec::with_capacity(n);
    let mut north = Vec::with_capacity(n);
    let mut up = Vec::with_capacity(n);
    for j in 0..n {
        let v = [crd_eq[(0, j)], crd_eq[(1, j)], crd_eq[(2, j)]];
        east.push(rotation[0][0] * v[0] + rotation[0][1] * v[1] + rotation[0][2] * v[2]);
        north.push(rotation[1][0] * v[0] + rotation[1][1] * v[1] + rotation[1][2] * v[2]);
        up.push(rotation[2][0] * v[0] + rotation[2][1] * v[1] + rotation[2][2] * v[2]);
    }
    (east, north, up)
}

/// Azimuth (east of north) and zenith angle of a topocentric direction.
/// The zenith itself gets azimuth 0.
pub fn enu_to_az_za(east: f64, north: f64, up: f64) -> (f64, f64) {
    let norm = (east * east + north * north + up * up).sqrt();
    if norm == 0.0 {
        return (0.0, 0.0);
    }
    let za = (up / norm).clamp(-1.0, 1.0).acos();
    let az = east.atan2(north);
    let az = if az < 0.0 {
        az + 2.0 * std::f64::consts::PI
    } else {
        az
    };
    (az, za)
}
