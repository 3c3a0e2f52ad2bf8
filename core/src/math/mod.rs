pub mod coords;
pub mod fft;
pub mod stats;

pub use coords::{
    eci_to_enu_matrix, enu_to_az_za, point_source_crd_eq, rotate_to_topocentric,
    TopocentricRotation, DEFAULT_ARRAY_LATITUDE, SPEED_OF_LIGHT,
};
pub use fft::FftHelper;
pub use stats::StatsHelper;
