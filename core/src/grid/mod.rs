pub mod detector;

pub use detector::{BaselineLattice, GridDecision, GridDetector};
