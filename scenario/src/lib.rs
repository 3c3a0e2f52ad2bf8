//! Synthetic observing scenarios for exercising the visibility core end to
//! end: seeded array layouts and sky catalogues, YAML-described runs, and a
//! runner producing summary reports.

pub mod config;
pub mod generator;
pub mod runner;

pub use config::{ArraySpec, BeamSpec, FrequencySpec, ScenarioConfig, SkySpec, TimeSpec};
pub use generator::{build_layout, build_sky};
pub use runner::{ScenarioReport, ScenarioRunner};
