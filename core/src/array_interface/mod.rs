pub mod layout;
pub mod redundancy;

pub use layout::{Antenna, ArrayLayout, Baseline};
pub use redundancy::{redundant_groups, GroupMember, RedundantGroup};
