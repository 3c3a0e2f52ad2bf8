use crate::array_interface::layout::{ArrayLayout, Baseline};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One antenna pair inside a redundant group. `conjugate` marks members
/// whose baseline vector is the negation of the group representative, so
/// their visibility is the conjugate of the simulated one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub ant1: usize,
    pub ant2: usize,
    pub conjugate: bool,
}

/// A set of physically identical baselines sharing one simulated
/// representative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedundantGroup {
    pub representative: Baseline,
    pub members: Vec<GroupMember>,
}

/// Group the layout's baselines by vector, within `tol` metres, after
/// canonical orientation. Groups appear in first-seen pair order; autos (if
/// requested) collapse into a single zero-vector group.
pub fn redundant_groups(layout: &ArrayLayout, include_autos: bool, tol: f64) -> Vec<RedundantGroup> {
    let tol = if tol > 0.0 { tol } else { 1.0 };
    let mut groups: Vec<RedundantGroup> = Vec::new();
    let mut by_key: HashMap<[i64; 3], usize> = HashMap::new();

    for baseline in layout.baselines(include_autos) {
        let (oriented, conjugate) = orient(baseline.vector, tol);
        let key = [
            (oriented[0] / tol).round() as i64,
            (oriented[1] / tol).round() as i64,
            (oriented[2] / tol).round() as i64,
        ];
        let member = GroupMember {
            ant1: baseline.ant1,
            ant2: baseline.ant2,
            conjugate,
        };
        match by_key.get(&key) {
            Some(&slot) => groups[slot].members.push(member),
            None => {
                by_key.insert(key, groups.len());
                groups.push(RedundantGroup {
                    representative: Baseline {
                        ant1: baseline.ant1,
                        ant2: baseline.ant2,
                        vector: oriented,
                    },
                    members: vec![member],
                });
            }
        }
    }

    groups
}

/// Canonical orientation: the first component (x, then y, then z) larger
/// than `tol` in magnitude must be positive. Returns the oriented vector and
/// whether the input was flipped.
fn orient(vector: [f64; 3], tol: f64) -> ([f64; 3], bool) {
    for component in vector {
        if component.abs() > tol {
            if component < 0.0 {
                return ([-vector[0], -vector[1], -vector[2]], true);
            }
            return (vector, false);
        }
    }
    (vector, false)
}
