use crate::prelude::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single element of the interferometric array, positioned in local
/// east/north/up metres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Antenna {
    pub id: usize,
    pub position: [f64; 3],
}

impl Antenna {
    pub fn new(id: usize, position: [f64; 3]) -> Self {
        Self { id, position }
    }
}

/// A baseline between two antennas. The vector is `position(ant2) -
/// position(ant1)` in metres; `ant1 == ant2` is an auto-correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub ant1: usize,
    pub ant2: usize,
    pub vector: [f64; 3],
}

impl Baseline {
    /// East/north projection entering the uv phase.
    pub fn uv_projection(&self) -> [f64; 2] {
        [self.vector[0], self.vector[1]]
    }
}

/// Ordered antenna collection with id lookup.
#[derive(Debug, Clone)]
pub struct ArrayLayout {
    antennas: Vec<Antenna>,
    index: HashMap<usize, usize>,
}

impl ArrayLayout {
    pub fn new(antennas: Vec<Antenna>) -> SimResult<Self> {
        let mut index = HashMap::with_capacity(antennas.len());
        for (slot, antenna) in antennas.iter().enumerate() {
            if index.insert(antenna.id, slot).is_some() {
                return Err(SimError::InvalidInput(format!(
                    "duplicate antenna id {}",
                    antenna.id
                )));
            }
        }
        Ok(Self { antennas, index })
    }

    pub fn len(&self) -> usize {
        self.antennas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.antennas.is_empty()
    }

    pub fn antennas(&self) -> &[Antenna] {
        &self.antennas
    }

    /// Slot of the antenna with the given id in the layout order.
    pub fn slot_of(&self, id: usize) -> SimResult<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| SimError::InvalidInput(format!("unknown antenna id {}", id)))
    }

    pub fn position(&self, id: usize) -> SimResult<[f64; 3]> {
        Ok(self.antennas[self.slot_of(id)?].position)
    }

    pub fn baseline_vector(&self, ant1: usize, ant2: usize) -> SimResult<[f64; 3]> {
        let a = self.position(ant1)?;
        let b = self.position(ant2)?;
        Ok([b[0] - a[0], b[1] - a[1], b[2] - a[2]])
    }

    /// Every antenna pair in deterministic layout order, optionally with
    /// auto-correlations.
    pub fn baselines(&self, include_autos: bool) -> Vec<Baseline> {
        let mut out = Vec::new();
        for (i, a) in self.antennas.iter().enumerate() {
            let start = if include_autos { i } else { i + 1 };
            for b in &self.antennas[start..] {
                out.push(Baseline {
                    ant1: a.id,
                    ant2: b.id,
                    vector: [
                        b.position[0] - a.position[0],
                        b.position[1] - a.position[1],
                        b.position[2] - a.position[2],
                    ],
                });
            }
        }
        out
    }

    /// Resolve explicit `(ant1, ant2)` pairs into baselines.
    pub fn select_baselines(&self, pairs: &[(usize, usize)]) -> SimResult<Vec<Baseline>> {
        pairs
            .iter()
            .map(|&(ant1, ant2)| {
                let vector = self.baseline_vector(ant1, ant2)?;
                Ok(Baseline { ant1, ant2, vector })
            })
            .collect()
    }
}
