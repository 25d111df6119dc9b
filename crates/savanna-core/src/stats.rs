//! Population statistics derived from field snapshots.

use crate::{DeathCause, Species};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Live occupant counts per species
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub counts: BTreeMap<Species, u32>,
}

impl PopulationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every occupied cell of a snapshot
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a Option<Species>>) -> Self {
        let mut stats = Self::new();
        for species in cells.into_iter().flatten() {
            stats.increment(*species);
        }
        stats
    }

    pub fn increment(&mut self, species: Species) {
        *self.counts.entry(species).or_insert(0) += 1;
    }

    pub fn count(&self, species: Species) -> u32 {
        self.counts.get(&species).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Number of species with at least one live member
    pub fn distinct_species(&self) -> usize {
        self.counts.values().filter(|&&count| count > 0).count()
    }

    /// A run stays interesting while at least two species are alive
    pub fn is_viable(&self) -> bool {
        self.distinct_species() > 1
    }

    /// One-line summary such as `lion: 3 zebra: 12`
    pub fn describe(&self) -> String {
        self.counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(species, count)| format!("{}: {}", species, count))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Cumulative deaths per cause
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathTally {
    pub by_cause: BTreeMap<DeathCause, u64>,
}

impl DeathTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, cause: DeathCause) {
        *self.by_cause.entry(cause).or_insert(0) += 1;
    }

    pub fn count(&self, cause: DeathCause) -> u64 {
        self.by_cause.get(&cause).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.by_cause.values().sum()
    }
}
