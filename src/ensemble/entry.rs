//! One ensemble entry: an owned complex plus cached energy and rate.

use serde::Serialize;
use std::fmt::Write;

use crate::complex::Complex;
use crate::energy::{EnergyModel, PrintMode};

/// Read-only reporting view of one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexSnapshot {
    pub id: u64,
    pub strand_names: String,
    pub sequence: String,
    pub structure: String,
    pub energy: f64,
}

#[derive(Debug)]
pub struct EnsembleEntry<C> {
    id: u64,
    complex: C,
    /// Stale until `refresh` is called.
    energy: f64,
    /// Stale until `refresh` is called.
    rate: f64,
}

impl<C: Complex> EnsembleEntry<C> {
    pub(crate) fn new(complex: C, id: u64) -> Self {
        Self {
            id,
            complex,
            energy: 0.0,
            rate: 0.0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn complex(&self) -> &C {
        &self.complex
    }

    /// Mutable access to the complex. Call `refresh` afterwards.
    pub fn complex_mut(&mut self) -> &mut C {
        &mut self.complex
    }

    pub(crate) fn into_complex(self) -> C {
        self.complex
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn initialize(&mut self) {
        self.complex.initialize();
    }

    /// Recompute cached energy (with volume and association terms) and rate.
    pub fn refresh<E: EnergyModel + ?Sized>(&mut self, em: &E) {
        let extra = self.complex.strand_count().saturating_sub(1) as f64;
        self.energy = self.complex.energy() + (em.volume_energy() + em.assoc_energy()) * extra;
        self.rate = self.complex.total_flux();
    }

    /// Energy as displayed under `mode`.
    pub fn display_energy<E: EnergyModel + ?Sized>(&self, mode: PrintMode, em: &E) -> f64 {
        mode.mask().apply(self.energy, self.complex.strand_count(), em)
    }

    /// Four-line text block: names, sequence, structure, energy and flux.
    pub fn render<E: EnergyModel + ?Sized>(&self, mode: PrintMode, em: &E) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Complex {:02}: {}", self.id, self.complex.strand_names());
        let _ = writeln!(out, "          : {}", self.complex.sequence());
        let _ = writeln!(out, "          : {}", self.complex.structure());
        let _ = writeln!(
            out,
            "          : Energy: ({:6.6}) TotalFlux: {:6.2}",
            self.display_energy(mode, em),
            self.rate
        );
        out
    }

    pub fn snapshot(&self) -> ComplexSnapshot {
        ComplexSnapshot {
            id: self.id,
            strand_names: self.complex.strand_names().to_string(),
            sequence: self.complex.sequence().to_string(),
            structure: self.complex.structure().to_string(),
            energy: self.energy,
        }
    }
}
