//! Energy-model constants consumed by the ensemble.

use serde::{Deserialize, Serialize};

/// Read-only constants the ensemble needs from the energy model.
pub trait EnergyModel {
    fn volume_energy(&self) -> f64;
    fn assoc_energy(&self) -> f64;
    /// Rate contributed by a single join move.
    fn join_rate(&self) -> f64;
}

impl<T: EnergyModel + ?Sized> EnergyModel for &T {
    fn volume_energy(&self) -> f64 {
        (**self).volume_energy()
    }

    fn assoc_energy(&self) -> f64 {
        (**self).assoc_energy()
    }

    fn join_rate(&self) -> f64 {
        (**self).join_rate()
    }
}

/// Plain constant set, loadable from env or a scenario file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyParams {
    pub volume_energy: f64,
    pub assoc_energy: f64,
    pub join_rate: f64,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            volume_energy: 0.0,
            assoc_energy: 1.96,
            join_rate: 1.0e6,
        }
    }
}

impl EnergyParams {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            volume_energy: std::env::var("VOLUME_ENERGY").ok().and_then(|v| v.parse().ok()).unwrap_or(d.volume_energy),
            assoc_energy: std::env::var("ASSOC_ENERGY").ok().and_then(|v| v.parse().ok()).unwrap_or(d.assoc_energy),
            join_rate: std::env::var("JOIN_RATE").ok().and_then(|v| v.parse().ok()).unwrap_or(d.join_rate),
        }
    }
}

impl EnergyModel for EnergyParams {
    fn volume_energy(&self) -> f64 {
        self.volume_energy
    }

    fn assoc_energy(&self) -> f64 {
        self.assoc_energy
    }

    fn join_rate(&self) -> f64 {
        self.join_rate
    }
}

/// Which correction terms stay in reported energies.
///
/// Bit 0x01 keeps the volume term, bit 0x02 keeps the association term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnergyMask {
    pub keep_volume: bool,
    pub keep_assoc: bool,
}

impl EnergyMask {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            keep_volume: bits & 0x01 != 0,
            keep_assoc: bits & 0x02 != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        (self.keep_volume as u8) | ((self.keep_assoc as u8) << 1)
    }

    /// Apply the mask to a cached entry energy.
    pub fn apply<E: EnergyModel + ?Sized>(&self, energy: f64, strand_count: usize, em: &E) -> f64 {
        let extra = strand_count.saturating_sub(1) as f64;
        let mut out = energy;
        if !self.keep_volume {
            out -= em.volume_energy() * extra;
        }
        if !self.keep_assoc {
            out -= em.assoc_energy() * extra;
        }
        out
    }
}

/// Energy line variants when rendering a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintMode {
    /// Cached energy as is.
    #[default]
    Raw,
    /// Volume correction removed.
    NoVolume,
    /// Volume and association corrections removed.
    NoVolumeNoAssoc,
}

impl PrintMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => PrintMode::NoVolume,
            2 => PrintMode::NoVolumeNoAssoc,
            _ => PrintMode::Raw,
        }
    }

    pub fn mask(self) -> EnergyMask {
        match self {
            PrintMode::Raw => EnergyMask::from_bits(0x03),
            PrintMode::NoVolume => EnergyMask::from_bits(0x02),
            PrintMode::NoVolumeNoAssoc => EnergyMask::from_bits(0x00),
        }
    }
}
