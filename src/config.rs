//! Run configuration: environment defaults plus JSON scenario files.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::energy::{EnergyParams, PrintMode};
use crate::scripted::ScriptedComplex;
use crate::stop::{StopCondition, StopSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed: u64,
    /// Simulated time after which a trajectory ends.
    pub max_sim_time: f64,
    pub max_steps: u64,
    pub print_mode: PrintMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_sim_time: 10.0,
            max_steps: 1_000_000,
            print_mode: PrintMode::Raw,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            seed: std::env::var("SEED").ok().and_then(|v| v.parse().ok()).unwrap_or(d.seed),
            max_sim_time: std::env::var("MAX_SIM_TIME").ok().and_then(|v| v.parse().ok()).unwrap_or(d.max_sim_time),
            max_steps: std::env::var("MAX_STEPS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.max_steps),
            print_mode: std::env::var("PRINT_MODE")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .map(PrintMode::from_code)
                .unwrap_or(d.print_mode),
        }
    }
}

/// Initial ensemble, energy constants and stop conditions for one run.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Falls back to the environment when the file has no energy block.
    #[serde(default = "EnergyParams::from_env")]
    pub energy: EnergyParams,
    pub complexes: Vec<ScriptedComplex>,
    #[serde(default)]
    pub stop_conditions: Vec<StopSpec>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub max_sim_time: Option<f64>,
    #[serde(default)]
    pub max_steps: Option<u64>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow!("cannot read scenario {}: {}", path.display(), e))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(text)?;
        if scenario.complexes.is_empty() {
            return Err(anyhow!("scenario has no complexes"));
        }
        if scenario.energy.join_rate <= 0.0 {
            return Err(anyhow!("join_rate must be positive, got {}", scenario.energy.join_rate));
        }
        Ok(scenario)
    }

    /// Scenario values override `base`.
    pub fn sim_config(&self, base: SimConfig) -> SimConfig {
        SimConfig {
            seed: self.seed.unwrap_or(base.seed),
            max_sim_time: self.max_sim_time.unwrap_or(base.max_sim_time),
            max_steps: self.max_steps.unwrap_or(base.max_steps),
            print_mode: base.print_mode,
        }
    }

    pub fn stop_conditions(&self) -> Result<Vec<StopCondition>> {
        self.stop_conditions.iter().map(StopSpec::resolve).collect()
    }
}
