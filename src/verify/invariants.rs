use std::fmt;

use crate::complex::Complex;
use crate::energy::EnergyModel;
use crate::ensemble::{Ensemble, FluxSummary};

/// Broken ensemble bookkeeping. Unrecoverable for the current trajectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub msg: String,
}

impl InvariantViolation {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violation: {}", self.msg)
    }
}

impl std::error::Error for InvariantViolation {}

/// Total flux must equal cached intramolecular rates plus join flux.
pub fn assert_flux_consistency<C: Complex, E: EnergyModel>(
    ensemble: &Ensemble<C, E>,
    flux: &FluxSummary,
    tolerance: f64,
) -> Result<(), InvariantViolation> {
    if flux.total.is_nan() || flux.total < 0.0 {
        return Err(InvariantViolation::new("total flux negative or NaN"));
    }
    let intra: f64 = ensemble.iter().map(|e| e.rate()).sum();
    let expected = intra + ensemble.join_flux().rate;
    if (flux.total - expected).abs() > tolerance {
        return Err(InvariantViolation::new(format!(
            "total flux {} differs from entry rates + join flux {}",
            flux.total, expected
        )));
    }
    Ok(())
}

/// Cached rates must match what each complex currently reports.
pub fn assert_caches_fresh<C: Complex, E: EnergyModel>(
    ensemble: &Ensemble<C, E>,
    tolerance: f64,
) -> Result<(), InvariantViolation> {
    for entry in ensemble.iter() {
        if (entry.rate() - entry.complex().total_flux()).abs() > tolerance {
            return Err(InvariantViolation::new(format!(
                "entry {} has a stale rate",
                entry.id()
            )));
        }
    }
    Ok(())
}

/// Entry ids strictly decrease along ensemble order.
pub fn assert_id_order<C: Complex, E: EnergyModel>(
    ensemble: &Ensemble<C, E>,
) -> Result<(), InvariantViolation> {
    let ids: Vec<u64> = ensemble.iter().map(|e| e.id()).collect();
    if ids.windows(2).any(|w| w[0] <= w[1]) {
        return Err(InvariantViolation::new("entry ids out of insertion order"));
    }
    if ids.len() != ensemble.len() {
        return Err(InvariantViolation::new(format!(
            "walked {} entries, count says {}",
            ids.len(),
            ensemble.len()
        )));
    }
    Ok(())
}
