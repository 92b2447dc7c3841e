//! Trajectory driver: one Gillespie step at a time over the ensemble.
//!
//! Per step: total flux, exponential waiting time, uniform draw resolved by
//! the ensemble, then the stop conditions in order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;

use crate::complex::Complex;
use crate::config::SimConfig;
use crate::energy::EnergyModel;
use crate::ensemble::{ChoiceOutcome, ComplexSnapshot, Ensemble, FluxSummary};
use crate::logging::{log, log_step, log_stop_reached, obj, v_num, v_str, Domain, Level, ProfileScope};
use crate::stop::{first_satisfied, StopCondition};
use crate::verify::InvariantViolation;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EndReason {
    Stop { index: usize, tag: String },
    TimeLimit,
    StepLimit,
    /// Total flux dropped to zero.
    Stalled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryResult {
    pub end: EndReason,
    pub time: f64,
    pub steps: u64,
    pub state_hash: String,
    pub complexes: Vec<ComplexSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub time: f64,
    pub dt: f64,
    pub flux: FluxSummary,
    pub outcome: ChoiceOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepResult {
    Advanced(StepReport),
    Stalled,
    /// The next event would land past `max_sim_time`; time is clamped.
    TimeLimit,
}

pub struct Simulation<C, E> {
    ensemble: Ensemble<C, E>,
    stops: Vec<StopCondition>,
    config: SimConfig,
    rng: StdRng,
    time: f64,
    steps: u64,
}

impl<C: Complex, E: EnergyModel> Simulation<C, E> {
    /// The ensemble is initialized here; callers hand over raw complexes.
    pub fn new(mut ensemble: Ensemble<C, E>, stops: Vec<StopCondition>, config: SimConfig) -> Self {
        ensemble.initialize_all();
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            ensemble,
            stops,
            config,
            rng,
            time: 0.0,
            steps: 0,
        }
    }

    pub fn ensemble(&self) -> &Ensemble<C, E> {
        &self.ensemble
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn step(&mut self) -> Result<StepResult, InvariantViolation> {
        let flux = self.ensemble.total_flux();
        if flux.total <= 0.0 {
            return Ok(StepResult::Stalled);
        }

        // 1 - u lies in (0, 1]
        let u: f64 = self.rng.gen();
        let dt = -(1.0 - u).ln() / flux.total;
        if self.time + dt > self.config.max_sim_time {
            self.time = self.config.max_sim_time;
            return Ok(StepResult::TimeLimit);
        }
        self.time += dt;

        let draw = (self.rng.gen::<f64>() * flux.total).min(flux.total * (1.0 - f64::EPSILON));
        let outcome = self.ensemble.resolve_choice(draw, &flux)?;
        self.steps += 1;
        log_step(self.steps, self.time, flux.total, flux.join.rate, self.ensemble.len());

        Ok(StepResult::Advanced(StepReport {
            time: self.time,
            dt,
            flux,
            outcome,
        }))
    }

    /// Step until a stop condition holds or a limit is reached.
    pub fn run(&mut self) -> Result<TrajectoryResult, InvariantViolation> {
        let _scope = ProfileScope::with_context("trajectory", &[("seed", json!(self.config.seed))]);

        let end = loop {
            if self.steps >= self.config.max_steps {
                break EndReason::StepLimit;
            }
            match self.step()? {
                StepResult::Stalled => break EndReason::Stalled,
                StepResult::TimeLimit => break EndReason::TimeLimit,
                StepResult::Advanced(_) => {}
            }
            if let Some(index) = first_satisfied(&self.ensemble, &self.stops) {
                let tag = self.stops[index].tag.clone();
                log_stop_reached(&tag, self.time, self.steps);
                break EndReason::Stop { index, tag };
            }
        };

        let result = TrajectoryResult {
            end,
            time: self.time,
            steps: self.steps,
            state_hash: self.ensemble.state_hash(),
            complexes: self.ensemble.snapshot(),
        };
        log(
            Level::Info,
            Domain::Sim,
            "trajectory_end",
            obj(&[
                ("end", json!(result.end)),
                ("time", v_num(result.time)),
                ("steps", json!(result.steps)),
                ("state_hash", v_str(&result.state_hash)),
            ]),
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bases::ExteriorBases;
    use crate::energy::EnergyParams;
    use crate::scripted::{ScriptedComplex, ScriptedMove};
    use crate::stop::StopPattern;

    fn config(seed: u64) -> SimConfig {
        SimConfig {
            seed,
            max_sim_time: 1.0e6,
            max_steps: 1_000,
            ..Default::default()
        }
    }

    fn hybridization() -> Ensemble<ScriptedComplex, EnergyParams> {
        let mut ens = Ensemble::new(EnergyParams {
            volume_energy: 0.0,
            assoc_energy: 1.0,
            join_rate: 1.0,
        });
        ens.add_complex(ScriptedComplex::single(1, "top", "AAAA", ExteriorBases::new(4, 0, 0, 0)));
        ens.add_complex(ScriptedComplex::single(2, "bot", "TTTT", ExteriorBases::new(0, 0, 0, 4)));
        ens
    }

    fn bound_stop() -> Vec<StopCondition> {
        vec![StopCondition::new(
            "bound",
            vec![StopPattern::Bound { strands: vec![1, 2] }],
        )]
    }

    #[test]
    fn test_join_reaches_bound_stop() {
        let mut sim = Simulation::new(hybridization(), bound_stop(), config(1));
        let result = sim.run().unwrap();
        assert_eq!(
            result.end,
            EndReason::Stop {
                index: 0,
                tag: "bound".into()
            }
        );
        assert_eq!(result.steps, 1);
        assert_eq!(sim.ensemble().len(), 1);
        assert!(result.time > 0.0);
    }

    #[test]
    fn test_stalls_without_flux() {
        let mut ens = Ensemble::new(EnergyParams::default());
        ens.add_complex(ScriptedComplex::single(1, "a", "AA", ExteriorBases::default()));
        let mut sim = Simulation::new(ens, vec![], config(3));
        let result = sim.run().unwrap();
        assert_eq!(result.end, EndReason::Stalled);
        assert_eq!(result.steps, 0);
    }

    #[test]
    fn test_time_limit_clamps() {
        let mut ens = Ensemble::new(EnergyParams::default());
        ens.add_complex(
            ScriptedComplex::single(1, "a", "AA", ExteriorBases::default())
                .with_move(ScriptedMove::new(1.0e-9)),
        );
        let cfg = SimConfig {
            max_sim_time: 1.0e-6,
            ..config(5)
        };
        let mut sim = Simulation::new(ens, vec![], cfg);
        let result = sim.run().unwrap();
        assert_eq!(result.end, EndReason::TimeLimit);
        assert_eq!(result.time, 1.0e-6);
    }

    #[test]
    fn test_step_limit() {
        let mut ens = Ensemble::new(EnergyParams::default());
        let mut c = ScriptedComplex::single(1, "a", "AA", ExteriorBases::default());
        for _ in 0..10 {
            c = c.with_move(ScriptedMove::new(1.0));
        }
        ens.add_complex(c);
        let cfg = SimConfig {
            max_steps: 4,
            ..config(9)
        };
        let mut sim = Simulation::new(ens, vec![], cfg);
        let result = sim.run().unwrap();
        assert_eq!(result.end, EndReason::StepLimit);
        assert_eq!(result.steps, 4);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let run = |seed| {
            let mut sim = Simulation::new(hybridization(), bound_stop(), config(seed));
            sim.run().unwrap()
        };
        let a = run(11);
        let b = run(11);
        assert_eq!(a, b);
    }
}
