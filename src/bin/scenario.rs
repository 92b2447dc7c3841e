use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde_json::json;

use strandflux::config::{Scenario, SimConfig};
use strandflux::energy::EnergyParams;
use strandflux::ensemble::Ensemble;
use strandflux::logging::{log, obj, set_default_level, v_str, Domain, Level, ProfileScope};
use strandflux::scripted::ScriptedComplex;
use strandflux::sim::Simulation;
use strandflux::verify::invariants::assert_id_order;

fn main() -> Result<()> {
    // stdout carries the rendered ensemble and the result line
    set_default_level(Level::Warn);

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: scenario <scenario.json>"))?;
    let (scenario, stops) = {
        let _scope = ProfileScope::new("scenario_load");
        let scenario = Scenario::load(&path)?;
        let stops = scenario.stop_conditions()?;
        (scenario, stops)
    };
    let cfg = scenario.sim_config(SimConfig::from_env());

    log(
        Level::Info,
        Domain::System,
        "scenario_loaded",
        obj(&[
            ("path", v_str(&path.to_string_lossy())),
            ("complexes", json!(scenario.complexes.len())),
            ("stop_conditions", json!(stops.len())),
            ("seed", json!(cfg.seed)),
        ]),
    );

    let mut ensemble: Ensemble<ScriptedComplex, EnergyParams> = Ensemble::new(scenario.energy);
    for complex in scenario.complexes {
        ensemble.add_complex(complex);
    }

    let print_mode = cfg.print_mode;
    let mut sim = Simulation::new(ensemble, stops, cfg);
    let result = sim.run()?;
    assert_id_order(sim.ensemble())?;

    print!("{}", sim.ensemble().render(print_mode));
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
