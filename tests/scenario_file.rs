//! Integration test: load a scenario from disk and run it to a stop condition.

use std::io::Write;

use strandflux::config::{Scenario, SimConfig};
use strandflux::energy::EnergyParams;
use strandflux::ensemble::Ensemble;
use strandflux::scripted::ScriptedComplex;
use strandflux::sim::{EndReason, Simulation};

const SCENARIO: &str = r#"{
    "energy": {"volume_energy": 0.0, "assoc_energy": 1.96, "join_rate": 1.0e3},
    "complexes": [
        {"strands": [{"id": 1, "name": "top", "sequence": "ACGT"}], "structure": "....",
         "exterior": {"a": 1, "c": 1, "g": 1, "t": 1},
         "moves": [{"rate": 5.0, "structure": "(..)"}]},
        {"strands": [{"id": 2, "name": "bot", "sequence": "ACGT"}], "structure": "....",
         "exterior": {"a": 1, "c": 1, "g": 1, "t": 1}}
    ],
    "stop_conditions": [
        {"tag": "hairpin", "patterns": [
            {"type": "loose", "strands": [1], "structure": "(**)", "tolerance": {"count": 0}}
        ]},
        {"tag": "bound", "patterns": [{"type": "bound", "strands": [1, 2]}]}
    ],
    "seed": 2024,
    "max_sim_time": 100.0
}"#;

fn write_scenario() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(SCENARIO.as_bytes()).expect("write scenario");
    file
}

fn run(scenario: &Scenario) -> strandflux::sim::TrajectoryResult {
    let cfg = scenario.sim_config(SimConfig::default());
    let stops = scenario.stop_conditions().expect("stops resolve");
    let mut ens: Ensemble<ScriptedComplex, EnergyParams> = Ensemble::new(scenario.energy);
    for c in scenario.complexes.clone() {
        ens.add_complex(c);
    }
    let mut sim = Simulation::new(ens, stops, cfg);
    sim.run().expect("trajectory runs")
}

#[test]
fn test_scenario_runs_to_a_stop() {
    let file = write_scenario();
    let scenario = Scenario::load(file.path()).expect("scenario loads");
    assert_eq!(scenario.complexes.len(), 2);

    let result = run(&scenario);
    match &result.end {
        EndReason::Stop { tag, .. } => assert!(tag == "hairpin" || tag == "bound"),
        other => panic!("expected a stop condition, got {:?}", other),
    }
    assert_eq!(result.steps, 1);
    assert!(result.time > 0.0 && result.time <= 100.0);
}

#[test]
fn test_scenario_is_reproducible() {
    let file = write_scenario();
    let scenario = Scenario::load(file.path()).expect("scenario loads");
    let a = run(&scenario);
    let b = run(&scenario);
    assert_eq!(a.end, b.end);
    assert_eq!(a.state_hash, b.state_hash);
    assert_eq!(a.time, b.time);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(Scenario::load(&dir.path().join("absent.json")).is_err());
}
