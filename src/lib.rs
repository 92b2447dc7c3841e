//! Reaction-ensemble core of a stochastic strand-kinetics simulator.
//!
//! The ensemble owns a set of complexes, aggregates their intramolecular
//! flux with the flux of every possible join between two complexes, and maps
//! a uniform draw back to one concrete event. Stop conditions decide when a
//! trajectory has reached its target state.

pub mod bases;
pub mod complex;
pub mod config;
pub mod energy;
pub mod ensemble;
pub mod logging;
pub mod scripted;
pub mod sim;
pub mod stop;
pub mod verify;
