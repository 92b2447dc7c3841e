pub mod invariants;

pub use invariants::InvariantViolation;
