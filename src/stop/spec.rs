//! Serialized stop conditions, as read from scenario files.
//!
//! Percent tolerances are converted to absolute base counts here, before the
//! evaluator ever sees them.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::{StopCondition, StopPattern};
use crate::complex::StrandId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Absolute number of mismatching bases.
    Count(u32),
    /// Percentage of the structure length, rounded down.
    Percent(f64),
}

impl Tolerance {
    pub fn to_count(self, structure: &str) -> Result<u32> {
        match self {
            Tolerance::Count(n) => Ok(n),
            Tolerance::Percent(p) if (0.0..=100.0).contains(&p) => {
                Ok((p / 100.0 * structure.len() as f64).floor() as u32)
            }
            Tolerance::Percent(p) => Err(anyhow!("percent tolerance {} outside 0..=100", p)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternSpec {
    Bound {
        strands: Vec<StrandId>,
    },
    Structure {
        strands: Vec<StrandId>,
        structure: String,
    },
    Disassoc {
        strands: Vec<StrandId>,
    },
    Loose {
        strands: Vec<StrandId>,
        structure: String,
        tolerance: Tolerance,
    },
    Count {
        strands: Vec<StrandId>,
        structure: String,
        tolerance: Tolerance,
    },
}

impl PatternSpec {
    pub fn resolve(&self) -> Result<StopPattern> {
        let pattern = match self {
            PatternSpec::Bound { strands } => StopPattern::Bound {
                strands: strands.clone(),
            },
            PatternSpec::Structure { strands, structure } => StopPattern::Structure {
                strands: strands.clone(),
                structure: structure.clone(),
            },
            PatternSpec::Disassoc { strands } => StopPattern::Disassoc {
                strands: strands.clone(),
            },
            PatternSpec::Loose {
                strands,
                structure,
                tolerance,
            } => StopPattern::Loose {
                strands: strands.clone(),
                structure: structure.clone(),
                tolerance: tolerance.to_count(structure)?,
            },
            PatternSpec::Count {
                strands,
                structure,
                tolerance,
            } => StopPattern::Count {
                strands: strands.clone(),
                structure: structure.clone(),
                tolerance: tolerance.to_count(structure)?,
            },
        };
        if pattern.strands().is_empty() {
            return Err(anyhow!("stop pattern lists no strands"));
        }
        Ok(pattern)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSpec {
    pub tag: String,
    pub patterns: Vec<PatternSpec>,
}

impl StopSpec {
    pub fn resolve(&self) -> Result<StopCondition> {
        if self.patterns.is_empty() {
            return Err(anyhow!("stop condition '{}' has no patterns", self.tag));
        }
        let patterns = self
            .patterns
            .iter()
            .map(PatternSpec::resolve)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| anyhow!("stop condition '{}': {}", self.tag, e))?;
        Ok(StopCondition {
            tag: self.tag.clone(),
            patterns,
        })
    }
}
