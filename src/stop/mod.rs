//! Stop-condition evaluation against the current ensemble.
//!
//! Pure predicates: nothing here mutates the ensemble.

pub mod distance;
pub mod spec;

pub use distance::{check_count_structure, check_loose_structure};
pub use spec::{PatternSpec, StopSpec, Tolerance};

use serde_json::json;

use crate::complex::{Complex, StrandId};
use crate::energy::EnergyModel;
use crate::ensemble::Ensemble;
use crate::logging::{log, obj, v_str, Domain, Level};

/// One complex pattern of a stop condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopPattern {
    /// Every listed strand is bound in some complex.
    Bound { strands: Vec<StrandId> },
    /// Exact structure match.
    Structure { strands: Vec<StrandId>, structure: String },
    /// Strand membership alone.
    Disassoc { strands: Vec<StrandId> },
    /// Structure within `tolerance`, `*` positions ignored.
    Loose {
        strands: Vec<StrandId>,
        structure: String,
        tolerance: u32,
    },
    /// Structure within `tolerance`, every position compared.
    Count {
        strands: Vec<StrandId>,
        structure: String,
        tolerance: u32,
    },
}

impl StopPattern {
    pub fn strands(&self) -> &[StrandId] {
        match self {
            StopPattern::Bound { strands }
            | StopPattern::Structure { strands, .. }
            | StopPattern::Disassoc { strands }
            | StopPattern::Loose { strands, .. }
            | StopPattern::Count { strands, .. } => strands,
        }
    }

    /// Whether `complex`, already known to hold the right strands, satisfies
    /// the structural part of this pattern.
    fn matches_structure<C: Complex>(&self, complex: &C) -> bool {
        match self {
            StopPattern::Structure { structure, .. } => complex.structure() == structure,
            StopPattern::Disassoc { .. } => true,
            StopPattern::Loose {
                structure,
                tolerance,
                ..
            } => check_loose_structure(complex.structure(), structure, *tolerance),
            StopPattern::Count {
                structure,
                tolerance,
                ..
            } => check_count_structure(complex.structure(), structure, *tolerance),
            // bound patterns only mean something as the sole pattern
            StopPattern::Bound { .. } => false,
        }
    }
}

/// A named target state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopCondition {
    pub tag: String,
    pub patterns: Vec<StopPattern>,
}

impl StopCondition {
    pub fn new(tag: &str, patterns: Vec<StopPattern>) -> Self {
        Self {
            tag: tag.to_string(),
            patterns,
        }
    }
}

/// Whether the ensemble currently satisfies `condition`.
///
/// The first pattern decides the mode: a bound check, or a per-pattern
/// search for a complex with matching strands and structure. One complex may
/// satisfy several patterns, but there may not be more patterns than
/// complexes.
pub fn check_stop<C: Complex, E: EnergyModel>(ensemble: &Ensemble<C, E>, condition: &StopCondition) -> bool {
    match condition.patterns.first() {
        None => false,
        Some(StopPattern::Bound { .. }) => check_bound(ensemble, condition),
        Some(_) => check_structures(ensemble, &condition.patterns),
    }
}

/// Index of the first satisfied condition.
pub fn first_satisfied<C: Complex, E: EnergyModel>(
    ensemble: &Ensemble<C, E>,
    conditions: &[StopCondition],
) -> Option<usize> {
    conditions.iter().position(|c| check_stop(ensemble, c))
}

fn check_bound<C: Complex, E: EnergyModel>(ensemble: &Ensemble<C, E>, condition: &StopCondition) -> bool {
    if condition.patterns.len() > 1 {
        log(
            Level::Error,
            Domain::Stop,
            "multi_group_bound_unsupported",
            obj(&[
                ("tag", v_str(&condition.tag)),
                ("patterns", json!(condition.patterns.len())),
                ("msg", v_str("only a single bound group can be checked")),
            ]),
        );
        return false;
    }

    condition.patterns[0]
        .strands()
        .iter()
        .all(|&id| ensemble.iter().any(|e| e.complex().is_strand_bound(id)))
}

fn check_structures<C: Complex, E: EnergyModel>(ensemble: &Ensemble<C, E>, patterns: &[StopPattern]) -> bool {
    if patterns.len() > ensemble.len() {
        return false;
    }

    patterns.iter().all(|pattern| {
        ensemble.iter().any(|entry| {
            let complex = entry.complex();
            complex.matches_strand_ids(pattern.strands()) && pattern.matches_structure(complex)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bases::ExteriorBases;
    use crate::energy::EnergyParams;
    use crate::scripted::{ScriptedComplex, Strand};

    fn strand(id: u32, name: &str, seq: &str) -> Strand {
        Strand {
            id,
            name: name.to_string(),
            sequence: seq.to_string(),
        }
    }

    /// A duplex of strands 1+2 and a free strand 3.
    fn ensemble() -> Ensemble<ScriptedComplex, EnergyParams> {
        let mut ens = Ensemble::new(EnergyParams::default());
        ens.add_complex(ScriptedComplex::new(
            vec![strand(1, "top", "ACGT"), strand(2, "bot", "ACGT")],
            "((((+))))",
            ExteriorBases::default(),
        ));
        ens.add_complex(ScriptedComplex::new(
            vec![strand(3, "free", "AAA")],
            "...",
            ExteriorBases::new(3, 0, 0, 0),
        ));
        ens.initialize_all();
        ens
    }

    #[test]
    fn test_bound_single_group() {
        let ens = ensemble();
        let bound = StopCondition::new("bound", vec![StopPattern::Bound { strands: vec![1, 2] }]);
        assert!(check_stop(&ens, &bound));
        let free = StopCondition::new("free", vec![StopPattern::Bound { strands: vec![1, 3] }]);
        assert!(!check_stop(&ens, &free));
    }

    #[test]
    fn test_bound_multi_group_rejected() {
        let ens = ensemble();
        let cond = StopCondition::new(
            "two",
            vec![
                StopPattern::Bound { strands: vec![1] },
                StopPattern::Bound { strands: vec![2] },
            ],
        );
        assert!(!check_stop(&ens, &cond));
    }

    #[test]
    fn test_structure_exact() {
        let ens = ensemble();
        let hit = StopCondition::new(
            "duplex",
            vec![StopPattern::Structure {
                strands: vec![2, 1],
                structure: "((((+))))".into(),
            }],
        );
        assert!(check_stop(&ens, &hit));
        let miss = StopCondition::new(
            "duplex",
            vec![StopPattern::Structure {
                strands: vec![1, 2],
                structure: "(((.+.)))".into(),
            }],
        );
        assert!(!check_stop(&ens, &miss));
    }

    #[test]
    fn test_disassoc_needs_only_strands() {
        let ens = ensemble();
        let cond = StopCondition::new(
            "apart",
            vec![
                StopPattern::Disassoc { strands: vec![3] },
                StopPattern::Disassoc { strands: vec![1, 2] },
            ],
        );
        assert!(check_stop(&ens, &cond));
        let wrong = StopCondition::new("apart", vec![StopPattern::Disassoc { strands: vec![1] }]);
        assert!(!check_stop(&ens, &wrong));
    }

    #[test]
    fn test_more_patterns_than_complexes() {
        let ens = ensemble();
        let same = StopPattern::Disassoc { strands: vec![3] };
        let cond = StopCondition::new("many", vec![same.clone(), same.clone(), same]);
        assert!(!check_stop(&ens, &cond));
        // one complex may satisfy two patterns
        let pair = StopCondition::new(
            "pair",
            vec![
                StopPattern::Disassoc { strands: vec![3] },
                StopPattern::Disassoc { strands: vec![3] },
            ],
        );
        assert!(check_stop(&ens, &pair));
    }

    #[test]
    fn test_loose_and_count_patterns() {
        let ens = ensemble();
        let loose = StopCondition::new(
            "loose",
            vec![StopPattern::Loose {
                strands: vec![1, 2],
                structure: "((**+**))".into(),
                tolerance: 0,
            }],
        );
        assert!(check_stop(&ens, &loose));
        let count = StopCondition::new(
            "count",
            vec![StopPattern::Count {
                strands: vec![1, 2],
                structure: "((**+**))".into(),
                tolerance: 3,
            }],
        );
        assert!(!check_stop(&ens, &count));
    }

    #[test]
    fn test_bound_after_structure_never_matches() {
        let ens = ensemble();
        let cond = StopCondition::new(
            "mixed",
            vec![
                StopPattern::Disassoc { strands: vec![3] },
                StopPattern::Bound { strands: vec![1] },
            ],
        );
        assert!(!check_stop(&ens, &cond));
    }

    #[test]
    fn test_first_satisfied() {
        let ens = ensemble();
        let conds = vec![
            StopCondition::new("none", vec![]),
            StopCondition::new("free", vec![StopPattern::Disassoc { strands: vec![3] }]),
        ];
        assert_eq!(first_satisfied(&ens, &conds), Some(1));
    }
}
