//! A deterministic complex driven by a move table.
//!
//! Each scripted move fires at most once. Tallies, structure and energy are
//! supplied by the script rather than derived from a loop model, which makes
//! the complex useful for replaying fixed scenarios through the ensemble.

use serde::{Deserialize, Serialize};

use crate::bases::ExteriorBases;
use crate::complex::{is_circular_permutation, Complex, JoinSite, StrandId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strand {
    pub id: StrandId,
    pub name: String,
    #[serde(default)]
    pub sequence: String,
}

/// One scripted intramolecular move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedMove {
    pub rate: f64,
    #[serde(default)]
    pub structure: Option<String>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub exterior: Option<ExteriorBases>,
    /// Complex released by this move. Its strands leave this complex.
    #[serde(default)]
    pub split: Option<Box<ScriptedComplex>>,
}

impl ScriptedMove {
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            structure: None,
            energy: None,
            exterior: None,
            split: None,
        }
    }

    pub fn with_structure(mut self, structure: &str) -> Self {
        self.structure = Some(structure.to_string());
        self
    }

    pub fn with_split(mut self, split: ScriptedComplex) -> Self {
        self.split = Some(Box::new(split));
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ScriptedComplexSpec {
    strands: Vec<Strand>,
    structure: String,
    #[serde(default)]
    energy: f64,
    #[serde(default)]
    exterior: ExteriorBases,
    #[serde(default)]
    moves: Vec<ScriptedMove>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScriptedComplexSpec")]
pub struct ScriptedComplex {
    strands: Vec<Strand>,
    structure: String,
    energy: f64,
    exterior: ExteriorBases,
    moves: Vec<ScriptedMove>,
    #[serde(skip)]
    names: String,
    #[serde(skip)]
    sequence: String,
    #[serde(skip)]
    initialized: bool,
}

impl From<ScriptedComplexSpec> for ScriptedComplex {
    fn from(spec: ScriptedComplexSpec) -> Self {
        let mut complex = Self {
            strands: spec.strands,
            structure: spec.structure,
            energy: spec.energy,
            exterior: spec.exterior,
            moves: spec.moves,
            names: String::new(),
            sequence: String::new(),
            initialized: false,
        };
        complex.rebuild_labels();
        complex
    }
}

impl ScriptedComplex {
    pub fn new(strands: Vec<Strand>, structure: &str, exterior: ExteriorBases) -> Self {
        ScriptedComplexSpec {
            strands,
            structure: structure.to_string(),
            energy: 0.0,
            exterior,
            moves: Vec::new(),
        }
        .into()
    }

    /// Single unpaired strand with the given exterior tally.
    pub fn single(id: StrandId, name: &str, sequence: &str, exterior: ExteriorBases) -> Self {
        let strand = Strand {
            id,
            name: name.to_string(),
            sequence: sequence.to_string(),
        };
        Self::new(vec![strand], &".".repeat(sequence.len()), exterior)
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_move(mut self, mv: ScriptedMove) -> Self {
        self.moves.push(mv);
        self
    }

    pub fn strand_ids(&self) -> Vec<StrandId> {
        self.strands.iter().map(|s| s.id).collect()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn pending_moves(&self) -> usize {
        self.moves.len()
    }

    fn rebuild_labels(&mut self) {
        self.names = self
            .strands
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        self.sequence = self
            .strands
            .iter()
            .map(|s| s.sequence.as_str())
            .collect::<Vec<_>>()
            .join("+");
    }
}

impl Complex for ScriptedComplex {
    type Move = usize;

    fn initialize(&mut self) {
        self.rebuild_labels();
        self.initialized = true;
    }

    fn energy(&self) -> f64 {
        self.energy
    }

    fn total_flux(&self) -> f64 {
        self.moves.iter().map(|m| m.rate).sum()
    }

    fn exterior_bases(&self) -> ExteriorBases {
        self.exterior
    }

    fn strand_count(&self) -> usize {
        self.strands.len()
    }

    fn strand_names(&self) -> &str {
        &self.names
    }

    fn sequence(&self) -> &str {
        &self.sequence
    }

    fn structure(&self) -> &str {
        &self.structure
    }

    fn choose_move(&mut self, residual: &mut f64) -> Option<usize> {
        for (idx, mv) in self.moves.iter().enumerate() {
            if *residual < mv.rate {
                return Some(idx);
            }
            *residual -= mv.rate;
        }
        None
    }

    fn apply_move(&mut self, idx: usize) -> Option<Self> {
        if idx >= self.moves.len() {
            return None;
        }
        let mv = self.moves.remove(idx);
        if let Some(structure) = mv.structure {
            self.structure = structure;
        }
        if let Some(energy) = mv.energy {
            self.energy = energy;
        }
        if let Some(exterior) = mv.exterior {
            self.exterior = exterior;
        }
        let split = mv.split.map(|b| *b)?;
        let leaving = split.strand_ids();
        self.strands.retain(|s| !leaving.contains(&s.id));
        self.rebuild_labels();
        Some(split)
    }

    fn merge(&mut self, other: Self, site: &JoinSite) {
        let mut own = self.exterior;
        let mut theirs = other.exterior;
        let a = own.count_mut(site.classes[0]);
        *a = a.saturating_sub(1);
        let b = theirs.count_mut(site.classes[1]);
        *b = b.saturating_sub(1);
        own += theirs;

        self.exterior = own;
        self.structure = format!("{}+{}", self.structure, other.structure);
        self.energy += other.energy;
        self.strands.extend(other.strands);
        self.moves.extend(other.moves);
        self.rebuild_labels();
    }

    fn is_strand_bound(&self, id: StrandId) -> bool {
        self.strands.len() > 1 && self.strands.iter().any(|s| s.id == id)
    }

    fn matches_strand_ids(&self, ids: &[StrandId]) -> bool {
        is_circular_permutation(&self.strand_ids(), ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bases::BaseClass;

    #[test]
    fn test_choose_move_reduces_residual() {
        let mut c = ScriptedComplex::single(1, "a", "ACGT", ExteriorBases::default())
            .with_move(ScriptedMove::new(1.0))
            .with_move(ScriptedMove::new(2.0));
        let mut r = 2.5;
        assert_eq!(c.choose_move(&mut r), Some(1));
        assert!((r - 1.5).abs() < 1e-12);
        let mut r = 3.0;
        assert_eq!(c.choose_move(&mut r), None);
    }

    #[test]
    fn test_moves_fire_once() {
        let mut c = ScriptedComplex::single(1, "a", "ACGT", ExteriorBases::default())
            .with_move(ScriptedMove::new(1.0).with_structure("(..)"))
            .with_move(ScriptedMove::new(2.0));
        assert!(!c.is_initialized());
        c.initialize();
        assert!(c.is_initialized());

        assert!(c.apply_move(0).is_none());
        assert_eq!(c.pending_moves(), 1);
        assert_eq!(c.structure(), "(..)");
        assert_eq!(c.total_flux(), 2.0);
        assert!(c.apply_move(1).is_none());
        assert_eq!(c.pending_moves(), 1);
    }

    #[test]
    fn test_split_removes_strands() {
        let top = Strand { id: 1, name: "top".into(), sequence: "AAAA".into() };
        let bot = Strand { id: 2, name: "bot".into(), sequence: "TTTT".into() };
        let released = ScriptedComplex::new(vec![bot.clone()], "....", ExteriorBases::new(0, 0, 0, 4));
        let mut duplex = ScriptedComplex::new(vec![top, bot], "((((+))))", ExteriorBases::default())
            .with_move(ScriptedMove::new(1.0).with_structure("....").with_split(released));
        let split = duplex.apply_move(0).expect("split");
        assert_eq!(split.strand_ids(), vec![2]);
        assert_eq!(duplex.strand_ids(), vec![1]);
        assert_eq!(duplex.structure(), "....");
        assert_eq!(duplex.strand_names(), "top");
        assert_eq!(duplex.total_flux(), 0.0);
    }

    #[test]
    fn test_merge_consumes_two_bases() {
        let mut a = ScriptedComplex::single(1, "a", "AAA", ExteriorBases::new(3, 0, 0, 0));
        let b = ScriptedComplex::single(2, "b", "TT", ExteriorBases::new(0, 0, 0, 2));
        let site = JoinSite {
            classes: [BaseClass::A, BaseClass::T],
            indices: [0, 1],
        };
        a.merge(b, &site);
        assert_eq!(a.exterior_bases(), ExteriorBases::new(2, 0, 0, 1));
        assert_eq!(a.structure(), "...+..");
        assert_eq!(a.sequence(), "AAA+TT");
        assert_eq!(a.strand_names(), "a,b");
        assert!(a.is_strand_bound(2));
        assert!(a.matches_strand_ids(&[2, 1]));
    }

    #[test]
    fn test_deserialize_builds_labels() {
        let c: ScriptedComplex = serde_json::from_str(
            r#"{"strands":[{"id":7,"name":"x","sequence":"GC"}],"structure":"..","exterior":{"a":0,"c":1,"g":1,"t":0}}"#,
        )
        .unwrap();
        assert_eq!(c.strand_names(), "x");
        assert_eq!(c.sequence(), "GC");
        assert_eq!(c.exterior_bases().g, 1);
    }
}
