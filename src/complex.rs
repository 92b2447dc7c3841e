//! The complex collaborator: what the ensemble needs from one folded complex.

use serde::{Deserialize, Serialize};

use crate::bases::{BaseClass, ExteriorBases};

/// Strand identifier as used by stop conditions.
pub type StrandId = u32;

/// The two exterior bases that react in a join move.
///
/// Index 0 refers to the outer (earlier in ensemble order) complex, index 1 to
/// the inner one. `indices[k]` counts exposed bases of class `classes[k]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinSite {
    pub classes: [BaseClass; 2],
    pub indices: [u32; 2],
}

/// One folded structure of one or more strands.
///
/// Implementations own loop structure, move generation and per-move rates;
/// the ensemble only aggregates and selects among them.
pub trait Complex: Sized {
    type Move;

    /// Build loop structures and display state. Called once after construction.
    fn initialize(&mut self);

    /// Intrinsic energy, without volume or association corrections.
    fn energy(&self) -> f64;

    /// Total intramolecular flux.
    fn total_flux(&self) -> f64;

    fn exterior_bases(&self) -> ExteriorBases;

    fn strand_count(&self) -> usize;

    fn strand_names(&self) -> &str;

    fn sequence(&self) -> &str;

    fn structure(&self) -> &str;

    /// Pick a move for `residual` in `[0, total_flux())`, reducing the residual
    /// to the offset inside the chosen move. `None` when nothing contains it.
    fn choose_move(&mut self, residual: &mut f64) -> Option<Self::Move>;

    /// Apply a move. A dissociation returns the complex that split off.
    fn apply_move(&mut self, mv: Self::Move) -> Option<Self>;

    /// Absorb `other` by pairing the bases named in `site`.
    fn merge(&mut self, other: Self, site: &JoinSite);

    /// True when the strand is part of this complex and paired to another strand.
    fn is_strand_bound(&self, id: StrandId) -> bool;

    /// True when the strand ids of this complex are a circular permutation of `ids`.
    fn matches_strand_ids(&self, ids: &[StrandId]) -> bool;
}

/// Whether `b` is a rotation of `a`.
pub fn is_circular_permutation(a: &[StrandId], b: &[StrandId]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a.is_empty() {
        return true;
    }
    (0..a.len()).any(|shift| a.iter().cycle().skip(shift).zip(b).all(|(x, y)| x == y))
}
