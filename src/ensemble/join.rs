//! Join resolution: mapping a join move index to two complexes and two bases.

use super::{Ensemble, EntryHandle};
use crate::bases::JOIN_PAIRINGS;
use crate::complex::{Complex, JoinSite};
use crate::energy::EnergyModel;
use crate::logging::log_join;
use crate::verify::InvariantViolation;

/// A fully decomposed join move.
///
/// `outer` precedes `inner` in ensemble order. After resolution the outer
/// entry holds the merged complex and the inner entry is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinChoice {
    pub outer: EntryHandle,
    pub inner: EntryHandle,
    pub site: JoinSite,
}

impl<C: Complex, E: EnergyModel> Ensemble<C, E> {
    /// Decompose `move_index` in `[0, join_flux().moves)` without mutating.
    ///
    /// Walks the same subtract-as-you-go totals as `join_flux`. Per outer
    /// complex the pairings are tried in `JOIN_PAIRINGS` order; the matching
    /// one is split over later complexes, and the remainder inside the
    /// matched later complex gives the (outer, inner) base indices.
    pub fn locate_join(&self, move_index: u64) -> Option<JoinChoice> {
        if self.len <= 1 {
            return None;
        }

        let mut idx = move_index;
        let mut remaining = self.exterior_total();
        for (outer_slot, outer_entry) in self.walk() {
            let ext = outer_entry.complex().exterior_bases();
            remaining -= ext;

            for outer_class in JOIN_PAIRINGS {
                let extent = ext.pairing_moves(&remaining, outer_class);
                if idx >= extent {
                    idx -= extent;
                    continue;
                }

                let inner_class = outer_class.complement();
                let outer_count = ext.count(outer_class) as u64;
                for (inner_slot, inner_entry) in self.walk_from(self.next_of(outer_slot)) {
                    let inner_count = inner_entry.complex().exterior_bases().count(inner_class) as u64;
                    let block = inner_count * outer_count;
                    if idx < block {
                        let site = JoinSite {
                            classes: [outer_class, inner_class],
                            indices: [(idx / inner_count) as u32, (idx % inner_count) as u32],
                        };
                        return Some(JoinChoice {
                            outer: EntryHandle { slot: outer_slot, id: outer_entry.id() },
                            inner: EntryHandle { slot: inner_slot, id: inner_entry.id() },
                            site,
                        });
                    }
                    idx -= block;
                }
                // extent was non-zero yet no later complex held it
                return None;
            }
        }
        None
    }

    /// Perform the join move `move_index`: merge, drop the consumed entry,
    /// refresh the survivor.
    pub fn resolve_join(&mut self, move_index: u64) -> Result<JoinChoice, InvariantViolation> {
        let choice = self.locate_join(move_index).ok_or_else(|| {
            InvariantViolation::new(format!(
                "join index {} outside the {} available join moves",
                move_index,
                self.join_flux().moves
            ))
        })?;

        let consumed = self
            .remove_slot(choice.inner.slot)
            .ok_or_else(|| InvariantViolation::new("inner join entry vacant"))?;
        let survivor = self
            .get_mut(choice.outer)
            .ok_or_else(|| InvariantViolation::new("outer join entry vacant"))?;
        survivor.complex_mut().merge(consumed.into_complex(), &choice.site);
        self.refresh(choice.outer);

        log_join(
            choice.outer.id(),
            choice.inner.id(),
            move_index,
            (choice.site.indices[0], choice.site.indices[1]),
        );
        Ok(choice)
    }
}
