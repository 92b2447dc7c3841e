//! The complex ensemble: ownership, flux aggregation and event selection.
//!
//! Entries live in an arena of slots linked in insertion order, most recently
//! added first. That order decides how a single random draw decomposes across
//! entries, so it is kept stable across removals.

pub mod entry;
mod join;

pub use entry::{ComplexSnapshot, EnsembleEntry};
pub use join::JoinChoice;

use sha2::{Digest, Sha256};

use crate::bases::{ExteriorBases, JOIN_PAIRINGS};
use crate::complex::Complex;
use crate::energy::{EnergyMask, EnergyModel, PrintMode};
use crate::logging::log_entry_added;
use crate::verify::InvariantViolation;

/// Stable reference to an entry. Invalid once the entry is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    slot: usize,
    id: u64,
}

impl EntryHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Join moves available across all complex pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinFlux {
    pub moves: u64,
    pub rate_per_move: f64,
    pub rate: f64,
}

impl JoinFlux {
    fn none(rate_per_move: f64) -> Self {
        Self {
            moves: 0,
            rate_per_move,
            rate: 0.0,
        }
    }

    /// Integer move index for a draw in `[0, rate)`.
    ///
    /// Clamped to the last move so a draw rounding up to `rate` still lands
    /// on a real move.
    pub fn move_index(&self, draw: f64) -> u64 {
        if self.moves == 0 {
            return 0;
        }
        let idx = (draw / self.rate_per_move).floor();
        if idx <= 0.0 {
            0
        } else {
            (idx as u64).min(self.moves - 1)
        }
    }
}

/// Result of a total-flux computation, consumed by `resolve_choice`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxSummary {
    /// Sum of cached intramolecular rates.
    pub intra: f64,
    pub join: JoinFlux,
    pub total: f64,
    /// Entry count at computation time.
    pub entries: usize,
    /// Ensemble revision at computation time.
    pub revision: u64,
}

/// What a resolved draw did to the ensemble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChoiceOutcome {
    /// Two complexes merged; topology changed.
    Joined(JoinChoice),
    /// A move split a complex in two; both entries were refreshed.
    Split { picked: EntryHandle, new_entry: EntryHandle },
    /// An intramolecular move inside one entry.
    Moved { entry: EntryHandle },
}

impl ChoiceOutcome {
    /// The single entry to report upward, if any.
    pub fn reported_entry(&self) -> Option<EntryHandle> {
        match self {
            ChoiceOutcome::Moved { entry } => Some(*entry),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Slot<C> {
    entry: EnsembleEntry<C>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Ordered collection of complexes.
#[derive(Debug)]
pub struct Ensemble<C, E> {
    slots: Vec<Option<Slot<C>>>,
    free: Vec<usize>,
    head: Option<usize>,
    len: usize,
    next_id: u64,
    /// Bumped on every change that can move a flux term.
    revision: u64,
    energy_model: E,
}

/// Slot indices in ensemble order.
struct SlotWalk<'a, C> {
    slots: &'a [Option<Slot<C>>],
    cur: Option<usize>,
}

impl<'a, C> Iterator for SlotWalk<'a, C> {
    type Item = (usize, &'a EnsembleEntry<C>);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cur?;
        let slot = self.slots.get(idx)?.as_ref()?;
        self.cur = slot.next;
        Some((idx, &slot.entry))
    }
}

impl<C: Complex, E: EnergyModel> Ensemble<C, E> {
    pub fn new(energy_model: E) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            len: 0,
            next_id: 0,
            revision: 0,
            energy_model,
        }
    }

    pub fn energy_model(&self) -> &E {
        &self.energy_model
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Take ownership of `complex` and place it at the head. Caches stay stale.
    pub fn add_complex(&mut self, complex: C) -> EntryHandle {
        let id = self.next_id;
        self.next_id += 1;
        let slot = Slot {
            entry: EnsembleEntry::new(complex, id),
            prev: None,
            next: self.head,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        if let Some(old_head) = self.head {
            if let Some(s) = self.slots[old_head].as_mut() {
                s.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        self.len += 1;
        self.revision += 1;

        if let Some(Some(s)) = self.slots.get(idx) {
            log_entry_added(id, s.entry.complex().strand_names(), self.len);
        }
        EntryHandle { slot: idx, id }
    }

    /// Initialize every complex in ensemble order and fill its caches.
    pub fn initialize_all(&mut self) {
        let order: Vec<usize> = self.walk().map(|(idx, _)| idx).collect();
        let em = &self.energy_model;
        for idx in order {
            if let Some(slot) = self.slots[idx].as_mut() {
                slot.entry.initialize();
                slot.entry.refresh(em);
            }
        }
        self.revision += 1;
    }

    pub fn get(&self, handle: EntryHandle) -> Option<&EnsembleEntry<C>> {
        match self.slots.get(handle.slot) {
            Some(Some(slot)) if slot.entry.id() == handle.id => Some(&slot.entry),
            _ => None,
        }
    }

    /// Mutable access to one entry. Outstanding flux summaries go stale.
    pub fn get_mut(&mut self, handle: EntryHandle) -> Option<&mut EnsembleEntry<C>> {
        match self.slots.get_mut(handle.slot) {
            Some(Some(slot)) if slot.entry.id() == handle.id => {
                self.revision += 1;
                Some(&mut slot.entry)
            }
            _ => None,
        }
    }

    /// Refresh the caches of one entry. Returns false for a stale handle.
    pub fn refresh(&mut self, handle: EntryHandle) -> bool {
        let em = &self.energy_model;
        match self.slots.get_mut(handle.slot) {
            Some(Some(slot)) if slot.entry.id() == handle.id => {
                slot.entry.refresh(em);
                self.revision += 1;
                true
            }
            _ => false,
        }
    }

    fn walk(&self) -> SlotWalk<'_, C> {
        SlotWalk {
            slots: &self.slots,
            cur: self.head,
        }
    }

    fn walk_from(&self, start: Option<usize>) -> SlotWalk<'_, C> {
        SlotWalk {
            slots: &self.slots,
            cur: start,
        }
    }

    fn next_of(&self, idx: usize) -> Option<usize> {
        self.slots.get(idx)?.as_ref()?.next
    }

    fn handle_at(&self, idx: usize) -> Option<EntryHandle> {
        let slot = self.slots.get(idx)?.as_ref()?;
        Some(EntryHandle {
            slot: idx,
            id: slot.entry.id(),
        })
    }

    /// Entries in ensemble order, most recently added first.
    pub fn iter(&self) -> impl Iterator<Item = &EnsembleEntry<C>> + '_ {
        self.walk().map(|(_, entry)| entry)
    }

    pub fn handles(&self) -> Vec<EntryHandle> {
        self.walk()
            .map(|(slot, entry)| EntryHandle { slot, id: entry.id() })
            .collect()
    }

    /// Unlink and return an entry. O(1).
    fn remove_slot(&mut self, idx: usize) -> Option<EnsembleEntry<C>> {
        let slot = self.slots.get_mut(idx)?.take()?;
        match slot.prev {
            Some(p) => {
                if let Some(s) = self.slots[p].as_mut() {
                    s.next = slot.next;
                }
            }
            None => self.head = slot.next,
        }
        if let Some(n) = slot.next {
            if let Some(s) = self.slots[n].as_mut() {
                s.prev = slot.prev;
            }
        }
        self.free.push(idx);
        self.len -= 1;
        self.revision += 1;
        Some(slot.entry)
    }

    /// Sum of all exterior tallies.
    fn exterior_total(&self) -> ExteriorBases {
        let mut total = ExteriorBases::default();
        for (_, entry) in self.walk() {
            total += entry.complex().exterior_bases();
        }
        total
    }

    /// Join moves across every pair of complexes, counted once per pair.
    ///
    /// Each complex is removed from the running total before it is paired
    /// against it, so the total only ever holds complexes later in order.
    pub fn join_flux(&self) -> JoinFlux {
        let per_move = self.energy_model.join_rate();
        if self.len <= 1 {
            return JoinFlux::none(per_move);
        }

        let mut remaining = self.exterior_total();
        let mut moves = 0u64;
        for (_, entry) in self.walk() {
            let ext = entry.complex().exterior_bases();
            remaining -= ext;
            for outer in JOIN_PAIRINGS {
                moves += ext.pairing_moves(&remaining, outer);
            }
        }

        if moves == 0 {
            return JoinFlux::none(per_move);
        }
        JoinFlux {
            moves,
            rate_per_move: per_move,
            rate: moves as f64 * per_move,
        }
    }

    /// Cached intramolecular rates plus a freshly computed join flux.
    pub fn total_flux(&self) -> FluxSummary {
        let intra: f64 = self.walk().map(|(_, entry)| entry.rate()).sum();
        let join = self.join_flux();
        FluxSummary {
            intra,
            join,
            total: intra + join.rate,
            entries: self.len,
            revision: self.revision,
        }
    }

    /// Resolve a draw in `[0, flux.total)` into one event and apply it.
    pub fn resolve_choice(
        &mut self,
        draw: f64,
        flux: &FluxSummary,
    ) -> Result<ChoiceOutcome, InvariantViolation> {
        if flux.entries != self.len || flux.revision != self.revision {
            return Err(InvariantViolation::new(format!(
                "flux summary from revision {} ({} entries), ensemble at revision {} ({} entries)",
                flux.revision, flux.entries, self.revision, self.len
            )));
        }
        self.revision += 1;

        if draw < flux.join.rate {
            let choice = self.resolve_join(flux.join.move_index(draw))?;
            return Ok(ChoiceOutcome::Joined(choice));
        }

        let mut residual = draw - flux.join.rate;
        let mut picked = None;
        let mut last_active = None;
        for (idx, entry) in self.walk() {
            if residual < entry.rate() {
                picked = Some(idx);
                break;
            }
            residual -= entry.rate();
            if entry.rate() > 0.0 {
                last_active = Some((idx, entry.rate()));
            }
        }
        // Running subtraction rounds differently from the summed total, so a
        // draw at the very top can overshoot by a few ulps.
        if picked.is_none() {
            let slack = flux.total * f64::EPSILON * (self.len as f64 + 1.0);
            if let Some((idx, rate)) = last_active.filter(|_| residual <= slack) {
                picked = Some(idx);
                residual = rate * (1.0 - f64::EPSILON);
            }
        }
        let idx = picked.ok_or_else(|| {
            InvariantViolation::new(format!(
                "draw {} beyond cumulative rate of {} entries",
                draw, self.len
            ))
        })?;

        let split = {
            let slot = self.slots[idx]
                .as_mut()
                .ok_or_else(|| InvariantViolation::new("picked slot vacant"))?;
            let id = slot.entry.id();
            let mv = slot
                .entry
                .complex_mut()
                .choose_move(&mut residual)
                .ok_or_else(|| {
                    InvariantViolation::new(format!(
                        "entry {} offered no move for residual {}",
                        id, residual
                    ))
                })?;
            slot.entry.complex_mut().apply_move(mv)
        };

        let picked = self
            .handle_at(idx)
            .ok_or_else(|| InvariantViolation::new("picked slot vacant"))?;
        match split {
            Some(new_complex) => {
                let new_entry = self.add_complex(new_complex);
                self.refresh(new_entry);
                self.refresh(picked);
                Ok(ChoiceOutcome::Split { picked, new_entry })
            }
            None => {
                self.refresh(picked);
                Ok(ChoiceOutcome::Moved { entry: picked })
            }
        }
    }

    /// Cached energies in ensemble order with correction terms masked.
    pub fn energies(&self, mask: EnergyMask) -> Vec<f64> {
        self.walk()
            .map(|(_, entry)| {
                mask.apply(
                    entry.energy(),
                    entry.complex().strand_count(),
                    &self.energy_model,
                )
            })
            .collect()
    }

    /// Every entry rendered in ensemble order.
    pub fn render(&self, mode: PrintMode) -> String {
        self.walk()
            .map(|(_, entry)| entry.render(mode, &self.energy_model))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<ComplexSnapshot> {
        self.walk().map(|(_, entry)| entry.snapshot()).collect()
    }

    /// SHA-256 over ids and structures in ensemble order, hex encoded.
    pub fn state_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for (_, entry) in self.walk() {
            hasher.update(entry.id().to_le_bytes());
            hasher.update(entry.complex().structure().as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}
