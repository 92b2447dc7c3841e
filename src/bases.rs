//! Exterior base classes and per-complex tallies.

use serde::{Deserialize, Serialize};
use std::ops::{AddAssign, SubAssign};

/// Base class of an exposed exterior base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseClass {
    A,
    C,
    G,
    T,
}

impl BaseClass {
    /// Numeric tag used by complex implementations (A=1, C=2, G=3, T=4).
    pub fn tag(self) -> u8 {
        match self {
            BaseClass::A => 1,
            BaseClass::C => 2,
            BaseClass::G => 3,
            BaseClass::T => 4,
        }
    }

    pub fn complement(self) -> Self {
        match self {
            BaseClass::A => BaseClass::T,
            BaseClass::T => BaseClass::A,
            BaseClass::G => BaseClass::C,
            BaseClass::C => BaseClass::G,
        }
    }
}

/// Outer-complex base class for each join pairing, in resolution priority order.
///
/// The running total of not-yet-visited complexes contributes the complement,
/// so the first entry reads "remaining A x this T".
pub const JOIN_PAIRINGS: [BaseClass; 4] = [BaseClass::T, BaseClass::A, BaseClass::C, BaseClass::G];

/// Unpaired exterior bases of one complex, by class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExteriorBases {
    pub a: u32,
    pub c: u32,
    pub g: u32,
    pub t: u32,
}

impl ExteriorBases {
    pub fn new(a: u32, c: u32, g: u32, t: u32) -> Self {
        Self { a, c, g, t }
    }

    pub fn count(&self, class: BaseClass) -> u32 {
        match class {
            BaseClass::A => self.a,
            BaseClass::C => self.c,
            BaseClass::G => self.g,
            BaseClass::T => self.t,
        }
    }

    pub fn count_mut(&mut self, class: BaseClass) -> &mut u32 {
        match class {
            BaseClass::A => &mut self.a,
            BaseClass::C => &mut self.c,
            BaseClass::G => &mut self.g,
            BaseClass::T => &mut self.t,
        }
    }

    pub fn total(&self) -> u64 {
        self.a as u64 + self.c as u64 + self.g as u64 + self.t as u64
    }

    /// Ordered join moves between `self` (outer) and `remaining` for one pairing.
    pub fn pairing_moves(&self, remaining: &ExteriorBases, outer: BaseClass) -> u64 {
        remaining.count(outer.complement()) as u64 * self.count(outer) as u64
    }
}

impl AddAssign for ExteriorBases {
    fn add_assign(&mut self, rhs: Self) {
        self.a += rhs.a;
        self.c += rhs.c;
        self.g += rhs.g;
        self.t += rhs.t;
    }
}

impl SubAssign for ExteriorBases {
    fn sub_assign(&mut self, rhs: Self) {
        self.a -= rhs.a;
        self.c -= rhs.c;
        self.g -= rhs.g;
        self.t -= rhs.t;
    }
}
