// Direct-mapped memo for pairwise overlap relations.
//
// Purely a performance cache: a collision overwrites the slot and the pair
// is simply recomputed next time it is asked for. Staleness across regions
// is handled by a generation tag instead of clearing the table; a slot is
// only trusted when its tag matches the current generation, in either pair
// order (pairs are stored canonically, low index first).

pub const HASH_SIZE: usize = 1024;

/// Outcome of comparing two triangles, relative to the argument order of
/// the query.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Relation {
    Disjoint,
    FirstInFront,
    SecondInFront,
}

impl Relation {
    pub fn flipped(self) -> Self {
        match self {
            Relation::Disjoint => Relation::Disjoint,
            Relation::FirstInFront => Relation::SecondInFront,
            Relation::SecondInFront => Relation::FirstInFront,
        }
    }
}

#[derive(Copy, Clone)]
struct Slot {
    lo: u16,
    hi: u16,
    generation: u32,
    relation: Relation,
}

pub struct RelationCache {
    slots: Vec<Slot>,
    generation: u32,
}

impl RelationCache {
    pub fn new() -> Self {
        RelationCache {
            slots: vec![
                Slot {
                    lo: u16::MAX,
                    hi: u16::MAX,
                    generation: 0,
                    relation: Relation::Disjoint,
                };
                HASH_SIZE
            ],
            generation: 0,
        }
    }

    #[inline]
    fn slot_of(lo: u16, hi: u16) -> usize {
        ((lo as usize) ^ ((hi as usize) << 6) ^ ((hi as usize) >> 2)) & (HASH_SIZE - 1)
    }

    /// Start a new region; entries from older regions stop matching.
    pub fn next_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn lookup(&self, lo: u16, hi: u16) -> Option<Relation> {
        let s = &self.slots[Self::slot_of(lo, hi)];
        (s.lo == lo && s.hi == hi && s.generation == self.generation).then_some(s.relation)
    }

    pub fn store(&mut self, lo: u16, hi: u16, relation: Relation) {
        let generation = self.generation;
        self.slots[Self::slot_of(lo, hi)] = Slot {
            lo,
            hi,
            generation,
            relation,
        };
    }
}

impl Default for RelationCache {
    fn default() -> Self {
        Self::new()
    }
}
