use crate::board::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub key: u64,
    pub depth: u32,
    pub score: i32,
    pub best: Option<Move>,
    pub bound: Bound,
    pub gen: u32,
}

impl Entry {
    /// Score usable at a node searched to `depth` with window `(alpha, beta)`.
    pub fn cutoff(&self, depth: u32, alpha: i32, beta: i32) -> Option<i32> {
        if self.depth < depth { return None; }
        match self.bound {
            Bound::Exact => Some(self.score),
            Bound::Lower => (self.score >= beta).then_some(self.score),
            Bound::Upper => (self.score <= alpha).then_some(self.score),
        }
    }
}

const WAYS: usize = 4;
pub const DEFAULT_TT_MB: usize = 16;

#[derive(Default, Clone, Copy)]
struct Bucket {
    slots: [Option<Entry>; WAYS],
}

/// Position-keyed search cache, owned by a single session.
///
/// Same-key entries are replaced only by an equal or deeper search. On a full
/// bucket the shallowest, then oldest, entry is evicted.
pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    gen: u32,
}

impl Default for TranspositionTable {
    fn default() -> Self { Self::with_capacity_mb(DEFAULT_TT_MB) }
}

impl TranspositionTable {
    pub fn with_capacity_entries(cap: usize) -> Self {
        let entries = cap.max(WAYS);
        let buckets = (entries + WAYS - 1) / WAYS;
        Self { buckets: vec![Bucket::default(); buckets], gen: 0 }
    }

    pub fn with_capacity_mb(mb: usize) -> Self {
        let per_entry = std::mem::size_of::<Option<Entry>>().max(1);
        let entries = (mb.max(1).saturating_mul(1024 * 1024)) / per_entry;
        Self::with_capacity_entries(entries)
    }

    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|b| *b = Bucket::default());
        self.gen = 0;
    }

    pub fn capacity(&self) -> usize { self.buckets.len() * WAYS }

    fn bucket_index(&self, key: u64) -> usize {
        let mixed = key ^ (key >> 32);
        (mixed as usize) % self.buckets.len().max(1)
    }

    pub fn get(&self, key: u64) -> Option<Entry> {
        let bucket = &self.buckets[self.bucket_index(key)];
        bucket.slots.iter().flatten().find(|e| e.key == key).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.slots.iter().flatten().count()).sum()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn put(&mut self, mut e: Entry) {
        e.gen = self.gen;
        let idx = self.bucket_index(e.key);
        let bucket = &mut self.buckets[idx];
        // Replace same key if at least as deep
        if let Some(slot) = bucket.slots.iter_mut().find(|s| s.map_or(false, |cur| cur.key == e.key)) {
            if slot.map_or(true, |cur| e.depth >= cur.depth) { *slot = Some(e); }
            return;
        }
        if let Some(slot) = bucket.slots.iter_mut().find(|s| s.is_none()) {
            *slot = Some(e);
            return;
        }
        // lexicographic: lowest depth first, then oldest generation
        let victim = bucket
            .slots
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.map_or((0, 0), |cur| (cur.depth, cur.gen)))
            .map_or(0, |(i, _)| i);
        bucket.slots[victim] = Some(e);
    }

    pub fn bump_generation(&mut self) { self.gen = self.gen.wrapping_add(1); }
}
