//! The per-set array of blocks plus true-LRU bookkeeping.
//!
//! Every operation here is set-local: a `CacheSet` never sees an address,
//! only tags and slot indices. Geometry and cross-level concerns (swap,
//! writeback propagation) live one layer up in [`super::cache::Cache`].

use super::block::Block;

#[derive(Clone, Debug)]
pub struct CacheSet {
    blocks: Vec<Block>,
}

impl CacheSet {
    /// A fresh set of `assoc` invalid blocks. LRU ranks start as a dense
    /// permutation so the invariant holds even before anything is valid.
    pub fn new(assoc: usize) -> Self {
        let mut blocks = vec![Block::invalid(); assoc];
        for (i, b) in blocks.iter_mut().enumerate() {
            b.lru = i as u32;
        }
        Self { blocks }
    }

    pub fn assoc(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, idx: usize) -> Block {
        self.blocks[idx]
    }

    /// Index of the valid block carrying `tag`, if any.
    pub fn find(&self, tag: u64) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| b.valid && b.tag == tag)
    }

    /// The slot that will receive an incoming block on a miss: the first
    /// invalid slot by index, else the block with the largest `lru`.
    pub fn victim_index(&self) -> usize {
        if let Some(i) = self.blocks.iter().position(|b| !b.valid) {
            return i;
        }
        self.blocks
            .iter()
            .enumerate()
            .max_by_key(|(_, b)| b.lru)
            .map(|(i, _)| i)
            .expect("cache set has zero associativity")
    }

    /// Promote `idx` to MRU: every other valid block with a *younger* rank
    /// than `idx` ages by one, then `idx` itself becomes rank 0. Keeps the
    /// ranks a dense `0..count(valid)-1` permutation.
    pub fn promote_to_mru(&mut self, idx: usize) {
        let current = self.blocks[idx].lru;
        for (i, b) in self.blocks.iter_mut().enumerate() {
            if i != idx && b.lru < current {
                b.lru += 1;
            }
        }
        self.blocks[idx].lru = 0;
    }

    /// Overwrite `idx` with `incoming`, promoting it to MRU. The promotion
    /// must run against the *prior* occupant's rank (whatever it was) before
    /// the new tag/valid/dirty fields land, otherwise the stale "already at
    /// rank 0" state would read as "nothing to age" and corrupt the
    /// permutation. `incoming.lru` is ignored — an installed block always
    /// becomes MRU.
    pub fn install(&mut self, idx: usize, incoming: Block) -> Block {
        let prior = self.blocks[idx];
        self.promote_to_mru(idx);
        self.blocks[idx].tag = incoming.tag;
        self.blocks[idx].valid = incoming.valid;
        self.blocks[idx].dirty = incoming.dirty;
        prior
    }

    pub fn mark_dirty(&mut self, idx: usize) {
        self.blocks[idx].dirty = true;
    }

    pub fn clear_dirty(&mut self, idx: usize) {
        self.blocks[idx].dirty = false;
    }

    /// Raw slot replacement used by `swapWithVC`: no LRU promotion, no
    /// dirty/valid normalization — the caller owns those semantics.
    pub fn set_block_raw(&mut self, idx: usize, block: Block) {
        self.blocks[idx] = block;
    }

    pub fn set_lru_raw(&mut self, idx: usize, lru: u32) {
        self.blocks[idx].lru = lru;
    }

    /// Valid blocks in MRU→LRU order, for the contents report.
    pub fn in_mru_order(&self) -> Vec<Block> {
        let mut valid: Vec<Block> = self.blocks.iter().copied().filter(|b| b.valid).collect();
        valid.sort_by_key(|b| b.lru);
        valid
    }

    #[cfg(test)]
    pub fn lru_ranks_are_dense_permutation(&self) -> bool {
        let mut ranks: Vec<u32> = self
            .blocks
            .iter()
            .filter(|b| b.valid)
            .map(|b| b.lru)
            .collect();
        ranks.sort_unstable();
        ranks.iter().enumerate().all(|(i, &r)| i as u32 == r)
    }

    #[cfg(test)]
    pub fn no_duplicate_tags(&self) -> bool {
        let mut tags: Vec<u64> = self.blocks.iter().filter(|b| b.valid).map(|b| b.tag).collect();
        tags.sort_unstable();
        tags.windows(2).all(|w| w[0] != w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_set_has_dense_lru_and_no_valid_blocks() {
        let set = CacheSet::new(4);
        assert_eq!(set.in_mru_order().len(), 0);
        assert!(set.lru_ranks_are_dense_permutation());
    }

    #[test]
    fn victim_prefers_first_invalid_slot() {
        let mut set = CacheSet::new(2);
        set.install(1, Block::new(7));
        assert_eq!(set.victim_index(), 0);
    }

    #[test]
    fn victim_is_lru_when_full() {
        let mut set = CacheSet::new(2);
        set.install(0, Block::new(1));
        set.install(1, Block::new(2));
        // block 0 is now LRU (rank 1), block 1 is MRU (rank 0)
        assert_eq!(set.victim_index(), 0);
        set.promote_to_mru(0);
        assert_eq!(set.victim_index(), 1);
    }

    #[test]
    fn install_keeps_lru_dense_and_no_duplicate_tags() {
        let mut set = CacheSet::new(3);
        for t in 0..5u64 {
            let victim = set.victim_index();
            set.install(victim, Block::new(t));
            assert!(set.lru_ranks_are_dense_permutation());
            assert!(set.no_duplicate_tags());
        }
    }

    #[test]
    fn find_only_matches_valid_blocks() {
        let mut set = CacheSet::new(2);
        set.install(0, Block::new(9));
        assert_eq!(set.find(9), Some(0));
        assert_eq!(set.find(100), None);
    }
}
