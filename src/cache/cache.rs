//! The set-associative cache level, optionally coupled to a fully-associative
//! victim cache. This is where the four configurations the hierarchy
//! supports (L1-only, L1+L2, L1+VC, L1+VC+L2) actually get their teeth: L2
//! and the memory fill are the router's job (see [`crate::hierarchy`]), but
//! the VC dance on an L1 miss is entirely local to one `Cache` instance.

use log::{debug, trace};

use super::block::Block;
use super::decode::Geometry;
use super::set::CacheSet;
use crate::cacti;
use crate::error::SimulatorError;

/// Where a lookup found (or will install) its block.
///
/// `VcAbsorbed` means the request was serviced by the L1↔VC swap dance: the
/// block the router might need to write back lives in `Outcome::evicted`,
/// not at any set/index the router could look up directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotRef {
    Slot { set: usize, index: usize },
    VcAbsorbed,
}

/// The result of `lookupForRead`/`lookupForWrite`.
///
/// `install_at` always names the L1 set/index a subsequent `installBlock`
/// should target on a miss, regardless of whether the VC dance ran — the
/// dance never relocates *which* L1 slot is being refilled, only what ends
/// up in it.
#[derive(Clone, Copy, Debug)]
pub struct Outcome {
    pub hit: bool,
    pub slot: SlotRef,
    pub install_at: (usize, usize),
    pub evicted: Option<Block>,
}

/// Per-level event counters plus the cacti-derived cost model.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheStatistics {
    pub reads: u64,
    pub read_misses: u64,
    pub writes: u64,
    pub write_misses: u64,
    pub swap_requests: u64,
    pub swaps: u64,
    pub writebacks: u64,
    pub hit_time_ns: f64,
    pub energy_nj: f64,
    pub area_mm2: f64,
}

impl CacheStatistics {
    pub fn accesses(&self) -> u64 {
        self.reads + self.writes
    }
}

pub struct Cache {
    cache_size: usize,
    assoc: usize,
    block_size: usize,
    n_sets: usize,
    geometry: Geometry,
    sets: Vec<CacheSet>,
    vc: Option<Box<Cache>>,
    stats: CacheStatistics,
}

impl Cache {
    /// Builds a set-associative cache of `cache_size` bytes, `assoc`-way,
    /// with `block_size`-byte blocks, optionally paired with an
    /// `n_vc_blocks`-entry fully-associative victim cache.
    ///
    /// `n_vc_blocks = 0` disables the VC. All of `cache_size`, `assoc`,
    /// `block_size` must be powers of two and `cache_size` must equal
    /// `block_size * assoc * n_sets` with no remainder.
    pub fn new(
        cache_size: usize,
        assoc: usize,
        block_size: usize,
        n_vc_blocks: usize,
    ) -> Result<Self, SimulatorError> {
        require_pow2("block size", block_size)?;
        require_pow2("associativity", assoc)?;
        if cache_size % (block_size * assoc) != 0 {
            return Err(SimulatorError::Config(format!(
                "cache size {cache_size} is not a multiple of block_size*assoc ({block_size}*{assoc})"
            )));
        }
        let n_sets = cache_size / (block_size * assoc);
        require_pow2("number of sets", n_sets)?;

        let vc = if n_vc_blocks > 0 {
            Some(Box::new(Cache::new(
                n_vc_blocks * block_size,
                n_vc_blocks,
                block_size,
                0,
            )?))
        } else {
            None
        };

        let geometry = Geometry::new(block_size, n_sets);
        let sets = (0..n_sets).map(|_| CacheSet::new(assoc)).collect();
        let model = cacti::query(cache_size, block_size, assoc);
        let stats = CacheStatistics {
            hit_time_ns: model.hit_time_ns,
            energy_nj: model.energy_nj,
            area_mm2: model.area_mm2,
            ..Default::default()
        };

        debug!(
            "constructed cache: size={cache_size} assoc={assoc} block_size={block_size} n_sets={n_sets} vc_blocks={n_vc_blocks} hit_time={:.4}ns",
            stats.hit_time_ns
        );

        Ok(Self {
            cache_size,
            assoc,
            block_size,
            n_sets,
            geometry,
            sets,
            vc,
            stats,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn n_sets(&self) -> usize {
        self.n_sets
    }

    pub fn has_vc(&self) -> bool {
        self.vc.is_some()
    }

    pub fn vc(&self) -> Option<&Cache> {
        self.vc.as_deref()
    }

    pub fn stats(&self) -> &CacheStatistics {
        &self.stats
    }

    pub fn tag_of(&self, addr: u64) -> u64 {
        self.geometry.tag_of(addr)
    }

    pub fn set_index(&self, addr: u64) -> usize {
        self.geometry.set_index(addr)
    }

    pub fn block_address(&self, set: usize, tag: u64) -> u64 {
        self.geometry.block_address(set, tag)
    }

    pub fn block(&self, set: usize, index: usize) -> Block {
        self.sets[set].block(index)
    }

    pub fn lookup_for_read(&mut self, addr: u64) -> Outcome {
        self.lookup(addr, false)
    }

    pub fn lookup_for_write(&mut self, addr: u64) -> Outcome {
        self.lookup(addr, true)
    }

    fn lookup(&mut self, addr: u64, is_write: bool) -> Outcome {
        if is_write {
            self.stats.writes += 1;
        } else {
            self.stats.reads += 1;
        }

        let (tag, set_index, _offset) = self.geometry.decode(addr);
        if let Some(i) = self.sets[set_index].find(tag) {
            self.sets[set_index].promote_to_mru(i);
            trace!("hit addr={addr:#x} set={set_index} index={i}");
            return Outcome {
                hit: true,
                slot: SlotRef::Slot { set: set_index, index: i },
                install_at: (set_index, i),
                evicted: None,
            };
        }

        if is_write {
            self.stats.write_misses += 1;
        } else {
            self.stats.read_misses += 1;
        }
        trace!("miss addr={addr:#x} set={set_index}");

        let victim_idx = self.sets[set_index].victim_index();
        let victim = self.sets[set_index].block(victim_idx);

        if self.vc.is_none() || !victim.valid {
            return Outcome {
                hit: false,
                slot: SlotRef::Slot { set: set_index, index: victim_idx },
                install_at: (set_index, victim_idx),
                evicted: None,
            };
        }

        self.vc_dance(addr, set_index, victim_idx, victim)
    }

    /// L1 missed, the victim slot is occupied, and a VC exists. Probe the
    /// VC; a hit swaps the two physical blocks atomically, a miss ejects the
    /// L1 victim into the VC (possibly writing back whatever the VC, in
    /// turn, evicts).
    fn vc_dance(&mut self, addr: u64, l1_set: usize, l1_idx: usize, victim: Block) -> Outcome {
        self.stats.swap_requests += 1;

        let vc_out = self
            .vc
            .as_mut()
            .expect("vc_dance requires a victim cache")
            .lookup_for_read(addr);

        match vc_out.slot {
            SlotRef::Slot { set: vc_set, index: vc_idx } if vc_out.hit => {
                self.swap_with_vc(l1_set, l1_idx, vc_set, vc_idx);
                self.stats.swaps += 1;
                debug!("vc swap hit addr={addr:#x} l1=({l1_set},{l1_idx}) vc=({vc_set},{vc_idx})");
                Outcome {
                    hit: true,
                    slot: SlotRef::Slot { set: l1_set, index: l1_idx },
                    install_at: (l1_set, l1_idx),
                    evicted: None,
                }
            }
            SlotRef::Slot { set: vc_set, index: vc_idx } => {
                let victim_addr = self.geometry.block_address(l1_set, victim.tag);
                let vc = self.vc.as_mut().expect("vc_dance requires a victim cache");
                let vc_tag = vc.geometry.tag_of(victim_addr);
                let retagged = Block {
                    tag: vc_tag,
                    valid: victim.valid,
                    dirty: victim.dirty,
                    lru: 0,
                };
                let evicted_from_vc = vc.sets[vc_set].install(vc_idx, retagged);
                if evicted_from_vc.valid && evicted_from_vc.dirty {
                    self.stats.writebacks += 1;
                }
                self.sets[l1_set].set_block_raw(l1_idx, Block::invalid());
                debug!("vc swap miss addr={addr:#x} l1=({l1_set},{l1_idx}) vc=({vc_set},{vc_idx})");
                Outcome {
                    hit: false,
                    slot: SlotRef::VcAbsorbed,
                    install_at: (l1_set, l1_idx),
                    evicted: Some(evicted_from_vc),
                }
            }
            SlotRef::VcAbsorbed => {
                unreachable!("the victim cache has no victim cache of its own")
            }
        }
    }

    /// Atomic exchange of one L1 block and one VC block, each re-tagged into
    /// the other cache's geometry by recomputing the tag from the physical
    /// block address rather than copying the raw tag field. The VC side
    /// arrives already promoted to MRU by the `lookupForRead` that found it;
    /// the L1 side is restored to its pre-swap rank and then promoted
    /// exactly once, so the net effect is a single MRU touch.
    pub fn swap_with_vc(&mut self, l1_set: usize, l1_idx: usize, vc_set: usize, vc_idx: usize) {
        let l1_block = self.sets[l1_set].block(l1_idx);
        let l1_prior_lru = l1_block.lru;
        let l1_geom = self.geometry;

        let (vc_block, vc_geom) = {
            let vc = self.vc.as_ref().expect("swap_with_vc requires a victim cache");
            (vc.sets[vc_set].block(vc_idx), vc.geometry)
        };

        let l1_addr = l1_geom.block_address(l1_set, l1_block.tag);
        let vc_addr = vc_geom.block_address(vc_set, vc_block.tag);

        let retagged_for_l1 = Block {
            tag: l1_geom.tag_of(vc_addr),
            valid: vc_block.valid,
            dirty: vc_block.dirty,
            lru: 0,
        };
        let retagged_for_vc = Block {
            tag: vc_geom.tag_of(l1_addr),
            valid: l1_block.valid,
            dirty: l1_block.dirty,
            lru: 0,
        };

        self.sets[l1_set].set_block_raw(l1_idx, retagged_for_l1);
        self.vc
            .as_mut()
            .expect("swap_with_vc requires a victim cache")
            .sets[vc_set]
            .set_block_raw(vc_idx, retagged_for_vc);

        self.sets[l1_set].set_lru_raw(l1_idx, l1_prior_lru);
        self.sets[l1_set].promote_to_mru(l1_idx);
    }

    /// Unconditionally overwrites `(set, index)` with `incoming`, promoting
    /// it to MRU and bumping `writebacks` if the prior occupant was dirty.
    pub fn install_block(&mut self, incoming: Block, set: usize, index: usize) -> Block {
        let prior = self.sets[set].install(index, incoming);
        if prior.valid && prior.dirty {
            self.stats.writebacks += 1;
            trace!("writeback from set={set} index={index}");
        }
        prior
    }

    pub fn write_data(&mut self, set: usize, index: usize) {
        self.sets[set].mark_dirty(index);
    }

    pub fn unset_dirty(&mut self, set: usize, index: usize) {
        self.sets[set].clear_dirty(index);
    }

    /// `===== L1/VC/L2 contents =====` body: one line per set, MRU→LRU,
    /// tags in hex, a trailing `D` marking dirty blocks.
    pub fn format_contents(&self) -> String {
        let mut out = String::new();
        for (i, set) in self.sets.iter().enumerate() {
            out.push_str(&format!("set {i}: "));
            for block in set.in_mru_order() {
                out.push_str(&format!("  {:x}", block.tag));
                out.push_str(if block.dirty { " D" } else { "  " });
            }
            out.push('\n');
        }
        out
    }
}

fn require_pow2(name: &str, value: usize) -> Result<(), SimulatorError> {
    if value == 0 || value & (value - 1) != 0 {
        return Err(SimulatorError::Config(format!(
            "{name} must be a power of two, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l1_only(size: usize, assoc: usize, block_size: usize) -> Cache {
        Cache::new(size, assoc, block_size, 0).unwrap()
    }

    #[test]
    fn rejects_non_power_of_two_geometry() {
        assert!(Cache::new(100, 1, 64, 0).is_err());
        assert!(Cache::new(1024, 3, 64, 0).is_err());
        assert!(Cache::new(1024, 1, 0, 0).is_err());
    }

    #[test]
    fn cold_read_is_a_miss_and_repeat_read_is_a_hit() {
        let mut l1 = l1_only(1024, 1, 64);
        let out = l1.lookup_for_read(0x1000);
        assert!(!out.hit);
        l1.install_block(Block::new(l1.tag_of(0x1000)), out.install_at.0, out.install_at.1);
        assert_eq!(l1.stats().reads, 1);
        assert_eq!(l1.stats().read_misses, 1);

        let out2 = l1.lookup_for_read(0x1000);
        assert!(out2.hit);
        assert_eq!(l1.stats().reads, 2);
        assert_eq!(l1.stats().read_misses, 1);
    }

    #[test]
    fn dirty_eviction_without_vc_is_reported_on_install() {
        let mut l1 = l1_only(1024, 1, 64);
        let out = l1.lookup_for_write(0x1000);
        let prior = l1.install_block(Block::new(l1.tag_of(0x1000)), out.install_at.0, out.install_at.1);
        assert!(!prior.valid);
        l1.write_data(out.install_at.0, out.install_at.1);

        // 0x2000 maps to the same set (16 sets, 64B blocks) and evicts the dirty block.
        let out2 = l1.lookup_for_read(0x2000);
        assert!(!out2.hit);
        assert_eq!(out2.slot, SlotRef::Slot { set: out.install_at.0, index: out.install_at.1 });
        let evicted = l1.install_block(Block::new(l1.tag_of(0x2000)), out2.install_at.0, out2.install_at.1);
        assert!(evicted.valid && evicted.dirty);
        assert_eq!(l1.stats().writebacks, 1);
    }

    #[test]
    fn vc_absorbs_dirty_eviction_instead_of_writing_back() {
        let mut l1 = Cache::new(1024, 1, 64, 1).unwrap();
        let out = l1.lookup_for_write(0x1000);
        l1.install_block(Block::new(l1.tag_of(0x1000)), out.install_at.0, out.install_at.1);
        l1.write_data(out.install_at.0, out.install_at.1);

        let out2 = l1.lookup_for_read(0x2000);
        assert!(!out2.hit);
        assert_eq!(out2.slot, SlotRef::VcAbsorbed);
        assert_eq!(l1.stats().writebacks, 0);
        assert_eq!(l1.stats().swap_requests, 1);
        assert_eq!(l1.stats().swaps, 0);
        l1.install_block(Block::new(l1.tag_of(0x2000)), out2.install_at.0, out2.install_at.1);

        // 0x1000 now lives in the VC; a subsequent miss on it swaps back in as a hit.
        let out3 = l1.lookup_for_read(0x1000);
        assert!(out3.hit);
        assert_eq!(l1.stats().swap_requests, 2);
        assert_eq!(l1.stats().swaps, 1);
    }

    #[test]
    fn swap_is_involutive_on_tag_and_dirty() {
        let mut l1 = Cache::new(1024, 1, 64, 1).unwrap();
        let out = l1.lookup_for_write(0x1000);
        l1.install_block(Block::new(l1.tag_of(0x1000)), out.install_at.0, out.install_at.1);
        l1.write_data(out.install_at.0, out.install_at.1);
        l1.lookup_for_read(0x2000); // evicts 0x1000 into the VC
        l1.install_block(Block::new(l1.tag_of(0x2000)), out.install_at.0, out.install_at.1);

        let before_l1 = l1.block(out.install_at.0, out.install_at.1);
        let before_vc = l1.vc().unwrap().block(0, 0);

        l1.swap_with_vc(out.install_at.0, out.install_at.1, 0, 0);
        l1.swap_with_vc(out.install_at.0, out.install_at.1, 0, 0);

        let after_l1 = l1.block(out.install_at.0, out.install_at.1);
        let after_vc = l1.vc().unwrap().block(0, 0);
        assert_eq!(before_l1.tag, after_l1.tag);
        assert_eq!(before_l1.dirty, after_l1.dirty);
        assert_eq!(before_vc.tag, after_vc.tag);
        assert_eq!(before_vc.dirty, after_vc.dirty);
    }
}
