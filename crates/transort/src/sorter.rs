// Region driver and shared sorting context.
//
// Everything the sort touches between regions lives in one context so that
// regions (and in principle whole frames) can run against independent
// instances. The per-triangle graph fields stay on the triangle records,
// which the caller's projection stage owns.

use std::collections::TryReserveError;

use pvr_params::{ParamBuffer, PASS_MARKER_PLANES};

use crate::arena::{edge_capacity_for, EdgeArena, EDGE_NIL};
use crate::cache::{Relation, RelationCache};
use crate::graph::LocalGraph;
use crate::overlap::{in_front, overlaps};
use crate::types::{RegionTriList, SortStats, TransTriangle, TriIdx, Visit, MAX_NUM_REGION_TRIS};

/// Largest set handed straight to the pairwise graph builder.
pub(crate) const PAIRWISE_CUTOFF: usize = 20;

/// Largest set worth running through the spatial partitioner; beyond this
/// the bulk depth-chain strategy takes over.
pub(crate) const PARTITION_CUTOFF: usize = 256;

/// Default cap on proper passes per region before the remainder is dumped.
pub const DEFAULT_MAX_PASS_COUNT: u32 = 16;

#[derive(Copy, Clone, Debug)]
pub struct SortConfig {
    /// Hard ceiling on proper passes per region. Excessive pass counts cost
    /// real time on the rasterizer, so past this everything left is drawn
    /// in one unordered pass.
    pub max_pass_count: u32,
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig {
            max_pass_count: DEFAULT_MAX_PASS_COUNT,
        }
    }
}

pub struct TransSorter {
    pub(crate) config: SortConfig,
    pub(crate) arena: EdgeArena,
    pub(crate) local: LocalGraph,
    pub(crate) cache: RelationCache,
    pub(crate) order: Vec<TriIdx>,
    pub(crate) current: Vec<TriIdx>,
    pub(crate) next: Vec<TriIdx>,
    pub(crate) pass_budget: u32,
    pub(crate) stats: SortStats,
}

impl TransSorter {
    /// Reserve every scratch buffer up front. Fails (rather than panicking
    /// later) if the workspace cannot be allocated, in which case the
    /// caller should run without translucency sorting.
    pub fn new(config: SortConfig) -> Result<Self, TryReserveError> {
        let arena = EdgeArena::with_capacity(edge_capacity_for(MAX_NUM_REGION_TRIS))?;
        let local = LocalGraph::new()?;
        let mut order = Vec::new();
        order.try_reserve_exact(MAX_NUM_REGION_TRIS)?;
        let mut current = Vec::new();
        current.try_reserve_exact(MAX_NUM_REGION_TRIS)?;
        let mut next = Vec::new();
        next.try_reserve_exact(MAX_NUM_REGION_TRIS)?;
        Ok(TransSorter {
            config,
            arena,
            local,
            cache: RelationCache::new(),
            order,
            current,
            next,
            pass_budget: config.max_pass_count,
            stats: SortStats::default(),
        })
    }

    pub fn stats(&self) -> SortStats {
        self.stats
    }

    /// Number of triangles in the region currently held by the sorter.
    pub fn region_len(&self) -> usize {
        self.order.len()
    }

    /// Build the ordering graph for one region's translucent set.
    ///
    /// Collects the index blocks into the working order (capping at
    /// [`MAX_NUM_REGION_TRIS`]), resets the per-triangle graph state, does
    /// a coarse far-to-near pre-sort on mean depth, and connects the set:
    /// small sets get exact pairwise testing, mid-size sets go through the
    /// spatial partitioner, and large sets get the bulk depth chain with
    /// exact testing reserved for the nearest few.
    pub fn sort_region(&mut self, tris: &mut [TransTriangle], list: &RegionTriList) {
        self.stats = SortStats::default();
        self.cache.next_generation();
        self.arena.reset();
        self.order.clear();
        self.pass_budget = self.config.max_pass_count;

        for idx in list.iter() {
            let Some(tri) = tris.get_mut(idx as usize) else {
                log::debug!("translucent index {} out of range, dropped", idx);
                self.stats.tris_dropped += 1;
                continue;
            };
            if self.order.len() == MAX_NUM_REGION_TRIS {
                self.stats.tris_dropped += 1;
                continue;
            }
            tri.children = EDGE_NIL;
            tri.num_locks = 0;
            tri.visit = Visit::White;
            tri.max_depth = 0;
            tri.placed = false;
            self.order.push(idx);
        }
        if self.stats.tris_dropped > 0 {
            log::warn!(
                "translucent region capped, {} triangles dropped",
                self.stats.tris_dropped
            );
        }

        self.order
            .sort_unstable_by(|&a, &b| tris[a as usize].mean_z.total_cmp(&tris[b as usize].mean_z));

        let n = self.order.len();
        if n < 2 {
            return;
        }

        let order = std::mem::take(&mut self.order);
        if n <= PAIRWISE_CUTOFF {
            self.connect_all_pairs(tris, &order);
        } else if n <= PARTITION_CUTOFF {
            self.connect_partitioned(tris, order.clone(), 0);
        } else {
            self.connect_bulk(tris, &order);
        }
        self.order = order;
    }

    /// Bound the pass count for the sorted region and report the worst-case
    /// plane cost of emitting it, so the region assembly logic can check
    /// its buffer space before anything is written.
    ///
    /// Runs the cycle breaker as a side effect; call once per sorted
    /// region, between [`sort_region`](Self::sort_region) and
    /// [`traverse`](Self::traverse).
    pub fn fix_for_vignetting(&mut self, tris: &mut [TransTriangle]) -> u32 {
        if self.order.is_empty() {
            self.pass_budget = 0;
            return 0;
        }
        let depth = self.break_cycles(tris);
        self.pass_budget = depth.clamp(1, self.config.max_pass_count);
        let tri_planes: u32 = self
            .order
            .iter()
            .map(|&t| tris[t as usize].obj.plane_count())
            .sum();
        tri_planes + (self.pass_budget + 1) * PASS_MARKER_PLANES
    }

    /// Full per-region pipeline: sort, bound the passes, and emit. If the
    /// worst case would not fit, the buffer is left untouched and `false`
    /// comes back.
    pub fn sort_and_emit(
        &mut self,
        tris: &mut [TransTriangle],
        list: &RegionTriList,
        out: &mut ParamBuffer,
    ) -> bool {
        self.sort_region(tris, list);
        let required = self.fix_for_vignetting(tris);
        if required > out.remaining_planes() {
            log::debug!(
                "region needs {} planes but {} remain, skipped",
                required,
                out.remaining_planes()
            );
            return false;
        }
        self.traverse(tris, out);
        true
    }

    /// Resolve the ordering relation for a triangle pair, memoised on the
    /// canonical (low, high) index order so both query directions and exact
    /// depth ties answer consistently.
    pub(crate) fn relation(
        &mut self,
        tris: &[TransTriangle],
        first: TriIdx,
        second: TriIdx,
    ) -> Relation {
        let (lo, hi, flipped) = if first < second {
            (first, second, false)
        } else {
            (second, first, true)
        };
        let rel = if let Some(hit) = self.cache.lookup(lo, hi) {
            self.stats.cache_hits += 1;
            hit
        } else {
            self.stats.overlap_tests += 1;
            let rel = match overlaps(&tris[lo as usize], &tris[hi as usize], &mut self.stats) {
                Some(p) => {
                    if in_front(&tris[lo as usize], &tris[hi as usize], p) {
                        Relation::FirstInFront
                    } else {
                        Relation::SecondInFront
                    }
                }
                None => Relation::Disjoint,
            };
            self.cache.store(lo, hi, rel);
            rel
        };
        if flipped { rel.flipped() } else { rel }
    }

    /// Insert one ordering edge: `parent` is behind and must be drawn
    /// before `child`. Dropped silently when the arena is spent.
    pub(crate) fn add_edge(&mut self, tris: &mut [TransTriangle], parent: TriIdx, child: TriIdx) {
        match self.arena.alloc(child, tris[parent as usize].children) {
            Some(e) => {
                tris[parent as usize].children = e;
                tris[child as usize].num_locks += 1;
            }
            None => self.stats.edges_dropped += 1,
        }
    }
}
