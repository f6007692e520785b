// Pairwise ordering-graph construction.
//
// Small triangle sets are compared all-pairs through a local scratch graph
// that tracks parent and child adjacency both ways. The scratch graph
// exists so that relations already implied transitively can be skipped: a
// pair is only handed to the overlap oracle when no marking walk has
// covered it. Committed edges go into the shared arena graph; local records
// die at the next call.
//
// Very large sets never come here pair-by-pair. They get a coarse
// depth-chain instead: contiguous mean-depth groups linked far to near,
// with exact testing reserved for the nearest few triangles, where a wrong
// order is most visible.

use std::collections::TryReserveError;

use crate::cache::Relation;
use crate::sorter::TransSorter;
use crate::types::{TransTriangle, TriIdx};

pub(crate) const LOCAL_NODES: usize = 1000;
pub(crate) const LOCAL_REFS: usize = 10_000;
pub(crate) const LOCAL_NIL: u32 = u32::MAX;
const NO_MARK: u32 = u32::MAX;

/// Triangles taken off the far end of a bulk region for exact ordering.
pub(crate) const TOP_FEW: usize = 10;

/// Depth groups chained in a bulk region.
pub(crate) const NUM_CHAIN_GROUPS: usize = 10;

#[derive(Copy, Clone)]
struct LocalNode {
    tri: TriIdx,
    parents: u32,
    children: u32,
    marked_by: u32,
}

#[derive(Copy, Clone)]
struct LocalRef {
    node: u32,
    next: u32,
}

pub(crate) struct LocalGraph {
    nodes: Vec<LocalNode>,
    refs: Vec<LocalRef>,
    walk: Vec<u32>,
}

impl LocalGraph {
    pub fn new() -> Result<Self, TryReserveError> {
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(LOCAL_NODES)?;
        let mut refs = Vec::new();
        refs.try_reserve_exact(LOCAL_REFS)?;
        Ok(LocalGraph {
            nodes,
            refs,
            walk: Vec::new(),
        })
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
        self.refs.clear();
    }

    pub fn add_node(&mut self, tri: TriIdx) -> bool {
        if self.nodes.len() == LOCAL_NODES {
            return false;
        }
        self.nodes.push(LocalNode {
            tri,
            parents: LOCAL_NIL,
            children: LOCAL_NIL,
            marked_by: NO_MARK,
        });
        true
    }

    pub fn tri_of(&self, node: u32) -> TriIdx {
        self.nodes[node as usize].tri
    }

    pub fn marked_by(&self, node: u32) -> u32 {
        self.nodes[node as usize].marked_by
    }

    pub fn children_head(&self, node: u32) -> u32 {
        self.nodes[node as usize].children
    }

    pub fn ref_at(&self, r: u32) -> (u32, u32) {
        let LocalRef { node, next } = self.refs[r as usize];
        (node, next)
    }

    fn push_ref(&mut self, node: u32, next: u32) -> u32 {
        let idx = self.refs.len() as u32;
        self.refs.push(LocalRef { node, next });
        idx
    }

    /// Record `parent` behind `child` in both adjacency directions. False
    /// when the ref pool is spent; the relation is then simply lost.
    pub fn link(&mut self, parent: u32, child: u32) -> bool {
        if self.refs.len() + 2 > LOCAL_REFS {
            return false;
        }
        let c = self.push_ref(child, self.nodes[parent as usize].children);
        self.nodes[parent as usize].children = c;
        let p = self.push_ref(parent, self.nodes[child as usize].parents);
        self.nodes[child as usize].parents = p;
        true
    }

    pub fn mark_ancestors(&mut self, from: u32, marker: u32) {
        self.mark_walk(from, marker, true);
    }

    pub fn mark_descendants(&mut self, from: u32, marker: u32) {
        self.mark_walk(from, marker, false);
    }

    fn mark_walk(&mut self, from: u32, marker: u32, towards_parents: bool) {
        self.walk.clear();
        self.walk.push(from);
        while let Some(u) = self.walk.pop() {
            let mut r = if towards_parents {
                self.nodes[u as usize].parents
            } else {
                self.nodes[u as usize].children
            };
            while r != LOCAL_NIL {
                let LocalRef { node, next } = self.refs[r as usize];
                if self.nodes[node as usize].marked_by != marker {
                    self.nodes[node as usize].marked_by = marker;
                    self.walk.push(node);
                }
                r = next;
            }
        }
    }
}

impl TransSorter {
    /// Exact ordering for one (small) triangle set: every pair not already
    /// implied transitively is put to the overlap oracle, then the local
    /// child lists are committed into the shared arena graph.
    ///
    /// Pairs walk near-to-far within each new triangle so that a fresh
    /// in-front relation can mark everything behind its partner before
    /// those farther pairs come up.
    pub(crate) fn connect_all_pairs(&mut self, tris: &mut [TransTriangle], set: &[TriIdx]) {
        self.local.reset();
        let mut count = 0usize;
        for &t in set {
            if !self.local.add_node(t) {
                break;
            }
            count += 1;
        }
        if count < set.len() {
            let lost = (set.len() - count) as u32;
            self.stats.tris_unordered += lost;
            log::warn!("pairwise scratch full, {} triangles left unordered", lost);
        }

        for i in 1..count {
            for j in (0..i).rev() {
                if self.local.marked_by(j as u32) == i as u32 {
                    self.stats.pairs_skipped += 1;
                    continue;
                }
                let a = self.local.tri_of(i as u32);
                let b = self.local.tri_of(j as u32);
                match self.relation(tris, a, b) {
                    Relation::Disjoint => {}
                    Relation::FirstInFront => {
                        // i draws after j; everything behind j is implied
                        // behind i as well.
                        self.local.mark_ancestors(j as u32, i as u32);
                        if !self.local.link(j as u32, i as u32) {
                            self.stats.edges_dropped += 1;
                        }
                    }
                    Relation::SecondInFront => {
                        self.local.mark_descendants(j as u32, i as u32);
                        if !self.local.link(i as u32, j as u32) {
                            self.stats.edges_dropped += 1;
                        }
                    }
                }
            }
        }

        for u in 0..count as u32 {
            let parent = self.local.tri_of(u);
            let mut r = self.local.children_head(u);
            while r != LOCAL_NIL {
                let (child_node, next) = self.local.ref_at(r);
                let child = self.local.tri_of(child_node);
                self.add_edge(tris, parent, child);
                r = next;
            }
        }
    }

    /// Coarse ordering for bulk regions. `order` is sorted far to near on
    /// mean depth; all but the nearest [`TOP_FEW`] triangles are cut into
    /// [`NUM_CHAIN_GROUPS`] contiguous groups and each group is chained
    /// behind a single representative of the one before it. The nearest few
    /// then get exact pairwise ordering behind the last group.
    pub(crate) fn connect_bulk(&mut self, tris: &mut [TransTriangle], order: &[TriIdx]) {
        let n = order.len();
        let bulk = n - TOP_FEW;
        let start = |k: usize| k * bulk / NUM_CHAIN_GROUPS;

        for k in 1..NUM_CHAIN_GROUPS {
            let rep = order[start(k - 1)];
            for m in start(k)..start(k + 1) {
                self.add_edge(tris, rep, order[m]);
            }
        }

        let rep = order[start(NUM_CHAIN_GROUPS - 1)];
        let mut top = [0 as TriIdx; TOP_FEW];
        top.copy_from_slice(&order[bulk..]);
        for &t in &top {
            self.add_edge(tris, rep, t);
        }
        self.connect_all_pairs(tris, &top);
    }
}
