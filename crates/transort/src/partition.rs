// Spatial partitioning of mid-size triangle sets.
//
// All-pairs testing is quadratic and was a measured problem on busy tiles,
// so sets beyond the pairwise cutoff are split by an axis-aligned line and
// the halves ordered independently. A triangle straddling the line lands in
// both halves; two triangles separated by the line can never overlap, so
// nothing is lost by not testing across it.

use crate::overlap::TOL;
use crate::sorter::{TransSorter, PAIRWISE_CUTOFF};
use crate::types::{TransTriangle, TriIdx};

/// Hard recursion bound; past it the current set is brute-forced whatever
/// its shape.
pub(crate) const MAX_SPLIT_DEPTH: u32 = 16;

/// A split stops paying for itself when the straddler count exceeds this
/// multiple of the cleanly separated count.
pub(crate) const SHARED_COST_FACTOR: usize = 5;

pub(crate) struct SplitLine {
    pub axis: usize,
    pub coord: f32,
}

/// Pick the split: the axis with the smaller overall spread, cut at the
/// mean vertex coordinate on that axis.
pub(crate) fn choose_split_line(tris: &[TransTriangle], set: &[TriIdx]) -> SplitLine {
    let mut min = [f32::MAX; 2];
    let mut max = [f32::MIN; 2];
    let mut sum = [0.0f32; 2];
    for &t in set {
        for v in &tris[t as usize].verts {
            for k in 0..2 {
                if v[k] < min[k] {
                    min[k] = v[k];
                }
                if v[k] > max[k] {
                    max[k] = v[k];
                }
                sum[k] += v[k];
            }
        }
    }
    let axis = if max[0] - min[0] <= max[1] - min[1] { 0 } else { 1 };
    SplitLine {
        axis,
        coord: sum[axis] / (set.len() * 3) as f32,
    }
}

/// Which side of the line a triangle is on: -1 left, 1 right, 0 straddling
/// (including triangles entirely within the tolerance band).
pub(crate) fn split_side(tri: &TransTriangle, line: &SplitLine) -> i32 {
    let mut below = false;
    let mut above = false;
    for v in &tri.verts {
        let d = v[line.axis] - line.coord;
        if d > TOL {
            above = true;
        } else if d < -TOL {
            below = true;
        }
    }
    match (below, above) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

/// Split a set along the line. Straddlers go to both outputs; the returned
/// count is how many did.
pub(crate) fn partition(
    tris: &[TransTriangle],
    set: &[TriIdx],
    line: &SplitLine,
) -> (Vec<TriIdx>, Vec<TriIdx>, usize) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut shared = 0usize;
    for &t in set {
        match split_side(&tris[t as usize], line) {
            -1 => left.push(t),
            1 => right.push(t),
            _ => {
                shared += 1;
                left.push(t);
                right.push(t);
            }
        }
    }
    (left, right, shared)
}

impl TransSorter {
    /// Recursively partition `set` until the pieces are small enough to
    /// brute-force, falling back to brute force whenever a split stops
    /// being worthwhile.
    pub(crate) fn connect_partitioned(
        &mut self,
        tris: &mut [TransTriangle],
        set: Vec<TriIdx>,
        level: u32,
    ) {
        if set.len() <= PAIRWISE_CUTOFF || level >= MAX_SPLIT_DEPTH {
            self.connect_all_pairs(tris, &set);
            return;
        }

        let line = choose_split_line(tris, &set);
        let (left, right, shared) = partition(tris, &set, &line);

        // One side holding everything makes the other redundant.
        if left.len() == set.len() {
            self.connect_all_pairs(tris, &left);
            return;
        }
        if right.len() == set.len() {
            self.connect_all_pairs(tris, &right);
            return;
        }

        let distinct = set.len() - shared;
        if shared > SHARED_COST_FACTOR * distinct || left.is_empty() || right.is_empty() {
            if !left.is_empty() {
                self.connect_all_pairs(tris, &left);
            }
            if !right.is_empty() {
                self.connect_all_pairs(tris, &right);
            }
            return;
        }

        if left.len() > 1 {
            self.connect_partitioned(tris, left, level + 1);
        }
        if right.len() > 1 {
            self.connect_partitioned(tris, right, level + 1);
        }
    }
}
