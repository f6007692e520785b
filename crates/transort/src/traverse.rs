// Pass extraction and emission.
//
// A pass is the set of triangles with no remaining locks: nothing still
// undrawn is behind them. Emitting a pass releases the locks it held on the
// triangles in front, which forms the next pass. The pass budget bounds the
// worst case: once it is spent, everything not yet drawn goes out in one
// final unordered pass.

use pvr_params::{ParamBuffer, PASS_MARKER_PLANES, TRANS_PASS_BEGIN_WORD, TRANS_PASS_FLUSH_WORD};

use crate::arena::EDGE_NIL;
use crate::sorter::TransSorter;
use crate::types::{TransTriangle, Visit};

/// Planes held back from the buffer limit so the region's closing objects
/// always fit.
pub const SAFETY_MARGIN_TRANS: u32 = 4;

impl TransSorter {
    /// Emit the sorted region as a sequence of passes into `out`.
    ///
    /// Requires [`sort_region`](Self::sort_region) (and normally
    /// [`fix_for_vignetting`](Self::fix_for_vignetting), which sets the
    /// pass budget) to have run for this region.
    pub fn traverse(&mut self, tris: &mut [TransTriangle], out: &mut ParamBuffer) {
        self.current.clear();
        for i in 0..self.order.len() {
            let t = self.order[i];
            let tri = &mut tris[t as usize];
            tri.visit = Visit::White;
            if tri.num_locks == 0 {
                self.current.push(t);
            }
        }

        let mut passes = 0u32;
        while !self.current.is_empty() {
            if passes >= self.pass_budget {
                self.emit_remaining(tris, out);
                return;
            }
            self.emit_pass(tris, out);
            passes += 1;

            self.next.clear();
            for i in 0..self.current.len() {
                let t = self.current[i];
                let mut e = tris[t as usize].children;
                while e != EDGE_NIL {
                    let edge = self.arena.get(e);
                    let child = &mut tris[edge.child as usize];
                    child.num_locks -= 1;
                    if child.num_locks == 0 {
                        self.next.push(edge.child);
                    }
                    e = edge.next;
                }
            }
            std::mem::swap(&mut self.current, &mut self.next);
        }
    }

    /// Write the current pass: begin marker, one object word per triangle,
    /// flush marker. A pass that would push the plane count past the
    /// buffer's safety margin is not written at all; its triangles are
    /// gone for this frame, which beats a torn parameter stream.
    fn emit_pass(&mut self, tris: &mut [TransTriangle], out: &mut ParamBuffer) {
        let mut planes = PASS_MARKER_PLANES;
        for i in 0..self.current.len() {
            let tri = &mut tris[self.current[i] as usize];
            tri.placed = true;
            planes += tri.obj.plane_count();
        }

        if out.planes_used() + planes > out.plane_limit().saturating_sub(SAFETY_MARGIN_TRANS) {
            self.stats.passes_skipped += 1;
            log::trace!("translucent pass of {} planes dropped, budget spent", planes);
            return;
        }

        out.push_word(TRANS_PASS_BEGIN_WORD);
        for i in 0..self.current.len() {
            out.push_word(tris[self.current[i] as usize].obj.full());
        }
        out.push_word(TRANS_PASS_FLUSH_WORD);
        out.add_planes(planes);
        self.stats.passes_emitted += 1;
        log::trace!(
            "translucent pass {}: {} triangles, {} planes",
            self.stats.passes_emitted,
            self.current.len(),
            planes
        );
    }

    /// Dump every triangle not yet placed into one final pass, order no
    /// longer guaranteed.
    fn emit_remaining(&mut self, tris: &mut [TransTriangle], out: &mut ParamBuffer) {
        self.next.clear();
        for i in 0..self.order.len() {
            let t = self.order[i];
            if !tris[t as usize].placed {
                self.next.push(t);
            }
        }
        if self.next.is_empty() {
            return;
        }
        log::trace!(
            "pass budget reached, {} triangles dumped unordered",
            self.next.len()
        );
        std::mem::swap(&mut self.current, &mut self.next);
        self.emit_pass(tris, out);
    }
}
