// Cycle breaking over the region's ordering graph.
//
// Mutual occlusion between translucent triangles is geometrically real, so
// the graph can contain cycles that no pass order satisfies. Rather than
// deleting an edge, a back edge found during the depth-first walk retires
// itself early: the child's lock count drops by one now, and when the
// parent is eventually drawn the same edge is decremented again, taking the
// already-drawn child to -1, which the traversal's exact-zero trigger
// ignores. Each edge is walked exactly once, so no count goes negative
// before traversal starts.

use crate::arena::EDGE_NIL;
use crate::sorter::TransSorter;
use crate::types::{TransTriangle, TriIdx, Visit};

#[derive(Copy, Clone)]
struct DfsFrame {
    tri: TriIdx,
    edge: u32,
    best: u32,
}

impl TransSorter {
    /// Depth-first walk over every triangle in the region: retires one lock
    /// per back edge and computes each node's longest path to a leaf.
    /// Returns the longest path seen, which bounds the passes the region
    /// can need.
    pub(crate) fn break_cycles(&mut self, tris: &mut [TransTriangle]) -> u32 {
        let mut deepest = 0u32;
        let mut stack: Vec<DfsFrame> = Vec::with_capacity(self.order.len());

        for i in 0..self.order.len() {
            let root = self.order[i];
            if tris[root as usize].visit != Visit::White {
                continue;
            }
            tris[root as usize].visit = Visit::Grey;
            stack.push(DfsFrame {
                tri: root,
                edge: tris[root as usize].children,
                best: 0,
            });

            while !stack.is_empty() {
                let top = stack.len() - 1;
                let frame = stack[top];

                if frame.edge == EDGE_NIL {
                    let depth = frame.best + 1;
                    let node = &mut tris[frame.tri as usize];
                    node.max_depth = depth;
                    node.visit = Visit::Black;
                    stack.pop();
                    if let Some(up) = stack.last_mut() {
                        if depth > up.best {
                            up.best = depth;
                        }
                    }
                    if depth > deepest {
                        deepest = depth;
                    }
                    continue;
                }

                let edge = self.arena.get(frame.edge);
                stack[top].edge = edge.next;
                let child = edge.child as usize;
                match tris[child].visit {
                    Visit::White => {
                        tris[child].visit = Visit::Grey;
                        stack.push(DfsFrame {
                            tri: edge.child,
                            edge: tris[child].children,
                            best: 0,
                        });
                    }
                    Visit::Grey => {
                        // Back edge: pre-retire it for pass counting.
                        tris[child].num_locks -= 1;
                        self.stats.cycles_broken += 1;
                        if tris[child].max_depth > stack[top].best {
                            stack[top].best = tris[child].max_depth;
                        }
                    }
                    Visit::Black => {
                        if tris[child].max_depth > stack[top].best {
                            stack[top].best = tris[child].max_depth;
                        }
                    }
                }
            }
        }
        deepest
    }
}
