// End-to-end scenarios for the translucent pass sorter, driven purely
// through the public API: triangle records in, parameter-buffer words out.

use pvr_params::{ObjectWord, ParamBuffer, TRANS_PASS_BEGIN_WORD, TRANS_PASS_FLUSH_WORD};
use transort::{
    RegionTriList, SortConfig, TransSorter, TransTriangle, TriIdx, MAX_NUM_REGION_TRIS,
};

/// Flat triangle at constant inverse depth `z` (larger is nearer), with its
/// object word offset doubling as its identity.
fn tri(verts: [[f32; 2]; 3], z: f32, id: u32) -> TransTriangle {
    TransTriangle::new(verts, [z; 3], ObjectWord::new(id, 1))
}

/// Nested stack around (50, 50): index i contains index i+1 and index i+1
/// is nearer.
fn nested(count: usize) -> Vec<TransTriangle> {
    (0..count)
        .map(|i| {
            let s = 100.0 - 8.0 * i as f32;
            tri(
                [[50.0 - s, 50.0 - s], [50.0 + s, 50.0 - s], [50.0, 50.0 + s]],
                0.1 + 0.05 * i as f32,
                i as u32,
            )
        })
        .collect()
}

fn list_of(n: usize) -> RegionTriList {
    let mut list = RegionTriList::new();
    for i in 0..n {
        list.push(i as TriIdx);
    }
    list
}

/// Decode the buffer back into passes of triangle ids.
fn passes_of(buf: &ParamBuffer) -> Vec<Vec<u32>> {
    let mut passes = Vec::new();
    let mut cur = Vec::new();
    let mut open = false;
    for &w in buf.words() {
        match w {
            TRANS_PASS_BEGIN_WORD => {
                assert!(!open, "nested pass begin");
                open = true;
                cur.clear();
            }
            TRANS_PASS_FLUSH_WORD => {
                assert!(open, "flush without begin");
                open = false;
                passes.push(cur.clone());
            }
            obj => {
                assert!(open, "object word outside a pass");
                cur.push(obj & 0x00FF_FFFF);
            }
        }
    }
    assert!(!open, "unterminated pass");
    passes
}

fn sorted_ids(passes: &[Vec<u32>]) -> Vec<u32> {
    let mut ids: Vec<u32> = passes.iter().flatten().copied().collect();
    ids.sort_unstable();
    ids
}

#[test]
fn disjoint_triangles_come_out_in_one_pass() {
    let mut tris = vec![
        tri([[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]], 0.5, 0),
        tri([[50.0, 0.0], [60.0, 0.0], [50.0, 10.0]], 0.3, 1),
        tri([[0.0, 50.0], [10.0, 50.0], [0.0, 60.0]], 0.7, 2),
    ];
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    let mut buf = ParamBuffer::new(1000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(3), &mut buf));

    let passes = passes_of(&buf);
    assert_eq!(passes.len(), 1);
    assert_eq!(sorted_ids(&passes), vec![0, 1, 2]);
}

#[test]
fn contained_triangle_draws_before_its_cover() {
    // id 0 fully contains id 1; id 0 is nearer, so it must come last.
    let mut tris = vec![
        tri([[0.0, 0.0], [80.0, 0.0], [40.0, 80.0]], 0.9, 0),
        tri([[35.0, 10.0], [45.0, 10.0], [40.0, 20.0]], 0.2, 1),
    ];
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    let mut buf = ParamBuffer::new(1000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(2), &mut buf));

    let passes = passes_of(&buf);
    assert_eq!(passes, vec![vec![1], vec![0]]);
}

#[test]
fn nested_stack_emits_strictly_back_to_front() {
    let n = 8;
    let mut tris = nested(n);
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    let mut buf = ParamBuffer::new(1000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(n), &mut buf));

    let passes = passes_of(&buf);
    assert_eq!(passes.len(), n);
    // Every in-front-of relation is honoured: farther id in an earlier pass.
    for (pass_no, pass) in passes.iter().enumerate() {
        assert_eq!(pass, &vec![pass_no as u32]);
    }
}

#[test]
fn no_triangle_is_emitted_twice_and_none_vanish() {
    let n = 12;
    let mut tris = nested(n);
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    let mut buf = ParamBuffer::new(10_000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(n), &mut buf));

    let passes = passes_of(&buf);
    assert_eq!(sorted_ids(&passes), (0..n as u32).collect::<Vec<_>>());
}

#[test]
fn pass_budget_caps_proper_passes_and_dumps_the_rest() {
    let n = 6;
    let mut tris = nested(n);
    let mut sorter = TransSorter::new(SortConfig { max_pass_count: 2 }).unwrap();
    let mut buf = ParamBuffer::new(1000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(n), &mut buf));

    let passes = passes_of(&buf);
    // Two proper passes plus one catch-all.
    assert_eq!(passes.len(), 3);
    assert_eq!(passes[0], vec![0]);
    assert_eq!(passes[1], vec![1]);
    let mut rest = passes[2].clone();
    rest.sort_unstable();
    assert_eq!(rest, vec![2, 3, 4, 5]);
    assert_eq!(sorted_ids(&passes), (0..n as u32).collect::<Vec<_>>());
}

#[test]
fn far_apart_triangles_never_reach_the_edge_tests() {
    let mut tris = vec![
        tri([[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]], 0.5, 0),
        tri([[500.0, 500.0], [510.0, 500.0], [500.0, 510.0]], 0.4, 1),
    ];
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    sorter.sort_region(&mut tris, &list_of(2));
    let stats = sorter.stats();
    assert_eq!(stats.overlap_tests, 1);
    assert_eq!(stats.edge_pair_tests, 0, "bounding boxes must reject first");
}

#[test]
fn oversized_region_is_capped_without_losing_the_rest() {
    let n = MAX_NUM_REGION_TRIS + 1;
    // A grid of small disjoint triangles with slightly varying depths.
    let mut tris: Vec<TransTriangle> = (0..n)
        .map(|i| {
            let x = (i % 64) as f32 * 20.0;
            let y = (i / 64) as f32 * 20.0;
            tri(
                [[x, y], [x + 8.0, y], [x, y + 8.0]],
                0.1 + (i as f32) * 1e-4,
                i as u32,
            )
        })
        .collect();
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    let mut buf = ParamBuffer::new(100_000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(n), &mut buf));

    assert_eq!(sorter.stats().tris_dropped, 1);
    assert_eq!(sorter.region_len(), MAX_NUM_REGION_TRIS);
    let passes = passes_of(&buf);
    let ids = sorted_ids(&passes);
    assert_eq!(ids.len(), MAX_NUM_REGION_TRIS);
    // No id appears twice.
    assert!(ids.windows(2).all(|w| w[0] != w[1]));
}

#[test]
fn bulk_region_chains_groups_far_to_near() {
    let n = 300;
    let mut tris: Vec<TransTriangle> = (0..n)
        .map(|i| {
            let x = (i % 20) as f32 * 25.0;
            let y = (i / 20) as f32 * 25.0;
            tri(
                [[x, y], [x + 10.0, y], [x, y + 10.0]],
                0.1 + (i as f32) * 1e-3,
                i as u32,
            )
        })
        .collect();
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    let mut buf = ParamBuffer::new(10_000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(n), &mut buf));

    let passes = passes_of(&buf);
    assert_eq!(sorted_ids(&passes), (0..n as u32).collect::<Vec<_>>());
    // Ten chained depth groups, then the exactly-ordered nearest few.
    assert_eq!(passes.len(), 11);
    // The final pass holds the nearest triangles, nothing from the far
    // groups.
    let last = passes.last().unwrap();
    assert!(last.iter().all(|&id| id >= (n as u32) - 10));
}

#[test]
fn partitioned_region_splits_cleanly_separated_columns() {
    // Two tight columns far apart on x, tall on y: the split axis is x and
    // the columns land cleanly on either side, so each half is ordered
    // independently. Everything is disjoint, so one pass holds all 24.
    let mut tris = Vec::new();
    for col in 0..2 {
        let cx = 100.0 * col as f32;
        for i in 0..12 {
            let y = i as f32 * 160.0;
            tris.push(tri(
                [[cx, y], [cx + 8.0, y], [cx, y + 8.0]],
                0.2 + 0.01 * i as f32,
                (col * 12 + i) as u32,
            ));
        }
    }
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    let mut buf = ParamBuffer::new(1000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(24), &mut buf));

    let passes = passes_of(&buf);
    assert_eq!(passes.len(), 1);
    assert_eq!(sorted_ids(&passes), (0..24).collect::<Vec<_>>());
}

#[test]
fn partitioned_clusters_still_order_back_to_front() {
    // Two well-separated nested stacks of 15. Whatever shape the splits
    // take, within each stack a nearer triangle must land in a later pass.
    let mut tris = Vec::new();
    for c in 0..2 {
        let cx = 100.0 + 600.0 * c as f32;
        for i in 0..15 {
            let s = 80.0 - 5.0 * i as f32;
            tris.push(tri(
                [[cx - s, 100.0 - s], [cx + s, 100.0 - s], [cx, 100.0 + s]],
                0.1 + 0.05 * i as f32,
                (c * 15 + i) as u32,
            ));
        }
    }
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    let mut buf = ParamBuffer::new(1000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(30), &mut buf));

    let passes = passes_of(&buf);
    assert_eq!(sorted_ids(&passes), (0..30).collect::<Vec<_>>());

    let mut pass_of = [usize::MAX; 30];
    for (p, pass) in passes.iter().enumerate() {
        for &id in pass {
            pass_of[id as usize] = p;
        }
    }
    for c in 0..2 {
        for i in 0..14 {
            let far = c * 15 + i;
            let near = far + 1;
            assert!(
                pass_of[far] < pass_of[near],
                "triangle {} must draw before {}",
                far,
                near
            );
        }
    }
}

#[test]
fn region_that_cannot_fit_is_skipped_untouched() {
    let mut tris = nested(4);
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    // Worst case for 4 triangles cannot fit in 6 planes.
    let mut buf = ParamBuffer::new(6);
    buf.push_word(0x1234_5678);
    buf.add_planes(1);

    assert!(!sorter.sort_and_emit(&mut tris, &list_of(4), &mut buf));
    // Nothing beyond the pre-call state.
    assert_eq!(buf.words(), &[0x1234_5678]);
    assert_eq!(buf.planes_used(), 1);
}

#[test]
fn crossing_depths_still_terminate_and_cover_everyone() {
    // Two overlapping fans with depth planes that genuinely interleave, so
    // the relation graph is nontrivial; whatever it contains, traversal
    // must terminate within the budget and emit each triangle exactly once.
    let n = 10;
    let mut tris: Vec<TransTriangle> = (0..n)
        .map(|i| {
            let a = i as f32 * 0.6;
            let (s, c) = a.sin_cos();
            TransTriangle::new(
                [
                    [50.0, 50.0],
                    [50.0 + 40.0 * c, 50.0 + 40.0 * s],
                    [50.0 + 40.0 * c - 15.0 * s, 50.0 + 40.0 * s + 15.0 * c],
                ],
                [0.5, 0.1 + 0.08 * i as f32, 0.9 - 0.08 * i as f32],
                ObjectWord::new(i as u32, 1),
            )
        })
        .collect();
    let mut sorter = TransSorter::new(SortConfig::default()).unwrap();
    let mut buf = ParamBuffer::new(10_000);
    assert!(sorter.sort_and_emit(&mut tris, &list_of(n), &mut buf));
    let passes = passes_of(&buf);
    assert_eq!(sorted_ids(&passes), (0..n as u32).collect::<Vec<_>>());
}
