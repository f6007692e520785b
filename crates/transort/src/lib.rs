//! Translucent pass ordering for tile-based deferred rendering hardware.
//!
//! The rasterizer cannot depth-test its translucent layer, so within each
//! screen tile the translucent triangles must reach it back to front, as a
//! sequence of non-depth-tested passes. This crate builds a directed graph
//! of in-front-of relations between a tile's triangles, breaks the cycles
//! mutual occlusion creates, and walks the graph into a bounded number of
//! passes written as object pointer words into the parameter buffer.
//!
//! The driver owns the triangle records; one [`TransSorter`] owns every
//! piece of scratch the sort needs and is reused across regions and frames.

pub mod arena;
pub mod cache;
pub mod overlap;
pub mod sorter;
pub mod types;

mod dfs;
mod graph;
mod partition;
mod traverse;

pub use sorter::{SortConfig, TransSorter, DEFAULT_MAX_PASS_COUNT};
pub use traverse::SAFETY_MARGIN_TRANS;
pub use types::{RegionTriList, SortStats, TransTriangle, TriIdx, MAX_NUM_REGION_TRIS};
