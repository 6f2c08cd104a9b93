//! Grid generation.
//!
//! The country extent is split into an `nx × ny` grid so every export request
//! stays under the remote service's per-request size limit.

use crate::domain::{BoundingBox, GridCell, GridSpec};

/// Split `bounds` into `grid.nx() × grid.ny()` cells.
///
/// Cells are emitted with the longitude index as the outer loop and latitude as
/// the inner loop; `index` is the 1-based position in that order. The last cell
/// on each axis is snapped to the parent's max edge so the cells tile the
/// parent exactly.
pub fn build_grid(bounds: &BoundingBox, grid: GridSpec) -> Vec<GridCell> {
    let lon_edges = edges(bounds.min_lon(), bounds.max_lon(), grid.nx());
    let lat_edges = edges(bounds.min_lat(), bounds.max_lat(), grid.ny());

    let mut out = Vec::with_capacity(grid.cell_count());
    for i in 0..grid.nx() {
        for j in 0..grid.ny() {
            let cell = BoundingBox::from_ordered(lon_edges[i], lat_edges[j], lon_edges[i + 1], lat_edges[j + 1]);
            debug_assert!(bounds.contains(&cell, 1e-9));
            out.push(GridCell {
                index: out.len() + 1,
                i,
                j,
                bounds: cell,
            });
        }
    }
    out
}

fn edges(min: f64, max: f64, count: usize) -> Vec<f64> {
    let step = (max - min) / count as f64;
    let mut out: Vec<f64> = (0..count).map(|k| min + k as f64 * step).collect();
    out.push(max);
    out
}
