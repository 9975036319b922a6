//! # Streaming Windows
//!
//! Square (Chebyshev) windows of chunk coordinates around the viewpoint chunk, and the
//! grouping of newly entered coordinates into per-edge generation batches.

use std::collections::BTreeMap;

use super::chunk::chunk_coordinate::ChunkCoordinate;

/// Every coordinate within `radius` of `center`, nearest rings first.
pub fn desired_window(center: ChunkCoordinate, radius: i32) -> Vec<ChunkCoordinate> {
    let radius = radius.max(0);
    let side = (2 * radius + 1) as usize;
    let mut window = Vec::with_capacity(side * side);
    for dz in -radius..=radius {
        for dx in -radius..=radius {
            window.push(center.offset(dx, dz));
        }
    }
    window.sort_by_key(|coordinate| (coordinate.chebyshev_distance(center), coordinate.z, coordinate.x));
    // Offsets saturate at the edge of the grid, collapsing onto the same coordinate.
    window.dedup();
    window
}

/// Whether `coordinate` lies in the window of `radius` around `center`.
pub fn in_window(center: ChunkCoordinate, coordinate: ChunkCoordinate, radius: i32) -> bool {
    coordinate.chebyshev_distance(center) <= radius
}

fn manhattan_distance(a: ChunkCoordinate, b: ChunkCoordinate) -> i32 {
    let dx = a.x.saturating_sub(b.x).saturating_abs();
    let dz = a.z.saturating_sub(b.z).saturating_abs();
    dx.saturating_add(dz)
}

/// Groups `missing` coordinates into generation batches along the edge the viewpoint
/// moved toward.
///
/// Movement `(dx, dz)` mostly along x produces one batch per column (shared `x`),
/// otherwise one batch per row (shared `z`). Batches nearest to `center` come first,
/// and within a batch the chunk straight ahead of `center` leads.
pub fn edge_batches(
    missing: &[ChunkCoordinate],
    center: ChunkCoordinate,
    movement: (i32, i32),
) -> Vec<Vec<ChunkCoordinate>> {
    let by_column = movement.0.abs() >= movement.1.abs();
    let mut groups: BTreeMap<i32, Vec<ChunkCoordinate>> = BTreeMap::new();
    for &coordinate in missing {
        let key = if by_column { coordinate.x } else { coordinate.z };
        groups.entry(key).or_default().push(coordinate);
    }

    let mut batches: Vec<Vec<ChunkCoordinate>> = groups
        .into_values()
        .map(|mut batch| {
            batch.sort_by_key(|coordinate| {
                (
                    coordinate.chebyshev_distance(center),
                    manhattan_distance(*coordinate, center),
                    *coordinate,
                )
            });
            batch
        })
        .collect();
    batches.sort_by_key(|batch| {
        batch
            .iter()
            .map(|coordinate| coordinate.chebyshev_distance(center))
            .min()
            .unwrap_or(i32::MAX)
    });
    batches
}
