//! # Block Visibility
//!
//! Computes which faces of a block are exposed. Neighbour positions inside the chunk are
//! looked up in its own [`BlockStore`]; positions across a horizontal chunk edge are
//! answered from a [`BoundaryPlane`] snapshot of the adjacent chunk. Planes are captured
//! under that chunk's own read lock and released before the local store is read, so
//! visibility never holds two chunk locks at once.
//!
//! Faces above `y = height - 1` and below `y = 0` are always exposed, as are faces
//! bordering a chunk that is not loaded yet.

use bitvec::vec::BitVec;
use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::face_mask::FaceMask;

use super::block_store::{BlockStore, ChunkDimensions, LocalPosition};

/// Where the block adjacent to a face lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NeighborLocation {
    /// Inside the same chunk.
    Local(LocalPosition),
    /// Inside the chunk across `side`, at `position` in that chunk's local space.
    Adjacent {
        /// Direction of the neighbouring chunk
        side: BlockSide,
        /// Local position within the neighbouring chunk
        position: LocalPosition,
    },
    /// Above or below the world.
    OutOfWorld,
}

/// Resolves the block adjacent to `position` across `side`.
///
/// Horizontal coordinates wrap into the neighbouring chunk: `x = -1` becomes
/// `x = width - 1` of the chunk to the left.
pub fn neighbor_location(
    dims: ChunkDimensions,
    position: LocalPosition,
    side: BlockSide,
) -> NeighborLocation {
    let normal = side.normal();
    let x = position.x as i32 + normal.x;
    let y = position.y as i32 + normal.y;
    let z = position.z as i32 + normal.z;
    let width = dims.width as i32;

    if y < 0 || y >= dims.height as i32 {
        return NeighborLocation::OutOfWorld;
    }
    if (0..width).contains(&x) && (0..width).contains(&z) {
        return NeighborLocation::Local(Point3::new(x as usize, y as usize, z as usize));
    }

    NeighborLocation::Adjacent {
        side,
        position: Point3::new(
            x.rem_euclid(width) as usize,
            y as usize,
            z.rem_euclid(width) as usize,
        ),
    }
}

/// The positions of a chunk's boundary plane on horizontal `side`, as `(y, t)` pairs
/// mapped to local positions. `t` runs along the edge.
pub fn boundary_positions(
    dims: ChunkDimensions,
    side: BlockSide,
) -> impl Iterator<Item = LocalPosition> {
    let last = dims.width - 1;
    (0..dims.height).flat_map(move |y| {
        (0..dims.width).map(move |t| match side {
            BlockSide::RIGHT => Point3::new(last, y, t),
            BlockSide::LEFT => Point3::new(0, y, t),
            BlockSide::BACK => Point3::new(t, y, last),
            _ => Point3::new(t, y, 0),
        })
    })
}

/// Occupancy snapshot of one horizontal boundary plane of a chunk.
///
/// Bit `y * width + t` is set when the block at height `y`, offset `t` along the edge,
/// is occupied. `t` is `z` for the left/right planes and `x` for the front/back planes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryPlane {
    side: BlockSide,
    dims: ChunkDimensions,
    bits: BitVec,
}

impl BoundaryPlane {
    /// Captures the plane of `store` lying on `side`.
    pub fn capture(store: &BlockStore, side: BlockSide) -> Self {
        debug_assert!(side.is_horizontal());
        let dims = store.dims();
        let mut bits = BitVec::repeat(false, dims.width * dims.height);
        for position in boundary_positions(dims, side) {
            if store.contains(position) {
                bits.set(Self::bit_index(dims, side, position), true);
            }
        }
        Self { side, dims, bits }
    }

    /// Which side of its chunk the plane was captured from.
    pub fn side(&self) -> BlockSide {
        self.side
    }

    /// Whether the plane block at `position` (local to the plane's chunk) is occupied.
    pub fn is_occupied(&self, position: LocalPosition) -> bool {
        if position.y >= self.dims.height {
            return false;
        }
        self.bits
            .get(Self::bit_index(self.dims, self.side, position))
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    /// Number of occupied plane blocks.
    pub fn occupied(&self) -> usize {
        self.bits.count_ones()
    }

    fn bit_index(dims: ChunkDimensions, side: BlockSide, position: LocalPosition) -> usize {
        let t = match side {
            BlockSide::RIGHT | BlockSide::LEFT => position.z,
            _ => position.x,
        };
        position.y * dims.width + t
    }
}

/// Boundary planes of the four horizontal neighbours of a chunk.
///
/// The entry for `side` is the plane of the chunk across `side` that faces back toward
/// this chunk; `None` means that neighbour is not loaded.
#[derive(Clone, Debug, Default)]
pub struct NeighborPlanes {
    planes: [Option<BoundaryPlane>; 4],
}

impl NeighborPlanes {
    /// No neighbour loaded.
    pub fn none() -> Self {
        Self::default()
    }

    /// The neighbour plane across `side`.
    pub fn get(&self, side: BlockSide) -> Option<&BoundaryPlane> {
        Self::slot(side).and_then(|slot| self.planes[slot].as_ref())
    }

    /// Records the neighbour plane across `side`.
    pub fn set(&mut self, side: BlockSide, plane: Option<BoundaryPlane>) {
        if let Some(slot) = Self::slot(side) {
            self.planes[slot] = plane;
        }
    }

    /// Number of loaded neighbours.
    pub fn loaded(&self) -> usize {
        self.planes.iter().filter(|plane| plane.is_some()).count()
    }

    fn slot(side: BlockSide) -> Option<usize> {
        match side {
            BlockSide::FRONT => Some(0),
            BlockSide::RIGHT => Some(1),
            BlockSide::BACK => Some(2),
            BlockSide::LEFT => Some(3),
            BlockSide::TOP | BlockSide::BOTTOM => None,
        }
    }
}

/// Whether the face of the block at `position` on `side` is exposed.
pub fn is_face_exposed(
    store: &BlockStore,
    neighbors: &NeighborPlanes,
    position: LocalPosition,
    side: BlockSide,
) -> bool {
    match neighbor_location(store.dims(), position, side) {
        NeighborLocation::Local(neighbor) => !store.contains(neighbor),
        NeighborLocation::Adjacent { side, position } => neighbors
            .get(side)
            .map_or(true, |plane| !plane.is_occupied(position)),
        NeighborLocation::OutOfWorld => true,
    }
}

/// The 6-bit exposure mask of the block at `position`.
///
/// Air positions have an empty mask.
pub fn compute_neighbor_mask(
    store: &BlockStore,
    neighbors: &NeighborPlanes,
    position: LocalPosition,
) -> FaceMask {
    if !store.contains(position) {
        return FaceMask::NONE;
    }
    BlockSide::all()
        .into_iter()
        .fold(FaceMask::NONE, |mask, side| {
            mask.with(side, is_face_exposed(store, neighbors, position, side))
        })
}
