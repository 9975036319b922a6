/// Integration tests for block editing
/// These tests place and remove blocks inside and across chunk edges and validate that
/// exactly the expected masks change
mod common;

use std::collections::{HashMap, HashSet};

use cgmath::Point3;
use common::*;
use voxel_world::engine_state::voxels::block::block_side::BlockSide;
use voxel_world::engine_state::voxels::block::block_type::BlockType;
use voxel_world::engine_state::voxels::block::face_mask::FaceMask;
use voxel_world::engine_state::voxels::chunk::block_store::{ChunkDimensions, LocalPosition};
use voxel_world::engine_state::voxels::chunk::visibility::{neighbor_location, NeighborLocation};
use voxel_world::{ChunkCoordinate, World};

type Snapshot = HashMap<ChunkCoordinate, Vec<FaceMask>>;

fn dims(world: &World) -> ChunkDimensions {
    ChunkDimensions::from_config(world.config())
}

/// The six face neighbours of `position`, resolved across chunk edges.
fn neighbors(
    world: &World,
    coordinate: ChunkCoordinate,
    position: LocalPosition,
) -> Vec<(BlockSide, ChunkCoordinate, LocalPosition)> {
    BlockSide::all()
        .into_iter()
        .filter_map(|side| match neighbor_location(dims(world), position, side) {
            NeighborLocation::Local(local) => Some((side, coordinate, local)),
            NeighborLocation::Adjacent {
                side: across,
                position,
            } => Some((side, coordinate.neighbor(across), position)),
            NeighborLocation::OutOfWorld => None,
        })
        .collect()
}

fn assert_only_changed(
    before: &Snapshot,
    after: &Snapshot,
    changed: &HashSet<(ChunkCoordinate, usize)>,
) {
    assert_eq!(before.len(), after.len());
    for (coordinate, masks) in after {
        for (index, mask) in masks.iter().enumerate() {
            if !changed.contains(&(*coordinate, index)) {
                assert_eq!(
                    *mask, before[coordinate][index],
                    "mask {index} of chunk {coordinate}"
                );
            }
        }
    }
}

fn top(world: &World, coordinate: ChunkCoordinate, x: usize, z: usize) -> usize {
    world
        .chunk(coordinate)
        .unwrap()
        .blocks()
        .get()
        .top_y(x, z)
        .unwrap()
}

#[test]
fn placing_a_block_updates_itself_and_its_neighbours() {
    let mut world = small_world();
    let coordinate = ChunkCoordinate::new(0, 0);
    // Column on the edge shared with chunk (1, 0).
    let position = Point3::new(7, top(&world, coordinate, 7, 3) + 1, 3);
    assert!(!world.block_exists(coordinate, position));

    let before = mask_snapshot(&world);
    assert!(world.set_block(coordinate, position, BlockType::DIRT).unwrap());
    let after = mask_snapshot(&world);
    assert!(world.block_exists(coordinate, position));

    let own = dims(&world).linear_index(position);
    let mut changed = HashSet::from([(coordinate, own)]);
    assert_eq!(
        after[&coordinate][own],
        world.index().compute_neighbor_mask(coordinate, position)
    );
    assert!(!after[&coordinate][own].is_exposed(BlockSide::BOTTOM));
    assert!(after[&coordinate][own].is_exposed(BlockSide::TOP));

    for (side, neighbor, local) in neighbors(&world, coordinate, position) {
        if !world.block_exists(neighbor, local) {
            continue;
        }
        let index = dims(&world).linear_index(local);
        assert_eq!(
            after[&neighbor][index],
            before[&neighbor][index].with(side.opposite(), false)
        );
        changed.insert((neighbor, index));
    }

    assert_only_changed(&before, &after, &changed);
    assert_masks_consistent(&world);
    assert_meshes_consistent(&world);
}

#[test]
fn removing_a_block_exposes_its_neighbours() {
    let mut world = small_world();
    let coordinate = ChunkCoordinate::new(0, 0);
    let position = Point3::new(4, top(&world, coordinate, 4, 4) - 2, 4);
    assert!(world.block_exists(coordinate, position));

    let before = mask_snapshot(&world);
    assert!(world.remove_block(coordinate, position).unwrap());
    let after = mask_snapshot(&world);
    assert!(!world.block_exists(coordinate, position));

    let own = dims(&world).linear_index(position);
    assert_eq!(after[&coordinate][own], FaceMask::NONE);
    let mut changed = HashSet::from([(coordinate, own)]);

    let mut exposed = 0;
    for (side, neighbor, local) in neighbors(&world, coordinate, position) {
        if !world.block_exists(neighbor, local) {
            continue;
        }
        let index = dims(&world).linear_index(local);
        assert!(!before[&neighbor][index].is_exposed(side.opposite()));
        assert_eq!(
            after[&neighbor][index],
            before[&neighbor][index].with(side.opposite(), true)
        );
        changed.insert((neighbor, index));
        exposed += 1;
    }
    // Buried two below the surface: at least the blocks above and below remain.
    assert!(exposed >= 2);

    assert_only_changed(&before, &after, &changed);
    assert_masks_consistent(&world);
    assert_meshes_consistent(&world);
}

#[test]
fn removing_a_block_on_a_chunk_edge_exposes_the_neighbour_chunk() {
    let mut world = small_world();
    let coordinate = ChunkCoordinate::new(1, 0);
    let across = ChunkCoordinate::new(0, 0);
    let position = Point3::new(0, 5, 3);
    let facing = Point3::new(7, 5, 3);
    assert!(world.block_exists(across, facing));
    assert!(!world.chunk(across).unwrap().mask(facing).is_exposed(BlockSide::RIGHT));
    let revision = world.chunk(across).unwrap().revision();

    assert!(world.remove_block(coordinate, position).unwrap());

    let neighbour = world.chunk(across).unwrap();
    assert!(neighbour.mask(facing).is_exposed(BlockSide::RIGHT));
    assert!(neighbour.revision() > revision);
    assert!(neighbour.mesh_is_current());
    assert_masks_consistent(&world);
    assert_meshes_consistent(&world);
}

#[test]
fn removing_and_restoring_a_block_restores_every_mask() {
    let mut world = small_world();
    let coordinate = ChunkCoordinate::new(-1, 0);
    let position = Point3::new(0, top(&world, coordinate, 0, 6) - 1, 6);
    let block_type = world
        .chunk(coordinate)
        .unwrap()
        .blocks()
        .get()
        .get(position)
        .and_then(|block| block.kind())
        .unwrap();

    let before = mask_snapshot(&world);
    assert!(world.remove_block(coordinate, position).unwrap());
    assert!(world.set_block(coordinate, position, block_type).unwrap());
    assert_eq!(mask_snapshot(&world), before);
    assert_meshes_consistent(&world);
}

#[test]
fn edits_that_change_nothing_or_cannot_apply() {
    let mut world = small_world();
    let coordinate = ChunkCoordinate::new(0, 0);
    let air = Point3::new(2, 63, 2);
    let ground = Point3::new(2, 0, 2);

    assert!(!world.remove_block(coordinate, air).unwrap());
    assert!(!world.set_block(coordinate, ground, BlockType::STONE).unwrap());
    assert!(world
        .set_block(ChunkCoordinate::new(9, 9), ground, BlockType::STONE)
        .is_err());
    assert!(world
        .set_block(coordinate, Point3::new(8, 0, 0), BlockType::STONE)
        .is_err());

    // Retyping keeps every mask but rebuilds the mesh with the new textures.
    let before = mask_snapshot(&world);
    let uploads = world.buffer_stats().uploads;
    assert!(world.set_block(coordinate, ground, BlockType::DIRT).unwrap());
    assert_eq!(mask_snapshot(&world), before);
    assert!(world.buffer_stats().uploads > uploads);
    assert_meshes_consistent(&world);
}
