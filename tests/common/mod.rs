#![allow(dead_code)]

use std::collections::HashMap;

use voxel_world::engine_state::voxels::block::face_mask::FaceMask;
use voxel_world::engine_state::voxels::chunk::visibility;
use voxel_world::{ChunkCoordinate, HostBufferStore, World, WorldConfig};

/// A world small enough to stream quickly in debug builds.
pub fn small_config() -> WorldConfig {
    WorldConfig {
        chunk_width: 8,
        chunk_height: 64,
        visible_radius: 1,
        retention_margin: 1,
        base_height: 30.0,
        height_amplitude: 10.0,
        horizontal_scale: 1.0 / 24.0,
        worker_threads: Some(2),
        ..WorldConfig::default()
    }
}

pub fn small_world() -> World {
    World::new(small_config(), Box::new(HostBufferStore::new())).unwrap()
}

/// World-space coordinate of the centre of chunk column `chunk` along one axis.
pub fn chunk_center(world: &World, chunk: i32) -> f64 {
    let width = world.config().chunk_width as f64;
    chunk as f64 * width + width / 2.0
}

pub fn mask_snapshot(world: &World) -> HashMap<ChunkCoordinate, Vec<FaceMask>> {
    world
        .resident_chunks()
        .into_iter()
        .map(|coordinate| {
            let masks = world.chunk(coordinate).unwrap().masks().to_vec();
            (coordinate, masks)
        })
        .collect()
}

/// Checks every mask of every resident chunk against a from-scratch computation over
/// the current world index.
pub fn assert_masks_consistent(world: &World) {
    for coordinate in world.resident_chunks() {
        let chunk = world.chunk(coordinate).unwrap();
        let planes = world.index().neighbor_planes(coordinate);
        let store = chunk.blocks().get();
        for index in 0..chunk.dims().volume() {
            let position = chunk.dims().position_of(index);
            let expected = visibility::compute_neighbor_mask(&store, &planes, position);
            assert_eq!(
                chunk.masks()[index],
                expected,
                "mask of {:?} in chunk {}",
                position,
                coordinate
            );
        }
    }
}

/// Checks that every drawn mesh is current, matches its masks and is what the buffer
/// store holds.
pub fn assert_meshes_consistent(world: &World) {
    let mut bytes = 0u64;
    let mut live = 0usize;
    for coordinate in world.resident_chunks() {
        let chunk = world.chunk(coordinate).unwrap();
        assert!(chunk.mesh_is_current(), "mesh of chunk {coordinate} is stale");
        let mesh = chunk.mesh().unwrap();
        assert_eq!(mesh.element_count(), chunk.element_count());
        assert_eq!(mesh.vertices().len(), mesh.face_count() * 4);
        if !mesh.is_empty() {
            live += 1;
            bytes += (mesh.vertex_bytes().len() + mesh.index_bytes().len()) as u64;
        }
    }
    let stats = world.buffer_stats();
    assert_eq!(stats.live_chunks, live);
    assert_eq!(stats.allocated_bytes, bytes);
}
