/// Integration tests for chunk streaming
/// These tests move the viewpoint around a small world and validate residency, chunk
/// states and the consistency of masks, meshes and buffers after every step
mod common;

use anyhow::bail;
use cgmath::Point3;
use common::*;
use voxel_world::engine_state::rendering::meshing::ChunkMesh;
use voxel_world::engine_state::voxels::streaming::desired_window;
use voxel_world::{
    BufferStats, ChunkBufferStore, ChunkCoordinate, ChunkState, HostBufferStore, World,
    WorldConfig,
};

fn assert_contained(world: &World) {
    let retention = world.config().retention_radius();
    for coordinate in world.resident_chunks() {
        assert!(
            coordinate.chebyshev_distance(world.viewpoint()) <= retention,
            "chunk {} resident outside the retention window of {}",
            coordinate,
            world.viewpoint()
        );
    }
}

fn assert_visible_ready(world: &World) {
    for coordinate in desired_window(world.viewpoint(), world.config().visible_radius) {
        assert_eq!(
            world.chunk_state(coordinate),
            ChunkState::Ready,
            "chunk {coordinate} not ready"
        );
    }
}

#[test]
fn initial_window_is_ready_and_drawable() {
    let world = small_world();
    assert_eq!(world.viewpoint(), ChunkCoordinate::new(0, 0));
    assert_eq!(world.resident_chunks().len(), 9);
    assert!(!world.tasks_pending());
    assert_visible_ready(&world);

    let render_chunks = world.render_chunks();
    assert_eq!(render_chunks.len(), 9);
    for chunk in &render_chunks {
        assert!(world.index().contains(chunk.coordinate));
        assert_eq!(
            chunk.origin,
            Point3::new(chunk.coordinate.x * 8, 0, chunk.coordinate.z * 8)
        );
        assert!(!chunk.mesh.is_empty());
    }

    assert_masks_consistent(&world);
    assert_meshes_consistent(&world);
}

#[test]
fn staying_inside_a_chunk_changes_nothing() {
    let mut world = small_world();
    assert!(!world.update_viewpoint(7.9, 0.1));
    assert!(!world.tasks_pending());
    assert!(world.update_viewpoint(8.0, 0.1));
    assert_eq!(world.viewpoint(), ChunkCoordinate::new(1, 0));
    assert!(world.update_viewpoint(-0.5, 0.0));
    assert_eq!(world.viewpoint(), ChunkCoordinate::new(-1, 0));
}

#[test]
fn resident_chunks_stay_inside_the_retention_window() {
    let mut world = small_world();
    let path = [
        (20.0, 0.0),
        (45.0, 3.0),
        (45.0, 40.0),
        (46.0, 41.0),
        (-30.0, -10.0),
        (-31.0, -9.0),
        (0.0, 0.0),
    ];

    for (step, &(x, z)) in path.iter().enumerate() {
        world.update_viewpoint(x, z);
        for _ in 0..3 {
            world.update();
            assert_contained(&world);
        }
        if step % 2 == 1 {
            world.wait_for_pending();
            assert_contained(&world);
            assert_visible_ready(&world);
        }
    }

    world.wait_for_pending();
    assert_contained(&world);
    assert_visible_ready(&world);

    let mut indexed = world.index().coordinates();
    indexed.sort_unstable();
    assert_eq!(indexed, world.resident_chunks());
    assert_masks_consistent(&world);
    assert_meshes_consistent(&world);
}

#[test]
fn leaving_chunks_are_evicting_until_the_next_update() {
    let mut world = small_world();
    let x = chunk_center(&world, 3);
    assert!(world.update_viewpoint(x, 4.0));

    let left_behind = ChunkCoordinate::new(-1, 0);
    assert_eq!(world.chunk_state(left_behind), ChunkState::Evicting);
    assert_eq!(world.chunk_state(ChunkCoordinate::new(1, 0)), ChunkState::Ready);
    assert!(world.render_chunks().iter().all(|chunk| chunk.coordinate.x >= 1));

    world.update();
    assert_eq!(world.chunk_state(left_behind), ChunkState::Unloaded);
    assert!(!world.index().contains(left_behind));
    assert!(world.buffer_stats().releases >= 6);

    world.wait_for_pending();
    assert_visible_ready(&world);
    assert_eq!(world.chunk_state(ChunkCoordinate::new(1, 0)), ChunkState::Ready);
    // Chunk (1, 0) lost its left neighbour, so its left edge is exposed again.
    assert_masks_consistent(&world);
    assert_meshes_consistent(&world);
}

#[test]
fn oscillating_viewpoint_revives_evicting_chunks() {
    let mut world = small_world();
    let kept = ChunkCoordinate::new(-1, 0);

    world.update_viewpoint(chunk_center(&world, 2), 4.0);
    assert_eq!(world.chunk_state(kept), ChunkState::Evicting);

    world.update_viewpoint(chunk_center(&world, 0), 4.0);
    assert_eq!(world.chunk_state(kept), ChunkState::Ready);

    world.wait_for_pending();
    assert_eq!(world.chunk_state(kept), ChunkState::Ready);
    assert_eq!(world.chunk_state(ChunkCoordinate::new(3, 0)), ChunkState::Unloaded);
    assert_contained(&world);
    assert_visible_ready(&world);
    assert_masks_consistent(&world);
    assert_meshes_consistent(&world);
}

#[test]
fn viewpoints_beyond_the_grid_are_clamped() {
    let mut world = small_world();
    assert!(world.update_viewpoint(1e300, -1e300));
    // Retention radius 2, plus one ring of slack.
    let corner = ChunkCoordinate::new(i32::MAX - 3, i32::MIN + 3);
    assert_eq!(world.viewpoint(), corner);
    assert!(!world.update_viewpoint(f64::MAX, f64::MIN));

    world.wait_for_pending();
    assert_contained(&world);
    assert_visible_ready(&world);
    assert_eq!(world.resident_chunks().len(), 9);
    assert_masks_consistent(&world);
    assert_meshes_consistent(&world);
}

#[test]
fn seed_44_terrain_is_reproducible() {
    let config = WorldConfig {
        visible_radius: 0,
        worker_threads: Some(1),
        ..WorldConfig::default()
    };
    assert_eq!(config.seed, 44);

    let profile = |world: &World| {
        let chunk = world.chunk(ChunkCoordinate::new(0, 0)).unwrap();
        let store = chunk.blocks().get();
        let tops: Vec<Option<usize>> = (0..16)
            .flat_map(|z| (0..16).map(move |x| (x, z)))
            .map(|(x, z)| store.top_y(x, z))
            .collect();
        (store.len(), tops)
    };

    let first = World::new(config.clone(), Box::new(HostBufferStore::new())).unwrap();
    let second = World::new(config, Box::new(HostBufferStore::new())).unwrap();
    let (count, tops) = profile(&first);
    assert_eq!((count, tops.clone()), profile(&second));

    assert!(count > 0);
    for top in tops {
        let top = top.unwrap();
        assert!((75..=123).contains(&top), "column top {top} outside the noise range");
    }
}

#[test]
fn invalid_configuration_is_rejected() {
    let config = WorldConfig {
        chunk_width: 0,
        ..small_config()
    };
    assert!(World::new(config, Box::new(HostBufferStore::new())).is_err());
}

/// Refuses uploads for chunks at or beyond `reject_from_x`.
struct RejectingStore {
    inner: HostBufferStore,
    reject_from_x: i32,
}

impl ChunkBufferStore for RejectingStore {
    fn upload(&mut self, coordinate: ChunkCoordinate, mesh: &ChunkMesh) -> anyhow::Result<()> {
        if coordinate.x >= self.reject_from_x {
            bail!("out of buffer memory");
        }
        self.inner.upload(coordinate, mesh)
    }

    fn release(&mut self, coordinate: ChunkCoordinate) {
        self.inner.release(coordinate);
    }

    fn stats(&self) -> BufferStats {
        self.inner.stats()
    }
}

#[test]
fn upload_failure_during_initialization_is_fatal() {
    let store = RejectingStore {
        inner: HostBufferStore::new(),
        reject_from_x: 1,
    };
    assert!(World::new(small_config(), Box::new(store)).is_err());
}

#[test]
fn upload_failure_while_streaming_leaves_the_chunk_absent() {
    let store = RejectingStore {
        inner: HostBufferStore::new(),
        reject_from_x: 2,
    };
    let mut world = World::new(small_config(), Box::new(store)).unwrap();

    world.update_viewpoint(chunk_center(&world, 1), 4.0);
    world.wait_for_pending();

    for z in -1..=1 {
        let failed = ChunkCoordinate::new(2, z);
        assert_eq!(world.chunk_state(failed), ChunkState::Unloaded);
        assert!(!world.index().contains(failed));
        assert!(!world.block_exists(failed, Point3::new(0, 0, 0)));
    }
    assert_eq!(world.chunk_state(ChunkCoordinate::new(1, 0)), ChunkState::Ready);
    assert_masks_consistent(&world);
}
