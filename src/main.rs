//! # Voxel World Driver
//!
//! Builds a world, walks the viewpoint along a scripted path polling tasks every frame
//! and logs residency and buffer statistics.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

use anyhow::Context;
use log::{info, warn};
use web_time::{Duration, Instant};

use voxel_world::{
    ChunkBufferStore, HostBufferStore, WgpuBufferStore, World, WorldConfig,
};

const FRAMES: u32 = 1200;
const FRAME_TIME: Duration = Duration::from_millis(4);
/// Blocks travelled per frame.
const SPEED: f64 = 0.75;

fn buffer_store() -> Box<dyn ChunkBufferStore> {
    match WgpuBufferStore::new_headless() {
        Ok(store) => Box::new(store),
        Err(error) => {
            warn!("{:#}; keeping chunk buffers in host memory", error);
            Box::new(HostBufferStore::new())
        }
    }
}

/// Viewpoint position at `frame`: east along x, then a quarter turn north along z.
fn path(frame: u32) -> (f64, f64) {
    let travelled = frame as f64 * SPEED;
    let leg = FRAMES as f64 * SPEED / 2.0;
    if travelled < leg {
        (travelled, 0.0)
    } else {
        (leg, travelled - leg)
    }
}

fn main() -> anyhow::Result<()> {
    voxel_world::init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::from_path(&path)?,
        None => WorldConfig::default(),
    };
    info!("Configuration: {:?}", config);

    let mut world = World::new(config, buffer_store()).context("Failed to create the world")?;

    let start = Instant::now();
    for frame in 0..FRAMES {
        let (x, z) = path(frame);
        world.update_viewpoint(x, z);
        world.update();

        if frame % 200 == 0 {
            let stats = world.buffer_stats();
            info!(
                "Frame {}: viewpoint {}, {} chunks resident, {} drawable, {} KiB in {} buffers",
                frame,
                world.viewpoint(),
                world.resident_chunks().len(),
                world.render_chunks().len(),
                stats.allocated_bytes / 1024,
                stats.live_chunks
            );
        }
        std::thread::sleep(FRAME_TIME);
    }
    world.wait_for_pending();

    let stats = world.buffer_stats();
    info!(
        "Walked {} frames in {:?}: {} chunks resident, {} uploads, {} releases",
        FRAMES,
        start.elapsed(),
        world.resident_chunks().len(),
        stats.uploads,
        stats.releases
    );
    Ok(())
}
