//! GPU-backed chunk buffers.

use std::collections::HashMap;

use anyhow::{anyhow, Context};
use log::{debug, info};
use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device, Queue};

use crate::engine_state::rendering::meshing::ChunkMesh;
use crate::engine_state::voxels::chunk::chunk_coordinate::ChunkCoordinate;

use super::{BufferStats, ChunkBufferStore};

/// Vertex and index buffers of one chunk on the GPU.
#[derive(Debug)]
pub struct GpuChunkBuffers {
    /// Packed vertices
    pub vertex_buffer: Buffer,
    /// `u32` triangle indices
    pub index_buffer: Buffer,
    /// Number of indices to draw
    pub element_count: u32,
}

impl GpuChunkBuffers {
    fn byte_len(&self) -> u64 {
        self.vertex_buffer.size() + self.index_buffer.size()
    }

    fn destroy(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// [`ChunkBufferStore`] creating one vertex and one index buffer per chunk.
///
/// Chunks with an empty mesh hold no buffers; they draw nothing.
pub struct WgpuBufferStore {
    device: Device,
    queue: Queue,
    buffers: HashMap<ChunkCoordinate, GpuChunkBuffers>,
    stats: BufferStats,
}

impl WgpuBufferStore {
    /// Wraps an existing device.
    pub fn new(device: Device, queue: Queue) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            stats: BufferStats::default(),
        }
    }

    /// Acquires a device on the default adapter without a surface.
    ///
    /// # Errors
    /// Fails when no adapter is available or the device cannot be created.
    pub fn new_headless() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .context("No graphics adapter available")?;
        info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("voxel world device"),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            ..Default::default()
        }))
        .context("Failed to create graphics device")?;

        Ok(Self::new(device, queue))
    }

    /// The device buffers are created on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The queue paired with the device.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// The buffers of the chunk at `coordinate`.
    pub fn buffers(&self, coordinate: ChunkCoordinate) -> Option<&GpuChunkBuffers> {
        self.buffers.get(&coordinate)
    }

    fn create_buffers(
        &self,
        coordinate: ChunkCoordinate,
        mesh: &ChunkMesh,
    ) -> anyhow::Result<GpuChunkBuffers> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("chunk {coordinate} vertices")),
                contents: mesh.vertex_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("chunk {coordinate} indices")),
                contents: mesh.index_bytes(),
                usage: wgpu::BufferUsages::INDEX,
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            vertex_buffer.destroy();
            index_buffer.destroy();
            return Err(anyhow!("GPU allocation failed for chunk {coordinate}: {error}"));
        }

        Ok(GpuChunkBuffers {
            vertex_buffer,
            index_buffer,
            element_count: mesh.element_count() as u32,
        })
    }
}

impl ChunkBufferStore for WgpuBufferStore {
    fn upload(&mut self, coordinate: ChunkCoordinate, mesh: &ChunkMesh) -> anyhow::Result<()> {
        if mesh.is_empty() {
            self.release(coordinate);
            return Ok(());
        }

        let buffers = self.create_buffers(coordinate, mesh)?;
        let new_bytes = buffers.byte_len();
        let replaced = self.buffers.insert(coordinate, buffers).map(|old| {
            let bytes = old.byte_len();
            old.destroy();
            bytes
        });
        self.stats.record_upload(replaced, new_bytes);
        debug!("Uploaded {} bytes for chunk {}", new_bytes, coordinate);
        Ok(())
    }

    fn release(&mut self, coordinate: ChunkCoordinate) {
        let released = self.buffers.remove(&coordinate).map(|old| {
            let bytes = old.byte_len();
            old.destroy();
            bytes
        });
        self.stats.record_release(released);
    }

    fn stats(&self) -> BufferStats {
        self.stats
    }
}
