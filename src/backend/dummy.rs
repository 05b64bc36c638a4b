//! Dummy GPU backend for testing and development.
//!
//! This backend performs no actual GPU work: buffers are plain host
//! allocations and draw submissions are counted. It provides a valid
//! implementation of the full backend contract (including read-back, which
//! the persistence codec depends on) without requiring GPU hardware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::BatchError;
use crate::types::BufferDescriptor;

use super::{GpuBackend, GpuBuffer, GpuVertexArray, VertexArrayDescriptor};

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    buffers_created: AtomicU64,
    draws_submitted: AtomicU64,
    indices_drawn: AtomicU64,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffers created so far.
    pub fn buffers_created(&self) -> u64 {
        self.buffers_created.load(Ordering::Relaxed)
    }

    /// Number of draw submissions so far.
    pub fn draws_submitted(&self) -> u64 {
        self.draws_submitted.load(Ordering::Relaxed)
    }

    /// Total indices covered by all draw submissions so far.
    pub fn indices_drawn(&self) -> u64 {
        self.indices_drawn.load(Ordering::Relaxed)
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, BatchError> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        self.buffers_created.fetch_add(1, Ordering::Relaxed);
        Ok(GpuBuffer::Dummy(Arc::new(Mutex::new(vec![
            0u8;
            descriptor.size as usize
        ]))))
    }

    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), BatchError> {
        match buffer {
            GpuBuffer::Dummy(storage) => {
                let mut storage = storage
                    .lock()
                    .map_err(|_| BatchError::Backend("buffer storage poisoned".into()))?;
                let start = offset as usize;
                let end = start + data.len();
                if end > storage.len() {
                    return Err(BatchError::Backend(format!(
                        "write of {} bytes at offset {} exceeds buffer size {}",
                        data.len(),
                        offset,
                        storage.len()
                    )));
                }
                storage[start..end].copy_from_slice(data);
                Ok(())
            }
            #[cfg(feature = "wgpu-backend")]
            GpuBuffer::Wgpu(_) => Err(BatchError::Backend(
                "buffer belongs to another backend".into(),
            )),
        }
    }

    fn read_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, BatchError> {
        match buffer {
            GpuBuffer::Dummy(storage) => {
                let storage = storage
                    .lock()
                    .map_err(|_| BatchError::Backend("buffer storage poisoned".into()))?;
                let start = offset as usize;
                let end = start + size as usize;
                if end > storage.len() {
                    return Err(BatchError::Backend(format!(
                        "read of {size} bytes at offset {offset} exceeds buffer size {}",
                        storage.len()
                    )));
                }
                Ok(storage[start..end].to_vec())
            }
            #[cfg(feature = "wgpu-backend")]
            GpuBuffer::Wgpu(_) => Err(BatchError::Backend(
                "buffer belongs to another backend".into(),
            )),
        }
    }

    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor,
    ) -> Result<GpuVertexArray, BatchError> {
        if descriptor.vertex_buffers.len() != descriptor.layout.buffer_count() {
            return Err(BatchError::Backend(format!(
                "vertex array has {} buffers but the layout expects {}",
                descriptor.vertex_buffers.len(),
                descriptor.layout.buffer_count()
            )));
        }
        log::trace!(
            "DummyBackend: creating vertex array {:?} ({} attribute buffers)",
            descriptor.label,
            descriptor.vertex_buffers.len()
        );
        Ok(GpuVertexArray::Dummy)
    }

    fn draw_indexed(
        &self,
        vertex_array: &GpuVertexArray,
        index_count: u32,
    ) -> Result<(), BatchError> {
        match vertex_array {
            GpuVertexArray::Dummy => {
                log::trace!("DummyBackend: drawing {index_count} indices");
                self.draws_submitted.fetch_add(1, Ordering::Relaxed);
                self.indices_drawn
                    .fetch_add(u64::from(index_count), Ordering::Relaxed);
                Ok(())
            }
            #[cfg(feature = "wgpu-backend")]
            GpuVertexArray::Wgpu { .. } => Err(BatchError::Backend(
                "vertex array belongs to another backend".into(),
            )),
        }
    }
}
