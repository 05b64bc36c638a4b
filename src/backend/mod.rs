//! GPU backend abstraction layer.
//!
//! The batch drives the GPU through the [`GpuBackend`] trait: buffer
//! creation and transfer, vertex-array binding, and indexed draw
//! submission. Everything else (windowing, shaders, scene management) is
//! out of scope for this crate.
//!
//! # Available Backends
//!
//! - [`DummyBackend`] (always available): buffers are host allocations,
//!   draws are counted. Used for tests and platforms without a GPU.
//! - `wgpu-backend` feature: headless backend using wgpu.

pub mod dummy;

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

use std::sync::{Arc, Mutex};

use crate::error::BatchError;
use crate::layout::VertexLayout;
use crate::types::{BufferDescriptor, IndexFormat};

pub use dummy::DummyBackend;

/// Handle to a GPU buffer resource.
pub enum GpuBuffer {
    /// Dummy backend: the "GPU" copy lives in host memory.
    Dummy(Arc<Mutex<Vec<u8>>>),
    /// wgpu backend buffer.
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Buffer>),
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy(data) => {
                let len = data.lock().map(|d| d.len()).unwrap_or(0);
                f.debug_tuple("GpuBuffer::Dummy").field(&len).finish()
            }
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => f.debug_tuple("GpuBuffer::Wgpu").field(buffer).finish(),
        }
    }
}

impl Clone for GpuBuffer {
    fn clone(&self) -> Self {
        match self {
            Self::Dummy(data) => Self::Dummy(data.clone()),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => Self::Wgpu(buffer.clone()),
        }
    }
}

/// Handle to a configured vertex input binding: the set of attribute
/// buffers, the index buffer, and the layout tying them to shader slots.
pub enum GpuVertexArray {
    /// Dummy backend (no GPU state).
    Dummy,
    /// wgpu backend binding.
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        /// One buffer per layout attribute, in binding order.
        vertex_buffers: Vec<Arc<wgpu::Buffer>>,
        /// The index buffer.
        index_buffer: Arc<wgpu::Buffer>,
        /// Format of the indices.
        index_format: IndexFormat,
        /// Attribute layout used to select a pipeline.
        layout: VertexLayout,
    },
}

impl std::fmt::Debug for GpuVertexArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuVertexArray::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu {
                vertex_buffers,
                layout,
                ..
            } => f
                .debug_struct("GpuVertexArray::Wgpu")
                .field("vertex_buffers", &vertex_buffers.len())
                .field("layout", layout)
                .finish_non_exhaustive(),
        }
    }
}

/// Descriptor for creating a vertex array.
#[derive(Debug)]
pub struct VertexArrayDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Attribute layout; `vertex_buffers` must match it in count and order.
    pub layout: VertexLayout,
    /// One buffer per layout attribute, in binding order.
    pub vertex_buffers: Vec<GpuBuffer>,
    /// The index buffer.
    pub index_buffer: GpuBuffer,
    /// Format of the indices.
    pub index_format: IndexFormat,
}

/// GPU backend trait for abstracting different GPU APIs.
///
/// All operations are synchronous and must be called from a thread that
/// may own the graphics context; the trait itself is `Send + Sync` so a
/// single backend can serve many batches.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a buffer resource.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, BatchError>;

    /// Write data into a buffer at `offset`.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8])
        -> Result<(), BatchError>;

    /// Blocking read-back of a buffer range.
    ///
    /// `offset` and `size` must be multiples of
    /// [`COPY_ALIGNMENT`](crate::types::COPY_ALIGNMENT).
    fn read_buffer(&self, buffer: &GpuBuffer, offset: u64, size: u64)
        -> Result<Vec<u8>, BatchError>;

    /// Bind a set of attribute buffers plus an index buffer into a vertex
    /// array at the fixed attribute slots.
    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor,
    ) -> Result<GpuVertexArray, BatchError>;

    /// Submit one indexed triangle-list draw covering `index_count` indices.
    fn draw_indexed(
        &self,
        vertex_array: &GpuVertexArray,
        index_count: u32,
    ) -> Result<(), BatchError>;
}

/// Select and create the appropriate backend based on available features.
///
/// Tries the wgpu backend when the `wgpu-backend` feature is enabled and a
/// device is available, and falls back to the dummy backend otherwise.
pub fn create_backend() -> Arc<dyn GpuBackend> {
    #[cfg(feature = "wgpu-backend")]
    {
        match wgpu_backend::WgpuBackend::new() {
            Ok(backend) => {
                log::info!("using wgpu backend");
                return Arc::new(backend);
            }
            Err(e) => {
                log::warn!("failed to create wgpu backend: {e}");
            }
        }
    }

    log::info!("using dummy backend");
    Arc::new(dummy::DummyBackend::new())
}
