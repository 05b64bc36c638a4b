//! # tribatch
//!
//! Indexed triangle batching with incremental vertex deduplication.
//!
//! [`TriangleBatch`] lets a caller submit triangles one at a time as raw
//! position/normal/texcoord triples without worrying about vertex sharing:
//! vertices that match within a caller-supplied tolerance are folded into a
//! shared index instead of being stored twice. Finalizing a batch computes
//! its bounding sphere, uploads the packed arrays into GPU buffers through
//! a pluggable [`GpuBackend`], and releases the host-side scratch storage.
//! A finalized batch can be drawn, or saved to a flat binary format and
//! reloaded later without re-deduplicating.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tribatch::{DummyBackend, TriangleBatch};
//!
//! let backend = Arc::new(DummyBackend::new());
//! let mut batch = TriangleBatch::new(backend);
//! batch.begin_mesh(6);
//!
//! // Two triangles sharing an edge: four unique vertices, six indices.
//! batch.add_triangle(
//!     [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
//!     None,
//!     None,
//!     1e-5,
//!     32,
//! )?;
//! batch.add_triangle(
//!     [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
//!     None,
//!     None,
//!     1e-5,
//!     32,
//! )?;
//! assert_eq!(batch.num_verts(), 4);
//! assert_eq!(batch.num_indexes(), 6);
//!
//! let radius = batch.end()?;
//! assert!(radius > 1.0);
//! batch.draw()?;
//! # Ok::<(), tribatch::BatchError>(())
//! ```

pub mod backend;
pub mod batch;
mod codec;
pub mod error;
pub mod layout;
pub mod types;

// Re-export main types for convenience
pub use backend::{create_backend, DummyBackend, GpuBackend, GpuBuffer, GpuVertexArray};
pub use batch::{BatchState, TriangleBatch};
pub use error::BatchError;
pub use layout::{
    VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic, VertexLayout,
};
pub use types::{BufferDescriptor, BufferUsage, IndexFormat};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the batching subsystem.
///
/// Only logs the crate version; creating backends and batches does not
/// require it.
pub fn init() {
    log::info!("tribatch v{VERSION} initialized");
}
