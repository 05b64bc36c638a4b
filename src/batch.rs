//! Triangle batch accumulation, deduplication, and the finalize/draw
//! lifecycle.
//!
//! [`TriangleBatch`] lets a caller submit triangles one at a time without
//! worrying about vertex sharing. Each incoming vertex is compared against
//! recently stored unique vertices under a component-wise tolerance
//! (geometry generators routinely produce bit-distinct floats for what is
//! conceptually the same shared vertex); a match reuses the existing index,
//! anything else is appended. [`TriangleBatch::end`] computes the bounding
//! sphere, uploads the packed arrays into GPU buffers, and releases the
//! host-side scratch storage — after that the batch can only be drawn or
//! saved.

use std::sync::Arc;

use nalgebra::Vector3;

use crate::backend::{GpuBackend, GpuBuffer, GpuVertexArray, VertexArrayDescriptor};
use crate::error::BatchError;
use crate::layout::VertexLayout;
use crate::types::{align_buffer_size, BufferDescriptor, BufferUsage, IndexFormat};

/// Lifecycle phase of a [`TriangleBatch`].
///
/// The transition is one-way: a finalized batch never returns to building
/// (although [`TriangleBatch::begin_mesh`] starts a fresh mesh on the same
/// instance, releasing everything the previous one held).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchState {
    /// Accumulating triangles; host scratch storage is live.
    Building,
    /// Uploaded to the GPU; host scratch storage has been released.
    Finalized,
}

/// Host-side scratch storage, live only while building.
///
/// The four arrays share one capacity: in the worst case every vertex is
/// unique and every triangle contributes three indices. `normals` and
/// `texcoords`, when present, run parallel to `verts`.
#[derive(Debug)]
pub(crate) struct HostArrays {
    pub(crate) verts: Vec<[f32; 3]>,
    pub(crate) normals: Option<Vec<[f32; 3]>>,
    pub(crate) texcoords: Option<Vec<[f32; 2]>>,
    pub(crate) indexes: Vec<u16>,
}

impl HostArrays {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            verts: Vec::with_capacity(capacity),
            normals: Some(Vec::with_capacity(capacity)),
            texcoords: Some(Vec::with_capacity(capacity)),
            indexes: Vec::with_capacity(capacity),
        }
    }

    /// Does stored vertex `i` match the incoming vertex under `epsilon`?
    ///
    /// Every attribute the batch still tracks participates; attributes the
    /// batch has dropped are ignored even when the caller supplies them.
    fn matches(
        &self,
        i: usize,
        vert: &[f32; 3],
        normal: Option<&[f32; 3]>,
        texcoord: Option<&[f32; 2]>,
        epsilon: f32,
    ) -> bool {
        if !close_enough(&self.verts[i], vert, epsilon) {
            return false;
        }
        if let (Some(stored), Some(normal)) = (&self.normals, normal) {
            if !close_enough(&stored[i], normal, epsilon) {
                return false;
            }
        }
        if let (Some(stored), Some(texcoord)) = (&self.texcoords, texcoord) {
            if !close_enough(&stored[i], texcoord, epsilon) {
                return false;
            }
        }
        true
    }
}

/// GPU-side resources, live only once finalized.
pub(crate) struct GpuMesh {
    pub(crate) vertex_buffer: GpuBuffer,
    pub(crate) normal_buffer: Option<GpuBuffer>,
    pub(crate) texcoord_buffer: Option<GpuBuffer>,
    pub(crate) index_buffer: GpuBuffer,
    pub(crate) vertex_array: GpuVertexArray,
}

impl GpuMesh {
    /// Upload packed arrays into fresh GPU buffers and bind them into a
    /// vertex array at the fixed attribute slots.
    pub(crate) fn upload(
        backend: &dyn GpuBackend,
        verts: &[[f32; 3]],
        normals: Option<&[[f32; 3]]>,
        texcoords: Option<&[[f32; 2]]>,
        indexes: &[u16],
    ) -> Result<Self, BatchError> {
        let layout = VertexLayout::for_attributes(normals.is_some(), texcoords.is_some());

        let vertex_buffer = upload_buffer(
            backend,
            "batch vertices",
            BufferUsage::VERTEX,
            bytemuck::cast_slice(verts),
        )?;
        let normal_buffer = match normals {
            Some(normals) => Some(upload_buffer(
                backend,
                "batch normals",
                BufferUsage::VERTEX,
                bytemuck::cast_slice(normals),
            )?),
            None => None,
        };
        let texcoord_buffer = match texcoords {
            Some(texcoords) => Some(upload_buffer(
                backend,
                "batch texcoords",
                BufferUsage::VERTEX,
                bytemuck::cast_slice(texcoords),
            )?),
            None => None,
        };
        let index_buffer = upload_buffer(
            backend,
            "batch indexes",
            BufferUsage::INDEX,
            bytemuck::cast_slice(indexes),
        )?;

        let mut vertex_buffers = vec![vertex_buffer.clone()];
        vertex_buffers.extend(normal_buffer.clone());
        vertex_buffers.extend(texcoord_buffer.clone());

        let vertex_array = backend.create_vertex_array(&VertexArrayDescriptor {
            label: Some("triangle batch".into()),
            layout,
            vertex_buffers,
            index_buffer: index_buffer.clone(),
            index_format: IndexFormat::Uint16,
        })?;

        Ok(Self {
            vertex_buffer,
            normal_buffer,
            texcoord_buffer,
            index_buffer,
            vertex_array,
        })
    }
}

/// A mesh batch: deduplicated vertex/attribute/index data, building or
/// finalized.
///
/// A batch is exclusively owned by its creator; all calls on one batch
/// must be serialized by the caller, as must access to the underlying
/// graphics context. Dropping a batch releases whichever side is live —
/// host scratch while building, GPU handles once finalized — exactly once.
///
/// # Example
///
/// ```ignore
/// let mut batch = TriangleBatch::new(backend);
/// batch.begin_mesh(600);
/// for tri in triangles {
///     batch.add_triangle(tri.positions, Some(tri.normals), None, 1e-5, 64)?;
/// }
/// let radius = batch.end()?;
/// batch.draw()?;
/// ```
pub struct TriangleBatch {
    pub(crate) backend: Arc<dyn GpuBackend>,
    pub(crate) state: BatchState,
    pub(crate) max_indexes: u32,
    pub(crate) num_verts: u32,
    pub(crate) num_indexes: u32,
    pub(crate) bounding_sphere_radius: f32,
    pub(crate) host: Option<HostArrays>,
    pub(crate) gpu: Option<GpuMesh>,
}

impl TriangleBatch {
    /// Create an empty batch on the given backend.
    ///
    /// The fresh batch is building with zero capacity, so every
    /// `add_triangle` fails until [`begin_mesh`](Self::begin_mesh) is
    /// called.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            backend,
            state: BatchState::Building,
            max_indexes: 0,
            num_verts: 0,
            num_indexes: 0,
            bounding_sphere_radius: 0.0,
            host: Some(HostArrays::with_capacity(0)),
            gpu: None,
        }
    }

    /// Start assembling a mesh with capacity for `max_verts` entries.
    ///
    /// The capacity is shared by the vertex, normal, texcoord, and index
    /// arrays. Calling this on an already-used instance releases the prior
    /// scratch storage and GPU resources first. Indices are 16-bit, so
    /// `max_verts` must not exceed 65 536.
    pub fn begin_mesh(&mut self, max_verts: u32) {
        debug_assert!(
            max_verts <= u32::from(u16::MAX) + 1,
            "max_verts exceeds the u16 index range"
        );
        self.host = Some(HostArrays::with_capacity(max_verts as usize));
        self.gpu = None;
        self.state = BatchState::Building;
        self.max_indexes = max_verts;
        self.num_verts = 0;
        self.num_indexes = 0;
        self.bounding_sphere_radius = 0.0;
    }

    /// Add one triangle, reusing stored vertices that match within
    /// `epsilon`.
    ///
    /// Supplied normals are normalized to unit length before comparison
    /// and storage. The first call that omits normals (or texcoords)
    /// disables that attribute for the whole batch, discarding anything
    /// stored so far; later calls cannot re-enable it.
    ///
    /// `search_window` bounds the number of most-recently-added unique
    /// vertices scanned for a match: a small window keeps insertion cheap
    /// at the cost of missing matches far back in insertion order, and a
    /// window of at least [`num_verts`](Self::num_verts) searches
    /// everything. Within the window the lowest-index match wins.
    ///
    /// # Errors
    ///
    /// [`BatchError::InvalidState`] after [`end`](Self::end), and
    /// [`BatchError::CapacityExceeded`] when three more indices would not
    /// fit — in both cases the batch is left unchanged.
    pub fn add_triangle(
        &mut self,
        verts: [[f32; 3]; 3],
        normals: Option<[[f32; 3]; 3]>,
        texcoords: Option<[[f32; 2]; 3]>,
        epsilon: f32,
        search_window: u32,
    ) -> Result<(), BatchError> {
        let state = self.state;
        let max_indexes = self.max_indexes;
        let host = match (state, self.host.as_mut()) {
            (BatchState::Building, Some(host)) => host,
            _ => {
                return Err(BatchError::InvalidState {
                    operation: "add_triangle",
                    state,
                })
            }
        };
        // Room for three indices implies room for three vertices: every
        // appended vertex also appends an index and num_verts never
        // exceeds num_indexes.
        if self.num_indexes + 3 > max_indexes {
            return Err(BatchError::CapacityExceeded {
                capacity: max_indexes,
            });
        }

        let normals = normals.map(|ns| ns.map(normalized));

        // The first absent input disables the attribute for the whole
        // batch, retroactively.
        if normals.is_none() && host.normals.is_some() {
            log::debug!("triangle without normals: dropping normals for the whole batch");
            host.normals = None;
        }
        if texcoords.is_none() && host.texcoords.is_some() {
            log::debug!("triangle without texcoords: dropping texcoords for the whole batch");
            host.texcoords = None;
        }

        // The window start is fixed here; the scan end still grows as
        // vertices from this same triangle are appended.
        let search_start = host.verts.len().saturating_sub(search_window as usize);

        for corner in 0..3 {
            let normal = normals.as_ref().map(|ns| ns[corner]);
            let texcoord = texcoords.as_ref().map(|ts| ts[corner]);

            let found = (search_start..host.verts.len()).find(|&i| {
                host.matches(i, &verts[corner], normal.as_ref(), texcoord.as_ref(), epsilon)
            });

            match found {
                Some(i) => host.indexes.push(i as u16),
                None => {
                    host.verts.push(verts[corner]);
                    if let (Some(stored), Some(normal)) = (host.normals.as_mut(), normal) {
                        stored.push(normal);
                    }
                    if let (Some(stored), Some(texcoord)) = (host.texcoords.as_mut(), texcoord) {
                        stored.push(texcoord);
                    }
                    host.indexes.push((host.verts.len() - 1) as u16);
                }
            }
        }

        if let Some(stored) = &host.normals {
            debug_assert_eq!(stored.len(), host.verts.len());
        }
        if let Some(stored) = &host.texcoords {
            debug_assert_eq!(stored.len(), host.verts.len());
        }

        self.num_verts = host.verts.len() as u32;
        self.num_indexes = host.indexes.len() as u32;
        debug_assert!(self.num_verts <= self.num_indexes && self.num_indexes <= self.max_indexes);
        Ok(())
    }

    /// Finalize the batch: compute the bounding sphere, upload every array
    /// into GPU buffers, and release the host scratch storage.
    ///
    /// Returns the bounding-sphere radius — the radius of the smallest
    /// origin-centered sphere enclosing the unique vertices (positions are
    /// assumed to be in a model-local frame centered near the origin).
    ///
    /// This transition is one-way; a second `end` is an
    /// [`BatchError::InvalidState`] error rather than a re-upload.
    pub fn end(&mut self) -> Result<f32, BatchError> {
        let state = self.state;
        let host = match (state, self.host.as_ref()) {
            (BatchState::Building, Some(host)) => host,
            _ => {
                return Err(BatchError::InvalidState {
                    operation: "end",
                    state,
                })
            }
        };

        let mut radius_sq = 0.0f32;
        for vert in &host.verts {
            radius_sq = radius_sq.max(Vector3::from(*vert).norm_squared());
        }
        let radius = radius_sq.sqrt();

        let gpu = GpuMesh::upload(
            &*self.backend,
            &host.verts,
            host.normals.as_deref(),
            host.texcoords.as_deref(),
            &host.indexes,
        )?;

        self.gpu = Some(gpu);
        self.host = None;
        self.bounding_sphere_radius = radius;
        self.state = BatchState::Finalized;
        log::debug!(
            "finalized batch: {} unique verts, {} indexes, radius {}",
            self.num_verts,
            self.num_indexes,
            radius
        );
        Ok(radius)
    }

    /// Submit one indexed triangle-list draw covering the whole batch.
    ///
    /// Drawing an empty finalized batch is a no-op; drawing before
    /// [`end`](Self::end) is an [`BatchError::InvalidState`] error.
    pub fn draw(&self) -> Result<(), BatchError> {
        let gpu = match (self.state, self.gpu.as_ref()) {
            (BatchState::Finalized, Some(gpu)) => gpu,
            _ => {
                return Err(BatchError::InvalidState {
                    operation: "draw",
                    state: self.state,
                })
            }
        };
        if self.num_indexes == 0 {
            return Ok(());
        }
        self.backend.draw_indexed(&gpu.vertex_array, self.num_indexes)
    }

    /// Get the lifecycle state.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Get the number of unique vertices.
    pub fn num_verts(&self) -> u32 {
        self.num_verts
    }

    /// Get the number of indices (three per triangle).
    pub fn num_indexes(&self) -> u32 {
        self.num_indexes
    }

    /// Get the index capacity fixed by [`begin_mesh`](Self::begin_mesh).
    pub fn max_indexes(&self) -> u32 {
        self.max_indexes
    }

    /// Get the bounding-sphere radius. Meaningful only once finalized.
    pub fn bounding_sphere_radius(&self) -> f32 {
        self.bounding_sphere_radius
    }

    /// Whether the batch currently tracks normals.
    pub fn has_normals(&self) -> bool {
        match self.state {
            BatchState::Building => self.host.as_ref().is_some_and(|h| h.normals.is_some()),
            BatchState::Finalized => self.gpu.as_ref().is_some_and(|g| g.normal_buffer.is_some()),
        }
    }

    /// Whether the batch currently tracks texture coordinates.
    pub fn has_texcoords(&self) -> bool {
        match self.state {
            BatchState::Building => self.host.as_ref().is_some_and(|h| h.texcoords.is_some()),
            BatchState::Finalized => self
                .gpu
                .as_ref()
                .is_some_and(|g| g.texcoord_buffer.is_some()),
        }
    }

    /// Get the backend this batch uploads to.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }
}

impl std::fmt::Debug for TriangleBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriangleBatch")
            .field("state", &self.state)
            .field("num_verts", &self.num_verts)
            .field("num_indexes", &self.num_indexes)
            .field("max_indexes", &self.max_indexes)
            .field("has_normals", &self.has_normals())
            .field("has_texcoords", &self.has_texcoords())
            .finish()
    }
}

// Batches can migrate between threads as long as each is used from one
// thread at a time.
static_assertions::assert_impl_all!(TriangleBatch: Send, Sync);

/// Create a buffer padded to the copy alignment and write `bytes` into it.
pub(crate) fn upload_buffer(
    backend: &dyn GpuBackend,
    label: &str,
    usage: BufferUsage,
    bytes: &[u8],
) -> Result<GpuBuffer, BatchError> {
    let size = align_buffer_size(bytes.len() as u64);
    let buffer = backend.create_buffer(
        &BufferDescriptor::new(size, usage | BufferUsage::COPY_DST | BufferUsage::COPY_SRC)
            .with_label(label),
    )?;
    if size as usize == bytes.len() {
        backend.write_buffer(&buffer, 0, bytes)?;
    } else {
        let mut padded = bytes.to_vec();
        padded.resize(size as usize, 0);
        backend.write_buffer(&buffer, 0, &padded)?;
    }
    Ok(buffer)
}

/// Component-wise approximate equality; the tolerance is inclusive.
fn close_enough<const N: usize>(a: &[f32; N], b: &[f32; N], epsilon: f32) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= epsilon)
}

fn normalized(v: [f32; 3]) -> [f32; 3] {
    Vector3::from(v).normalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    const EPS: f32 = 1e-5;

    fn batch_with_backend() -> (Arc<DummyBackend>, TriangleBatch) {
        let backend = Arc::new(DummyBackend::new());
        let batch = TriangleBatch::new(backend.clone());
        (backend, batch)
    }

    fn quad_triangles() -> [[[f32; 3]; 3]; 2] {
        [
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        ]
    }

    #[test]
    fn test_shared_edge_dedup() {
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(6);
        for tri in quad_triangles() {
            batch.add_triangle(tri, None, None, EPS, 32).unwrap();
        }
        assert_eq!(batch.num_verts(), 4);
        assert_eq!(batch.num_indexes(), 6);
        let host = batch.host.as_ref().unwrap();
        assert_eq!(host.indexes, [0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn test_normals_normalized_before_storage() {
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(3);
        batch
            .add_triangle(
                [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                Some([[0.0, 0.0, 2.0], [0.0, 2.0, 0.0], [2.0, 0.0, 0.0]]),
                None,
                EPS,
                32,
            )
            .unwrap();

        let host = batch.host.as_ref().unwrap();
        let normals = host.normals.as_ref().unwrap();
        assert_eq!(normals.len(), 3);
        for normal in normals {
            let len = Vector3::from(*normal).norm();
            assert!((len - 1.0).abs() <= 1e-6, "normal length {len}");
        }
    }

    #[test]
    fn test_epsilon_match_is_inclusive() {
        let eps = 0.1f32;
        let base = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

        // A vertex exactly epsilon away folds into the stored one.
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(12);
        batch.add_triangle(base, None, None, eps, 32).unwrap();
        batch
            .add_triangle(
                [[eps, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                None,
                None,
                eps,
                32,
            )
            .unwrap();
        assert_eq!(batch.num_verts(), 3);

        // Slightly beyond epsilon it stays distinct.
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(12);
        batch.add_triangle(base, None, None, eps, 32).unwrap();
        batch
            .add_triangle(
                [[eps + 0.01, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                None,
                None,
                eps,
                32,
            )
            .unwrap();
        assert_eq!(batch.num_verts(), 4);
    }

    #[test]
    fn test_first_absent_normal_disables_retroactively() {
        let [tri_a, tri_b] = quad_triangles();
        let normals = [[0.0, 0.0, 1.0]; 3];

        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(12);
        batch.add_triangle(tri_a, Some(normals), None, EPS, 32).unwrap();
        assert!(batch.has_normals());

        // One triangle without normals discards everything stored so far.
        batch.add_triangle(tri_b, None, None, EPS, 32).unwrap();
        assert!(!batch.has_normals());
        assert!(batch.host.as_ref().unwrap().normals.is_none());

        // Supplying normals again does not re-enable the attribute.
        batch
            .add_triangle(
                [[5.0, 0.0, 0.0], [6.0, 0.0, 0.0], [5.0, 1.0, 0.0]],
                Some(normals),
                None,
                EPS,
                32,
            )
            .unwrap();
        assert!(!batch.has_normals());
    }

    #[test]
    fn test_texcoords_participate_in_matching() {
        let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let uv_a = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        // Same positions, different texcoords: all six vertices distinct.
        let uv_b = [[0.5, 0.5], [0.6, 0.5], [0.5, 0.6]];

        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(12);
        batch.add_triangle(tri, None, Some(uv_a), EPS, 32).unwrap();
        batch.add_triangle(tri, None, Some(uv_b), EPS, 32).unwrap();
        assert_eq!(batch.num_verts(), 6);

        // With identical texcoords they fold.
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(12);
        batch.add_triangle(tri, None, Some(uv_a), EPS, 32).unwrap();
        batch.add_triangle(tri, None, Some(uv_a), EPS, 32).unwrap();
        assert_eq!(batch.num_verts(), 3);
    }

    #[test]
    fn test_search_window_limits_matching() {
        let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

        // Window 0 never matches: every corner is stored again.
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(12);
        batch.add_triangle(tri, None, None, EPS, 0).unwrap();
        batch.add_triangle(tri, None, None, EPS, 0).unwrap();
        assert_eq!(batch.num_verts(), 6);

        // A window covering everything folds the repeat completely.
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(12);
        batch.add_triangle(tri, None, None, EPS, 32).unwrap();
        batch.add_triangle(tri, None, None, EPS, 32).unwrap();
        assert_eq!(batch.num_verts(), 3);
    }

    #[test]
    fn test_capacity_exceeded_leaves_counts_unchanged() {
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(6);
        for tri in quad_triangles() {
            batch.add_triangle(tri, None, None, EPS, 32).unwrap();
        }
        assert_eq!(batch.num_indexes(), 6);

        let result = batch.add_triangle(
            [[9.0, 0.0, 0.0], [10.0, 0.0, 0.0], [9.0, 1.0, 0.0]],
            None,
            None,
            EPS,
            32,
        );
        assert!(matches!(
            result,
            Err(BatchError::CapacityExceeded { capacity: 6 })
        ));
        assert_eq!(batch.num_verts(), 4);
        assert_eq!(batch.num_indexes(), 6);
    }

    #[test]
    fn test_add_before_begin_fails_on_capacity() {
        let (_, mut batch) = batch_with_backend();
        let result = batch.add_triangle(quad_triangles()[0], None, None, EPS, 32);
        assert!(matches!(
            result,
            Err(BatchError::CapacityExceeded { capacity: 0 })
        ));
    }

    #[test]
    fn test_lifecycle_errors() {
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(6);
        batch
            .add_triangle(quad_triangles()[0], None, None, EPS, 32)
            .unwrap();

        assert!(matches!(
            batch.draw(),
            Err(BatchError::InvalidState {
                operation: "draw",
                state: BatchState::Building,
            })
        ));

        batch.end().unwrap();

        assert!(matches!(
            batch.add_triangle(quad_triangles()[1], None, None, EPS, 32),
            Err(BatchError::InvalidState {
                operation: "add_triangle",
                ..
            })
        ));
        assert!(matches!(
            batch.end(),
            Err(BatchError::InvalidState { operation: "end", .. })
        ));
    }

    #[test]
    fn test_end_computes_bounding_sphere() {
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(3);
        batch
            .add_triangle(
                [[3.0, 4.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                None,
                None,
                EPS,
                32,
            )
            .unwrap();
        let radius = batch.end().unwrap();
        assert!((radius - 5.0).abs() <= 1e-6);
        assert_eq!(batch.bounding_sphere_radius(), radius);
        assert_eq!(batch.state(), BatchState::Finalized);
        assert!(batch.host.is_none());
    }

    #[test]
    fn test_draw_submits_through_backend() {
        let (backend, mut batch) = batch_with_backend();
        batch.begin_mesh(6);
        for tri in quad_triangles() {
            batch.add_triangle(tri, None, None, EPS, 32).unwrap();
        }
        batch.end().unwrap();
        batch.draw().unwrap();
        batch.draw().unwrap();
        assert_eq!(backend.draws_submitted(), 2);
        assert_eq!(backend.indices_drawn(), 12);
    }

    #[test]
    fn test_draw_empty_batch_is_noop() {
        let (backend, mut batch) = batch_with_backend();
        batch.begin_mesh(0);
        batch.end().unwrap();
        batch.draw().unwrap();
        assert_eq!(backend.draws_submitted(), 0);
    }

    #[test]
    fn test_begin_mesh_resets_a_finalized_batch() {
        let (_, mut batch) = batch_with_backend();
        batch.begin_mesh(6);
        batch
            .add_triangle(quad_triangles()[0], None, None, EPS, 32)
            .unwrap();
        batch.end().unwrap();

        batch.begin_mesh(6);
        assert_eq!(batch.state(), BatchState::Building);
        assert_eq!(batch.num_verts(), 0);
        assert_eq!(batch.num_indexes(), 0);
        assert_eq!(batch.bounding_sphere_radius(), 0.0);
        batch
            .add_triangle(quad_triangles()[0], None, None, EPS, 32)
            .unwrap();
        assert_eq!(batch.num_verts(), 3);
    }
}
