//! Binary persistence for finalized batches.
//!
//! The format is a raw, native-endian mirror of the in-memory arrays with
//! no magic number and no version field:
//!
//! ```text
//! [u32 index_count][u32 vertex_count][f32 bounding_sphere_radius]
//! [index_count  x u16    indices]
//! [vertex_count x 3xf32  positions]
//! [vertex_count x 3xf32  normals]    (only when saved with normals)
//! [vertex_count x 2xf32  texcoords]  (only when saved with texcoords)
//! ```
//!
//! Presence of the two trailing sections is not recorded in the file; the
//! loader is told what to probe for. A failed read of a trailing section
//! is tolerated and simply disables that attribute, which lets archives of
//! multiple meshes be probed by length. Loading skips the deduplication
//! pass entirely, since the file already stores post-dedup data.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::batch::{BatchState, GpuMesh, TriangleBatch};
use crate::error::BatchError;
use crate::types::align_buffer_size;

impl TriangleBatch {
    /// Write the finalized batch to `writer`.
    ///
    /// The arrays are read back from their GPU buffers, so the batch must
    /// be finalized; saving while still building is an
    /// [`BatchError::InvalidState`] error. Any write failure is an
    /// [`BatchError::Io`].
    pub fn save_mesh<W: Write>(&self, writer: &mut W) -> Result<(), BatchError> {
        let gpu = match (self.state, self.gpu.as_ref()) {
            (BatchState::Finalized, Some(gpu)) => gpu,
            _ => {
                return Err(BatchError::InvalidState {
                    operation: "save_mesh",
                    state: self.state,
                })
            }
        };

        writer.write_all(bytemuck::bytes_of(&self.num_indexes))?;
        writer.write_all(bytemuck::bytes_of(&self.num_verts))?;
        writer.write_all(bytemuck::bytes_of(&self.bounding_sphere_radius))?;

        // Index bytes may need the copy-alignment padding stripped again.
        let index_bytes = self.num_indexes as usize * 2;
        let data = self
            .backend
            .read_buffer(&gpu.index_buffer, 0, align_buffer_size(index_bytes as u64))?;
        writer.write_all(&data[..index_bytes])?;

        let vertex_bytes = self.num_verts as usize * 12;
        let data = self
            .backend
            .read_buffer(&gpu.vertex_buffer, 0, vertex_bytes as u64)?;
        writer.write_all(&data[..vertex_bytes])?;

        if let Some(buffer) = &gpu.normal_buffer {
            let data = self.backend.read_buffer(buffer, 0, vertex_bytes as u64)?;
            writer.write_all(&data[..vertex_bytes])?;
        }
        if let Some(buffer) = &gpu.texcoord_buffer {
            let texcoord_bytes = self.num_verts as usize * 8;
            let data = self.backend.read_buffer(buffer, 0, texcoord_bytes as u64)?;
            writer.write_all(&data[..texcoord_bytes])?;
        }

        log::debug!(
            "saved batch: {} indexes, {} verts",
            self.num_indexes,
            self.num_verts
        );
        Ok(())
    }

    /// Read a mesh saved by [`save_mesh`](Self::save_mesh) and upload it
    /// straight to the GPU.
    ///
    /// `has_normals` and `has_texcoords` tell the loader which trailing
    /// sections to probe for. The batch comes out finalized regardless of
    /// its previous state; a failed load leaves it empty.
    ///
    /// # Errors
    ///
    /// [`BatchError::Io`] when a mandatory field cannot be read or holds an
    /// out-of-range index. A failed read of an *optional* trailing section
    /// is not an error: the attribute is disabled for this load.
    pub fn load_mesh<R: Read>(
        &mut self,
        reader: &mut R,
        has_normals: bool,
        has_texcoords: bool,
    ) -> Result<(), BatchError> {
        // Release whatever the batch held before touching the stream, so a
        // failed load leaves an empty building batch rather than stale data.
        self.begin_mesh(0);

        let num_indexes = read_u32(reader)?;
        let num_verts = read_u32(reader)?;
        let radius = read_f32(reader)?;

        let mut indexes = vec![0u16; num_indexes as usize];
        reader.read_exact(bytemuck::cast_slice_mut(&mut indexes))?;

        let mut verts = vec![[0f32; 3]; num_verts as usize];
        reader.read_exact(bytemuck::cast_slice_mut(&mut verts))?;

        if let Some(&bad) = indexes.iter().find(|&&i| u32::from(i) >= num_verts) {
            return Err(BatchError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("index {bad} out of range for {num_verts} vertices"),
            )));
        }

        let normals = if has_normals {
            read_optional::<[f32; 3], R>(reader, num_verts as usize, "normals")
        } else {
            None
        };
        let texcoords = if has_texcoords {
            read_optional::<[f32; 2], R>(reader, num_verts as usize, "texcoords")
        } else {
            None
        };

        let gpu = GpuMesh::upload(
            &*self.backend,
            &verts,
            normals.as_deref(),
            texcoords.as_deref(),
            &indexes,
        )?;

        self.gpu = Some(gpu);
        self.host = None;
        self.state = BatchState::Finalized;
        self.max_indexes = num_indexes;
        self.num_indexes = num_indexes;
        self.num_verts = num_verts;
        self.bounding_sphere_radius = radius;
        log::debug!(
            "loaded batch: {num_indexes} indexes, {num_verts} verts, radius {radius}"
        );
        Ok(())
    }

    /// Save to the file at `path`. See [`save_mesh`](Self::save_mesh).
    pub fn save_mesh_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), BatchError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_mesh(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Load from the file at `path`. See [`load_mesh`](Self::load_mesh).
    pub fn load_mesh_from_path<P: AsRef<Path>>(
        &mut self,
        path: P,
        has_normals: bool,
        has_texcoords: bool,
    ) -> Result<(), BatchError> {
        let mut reader = BufReader::new(File::open(path)?);
        self.load_mesh(&mut reader, has_normals, has_texcoords)
    }
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, BatchError> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_ne_bytes(bytes))
}

fn read_f32<R: Read>(reader: &mut R) -> Result<f32, BatchError> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(f32::from_ne_bytes(bytes))
}

/// Read an optional trailing array; any failure disables the section.
fn read_optional<T: bytemuck::Pod, R: Read>(
    reader: &mut R,
    count: usize,
    what: &str,
) -> Option<Vec<T>> {
    let mut data = vec![T::zeroed(); count];
    match reader.read_exact(bytemuck::cast_slice_mut(&mut data)) {
        Ok(()) => Some(data),
        Err(e) => {
            log::debug!("no {what} section in mesh stream ({e}); disabling {what}");
            None
        }
    }
}
