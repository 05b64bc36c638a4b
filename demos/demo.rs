//! Build a deduplicated cube batch, draw it, and round-trip it through the
//! binary mesh format.
//!
//! Run with:
//!   cargo run --example demo
//!   RUST_LOG=debug cargo run --example demo

use std::io::Cursor;

use tribatch::{backend, TriangleBatch};

/// One cube face: four corners (counter-clockwise) and the outward normal.
struct Face {
    corners: [[f32; 3]; 4],
    normal: [f32; 3],
}

fn cube_faces() -> [Face; 6] {
    let p = |x: f32, y: f32, z: f32| [x, y, z];
    [
        Face {
            corners: [p(-1.0, -1.0, 1.0), p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0), p(-1.0, 1.0, 1.0)],
            normal: [0.0, 0.0, 1.0],
        },
        Face {
            corners: [p(1.0, -1.0, -1.0), p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0)],
            normal: [0.0, 0.0, -1.0],
        },
        Face {
            corners: [p(1.0, -1.0, 1.0), p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0)],
            normal: [1.0, 0.0, 0.0],
        },
        Face {
            corners: [p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0), p(-1.0, 1.0, -1.0)],
            normal: [-1.0, 0.0, 0.0],
        },
        Face {
            corners: [p(-1.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, -1.0), p(-1.0, 1.0, -1.0)],
            normal: [0.0, 1.0, 0.0],
        },
        Face {
            corners: [p(-1.0, -1.0, -1.0), p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(-1.0, -1.0, 1.0)],
            normal: [0.0, -1.0, 0.0],
        },
    ]
}

fn main() -> Result<(), tribatch::BatchError> {
    env_logger::init();
    tribatch::init();

    let backend = backend::create_backend();
    log::info!("backend: {}", backend.name());

    let mut batch = TriangleBatch::new(backend.clone());
    batch.begin_mesh(36);

    for face in cube_faces() {
        let [a, b, c, d] = face.corners;
        let normals = [face.normal; 3];
        batch.add_triangle([a, b, c], Some(normals), None, 1e-5, 64)?;
        batch.add_triangle([a, c, d], Some(normals), None, 1e-5, 64)?;
    }

    // Corners are shared within a face but not across faces (the normals
    // differ), so the cube dedups to 24 unique vertices.
    log::info!(
        "cube accumulated: {} unique verts, {} indexes",
        batch.num_verts(),
        batch.num_indexes()
    );

    let radius = batch.end()?;
    log::info!("finalized, bounding sphere radius {radius:.3}");
    batch.draw()?;

    // Round-trip through the binary mesh format and draw the reloaded copy.
    let mut bytes = Vec::new();
    batch.save_mesh(&mut bytes)?;
    log::info!("saved mesh: {} bytes", bytes.len());

    let mut reloaded = TriangleBatch::new(backend);
    reloaded.load_mesh(&mut Cursor::new(bytes), true, false)?;
    reloaded.draw()?;
    log::info!(
        "reloaded and drew: {} verts, {} indexes",
        reloaded.num_verts(),
        reloaded.num_indexes()
    );

    Ok(())
}
