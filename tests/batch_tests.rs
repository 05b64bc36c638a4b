//! End-to-end tests for triangle batching.
//!
//! Everything runs against the dummy backend, which implements the full
//! backend contract (including buffer read-back, which the persistence
//! codec depends on) in host memory.

use std::io::Cursor;
use std::sync::Arc;

use rstest::rstest;

use tribatch::{BatchState, DummyBackend, TriangleBatch};

const EPS: f32 = 1e-5;

/// A strip of `quads` unit quads along the x axis, two triangles each.
/// Consecutive quads share an edge, so a full-window dedup stores
/// `2 * (quads + 1)` unique vertices.
fn strip_triangles(quads: usize) -> Vec<[[f32; 3]; 3]> {
    let mut triangles = Vec::new();
    for i in 0..quads {
        let x0 = i as f32;
        let x1 = x0 + 1.0;
        let a = [x0, 0.0, 0.0];
        let b = [x1, 0.0, 0.0];
        let c = [x0, 1.0, 0.0];
        let d = [x1, 1.0, 0.0];
        triangles.push([a, b, c]);
        triangles.push([b, d, c]);
    }
    triangles
}

#[test]
fn test_strip_dedup_full_window() {
    let quads = 8;
    let triangles = strip_triangles(quads);

    let mut batch = TriangleBatch::new(Arc::new(DummyBackend::new()));
    batch.begin_mesh((triangles.len() * 3) as u32);
    for tri in &triangles {
        batch.add_triangle(*tri, None, None, EPS, u32::MAX).unwrap();
    }

    assert_eq!(batch.num_verts(), 2 * (quads as u32 + 1));
    assert_eq!(batch.num_indexes(), triangles.len() as u32 * 3);
}

#[test]
fn test_narrower_window_never_reduces_unique_verts() {
    let triangles = strip_triangles(6);
    let windows = [0u32, 1, 2, 4, 8, 64];

    let mut counts = Vec::new();
    for &window in &windows {
        let mut batch = TriangleBatch::new(Arc::new(DummyBackend::new()));
        batch.begin_mesh((triangles.len() * 3) as u32);
        for tri in &triangles {
            batch.add_triangle(*tri, None, None, EPS, window).unwrap();
        }
        // Index count is independent of how well the dedup works.
        assert_eq!(batch.num_indexes(), triangles.len() as u32 * 3);
        counts.push(batch.num_verts());
    }

    for pair in counts.windows(2) {
        assert!(
            pair[0] >= pair[1],
            "widening the window increased the vertex count: {counts:?}"
        );
    }
    // The extremes are known exactly.
    assert_eq!(counts[0], triangles.len() as u32 * 3);
    assert_eq!(*counts.last().unwrap(), 14);
}

#[rstest]
#[case::inside_epsilon(0.1, 0.05, 3)]
#[case::exactly_epsilon(0.1, 0.1, 3)]
#[case::beyond_epsilon(0.1, 0.11, 4)]
fn test_epsilon_boundary(#[case] epsilon: f32, #[case] offset: f32, #[case] expected: u32) {
    let mut batch = TriangleBatch::new(Arc::new(DummyBackend::new()));
    batch.begin_mesh(6);
    batch
        .add_triangle(
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            None,
            epsilon,
            64,
        )
        .unwrap();
    batch
        .add_triangle(
            [[offset, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            None,
            epsilon,
            64,
        )
        .unwrap();
    assert_eq!(batch.num_verts(), expected);
}

#[rstest]
#[case::positions_only(false, false)]
#[case::with_normals(true, false)]
#[case::with_texcoords(false, true)]
#[case::full(true, true)]
fn test_save_load_roundtrip(#[case] normals: bool, #[case] texcoords: bool) {
    let triangles = strip_triangles(4);
    let normal = [[0.0, 0.0, 1.0]; 3];

    let backend = Arc::new(DummyBackend::new());
    let mut batch = TriangleBatch::new(backend.clone());
    batch.begin_mesh((triangles.len() * 3) as u32);
    for tri in &triangles {
        // Texcoords follow the position so shared corners still match.
        let uv = tri.map(|v| [v[0], v[1]]);
        batch
            .add_triangle(
                *tri,
                normals.then_some(normal),
                texcoords.then_some(uv),
                EPS,
                u32::MAX,
            )
            .unwrap();
    }
    let radius = batch.end().unwrap();

    let mut bytes = Vec::new();
    batch.save_mesh(&mut bytes).unwrap();

    let mut loaded = TriangleBatch::new(backend.clone());
    loaded
        .load_mesh(&mut Cursor::new(&bytes), normals, texcoords)
        .unwrap();

    assert_eq!(loaded.state(), BatchState::Finalized);
    assert_eq!(loaded.num_verts(), batch.num_verts());
    assert_eq!(loaded.num_indexes(), batch.num_indexes());
    assert!((loaded.bounding_sphere_radius() - radius).abs() <= 1e-6);
    assert_eq!(loaded.has_normals(), normals);
    assert_eq!(loaded.has_texcoords(), texcoords);

    // Saving the loaded batch reproduces the stream byte for byte, so the
    // arrays themselves survived the round trip unchanged.
    let mut again = Vec::new();
    loaded.save_mesh(&mut again).unwrap();
    assert_eq!(bytes, again);
}

#[test]
fn test_full_lifecycle_with_draws() {
    let backend = Arc::new(DummyBackend::new());
    let triangles = strip_triangles(2);

    let mut batch = TriangleBatch::new(backend.clone());
    batch.begin_mesh((triangles.len() * 3) as u32);
    for tri in &triangles {
        batch.add_triangle(*tri, None, None, EPS, 64).unwrap();
    }
    batch.end().unwrap();

    batch.draw().unwrap();
    batch.draw().unwrap();
    assert_eq!(backend.draws_submitted(), 2);
    assert_eq!(backend.indices_drawn(), 2 * batch.num_indexes() as u64);

    // Reload through the codec and keep drawing on the same backend.
    let mut bytes = Vec::new();
    batch.save_mesh(&mut bytes).unwrap();
    let mut loaded = TriangleBatch::new(backend.clone());
    loaded
        .load_mesh(&mut Cursor::new(&bytes), false, false)
        .unwrap();
    loaded.draw().unwrap();
    assert_eq!(backend.draws_submitted(), 3);
}

#[test]
fn test_index_count_is_three_per_triangle() {
    let mut batch = TriangleBatch::new(Arc::new(DummyBackend::new()));
    batch.begin_mesh(300);
    let mut added = 0u32;
    for tri in strip_triangles(50) {
        batch.add_triangle(tri, None, None, EPS, 16).unwrap();
        added += 1;
        assert_eq!(batch.num_indexes(), added * 3);
        assert!(batch.num_verts() <= batch.num_indexes());
    }
}
