use render_ngin::data_structures::geometry::{
    AttributeScope, Dims, Geometry, pack_normal, pack_uv, unpack_normal, unpack_uv,
};

mod common;

fn polygon_2d(points: &[[f32; 2]]) -> Geometry {
    let mut geometry = Geometry::new(Dims::Two);
    let indices: Vec<u32> = points
        .iter()
        .map(|p| geometry.add_vertex(p).expect("vertex in range"))
        .collect();
    geometry.add_face(&indices).expect("valid face");
    geometry
}

#[test]
fn should_triangulate_a_convex_polygon_into_n_minus_2_triangles() {
    let n = 6;
    let points: Vec<[f32; 2]> = (0..n)
        .map(|i| {
            let angle = i as f32 / n as f32 * std::f32::consts::TAU;
            [angle.cos(), angle.sin()]
        })
        .collect();
    let mut geometry = polygon_2d(&points);

    let buffers = geometry.buffers();
    assert_eq!(buffers.triangle_count(), n as u32 - 2);
    // every original vertex takes part, nothing else does
    let mut used: Vec<u32> = buffers.face_indices.clone();
    used.sort();
    used.dedup();
    assert_eq!(used, (0..n as u32).collect::<Vec<_>>());
}

#[test]
fn should_triangulate_a_concave_polygon_without_crossing_the_notch() {
    // an arrowhead: vertex 3 pokes into the polygon's interior
    let mut geometry = polygon_2d(&[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [2.0, 1.0], [0.0, 4.0]]);

    let buffers = geometry.buffers();
    assert_eq!(buffers.triangle_count(), 3);
    // the concave vertex must appear in the output (it cannot be clipped
    // away as an ear of a triangle containing it)
    assert!(buffers.face_indices.contains(&3));
}

#[test]
fn should_emit_a_best_effort_fan_for_degenerate_polygons() {
    // all four vertices collinear: no valid ear exists
    let mut geometry = polygon_2d(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);

    let buffers = geometry.buffers();
    // still N-2 triangles, never a hard failure
    assert_eq!(buffers.triangle_count(), 2);
}

#[test]
fn should_round_trip_packed_uvs_within_quantization_error() {
    for uv in [[0.0, 0.0], [1.0, 1.0], [0.25, 0.75], [0.123, 0.987]] {
        let unpacked = unpack_uv(pack_uv(uv));
        for (before, after) in uv.iter().zip(unpacked) {
            assert!(
                (before - after).abs() <= 1.0 / 65535.0,
                "uv {before} round-tripped to {after}"
            );
        }
    }
    // out-of-range inputs clamp instead of wrapping
    assert_eq!(unpack_uv(pack_uv([2.0, -1.0])), [1.0, 0.0]);
}

#[test]
fn should_round_trip_packed_normals_within_quantization_error() {
    for normal in [
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 0.0],
        [-1.0, -1.0, -1.0],
        [0.577, -0.577, 0.577],
    ] {
        let unpacked = unpack_normal(pack_normal(normal));
        for (before, after) in normal.iter().zip(unpacked) {
            assert!(
                (before - after).abs() <= 1.0 / 127.0,
                "normal {before} round-tripped to {after}"
            );
        }
    }
}

#[test]
fn should_invalidate_compiled_buffers_on_mutation() {
    let mut geometry = Geometry::quad();
    geometry.buffers();
    assert!(geometry.is_compiled());

    geometry.translate(&[2.0, 0.0]).expect("2d translation");
    assert!(!geometry.is_compiled());

    // the recompiled buffer starts from the mutated data
    let buffers = geometry.buffers();
    assert_eq!(buffers.points.data[0], 2.0);
    assert_eq!(buffers.points.data[1], 0.0);
}

#[test]
fn should_duplicate_vertices_for_per_face_attributes() {
    // the canonical scenario: one quad face with its UV declared per face
    let mut geometry = Geometry::quad();
    geometry
        .set_uvs(AttributeScope::PerFace, vec![[0.5, 0.5]])
        .expect("one pair per face");

    let buffers = geometry.buffers();

    // (a) the face triangulates into exactly 2 triangles
    assert_eq!(buffers.triangle_count(), 2);

    // (b) the 4 vertices are duplicated into a separate buffer region
    // carrying position + packed uv
    let duplicated = buffers.face_points.as_ref().expect("per-face buffer");
    assert_eq!(duplicated.count, 4);
    assert_eq!(duplicated.layout.stride, 3);
    assert_eq!(duplicated.layout.uv_offset, Some(2));
    for slot in 0..4 {
        let packed = duplicated.data[slot * 3 + 2];
        let uv = unpack_uv(packed);
        assert!((uv[0] - 0.5).abs() <= 1.0 / 65535.0);
        assert!((uv[1] - 0.5).abs() <= 1.0 / 65535.0);
    }

    // (c) triangle indices are remapped into the duplicated region
    assert_eq!(buffers.face_indices, vec![0, 1, 2, 0, 2, 3]);

    // (d) the line buffer still references the original, un-duplicated
    // vertices, which only carry positions
    assert_eq!(buffers.line_indices, vec![0, 1, 1, 2, 2, 3, 3, 0]);
    assert_eq!(buffers.points.count, 4);
    assert_eq!(buffers.points.layout.stride, 2);
    assert_eq!(buffers.points.layout.uv_offset, None);
}

#[test]
fn should_interleave_per_vertex_attributes_without_duplication() {
    let mut geometry = Geometry::quad();
    geometry
        .set_uvs(
            AttributeScope::PerVertex,
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        )
        .expect("one pair per vertex");

    let buffers = geometry.buffers();
    assert!(buffers.face_points.is_none());
    assert_eq!(buffers.points.layout.stride, 3);
    assert_eq!(buffers.points.layout.uv_offset, Some(2));
    // indices reuse the original vertices directly
    assert_eq!(buffers.face_indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn should_merge_geometries_with_offset_indices() {
    let mut geometry = Geometry::quad();
    let mut other = Geometry::quad();
    other.translate(&[2.0, 0.0]).expect("2d translation");
    geometry.merge(&other).expect("same shape");

    let buffers = geometry.buffers();
    assert_eq!(buffers.points.count, 8);
    assert_eq!(
        buffers.face_indices,
        vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]
    );
}

#[test]
fn should_reject_out_of_range_indices_at_declare_time() {
    let mut geometry = Geometry::new(Dims::Two);
    geometry.add_vertex(&[0.0, 0.0]).expect("first vertex");
    geometry.add_vertex(&[1.0, 0.0]).expect("second vertex");

    assert!(geometry.add_face(&[0, 1, 2]).is_err());
    assert!(geometry.add_edge(&[0, 7]).is_err());
    // the builder state is untouched by the rejected calls
    assert!(geometry.buffers().face_indices.is_empty());
}

#[test]
fn should_upload_compiled_buffers_once_and_again_after_invalidation() {
    let (mut ctx, handle) = common::test_utils::test_context();
    let mut geometry = Geometry::quad();

    geometry.compile(ctx.device.as_mut());
    // vertex points, line indices, face indices
    assert_eq!(handle.borrow().buffers.len(), 3);

    // a clean recompile is a no-op
    geometry.compile(ctx.device.as_mut());
    assert_eq!(handle.borrow().buffers.len(), 3);

    geometry.scale(2.0);
    geometry.compile(ctx.device.as_mut());
    assert_eq!(handle.borrow().buffers.len(), 6);
}
