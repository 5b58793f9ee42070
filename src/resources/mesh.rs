use cgmath::{InnerSpace, Vector2, Vector3};

use crate::data_structures::model::ModelVertex;

/**
 * Obj files and some glTF exports don't come with tangents and bitangents so they have to be
 * calculated for normal maps to work correctly.
 *
 * Every triangle contributes its tangent frame to its three vertices, which are then averaged.
 */
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            log::warn!("Triangle {:?} references a vertex out of bounds", c);
            continue;
        }
        let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);

        let pos0: Vector3<f32> = v0.position.into();
        let pos1: Vector3<f32> = v1.position.into();
        let pos2: Vector3<f32> = v2.position.into();

        let uv0: Vector2<f32> = v0.tex_coords.into();
        let uv1: Vector2<f32> = v1.tex_coords.into();
        let uv2: Vector2<f32> = v2.tex_coords.into();

        // Calculate the edges of the triangle
        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;

        // This will give us a direction to calculate the
        // tangent and bitangent
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solving the following system of equations will
        // give us the tangent and bitangent.
        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            // degenerate uv mapping, the triangle has no usable tangent frame
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // We flip the bitangent to enable right-handed normal
        // maps with wgpu texture coordinate system
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            vertices[i].tangent = (tangent + Vector3::from(vertices[i].tangent)).into();
            vertices[i].bitangent = (bitangent + Vector3::from(vertices[i].bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    // Average the tangents/bitangents
    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (Vector3::from(v.tangent) * denom).into();
        v.bitangent = (Vector3::from(v.bitangent) * denom).into();
    }
}

/// Fills in a normal for vertices that came without one.
pub fn ensure_normals(vertices: &mut [ModelVertex]) {
    for v in vertices.iter_mut() {
        if Vector3::from(v.normal).magnitude2() == 0.0 {
            v.normal = [0.0, 1.0, 0.0];
        }
    }
}

/// A square of edge `size` in the xy plane facing +z, centred on the origin.
///
/// Texture coordinates span `0..repeat[0]` and `0..repeat[1]`; with a repeating sampler the
/// texture tiles that many times across the plane.
pub fn plane(size: f32, repeat: [f32; 2]) -> (Vec<ModelVertex>, Vec<u32>) {
    let half = size / 2.0;
    let corners = [(-half, half), (-half, -half), (half, -half), (half, half)];
    let mut vertices: Vec<ModelVertex> = corners
        .iter()
        .map(|&(x, y)| ModelVertex {
            position: [x, y, 0.0],
            tex_coords: [
                (x / size + 0.5) * repeat[0],
                (0.5 - y / size) * repeat[1],
            ],
            normal: [0.0, 0.0, 1.0],
            ..Default::default()
        })
        .collect();
    let indices = vec![0, 1, 2, 0, 2, 3];
    compute_tangents(&mut vertices, &indices);
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_uvs_span_the_repeat_factor() {
        let (vertices, indices) = plane(500.0, [10.0, 10.0]);
        assert_eq!(indices.len(), 6);
        let max_u = vertices.iter().map(|v| v.tex_coords[0]).fold(f32::MIN, f32::max);
        let max_v = vertices.iter().map(|v| v.tex_coords[1]).fold(f32::MIN, f32::max);
        let min_u = vertices.iter().map(|v| v.tex_coords[0]).fold(f32::MAX, f32::min);
        assert_eq!(max_u, 10.0);
        assert_eq!(max_v, 10.0);
        assert_eq!(min_u, 0.0);
    }

    #[test]
    fn plane_is_centred_with_requested_size() {
        let (vertices, _) = plane(500.0, [1.0, 1.0]);
        for v in &vertices {
            assert_eq!(v.position[0].abs(), 250.0);
            assert_eq!(v.position[1].abs(), 250.0);
            assert_eq!(v.position[2], 0.0);
        }
    }

    #[test]
    fn plane_triangles_face_its_normal() {
        let (vertices, indices) = plane(2.0, [1.0, 1.0]);
        for tri in indices.chunks(3) {
            let p = |i: u32| Vector3::from(vertices[i as usize].position);
            let n = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(n.z > 0.0, "triangle {:?} winds clockwise", tri);
        }
    }

    #[test]
    fn tangents_follow_u_and_bitangents_follow_image_up() {
        let (vertices, _) = plane(2.0, [1.0, 1.0]);
        for v in &vertices {
            let t = Vector3::from(v.tangent).normalize();
            let b = Vector3::from(v.bitangent).normalize();
            assert!((t - Vector3::unit_x()).magnitude() < 1e-5, "{:?}", t);
            assert!((b - Vector3::unit_y()).magnitude() < 1e-5, "{:?}", b);
        }
    }

    #[test]
    fn degenerate_uvs_leave_tangents_zeroed() {
        let mut vertices = vec![
            ModelVertex {
                position: [0.0, 0.0, 0.0],
                ..Default::default()
            },
            ModelVertex {
                position: [1.0, 0.0, 0.0],
                ..Default::default()
            },
            ModelVertex {
                position: [0.0, 1.0, 0.0],
                ..Default::default()
            },
        ];
        compute_tangents(&mut vertices, &[0, 1, 2]);
        assert!(vertices.iter().all(|v| v.tangent == [0.0; 3]));
    }

    #[test]
    fn missing_normals_point_up() {
        let mut vertices = vec![ModelVertex::default()];
        ensure_normals(&mut vertices);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
    }
}
