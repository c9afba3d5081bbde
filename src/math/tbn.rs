//! Tangent-space basis construction and tangent generation

use glam::{Mat3, Vec2, Vec3};

use super::shading_normalize;

/// Orthonormal tangent/bitangent/normal frame
///
/// `to_tangent` is `transpose(mat3(T, B, N))`, the world-to-tangent rotation
/// applied to light, camera and fragment positions in the vertex stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentFrame {
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub normal: Vec3,
}

impl TangentFrame {
    /// Build the frame from a world-space tangent and normal
    ///
    /// The tangent is re-orthogonalised against the normal before the
    /// bitangent `cross(T, N)` is taken.
    pub fn new(tangent: Vec3, normal: Vec3, guard: bool) -> Self {
        let normal = shading_normalize(normal, guard);
        let tangent = shading_normalize(tangent, guard);
        let tangent = shading_normalize(tangent - tangent.dot(normal) * normal, guard);
        let bitangent = shading_normalize(tangent.cross(normal), guard);
        Self {
            tangent,
            bitangent,
            normal,
        }
    }

    /// Columns T, B, N: tangent space to world
    pub fn to_world_matrix(&self) -> Mat3 {
        Mat3::from_cols(self.tangent, self.bitangent, self.normal)
    }

    /// World to tangent space
    pub fn to_tangent_matrix(&self) -> Mat3 {
        self.to_world_matrix().transpose()
    }

    pub fn to_tangent_space(&self, v: Vec3) -> Vec3 {
        self.to_tangent_matrix() * v
    }

    pub fn from_tangent_space(&self, v: Vec3) -> Vec3 {
        self.to_world_matrix() * v
    }

    pub fn is_orthonormal(&self, eps: f32) -> bool {
        let unit = |v: Vec3| (v.length() - 1.0).abs() < eps;
        unit(self.tangent)
            && unit(self.bitangent)
            && unit(self.normal)
            && self.tangent.dot(self.bitangent).abs() < eps
            && self.tangent.dot(self.normal).abs() < eps
            && self.bitangent.dot(self.normal).abs() < eps
    }
}

/// Decode a `[0, 1]` normal-map texel to a unit tangent-space normal
pub fn decode_normal(texel: Vec3, guard: bool) -> Vec3 {
    shading_normalize(texel * 2.0 - Vec3::ONE, guard)
}

/// Per-vertex tangents from UV derivatives
///
/// Face tangents are accumulated on each vertex, then made orthogonal to the
/// vertex normal. Vertices whose tangent collapses (no UV gradient) fall back
/// to any vector perpendicular to the normal.
pub fn generate_tangents(
    positions: &[Vec3],
    normals: &[Vec3],
    uvs: &[Vec2],
    indices: &[u32],
) -> Vec<Vec3> {
    let mut accumulated = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let (Some(&uv0), Some(&uv1), Some(&uv2)) = (uvs.get(i0), uvs.get(i1), uvs.get(i2)) else {
            continue;
        };

        let edge1 = positions[i1] - positions[i0];
        let edge2 = positions[i2] - positions[i0];
        let duv1 = uv1 - uv0;
        let duv2 = uv2 - uv0;

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) / det;

        accumulated[i0] += tangent;
        accumulated[i1] += tangent;
        accumulated[i2] += tangent;
    }

    accumulated
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let n = normals.get(i).copied().unwrap_or(Vec3::Z).normalize_or_zero();
            let orthogonal = (t - n * t.dot(n)).normalize_or_zero();
            if orthogonal == Vec3::ZERO {
                n.any_orthonormal_vector()
            } else {
                orthogonal
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_orthonormal() {
        let frame = TangentFrame::new(Vec3::new(1.0, 0.2, 0.1), Vec3::new(0.1, 0.0, 2.0), true);
        assert!(frame.is_orthonormal(1e-5));

        let v = Vec3::new(0.3, -1.2, 4.0);
        let round = frame.from_tangent_space(frame.to_tangent_space(v));
        assert!((round - v).length() < 1e-5);
    }

    #[test]
    fn axis_aligned_frame() {
        let frame = TangentFrame::new(Vec3::X, Vec3::Z, true);
        assert!((frame.bitangent - Vec3::X.cross(Vec3::Z)).length() < 1e-6);
        // The normal maps to +Z in tangent space
        assert!((frame.to_tangent_space(Vec3::Z) - Vec3::Z).length() < 1e-6);
        assert!((frame.to_tangent_space(Vec3::X) - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn decode_flat_normal() {
        let n = decode_normal(Vec3::new(0.5, 0.5, 1.0), true);
        assert!((n - Vec3::Z).length() < 1e-6);
        assert_eq!(decode_normal(Vec3::splat(0.5), true), Vec3::ZERO);
    }

    #[test]
    fn tangents_follow_u_direction() {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let normals = [Vec3::Z; 4];
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let tangents = generate_tangents(&positions, &normals, &uvs, &[0, 1, 2, 0, 2, 3]);
        for t in tangents {
            assert!((t - Vec3::X).length() < 1e-6);
        }
    }

    #[test]
    fn degenerate_uvs_fall_back() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let tangents = generate_tangents(&positions, &[Vec3::Z; 3], &[Vec2::ZERO; 3], &[0, 1, 2]);
        for t in tangents {
            assert!((t.length() - 1.0).abs() < 1e-6);
            assert!(t.dot(Vec3::Z).abs() < 1e-6);
        }
    }
}
