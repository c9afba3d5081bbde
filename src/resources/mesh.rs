//! Vertex formats, meshes and procedural generators

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::backend::types::{VertexBufferLayout, VertexFormat};
use crate::math::tbn::generate_tangents;

/// Full vertex consumed by the lit pass (locations 0..=3)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent: Vec3::ZERO,
        }
    }

    pub fn layout() -> VertexBufferLayout {
        VertexBufferLayout::packed(&[
            VertexFormat::Float32x3,
            VertexFormat::Float32x3,
            VertexFormat::Float32x2,
            VertexFormat::Float32x3,
        ])
    }
}

/// Position-only vertex for the depth prepass and shadow passes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: Vec3,
}

impl PositionVertex {
    pub fn layout() -> VertexBufferLayout {
        VertexBufferLayout::packed(&[VertexFormat::Float32x3])
    }
}

/// Screen quad corner in `[-1, 1]^2`, y pointing down the screen
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ScreenVertex {
    pub position: [f32; 2],
}

impl ScreenVertex {
    /// Two triangles covering the screen
    pub const QUAD: [ScreenVertex; 6] = [
        ScreenVertex { position: [-1.0, -1.0] },
        ScreenVertex { position: [-1.0, 1.0] },
        ScreenVertex { position: [1.0, 1.0] },
        ScreenVertex { position: [-1.0, -1.0] },
        ScreenVertex { position: [1.0, 1.0] },
        ScreenVertex { position: [1.0, -1.0] },
    ];

    pub fn layout() -> VertexBufferLayout {
        VertexBufferLayout::packed(&[VertexFormat::Float32x2])
    }
}

/// A mesh with vertex and index data
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: name.to_string(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Square of edge `size` in the XY plane facing +Z
    pub fn quad(size: f32) -> Self {
        let mut mesh = Mesh::new("quad");
        let h = size / 2.0;
        let corners = [
            (Vec3::new(-h, -h, 0.0), Vec2::new(0.0, 1.0)),
            (Vec3::new(h, -h, 0.0), Vec2::new(1.0, 1.0)),
            (Vec3::new(h, h, 0.0), Vec2::new(1.0, 0.0)),
            (Vec3::new(-h, h, 0.0), Vec2::new(0.0, 0.0)),
        ];
        for (position, uv) in corners {
            mesh.vertices.push(Vertex {
                tangent: Vec3::X,
                ..Vertex::new(position, Vec3::Z, uv)
            });
        }
        mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        mesh
    }

    /// Plane on the XZ axis facing +Y
    pub fn plane(width: f32, depth: f32, subdivisions: u32) -> Self {
        let mut mesh = Mesh::new("plane");
        let subdivisions = subdivisions.max(1);

        let half_width = width / 2.0;
        let half_depth = depth / 2.0;
        let step_x = width / subdivisions as f32;
        let step_z = depth / subdivisions as f32;

        for z in 0..=subdivisions {
            for x in 0..=subdivisions {
                let position = Vec3::new(
                    -half_width + x as f32 * step_x,
                    0.0,
                    -half_depth + z as f32 * step_z,
                );
                let uv = Vec2::new(
                    x as f32 / subdivisions as f32,
                    z as f32 / subdivisions as f32,
                );
                mesh.vertices.push(Vertex {
                    tangent: Vec3::X,
                    ..Vertex::new(position, Vec3::Y, uv)
                });
            }
        }

        for z in 0..subdivisions {
            for x in 0..subdivisions {
                let current = z * (subdivisions + 1) + x;
                let next = current + subdivisions + 1;
                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        mesh
    }

    /// Cube of edge `size` centred at the origin
    pub fn cube(size: f32) -> Self {
        let mut mesh = Mesh::new("cube");
        let h = size / 2.0;

        // (normal, u axis, v axis) per face; v runs down the texture
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::NEG_Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::NEG_Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::NEG_Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::NEG_Y),
            (Vec3::Y, Vec3::X, Vec3::Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::NEG_Z),
        ];

        for (normal, u_axis, v_axis) in faces {
            let base = mesh.vertices.len() as u32;
            for (u, v) in [(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)] {
                let position = (normal + u_axis * (u * 2.0 - 1.0) + v_axis * (v * 2.0 - 1.0)) * h;
                mesh.vertices.push(Vertex {
                    tangent: u_axis,
                    ..Vertex::new(position, normal, Vec2::new(u, v))
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    /// UV sphere of radius 0.5
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let mut mesh = Mesh::new("sphere");
        let segments = segments.max(3);
        let rings = rings.max(2);

        let segment_angle = 2.0 * std::f32::consts::PI / segments as f32;
        let ring_angle = std::f32::consts::PI / rings as f32;

        for ring in 0..=rings {
            let phi = ring as f32 * ring_angle;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for segment in 0..=segments {
                let theta = segment as f32 * segment_angle;
                let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
                let uv = Vec2::new(
                    segment as f32 / segments as f32,
                    ring as f32 / rings as f32,
                );
                mesh.vertices.push(Vertex {
                    tangent: Vec3::new(-theta.sin(), 0.0, theta.cos()),
                    ..Vertex::new(normal * 0.5, normal, uv)
                });
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;
                mesh.indices.extend_from_slice(&[
                    current,
                    current + 1,
                    next,
                    current + 1,
                    next + 1,
                    next,
                ]);
            }
        }

        mesh
    }

    /// Replace vertex tangents with ones derived from the UV layout
    pub fn with_generated_tangents(mut self) -> Self {
        let positions: Vec<Vec3> = self.vertices.iter().map(|v| v.position).collect();
        let normals: Vec<Vec3> = self.vertices.iter().map(|v| v.normal).collect();
        let uvs: Vec<Vec2> = self.vertices.iter().map(|v| v.uv).collect();
        let tangents = generate_tangents(&positions, &normals, &uvs, &self.indices);
        for (vertex, tangent) in self.vertices.iter_mut().zip(tangents) {
            vertex.tangent = tangent;
        }
        self
    }

    /// Bake `model` into positions, normals and tangents
    pub fn transformed(&self, model: Mat4) -> Self {
        let normal_matrix = model.inverse().transpose();
        let vertices = self
            .vertices
            .iter()
            .map(|v| Vertex {
                position: model.transform_point3(v.position),
                normal: normal_matrix.transform_vector3(v.normal).normalize_or_zero(),
                uv: v.uv,
                tangent: model.transform_vector3(v.tangent).normalize_or_zero(),
            })
            .collect();
        Self {
            vertices,
            indices: self.indices.clone(),
            name: self.name.clone(),
        }
    }

    /// Position-only copy for depth and shadow passes
    pub fn positions_only(&self) -> Vec<PositionVertex> {
        self.vertices
            .iter()
            .map(|v| PositionVertex {
                position: v.position,
            })
            .collect()
    }

    /// Concatenate meshes into one buffer, offsetting indices
    pub fn merge(name: &str, meshes: &[Mesh]) -> Self {
        let mut merged = Mesh::new(name);
        for mesh in meshes {
            let base = merged.vertices.len() as u32;
            merged.vertices.extend_from_slice(&mesh.vertices);
            merged.indices.extend(mesh.indices.iter().map(|i| i + base));
        }
        merged
    }

    /// Corner positions of every triangle
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([a.position, b.position, c.position])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winding_matches_normals(mesh: &Mesh) {
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| mesh.vertices[tri[i] as usize]);
            let face_normal = (b.position - a.position).cross(c.position - a.position);
            // Pole triangles of the sphere collapse
            if face_normal.length_squared() < 1e-12 {
                continue;
            }
            assert!(
                face_normal.dot(a.normal) > 0.0,
                "{}: clockwise triangle {tri:?}",
                mesh.name
            );
        }
    }

    #[test]
    fn generators_wind_counter_clockwise() {
        winding_matches_normals(&Mesh::quad(2.0));
        winding_matches_normals(&Mesh::plane(4.0, 4.0, 3));
        winding_matches_normals(&Mesh::cube(1.0));
        winding_matches_normals(&Mesh::sphere(12, 8));
    }

    #[test]
    fn cube_tangents_follow_uv() {
        let cube = Mesh::cube(1.0);
        let generated = cube.clone().with_generated_tangents();
        for (a, b) in cube.vertices.iter().zip(&generated.vertices) {
            assert!((a.tangent - b.tangent).length() < 1e-5);
        }
    }

    #[test]
    fn merge_offsets_indices() {
        let merged = Mesh::merge("scene", &[Mesh::quad(1.0), Mesh::quad(1.0)]);
        assert_eq!(merged.vertex_count(), 8);
        assert_eq!(&merged.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(merged.positions_only().len(), 8);
        assert_eq!(merged.triangles().count(), 4);
    }

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(Vertex::layout().array_stride, std::mem::size_of::<Vertex>() as u64);
        assert_eq!(
            PositionVertex::layout().array_stride,
            std::mem::size_of::<PositionVertex>() as u64
        );
        assert_eq!(ScreenVertex::layout().array_stride, 8);
    }

    #[test]
    fn transformed_bakes_model() {
        let model = Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0));
        let quad = Mesh::quad(2.0).transformed(model);
        assert!(quad.vertices.iter().all(|v| v.position.y >= 2.0));
        assert!(quad.vertices.iter().all(|v| (v.normal - Vec3::Z).length() < 1e-6));
    }
}
