//! Vertex transform stage

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::math::TangentFrame;
use crate::resources::Vertex;
use crate::scene::{FrameUniform, ObjectUniform};

/// Per-fragment attributes produced by the vertex stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Varyings {
    pub clip_position: Vec4,
    pub world_position: Vec3,
    pub world_normal: Vec3,
    pub uv: Vec2,
    /// Light position (or direction) rotated into tangent space
    pub tangent_light: Vec3,
    pub tangent_camera: Vec3,
    pub tangent_fragment: Vec3,
    /// Eye position in world space (uniform across the primitive)
    pub world_camera: Vec3,
}

impl Varyings {
    /// Perspective-incorrect barycentric blend, as used by the offline rasterizer
    pub fn interpolate(corners: &[Varyings; 3], weights: Vec3) -> Varyings {
        let [a, b, c] = corners;
        let mix3 = |x: Vec3, y: Vec3, z: Vec3| x * weights.x + y * weights.y + z * weights.z;
        Varyings {
            clip_position: a.clip_position * weights.x
                + b.clip_position * weights.y
                + c.clip_position * weights.z,
            world_position: mix3(a.world_position, b.world_position, c.world_position),
            world_normal: mix3(a.world_normal, b.world_normal, c.world_normal),
            uv: a.uv * weights.x + b.uv * weights.y + c.uv * weights.z,
            tangent_light: mix3(a.tangent_light, b.tangent_light, c.tangent_light),
            tangent_camera: mix3(a.tangent_camera, b.tangent_camera, c.tangent_camera),
            tangent_fragment: mix3(a.tangent_fragment, b.tangent_fragment, c.tangent_fragment),
            world_camera: a.world_camera,
        }
    }

    /// Normalized device coordinates
    pub fn ndc(&self) -> Vec3 {
        self.clip_position.truncate() / self.clip_position.w
    }
}

/// Object-to-clip transform plus the tangent-space setup of the lit pass
#[derive(Debug, Clone, Copy)]
pub struct VertexTransform {
    view_proj: Mat4,
    model: Mat4,
    normal_matrix: Mat4,
    camera_position: Vec3,
    /// Position (`w = 1`) or direction (`w = 0`)
    light_vector: Vec4,
    guard: bool,
}

impl VertexTransform {
    pub fn new(frame: &FrameUniform, object: &ObjectUniform, light_vector: Vec4, guard: bool) -> Self {
        Self {
            view_proj: frame.view_projection(),
            model: object.model,
            normal_matrix: object.normal_matrix,
            camera_position: frame.camera_position.truncate(),
            light_vector,
            guard,
        }
    }

    fn world_position(&self, position: Vec3) -> Vec4 {
        self.model * position.extend(1.0)
    }

    /// `(proj * view) * (model * position)`, evaluated in the same order as
    /// every scene program so depth-only and lit draws agree bit for bit
    pub fn clip_position(&self, position: Vec3) -> Vec4 {
        self.view_proj * self.world_position(position)
    }

    pub fn transform(&self, vertex: &Vertex) -> Varyings {
        let world = self.world_position(vertex.position);
        let normal = (self.normal_matrix * vertex.normal.extend(0.0)).truncate();
        let tangent = (self.model * vertex.tangent.extend(0.0)).truncate();
        let frame = TangentFrame::new(tangent, normal, self.guard);

        Varyings {
            clip_position: self.clip_position(vertex.position),
            world_position: world.truncate(),
            world_normal: normal,
            uv: vertex.uv,
            tangent_light: frame.to_tangent_space(self.light_vector.truncate()),
            tangent_camera: frame.to_tangent_space(self.camera_position),
            tangent_fragment: frame.to_tangent_space(world.truncate()),
            world_camera: self.camera_position,
        }
    }
}
