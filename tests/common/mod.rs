//! Shared scene fixtures for the integration tests.

#![allow(dead_code)]

use glam::{Vec2, Vec3};

use multipass_shading::resources::{Material, Mesh, Vertex};
use multipass_shading::scene::{Camera, Light, RenderObject, Scene, Transform};
use multipass_shading::shading::Triangle;
use multipass_shading::ShadowConfig;

/// Floor plane at y = 0 with a 2x2x2 block floating over its centre
pub struct BlockScene {
    pub scene: Scene,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

pub const FLOOR: usize = 0;
pub const BLOCK: usize = 1;

impl BlockScene {
    pub fn new(light: Light) -> Self {
        let camera = Camera::new(Vec3::new(0.0, 8.0, 12.0), Vec3::ZERO);
        let mut scene = Scene::new(camera, light);
        scene.add_object(RenderObject::new(FLOOR, 0));
        scene.add_object(
            RenderObject::new(BLOCK, 1).with_transform(Transform::from_position(Vec3::new(
                0.0, 3.0, 0.0,
            ))),
        );

        Self {
            scene,
            meshes: vec![Mesh::plane(20.0, 20.0, 1), Mesh::cube(2.0)],
            materials: vec![
                Material::matte(Vec3::ONE),
                Material::glossy(Vec3::new(0.8, 0.2, 0.2)),
            ],
        }
    }

    pub fn point_light() -> Self {
        Self::new(Light::point(Vec3::new(0.0, 10.0, 0.0), 1.0))
    }

    /// World-space triangles of every object
    pub fn occluders(&self) -> Vec<Triangle> {
        self.scene
            .objects
            .iter()
            .flat_map(|object| {
                let model = object.transform.matrix();
                self.meshes[object.mesh_id]
                    .triangles()
                    .map(move |tri| Triangle::from(tri.map(|p| model.transform_point3(p))))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Shadow settings small enough for CPU bakes
pub fn small_shadow_config() -> ShadowConfig {
    ShadowConfig {
        face_resolution: 64,
        ..Default::default()
    }
}

/// Floor vertex at `position` with the plane's tangent frame
pub fn floor_vertex(position: Vec3) -> Vertex {
    Vertex {
        tangent: Vec3::X,
        ..Vertex::new(position, Vec3::Y, Vec2::new(position.x, position.z) / 20.0 + 0.5)
    }
}

pub fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual} (tolerance {tolerance})"
    );
}
