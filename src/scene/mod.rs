//! Scene description and the uniform blocks it produces

mod camera;
mod light;
mod transform;

pub use camera::*;
pub use light::*;
pub use transform::*;

use glam::Vec3;

/// A renderable object in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    pub mesh_id: usize,
    pub material_id: usize,
    pub transform: Transform,
}

impl RenderObject {
    pub fn new(mesh_id: usize, material_id: usize) -> Self {
        Self {
            mesh_id,
            material_id,
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }
}

/// Camera, the single shading light and the objects to draw
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub light: Light,
    pub light_casts_shadow: bool,
    pub objects: Vec<RenderObject>,
}

impl Scene {
    pub fn new(camera: Camera, light: Light) -> Self {
        Self {
            camera,
            light,
            light_casts_shadow: true,
            objects: Vec::new(),
        }
    }

    pub fn add_object(&mut self, object: RenderObject) -> usize {
        let id = self.objects.len();
        self.objects.push(object);
        id
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(
            Camera::default(),
            Light::point(Vec3::new(0.0, 10.0, 0.0), 1.0),
        )
    }
}
