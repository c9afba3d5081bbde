//! Light types for the scene

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::config::ShadowConfig;

/// Period divisor of [`Light::orbiting`]
const ORBIT_PERIOD: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Parallel light travelling along `direction`
    Directional { direction: Vec3, strength: f32 },
    Point { position: Vec3, strength: f32 },
}

impl Light {
    pub fn directional(direction: Vec3, strength: f32) -> Self {
        Light::Directional {
            direction: direction.normalize_or_zero(),
            strength,
        }
    }

    pub fn point(position: Vec3, strength: f32) -> Self {
        Light::Point { position, strength }
    }

    /// Point light swinging along X at `height`, as used by the demo scenes
    pub fn orbiting(time: f32, radius: f32, height: f32, strength: f32) -> Self {
        Light::Point {
            position: Vec3::new((time / ORBIT_PERIOD).sin() * radius, height, 0.0),
            strength,
        }
    }

    pub fn strength(&self) -> f32 {
        match self {
            Light::Directional { strength, .. } | Light::Point { strength, .. } => *strength,
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Light::Point { .. })
    }

    /// Position (`w = 1`) or direction (`w = 0`)
    pub fn vector(&self) -> Vec4 {
        match self {
            Light::Directional { direction, .. } => direction.extend(0.0),
            Light::Point { position, .. } => position.extend(1.0),
        }
    }

    /// Origin the shadow distances are measured from
    pub fn shadow_origin(&self, shadow: &ShadowConfig) -> Vec3 {
        match self {
            Light::Point { position, .. } => *position,
            Light::Directional { direction, .. } => -*direction * (shadow.far_plane * 0.5),
        }
    }

    /// View and projection of the orthographic light camera
    ///
    /// The volume spans `planar_extent` around the world origin and
    /// `[0, far_plane]` along the light direction. Point lights render the
    /// cube atlas with [`crate::scene::FrameUniform::cube_face`] instead.
    pub fn planar_camera(&self, shadow: &ShadowConfig) -> (Mat4, Mat4) {
        let origin = self.shadow_origin(shadow);
        let forward = match self {
            Light::Directional { direction, .. } => *direction,
            Light::Point { position, .. } => (-*position).normalize_or_zero(),
        };
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let extent = shadow.planar_extent;
        let view = Mat4::look_at_rh(origin, origin + forward, up);
        let proj = Mat4::orthographic_rh(-extent, extent, -extent, extent, 0.0, shadow.far_plane);
        (view, proj)
    }

    pub fn planar_view_projection(&self, shadow: &ShadowConfig) -> Mat4 {
        let (view, proj) = self.planar_camera(shadow);
        proj * view
    }

    /// Get uniform data for GPU
    ///
    /// `shadow` is `None` when this light casts no shadow.
    pub fn uniform(&self, shadow: Option<&ShadowConfig>) -> LightUniform {
        let (casts_shadow, origin, view_proj) = match shadow {
            Some(config) => (
                1.0,
                self.shadow_origin(config).extend(1.0),
                if self.is_point() {
                    Mat4::IDENTITY
                } else {
                    self.planar_view_projection(config)
                },
            ),
            None => (0.0, Vec4::ZERO, Mat4::IDENTITY),
        };

        LightUniform {
            vector: self.vector(),
            params: Vec4::new(
                self.strength(),
                casts_shadow,
                if self.is_point() { 0.0 } else { 1.0 },
                0.0,
            ),
            shadow_origin: origin,
            shadow_view_proj: view_proj,
        }
    }
}

/// Per-light uniform (group 1, binding 0)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    /// Position (w = 1) or direction (w = 0)
    pub vector: Vec4,
    /// x = strength, y = casts shadow, z = shadow kind (0 cube, 1 planar)
    pub params: Vec4,
    pub shadow_origin: Vec4,
    pub shadow_view_proj: Mat4,
}
