//! Blinn-Phong material definitions

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::shading::lighting::LightingFeatures;

/// Surface description for the lit pass
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    /// Alpha used by cutout materials when no diffuse map is sampled
    pub alpha: f32,
    pub specular: Vec3,
    pub shininess: f32,
    /// Take diffuse and specular colours from the bound maps
    pub use_texture: bool,
    /// Discard fragments whose alpha is below the configured cutoff
    pub alpha_cutout: bool,

    /// Texture IDs (None means the pass binds a neutral default)
    pub diffuse_map: Option<usize>,
    pub specular_map: Option<usize>,
    pub normal_map: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            ambient: Vec3::ONE,
            diffuse: Vec3::ONE,
            alpha: 1.0,
            specular: Vec3::ONE,
            shininess: 32.0,
            use_texture: false,
            alpha_cutout: false,
            diffuse_map: None,
            specular_map: None,
            normal_map: None,
        }
    }
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_diffuse(mut self, color: Vec3) -> Self {
        self.diffuse = color;
        self
    }

    pub fn with_specular(mut self, color: Vec3) -> Self {
        self.specular = color;
        self
    }

    pub fn with_ambient(mut self, color: Vec3) -> Self {
        self.ambient = color;
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    pub fn with_diffuse_map(mut self, texture: usize) -> Self {
        self.diffuse_map = Some(texture);
        self.use_texture = true;
        self
    }

    pub fn with_specular_map(mut self, texture: usize) -> Self {
        self.specular_map = Some(texture);
        self
    }

    pub fn with_normal_map(mut self, texture: usize) -> Self {
        self.normal_map = Some(texture);
        self
    }

    pub fn with_alpha_cutout(mut self) -> Self {
        self.alpha_cutout = true;
        self
    }

    /// Lighting variant this material needs (shadows are added per pass)
    pub fn features(&self) -> LightingFeatures {
        let mut features = LightingFeatures::empty();
        if self.use_texture {
            features |= LightingFeatures::TEXTURES;
        }
        if self.normal_map.is_some() {
            features |= LightingFeatures::NORMAL_MAP;
        }
        if self.alpha_cutout {
            features |= LightingFeatures::ALPHA_CUTOUT;
        }
        features
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            ambient: self.ambient.extend(1.0),
            diffuse: self.diffuse.extend(self.alpha),
            specular: self.specular.extend(1.0),
            params: Vec4::new(
                self.shininess,
                if self.use_texture { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ),
        }
    }

    // Preset materials

    pub fn matte(color: Vec3) -> Self {
        Self::new("matte")
            .with_diffuse(color)
            .with_specular(Vec3::ZERO)
            .with_shininess(1.0)
    }

    pub fn glossy(color: Vec3) -> Self {
        Self::new("glossy").with_diffuse(color).with_shininess(76.8)
    }
}

/// Material uniform (group 2, binding 0)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub ambient: Vec4,
    /// rgb = diffuse, a = alpha
    pub diffuse: Vec4,
    pub specular: Vec4,
    /// x = shininess, y = use texture
    pub params: Vec4,
}

impl MaterialUniform {
    pub fn shininess(&self) -> f32 {
        self.params.x
    }

    pub fn uses_texture(&self) -> bool {
        self.params.y > 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_from_maps() {
        assert!(Material::default().features().is_empty());

        let material = Material::new("foliage")
            .with_diffuse_map(0)
            .with_normal_map(1)
            .with_alpha_cutout();
        let features = material.features();
        assert!(features.contains(LightingFeatures::TEXTURES));
        assert!(features.contains(LightingFeatures::NORMAL_MAP));
        assert!(features.contains(LightingFeatures::ALPHA_CUTOUT));
        assert!(!features.contains(LightingFeatures::SHADOWS));
    }

    #[test]
    fn uniform_packing() {
        let uniform = Material::glossy(Vec3::new(0.2, 0.4, 0.6)).uniform();
        assert_eq!(uniform.diffuse, Vec4::new(0.2, 0.4, 0.6, 1.0));
        assert_eq!(uniform.shininess(), 76.8);
        assert!(!uniform.uses_texture());
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 64);
    }
}
