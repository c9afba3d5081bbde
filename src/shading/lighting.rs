//! Blinn-Phong lighting evaluator
//!
//! One evaluator covers every material variant; [`LightingFeatures`] picks
//! the code path the same way the `HAS_*` constants pick it in `lit.wgsl`.

use glam::{Vec2, Vec3, Vec4};

use crate::backend::types::{AddressMode, FilterMode};
use crate::config::{LightingConfig, OutputEncoding};
use crate::math::shading_normalize;
use crate::math::tbn::decode_normal;
use crate::resources::{MaterialUniform, Texture2D};
use crate::scene::LightUniform;
use crate::shader::ShaderDef;
use crate::shading::vertex::Varyings;

/// Capability set selecting a lighting variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LightingFeatures(u8);

impl LightingFeatures {
    /// Shade in tangent space with a decoded normal map
    pub const NORMAL_MAP: Self = Self(1 << 0);
    pub const SHADOWS: Self = Self(1 << 1);
    /// Material may take its colours from the diffuse/specular maps
    pub const TEXTURES: Self = Self(1 << 2);
    pub const ALPHA_CUTOUT: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0xF)
    }

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Every combination of the four flags
    pub fn combinations() -> impl Iterator<Item = Self> {
        (0..=Self::all().0).map(Self)
    }

    /// Constants consumed by `lit.wgsl`
    pub fn shader_defs(&self, debug_view: DebugView) -> Vec<(&'static str, ShaderDef)> {
        vec![
            ("HAS_NORMAL_MAP", self.contains(Self::NORMAL_MAP).into()),
            ("HAS_SHADOWS", self.contains(Self::SHADOWS).into()),
            ("HAS_TEXTURES", self.contains(Self::TEXTURES).into()),
            ("HAS_ALPHA_CUTOUT", self.contains(Self::ALPHA_CUTOUT).into()),
            ("DEBUG_VIEW", debug_view.index().into()),
        ]
    }
}

impl std::ops::BitOr for LightingFeatures {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for LightingFeatures {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Alternate outputs of the lit pass for inspecting single terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DebugView {
    #[default]
    Lit,
    /// Constant white, for checking coverage
    White,
    DiffuseOnly,
    SpecularOnly,
    /// Shading normal remapped to `[0, 1]`
    Normals,
    /// `1 - shadow`
    ShadowOnly,
}

impl DebugView {
    pub const ALL: [DebugView; 6] = [
        DebugView::Lit,
        DebugView::White,
        DebugView::DiffuseOnly,
        DebugView::SpecularOnly,
        DebugView::Normals,
        DebugView::ShadowOnly,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Material images; `None` samples as the neutral default the pass binds
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialTextures<'a> {
    pub diffuse: Option<&'a Texture2D>,
    pub specular: Option<&'a Texture2D>,
    pub normal: Option<&'a Texture2D>,
}

/// Alpha the cutout test compares against the cutoff outside the lit pass:
/// the diffuse map's alpha for textured materials (white when unbound), the
/// material alpha otherwise
pub fn cutout_alpha(material: &MaterialUniform, diffuse: Option<&Texture2D>, uv: Vec2) -> f32 {
    if material.uses_texture() {
        diffuse.map_or(1.0, |t| {
            t.sample(uv, FilterMode::Linear, AddressMode::Repeat).w
        })
    } else {
        material.diffuse.w
    }
}

/// Separate contributions of one fragment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingTerms {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: f32,
    pub shadow: f32,
    /// Shading normal in the space lighting was evaluated in
    pub normal: Vec3,
    pub alpha: f32,
}

impl LightingTerms {
    /// `ambient + (1 - shadow) * (diffuse + specular) * attenuation`
    pub fn combine(&self) -> Vec3 {
        self.ambient + (1.0 - self.shadow) * (self.diffuse + self.specular) * self.attenuation
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FragmentOutput {
    Color(Vec4),
    /// Rejected by the alpha cutout
    Discarded,
}

impl FragmentOutput {
    pub fn color(&self) -> Option<Vec4> {
        match self {
            FragmentOutput::Color(c) => Some(*c),
            FragmentOutput::Discarded => None,
        }
    }
}

/// Fragment stage of the lit pass
#[derive(Debug, Clone, Copy)]
pub struct LightingEvaluator {
    config: LightingConfig,
    features: LightingFeatures,
    debug_view: DebugView,
}

impl LightingEvaluator {
    pub fn new(config: LightingConfig, features: LightingFeatures) -> Self {
        Self {
            config,
            features,
            debug_view: DebugView::Lit,
        }
    }

    pub fn with_debug_view(mut self, debug_view: DebugView) -> Self {
        self.debug_view = debug_view;
        self
    }

    pub fn features(&self) -> LightingFeatures {
        self.features
    }

    fn normalize(&self, v: Vec3) -> Vec3 {
        shading_normalize(v, self.config.guard_degenerate)
    }

    /// Evaluate every term; `shadow` is the query result for this fragment
    /// and is ignored unless the variant has shadows.
    pub fn terms(
        &self,
        fragment: &Varyings,
        material: &MaterialUniform,
        light: &LightUniform,
        textures: &MaterialTextures,
        shadow: f32,
    ) -> LightingTerms {
        let sample = |texture: Option<&Texture2D>, fallback: Vec4| {
            texture
                .map(|t| t.sample(fragment.uv, FilterMode::Linear, AddressMode::Repeat))
                .unwrap_or(fallback)
        };
        let diffuse_texel = sample(textures.diffuse, Vec4::ONE);
        let specular_texel = sample(textures.specular, Vec4::ONE);
        let normal_texel = sample(textures.normal, Vec4::new(0.5, 0.5, 1.0, 1.0));

        let textured =
            self.features.contains(LightingFeatures::TEXTURES) && material.uses_texture();
        let alpha = if textured {
            diffuse_texel.w
        } else {
            material.diffuse.w
        };

        let (normal, light_vector, camera, position) =
            if self.features.contains(LightingFeatures::NORMAL_MAP) {
                (
                    decode_normal(normal_texel.truncate(), self.config.guard_degenerate),
                    fragment.tangent_light,
                    fragment.tangent_camera,
                    fragment.tangent_fragment,
                )
            } else {
                (
                    self.normalize(fragment.world_normal),
                    light.vector.truncate(),
                    fragment.world_camera,
                    fragment.world_position,
                )
            };

        let (diffuse_source, specular_color) = if textured {
            (diffuse_texel.truncate(), specular_texel.truncate())
        } else {
            (material.diffuse.truncate(), material.specular.truncate())
        };
        let ambient = diffuse_source * material.ambient.truncate() * self.config.ambient_factor;

        let (light_dir, attenuation) = if light.vector.w > 0.5 {
            let to_light = light_vector - position;
            let mut dist_sq = to_light.length_squared();
            if self.config.guard_degenerate {
                dist_sq = dist_sq.max(1e-4);
            }
            (
                self.normalize(to_light),
                light.params.x / (dist_sq / self.config.attenuation_scale),
            )
        } else {
            (self.normalize(-light_vector), light.params.x)
        };

        let diff = normal.dot(light_dir).max(0.0);
        let diffuse = diff * diffuse_source;

        let view_dir = self.normalize(camera - position);
        let halfway = self.normalize(light_dir + view_dir);
        let spec = normal.dot(halfway).max(0.0).powf(material.shininess());
        let mut specular = specular_color * spec;
        if let Some(max) = self.config.specular_max {
            specular = specular.min(Vec3::splat(max));
        }

        let shadow = if self.features.contains(LightingFeatures::SHADOWS) {
            shadow
        } else {
            0.0
        };

        LightingTerms {
            ambient,
            diffuse,
            specular,
            attenuation,
            shadow,
            normal,
            alpha,
        }
    }

    /// Full fragment program: cutout, combination, debug view, encoding
    pub fn shade(
        &self,
        fragment: &Varyings,
        material: &MaterialUniform,
        light: &LightUniform,
        textures: &MaterialTextures,
        shadow: f32,
    ) -> FragmentOutput {
        let terms = self.terms(fragment, material, light, textures, shadow);
        if self.features.contains(LightingFeatures::ALPHA_CUTOUT)
            && terms.alpha < self.config.alpha_cutoff
        {
            return FragmentOutput::Discarded;
        }

        let color = match self.debug_view {
            DebugView::Lit => terms.combine(),
            DebugView::White => Vec3::ONE,
            DebugView::DiffuseOnly => terms.diffuse * terms.attenuation,
            DebugView::SpecularOnly => terms.specular * terms.attenuation,
            DebugView::Normals => terms.normal * 0.5 + Vec3::splat(0.5),
            DebugView::ShadowOnly => Vec3::splat(1.0 - terms.shadow),
        };

        let color = match self.config.output {
            OutputEncoding::Gamma => crate::math::tonemap::gamma_correct(color, self.config.gamma),
            OutputEncoding::LinearHdr => color,
        };
        FragmentOutput::Color(color.extend(terms.alpha))
    }
}
