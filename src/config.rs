//! Shading configuration
//!
//! Every tunable constant of the pipeline lives here instead of being baked
//! into shader literals. The same values drive the WGSL programs (through the
//! packed [`ShadingConstants`] uniform) and the CPU reference in
//! [`crate::shading`].

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::error::{ShadingError, ShadingResult};
use crate::math::tonemap::FilmicCurve;

/// How the stored shadow distance is compared against the true distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadowPolicy {
    /// Binary test: occluded when `actual - bias * far > stored * far`.
    /// The bias is expressed in normalized distance units.
    Hard { bias: f32 },
    /// Blend factor `clamp(|stored - actual|, 0, 1)` for gradual edges
    Soft,
}

impl Default for ShadowPolicy {
    fn default() -> Self {
        ShadowPolicy::Hard { bias: 0.005 }
    }
}

/// Shadow map generation and lookup parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowConfig {
    /// Distance that maps to a stored value of 1.0
    pub far_plane: f32,
    /// Near plane of the shadow cameras
    pub near_plane: f32,
    /// Edge length in texels of one cube face (and of planar shadow maps)
    pub face_resolution: u32,
    pub policy: ShadowPolicy,
    /// Half-extent of the orthographic volume used for directional lights
    pub planar_extent: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            far_plane: 250.0,
            near_plane: 1.0,
            face_resolution: 1024,
            policy: ShadowPolicy::default(),
            planar_extent: 50.0,
        }
    }
}

impl ShadowConfig {
    /// Size of the 6x1 cube atlas in texels
    pub fn atlas_size(&self) -> (u32, u32) {
        (self.face_resolution * 6, self.face_resolution)
    }
}

/// Final encoding applied by the lit pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// `pow(result, 1/gamma)` straight into a displayable target
    #[default]
    Gamma,
    /// Linear HDR output; gamma is applied later by the tonemap pass
    LinearHdr,
}

/// Lighting evaluator parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingConfig {
    /// Scalar applied to the diffuse source to form the ambient term
    pub ambient_factor: f32,
    /// Scene scale `K` in `strength / (d^2 / K)`
    pub attenuation_scale: f32,
    /// Optional per-channel ceiling for the specular term
    pub specular_max: Option<f32>,
    /// Alpha below which cutout materials discard the fragment
    pub alpha_cutoff: f32,
    pub gamma: f32,
    /// Guard normalisations and the attenuation divide against zero-length input
    pub guard_degenerate: bool,
    pub output: OutputEncoding,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_factor: 0.01,
            attenuation_scale: 2000.0,
            specular_max: None,
            alpha_cutoff: 0.5,
            gamma: 2.2,
            guard_degenerate: true,
            output: OutputEncoding::Gamma,
        }
    }
}

/// Filmic tonemap parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TonemapConfig {
    pub curve: FilmicCurve,
    pub exposure_bias: f32,
    pub pre_scale: f32,
    /// Divide by `T(W)` so the white point maps to 1.0
    pub normalize_white: bool,
    pub gamma: f32,
}

impl Default for TonemapConfig {
    fn default() -> Self {
        Self {
            curve: FilmicCurve::default(),
            exposure_bias: 2.0,
            pre_scale: 16.0,
            normalize_white: true,
            gamma: 2.2,
        }
    }
}

/// Box blur applied to shadow maps before they are sampled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurConfig {
    pub enabled: bool,
    /// Tap spacing in normalized texture units
    pub radius: f32,
    /// Taps per axis (odd)
    pub taps: u32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 0.0002,
            taps: 5,
        }
    }
}

impl BlurConfig {
    /// Number of taps on each side of the centre tap
    pub fn reach(&self) -> i32 {
        (self.taps / 2) as i32
    }
}

/// Complete configuration shared by every stage
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadingConfig {
    pub shadow: ShadowConfig,
    pub lighting: LightingConfig,
    pub tonemap: TonemapConfig,
    pub blur: BlurConfig,
}

impl ShadingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shadow(mut self, shadow: ShadowConfig) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_shadow_policy(mut self, policy: ShadowPolicy) -> Self {
        self.shadow.policy = policy;
        self
    }

    pub fn with_lighting(mut self, lighting: LightingConfig) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_output(mut self, output: OutputEncoding) -> Self {
        self.lighting.output = output;
        self
    }

    pub fn with_tonemap(mut self, tonemap: TonemapConfig) -> Self {
        self.tonemap = tonemap;
        self
    }

    pub fn with_blur(mut self, blur: BlurConfig) -> Self {
        self.blur = blur;
        self
    }

    /// Reject values that would make the shading math meaningless
    pub fn validate(&self) -> ShadingResult<()> {
        let shadow = &self.shadow;
        if !(shadow.near_plane > 0.0 && shadow.far_plane > shadow.near_plane) {
            return Err(ShadingError::InvalidConfig(format!(
                "shadow planes must satisfy 0 < near < far (near = {}, far = {})",
                shadow.near_plane, shadow.far_plane
            )));
        }
        if shadow.face_resolution == 0 {
            return Err(ShadingError::InvalidConfig(
                "shadow face resolution must be non-zero".into(),
            ));
        }
        if let ShadowPolicy::Hard { bias } = shadow.policy {
            if !(bias.is_finite() && bias >= 0.0) {
                return Err(ShadingError::InvalidConfig(format!(
                    "shadow bias must be finite and non-negative, got {bias}"
                )));
            }
        }
        if !(shadow.planar_extent > 0.0) {
            return Err(ShadingError::InvalidConfig(
                "planar shadow extent must be positive".into(),
            ));
        }

        let lighting = &self.lighting;
        if !(lighting.attenuation_scale.is_finite() && lighting.attenuation_scale > 0.0) {
            return Err(ShadingError::InvalidConfig(format!(
                "attenuation scale must be finite and positive, got {}",
                lighting.attenuation_scale
            )));
        }
        if !(lighting.gamma > 0.0) || !(self.tonemap.gamma > 0.0) {
            return Err(ShadingError::InvalidConfig("gamma must be positive".into()));
        }
        if let Some(max) = lighting.specular_max {
            if max < 0.0 {
                return Err(ShadingError::InvalidConfig(format!(
                    "specular ceiling must be non-negative, got {max}"
                )));
            }
        }

        let blur = &self.blur;
        if blur.taps == 0 || blur.taps % 2 == 0 {
            return Err(ShadingError::InvalidConfig(format!(
                "blur taps must be odd, got {}",
                blur.taps
            )));
        }
        if !(blur.radius >= 0.0) {
            return Err(ShadingError::InvalidConfig(
                "blur radius must be non-negative".into(),
            ));
        }

        if !lighting.guard_degenerate {
            log::warn!("Degenerate-vector guards disabled; zero-length normals will produce NaN");
        }
        Ok(())
    }

    /// Pack the configuration into the uniform block read by every program
    pub fn constants(&self) -> ShadingConstants {
        ShadingConstants::from_config(self)
    }
}

/// GPU-side copy of [`ShadingConfig`] (group 0, binding 1)
///
/// Layout mirrors `ShadingConstants` in `shaders/library/types.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadingConstants {
    /// far plane, hard bias, policy (0 hard, 1 soft), guard
    pub shadow: Vec4,
    /// ambient factor, K, specular max (negative = unclamped), alpha cutoff
    pub lighting: Vec4,
    /// 1/gamma, encoding (0 gamma, 1 linear), blur reach, unused
    pub output: Vec4,
    /// A, B, C, D
    pub curve_abcd: Vec4,
    /// E, F, W, normalize white
    pub curve_efw: Vec4,
    /// exposure bias, pre-scale, 1/tonemap gamma, blur radius
    pub post: Vec4,
}

impl ShadingConstants {
    pub fn from_config(config: &ShadingConfig) -> Self {
        let (policy, bias) = match config.shadow.policy {
            ShadowPolicy::Hard { bias } => (0.0, bias),
            ShadowPolicy::Soft => (1.0, 0.0),
        };
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let lighting = &config.lighting;
        let curve = &config.tonemap.curve;

        Self {
            shadow: Vec4::new(
                config.shadow.far_plane,
                bias,
                policy,
                flag(lighting.guard_degenerate),
            ),
            lighting: Vec4::new(
                lighting.ambient_factor,
                lighting.attenuation_scale,
                lighting.specular_max.unwrap_or(-1.0),
                lighting.alpha_cutoff,
            ),
            output: Vec4::new(
                1.0 / lighting.gamma,
                flag(lighting.output == OutputEncoding::LinearHdr),
                config.blur.reach() as f32,
                0.0,
            ),
            curve_abcd: Vec4::new(curve.a, curve.b, curve.c, curve.d),
            curve_efw: Vec4::new(
                curve.e,
                curve.f,
                curve.white,
                flag(config.tonemap.normalize_white),
            ),
            post: Vec4::new(
                config.tonemap.exposure_bias,
                config.tonemap.pre_scale,
                1.0 / config.tonemap.gamma,
                config.blur.radius,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ShadingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.shadow.far_plane, 250.0);
        assert_eq!(config.lighting.attenuation_scale, 2000.0);
        assert_eq!(config.shadow.atlas_size(), (6144, 1024));
        assert_eq!(config.blur.reach(), 2);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = ShadingConfig::default();
        config.shadow.far_plane = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ShadingError::InvalidConfig(_))
        ));

        let mut config = ShadingConfig::default();
        config.blur.taps = 4;
        assert!(config.validate().is_err());

        let mut config = ShadingConfig::default();
        config.lighting.attenuation_scale = f32::INFINITY;
        assert!(config.validate().is_err());

        let config = ShadingConfig::default().with_shadow_policy(ShadowPolicy::Hard { bias: -1.0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn constants_packing() {
        let config = ShadingConfig::default()
            .with_shadow_policy(ShadowPolicy::Soft)
            .with_output(OutputEncoding::LinearHdr);
        let constants = config.constants();

        assert_eq!(constants.shadow.x, 250.0);
        assert_eq!(constants.shadow.z, 1.0);
        assert_eq!(constants.shadow.w, 1.0);
        assert_eq!(constants.lighting.z, -1.0);
        assert_eq!(constants.output.y, 1.0);
        assert!((constants.output.x - 1.0 / 2.2).abs() < 1e-6);
        assert_eq!(constants.curve_abcd.x, 0.15);
        assert_eq!(constants.curve_efw.z, 11.2);
        assert_eq!(constants.post.x * constants.post.y, 32.0);
        assert_eq!(std::mem::size_of::<ShadingConstants>(), 96);
    }
}
