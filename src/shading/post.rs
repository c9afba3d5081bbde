//! Post-process compositor: filmic tonemap, shadow-map blur and fullscreen copies

use glam::{Vec2, Vec3, Vec4};

use crate::config::{BlurConfig, TonemapConfig};
use crate::math::tonemap::gamma_correct;
use crate::resources::Texture2D;
use crate::scene::FrameUniform;

/// Exposure, filmic curve, white normalisation and gamma
#[derive(Debug, Clone, Copy)]
pub struct Tonemapper {
    config: TonemapConfig,
}

impl Tonemapper {
    pub fn new(config: TonemapConfig) -> Self {
        Self { config }
    }

    pub fn apply(&self, color: Vec3) -> Vec3 {
        let c = &self.config;
        let mapped = c
            .curve
            .map(color, c.exposure_bias, c.pre_scale, c.normalize_white);
        gamma_correct(mapped, c.gamma)
    }

    /// Tonemap every texel; alpha becomes 1 like the fullscreen pass output
    pub fn apply_texture(&self, hdr: &Texture2D) -> Texture2D {
        let mut out = Texture2D::new(hdr.width, hdr.height, Vec4::ONE, "tonemapped");
        for y in 0..hdr.height {
            for x in 0..hdr.width {
                out.set(x, y, self.apply(hdr.get(x, y).truncate()).extend(1.0));
            }
        }
        out
    }
}

/// Average of the red channel over a `(2 * reach + 1)^2` grid of nearest
/// samples spaced `radius` apart
pub fn box_blur(texture: &Texture2D, uv: Vec2, radius: f32, reach: i32) -> f32 {
    let mut total = 0.0;
    let mut count = 0.0;
    for y in -reach..=reach {
        for x in -reach..=reach {
            let offset = Vec2::new(x as f32, y as f32) * radius;
            total += texture.sample_nearest(uv + offset).x;
            count += 1.0;
        }
    }
    total / count
}

/// Blur a distance map at every texel centre
pub fn blur_texture(texture: &Texture2D, blur: &BlurConfig) -> Texture2D {
    let mut out = Texture2D::new(texture.width, texture.height, Vec4::ZERO, "blurred");
    let size = Vec2::new(texture.width as f32, texture.height as f32);
    for y in 0..texture.height {
        for x in 0..texture.width {
            let uv = (Vec2::new(x as f32, y as f32) + Vec2::splat(0.5)) / size;
            let value = box_blur(texture, uv, blur.radius, blur.reach());
            out.set(x, y, Vec4::new(value, 0.0, 0.0, 1.0));
        }
    }
    out
}

/// Texture coordinate of a screen quad corner (`[-1, 1]^2`, y down)
#[inline]
pub fn fullscreen_uv(position: Vec2) -> Vec2 {
    position * 0.5 + Vec2::splat(0.5)
}

/// Clip-space position of a screen quad corner
#[inline]
pub fn fullscreen_clip(position: Vec2) -> Vec4 {
    Vec4::new(position.x, -position.y, 0.0, 1.0)
}

/// What kind of image the composite pass displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositeSource {
    /// Copied unchanged
    #[default]
    Color,
    /// Hardware depth, linearised with the camera planes
    Depth,
    /// Normalized distance (shadow maps), shown as grey
    Distance,
}

impl CompositeSource {
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Fullscreen copy used for display and debug views
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    source: CompositeSource,
    near: f32,
    far: f32,
}

impl Compositor {
    pub fn new(source: CompositeSource, frame: &FrameUniform) -> Self {
        Self {
            source,
            near: frame.planes.x,
            far: frame.planes.y,
        }
    }

    /// Linear depth in `[near / far, 1]` from a `[0, 1]` depth-buffer value
    pub fn linearize_depth(&self, depth: f32) -> f32 {
        self.near / (self.far - depth * (self.far - self.near))
    }

    pub fn composite(&self, texel: Vec4) -> Vec4 {
        match self.source {
            CompositeSource::Color => texel,
            CompositeSource::Depth => Vec3::splat(self.linearize_depth(texel.x)).extend(1.0),
            CompositeSource::Distance => Vec3::splat(texel.x).extend(1.0),
        }
    }

    /// Render the composite at `width` x `height` by sampling `source`
    pub fn composite_texture(&self, source: &Texture2D, width: u32, height: u32) -> Texture2D {
        let mut out = Texture2D::new(width, height, Vec4::ZERO, "composite");
        let size = Vec2::new(width as f32, height as f32);
        for y in 0..out.height {
            for x in 0..out.width {
                let uv = (Vec2::new(x as f32, y as f32) + Vec2::splat(0.5)) / size;
                out.set(x, y, self.composite(source.sample_nearest(uv)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ScreenVertex;

    #[test]
    fn tonemap_black_and_white_point() {
        let tonemapper = Tonemapper::new(TonemapConfig::default());
        assert!(tonemapper.apply(Vec3::ZERO).max_element().abs() < 1e-6);

        // Exposed value equal to W lands on 1.0
        let white = 11.2 / 32.0;
        let mapped = tonemapper.apply(Vec3::splat(white));
        assert!((mapped - Vec3::ONE).abs().max_element() < 1e-5);
    }

    #[test]
    fn tonemap_is_monotonic() {
        let tonemapper = Tonemapper::new(TonemapConfig::default());
        let mut previous = 0.0;
        for i in 0..200 {
            let v = tonemapper.apply(Vec3::splat(i as f32 * 0.01)).x;
            assert!(v >= previous);
            previous = v;
        }
    }

    #[test]
    fn blur_averages_25_taps() {
        let mut texture = Texture2D::new(9, 9, Vec4::ZERO, "spike");
        texture.set(4, 4, Vec4::new(25.0, 0.0, 0.0, 1.0));
        // One texel spacing between taps
        let value = box_blur(&texture, Vec2::splat(0.5), 1.0 / 9.0, 2);
        assert!((value - 1.0).abs() < 1e-6);

        let blurred = blur_texture(
            &texture,
            &BlurConfig {
                radius: 1.0 / 9.0,
                ..Default::default()
            },
        );
        assert!((blurred.get(4, 4).x - 1.0).abs() < 1e-6);
        assert!((blurred.get(2, 2).x - 1.0).abs() < 1e-6);
        assert_eq!(blurred.get(0, 0).x, 0.0);
    }

    #[test]
    fn default_radius_is_sub_texel() {
        let mut texture = Texture2D::new(64, 64, Vec4::ZERO, "spike");
        texture.set(32, 32, Vec4::ONE);
        let blurred = blur_texture(&texture, &BlurConfig::default());
        assert_eq!(blurred.get(32, 32).x, 1.0);
    }

    #[test]
    fn fullscreen_quad_covers_unit_square() {
        let uvs: Vec<Vec2> = ScreenVertex::QUAD
            .iter()
            .map(|v| fullscreen_uv(Vec2::from_array(v.position)))
            .collect();
        assert!(uvs.contains(&Vec2::ZERO));
        assert!(uvs.contains(&Vec2::ONE));
        // Top-left of the screen samples uv (0, 0)
        let clip = fullscreen_clip(Vec2::new(-1.0, -1.0));
        assert_eq!(clip.truncate().truncate(), Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn composite_depth_linearisation() {
        let frame = crate::scene::Camera::default().uniform();
        let compositor = Compositor::new(CompositeSource::Depth, &frame);
        let (near, far) = (frame.planes.x, frame.planes.y);
        assert!((compositor.linearize_depth(0.0) - near / far).abs() < 1e-6);
        assert!((compositor.linearize_depth(1.0) - 1.0).abs() < 1e-6);

        let distance = Compositor::new(CompositeSource::Distance, &frame);
        assert_eq!(distance.composite(Vec4::new(0.25, 0.9, 0.9, 0.0)), Vec4::new(0.25, 0.25, 0.25, 1.0));
        let color = Compositor::new(CompositeSource::Color, &frame);
        let texel = Vec4::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(color.composite(texel), texel);
    }
}
