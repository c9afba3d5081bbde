//! Shadow depth generation and shadow queries
//!
//! Point lights store `distance / far` into a 6x1 cube atlas; directional
//! lights store `depth along the light direction / far` into a single planar
//! map. The lit pass reads either back through [`ShadowQuery`].

use glam::{Vec2, Vec3, Vec4};

use crate::backend::types::Viewport;
use crate::config::{BlurConfig, ShadowConfig, ShadowPolicy};
use crate::math::cube::{self, CubeFace};
use crate::resources::{MaterialUniform, Texture2D};
use crate::scene::{FrameUniform, Light};
use crate::shading::lighting::cutout_alpha;
use crate::shading::post;

/// Map a world distance into the stored `[0, 1]` range
#[inline]
pub fn encode_distance(distance: f32, far_plane: f32) -> f32 {
    distance / far_plane
}

#[inline]
pub fn decode_distance(stored: f32, far_plane: f32) -> f32 {
    stored * far_plane
}

/// Occluder triangle for CPU shadow bakes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Ray parameter of the closest two-sided hit (Moller-Trumbore)
    pub fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        self.intersect_barycentric(origin, direction).map(|(t, _)| t)
    }

    /// Hit parameter plus the weights of `b` and `c` at the hit point
    pub fn intersect_barycentric(&self, origin: Vec3, direction: Vec3) -> Option<(f32, Vec2)> {
        const EPS: f32 = 1e-7;
        let edge1 = self.b - self.a;
        let edge2 = self.c - self.a;
        let p = direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPS {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = origin - self.a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t > EPS).then_some((t, Vec2::new(u, v)))
    }
}

impl From<[Vec3; 3]> for Triangle {
    fn from([a, b, c]: [Vec3; 3]) -> Self {
        Self { a, b, c }
    }
}

/// Anything a CPU shadow bake can cast rays against
pub trait Occluder {
    fn hit(&self, origin: Vec3, direction: Vec3) -> Option<f32>;
}

impl Occluder for Triangle {
    fn hit(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        self.intersect(origin, direction)
    }
}

/// Triangle of an alpha-cutout material. Rays pass through texels whose
/// alpha is under the cutoff, like the cutout shadow-cast program.
#[derive(Debug, Clone, Copy)]
pub struct CutoutTriangle<'a> {
    pub triangle: Triangle,
    pub uvs: [Vec2; 3],
    pub material: MaterialUniform,
    pub diffuse: Option<&'a Texture2D>,
    pub cutoff: f32,
}

impl Occluder for CutoutTriangle<'_> {
    fn hit(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let (t, bary) = self.triangle.intersect_barycentric(origin, direction)?;
        let [a, b, c] = self.uvs;
        let uv = a * (1.0 - bary.x - bary.y) + b * bary.x + c * bary.y;
        (cutout_alpha(&self.material, self.diffuse, uv) >= self.cutoff).then_some(t)
    }
}

/// Caster list mixing opaque and cutout geometry
#[derive(Debug, Clone, Copy)]
pub enum SceneOccluder<'a> {
    Solid(Triangle),
    Cutout(CutoutTriangle<'a>),
}

impl Occluder for SceneOccluder<'_> {
    fn hit(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match self {
            SceneOccluder::Solid(triangle) => triangle.hit(origin, direction),
            SceneOccluder::Cutout(triangle) => triangle.hit(origin, direction),
        }
    }
}

/// Layout of a shadow image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowMapKind {
    /// Six faces side by side, `6 * resolution` wide
    Cube,
    Planar,
}

/// Stored normalized distances (red channel)
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowAtlas {
    pub kind: ShadowMapKind,
    pub resolution: u32,
    texture: Texture2D,
}

impl ShadowAtlas {
    /// Map cleared to the far plane (stored value 1.0)
    pub fn cleared(kind: ShadowMapKind, resolution: u32) -> Self {
        let resolution = resolution.max(1);
        let width = match kind {
            ShadowMapKind::Cube => resolution * cube::CUBE_FACE_COUNT,
            ShadowMapKind::Planar => resolution,
        };
        Self {
            kind,
            resolution,
            texture: Texture2D::new(width, resolution, Vec4::new(1.0, 0.0, 0.0, 1.0), "shadow_map"),
        }
    }

    pub fn texture(&self) -> &Texture2D {
        &self.texture
    }

    /// Stored value at a map coordinate (nearest texel, clamped)
    pub fn stored(&self, coord: Vec2) -> f32 {
        self.texture.sample_nearest(coord).x
    }

    pub fn set_texel(&mut self, x: u32, y: u32, stored: f32) {
        self.texture.set(x, y, Vec4::new(stored, 0.0, 0.0, 1.0));
    }

    /// Box-filtered copy, as produced by the shadow blur pass
    pub fn blurred(&self, blur: &BlurConfig) -> Self {
        if !blur.enabled {
            return self.clone();
        }
        Self {
            kind: self.kind,
            resolution: self.resolution,
            texture: post::blur_texture(&self.texture, blur),
        }
    }
}

/// Per-fragment output of the shadow passes and CPU bakes of the same
#[derive(Debug, Clone, Copy)]
pub struct ShadowDepthGenerator {
    config: ShadowConfig,
}

impl ShadowDepthGenerator {
    pub fn new(config: ShadowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Face cameras in atlas order
    pub fn face_frames(&self, light_position: Vec3) -> [FrameUniform; 6] {
        CubeFace::ALL.map(|face| {
            FrameUniform::cube_face(
                light_position,
                face,
                self.config.near_plane,
                self.config.far_plane,
            )
        })
    }

    pub fn face_viewport(&self, face: CubeFace) -> Viewport {
        let (x, y, width, height) = cube::face_viewport(face, self.config.face_resolution);
        Viewport {
            x: x as f32,
            y: y as f32,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Orthographic camera of a directional light
    pub fn planar_frame(&self, light: &Light) -> FrameUniform {
        let (view, proj) = light.planar_camera(&self.config);
        FrameUniform {
            view,
            proj,
            camera_position: light.shadow_origin(&self.config).extend(1.0),
            planes: Vec4::new(0.0, self.config.far_plane, 0.0, 0.0),
        }
    }

    /// Cube variant: normalized distance from the light
    pub fn cube_fragment_value(&self, world_position: Vec3, light_position: Vec3) -> f32 {
        encode_distance(
            world_position.distance(light_position),
            self.config.far_plane,
        )
    }

    /// Planar variant: normalized depth along the light direction
    pub fn planar_fragment_value(&self, world_position: Vec3, light: &Light) -> f32 {
        let origin = light.shadow_origin(&self.config);
        let direction = light.vector().truncate().normalize_or_zero();
        encode_distance(
            (world_position - origin).dot(direction),
            self.config.far_plane,
        )
    }

    /// Ray-cast the cube atlas of a point light over `occluders`
    pub fn bake_point_light<O: Occluder>(
        &self,
        light_position: Vec3,
        occluders: &[O],
    ) -> ShadowAtlas {
        let resolution = self.config.face_resolution;
        let mut atlas = ShadowAtlas::cleared(ShadowMapKind::Cube, resolution);

        for face in CubeFace::ALL {
            let x_offset = face.index() * resolution;
            for y in 0..resolution {
                for x in 0..resolution {
                    let uv = Vec2::new(
                        (x as f32 + 0.5) / resolution as f32,
                        (y as f32 + 0.5) / resolution as f32,
                    );
                    let direction = face.direction(uv);
                    if let Some(t) = self.closest_hit(light_position, direction, occluders) {
                        let point = light_position + direction * t;
                        atlas.set_texel(
                            x_offset + x,
                            y,
                            self.cube_fragment_value(point, light_position),
                        );
                    }
                }
            }
        }

        log::debug!(
            "Baked cube shadow atlas {}x{} over {} occluders",
            resolution * cube::CUBE_FACE_COUNT,
            resolution,
            occluders.len()
        );
        atlas
    }

    /// Ray-cast the planar map of a directional light over `occluders`
    pub fn bake_planar<O: Occluder>(&self, light: &Light, occluders: &[O]) -> ShadowAtlas {
        let resolution = self.config.face_resolution;
        let mut atlas = ShadowAtlas::cleared(ShadowMapKind::Planar, resolution);
        let inverse = light.planar_view_projection(&self.config).inverse();
        let direction = light.vector().truncate().normalize_or_zero();

        for y in 0..resolution {
            for x in 0..resolution {
                let ndc = Vec2::new(
                    (x as f32 + 0.5) / resolution as f32 * 2.0 - 1.0,
                    1.0 - (y as f32 + 0.5) / resolution as f32 * 2.0,
                );
                // Start on the near plane (depth 0) and march along the light
                let start = inverse.project_point3(ndc.extend(0.0));
                if let Some(t) = self.closest_hit(start, direction, occluders) {
                    let point = start + direction * t;
                    atlas.set_texel(x, y, self.planar_fragment_value(point, light));
                }
            }
        }
        atlas
    }

    fn closest_hit<O: Occluder>(
        &self,
        origin: Vec3,
        direction: Vec3,
        occluders: &[O],
    ) -> Option<f32> {
        occluders
            .iter()
            .filter_map(|occluder| occluder.hit(origin, direction))
            .filter(|&t| t <= self.config.far_plane)
            .min_by(f32::total_cmp)
    }
}

/// Occlusion lookup of the lit pass
#[derive(Debug, Clone, Copy)]
pub struct ShadowQuery {
    config: ShadowConfig,
}

impl ShadowQuery {
    pub fn new(config: ShadowConfig) -> Self {
        Self { config }
    }

    /// Compare a true distance against a stored normalized one.
    ///
    /// Returns 0 for lit and 1 for occluded, fractional under
    /// [`ShadowPolicy::Soft`]. A cleared texel (stored 1.0 or more) has no
    /// caster and is always lit.
    pub fn occlusion(&self, actual: f32, stored: f32) -> f32 {
        if stored >= 1.0 {
            return 0.0;
        }
        let far = self.config.far_plane;
        let stored = decode_distance(stored, far);
        match self.config.policy {
            ShadowPolicy::Hard { bias } => {
                if actual - bias * far > stored {
                    1.0
                } else {
                    0.0
                }
            }
            ShadowPolicy::Soft => (stored - actual).abs().clamp(0.0, 1.0),
        }
    }

    /// Atlas coordinate and true distance of a fragment lit by a point light
    pub fn cube_lookup(&self, world_position: Vec3, light_position: Vec3) -> (Vec2, f32) {
        let to_fragment = world_position - light_position;
        let coord = cube::project_direction(to_fragment).atlas_coord();
        (coord, to_fragment.length())
    }

    /// Map coordinate and depth of a fragment under a directional light.
    /// `None` outside the light volume, depth included.
    pub fn planar_lookup(&self, world_position: Vec3, light: &Light) -> Option<(Vec2, f32)> {
        let clip = light.planar_view_projection(&self.config) * world_position.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let coord = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
        if coord.cmplt(Vec2::ZERO).any()
            || coord.cmpgt(Vec2::ONE).any()
            || !(0.0..=1.0).contains(&ndc.z)
        {
            return None;
        }
        let origin = light.shadow_origin(&self.config);
        let direction = light.vector().truncate().normalize_or_zero();
        Some((coord, (world_position - origin).dot(direction)))
    }

    /// Shadow factor of `world_position` for `light`
    pub fn factor(&self, world_position: Vec3, light: &Light, map: &ShadowAtlas) -> f32 {
        match light {
            Light::Point { position, .. } => {
                let (coord, actual) = self.cube_lookup(world_position, *position);
                self.occlusion(actual, map.stored(coord))
            }
            Light::Directional { .. } => match self.planar_lookup(world_position, light) {
                Some((coord, actual)) => self.occlusion(actual, map.stored(coord)),
                None => 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ShadowConfig {
        ShadowConfig {
            face_resolution: 32,
            ..Default::default()
        }
    }

    /// Horizontal square of half-size `half` at height `y`
    fn square(y: f32, half: f32) -> Vec<Triangle> {
        let p = |x: f32, z: f32| Vec3::new(x, y, z);
        vec![
            Triangle::new(p(-half, -half), p(half, -half), p(half, half)),
            Triangle::new(p(-half, -half), p(half, half), p(-half, half)),
        ]
    }

    #[test]
    fn distance_round_trip() {
        for d in [0.0, 0.5, 17.25, 125.0, 249.9, 250.0] {
            let back = decode_distance(encode_distance(d, 250.0), 250.0);
            assert!((back - d).abs() < 1e-4, "{d} -> {back}");
        }
        assert_eq!(encode_distance(250.0, 250.0), 1.0);
    }

    #[test]
    fn triangle_intersection() {
        let tri = Triangle::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(tri.intersect(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y), Some(5.0));
        // Two-sided
        assert_eq!(tri.intersect(Vec3::new(0.0, -2.0, 0.0), Vec3::Y), Some(2.0));
        assert_eq!(tri.intersect(Vec3::new(5.0, 5.0, 0.0), Vec3::NEG_Y), None);
        assert_eq!(tri.intersect(Vec3::new(0.0, 5.0, 0.0), Vec3::Y), None);
    }

    #[test]
    fn hard_policy_threshold() {
        let query = ShadowQuery::new(ShadowConfig::default());
        let stored = encode_distance(100.0, 250.0);
        assert_eq!(query.occlusion(100.0, stored), 0.0);
        // Within the bias band (0.005 * 250 = 1.25)
        assert_eq!(query.occlusion(101.0, stored), 0.0);
        assert_eq!(query.occlusion(102.0, stored), 1.0);
        assert_eq!(query.occlusion(50.0, stored), 0.0);
    }

    #[test]
    fn soft_policy_blends() {
        let config = ShadowConfig {
            policy: ShadowPolicy::Soft,
            ..Default::default()
        };
        let query = ShadowQuery::new(config);
        let stored = encode_distance(100.0, 250.0);
        assert!(query.occlusion(100.0, stored) < 1e-4);
        assert!((query.occlusion(100.5, stored) - 0.5).abs() < 1e-3);
        assert_eq!(query.occlusion(140.0, stored), 1.0);
    }

    #[test]
    fn generator_values() {
        let generator = ShadowDepthGenerator::new(ShadowConfig::default());
        let light = Vec3::new(0.0, 10.0, 0.0);
        assert!((generator.cube_fragment_value(Vec3::ZERO, light) - 0.04).abs() < 1e-6);

        let sun = Light::directional(Vec3::NEG_Y, 1.0);
        // Origin sits half the far plane up the light direction
        assert!((generator.planar_fragment_value(Vec3::ZERO, &sun) - 0.5).abs() < 1e-6);
        assert!((generator.planar_fragment_value(Vec3::new(3.0, 25.0, -2.0), &sun) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn face_frames_match_generator() {
        let generator = ShadowDepthGenerator::new(small_config());
        let light = Vec3::new(1.0, 2.0, 3.0);
        let frames = generator.face_frames(light);
        for (face, frame) in CubeFace::ALL.iter().zip(frames.iter()) {
            assert_eq!(frame.camera_position.truncate(), light);
            let ahead = light + face.look_direction() * 5.0;
            let clip = frame.view_projection() * ahead.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        }
        let viewport = generator.face_viewport(CubeFace::NegativeY);
        assert_eq!(viewport.x, 96.0);
        assert_eq!(viewport.width, 32.0);
    }

    #[test]
    fn baked_point_shadow_occludes_below() {
        let generator = ShadowDepthGenerator::new(small_config());
        let query = ShadowQuery::new(small_config());
        let light_pos = Vec3::new(0.0, 10.0, 0.0);
        let light = Light::point(light_pos, 1.0);
        let atlas = generator.bake_point_light(light_pos, &square(5.0, 2.0));

        // Straight down hits the occluder at distance 5
        let (coord, _) = query.cube_lookup(Vec3::ZERO, light_pos);
        assert!((decode_distance(atlas.stored(coord), 250.0) - 5.0).abs() < 0.1);

        assert_eq!(query.factor(Vec3::ZERO, &light, &atlas), 1.0);
        // The occluder itself is not self-shadowed
        assert_eq!(query.factor(Vec3::new(0.0, 5.0, 0.0), &light, &atlas), 0.0);
        // Far to the side nothing blocks the light
        assert_eq!(query.factor(Vec3::new(20.0, 0.0, 0.0), &light, &atlas), 0.0);
        // Upward directions store the far plane
        let (up, _) = query.cube_lookup(Vec3::new(0.0, 20.0, 0.0), light_pos);
        assert_eq!(atlas.stored(up), 1.0);
    }

    #[test]
    fn baked_planar_shadow_occludes_below() {
        let config = ShadowConfig {
            face_resolution: 64,
            planar_extent: 10.0,
            ..Default::default()
        };
        let generator = ShadowDepthGenerator::new(config);
        let query = ShadowQuery::new(config);
        let sun = Light::directional(Vec3::NEG_Y, 1.0);
        let map = generator.bake_planar(&sun, &square(5.0, 3.0));
        assert_eq!(map.kind, ShadowMapKind::Planar);

        assert_eq!(query.factor(Vec3::ZERO, &sun, &map), 1.0);
        assert_eq!(query.factor(Vec3::new(0.0, 5.0, 0.0), &sun, &map), 0.0);
        assert_eq!(query.factor(Vec3::new(7.0, 0.0, 7.0), &sun, &map), 0.0);
        // Outside the light volume counts as lit
        assert!(query.planar_lookup(Vec3::new(50.0, 0.0, 0.0), &sun).is_none());
        assert_eq!(query.factor(Vec3::new(50.0, 0.0, 0.0), &sun, &map), 0.0);
    }

    #[test]
    fn cleared_map_never_occludes() {
        let generator = ShadowDepthGenerator::new(small_config());
        let light = Light::point(Vec3::ZERO, 1.0);
        let atlas = generator.bake_point_light::<Triangle>(Vec3::ZERO, &[]);

        for policy in [ShadowPolicy::default(), ShadowPolicy::Soft] {
            let query = ShadowQuery::new(ShadowConfig {
                policy,
                ..small_config()
            });
            for x in [100.0, 250.0, 260.0, 1000.0] {
                assert_eq!(query.factor(Vec3::new(x, 0.0, 0.0), &light, &atlas), 0.0, "{policy:?} at {x}");
            }
        }
    }

    #[test]
    fn planar_fragments_past_far_plane_are_lit() {
        let config = ShadowConfig {
            face_resolution: 32,
            planar_extent: 10.0,
            ..Default::default()
        };
        let generator = ShadowDepthGenerator::new(config);
        let query = ShadowQuery::new(config);
        let sun = Light::directional(Vec3::NEG_Y, 1.0);
        let map = generator.bake_planar(&sun, &square(5.0, 3.0));

        assert_eq!(query.factor(Vec3::ZERO, &sun, &map), 1.0);
        // 325 units along the light, beyond the 250 far plane
        let below = Vec3::new(0.0, -200.0, 0.0);
        assert!(query.planar_lookup(below, &sun).is_none());
        assert_eq!(query.factor(below, &sun, &map), 0.0);
    }

    #[test]
    fn cutout_casters_respect_alpha() {
        let generator = ShadowDepthGenerator::new(small_config());
        let query = ShadowQuery::new(small_config());
        let light_pos = Vec3::new(0.0, 10.0, 0.0);
        let light = Light::point(light_pos, 1.0);

        let casters = |alpha: f32| -> Vec<SceneOccluder<'static>> {
            let material = crate::resources::Material {
                alpha,
                ..crate::resources::Material::new("leaf").with_alpha_cutout()
            };
            square(5.0, 2.0)
                .into_iter()
                .map(|triangle| {
                    SceneOccluder::Cutout(CutoutTriangle {
                        triangle,
                        uvs: [Vec2::ZERO, Vec2::X, Vec2::ONE],
                        material: material.uniform(),
                        diffuse: None,
                        cutoff: 0.5,
                    })
                })
                .collect()
        };

        let clear = generator.bake_point_light(light_pos, &casters(0.2));
        assert_eq!(query.factor(Vec3::ZERO, &light, &clear), 0.0);

        let solid = generator.bake_point_light(light_pos, &casters(0.8));
        assert_eq!(query.factor(Vec3::ZERO, &light, &solid), 1.0);
    }

    #[test]
    fn cutout_alpha_follows_diffuse_map() {
        let mut mask = Texture2D::new(2, 1, Vec4::ONE, "mask");
        mask.set(1, 0, Vec4::new(1.0, 1.0, 1.0, 0.0));
        let material = crate::resources::Material::new("fence")
            .with_diffuse_map(0)
            .with_alpha_cutout()
            .uniform();
        let caster = CutoutTriangle {
            triangle: Triangle::new(
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ),
            // Constant uv on the left texel (opaque); the right one is clear
            uvs: [Vec2::new(0.25, 0.5); 3],
            material,
            diffuse: Some(&mask),
            cutoff: 0.5,
        };
        assert!(caster.hit(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y).is_some());

        let clear = CutoutTriangle {
            uvs: [Vec2::new(0.75, 0.5); 3],
            ..caster
        };
        assert!(clear.hit(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y).is_none());
    }

    #[test]
    fn blur_preserves_flat_maps() {
        let atlas = ShadowAtlas::cleared(ShadowMapKind::Cube, 8);
        let blurred = atlas.blurred(&BlurConfig::default());
        assert_eq!(blurred.stored(Vec2::new(0.3, 0.6)), 1.0);
        assert_eq!(blurred.texture().width, 48);
    }
}
