//! Offline rasterizer
//!
//! Runs the depth prepass and the lit pass on the CPU over the same
//! triangles, with the pipeline's depth states: the prepass writes with
//! `Less`, alpha testing cutout materials, and the lit pass shades with
//! `LessEqual` against that depth without writing it.

use glam::{Vec2, Vec3, Vec4};

use crate::config::ShadingConfig;
use crate::resources::{Material, Mesh, Texture2D};
use crate::scene::Scene;
use crate::shading::lighting::{
    cutout_alpha, DebugView, LightingEvaluator, LightingFeatures, MaterialTextures,
};
use crate::shading::shadow::{CutoutTriangle, SceneOccluder, ShadowAtlas, ShadowQuery, Triangle};
use crate::shading::vertex::{Varyings, VertexTransform};

/// Meshes, materials and images the scene objects index into
#[derive(Debug, Clone, Copy)]
pub struct SceneAssets<'a> {
    pub meshes: &'a [Mesh],
    pub materials: &'a [Material],
    pub textures: &'a [Texture2D],
}

impl<'a> SceneAssets<'a> {
    pub fn textures_for(&self, material: &Material) -> MaterialTextures<'a> {
        MaterialTextures {
            diffuse: material.diffuse_map.and_then(|i| self.textures.get(i)),
            specular: material.specular_map.and_then(|i| self.textures.get(i)),
            normal: material.normal_map.and_then(|i| self.textures.get(i)),
        }
    }

    /// World-space shadow casters; cutout materials are alpha tested at `cutoff`
    pub fn occluders(&self, scene: &Scene, cutoff: f32) -> Vec<SceneOccluder<'a>> {
        let mut occluders = Vec::new();
        for object in &scene.objects {
            let (Some(mesh), Some(material)) = (
                self.meshes.get(object.mesh_id),
                self.materials.get(object.material_id),
            ) else {
                log::warn!("Object references a missing mesh or material, skipped");
                continue;
            };
            let model = object.transform.matrix();
            let uniform = material.uniform();
            let diffuse = self.textures_for(material).diffuse;

            for tri in mesh.indices.chunks_exact(3) {
                let Some(corners) = corners(mesh, tri) else {
                    continue;
                };
                let triangle = Triangle::from(corners.map(|v| model.transform_point3(v.position)));
                occluders.push(if material.alpha_cutout {
                    SceneOccluder::Cutout(CutoutTriangle {
                        triangle,
                        uvs: corners.map(|v| v.uv),
                        material: uniform,
                        diffuse,
                        cutoff,
                    })
                } else {
                    SceneOccluder::Solid(triangle)
                });
            }
        }
        occluders
    }
}

fn corners<'m>(mesh: &'m Mesh, tri: &[u32]) -> Option<[&'m crate::resources::Vertex; 3]> {
    Some([
        mesh.vertices.get(tri[0] as usize)?,
        mesh.vertices.get(tri[1] as usize)?,
        mesh.vertices.get(tri[2] as usize)?,
    ])
}

/// Screen-space triangle with its vertex-stage outputs
struct ScreenTriangle {
    corners: [Varyings; 3],
    screen: [Vec3; 3],
}

impl ScreenTriangle {
    fn new(corners: [Varyings; 3], width: u32, height: u32) -> Option<Self> {
        if corners.iter().any(|v| v.clip_position.w <= 0.0) {
            return None;
        }
        let screen = corners.map(|v| {
            let ndc = v.ndc();
            Vec3::new(
                (ndc.x * 0.5 + 0.5) * width as f32,
                (0.5 - ndc.y * 0.5) * height as f32,
                ndc.z,
            )
        });
        // Counter-clockwise in NDC is clockwise once y points down
        let area = edge(screen[0].truncate(), screen[1].truncate(), screen[2].truncate());
        if area >= 0.0 {
            return None;
        }
        Some(Self { corners, screen })
    }

    /// Pixels covered by the triangle with their barycentric weights
    fn covered(&self, width: u32, height: u32) -> Vec<(u32, u32, Vec3)> {
        let [a, b, c] = self.screen.map(|p| p.truncate());
        let area = edge(a, b, c);
        let min = a.min(b).min(c).max(Vec2::ZERO);
        let max = a.max(b).max(c).min(Vec2::new(width as f32 - 1.0, height as f32 - 1.0));
        if max.x < min.x || max.y < min.y {
            return Vec::new();
        }

        let mut pixels = Vec::new();
        for y in min.y as u32..=max.y as u32 {
            for x in min.x as u32..=max.x as u32 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let weights = Vec3::new(edge(b, c, p), edge(c, a, p), edge(a, b, p)) / area;
                if weights.cmpge(Vec3::ZERO).all() {
                    pixels.push((x, y, weights));
                }
            }
        }
        pixels
    }

    fn depth(&self, weights: Vec3) -> f32 {
        Vec3::new(self.screen[0].z, self.screen[1].z, self.screen[2].z).dot(weights)
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

/// Colour and depth images of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOutput {
    pub color: Texture2D,
    /// Prepass depth, 1.0 where nothing was drawn
    pub depth: Texture2D,
}

/// CPU stand-in for the prepass and lit pass of the graph
#[derive(Debug, Clone, Copy)]
pub struct OfflineRasterizer {
    config: ShadingConfig,
    debug_view: DebugView,
    width: u32,
    height: u32,
}

impl OfflineRasterizer {
    pub fn new(config: ShadingConfig, width: u32, height: u32) -> Self {
        Self {
            config,
            debug_view: DebugView::Lit,
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn with_debug_view(mut self, debug_view: DebugView) -> Self {
        self.debug_view = debug_view;
        self
    }

    /// Draw `scene`; `shadows` is the map the lit pass samples, if any
    pub fn render(
        &self,
        scene: &Scene,
        assets: &SceneAssets,
        shadows: Option<&ShadowAtlas>,
    ) -> RasterOutput {
        let (width, height) = (self.width, self.height);
        let frame = scene.camera.uniform();
        let light = scene.light;
        let light_uniform = light.uniform(shadows.map(|_| &self.config.shadow));
        let query = ShadowQuery::new(self.config.shadow);
        let cutoff = self.config.lighting.alpha_cutoff;

        let mut triangles: Vec<(&Material, ScreenTriangle)> = Vec::new();
        for object in &scene.objects {
            let (Some(mesh), Some(material)) = (
                assets.meshes.get(object.mesh_id),
                assets.materials.get(object.material_id),
            ) else {
                log::warn!("Object references a missing mesh or material, skipped");
                continue;
            };
            let stage = VertexTransform::new(
                &frame,
                &object.transform.uniform(),
                light.vector(),
                self.config.lighting.guard_degenerate,
            );
            for tri in mesh.indices.chunks_exact(3) {
                let Some(corners) = corners(mesh, tri) else {
                    continue;
                };
                if let Some(triangle) =
                    ScreenTriangle::new(corners.map(|v| stage.transform(v)), width, height)
                {
                    triangles.push((material, triangle));
                }
            }
        }

        // Depth prepass
        let mut depth = Texture2D::new(width, height, Vec4::ONE, "depth");
        for (material, triangle) in &triangles {
            let uniform = material.uniform();
            let diffuse = assets.textures_for(material).diffuse;
            for (x, y, weights) in triangle.covered(width, height) {
                let z = triangle.depth(weights);
                if !(0.0..1.0).contains(&z) || z >= depth.get(x, y).x {
                    continue;
                }
                if material.alpha_cutout {
                    let uv = Varyings::interpolate(&triangle.corners, weights).uv;
                    if cutout_alpha(&uniform, diffuse, uv) < cutoff {
                        continue;
                    }
                }
                depth.set(x, y, Vec4::splat(z));
            }
        }

        // Lit pass, LessEqual against the prepass depth
        let mut color = Texture2D::new(width, height, Vec4::new(0.0, 0.0, 0.0, 1.0), "color");
        for (material, triangle) in &triangles {
            let mut features = material.features();
            if shadows.is_some() {
                features |= LightingFeatures::SHADOWS;
            }
            let evaluator =
                LightingEvaluator::new(self.config.lighting, features).with_debug_view(self.debug_view);
            let uniform = material.uniform();
            let textures = assets.textures_for(material);

            for (x, y, weights) in triangle.covered(width, height) {
                if triangle.depth(weights) > depth.get(x, y).x {
                    continue;
                }
                let fragment = Varyings::interpolate(&triangle.corners, weights);
                let shadow = shadows
                    .map(|map| query.factor(fragment.world_position, &light, map))
                    .unwrap_or(0.0);
                if let Some(c) = evaluator
                    .shade(&fragment, &uniform, &light_uniform, &textures, shadow)
                    .color()
                {
                    color.set(x, y, c);
                }
            }
        }

        RasterOutput { color, depth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputEncoding;
    use crate::scene::{Camera, Light, RenderObject};

    fn facing_quads() -> (Scene, Vec<Mesh>) {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let mut scene = Scene::new(camera, Light::directional(Vec3::NEG_Z, 1.0));
        scene.add_object(RenderObject::new(0, 0).with_position(Vec3::new(0.0, 0.0, -2.0)));
        (scene, vec![Mesh::quad(4.0)])
    }

    #[test]
    fn empty_pixels_keep_clear_values() {
        let (scene, meshes) = facing_quads();
        let materials = [Material::matte(Vec3::ONE)];
        let assets = SceneAssets {
            meshes: &meshes,
            materials: &materials,
            textures: &[],
        };
        let out = OfflineRasterizer::new(ShadingConfig::default(), 16, 16).render(&scene, &assets, None);

        assert_eq!(out.depth.get(0, 0), Vec4::ONE);
        assert_eq!(out.color.get(0, 0), Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!(out.depth.get(8, 8).x < 1.0);
    }

    #[test]
    fn lit_pass_shades_every_prepass_pixel() {
        let (scene, meshes) = facing_quads();
        let materials = [Material::matte(Vec3::ONE)];
        let assets = SceneAssets {
            meshes: &meshes,
            materials: &materials,
            textures: &[],
        };
        let config = ShadingConfig::default().with_output(OutputEncoding::LinearHdr);
        let out = OfflineRasterizer::new(config, 32, 32).render(&scene, &assets, None);

        for y in 0..32 {
            for x in 0..32 {
                let written = out.depth.get(x, y).x < 1.0;
                let shaded = out.color.get(x, y).x > 0.0;
                assert_eq!(written, shaded, "pixel ({x}, {y})");
            }
        }
    }
}
