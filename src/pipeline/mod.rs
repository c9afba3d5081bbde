//! Multi-pass shading pipeline
//!
//! 1. Shadow pass - distance map of the shadow-casting light (cube atlas or planar)
//! 2. Shadow blur - optional box filter over that map
//! 3. Depth prepass - scene depth only, alpha tested for cutout materials
//! 4. Lit pass - Blinn-Phong shading tested against the prepass depth
//! 5. Tonemapping - filmic curve from the HDR image into the output
//! 6. Composite - optional debug view of an intermediate image

pub mod depth_prepass;
pub mod lit_pass;
pub mod postprocess;
pub mod shadow_blur;
pub mod shadow_pass;

pub use depth_prepass::DepthPrepass;
pub use lit_pass::{LitPass, LitTarget};
pub use postprocess::{CompositePass, TonemapPass};
pub use shadow_blur::ShadowBlurPass;
pub use shadow_pass::{PlanarShadowPass, PointShadowPass};

use crate::backend::traits::BindGroupLayoutDesc;
use crate::backend::types::TextureFormat;
use crate::binding;
use crate::config::{OutputEncoding, ShadingConfig};
use crate::error::{ShadingError, ShadingResult};
use crate::render_graph::{PassId, RenderGraph, ResourceId};
use crate::resources::Material;
use crate::scene::Light;
use crate::shader::{ShaderComposer, ShaderDef};
use crate::shading::{CompositeSource, DebugView, LightingFeatures, ShadowMapKind};

/// Compose a program, validate it with naga and check it against `layouts`
pub(crate) fn compile_program(
    composer: &ShaderComposer,
    label: &str,
    source: &str,
    shader_defs: &[(&str, ShaderDef)],
    layouts: &[BindGroupLayoutDesc],
) -> ShadingResult<String> {
    let composed = composer.compose(source, shader_defs)?;
    let module = composer.validate(label, &composed)?;
    binding::check_module_bindings(label, &module, layouts)?;
    Ok(composed)
}

/// Configuration for the shading graph
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub shading: ShadingConfig,
    /// Material features of the scene; shadows are controlled by `shadows`
    pub features: LightingFeatures,
    /// Kind of shadow map to render, `None` to disable shadows
    pub shadows: Option<ShadowMapKind>,
    /// Render to an HDR image and tonemap it into the output
    pub tonemap: bool,
    pub debug_view: DebugView,
    /// Add a composite pass showing an intermediate image
    pub debug_composite: Option<CompositeSource>,
    /// Format of the host's output texture
    pub output_format: TextureFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shading: ShadingConfig::default(),
            features: LightingFeatures::empty(),
            shadows: Some(ShadowMapKind::Cube),
            tonemap: true,
            debug_view: DebugView::Lit,
            debug_composite: None,
            output_format: TextureFormat::Rgba8Unorm,
        }
    }
}

impl PipelineConfig {
    /// Union in the features every material needs
    pub fn with_materials(mut self, materials: &[Material]) -> Self {
        for material in materials {
            self.features |= material.features();
        }
        self
    }

    /// Pick the shadow map kind matching the light, keeping shadows disabled
    /// if they already are
    pub fn with_light(mut self, light: &Light) -> Self {
        if self.shadows.is_some() {
            self.shadows = Some(if light.is_point() {
                ShadowMapKind::Cube
            } else {
                ShadowMapKind::Planar
            });
        }
        self
    }

    pub fn without_shadows(mut self) -> Self {
        self.shadows = None;
        self
    }

    /// Shading configuration the graph runs with. The lit pass leaves gamma
    /// to the tonemap pass when one follows.
    pub fn effective_shading(&self) -> ShadingConfig {
        let mut shading = self.shading;
        if self.tonemap {
            shading.lighting.output = OutputEncoding::LinearHdr;
        }
        shading
    }

    /// Lit variant compiled for this configuration
    pub fn lit_features(&self) -> LightingFeatures {
        let mut features = self.features;
        if self.shadows.is_some() {
            features |= LightingFeatures::SHADOWS;
        }
        features
    }
}

/// Pass and resource handles of a built shading graph
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingResources {
    /// Configuration to upload as `ShadingConstants` and hand to the executor
    pub shading: ShadingConfig,
    pub swapchain: ResourceId,
    pub depth: ResourceId,
    /// Map sampled by the lit pass (blurred when blur is enabled)
    pub shadow_map: Option<ResourceId>,
    pub hdr_color: Option<ResourceId>,
    pub debug_output: Option<ResourceId>,

    pub shadow_pass: Option<PassId>,
    pub blur_pass: Option<PassId>,
    pub prepass: PassId,
    pub lit_pass: PassId,
    pub tonemap_pass: Option<PassId>,
    pub composite_pass: Option<PassId>,
}

fn created(resource: Option<ResourceId>, name: &str) -> ShadingResult<ResourceId> {
    resource.ok_or_else(|| ShadingError::UnknownResource(name.to_string()))
}

/// Build the shading render graph
pub fn build_shading_graph(
    width: u32,
    height: u32,
    config: &PipelineConfig,
) -> ShadingResult<(RenderGraph, ShadingResources)> {
    config.shading.validate()?;
    let shading = config.effective_shading();
    let composer = ShaderComposer::with_standard_library();
    let cutout = config.features.contains(LightingFeatures::ALPHA_CUTOUT);

    let mut graph = RenderGraph::new();

    // Register swapchain as external resource
    let swapchain = graph.register_external("swapchain");

    // Shadow map of the single shadow-casting light
    let (shadow_pass, raw_shadow_map) = match config.shadows {
        Some(ShadowMapKind::Cube) => {
            let mut pass = PointShadowPass::new(&composer, shading.shadow)?;
            if cutout {
                pass = pass.with_alpha_cutout(&composer)?;
            }
            let id = graph.add_pass(pass, width, height);
            let map = graph.pass_as::<PointShadowPass>(id).and_then(|p| p.shadow_map());
            (Some(id), Some(created(map, "shadow_atlas")?))
        }
        Some(ShadowMapKind::Planar) => {
            let mut pass = PlanarShadowPass::new(&composer, shading.shadow)?;
            if cutout {
                pass = pass.with_alpha_cutout(&composer)?;
            }
            let id = graph.add_pass(pass, width, height);
            let map = graph.pass_as::<PlanarShadowPass>(id).and_then(|p| p.shadow_map());
            (Some(id), Some(created(map, "shadow_map")?))
        }
        None => (None, None),
    };

    let mut blur_pass = None;
    let mut shadow_map = raw_shadow_map;
    if let (Some(kind), Some(input)) = (config.shadows, raw_shadow_map) {
        if shading.blur.enabled {
            let resolution = shading.shadow.face_resolution;
            let (map_width, map_height) = match kind {
                ShadowMapKind::Cube => shading.shadow.atlas_size(),
                ShadowMapKind::Planar => (resolution, resolution),
            };
            let id = graph.add_pass(
                ShadowBlurPass::new(&composer, input, map_width, map_height)?,
                width,
                height,
            );
            let output = graph.pass_as::<ShadowBlurPass>(id).and_then(|p| p.output());
            blur_pass = Some(id);
            shadow_map = Some(created(output, "shadow_blurred")?);
        }
    }

    let mut depth_prepass = DepthPrepass::new(&composer)?;
    if cutout {
        depth_prepass = depth_prepass.with_alpha_cutout(&composer)?;
    }
    let prepass = graph.add_pass(depth_prepass, width, height);
    let depth = created(
        graph.pass_as::<DepthPrepass>(prepass).and_then(|p| p.depth_texture()),
        "depth_buffer",
    )?;

    let target = if config.tonemap {
        LitTarget::Hdr
    } else {
        LitTarget::External {
            resource: swapchain,
            format: config.output_format,
        }
    };
    let lit_pass = graph.add_pass(
        LitPass::new(
            &composer,
            config.lit_features(),
            config.debug_view,
            depth,
            shadow_map,
            target,
        )?,
        width,
        height,
    );
    let lit_output = created(
        graph.pass_as::<LitPass>(lit_pass).and_then(|p| p.output()),
        "lit_color",
    )?;

    let mut hdr_color = None;
    let mut tonemap_pass = None;
    if config.tonemap {
        hdr_color = Some(lit_output);
        tonemap_pass = Some(graph.add_pass(
            TonemapPass::new(&composer, lit_output, swapchain, config.output_format)?,
            width,
            height,
        ));
    }

    let mut composite_pass = None;
    let mut debug_output = None;
    if let Some(source) = config.debug_composite {
        let input = match source {
            CompositeSource::Color => lit_output,
            CompositeSource::Depth => depth,
            CompositeSource::Distance => shadow_map.ok_or_else(|| {
                ShadingError::InvalidConfig(
                    "distance composite needs shadows to be enabled".into(),
                )
            })?,
        };
        let id = graph.add_pass(CompositePass::new(&composer, source, input)?, width, height);
        composite_pass = Some(id);
        debug_output = Some(created(
            graph.pass_as::<CompositePass>(id).and_then(|p| p.output()),
            "debug_view",
        )?);
    }

    // Surface ordering errors now rather than on the first frame
    let compiled = graph.compile()?;
    log::info!(
        "Built shading graph: {} passes, {} resources, {}x{}",
        compiled.pass_order.len(),
        graph.resources().len(),
        width,
        height
    );

    let resources = ShadingResources {
        shading,
        swapchain,
        depth,
        shadow_map,
        hdr_color,
        debug_output,
        shadow_pass,
        blur_pass,
        prepass,
        lit_pass,
        tonemap_pass,
        composite_pass,
    };

    Ok((graph, resources))
}
