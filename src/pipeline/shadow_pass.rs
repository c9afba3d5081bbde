//! Shadow depth passes
//!
//! Both passes render the merged position stream with the shadow-cast
//! program, plus the cutout objects with an alpha-tested variant, and store
//! `distance / far` in a single-channel map. The point
//! variant draws the scene six times into the faces of a 6x1 atlas, the
//! planar variant once through the light's orthographic camera.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::binding;
use crate::config::ShadowConfig;
use crate::error::ShadingResult;
use crate::math::cube::CubeFace;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use crate::resources::{PositionVertex, Vertex};
use crate::shader::{ShaderComposer, ShaderDef, SHADOW_CAST_CUTOUT_SOURCE, SHADOW_CAST_SOURCE};
use crate::shading::{ShadowDepthGenerator, ShadowMapKind};
use std::any::Any;

use super::compile_program;

/// Stored value for texels no geometry covers
const CLEAR_DISTANCE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

fn shadow_pipeline(
    composer: &ShaderComposer,
    kind: ShadowMapKind,
    cutout: bool,
) -> ShadingResult<RenderPipelineDescriptor> {
    let planar = kind == ShadowMapKind::Planar;
    let defs = [("PLANAR_SHADOW", ShaderDef::Bool(planar))];
    let (label, source, layouts, vertex_layout) = if cutout {
        (
            "shadow_cast_cutout",
            SHADOW_CAST_CUTOUT_SOURCE,
            binding::cutout_layouts(),
            Vertex::layout(),
        )
    } else {
        (
            "shadow_cast",
            SHADOW_CAST_SOURCE,
            binding::geometry_layouts(),
            PositionVertex::layout(),
        )
    };
    let shader_source = compile_program(composer, label, source, &defs, &layouts)?;

    let kind_label = if planar { "Planar Shadow" } else { "Point Shadow" };
    Ok(RenderPipelineDescriptor {
        label: if cutout {
            format!("{kind_label} (cutout)")
        } else {
            kind_label.into()
        },
        shader_source,
        has_fragment: true,
        vertex_layouts: vec![vertex_layout],
        bind_group_layouts: layouts,
        front_face: FrontFace::Ccw,
        // Face projections flip y, which flips the winding
        cull_mode: CullMode::None,
        depth_stencil: Some(DepthStencilState {
            format: TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
        }),
        color_targets: vec![ColorTargetState {
            format: TextureFormat::R32Float,
            write_mask: ColorWrites::RED,
        }],
    })
}

/// Opaque caster pipeline plus the alpha-tested one when the scene has
/// cutout materials
struct CasterPipelines {
    opaque: RenderPipelineDescriptor,
    cutout: Option<RenderPipelineDescriptor>,
}

impl CasterPipelines {
    fn new(composer: &ShaderComposer, kind: ShadowMapKind) -> ShadingResult<Self> {
        Ok(Self {
            opaque: shadow_pipeline(composer, kind, false)?,
            cutout: None,
        })
    }

    fn add_cutout(&mut self, composer: &ShaderComposer, kind: ShadowMapKind) -> ShadingResult<()> {
        self.cutout = Some(shadow_pipeline(composer, kind, true)?);
        Ok(())
    }

    /// Draw every caster with the current frame and viewport
    fn draw(&self, encoder: &mut dyn PassEncoder) {
        encoder.set_pipeline(&self.opaque);
        encoder.draw_scene(SceneGeometry::PositionsOnly);
        if let Some(cutout) = &self.cutout {
            encoder.set_pipeline(cutout);
            encoder.draw_scene(SceneGeometry::Cutout);
        }
    }
}

/// Distance map plus the depth buffer used while rendering it
#[derive(Debug, Clone, Copy, Default)]
struct ShadowTargets {
    map: Option<ResourceId>,
    depth: Option<ResourceId>,
}

impl ShadowTargets {
    fn create(ctx: &mut PassSetupContext, name: &str, width: u32, height: u32) -> Self {
        let size = TextureSize::Absolute { width, height };
        let map = ctx.create_texture_relative(
            name,
            size,
            TextureFormat::R32Float,
            TextureUsage::ATTACHMENT_SAMPLED,
        );
        let depth = ctx.create_texture_relative(
            &format!("{name}_depth"),
            size,
            TextureFormat::Depth32Float,
            TextureUsage::RENDER_ATTACHMENT,
        );
        ctx.write(map, ResourceUsage::RenderTarget);
        ctx.write(depth, ResourceUsage::DepthStencilWrite);
        Self {
            map: Some(map),
            depth: Some(depth),
        }
    }

    fn begin(&self, encoder: &mut dyn PassEncoder, label: &str) -> bool {
        let (Some(map), Some(depth)) = (self.map, self.depth) else {
            return false;
        };
        encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(label.into()),
            color_attachments: vec![ColorAttachment {
                target: map,
                load_op: LoadOp::Clear(CLEAR_DISTANCE),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: Some(DepthStencilAttachment {
                target: depth,
                depth_load_op: LoadOp::Clear([1.0; 4]),
                depth_store_op: StoreOp::Discard,
            }),
        });
        true
    }
}

/// Renders the six-face distance atlas of a point light
pub struct PointShadowPass {
    generator: ShadowDepthGenerator,
    pipelines: CasterPipelines,
    targets: ShadowTargets,
}

impl PointShadowPass {
    pub fn new(composer: &ShaderComposer, config: ShadowConfig) -> ShadingResult<Self> {
        Ok(Self {
            generator: ShadowDepthGenerator::new(config),
            pipelines: CasterPipelines::new(composer, ShadowMapKind::Cube)?,
            targets: ShadowTargets::default(),
        })
    }

    /// Also cast shadows from alpha-cutout objects, except where their
    /// alpha is under the cutoff
    pub fn with_alpha_cutout(mut self, composer: &ShaderComposer) -> ShadingResult<Self> {
        self.pipelines.add_cutout(composer, ShadowMapKind::Cube)?;
        Ok(self)
    }

    pub fn shadow_map(&self) -> Option<ResourceId> {
        self.targets.map
    }

    pub fn pipeline(&self) -> &RenderPipelineDescriptor {
        &self.pipelines.opaque
    }

    pub fn cutout_pipeline(&self) -> Option<&RenderPipelineDescriptor> {
        self.pipelines.cutout.as_ref()
    }
}

impl RenderPass for PointShadowPass {
    fn name(&self) -> &str {
        "Point Shadow Pass"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        let (width, height) = self.generator.config().atlas_size();
        self.targets = ShadowTargets::create(ctx, "shadow_atlas", width, height);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let encoder = &mut *ctx.encoder;
        if !self.targets.begin(encoder, self.name()) {
            return;
        }

        let light = &ctx.scene.light;
        if !ctx.scene.light_casts_shadow {
            // Cleared texels read as unoccluded
            encoder.end_render_pass();
            return;
        }
        if !light.is_point() {
            log::warn!("Point shadow pass skipped: the scene light is directional");
            encoder.end_render_pass();
            return;
        }

        let light_position = light.vector().truncate();
        for (face, frame) in CubeFace::ALL
            .into_iter()
            .zip(self.generator.face_frames(light_position))
        {
            encoder.set_viewport(self.generator.face_viewport(face));
            encoder.set_frame(&frame);
            self.pipelines.draw(encoder);
        }
        encoder.end_render_pass();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Renders the depth map of a directional light
pub struct PlanarShadowPass {
    generator: ShadowDepthGenerator,
    pipelines: CasterPipelines,
    targets: ShadowTargets,
}

impl PlanarShadowPass {
    pub fn new(composer: &ShaderComposer, config: ShadowConfig) -> ShadingResult<Self> {
        Ok(Self {
            generator: ShadowDepthGenerator::new(config),
            pipelines: CasterPipelines::new(composer, ShadowMapKind::Planar)?,
            targets: ShadowTargets::default(),
        })
    }

    /// Also cast shadows from alpha-cutout objects, except where their
    /// alpha is under the cutoff
    pub fn with_alpha_cutout(mut self, composer: &ShaderComposer) -> ShadingResult<Self> {
        self.pipelines.add_cutout(composer, ShadowMapKind::Planar)?;
        Ok(self)
    }

    pub fn shadow_map(&self) -> Option<ResourceId> {
        self.targets.map
    }

    pub fn pipeline(&self) -> &RenderPipelineDescriptor {
        &self.pipelines.opaque
    }

    pub fn cutout_pipeline(&self) -> Option<&RenderPipelineDescriptor> {
        self.pipelines.cutout.as_ref()
    }
}

impl RenderPass for PlanarShadowPass {
    fn name(&self) -> &str {
        "Planar Shadow Pass"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        let resolution = self.generator.config().face_resolution;
        self.targets = ShadowTargets::create(ctx, "shadow_map", resolution, resolution);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let encoder = &mut *ctx.encoder;
        if !self.targets.begin(encoder, self.name()) {
            return;
        }

        let light = &ctx.scene.light;
        if !ctx.scene.light_casts_shadow {
            encoder.end_render_pass();
            return;
        }
        if light.is_point() {
            log::warn!("Planar shadow pass skipped: the scene light is a point light");
            encoder.end_render_pass();
            return;
        }

        let resolution = self.generator.config().face_resolution;
        encoder.set_viewport(Viewport::full(resolution, resolution));
        encoder.set_frame(&self.generator.planar_frame(light));
        self.pipelines.draw(encoder);
        encoder.end_render_pass();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
