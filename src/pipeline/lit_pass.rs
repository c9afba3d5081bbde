//! Lit pass
//!
//! Shades the scene with the tangent-space Blinn-Phong program. Depth comes
//! from the prepass and is only tested, so each pixel runs the lighting once.
//! One variant is compiled for the union of the scene's material features;
//! materials without a map get neutral defaults bound, which shade the same
//! as the variant without that feature.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::binding;
use crate::error::ShadingResult;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use crate::resources::Vertex;
use crate::shader::{ShaderComposer, LIT_SOURCE};
use crate::shading::{DebugView, LightingFeatures};
use std::any::Any;

use super::compile_program;

/// Where the lit pass writes its colour
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LitTarget {
    /// A host-provided texture such as the swapchain
    External {
        resource: ResourceId,
        format: TextureFormat,
    },
    /// A screen-sized `Rgba16Float` image for the tonemap pass
    Hdr,
}

pub struct LitPass {
    features: LightingFeatures,
    debug_view: DebugView,
    pipeline: RenderPipelineDescriptor,
    depth: ResourceId,
    shadow_map: Option<ResourceId>,
    target: LitTarget,
    output: Option<ResourceId>,
}

impl LitPass {
    /// `shadow_map` must be set exactly when `features` contains shadows
    pub fn new(
        composer: &ShaderComposer,
        features: LightingFeatures,
        debug_view: DebugView,
        depth: ResourceId,
        shadow_map: Option<ResourceId>,
        target: LitTarget,
    ) -> ShadingResult<Self> {
        let layouts = binding::lit_layouts();
        let label = format!("lit[{:#06b}]", features.bits());
        let shader_source = compile_program(
            composer,
            &label,
            LIT_SOURCE,
            &features.shader_defs(debug_view),
            &layouts,
        )?;

        let format = match target {
            LitTarget::External { format, .. } => format,
            LitTarget::Hdr => TextureFormat::Rgba16Float,
        };

        Ok(Self {
            features,
            debug_view,
            pipeline: RenderPipelineDescriptor {
                label: "Lit".into(),
                shader_source,
                has_fragment: true,
                vertex_layouts: vec![Vertex::layout()],
                bind_group_layouts: layouts,
                front_face: FrontFace::Ccw,
                cull_mode: CullMode::Back,
                depth_stencil: Some(DepthStencilState {
                    format: TextureFormat::Depth32Float,
                    depth_write_enabled: false,
                    depth_compare: CompareFunction::LessEqual,
                }),
                color_targets: vec![ColorTargetState {
                    format,
                    write_mask: ColorWrites::ALL,
                }],
            },
            depth,
            shadow_map,
            target,
            output: None,
        })
    }

    pub fn features(&self) -> LightingFeatures {
        self.features
    }

    pub fn debug_view(&self) -> DebugView {
        self.debug_view
    }

    pub fn output(&self) -> Option<ResourceId> {
        self.output
    }

    pub fn pipeline(&self) -> &RenderPipelineDescriptor {
        &self.pipeline
    }
}

impl RenderPass for LitPass {
    fn name(&self) -> &str {
        "Lit Pass"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(self.depth, ResourceUsage::DepthStencilRead);
        if let Some(shadow_map) = self.shadow_map {
            ctx.read(shadow_map, ResourceUsage::TextureRead);
        }

        let output = match self.target {
            LitTarget::External { resource, .. } => resource,
            LitTarget::Hdr => ctx.create_texture_relative(
                "hdr_color",
                TextureSize::default(),
                TextureFormat::Rgba16Float,
                TextureUsage::ATTACHMENT_SAMPLED,
            ),
        };
        self.output = Some(output);
        ctx.write(output, ResourceUsage::RenderTarget);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let Some(output) = self.output else {
            return;
        };
        let viewport = ctx.screen_viewport();

        let encoder = &mut *ctx.encoder;
        encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(self.name().into()),
            color_attachments: vec![ColorAttachment {
                target: output,
                load_op: LoadOp::Clear([0.0, 0.0, 0.0, 1.0]),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: Some(DepthStencilAttachment::load(self.depth)),
        });
        encoder.set_pipeline(&self.pipeline);
        encoder.set_viewport(viewport);
        if let Some(shadow_map) = self.shadow_map {
            encoder.bind_texture(
                binding::LIGHT_GROUP,
                binding::SHADOW_MAP_BINDING,
                shadow_map,
            );
        }
        encoder.draw_scene(SceneGeometry::Lit);
        encoder.end_render_pass();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
