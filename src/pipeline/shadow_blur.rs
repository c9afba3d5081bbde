//! Shadow map blur pass

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::binding;
use crate::error::ShadingResult;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use crate::resources::ScreenVertex;
use crate::shader::{ShaderComposer, SHADOW_BLUR_SOURCE};
use std::any::Any;

use super::compile_program;

/// Box-filters a distance map into a new map of the same size
pub struct ShadowBlurPass {
    pipeline: RenderPipelineDescriptor,
    input: ResourceId,
    width: u32,
    height: u32,
    output: Option<ResourceId>,
}

impl ShadowBlurPass {
    /// `width` and `height` are the texel size of `input`
    pub fn new(
        composer: &ShaderComposer,
        input: ResourceId,
        width: u32,
        height: u32,
    ) -> ShadingResult<Self> {
        let layouts = binding::post_layouts(false);
        let shader_source =
            compile_program(composer, "shadow_blur", SHADOW_BLUR_SOURCE, &[], &layouts)?;

        Ok(Self {
            pipeline: RenderPipelineDescriptor {
                label: "Shadow Blur".into(),
                shader_source,
                has_fragment: true,
                vertex_layouts: vec![ScreenVertex::layout()],
                bind_group_layouts: layouts,
                front_face: FrontFace::Ccw,
                cull_mode: CullMode::None,
                depth_stencil: None,
                color_targets: vec![ColorTargetState {
                    format: TextureFormat::R32Float,
                    write_mask: ColorWrites::RED,
                }],
            },
            input,
            width,
            height,
            output: None,
        })
    }

    pub fn output(&self) -> Option<ResourceId> {
        self.output
    }

    pub fn pipeline(&self) -> &RenderPipelineDescriptor {
        &self.pipeline
    }
}

impl RenderPass for ShadowBlurPass {
    fn name(&self) -> &str {
        "Shadow Blur Pass"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(self.input, ResourceUsage::TextureRead);

        let output = ctx.create_texture_relative(
            "shadow_blurred",
            TextureSize::Absolute {
                width: self.width,
                height: self.height,
            },
            TextureFormat::R32Float,
            TextureUsage::ATTACHMENT_SAMPLED,
        );
        self.output = Some(output);
        ctx.write(output, ResourceUsage::RenderTarget);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let Some(output) = self.output else {
            return;
        };

        let encoder = &mut *ctx.encoder;
        encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(self.name().into()),
            color_attachments: vec![ColorAttachment {
                target: output,
                load_op: LoadOp::Clear([1.0; 4]),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: None,
        });
        encoder.set_pipeline(&self.pipeline);
        encoder.set_viewport(Viewport::full(self.width, self.height));
        encoder.bind_texture(
            binding::POST_GROUP,
            binding::SOURCE_TEXTURE_BINDING,
            self.input,
        );
        encoder.draw_fullscreen();
        encoder.end_render_pass();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
