//! Depth pre-pass

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::binding;
use crate::error::ShadingResult;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use crate::resources::{PositionVertex, Vertex};
use crate::shader::{ShaderComposer, PREPASS_CUTOUT_SOURCE, PREPASS_SOURCE};
use std::any::Any;

use super::compile_program;

fn prepass_depth_state() -> Option<DepthStencilState> {
    Some(DepthStencilState {
        format: TextureFormat::Depth32Float,
        depth_write_enabled: true,
        depth_compare: CompareFunction::Less,
    })
}

/// Writes scene depth so the lit pass shades each pixel once
pub struct DepthPrepass {
    pipeline: RenderPipelineDescriptor,
    /// Alpha-tested variant for cutout materials
    cutout_pipeline: Option<RenderPipelineDescriptor>,
    depth_texture: Option<ResourceId>,
}

impl DepthPrepass {
    pub fn new(composer: &ShaderComposer) -> ShadingResult<Self> {
        let layouts = binding::geometry_layouts();
        let shader_source = compile_program(composer, "prepass", PREPASS_SOURCE, &[], &layouts)?;

        Ok(Self {
            pipeline: RenderPipelineDescriptor {
                label: "Depth Prepass".into(),
                shader_source,
                has_fragment: false,
                vertex_layouts: vec![PositionVertex::layout()],
                bind_group_layouts: layouts,
                front_face: FrontFace::Ccw,
                cull_mode: CullMode::Back,
                depth_stencil: prepass_depth_state(),
                color_targets: Vec::new(),
            },
            cutout_pipeline: None,
            depth_texture: None,
        })
    }

    /// Also draw alpha-cutout objects, discarding texels under the cutoff
    /// so they leave no depth behind
    pub fn with_alpha_cutout(mut self, composer: &ShaderComposer) -> ShadingResult<Self> {
        let layouts = binding::cutout_layouts();
        let shader_source = compile_program(
            composer,
            "prepass_cutout",
            PREPASS_CUTOUT_SOURCE,
            &[],
            &layouts,
        )?;

        self.cutout_pipeline = Some(RenderPipelineDescriptor {
            label: "Depth Prepass (cutout)".into(),
            shader_source,
            has_fragment: true,
            vertex_layouts: vec![Vertex::layout()],
            bind_group_layouts: layouts,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::Back,
            depth_stencil: prepass_depth_state(),
            color_targets: Vec::new(),
        });
        Ok(self)
    }

    pub fn depth_texture(&self) -> Option<ResourceId> {
        self.depth_texture
    }

    pub fn pipeline(&self) -> &RenderPipelineDescriptor {
        &self.pipeline
    }

    pub fn cutout_pipeline(&self) -> Option<&RenderPipelineDescriptor> {
        self.cutout_pipeline.as_ref()
    }
}

impl RenderPass for DepthPrepass {
    fn name(&self) -> &str {
        "Depth Prepass"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        let depth = ctx.create_texture_relative(
            "depth_buffer",
            TextureSize::default(),
            TextureFormat::Depth32Float,
            TextureUsage::ATTACHMENT_SAMPLED,
        );
        self.depth_texture = Some(depth);
        ctx.write(depth, ResourceUsage::DepthStencilWrite);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let Some(depth) = self.depth_texture else {
            return;
        };
        let viewport = ctx.screen_viewport();

        let encoder = &mut *ctx.encoder;
        encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(self.name().into()),
            color_attachments: Vec::new(),
            depth_stencil_attachment: Some(DepthStencilAttachment::clear(depth)),
        });
        encoder.set_pipeline(&self.pipeline);
        encoder.set_viewport(viewport);
        encoder.draw_scene(SceneGeometry::PositionsOnly);
        if let Some(cutout) = &self.cutout_pipeline {
            encoder.set_pipeline(cutout);
            encoder.draw_scene(SceneGeometry::Cutout);
        }
        encoder.end_render_pass();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
