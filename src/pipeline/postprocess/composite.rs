//! Debug composite pass

use crate::backend::traits::RenderPipelineDescriptor;
use crate::backend::types::{TextureFormat, TextureUsage};
use crate::error::ShadingResult;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use crate::shader::{ShaderComposer, ShaderDef, COMPOSITE_SOURCE};
use crate::shading::CompositeSource;
use std::any::Any;

use super::{draw_fullscreen, fullscreen_pipeline};

/// Copies a graph image into a displayable `Rgba8Unorm` texture
///
/// Depth is linearised with the camera planes and distance maps are shown
/// as grey, so intermediate images can be inspected on screen.
pub struct CompositePass {
    source: CompositeSource,
    pipeline: RenderPipelineDescriptor,
    input: ResourceId,
    output: Option<ResourceId>,
}

impl CompositePass {
    pub fn new(
        composer: &ShaderComposer,
        source: CompositeSource,
        input: ResourceId,
    ) -> ShadingResult<Self> {
        let pipeline = fullscreen_pipeline(
            composer,
            "composite",
            COMPOSITE_SOURCE,
            &[("COMPOSITE_SOURCE", ShaderDef::UInt(source.index()))],
            // Unfilterable binding accepts every format the graph produces
            false,
            TextureFormat::Rgba8Unorm,
        )?;

        Ok(Self {
            source,
            pipeline,
            input,
            output: None,
        })
    }

    pub fn source(&self) -> CompositeSource {
        self.source
    }

    pub fn output(&self) -> Option<ResourceId> {
        self.output
    }

    pub fn pipeline(&self) -> &RenderPipelineDescriptor {
        &self.pipeline
    }
}

impl RenderPass for CompositePass {
    fn name(&self) -> &str {
        "Composite"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(self.input, ResourceUsage::TextureRead);

        let output = ctx.create_texture_relative(
            "debug_view",
            TextureSize::default(),
            TextureFormat::Rgba8Unorm,
            TextureUsage::ATTACHMENT_SAMPLED | TextureUsage::COPY_SRC,
        );
        self.output = Some(output);
        ctx.write(output, ResourceUsage::RenderTarget);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let Some(output) = self.output else {
            return;
        };
        let viewport = ctx.screen_viewport();
        draw_fullscreen(
            &mut *ctx.encoder,
            self.name(),
            &self.pipeline,
            self.input,
            output,
            viewport,
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
