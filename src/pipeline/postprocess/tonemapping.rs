//! Filmic tonemapping pass

use crate::backend::traits::RenderPipelineDescriptor;
use crate::backend::types::TextureFormat;
use crate::error::ShadingResult;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use crate::shader::{ShaderComposer, TONEMAP_SOURCE};
use std::any::Any;

use super::{draw_fullscreen, fullscreen_pipeline};

/// Maps the linear HDR image into display range and applies gamma
///
/// Curve, exposure and gamma come from the shading constants, so the same
/// pipeline serves any [`crate::config::TonemapConfig`].
pub struct TonemapPass {
    pipeline: RenderPipelineDescriptor,
    input: ResourceId,
    output: ResourceId,
}

impl TonemapPass {
    /// `format` is the format of `output`; use a non-sRGB format since the
    /// shader applies gamma itself
    pub fn new(
        composer: &ShaderComposer,
        input: ResourceId,
        output: ResourceId,
        format: TextureFormat,
    ) -> ShadingResult<Self> {
        Ok(Self {
            pipeline: fullscreen_pipeline(composer, "tonemap", TONEMAP_SOURCE, &[], true, format)?,
            input,
            output,
        })
    }

    pub fn pipeline(&self) -> &RenderPipelineDescriptor {
        &self.pipeline
    }
}

impl RenderPass for TonemapPass {
    fn name(&self) -> &str {
        "Tonemapping"
    }

    fn setup(&mut self, ctx: &mut PassSetupContext) {
        ctx.read(self.input, ResourceUsage::TextureRead);
        ctx.write(self.output, ResourceUsage::RenderTarget);
    }

    fn execute(&self, ctx: &mut PassExecuteContext) {
        let viewport = ctx.screen_viewport();
        draw_fullscreen(
            &mut *ctx.encoder,
            self.name(),
            &self.pipeline,
            self.input,
            self.output,
            viewport,
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
