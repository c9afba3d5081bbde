//! Fullscreen post-processing passes

mod composite;
mod tonemapping;

pub use composite::CompositePass;
pub use tonemapping::TonemapPass;

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::binding;
use crate::error::ShadingResult;
use crate::render_graph::ResourceId;
use crate::resources::ScreenVertex;
use crate::shader::{ShaderComposer, ShaderDef};

use super::compile_program;

/// Pipeline of a pass that samples one image across a screen quad
fn fullscreen_pipeline(
    composer: &ShaderComposer,
    label: &str,
    source: &str,
    shader_defs: &[(&str, ShaderDef)],
    filterable: bool,
    format: TextureFormat,
) -> ShadingResult<RenderPipelineDescriptor> {
    let layouts = binding::post_layouts(filterable);
    let shader_source = compile_program(composer, label, source, shader_defs, &layouts)?;

    Ok(RenderPipelineDescriptor {
        label: label.into(),
        shader_source,
        has_fragment: true,
        vertex_layouts: vec![ScreenVertex::layout()],
        bind_group_layouts: layouts,
        front_face: FrontFace::Ccw,
        cull_mode: CullMode::None,
        depth_stencil: None,
        color_targets: vec![ColorTargetState {
            format,
            write_mask: ColorWrites::ALL,
        }],
    })
}

fn draw_fullscreen(
    encoder: &mut dyn PassEncoder,
    label: &str,
    pipeline: &RenderPipelineDescriptor,
    input: ResourceId,
    output: ResourceId,
    viewport: Viewport,
) {
    encoder.begin_render_pass(&RenderPassDescriptor {
        label: Some(label.into()),
        color_attachments: vec![ColorAttachment {
            target: output,
            load_op: LoadOp::Clear([0.0, 0.0, 0.0, 1.0]),
            store_op: StoreOp::Store,
        }],
        depth_stencil_attachment: None,
    });
    encoder.set_pipeline(pipeline);
    encoder.set_viewport(viewport);
    encoder.bind_texture(binding::POST_GROUP, binding::SOURCE_TEXTURE_BINDING, input);
    encoder.draw_fullscreen();
    encoder.end_render_pass();
}
