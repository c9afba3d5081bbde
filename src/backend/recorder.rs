//! A [`PassEncoder`] that records commands instead of submitting them

use crate::backend::traits::*;
use crate::backend::types::Viewport;
use crate::render_graph::ResourceId;
use crate::scene::FrameUniform;

#[derive(Debug, Clone, PartialEq)]
pub enum EncodedCommand {
    BeginPass {
        label: Option<String>,
        color_targets: Vec<ResourceId>,
        depth_target: Option<ResourceId>,
    },
    SetPipeline(String),
    SetViewport(Viewport),
    SetFrame(FrameUniform),
    BindTexture {
        group: u32,
        binding: u32,
        resource: ResourceId,
    },
    DrawScene(SceneGeometry),
    DrawFullscreen,
    EndPass,
}

/// Records every encoder call in order
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<EncodedCommand>,
    open_pass: bool,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[EncodedCommand] {
        &self.commands
    }

    /// Labels of the passes in submission order
    pub fn pass_labels(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                EncodedCommand::BeginPass { label, .. } => Some(label.clone().unwrap_or_default()),
                _ => None,
            })
            .collect()
    }

    /// Commands recorded between the begin/end of the pass labelled `label`
    pub fn pass_commands(&self, label: &str) -> Vec<&EncodedCommand> {
        let mut inside = false;
        let mut out = Vec::new();
        for command in &self.commands {
            match command {
                EncodedCommand::BeginPass { label: l, .. } => {
                    inside = l.as_deref() == Some(label);
                }
                EncodedCommand::EndPass => inside = false,
                other if inside => out.push(other),
                _ => {}
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.open_pass = false;
    }
}

impl PassEncoder for CommandRecorder {
    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        if self.open_pass {
            log::warn!("begin_render_pass while a pass is still open");
        }
        self.open_pass = true;
        self.commands.push(EncodedCommand::BeginPass {
            label: desc.label.clone(),
            color_targets: desc.color_attachments.iter().map(|c| c.target).collect(),
            depth_target: desc.depth_stencil_attachment.as_ref().map(|d| d.target),
        });
    }

    fn set_pipeline(&mut self, pipeline: &RenderPipelineDescriptor) {
        self.commands
            .push(EncodedCommand::SetPipeline(pipeline.label.clone()));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(EncodedCommand::SetViewport(viewport));
    }

    fn set_frame(&mut self, frame: &FrameUniform) {
        self.commands.push(EncodedCommand::SetFrame(*frame));
    }

    fn bind_texture(&mut self, group: u32, binding: u32, resource: ResourceId) {
        self.commands.push(EncodedCommand::BindTexture {
            group,
            binding,
            resource,
        });
    }

    fn draw_scene(&mut self, geometry: SceneGeometry) {
        self.commands.push(EncodedCommand::DrawScene(geometry));
    }

    fn draw_fullscreen(&mut self) {
        self.commands.push(EncodedCommand::DrawFullscreen);
    }

    fn end_render_pass(&mut self) {
        self.open_pass = false;
        self.commands.push(EncodedCommand::EndPass);
    }
}
