//! Render graph executor

use crate::backend::traits::PassEncoder;
use crate::config::ShadingConfig;
use crate::error::ShadingResult;
use crate::render_graph::graph::*;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use crate::scene::Scene;

/// Walks a compiled graph and lets each pass encode its commands
pub struct FrameExecutor {
    width: u32,
    height: u32,
}

impl FrameExecutor {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Encode one frame. Every pass starts with the scene camera bound as
    /// the frame uniform.
    pub fn execute(
        &self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
        encoder: &mut dyn PassEncoder,
        scene: &Scene,
        config: &ShadingConfig,
    ) {
        let camera_frame = scene.camera.uniform();

        for &pass_id in &compiled.pass_order {
            if let Some(pass) = graph.get_pass(pass_id) {
                log::trace!("Executing pass '{}'", pass.name());
                encoder.set_frame(&camera_frame);
                let mut ctx = PassExecuteContext {
                    encoder: &mut *encoder,
                    scene,
                    config,
                    width: self.width,
                    height: self.height,
                };
                pass.execute(&mut ctx);
            }
        }
    }

    /// Compile and execute in one call
    pub fn run(
        &self,
        graph: &RenderGraph,
        encoder: &mut dyn PassEncoder,
        scene: &Scene,
        config: &ShadingConfig,
    ) -> ShadingResult<CompiledGraph> {
        let compiled = graph.compile()?;
        self.execute(graph, &compiled, encoder, scene, config);
        Ok(compiled)
    }
}

/// Builder for creating render graphs with a fluent API
pub struct RenderGraphBuilder {
    graph: RenderGraph,
    screen_width: u32,
    screen_height: u32,
}

impl RenderGraphBuilder {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            graph: RenderGraph::new(),
            screen_width,
            screen_height,
        }
    }

    /// Register an external resource
    pub fn external(mut self, name: &str) -> (Self, ResourceId) {
        let id = self.graph.register_external(name);
        (self, id)
    }

    pub fn pass<P: RenderPass + 'static>(mut self, pass: P) -> (Self, PassId) {
        let id = self
            .graph
            .add_pass(pass, self.screen_width, self.screen_height);
        (self, id)
    }

    pub fn build(self) -> RenderGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CommandRecorder, EncodedCommand};
    use std::any::Any;

    struct Marker(&'static str);

    impl RenderPass for Marker {
        fn name(&self) -> &str {
            self.0
        }

        fn setup(&mut self, _ctx: &mut PassSetupContext) {}

        fn execute(&self, ctx: &mut PassExecuteContext) {
            ctx.encoder.begin_render_pass(&crate::backend::RenderPassDescriptor {
                label: Some(self.0.to_string()),
                color_attachments: Vec::new(),
                depth_stencil_attachment: None,
            });
            ctx.encoder.end_render_pass();
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn executes_in_compiled_order() {
        let (builder, _) = RenderGraphBuilder::new(32, 32).pass(Marker("first"));
        let (builder, _) = builder.pass(Marker("second"));
        let graph = builder.build();

        let mut recorder = CommandRecorder::new();
        let executor = FrameExecutor::new(32, 32);
        executor
            .run(&graph, &mut recorder, &Scene::default(), &ShadingConfig::default())
            .unwrap();

        assert_eq!(recorder.pass_labels(), vec!["first", "second"]);
        // Camera frame is rebound ahead of each pass
        let frames = recorder
            .commands()
            .iter()
            .filter(|c| matches!(c, EncodedCommand::SetFrame(_)))
            .count();
        assert_eq!(frames, 2);
    }
}
