//! Render graph definition and compilation

use crate::error::{ShadingError, ShadingResult};
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Passes plus the virtual resources they exchange
pub struct RenderGraph {
    passes: Vec<Box<dyn RenderPass>>,
    pass_nodes: Vec<PassNode>,
    resources: Vec<VirtualResource>,
    next_pass_id: u32,
    next_resource_id: u32,

    /// External resources (like swapchain)
    external_resources: HashMap<String, ResourceId>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            pass_nodes: Vec::new(),
            resources: Vec::new(),
            next_pass_id: 0,
            next_resource_id: 0,
            external_resources: HashMap::new(),
        }
    }

    /// Register a resource the host supplies; it needs no producer pass
    pub fn register_external(&mut self, name: &str) -> ResourceId {
        if let Some(id) = self.external_resources.get(name) {
            return *id;
        }
        let id = ResourceId(self.next_resource_id);
        self.next_resource_id += 1;
        self.resources.push(VirtualResource::External {
            id,
            name: name.to_string(),
        });
        self.external_resources.insert(name.to_string(), id);
        id
    }

    pub fn get_external(&self, name: &str) -> Option<ResourceId> {
        self.external_resources.get(name).copied()
    }

    /// Add a render pass, running its setup against the graph
    pub fn add_pass<P: RenderPass + 'static>(
        &mut self,
        pass: P,
        screen_width: u32,
        screen_height: u32,
    ) -> PassId {
        let id = PassId(self.next_pass_id);
        self.next_pass_id += 1;

        let name = pass.name().to_string();
        let mut boxed_pass = Box::new(pass);

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        {
            let mut ctx = PassSetupContext {
                resources: &mut self.resources,
                inputs: &mut inputs,
                outputs: &mut outputs,
                next_resource_id: &mut self.next_resource_id,
                screen_width,
                screen_height,
            };
            boxed_pass.setup(&mut ctx);
        }

        log::debug!(
            "Added pass '{}' ({} reads, {} writes)",
            name,
            inputs.len(),
            outputs.len()
        );

        self.passes.push(boxed_pass);
        self.pass_nodes.push(PassNode {
            id,
            name,
            inputs,
            outputs,
        });

        id
    }

    /// Order passes so every reader runs after the writers of its inputs.
    ///
    /// Independent passes keep their insertion order, so the result is the
    /// same on every call.
    pub fn compile(&self) -> ShadingResult<CompiledGraph> {
        self.check_producers()?;

        // Node index -> indices of the passes it waits on
        let count = self.pass_nodes.len();
        let mut dependencies: Vec<HashSet<usize>> = vec![HashSet::new(); count];
        for (r, reader) in self.pass_nodes.iter().enumerate() {
            for (w, writer) in self.pass_nodes.iter().enumerate() {
                if r == w {
                    continue;
                }
                if reader
                    .inputs
                    .iter()
                    .any(|input| writer.writes_resource(input.resource))
                {
                    dependencies[r].insert(w);
                }
            }
        }

        // Kahn's algorithm, lowest insertion index first
        let mut in_degree: Vec<usize> = dependencies.iter().map(HashSet::len).collect();
        let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut sorted = Vec::with_capacity(count);

        while let Some(next) = ready.pop_first() {
            sorted.push(next);
            for (i, deps) in dependencies.iter().enumerate() {
                if deps.contains(&next) {
                    in_degree[i] -= 1;
                    if in_degree[i] == 0 {
                        ready.insert(i);
                    }
                }
            }
        }

        if sorted.len() < count {
            let stuck = (0..count)
                .filter(|i| !sorted.contains(i))
                .map(|i| self.pass_nodes[i].name.clone())
                .collect();
            return Err(ShadingError::GraphCycle(stuck));
        }

        let pass_order: Vec<PassId> = sorted.iter().map(|&i| self.pass_nodes[i].id).collect();

        // Determine resource lifetimes
        let mut resource_lifetimes: HashMap<ResourceId, ResourceLifetime> = HashMap::new();
        for (order, &index) in sorted.iter().enumerate() {
            let node = &self.pass_nodes[index];
            for access in node.inputs.iter().chain(node.outputs.iter()) {
                let lifetime = resource_lifetimes
                    .entry(access.resource)
                    .or_insert(ResourceLifetime {
                        first_use: order,
                        last_use: order,
                    });
                lifetime.last_use = order;
            }
        }

        log::debug!(
            "Compiled render graph: {}",
            sorted
                .iter()
                .map(|&i| self.pass_nodes[i].name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(CompiledGraph {
            pass_order,
            resource_lifetimes,
        })
    }

    /// Every read must name a known resource that is external or written by some pass
    fn check_producers(&self) -> ShadingResult<()> {
        for node in &self.pass_nodes {
            for input in &node.inputs {
                let resource = self
                    .resource(input.resource)
                    .ok_or_else(|| ShadingError::UnknownResource(format!("{:?}", input.resource)))?;
                if resource.is_external() {
                    continue;
                }
                let produced = self
                    .pass_nodes
                    .iter()
                    .any(|writer| writer.writes_resource(input.resource));
                if !produced {
                    return Err(ShadingError::MissingProducer {
                        pass: node.name.clone(),
                        resource: resource.name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn passes(&self) -> &[Box<dyn RenderPass>] {
        &self.passes
    }

    /// Get pass nodes (metadata)
    pub fn pass_nodes(&self) -> &[PassNode] {
        &self.pass_nodes
    }

    pub fn resources(&self) -> &[VirtualResource] {
        &self.resources
    }

    pub fn resource(&self, id: ResourceId) -> Option<&VirtualResource> {
        self.resources.iter().find(|r| r.id() == id)
    }

    pub fn find_resource(&self, name: &str) -> Option<ResourceId> {
        self.resources
            .iter()
            .find(|r| r.name() == name)
            .map(VirtualResource::id)
    }

    pub fn get_pass(&self, id: PassId) -> Option<&dyn RenderPass> {
        let index = self.pass_nodes.iter().position(|n| n.id == id)?;
        Some(self.passes[index].as_ref())
    }

    pub fn get_pass_node(&self, id: PassId) -> Option<&PassNode> {
        self.pass_nodes.iter().find(|n| n.id == id)
    }

    /// Downcast a pass to its concrete type
    pub fn pass_as<P: 'static>(&self, id: PassId) -> Option<&P> {
        self.get_pass(id)?.as_any().downcast_ref::<P>()
    }
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Resource lifetime in terms of pass execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLifetime {
    pub first_use: usize,
    pub last_use: usize,
}

/// Compiled render graph with execution order and resource lifetimes
#[derive(Debug)]
pub struct CompiledGraph {
    pub pass_order: Vec<PassId>,
    pub resource_lifetimes: HashMap<ResourceId, ResourceLifetime>,
}

impl CompiledGraph {
    /// Check if a resource is alive at a given execution step
    pub fn is_resource_alive(&self, resource: ResourceId, step: usize) -> bool {
        if let Some(lifetime) = self.resource_lifetimes.get(&resource) {
            step >= lifetime.first_use && step <= lifetime.last_use
        } else {
            false
        }
    }

    /// Position of `pass` in the execution order
    pub fn position(&self, pass: PassId) -> Option<usize> {
        self.pass_order.iter().position(|&p| p == pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{TextureFormat, TextureUsage};
    use std::any::Any;

    #[derive(Default)]
    struct NamedPass {
        name: &'static str,
        /// Created and written by this pass
        creates: Option<&'static str>,
        /// Created but never written
        declares: Option<&'static str>,
        reads: Vec<ResourceId>,
        writes: Vec<ResourceId>,
        created: Option<ResourceId>,
    }

    impl NamedPass {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                ..Default::default()
            }
        }
    }

    impl RenderPass for NamedPass {
        fn name(&self) -> &str {
            self.name
        }

        fn setup(&mut self, ctx: &mut PassSetupContext) {
            let make = |ctx: &mut PassSetupContext, name: &str| {
                ctx.create_texture_relative(
                    name,
                    TextureSize::default(),
                    TextureFormat::Rgba8Unorm,
                    TextureUsage::ATTACHMENT_SAMPLED,
                )
            };
            if let Some(name) = self.creates {
                let id = make(ctx, name);
                ctx.write(id, ResourceUsage::RenderTarget);
                self.created = Some(id);
            }
            if let Some(name) = self.declares {
                self.created = Some(make(ctx, name));
            }
            for &id in &self.reads {
                ctx.read(id, ResourceUsage::TextureRead);
            }
            for &id in &self.writes {
                ctx.write(id, ResourceUsage::RenderTarget);
            }
        }

        fn execute(&self, _ctx: &mut PassExecuteContext) {}

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn produced(graph: &RenderGraph, pass: PassId) -> ResourceId {
        graph.pass_as::<NamedPass>(pass).unwrap().created.unwrap()
    }

    #[test]
    fn readers_follow_writers() {
        let mut graph = RenderGraph::new();
        let a = graph.add_pass(
            NamedPass {
                creates: Some("a_out"),
                ..NamedPass::new("a")
            },
            64,
            64,
        );
        let a_out = produced(&graph, a);
        let b = graph.add_pass(
            NamedPass {
                creates: Some("b_out"),
                reads: vec![a_out],
                ..NamedPass::new("b")
            },
            64,
            64,
        );
        let b_out = produced(&graph, b);
        let c = graph.add_pass(
            NamedPass {
                reads: vec![a_out, b_out],
                ..NamedPass::new("c")
            },
            64,
            64,
        );

        let compiled = graph.compile().unwrap();
        assert_eq!(compiled.pass_order, vec![a, b, c]);
        assert_eq!(
            compiled.resource_lifetimes[&a_out],
            ResourceLifetime {
                first_use: 0,
                last_use: 2
            }
        );
        assert!(compiled.is_resource_alive(b_out, 1));
        assert!(!compiled.is_resource_alive(b_out, 0));
        assert_eq!(graph.find_resource("b_out"), Some(b_out));
    }

    #[test]
    fn independent_passes_keep_insertion_order() {
        let mut graph = RenderGraph::new();
        let ids: Vec<PassId> = ["x", "y", "z", "w"]
            .into_iter()
            .map(|name| graph.add_pass(NamedPass::new(name), 8, 8))
            .collect();
        let first = graph.compile().unwrap().pass_order;
        assert_eq!(first, ids);
        for _ in 0..10 {
            assert_eq!(graph.compile().unwrap().pass_order, first);
        }
    }

    #[test]
    fn reader_added_first_runs_after_writer() {
        let mut graph = RenderGraph::new();
        let shared = graph.register_external("shared");
        let reader = graph.add_pass(
            NamedPass {
                reads: vec![shared],
                ..NamedPass::new("reader")
            },
            8,
            8,
        );
        let writer = graph.add_pass(
            NamedPass {
                writes: vec![shared],
                ..NamedPass::new("writer")
            },
            8,
            8,
        );
        assert_eq!(graph.compile().unwrap().pass_order, vec![writer, reader]);
    }

    #[test]
    fn missing_producer_is_reported() {
        let mut graph = RenderGraph::new();
        let a = graph.add_pass(
            NamedPass {
                declares: Some("never_written"),
                ..NamedPass::new("declarer")
            },
            8,
            8,
        );
        let orphan = produced(&graph, a);
        graph.add_pass(
            NamedPass {
                reads: vec![orphan],
                ..NamedPass::new("reader")
            },
            8,
            8,
        );

        match graph.compile() {
            Err(ShadingError::MissingProducer { pass, resource }) => {
                assert_eq!(pass, "reader");
                assert_eq!(resource, "never_written");
            }
            other => panic!("expected MissingProducer, got {other:?}"),
        }
    }

    #[test]
    fn unknown_resource_is_reported() {
        let mut graph = RenderGraph::new();
        graph.add_pass(
            NamedPass {
                reads: vec![ResourceId(42)],
                ..NamedPass::new("reader")
            },
            8,
            8,
        );
        assert!(matches!(
            graph.compile(),
            Err(ShadingError::UnknownResource(_))
        ));
    }

    #[test]
    fn external_reads_need_no_producer() {
        let mut graph = RenderGraph::new();
        let swapchain = graph.register_external("swapchain");
        assert_eq!(graph.register_external("swapchain"), swapchain);
        graph.add_pass(
            NamedPass {
                reads: vec![swapchain],
                ..NamedPass::new("present")
            },
            8,
            8,
        );
        assert!(graph.compile().is_ok());
    }

    #[test]
    fn cycle_is_reported() {
        let mut graph = RenderGraph::new();
        let ping = graph.register_external("ping");
        let pong = graph.register_external("pong");
        graph.add_pass(
            NamedPass {
                reads: vec![ping],
                writes: vec![pong],
                ..NamedPass::new("a")
            },
            8,
            8,
        );
        graph.add_pass(
            NamedPass {
                reads: vec![pong],
                writes: vec![ping],
                ..NamedPass::new("b")
            },
            8,
            8,
        );

        match graph.compile() {
            Err(ShadingError::GraphCycle(passes)) => {
                assert_eq!(passes, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected GraphCycle, got {other:?}"),
        }
    }
}
