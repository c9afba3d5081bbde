//! Pipeline and pass contracts handed to the host renderer
//!
//! The crate never owns a device. Passes describe their pipelines with the
//! types below and record work through [`PassEncoder`], which the host
//! implements on top of its own command encoder.

use crate::backend::types::*;
use crate::render_graph::ResourceId;
use crate::scene::FrameUniform;

/// Bind group layout entry
#[derive(Debug, Clone, PartialEq)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub visibility: ShaderStageFlags,
    pub ty: BindingType,
}

/// Binding type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    UniformBuffer { min_size: u64 },
    Texture { sample_type: TextureSampleType },
    Sampler { filtering: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSampleType {
    Float { filterable: bool },
}

/// One bind group of a pipeline layout
#[derive(Debug, Clone, PartialEq)]
pub struct BindGroupLayoutDesc {
    pub label: &'static str,
    pub group: u32,
    pub entries: Vec<BindGroupLayoutEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepthStencilState {
    pub format: TextureFormat,
    pub depth_write_enabled: bool,
    pub depth_compare: CompareFunction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorTargetState {
    pub format: TextureFormat,
    pub write_mask: ColorWrites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorWrites(pub u32);

impl ColorWrites {
    pub const RED: Self = Self(1 << 0);
    pub const ALL: Self = Self(0xF);

    pub fn bits(&self) -> u32 {
        self.0
    }
}

/// Render pipeline descriptor
///
/// `shader_source` is fully composed WGSL exposing `vs_main` and, when
/// `has_fragment` is set, `fs_main`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPipelineDescriptor {
    pub label: String,
    pub shader_source: String,
    pub has_fragment: bool,
    pub vertex_layouts: Vec<VertexBufferLayout>,
    pub bind_group_layouts: Vec<BindGroupLayoutDesc>,
    pub front_face: FrontFace,
    pub cull_mode: CullMode,
    pub depth_stencil: Option<DepthStencilState>,
    pub color_targets: Vec<ColorTargetState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOp {
    Clear([f32; 4]),
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    Discard,
}

/// Color attachment for render pass
#[derive(Debug, Clone, PartialEq)]
pub struct ColorAttachment {
    pub target: ResourceId,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

/// Depth attachment for render pass
#[derive(Debug, Clone, PartialEq)]
pub struct DepthStencilAttachment {
    pub target: ResourceId,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
}

impl DepthStencilAttachment {
    /// Clear to the far plane and keep the result
    pub fn clear(target: ResourceId) -> Self {
        Self {
            target,
            depth_load_op: LoadOp::Clear([1.0; 4]),
            depth_store_op: StoreOp::Store,
        }
    }

    /// Test against depth written by an earlier pass
    pub fn load(target: ResourceId) -> Self {
        Self {
            target,
            depth_load_op: LoadOp::Load,
            depth_store_op: StoreOp::Store,
        }
    }
}

/// Render pass descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDescriptor {
    pub label: Option<String>,
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_stencil_attachment: Option<DepthStencilAttachment>,
}

/// Which vertex stream a scene draw consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneGeometry {
    /// Full [`crate::resources::Vertex`] stream with material bindings
    Lit,
    /// Merged position-only stream of the objects without alpha-cutout
    /// materials, for depth and shadow passes
    PositionsOnly,
    /// Full vertex stream of the alpha-cutout objects only, with material
    /// bindings, for the alpha-tested depth and shadow programs
    Cutout,
}

/// Command sink implemented by the host renderer
///
/// Calls arrive in graph order. Between `begin_render_pass` and
/// `end_render_pass` the host binds group 0 from the last `set_frame`, and
/// for scene draws binds the remaining groups of the current pipeline per
/// light, material and object.
pub trait PassEncoder {
    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor);

    fn set_pipeline(&mut self, pipeline: &RenderPipelineDescriptor);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Replace the per-frame uniform (face cameras of the shadow passes)
    fn set_frame(&mut self, frame: &FrameUniform);

    /// Bind a graph texture at `group`/`binding`
    fn bind_texture(&mut self, group: u32, binding: u32, resource: ResourceId);

    fn draw_scene(&mut self, geometry: SceneGeometry);

    /// Draw the two-triangle screen quad
    fn draw_fullscreen(&mut self);

    fn end_render_pass(&mut self);
}
